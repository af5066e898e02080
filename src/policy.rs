//! Car following policies.

use crate::ring::RingTopology;
use crate::vehicle::{AccelerationModel, Motion, VehicleState, GAP_EPSILON};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Velocity and position increment of the creeping test policy, per step.
const CREEP_STEP: f64 = 0.1;

/// Followers closer than this multiple of the minimum gap are tailgating.
const TAILGATE_FACTOR: f64 = 1.5;

/// The law used to move every vehicle in a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// The intelligent driver model, reacting only to the gap ahead.
    Idm,
    /// The intelligent driver model reacting to the lead vehicle's speed,
    /// with an emergency mode for when the vehicle is being tailgated.
    Custom,
    /// Vehicles ignore each other and creep forward at an ever increasing speed.
    #[default]
    Test,
}

impl Policy {
    /// Advances `ego` by one time step.
    ///
    /// # Parameters
    /// * `lead` - The vehicle immediately ahead of `ego` on the ring
    /// * `follower` - The vehicle immediately behind `ego` on the ring
    pub fn update(
        self,
        ego: &mut VehicleState,
        lead: &VehicleState,
        follower: &VehicleState,
        model: &AccelerationModel,
        ring: &RingTopology,
        dt: f64,
    ) {
        match self {
            Policy::Idm => {
                let gap = checked_gap(ego, ego.lead_gap(lead, ring));
                // Closing speed is measured against the vehicle itself,
                // so only the time headway shapes the desired gap.
                let my_vel = ego.vel();
                ego.follow_vehicle(model, gap, my_vel);
                ego.integrate(dt, ring);
            }
            Policy::Custom => {
                let lead_gap = checked_gap(ego, ego.lead_gap(lead, ring));
                let follow_gap = ego.follow_gap(follower, ring);
                ego.follow_vehicle(model, lead_gap, lead.vel());
                if follow_gap < TAILGATE_FACTOR * model.min_gap() {
                    ego.integrate_guarded(dt, ring, lead_gap);
                } else {
                    ego.integrate(dt, ring);
                }
            }
            Policy::Test => {
                ego.set_acc(0.0);
                let motion = Motion {
                    vel: ego.vel() + CREEP_STEP,
                    delta: CREEP_STEP,
                };
                ego.apply(motion, ring);
            }
        }
    }

    /// A short human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Idm => "IDM",
            Policy::Custom => "Custom",
            Policy::Test => "Test",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reports a gap that the car following model cannot divide by.
fn checked_gap(ego: &VehicleState, gap: f64) -> f64 {
    if gap <= 0.0 {
        warn!(
            "Vehicle {} has a non-positive gap of {:.3} m, flooring at {} m",
            ego.id(),
            gap,
            GAP_EPSILON
        );
    }
    gap
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle::{ModelParams, EMERGENCY_DELTA_V};
    use crate::VehicleId;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> AccelerationModel {
        AccelerationModel::new(&ModelParams::default())
    }

    fn veh(id: usize, pos: f64, vel: f64) -> VehicleState {
        VehicleState::new(VehicleId(id), pos, vel, 0.0)
    }

    #[test]
    fn idm_ignores_lead_velocity() {
        let ring = RingTopology::new(0.0, 200.0).unwrap();
        let model = model();
        let follower = veh(2, 0.0, 0.0);

        let mut slow_lead = veh(1, 50.0, 10.0);
        let mut fast_lead = veh(1, 50.0, 10.0);
        Policy::Idm.update(&mut slow_lead, &veh(0, 70.0, 0.0), &follower, &model, &ring, 0.1);
        Policy::Idm.update(&mut fast_lead, &veh(0, 70.0, 30.0), &follower, &model, &ring, 0.1);
        assert_eq!(slow_lead, fast_lead);
        assert_approx_eq!(slow_lead.acc(), model.idm(20.0, 10.0, 10.0));
    }

    #[test]
    fn custom_reacts_to_closing_speed() {
        let ring = RingTopology::new(0.0, 200.0).unwrap();
        let model = model();
        let follower = veh(2, 0.0, 0.0);

        let mut ego = veh(1, 50.0, 10.0);
        Policy::Custom.update(&mut ego, &veh(0, 70.0, 5.0), &follower, &model, &ring, 0.1);
        assert_approx_eq!(ego.acc(), model.idm(20.0, 10.0, 5.0));
    }

    #[test]
    fn custom_emergency_contraction() {
        let ring = RingTopology::new(0.0, 100.0).unwrap();
        let model = model();
        let lead = veh(0, 30.0, 0.0);
        let follower = veh(2, 19.5, 20.0);
        let mut ego = veh(1, 20.0, 20.0);

        // s* = 1 + 20 + 20 * 20 / (2 * sqrt(3)) is far larger than the 10 m gap,
        // so the acceleration times 0.1 s is well below -10 m/s.
        Policy::Custom.update(&mut ego, &lead, &follower, &model, &ring, 0.1);
        assert!(ego.acc() * 0.1 < EMERGENCY_DELTA_V);
        assert_eq!(ego.pos() - 20.0, 5.0);
        assert_approx_eq!(ego.vel(), 0.5);
    }

    #[test]
    fn custom_without_tailgater_brakes_normally() {
        let ring = RingTopology::new(0.0, 100.0).unwrap();
        let model = model();
        let lead = veh(0, 30.0, 0.0);
        let follower = veh(2, 5.0, 20.0);
        let mut ego = veh(1, 20.0, 20.0);

        Policy::Custom.update(&mut ego, &lead, &follower, &model, &ring, 0.1);
        assert_eq!(ego.vel(), 0.0);
        assert_eq!(ego.pos(), 20.0);
    }

    #[test]
    fn test_policy_creeps() {
        let ring = RingTopology::new(0.0, 100.0).unwrap();
        let mut ego = veh(0, 99.95, 25.0);
        let other = ego;
        Policy::Test.update(&mut ego, &other, &other, &model(), &ring, 0.1);
        assert_approx_eq!(ego.vel(), 25.1);
        assert_approx_eq!(ego.pos(), 0.05);
        assert_eq!(ego.acc(), 0.0);
    }

    #[test]
    fn serde_names() {
        let policy: Policy = serde_json::from_str("\"custom\"").unwrap();
        assert_eq!(policy, Policy::Custom);
        assert_eq!(Policy::Idm.to_string(), "IDM");
    }
}
