pub use self::acceleration::{AccelerationModel, ModelParams, GAP_EPSILON};
pub use self::dynamics::{euler, guarded_euler, Motion, EMERGENCY_DELTA_V};
use crate::ring::RingTopology;
use crate::VehicleId;
use serde::Serialize;

mod acceleration;
mod dynamics;

/// The kinematic state of a simulated vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VehicleState {
    /// The vehicle's ID
    id: VehicleId,
    /// The position along the ring road, in m.
    pos: f64,
    /// The velocity in m/s.
    vel: f64,
    /// The most recently computed acceleration in m/s<sup>2</sup>.
    acc: f64,
}

impl VehicleState {
    /// Creates a new vehicle.
    pub fn new(id: VehicleId, pos: f64, vel: f64, acc: f64) -> Self {
        Self {
            id,
            pos,
            vel: f64::max(vel, 0.0),
            acc,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The position of the vehicle on the ring in m.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// The vehicle's velocity in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The vehicle's acceleration in m/s<sup>2</sup>.
    pub fn acc(&self) -> f64 {
        self.acc
    }

    /// Whether the position and velocity are both finite.
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }

    /// The distance from this vehicle forward to `lead`.
    ///
    /// A lone vehicle leads itself and sees a full lap. A different vehicle
    /// at the same position has a gap of zero.
    pub fn lead_gap(&self, lead: &VehicleState, ring: &RingTopology) -> f64 {
        Self::gap_between(self, lead, ring)
    }

    /// The distance from `follower` forward to this vehicle.
    pub fn follow_gap(&self, follower: &VehicleState, ring: &RingTopology) -> f64 {
        Self::gap_between(follower, self, ring)
    }

    fn gap_between(from: &VehicleState, to: &VehicleState, ring: &RingTopology) -> f64 {
        if from.id != to.id && from.pos == to.pos {
            0.0
        } else {
            ring.forward_gap(from.pos, to.pos)
        }
    }

    /// Sets the acceleration needed to follow the vehicle ahead.
    ///
    /// # Arguments
    /// * `net_dist` - The distance to the vehicle ahead in metres.
    /// * `their_vel` - The vehicle ahead's velocity (m/s).
    pub(crate) fn follow_vehicle(&mut self, model: &AccelerationModel, net_dist: f64, their_vel: f64) {
        self.acc = model.idm(net_dist, self.vel, their_vel);
    }

    /// Sets the acceleration directly.
    pub(crate) fn set_acc(&mut self, acc: f64) {
        self.acc = acc;
    }

    /// Integrates the vehicle's velocity and position.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    /// * `ring` - The road the vehicle is driving on
    pub(crate) fn integrate(&mut self, dt: f64, ring: &RingTopology) {
        let motion = euler(self.vel, self.acc, dt);
        self.apply(motion, ring);
    }

    /// Integrates the vehicle's velocity and position while another vehicle
    /// is tailgating it. See [guarded_euler].
    pub(crate) fn integrate_guarded(&mut self, dt: f64, ring: &RingTopology, lead_gap: f64) {
        let motion = guarded_euler(self.vel, self.acc, dt, lead_gap);
        self.apply(motion, ring);
    }

    /// Commits a step of motion, wrapping the position around the ring.
    pub(crate) fn apply(&mut self, motion: Motion, ring: &RingTopology) {
        self.vel = motion.vel;
        self.pos = ring.wrap_position(self.pos + motion.delta);
    }
}
