use serde::{Deserialize, Serialize};

/// The smallest gap, in m, that the car following model will divide by.
pub const GAP_EPSILON: f64 = 0.01; // m

/// The acceleration model of a vehicle.
#[derive(Clone, Debug)]
pub struct AccelerationModel {
    headway: f64,
    max_acc: f64,
    comf_dec: f64,
    exponent: i32,
    min_gap: f64,
    max_vel: f64,
    factor: f64,
}

/// The parameters of the acceleration model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// The desired gap between this and the vehicle ahead in seconds.
    pub time_headway: f64,
    /// The vehicle's maximum acceleration in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// The comfortable decelleration in m/s<sup>2</sup>.
    pub comf_deceleration: f64,
    /// The exponent applied to the ratio of current to desired velocity.
    pub acceleration_exponent: i32,
    /// The minimum gap to maintain between vehicles in m.
    pub min_gap: f64,
    /// The desired free-road velocity in m/s.
    pub max_velocity: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            time_headway: 1.0,
            max_acceleration: 2.0,
            comf_deceleration: 1.5,
            acceleration_exponent: 4,
            min_gap: 1.0,
            max_velocity: 25.0,
        }
    }
}

impl AccelerationModel {
    /// Creates a new acceleration model.
    pub fn new(params: &ModelParams) -> Self {
        AccelerationModel {
            headway: params.time_headway,
            max_acc: params.max_acceleration,
            comf_dec: params.comf_deceleration,
            exponent: params.acceleration_exponent,
            min_gap: params.min_gap,
            max_vel: params.max_velocity,
            factor: 1. / (2. * (params.max_acceleration * params.comf_deceleration).sqrt()),
        }
    }

    /// The minimum gap to maintain between vehicles in m.
    pub fn min_gap(&self) -> f64 {
        self.min_gap
    }

    /// The desired spacing to the vehicle ahead.
    ///
    /// # Arguments
    /// * `my_vel` - The velocity of the simulated vehicle (m/s).
    /// * `their_vel` - The vehicle ahead's velocity (m/s).
    pub fn desired_gap(&self, my_vel: f64, their_vel: f64) -> f64 {
        let appr = my_vel - their_vel;
        let dynamic = my_vel * self.headway + (my_vel * appr) * self.factor;
        self.min_gap + f64::max(0.0, dynamic)
    }

    /// Computes an acceleration using the intelligent driver model.
    ///
    /// # Arguments
    /// * `net_dist` - The distance between this vehicle and the vehicle ahead in metres.
    /// * `my_vel` - The velocity of the simulated vehicle (m/s).
    /// * `their_vel` - The vehicle ahead's velocity (m/s).
    pub fn idm(&self, net_dist: f64, my_vel: f64, their_vel: f64) -> f64 {
        let net_dist = f64::max(net_dist, GAP_EPSILON);
        let free = (my_vel / self.max_vel).powi(self.exponent);
        let term = self.desired_gap(my_vel, their_vel) / net_dist;
        self.max_acc * (1. - free - (term * term))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> AccelerationModel {
        AccelerationModel::new(&ModelParams::default())
    }

    #[test]
    fn desired_gap() {
        let acc = model();
        assert_approx_eq!(acc.desired_gap(0.0, 0.0), 1.0);
        assert_approx_eq!(acc.desired_gap(10.0, 10.0), 11.0);
        // Closing in at 5 m/s adds 10 * 5 / (2 * sqrt(3))
        assert_approx_eq!(acc.desired_gap(10.0, 5.0), 11.0 + 50.0 / (2.0 * 3f64.sqrt()));
        // A lead vehicle pulling away cannot shrink the gap below the minimum
        assert_approx_eq!(acc.desired_gap(1.0, 30.0), 1.0);
    }

    #[test]
    fn free_road() {
        let acc = model();
        assert_approx_eq!(acc.idm(1e9, 0.0, 0.0), 2.0);
        assert_approx_eq!(acc.idm(1e9, 25.0, 25.0), 0.0);
    }

    #[test]
    fn idm_at_known_state() {
        let acc = model();
        // s* = 1 + 10 = 11, (10/25)^4 = 0.0256, (11/22)^2 = 0.25
        assert_approx_eq!(acc.idm(22.0, 10.0, 10.0), 2.0 * (1.0 - 0.0256 - 0.25));
    }

    #[test]
    fn zero_gap_is_finite() {
        let acc = model();
        let a = acc.idm(0.0, 5.0, 5.0);
        assert!(a.is_finite());
        assert!(a < -1000.0);
        assert_eq!(a, acc.idm(-3.0, 5.0, 5.0));
    }
}
