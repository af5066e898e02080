/// Velocity changes below this in a single step put a tailgated vehicle
/// into an emergency contraction towards the vehicle ahead, in m/s.
pub const EMERGENCY_DELTA_V: f64 = -10.0; // m/s

/// The outcome of integrating a vehicle over one time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// The new velocity in m/s.
    pub vel: f64,
    /// The distance travelled during the step in m.
    pub delta: f64,
}

/// Explicit Euler step. The velocity is clamped so vehicles never reverse.
pub fn euler(vel: f64, acc: f64, dt: f64) -> Motion {
    let vel = f64::max(vel + acc * dt, 0.0);
    Motion { vel, delta: vel * dt }
}

/// Euler step for a vehicle with another vehicle dangerously close behind it.
///
/// If the acceleration would shed more than [EMERGENCY_DELTA_V] in one step,
/// the vehicle instead closes half of the gap to the vehicle ahead.
pub fn guarded_euler(vel: f64, acc: f64, dt: f64, lead_gap: f64) -> Motion {
    if acc * dt < EMERGENCY_DELTA_V {
        let delta = lead_gap / 2.;
        Motion {
            vel: delta * dt,
            delta,
        }
    } else {
        euler(vel, acc, dt)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn euler_step() {
        let m = euler(10.0, 2.0, 0.1);
        assert_approx_eq!(m.vel, 10.2);
        assert_approx_eq!(m.delta, 1.02);
    }

    #[test]
    fn never_reverses() {
        for acc in [-1.0, -50.0, -1e6, f64::MIN / 2.0] {
            let m = euler(3.0, acc, 0.1);
            assert_eq!(m.vel, 0.0);
            assert_eq!(m.delta, 0.0);
        }
    }

    #[test]
    fn guarded_step_contracts_on_hard_braking() {
        let m = guarded_euler(12.0, -200.0, 0.1, 10.0);
        assert_eq!(m.delta, 5.0);
        assert_approx_eq!(m.vel, 0.5);
    }

    #[test]
    fn guarded_step_otherwise_matches_euler() {
        assert_eq!(guarded_euler(12.0, -99.0, 0.1, 10.0), euler(12.0, -99.0, 0.1));
        assert_eq!(guarded_euler(12.0, 1.5, 0.1, 10.0), euler(12.0, 1.5, 0.1));
    }
}
