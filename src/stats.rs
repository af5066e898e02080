//! Per-run aggregate statistics.

use crate::error::{SimError, SimResult};
use crate::util::Interval;
use crate::vehicle::VehicleState;
use serde::{Deserialize, Serialize};

/// The aggregate outcome of one run: a single point on the fundamental diagram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Vehicle density in veh/m.
    pub density: f64,
    /// The mean vehicle speed after the warm-up, in m/s.
    pub average_speed: f64,
    /// Vehicles passing the re-entry point per second after the warm-up.
    pub flow: f64,
}

impl RunStatistics {
    /// The `(density, speed)` sample.
    pub fn speed_sample(&self) -> (f64, f64) {
        (self.density, self.average_speed)
    }

    /// The `(density, flow)` sample.
    pub fn flow_sample(&self) -> (f64, f64) {
        (self.density, self.flow)
    }
}

/// Accrues flow and speed observations once the warm-up has elapsed.
#[derive(Clone, Debug)]
pub struct StatsAccumulator {
    /// The span of simulated time over which statistics are gathered.
    window: Interval<f64>,
    /// The number of times any vehicle crossed the wrap point.
    crossings: usize,
    /// The sum of all sampled vehicle speeds.
    speed_sum: f64,
    /// The number of sampled vehicle speeds.
    speed_count: usize,
}

impl StatsAccumulator {
    /// Creates an accumulator that ignores everything up to `warm_up` seconds.
    pub fn new(warm_up: f64, simulation_time: f64) -> Self {
        Self {
            window: Interval::new(warm_up, simulation_time),
            crossings: 0,
            speed_sum: 0.0,
            speed_count: 0,
        }
    }

    /// Whether observations made at `elapsed` seconds are counted.
    pub fn is_accruing(&self, elapsed: f64) -> bool {
        self.window.is_past_start(elapsed)
    }

    /// The number of wrap crossings counted so far.
    pub fn crossings(&self) -> usize {
        self.crossings
    }

    /// Records the state at the end of a step.
    ///
    /// # Parameters
    /// * `elapsed` - The simulated time at the end of the step in s
    /// * `prev_pos` - Each vehicle's position at the start of the step
    /// * `vehicles` - The vehicles after the step, in the same order
    pub fn record(&mut self, elapsed: f64, prev_pos: &[f64], vehicles: &[VehicleState]) {
        if !self.is_accruing(elapsed) {
            return;
        }
        self.crossings += vehicles
            .iter()
            .zip(prev_pos)
            .filter(|(veh, prev)| veh.pos() < **prev)
            .count();
        for veh in vehicles {
            self.speed_sum += veh.vel();
            self.speed_count += 1;
        }
    }

    /// Produces the run's statistics.
    pub fn finish(&self, density: f64) -> SimResult<RunStatistics> {
        if self.speed_count == 0 {
            return Err(SimError::Configuration(
                "no speed samples were taken after the warm-up".into(),
            ));
        }
        Ok(RunStatistics {
            density,
            average_speed: self.speed_sum / self.speed_count as f64,
            flow: self.crossings as f64 / self.window.length(),
        })
    }
}
