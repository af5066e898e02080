//! Simulation configuration.

use crate::error::{SimError, SimResult};
use crate::policy::Policy;
use crate::simulation::UpdateOrder;
use crate::util::Interval;
use crate::vehicle::ModelParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The complete configuration of a multi-run session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Parameters of the car following model.
    pub model: ModelParams,
    /// The car following policy used by every vehicle.
    pub policy: Policy,
    /// The order in which vehicles are updated within a step.
    pub update_order: UpdateOrder,
    pub timing: TimingConfig,
    pub road: RoadConfig,
    pub session: SessionConfig,
}

/// Time stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// The fixed time step in s.
    pub dt: f64,
    /// The duration of each run in s.
    pub simulation_time: f64,
    /// Statistics are only gathered after this many seconds.
    pub warm_up: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            simulation_time: 30.0,
            warm_up: 15.0,
        }
    }
}

/// Initial vehicle placement and road geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// The coordinate past which vehicles wrap around, in m.
    pub visible_length: f64,
    /// The front vehicle starts at this fraction of `visible_length`.
    pub front_fraction: f64,
    /// Lower bound of the random spacing between consecutive vehicles, in m.
    pub min_spacing: f64,
    /// Upper bound (exclusive) of the random spacing, in m.
    pub max_spacing: f64,
    /// The distance behind the rearmost vehicle at which vehicles re-enter, in m.
    pub reentry_clearance: f64,
    /// Converts road length to the unit densities are reported in.
    pub density_scale: f64,
    /// The velocity every vehicle starts with, in m/s.
    pub initial_velocity: f64,
    /// The acceleration every vehicle starts with, in m/s<sup>2</sup>.
    pub initial_acceleration: f64,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            visible_length: (1000.0 - 48.0) / 30.0,
            front_fraction: 0.75,
            min_spacing: 1.0,
            max_spacing: 2.0,
            reentry_clearance: 1.0,
            density_scale: 0.04,
            initial_velocity: 25.0,
            initial_acceleration: 2.0,
        }
    }
}

/// The sequence of runs that make up a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// The number of vehicles in each run.
    pub vehicle_counts: Vec<usize>,
    /// How many of `vehicle_counts` to run.
    pub total_runs: usize,
    /// Whether to run the vehicle counts in a random order.
    pub shuffle_counts: bool,
    /// Seed for every random draw in the session.
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let vehicle_counts = vec![1, 2, 2, 4, 7, 11, 15, 18, 21, 24, 30, 40, 60, 80, 99];
        Self {
            total_runs: vehicle_counts.len(),
            vehicle_counts,
            shuffle_counts: true,
            seed: 175175175,
        }
    }
}

impl SimulationConfig {
    /// Loads and validates a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates a configuration from TOML text.
    /// Missing fields take their default values.
    pub fn from_toml(content: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The number of fixed steps in each run.
    pub fn total_steps(&self) -> usize {
        (self.timing.simulation_time / self.timing.dt).round() as usize
    }

    /// Checks that the configuration describes runnable simulations.
    pub fn validate(&self) -> SimResult<()> {
        let fault = |msg: String| Err(SimError::Configuration(msg));
        let timing = &self.timing;
        let road = &self.road;
        let model = &self.model;

        if !(timing.dt > 0.0) {
            return fault(format!("time step must be positive, got {}", timing.dt));
        }
        if !Interval::new(0.0, timing.simulation_time).contains(timing.warm_up)
            || timing.warm_up >= timing.simulation_time
        {
            return fault(format!(
                "warm up of {} s must lie within [0, {}) s",
                timing.warm_up, timing.simulation_time
            ));
        }
        if timing.simulation_time - timing.warm_up < timing.dt {
            return fault("no steps fall after the warm up".into());
        }
        if !(road.visible_length > 0.0 && road.density_scale > 0.0) {
            return fault("road length and density scale must be positive".into());
        }
        if !(road.front_fraction > 0.0 && road.front_fraction < 1.0) {
            return fault(format!(
                "front vehicle fraction must lie within (0, 1), got {}",
                road.front_fraction
            ));
        }
        if !(road.min_spacing > 0.0 && road.min_spacing < road.max_spacing) {
            return fault(format!(
                "vehicle spacing range [{}, {}) is empty",
                road.min_spacing, road.max_spacing
            ));
        }
        if road.reentry_clearance < 0.0 || road.initial_velocity < 0.0 {
            return fault("re-entry clearance and initial velocity must not be negative".into());
        }
        if !(model.max_velocity > 0.0
            && model.max_acceleration > 0.0
            && model.comf_deceleration > 0.0)
        {
            return fault("model velocity, acceleration and deceleration must be positive".into());
        }
        let session = &self.session;
        if session.total_runs == 0 || session.total_runs > session.vehicle_counts.len() {
            return fault(format!(
                "total runs must be between 1 and {}, got {}",
                session.vehicle_counts.len(),
                session.total_runs
            ));
        }
        if session.vehicle_counts.iter().any(|count| *count == 0) {
            return fault("every run needs at least one vehicle".into());
        }
        Ok(())
    }
}
