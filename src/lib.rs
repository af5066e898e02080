pub use config::{RoadConfig, SessionConfig, SimulationConfig, TimingConfig};
pub use error::{SimError, SimResult};
pub use policy::Policy;
pub use ring::RingTopology;
use serde::{Deserialize, Serialize};
pub use session::{
    FundamentalDiagram, NoopObserver, Session, SessionObserver, SessionOutcome, TrajectoryPoint,
};
pub use simulation::{RunPhase, SimulationRun, UpdateOrder};
pub use stats::{RunStatistics, StatsAccumulator};
pub use util::Interval;
pub use vehicle::{AccelerationModel, ModelParams, VehicleState};

mod config;
mod error;
pub mod export;
mod policy;
mod ring;
mod session;
mod simulation;
mod stats;
mod util;
pub mod vehicle;

/// Unique ID of a [VehicleState] within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
