//! Error types.

use thiserror::Error;

/// An error raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// The simulation was asked to run with parameters it cannot honour,
    /// such as a run with no vehicles.
    #[error("configuration fault: {0}")]
    Configuration(String),

    /// The ring road could not be constructed.
    #[error("topology fault: {0}")]
    Topology(String),

    /// A vehicle's state stopped being finite during a step.
    #[error("numerical instability in run {run}: vehicle {vehicle} at t = {time:.2} s")]
    Instability { run: usize, vehicle: usize, time: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shorthand result type used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;
