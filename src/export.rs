//! Writes session results to disk.
//!
//! Three CSV tables are produced in the output directory:
//! - `speed_density_data.csv` with columns `density,speed`
//! - `flow_density_data.csv` with columns `density,flow`
//! - `trajectory.csv` with one row per vehicle per step
//!
//! Rows appear in run order.

use crate::error::SimResult;
use crate::session::{FundamentalDiagram, TrajectoryPoint};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const SPEED_DENSITY_FILE: &str = "speed_density_data.csv";
pub const FLOW_DENSITY_FILE: &str = "flow_density_data.csv";
pub const TRAJECTORY_FILE: &str = "trajectory.csv";
pub const SUMMARY_FILE: &str = "fundamental_diagram.json";

#[derive(Serialize)]
struct SpeedRow {
    density: f64,
    speed: f64,
}

#[derive(Serialize)]
struct FlowRow {
    density: f64,
    flow: f64,
}

#[derive(Serialize)]
struct TrajectoryRow {
    #[serde(rename = "Simulation No")]
    run: usize,
    #[serde(rename = "Car")]
    vehicle: usize,
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "Position")]
    position: f64,
}

/// Writes the `(density, speed)` samples.
pub fn write_speed_density(path: &Path, diagram: &FundamentalDiagram) -> SimResult<()> {
    let mut writer = Writer::from_path(path)?;
    for (density, speed) in diagram.speed_density() {
        writer.serialize(SpeedRow { density, speed })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the `(density, flow)` samples.
pub fn write_flow_density(path: &Path, diagram: &FundamentalDiagram) -> SimResult<()> {
    let mut writer = Writer::from_path(path)?;
    for (density, flow) in diagram.flow_density() {
        writer.serialize(FlowRow { density, flow })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes every recorded vehicle position.
pub fn write_trajectory(path: &Path, points: &[TrajectoryPoint]) -> SimResult<()> {
    let mut writer = Writer::from_path(path)?;
    for point in points {
        writer.serialize(TrajectoryRow {
            run: point.run,
            vehicle: point.vehicle,
            time: point.time,
            position: point.position,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the whole diagram as pretty-printed JSON.
pub fn write_summary(path: &Path, diagram: &FundamentalDiagram) -> SimResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, diagram)?;
    Ok(())
}

/// Writes the two fundamental diagram tables and the JSON summary into `dir`,
/// returning the paths written.
pub fn write_diagram(dir: &Path, diagram: &FundamentalDiagram) -> SimResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let speed = dir.join(SPEED_DENSITY_FILE);
    let flow = dir.join(FLOW_DENSITY_FILE);
    let summary = dir.join(SUMMARY_FILE);
    write_speed_density(&speed, diagram)?;
    write_flow_density(&flow, diagram)?;
    write_summary(&summary, diagram)?;
    Ok(vec![speed, flow, summary])
}
