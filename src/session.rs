//! Multi-run sessions that sweep vehicle counts to build the fundamental diagram.

use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::ring::RingTopology;
use crate::simulation::SimulationRun;
use crate::stats::RunStatistics;
use crate::vehicle::VehicleState;
use itertools::{Itertools, MinMaxResult};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

/// Spreads consecutive run numbers across the seed space.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// A vehicle's position at the end of a step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// The run number, counting from 1.
    pub run: usize,
    /// The vehicle's ID within its run.
    pub vehicle: usize,
    /// The simulated time in s.
    pub time: f64,
    /// The position on the ring in m.
    pub position: f64,
}

/// The statistics of every finalized run, in run order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalDiagram {
    runs: Vec<RunStatistics>,
}

impl FundamentalDiagram {
    /// Appends the statistics of a finalized run.
    pub fn push(&mut self, stats: RunStatistics) {
        self.runs.push(stats);
    }

    /// The statistics of each run, in run order.
    pub fn runs(&self) -> &[RunStatistics] {
        &self.runs
    }

    /// The `(density, speed)` samples in run order.
    pub fn speed_density(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.runs.iter().map(RunStatistics::speed_sample)
    }

    /// The `(density, flow)` samples in run order.
    pub fn flow_density(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.runs.iter().map(RunStatistics::flow_sample)
    }

    /// The lowest and highest densities sampled, if any run has finished.
    pub fn density_range(&self) -> Option<(f64, f64)> {
        match self.runs.iter().map(|run| run.density).minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(d) => Some((d, d)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// The run with the highest flow: the capacity of the road.
    pub fn capacity(&self) -> Option<&RunStatistics> {
        self.runs.iter().max_by(|a, b| a.flow.total_cmp(&b.flow))
    }
}

/// Callbacks invoked while a [Session] runs, for rendering or progress reporting.
///
/// Observers only see vehicle state read-only. All methods have no-op defaults.
pub trait SessionObserver {
    /// Called after a run's vehicles have been placed.
    fn on_run_start(&mut self, _run: usize, _ring: &RingTopology, _vehicles: &[VehicleState]) {}

    /// Called after every step. Returning [ControlFlow::Break] ends the session;
    /// the run in progress is discarded.
    fn on_step(&mut self, _run: usize, _time: f64, _vehicles: &[VehicleState]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called when a run's statistics have been emitted.
    fn on_run_end(&mut self, _run: usize, _stats: &RunStatistics) {}
}

/// A [SessionObserver] that does nothing.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every run was finalized.
    Completed,
    /// An observer stopped the session during the given run.
    Cancelled { run: usize },
}

/// A sequence of runs with varying vehicle counts.
pub struct Session {
    config: SimulationConfig,
    /// The vehicle count of each run, in run order.
    counts: Vec<usize>,
    diagram: FundamentalDiagram,
    trajectory: Vec<TrajectoryPoint>,
    record_trajectory: bool,
}

impl Session {
    /// Validates the configuration and fixes the order of the runs.
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let mut counts = config.session.vehicle_counts.clone();
        if config.session.shuffle_counts {
            let mut rng = StdRng::seed_from_u64(config.session.seed);
            counts.shuffle(&mut rng);
        }
        counts.truncate(config.session.total_runs);
        Ok(Self {
            config,
            counts,
            diagram: Default::default(),
            trajectory: vec![],
            record_trajectory: true,
        })
    }

    /// Sets whether vehicle positions are recorded every step.
    pub fn set_record_trajectory(&mut self, record: bool) {
        self.record_trajectory = record;
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The vehicle count of each run, in run order.
    pub fn run_order(&self) -> &[usize] {
        &self.counts
    }

    /// The statistics of every finalized run.
    pub fn diagram(&self) -> &FundamentalDiagram {
        &self.diagram
    }

    /// Every recorded vehicle position, in the order recorded.
    pub fn trajectory(&self) -> &[TrajectoryPoint] {
        &self.trajectory
    }

    /// Executes every run.
    pub fn run(&mut self) -> SimResult<&FundamentalDiagram> {
        self.run_with(&mut NoopObserver)?;
        Ok(&self.diagram)
    }

    /// Executes every run, reporting progress to `observer`.
    ///
    /// Runs that were finalized before an observer cancels the session keep
    /// their statistics and trajectory; the cancelled run leaves no trace.
    /// Calling this again after a cancellation resumes from the cancelled run.
    pub fn run_with<O: SessionObserver + ?Sized>(
        &mut self,
        observer: &mut O,
    ) -> SimResult<SessionOutcome> {
        let start = self.diagram.runs().len();
        for (offset, &count) in self.counts[start..].iter().enumerate() {
            let index = start + offset + 1;
            let mut rng = StdRng::seed_from_u64(run_seed(self.config.session.seed, index));
            let mut run = SimulationRun::new(index, count, &self.config, &mut rng)?;
            let recorded = self.trajectory.len();
            observer.on_run_start(index, run.ring(), run.vehicles());

            while !run.is_complete() {
                run.step()?;
                if self.record_trajectory {
                    let time = run.elapsed();
                    self.trajectory
                        .extend(run.vehicles().iter().map(|veh| TrajectoryPoint {
                            run: index,
                            vehicle: veh.id().0,
                            time,
                            position: veh.pos(),
                        }));
                }
                if observer
                    .on_step(index, run.elapsed(), run.vehicles())
                    .is_break()
                {
                    warn!("Session cancelled during run {index}; its statistics are discarded");
                    self.trajectory.truncate(recorded);
                    return Ok(SessionOutcome::Cancelled { run: index });
                }
            }

            let stats = run.finalize()?;
            observer.on_run_end(index, &stats);
            self.diagram.push(stats);
        }
        info!("Session finished after {} runs", self.diagram.runs().len());
        Ok(SessionOutcome::Completed)
    }
}

/// The seed for the random placement of a run's vehicles.
fn run_seed(seed: u64, run: usize) -> u64 {
    seed ^ (run as u64).wrapping_mul(MIXING_CONSTANT)
}
