use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::policy::Policy;
use crate::ring::RingTopology;
use crate::stats::{RunStatistics, StatsAccumulator};
use crate::vehicle::{AccelerationModel, VehicleState};
use crate::VehicleId;
use log::{debug, info, trace};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// The order in which vehicles observe each other within a single step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOrder {
    /// Vehicles are updated in place one after another, so each vehicle sees
    /// the new position of the vehicle ahead of it if that one went first.
    #[default]
    Sequential,
    /// Every vehicle reacts to the state at the start of the step.
    Simultaneous,
}

/// The lifecycle of a [SimulationRun].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Vehicles are placed but no step has been taken.
    Setup,
    /// Steps remain to be taken.
    Stepping,
    /// Every step has been taken; statistics are ready to be emitted.
    CoolingDown,
    /// Statistics have been emitted.
    Finalized,
}

/// A single fixed-duration simulation of vehicles driving around a ring road.
#[derive(Clone, Debug)]
pub struct SimulationRun {
    /// The run number within its session.
    index: usize,
    /// The car following policy.
    policy: Policy,
    /// The acceleration model shared by all vehicles.
    model: AccelerationModel,
    /// The road.
    ring: RingTopology,
    /// The vehicles, front-most first. Each vehicle follows the one before it.
    vehicles: Vec<VehicleState>,
    /// How vehicles observe each other within a step.
    order: UpdateOrder,
    /// The time step in s.
    dt: f64,
    /// The number of steps in the run.
    total_steps: usize,
    /// The number of steps taken.
    frame: usize,
    /// Vehicle density in veh/m.
    density: f64,
    /// Statistics gathered after the warm-up.
    stats: StatsAccumulator,
    /// Vehicle positions at the start of the current step.
    prev_pos: Vec<f64>,
    phase: RunPhase,
}

impl SimulationRun {
    /// Places `vehicle_count` vehicles on a new ring road.
    ///
    /// The front vehicle sits at a fixed fraction of the visible road; each
    /// vehicle after it is a random distance further back. The road then wraps
    /// around a short distance behind the rearmost vehicle.
    pub fn new<R: Rng + ?Sized>(
        index: usize,
        vehicle_count: usize,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> SimResult<Self> {
        config.validate()?;
        if vehicle_count == 0 {
            return Err(SimError::Configuration(format!(
                "run {index} has no vehicles"
            )));
        }
        let road = &config.road;
        let spacing = Uniform::new(road.min_spacing, road.max_spacing);

        let mut pos = road.front_fraction * road.visible_length;
        let mut vehicles = Vec::with_capacity(vehicle_count);
        for id in 0..vehicle_count {
            if id > 0 {
                pos -= spacing.sample(rng);
            }
            vehicles.push(VehicleState::new(
                VehicleId(id),
                pos,
                road.initial_velocity,
                road.initial_acceleration,
            ));
        }

        let ring = RingTopology::spanning(pos - road.reentry_clearance, road.visible_length)?;
        Self::with_vehicles(index, vehicles, ring, config)
    }

    /// Creates a run from vehicles that have already been placed.
    ///
    /// `vehicles` must be ordered front-most first and lie on `ring`.
    pub fn with_vehicles(
        index: usize,
        vehicles: Vec<VehicleState>,
        ring: RingTopology,
        config: &SimulationConfig,
    ) -> SimResult<Self> {
        config.validate()?;
        if vehicles.is_empty() {
            return Err(SimError::Configuration(format!(
                "run {index} has no vehicles"
            )));
        }
        if let Some(veh) = vehicles.iter().find(|veh| !veh.is_finite()) {
            return Err(SimError::Topology(format!(
                "vehicle {} starts at a non-finite position",
                veh.id()
            )));
        }
        if let Some(veh) = vehicles.iter().find(|veh| !ring.contains(veh.pos())) {
            return Err(SimError::Topology(format!(
                "vehicle {} starts at {:.3} m, outside the road [{:.3}, {:.3})",
                veh.id(),
                veh.pos(),
                ring.origin(),
                ring.end()
            )));
        }
        let density = vehicles.len() as f64 / (ring.length() * config.road.density_scale);
        info!(
            "Running {} simulation no. {:>2} with {:>2} vehicles and road length of {:>3.0} meters",
            config.policy,
            index,
            vehicles.len(),
            ring.length()
        );
        Ok(Self {
            index,
            policy: config.policy,
            model: AccelerationModel::new(&config.model),
            ring,
            prev_pos: Vec::with_capacity(vehicles.len()),
            vehicles,
            order: config.update_order,
            dt: config.timing.dt,
            total_steps: config.total_steps(),
            frame: 0,
            density,
            stats: StatsAccumulator::new(config.timing.warm_up, config.timing.simulation_time),
            phase: RunPhase::Setup,
        })
    }

    /// The run number within its session.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The road being driven on.
    pub fn ring(&self) -> &RingTopology {
        &self.ring
    }

    /// The vehicles, front-most first.
    pub fn vehicles(&self) -> &[VehicleState] {
        &self.vehicles
    }

    /// Vehicle density in veh/m.
    pub fn density(&self) -> f64 {
        self.density
    }

    /// The current phase of the run.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The number of steps taken.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The simulated time elapsed in s.
    pub fn elapsed(&self) -> f64 {
        self.frame as f64 * self.dt
    }

    /// Whether every step of the run has been taken.
    pub fn is_complete(&self) -> bool {
        self.frame >= self.total_steps
    }

    /// Advances every vehicle by one time step.
    /// Does nothing once the run is complete.
    pub fn step(&mut self) -> SimResult<()> {
        if self.is_complete() {
            return Ok(());
        }
        self.phase = RunPhase::Stepping;

        self.prev_pos.clear();
        self.prev_pos.extend(self.vehicles.iter().map(|veh| veh.pos()));

        let snapshot = match self.order {
            UpdateOrder::Sequential => None,
            UpdateOrder::Simultaneous => Some(self.vehicles.clone()),
        };

        let count = self.vehicles.len();
        for idx in 0..count {
            let (lead, follower) = {
                let source = snapshot.as_deref().unwrap_or(&self.vehicles[..]);
                (source[lead_index(idx, count)], source[follow_index(idx, count)])
            };
            let ego = &mut self.vehicles[idx];
            self.policy
                .update(ego, &lead, &follower, &self.model, &self.ring, self.dt);
            if !ego.is_finite() {
                return Err(SimError::Instability {
                    run: self.index,
                    vehicle: idx,
                    time: self.elapsed(),
                });
            }
        }

        self.frame += 1;
        let elapsed = self.elapsed();
        trace!("Run {} stepped to t = {:.2} s", self.index, elapsed);
        self.stats.record(elapsed, &self.prev_pos, &self.vehicles);

        if self.is_complete() {
            self.phase = RunPhase::CoolingDown;
        }
        Ok(())
    }

    /// Emits the run's statistics. Every step must have been taken.
    pub fn finalize(&mut self) -> SimResult<RunStatistics> {
        if self.phase != RunPhase::CoolingDown {
            return Err(SimError::Configuration(format!(
                "run {} cannot be finalized in phase {:?}",
                self.index, self.phase
            )));
        }
        let stats = self.stats.finish(self.density)?;
        self.phase = RunPhase::Finalized;
        debug!(
            "Run {} finished: density {:.4} veh/m, speed {:.3} m/s, flow {:.3} veh/s",
            self.index, stats.density, stats.average_speed, stats.flow
        );
        Ok(stats)
    }

    /// Steps the run to completion and emits its statistics.
    pub fn run_to_completion(&mut self) -> SimResult<RunStatistics> {
        while !self.is_complete() {
            self.step()?;
        }
        self.finalize()
    }
}

/// The index of the vehicle ahead of `idx`. The front vehicle follows the rearmost.
fn lead_index(idx: usize, count: usize) -> usize {
    if idx == 0 {
        count - 1
    } else {
        idx - 1
    }
}

/// The index of the vehicle behind `idx`. The rearmost vehicle is followed by the front.
fn follow_index(idx: usize, count: usize) -> usize {
    if idx + 1 == count {
        0
    } else {
        idx + 1
    }
}
