//! End-to-end tests of vehicles driving around a ring road.

use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ring_traffic::{
    export, Policy, RingTopology, Session, SimulationConfig, SimulationRun, UpdateOrder,
    VehicleId, VehicleState,
};

fn config(policy: Policy) -> SimulationConfig {
    SimulationConfig {
        policy,
        ..Default::default()
    }
}

fn five_vehicle_run(policy: Policy, seed: u64) -> SimulationRun {
    let mut rng = StdRng::seed_from_u64(seed);
    SimulationRun::new(1, 5, &config(policy), &mut rng).unwrap()
}

/// Test that a lone vehicle on a long loop settles at its desired velocity.
#[test]
fn lone_vehicle_reaches_free_flow() {
    let mut config = config(Policy::Idm);
    config.timing.simulation_time = 300.0;
    config.timing.warm_up = 250.0;
    let ring = RingTopology::new(0.0, 100_000.0).unwrap();
    let vehicle = VehicleState::new(VehicleId(0), 10.0, 0.0, 0.0);
    let mut run = SimulationRun::with_vehicles(1, vec![vehicle], ring, &config).unwrap();

    let mut vel = 0.0;
    while !run.is_complete() {
        run.step().unwrap();
        vel = run.vehicles()[0].vel();
        assert!(vel <= 25.0);
    }
    assert!(vel > 24.5 && vel <= 25.0, "velocity {vel}");
    let stats = run.finalize().unwrap();
    assert!(stats.average_speed > 24.5);
}

/// Test that a lone vehicle treats itself as the vehicle ahead, a full lap away.
#[test]
fn lone_vehicle_follows_itself() {
    let config = config(Policy::Idm);
    let ring = RingTopology::new(0.0, 40.0).unwrap();
    let vehicle = VehicleState::new(VehicleId(0), 10.0, 5.0, 0.0);
    let mut run = SimulationRun::with_vehicles(1, vec![vehicle], ring, &config).unwrap();
    run.step().unwrap();

    let model = ring_traffic::AccelerationModel::new(&config.model);
    assert_approx_eq!(run.vehicles()[0].acc(), model.idm(40.0, 5.0, 5.0));
}

/// Test that velocities never go negative and positions stay on the ring.
#[test]
fn vehicles_stay_on_the_ring() {
    for policy in [Policy::Idm, Policy::Custom] {
        for order in [UpdateOrder::Sequential, UpdateOrder::Simultaneous] {
            let mut config = config(policy);
            config.update_order = order;
            let mut rng = StdRng::seed_from_u64(3);
            let mut run = SimulationRun::new(1, 40, &config, &mut rng).unwrap();
            let ring = *run.ring();
            while !run.is_complete() {
                run.step().unwrap();
                for veh in run.vehicles() {
                    assert!(veh.vel() >= 0.0);
                    assert!(veh.pos() >= ring.origin() && veh.pos() < ring.end());
                }
            }
        }
    }
}

/// Test that a run is reproducible bit for bit from its seed.
#[test]
fn run_is_deterministic() {
    for policy in [Policy::Idm, Policy::Custom] {
        let a = five_vehicle_run(policy, 175175175).run_to_completion().unwrap();
        let b = five_vehicle_run(policy, 175175175).run_to_completion().unwrap();
        assert_eq!(a.density.to_bits(), b.density.to_bits());
        assert_eq!(a.average_speed.to_bits(), b.average_speed.to_bits());
        assert_eq!(a.flow.to_bits(), b.flow.to_bits());
        assert!(a.density > 0.0);
        assert!(a.average_speed >= 0.0 && a.average_speed <= 25.0);
        assert!(a.flow >= 0.0);
    }
}

/// Test that the creeping test policy speeds up by a fixed amount every step.
#[test]
fn test_policy_statistics() {
    let stats = five_vehicle_run(Policy::Test, 11).run_to_completion().unwrap();
    // Speeds after steps 151 to 300 are 25 + 0.1 k, averaging 25 + 22.55.
    assert_approx_eq!(stats.average_speed, 47.55, 1e-9);
}

/// Test that flow counts every vehicle passing the wrap point after the warm up.
#[test]
fn flow_counts_wrap_crossings() {
    let mut config = config(Policy::Test);
    config.timing.simulation_time = 20.0;
    config.timing.warm_up = 10.0;
    // Vehicles creep 1 m/s around a 2.5 m loop: four crossings each in 10 s.
    let ring = RingTopology::new(0.0, 2.5).unwrap();
    let vehicles = vec![
        VehicleState::new(VehicleId(0), 2.05, 0.0, 0.0),
        VehicleState::new(VehicleId(1), 0.85, 0.0, 0.0),
    ];
    let mut run = SimulationRun::with_vehicles(1, vehicles, ring, &config).unwrap();
    let stats = run.run_to_completion().unwrap();
    assert_approx_eq!(stats.flow, 8.0 / 10.0);
    assert_approx_eq!(stats.density, 2.0 / (2.5 * 0.04));
}

/// Test that a whole session is reproducible.
#[test]
fn session_is_deterministic() {
    let mut config = config(Policy::Custom);
    config.session.vehicle_counts = vec![1, 2, 5, 12, 30];
    config.session.total_runs = 5;

    let mut a = Session::new(config.clone()).unwrap();
    let mut b = Session::new(config).unwrap();
    let a = a.run().unwrap().clone();
    let b = b.run().unwrap().clone();
    assert_eq!(a, b);
    assert_eq!(a.runs().len(), 5);
}

/// Test that the exported tables hold one row per run.
#[test]
fn export_tables() {
    let mut config = config(Policy::Idm);
    config.session.vehicle_counts = vec![2, 4];
    config.session.total_runs = 2;
    let mut session = Session::new(config).unwrap();
    session.run().unwrap();

    let dir = std::env::temp_dir().join(format!("ring-traffic-export-{}", std::process::id()));
    let written = export::write_diagram(&dir, session.diagram()).unwrap();
    assert_eq!(written.len(), 3);

    let speed = std::fs::read_to_string(dir.join(export::SPEED_DENSITY_FILE)).unwrap();
    let mut lines = speed.lines();
    assert_eq!(lines.next(), Some("density,speed"));
    assert_eq!(lines.count(), 2);

    let flow = std::fs::read_to_string(dir.join(export::FLOW_DENSITY_FILE)).unwrap();
    assert!(flow.starts_with("density,flow"));

    let path = dir.join(export::TRAJECTORY_FILE);
    export::write_trajectory(&path, session.trajectory()).unwrap();
    let trajectory = std::fs::read_to_string(&path).unwrap();
    assert!(trajectory.starts_with("Simulation No,Car,Time,Position"));
    assert_eq!(trajectory.lines().count(), 1 + (2 + 4) * 300);

    std::fs::remove_dir_all(&dir).unwrap();
}
