//! Fluid simulation core logic.
//!
//! [`FluidSimulation`] owns the particles and runs one step per rendered
//! frame: an optional reset, then collision, density, force and integration
//! passes over every pair of particles, then a hand-off of each particle's
//! final state to a [`PresentationSink`].

use bevy::log::{debug, info};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::clock::SimulationClock;
use super::collision::CollisionResolver;
use super::density::DensityEstimator;
use super::integrator::Integrator;
use super::params::{FluidConstants, FluidParams};
use super::particle::{Particle, ParticleSet};
use super::solver::ForceSolver;

/// Receiver for per-particle state at the end of every step.
///
/// Implementations own whatever they draw with and key it by particle
/// index; the simulation never hands out or stores handles.
pub trait PresentationSink {
    /// Called exactly once per particle per step, after integration.
    fn present(&mut self, index: usize, particle: &Particle);

    /// Called when every particle is about to be discarded by a reset.
    fn release(&mut self) {}
}

impl PresentationSink for () {
    fn present(&mut self, _index: usize, _particle: &Particle) {}
}

/// Where the simulation is within a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimulationPhase {
    #[default]
    Running,
    /// Tearing down and respawning. Never observable between frames.
    Resetting,
}

/// What happened during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// The particle set was rebuilt this step.
    pub reset: bool,
    /// Pairs corrected by the collision pass.
    pub collisions: usize,
    /// Boundary faces hit during integration.
    pub bounces: u32,
    /// Timestep the passes integrated with.
    pub dt: f64,
}

/// Main fluid simulation resource.
#[derive(Resource)]
pub struct FluidSimulation {
    constants: FluidConstants,
    /// Constants to switch to on the next reset.
    pending_constants: Option<FluidConstants>,
    particles: ParticleSet,
    phase: SimulationPhase,
    rng: StdRng,
    frame: u64,
}

impl Default for FluidSimulation {
    fn default() -> Self {
        Self::new(FluidConstants::default())
    }
}

impl FluidSimulation {
    /// Creates an empty simulation with an entropy-seeded spawner.
    pub fn new(constants: FluidConstants) -> Self {
        Self::with_rng(constants, StdRng::from_entropy())
    }

    /// Creates an empty simulation whose spawns are reproducible.
    pub fn with_seed(constants: FluidConstants, seed: u64) -> Self {
        Self::with_rng(constants, StdRng::seed_from_u64(seed))
    }

    fn with_rng(constants: FluidConstants, rng: StdRng) -> Self {
        Self {
            constants,
            pending_constants: None,
            particles: ParticleSet::default(),
            phase: SimulationPhase::Running,
            rng,
            frame: 0,
        }
    }

    /// Returns the number of particles.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &ParticleSet {
        &self.particles
    }

    /// Direct access for setting up scenarios.
    pub fn particles_mut(&mut self) -> &mut ParticleSet {
        &mut self.particles
    }

    pub fn constants(&self) -> &FluidConstants {
        &self.constants
    }

    /// Queue new world constants. They replace the current ones wholesale at
    /// the next reset so a run never sees a mix of old and new values.
    pub fn replace_constants_on_reset(&mut self, constants: FluidConstants) {
        self.pending_constants = Some(constants);
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Number of steps run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Populate the set for the first time.
    pub fn start(&mut self, params: &FluidParams) {
        self.spawn(params);
    }

    /// Discard every particle and spawn `params.particle_count` fresh ones.
    ///
    /// The sink is told to release its resources before the old particles go.
    pub fn reset(&mut self, params: &FluidParams, sink: &mut impl PresentationSink) {
        self.phase = SimulationPhase::Resetting;

        sink.release();
        self.particles.clear();
        if let Some(constants) = self.pending_constants.take() {
            self.constants = constants;
        }
        self.spawn(params);

        self.phase = SimulationPhase::Running;
    }

    fn spawn(&mut self, params: &FluidParams) {
        self.particles.respawn(
            params.particle_count,
            &self.constants.spawn_region,
            params,
            &mut self.rng,
        );
        info!("Spawned {} fluid particles", self.particles.len());
    }

    /// Runs one simulation step.
    ///
    /// A requested reset completes first, and the fresh particles take part
    /// in the same step. The passes always run in the order collision,
    /// density, forces, integration; collision is skipped when disabled.
    pub fn step(
        &mut self,
        params: &FluidParams,
        clock: SimulationClock,
        sink: &mut impl PresentationSink,
    ) -> StepReport {
        let mut report = StepReport {
            dt: clock.simulation_delta(),
            ..default()
        };

        if params.reset {
            self.reset(params, sink);
            report.reset = true;
        }

        let dt = report.dt;
        let constants = &self.constants;
        let particles = self.particles.as_mut_slice();

        if params.collisions_enabled {
            report.collisions = CollisionResolver::resolve(particles, constants);
        }

        DensityEstimator::estimate(particles, constants, params);

        ForceSolver::apply(particles, constants, params, dt);

        report.bounces = Integrator::integrate(particles, constants, params, dt);

        for (index, particle) in particles.iter().enumerate() {
            sink.present(index, particle);
        }

        self.frame += 1;
        debug!(
            "Fluid step {}: {} particles, {} collisions, {} bounces",
            self.frame,
            particles.len(),
            report.collisions,
            report.bounces
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::DVec3;

    /// Records what the simulation presents.
    #[derive(Default)]
    struct Recorder {
        presented: Vec<(usize, Particle)>,
        releases: usize,
    }

    impl PresentationSink for Recorder {
        fn present(&mut self, index: usize, particle: &Particle) {
            self.presented.push((index, *particle));
        }

        fn release(&mut self) {
            self.releases += 1;
            self.presented.clear();
        }
    }

    fn seeded(count: usize) -> (FluidSimulation, FluidParams) {
        let params = FluidParams::default().with_particle_count(count);
        let mut sim = FluidSimulation::with_seed(FluidConstants::default(), 42);
        sim.start(&params);
        (sim, params)
    }

    #[test]
    fn test_start_spawns_requested_count() {
        let (sim, _) = seeded(100);

        assert_eq!(sim.num_particles(), 100);
        let region = sim.constants().spawn_region;
        assert!(sim.particles().iter().all(|p| region.contains(p.position)));
    }

    #[test]
    fn test_count_conserved_without_reset() {
        let (mut sim, params) = seeded(60);

        for _ in 0..10 {
            sim.step(&params, SimulationClock::fixed_60hz(), &mut ());
        }

        assert_eq!(sim.num_particles(), 60);
        assert_eq!(sim.frame(), 10);
    }

    #[test]
    fn test_reset_changes_count() {
        let (mut sim, mut params) = seeded(1000);
        assert_eq!(sim.num_particles(), 1000);

        params.reset = true;
        params.particle_count = 50;
        let mut sink = Recorder::default();
        let report = sim.step(&params, SimulationClock::fixed_60hz(), &mut sink);

        assert!(report.reset);
        assert_eq!(sim.num_particles(), 50);
        assert_eq!(sink.releases, 1);
        assert_eq!(sim.phase(), SimulationPhase::Running);
        // The fresh particles were stepped and presented in the same frame.
        assert_eq!(sink.presented.len(), 50);
        assert!(sim.particles().iter().all(|p| p.density > 0.0));
    }

    #[test]
    fn test_every_particle_presented_once_in_order() {
        let (mut sim, params) = seeded(25);
        let mut sink = Recorder::default();

        sim.step(&params, SimulationClock::fixed_60hz(), &mut sink);

        let indices: Vec<usize> = sink.presented.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, (0..25).collect::<Vec<_>>());
        for (index, particle) in &sink.presented {
            assert_eq!(sim.particles()[*index], *particle);
            assert_eq!(particle.viscosity, params.viscosity);
        }
    }

    #[test]
    fn test_positions_stay_in_bounds() {
        let (mut sim, params) = seeded(200);

        for _ in 0..120 {
            sim.step(&params, SimulationClock::new(0.25), &mut ());
            for p in sim.particles().iter() {
                assert!(sim.constants().contains(p.position), "escaped: {:?}", p.position);
                assert!(p.is_finite());
            }
        }
    }

    #[test]
    fn test_gravity_only_drift() {
        let constants = FluidConstants::default();
        let gravity = constants.gravity;
        let mut sim = FluidSimulation::with_seed(constants, 0);
        sim.particles_mut()
            .push(Particle::new(DVec3::new(10.0, 10.0, 19.0)));
        let params = FluidParams::default().with_collisions(false);

        for k in 1..=30 {
            sim.step(&params, SimulationClock::fixed_60hz(), &mut ());
            let vz = sim.particles()[0].velocity.z;
            assert!((vz + gravity * k as f64 / 60.0).abs() < 1e-9, "step {k}: vz = {vz}");
        }

        // Fall until the floor reflects and damps it.
        let dt = 1.0 / 60.0;
        let mut bounced = false;
        for _ in 0..600 {
            let vz_before = sim.particles()[0].velocity.z;
            let report = sim.step(&params, SimulationClock::fixed_60hz(), &mut ());
            if report.bounces > 0 {
                let p = sim.particles()[0];
                let expected = -(vz_before - gravity * dt) * params.damping;
                assert_eq!(report.bounces, 1);
                assert_eq!(p.position.z, 0.0);
                assert!((p.velocity.z - expected).abs() < 1e-12, "vz = {}", p.velocity.z);
                assert!(p.velocity.z > 0.0);
                bounced = true;
                break;
            }
        }
        assert!(bounced);
    }

    #[test]
    fn test_stalled_frame_uses_clamped_dt() {
        let (mut sim, params) = seeded(3);

        let report = sim.step(&params, SimulationClock::new(2.0), &mut ());

        assert_eq!(report.dt, 1.0 / 60.0);
    }

    #[test]
    fn test_collisions_disabled_skips_pass() {
        let mut sim = FluidSimulation::with_seed(FluidConstants::default(), 0);
        sim.particles_mut().push(
            Particle::new(DVec3::new(5.0, 5.0, 5.0)).with_velocity(DVec3::new(1.0, 0.0, 0.0)),
        );
        sim.particles_mut().push(
            Particle::new(DVec3::new(5.5, 5.0, 5.0)).with_velocity(DVec3::new(-1.0, 0.0, 0.0)),
        );
        let params = FluidParams {
            viscosity: 0.0,
            stiffness: 0.0,
            ..FluidParams::default()
        }
        .with_collisions(false)
        .with_gravity(false);

        let report = sim.step(&params, SimulationClock::fixed_60hz(), &mut ());

        assert_eq!(report.collisions, 0);

        let params = params.with_collisions(true);
        let report = sim.step(&params, SimulationClock::fixed_60hz(), &mut ());
        assert_eq!(report.collisions, 1);
    }

    #[test]
    fn test_constants_swap_on_reset_only() {
        let (mut sim, mut params) = seeded(10);
        let wide = FluidConstants {
            width: 40.0,
            ..FluidConstants::default()
        };

        sim.replace_constants_on_reset(wide.clone());
        sim.step(&params, SimulationClock::fixed_60hz(), &mut ());
        assert_eq!(sim.constants().width, 20.0);

        params.reset = true;
        sim.step(&params, SimulationClock::fixed_60hz(), &mut ());
        assert_eq!(sim.constants(), &wide);
    }

    #[test]
    fn test_same_seed_same_spawn() {
        let (a, _) = seeded(30);
        let (b, _) = seeded(30);

        assert_eq!(a.particles().as_slice(), b.particles().as_slice());
    }
}
