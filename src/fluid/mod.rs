//! Brute-force particle fluid for Bevy.
//!
//! Every pair of particles interacts directly; there is no neighbour grid.
//! Each frame runs a fixed sequence of passes over one contiguous
//! [`particle::ParticleSet`]:
//!
//! 1. optional reset (teardown and respawn)
//! 2. [`collision`]: removes closing velocity between touching pairs
//! 3. [`density`]: overlap-volume density and pressure
//! 4. [`solver`]: pairwise viscosity and pressure forces
//! 5. [`integrator`]: gravity, motion and [`boundary`] containment
//!
//! then hands every particle to a [`simulation::PresentationSink`].
//!
//! # Architecture
//!
//! - [`params`]: live-tunable parameters and world constants
//! - [`config`]: RON presets
//! - [`clock`]: clamped simulation timestep
//! - [`simulation`]: the per-frame orchestrator
//! - [`render`]: particle visuals driven by the presentation sink
//! - [`plugin`]: Bevy plugin and keyboard parameter source
//!
//! # Example
//!
//! ```rust,no_run
//! use tidepool::fluid::prelude::*;
//!
//! let params = FluidParams::default().with_particle_count(200);
//! let mut simulation = FluidSimulation::with_seed(FluidConstants::default(), 1);
//! simulation.start(&params);
//!
//! for _ in 0..60 {
//!     simulation.step(&params, SimulationClock::fixed_60hz(), &mut ());
//! }
//! ```

pub mod boundary;
pub mod clock;
pub mod collision;
pub mod config;
pub mod density;
pub mod integrator;
pub mod params;
pub mod particle;
pub mod plugin;
pub mod render;
pub mod simulation;
pub mod solver;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::boundary::*;
    pub use super::clock::*;
    pub use super::collision::*;
    pub use super::config::*;
    pub use super::density::*;
    pub use super::integrator::*;
    pub use super::params::*;
    pub use super::particle::*;
    pub use super::plugin::*;
    pub use super::render::*;
    pub use super::simulation::*;
    pub use super::solver::*;
}
