//! Tidepool - a real-time particle fluid for Bevy
//!
//! Particles interact pairwise through a near-contact collision response, an
//! overlap-volume density estimate, and viscosity and pressure forces, then
//! bounce around inside a damped box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use tidepool::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(FluidPlugin::new(FluidConfig::load_or_default("fluid.ron").0))
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands) {
//!     commands.spawn((
//!         Camera3d::default(),
//!         Transform::from_xyz(10.0, 14.0, 45.0).looking_at(Vec3::new(10.0, 6.0, 10.0), Vec3::Y),
//!     ));
//! }
//! ```
//!
//! The simulation core does not need an `App`; see [`fluid`] for driving
//! [`fluid::simulation::FluidSimulation`] directly.

pub mod fluid;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fluid::prelude::*;
}
