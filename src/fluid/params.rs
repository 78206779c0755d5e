//! Fluid simulation parameters.
//!
//! [`FluidParams`] is the live-tunable parameter store: the input layer writes
//! it every frame and the simulation only ever reads it. [`FluidConstants`]
//! describes the static world the particles live in.

use std::ops::RangeInclusive;

use bevy::math::DVec3;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest time increment a single physics step may integrate over.
pub const MAX_SIMULATION_DT: f64 = 1.0 / 60.0;

/// Pairs closer than this are treated as coincident and skipped by the
/// collision and force passes.
pub const MIN_SEPARATION: f64 = 1e-9;

/// Live-tuning limits. Every pass is quadratic in the particle count.
pub const PARTICLE_COUNT_RANGE: RangeInclusive<usize> = 1..=2500;
pub const REST_DENSITY_RANGE: RangeInclusive<f64> = 0.5..=20.0;
pub const SPAWN_VELOCITY_LIMIT: i32 = 15;

/// Live-tunable parameters, sampled once per frame.
#[derive(Resource, Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct FluidParams {
    /// Tear down and respawn every particle this frame.
    pub reset: bool,

    /// Apply gravity along -z.
    pub gravity_enabled: bool,

    /// Run the near-contact collision pass.
    pub collisions_enabled: bool,

    /// Viscosity coefficient for the pairwise velocity drag.
    pub viscosity: f64,

    /// Target density. The pairwise pressure term is proportional to the
    /// pair's combined density minus twice this value.
    pub rest_density: f64,

    /// Multiplicative velocity attenuation, applied on every bounce and
    /// folded into the pairwise force terms.
    pub damping: f64,

    /// Pressure stiffness.
    pub stiffness: f64,

    /// Number of particles spawned on the next reset.
    pub particle_count: usize,

    /// Velocity bias for spawned particles. Each component is jittered by ±1.
    pub spawn_velocity: [i32; 3],
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            reset: false,
            gravity_enabled: true,
            collisions_enabled: true,
            viscosity: 0.1,
            rest_density: 5.0,
            damping: 0.98,
            stiffness: 3.0,
            particle_count: 1000,
            spawn_velocity: [0, 0, 0],
        }
    }
}

impl FluidParams {
    /// Request a full respawn on the next step.
    pub fn request_reset(&mut self) {
        self.reset = true;
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_spawn_velocity(mut self, velocity: [i32; 3]) -> Self {
        self.spawn_velocity = velocity;
        self
    }

    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.gravity_enabled = enabled;
        self
    }

    pub fn with_collisions(mut self, enabled: bool) -> Self {
        self.collisions_enabled = enabled;
        self
    }

    /// Spawn velocity bias as a vector.
    pub fn spawn_velocity_bias(&self) -> DVec3 {
        let [x, y, z] = self.spawn_velocity;
        DVec3::new(f64::from(x), f64::from(y), f64::from(z))
    }

    /// Pressure a particle of the given density would feel in isolation.
    #[inline]
    pub fn pressure_for(&self, density: f64) -> f64 {
        self.stiffness * (density - self.rest_density)
    }
}

/// Closed interval along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.end
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }
}

/// Box particles are spawned into on reset.
#[derive(Clone, Copy, Debug, PartialEq, Reflect, Serialize, Deserialize)]
pub struct SpawnRegion {
    pub x: Span,
    pub y: Span,
    pub z: Span,
}

impl Default for SpawnRegion {
    fn default() -> Self {
        Self {
            x: Span::new(2.0, 18.0),
            y: Span::new(2.0, 18.0),
            z: Span::new(10.0, 18.0),
        }
    }
}

impl SpawnRegion {
    pub fn contains(&self, point: DVec3) -> bool {
        self.x.contains(point.x) && self.y.contains(point.y) && self.z.contains(point.z)
    }
}

/// Static description of the simulated world.
///
/// The domain is z-up: gravity pulls along -z and the floor is `z = 0`.
/// Upper bounds are checked as x against `width`, y against `depth` and z
/// against `height`.
#[derive(Resource, Clone, Debug, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Resource)]
#[serde(default)]
pub struct FluidConstants {
    /// Particle radius. Collisions trigger below one radius of separation,
    /// density and forces consider neighbours within two.
    pub particle_radius: f64,

    /// Gravity acceleration magnitude.
    pub gravity: f64,

    /// Extent along x.
    pub width: f64,

    /// Extent along z.
    pub height: f64,

    /// Extent along y.
    pub depth: f64,

    /// Height of the floor the particles bounce off.
    pub floor: f64,

    /// Where particles appear on reset.
    pub spawn_region: SpawnRegion,
}

impl Default for FluidConstants {
    fn default() -> Self {
        Self {
            particle_radius: 1.0,
            gravity: 9.8,
            width: 20.0,
            height: 20.0,
            depth: 20.0,
            floor: 0.0,
            spawn_region: SpawnRegion::default(),
        }
    }
}

impl FluidConstants {
    /// Separation below which two particles collide.
    #[inline]
    pub fn collision_distance(&self) -> f64 {
        self.particle_radius
    }

    /// Separation below which two particles interact through density and forces.
    #[inline]
    pub fn interaction_distance(&self) -> f64 {
        2.0 * self.particle_radius
    }

    /// Lower corner of the containment box.
    pub fn bounds_min(&self) -> DVec3 {
        DVec3::new(0.0, 0.0, self.floor)
    }

    /// Upper corner of the containment box.
    pub fn bounds_max(&self) -> DVec3 {
        DVec3::new(self.width, self.depth, self.height)
    }

    /// Whether a point lies inside the containment box, boundary included.
    pub fn contains(&self, point: DVec3) -> bool {
        let min = self.bounds_min();
        let max = self.bounds_max();
        point.cmpge(min).all() && point.cmple(max).all()
    }
}
