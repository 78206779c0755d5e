//! Fluid particle data structures and spawning utilities.
//!
//! Particles are plain values stored contiguously in a [`ParticleSet`] and
//! addressed by index. They hold no reference to anything they are drawn
//! with; the presentation layer keys its own resources by particle index.

use bevy::math::DVec3;
use rand::Rng;

use super::params::{FluidParams, SpawnRegion};

/// State of a single fluid particle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    /// World-space position.
    pub position: DVec3,
    /// World-space velocity.
    pub velocity: DVec3,
    /// Overlap density estimated this frame.
    pub density: f64,
    /// Pressure implied by `density`, kept for inspection.
    pub pressure: f64,
    /// Per-particle viscosity.
    pub viscosity: f64,
}

impl Particle {
    /// Create a particle at rest at a given position.
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a particle with initial velocity.
    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Mean of the velocity components, signed.
    pub fn mean_velocity_component(&self) -> f64 {
        (self.velocity.x + self.velocity.y + self.velocity.z) / 3.0
    }

    /// Check that no field has gone NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.density.is_finite()
            && self.pressure.is_finite()
    }
}

/// Contiguous, index-addressed particle storage.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
    particles: Vec<Particle>,
}

impl ParticleSet {
    /// Create an empty set with room for `capacity` particles.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    /// Build a set from explicit particles.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    /// Get the number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Add a particle, returning its index.
    pub fn push(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Remove all particles.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Replace the contents with `count` freshly spawned particles.
    ///
    /// Positions are uniform inside `region`. Velocities are uniform in
    /// `params.spawn_velocity ± 1` per axis. Density, pressure and
    /// viscosity start at zero.
    pub fn respawn(
        &mut self,
        count: usize,
        region: &SpawnRegion,
        params: &FluidParams,
        rng: &mut impl Rng,
    ) {
        self.particles.clear();
        self.particles.reserve(count);

        let bias = params.spawn_velocity_bias();
        for _ in 0..count {
            let position = DVec3::new(
                sample(rng, region.x.start, region.x.end),
                sample(rng, region.y.start, region.y.end),
                sample(rng, region.z.start, region.z.end),
            );
            let velocity = DVec3::new(
                sample(rng, bias.x - 1.0, bias.x + 1.0),
                sample(rng, bias.y - 1.0, bias.y + 1.0),
                sample(rng, bias.z - 1.0, bias.z + 1.0),
            );
            self.particles
                .push(Particle::new(position).with_velocity(velocity));
        }
    }

    /// Mean density across the set.
    pub fn average_density(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.particles.iter().map(|p| p.density).sum();
        sum / self.particles.len() as f64
    }

    /// Largest speed across the set.
    pub fn max_speed(&self) -> f64 {
        self.particles
            .iter()
            .map(|p| p.velocity.length())
            .fold(0.0, f64::max)
    }
}

impl std::ops::Index<usize> for ParticleSet {
    type Output = Particle;

    fn index(&self, index: usize) -> &Particle {
        &self.particles[index]
    }
}

impl std::ops::IndexMut<usize> for ParticleSet {
    fn index_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }
}

/// Uniform sample in `[a, b]`, tolerating a reversed or empty interval.
fn sample(rng: &mut impl Rng, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.gen_range(lo..=hi)
}
