//! Explicit Euler integration with gravity and box containment.

use super::boundary::ContainmentBox;
use super::params::{FluidConstants, FluidParams};
use super::particle::Particle;

/// Gravity, position update and boundary reflection.
pub struct Integrator;

impl Integrator {
    /// Advance every particle by `dt`.
    ///
    /// Gravity (if enabled) is applied to velocity first, then position moves
    /// with the new velocity, then the particle is clamped back into the box.
    /// Returns the total number of boundary bounces this step.
    pub fn integrate(
        particles: &mut [Particle],
        constants: &FluidConstants,
        params: &FluidParams,
        dt: f64,
    ) -> u32 {
        let boundary = ContainmentBox::from_constants(constants, params.damping);
        let mut bounces = 0;

        for particle in particles.iter_mut() {
            if params.gravity_enabled {
                particle.velocity.z -= constants.gravity * dt;
            }

            particle.position += particle.velocity * dt;

            bounces += boundary.contain(&mut particle.position, &mut particle.velocity);
        }

        bounces
    }
}
