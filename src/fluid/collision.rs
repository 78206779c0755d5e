//! Near-contact collision response between particles.

use bevy::math::DVec3;

use super::params::{FluidConstants, MIN_SEPARATION};
use super::particle::Particle;

/// Pairwise velocity correction for particles in near contact.
pub struct CollisionResolver;

impl CollisionResolver {
    /// Correct the velocities of every closing pair closer than one radius.
    ///
    /// For a pair `(i, j)` with `n = normalize(p_i - p_j)` and
    /// `vn = (v_i - v_j) · n`, a closing pair (`vn <= 0`) gets
    /// `v_i -= vn * n` and `v_j += vn * n`. Separating pairs and coincident
    /// pairs are left alone.
    ///
    /// Returns the number of pairs that were corrected.
    pub fn resolve(particles: &mut [Particle], constants: &FluidConstants) -> usize {
        let threshold = constants.collision_distance();
        let mut corrected = 0;

        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                let offset = particles[i].position - particles[j].position;
                let distance = offset.length();
                if distance >= threshold || distance < MIN_SEPARATION {
                    continue;
                }

                let normal = offset / distance;
                if let Some(impulse) =
                    Self::normal_impulse(particles[i].velocity, particles[j].velocity, normal)
                {
                    particles[i].velocity += impulse;
                    particles[j].velocity -= impulse;
                    corrected += 1;
                }
            }
        }

        corrected
    }

    /// Impulse to add to the first particle of a pair, `None` if separating.
    #[inline]
    pub fn normal_impulse(vel_i: DVec3, vel_j: DVec3, normal: DVec3) -> Option<DVec3> {
        let normal_velocity = (vel_i - vel_j).dot(normal);
        if normal_velocity > 0.0 {
            return None;
        }
        Some(-normal_velocity * normal)
    }
}
