//! Overlap-volume density estimation.
//!
//! Density here is a crowding heuristic, not an SPH sum: each neighbour that
//! overlaps a particle adds a cap-shaped volume, and density is the inverse
//! of the particle's own volume plus all overlap.

use std::f64::consts::PI;

use super::params::{FluidConstants, FluidParams};
use super::particle::Particle;

/// Per-particle density from neighbour overlap.
pub struct DensityEstimator;

impl DensityEstimator {
    /// Overlap volume contributed by a neighbour at `distance`.
    ///
    /// With penetration depth `h = 2r - distance` this is
    /// `π h² (2r - h/3) / 3`. Zero once the spheres no longer overlap.
    #[inline]
    pub fn overlap_volume(distance: f64, radius: f64) -> f64 {
        let reach = 2.0 * radius;
        if distance >= reach {
            return 0.0;
        }
        let h = reach - distance;
        PI * h * h * (reach - h / 3.0) / 3.0
    }

    /// Notional volume of a lone particle, `(4/3) π (3r)`.
    #[inline]
    pub fn own_volume(radius: f64) -> f64 {
        (4.0 / 3.0) * PI * (3.0 * radius)
    }

    /// Density of a particle with no neighbours.
    #[inline]
    pub fn baseline_density(radius: f64) -> f64 {
        3.0 / Self::own_volume(radius)
    }

    /// Recompute every particle's density from current positions.
    ///
    /// Also refreshes the stored `pressure` (`stiffness * (density - rest)`)
    /// for inspection, and the per-particle viscosity from `params`.
    pub fn estimate(particles: &mut [Particle], constants: &FluidConstants, params: &FluidParams) {
        let radius = constants.particle_radius;
        let reach = constants.interaction_distance();
        let own_volume = Self::own_volume(radius);

        for i in 0..particles.len() {
            let position = particles[i].position;
            let mut total_overlap = 0.0;

            for (j, neighbour) in particles.iter().enumerate() {
                if i == j {
                    continue;
                }
                let distance = position.distance(neighbour.position);
                if distance >= reach {
                    continue;
                }
                total_overlap += Self::overlap_volume(distance, radius);
            }

            let density = 3.0 / (own_volume + total_overlap);
            let particle = &mut particles[i];
            particle.density = density;
            particle.pressure = params.pressure_for(density);
            particle.viscosity = params.viscosity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::DVec3;

    #[test]
    fn test_isolated_particle_has_baseline_density() {
        let constants = FluidConstants::default();
        let mut particles = vec![Particle::new(DVec3::splat(10.0))];

        DensityEstimator::estimate(&mut particles, &constants, &FluidParams::default());

        let expected = 3.0 / ((4.0 / 3.0) * PI * 3.0);
        assert!((particles[0].density - expected).abs() < 1e-12);
        assert_eq!(particles[0].density, DensityEstimator::baseline_density(1.0));
    }

    #[test]
    fn test_overlap_volume() {
        // Touching spheres do not overlap.
        assert_eq!(DensityEstimator::overlap_volume(2.0, 1.0), 0.0);
        assert_eq!(DensityEstimator::overlap_volume(3.0, 1.0), 0.0);

        // Halfway in: h = 1, π * 1 * (2 - 1/3) / 3.
        let v = DensityEstimator::overlap_volume(1.0, 1.0);
        assert!((v - PI * (5.0 / 3.0) / 3.0).abs() < 1e-12);

        // Deeper overlap means more volume.
        assert!(DensityEstimator::overlap_volume(0.5, 1.0) > v);
    }

    #[test]
    fn test_density_drops_when_crowded() {
        let constants = FluidConstants::default();
        let mut particles = vec![
            Particle::new(DVec3::new(5.0, 5.0, 5.0)),
            Particle::new(DVec3::new(6.0, 5.0, 5.0)),
            Particle::new(DVec3::new(15.0, 15.0, 15.0)),
        ];

        DensityEstimator::estimate(&mut particles, &constants, &FluidParams::default());

        let baseline = DensityEstimator::baseline_density(1.0);
        assert!(particles[0].density < baseline);
        assert!((particles[0].density - particles[1].density).abs() < 1e-12);
        assert_eq!(particles[2].density, baseline);
    }

    #[test]
    fn test_density_positive_and_memoryless() {
        let constants = FluidConstants::default();
        let mut particles: Vec<Particle> = (0..20)
            .map(|i| Particle::new(DVec3::new(1.0 + 0.3 * i as f64, 2.0, 3.0)))
            .collect();
        for p in &mut particles {
            p.density = 1.0e6;
        }

        DensityEstimator::estimate(&mut particles, &constants, &FluidParams::default());
        let first: Vec<f64> = particles.iter().map(|p| p.density).collect();
        DensityEstimator::estimate(&mut particles, &constants, &FluidParams::default());

        for (p, d) in particles.iter().zip(first) {
            assert!(p.density > 0.0);
            assert_eq!(p.density, d);
        }
    }

    #[test]
    fn test_pressure_is_stored() {
        let constants = FluidConstants::default();
        let params = FluidParams {
            stiffness: 2.0,
            ..FluidParams::default()
        };
        let mut particles = vec![Particle::new(DVec3::ONE)];

        DensityEstimator::estimate(&mut particles, &constants, &params);

        let p = &particles[0];
        assert!((p.pressure - 2.0 * (p.density - 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_viscosity_copied_from_params() {
        let constants = FluidConstants::default();
        let params = FluidParams {
            viscosity: 0.35,
            ..FluidParams::default()
        };
        let mut particles = vec![
            Particle::new(DVec3::splat(4.0)),
            Particle::new(DVec3::splat(4.5)),
        ];

        DensityEstimator::estimate(&mut particles, &constants, &params);

        assert!(particles.iter().all(|p| p.viscosity == 0.35));
    }
}
