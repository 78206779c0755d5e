//! Pairwise pressure and viscosity forces.
//!
//! Both terms scale with `1 / distance²` and with the damping factor, and
//! both are integrated straight into velocity with the clamped simulation
//! timestep. Viscosity is exchanged symmetrically the moment a pair is
//! visited; pressure is accumulated per particle and applied once its
//! neighbour loop is done.

use bevy::math::DVec3;

use super::params::{FluidConstants, FluidParams, MIN_SEPARATION};
use super::particle::Particle;

/// Pressure and viscosity force accumulation.
pub struct ForceSolver;

impl ForceSolver {
    /// Viscous drag pulling `vel_i` towards `vel_j`.
    #[inline]
    pub fn viscosity_force(
        vel_i: DVec3,
        vel_j: DVec3,
        distance_sq: f64,
        params: &FluidParams,
        dt: f64,
    ) -> DVec3 {
        params.viscosity * dt * params.damping * (vel_j - vel_i) / distance_sq
    }

    /// Pressure impulse on particle `i` from neighbour `j`.
    ///
    /// `direction` points from `i` to `j`. A combined density above twice the
    /// rest density yields a positive scalar along `direction`, below it a
    /// negative one.
    #[inline]
    pub fn pressure_force(
        direction: DVec3,
        distance_sq: f64,
        density_i: f64,
        density_j: f64,
        params: &FluidParams,
        dt: f64,
    ) -> DVec3 {
        let density_diff = density_i + density_j - 2.0 * params.rest_density;
        let pressure = params.stiffness * density_diff;
        pressure * dt * params.damping * (direction / distance_sq)
    }

    /// Apply viscosity and pressure for every ordered pair within two radii.
    ///
    /// Each unordered pair is visited twice, once from each side, so the
    /// symmetric viscosity exchange happens twice per pair.
    pub fn apply(
        particles: &mut [Particle],
        constants: &FluidConstants,
        params: &FluidParams,
        dt: f64,
    ) {
        let reach = constants.interaction_distance();

        for i in 0..particles.len() {
            let mut pressure_force = DVec3::ZERO;

            for j in 0..particles.len() {
                if i == j {
                    continue;
                }

                let direction = particles[j].position - particles[i].position;
                let distance = direction.length();
                if distance >= reach || distance < MIN_SEPARATION {
                    continue;
                }
                let distance_sq = distance * distance;

                let force = Self::viscosity_force(
                    particles[i].velocity,
                    particles[j].velocity,
                    distance_sq,
                    params,
                    dt,
                );
                particles[i].velocity += force;
                particles[j].velocity -= force;

                pressure_force += Self::pressure_force(
                    direction,
                    distance_sq,
                    particles[i].density,
                    particles[j].density,
                    params,
                    dt,
                );
            }

            particles[i].velocity += pressure_force;
        }
    }
}
