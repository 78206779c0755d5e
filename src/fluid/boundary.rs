//! Boundary containment for the simulation box.
//!
//! Particles are kept inside an axis-aligned box. Each of the six faces is
//! checked independently, so a particle in a corner can bounce off several
//! faces in the same step.

use bevy::math::DVec3;

use super::params::FluidConstants;

/// Axis-aligned box that reflects particles back inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContainmentBox {
    /// Minimum corner of the box.
    pub min: DVec3,
    /// Maximum corner of the box.
    pub max: DVec3,
    /// Factor the whole velocity is multiplied by on each bounce.
    pub damping: f64,
}

impl ContainmentBox {
    /// Create a box with custom bounds.
    pub fn new(min: DVec3, max: DVec3, damping: f64) -> Self {
        Self { min, max, damping }
    }

    /// The box described by the simulation constants.
    ///
    /// x runs to `width`, y to `depth` and z to `height`; the floor sits at
    /// `constants.floor`.
    pub fn from_constants(constants: &FluidConstants, damping: f64) -> Self {
        Self::new(constants.bounds_min(), constants.bounds_max(), damping)
    }

    /// Check if a point is inside the box, faces included.
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Clamp a particle back inside the box.
    ///
    /// Touching or crossing a face clamps that coordinate onto the face,
    /// negates the matching velocity component and then damps the whole
    /// velocity. Returns the number of faces hit.
    pub fn contain(&self, position: &mut DVec3, velocity: &mut DVec3) -> u32 {
        let mut bounces = 0;

        // Lower faces first, then upper faces.
        for axis in 0..3 {
            if position[axis] <= self.min[axis] {
                position[axis] = self.min[axis];
                velocity[axis] = -velocity[axis];
                *velocity *= self.damping;
                bounces += 1;
            }
        }

        for axis in 0..3 {
            if position[axis] >= self.max[axis] {
                position[axis] = self.max[axis];
                velocity[axis] = -velocity[axis];
                *velocity *= self.damping;
                bounces += 1;
            }
        }

        bounces
    }
}
