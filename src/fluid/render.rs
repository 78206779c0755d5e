//! Fluid rendering systems.
//!
//! The simulation pushes each particle's final state into [`ParticleFrame`].
//! [`sync_particle_visuals`] then keeps exactly one sphere entity per particle
//! index, so visual resources are owned here and never by the particles.
//!
//! The simulation is z-up while Bevy is y-up; [`sim_to_world`] swaps the two
//! axes for display.

use bevy::math::DVec3;
use bevy::prelude::*;

use super::particle::Particle;
use super::simulation::{FluidSimulation, PresentationSink};

/// Configuration for fluid rendering.
#[derive(Resource, Clone, Debug, Reflect)]
#[reflect(Resource)]
pub struct FluidRenderConfig {
    /// Uniform scale applied to every particle sphere.
    pub particle_scale: f32,
    /// Draw a translucent box around the simulation bounds.
    pub show_bounds: bool,
    /// Colour of the bounds box.
    pub bounds_color: Color,
}

impl Default for FluidRenderConfig {
    fn default() -> Self {
        Self {
            particle_scale: 0.2,
            show_bounds: true,
            bounds_color: Color::srgba(0.6, 0.7, 0.9, 0.08),
        }
    }
}

/// Marker component for rendered fluid particles.
#[derive(Component, Clone, Copy, Debug, Reflect)]
#[reflect(Component)]
pub struct FluidParticleVisual {
    pub index: usize,
}

/// Marker for the box drawn around the simulation bounds.
#[derive(Component, Clone, Copy, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct FluidBoundsVisual;

/// What one particle should look like this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleVisualState {
    /// Bevy world-space translation.
    pub translation: Vec3,
    /// Unit-length RGBA colour.
    pub color: Vec4,
}

impl ParticleVisualState {
    pub fn from_particle(particle: &Particle) -> Self {
        Self {
            translation: sim_to_world(particle.position),
            color: particle_color(particle),
        }
    }
}

/// Visual state of every particle, written by the simulation each step.
#[derive(Resource, Debug, Default)]
pub struct ParticleFrame {
    states: Vec<ParticleVisualState>,
    released: bool,
}

impl ParticleFrame {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[ParticleVisualState] {
        &self.states
    }

    /// True if the particles were discarded since the visuals last synced.
    pub fn was_released(&self) -> bool {
        self.released
    }

    fn acknowledge_release(&mut self) {
        self.released = false;
    }
}

impl PresentationSink for ParticleFrame {
    fn present(&mut self, index: usize, particle: &Particle) {
        if index >= self.states.len() {
            self.states.resize(index + 1, ParticleVisualState::default());
        }
        self.states[index] = ParticleVisualState::from_particle(particle);
    }

    fn release(&mut self) {
        self.states.clear();
        self.released = true;
    }
}

/// Entities and materials owned on behalf of the particles, by index.
#[derive(Resource, Debug, Default)]
pub struct ParticleVisuals {
    mesh: Option<Handle<Mesh>>,
    entities: Vec<Entity>,
    materials: Vec<Handle<StandardMaterial>>,
}

impl ParticleVisuals {
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Map a z-up simulation position to Bevy's y-up world.
pub fn sim_to_world(position: DVec3) -> Vec3 {
    Vec3::new(position.x as f32, position.z as f32, position.y as f32)
}

/// Colour for a particle.
///
/// Red tracks the mean velocity component, green the density. The result is
/// normalised to a unit vector, alpha included.
pub fn particle_color(particle: &Particle) -> Vec4 {
    let mean = particle.mean_velocity_component();
    let raw = Vec4::new(
        (mean + 0.5).abs() as f32,
        (4.0 * particle.density).abs() as f32,
        0.5,
        1.0,
    );
    raw.try_normalize()
        .unwrap_or_else(|| Vec4::new(0.0, 0.0, 0.5, 1.0).normalize())
}

fn to_color(color: Vec4) -> Color {
    Color::linear_rgba(color.x, color.y, color.z, color.w)
}

fn particle_material(color: Vec4) -> StandardMaterial {
    StandardMaterial {
        base_color: to_color(color),
        perceptual_roughness: 0.3,
        metallic: 0.0,
        reflectance: 0.5,
        ..default()
    }
}

/// Spawn, despawn and update particle entities to match [`ParticleFrame`].
pub fn sync_particle_visuals(
    mut commands: Commands,
    mut frame: ResMut<ParticleFrame>,
    mut visuals: ResMut<ParticleVisuals>,
    config: Res<FluidRenderConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut transforms: Query<&mut Transform, With<FluidParticleVisual>>,
) {
    let visuals = &mut *visuals;

    if frame.was_released() {
        for entity in visuals.entities.drain(..) {
            commands.entity(entity).despawn();
        }
        for handle in visuals.materials.drain(..) {
            materials.remove(&handle);
        }
        frame.acknowledge_release();
    }

    while visuals.entities.len() > frame.len() {
        if let Some(entity) = visuals.entities.pop() {
            commands.entity(entity).despawn();
        }
        if let Some(handle) = visuals.materials.pop() {
            materials.remove(&handle);
        }
    }

    let scale = Vec3::splat(config.particle_scale);

    for (index, state) in frame.states().iter().enumerate() {
        if let Some(entity) = visuals.entities.get(index) {
            if let Ok(mut transform) = transforms.get_mut(*entity) {
                transform.translation = state.translation;
                transform.scale = scale;
            }
            if let Some(material) = materials.get_mut(&visuals.materials[index]) {
                material.base_color = to_color(state.color);
            }
            continue;
        }

        let mesh = visuals
            .mesh
            .get_or_insert_with(|| meshes.add(Sphere::new(1.0).mesh().uv(16, 12)))
            .clone();
        let material = materials.add(particle_material(state.color));

        let entity = commands
            .spawn((
                FluidParticleVisual { index },
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(state.translation).with_scale(scale),
            ))
            .id();

        visuals.entities.push(entity);
        visuals.materials.push(material);
    }
}

/// Spawn the translucent bounds box.
pub fn spawn_bounds_visual(
    mut commands: Commands,
    config: Res<FluidRenderConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !config.show_bounds {
        return;
    }

    commands.spawn((
        FluidBoundsVisual,
        Mesh3d(meshes.add(Cuboid::new(1.0, 1.0, 1.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: config.bounds_color,
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            cull_mode: None,
            ..default()
        })),
        Transform::default(),
    ));
}

/// Keep the bounds box matched to the current simulation constants.
pub fn update_bounds_visual(
    simulation: Res<FluidSimulation>,
    mut bounds: Query<&mut Transform, With<FluidBoundsVisual>>,
) {
    let constants = simulation.constants();
    let min = constants.bounds_min();
    let max = constants.bounds_max();
    let center = sim_to_world((min + max) * 0.5);
    let extent = sim_to_world(max - min);

    for mut transform in bounds.iter_mut() {
        transform.translation = center;
        transform.scale = extent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(velocity: DVec3, density: f64) -> Particle {
        Particle {
            density,
            ..Particle::new(DVec3::ZERO).with_velocity(velocity)
        }
    }

    #[test]
    fn test_particle_color_is_unit_length() {
        let color = particle_color(&particle(DVec3::new(3.0, -1.0, 4.0), 0.08));
        assert!((color.length() - 1.0).abs() < 1e-5);

        let still = particle_color(&particle(DVec3::ZERO, 0.0));
        assert!((still.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_particle_color_channels() {
        // Density drives green, mean velocity drives red.
        let dense = particle_color(&particle(DVec3::ZERO, 10.0));
        let sparse = particle_color(&particle(DVec3::ZERO, 0.01));
        assert!(dense.y > sparse.y);

        let fast = particle_color(&particle(DVec3::splat(20.0), 0.08));
        let slow = particle_color(&particle(DVec3::ZERO, 0.08));
        assert!(fast.x > slow.x);
    }

    #[test]
    fn test_particle_color_matches_formula() {
        // Mean component 1.5, so red is |1.5 + 0.5| = 2 and green is 4 * 0.25 = 1.
        let color = particle_color(&particle(DVec3::new(1.0, 2.0, 1.5), 0.25));
        let expected = Vec4::new(2.0, 1.0, 0.5, 1.0).normalize();
        assert!((color - expected).length() < 1e-6);
    }

    #[test]
    fn test_non_finite_velocity_falls_back() {
        let color = particle_color(&particle(DVec3::splat(f64::INFINITY), 0.08));
        assert!(color.is_finite());
    }

    #[test]
    fn test_sim_to_world_swaps_up_axis() {
        assert_eq!(sim_to_world(DVec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_frame_collects_by_index() {
        let mut frame = ParticleFrame::default();
        let particle = Particle::new(DVec3::new(4.0, 5.0, 6.0));

        frame.present(0, &particle);
        frame.present(1, &particle);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.states()[1].translation, Vec3::new(4.0, 6.0, 5.0));

        frame.release();
        assert!(frame.is_empty());
        assert!(frame.was_released());
    }
}
