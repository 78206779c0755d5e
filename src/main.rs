//! Tidepool - particle fluid demo
//!
//! Loads a RON preset (`fluid.ron`, or the path given as the first argument)
//! and drops the particles into the box.

use std::path::PathBuf;

use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use tidepool::prelude::*;

const DEFAULT_PRESET: &str = "fluid.ron";

fn main() {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PRESET));

    // Logging is not up yet, so a bad preset is reported from a startup system.
    let (config, preset_error) = FluidConfig::load_or_default(&path);
    let preset_error =
        preset_error.map(|err| format!("Ignoring preset {}: {err}", path.display()));

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Tidepool - Particle Fluid".to_string(),
                        resolution: bevy::window::WindowResolution::new(1280, 720),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level: Level::INFO,
                    filter: "wgpu=error,naga=warn,tidepool=info".to_string(),
                    ..default()
                }),
        )
        .add_plugins(FluidPlugin::new(config))
        .insert_resource(PresetError(preset_error))
        .add_systems(Startup, (setup_scene, report_preset_error))
        .add_systems(Update, update_debug_ui)
        .run();
}

/// Problem found while loading the preset, if any.
#[derive(Resource)]
struct PresetError(Option<String>);

fn report_preset_error(error: Res<PresetError>) {
    if let Some(message) = &error.0 {
        warn!("{message}");
    }
}

/// Set up the camera, lights and debug text.
fn setup_scene(mut commands: Commands, simulation: Res<FluidSimulation>) {
    let constants = simulation.constants();
    let center = sim_to_world((constants.bounds_min() + constants.bounds_max()) * 0.5);
    let extent = sim_to_world(constants.bounds_max() - constants.bounds_min());

    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(center + Vec3::new(0.0, extent.y * 0.3, extent.z * 2.2))
            .looking_at(center, Vec3::Y),
    ));

    // Lighting
    commands.spawn((
        PointLight {
            intensity: 4_000_000.0,
            range: extent.max_element() * 4.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(center + Vec3::new(extent.x, extent.y * 1.5, extent.z)),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 5000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.5, 0.5, 0.0)),
    ));

    // Debug text
    commands.spawn((
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        DebugText,
    ));
}

/// Marker for debug text.
#[derive(Component)]
struct DebugText;

/// Update the debug UI text.
fn update_debug_ui(
    state: Res<FluidState>,
    params: Res<FluidParams>,
    mut text_query: Query<&mut Text, With<DebugText>>,
) {
    for mut text in text_query.iter_mut() {
        let status = if state.paused { "PAUSED" } else { "Running" };
        text.0 = format!(
            "Tidepool ({status})\n\n\
             Controls:\n  \
             Space - Pause/Resume   S - Step\n  \
             R - Reset   G - Gravity   C - Collisions\n  \
             [ ] viscosity   - = stiffness   , . damping   ; ' rest density\n  \
             1/2 3/4 5/6 - spawn velocity x/y/z   Up/Down - particle count\n\n\
             Particles: {} (next reset: {})\n\
             Frame: {}\n\
             Gravity: {}   Collisions: {}\n\
             Viscosity: {:.2}   Stiffness: {:.2}   Damping: {:.2}\n\
             Rest density: {:.2}   Spawn velocity: {:?}\n\
             Avg density: {:.4}   Max speed: {:.2}\n\
             Collisions: {}   Bounces: {}",
            state.particle_count,
            params.particle_count,
            state.frame,
            on_off(params.gravity_enabled),
            on_off(params.collisions_enabled),
            params.viscosity,
            params.stiffness,
            params.damping,
            params.rest_density,
            params.spawn_velocity,
            state.average_density,
            state.max_speed,
            state.last_step.collisions,
            state.last_step.bounces,
        );
    }
}
