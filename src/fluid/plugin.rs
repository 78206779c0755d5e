//! Bevy plugin for fluid simulation.

use bevy::prelude::*;

use super::clock::SimulationClock;
use super::config::FluidConfig;
use super::params::{
    FluidConstants, FluidParams, PARTICLE_COUNT_RANGE, REST_DENSITY_RANGE, SPAWN_VELOCITY_LIMIT,
};
use super::render::{
    FluidBoundsVisual, FluidParticleVisual, FluidRenderConfig, ParticleFrame, ParticleVisuals,
    spawn_bounds_visual, sync_particle_visuals, update_bounds_visual,
};
use super::simulation::{FluidSimulation, StepReport};

/// Keyboard step sizes for the tunable parameters.
const VISCOSITY_STEP: f64 = 0.01;
const STIFFNESS_STEP: f64 = 0.25;
const DAMPING_STEP: f64 = 0.01;
const REST_DENSITY_STEP: f64 = 0.5;
const COUNT_STEP: usize = 100;

/// Decrease/increase key pairs for the x, y and z spawn velocity bias.
const SPAWN_VELOCITY_KEYS: [(KeyCode, KeyCode); 3] = [
    (KeyCode::Digit1, KeyCode::Digit2),
    (KeyCode::Digit3, KeyCode::Digit4),
    (KeyCode::Digit5, KeyCode::Digit6),
];

/// Plugin that adds the particle fluid to a Bevy app.
///
/// # Example
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use tidepool::fluid::{FluidConfig, FluidPlugin};
///
/// fn main() {
///     App::new()
///         .add_plugins(DefaultPlugins)
///         .add_plugins(FluidPlugin::new(FluidConfig::load_or_default("fluid.ron").0))
///         .run();
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct FluidPlugin {
    config: FluidConfig,
    headless: bool,
}

impl FluidPlugin {
    pub fn new(config: FluidConfig) -> Self {
        Self {
            config,
            headless: false,
        }
    }

    pub fn with_params(params: FluidParams) -> Self {
        Self::new(FluidConfig {
            params,
            ..default()
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Skip every system that needs a renderer.
    pub fn headless(mut self) -> Self {
        self.headless = true;
        self
    }
}

impl Plugin for FluidPlugin {
    fn build(&self, app: &mut App) {
        // Register types for reflection
        app.register_type::<FluidParams>()
            .register_type::<FluidConstants>()
            .register_type::<FluidRenderConfig>()
            .register_type::<FluidParticleVisual>()
            .register_type::<FluidBoundsVisual>();

        let constants = self.config.constants.clone();
        let simulation = match self.config.seed {
            Some(seed) => FluidSimulation::with_seed(constants, seed),
            None => FluidSimulation::new(constants),
        };

        app.insert_resource(self.config.params.clone())
            .insert_resource(simulation)
            .init_resource::<FluidState>()
            .init_resource::<ParticleFrame>();

        app.add_systems(Startup, start_simulation);

        if self.headless {
            app.add_systems(
                Update,
                (handle_parameter_input, run_simulation, clear_reset_request).chain(),
            );
            return;
        }

        app.init_resource::<FluidRenderConfig>()
            .init_resource::<ParticleVisuals>();

        app.add_systems(Startup, spawn_bounds_visual);
        app.add_systems(
            Update,
            (
                handle_parameter_input,
                run_simulation,
                sync_particle_visuals,
                update_bounds_visual,
                clear_reset_request,
            )
                .chain(),
        );
    }
}

/// Run state and per-frame diagnostics.
#[derive(Resource, Clone, Debug, Default)]
pub struct FluidState {
    /// Skip simulation steps until unpaused.
    pub paused: bool,
    /// Run exactly one step while paused.
    pub step_requested: bool,
    /// Steps run since startup.
    pub frame: u64,
    pub particle_count: usize,
    pub average_density: f64,
    pub max_speed: f64,
    /// Report from the most recent step.
    pub last_step: StepReport,
}

impl FluidState {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn request_step(&mut self) {
        self.step_requested = true;
    }

    fn record(&mut self, simulation: &FluidSimulation, report: StepReport) {
        let particles = simulation.particles();
        self.frame = simulation.frame();
        self.particle_count = particles.len();
        self.average_density = particles.average_density();
        self.max_speed = particles.max_speed();
        self.last_step = report;
    }
}

/// System to populate the simulation on startup.
fn start_simulation(
    params: Res<FluidParams>,
    mut simulation: ResMut<FluidSimulation>,
    mut state: ResMut<FluidState>,
) {
    simulation.start(&params);
    state.particle_count = simulation.num_particles();
}

/// Keyboard parameter source. Missing input (headless apps) is a no-op.
fn handle_parameter_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut params: ResMut<FluidParams>,
    mut state: ResMut<FluidState>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    if keyboard.just_pressed(KeyCode::Space) {
        state.toggle_pause();
    }
    if keyboard.just_pressed(KeyCode::KeyS) && state.paused {
        state.request_step();
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        params.request_reset();
        info!("Reset requested: {} particles", params.particle_count);
    }
    if keyboard.just_pressed(KeyCode::KeyG) {
        params.gravity_enabled = !params.gravity_enabled;
        info!("Gravity {}", on_off(params.gravity_enabled));
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        params.collisions_enabled = !params.collisions_enabled;
        info!("Collisions {}", on_off(params.collisions_enabled));
    }

    let step = |decrease: KeyCode, increase: KeyCode| -> f64 {
        let mut delta = 0.0;
        if keyboard.just_pressed(decrease) {
            delta -= 1.0;
        }
        if keyboard.just_pressed(increase) {
            delta += 1.0;
        }
        delta
    };

    let viscosity = step(KeyCode::BracketLeft, KeyCode::BracketRight);
    if viscosity != 0.0 {
        params.viscosity = (params.viscosity + viscosity * VISCOSITY_STEP).max(0.0);
        info!("Viscosity {:.2}", params.viscosity);
    }

    let stiffness = step(KeyCode::Minus, KeyCode::Equal);
    if stiffness != 0.0 {
        params.stiffness = (params.stiffness + stiffness * STIFFNESS_STEP).max(0.0);
        info!("Stiffness {:.2}", params.stiffness);
    }

    let damping = step(KeyCode::Comma, KeyCode::Period);
    if damping != 0.0 {
        params.damping = (params.damping + damping * DAMPING_STEP).clamp(0.0, 1.0);
        info!("Damping {:.2}", params.damping);
    }

    let rest_density = step(KeyCode::Semicolon, KeyCode::Quote);
    if rest_density != 0.0 {
        params.rest_density = (params.rest_density + rest_density * REST_DENSITY_STEP)
            .clamp(*REST_DENSITY_RANGE.start(), *REST_DENSITY_RANGE.end());
        info!("Rest density {:.2}", params.rest_density);
    }

    // Spawn velocity and particle count take effect on the next reset.
    for (axis, (decrease, increase)) in SPAWN_VELOCITY_KEYS.into_iter().enumerate() {
        let delta = step(decrease, increase) as i32;
        if delta != 0 {
            params.spawn_velocity[axis] = (params.spawn_velocity[axis] + delta)
                .clamp(-SPAWN_VELOCITY_LIMIT, SPAWN_VELOCITY_LIMIT);
            info!(
                "Spawn velocity {:?} (press R to apply)",
                params.spawn_velocity
            );
        }
    }

    let count = step(KeyCode::ArrowDown, KeyCode::ArrowUp);
    if count != 0.0 {
        let next = if count > 0.0 {
            params.particle_count.saturating_add(COUNT_STEP)
        } else {
            params.particle_count.saturating_sub(COUNT_STEP)
        };
        params.particle_count =
            next.clamp(*PARTICLE_COUNT_RANGE.start(), *PARTICLE_COUNT_RANGE.end());
        info!("Particle count {} (press R to apply)", params.particle_count);
    }
}

/// Label for a toggle in logs and the debug overlay.
pub fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

/// System to run the fluid simulation.
fn run_simulation(
    time: Res<Time>,
    params: Res<FluidParams>,
    mut state: ResMut<FluidState>,
    mut simulation: ResMut<FluidSimulation>,
    mut frame: ResMut<ParticleFrame>,
) {
    let single_step = state.paused && state.step_requested;
    if state.paused && !single_step && !params.reset {
        return;
    }
    state.step_requested = false;

    let clock = if single_step {
        SimulationClock::fixed_60hz()
    } else {
        SimulationClock::new(time.delta_secs_f64())
    };

    let report = simulation.step(&params, clock, &mut *frame);
    state.record(&simulation, report);
}

/// The reset flag is a one-frame request.
fn clear_reset_request(mut params: ResMut<FluidParams>) {
    if params.reset {
        params.reset = false;
    }
}
