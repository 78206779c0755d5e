//! Simulation presets stored as RON.
//!
//! A preset bundles the world constants, the initial parameter values and an
//! optional spawn seed. Presets are validated on load so the simulation
//! itself never has to cope with an inverted box or a negative radius.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::params::{FluidConstants, FluidParams, Span};

/// Error type for preset loading and saving.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("RON serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to start a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    pub constants: FluidConstants,
    pub params: FluidParams,
    /// Seed for spawn positions and velocities. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl FluidConfig {
    /// Parse and validate a preset from RON text.
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Self = ron::from_str(contents)?;
        // Reset is a one-frame request, never part of a stored preset.
        config.params.reset = false;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.validate()?;
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Load a preset, falling back to defaults if it is missing or invalid.
    ///
    /// A missing file is not an error. Any other failure is returned next to
    /// the default config so the caller can report it once logging is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                (Self::default(), None)
            }
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// Check the preset describes a world the simulation can run in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.constants;
        let p = &self.params;

        let scalars = [
            ("particle_radius", c.particle_radius),
            ("gravity", c.gravity),
            ("width", c.width),
            ("height", c.height),
            ("depth", c.depth),
            ("floor", c.floor),
            ("viscosity", p.viscosity),
            ("rest_density", p.rest_density),
            ("damping", p.damping),
            ("stiffness", p.stiffness),
        ];
        if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be finite")));
        }

        if c.particle_radius <= 0.0 {
            return Err(invalid("particle_radius must be positive"));
        }
        if c.width <= 0.0 || c.height <= 0.0 || c.depth <= 0.0 {
            return Err(invalid("width, height and depth must be positive"));
        }
        if c.floor < 0.0 || c.floor >= c.height {
            return Err(invalid("floor must lie in [0, height)"));
        }
        if !(0.0..=1.0).contains(&p.damping) {
            return Err(invalid("damping must lie in [0, 1]"));
        }

        let region = &c.spawn_region;
        check_span("x", &region.x, 0.0, c.width)?;
        check_span("y", &region.y, 0.0, c.depth)?;
        check_span("z", &region.z, c.floor, c.height)?;

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

fn check_span(axis: &str, span: &Span, min: f64, max: f64) -> Result<(), ConfigError> {
    if !span.start.is_finite() || !span.end.is_finite() {
        return Err(invalid(format!("spawn span {axis} must be finite")));
    }
    if !span.is_ordered() {
        return Err(invalid(format!(
            "spawn span {axis} is inverted: {} > {}",
            span.start, span.end
        )));
    }
    if span.start < min || span.end > max {
        return Err(invalid(format!(
            "spawn span {axis} [{}, {}] leaves the box [{min}, {max}]",
            span.start, span.end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FluidConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ron_round_trip_clears_reset() {
        let mut config = FluidConfig {
            seed: Some(9),
            ..Default::default()
        };
        config.params.reset = true;
        config.params.particle_count = 321;

        let text = config.to_ron().unwrap();
        let loaded = FluidConfig::from_ron(&text).unwrap();

        assert_eq!(loaded.seed, Some(9));
        assert_eq!(loaded.params.particle_count, 321);
        assert!(!loaded.params.reset);
    }

    #[test]
    fn test_shipped_preset_matches_defaults() {
        let shipped = FluidConfig::from_ron(include_str!("../../fluid.ron")).unwrap();
        assert_eq!(shipped, FluidConfig::default());
    }

    #[test]
    fn test_partial_preset_fills_defaults() {
        let loaded = FluidConfig::from_ron("(params: (stiffness: 7.5))").unwrap();

        assert_eq!(loaded.params.stiffness, 7.5);
        assert_eq!(loaded.params.damping, FluidParams::default().damping);
        assert_eq!(loaded.constants, FluidConstants::default());
    }

    #[test]
    fn test_rejects_bad_presets() {
        let mut config = FluidConfig::default();
        config.constants.particle_radius = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = FluidConfig::default();
        config.params.damping = 1.5;
        assert!(config.validate().is_err());

        let mut config = FluidConfig::default();
        config.constants.spawn_region.z = Span::new(18.0, 10.0);
        assert!(config.validate().is_err());

        let mut config = FluidConfig::default();
        config.constants.spawn_region.x = Span::new(2.0, 30.0);
        assert!(config.validate().is_err());

        let mut config = FluidConfig::default();
        config.params.viscosity = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        assert!(matches!(
            FluidConfig::from_ron("(params: (stiffness: \"hard\"))"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let (config, error) = FluidConfig::load_or_default("definitely/not/a/real/preset.ron");
        assert_eq!(config, FluidConfig::default());
        assert!(error.is_none());
    }

    #[test]
    fn test_invalid_file_falls_back_with_error() {
        let path = std::env::temp_dir().join(format!("fluid-bad-{}.ron", std::process::id()));
        std::fs::write(&path, "(params: (damping: 3.0))").unwrap();

        let (config, error) = FluidConfig::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(config, FluidConfig::default());
        assert!(matches!(error, Some(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("fluid-preset-{}.ron", std::process::id()));
        let config = FluidConfig {
            params: FluidParams {
                viscosity: 0.02,
                stiffness: 6.0,
                ..FluidParams::default()
            },
            ..Default::default()
        };

        config.save(&path).unwrap();
        let loaded = FluidConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }
}
