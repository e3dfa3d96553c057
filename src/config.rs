//! TOML configuration for the command-line tool.
//!
//! ```toml
//! [solve]
//! grid_density = 10
//! texture_size = 32
//! selection_only = false
//! separate_by_plane = true
//! vertical_angle = 30.0
//! snap_threshold = 0.5
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every key is optional; missing keys take the defaults above.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algo::pixelate::PixelateOptions;
use crate::error::{MeshError, Result};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Solver settings.
    pub solve: SolveConfig,
    /// Logging settings.
    pub log: LogConfig,
}

/// The `[solve]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    /// Texels per world unit.
    pub grid_density: u32,
    /// Side of the square texture in texels.
    pub texture_size: u32,
    /// Only unwrap selected faces.
    pub selection_only: bool,
    /// Solve planes separately.
    pub separate_by_plane: bool,
    /// Plane classification angle in degrees.
    pub vertical_angle: f64,
    /// Snap threshold as a fraction of a texel.
    pub snap_threshold: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        let options = PixelateOptions::default();
        Self {
            grid_density: options.grid_density,
            texture_size: options.texture_size,
            selection_only: options.selection_only,
            separate_by_plane: options.separate_by_plane,
            vertical_angle: options.vertical_angle,
            snap_threshold: options.snap_threshold,
        }
    }
}

/// The `[log]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set, e.g. `"info"` or
    /// `"texelgrid=debug"`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| MeshError::Config(e.to_string()))
    }

    /// Read a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| MeshError::Config(format!("{}: {e}", path.display())))
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MeshError::Config(e.to_string()))
    }

    /// Solver options for this configuration.
    ///
    /// # Errors
    /// `InvalidParameter` if a solve setting is out of range.
    pub fn to_options(&self) -> Result<PixelateOptions> {
        let options = PixelateOptions::default()
            .with_grid_density(self.solve.grid_density)
            .with_texture_size(self.solve.texture_size)
            .with_selection_only(self.solve.selection_only)
            .with_separate_by_plane(self.solve.separate_by_plane)
            .with_vertical_angle(self.solve.vertical_angle)
            .with_snap_threshold(self.solve.snap_threshold);
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.solve.grid_density, 10);
        assert_eq!(config.solve.texture_size, 32);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.to_options().unwrap(), PixelateOptions::default());
    }

    #[test]
    fn test_partial_section() {
        let config = Config::from_toml_str(
            r#"
[solve]
texture_size = 64
separate_by_plane = false
"#,
        )
        .unwrap();
        assert_eq!(config.solve.texture_size, 64);
        assert!(!config.solve.separate_by_plane);
        assert_eq!(config.solve.grid_density, 10); // default

        let options = config.to_options().unwrap();
        assert_eq!(options.texel_size(), 1.0 / 64.0);
        assert!(!options.separate_by_plane);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.solve.grid_density = 16;
        config.solve.vertical_angle = 45.0;
        config.log.level = "texelgrid=debug".to_string();

        let text = config.to_toml_string().unwrap();
        assert!(text.contains("grid_density = 16"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Config::from_toml_str("[solve]\ngrid_density = \"ten\"\n"),
            Err(MeshError::Config(_))
        ));

        let mut config = Config::default();
        config.solve.grid_density = 0;
        assert!(matches!(
            config.to_options(),
            Err(MeshError::InvalidParameter { name: "grid_density", .. })
        ));
    }
}
