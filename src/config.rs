//! Overlay configuration.
//!
//! Loaded from a TOML file; every field has a default so a missing file or a
//! partial file both work. Colors are ARGB words (`0x60000000` is valid TOML).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "scan-overlay.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub display: DisplayConfig,
    pub camera: CameraConfig,
    pub colors: ColorConfig,
    pub captions: CaptionConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: usize,
    pub height: usize,
    /// Device pixels per density-independent pixel.
    pub density: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { width: 800, height: 600, density: 1.0 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub device: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { device: 0, width: 640, height: 480 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    /// Exterior tint while scanning.
    pub mask: u32,
    /// Exterior tint while a result is frozen.
    pub result: u32,
    pub laser: u32,
    pub result_points: u32,
    pub caption: u32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            mask: 0x6000_0000,
            result: 0xB000_0000,
            laser: 0xFFCC_0000,
            result_points: 0xC0FF_BD21,
            caption: 0xFFD8_D8D8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptionConfig {
    pub portrait: String,
    pub landscape: String,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            portrait: "PLACE THE QR CODE INSIDE THE FRAME".to_string(),
            landscape: "PLACE THE BARCODE INSIDE THE FRAME".to_string(),
        }
    }
}

/// Optional PNG sprites; procedural ones are generated for anything missing.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    pub border: Option<PathBuf>,
    /// Line that sweeps vertically (portrait framing).
    pub scan_line_horizontal: Option<PathBuf>,
    /// Line that sweeps horizontally (landscape framing).
    pub scan_line_vertical: Option<PathBuf>,
}

impl OverlayConfig {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(OverlayConfig::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        let config: OverlayConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = OverlayConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config, OverlayConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[display]\ndensity = 2.0\n\n[colors]\nmask = 0x80000000\n\n[captions]\nportrait = \"SCAN ME\""
        )
        .unwrap();

        let config = OverlayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.display.density, 2.0);
        assert_eq!(config.display.width, 800, "unset fields keep their defaults");
        assert_eq!(config.colors.mask, 0x8000_0000);
        assert_eq!(config.colors.laser, ColorConfig::default().laser);
        assert_eq!(config.captions.portrait, "SCAN ME");
        assert_eq!(config.captions.landscape, CaptionConfig::default().landscape);
        assert!(config.assets.border.is_none());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display\nwidth = ").unwrap();

        let err = OverlayConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
