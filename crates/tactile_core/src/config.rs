//! # Bridge Configuration
//!
//! Loaded once at startup from an optional TOML file. Every field has a
//! default matching the deployed rig (300x480 raster, 21600x13500 tablet
//! mounted a quarter turn), so an empty file is a valid config.
//!
//! ```toml
//! [raster]
//! width = 480
//! height = 300
//!
//! [orientation]
//! swap_axes = false
//! invert_x = false
//!
//! [snapshot]
//! path = "/tmp/scope.pgm"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::mapper::{CoordinateMapper, DeviceExtents, Orientation};
use crate::raster::RasterGeometry;

/// Raster dimensions expected from the frame producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RasterSection {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Header length override; the canonical header length when absent.
    pub header_bytes: Option<usize>,
}

impl Default for RasterSection {
    fn default() -> Self {
        Self {
            width: crate::DEFAULT_RASTER_WIDTH,
            height: crate::DEFAULT_RASTER_HEIGHT,
            header_bytes: None,
        }
    }
}

/// Where interrupt-triggered snapshots go.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SnapshotSection {
    /// Snapshot file path.
    pub path: PathBuf,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::DEFAULT_SNAPSHOT_PATH),
        }
    }
}

/// Input channel retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestSection {
    /// Pause after an end-of-stream read before trying again.
    pub eof_backoff_ms: u64,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self { eof_backoff_ms: 10 }
    }
}

/// Complete bridge configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Expected raster layout.
    pub raster: RasterSection,
    /// Tablet coordinate maxima.
    pub device: DeviceExtents,
    /// Tablet mounting.
    pub orientation: Orientation,
    /// Snapshot destination.
    pub snapshot: SnapshotSection,
    /// Channel retry policy.
    pub ingest: IngestSection,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            raster: RasterSection::default(),
            device: DeviceExtents::default(),
            orientation: Orientation::rotated(),
            snapshot: SnapshotSection::default(),
            ingest: IngestSection::default(),
        }
    }
}

impl BridgeConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.raster.width == 0 || self.raster.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "raster must be non-empty, got {}x{}",
                self.raster.width, self.raster.height
            )));
        }
        if self.raster.header_bytes == Some(0) {
            return Err(ConfigError::Invalid("raster.header_bytes must be at least 1".into()));
        }
        if self.device.max_x <= 0 || self.device.max_y <= 0 {
            return Err(ConfigError::Invalid(format!(
                "device maxima must be positive, got {}x{}",
                self.device.max_x, self.device.max_y
            )));
        }
        Ok(())
    }

    /// Frame layout implied by the raster section.
    #[must_use]
    pub fn geometry(&self) -> RasterGeometry {
        match self.raster.header_bytes {
            Some(header_bytes) => {
                RasterGeometry::with_header_bytes(self.raster.width, self.raster.height, header_bytes)
            }
            None => RasterGeometry::new(self.raster.width, self.raster.height),
        }
    }

    /// Coordinate mapper for this device, raster and mounting.
    #[must_use]
    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.device, self.geometry(), self.orientation)
    }

    /// Pause after an end-of-stream read.
    #[must_use]
    pub const fn eof_backoff(&self) -> Duration {
        Duration::from_millis(self.ingest.eof_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployed_rig() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.geometry().frame_size(), 300 * 480 + 15);
        assert_eq!(config.orientation, Orientation::rotated());
        assert_eq!(config.snapshot.path, PathBuf::from("image.pgm"));
        assert_eq!(config.eof_backoff(), Duration::from_millis(10));
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(BridgeConfig::from_toml_str("").unwrap(), BridgeConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [raster]
            width = 480
            height = 300

            [orientation]
            swap_axes = false

            [snapshot]
            path = "/tmp/scope.pgm"
            "#,
        )
        .unwrap();

        assert_eq!(config.geometry(), RasterGeometry::new(480, 300));
        assert_eq!(config.orientation, Orientation::identity());
        assert_eq!(config.device, DeviceExtents::new(21600, 13500));
        assert_eq!(config.snapshot.path, PathBuf::from("/tmp/scope.pgm"));
    }

    #[test]
    fn test_header_override() {
        let config = BridgeConfig::from_toml_str("[raster]\nheader_bytes = 20\n").unwrap();
        assert_eq!(config.geometry().header_bytes(), 20);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            BridgeConfig::from_toml_str("[raster]\nwidth = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml_str("[device]\nmax_x = 0\nmax_y = 10\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml_str("[raster]\nheader_bytes = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml_str("[raster]\nwidth = \"wide\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = BridgeConfig::load(Path::new("/nonexistent/tactile.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
