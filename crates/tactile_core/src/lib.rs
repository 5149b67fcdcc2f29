//! # Tactile Core
//!
//! Shared building blocks for the tactile oscilloscope bridge:
//! - A fixed-size raster of intensity bytes that one thread publishes and
//!   another samples, without torn reads
//! - The `P5` frame header codec used for both the incoming stream and snapshots
//! - Pointer and haptic wire records
//! - The device-to-raster coordinate mapper
//!
//! ## Architecture Rules
//!
//! 1. **Capacity is fixed at startup** - the raster is never resized
//! 2. **Lookups never read out of bounds** - every offset is checked against the geometry
//! 3. **Bad frames are served, not rejected** - mismatches are reported, never fatal
//!
//! ## Example
//!
//! ```rust
//! use tactile_core::{CoordinateMapper, DeviceExtents, Orientation, PointerSample, RasterGeometry, SharedRaster};
//!
//! let geometry = RasterGeometry::new(480, 300);
//! let raster = SharedRaster::new(geometry);
//! let mapper = CoordinateMapper::new(DeviceExtents::new(21600, 13500), geometry, Orientation::identity());
//!
//! let pixel = mapper.map(PointerSample::new(10800, 6750)).expect("pen is down");
//! assert_eq!((pixel.x, pixel.y), (240, 150));
//! assert_eq!(raster.sample(pixel), 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod codec;
pub mod config;
pub mod error;
pub mod mapper;
pub mod raster;
pub mod wire;

pub use codec::{canonical_header, encode_snapshot, FrameHeader, MAX_VALUE};
pub use config::BridgeConfig;
pub use error::{ConfigError, ConfigResult};
pub use mapper::{CoordinateMapper, DeviceExtents, Orientation, PixelCoord};
pub use raster::{RasterGeometry, RasterView, SharedRaster};
pub use wire::{HapticCommand, PointerSample};

/// Raster width of the deployed signal compiler output.
pub const DEFAULT_RASTER_WIDTH: u32 = 300;

/// Raster height of the deployed signal compiler output.
pub const DEFAULT_RASTER_HEIGHT: u32 = 480;

/// Largest X coordinate reported by the deployed tablet.
pub const DEFAULT_DEVICE_MAX_X: i32 = 21600;

/// Largest Y coordinate reported by the deployed tablet.
pub const DEFAULT_DEVICE_MAX_Y: i32 = 13500;

/// Default snapshot file written on interrupt.
pub const DEFAULT_SNAPSHOT_PATH: &str = "image.pgm";
