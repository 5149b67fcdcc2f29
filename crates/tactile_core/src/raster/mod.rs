//! # Shared Raster
//!
//! The one piece of state shared between the ingest thread and the lookup loop.
//!
//! ## The Problem
//!
//! ```text
//! Ingest thread:  OVERWRITE the whole frame, ~tens of times per second
//! Lookup loop:    READ one byte per pointer sample, hundreds of times per second
//!
//! Unsynchronized:  a lookup can see half of frame N and half of frame N+1
//! ```
//!
//! ## The Solution: Double Buffering
//!
//! ```text
//! Publish N:    ingest copies into frame B, then flips front -> B
//! Lookups:      read whichever frame is front, under a read guard
//! Publish N+1:  ingest copies into frame A, then flips front -> A
//! ```
//!
//! A lookup sees exactly one published frame (possibly one publish stale),
//! never a mix. The per-frame locks are uncontended in steady state: the
//! writer only ever touches the back frame.

mod double_buffer;

pub use double_buffer::{RasterView, SharedRaster};

use crate::codec::canonical_header;

/// Fixed layout of a raster frame: header prefix followed by `width * height` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RasterGeometry {
    width: u32,
    height: u32,
    header_bytes: usize,
}

impl RasterGeometry {
    /// Creates a geometry whose header is the canonical `"P5 <w> <h> 255\n"`.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_header_bytes(width, height, canonical_header(width, height).len())
    }

    /// Creates a geometry with an explicit header length.
    #[inline]
    #[must_use]
    pub const fn with_header_bytes(width: u32, height: u32, header_bytes: usize) -> Self {
        Self {
            width,
            height,
            header_bytes,
        }
    }

    /// Raster width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Length of the textual header that precedes the pixels.
    #[inline]
    #[must_use]
    pub const fn header_bytes(&self) -> usize {
        self.header_bytes
    }

    /// Number of intensity bytes in one frame.
    #[inline]
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total bytes in one frame on the wire (header + pixels).
    #[inline]
    #[must_use]
    pub const fn frame_size(&self) -> usize {
        self.header_bytes + self.pixel_count()
    }

    /// Linear frame offset of pixel `(x, y)`, or `None` if the pixel lies
    /// outside `[0, width) x [0, height)`.
    ///
    /// The returned offset is always `< frame_size()`.
    #[inline]
    #[must_use]
    pub fn pixel_offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;

        let offset = self
            .header_bytes
            .checked_add(y.checked_mul(self.width as usize)?)?
            .checked_add(x)?;

        (offset < self.frame_size()).then_some(offset)
    }
}
