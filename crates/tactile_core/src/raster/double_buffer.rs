//! # Double-Buffered Raster
//!
//! Single writer (ingest), many readers (lookup, snapshot).
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────┐
//!                    │        SharedRaster         │
//!                    │                             │
//!                    │  ┌─────────┐  ┌─────────┐   │
//!                    │  │ Frame A │  │ Frame B │   │
//!                    │  └────┬────┘  └────┬────┘   │
//!                    │       │            │        │
//!                    │  ┌────┴────────────┴────┐   │
//!                    │  │ Atomic front (0/1)   │   │
//!                    │  └──────────────────────┘   │
//!                    └─────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!      ┌──────────────┐ ┌────────────┐ ┌────────────┐
//!      │ write_frame  │ │ RasterView │ │ generation │
//!      │  (ingest)    │ │  (lookup)  │ │ (counter)  │
//!      └──────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## Consistency Contract
//!
//! - A `RasterView` always covers one complete frame: either the zeroed
//!   startup frame or a frame passed whole to `write_frame`.
//! - Readers may see a frame that is one publish behind the newest.
//! - Publishing never blocks on readers of the front frame. It only waits on
//!   a reader that is still holding the *back* frame from two publishes ago.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use super::RasterGeometry;
use crate::codec::FrameHeader;
use crate::mapper::PixelCoord;

/// One fixed-capacity frame slot.
struct RasterFrame {
    /// Header prefix and pixels, exactly `geometry.frame_size()` bytes.
    bytes: Box<[u8]>,
    /// Header parsed from the frame that was written into this slot.
    header: Option<FrameHeader>,
}

impl RasterFrame {
    fn zeroed(len: usize) -> Self {
        Self {
            bytes: vec![0u8; len].into_boxed_slice(),
            header: None,
        }
    }
}

/// Raster shared between the ingest thread and the lookup loop.
///
/// Usually held as `Arc<SharedRaster>`; every method takes `&self`.
///
/// ## Usage
///
/// ```rust
/// use tactile_core::{FrameHeader, RasterGeometry, SharedRaster};
///
/// let geometry = RasterGeometry::new(2, 2);
/// let raster = SharedRaster::new(geometry);
///
/// let frame = b"P5 2 2 255\n\x0a\x0b\x0c\x0d";
/// raster.write_frame(frame, FrameHeader::parse(frame));
///
/// assert_eq!(raster.read_byte(geometry.header_bytes() + 3), Some(0x0d));
/// assert_eq!(raster.generation(), 1);
/// ```
pub struct SharedRaster {
    geometry: RasterGeometry,

    /// The two frame slots.
    frames: [RwLock<RasterFrame>; 2],

    /// Index of the frame readers should use (0 or 1).
    /// The back frame is always `front ^ 1`.
    front: AtomicUsize,

    /// Serializes publishers so two writers can never flip the same slot.
    writer: Mutex<()>,

    /// Number of frames published since startup.
    generation: AtomicU64,
}

impl SharedRaster {
    /// Allocates both frames, zero-filled, for the given geometry.
    ///
    /// This is the only allocation the raster ever makes.
    #[must_use]
    pub fn new(geometry: RasterGeometry) -> Self {
        let len = geometry.frame_size();
        Self {
            geometry,
            frames: [
                RwLock::new(RasterFrame::zeroed(len)),
                RwLock::new(RasterFrame::zeroed(len)),
            ],
            front: AtomicUsize::new(0),
            writer: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the fixed geometry.
    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> RasterGeometry {
        self.geometry
    }

    /// Returns the fixed capacity in bytes (header + pixels).
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.geometry.frame_size()
    }

    /// Returns the number of frames published so far.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Publishes a new frame.
    ///
    /// `bytes` overwrites the back slot from offset 0. Input longer than the
    /// capacity is truncated; shorter input leaves the tail zeroed. The slot
    /// then becomes the front frame in one atomic store, so readers switch
    /// from the old frame to the new one without ever seeing a mix.
    ///
    /// Never fails: whether the frame is *sensible* is the caller's concern.
    pub fn write_frame(&self, bytes: &[u8], header: Option<FrameHeader>) {
        let _writer = self.writer.lock();

        let back = self.front.load(Ordering::Acquire) ^ 1;
        {
            let mut frame = self.frames[back].write();
            let len = bytes.len().min(frame.bytes.len());
            frame.bytes[..len].copy_from_slice(&bytes[..len]);
            frame.bytes[len..].fill(0);
            frame.header = header;
        }

        self.front.store(back, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Gets a read view of the current front frame.
    ///
    /// Hold it only as long as needed: a view that outlives two publishes
    /// makes the writer wait for it.
    #[must_use]
    pub fn view(&self) -> RasterView<'_> {
        let front = self.front.load(Ordering::Acquire);
        RasterView {
            geometry: self.geometry,
            frame: self.frames[front].read(),
        }
    }

    /// Returns the byte at `offset` in the current front frame, or `None`
    /// past the fixed capacity.
    #[inline]
    #[must_use]
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.view().byte(offset)
    }

    /// Returns the intensity at `pixel`, or 0 when the pixel lies outside
    /// the raster. Never reads out of bounds.
    #[inline]
    #[must_use]
    pub fn sample(&self, pixel: PixelCoord) -> u8 {
        self.geometry
            .pixel_offset(pixel.x, pixel.y)
            .and_then(|offset| self.read_byte(offset))
            .unwrap_or(0)
    }

    /// Returns the header parsed from the current front frame.
    ///
    /// `None` before the first publish and after a frame whose header could
    /// not be parsed.
    #[inline]
    #[must_use]
    pub fn declared_dimensions(&self) -> Option<FrameHeader> {
        self.view().header()
    }
}

/// Read guard over one complete frame.
///
/// All reads through the same view see the same frame.
pub struct RasterView<'a> {
    geometry: RasterGeometry,
    frame: RwLockReadGuard<'a, RasterFrame>,
}

impl RasterView<'_> {
    /// Whole frame, header prefix included.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.frame.bytes
    }

    /// Pixel region only (header prefix skipped).
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.frame.bytes[self.geometry.header_bytes()..]
    }

    /// Byte at `offset`, or `None` past the capacity.
    #[inline]
    #[must_use]
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.frame.bytes.get(offset).copied()
    }

    /// Header parsed from this frame.
    #[inline]
    #[must_use]
    pub fn header(&self) -> Option<FrameHeader> {
        self.frame.header
    }
}
