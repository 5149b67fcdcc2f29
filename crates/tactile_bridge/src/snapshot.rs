//! # Snapshots
//!
//! An interrupt requests a snapshot; the control loop takes the request and
//! writes the current frame to disk as a `P5` image.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tactile_core::{encode_snapshot, SharedRaster};

use crate::error::SnapshotError;

/// One-shot request flag shared by the interrupt listener and the control loop.
///
/// Requests made before the loop gets to them collapse into one snapshot.
#[derive(Clone, Debug, Default)]
pub struct SnapshotTrigger {
    requested: Arc<AtomicBool>,
}

impl SnapshotTrigger {
    /// Creates a trigger with no pending request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a snapshot. Safe to call from any thread.
    #[inline]
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Clears the request, returning whether one was pending.
    #[inline]
    #[must_use]
    pub fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }

    /// Whether a request is pending.
    #[inline]
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Writes the raster's current frame to a file.
#[derive(Clone, Debug)]
pub struct SnapshotDumper {
    path: PathBuf,
}

impl SnapshotDumper {
    /// Creates a dumper writing to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a fresh canonical header and the current frame's pixels.
    ///
    /// The pixels are copied out first so the frame is not held while the
    /// file is written. Returns the generation that was written.
    pub fn dump(&self, raster: &SharedRaster) -> Result<u64, SnapshotError> {
        let geometry = raster.geometry();
        let generation = raster.generation();
        let pixels = raster.view().pixels().to_vec();

        let wrap = |source| SnapshotError {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(wrap)?;
        let mut out = BufWriter::new(file);
        encode_snapshot(&mut out, geometry.width(), geometry.height(), &pixels).map_err(wrap)?;

        tracing::info!(
            path = %self.path.display(),
            generation,
            bytes = pixels.len(),
            "snapshot written"
        );
        Ok(generation)
    }
}
