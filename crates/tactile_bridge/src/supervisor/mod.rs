//! # Pipeline Supervisor
//!
//! Brings the bridge up in a fixed order and then hands the main thread to
//! the lookup loop:
//!
//! 1. Create any missing FIFOs
//! 2. Open both inputs without waiting for producers, then make them blocking
//! 3. Install the interrupt listener
//! 4. Start the ingest thread
//! 5. Open the haptic output (waits for the driver)
//! 6. Run the lookup loop on the calling thread
//!
//! Frames are ingested and interrupts handled from step 4 on, even while
//! step 5 is still waiting. Every failure before step 6 is fatal and
//! returned. Nothing after it is.

mod control;

pub use control::ControlLoop;

use std::convert::Infallible;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tactile_core::{BridgeConfig, SharedRaster};

use crate::error::{BridgeError, ChannelError, ChannelResult, ChannelRole};
use crate::ingest::RasterIngest;
use crate::interrupt::spawn_interrupt_listener;
use crate::lookup::LookupEngine;
use crate::snapshot::{SnapshotDumper, SnapshotTrigger};
use crate::stats::IngestStats;
use crate::transport::fifo;

/// Thread name of the ingest loop.
pub const INGEST_THREAD: &str = "tactile-ingest";

/// Filesystem paths of the three channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelPaths {
    /// Raster frames in.
    pub frames: PathBuf,
    /// Pointer samples in.
    pub pointer: PathBuf,
    /// Haptic commands out.
    pub haptic: PathBuf,
}

impl ChannelPaths {
    /// Creates the path set.
    #[must_use]
    pub fn new(frames: impl Into<PathBuf>, pointer: impl Into<PathBuf>, haptic: impl Into<PathBuf>) -> Self {
        Self {
            frames: frames.into(),
            pointer: pointer.into(),
            haptic: haptic.into(),
        }
    }

    /// Each path with its role.
    pub fn with_roles(&self) -> impl Iterator<Item = (ChannelRole, &Path)> {
        [
            (ChannelRole::Frames, self.frames.as_path()),
            (ChannelRole::Pointer, self.pointer.as_path()),
            (ChannelRole::Haptic, self.haptic.as_path()),
        ]
        .into_iter()
    }
}

/// Owns the shared raster and the snapshot trigger, and starts the pipeline.
pub struct PipelineSupervisor {
    config: BridgeConfig,
    raster: Arc<SharedRaster>,
    trigger: SnapshotTrigger,
}

impl PipelineSupervisor {
    /// Allocates the raster for `config`. The raster is zeroed until the
    /// first frame arrives.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        let raster = Arc::new(SharedRaster::new(config.geometry()));
        Self {
            config,
            raster,
            trigger: SnapshotTrigger::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The shared raster.
    #[must_use]
    pub fn raster(&self) -> Arc<SharedRaster> {
        Arc::clone(&self.raster)
    }

    /// A handle that requests snapshots.
    #[must_use]
    pub fn trigger(&self) -> SnapshotTrigger {
        self.trigger.clone()
    }

    /// Opens the channels at `paths` and runs the bridge.
    ///
    /// Only returns on a startup failure.
    pub fn run(self, paths: &ChannelPaths) -> Result<Infallible, BridgeError> {
        for (role, path) in paths.with_roles() {
            fifo::ensure_fifo(path).map_err(|source| ChannelError::Create {
                role,
                path: path.to_path_buf(),
                source,
            })?;
        }

        let frames = open_input(ChannelRole::Frames, &paths.frames)?;
        let pointer = open_input(ChannelRole::Pointer, &paths.pointer)?;

        let frame_size = self.raster.capacity();
        match fifo::set_pipe_capacity(&frames, frame_size) {
            Ok(granted) => tracing::debug!(granted, "frame channel buffer resized"),
            Err(e) => tracing::warn!(error = %e, frame_size, "cannot resize frame channel buffer"),
        }

        if let Err(e) = spawn_interrupt_listener(self.trigger()) {
            tracing::warn!(error = %e, "interrupt listener unavailable; snapshots disabled");
        }

        self.start_ingest(frames)?;

        tracing::info!(path = %paths.haptic.display(), "waiting for haptic driver");
        let haptic = fifo::open_writer(&paths.haptic).map_err(|source| ChannelError::Open {
            role: ChannelRole::Haptic,
            path: paths.haptic.clone(),
            source,
        })?;
        tracing::info!("all channels open");

        match self.control_loop(pointer, haptic).run() {}
    }

    /// Starts the ingest thread on `frames`. Returns its counters.
    pub fn start_ingest<F>(&self, frames: F) -> Result<Arc<IngestStats>, BridgeError>
    where
        F: Read + Send + 'static,
    {
        let ingest = RasterIngest::new(frames, Arc::clone(&self.raster), self.config.eof_backoff());
        let stats = ingest.stats();
        std::thread::Builder::new()
            .name(INGEST_THREAD.into())
            .spawn(move || ingest.run())
            .map_err(|source| BridgeError::Spawn {
                name: INGEST_THREAD,
                source,
            })?;
        Ok(stats)
    }

    /// Builds the lookup loop over `pointer` and `haptic`, ready to run.
    #[must_use]
    pub fn control_loop<P, H>(self, pointer: P, haptic: H) -> ControlLoop<P, H>
    where
        P: Read,
        H: Write,
    {
        let geometry = self.raster.geometry();
        tracing::info!(
            width = geometry.width(),
            height = geometry.height(),
            header_bytes = geometry.header_bytes(),
            orientation = ?self.config.orientation,
            "pipeline started"
        );

        let backoff = self.config.eof_backoff();
        let engine = LookupEngine::new(pointer, haptic, self.raster, self.config.mapper());
        let dumper = SnapshotDumper::new(self.config.snapshot.path);
        ControlLoop::new(engine, self.trigger, dumper, backoff)
    }

    /// Starts the ingest thread on `frames` and returns the lookup loop over
    /// `pointer` and `haptic`.
    pub fn start<F, P, H>(self, frames: F, pointer: P, haptic: H) -> Result<ControlLoop<P, H>, BridgeError>
    where
        F: Read + Send + 'static,
        P: Read,
        H: Write,
    {
        self.start_ingest(frames)?;
        Ok(self.control_loop(pointer, haptic))
    }
}

fn open_input(role: ChannelRole, path: &Path) -> ChannelResult<File> {
    let file = fifo::open_reader(path).map_err(|source| ChannelError::Open {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    fifo::set_blocking(&file).map_err(|source| ChannelError::Configure {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(%role, path = %path.display(), "channel open");
    Ok(file)
}
