//! # Raster Ingest
//!
//! Owns the frame channel. Accumulates exactly one frame, checks its header
//! against the configured geometry, and publishes it whole.
//!
//! A frame with a wrong or missing header is still published: the warning
//! is the only consequence.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use tactile_core::{FrameHeader, SharedRaster};

use crate::stats::{bump, IngestStats};
use crate::transport::{Receive, RecordReader};
use crate::FRAME_SUMMARY_INTERVAL;

/// How a published frame's header compared with the configured geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderCheck {
    /// Declared dimensions match.
    Valid,
    /// Header parsed but declared other dimensions.
    Mismatch(FrameHeader),
    /// No `P5 <w> <h> <max>` header at the start of the frame.
    Unparseable,
}

/// Outcome of one [`RasterIngest::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestStep {
    /// A full frame was published.
    Published {
        /// Raster generation after the publish.
        generation: u64,
        /// Header verdict.
        header: HeaderCheck,
    },
    /// The stream ended mid-frame; the partial frame is kept.
    Pending {
        /// Bytes accumulated so far.
        partial: usize,
    },
    /// The read failed; the partial frame is kept.
    Failed,
}

/// Frame channel reader feeding a [`SharedRaster`].
pub struct RasterIngest<R> {
    reader: RecordReader<R>,
    raster: Arc<SharedRaster>,
    backoff: Duration,
    stats: Arc<IngestStats>,
    attached: bool,
}

impl<R: Read> RasterIngest<R> {
    /// Creates an ingest loop reading frames of the raster's size from `source`.
    #[must_use]
    pub fn new(source: R, raster: Arc<SharedRaster>, backoff: Duration) -> Self {
        let frame_size = raster.capacity();
        Self {
            reader: RecordReader::new(source, frame_size),
            raster,
            backoff,
            stats: Arc::new(IngestStats::default()),
            attached: false,
        }
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<IngestStats> {
        Arc::clone(&self.stats)
    }

    /// Receives until one frame is complete, the stream ends, or a read fails.
    pub fn step(&mut self) -> IngestStep {
        match self.reader.receive() {
            Ok(Receive::Complete) => {
                let frame = self.reader.record();
                let header = FrameHeader::parse(frame);
                let check = self.check(header);

                self.raster.write_frame(frame, header);
                let frames = bump(&self.stats.frames);
                let generation = self.raster.generation();
                tracing::debug!(generation, "frame published");

                if !self.attached {
                    self.attached = true;
                    tracing::info!(generation, "frame producer attached");
                }
                if frames % FRAME_SUMMARY_INTERVAL == 0 {
                    self.log_summary();
                }

                IngestStep::Published {
                    generation,
                    header: check,
                }
            }
            Ok(Receive::Pending { partial }) => {
                bump(&self.stats.end_of_stream);
                if self.attached {
                    self.attached = false;
                    bump(&self.stats.producer_disconnects);
                    tracing::info!(partial, "frame producer detached");
                    self.log_summary();
                }
                IngestStep::Pending { partial }
            }
            Err(e) => {
                bump(&self.stats.read_errors);
                tracing::warn!(error = %e, "frame channel read failed");
                IngestStep::Failed
            }
        }
    }

    /// Runs forever, backing off after end of stream or a failed read.
    pub fn run(mut self) {
        tracing::info!(
            frame_size = self.reader.record_size(),
            "frame ingest started"
        );
        loop {
            match self.step() {
                IngestStep::Published { .. } => {}
                IngestStep::Pending { .. } | IngestStep::Failed => std::thread::sleep(self.backoff),
            }
        }
    }

    fn log_summary(&self) {
        use std::sync::atomic::Ordering::Relaxed;

        tracing::info!(
            frames = self.stats.frames(),
            header_mismatches = self.stats.header_mismatches.load(Relaxed),
            unparseable_headers = self.stats.unparseable_headers.load(Relaxed),
            end_of_stream = self.stats.end_of_stream.load(Relaxed),
            read_errors = self.stats.read_errors.load(Relaxed),
            disconnects = self.stats.producer_disconnects.load(Relaxed),
            generation = self.raster.generation(),
            "ingest summary"
        );
    }

    fn check(&self, header: Option<FrameHeader>) -> HeaderCheck {
        let geometry = self.raster.geometry();
        match header {
            Some(h) if h.matches(geometry.width(), geometry.height()) => HeaderCheck::Valid,
            Some(h) => {
                bump(&self.stats.header_mismatches);
                tracing::warn!(
                    declared_width = h.declared_width,
                    declared_height = h.declared_height,
                    expected_width = geometry.width(),
                    expected_height = geometry.height(),
                    "frame dimensions mismatch; lookup engine will be serving invalid data"
                );
                HeaderCheck::Mismatch(h)
            }
            None => {
                bump(&self.stats.unparseable_headers);
                tracing::warn!("frame header unparseable; lookup engine will be serving invalid data");
                HeaderCheck::Unparseable
            }
        }
    }
}
