//! # Pipeline Counters
//!
//! Lock-free counters shared between the worker loops and whoever reports
//! on them. Relaxed ordering throughout: these are for logs, not control flow.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the ingest thread.
#[derive(Debug, Default)]
pub struct IngestStats {
    /// Frames published into the raster.
    pub frames: AtomicU64,
    /// Frames whose header declared other dimensions.
    pub header_mismatches: AtomicU64,
    /// Frames whose header could not be parsed at all.
    pub unparseable_headers: AtomicU64,
    /// Reads that hit end of stream (producer absent or closed).
    pub end_of_stream: AtomicU64,
    /// Reads that failed with an I/O error.
    pub read_errors: AtomicU64,
    /// Times a producer that had delivered frames went away.
    pub producer_disconnects: AtomicU64,
}

impl IngestStats {
    /// Frames published so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Frames published with a missing or mismatched header.
    #[must_use]
    pub fn invalid_frames(&self) -> u64 {
        self.header_mismatches.load(Ordering::Relaxed) + self.unparseable_headers.load(Ordering::Relaxed)
    }
}

/// Counters for the lookup loop.
#[derive(Debug, Default)]
pub struct LookupStats {
    /// Complete pointer samples received.
    pub samples: AtomicU64,
    /// Samples carrying the pen-lift sentinel.
    pub lifted: AtomicU64,
    /// Samples that mapped outside the raster.
    pub out_of_range: AtomicU64,
    /// Partial samples dropped at end of stream.
    pub discarded_partials: AtomicU64,
    /// Commands written to the haptic channel.
    pub commands_written: AtomicU64,
    /// Commands the haptic channel refused.
    pub write_errors: AtomicU64,
    /// Runs of consecutive refused commands.
    pub write_outages: AtomicU64,
    /// Snapshots written.
    pub snapshots: AtomicU64,
}

impl LookupStats {
    /// Complete samples received so far.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    /// Commands successfully written so far.
    #[must_use]
    pub fn commands_written(&self) -> u64 {
        self.commands_written.load(Ordering::Relaxed)
    }
}

#[inline]
pub(crate) fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}
