//! Lookup control loop: one snapshot check, then one lookup, per iteration.

use std::convert::Infallible;
use std::io::{Read, Write};
use std::time::Duration;

use crate::lookup::{LookupEngine, LookupStep};
use crate::snapshot::{SnapshotDumper, SnapshotTrigger};
use crate::stats::bump;

/// Drives a [`LookupEngine`] and services snapshot requests between samples.
pub struct ControlLoop<R, W> {
    engine: LookupEngine<R, W>,
    trigger: SnapshotTrigger,
    dumper: SnapshotDumper,
    backoff: Duration,
}

impl<R: Read, W: Write> ControlLoop<R, W> {
    /// Creates a control loop.
    #[must_use]
    pub fn new(
        engine: LookupEngine<R, W>,
        trigger: SnapshotTrigger,
        dumper: SnapshotDumper,
        backoff: Duration,
    ) -> Self {
        Self {
            engine,
            trigger,
            dumper,
            backoff,
        }
    }

    /// The engine being driven.
    #[must_use]
    pub const fn engine(&self) -> &LookupEngine<R, W> {
        &self.engine
    }

    /// One iteration: write a snapshot if one was requested, then answer one
    /// sample. Backs off when the pointer channel had nothing to give.
    pub fn iterate(&mut self) -> LookupStep {
        if self.trigger.take() {
            match self.dumper.dump(self.engine.raster()) {
                Ok(_) => {
                    bump(&self.engine.stats().snapshots);
                }
                Err(e) => tracing::warn!(error = %e, "snapshot failed"),
            }
        }

        let step = self.engine.step();
        match step {
            LookupStep::Emitted { .. } => {}
            LookupStep::Discarded { .. } | LookupStep::Idle | LookupStep::Failed => {
                if !self.backoff.is_zero() {
                    std::thread::sleep(self.backoff);
                }
            }
        }
        step
    }

    /// Runs until the process is killed.
    pub fn run(mut self) -> Infallible {
        tracing::info!(snapshot = %self.dumper.path().display(), "lookup loop started");
        loop {
            self.iterate();
        }
    }
}
