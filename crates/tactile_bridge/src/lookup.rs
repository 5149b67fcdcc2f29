//! # Lookup Engine
//!
//! For every pointer sample: map it to a pixel, read one intensity byte from
//! the current frame, write one haptic command. The hot path does not
//! allocate and never reads outside the raster.

use std::io::{Read, Write};
use std::sync::Arc;

use tactile_core::{CoordinateMapper, HapticCommand, PointerSample, SharedRaster};

use crate::stats::{bump, LookupStats};
use crate::transport::{Receive, RecordReader};
use crate::SUMMARY_INTERVAL;

/// Outcome of one [`LookupEngine::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupStep {
    /// A complete sample produced a command.
    Emitted {
        /// The command.
        command: HapticCommand,
        /// False if the haptic channel refused it.
        delivered: bool,
    },
    /// The stream ended mid-sample; the partial sample was dropped.
    Discarded {
        /// Bytes dropped.
        partial: usize,
    },
    /// The stream ended with nothing pending.
    Idle,
    /// The pointer read failed.
    Failed,
}

/// Pointer channel in, haptic channel out.
pub struct LookupEngine<R, W> {
    reader: RecordReader<R>,
    output: W,
    raster: Arc<SharedRaster>,
    mapper: CoordinateMapper,
    stats: Arc<LookupStats>,
    delivering: bool,
}

impl<R: Read, W: Write> LookupEngine<R, W> {
    /// Creates an engine reading samples from `pointer` and writing commands to `haptic`.
    #[must_use]
    pub fn new(pointer: R, haptic: W, raster: Arc<SharedRaster>, mapper: CoordinateMapper) -> Self {
        Self {
            reader: RecordReader::new(pointer, PointerSample::SIZE),
            output: haptic,
            raster,
            mapper,
            stats: Arc::new(LookupStats::default()),
            delivering: true,
        }
    }

    /// Shared counters.
    #[must_use]
    pub fn stats(&self) -> Arc<LookupStats> {
        Arc::clone(&self.stats)
    }

    /// False while the haptic channel is refusing commands.
    #[must_use]
    pub const fn is_delivering(&self) -> bool {
        self.delivering
    }

    /// The raster being sampled.
    #[must_use]
    pub fn raster(&self) -> &Arc<SharedRaster> {
        &self.raster
    }

    /// Intensity command for one sample.
    ///
    /// Pen lifted or pixel outside the raster gives intensity 0.
    #[must_use]
    pub fn command_for(&self, sample: PointerSample) -> HapticCommand {
        let Some(pixel) = self.mapper.map(sample) else {
            bump(&self.stats.lifted);
            return HapticCommand::realtime(0);
        };

        let geometry = self.raster.geometry();
        let intensity = geometry
            .pixel_offset(pixel.x, pixel.y)
            .and_then(|offset| self.raster.read_byte(offset));

        let intensity = intensity.unwrap_or_else(|| {
            bump(&self.stats.out_of_range);
            0
        });

        tracing::debug!(
            x = sample.x,
            y = sample.y,
            px = pixel.x,
            py = pixel.y,
            intensity,
            "sample"
        );
        HapticCommand::realtime(intensity)
    }

    /// Receives one sample and answers it with one command.
    pub fn step(&mut self) -> LookupStep {
        match self.reader.receive() {
            Ok(Receive::Complete) => {}
            Ok(Receive::Pending { partial: 0 }) => return LookupStep::Idle,
            Ok(Receive::Pending { partial }) => {
                self.reader.discard_partial();
                bump(&self.stats.discarded_partials);
                tracing::debug!(partial, "partial pointer sample discarded");
                return LookupStep::Discarded { partial };
            }
            Err(e) => {
                tracing::warn!(error = %e, "pointer channel read failed");
                return LookupStep::Failed;
            }
        }

        let Some(sample) = PointerSample::from_bytes(self.reader.record()) else {
            return LookupStep::Idle;
        };

        let samples = bump(&self.stats.samples);
        let command = self.command_for(sample);
        let delivered = self.emit(command);

        if samples % SUMMARY_INTERVAL == 0 {
            self.log_summary(samples);
        }

        LookupStep::Emitted { command, delivered }
    }

    /// Writes one command as a single 2-byte write.
    ///
    /// Only the first failure of an outage and the recovery are logged; the
    /// failures in between show up in the summary's `write_errors`.
    fn emit(&mut self, command: HapticCommand) -> bool {
        let bytes = command.to_bytes();
        match self.output.write_all(&bytes).and_then(|()| self.output.flush()) {
            Ok(()) => {
                bump(&self.stats.commands_written);
                if !self.delivering {
                    self.delivering = true;
                    tracing::info!(
                        write_errors = self.stats.write_errors.load(std::sync::atomic::Ordering::Relaxed),
                        "haptic channel recovered"
                    );
                }
                true
            }
            Err(e) => {
                bump(&self.stats.write_errors);
                if self.delivering {
                    self.delivering = false;
                    bump(&self.stats.write_outages);
                    tracing::warn!(error = %e, "haptic channel write failed");
                }
                false
            }
        }
    }

    fn log_summary(&self, samples: u64) {
        use std::sync::atomic::Ordering::Relaxed;

        tracing::info!(
            samples,
            lifted = self.stats.lifted.load(Relaxed),
            out_of_range = self.stats.out_of_range.load(Relaxed),
            discarded = self.stats.discarded_partials.load(Relaxed),
            written = self.stats.commands_written.load(Relaxed),
            write_errors = self.stats.write_errors.load(Relaxed),
            write_outages = self.stats.write_outages.load(Relaxed),
            generation = self.raster.generation(),
            "lookup summary"
        );
    }
}
