//! # Tactile Bridge
//!
//! Lets a pen on a tablet "feel" an oscilloscope image: wherever the pen
//! touches, the haptic motor vibrates with the brightness of that pixel.
//!
//! ## Architecture
//!
//! ```text
//!  frame FIFO ──► RasterIngest ──► SharedRaster ◄── LookupEngine ◄── pointer FIFO
//!               (ingest thread)                    (control loop)
//!                                                        │
//!                                   SIGINT ─► trigger ─► SnapshotDumper ─► image.pgm
//!                                                        │
//!                                                        ▼
//!                                                   haptic FIFO
//! ```
//!
//! - **Ingest**: accumulate one full frame, check its header, publish it
//! - **Lookup**: accumulate one pointer sample, map it, read one byte, write one command
//! - **Snapshot**: the interrupt only flips a flag; the dump runs in the control loop
//!
//! ## Failure Model
//!
//! Only startup can fail (a channel that cannot be created or opened). After
//! that, bad input makes the pen feel wrong, never crashes the bridge.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tactile_bridge::{ChannelPaths, PipelineSupervisor};
//! use tactile_core::BridgeConfig;
//!
//! let paths = ChannelPaths::new("/tmp/pgm", "/tmp/pnt", "/tmp/haptic");
//! let supervisor = PipelineSupervisor::new(BridgeConfig::default());
//! supervisor.run(&paths)?; // Only returns on startup failure
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod ingest;
pub mod interrupt;
pub mod lookup;
pub mod snapshot;
pub mod stats;
pub mod supervisor;
pub mod transport;

pub use error::{BridgeError, ChannelError, ChannelResult, ChannelRole, SnapshotError};
pub use ingest::{HeaderCheck, IngestStep, RasterIngest};
pub use interrupt::spawn_interrupt_listener;
pub use lookup::{LookupEngine, LookupStep};
pub use snapshot::{SnapshotDumper, SnapshotTrigger};
pub use stats::{IngestStats, LookupStats};
pub use supervisor::{ChannelPaths, ControlLoop, PipelineSupervisor};
pub use transport::{Receive, RecordReader};

/// Lookup samples between periodic summary log lines.
pub const SUMMARY_INTERVAL: u64 = 10_000;

/// Published frames between periodic ingest summary log lines.
pub const FRAME_SUMMARY_INTERVAL: u64 = 1_000;
