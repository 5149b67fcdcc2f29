//! # Bridge Error Types
//!
//! Everything here is a startup or snapshot failure. The ingest and lookup
//! loops never return errors; they log and carry on.

use std::fmt;
use std::io;
use std::path::PathBuf;

use tactile_core::ConfigError;
use thiserror::Error;

/// Which of the three channels an error is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Raster frames in.
    Frames,
    /// Pointer samples in.
    Pointer,
    /// Haptic commands out.
    Haptic,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frames => write!(f, "frame input"),
            Self::Pointer => write!(f, "pointer input"),
            Self::Haptic => write!(f, "haptic output"),
        }
    }
}

/// A channel could not be made ready at startup.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The FIFO did not exist and could not be created.
    #[error("cannot create {role} channel {path}: {source}")]
    Create {
        /// Channel role.
        role: ChannelRole,
        /// Channel path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The channel exists but could not be opened.
    #[error("cannot open {role} channel {path}: {source}")]
    Open {
        /// Channel role.
        role: ChannelRole,
        /// Channel path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The channel opened but could not be put into its working mode.
    #[error("cannot configure {role} channel {path}: {source}")]
    Configure {
        /// Channel role.
        role: ChannelRole,
        /// Channel path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl ChannelError {
    /// Role of the channel that failed.
    #[must_use]
    pub const fn role(&self) -> ChannelRole {
        match self {
            Self::Create { role, .. } | Self::Open { role, .. } | Self::Configure { role, .. } => *role,
        }
    }
}

/// Result type for channel setup.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Snapshot could not be written. Logged, never fatal.
#[derive(Error, Debug)]
#[error("cannot write snapshot {path}: {source}")]
pub struct SnapshotError {
    /// Snapshot path.
    pub path: PathBuf,
    /// Underlying error.
    #[source]
    pub source: io::Error,
}

/// Fatal startup failure of the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Config file missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A channel could not be created or opened.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A worker thread could not be started.
    #[error("cannot start {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl BridgeError {
    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Channel(_) | Self::Spawn { .. } => 1,
        }
    }
}
