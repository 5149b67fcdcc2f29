//! # Wire Records
//!
//! Fixed-size records exchanged with the pointer driver and the haptic driver.
//! Both are `Pod`, so decoding is a plain byte copy in native byte order.

use bytemuck::{Pod, Zeroable};

/// One pointer reading in device coordinates.
///
/// Wire form: two native-endian `i32`, `x` then `y`.
///
/// Size: 8 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct PointerSample {
    /// Device X.
    pub x: i32,
    /// Device Y.
    pub y: i32,
}

impl PointerSample {
    /// Size in bytes.
    pub const SIZE: usize = 8;

    /// Reserved pair meaning the pen is not touching the surface.
    pub const LIFTED: Self = Self::new(0, 0);

    /// Creates a sample.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns true for the pen-lift sentinel.
    #[inline]
    #[must_use]
    pub const fn is_lifted(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Decodes one record, or `None` unless `bytes` is exactly [`Self::SIZE`] long.
    #[inline]
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }

    /// Encodes one record (producer side).
    #[inline]
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        bytemuck::cast(*self)
    }
}

/// One command for the haptic driver.
///
/// Size: 2 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct HapticCommand {
    /// Playback mode.
    pub mode: u8,
    /// Vibration strength, 0-255.
    pub intensity: u8,
}

impl HapticCommand {
    /// Size in bytes.
    pub const SIZE: usize = 2;

    /// Mode: real-time playback of `intensity`.
    pub const MODE_REALTIME: u8 = 0;

    /// Creates a real-time playback command.
    #[inline]
    #[must_use]
    pub const fn realtime(intensity: u8) -> Self {
        Self {
            mode: Self::MODE_REALTIME,
            intensity,
        }
    }

    /// Encodes the command. Always written to the driver as one unit.
    #[inline]
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        bytemuck::cast(*self)
    }
}
