//! # Frame Codec
//!
//! The raster stream and the snapshot file share one format:
//!
//! ```text
//! "P5 <width> <height> <maxval>\n" <width * height raw intensity bytes>
//! ```
//!
//! Parsing is deliberately forgiving (any run of whitespace between fields, no
//! comments, no multi-byte samples). The parsed header is only compared
//! against the configured geometry; it never changes the frame size.

use std::io::{self, Write};

/// Maximum intensity written into every snapshot header.
///
/// Raster samples are single bytes, so this is always 255.
pub const MAX_VALUE: u32 = 255;

/// Format tag at the start of every frame.
pub const HEADER_TAG: &[u8; 2] = b"P5";

/// Header fields as declared by an incoming frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Width the producer claims the frame has.
    pub declared_width: u32,
    /// Height the producer claims the frame has.
    pub declared_height: u32,
    /// Declared maximum intensity.
    pub max_value: u32,
}

impl FrameHeader {
    /// Creates a header.
    #[inline]
    #[must_use]
    pub const fn new(declared_width: u32, declared_height: u32, max_value: u32) -> Self {
        Self {
            declared_width,
            declared_height,
            max_value,
        }
    }

    /// Parses `"P5 <width> <height> <maxval>"` from the start of `frame`.
    ///
    /// Behaves like `sscanf(frame, "P5 %u %u %u")`: whitespace before each
    /// number is optional and skipped, each number needs at least one digit,
    /// and anything after the third number is ignored. Returns `None` when the
    /// tag is missing, a number is missing, or a number overflows `u32`.
    #[must_use]
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let rest = frame.strip_prefix(HEADER_TAG.as_slice())?;
        let mut cursor = HeaderCursor { bytes: rest };

        let declared_width = cursor.next_u32()?;
        let declared_height = cursor.next_u32()?;
        let max_value = cursor.next_u32()?;

        Some(Self::new(declared_width, declared_height, max_value))
    }

    /// Returns true if the declared dimensions equal `width` x `height`.
    #[inline]
    #[must_use]
    pub const fn matches(&self, width: u32, height: u32) -> bool {
        self.declared_width == width && self.declared_height == height
    }

    /// Writes the header in canonical form (single spaces, trailing newline).
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "P5 {} {} {}",
            self.declared_width, self.declared_height, self.max_value
        )
    }
}

struct HeaderCursor<'a> {
    bytes: &'a [u8],
}

impl HeaderCursor<'_> {
    fn next_u32(&mut self) -> Option<u32> {
        let start = self
            .bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())?;
        let digits = &self.bytes[start..];
        let len = digits.iter().take_while(|b| b.is_ascii_digit()).count();
        if len == 0 {
            return None;
        }

        let mut value: u32 = 0;
        for &digit in &digits[..len] {
            value = value
                .checked_mul(10)?
                .checked_add(u32::from(digit - b'0'))?;
        }

        self.bytes = &digits[len..];
        Some(value)
    }
}

/// Canonical header for a `width` x `height` raster with [`MAX_VALUE`].
#[must_use]
pub fn canonical_header(width: u32, height: u32) -> String {
    format!("P5 {width} {height} {MAX_VALUE}\n")
}

/// Writes a complete snapshot: canonical header followed by `pixels`.
///
/// `pixels` must be exactly the `width * height` intensity bytes; the incoming
/// frame's own header is never copied, so a malformed producer header cannot
/// end up in a snapshot.
pub fn encode_snapshot<W: Write>(out: &mut W, width: u32, height: u32, pixels: &[u8]) -> io::Result<()> {
    FrameHeader::new(width, height, MAX_VALUE).write_to(out)?;
    out.write_all(pixels)?;
    out.flush()
}
