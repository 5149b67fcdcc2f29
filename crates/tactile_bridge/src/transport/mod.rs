//! # Transport Layer
//!
//! Fixed-size records over a byte stream.
//!
//! ## Design
//!
//! - Blocking reads, accumulated until one whole record is present
//! - A short read is never a record: the next read continues filling it
//! - End of stream is reported, not treated as an error; the caller decides
//!   whether to keep or drop the partial record
//! - One buffer, allocated once

pub mod fifo;

use std::io::{self, Read};

/// Outcome of one [`RecordReader::receive`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Receive {
    /// A whole record is available through [`RecordReader::record`].
    Complete,
    /// The stream ended (or had nothing to give) before the record was full.
    Pending {
        /// Bytes of the record accumulated so far.
        partial: usize,
    },
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransportStats {
    /// Complete records received.
    pub records: u64,
    /// Bytes received.
    pub bytes: u64,
    /// Reads that returned end of stream.
    pub end_of_stream: u64,
}

/// Accumulates fixed-size records from a reader.
///
/// ## Usage
///
/// ```rust
/// use tactile_bridge::{Receive, RecordReader};
///
/// let mut reader = RecordReader::new(&b"abcdef"[..], 4);
/// assert_eq!(reader.receive().unwrap(), Receive::Complete);
/// assert_eq!(reader.record(), b"abcd");
/// assert_eq!(reader.receive().unwrap(), Receive::Pending { partial: 2 });
/// ```
pub struct RecordReader<R> {
    inner: R,
    record: Box<[u8]>,
    filled: usize,
    stats: TransportStats,
}

impl<R: Read> RecordReader<R> {
    /// Creates a reader for records of `record_size` bytes.
    #[must_use]
    pub fn new(inner: R, record_size: usize) -> Self {
        Self {
            inner,
            record: vec![0u8; record_size].into_boxed_slice(),
            filled: 0,
            stats: TransportStats::default(),
        }
    }

    /// Record size in bytes.
    #[inline]
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.record.len()
    }

    /// Bytes of the current record accumulated so far.
    #[inline]
    #[must_use]
    pub const fn filled(&self) -> usize {
        self.filled
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Blocks until the record is full or the stream ends.
    ///
    /// A record returned as `Complete` is consumed by the next call. A
    /// `Pending` record keeps its bytes; the next call continues filling it
    /// unless [`Self::discard_partial`] is called first.
    ///
    /// `EINTR` is retried. `WouldBlock` is reported as `Pending`. Any other
    /// error is returned with the partial record intact.
    pub fn receive(&mut self) -> io::Result<Receive> {
        if self.is_complete() {
            self.filled = 0;
        }

        while self.filled < self.record.len() {
            match self.inner.read(&mut self.record[self.filled..]) {
                Ok(0) => {
                    self.stats.end_of_stream += 1;
                    return Ok(Receive::Pending {
                        partial: self.filled,
                    });
                }
                Ok(n) => {
                    self.filled += n;
                    self.stats.bytes += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    return Ok(Receive::Pending {
                        partial: self.filled,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.stats.records += 1;
        Ok(Receive::Complete)
    }

    /// The record accumulated so far; the whole record after `Complete`.
    #[inline]
    #[must_use]
    pub fn record(&self) -> &[u8] {
        &self.record[..self.filled]
    }

    /// Drops any partial record. Returns how many bytes were dropped.
    pub fn discard_partial(&mut self) -> usize {
        let dropped = if self.is_complete() { 0 } else { self.filled };
        self.filled = 0;
        dropped
    }

    #[inline]
    fn is_complete(&self) -> bool {
        self.filled == self.record.len()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};
    use std::sync::{Arc, Mutex};

    /// Reader that hands out scripted chunks; `None` is one end-of-stream read.
    pub struct ScriptedReader {
        script: VecDeque<Option<Vec<u8>>>,
    }

    impl ScriptedReader {
        pub fn new(script: Vec<Option<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                None | Some(None) => Ok(0),
                Some(Some(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.script.push_front(Some(chunk.split_off(n)));
                    }
                    Ok(n)
                }
            }
        }
    }

    /// Writer that records every `write` call separately.
    #[derive(Clone, Default)]
    pub struct RecordingWriter {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl RecordingWriter {
        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.lock().unwrap().push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Writer whose every write fails with a broken pipe.
    pub struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
