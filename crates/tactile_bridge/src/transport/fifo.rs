//! # Named Pipe Setup
//!
//! The three channels are FIFOs in the filesystem. The bridge creates any
//! that are missing and opens them so that startup never waits on a
//! producer that has not arrived yet.

// SAFETY: This module calls mkfifo and fcntl; each call is checked.
#![allow(unsafe_code)]

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Permissions for FIFOs the bridge creates (before umask).
pub const FIFO_MODE: libc::mode_t = 0o666;

/// Creates a FIFO at `path` unless something already exists there.
///
/// An existing FIFO is reused. An existing non-FIFO is left alone and
/// reported as `AlreadyExists`.
pub fn ensure_fifo(path: &Path) -> io::Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => return Ok(()),
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists and is not a FIFO",
            ))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: c_path is a valid NUL-terminated string for the whole call
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) };
    if rc == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    // Lost a race with another creator
    if err.kind() == io::ErrorKind::AlreadyExists {
        return Ok(());
    }
    Err(err)
}

/// Opens the read end of a FIFO without waiting for a writer.
///
/// The descriptor is left non-blocking; call [`set_blocking`] before reading.
/// With no writer attached, reads return end of stream until one arrives.
pub fn open_reader(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// Opens the write end of a FIFO. Blocks until a reader attaches.
pub fn open_writer(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).open(path)
}

/// Clears `O_NONBLOCK` on an open descriptor.
pub fn set_blocking(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();

    // SAFETY: fd is owned by `file` and open for the duration of both calls
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: as above
    let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Asks the kernel to grow the pipe buffer to at least `bytes`.
///
/// Returns the capacity actually granted. Best effort: callers log and
/// continue when this fails.
#[cfg(target_os = "linux")]
pub fn set_pipe_capacity(file: &File, bytes: usize) -> io::Result<usize> {
    let requested = libc::c_int::try_from(bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: fd is owned by `file` and open for the duration of the call
    let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_SETPIPE_SZ, requested) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    usize::try_from(rc).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Pipe capacity cannot be changed on this platform.
#[cfg(not(target_os = "linux"))]
pub fn set_pipe_capacity(_file: &File, _bytes: usize) -> io::Result<usize> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "pipe capacity is fixed on this platform",
    ))
}
