//! Byte-source abstraction used uniformly by all three chunkers.
//!
//! Every chunker only needs sequential `read()`. The fixed chunker
//! additionally wants, *if available*, absolute seeking and `SEEK_DATA` /
//! `SEEK_HOLE` support to build a sparse map without reading hole bytes.
//! Rather than a generic trait bound that would force every caller to
//! answer "can this seek to holes" at the type level, this is a small
//! concrete enum over the two cases that actually occur: a real file, or
//! anything else handed in as a boxed reader (a pipe, an in-memory cursor,
//! a test double).

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// A byte source bound to a chunker call.
pub enum Source {
    /// A real file. Supports absolute seeking always, and `SEEK_DATA` /
    /// `SEEK_HOLE` on platforms where the kernel implements them.
    File(File),
    /// Anything else: stdin, a pipe, an in-memory buffer, a test double.
    /// No seeking is attempted; sparse handling is unconditionally
    /// unsupported for this variant.
    Reader(Box<dyn Read + Send>),
}

impl Source {
    pub fn from_file(file: File) -> Self {
        Source::File(file)
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Source::Reader(Box::new(reader))
    }

    /// `true` if this source is backed by a real file and therefore a
    /// candidate for sparse-range enumeration. Still no guarantee the
    /// platform supports `SEEK_DATA`/`SEEK_HOLE` — see [`Source::seek_data`].
    pub fn is_seekable(&self) -> bool {
        matches!(self, Source::File(_))
    }

    pub fn seek_abs(&mut self, pos: u64) -> io::Result<u64> {
        match self {
            Source::File(f) => f.seek(SeekFrom::Start(pos)),
            Source::Reader(_) => Err(unsupported("seek_abs")),
        }
    }

    pub fn tell(&mut self) -> io::Result<u64> {
        match self {
            Source::File(f) => f.stream_position(),
            Source::Reader(_) => Err(unsupported("tell")),
        }
    }

    /// Seeks to the logical end and returns the length, restoring the
    /// original position. `Err(Unsupported)` if this source isn't seekable.
    pub fn len(&mut self) -> io::Result<u64> {
        match self {
            Source::File(f) => {
                let curr = f.stream_position()?;
                let len = f.seek(SeekFrom::End(0))?;
                f.seek(SeekFrom::Start(curr))?;
                Ok(len)
            }
            Source::Reader(_) => Err(unsupported("len")),
        }
    }

    /// `SEEK_DATA`: the offset of the next byte at or after `offset` that is
    /// not inside a hole. `Ok(None)` means "no more data past offset" (the
    /// EOF variant the sparse enumerator treats as termination).
    /// `Err(Unsupported)` means the platform or source doesn't implement
    /// this at all; callers fall back to non-sparse handling.
    pub fn seek_data(&mut self, offset: u64) -> io::Result<Option<u64>> {
        match self {
            Source::File(f) => platform::seek_data(f, offset),
            Source::Reader(_) => Err(unsupported("seek_data")),
        }
    }

    /// `SEEK_HOLE`: the offset of the next hole at or after `offset`.
    /// `Ok(None)` means "no hole past offset" (end of file reached without
    /// entering a hole).
    pub fn seek_hole(&mut self, offset: u64) -> io::Result<Option<u64>> {
        match self {
            Source::File(f) => platform::seek_hole(f, offset),
            Source::Reader(_) => Err(unsupported("seek_hole")),
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::File(f) => f.read(buf),
            Source::Reader(r) => r.read(buf),
        }
    }
}

fn unsupported(op: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("{op} not supported on this source"))
}

#[cfg(target_os = "linux")]
mod platform {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    pub fn seek_data(f: &mut File, offset: u64) -> io::Result<Option<u64>> {
        raw_seek(f, offset, libc::SEEK_DATA)
    }

    pub fn seek_hole(f: &mut File, offset: u64) -> io::Result<Option<u64>> {
        raw_seek(f, offset, libc::SEEK_HOLE)
    }

    fn raw_seek(f: &mut File, offset: u64, whence: i32) -> io::Result<Option<u64>> {
        // SAFETY: `fd` is a valid, open file descriptor for the lifetime of
        // this call; `lseek` with SEEK_DATA/SEEK_HOLE neither reads nor
        // writes through any pointer, it only repositions the file offset.
        let result = unsafe { libc::lseek(f.as_raw_fd(), offset as i64, whence) };
        if result >= 0 {
            return Ok(Some(result as u64));
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            // ENXIO: no such region (SEEK_DATA past last data, or
            // SEEK_HOLE past a file with no trailing hole) — the EOF
            // variant the sparse enumerator treats as termination.
            Some(libc::ENXIO) => Ok(None),
            _ => Err(err),
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use std::fs::File;
    use std::io;

    pub fn seek_data(_f: &mut File, _offset: u64) -> io::Result<Option<u64>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "SEEK_DATA not available on this platform"))
    }

    pub fn seek_hole(_f: &mut File, _offset: u64) -> io::Result<Option<u64>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "SEEK_HOLE not available on this platform"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reader_variant_rejects_seek_operations() {
        let mut src = Source::from_reader(Cursor::new(vec![1u8, 2, 3]));
        assert!(!src.is_seekable());
        assert!(src.seek_abs(0).is_err());
        assert!(src.len().is_err());
        assert!(src.seek_data(0).is_err());
        assert!(src.seek_hole(0).is_err());
    }

    #[test]
    fn reader_variant_reads_sequentially() {
        let mut src = Source::from_reader(Cursor::new(vec![1u8, 2, 3]));
        let mut buf = [0u8; 2];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(src.read(&mut buf).unwrap(), 1);
    }
}
