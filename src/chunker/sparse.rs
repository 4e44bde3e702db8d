//! Sparse-range enumerator.
//!
//! Walks a seekable source's `SEEK_DATA` / `SEEK_HOLE` positions and
//! produces an ordered, non-overlapping, contiguous list of
//! `(start, length, is_data)` ranges covering `[curr, file_len)`, where
//! `curr` is the source's position when enumeration begins.
//!
//! Built eagerly into a `Vec` rather than as a true lazy iterator: real
//! files have a small, bounded number of data/hole transitions, and eager
//! collection keeps the position-restore side-effect contract (see below)
//! a single straight-line function instead of something that has to fire
//! correctly from every place an iterator can be dropped.

use std::io;

use super::source::Source;

/// One contiguous region of a sparse file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseRange {
    pub start: u64,
    pub length: u64,
    pub is_data: bool,
}

/// Enumerates the sparse map of `source` from its current position to EOF.
///
/// Restores `source`'s position to where it started on every exit path —
/// success, early termination, or error — per the side-effect contract.
///
/// Returns `Err(ErrorKind::Unsupported)` if `source` doesn't support
/// `SEEK_DATA`/`SEEK_HOLE` at all (not a real file, or the platform lacks
/// the syscalls); callers should treat that the same as any other
/// "sparse not available" signal and fall back to non-sparse handling.
pub fn enumerate_sparse_ranges(source: &mut Source) -> io::Result<Vec<SparseRange>> {
    let curr = source.tell()?;
    let result = enumerate_from(source, curr);
    // Always restore, even on error: a failed probe must not leave the
    // source's position disturbed for whatever fallback path runs next.
    let restore = source.seek_abs(curr);
    let ranges = result?;
    restore?;
    Ok(ranges)
}

fn enumerate_from(source: &mut Source, curr: u64) -> io::Result<Vec<SparseRange>> {
    let len = source.len()?;
    let mut ranges = Vec::new();
    let mut pos = curr;

    if pos >= len {
        return Ok(ranges);
    }

    loop {
        let data_start = match source.seek_data(pos)? {
            Some(v) => v,
            None => {
                // No more data from `pos` onward: the rest of the file,
                // if any remains, is one trailing hole.
                if pos < len {
                    ranges.push(SparseRange { start: pos, length: len - pos, is_data: false });
                }
                break;
            }
        };

        if data_start > pos {
            ranges.push(SparseRange { start: pos, length: data_start - pos, is_data: false });
        }
        pos = data_start;
        if pos >= len {
            break;
        }

        // SEEK_HOLE never fails with ENXIO per lseek(2); a missing hole
        // means the rest of the file to EOF is data.
        let hole_start = source.seek_hole(pos)?.unwrap_or(len);
        if hole_start > pos {
            ranges.push(SparseRange { start: pos, length: hole_start - pos, is_data: true });
        }
        pos = hole_start;
        if pos >= len {
            break;
        }
    }

    Ok(ranges)
}
