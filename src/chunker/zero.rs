//! All-zero payload detection.
//!
//! A data region that is entirely zero bytes gets tagged `ALLOC` instead of
//! `DATA` so the caller can skip storing it; reconstruction just writes
//! `size` zero bytes back.
//!
//! Scans `usize`-wide words instead of looping byte-by-byte, the same
//! granularity the reference codebase's own sparse-write zero-run scanner
//! uses (`examples/jafreck-lz4r/src/io/sparse.rs`'s `fwrite_sparse`): most
//! non-zero buffers differ in the first few bytes and most all-zero
//! buffers are large, so comparing whole words to zero before falling back
//! to a byte-wise tail is a meaningful constant-factor win over a
//! byte-at-a-time loop without changing the semantics.

use std::mem;

/// Size of a native word in bytes, same constant the reference codebase's
/// sparse-write scanner derives its segment granularity from.
const WORD: usize = mem::size_of::<usize>();

/// Upper bound on any single chunker config's `max_size`. `1 << 26` (64
/// MiB) comfortably covers realistic `max_exp` configurations (chunks up
/// to a few MiB) with headroom.
pub const ZERO_BUFFER_LEN: usize = 1 << 26;

/// Returns `true` iff every byte in `buf` is `0`.
///
/// Compares the word-aligned prefix of `buf` one `usize` at a time,
/// stopping at the first non-zero word, then falls back to a byte-wise
/// check of the unaligned tail (`buf.len() % WORD` bytes).
pub fn is_all_zero(buf: &[u8]) -> bool {
    let aligned_len = buf.len() / WORD * WORD;
    let (aligned, tail) = buf.split_at(aligned_len);

    let mut pos = 0;
    while pos < aligned.len() {
        // `try_into` cannot fail: the slice is exactly `WORD` bytes wide.
        let word = usize::from_ne_bytes(aligned[pos..pos + WORD].try_into().unwrap());
        if word != 0 {
            return false;
        }
        pos += WORD;
    }

    tail.iter().all(|&b| b == 0)
}
