//! Content-defined chunker.
//!
//! The hardest part of this module: a sliding-window buzhash search over a
//! single internal buffer that emits variable-size chunks whenever the
//! low `mask_bits` of the rolling hash go to zero, bounded below by
//! `min_size` and above by `max_size`. See the module-level buffer-state
//! invariants in [`super::chunk`] — `last <= position <= position +
//! remaining <= buf.len()`, and at terminal success `bytes_read ==
//! bytes_yielded`.

use std::io::Read;
use std::time::Instant;

use super::chunk::Chunk;
use super::diag::diag;
use super::error::ChunkerError;
use super::hash::BuzhashTable;
use super::source::Source;

#[derive(Debug, Clone)]
pub struct CdcChunker {
    min_size: usize,
    max_size: usize,
    chunk_mask: u32,
    window: usize,
    table: BuzhashTable,
    buf: Vec<u8>,
}

impl CdcChunker {
    /// `min_exp`/`max_exp` give `min_size = 1 << min_exp`, `max_size = 1 <<
    /// max_exp`; `mask_bits` gives `chunk_mask = (1 << mask_bits) - 1`.
    /// Rejects configs where `window + min_size + 1 > max_size` — the
    /// buffer could never hold a full min-size skip plus one hash window,
    /// so no cut search could ever run.
    pub fn new(
        seed: u32,
        min_exp: u32,
        max_exp: u32,
        mask_bits: u32,
        window: usize,
    ) -> Result<Self, ChunkerError> {
        if max_exp >= 64 || min_exp >= max_exp {
            return Err(ChunkerError::Config(format!(
                "min_exp ({min_exp}) must be less than max_exp ({max_exp})"
            )));
        }
        if mask_bits == 0 || mask_bits > 32 {
            return Err(ChunkerError::Config(format!(
                "mask_bits ({mask_bits}) must be in 1..=32"
            )));
        }
        let min_size = 1usize << min_exp;
        let max_size = 1usize
            .checked_shl(max_exp)
            .ok_or_else(|| ChunkerError::Config(format!("max_exp ({max_exp}) overflows usize")))?;
        if max_size > super::zero::ZERO_BUFFER_LEN {
            return Err(ChunkerError::Config(format!(
                "max_size ({max_size}) exceeds the zero-buffer length ({})",
                super::zero::ZERO_BUFFER_LEN
            )));
        }
        if window == 0 {
            return Err(ChunkerError::Config("window_size must be > 0".into()));
        }
        if window + min_size + 1 > max_size {
            return Err(ChunkerError::Config(format!(
                "window ({window}) + min_size ({min_size}) + 1 exceeds max_size ({max_size})"
            )));
        }
        let chunk_mask = if mask_bits == 32 { u32::MAX } else { (1u32 << mask_bits) - 1 };

        Ok(CdcChunker {
            min_size,
            max_size,
            chunk_mask,
            window,
            table: BuzhashTable::new(seed),
            buf: vec![0u8; max_size],
        })
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Binds this chunker to `source`. Buffer state (position/remaining/
    /// last/counters) resets for each call; the allocated buffer and the
    /// derived hash table are reused, per the "no per-chunk allocation"
    /// resource-model contract.
    pub fn chunkify(&mut self, source: Source) -> CdcChunkIter<'_> {
        CdcChunkIter {
            chunker: self,
            source,
            position: 0,
            remaining: 0,
            last: 0,
            bytes_read: 0,
            bytes_yielded: 0,
            eof: false,
            done: false,
            elapsed: std::time::Duration::ZERO,
        }
    }
}

pub struct CdcChunkIter<'a> {
    chunker: &'a mut CdcChunker,
    source: Source,
    position: usize,
    remaining: usize,
    last: usize,
    bytes_read: u64,
    bytes_yielded: u64,
    eof: bool,
    done: bool,
    elapsed: std::time::Duration,
}

impl<'a> CdcChunkIter<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Moves `[last, position + remaining)` down to offset 0 and repoints
    /// `position`/`last` accordingly. A no-op when `last` is already 0.
    fn compact(&mut self) {
        if self.last == 0 {
            return;
        }
        let start = self.last;
        let end = self.position + self.remaining;
        diag(2, &format!("cdc: compacting buffer, moving [{start}, {end}) to offset 0"));
        self.chunker.buf.copy_within(start..end, 0);
        self.position -= start;
        self.last = 0;
    }

    /// Refills until `remaining >= threshold` or EOF, or the buffer has no
    /// more room ahead of the already-buffered tail (the maximum-chunk
    /// bound: `last` is pinned at the start of the pending chunk, so once
    /// the buffer is full relative to `last` no more bytes can be pulled
    /// in before this chunk is forced to close).
    fn refill_to(&mut self, threshold: usize) -> Result<(), ChunkerError> {
        while self.remaining < threshold && !self.eof {
            self.compact();
            let tail_start = self.position + self.remaining;
            if tail_start >= self.chunker.buf.len() {
                break;
            }
            let n = self.source.read(&mut self.chunker.buf[tail_start..])?;
            if n == 0 {
                self.eof = true;
            } else {
                self.remaining += n;
                self.bytes_read += n as u64;
            }
        }
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkerError> {
        if self.done {
            return Ok(None);
        }

        let window = self.chunker.window;
        let min_size = self.chunker.min_size;
        let search_threshold = min_size + window + 1;

        // 1. Refill guard.
        self.refill_to(search_threshold)?;

        // 2. Short-tail case: not enough buffered data to even attempt a
        // search, which can only happen at EOF.
        if self.remaining < search_threshold {
            self.done = true;
            if self.remaining > 0 {
                let n = self.remaining;
                let bytes = self.chunker.buf[self.last..self.last + n].to_vec();
                self.last += n;
                self.position = self.last;
                self.remaining = 0;
                self.bytes_yielded += n as u64;
                return Ok(Some(Chunk::data_or_alloc(bytes)));
            }
            return if self.bytes_read == self.bytes_yielded {
                Ok(None)
            } else {
                Err(ChunkerError::Consistency {
                    bytes_read: self.bytes_read,
                    bytes_yielded: self.bytes_yielded,
                })
            };
        }

        // 3. Minimum-size skip: no hashing over the first min_size bytes.
        self.position += min_size;
        self.remaining -= min_size;

        // 4. Initialize the rolling window.
        let mut sum = self.chunker.table.hash(&self.chunker.buf[self.position..self.position + window]);

        // 5. Slide and test.
        loop {
            while self.remaining > window && (sum & self.chunker.chunk_mask) != 0 {
                let p = self.position;
                let buf = &self.chunker.buf;
                sum = self.chunker.table.update(sum, buf[p], buf[p + window], window);
                self.position += 1;
                self.remaining -= 1;
            }

            if (sum & self.chunker.chunk_mask) == 0 {
                break;
            }

            // remaining <= window: either genuinely out of buffered bytes
            // (refill and resume) or the buffer has hit max_size worth of
            // unemitted data / true EOF (stop searching, fall through to
            // the tail-absorption step below).
            self.refill_to(window + 1)?;
            if self.remaining > window {
                continue;
            }
            break;
        }

        // 6. Cut point determined. Absorb any leftover tail shorter than a
        // full window into this chunk.
        if self.remaining <= window {
            self.position += self.remaining;
            self.remaining = 0;
        }

        // 7. Emit.
        let n = self.position - self.last;
        let bytes = self.chunker.buf[self.last..self.position].to_vec();
        self.last = self.position;
        self.bytes_yielded += n as u64;

        Ok(Some(Chunk::data_or_alloc(bytes)))
    }
}

impl<'a> Iterator for CdcChunkIter<'a> {
    type Item = Result<Chunk, ChunkerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = Instant::now();
        let result = self.next_chunk();
        self.elapsed += start.elapsed();
        match result {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
