//! Failing chunker.
//!
//! A deterministic fault-injection splitter used in tests that exercise a
//! caller's recovery path: it reads fixed-size blocks exactly like the
//! fixed chunker with no header and no sparse handling, but consults a
//! scripted `map` string before emitting each block to decide whether to
//! succeed or raise a simulated I/O error.

use std::io::Read;
use std::time::Instant;

use super::chunk::Chunk;
use super::error::{simulated_eio, ChunkerError};
use super::source::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Read,
    Error,
}

#[derive(Debug, Clone)]
pub struct FailingChunker {
    block_size: usize,
    map: Vec<Action>,
    /// Persists across `chunkify` calls: whether the counter surviving a
    /// fresh `chunkify()` call (on the same or a different source) is
    /// intentional is unclear upstream. This implementation preserves
    /// that behavior rather than guessing at a reset.
    count: usize,
}

impl FailingChunker {
    pub fn new(block_size: usize, map: &str) -> Result<Self, ChunkerError> {
        if block_size == 0 {
            return Err(ChunkerError::Config("block_size must be > 0".into()));
        }
        if map.is_empty() {
            return Err(ChunkerError::Config("map must not be empty".into()));
        }
        let mut actions = Vec::with_capacity(map.len());
        for ch in map.chars() {
            let action = match ch.to_ascii_uppercase() {
                'R' => Action::Read,
                'E' => Action::Error,
                other => {
                    return Err(ChunkerError::Config(format!(
                        "unknown failing-chunker map character: {other:?}"
                    )))
                }
            };
            actions.push(action);
        }
        Ok(FailingChunker { block_size, map: actions, count: 0 })
    }

    /// Binds this chunker to `source`. The fault-injection counter carries
    /// over from any previous `chunkify` call on this same chunker value
    /// — borrowing rather than consuming `self` is what makes that
    /// persistence possible; only the source changes between calls.
    pub fn chunkify(&mut self, source: Source) -> FailingChunkIter<'_> {
        FailingChunkIter { chunker: self, source, done: false, elapsed: std::time::Duration::ZERO }
    }
}

pub struct FailingChunkIter<'a> {
    chunker: &'a mut FailingChunker,
    source: Source,
    done: bool,
    elapsed: std::time::Duration,
}

impl<'a> FailingChunkIter<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkerError> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunker.block_size];
        let mut total = 0;
        while total < buf.len() {
            let n = self.source.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }

        if total == 0 {
            self.done = true;
            return Ok(None);
        }

        let idx = self.chunker.count.min(self.chunker.map.len() - 1);
        let action = self.chunker.map[idx];
        self.chunker.count += 1;

        match action {
            Action::Read => {
                buf.truncate(total);
                if total < self.chunker.block_size {
                    self.done = true;
                }
                Ok(Some(Chunk::data(buf)))
            }
            Action::Error => Err(simulated_eio("failing chunker map directive").into()),
        }
    }
}

impl<'a> Iterator for FailingChunkIter<'a> {
    type Item = Result<Chunk, ChunkerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = Instant::now();
        let result = self.next_chunk();
        self.elapsed += start.elapsed();
        match result {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
