//! Fixed-size chunker.
//!
//! Emits block-aligned chunks of `block_size` bytes, with an optional
//! leading header block and optional sparse-file awareness: when sparse
//! handling is requested and the source supports it, hole ranges are
//! skipped (seeked over) rather than read and classified.

use std::time::Instant;

use super::chunk::Chunk;
use super::diag::diag;
use super::error::ChunkerError;
use super::sparse::{enumerate_sparse_ranges, SparseRange};
use super::source::Source;

/// Sentinel length for a synthesized unbounded data range (used when no
/// sparse map is available at all — see step 2 of the fallback ladder).
/// Iteration still terminates at EOF; this is only an upper bound for the
/// range-walking bookkeeping.
const UNBOUNDED: u64 = u64::MAX;

#[derive(Debug, Clone)]
pub struct FixedChunker {
    block_size: u64,
    header_size: u64,
    sparse: bool,
}

impl FixedChunker {
    pub fn new(block_size: u64, header_size: u64, sparse: bool) -> Result<Self, ChunkerError> {
        if block_size == 0 {
            return Err(ChunkerError::Config("block_size must be > 0".into()));
        }
        if block_size as u128 > super::zero::ZERO_BUFFER_LEN as u128 {
            return Err(ChunkerError::Config(format!(
                "block_size {block_size} exceeds the zero-buffer length ({})",
                super::zero::ZERO_BUFFER_LEN
            )));
        }
        Ok(FixedChunker { block_size, header_size, sparse })
    }

    /// Binds this chunker to `source`, optionally with an externally
    /// supplied file map (same format [`enumerate_sparse_ranges`] produces).
    /// Passing `None` lets the chunker build its own map per the fallback
    /// ladder in step 1/2. Borrows `self` for the iterator's lifetime, so
    /// the same `FixedChunker` value can be reused for another source once
    /// the returned iterator is dropped.
    pub fn chunkify(&self, source: Source, external_map: Option<Vec<SparseRange>>) -> FixedChunkIter<'_> {
        FixedChunkIter {
            chunker: self,
            source,
            external_map,
            ranges: None,
            range_idx: 0,
            logical_pos: 0,
            done: false,
            elapsed: std::time::Duration::ZERO,
        }
    }
}

pub struct FixedChunkIter<'a> {
    chunker: &'a FixedChunker,
    source: Source,
    external_map: Option<Vec<SparseRange>>,
    ranges: Option<Vec<SparseRange>>,
    range_idx: usize,
    /// Logical offset of the next byte to be considered, used to decide
    /// whether the current range needs an absolute seek (map skipped a
    /// region vs. the source already sitting at the right spot).
    logical_pos: u64,
    done: bool,
    elapsed: std::time::Duration,
}

impl<'a> FixedChunkIter<'a> {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    fn build_ranges(&mut self) -> Vec<SparseRange> {
        if let Some(map) = self.external_map.take() {
            return map;
        }

        if self.chunker.sparse && self.source.is_seekable() {
            if let Some(ranges) = self.try_build_sparse_map() {
                return ranges;
            }
            diag(1, "fixed: sparse map unavailable, falling back to non-sparse reads");
        }

        self.synthesize_non_sparse_map()
    }

    /// Step 1: attempt to build a real sparse map. Returns `None` on any
    /// seek failure, signalling the caller to fall back to step 2.
    ///
    /// Every exit path — success, enumeration failure, or a failed restore
    /// seek itself — leaves the source at absolute offset 0 whenever that
    /// seek is possible at all: `synthesize_non_sparse_map`'s ranges are
    /// built on the assumption that reads start at file offset 0, so a
    /// caller falling through to step 2 with the descriptor still sitting
    /// at `header` would silently misalign every subsequent read.
    fn try_build_sparse_map(&mut self) -> Option<Vec<SparseRange>> {
        let header = self.chunker.header_size;
        if self.source.seek_abs(header).is_err() {
            let _ = self.source.seek_abs(0);
            return None;
        }
        let body = enumerate_sparse_ranges(&mut self.source);
        // Restore to the very start regardless of where enumeration probed
        // or whether it succeeded — step 2's synthesized map always reads
        // from offset 0, so every exit path here must leave the source
        // there too, not just the success path.
        let restored = self.source.seek_abs(0).is_ok();
        let body = match body {
            Ok(b) if restored => b,
            _ => return None,
        };

        let mut ranges = Vec::with_capacity(body.len() + 1);
        if header > 0 {
            ranges.push(SparseRange { start: 0, length: header, is_data: true });
        }
        ranges.extend(body);
        Some(ranges)
    }

    /// Step 2: no map available at all — synthesize header + one unbounded
    /// data range (or a single unbounded data range if there's no header).
    fn synthesize_non_sparse_map(&self) -> Vec<SparseRange> {
        let header = self.chunker.header_size;
        if header > 0 {
            vec![
                SparseRange { start: 0, length: header, is_data: true },
                SparseRange { start: header, length: UNBOUNDED, is_data: true },
            ]
        } else {
            vec![SparseRange { start: 0, length: UNBOUNDED, is_data: true }]
        }
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkerError> {
        if self.done {
            return Ok(None);
        }

        if self.ranges.is_none() {
            let ranges = self.build_ranges();
            self.ranges = Some(ranges);
        }

        loop {
            let ranges = self.ranges.as_ref().unwrap();
            let Some(range) = ranges.get(self.range_idx).copied() else {
                self.done = true;
                return Ok(None);
            };

            let range_end = if range.length == UNBOUNDED { UNBOUNDED } else { range.start + range.length };
            let consumed_in_range = self.logical_pos.saturating_sub(range.start);
            if range.length != UNBOUNDED && consumed_in_range >= range.length {
                self.range_idx += 1;
                continue;
            }

            // The map may skip regions (e.g. a supplied external map that
            // doesn't start exactly where the source currently sits). Only
            // reseek when entering a range we haven't consumed from yet.
            if consumed_in_range == 0 && self.logical_pos != range.start {
                self.source.seek_abs(range.start)?;
                self.logical_pos = range.start;
            }

            let remaining_in_range = if range_end == UNBOUNDED {
                self.chunker.block_size
            } else {
                (range_end - self.logical_pos).min(self.chunker.block_size)
            };
            let want = remaining_in_range.min(self.chunker.block_size);

            if range.is_data {
                let mut buf = vec![0u8; want as usize];
                let n = read_fill(&mut self.source, &mut buf)?;
                if n == 0 {
                    self.done = true;
                    return Ok(None);
                }
                buf.truncate(n);
                self.logical_pos += n as u64;
                if (n as u64) < want {
                    self.done = true;
                }
                return Ok(Some(Chunk::data_or_alloc(buf)));
            } else {
                match self.source.seek_abs(self.logical_pos + want) {
                    Ok(new_pos) => {
                        let advanced = new_pos.saturating_sub(self.logical_pos);
                        if advanced == 0 {
                            self.done = true;
                            return Ok(None);
                        }
                        self.logical_pos = new_pos;
                        if advanced < want {
                            self.done = true;
                        }
                        return Ok(Some(Chunk::hole(advanced)));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }
}

fn read_fill(source: &mut Source, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::io::Read;
    let mut total = 0;
    while total < buf.len() {
        let n = source.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

impl<'a> Iterator for FixedChunkIter<'a> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn all_zero_file_yields_alloc_chunks() {
        let data = vec![0u8; 12 * 1024];
        let chunker = FixedChunker::new(4096, 0, false).unwrap();
        let source = Source::from_reader(Cursor::new(data));
        let chunks: Vec<_> = chunker.chunkify(source, None).collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 3);
        for c in &chunks {
            assert_eq!(c.kind, super::super::chunk::ChunkKind::Alloc);
            assert_eq!(c.size, 4096);
            assert!(c.payload.is_none());
        }
    }

    #[test]
    fn non_zero_data_yields_data_chunks() {
        let mut data = vec![7u8; 10_000];
        data[0] = 1;
        let chunker = FixedChunker::new(4096, 0, false).unwrap();
        let source = Source::from_reader(Cursor::new(data.clone()));
        let chunks: Vec<_> = chunker.chunkify(source, None).collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].size, 4096);
        assert_eq!(chunks[1].size, 4096);
        assert_eq!(chunks[2].size, 10_000 - 8192);
        let mut reconstructed = Vec::new();
        for c in &chunks {
            reconstructed.extend(c.payload.clone().unwrap());
        }
        assert_eq!(reconstructed, data);
    }

    #[test]
    fn header_size_forces_leading_data_range() {
        let mut data = vec![0u8; 8192];
        data[0] = 9; // header is non-zero, rest is zero
        let chunker = FixedChunker::new(4096, 16, false).unwrap();
        let source = Source::from_reader(Cursor::new(data));
        let chunks: Vec<_> = chunker.chunkify(source, None).collect::<Result<_, _>>().unwrap();
        // header(16) + first block(4096-16=4080) data, then full zero blocks
        assert!(chunks.iter().all(|c| c.size > 0));
        let total: u64 = chunks.iter().map(|c| c.size).sum();
        assert_eq!(total, 8192);
    }

    #[test]
    fn empty_source_yields_no_chunks() {
        let chunker = FixedChunker::new(4096, 0, false).unwrap();
        let source = Source::from_reader(Cursor::new(Vec::<u8>::new()));
        let chunks: Vec<_> = chunker.chunkify(source, None).collect::<Result<_, _>>().unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn zero_block_size_rejected_at_construction() {
        assert!(FixedChunker::new(0, 0, false).is_err());
    }

    #[test]
    fn external_map_drives_hole_emission_on_a_seekable_source() {
        use std::io::{Seek, SeekFrom, Write};
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(&[0xAAu8; 4096]).unwrap();
        f.seek(SeekFrom::Start(8192)).unwrap();
        f.write_all(&[0xAAu8; 4096]).unwrap();
        f.seek(SeekFrom::Start(0)).unwrap();

        let map = vec![
            SparseRange { start: 0, length: 4096, is_data: true },
            SparseRange { start: 4096, length: 4096, is_data: false },
            SparseRange { start: 8192, length: 4096, is_data: true },
        ];
        let chunker = FixedChunker::new(4096, 0, false).unwrap();
        let source = Source::from_file(f);
        let chunks: Vec<_> = chunker.chunkify(source, Some(map)).collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].kind, super::super::chunk::ChunkKind::Data);
        assert_eq!(chunks[1].kind, super::super::chunk::ChunkKind::Hole);
        assert_eq!(chunks[2].kind, super::super::chunk::ChunkKind::Data);
    }

    // Platforms without SEEK_DATA/SEEK_HOLE (see `chunker::source::platform`)
    // always fail `try_build_sparse_map`'s enumeration step, forcing a fall
    // back to `synthesize_non_sparse_map`, which assumes reads start at
    // file offset 0. If the failed attempt left the descriptor sitting at
    // `header_size`, every read after the fallback would be misaligned by
    // that amount and the emitted sizes would stop summing to the file
    // length (invariant 2). Exercises exactly that fallback path.
    #[test]
    #[cfg(not(target_os = "linux"))]
    fn sparse_fallback_with_header_reads_from_file_start_not_header_offset() {
        use std::io::{Seek, SeekFrom, Write};
        let mut data = vec![0xAAu8; 16]; // header
        data.extend(vec![0x42u8; 8192 - 16]); // body, non-zero so DATA not ALLOC
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(&data).unwrap();
        f.seek(SeekFrom::Start(0)).unwrap();

        let chunker = FixedChunker::new(4096, 16, true).unwrap();
        let source = Source::from_file(f);
        let chunks: Vec<_> = chunker.chunkify(source, None).collect::<Result<_, _>>().unwrap();

        let total: u64 = chunks.iter().map(|c| c.size).sum();
        assert_eq!(total, data.len() as u64, "misaligned fallback drops/duplicates header_size bytes");

        let mut reconstructed = Vec::new();
        for c in &chunks {
            reconstructed.extend(c.payload.clone().unwrap());
        }
        assert_eq!(reconstructed, data, "fallback must read from file offset 0, not header_size");
    }
}
