//! Chunking core for a content-addressed backup system.
//!
//! Partitions a byte stream from a file-like source into a sequence of
//! variable- or fixed-size chunks suitable for deduplication, encryption,
//! and storage as independent objects. Three chunker variants share one
//! streaming output contract and differ only in how cut points are chosen:
//!
//! - [`chunker::cdc::CdcChunker`] — rolling-hash (buzhash) content-defined
//!   chunker producing variable-size chunks between configurable bounds.
//! - [`chunker::fixed::FixedChunker`] — block-aligned chunker with an
//!   optional header block and optional sparse-file handling.
//! - [`chunker::failing::FailingChunker`] — deterministic fault-injection
//!   chunker used to exercise a caller's recovery paths in tests.
//!
//! [`chunker::get_chunker`] is the factory: given a [`chunker::ChunkerParams`]
//! value it validates the configuration and returns a tagged
//! [`chunker::AnyChunker`] that drives whichever variant was requested
//! through one uniform `chunkify(source) -> iterator<Chunk>` interface.
//!
//! Deliberately out of scope: the object store that receives the chunks,
//! the hasher used for content addressing after chunking, payload
//! encryption, and any CLI/config surface — this crate exposes a pure
//! streaming interface to those collaborators.

pub mod chunker;

pub use chunker::{
    buzhash, buzhash_update, enumerate_sparse_ranges, get_chunker, get_chunker_named, is_all_zero,
    rotate_left_32, set_diag_level, simulated_eio, AnyChunker, BuzhashTable, Chunk, ChunkKind,
    ChunkerError, ChunkerParams, Source, SparseRange, BASE_TABLE, DIAG_LEVEL, ZERO_BUFFER_LEN,
};
