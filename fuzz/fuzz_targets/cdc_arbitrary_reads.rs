#![no_main]
use std::io::{self, Read};

use arbitrary::Arbitrary;
use chunking_core::chunker::cdc::CdcChunker;
use chunking_core::Source;
use libfuzzer_sys::fuzz_target;

/// A reader that replays `data` in chunks of `read_sizes`, cycling once the
/// list is exhausted — exercises the chunker's refill/compact bookkeeping
/// (property 3: boundaries independent of read granularity) against
/// arbitrary, not just "nice", read-size sequences.
struct ArbitraryReader {
    data: Vec<u8>,
    pos: usize,
    read_sizes: Vec<usize>,
    read_idx: usize,
}

impl Read for ArbitraryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Ok(0);
        }
        let requested = self.read_sizes[self.read_idx % self.read_sizes.len()].max(1);
        self.read_idx += 1;
        let want = requested.min(buf.len()).min(self.data.len() - self.pos);
        buf[..want].copy_from_slice(&self.data[self.pos..self.pos + want]);
        self.pos += want;
        Ok(want)
    }
}

#[derive(Arbitrary, Debug)]
struct Input {
    payload: Vec<u8>,
    read_sizes: Vec<u8>,
}

fuzz_target!(|input: Input| {
    if input.payload.is_empty() || input.read_sizes.is_empty() {
        return;
    }
    let read_sizes: Vec<usize> = input.read_sizes.iter().map(|&b| (b as usize) + 1).collect();

    let mut chunker = match CdcChunker::new(1, 9, 14, 10, 31) {
        Ok(c) => c,
        Err(_) => return,
    };
    let payload_len = input.payload.len() as u64;
    let reader = ArbitraryReader { data: input.payload, pos: 0, read_sizes, read_idx: 0 };
    let source = Source::from_reader(reader);

    let mut total = 0u64;
    for chunk in chunker.chunkify(source) {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => panic!("chunker returned an error on well-formed input: {e}"),
        };
        total += chunk.size;
    }
    assert_eq!(total, payload_len, "chunk sizes must sum to input length");
});
