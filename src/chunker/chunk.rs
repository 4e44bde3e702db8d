//! The output envelope produced by every chunker variant.

/// What kind of region a [`Chunk`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// A non-zero payload is attached.
    Data,
    /// A detected all-zero region within a data range; stored without payload.
    Alloc,
    /// A region inside a filesystem-level sparse hole; stored without payload.
    Hole,
}

/// One contiguous region of the input stream.
///
/// `payload` is `Some` iff `kind == ChunkKind::Data`, and `payload.len() as
/// u64 == size` whenever it is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub size: u64,
    pub payload: Option<Vec<u8>>,
}

impl Chunk {
    pub fn data(payload: Vec<u8>) -> Self {
        let size = payload.len() as u64;
        Chunk { kind: ChunkKind::Data, size, payload: Some(payload) }
    }

    pub fn alloc(size: u64) -> Self {
        Chunk { kind: ChunkKind::Alloc, size, payload: None }
    }

    pub fn hole(size: u64) -> Self {
        Chunk { kind: ChunkKind::Hole, size, payload: None }
    }

    /// Builds a `Data` or `Alloc` chunk depending on whether `payload` is
    /// entirely zero bytes. Used by the fixed and content-defined chunkers
    /// after reading an actual data range — the classifier only affects the
    /// kind tag, never where the bytes came from.
    pub fn data_or_alloc(payload: Vec<u8>) -> Self {
        if super::zero::is_all_zero(&payload) {
            Chunk::alloc(payload.len() as u64)
        } else {
            Chunk::data(payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_or_alloc_classifies_correctly() {
        let zero_chunk = Chunk::data_or_alloc(vec![0u8; 128]);
        assert_eq!(zero_chunk.kind, ChunkKind::Alloc);
        assert_eq!(zero_chunk.size, 128);
        assert!(zero_chunk.payload.is_none());

        let mut data = vec![0u8; 128];
        data[50] = 9;
        let data_chunk = Chunk::data_or_alloc(data.clone());
        assert_eq!(data_chunk.kind, ChunkKind::Data);
        assert_eq!(data_chunk.payload, Some(data));
    }

    #[test]
    fn hole_and_alloc_carry_no_payload() {
        assert!(Chunk::hole(4096).payload.is_none());
        assert!(Chunk::alloc(4096).payload.is_none());
    }
}
