use crate::{deflate::inflate_zlib, reader::SaveReader, SaveError};

/// Byte length of the metadata block that precedes each compressed chunk
pub const CHUNK_HEADER_LEN: usize = 48;

/// Metadata written in front of every compressed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub file_tag: u32,
    pub max_chunk_size: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl ChunkHeader {
    pub fn parse(data: &[u8; CHUNK_HEADER_LEN]) -> Self {
        let word = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        ChunkHeader {
            file_tag: word(0),
            max_chunk_size: word(8),
            compressed_size: word(16),
            uncompressed_size: word(24),
        }
    }
}

/// Pull based supply of decompressed body bytes.
///
/// Returning `Ok(None)` signals that the supply is exhausted.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SaveError>;

    /// Metadata of the first chunk handed out, if any
    fn first_header(&self) -> Option<ChunkHeader> {
        None
    }
}

/// Walks the compressed chunks that follow the save header and inflates them
/// one at a time
#[derive(Debug)]
pub struct CompressedChunks<'a> {
    data: &'a [u8],
    offset: usize,
    first: Option<ChunkHeader>,
}

impl<'a> CompressedChunks<'a> {
    /// `data` must start at the first chunk header
    pub fn new(data: &'a [u8]) -> Self {
        CompressedChunks {
            data,
            offset: 0,
            first: None,
        }
    }

    /// Bytes of the compressed region that have been handed out so far
    pub fn compressed_offset(&self) -> usize {
        self.offset
    }
}

impl ChunkSource for CompressedChunks<'_> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SaveError> {
        let rest = &self.data[self.offset..];
        if rest.is_empty() {
            return Ok(None);
        }

        let Some((head, rest)) = rest.split_first_chunk::<CHUNK_HEADER_LEN>() else {
            return Err(SaveError::truncated(CHUNK_HEADER_LEN, rest.len()));
        };

        let header = ChunkHeader::parse(head);
        self.first.get_or_insert(header);

        let size = header.compressed_size as usize;
        if rest.len() < size {
            return Err(SaveError::truncated(size, rest.len()));
        }

        let inflated = inflate_zlib(&rest[..size], header.uncompressed_size as usize)?;
        tracing::debug!(
            compressed = size,
            inflated = inflated.len(),
            offset = self.offset,
            "inflated save chunk"
        );

        self.offset += CHUNK_HEADER_LEN + size;
        Ok(Some(inflated))
    }

    fn first_header(&self) -> Option<ChunkHeader> {
        self.first
    }
}

/// Already decompressed chunks, handed out in order
#[derive(Debug)]
pub struct RawChunks<I>(pub I);

impl<I> ChunkSource for RawChunks<I>
where
    I: Iterator<Item = Vec<u8>>,
{
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, SaveError> {
        Ok(self.0.next())
    }
}

/// A reader that transparently pulls the next chunk when a read would run
/// past the buffered data. Unconsumed bytes are carried over to the front of
/// the new buffer, so values may straddle chunk boundaries.
#[derive(Debug)]
pub struct ChunkStream<S> {
    source: S,
    buf: Vec<u8>,
    offset: usize,
    bytes_read: u64,
}

impl<S: ChunkSource> ChunkStream<S> {
    pub fn new(source: S) -> Self {
        ChunkStream {
            source,
            buf: Vec::new(),
            offset: 0,
            bytes_read: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of bytes buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Pull one more chunk onto the buffer. Returns false once the source is
    /// exhausted.
    pub fn extend(&mut self) -> Result<bool, SaveError> {
        let Some(chunk) = self.source.next_chunk()? else {
            return Ok(false);
        };

        self.buf.drain(..self.offset);
        self.offset = 0;
        self.buf.extend_from_slice(&chunk);
        Ok(true)
    }
}

impl<S: ChunkSource> SaveReader for ChunkStream<S> {
    fn fill(&mut self, len: usize) -> Result<&[u8], SaveError> {
        while self.buffered() < len {
            if !self.extend()? {
                return Err(SaveError::truncated(len, self.buffered()));
            }
        }

        Ok(&self.buf[self.offset..])
    }

    fn consume(&mut self, len: usize) {
        self.offset += len;
        self.bytes_read += len as u64;
    }

    fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
