//! Chunk buffering
//!
//! Pure buffering state behind the chunked recorder. Pages are classified by
//! position: the first [`HEADER_PAGE_COUNT`] pages form the stream header and
//! every later page is content. Each emitted chunk is the header followed by
//! the content accumulated since the previous chunk, so every chunk decodes on
//! its own.

/// Number of leading pages that make up the stream header.
///
/// An Ogg/Opus stream opens with an identification header page followed by a
/// comment header page. Sources encoding other containers must deliver their
/// initialization data as exactly this many pages.
pub const HEADER_PAGE_COUNT: u64 = 2;

/// A recorded chunk: header bytes plus one window of content bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Header bytes followed by the content bytes of this window
    pub buffer: Vec<u8>,

    /// Seconds of audio covered by this chunk
    pub length: f64,
}

/// Which kind of page the buffer expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPhase {
    /// Fewer than [`HEADER_PAGE_COUNT`] pages received
    AwaitingHeaders,
    /// Header complete, pages are content
    Accumulating,
}

/// Header and content buffers plus the boundary of the last chunk
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    header: Vec<u8>,
    content: Vec<u8>,
    previous_boundary: f64,
    page_count: u64,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BufferPhase {
        if self.page_count < HEADER_PAGE_COUNT {
            BufferPhase::AwaitingHeaders
        } else {
            BufferPhase::Accumulating
        }
    }

    /// Pages received since construction
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Content bytes waiting for the next chunk
    pub fn pending_bytes(&self) -> usize {
        self.content.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.content.is_empty()
    }

    /// Elapsed-seconds mark where the last chunk ended
    pub fn previous_boundary(&self) -> f64 {
        self.previous_boundary
    }

    /// Seconds accumulated since the last boundary at the given clock reading
    pub fn current_length(&self, elapsed_seconds: f64) -> f64 {
        (elapsed_seconds - self.previous_boundary).max(0.0)
    }

    /// Take one page from the source.
    ///
    /// Returns a chunk when this page brings the accumulated length to
    /// `target_chunk_length`. Header pages never produce a chunk and never
    /// count against the length.
    pub fn push_page(
        &mut self,
        page: &[u8],
        elapsed_seconds: f64,
        target_chunk_length: f64,
    ) -> Option<Chunk> {
        self.page_count += 1;

        if self.page_count <= HEADER_PAGE_COUNT {
            self.header.extend_from_slice(page);
            return None;
        }

        self.content.extend_from_slice(page);

        if self.current_length(elapsed_seconds) >= target_chunk_length {
            self.extract_pending(elapsed_seconds)
        } else {
            None
        }
    }

    /// Extract everything buffered since the last boundary.
    ///
    /// Returns `None` when no content is pending. Otherwise clears the content
    /// buffer and moves the boundary to `elapsed_seconds`. The boundary never
    /// moves backwards, so a clock reading behind it yields a zero-length chunk.
    pub fn extract_pending(&mut self, elapsed_seconds: f64) -> Option<Chunk> {
        if self.content.is_empty() {
            return None;
        }

        let boundary = elapsed_seconds.max(self.previous_boundary);
        let length = boundary - self.previous_boundary;

        let mut buffer = Vec::with_capacity(self.header.len() + self.content.len());
        buffer.extend_from_slice(&self.header);
        buffer.append(&mut self.content);

        self.previous_boundary = boundary;

        Some(Chunk { buffer, length })
    }
}
