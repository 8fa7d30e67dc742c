//! Chunked recording
//!
//! This module implements the chunking core:
//! - ChunkBuffer, the pure header/content buffering state
//! - ChunkedRecorder, which drives a ChunkBuffer from a live audio source
//! - the factory that reads the target chunk length from configuration

pub mod chunked;
pub mod chunker;
pub mod state;

pub use chunked::{ChunkedRecorder, PageSink};
pub use chunker::{BufferPhase, Chunk, ChunkBuffer, HEADER_PAGE_COUNT};
pub use state::{RecorderEvent, RecorderState};

use crate::capture::traits::AudioSource;
use crate::config::ClientConfig;

/// Create a recorder whose target chunk length comes from `config`, falling
/// back to the default chunk length when unset
pub fn create_voice_broadcast_recorder<S: AudioSource>(
    source: S,
    config: &ClientConfig,
) -> ChunkedRecorder<S> {
    ChunkedRecorder::new(source, config.voice_broadcast.target_chunk_length())
}
