//! Voice broadcasts
//!
//! This module turns a chunked recorder into a broadcast:
//! - VoiceBroadcastRecording numbers chunks and hands them to a sink
//! - ChunkSink / DirectorySink store the chunks
//! - ChunkIndex maps delivered chunks onto the broadcast timeline for playback

pub mod index;
pub mod recording;
pub mod sink;
pub mod state;

pub use index::ChunkIndex;
pub use recording::{generate_broadcast_id, VoiceBroadcastRecording};
pub use sink::{read_manifest, ChunkSink, DirectorySink};
pub use state::{
    BroadcastEvent, BroadcastManifest, BroadcastState, BroadcastSummary, ChunkInfo,
    SequencedChunk,
};
