//! Broadcast Recorder - chunked voice broadcast recording.
//!
//! Splits a live stream of encoded audio pages into chunks of roughly fixed
//! duration. Every chunk starts with the stream header, so each one can be
//! uploaded and decoded on its own while the broadcast is still running.

pub mod broadcast;
pub mod capture;
pub mod config;
pub mod recorder;
pub mod utils;

pub use broadcast::{ChunkIndex, ChunkSink, DirectorySink, VoiceBroadcastRecording};
pub use capture::{AudioSource, ScriptedSource, SourceEvent};
pub use config::{ClientConfig, DEFAULT_CHUNK_LENGTH_SECS};
pub use recorder::{
    create_voice_broadcast_recorder, Chunk, ChunkedRecorder, PageSink, RecorderEvent,
};
pub use utils::error::{ConfigError, RecordingError, RecordingResult};
