//! Recorder state and events

use super::chunker::Chunk;
use serde::{Deserialize, Serialize};

/// Lifecycle of a chunked recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecorderState {
    /// `start` has not completed yet
    #[default]
    NotStarted,
    /// The source is capturing
    Recording,
    /// `stop` has completed
    Stopped,
}

/// Events published by the recorder on its own channel
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// A chunk reached the target length and was cut
    ChunkRecorded(Chunk),
}
