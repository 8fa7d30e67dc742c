//! Broadcast state management
//!
//! Defines the broadcast state machine, its events, and the records kept for
//! every delivered chunk.

use crate::recorder::Chunk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current state of a voice broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastState {
    /// Not started yet
    #[default]
    Idle,
    /// Capturing and delivering chunks
    Recording,
    /// Stopped; every chunk has been handed to the sink
    Stopped,
}

/// Events emitted during a broadcast
#[derive(Debug, Clone, PartialEq)]
pub enum BroadcastEvent {
    /// Broadcast started
    Started,
    /// The sink accepted a chunk
    ChunkDelivered { sequence: u32, length: f64 },
    /// The sink rejected a chunk
    DeliveryFailed {
        sequence: u32,
        code: &'static str,
        message: String,
    },
    /// Broadcast stopped
    Stopped,
}

/// A chunk numbered for delivery. Sequences start at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedChunk {
    pub sequence: u32,
    pub chunk: Chunk,
}

/// Record of one delivered chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    /// Position of the chunk within the broadcast
    pub sequence: u32,

    /// Seconds of audio in the chunk
    pub length_secs: f64,

    /// Size of the chunk including header bytes
    pub size_bytes: u64,

    /// File or object name the chunk was stored under
    pub file_name: String,

    /// When the chunk was delivered
    pub recorded_at: DateTime<Utc>,
}

/// Description of a stored broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastManifest {
    pub broadcast_id: String,
    pub content_type: String,
    pub target_chunk_length: f64,
    pub started_at: DateTime<Utc>,
    pub chunks: Vec<ChunkInfo>,
}

impl BroadcastManifest {
    pub fn new(broadcast_id: &str, content_type: &str, target_chunk_length: f64) -> Self {
        Self {
            broadcast_id: broadcast_id.to_string(),
            content_type: content_type.to_string(),
            target_chunk_length,
            started_at: Utc::now(),
            chunks: Vec::new(),
        }
    }
}

/// Result of a completed broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastSummary {
    pub broadcast_id: String,

    /// Chunks the sink accepted
    pub chunk_count: usize,

    /// Chunks the sink rejected
    pub failed_deliveries: usize,

    /// Seconds of audio in accepted chunks
    pub total_length_secs: f64,
}
