//! Chunk delivery
//!
//! A sink receives every numbered chunk of a broadcast. `DirectorySink`
//! stores a broadcast as a directory:
//! - manifest.json: broadcast metadata and one entry per chunk
//! - chunk-NNNNN.<ext>: one independently decodable file per chunk

use super::state::{BroadcastManifest, ChunkInfo, SequencedChunk};
use crate::utils::error::{RecordingError, RecordingResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name inside a broadcast directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Destination for recorded chunks
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Store or upload one chunk
    async fn deliver(&self, chunk: &SequencedChunk) -> RecordingResult<ChunkInfo>;
}

/// File extension for chunks of the given content type
pub fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/webm" => "webm",
        _ => "bin",
    }
}

/// Writes every chunk to a broadcast directory
pub struct DirectorySink {
    dir: PathBuf,
    extension: &'static str,
    manifest: Mutex<BroadcastManifest>,
}

impl DirectorySink {
    /// Create the broadcast directory and an empty manifest
    pub fn create(
        dir: &Path,
        broadcast_id: &str,
        content_type: &str,
        target_chunk_length: f64,
    ) -> RecordingResult<Self> {
        fs::create_dir_all(dir)?;

        let manifest = BroadcastManifest::new(broadcast_id, content_type, target_chunk_length);
        write_manifest(&manifest, dir)?;

        tracing::debug!("Created broadcast directory {:?}", dir);

        Ok(Self {
            dir: dir.to_path_buf(),
            extension: extension_for(content_type),
            manifest: Mutex::new(manifest),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot of the manifest as written so far
    pub fn manifest(&self) -> BroadcastManifest {
        self.manifest.lock().clone()
    }
}

#[async_trait]
impl ChunkSink for DirectorySink {
    async fn deliver(&self, chunk: &SequencedChunk) -> RecordingResult<ChunkInfo> {
        let file_name = format!("chunk-{:05}.{}", chunk.sequence, self.extension);
        fs::write(self.dir.join(&file_name), &chunk.chunk.buffer)?;

        let info = ChunkInfo {
            sequence: chunk.sequence,
            length_secs: chunk.chunk.length,
            size_bytes: chunk.chunk.buffer.len() as u64,
            file_name,
            recorded_at: Utc::now(),
        };

        let mut manifest = self.manifest.lock();
        manifest.chunks.retain(|existing| existing.sequence != info.sequence);
        manifest.chunks.push(info.clone());
        write_manifest(&manifest, &self.dir)?;

        Ok(info)
    }
}

/// Read the manifest of a broadcast directory
pub fn read_manifest(dir: &Path) -> RecordingResult<BroadcastManifest> {
    let manifest_path = dir.join(MANIFEST_FILE);

    if !manifest_path.exists() {
        return Err(RecordingError::MissingFile(MANIFEST_FILE.to_string()));
    }

    let content = fs::read_to_string(&manifest_path)?;
    let manifest: BroadcastManifest = serde_json::from_str(&content)?;

    Ok(manifest)
}

fn write_manifest(manifest: &BroadcastManifest, dir: &Path) -> RecordingResult<()> {
    let content = serde_json::to_string_pretty(manifest)?;
    fs::write(dir.join(MANIFEST_FILE), content)?;
    Ok(())
}
