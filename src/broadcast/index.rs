//! Playback-side chunk index
//!
//! Keeps the chunks of a broadcast ordered by sequence so a player can map a
//! chunk to its position on the broadcast timeline.

use super::state::{BroadcastManifest, ChunkInfo};

/// Chunks of one broadcast, ordered by sequence
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    chunks: Vec<ChunkInfo>,
}

impl ChunkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk, replacing any chunk with the same sequence.
    ///
    /// Returns `false` for sequence 0, which no broadcast produces.
    pub fn insert(&mut self, info: ChunkInfo) -> bool {
        if info.sequence == 0 {
            return false;
        }

        match self
            .chunks
            .binary_search_by_key(&info.sequence, |chunk| chunk.sequence)
        {
            Ok(pos) => self.chunks[pos] = info,
            Err(pos) => self.chunks.insert(pos, info),
        }
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, sequence: u32) -> Option<&ChunkInfo> {
        self.chunks
            .binary_search_by_key(&sequence, |chunk| chunk.sequence)
            .ok()
            .map(|pos| &self.chunks[pos])
    }

    pub fn first(&self) -> Option<&ChunkInfo> {
        self.chunks.first()
    }

    /// The chunk following `sequence`, skipping gaps
    pub fn next_after(&self, sequence: u32) -> Option<&ChunkInfo> {
        let pos = self.chunks.partition_point(|chunk| chunk.sequence <= sequence);
        self.chunks.get(pos)
    }

    /// Total seconds of all known chunks
    pub fn length(&self) -> f64 {
        self.chunks.iter().map(|chunk| chunk.length_secs).sum()
    }

    /// Seconds of all known chunks before `sequence`
    pub fn length_to(&self, sequence: u32) -> f64 {
        self.chunks
            .iter()
            .take_while(|chunk| chunk.sequence < sequence)
            .map(|chunk| chunk.length_secs)
            .sum()
    }

    /// The chunk playing at `secs` on the broadcast timeline.
    ///
    /// A chunk covers `[length_to, length_to + length_secs)`; the last chunk
    /// also takes the end time. Seek within it by `secs - length_to(sequence)`.
    pub fn find_by_time(&self, secs: f64) -> Option<&ChunkInfo> {
        if secs < 0.0 {
            return None;
        }

        let mut start = 0.0;
        for chunk in &self.chunks {
            let end = start + chunk.length_secs;
            if secs < end {
                return Some(chunk);
            }
            start = end;
        }

        self.chunks.last().filter(|_| secs == start)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkInfo> {
        self.chunks.iter()
    }
}

impl From<&BroadcastManifest> for ChunkIndex {
    fn from(manifest: &BroadcastManifest) -> Self {
        let mut index = ChunkIndex::new();
        for chunk in &manifest.chunks {
            index.insert(chunk.clone());
        }
        index
    }
}
