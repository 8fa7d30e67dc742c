//! Voice broadcast recording
//!
//! Drives one chunked recorder for the lifetime of a broadcast and hands every
//! chunk, numbered from 1, to a sink in recording order.

use super::sink::{ChunkSink, DirectorySink};
use super::state::{BroadcastEvent, BroadcastState, BroadcastSummary, SequencedChunk};
use crate::capture::traits::AudioSource;
use crate::recorder::chunked::EVENT_CHANNEL_CAPACITY;
use crate::recorder::{Chunk, ChunkedRecorder};
use crate::utils::error::{RecordingError, RecordingResult};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Generate an identifier for a new broadcast
pub fn generate_broadcast_id() -> String {
    Uuid::new_v4().to_string()
}

/// Numbers chunks and hands them to the sink
struct Delivery {
    sink: Arc<dyn ChunkSink>,
    event_tx: broadcast::Sender<BroadcastEvent>,
    next_sequence: u32,
    chunk_count: usize,
    failed_deliveries: usize,
    total_length_secs: f64,
}

impl Delivery {
    fn new(sink: Arc<dyn ChunkSink>, event_tx: broadcast::Sender<BroadcastEvent>) -> Self {
        Self {
            sink,
            event_tx,
            next_sequence: 1,
            chunk_count: 0,
            failed_deliveries: 0,
            total_length_secs: 0.0,
        }
    }

    async fn deliver(&mut self, chunk: Chunk) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let length = chunk.length;
        let sequenced = SequencedChunk { sequence, chunk };

        match self.sink.deliver(&sequenced).await {
            Ok(info) => {
                self.chunk_count += 1;
                self.total_length_secs += length;
                tracing::debug!("Delivered chunk {} as {}", sequence, info.file_name);
                let _ = self
                    .event_tx
                    .send(BroadcastEvent::ChunkDelivered { sequence, length });
            }
            Err(e) => {
                // The broadcast keeps going; the sequence number stays used
                self.failed_deliveries += 1;
                tracing::error!("Failed to deliver chunk {}: {}", sequence, e);
                let _ = self.event_tx.send(BroadcastEvent::DeliveryFailed {
                    sequence,
                    code: e.code(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn summary(&self, broadcast_id: &str) -> BroadcastSummary {
        BroadcastSummary {
            broadcast_id: broadcast_id.to_string(),
            chunk_count: self.chunk_count,
            failed_deliveries: self.failed_deliveries,
            total_length_secs: self.total_length_secs,
        }
    }
}

/// Background delivery task plus the channel that hands it the final chunk
struct Pump {
    finish_tx: oneshot::Sender<Option<Chunk>>,
    handle: JoinHandle<Delivery>,
}

async fn run_pump(
    mut chunks: mpsc::UnboundedReceiver<Chunk>,
    mut finish: oneshot::Receiver<Option<Chunk>>,
    mut delivery: Delivery,
) -> Delivery {
    let mut finished = None;
    loop {
        tokio::select! {
            biased;
            chunk = chunks.recv() => match chunk {
                Some(chunk) => delivery.deliver(chunk).await,
                None => break,
            },
            result = &mut finish => {
                finished = Some(result.ok().flatten());
                break;
            }
        }
    }

    let final_chunk = match finished {
        Some(final_chunk) => final_chunk,
        None => finish.await.ok().flatten(),
    };

    // Chunks cut before stop returned go out ahead of the final one
    while let Ok(chunk) = chunks.try_recv() {
        delivery.deliver(chunk).await;
    }

    if let Some(chunk) = final_chunk {
        delivery.deliver(chunk).await;
    }

    delivery
}

/// One voice broadcast: a recorder plus the sink receiving its chunks
pub struct VoiceBroadcastRecording<S: AudioSource> {
    broadcast_id: String,
    recorder: ChunkedRecorder<S>,
    sink: Arc<dyn ChunkSink>,
    state: Arc<RwLock<BroadcastState>>,
    event_tx: broadcast::Sender<BroadcastEvent>,
    pump: Option<Pump>,
}

impl<S: AudioSource> VoiceBroadcastRecording<S> {
    pub fn new(
        broadcast_id: impl Into<String>,
        recorder: ChunkedRecorder<S>,
        sink: Arc<dyn ChunkSink>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            broadcast_id: broadcast_id.into(),
            recorder,
            sink,
            state: Arc::new(RwLock::new(BroadcastState::Idle)),
            event_tx,
            pump: None,
        }
    }

    /// Record into `<parent>/<broadcast id>/` using a [`DirectorySink`]
    pub fn with_directory_sink(
        recorder: ChunkedRecorder<S>,
        parent: &Path,
    ) -> RecordingResult<Self> {
        let broadcast_id = generate_broadcast_id();
        let sink = DirectorySink::create(
            &parent.join(&broadcast_id),
            &broadcast_id,
            recorder.content_type(),
            recorder.target_chunk_length(),
        )?;

        Ok(Self::new(broadcast_id, recorder, Arc::new(sink)))
    }

    pub fn broadcast_id(&self) -> &str {
        &self.broadcast_id
    }

    /// Get the current broadcast state
    pub fn state(&self) -> BroadcastState {
        *self.state.read()
    }

    /// Subscribe to broadcast events
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.event_tx.subscribe()
    }

    pub fn recorder(&self) -> &ChunkedRecorder<S> {
        &self.recorder
    }

    /// Start the broadcast
    pub async fn start(&mut self) -> RecordingResult<()> {
        let current_state = *self.state.read();
        if current_state != BroadcastState::Idle {
            return Err(RecordingError::AlreadyRecording);
        }

        tracing::info!("Starting voice broadcast {}", self.broadcast_id);

        // Attach before the source starts so no chunk is missed
        let chunks = self.recorder.chunk_feed();
        self.recorder.start().await?;

        *self.state.write() = BroadcastState::Recording;
        let _ = self.event_tx.send(BroadcastEvent::Started);

        let (finish_tx, finish_rx) = oneshot::channel();
        let delivery = Delivery::new(self.sink.clone(), self.event_tx.clone());
        let handle = tokio::spawn(run_pump(chunks, finish_rx, delivery));
        self.pump = Some(Pump { finish_tx, handle });

        Ok(())
    }

    /// Stop the broadcast once every chunk has been handed to the sink
    pub async fn stop(&mut self) -> RecordingResult<BroadcastSummary> {
        let current_state = *self.state.read();
        if current_state != BroadcastState::Recording {
            return Err(RecordingError::NotRecording);
        }

        tracing::info!("Stopping voice broadcast {}", self.broadcast_id);

        let final_chunk = self.recorder.stop().await?;
        let pump = self.pump.take().ok_or(RecordingError::NotRecording)?;
        let _ = pump.finish_tx.send(final_chunk);

        let joined = pump.handle.await;
        *self.state.write() = BroadcastState::Stopped;
        let delivery =
            joined.map_err(|e| RecordingError::Delivery(format!("delivery task failed: {}", e)))?;

        let _ = self.event_tx.send(BroadcastEvent::Stopped);

        let summary = delivery.summary(&self.broadcast_id);
        tracing::info!(
            "Voice broadcast {} stopped: {} chunks, {:.2}s",
            self.broadcast_id,
            summary.chunk_count,
            summary.total_length_secs
        );
        Ok(summary)
    }

    /// Abandon the broadcast: release the capture and drop undelivered chunks
    pub fn destroy(&mut self) {
        tracing::info!("Destroying voice broadcast {}", self.broadcast_id);

        self.recorder.destroy();
        if let Some(pump) = self.pump.take() {
            pump.handle.abort();
        }
        *self.state.write() = BroadcastState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::index::ChunkIndex;
    use crate::broadcast::sink::read_manifest;
    use crate::broadcast::state::ChunkInfo;
    use crate::capture::ScriptedSource;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;

    const HEADER: [&[u8]; 2] = [&[1, 2], &[3, 4]];

    /// Collects delivered chunks; fails the sequences listed in `fail`
    #[derive(Default)]
    struct MemorySink {
        delivered: Mutex<Vec<SequencedChunk>>,
        fail: Vec<u32>,
    }

    #[async_trait]
    impl ChunkSink for MemorySink {
        async fn deliver(&self, chunk: &SequencedChunk) -> RecordingResult<ChunkInfo> {
            if self.fail.contains(&chunk.sequence) {
                return Err(RecordingError::Delivery("upload rejected".to_string()));
            }

            self.delivered.lock().push(chunk.clone());
            Ok(ChunkInfo {
                sequence: chunk.sequence,
                length_secs: chunk.chunk.length,
                size_bytes: chunk.chunk.buffer.len() as u64,
                file_name: format!("memory-{}", chunk.sequence),
                recorded_at: Utc::now(),
            })
        }
    }

    fn setup(sink: Arc<MemorySink>) -> (ScriptedSource, VoiceBroadcastRecording<ScriptedSource>) {
        let source = ScriptedSource::new("audio/ogg; codecs=opus");
        let recorder = ChunkedRecorder::new(source.clone(), 30.0);
        let recording = VoiceBroadcastRecording::new("broadcast-1", recorder, sink);
        (source, recording)
    }

    fn push_headers(source: &ScriptedSource) {
        for page in HEADER {
            source.push_page(page);
        }
    }

    #[tokio::test]
    async fn test_delivers_sequenced_chunks_in_order() {
        let sink = Arc::new(MemorySink::default());
        let (source, mut recording) = setup(sink.clone());

        recording.start().await.unwrap();
        assert_eq!(recording.state(), BroadcastState::Recording);

        push_headers(&source);
        source.set_elapsed_seconds(42.0);
        source.push_page(&[5, 6]);
        source.set_elapsed_seconds(72.0);
        source.push_page(&[7, 8]);
        source.set_elapsed_seconds(80.0);
        source.push_page(&[9]);

        let summary = recording.stop().await.unwrap();
        assert_eq!(recording.state(), BroadcastState::Stopped);
        assert_eq!(summary.broadcast_id, "broadcast-1");
        assert_eq!(summary.chunk_count, 3);
        assert_eq!(summary.failed_deliveries, 0);
        assert_eq!(summary.total_length_secs, 80.0);

        let delivered = sink.delivered.lock();
        let sequences: Vec<u32> = delivered.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(delivered[0].chunk.buffer, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(delivered[1].chunk.buffer, vec![1, 2, 3, 4, 7, 8]);
        assert_eq!(delivered[2].chunk.buffer, vec![1, 2, 3, 4, 9]);
        assert_eq!(delivered[2].chunk.length, 8.0);
    }

    #[tokio::test]
    async fn test_backlog_beyond_event_capacity_is_delivered() {
        let sink = Arc::new(MemorySink::default());
        let source = ScriptedSource::new("audio/ogg; codecs=opus");
        let recorder = ChunkedRecorder::new(source.clone(), 1.0);
        let mut recording = VoiceBroadcastRecording::new("broadcast-1", recorder, sink.clone());

        recording.start().await.unwrap();
        push_headers(&source);

        // Every chunk is cut before the delivery task gets to run
        let emitted = EVENT_CHANNEL_CAPACITY + 50;
        for second in 1..=emitted {
            source.set_elapsed_seconds(second as f64);
            source.push_page(&[5]);
        }

        let summary = recording.stop().await.unwrap();
        assert_eq!(summary.chunk_count, emitted);
        assert_eq!(summary.failed_deliveries, 0);
        assert_eq!(summary.total_length_secs, emitted as f64);

        let sequences: Vec<u32> = sink.delivered.lock().iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, (1..=emitted as u32).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_events() {
        let sink = Arc::new(MemorySink::default());
        let (source, mut recording) = setup(sink);
        let mut events = recording.subscribe();

        recording.start().await.unwrap();
        push_headers(&source);
        source.set_elapsed_seconds(31.0);
        source.push_page(&[5]);
        recording.stop().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), BroadcastEvent::Started);
        assert_eq!(
            events.recv().await.unwrap(),
            BroadcastEvent::ChunkDelivered {
                sequence: 1,
                length: 31.0
            }
        );
        assert_eq!(events.recv().await.unwrap(), BroadcastEvent::Stopped);
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_broadcast_running() {
        let sink = Arc::new(MemorySink {
            fail: vec![1],
            ..Default::default()
        });
        let (source, mut recording) = setup(sink.clone());
        let mut events = recording.subscribe();

        recording.start().await.unwrap();
        push_headers(&source);
        source.set_elapsed_seconds(30.0);
        source.push_page(&[5]);
        source.set_elapsed_seconds(45.0);
        source.push_page(&[6]);

        let summary = recording.stop().await.unwrap();
        assert_eq!(summary.chunk_count, 1);
        assert_eq!(summary.failed_deliveries, 1);
        assert_eq!(summary.total_length_secs, 15.0);

        let delivered = sink.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].sequence, 2);

        assert_eq!(events.recv().await.unwrap(), BroadcastEvent::Started);
        assert_eq!(
            events.recv().await.unwrap(),
            BroadcastEvent::DeliveryFailed {
                sequence: 1,
                code: "DELIVERY_ERROR",
                message: "Delivery error: upload rejected".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_state_guards() {
        let sink = Arc::new(MemorySink::default());
        let (_source, mut recording) = setup(sink);

        assert!(matches!(
            recording.stop().await,
            Err(RecordingError::NotRecording)
        ));

        recording.start().await.unwrap();
        assert!(matches!(
            recording.start().await,
            Err(RecordingError::AlreadyRecording)
        ));

        recording.stop().await.unwrap();
        assert!(matches!(
            recording.stop().await,
            Err(RecordingError::NotRecording)
        ));
    }

    #[tokio::test]
    async fn test_start_failure_leaves_broadcast_idle() {
        let sink = Arc::new(MemorySink::default());
        let (source, mut recording) = setup(sink);
        source.fail_next_start(RecordingError::CaptureError("permission denied".to_string()));

        assert!(matches!(
            recording.start().await,
            Err(RecordingError::CaptureError(_))
        ));
        assert_eq!(recording.state(), BroadcastState::Idle);

        recording.start().await.unwrap();
        assert_eq!(recording.state(), BroadcastState::Recording);
    }

    #[tokio::test]
    async fn test_stop_without_content_delivers_nothing() {
        let sink = Arc::new(MemorySink::default());
        let (source, mut recording) = setup(sink.clone());

        recording.start().await.unwrap();
        push_headers(&source);

        let summary = recording.stop().await.unwrap();
        assert_eq!(summary.chunk_count, 0);
        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_releases_source() {
        let sink = Arc::new(MemorySink::default());
        let (source, mut recording) = setup(sink);

        recording.start().await.unwrap();
        recording.destroy();

        assert!(source.is_destroyed());
        assert_eq!(recording.state(), BroadcastState::Stopped);
    }

    #[tokio::test]
    async fn test_with_directory_sink() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::new("audio/ogg; codecs=opus");
        let recorder = ChunkedRecorder::new(source.clone(), 30.0);
        let mut recording =
            VoiceBroadcastRecording::with_directory_sink(recorder, dir.path()).unwrap();
        let broadcast_dir = dir.path().join(recording.broadcast_id());

        recording.start().await.unwrap();
        push_headers(&source);
        source.set_elapsed_seconds(42.0);
        source.push_page(&[5, 6]);
        source.set_elapsed_seconds(50.0);
        source.push_page(&[7]);
        recording.stop().await.unwrap();

        let manifest = read_manifest(&broadcast_dir).unwrap();
        assert_eq!(manifest.broadcast_id, recording.broadcast_id());
        assert_eq!(manifest.content_type, "audio/ogg; codecs=opus");
        assert_eq!(manifest.chunks.len(), 2);

        let second = std::fs::read(broadcast_dir.join("chunk-00002.ogg")).unwrap();
        assert_eq!(second, vec![1, 2, 3, 4, 7]);

        let index = ChunkIndex::from(&manifest);
        assert_eq!(index.length(), 50.0);
        assert_eq!(index.length_to(2), 42.0);
    }
}
