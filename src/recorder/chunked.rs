//! Chunked recorder
//!
//! Wraps one audio source and cuts its encoded page stream into chunks of
//! roughly `target_chunk_length` seconds. Each chunk carries the stream header
//! so it decodes independently.

use super::chunker::{BufferPhase, Chunk, ChunkBuffer};
use super::state::{RecorderEvent, RecorderState};
use crate::capture::traits::{AudioSource, SourceEvent};
use crate::utils::error::RecordingResult;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Capacity of the recorder event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

type ChunkFeeds = Arc<Mutex<Vec<mpsc::UnboundedSender<Chunk>>>>;

/// Handle a source uses to deliver encoded pages to its recorder.
///
/// Cheap to clone. Chunks cut while handling a page are published before
/// `on_page_available` returns.
#[derive(Debug, Clone)]
pub struct PageSink {
    buffer: Arc<Mutex<ChunkBuffer>>,
    target_chunk_length: f64,
    event_tx: broadcast::Sender<RecorderEvent>,
    feeds: ChunkFeeds,
}

impl PageSink {
    /// Handle one encoded page captured at `elapsed_seconds`
    pub fn on_page_available(&self, page: &[u8], elapsed_seconds: f64) {
        let mut buffer = self.buffer.lock();
        let Some(chunk) = buffer.push_page(page, elapsed_seconds, self.target_chunk_length) else {
            return;
        };

        tracing::debug!(
            "Chunk recorded: {} bytes, {:.2}s (boundary {:.2}s)",
            chunk.buffer.len(),
            chunk.length,
            buffer.previous_boundary()
        );

        // Published under the lock so concurrent pages keep chunk order
        self.feeds
            .lock()
            .retain(|feed| feed.send(chunk.clone()).is_ok());
        let _ = self.event_tx.send(RecorderEvent::ChunkRecorded(chunk));
    }
}

/// Splits a live capture into fixed-duration chunks
pub struct ChunkedRecorder<S: AudioSource> {
    source: S,
    target_chunk_length: f64,
    buffer: Arc<Mutex<ChunkBuffer>>,
    event_tx: broadcast::Sender<RecorderEvent>,
    feeds: ChunkFeeds,
    state: RecorderState,
}

impl<S: AudioSource> ChunkedRecorder<S> {
    /// Wrap `source` and register as its page sink
    pub fn new(mut source: S, target_chunk_length: f64) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let buffer = Arc::new(Mutex::new(ChunkBuffer::new()));
        let feeds = ChunkFeeds::default();

        source.set_page_sink(PageSink {
            buffer: buffer.clone(),
            target_chunk_length,
            event_tx: event_tx.clone(),
            feeds: feeds.clone(),
        });

        Self {
            source,
            target_chunk_length,
            buffer,
            event_tx,
            feeds,
            state: RecorderState::NotStarted,
        }
    }

    /// Start the underlying capture. Source errors are returned unchanged.
    pub async fn start(&mut self) -> RecordingResult<()> {
        self.source.start().await?;
        self.state = RecorderState::Recording;

        tracing::info!(
            "Chunked recording started ({}, target {}s)",
            self.source.content_type(),
            self.target_chunk_length
        );
        Ok(())
    }

    /// Stop the underlying capture and return whatever is still buffered.
    ///
    /// Returns `Ok(None)` when nothing is pending, which makes repeated calls
    /// harmless.
    pub async fn stop(&mut self) -> RecordingResult<Option<Chunk>> {
        self.source.stop().await?;
        self.state = RecorderState::Stopped;

        let elapsed_seconds = self.source.elapsed_seconds();
        let chunk = self.buffer.lock().extract_pending(elapsed_seconds);

        match &chunk {
            Some(chunk) => tracing::info!(
                "Chunked recording stopped with final chunk: {} bytes, {:.2}s",
                chunk.buffer.len(),
                chunk.length
            ),
            None => tracing::info!("Chunked recording stopped, nothing pending"),
        }

        Ok(chunk)
    }

    /// Release the underlying capture without flushing
    pub fn destroy(&mut self) {
        tracing::debug!("Destroying chunked recorder");
        self.source.destroy();
        self.state = RecorderState::Stopped;
    }

    /// Content type of the emitted chunks, as reported by the source
    pub fn content_type(&self) -> &str {
        self.source.content_type()
    }

    pub fn target_chunk_length(&self) -> f64 {
        self.target_chunk_length
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn phase(&self) -> BufferPhase {
        self.buffer.lock().phase()
    }

    /// Subscribe to chunk events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    /// Feed of every chunk published from now on.
    ///
    /// Unlike [`subscribe`](Self::subscribe), the feed is unbounded and never
    /// drops chunks when its reader falls behind. Dropping the receiver
    /// detaches it.
    pub fn chunk_feed(&self) -> mpsc::UnboundedReceiver<Chunk> {
        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        self.feeds.lock().push(feed_tx);
        feed_rx
    }

    /// Subscribe to the wrapped source's own events
    pub fn source_events(&self) -> broadcast::Receiver<SourceEvent> {
        self.source.subscribe()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
