//! In-memory audio source driven by the caller.
//!
//! Used to replay pre-encoded page streams and as the test double for
//! [`AudioSource`]. Clones share state, so one handle can be given to a
//! recorder while another pushes pages and moves the clock.

use super::traits::{AudioSource, SourceEvent};
use crate::recorder::PageSink;
use crate::utils::error::{RecordingError, RecordingResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Default)]
struct ScriptedInner {
    elapsed_seconds: f64,
    sink: Option<PageSink>,
    capturing: bool,
    destroyed: bool,
    start_calls: usize,
    stop_calls: usize,
    start_failure: Option<RecordingError>,
    stop_failure: Option<RecordingError>,
}

/// Scripted capture source
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    content_type: Arc<str>,
    inner: Arc<Mutex<ScriptedInner>>,
    event_tx: broadcast::Sender<SourceEvent>,
}

impl ScriptedSource {
    pub fn new(content_type: &str) -> Self {
        let (event_tx, _) = broadcast::channel(16);
        Self {
            content_type: Arc::from(content_type),
            inner: Arc::new(Mutex::new(ScriptedInner::default())),
            event_tx,
        }
    }

    /// Set the capture clock. Readings lower than the current one are ignored.
    pub fn set_elapsed_seconds(&self, elapsed_seconds: f64) {
        let mut inner = self.inner.lock();
        inner.elapsed_seconds = inner.elapsed_seconds.max(elapsed_seconds);
    }

    /// Deliver one encoded page to the registered sink.
    ///
    /// Returns `false` when no sink is registered yet.
    pub fn push_page(&self, page: &[u8]) -> bool {
        let (sink, elapsed_seconds) = {
            let inner = self.inner.lock();
            (inner.sink.clone(), inner.elapsed_seconds)
        };

        match sink {
            Some(sink) => {
                sink.on_page_available(page, elapsed_seconds);
                true
            }
            None => false,
        }
    }

    /// Make the next `start` fail with `error`
    pub fn fail_next_start(&self, error: RecordingError) {
        self.inner.lock().start_failure = Some(error);
    }

    /// Make the next `stop` fail with `error`
    pub fn fail_next_stop(&self, error: RecordingError) {
        self.inner.lock().stop_failure = Some(error);
    }

    /// Publish a source-level event
    pub fn emit(&self, event: SourceEvent) {
        let _ = self.event_tx.send(event);
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.lock().capturing
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    pub fn start_calls(&self) -> usize {
        self.inner.lock().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.lock().stop_calls
    }
}

#[async_trait]
impl AudioSource for ScriptedSource {
    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn elapsed_seconds(&self) -> f64 {
        self.inner.lock().elapsed_seconds
    }

    fn set_page_sink(&mut self, sink: PageSink) {
        self.inner.lock().sink = Some(sink);
    }

    fn subscribe(&self) -> broadcast::Receiver<SourceEvent> {
        self.event_tx.subscribe()
    }

    async fn start(&mut self) -> RecordingResult<()> {
        {
            let mut inner = self.inner.lock();
            inner.start_calls += 1;
            if let Some(error) = inner.start_failure.take() {
                return Err(error);
            }
            inner.capturing = true;
        }

        self.emit(SourceEvent::Started);
        Ok(())
    }

    async fn stop(&mut self) -> RecordingResult<()> {
        {
            let mut inner = self.inner.lock();
            inner.stop_calls += 1;
            if let Some(error) = inner.stop_failure.take() {
                return Err(error);
            }
            inner.capturing = false;
        }

        self.emit(SourceEvent::Stopped);
        Ok(())
    }

    fn destroy(&mut self) {
        let mut inner = self.inner.lock();
        inner.capturing = false;
        inner.destroyed = true;
        inner.sink = None;
    }
}
