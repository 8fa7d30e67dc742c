//! Capture trait definitions
//!
//! The audio source is the live capture session the recorder wraps. It owns
//! the hardware and the encoder; the recorder only sees encoded pages.

use crate::recorder::PageSink;
use crate::utils::error::RecordingResult;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Source-level notifications. The recorder forwards these without
/// interpreting them.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Capture started
    Started,
    /// Capture stopped
    Stopped,
    /// Capture hit a recoverable problem
    Error(String),
}

/// A live audio capture session producing encoded pages
#[async_trait]
pub trait AudioSource: Send {
    /// MIME type of the encoded pages, e.g. `audio/ogg; codecs=opus`
    fn content_type(&self) -> &str;

    /// Seconds captured so far. Never decreases.
    fn elapsed_seconds(&self) -> f64;

    /// Register the sink receiving every encoded page.
    ///
    /// The source must call [`PageSink::on_page_available`] once per page, in
    /// encoding order, passing its elapsed seconds at that page.
    fn set_page_sink(&mut self, sink: PageSink);

    /// Subscribe to source-level events
    fn subscribe(&self) -> broadcast::Receiver<SourceEvent>;

    /// Start capturing
    async fn start(&mut self) -> RecordingResult<()>;

    /// Stop capturing. Every page encoded before the call has been delivered
    /// by the time this resolves.
    async fn stop(&mut self) -> RecordingResult<()>;

    /// Release the capture session without flushing
    fn destroy(&mut self);
}
