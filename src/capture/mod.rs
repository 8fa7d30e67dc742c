//! Audio capture sources
//!
//! This module defines the contract a live capture session fulfils for the
//! recorder, plus an in-memory source driven by the caller.

pub mod scripted;
pub mod traits;

pub use scripted::ScriptedSource;
pub use traits::{AudioSource, SourceEvent};
