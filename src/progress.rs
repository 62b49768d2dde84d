//! Progress reporting for batch operations
//!
//! Operations take a `&dyn ProgressSink` and notify it synchronously, once
//! per processed item, before that item's outcome is known. Callers that do
//! not care pass [`NoProgress`].

use serde::Serialize;
use std::sync::mpsc::Sender;

/// Frame position inside a multi-frame source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameProgress {
    /// Zero-based index of the frame just written
    pub index: usize,
    /// Total frames in the source, when the decoder knows it up front
    pub total: Option<usize>,
}

/// A single progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    /// 1-based position of the current item
    pub current: usize,
    /// Number of items in the batch
    pub total: usize,
    /// Display label, usually the file name
    pub label: String,
    /// Frame position (frame extraction only)
    pub frame: Option<FrameProgress>,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize, label: impl Into<String>) -> Self {
        Self {
            current,
            total,
            label: label.into(),
            frame: None,
        }
    }

    pub fn with_frame(mut self, index: usize, total: Option<usize>) -> Self {
        self.frame = Some(FrameProgress { index, total });
        self
    }

    /// Completed fraction of the batch
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink {
    fn notify(&self, _event: &ProgressEvent) {}
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent),
{
    fn notify(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forward events to a channel; a hung-up receiver is ignored
impl ProgressSink for Sender<ProgressEvent> {
    fn notify(&self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}
