//! Progress sinks.

use reelweave_core::ProgressEvent;
use reelweave_interface::ProgressReporter;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Forwards events into a bounded channel.
///
/// When the channel is full or the receiver is gone the event is dropped
/// and counted; the pipeline never waits on the consumer.
///
/// # Examples
///
/// ```
/// use reelweave_pipeline::ChannelReporter;
///
/// let (reporter, receiver) = ChannelReporter::new(64);
/// assert_eq!(reporter.dropped(), 0);
/// drop(receiver);
/// ```
#[derive(Debug)]
pub struct ChannelReporter {
    sender: mpsc::Sender<ProgressEvent>,
    dropped: AtomicU64,
}

impl ChannelReporter {
    /// Reporter with room for `capacity` undelivered events.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// Events discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for ChannelReporter {
    fn emit(&self, event: ProgressEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(job_id = %event.job_id, sequence = event.sequence, "Progress channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Writes every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn emit(&self, event: ProgressEvent) {
        tracing::info!(
            job_id = %event.job_id,
            sequence = event.sequence,
            progress = format!("{:.0}%", event.progress * 100.0),
            "{}",
            event.describe()
        );
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn emit(&self, _event: ProgressEvent) {}
}
