//! JSON-lines event log writer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use humivent_app::ports::StatusSink;
use humivent_domain::event::Event;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::FileAdapterError;

/// [`StatusSink`] appending one JSON object per line to a file.
///
/// Events go through a bounded channel to a background writer task, so
/// [`log`](StatusSink::log) never blocks. When the channel is full the event
/// is dropped and counted.
#[derive(Clone)]
pub struct JsonlEventLog {
    sender: mpsc::Sender<Event>,
    dropped: Arc<AtomicU64>,
}

impl JsonlEventLog {
    /// Start the writer task on the current runtime.
    ///
    /// The task finishes once every clone of the returned log is dropped and
    /// the queue is drained.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or when called outside a tokio runtime.
    pub fn spawn(
        path: impl Into<PathBuf>,
        capacity: usize,
    ) -> (Self, JoinHandle<Result<(), FileAdapterError>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let handle = tokio::spawn(write_events(path.into(), receiver));
        let log = Self {
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (log, handle)
    }

    /// Number of events discarded because the queue was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl StatusSink for JsonlEventLog {
    fn log(&self, event: Event) {
        if let Err(err) = self.sender.try_send(event) {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped.is_power_of_two() {
                let reason = match err {
                    mpsc::error::TrySendError::Full(_) => "queue full",
                    mpsc::error::TrySendError::Closed(_) => "writer stopped",
                };
                tracing::warn!(dropped, reason, "event log dropping events");
            }
        }
    }
}

async fn open_append(path: &Path) -> Result<tokio::fs::File, FileAdapterError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(FileAdapterError::io(parent))?;
    }
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(FileAdapterError::io(path))
}

async fn write_events(
    path: PathBuf,
    mut receiver: mpsc::Receiver<Event>,
) -> Result<(), FileAdapterError> {
    let mut file = open_append(&path).await?;
    tracing::debug!(path = %path.display(), "event log writer started");

    while let Some(event) = receiver.recv().await {
        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, kind = %event.event, "event not serializable");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(err) = file.write_all(&line).await {
            tracing::error!(error = %err, path = %path.display(), "event log write failed");
            continue;
        }
        if receiver.is_empty() {
            file.flush().await.map_err(FileAdapterError::io(&path))?;
        }
    }

    file.flush().await.map_err(FileAdapterError::io(&path))?;
    tracing::debug!(path = %path.display(), "event log writer stopped");
    Ok(())
}
