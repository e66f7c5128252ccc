//! Event log reader: filtered queries over the JSON-lines log.
//!
//! The file is read backwards in fixed-size chunks, so a query touches only
//! the tail it needs to fill its limit.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use humivent_domain::event::{Event, EventKind};
use humivent_domain::time::Timestamp;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::FileAdapterError;

/// Number of events returned when a query sets no limit.
pub const DEFAULT_LIMIT: usize = 100;

const CHUNK_SIZE: u64 = 64 * 1024;

/// Filter applied to the event log. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogQuery {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub event: Option<EventKind>,
    pub limit: Option<usize>,
}

impl LogQuery {
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.start.is_none_or(|start| event.timestamp >= start)
            && self.end.is_none_or(|end| event.timestamp <= end)
            && self.event.is_none_or(|kind| event.event == kind)
    }

    fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// Reads events back from a file written by [`JsonlEventLog`](crate::JsonlEventLog).
pub struct EventLogReader {
    path: PathBuf,
    chunk_size: u64,
}

impl EventLogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: CHUNK_SIZE,
        }
    }

    /// The most recent events matching `query`, oldest first.
    ///
    /// Lines that are not valid UTF-8 or not a valid event are skipped. A
    /// missing file yields no events.
    ///
    /// # Errors
    ///
    /// Returns [`FileAdapterError::Io`] when the file exists but cannot be read.
    pub async fn query(&self, query: &LogQuery) -> Result<Vec<Event>, FileAdapterError> {
        let mut lines = match ReverseLines::open(&self.path, self.chunk_size).await {
            Ok(lines) => lines,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(FileAdapterError::io(&self.path)(err)),
        };

        let limit = query.effective_limit();
        let mut events = Vec::new();
        let mut skipped = 0_usize;
        while events.len() < limit {
            let Some(line) = lines
                .next_line()
                .await
                .map_err(FileAdapterError::io(&self.path))?
            else {
                break;
            };
            let Ok(text) = std::str::from_utf8(&line) else {
                skipped += 1;
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(text) {
                Ok(event) if query.matches(&event) => events.push(event),
                Ok(_) => {}
                Err(_) => skipped += 1,
            }
        }
        events.reverse();

        if skipped > 0 {
            tracing::debug!(skipped, path = %self.path.display(), "malformed event lines skipped");
        }
        Ok(events)
    }
}

/// Lines of a file from last to first.
struct ReverseLines {
    file: File,
    // start of the part of the file not yet pulled into `buf`
    pos: u64,
    buf: Vec<u8>,
    chunk: u64,
}

impl ReverseLines {
    async fn open(path: &Path, chunk: u64) -> io::Result<Self> {
        let file = File::open(path).await?;
        let pos = file.metadata().await?.len();
        Ok(Self {
            file,
            pos,
            buf: Vec::new(),
            chunk: chunk.max(1),
        })
    }

    /// Next non-empty line, without its newline.
    async fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(idx) = self.buf.iter().rposition(|byte| *byte == b'\n') {
                let line = self.buf.split_off(idx + 1);
                self.buf.truncate(idx);
                if !line.is_empty() {
                    return Ok(Some(line));
                }
                continue;
            }
            if self.pos == 0 {
                return Ok((!self.buf.is_empty()).then(|| std::mem::take(&mut self.buf)));
            }
            let len = self.chunk.min(self.pos);
            self.pos -= len;
            let mut chunk = vec![0; usize::try_from(len).map_err(io::Error::other)?];
            self.file.seek(SeekFrom::Start(self.pos)).await?;
            self.file.read_exact(&mut chunk).await?;
            chunk.append(&mut self.buf);
            self.buf = chunk;
        }
    }
}
