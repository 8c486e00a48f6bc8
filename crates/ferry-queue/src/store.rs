// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The durable three-stage queue store.
//!
//! Records live as JSON files under `incoming/`, `processing/`, and
//! `outgoing/` below a single queue root. Stage transitions are
//! `rename(2)` calls, so they are atomic on one filesystem and a crash
//! at any point leaves every record in exactly one stage. Writes go to a
//! hidden temp file first and become visible only via the final rename,
//! so readers never observe a partially written record.
//!
//! Writer discipline: only the processor moves records out of `incoming`,
//! and only adapters delete from `outgoing`. No locks are needed beyond
//! the rename atomicity.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use ferry_core::{
    FerryError, HEARTBEAT_CHANNEL, MessageRecord, ResponseRecord, Stage, now_millis,
};

/// A record identifier within a stage: the bare file name plus the enqueue
/// timestamp used for oldest-first ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub file_name: String,
    /// Enqueue instant embedded in the record, epoch milliseconds.
    pub timestamp: i64,
}

/// Per-stage record counts, as reported by the gateway health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub incoming: usize,
    pub processing: usize,
    pub outgoing: usize,
}

/// Where a record currently lives, for status-by-id lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    /// A response is waiting in `outgoing`.
    Completed(ResponseRecord),
    /// The record is being processed right now.
    Processing(MessageRecord),
    /// The record is waiting in `incoming`.
    Queued(MessageRecord),
}

/// Filesystem-backed queue store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct QueueStore {
    root: PathBuf,
}

impl QueueStore {
    /// Opens (and creates, if necessary) the queue root and its three
    /// stage directories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FerryError> {
        let root = root.into();
        for stage in [Stage::Incoming, Stage::Processing, Stage::Outgoing] {
            let dir = root.join(stage.dir_name());
            fs::create_dir_all(&dir).map_err(|e| queue_err(&dir, e))?;
        }
        Ok(Self { root })
    }

    /// The queue root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.dir_name())
    }

    /// Durably persists a new message record in `incoming`.
    ///
    /// Returns the stage-scoped file name (`{channel}_{messageId}.json`).
    pub fn enqueue(&self, record: &MessageRecord) -> Result<String, FerryError> {
        let file_name = format!("{}.json", record.queue_key());
        self.write_visible(Stage::Incoming, &file_name, record)?;
        debug!(
            channel = record.channel.as_str(),
            message_id = record.message_id.as_str(),
            "message enqueued"
        );
        Ok(file_name)
    }

    /// Durably persists a response record in `outgoing`.
    ///
    /// User-facing channels get a timestamp disambiguator so multiple
    /// responses for one logical conversation never collide. The reserved
    /// heartbeat channel writes a bare `{messageId}.json` because its
    /// consumer expects a predictable name.
    pub fn enqueue_response(&self, response: &ResponseRecord) -> Result<String, FerryError> {
        let file_name = if response.channel == HEARTBEAT_CHANNEL {
            format!("{}.json", response.message_id)
        } else {
            format!(
                "{}_{}_{}.json",
                response.channel,
                response.message_id,
                now_millis()
            )
        };
        self.write_visible(Stage::Outgoing, &file_name, response)?;
        debug!(
            channel = response.channel.as_str(),
            message_id = response.message_id.as_str(),
            "response written to outgoing"
        );
        Ok(file_name)
    }

    /// Write-to-temp-then-rename so readers never see a partial record.
    fn write_visible<T: serde::Serialize>(
        &self,
        stage: Stage,
        file_name: &str,
        value: &T,
    ) -> Result<(), FerryError> {
        let dir = self.stage_dir(stage);
        let tmp = dir.join(format!(".{file_name}.tmp"));
        let json = serde_json::to_string_pretty(value).map_err(|e| FerryError::Codec {
            path: tmp.display().to_string(),
            source: e,
        })?;
        fs::write(&tmp, json).map_err(|e| queue_err(&tmp, e))?;
        let dest = dir.join(file_name);
        fs::rename(&tmp, &dest).map_err(|e| queue_err(&dest, e))
    }

    /// Lists `incoming` records, oldest enqueue first.
    ///
    /// Ordering uses the timestamp embedded in each record so it survives
    /// file copies and restores; ties break on file name for stability.
    /// Unparseable files are skipped with a warning rather than blocking
    /// the queue.
    pub fn list_pending(&self) -> Result<Vec<PendingEntry>, FerryError> {
        let dir = self.stage_dir(Stage::Incoming);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| queue_err(&dir, e))? {
            let entry = entry.map_err(|e| queue_err(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record::<MessageRecord>(&path) {
                Ok(record) => entries.push(PendingEntry {
                    file_name: entry.file_name().to_string_lossy().into_owned(),
                    timestamp: record.timestamp,
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable queue record");
                }
            }
        }
        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(entries)
    }

    /// Lists `outgoing` response file names whose channel prefix matches
    /// the given channel (i.e. `{channel}_…`).
    pub fn list_outgoing(&self, channel: &str) -> Result<Vec<String>, FerryError> {
        let dir = self.stage_dir(Stage::Outgoing);
        let prefix = format!("{channel}_");
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| queue_err(&dir, e))? {
            let entry = entry.map_err(|e| queue_err(&dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") && name.starts_with(&prefix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Atomically claims an `incoming` record by moving it to `processing`.
    ///
    /// Returns `Ok(None)` when the record vanished before the move: some
    /// other actor (a racing recovery sweep, an operator) won the claim,
    /// which is not an error.
    pub fn claim(&self, file_name: &str) -> Result<Option<MessageRecord>, FerryError> {
        let src = self.stage_dir(Stage::Incoming).join(file_name);
        let dest = self.stage_dir(Stage::Processing).join(file_name);
        match fs::rename(&src, &dest) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(file = file_name, "claim lost; record already moved");
                return Ok(None);
            }
            Err(e) => return Err(queue_err(&src, e)),
        }
        let record = self.read_record::<MessageRecord>(&dest)?;
        Ok(Some(record))
    }

    /// Removes the `processing` copy of a record after its response has
    /// been durably written to `outgoing`.
    ///
    /// Callers must write the response first; the write-then-delete order
    /// is what makes a crash between the two recoverable.
    pub fn complete(&self, file_name: &str) -> Result<(), FerryError> {
        let path = self.stage_dir(Stage::Processing).join(file_name);
        fs::remove_file(&path).map_err(|e| queue_err(&path, e))
    }

    /// Moves a record from `processing` back to `incoming`, making it
    /// eligible for reclaim and retry.
    pub fn fail(&self, file_name: &str) -> Result<(), FerryError> {
        let src = self.stage_dir(Stage::Processing).join(file_name);
        let dest = self.stage_dir(Stage::Incoming).join(file_name);
        fs::rename(&src, &dest).map_err(|e| queue_err(&src, e))
    }

    /// Reads a completed response from `outgoing` without removing it.
    pub fn read_response(&self, file_name: &str) -> Result<ResponseRecord, FerryError> {
        let path = self.stage_dir(Stage::Outgoing).join(file_name);
        self.read_record(&path)
    }

    /// Removes a record from the given stage once it has been consumed
    /// (delivered) or declared unrecoverable (discarded).
    pub fn discard(&self, stage: Stage, file_name: &str) -> Result<(), FerryError> {
        let path = self.stage_dir(stage).join(file_name);
        fs::remove_file(&path).map_err(|e| queue_err(&path, e))
    }

    /// Per-stage record counts.
    pub fn counts(&self) -> Result<StageCounts, FerryError> {
        Ok(StageCounts {
            incoming: self.count_stage(Stage::Incoming)?,
            processing: self.count_stage(Stage::Processing)?,
            outgoing: self.count_stage(Stage::Outgoing)?,
        })
    }

    fn count_stage(&self, stage: Stage) -> Result<usize, FerryError> {
        let dir = self.stage_dir(stage);
        let mut count = 0;
        for entry in fs::read_dir(&dir).map_err(|e| queue_err(&dir, e))? {
            let entry = entry.map_err(|e| queue_err(&dir, e))?;
            if entry.file_name().to_string_lossy().ends_with(".json") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Searches all three stages for a record with the given message id.
    ///
    /// `outgoing` is checked first (the terminal, common case), then
    /// `processing`, then `incoming`. Returns `None` when the id is
    /// unknown, either never enqueued or already delivered and cleaned.
    pub fn find(&self, message_id: &str) -> Result<Option<RecordStatus>, FerryError> {
        let outgoing = self.stage_dir(Stage::Outgoing);
        for path in self.stage_files(&outgoing)? {
            if let Ok(response) = self.read_record::<ResponseRecord>(&path)
                && response.message_id == message_id
            {
                return Ok(Some(RecordStatus::Completed(response)));
            }
        }
        let processing = self.stage_dir(Stage::Processing);
        for path in self.stage_files(&processing)? {
            if let Ok(record) = self.read_record::<MessageRecord>(&path)
                && record.message_id == message_id
            {
                return Ok(Some(RecordStatus::Processing(record)));
            }
        }
        let incoming = self.stage_dir(Stage::Incoming);
        for path in self.stage_files(&incoming)? {
            if let Ok(record) = self.read_record::<MessageRecord>(&path)
                && record.message_id == message_id
            {
                return Ok(Some(RecordStatus::Queued(record)));
            }
        }
        Ok(None)
    }

    fn stage_files(&self, dir: &Path) -> Result<Vec<PathBuf>, FerryError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| queue_err(dir, e))? {
            let entry = entry.map_err(|e| queue_err(dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Startup recovery sweep: requeues every record left in `processing`
    /// by a previous crash. Returns the number of records recovered.
    ///
    /// This is mandatory before the processor's first poll; a record
    /// stranded in `processing` would otherwise be silently lost.
    pub fn recover(&self) -> Result<usize, FerryError> {
        let processing = self.stage_dir(Stage::Processing);
        let mut recovered = 0;
        for path in self.stage_files(&processing)? {
            let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            let dest = self.stage_dir(Stage::Incoming).join(&file_name);
            match fs::rename(&path, &dest) {
                Ok(()) => {
                    info!(file = file_name.as_str(), "recovered orphaned record");
                    recovered += 1;
                }
                Err(e) => {
                    warn!(file = file_name.as_str(), error = %e, "failed to recover orphaned record");
                }
            }
        }
        Ok(recovered)
    }

    fn read_record<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<T, FerryError> {
        let raw = fs::read_to_string(path).map_err(|e| queue_err(path, e))?;
        serde_json::from_str(&raw).map_err(|e| FerryError::Codec {
            path: path.display().to_string(),
            source: e,
        })
    }
}

fn queue_err(path: &Path, source: std::io::Error) -> FerryError {
    FerryError::Queue {
        path: path.display().to_string(),
        source,
    }
}
