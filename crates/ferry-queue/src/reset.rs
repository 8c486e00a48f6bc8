// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable conversation-reset flag.
//!
//! A `reset.flag` marker file in the queue root records that the next
//! provider invocation must start a fresh context. Existence is the only
//! state; the file's contents are irrelevant. Because the flag lives on
//! disk it survives restarts: a reset requested just before a crash is
//! still honored when the router comes back.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ferry_core::FerryError;

const FLAG_NAME: &str = "reset.flag";

/// Flag handle rooted in the queue directory.
#[derive(Debug, Clone)]
pub struct ResetFlag {
    path: PathBuf,
}

impl ResetFlag {
    pub fn new(queue_root: impl AsRef<Path>) -> Self {
        Self {
            path: queue_root.as_ref().join(FLAG_NAME),
        }
    }

    /// Raises the flag. Idempotent: raising an already-raised flag is fine.
    pub fn set(&self) -> Result<(), FerryError> {
        fs::write(&self.path, b"").map_err(|e| FerryError::Queue {
            path: self.path.display().to_string(),
            source: e,
        })?;
        info!("context reset requested");
        Ok(())
    }

    /// Whether the flag is currently raised, without clearing it.
    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    /// Clears the flag and reports whether it was raised.
    ///
    /// This is the consume side: the processor calls it once per claimed
    /// record, so a single reset request affects exactly one invocation.
    pub fn take(&self) -> Result<bool, FerryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("context reset flag consumed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FerryError::Queue {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }
}
