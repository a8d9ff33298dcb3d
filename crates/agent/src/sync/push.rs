// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Batch push to the remote repository.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::BoxFuture;
use kiosk_core::PendingSyncFile;
use serde::Serialize;

use crate::http::{build_client, ProbeError};

/// Batch pushes carry file contents and may take a while.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a batch was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    /// A file in the batch could not be read.
    #[error("failed to read {path}: {reason}")]
    ReadFile { path: String, reason: String },

    /// The remote answered with a failure.
    #[error("remote rejected batch: {0}")]
    Rejected(String),

    /// The request never completed.
    #[error("push failed: {0}")]
    Request(String),
}

impl From<ProbeError> for PushError {
    fn from(e: ProbeError) -> Self {
        PushError::Request(e.to_string())
    }
}

impl From<reqwest::Error> for PushError {
    fn from(e: reqwest::Error) -> Self {
        PushError::Request(e.to_string())
    }
}

/// The external batch push operation.
pub trait BatchPusher: Send + Sync {
    /// Submits every file in `files` together. All-or-nothing.
    fn push<'a>(
        &'a self,
        files: &'a [PendingSyncFile],
        commit_message: &'a str,
    ) -> BoxFuture<'a, Result<(), PushError>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushRequest<'a> {
    files: Vec<PushFile<'a>>,
    commit_message: &'a str,
}

#[derive(Debug, Serialize)]
struct PushFile<'a> {
    path: &'a str,
    content: String,
}

/// POSTs `{files: [{path, content}], commitMessage}` as JSON.
pub struct HttpBatchPusher {
    client: reqwest::Client,
    url: String,
    /// Relative `file_path`s resolve against this directory.
    content_root: PathBuf,
}

impl HttpBatchPusher {
    pub fn new(url: impl Into<String>, content_root: impl Into<PathBuf>) -> Result<Self, PushError> {
        Ok(HttpBatchPusher {
            client: build_client(PUSH_TIMEOUT)?,
            url: url.into(),
            content_root: content_root.into(),
        })
    }

    async fn read_content(&self, file_path: &str) -> Result<String, PushError> {
        let path = resolve(&self.content_root, file_path);
        tokio::fs::read_to_string(&path).await.map_err(|e| PushError::ReadFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

fn resolve(root: &Path, file_path: &str) -> PathBuf {
    let path = Path::new(file_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

impl BatchPusher for HttpBatchPusher {
    fn push<'a>(
        &'a self,
        files: &'a [PendingSyncFile],
        commit_message: &'a str,
    ) -> BoxFuture<'a, Result<(), PushError>> {
        Box::pin(async move {
            let mut batch = Vec::with_capacity(files.len());
            for file in files {
                batch.push(PushFile {
                    path: &file.file_path,
                    content: self.read_content(&file.file_path).await?,
                });
            }
            let request = PushRequest { files: batch, commit_message };

            let response = self.client.post(&self.url).json(&request).send().await?;
            let status = response.status();
            if status.is_success() {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            let detail = body.trim();
            Err(PushError::Rejected(if detail.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {}", status.as_u16(), detail)
            }))
        })
    }
}
