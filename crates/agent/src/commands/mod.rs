// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot CLI commands.

pub mod auto_sync;
pub mod check;
pub mod sync;

use std::future::Future;

use crate::error::{Error, Result};

/// Runs `fut` to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))?;
    Ok(rt.block_on(fut))
}
