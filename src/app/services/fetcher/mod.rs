//! Page fetching
//!
//! The pipeline only needs raw page text. [`PageSource`] is that capability;
//! [`HttpPageSource`] fetches the live page with randomized headers and
//! retry-with-backoff, [`FilePageSource`] reads a saved copy from disk.

pub mod http;
pub mod retry;

use crate::{Error, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use http::HttpPageSource;
pub use retry::Backoff;

/// Something that yields the raw text of the ranking page
pub trait PageSource: Send + Sync {
    /// Fetch the page text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] once all attempts are exhausted, or another
    /// error variant for failures that are not worth retrying.
    fn fetch(&self) -> impl Future<Output = Result<String>> + Send;

    /// Where the page comes from, for log messages
    fn describe(&self) -> String;
}

/// Reads a previously saved ranking page
#[derive(Debug, Clone)]
pub struct FilePageSource {
    path: PathBuf,
}

impl FilePageSource {
    /// Create a source for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the saved page
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for FilePageSource {
    async fn fetch(&self) -> Result<String> {
        debug!("Reading saved page from {}", self.path.display());
        tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::io(
                format!("failed to read saved page {}", self.path.display()),
                e,
            )
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
