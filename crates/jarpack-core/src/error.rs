//! Error taxonomy for the merge/packaging pipeline.
//!
//! Every failure a front-end (compiler, installer bootstrap) can see is a
//! [`MergeError`], so callers catch one family and report a build failure
//! with the original cause attached. Nothing in this crate retries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while resolving resources or building an archive.
#[derive(Error, Debug)]
pub enum MergeError {
    /// A symbolic path matched nothing on the search path or in any jar.
    ///
    /// An empty resolution is always reported as this error, never as an
    /// empty success result.
    #[error("the path '{path}' is not present on the search path\ncurrent search path:\n{search_path}")]
    Resolution {
        /// The symbolic path that failed to resolve.
        path: String,
        /// Rendering of the search path, one root per line.
        search_path: String,
    },

    /// An I/O error opening or reading a merge source (file or jar).
    ///
    /// Fatal to the whole build: a missing or unreadable source indicates a
    /// broken search path, so content is never silently dropped.
    #[error("failed to read merge source '{path}': {source}")]
    SourceRead {
        /// The file or jar that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A location spec could not be decomposed into an archive path and an
    /// internal entry path.
    #[error("cannot decompose '{0}' into an archive path and an internal path")]
    MalformedLocation(String),

    /// An internal-path selection pattern failed to compile.
    #[error("invalid entry selection pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The underlying archive writer or reader reported an error.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An I/O error on the output archive.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl MergeError {
    /// Wrap an I/O error with the source path it occurred on.
    pub fn source_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SourceRead {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type MergeResult<T> = Result<T, MergeError>;
