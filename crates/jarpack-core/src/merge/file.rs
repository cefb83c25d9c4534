//! File-backed mergeable unit.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::archive::{PackOutput, zip_datetime};
use crate::error::{MergeError, MergeResult};
use crate::merge::{FileFilter, MergeFile};
use crate::paths::{is_exact_destination, normalize_entry_name, to_posix};

/// A mergeable unit backed by a loose file or directory on disk.
///
/// Directory sources are merged file by file; directories themselves are
/// never written as archive entries. Entry names are computed from the
/// destination override, see [`FileMerge::with_destination`].
#[derive(Debug, Clone)]
pub struct FileMerge {
    source: PathBuf,
    destination: String,
}

impl FileMerge {
    /// Create a unit with no destination override.
    ///
    /// Entry names are the source's path relative to its parent directory,
    /// so a directory source keeps its own name as the top-level prefix.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self::with_destination(source, String::new())
    }

    /// Create a unit with a destination override.
    ///
    /// Three cases, in priority order:
    /// 1. a destination not ending in `/` names one exact output entry,
    ///    used verbatim regardless of the source file's own name;
    /// 2. an empty destination keeps paths relative to the source's
    ///    parent directory;
    /// 3. a destination ending in `/` prefixes every file's path relative
    ///    to the merge root (the source directory itself).
    pub fn with_destination(source: impl Into<PathBuf>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// The backing filesystem path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Stream the backing file, or every descendant file of the backing
    /// directory, into the output archive.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::SourceRead`] when the source or one of its
    /// descendants cannot be read.
    pub fn merge<W: io::Write + io::Seek>(&self, out: &mut PackOutput<W>) -> MergeResult<()> {
        if self.source.is_dir() {
            // Sorted traversal keeps archive contents deterministic.
            for entry in WalkDir::new(&self.source).sort_by_file_name() {
                let entry = entry.map_err(|err| {
                    let path = err
                        .path()
                        .map_or_else(|| self.source.clone(), Path::to_path_buf);
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("directory cycle"));
                    MergeError::source_read(path, source)
                })?;
                if entry.file_type().is_dir() {
                    continue;
                }
                self.copy_into(entry.path(), out)?;
            }
            Ok(())
        } else {
            self.copy_into(&self.source, out)
        }
    }

    fn copy_into<W: io::Write + io::Seek>(
        &self,
        file: &Path,
        out: &mut PackOutput<W>,
    ) -> MergeResult<()> {
        let name = self.entry_name(file);
        let metadata =
            std::fs::metadata(file).map_err(|err| MergeError::source_read(file, err))?;
        let modified = metadata.modified().ok().and_then(zip_datetime);
        let mut reader = File::open(file).map_err(|err| MergeError::source_read(file, err))?;
        debug!(file = %to_posix(file), entry = %name, "merging file");
        out.add_entry(&name, modified, &mut reader)?;
        Ok(())
    }

    /// Compute the archive entry name for one file of this unit.
    fn entry_name(&self, file: &Path) -> String {
        if is_exact_destination(&self.destination) {
            return normalize_entry_name(&self.destination);
        }
        // A directory-style destination re-homes paths relative to the
        // merge root; otherwise paths stay relative to the source's parent
        // so the source keeps its own name.
        let base = if self.source.is_dir() && !self.destination.is_empty() {
            self.source.as_path()
        } else {
            self.source.parent().unwrap_or_else(|| Path::new(""))
        };
        let relative = file.strip_prefix(base).map_or_else(|_| to_posix(file), to_posix);
        normalize_entry_name(&format!("{}{relative}", self.destination))
    }

    /// Depth-first pre-order search for the first file accepted by the
    /// filter. Directories must be accepted by the filter to be descended
    /// into; only leaf files are returned.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::SourceRead`] when a directory cannot be read.
    pub fn find(&self, filter: &FileFilter<'_>) -> MergeResult<Option<MergeFile>> {
        Self::find_in(&self.source, filter)
    }

    fn find_in(current: &Path, filter: &FileFilter<'_>) -> MergeResult<Option<MergeFile>> {
        if current.is_dir() {
            for child in Self::sorted_children(current)? {
                let candidate = Self::merge_file_of(&child);
                if !filter(&candidate) {
                    continue;
                }
                if let Some(found) = Self::find_in(&child, filter)? {
                    return Ok(Some(found));
                }
            }
            Ok(None)
        } else {
            Ok(Some(Self::merge_file_of(current)))
        }
    }

    /// List every file (and accepted directory) under this unit matching
    /// the filter. Directories rejected by the filter are not descended.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::SourceRead`] when a directory cannot be read.
    pub fn list_files(&self, filter: &FileFilter<'_>) -> MergeResult<Vec<MergeFile>> {
        let mut result = Vec::new();
        Self::list_in(&self.source, filter, &mut result)?;
        Ok(result)
    }

    fn list_in(
        current: &Path,
        filter: &FileFilter<'_>,
        result: &mut Vec<MergeFile>,
    ) -> MergeResult<()> {
        if current.is_dir() {
            for child in Self::sorted_children(current)? {
                let candidate = Self::merge_file_of(&child);
                if !filter(&candidate) {
                    continue;
                }
                let descend = candidate.is_dir;
                result.push(candidate);
                if descend {
                    Self::list_in(&child, filter, result)?;
                }
            }
        } else {
            result.push(Self::merge_file_of(current));
        }
        Ok(())
    }

    fn sorted_children(dir: &Path) -> MergeResult<Vec<PathBuf>> {
        let entries =
            std::fs::read_dir(dir).map_err(|err| MergeError::source_read(dir, err))?;
        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| MergeError::source_read(dir, err))?;
            children.push(entry.path());
        }
        children.sort();
        Ok(children)
    }

    fn merge_file_of(path: &Path) -> MergeFile {
        MergeFile {
            path: to_posix(path),
            is_dir: path.is_dir(),
        }
    }
}
