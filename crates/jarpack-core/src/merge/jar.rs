//! Jar-backed mergeable unit.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;
use zip::ZipArchive;

use crate::archive::PackOutput;
use crate::error::{MergeError, MergeResult};
use crate::merge::{FileFilter, MergeFile};
use crate::paths::{JAR_SEPARATOR, collapse_slashes, normalize_entry_name, to_posix};

/// A mergeable unit selecting entries of an existing jar/zip archive.
///
/// The internal path names the entry or entry prefix to take from the
/// source jar; matched entries are re-homed under the destination, with
/// the portion after the internal path preserved as the suffix. Directory
/// entries and jar signature files are never copied.
#[derive(Debug, Clone)]
pub struct JarMerge {
    jar: PathBuf,
    destination: String,
    pattern: Regex,
}

impl JarMerge {
    /// Create a unit keeping matched entries at their original paths.
    ///
    /// An empty internal path selects every entry of the jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry selection pattern cannot be built.
    pub fn new(jar: impl Into<PathBuf>, internal_path: &str) -> MergeResult<Self> {
        let internal = Self::normalize_internal(internal_path);
        let pattern = Self::entry_pattern(&internal)?;
        Ok(Self {
            jar: jar.into(),
            destination: internal,
            pattern,
        })
    }

    /// Create a unit re-homing matched entries under `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry selection pattern cannot be built.
    pub fn with_destination(
        jar: impl Into<PathBuf>,
        internal_path: &str,
        destination: impl Into<String>,
    ) -> MergeResult<Self> {
        let internal = Self::normalize_internal(internal_path);
        Ok(Self {
            jar: jar.into(),
            destination: destination.into(),
            pattern: Self::entry_pattern(&internal)?,
        })
    }

    /// Filesystem path to the source jar.
    pub fn jar_path(&self) -> &Path {
        &self.jar
    }

    fn normalize_internal(internal_path: &str) -> String {
        collapse_slashes(internal_path.trim_start_matches('/'))
    }

    /// Build the selection regex: everything after the internal path is
    /// captured as the destination suffix. The literal part is escaped so
    /// `$` in inner-class names cannot poison matching.
    fn entry_pattern(internal: &str) -> MergeResult<Regex> {
        let pattern = if internal.is_empty() {
            "^(.*)$".to_string()
        } else if internal.ends_with('/') {
            format!("^{}(.*)$", regex::escape(internal))
        } else {
            format!("^{}/*(.*)$", regex::escape(internal))
        };
        Ok(Regex::new(&pattern)?)
    }

    /// Jar signature files must not be carried into the merged archive;
    /// the output is repackaged content and any original signature would
    /// be invalid anyway.
    fn is_signature(name: &str) -> bool {
        let Some(rest) = name.trim_start_matches('/').strip_prefix("META-INF/") else {
            return false;
        };
        rest.starts_with("SIG-")
            || rest.ends_with(".SF")
            || rest.ends_with(".DSA")
            || rest.ends_with(".RSA")
    }

    fn destination_for(&self, suffix: &str) -> String {
        let mut dest = self.destination.clone();
        if !suffix.is_empty() {
            if !dest.is_empty() && !dest.ends_with('/') {
                dest.push('/');
            }
            dest.push_str(suffix);
        }
        normalize_entry_name(&dest)
    }

    fn open(&self) -> MergeResult<ZipArchive<BufReader<File>>> {
        let file = File::open(&self.jar).map_err(|err| MergeError::source_read(&self.jar, err))?;
        Ok(ZipArchive::new(BufReader::new(file))?)
    }

    /// Stream every matching leaf entry of the source jar into the output
    /// archive, preserving each entry's last-modified timestamp.
    ///
    /// # Errors
    ///
    /// Any I/O error on the source jar is fatal to the operation: a
    /// missing or unreadable source indicates a broken search path and
    /// must abort the merge rather than silently drop content.
    pub fn merge<W: io::Write + io::Seek>(&self, out: &mut PackOutput<W>) -> MergeResult<()> {
        let mut archive = self.open()?;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if Self::is_signature(&name) {
                continue;
            }
            let Some(captures) = self.pattern.captures(&name) else {
                continue;
            };
            let suffix = captures.get(1).map_or("", |m| m.as_str());
            let dest = self.destination_for(suffix);
            debug!(jar = %to_posix(&self.jar), entry = %name, dest = %dest, "merging jar entry");
            let modified = entry.last_modified();
            out.add_entry(&dest, Some(modified), &mut entry)?;
        }
        Ok(())
    }

    /// Every entry name of the source jar, in archive order.
    ///
    /// # Errors
    ///
    /// Returns an error when the source jar cannot be read.
    pub fn entry_names(&self) -> MergeResult<Vec<String>> {
        let mut archive = self.open()?;
        let mut names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            names.push(archive.by_index_raw(index)?.name().to_string());
        }
        Ok(names)
    }

    /// Locate the first leaf entry accepted by the filter.
    ///
    /// Entries are offered as synthetic `<jar>!/<entry>` files; directory
    /// entries pass through the filter but are never returned themselves.
    ///
    /// # Errors
    ///
    /// Returns an error when the source jar cannot be read.
    pub fn find(&self, filter: &FileFilter<'_>) -> MergeResult<Option<MergeFile>> {
        for name in self.entry_names()? {
            let candidate = self.synthetic_file(&name);
            if filter(&candidate) && !candidate.is_dir {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// List every entry accepted by the filter, as synthetic files.
    ///
    /// # Errors
    ///
    /// Returns an error when the source jar cannot be read.
    pub fn list_files(&self, filter: &FileFilter<'_>) -> MergeResult<Vec<MergeFile>> {
        let mut result = Vec::new();
        for name in self.entry_names()? {
            let candidate = self.synthetic_file(&name);
            if filter(&candidate) {
                result.push(candidate);
            }
        }
        Ok(result)
    }

    fn synthetic_file(&self, entry_name: &str) -> MergeFile {
        MergeFile {
            path: format!("{}{JAR_SEPARATOR}{entry_name}", to_posix(&self.jar)),
            is_dir: entry_name.ends_with('/'),
        }
    }
}
