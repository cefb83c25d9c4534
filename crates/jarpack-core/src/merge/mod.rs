//! Mergeable units: self-contained descriptions of content that can
//! stream itself into a shared output archive.
//!
//! Three variants cover every source the resolver can produce: a loose
//! file or directory ([`FileMerge`]), a subset of an existing jar
//! ([`JarMerge`]), and an ordered bundle of other units packaging a panel
//! class with its resources ([`PanelMerge`]). The variants share one
//! `merge`/`find`/`list_files` contract through the [`Mergeable`] enum.

pub mod file;
pub mod jar;
pub mod panel;

use std::io::{Seek, Write};

pub use file::FileMerge;
pub use jar::JarMerge;
pub use panel::PanelMerge;

use crate::archive::PackOutput;
use crate::error::MergeResult;

/// A file as seen by merge filters: either a real path on disk or a
/// synthetic `path/to.jar!/entry` view of an archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFile {
    /// Posix-style path. For archive entries this is
    /// `<jar path>!/<entry name>`.
    pub path: String,
    /// True for directories and directory-style archive entries.
    pub is_dir: bool,
}

impl MergeFile {
    /// Last path component (the file name).
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.path)
    }
}

/// Predicate applied to files during `find`/`list_files`.
///
/// Directories are offered to the filter as traversal candidates; a filter
/// that should descend everywhere while matching one file name typically
/// accepts `f.is_dir || f.name() == wanted`.
pub type FileFilter<'a> = dyn Fn(&MergeFile) -> bool + 'a;

/// A mergeable unit: one resolved source of archive content.
///
/// Units are cheap to construct, hold no open file handles between
/// creation and merge, and are consumed by streaming into a
/// [`PackOutput`] exactly once per build.
#[derive(Debug)]
pub enum Mergeable {
    /// A loose file or directory on disk.
    File(FileMerge),
    /// A selection of entries inside an existing jar.
    Jar(JarMerge),
    /// A panel bundle delegating to member units.
    Panel(PanelMerge),
}

impl Mergeable {
    /// Stream this unit's content into the output archive.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing source cannot be read or the
    /// output archive cannot be written. Duplicate entry names are skipped
    /// silently, never reported as errors.
    pub fn merge<W: Write + Seek>(&self, out: &mut PackOutput<W>) -> MergeResult<()> {
        match self {
            Self::File(unit) => unit.merge(out),
            Self::Jar(unit) => unit.merge(out),
            Self::Panel(unit) => unit.merge(out),
        }
    }

    /// Locate the first file in this unit accepted by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing source cannot be enumerated.
    pub fn find(&self, filter: &FileFilter<'_>) -> MergeResult<Option<MergeFile>> {
        match self {
            Self::File(unit) => unit.find(filter),
            Self::Jar(unit) => unit.find(filter),
            Self::Panel(unit) => unit.find(filter),
        }
    }

    /// List every file in this unit accepted by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing source cannot be enumerated.
    pub fn list_files(&self, filter: &FileFilter<'_>) -> MergeResult<Vec<MergeFile>> {
        match self {
            Self::File(unit) => unit.list_files(filter),
            Self::Jar(unit) => unit.list_files(filter),
            Self::Panel(unit) => unit.list_files(filter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_file_name_handles_jar_entries() {
        let file = MergeFile {
            path: "/opt/app.jar!/com/pkg/Foo.class".to_string(),
            is_dir: false,
        };
        assert_eq!(file.name(), "Foo.class");

        let dir = MergeFile {
            path: "com/pkg/".to_string(),
            is_dir: true,
        };
        assert_eq!(dir.name(), "pkg");
    }
}
