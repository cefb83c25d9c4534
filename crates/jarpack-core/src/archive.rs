//! Output archive adapter.
//!
//! [`PackOutput`] wraps the zip writer that every mergeable unit streams
//! into during one build. It owns two responsibilities the units must not
//! carry themselves:
//!
//! - **Duplicate suppression**: a registry of already-written entry names.
//!   The first writer of a name wins; later writes of the same name are
//!   silently skipped. This makes re-registering the same resource from
//!   several front-end calls idempotent instead of corrupting the archive.
//! - **Close ownership**: units receive `&mut PackOutput` and cannot close
//!   the underlying stream; only [`PackOutput::finish`] (called once by the
//!   orchestrator) finalizes the archive.

use std::collections::HashSet;
use std::io::{Read, Seek, Write};
use std::time::SystemTime;

use chrono::{Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::MergeResult;
use crate::paths::normalize_entry_name;

/// Default deflate level: best compression.
const BEST_COMPRESSION: i64 = 9;

/// Output archive settings carried by front-end configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackOptions {
    /// Deflate level in `[0, 9]`, applied uniformly to the whole archive.
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
}

fn default_compression_level() -> i64 {
    BEST_COMPRESSION
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            compression_level: BEST_COMPRESSION,
        }
    }
}

impl PackOptions {
    /// Create options with the given deflate level, clamped to `[0, 9]`.
    pub fn with_compression_level(level: i64) -> Self {
        Self {
            compression_level: level.clamp(0, BEST_COMPRESSION),
        }
    }
}

/// Shared output archive for one build.
///
/// Created and finished exactly once per build; mergeable units borrow it
/// to add entries and never see the underlying stream.
pub struct PackOutput<W: Write + Seek> {
    writer: ZipWriter<W>,
    written: HashSet<String>,
    options: PackOptions,
}

impl<W: Write + Seek> std::fmt::Debug for PackOutput<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackOutput")
            .field("written", &self.written.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Seek> PackOutput<W> {
    /// Open an output archive with default (best) compression.
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, PackOptions::default())
    }

    /// Open an output archive with explicit settings.
    pub fn with_options(inner: W, options: PackOptions) -> Self {
        Self {
            writer: ZipWriter::new(inner),
            written: HashSet::new(),
            options,
        }
    }

    /// True when an entry with this name has already been written.
    pub fn contains(&self, name: &str) -> bool {
        self.written.contains(&normalize_entry_name(name))
    }

    /// Names written so far, in no particular order.
    pub fn written(&self) -> impl Iterator<Item = &str> {
        self.written.iter().map(String::as_str)
    }

    /// Stream one entry into the archive.
    ///
    /// The name is normalized (duplicate slashes collapsed, leading slash
    /// stripped) before it is recorded or written. Returns `false` without
    /// writing anything when the name was already written by an earlier
    /// unit; that skip is deliberate and not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails or the source
    /// reader cannot be copied.
    pub fn add_entry<R: Read>(
        &mut self,
        name: &str,
        modified: Option<zip::DateTime>,
        reader: &mut R,
    ) -> MergeResult<bool> {
        let name = normalize_entry_name(name);
        if !self.written.insert(name.clone()) {
            debug!(entry = %name, "skipping duplicate entry");
            return Ok(false);
        }
        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.options.compression_level));
        if let Some(modified) = modified {
            options = options.last_modified_time(modified);
        }
        self.writer.start_file(name, options)?;
        std::io::copy(reader, &mut self.writer)?;
        Ok(true)
    }

    /// Finalize the archive and hand back the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the central directory cannot be written.
    pub fn finish(mut self) -> MergeResult<W> {
        Ok(self.writer.finish()?)
    }
}

/// Convert a filesystem timestamp to a zip timestamp.
///
/// Returns `None` for timestamps the zip format cannot represent (before
/// 1980); callers then fall back to the writer's default.
pub(crate) fn zip_datetime(modified: SystemTime) -> Option<zip::DateTime> {
    let local: chrono::DateTime<Local> = modified.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn first_writer_wins() {
        let mut out = PackOutput::new(Cursor::new(Vec::new()));
        assert!(out.add_entry("pkg/a.txt", None, &mut &b"first"[..]).unwrap());
        assert!(!out.add_entry("pkg/a.txt", None, &mut &b"second"[..]).unwrap());
        assert!(out.contains("pkg/a.txt"));

        let bytes = out.finish().unwrap().into_inner();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut content = String::new();
        archive
            .by_index(0)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn entry_names_are_normalized() {
        let mut out = PackOutput::new(Cursor::new(Vec::new()));
        out.add_entry("/dest//sub/a.txt", None, &mut &b"x"[..]).unwrap();
        // the normalized form is the same entry
        assert!(!out.add_entry("dest/sub/a.txt", None, &mut &b"y"[..]).unwrap());

        let names = read_names(out.finish().unwrap().into_inner());
        assert_eq!(names, vec!["dest/sub/a.txt".to_string()]);
    }

    #[test]
    fn stored_level_zero_is_accepted() {
        let options = PackOptions::with_compression_level(-3);
        assert_eq!(options.compression_level, 0);
        let mut out = PackOutput::with_options(Cursor::new(Vec::new()), options);
        out.add_entry("a.txt", None, &mut &b"payload"[..]).unwrap();
        let names = read_names(out.finish().unwrap().into_inner());
        assert_eq!(names, vec!["a.txt".to_string()]);
    }

    #[test]
    fn pre_epoch_timestamp_is_rejected() {
        assert!(zip_datetime(SystemTime::UNIX_EPOCH).is_none());
    }
}
