//! Concrete resource locations produced by path resolution.
//!
//! A [`Location`] is the resolved form of a symbolic resource path: either
//! a plain filesystem path, or an entry (or entry prefix) inside a jar.
//! It replaces the classloader URLs of the original system with an explicit
//! parsed value.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::MergeResult;
use crate::paths::{JAR_SEPARATOR, split_jar_spec, to_posix};

/// A concrete place content can be read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// A loose file or directory on the filesystem.
    File(PathBuf),
    /// An entry, or entry prefix, inside an existing jar/zip archive.
    JarEntry {
        /// Filesystem path to the archive.
        jar: PathBuf,
        /// Path inside the archive. Empty means the whole archive; a
        /// trailing slash means a directory-style prefix.
        entry: String,
    },
}

impl Location {
    /// Parse a location spec.
    ///
    /// Specs containing the `!/` marker (optionally prefixed with
    /// `jar:file:` or `file:`) become [`Location::JarEntry`]; anything else
    /// is a plain [`Location::File`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::MergeError::MalformedLocation`] when a jar-style
    /// spec cannot be decomposed.
    pub fn parse(spec: &str) -> MergeResult<Self> {
        if spec.contains(JAR_SEPARATOR) {
            let (jar, entry) = split_jar_spec(spec)?;
            Ok(Self::JarEntry {
                jar: PathBuf::from(jar),
                entry,
            })
        } else {
            Ok(Self::File(PathBuf::from(
                spec.strip_prefix("file:").unwrap_or(spec),
            )))
        }
    }

    /// True when the location points inside an archive.
    pub fn is_jar_entry(&self) -> bool {
        matches!(self, Self::JarEntry { .. })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", to_posix(path)),
            Self::JarEntry { jar, entry } => {
                write!(f, "{}{JAR_SEPARATOR}{entry}", to_posix(jar))
            }
        }
    }
}

/// Check whether a file is a readable zip/jar archive.
///
/// Opens the file and validates the central directory; any failure means
/// "not a jar" rather than an error, since search roots may legitimately
/// be plain files.
pub fn is_zip_file(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    zip::ZipArchive::new(file).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_jar_entry() {
        let loc = Location::parse("jar:file:/opt/app.jar!/com/pkg/").unwrap();
        assert_eq!(
            loc,
            Location::JarEntry {
                jar: PathBuf::from("/opt/app.jar"),
                entry: "com/pkg/".to_string(),
            }
        );
        assert!(loc.is_jar_entry());
        assert_eq!(loc.to_string(), "/opt/app.jar!/com/pkg/");
    }

    #[test]
    fn parse_plain_file() {
        let loc = Location::parse("/opt/classes/Foo.class").unwrap();
        assert_eq!(loc, Location::File(PathBuf::from("/opt/classes/Foo.class")));
        assert!(!loc.is_jar_entry());
    }

    #[test]
    fn non_archive_is_not_zip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("notajar.txt");
        std::fs::write(&plain, b"plain text").unwrap();
        assert!(!is_zip_file(&plain));
        assert!(!is_zip_file(&dir.path().join("missing.jar")));
    }
}
