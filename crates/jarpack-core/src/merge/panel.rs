//! Composite mergeable unit bundling a panel class with its resources.

use std::io;

use crate::archive::PackOutput;
use crate::error::MergeResult;
use crate::merge::{FileFilter, MergeFile, Mergeable};
use crate::paths::package_to_path;

/// Everything needed to package one panel class: the units covering its
/// package directory (class files plus resource siblings), in resolution
/// order.
///
/// All operations delegate to the members in order; the first non-empty
/// `find` result wins.
#[derive(Debug)]
pub struct PanelMerge {
    class_name: String,
    members: Vec<Mergeable>,
}

impl PanelMerge {
    /// Bundle the given member units under a fully qualified panel class
    /// name. Constructed by
    /// [`PathResolver::panel_merge`](crate::resolver::PathResolver::panel_merge).
    pub fn new(class_name: impl Into<String>, members: Vec<Mergeable>) -> Self {
        Self {
            class_name: class_name.into(),
            members,
        }
    }

    /// The fully qualified (dotted) panel class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Slash path of the panel's package, with a trailing slash.
    pub fn package_path(&self) -> String {
        match self.class_name.rsplit_once('.') {
            Some((package, _)) => package_to_path(package),
            None => String::new(),
        }
    }

    /// The member units, in resolution order.
    pub fn members(&self) -> &[Mergeable] {
        &self.members
    }

    /// Merge every member in order into the output archive.
    ///
    /// # Errors
    ///
    /// Returns the first member error encountered.
    pub fn merge<W: io::Write + io::Seek>(&self, out: &mut PackOutput<W>) -> MergeResult<()> {
        for member in &self.members {
            member.merge(out)?;
        }
        Ok(())
    }

    /// First matching file across the members, in registration order.
    ///
    /// # Errors
    ///
    /// Returns the first member error encountered.
    pub fn find(&self, filter: &FileFilter<'_>) -> MergeResult<Option<MergeFile>> {
        for member in &self.members {
            if let Some(found) = member.find(filter)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// All matching files across the members.
    ///
    /// # Errors
    ///
    /// Returns the first member error encountered.
    pub fn list_files(&self, filter: &FileFilter<'_>) -> MergeResult<Vec<MergeFile>> {
        let mut result = Vec::new();
        for member in &self.members {
            result.extend(member.list_files(filter)?);
        }
        Ok(result)
    }

    /// Locate the panel's own `.class` file inside the bundle, for
    /// front-ends that need to read panel metadata.
    ///
    /// # Errors
    ///
    /// Returns the first member error encountered.
    pub fn panel_class_file(&self) -> MergeResult<Option<MergeFile>> {
        let simple = self
            .class_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.class_name);
        let wanted = format!("{simple}.class");
        self.find(&|f| f.is_dir || f.name() == wanted)
    }
}
