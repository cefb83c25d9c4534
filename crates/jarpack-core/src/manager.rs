//! Merge orchestration: accumulate resolution requests, build once.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::archive::{PackOptions, PackOutput};
use crate::error::MergeResult;
use crate::merge::Mergeable;
use crate::resolver::{PathResolver, ResolvedPath};

/// Accumulates mergeable units and streams them all into one output
/// archive.
///
/// Registration is resolution-eager: each `add_*` call resolves its path
/// immediately, so a broken reference fails at the call site rather than
/// at build time. Registering overlapping content is expected — every
/// panel requests its own package — and harmless, because the shared
/// [`PackOutput`] skips entry names that were already written
/// (first writer in registration order wins).
///
/// A manager is confined to one build: [`MergeManager::merge`] consumes
/// it, along with every registered unit. Not thread-safe.
#[derive(Debug)]
pub struct MergeManager {
    resolver: PathResolver,
    options: PackOptions,
    work: Vec<ResolvedPath>,
}

impl MergeManager {
    /// Create a manager with default (best) compression.
    pub fn new(resolver: PathResolver) -> Self {
        Self::with_options(resolver, PackOptions::default())
    }

    /// Create a manager with explicit output settings.
    pub fn with_options(resolver: PathResolver, options: PackOptions) -> Self {
        Self {
            resolver,
            options,
            work: Vec::new(),
        }
    }

    /// The resolver used for registration.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Number of registered resolution results.
    pub fn len(&self) -> usize {
        self.work.len()
    }

    /// True when nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.work.is_empty()
    }

    /// Resolve a symbolic path and register every resulting unit.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MergeError::Resolution`] when the path matches
    /// nothing on the search path.
    pub fn add_resource(&mut self, path: &str) -> MergeResult<()> {
        let resolved = self.resolver.resolved(path, None)?;
        debug!(path, units = resolved.units.len(), "registered resource");
        self.work.push(resolved);
        Ok(())
    }

    /// Resolve a symbolic path and register it re-homed under an explicit
    /// destination.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MergeError::Resolution`] when the path matches
    /// nothing on the search path.
    pub fn add_resource_with_destination(
        &mut self,
        path: &str,
        destination: &str,
    ) -> MergeResult<()> {
        let resolved = self.resolver.resolved(path, Some(destination))?;
        debug!(
            path,
            destination,
            units = resolved.units.len(),
            "registered resource"
        );
        self.work.push(resolved);
        Ok(())
    }

    /// Resolve a panel class name (short or fully qualified) and register
    /// its bundle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MergeError::Resolution`] when the panel class or
    /// its package cannot be found.
    pub fn add_panel(&mut self, name: &str) -> MergeResult<()> {
        let bundle = self.resolver.panel_merge(name)?;
        self.work.push(ResolvedPath {
            path: name.to_string(),
            units: vec![bundle],
        });
        Ok(())
    }

    /// Register an already-constructed unit.
    pub fn add_mergeable(&mut self, source: &str, unit: Mergeable) {
        self.work.push(ResolvedPath {
            path: source.to_string(),
            units: vec![unit],
        });
    }

    /// Stream every registered unit, in registration order, into one
    /// output archive, then finalize it.
    ///
    /// For any two units that would produce an entry with the same name,
    /// the archive contains exactly one such entry: the first encountered.
    /// Content is never compared; this is a name-based policy.
    ///
    /// # Errors
    ///
    /// Any source read or archive write error aborts the build. The
    /// partially written output is left in an indeterminate state and
    /// should be discarded by the caller.
    pub fn merge<W: Write + Seek>(self, out: W) -> MergeResult<W> {
        let mut pack = PackOutput::with_options(out, self.options);
        info!(resources = self.work.len(), "merging registered resources");
        for resolved in &self.work {
            debug!(path = %resolved.path, units = resolved.units.len(), "merging resource");
            for unit in &resolved.units {
                unit.merge(&mut pack)?;
            }
        }
        pack.finish()
    }

    /// Build the archive at the given filesystem path.
    ///
    /// # Errors
    ///
    /// As [`MergeManager::merge`]; on failure the partially written file
    /// is left on disk for the caller to discard.
    pub fn merge_to_file(self, path: &Path) -> MergeResult<()> {
        let file = File::create(path)?;
        self.merge(file)?;
        Ok(())
    }
}
