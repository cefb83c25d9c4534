//! Symbolic path resolution against an explicit search path.
//!
//! The search path is the universe every lookup runs over: an ordered list
//! of roots, each either a directory of loose resources or a jar file.
//! [`PathResolver`] turns a symbolic resource path (a class file, a
//! package, an arbitrary resource) into concrete [`Location`]s and from
//! those into [`Mergeable`] units, applying destination re-homing.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{MergeError, MergeResult};
use crate::location::Location;
use crate::merge::{FileMerge, JarMerge, MergeFile, Mergeable, PanelMerge};
use crate::paths::{class_name_from_resource, normalize_entry_name, package_to_path, to_posix};

/// Default package prefix tried for unqualified panel class names.
pub const DEFAULT_PANEL_PACKAGE: &str = "org.jarpack.panels";

/// The effective search path: directories of loose resources and jar
/// files, in lookup order.
///
/// Built explicitly by the front-end; nothing here consumes environment
/// variables or configuration files.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// Build a search path from root paths, in lookup order.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// The roots, in lookup order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Append another root.
    pub fn push(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Human-readable rendering, one root per line. Embedded in
    /// resolution errors so "not found" reports what was searched.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for root in &self.roots {
            out.push_str(&to_posix(root));
            out.push('\n');
        }
        out
    }
}

/// One resolution result: the symbolic path that was requested and the
/// units it produced. A request may legitimately produce several units,
/// e.g. a package split across multiple jars and directories.
#[derive(Debug)]
pub struct ResolvedPath {
    /// The symbolic path as requested.
    pub path: String,
    /// The mergeable units the path resolved to, in search-path order.
    pub units: Vec<Mergeable>,
}

/// Resolves symbolic resource paths to locations and mergeable units.
#[derive(Debug, Clone)]
pub struct PathResolver {
    search: SearchPath,
    panel_package: String,
}

impl PathResolver {
    /// Create a resolver over the given search path, with the default
    /// panel package convention.
    pub fn new(search: SearchPath) -> Self {
        Self {
            search,
            panel_package: DEFAULT_PANEL_PACKAGE.to_string(),
        }
    }

    /// Override the package prefix tried for unqualified panel names.
    pub fn with_panel_package(mut self, package: &str) -> Self {
        self.panel_package = package.trim_end_matches(['.', '/']).replace('/', ".");
        self
    }

    /// The search path this resolver operates over.
    pub fn search_path(&self) -> &SearchPath {
        &self.search
    }

    fn panel_package_path(&self) -> String {
        package_to_path(&self.panel_package)
    }

    /// Find every location matching the symbolic path: a verbatim
    /// filesystem path, a file or directory under a directory root, or an
    /// entry/prefix inside a jar root. An empty result is a valid answer
    /// here; [`PathResolver::resolve`] turns it into an error.
    ///
    /// # Errors
    ///
    /// Currently infallible on lookup misses; reserved for future I/O
    /// propagation. Unreadable jar roots are skipped with a warning.
    pub fn find_resources(&self, path: &str) -> MergeResult<Vec<Location>> {
        let normalized = normalize_entry_name(path);
        let mut result: Vec<Location> = Vec::new();

        // A path that exists verbatim on disk resolves as a file even when
        // no search root contains it.
        let direct = Path::new(path);
        if direct.exists() {
            result.push(Location::File(direct.to_path_buf()));
        }

        for root in self.search.roots() {
            if root.is_dir() {
                let candidate = root.join(normalized.trim_end_matches('/'));
                if candidate.exists() {
                    let location = Location::File(candidate);
                    if !result.contains(&location) {
                        result.push(location);
                    }
                }
            } else if root.is_file() {
                match Self::jar_contains(root, &normalized) {
                    Ok(true) => {
                        let location = Location::JarEntry {
                            jar: root.clone(),
                            entry: normalized.clone(),
                        };
                        if !result.contains(&location) {
                            result.push(location);
                        }
                    }
                    Ok(false) => {}
                    Err(err) => {
                        warn!(root = %to_posix(root), %err, "skipping unreadable search root");
                    }
                }
            }
        }
        debug!(path, matches = result.len(), "searched resource path");
        Ok(result)
    }

    /// True when the jar contains the path, either as an exact entry name
    /// or as a directory prefix of some entry.
    fn jar_contains(jar: &Path, path: &str) -> MergeResult<bool> {
        let file = File::open(jar).map_err(|err| MergeError::source_read(jar, err))?;
        let archive = ZipArchive::new(BufReader::new(file))?;
        let mut prefix = path.trim_end_matches('/').to_string();
        prefix.push('/');
        Ok(archive
            .file_names()
            .any(|name| name == path || name.starts_with(&prefix)))
    }

    /// Resolve a symbolic path to its locations.
    ///
    /// An unqualified name (no `/` or `.` separator) is first tried under
    /// the conventional panel package prefix; if that matches, those
    /// locations are returned.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when neither the loose search
    /// path nor any jar contains a match. Zero matches are always this
    /// explicit failure, never an empty success.
    pub fn resolve(&self, path: &str) -> MergeResult<Vec<Location>> {
        if !path.contains('/') && !path.contains('.') {
            let prefixed = format!("{}{path}", self.panel_package_path());
            let result = self.find_resources(&prefixed)?;
            if !result.is_empty() {
                return Ok(result);
            }
        }
        let result = self.find_resources(path)?;
        if result.is_empty() {
            return Err(MergeError::Resolution {
                path: path.to_string(),
                search_path: self.search.describe(),
            });
        }
        Ok(result)
    }

    /// Resolve a symbolic path into a [`ResolvedPath`] carrying one unit
    /// per matching location.
    ///
    /// Without an explicit destination, content is re-homed at the
    /// requested path itself, so `com/pkg/` merges as `com/pkg/...`
    /// wherever the matching root lives on disk.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when nothing matches.
    pub fn resolved(&self, path: &str, destination: Option<&str>) -> MergeResult<ResolvedPath> {
        let locations = self.resolve(path)?;
        let default_destination = normalize_entry_name(path);
        let mut units = Vec::with_capacity(locations.len());
        for location in &locations {
            let dest = destination.unwrap_or(&default_destination);
            units.push(self.mergeable_from_location(location, Some(dest))?);
        }
        Ok(ResolvedPath {
            path: path.to_string(),
            units,
        })
    }

    /// Resolve a symbolic path to mergeable units.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when nothing matches.
    pub fn mergeables_from_path(&self, path: &str) -> MergeResult<Vec<Mergeable>> {
        Ok(self.resolved(path, None)?.units)
    }

    /// Resolve a symbolic path to mergeable units re-homed under an
    /// explicit destination.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when nothing matches.
    pub fn mergeables_with_destination(
        &self,
        path: &str,
        destination: &str,
    ) -> MergeResult<Vec<Mergeable>> {
        Ok(self.resolved(path, Some(destination))?.units)
    }

    /// Resolve a dotted package name to the units covering it.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when the package is nowhere on
    /// the search path.
    pub fn mergeables_from_package(&self, package: &str) -> MergeResult<Vec<Mergeable>> {
        self.mergeables_from_path(&package_to_path(package))
    }

    /// Build the unit matching a concrete location, applying a destination
    /// override if given.
    ///
    /// A directory-backed location with a non-empty destination gets a
    /// trailing slash forced onto the destination: a directory can only be
    /// re-homed under a prefix, never to one exact entry name.
    ///
    /// # Errors
    ///
    /// Returns an error if a jar unit's selection pattern cannot be built.
    pub fn mergeable_from_location(
        &self,
        location: &Location,
        destination: Option<&str>,
    ) -> MergeResult<Mergeable> {
        match location {
            Location::File(path) => {
                let unit = match destination {
                    Some(dest) => {
                        let mut dest = dest.to_string();
                        if path.is_dir() && !dest.is_empty() && !dest.ends_with('/') {
                            dest.push('/');
                        }
                        FileMerge::with_destination(path.clone(), dest)
                    }
                    None => FileMerge::new(path.clone()),
                };
                Ok(Mergeable::File(unit))
            }
            Location::JarEntry { jar, entry } => {
                let unit = match destination {
                    Some(dest) => JarMerge::with_destination(jar.clone(), entry, dest)?,
                    None => JarMerge::new(jar.clone(), entry)?,
                };
                Ok(Mergeable::Jar(unit))
            }
        }
    }

    /// Build a unit from a location spec string
    /// (`jar:file:/abs/app.jar!/com/pkg/` or a plain path), applying the
    /// destination override if given.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MalformedLocation`] for an undecomposable
    /// spec.
    pub fn mergeable_from_spec(
        &self,
        spec: &str,
        destination: Option<&str>,
    ) -> MergeResult<Mergeable> {
        let location = Location::parse(spec)?;
        self.mergeable_from_location(&location, destination)
    }

    /// Build the composite bundle packaging a panel class: the units of
    /// its whole package, under the package's own path.
    ///
    /// An unqualified name is searched under the conventional panel
    /// package; the real package is then read back out of the located
    /// class file. A qualified name is used as-is.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when the class or its package
    /// cannot be found.
    pub fn panel_merge(&self, name: &str) -> MergeResult<Mergeable> {
        let class_name = self.full_panel_class_name(name)?;
        let package_path = match class_name.rsplit_once('.') {
            Some((package, _)) => package_to_path(package),
            None => self.panel_package_path(),
        };
        let members = self.mergeables_with_destination(&package_path, &package_path)?;
        debug!(panel = %class_name, members = members.len(), "built panel bundle");
        Ok(Mergeable::Panel(PanelMerge::new(class_name, members)))
    }

    /// Resolve a possibly-short panel name to a fully qualified class
    /// name. Short names require locating the actual class file so its
    /// real package can be read back out; this is a search, not a string
    /// computation.
    fn full_panel_class_name(&self, name: &str) -> MergeResult<String> {
        if name.contains('.') {
            return Ok(name.to_string());
        }
        let class_file = format!("{name}.class");
        let units = self.mergeables_from_path(&self.panel_package_path())?;
        for unit in &units {
            if let Some(found) = unit.find(&|f: &MergeFile| f.is_dir || f.name() == class_file)? {
                return self.class_name_of(&found);
            }
        }
        Err(MergeError::Resolution {
            path: name.to_string(),
            search_path: self.search.describe(),
        })
    }

    /// Read the fully qualified class name back out of a located class
    /// file, using the panel package prefix as the anchor.
    fn class_name_of(&self, found: &MergeFile) -> MergeResult<String> {
        let package_path = self.panel_package_path();
        match found.path.find(&package_path) {
            Some(idx) => Ok(class_name_from_resource(&found.path[idx..])),
            None => Err(MergeError::MalformedLocation(found.path.clone())),
        }
    }
}
