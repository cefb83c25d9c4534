//! Search-path crawling for lookups by bare file name.
//!
//! When the exact producing root of a resource is unknown (a listener
//! class referenced by its short name, a package searched by its last
//! segment), the whole search path is enumerated once into a cache keyed
//! by file name. The enumeration reuses the same units the merge pipeline
//! uses, so directories and jars behave identically.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::location::Location;
use crate::merge::Mergeable;
use crate::paths::{class_name_from_resource, package_to_path, to_posix};
use crate::resolver::PathResolver;

/// One crawled resource: where it lives and its root-relative path.
#[derive(Debug, Clone)]
pub struct ClassResource {
    /// Concrete location of the resource.
    pub location: Location,
    /// Posix path relative to the containing root, e.g.
    /// `com/pkg/Foo.class`. Directories carry a trailing slash.
    pub resource_path: String,
}

/// A class located by the crawler: its fully qualified name and where the
/// class file lives. Front-ends pair this with a
/// [`ClassRegistry`](crate::registry::ClassRegistry) to instantiate it.
#[derive(Debug, Clone)]
pub struct ClassLocation {
    /// Fully qualified dotted class name.
    pub class_name: String,
    /// Where the class file was found.
    pub location: Location,
}

/// Crawls the search path into a file-name cache and answers short-name
/// lookups.
///
/// The cache is built lazily on first use and covers the whole search
/// path. Not thread-safe; confined to one build like the rest of the
/// pipeline.
#[derive(Debug)]
pub struct ClassPathCrawler {
    resolver: PathResolver,
    cache: Option<HashMap<String, Vec<ClassResource>>>,
}

impl ClassPathCrawler {
    /// Create a crawler sharing the resolver's search path.
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            cache: None,
        }
    }

    /// The resolver this crawler shares its search path with.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    fn cache(&mut self) -> MergeResult<&HashMap<String, Vec<ClassResource>>> {
        match self.cache {
            Some(ref cache) => Ok(cache),
            None => {
                let built = Self::build_cache(&self.resolver)?;
                Ok(self.cache.insert(built))
            }
        }
    }

    fn build_cache(resolver: &PathResolver) -> MergeResult<HashMap<String, Vec<ClassResource>>> {
        let mut cache: HashMap<String, Vec<ClassResource>> = HashMap::new();
        for root in resolver.search_path().roots() {
            if root.is_dir() {
                let root_posix = to_posix(root);
                let unit = Mergeable::File(crate::merge::FileMerge::new(root.clone()));
                for file in unit.list_files(&|_| true)? {
                    // list_files on the root directory yields absolute
                    // paths; strip the root to get the resource path.
                    let mut resource_path = file
                        .path
                        .strip_prefix(&root_posix)
                        .unwrap_or(&file.path)
                        .trim_start_matches('/')
                        .to_string();
                    if file.is_dir {
                        resource_path.push('/');
                    }
                    let key = file.name().to_string();
                    cache.entry(key).or_default().push(ClassResource {
                        location: Location::File(file.path.clone().into()),
                        resource_path,
                    });
                }
            } else if root.is_file() {
                if !crate::location::is_zip_file(root) {
                    tracing::warn!(root = %to_posix(root), "skipping non-archive search root");
                    continue;
                }
                let unit = match crate::merge::JarMerge::new(root.clone(), "") {
                    Ok(unit) => unit,
                    Err(err) => {
                        tracing::warn!(root = %to_posix(root), %err, "skipping unreadable search root");
                        continue;
                    }
                };
                let names = match unit.entry_names() {
                    Ok(names) => names,
                    Err(err) => {
                        tracing::warn!(root = %to_posix(root), %err, "skipping unreadable search root");
                        continue;
                    }
                };
                for name in names {
                    let key = name
                        .trim_end_matches('/')
                        .rsplit('/')
                        .next()
                        .unwrap_or(&name)
                        .to_string();
                    cache.entry(key).or_default().push(ClassResource {
                        location: Location::JarEntry {
                            jar: root.clone(),
                            entry: name.clone(),
                        },
                        resource_path: name,
                    });
                }
            }
        }
        debug!(
            names = cache.len(),
            "crawled search path into file-name cache"
        );
        Ok(cache)
    }

    /// Locate a class by name.
    ///
    /// A fully qualified name is resolved directly; an unqualified name is
    /// looked up in the file-name cache and the real package is read back
    /// out of the first match.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when no class file with that
    /// name exists anywhere on the search path.
    pub fn find_class(&mut self, class_name: &str) -> MergeResult<ClassLocation> {
        if class_name.contains('.') {
            let resource = format!("{}.class", class_name.replace('.', "/"));
            // resolve reports an empty match set as an error, so the first
            // location always exists
            let location = self
                .resolver
                .resolve(&resource)?
                .into_iter()
                .next()
                .ok_or_else(|| MergeError::Resolution {
                    path: class_name.to_string(),
                    search_path: self.resolver.search_path().describe(),
                })?;
            Ok(ClassLocation {
                class_name: class_name.to_string(),
                location,
            })
        } else {
            let key = format!("{class_name}.class");
            let search_path = self.resolver.search_path().describe();
            let cache = self.cache()?;
            match cache.get(&key).and_then(|matches| matches.first()) {
                Some(resource) => Ok(ClassLocation {
                    class_name: class_name_from_resource(&resource.resource_path),
                    location: resource.location.clone(),
                }),
                None => Err(MergeError::Resolution {
                    path: class_name.to_string(),
                    search_path,
                }),
            }
        }
    }

    /// Find every location of a (possibly split) package.
    ///
    /// Lookup runs over the last package segment and keeps matches whose
    /// full path actually contains the package, so `util` inside
    /// `com/other/util/` does not answer for `com.example.util`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Resolution`] when the package exists nowhere
    /// on the search path.
    pub fn search_package(&mut self, package: &str) -> MergeResult<Vec<Location>> {
        let package_path = package_to_path(package.trim_end_matches(['.', '/']));
        let last_segment = package_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(package)
            .to_string();
        let single_segment = !package_path.trim_end_matches('/').contains('/');
        let search_path = self.resolver.search_path().describe();
        let cache = self.cache()?;

        let mut result = Vec::new();
        if let Some(matches) = cache.get(&last_segment) {
            for resource in matches {
                if !resource.resource_path.ends_with('/') {
                    continue;
                }
                if single_segment || resource.resource_path.contains(&package_path) {
                    result.push(resource.location.clone());
                }
            }
        }
        if result.is_empty() {
            return Err(MergeError::Resolution {
                path: package.to_string(),
                search_path,
            });
        }
        Ok(result)
    }
}
