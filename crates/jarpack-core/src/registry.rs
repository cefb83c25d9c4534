//! Factory registry replacing reflective class instantiation.
//!
//! Installer bootstraps reference listener and panel implementations by
//! class name in configuration. There is no runtime class loading here:
//! implementations register a factory under their class name at link
//! time, and names found in configuration are resolved to registered
//! factories, with the [`ClassPathCrawler`] upgrading short names to
//! fully qualified ones.

use std::collections::HashMap;
use std::fmt;

use crate::crawler::ClassPathCrawler;
use crate::error::MergeResult;

/// Maps stable class-name keys to factory functions producing `T`.
pub struct ClassRegistry<T> {
    factories: HashMap<String, Box<dyn Fn() -> T>>,
}

impl<T> fmt::Debug for ClassRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("registered", &self.factories.len())
            .finish()
    }
}

impl<T> Default for ClassRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ClassRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under a fully qualified class name. A later
    /// registration under the same name replaces the earlier one.
    pub fn register(&mut self, class_name: impl Into<String>, factory: impl Fn() -> T + 'static) {
        self.factories.insert(class_name.into(), Box::new(factory));
    }

    /// True when a factory is registered under this exact name.
    pub fn contains(&self, class_name: &str) -> bool {
        self.factories.contains_key(class_name)
    }

    /// Instantiate by exact class name.
    pub fn create(&self, class_name: &str) -> Option<T> {
        self.factories.get(class_name).map(|factory| factory())
    }

    /// Instantiate by possibly-short class name, using the crawler to
    /// resolve a short name to the fully qualified one first.
    ///
    /// Returns `Ok(None)` when the class exists on the search path but no
    /// factory was registered for it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MergeError::Resolution`] when the name matches no
    /// registered factory and no class file on the search path.
    pub fn create_resolved(
        &self,
        crawler: &mut ClassPathCrawler,
        name: &str,
    ) -> MergeResult<Option<T>> {
        if let Some(instance) = self.create(name) {
            return Ok(Some(instance));
        }
        let located = crawler.find_class(name)?;
        Ok(self.create(&located.class_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{PathResolver, SearchPath};

    #[test]
    fn exact_name_lookup() {
        let mut registry: ClassRegistry<&'static str> = ClassRegistry::new();
        registry.register("com.example.listeners.SummaryListener", || "summary");

        assert!(registry.contains("com.example.listeners.SummaryListener"));
        assert_eq!(
            registry.create("com.example.listeners.SummaryListener"),
            Some("summary")
        );
        assert_eq!(registry.create("com.example.Other"), None);
    }

    #[test]
    fn short_name_resolves_through_crawler() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes");
        std::fs::create_dir_all(classes.join("com/example/listeners")).unwrap();
        std::fs::write(
            classes.join("com/example/listeners/SummaryListener.class"),
            b"listener",
        )
        .unwrap();
        let mut crawler =
            ClassPathCrawler::new(PathResolver::new(SearchPath::new([classes])));

        let mut registry: ClassRegistry<&'static str> = ClassRegistry::new();
        registry.register("com.example.listeners.SummaryListener", || "summary");

        let instance = registry
            .create_resolved(&mut crawler, "SummaryListener")
            .unwrap();
        assert_eq!(instance, Some("summary"));

        let missing = registry.create_resolved(&mut crawler, "Nonexistent");
        assert!(missing.is_err());
    }
}
