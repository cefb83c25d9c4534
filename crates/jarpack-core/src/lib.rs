//! Core library for jarpack: resource resolution and archive merging.
//!
//! An installer build compiles a declarative application description into
//! one self-contained archive. This crate is the packaging half of that
//! pipeline: it resolves symbolic resource paths (classes, packages,
//! arbitrary resources) against an explicit [`SearchPath`] of loose
//! directories and jars, wraps each match in a [`Mergeable`] unit, and
//! streams every registered unit into a single deflate-compressed output
//! archive with first-writer-wins duplicate suppression.
//!
//! The usual entry point is [`MergeManager`]:
//!
//! ```no_run
//! use jarpack_core::{MergeManager, PathResolver, SearchPath};
//!
//! # fn main() -> jarpack_core::MergeResult<()> {
//! let search = SearchPath::new(["target/classes", "libs/panels.jar"]);
//! let mut manager = MergeManager::new(PathResolver::new(search));
//! manager.add_resource("com/acme/installer/")?;
//! manager.add_panel("HelloPanel")?;
//! manager.merge_to_file(std::path::Path::new("installer.jar"))?;
//! # Ok(())
//! # }
//! ```
//!
//! The pipeline is synchronous and single-threaded by design: entry
//! uniqueness depends on one linear writer owning the output stream for
//! the whole build.

pub mod archive;
pub mod crawler;
pub mod error;
pub mod location;
pub mod manager;
pub mod merge;
pub mod paths;
pub mod registry;
pub mod resolver;

pub use archive::{PackOptions, PackOutput};
pub use crawler::{ClassLocation, ClassPathCrawler};
pub use error::{MergeError, MergeResult};
pub use location::Location;
pub use manager::MergeManager;
pub use merge::{FileMerge, JarMerge, MergeFile, Mergeable, PanelMerge};
pub use registry::ClassRegistry;
pub use resolver::{DEFAULT_PANEL_PACKAGE, PathResolver, ResolvedPath, SearchPath};
