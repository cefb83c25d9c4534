//! End-to-end pipeline tests: synthetic classpath in, archive out.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use jarpack_core::{MergeError, MergeManager, PackOptions, PathResolver, SearchPath};
use tracing_subscriber::EnvFilter;
use zip::write::SimpleFileOptions;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test context holding a scratch classpath: a loose classes directory,
/// a resources directory, and a jar contributing to a split package.
struct TestContext {
    temp_dir: tempfile::TempDir,
    classes: PathBuf,
    panels_jar: PathBuf,
}

impl TestContext {
    fn new() -> Result<Self> {
        init_tracing();
        let temp_dir = tempfile::tempdir()?;

        let classes = temp_dir.path().join("classes");
        let hello = classes.join("com/example/panels/hello");
        std::fs::create_dir_all(&hello)?;
        std::fs::write(hello.join("HelloPanel.class"), b"hello-panel-class")?;
        std::fs::write(hello.join("hello.properties"), b"msg=hello")?;
        let util = classes.join("com/example/util");
        std::fs::create_dir_all(&util)?;
        std::fs::write(util.join("Strings.class"), b"strings-class")?;

        let panels_jar = temp_dir.path().join("panels.jar");
        write_jar(
            &panels_jar,
            &[
                ("com/example/panels/", ""),
                ("com/example/panels/hello/", ""),
                ("com/example/panels/hello/HelloHelper.class", "helper-class"),
                ("com/example/panels/finish/", ""),
                ("com/example/panels/finish/FinishPanel.class", "finish-class"),
            ],
        )?;

        Ok(Self {
            temp_dir,
            classes,
            panels_jar,
        })
    }

    fn resolver(&self) -> PathResolver {
        PathResolver::new(SearchPath::new([
            self.classes.clone(),
            self.panels_jar.clone(),
        ]))
        .with_panel_package("com.example.panels")
    }

    fn manager(&self) -> MergeManager {
        MergeManager::new(self.resolver())
    }
}

fn write_jar(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())?;
        } else {
            writer.start_file(*name, SimpleFileOptions::default())?;
            writer.write_all(content.as_bytes())?;
        }
    }
    writer.finish()?;
    Ok(())
}

fn archive_entries(bytes: Vec<u8>) -> Result<Vec<(String, String)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        entries.push((entry.name().to_string(), content));
    }
    entries.sort();
    Ok(entries)
}

#[test]
fn full_build_packages_panels_and_resources() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut manager = ctx.manager();

    manager.add_panel("HelloPanel")?;
    manager.add_resource("com/example/util/Strings.class")?;
    manager.add_resource_with_destination("com/example/util/", "resources/util/")?;

    let bytes = manager.merge(Cursor::new(Vec::new()))?.into_inner();
    let entries = archive_entries(bytes)?;
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            // HelloPanel's package, merged from both the classes directory
            // and the split-package jar
            "com/example/panels/hello/HelloHelper.class",
            "com/example/panels/hello/HelloPanel.class",
            "com/example/panels/hello/hello.properties",
            "com/example/util/Strings.class",
            "resources/util/Strings.class",
        ]
    );
    Ok(())
}

#[test]
fn duplicate_requests_produce_a_single_entry() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut manager = ctx.manager();

    // Every panel requests its own package; register the same content
    // three different ways.
    manager.add_panel("HelloPanel")?;
    manager.add_resource("com/example/panels/hello/")?;
    manager.add_resource("com/example/panels/hello/HelloPanel.class")?;

    let bytes = manager.merge(Cursor::new(Vec::new()))?.into_inner();
    let entries = archive_entries(bytes)?;
    let hello_classes = entries
        .iter()
        .filter(|(name, _)| name == "com/example/panels/hello/HelloPanel.class")
        .count();
    assert_eq!(hello_classes, 1);
    Ok(())
}

#[test]
fn conflicting_content_first_writer_wins() -> Result<()> {
    // Two roots legitimately map different content to the same entry
    // name. The first-registered unit wins silently; this pins the
    // name-based policy (content is never diffed).
    let ctx = TestContext::new()?;
    let other = ctx.temp_dir.path().join("other-classes");
    let pkg = other.join("com/example/util");
    std::fs::create_dir_all(&pkg)?;
    std::fs::write(pkg.join("Strings.class"), b"conflicting-strings-class")?;

    let resolver = PathResolver::new(SearchPath::new([ctx.classes.clone(), other]));
    let mut manager = MergeManager::new(resolver);
    manager.add_resource("com/example/util/Strings.class")?;

    let bytes = manager.merge(Cursor::new(Vec::new()))?.into_inner();
    let entries = archive_entries(bytes)?;
    assert_eq!(
        entries,
        vec![(
            "com/example/util/Strings.class".to_string(),
            "strings-class".to_string()
        )]
    );
    Ok(())
}

#[test]
fn jar_prefix_rehoming_skips_directory_entries() -> Result<()> {
    let ctx = TestContext::new()?;
    let jar = ctx.temp_dir.path().join("app.jar");
    write_jar(
        &jar,
        &[
            ("pkg/A.class", "aa"),
            ("pkg/sub/", ""),
            ("pkg/sub/B.class", "bb"),
        ],
    )?;

    let resolver = ctx.resolver();
    let spec = format!("{}!/pkg/", jar.display());
    let unit = resolver.mergeable_from_spec(&spec, Some("out/"))?;

    let mut manager = ctx.manager();
    manager.add_mergeable(&spec, unit);
    let bytes = manager.merge(Cursor::new(Vec::new()))?.into_inner();
    let entries = archive_entries(bytes)?;
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["out/A.class", "out/sub/B.class"]);
    Ok(())
}

#[test]
fn loose_path_outside_roots_resolves_verbatim() -> Result<()> {
    // A path that exists on disk resolves as a file unit even though no
    // search root contains it.
    let ctx = TestContext::new()?;
    let loose = ctx.temp_dir.path().join("logo.txt");
    std::fs::write(&loose, b"logo-bytes")?;

    let mut manager = ctx.manager();
    manager.add_resource_with_destination(&loose.display().to_string(), "res/logo.txt")?;

    let bytes = manager.merge(Cursor::new(Vec::new()))?.into_inner();
    let entries = archive_entries(bytes)?;
    assert_eq!(
        entries,
        vec![("res/logo.txt".to_string(), "logo-bytes".to_string())]
    );
    Ok(())
}

#[test]
fn unknown_resource_fails_the_registration() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut manager = ctx.manager();

    let err = manager
        .add_resource("com/example/missing/Nothing.class")
        .unwrap_err();
    assert!(matches!(err, MergeError::Resolution { .. }));
    assert!(manager.is_empty());
    Ok(())
}

#[test]
fn merge_to_file_produces_a_readable_archive() -> Result<()> {
    let ctx = TestContext::new()?;
    let output = ctx.temp_dir.path().join("installer.jar");

    let mut manager =
        MergeManager::with_options(ctx.resolver(), PackOptions::with_compression_level(1));
    manager.add_panel("com.example.panels.finish.FinishPanel")?;
    manager.merge_to_file(&output)?;

    let bytes = std::fs::read(&output)?;
    let entries = archive_entries(bytes)?;
    assert_eq!(
        entries,
        vec![(
            "com/example/panels/finish/FinishPanel.class".to_string(),
            "finish-class".to_string()
        )]
    );
    Ok(())
}
