//! Pure path algebra shared by the resolver and the mergeable units.
//!
//! These helpers are stateless string computations: posix conversion,
//! duplicate-slash collapsing, package/path conversion, and decomposition
//! of `jar:file:/path/to.jar!/internal/path` style specs. Archive entry
//! names always use forward slashes, regardless of host platform.

use std::path::Path;

use crate::error::{MergeError, MergeResult};

/// Marker separating an archive path from the path inside it.
pub const JAR_SEPARATOR: &str = "!/";

/// URL-style scheme prefix accepted (and stripped) on jar specs.
const JAR_FILE_SCHEME: &str = "jar:file:";

/// Plain `file:` scheme prefix accepted on file specs.
const FILE_SCHEME: &str = "file:";

/// Convert a filesystem path to a forward-slash string.
pub fn to_posix(path: &Path) -> String {
    let s = path.to_string_lossy();
    if s.contains('\\') {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// Collapse duplicate slashes: `a//b///c` becomes `a/b/c`.
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Normalize an archive entry name: collapse duplicate slashes and strip
/// any leading slash. Entry names inside an archive are always relative.
pub fn normalize_entry_name(name: &str) -> String {
    let collapsed = collapse_slashes(name);
    collapsed.trim_start_matches('/').to_string()
}

/// Convert a dotted package name to a slash path with a trailing slash.
///
/// `com.example.panels` becomes `com/example/panels/`. A name already in
/// slash form is passed through (with the trailing slash ensured).
pub fn package_to_path(package: &str) -> String {
    let mut path = package.replace('.', "/");
    if !path.ends_with('/') {
        path.push('/');
    }
    path
}

/// Convert a resource path of a class file to its dotted class name.
///
/// `com/example/Foo.class` becomes `com.example.Foo`.
pub fn class_name_from_resource(resource: &str) -> String {
    resource
        .trim_start_matches('/')
        .trim_end_matches(".class")
        .replace('/', ".")
}

/// Split a location spec into the archive path and the internal path.
///
/// Accepts `jar:file:/abs/app.jar!/com/pkg/`, `file:/abs/app.jar!/com/pkg`
/// and bare `/abs/app.jar!/com/pkg` forms. The internal path may be empty
/// (`/abs/app.jar!/`), denoting the whole archive.
///
/// # Errors
///
/// Returns [`MergeError::MalformedLocation`] if the spec has no `!/`
/// separator or an empty archive path.
pub fn split_jar_spec(spec: &str) -> MergeResult<(String, String)> {
    let stripped = spec
        .strip_prefix(JAR_FILE_SCHEME)
        .or_else(|| spec.strip_prefix(FILE_SCHEME))
        .unwrap_or(spec);
    let Some(idx) = stripped.rfind(JAR_SEPARATOR) else {
        return Err(MergeError::MalformedLocation(spec.to_string()));
    };
    let archive = &stripped[..idx];
    let internal = &stripped[idx + JAR_SEPARATOR.len()..];
    if archive.is_empty() {
        return Err(MergeError::MalformedLocation(spec.to_string()));
    }
    Ok((
        archive.to_string(),
        internal.trim_start_matches('/').to_string(),
    ))
}

/// True when a destination names one exact output entry rather than a
/// directory-style prefix.
///
/// An empty destination is not a file; a destination without any slash is
/// treated as a file name; otherwise the trailing slash decides.
pub fn is_exact_destination(destination: &str) -> bool {
    if destination.is_empty() {
        return false;
    }
    if !destination.contains('/') {
        return true;
    }
    !destination.ends_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_slashes_removes_duplicates() {
        assert_eq!(collapse_slashes("a//b///c"), "a/b/c");
        assert_eq!(collapse_slashes("/already/clean/"), "/already/clean/");
    }

    #[test]
    fn normalize_strips_leading_slash() {
        assert_eq!(normalize_entry_name("/com//pkg/Foo.class"), "com/pkg/Foo.class");
        assert_eq!(normalize_entry_name("dest//a.txt"), "dest/a.txt");
    }

    #[test]
    fn package_to_path_converts_dots() {
        assert_eq!(package_to_path("com.example.panels"), "com/example/panels/");
        assert_eq!(package_to_path("com/example/panels/"), "com/example/panels/");
    }

    #[test]
    fn class_name_round_trip() {
        assert_eq!(
            class_name_from_resource("com/example/panels/hello/HelloPanel.class"),
            "com.example.panels.hello.HelloPanel"
        );
    }

    #[test]
    fn split_jar_spec_with_scheme() {
        let (jar, internal) = split_jar_spec("jar:file:/abs/path/app.jar!/com/pkg/Foo.class").unwrap();
        assert_eq!(jar, "/abs/path/app.jar");
        assert_eq!(internal, "com/pkg/Foo.class");
    }

    #[test]
    fn split_jar_spec_bare() {
        let (jar, internal) = split_jar_spec("/abs/app.jar!/").unwrap();
        assert_eq!(jar, "/abs/app.jar");
        assert_eq!(internal, "");
    }

    #[test]
    fn split_jar_spec_rejects_missing_separator() {
        assert!(matches!(
            split_jar_spec("/abs/app.jar"),
            Err(MergeError::MalformedLocation(_))
        ));
    }

    #[test]
    fn exact_destination_rules() {
        assert!(!is_exact_destination(""));
        assert!(is_exact_destination("Foo.class"));
        assert!(is_exact_destination("a/dest/Foo.class"));
        assert!(!is_exact_destination("a/dest/"));
    }
}
