use std::fs;
use std::path::Path;

use tempfile::tempdir;
use unmap_core::{safe_path_join, SafePath, SafePathError};

#[test]
fn join_within_root() {
    let dir = tempdir().unwrap();
    let root = SafePath::new(dir.path()).unwrap();

    let joined = root.join("src/components/../App.vue").unwrap();
    assert_eq!(joined.path(), dir.path().join("src/components/../App.vue"));
    assert!(joined.resolved().starts_with(fs::canonicalize(dir.path()).unwrap()));
    assert!(joined.resolved().ends_with("src/App.vue"));
}

#[test]
fn parent_traversal_is_rejected() {
    let dir = tempdir().unwrap();
    let root = SafePath::new(dir.path().join("files")).unwrap();

    for part in ["../secret.txt", "a/../../secret.txt", "../../../../../../etc/passwd", ".."] {
        let err = root.join(part).unwrap_err();
        assert!(matches!(err, SafePathError::OutOfBounds { .. }), "{part}");
    }
}

#[test]
fn absolute_component_is_rejected() {
    let dir = tempdir().unwrap();
    let err = safe_path_join(dir.path(), "/etc/passwd").unwrap_err();
    assert!(matches!(err, SafePathError::OutOfBounds { .. }));
}

#[test]
fn chained_joins_keep_the_original_boundary() {
    let dir = tempdir().unwrap();
    let root = SafePath::new(dir.path()).unwrap();
    let nested = root.join("static/js").unwrap();

    assert_eq!(nested.boundary(), root.boundary());
    // Leaves `static/js` but stays inside the original root.
    let up = nested.join("../../vendor.js").unwrap();
    assert_eq!(up.boundary(), root.boundary());
    assert!(nested.join("../../../outside.js").is_err());
}

#[test]
fn root_itself_is_the_boundary() {
    let dir = tempdir().unwrap();
    let root = SafePath::new(dir.path()).unwrap();
    assert!(root.join("a/..").unwrap().is_boundary());
    assert!(!root.join("a").unwrap().is_boundary());
}

#[cfg(unix)]
#[test]
fn symlink_out_of_root_is_rejected() {
    let outside = tempdir().unwrap();
    let dir = tempdir().unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

    let root = SafePath::new(dir.path()).unwrap();
    let err = root.join("link/payload.js").unwrap_err();
    assert!(matches!(err, SafePathError::OutOfBounds { .. }));
}

#[test]
fn relative_root_is_resolved_against_cwd() {
    let root = SafePath::new("output/bundle/files").unwrap();
    assert!(root.boundary().is_absolute());
    assert!(root.boundary().ends_with(Path::new("output/bundle/files")));
    assert!(root.join("../../escape.js").is_err());
}

#[cfg(unix)]
#[test]
fn missing_paths_are_resolved_lexically() {
    let root = SafePath::new("/nonexistent-unmap-root").unwrap();
    let joined = root.join("a/./b/../c").unwrap();
    assert_eq!(joined.resolved(), Path::new("/nonexistent-unmap-root/a/c"));
    assert_eq!(joined.boundary(), Path::new("/nonexistent-unmap-root"));
}

#[cfg(unix)]
#[test]
fn parent_of_filesystem_root_is_root() {
    let root = SafePath::new("/").unwrap();
    let joined = root.join("../../etc/hosts").unwrap();
    assert_eq!(joined.resolved(), Path::new("/etc/hosts"));
}

#[cfg(unix)]
#[test]
fn sibling_sharing_a_name_prefix_is_outside() {
    let root = SafePath::new("/nonexistent-unmap-root/files").unwrap();
    let err = root.join("../files2/a.js").unwrap_err();
    assert!(matches!(err, SafePathError::OutOfBounds { .. }));
}
