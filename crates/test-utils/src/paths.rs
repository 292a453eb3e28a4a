//! Locating optional sample files and scratch directories for tests.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(|p| p.to_path_buf())
        .unwrap_or(manifest_dir)
}

/// Find a sample file by name.
///
/// Looks in `$TEST_DATA_DIR` first, then in the `testdata/` directories of
/// the crates that read sample files, then in `testdata/` at the workspace
/// root.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    let env_dir = std::env::var("TEST_DATA_DIR").ok().map(PathBuf::from);

    env_dir
        .into_iter()
        .chain([
            root.join("crates/netcdf-parser/testdata"),
            root.join("crates/mask-pipeline/testdata"),
            root.join("testdata"),
        ])
        .map(|dir| dir.join(name))
        .find(|path| path.exists())
}

/// Scratch directory for store output, removed when dropped.
///
/// The prefix shows up in the directory name, which helps when a failing
/// test leaves a path in its message.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temporary test directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        let root = workspace_root();
        assert!(root.join("Cargo.toml").exists(), "{:?}", root);
        assert!(root.join("crates/test-utils").is_dir());
    }

    #[test]
    fn test_missing_sample_is_none() {
        assert!(find_test_file("no_such_sample_file.nc").is_none());
    }

    #[test]
    fn test_temp_dir_prefix() {
        let dir = temp_test_dir_with_prefix("ocean_test_");
        assert!(dir.path().is_dir());
        assert!(dir.path().to_string_lossy().contains("ocean_test_"));
    }
}
