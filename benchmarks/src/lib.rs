//! Shared helpers for the artifact authority benchmark suites.

use std::path::Path;

use authority_replay::manifest::{resolve, PACK_MANIFEST_PATH};
use serde_json::json;
use tempfile::TempDir;

/// Synthetic run tree size.
#[derive(Debug, Clone, Copy)]
pub struct TreeShape {
    pub files: usize,
    pub bytes_per_file: usize,
}

impl TreeShape {
    pub const SMALL: Self = Self { files: 32, bytes_per_file: 1024 };
    pub const WIDE: Self = Self { files: 1024, bytes_per_file: 256 };
    pub const HEAVY: Self = Self { files: 16, bytes_per_file: 4 * 1024 * 1024 };

    #[must_use]
    pub fn label(self) -> String {
        format!("{}x{}B", self.files, self.bytes_per_file)
    }
}

/// Build a tree spread across the category namespaces. File `i` is filled
/// with a byte pattern seeded by `seed` and `i`.
///
/// # Panics
///
/// Panics on I/O failure. Benchmark-only helper.
#[must_use]
pub fn build_tree(shape: TreeShape, seed: u8) -> TempDir {
    const DIRS: &[&str] = &["outputs", "contracts", "robustness_v4", "machine_authority", "provenance"];
    let dir = tempfile::tempdir().unwrap();
    for i in 0..shape.files {
        let sub = DIRS[i % DIRS.len()];
        let path = dir.path().join(sub).join(format!("f{i:05}.bin"));
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        #[allow(clippy::cast_possible_truncation)]
        let content: Vec<u8> = (0..shape.bytes_per_file)
            .map(|j| (j as u8).wrapping_mul(31).wrapping_add(seed).wrapping_add(i as u8))
            .collect();
        std::fs::write(path, content).unwrap();
    }
    dir
}

/// Record a pack manifest for the files currently under `root`.
///
/// # Panics
///
/// Panics if the walk or write fails.
pub fn record_pack_manifest(root: &Path) {
    let walked = resolve(root).unwrap();
    let files: Vec<serde_json::Value> = walked
        .hashes
        .iter()
        .map(|(path, sha)| json!({ "path": path, "sha256": sha }))
        .collect();
    std::fs::write(root.join(PACK_MANIFEST_PATH), json!({ "files": files }).to_string()).unwrap();
}
