//! Builders for run directories used by the lock tests.
//!
//! A run directory is laid out the way the pipeline stages leave it: data
//! outputs, contract files, an authority snapshot, audit outputs, and a run
//! manifest. Provenance records and pack manifests are derived from whatever
//! is on disk, so a test can mutate a file *after* recording to simulate
//! drift, or *before* recording to simulate a different run.

use std::path::Path;

use authority_replay::fingerprint::EnvironmentFingerprint;
use authority_replay::manifest::{resolve, PACK_MANIFEST_PATH, PROVENANCE_ENV_PATH, PROVENANCE_HASHES_PATH};
use serde_json::json;

/// Files of the canonical fixture run, one per artifact category.
pub const RUN_FILES: &[(&str, &str)] = &[
    ("manifest.json", "{\"run_id\":\"fixture\"}\n"),
    ("contracts/coil_contract.json", "{\"n_turns\":120,\"radius_m\":0.25}\n"),
    ("machine_authority_snapshot.json", "{\"psi_tol\":1.5e-6}\n"),
    ("robustness_v4/summary.json", "{\"pass\":true}\n"),
    ("outputs/psi.csv", "r,psi\n0.0,1.0\n0.5,0.75\n"),
    ("outputs/q_profile.csv", "r,q\n0.0,1.1\n0.5,2.4\n"),
];

/// Write `content` to `root/rel`, creating parent directories.
///
/// # Panics
///
/// Panics on I/O failure. Test-only helper.
pub fn write_file(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Populate `root` with [`RUN_FILES`].
///
/// # Panics
///
/// Panics on I/O failure.
pub fn build_run(root: &Path) {
    for (rel, content) in RUN_FILES {
        write_file(root, rel, content.as_bytes());
    }
}

/// The fingerprint recorded alongside fixture provenance. Fixed values so
/// that fixture output never depends on the host.
#[must_use]
pub fn fixture_env() -> EnvironmentFingerprint {
    EnvironmentFingerprint::from_fields([
        ("runtime", "authority-fixture 1.0.0"),
        ("platform", "fixture-os-fixture-arch"),
        ("created_utc", "2026-01-01T00:00:00Z"),
    ])
}

/// Record `provenance/file_hashes.json` from the files currently under
/// `root`, plus `provenance/env_fingerprint.json` when `env` is given.
///
/// Must be called before any `provenance/` or report directory exists under
/// `root`, since the recorded set is taken from a tree walk.
///
/// # Panics
///
/// Panics if the tree walk or write fails.
pub fn record_provenance(root: &Path, env: Option<&EnvironmentFingerprint>) {
    let walked = resolve(root).unwrap();
    let record = json!({ "sha256": walked.hashes.to_json() });
    write_file(
        root,
        PROVENANCE_HASHES_PATH,
        serde_json::to_string_pretty(&record).unwrap().as_bytes(),
    );
    if let Some(env) = env {
        write_file(
            root,
            PROVENANCE_ENV_PATH,
            serde_json::to_string_pretty(&env.to_json()).unwrap().as_bytes(),
        );
    }
}

/// Record `pack_manifest.json` from the files currently under `root`.
///
/// # Panics
///
/// Panics if the tree walk or write fails.
pub fn record_pack_manifest(root: &Path) {
    let walked = resolve(root).unwrap();
    let files: Vec<serde_json::Value> = walked
        .hashes
        .iter()
        .map(|(path, sha)| json!({ "path": path, "sha256": sha, "bytes": 0 }))
        .collect();
    let manifest = json!({ "pack": "fixture", "files": files });
    write_file(
        root,
        PACK_MANIFEST_PATH,
        serde_json::to_string_pretty(&manifest).unwrap().as_bytes(),
    );
}
