//! Nondeterminism sentinel: resolve the same target N times and require the
//! resolved hash map to digest identically every time.
//!
//! This is a check on the verification pipeline itself. Unordered traversal,
//! unstable serialization, or unstable hashing in the resolver show up here as
//! differing run hashes, independent of what the artifacts contain.

use std::path::Path;

use authority_kernel::proof::canon::canonical_json_bytes;
use authority_kernel::proof::hash::digest_bytes;
use tracing::{debug, info, instrument, warn};

use crate::config::VerifierConfig;
use crate::error::ReplayError;
use crate::manifest::{FsResolver, ManifestResolver};
use crate::report_dir::{write_json_report, NONDETERMINISM_REPORT_JSON};
use crate::SCHEMA_VERSION;

/// Smallest repeat count that can establish stability.
pub const MIN_REPEATS: usize = 2;

pub const NOTE_STABLE: &str = "stable";
pub const NOTE_UNSTABLE: &str =
    "hash-map digest differed across replays (suspected nondeterminism)";

/// Result of a sentinel run. Invariant: `ok` iff every run hash is equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NondeterminismReport {
    pub target: String,
    pub n: usize,
    pub ok: bool,
    /// One digest per resolution, in run order.
    pub run_hashes: Vec<String>,
    pub note: String,
}

impl NondeterminismReport {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "target": self.target,
            "n": self.n,
            "ok": self.ok,
            "run_hashes": self.run_hashes,
            "note": self.note,
        })
    }

    /// SHA-256 of the report's canonical JSON.
    #[must_use]
    pub fn digest(&self) -> String {
        digest_bytes(&canonical_json_bytes(&self.to_json()))
    }
}

/// Run the sentinel with the filesystem resolver and default configuration.
///
/// The report is written to `out_dir`, or `<target>/replay/` when `None`.
///
/// # Errors
///
/// See [`check_with`].
pub fn check(target: &Path, n: usize, out_dir: Option<&Path>) -> Result<NondeterminismReport, ReplayError> {
    let config = VerifierConfig::default();
    check_with(&FsResolver::from_config(&config), target, n, out_dir, &config)
}

/// Run the sentinel with any resolver.
///
/// # Errors
///
/// Returns [`ReplayError::InvalidRepeatCount`] before any work if
/// `n < 2`, [`ReplayError::Manifest`] if a resolution fails, and
/// [`ReplayError::Write`] if the report cannot be persisted.
#[instrument(skip_all, fields(target = %target.display(), repeats = n))]
pub fn check_with(
    resolver: &dyn ManifestResolver,
    target: &Path,
    n: usize,
    out_dir: Option<&Path>,
    config: &VerifierConfig,
) -> Result<NondeterminismReport, ReplayError> {
    if n < MIN_REPEATS {
        return Err(ReplayError::InvalidRepeatCount { n });
    }
    info!("nondeterminism check started");

    let mut run_hashes = Vec::with_capacity(n);
    for run in 0..n {
        let resolved = resolver.resolve(target)?;
        let digest = resolved.hashes.digest();
        debug!(run, digest = %digest, "resolution digested");
        run_hashes.push(digest);
    }

    let ok = run_hashes.windows(2).all(|w| w[0] == w[1]);
    let note = if ok { NOTE_STABLE } else { NOTE_UNSTABLE };
    if !ok {
        warn!(?run_hashes, "manifest digest unstable across resolutions");
    }

    let report = NondeterminismReport {
        target: target.to_string_lossy().into_owned(),
        n,
        ok,
        run_hashes,
        note: note.to_string(),
    };

    let dir = config.output_dir(target, out_dir);
    write_json_report(&dir, NONDETERMINISM_REPORT_JSON, &report.to_json())?;

    info!(ok = report.ok, "nondeterminism check finished");
    Ok(report)
}
