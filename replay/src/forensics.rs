//! `compare()`: forensic diff of two artifact trees with divergence attribution.
//!
//! Each side is resolved independently, so a provenance-backed run can be
//! compared against a pack or a bare directory. Paths are visited in sorted
//! order, which fixes the first difference:
//!
//! 1. the lowest path whose digests differ, else
//! 2. the lowest path only in A, else
//! 3. the lowest path only in B.
//!
//! The first difference's category selects the [`DivergenceClass`].

use std::fmt::Write as _;
use std::path::Path;

use authority_kernel::proof::canon::canonical_json_bytes;
use authority_kernel::proof::hash::digest_bytes;
use authority_kernel::taxonomy::category::{categorize, ArtifactCategory};
use authority_kernel::taxonomy::divergence::DivergenceClass;
use tracing::{debug, info, instrument};

use crate::config::VerifierConfig;
use crate::error::ReplayError;
use crate::manifest::{FsResolver, ManifestResolver, ManifestSource};
use crate::report_dir::{
    write_json_report, write_markdown_report, FORENSIC_DELTA_JSON, FORENSIC_DELTA_MD,
};
use crate::SCHEMA_VERSION;

/// A path whose digest differs between A and B, or that exists on one side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaRecord {
    pub path: String,
    /// `None` when the path is absent from A.
    pub sha256_a: Option<String>,
    /// `None` when the path is absent from B.
    pub sha256_b: Option<String>,
    pub category: ArtifactCategory,
}

impl DeltaRecord {
    fn new(path: &str, sha256_a: Option<&str>, sha256_b: Option<&str>) -> Self {
        Self {
            path: path.to_string(),
            sha256_a: sha256_a.map(str::to_string),
            sha256_b: sha256_b.map(str::to_string),
            category: categorize(path),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path,
            "sha256_A": self.sha256_a,
            "sha256_B": self.sha256_b,
            "category": self.category.as_str(),
        })
    }
}

/// Result of a forensic comparison.
///
/// Invariants: `ok == (n_only_a == 0 && n_only_b == 0 && n_mismatch == 0)`,
/// and `divergence_class == DivergenceClass::None` iff `ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForensicDelta {
    pub a: String,
    pub b: String,
    pub ok: bool,
    pub n_files_a: usize,
    pub n_files_b: usize,
    pub n_common: usize,
    pub n_only_a: usize,
    pub n_only_b: usize,
    /// Total mismatches, uncapped.
    pub n_mismatch: usize,
    pub first_difference: Option<DeltaRecord>,
    pub divergence_class: DivergenceClass,
    /// Mismatches in path order, capped for report size.
    pub mismatches: Vec<DeltaRecord>,
    pub source_a: ManifestSource,
    pub source_b: ManifestSource,
}

impl ForensicDelta {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "A": self.a,
            "B": self.b,
            "ok": self.ok,
            "n_files_A": self.n_files_a,
            "n_files_B": self.n_files_b,
            "n_common": self.n_common,
            "n_only_A": self.n_only_a,
            "n_only_B": self.n_only_b,
            "n_mismatch": self.n_mismatch,
            "first_difference": self.first_difference.as_ref().map(DeltaRecord::to_json),
            "divergence_class": self.divergence_class.as_str(),
            "mismatches": self.mismatches.iter().map(DeltaRecord::to_json).collect::<Vec<_>>(),
            "source_A": self.source_a.as_str(),
            "source_B": self.source_b.as_str(),
        })
    }

    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_json_bytes(&self.to_json())
    }

    /// SHA-256 of the delta's canonical JSON.
    #[must_use]
    pub fn digest(&self) -> String {
        digest_bytes(&self.canonical_bytes())
    }

    /// Short human-readable summary.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# FORENSIC DELTA\n\n");
        let _ = write!(md, "A: `{}` ({})\n\n", self.a, self.source_a);
        let _ = write!(md, "B: `{}` ({})\n\n", self.b, self.source_b);
        let _ = write!(md, "OK: **{}**\n\n", self.ok);
        let _ = write!(
            md,
            "Common: {}  OnlyA: {}  OnlyB: {}  Mismatch: {}\n\n",
            self.n_common, self.n_only_a, self.n_only_b, self.n_mismatch
        );
        let _ = write!(md, "Divergence class: **{}**\n\n", self.divergence_class);
        if let Some(first) = &self.first_difference {
            md.push_str("## First difference\n\n");
            let _ = writeln!(md, "- path: `{}`", first.path);
            let _ = write!(md, "- category: `{}`\n\n", first.category);
        }
        md
    }
}

/// Compare two trees with the default configuration.
///
/// Reports are written to `out_dir`, which is required: a comparison
/// belongs to neither tree.
///
/// # Errors
///
/// See [`compare_with`].
pub fn compare(a: &Path, b: &Path, out_dir: &Path) -> Result<ForensicDelta, ReplayError> {
    compare_with(a, b, out_dir, &VerifierConfig::default())
}

/// Compare two trees with an explicit configuration.
///
/// # Errors
///
/// Returns [`ReplayError::Manifest`] if either side cannot be resolved and
/// [`ReplayError::Write`] if the delta cannot be persisted.
#[instrument(skip_all, fields(a = %a.display(), b = %b.display()))]
pub fn compare_with(
    a: &Path,
    b: &Path,
    out_dir: &Path,
    config: &VerifierConfig,
) -> Result<ForensicDelta, ReplayError> {
    info!("forensic comparison started");
    let resolver = FsResolver::from_config(config);
    let resolved_a = resolver.resolve(a)?;
    let resolved_b = resolver.resolve(b)?;
    let map_a = &resolved_a.hashes;
    let map_b = &resolved_b.hashes;

    // Both maps iterate in sorted path order, so these stay sorted.
    let only_a: Vec<&str> = map_a.paths().filter(|p| !map_b.contains(p)).collect();
    let only_b: Vec<&str> = map_b.paths().filter(|p| !map_a.contains(p)).collect();

    let mut n_common = 0;
    let mut mismatches = Vec::new();
    for (path, digest_a) in map_a.iter() {
        let Some(digest_b) = map_b.get(path) else {
            continue;
        };
        n_common += 1;
        if digest_a != digest_b {
            debug!(path, digest_a, digest_b, "digest mismatch");
            mismatches.push(DeltaRecord::new(path, Some(digest_a), Some(digest_b)));
        }
    }

    let first_difference = mismatches
        .first()
        .cloned()
        .or_else(|| only_a.first().map(|p| DeltaRecord::new(p, map_a.get(p), None)))
        .or_else(|| only_b.first().map(|p| DeltaRecord::new(p, None, map_b.get(p))));

    let divergence_class = DivergenceClass::for_path(first_difference.as_ref().map(|d| d.path.as_str()));
    let n_mismatch = mismatches.len();
    mismatches.truncate(config.mismatch_cap());

    let delta = ForensicDelta {
        a: a.to_string_lossy().into_owned(),
        b: b.to_string_lossy().into_owned(),
        ok: only_a.is_empty() && only_b.is_empty() && n_mismatch == 0,
        n_files_a: map_a.len(),
        n_files_b: map_b.len(),
        n_common,
        n_only_a: only_a.len(),
        n_only_b: only_b.len(),
        n_mismatch,
        first_difference,
        divergence_class,
        mismatches,
        source_a: resolved_a.source,
        source_b: resolved_b.source,
    };

    write_json_report(out_dir, FORENSIC_DELTA_JSON, &delta.to_json())?;
    write_markdown_report(out_dir, FORENSIC_DELTA_MD, &delta.to_markdown())?;

    info!(
        ok = delta.ok,
        n_common = delta.n_common,
        n_only_a = delta.n_only_a,
        n_only_b = delta.n_only_b,
        n_mismatch = delta.n_mismatch,
        divergence_class = %delta.divergence_class,
        "forensic comparison finished"
    );
    Ok(delta)
}
