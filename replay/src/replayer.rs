//! `verify()`: truth-by-replay of a target tree against its declared manifest.
//!
//! # Modes
//!
//! - `strict`: a declared environment that does not match the current one
//!   fails the run, even if every artifact verifies.
//! - `relaxed`: the environment diff is recorded but never fails the run.
//!
//! The current environment is fingerprinted in both modes. Missing files and
//! digest mismatches are recorded as failed checks; only an artifact that is
//! present but unreadable aborts the run.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use authority_kernel::proof::canon::canonical_json_bytes;
use authority_kernel::proof::hash::{digest_bytes, digest_file_chunked};
use authority_kernel::taxonomy::category::{categorize, ArtifactCategory};
use tracing::{debug, info, instrument};

use crate::config::VerifierConfig;
use crate::error::ReplayError;
use crate::fingerprint::{EnvironmentFingerprint, FieldDiff};
use crate::manifest::{FsResolver, ManifestResolver, ManifestSource};
use crate::report_dir::{write_json_report, write_markdown_report, REPLAY_REPORT_JSON, REPLAY_REPORT_MD};
use crate::SCHEMA_VERSION;

/// Note recorded on a check whose file is absent.
pub const NOTE_MISSING: &str = "missing";

/// Replay strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    Strict,
    Relaxed,
}

impl ReplayMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
        }
    }
}

impl std::str::FromStr for ReplayMode {
    type Err = ReplayError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "relaxed" => Ok(Self::Relaxed),
            _ => Err(ReplayError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ReplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayCheck {
    pub path: String,
    pub expected_sha256: String,
    /// `None` when the file is missing.
    pub actual_sha256: Option<String>,
    pub ok: bool,
    pub category: ArtifactCategory,
    /// [`NOTE_MISSING`] for absent files, empty otherwise.
    pub note: String,
}

impl ReplayCheck {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path,
            "expected_sha256": self.expected_sha256,
            "actual_sha256": self.actual_sha256,
            "ok": self.ok,
            "category": self.category.as_str(),
            "note": self.note,
        })
    }
}

/// Result of a replay run.
///
/// Invariant: `ok == (n_missing == 0 && n_mismatch == 0 &&
/// (mode != Strict || env_match != Some(false)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub target: String,
    pub mode: ReplayMode,
    pub ok: bool,
    pub n_files: usize,
    pub n_mismatch: usize,
    pub n_missing: usize,
    /// `None` when the manifest declares no environment.
    pub env_match: Option<bool>,
    /// `None` when the manifest declares no environment.
    pub env_diff: Option<BTreeMap<String, FieldDiff>>,
    pub checks: Vec<ReplayCheck>,
    pub source: ManifestSource,
}

impl ReplayReport {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let env_diff = self.env_diff.as_ref().map(|diff| {
            serde_json::Value::Object(
                diff.iter()
                    .map(|(k, d)| (k.clone(), d.to_json()))
                    .collect(),
            )
        });
        serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "target": self.target,
            "mode": self.mode.as_str(),
            "ok": self.ok,
            "n_files": self.n_files,
            "n_mismatch": self.n_mismatch,
            "n_missing": self.n_missing,
            "env_match": self.env_match,
            "env_diff": env_diff,
            "checks": self.checks.iter().map(ReplayCheck::to_json).collect::<Vec<_>>(),
            "source": self.source.as_str(),
        })
    }

    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        canonical_json_bytes(&self.to_json())
    }

    /// SHA-256 of the report's canonical JSON.
    #[must_use]
    pub fn digest(&self) -> String {
        digest_bytes(&self.canonical_bytes())
    }

    /// Short human-readable summary.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# REPLAY REPORT\n\n");
        let _ = write!(md, "Target: `{}`\n\n", self.target);
        let _ = write!(md, "Mode: `{}`\n\n", self.mode);
        let _ = write!(md, "Source: `{}`\n\n", self.source);
        let _ = write!(md, "OK: **{}**\n\n", self.ok);
        let _ = write!(
            md,
            "Files: {}  Missing: {}  Mismatch: {}\n\n",
            self.n_files, self.n_missing, self.n_mismatch
        );
        if let Some(env_match) = self.env_match {
            let _ = write!(md, "Environment match: **{env_match}**\n\n");
        }
        md
    }
}

/// Verify `target` with the default configuration and the current environment.
///
/// `mode` must be `strict` or `relaxed`. Reports are written to `out_dir`,
/// or `<target>/replay/` when `None`.
///
/// # Errors
///
/// Returns [`ReplayError::InvalidMode`] before any work for an unknown mode,
/// and see [`verify_with`] for the rest.
pub fn verify(target: &Path, mode: &str, out_dir: Option<&Path>) -> Result<ReplayReport, ReplayError> {
    let mode: ReplayMode = mode.parse()?;
    verify_with(
        target,
        mode,
        out_dir,
        &VerifierConfig::default(),
        &EnvironmentFingerprint::current(),
    )
}

/// Verify `target` against an explicit configuration and current environment.
///
/// # Errors
///
/// Returns [`ReplayError::Manifest`] if a manifest source is malformed,
/// [`ReplayError::Digest`] if a present artifact cannot be read, and
/// [`ReplayError::Write`] if the report cannot be persisted.
#[instrument(skip_all, fields(target = %target.display(), mode = %mode))]
pub fn verify_with(
    target: &Path,
    mode: ReplayMode,
    out_dir: Option<&Path>,
    config: &VerifierConfig,
    current_env: &EnvironmentFingerprint,
) -> Result<ReplayReport, ReplayError> {
    info!("replay started");
    let resolved = FsResolver::from_config(config).resolve(target)?;

    let mut checks = Vec::with_capacity(resolved.hashes.len());
    let mut n_missing = 0;
    let mut n_mismatch = 0;

    for (rel, expected) in resolved.hashes.iter() {
        let category = categorize(rel);
        let path = target.join(rel);
        if !path.exists() {
            n_missing += 1;
            debug!(path = rel, "declared artifact missing");
            checks.push(ReplayCheck {
                path: rel.to_string(),
                expected_sha256: expected.to_string(),
                actual_sha256: None,
                ok: false,
                category,
                note: NOTE_MISSING.to_string(),
            });
            continue;
        }

        let actual = digest_file_chunked(&path, config.chunk_bytes())?;
        let ok = actual == expected;
        if !ok {
            n_mismatch += 1;
            debug!(path = rel, expected, actual = %actual, "digest mismatch");
        }
        checks.push(ReplayCheck {
            path: rel.to_string(),
            expected_sha256: expected.to_string(),
            actual_sha256: Some(actual),
            ok,
            category,
            note: String::new(),
        });
    }

    let (env_match, env_diff) = match &resolved.declared_env {
        Some(declared) => {
            let diff = declared.diff(current_env);
            (Some(diff.is_empty()), Some(diff))
        }
        None => (None, None),
    };

    let mut ok = n_missing == 0 && n_mismatch == 0;
    if mode == ReplayMode::Strict && env_match == Some(false) {
        ok = false;
    }

    let report = ReplayReport {
        target: target.to_string_lossy().into_owned(),
        mode,
        ok,
        n_files: resolved.hashes.len(),
        n_mismatch,
        n_missing,
        env_match,
        env_diff,
        checks,
        source: resolved.source,
    };

    let dir = config.output_dir(target, out_dir);
    write_json_report(&dir, REPLAY_REPORT_JSON, &report.to_json())?;
    write_markdown_report(&dir, REPLAY_REPORT_MD, &report.to_markdown())?;

    info!(
        ok = report.ok,
        source = %report.source,
        n_files = report.n_files,
        n_missing = report.n_missing,
        n_mismatch = report.n_mismatch,
        env_match = ?report.env_match,
        "replay finished"
    );
    Ok(report)
}
