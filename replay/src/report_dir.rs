//! Report persistence.
//!
//! # Directory layout
//!
//! ```text
//! <out_dir>/
//!   REPLAY_REPORT.json            — canonical JSON + "\n"
//!   REPLAY_REPORT.md              — human summary
//!   FORENSIC_DELTA.json           — canonical JSON + "\n"
//!   FORENSIC_DELTA.md             — human summary
//!   NONDETERMINISM_REPORT.json    — canonical JSON + "\n"
//! ```
//!
//! JSON reports go through the kernel canonicalizer, so identical inputs give
//! byte-identical files. Each file is written via temp file + rename; two
//! writers racing on the same directory are last-writer-wins.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use authority_kernel::proof::canon::canonical_json_bytes;
use tempfile::NamedTempFile;

pub const REPLAY_REPORT_JSON: &str = "REPLAY_REPORT.json";
pub const REPLAY_REPORT_MD: &str = "REPLAY_REPORT.md";
pub const FORENSIC_DELTA_JSON: &str = "FORENSIC_DELTA.json";
pub const FORENSIC_DELTA_MD: &str = "FORENSIC_DELTA.md";
pub const NONDETERMINISM_REPORT_JSON: &str = "NONDETERMINISM_REPORT.json";

/// Error writing a report.
#[derive(Debug)]
pub enum ReportWriteError {
    /// I/O error during write.
    Io { detail: String },
}

impl std::fmt::Display for ReportWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
        }
    }
}

impl std::error::Error for ReportWriteError {}

/// Canonical JSON file content: canonical bytes plus a trailing newline.
#[must_use]
pub fn json_report_bytes(value: &serde_json::Value) -> Vec<u8> {
    let mut bytes = canonical_json_bytes(value);
    bytes.push(b'\n');
    bytes
}

/// Write `value` as canonical JSON to `<dir>/<filename>`, creating `dir`.
///
/// # Errors
///
/// Returns [`ReportWriteError`] on I/O failure.
pub fn write_json_report(
    dir: &Path,
    filename: &str,
    value: &serde_json::Value,
) -> Result<PathBuf, ReportWriteError> {
    write_report(dir, filename, &json_report_bytes(value))
}

/// Write a markdown summary to `<dir>/<filename>`, creating `dir`.
///
/// # Errors
///
/// Returns [`ReportWriteError`] on I/O failure.
pub fn write_markdown_report(
    dir: &Path,
    filename: &str,
    text: &str,
) -> Result<PathBuf, ReportWriteError> {
    write_report(dir, filename, text.as_bytes())
}

fn write_report(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf, ReportWriteError> {
    std::fs::create_dir_all(dir).map_err(|e| ReportWriteError::Io {
        detail: format!("create_dir_all {}: {e}", dir.display()),
    })?;
    let path = dir.join(filename);
    write_atomic(&path, content)?;
    Ok(path)
}

/// Write bytes to a path via a uniquely named temp file in the same
/// directory, then rename over the target. Concurrent writers never share a
/// temp file, so the last rename wins.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ReportWriteError> {
    let dir = path.parent().ok_or_else(|| ReportWriteError::Io {
        detail: "no parent directory".into(),
    })?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ReportWriteError::Io {
        detail: format!("create temp file in {}: {e}", dir.display()),
    })?;
    temp.write_all(content).map_err(|e| ReportWriteError::Io {
        detail: format!("write {}: {e}", temp.path().display()),
    })?;

    temp.persist(path).map_err(|e| ReportWriteError::Io {
        detail: format!("rename {} → {}: {}", e.file.path().display(), path.display(), e.error),
    })?;

    Ok(())
}
