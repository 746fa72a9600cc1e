//! Typed operation errors.
//!
//! `ReplayError` covers failures that stop an operation from producing a
//! report: invalid inputs, a manifest source that cannot be parsed, and a
//! declared artifact that exists but cannot be read. Missing files and digest
//! mismatches are never errors; they are recorded in the report.

use authority_kernel::proof::hash::HashError;

use crate::manifest::ManifestError;
use crate::report_dir::ReportWriteError;

/// Failure of a replay, comparison, or sentinel run.
#[derive(Debug)]
pub enum ReplayError {
    /// Replay mode is neither `strict` nor `relaxed`.
    InvalidMode { value: String },
    /// Sentinel repeat count is below 2.
    InvalidRepeatCount { n: usize },
    /// A manifest source could not be resolved.
    Manifest(ManifestError),
    /// A declared artifact exists but could not be hashed.
    Digest(HashError),
    /// The report could not be persisted.
    Write(ReportWriteError),
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMode { value } => {
                write!(f, "mode must be 'strict' or 'relaxed', got {value:?}")
            }
            Self::InvalidRepeatCount { n } => write!(f, "n must be >= 2, got {n}"),
            Self::Manifest(e) => write!(f, "manifest error: {e}"),
            Self::Digest(e) => write!(f, "digest error: {e}"),
            Self::Write(e) => write!(f, "report write error: {e}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Manifest(e) => Some(e),
            Self::Digest(e) => Some(e),
            Self::Write(e) => Some(e),
            Self::InvalidMode { .. } | Self::InvalidRepeatCount { .. } => None,
        }
    }
}

impl From<ManifestError> for ReplayError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e)
    }
}

impl From<HashError> for ReplayError {
    fn from(e: HashError) -> Self {
        Self::Digest(e)
    }
}

impl From<ReportWriteError> for ReplayError {
    fn from(e: ReportWriteError) -> Self {
        Self::Write(e)
    }
}
