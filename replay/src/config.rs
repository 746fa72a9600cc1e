//! Verifier configuration.
//!
//! Every field is an override; `None` keeps the default. The public entry
//! points ([`crate::replayer::verify`], [`crate::forensics::compare`],
//! [`crate::sentinel::check`]) run with `VerifierConfig::default()`, and the
//! `*_with` variants accept an explicit config.

use std::path::{Path, PathBuf};

use authority_kernel::proof::hash::DEFAULT_CHUNK_BYTES;

/// Maximum mismatch records persisted in a forensic delta.
pub const DEFAULT_MISMATCH_CAP: usize = 200;

/// Subdirectory of the target that receives replay and sentinel reports.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "replay";

/// Overrides for verification runs.
#[derive(Debug, Clone, Default)]
pub struct VerifierConfig {
    /// Read size for file hashing. `None` uses [`DEFAULT_CHUNK_BYTES`].
    pub hash_chunk_bytes: Option<usize>,
    /// Cap on persisted forensic mismatch records. `None` uses
    /// [`DEFAULT_MISMATCH_CAP`]. Counts are never capped.
    pub mismatch_cap: Option<usize>,
    /// Output subdirectory used when no output directory is given.
    /// `None` uses [`DEFAULT_OUTPUT_SUBDIR`].
    pub output_subdir: Option<String>,
}

impl VerifierConfig {
    /// Effective hashing chunk size.
    #[must_use]
    pub fn chunk_bytes(&self) -> usize {
        self.hash_chunk_bytes.unwrap_or(DEFAULT_CHUNK_BYTES)
    }

    /// Effective mismatch cap.
    #[must_use]
    pub fn mismatch_cap(&self) -> usize {
        self.mismatch_cap.unwrap_or(DEFAULT_MISMATCH_CAP)
    }

    /// Output directory for a target: `out_dir` if given, else
    /// `<target>/<output_subdir>`.
    #[must_use]
    pub fn output_dir(&self, target: &Path, out_dir: Option<&Path>) -> PathBuf {
        match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => target.join(self.output_subdir.as_deref().unwrap_or(DEFAULT_OUTPUT_SUBDIR)),
        }
    }
}
