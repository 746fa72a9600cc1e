//! Content digests: SHA-256, lowercase hex.
//!
//! **Exactly one place defines how artifacts are digested.** A file digest is
//! the SHA-256 of its exact bytes (no newline translation, no decoding), so the
//! value matches any other SHA-256 implementation over the same bytes. A
//! document digest is the SHA-256 of its canonical JSON text.

use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::canon::canonical_json_bytes;

/// Default read size for [`digest_file`] (1 MiB).
pub const DEFAULT_CHUNK_BYTES: usize = 1024 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Error digesting a file.
#[derive(Debug)]
pub enum HashError {
    /// The file could not be opened.
    Open { path: PathBuf, detail: String },
    /// A read failed part-way through the file.
    Read { path: PathBuf, detail: String },
}

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, detail } => {
                write!(f, "cannot open {}: {detail}", path.display())
            }
            Self::Read { path, detail } => {
                write!(f, "cannot read {}: {detail}", path.display())
            }
        }
    }
}

impl std::error::Error for HashError {}

/// SHA-256 of a byte slice, lowercase hex.
#[must_use]
pub fn digest_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of the UTF-8 encoding of `text`, lowercase hex.
#[must_use]
pub fn digest_text(text: &str) -> String {
    digest_bytes(text.as_bytes())
}

/// SHA-256 of a document's canonical JSON text.
///
/// Two documents that differ only in key order or whitespace produce the
/// same digest.
#[must_use]
pub fn digest_document(value: &serde_json::Value) -> String {
    digest_bytes(&canonical_json_bytes(value))
}

/// SHA-256 of a file's exact byte content, read in [`DEFAULT_CHUNK_BYTES`] chunks.
///
/// # Errors
///
/// Returns [`HashError`] if the file cannot be opened or read.
pub fn digest_file(path: &Path) -> Result<String, HashError> {
    digest_file_chunked(path, DEFAULT_CHUNK_BYTES)
}

/// SHA-256 of a file's exact byte content, read `chunk_bytes` at a time.
///
/// Memory use is bounded by `chunk_bytes` regardless of file size. A
/// `chunk_bytes` of zero is treated as one.
///
/// # Errors
///
/// Returns [`HashError`] if the file cannot be opened or read.
pub fn digest_file_chunked(path: &Path, chunk_bytes: usize) -> Result<String, HashError> {
    let mut file = std::fs::File::open(path).map_err(|e| HashError::Open {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; chunk_bytes.max(1)];
    loop {
        let n = match file.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(HashError::Read {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })
            }
        };
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Whether `s` looks like a lowercase hex SHA-256 digest.
///
/// Informational only: declared digests are compared by exact string
/// equality whether or not they pass this check.
#[must_use]
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
