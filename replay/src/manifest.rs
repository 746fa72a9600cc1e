//! Manifest resolution: the authoritative path→digest map for a target.
//!
//! # Source priority
//!
//! ```text
//! <target>/
//!   provenance/file_hashes.json      1. provenance record  {"sha256": {path: digest}}
//!   provenance/env_fingerprint.json     (declared environment, optional)
//!   pack_manifest.json               2. pack manifest      {"files": [{path, sha256}]}
//!   **                               3. tree hash of every regular file
//! ```
//!
//! The first applicable source is authoritative. Sources are never merged.
//! A missing source is not an error: resolution falls through to the next
//! one, and the tree hash always applies. A source file that exists but is
//! not a JSON object is an input error.
//!
//! Resolution is stateless. Every call re-reads and re-hashes the filesystem;
//! the nondeterminism sentinel depends on that.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use authority_kernel::proof::canon::canonical_json_string;
use authority_kernel::proof::hash::{digest_document, digest_file_chunked, is_sha256_hex, HashError};
use authority_kernel::taxonomy::category::normalize_rel_path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::VerifierConfig;
use crate::fingerprint::EnvironmentFingerprint;

/// Provenance record, relative to the target.
pub const PROVENANCE_HASHES_PATH: &str = "provenance/file_hashes.json";
/// Declared environment fingerprint, relative to the target.
pub const PROVENANCE_ENV_PATH: &str = "provenance/env_fingerprint.json";
/// Pack manifest, relative to the target.
pub const PACK_MANIFEST_PATH: &str = "pack_manifest.json";

/// Immutable map from normalized relative path to hex digest, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactHashMap {
    entries: BTreeMap<String, String>,
}

impl ArtifactHashMap {
    /// Build from `(path, digest)` pairs.
    ///
    /// Paths are normalized to forward slashes. If two paths normalize to the
    /// same key, the later pair wins.
    #[must_use]
    pub fn from_entries<P, D>(entries: impl IntoIterator<Item = (P, D)>) -> Self
    where
        P: AsRef<str>,
        D: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (path, digest) in entries {
            map.insert(normalize_rel_path(path.as_ref()), digest.into());
        }
        Self { entries: map }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The map as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }

    /// Digest of the map's canonical JSON.
    #[must_use]
    pub fn digest(&self) -> String {
        digest_document(&self.to_json())
    }
}

/// Which source a manifest was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSource {
    /// `provenance/file_hashes.json`.
    Provenance,
    /// `pack_manifest.json`.
    PackManifest,
    /// Hash of the live directory tree.
    TreeHash,
}

impl ManifestSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Provenance => "provenance",
            Self::PackManifest => "pack_manifest",
            Self::TreeHash => "tree_hash",
        }
    }
}

impl std::fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved manifest and the environment it declares, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub hashes: ArtifactHashMap,
    /// Only a provenance record can declare an environment.
    pub declared_env: Option<EnvironmentFingerprint>,
    pub source: ManifestSource,
}

/// Error resolving a manifest.
#[derive(Debug)]
pub enum ManifestError {
    /// A manifest source exists but is not a JSON object.
    Malformed { path: PathBuf, detail: String },
    /// A manifest source or the target tree could not be read.
    Io { path: PathBuf, detail: String },
    /// A file could not be hashed during the tree-hash fallback.
    Digest(HashError),
    /// A file name under the target is not valid UTF-8, so it has no
    /// manifest key that still names the file.
    NonUtf8Path { path: PathBuf },
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { path, detail } => {
                write!(f, "malformed manifest {}: {detail}", path.display())
            }
            Self::Io { path, detail } => write!(f, "I/O error at {}: {detail}", path.display()),
            Self::Digest(e) => write!(f, "tree hash failed: {e}"),
            Self::NonUtf8Path { path } => {
                write!(f, "path is not valid UTF-8: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ManifestError {}

/// Resolves the authoritative manifest for a target directory.
///
/// Implementations must not cache between calls.
pub trait ManifestResolver {
    /// Resolve the manifest for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if a present source is malformed or the
    /// target cannot be read.
    fn resolve(&self, target: &Path) -> Result<ResolvedManifest, ManifestError>;
}

/// Filesystem resolver implementing the three-source priority chain.
#[derive(Debug, Clone)]
pub struct FsResolver {
    chunk_bytes: usize,
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::from_config(&VerifierConfig::default())
    }
}

impl FsResolver {
    #[must_use]
    pub fn from_config(config: &VerifierConfig) -> Self {
        Self {
            chunk_bytes: config.chunk_bytes(),
        }
    }

    fn try_provenance(target: &Path) -> Result<Option<ResolvedManifest>, ManifestError> {
        let path = target.join(PROVENANCE_HASHES_PATH);
        if !path.is_file() {
            return Ok(None);
        }
        let obj = read_json_object(&path)?;
        let Some(sha) = obj.get("sha256").and_then(serde_json::Value::as_object) else {
            debug!(path = %path.display(), "provenance record has no sha256 map; falling through");
            return Ok(None);
        };

        let hashes = ArtifactHashMap::from_entries(sha.iter().map(|(k, v)| {
            let digest = match v {
                serde_json::Value::String(s) => s.clone(),
                other => canonical_json_string(other),
            };
            (k, digest)
        }));
        warn_on_odd_digests(&hashes, &path);

        let env_path = target.join(PROVENANCE_ENV_PATH);
        let declared_env = env_path
            .exists()
            .then(|| EnvironmentFingerprint::read_declared(&env_path));

        Ok(Some(ResolvedManifest {
            hashes,
            declared_env,
            source: ManifestSource::Provenance,
        }))
    }

    fn try_pack_manifest(target: &Path) -> Result<Option<ResolvedManifest>, ManifestError> {
        let path = target.join(PACK_MANIFEST_PATH);
        if !path.is_file() {
            return Ok(None);
        }
        let obj = read_json_object(&path)?;

        let mut entries = Vec::new();
        if let Some(files) = obj.get("files").and_then(serde_json::Value::as_array) {
            for (index, item) in files.iter().enumerate() {
                let rel = item.get("path").and_then(serde_json::Value::as_str);
                let sha = item.get("sha256").and_then(serde_json::Value::as_str);
                match (rel, sha) {
                    (Some(rel), Some(sha)) if !rel.is_empty() && !sha.is_empty() => {
                        entries.push((rel, sha.to_string()));
                    }
                    _ => warn!(path = %path.display(), index, "skipping pack manifest entry without path/sha256"),
                }
            }
        } else {
            warn!(path = %path.display(), "pack manifest has no files list");
        }

        let hashes = ArtifactHashMap::from_entries(entries);
        warn_on_odd_digests(&hashes, &path);

        Ok(Some(ResolvedManifest {
            hashes,
            declared_env: None,
            source: ManifestSource::PackManifest,
        }))
    }

    fn tree_hash(&self, target: &Path) -> Result<ResolvedManifest, ManifestError> {
        let mut entries = Vec::new();
        // Links are followed so the walk sees what a manifest replay would
        // open; walkdir reports link cycles instead of descending forever.
        for entry in WalkDir::new(target).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_unhashable_link(&e) => {
                    warn!(path = ?e.path(), error = %e, "skipping dangling or cyclic link");
                    continue;
                }
                Err(e) => {
                    return Err(ManifestError::Io {
                        path: e.path().map_or_else(|| target.to_path_buf(), Path::to_path_buf),
                        detail: e.to_string(),
                    })
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry.path().strip_prefix(target).unwrap_or(entry.path());
            let Some(key) = rel.to_str() else {
                return Err(ManifestError::NonUtf8Path {
                    path: entry.path().to_path_buf(),
                });
            };
            let digest =
                digest_file_chunked(entry.path(), self.chunk_bytes).map_err(ManifestError::Digest)?;
            entries.push((key.to_string(), digest));
        }

        Ok(ResolvedManifest {
            hashes: ArtifactHashMap::from_entries(entries),
            declared_env: None,
            source: ManifestSource::TreeHash,
        })
    }
}

/// A walk error for a link whose target is absent or an ancestor directory.
/// Neither names a file a manifest replay could open.
fn is_unhashable_link(err: &walkdir::Error) -> bool {
    if err.loop_ancestor().is_some() {
        return true;
    }
    err.path().is_some_and(|p| {
        p.symlink_metadata()
            .is_ok_and(|m| m.file_type().is_symlink())
            && !p.exists()
    })
}

impl ManifestResolver for FsResolver {
    fn resolve(&self, target: &Path) -> Result<ResolvedManifest, ManifestError> {
        let resolved = if let Some(found) = Self::try_provenance(target)? {
            found
        } else if let Some(found) = Self::try_pack_manifest(target)? {
            found
        } else {
            self.tree_hash(target)?
        };
        debug!(
            target = %target.display(),
            source = %resolved.source,
            n_files = resolved.hashes.len(),
            "manifest resolved"
        );
        Ok(resolved)
    }
}

/// Resolve `target` with the default filesystem resolver.
///
/// # Errors
///
/// See [`ManifestResolver::resolve`].
pub fn resolve(target: &Path) -> Result<ResolvedManifest, ManifestError> {
    FsResolver::default().resolve(target)
}

fn read_json_object(
    path: &Path,
) -> Result<serde_json::Map<String, serde_json::Value>, ManifestError> {
    let bytes = std::fs::read(path).map_err(|e| ManifestError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| ManifestError::Malformed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(ManifestError::Malformed {
            path: path.to_path_buf(),
            detail: "top-level value is not a JSON object".into(),
        }),
    }
}

fn warn_on_odd_digests(hashes: &ArtifactHashMap, source: &Path) {
    for (rel, digest) in hashes.iter() {
        if !is_sha256_hex(digest) {
            warn!(source = %source.display(), path = rel, digest, "declared digest is not lowercase sha256 hex");
        }
    }
}
