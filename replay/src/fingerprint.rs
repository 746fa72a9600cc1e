//! Environment fingerprints: the conditions an artifact tree was produced under.
//!
//! A fingerprint is a flat string-to-string map. The `created_utc` key records
//! when the fingerprint was taken, which is provenance rather than state, so
//! it never participates in equality or diffs.

use std::collections::BTreeMap;
use std::path::Path;

use authority_kernel::proof::canon::canonical_json_string;
use chrono::{SecondsFormat, Utc};

/// Runtime name and version.
pub const RUNTIME_KEY: &str = "runtime";
/// Operating system and architecture.
pub const PLATFORM_KEY: &str = "platform";
/// Creation timestamp (RFC 3339, UTC). Excluded from comparison.
pub const CREATED_UTC_KEY: &str = "created_utc";
/// Marker key for a declared fingerprint that could not be read.
pub const UNREADABLE_KEY: &str = "unreadable";

/// A declared or current environment fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvironmentFingerprint {
    fields: BTreeMap<String, String>,
}

/// One differing fingerprint field. An absent side is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub declared: Option<String>,
    pub current: Option<String>,
}

impl FieldDiff {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "declared": self.declared,
            "current": self.current,
        })
    }
}

impl EnvironmentFingerprint {
    /// Build from explicit fields.
    #[must_use]
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Fingerprint of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self::from_fields([
            (
                RUNTIME_KEY,
                format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            ),
            (
                PLATFORM_KEY,
                format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            ),
            (
                CREATED_UTC_KEY,
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ])
    }

    /// Build from a declared JSON document.
    ///
    /// String values are taken verbatim; any other value is recorded as its
    /// canonical JSON text. A non-object document yields an unreadable marker.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::unreadable(&format!(
                "expected JSON object, got {}",
                canonical_json_string(value)
            ));
        };
        Self {
            fields: obj
                .iter()
                .map(|(k, v)| {
                    let text = match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => canonical_json_string(other),
                    };
                    (k.clone(), text)
                })
                .collect(),
        }
    }

    /// Read a declared fingerprint file, best-effort.
    ///
    /// Read or parse failures do not abort verification: the result carries
    /// a single [`UNREADABLE_KEY`] field holding the error, which then shows
    /// up in the environment diff.
    #[must_use]
    pub fn read_declared(path: &Path) -> Self {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "declared fingerprint unreadable");
                return Self::unreadable(&format!("read {}: {e}", path.display()));
            }
        };
        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => Self::from_json(&value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "declared fingerprint is not JSON");
                Self::unreadable(&format!("parse {}: {e}", path.display()))
            }
        }
    }

    /// Inline error marker standing in for an unreadable fingerprint.
    #[must_use]
    pub fn unreadable(detail: &str) -> Self {
        Self::from_fields([(UNREADABLE_KEY, detail)])
    }

    /// Field value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// All fields, sorted by key.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Copy with `key` set to `value`.
    #[must_use]
    pub fn with_field(&self, key: &str, value: &str) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.to_string(), value.to_string());
        Self { fields }
    }

    /// Fields that participate in comparison (everything but `created_utc`).
    fn stable_fields(&self) -> impl Iterator<Item = (&String, &String)> {
        self.fields.iter().filter(|(k, _)| k.as_str() != CREATED_UTC_KEY)
    }

    /// Field-level diff of `self` (declared) against `current`.
    ///
    /// `created_utc` is dropped from both sides first. Keys are visited in
    /// sorted order over the union of both sides.
    #[must_use]
    pub fn diff(&self, current: &Self) -> BTreeMap<String, FieldDiff> {
        let declared: BTreeMap<&String, &String> = self.stable_fields().collect();
        let now: BTreeMap<&String, &String> = current.stable_fields().collect();

        let mut keys: Vec<&String> = declared.keys().chain(now.keys()).copied().collect();
        keys.sort();
        keys.dedup();

        let mut diff = BTreeMap::new();
        for key in keys {
            let d = declared.get(key).map(|v| (*v).clone());
            let c = now.get(key).map(|v| (*v).clone());
            if d != c {
                diff.insert(key.clone(), FieldDiff { declared: d, current: c });
            }
        }
        diff
    }

    /// Whether the fingerprints agree on every key except `created_utc`.
    #[must_use]
    pub fn matches(&self, current: &Self) -> bool {
        self.diff(current).is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }
}
