//! Artifact path categorization.
//!
//! [`categorize`] maps a relative artifact path onto a fixed taxonomy by an
//! ordered list of prefix/substring rules. The first matching rule wins.
//! Separators are normalized before matching, so `contracts\pf.json` and
//! `contracts/pf.json` land in the same category on every platform.

define_labels! {
    /// Semantic category of an artifact path.
    ArtifactCategory {
        /// Provenance records, the run manifest, and repository state.
        CodeEnvProvenance => "CODE_ENV_PROVENANCE",
        /// Machine contracts and coil mappings.
        Contracts => "CONTRACTS",
        /// Snapshots of machine reference data.
        MachineAuthority => "MACHINE_AUTHORITY",
        /// Robustness, physics-audit, and model-form layers.
        Audits => "AUDITS",
        /// Everything else: the reconstruction's own outputs.
        DataOutput => "DATA_OUTPUT",
    }
}

/// Namespace holding provenance records.
pub const PROVENANCE_PREFIX: &str = "provenance/";

/// Run-level manifest filename (only at the tree root).
pub const RUN_MANIFEST_FILENAME: &str = "manifest.json";

/// Suffix of the repository-state snapshot.
pub const REPO_STATE_SUFFIX: &str = "repo_state.json";

const CONTRACTS_PREFIX: &str = "contracts/";
const CONTRACT_MARKERS: &[&str] = &["coil", "contract"];
const MACHINE_AUTHORITY_PREFIXES: &[&str] = &["machine_authority_snapshot", "machine_authority"];
const AUDIT_PREFIXES: &[&str] = &["robustness_v4/", "robustness/", "physics_audit", "model_form"];

/// Normalize a relative path: backslashes become forward slashes.
#[must_use]
pub fn normalize_rel_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Categorize a relative artifact path.
#[must_use]
pub fn categorize(path: &str) -> ArtifactCategory {
    let p = normalize_rel_path(path);

    if p.starts_with(PROVENANCE_PREFIX) || p == RUN_MANIFEST_FILENAME || p.ends_with(REPO_STATE_SUFFIX)
    {
        return ArtifactCategory::CodeEnvProvenance;
    }

    let lower = p.to_lowercase();
    if p.starts_with(CONTRACTS_PREFIX) || CONTRACT_MARKERS.iter().any(|m| lower.contains(m)) {
        return ArtifactCategory::Contracts;
    }

    if MACHINE_AUTHORITY_PREFIXES.iter().any(|prefix| p.starts_with(prefix)) {
        return ArtifactCategory::MachineAuthority;
    }

    if AUDIT_PREFIXES.iter().any(|prefix| p.starts_with(prefix)) {
        return ArtifactCategory::Audits;
    }

    ArtifactCategory::DataOutput
}
