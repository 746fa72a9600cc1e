//! Divergence attribution buckets.
//!
//! A forensic comparison reports a single [`DivergenceClass`] derived from the
//! category of its first differing path.

use super::category::{categorize, ArtifactCategory};

define_labels! {
    /// Actionable bucket for the first divergence between two artifact trees.
    DivergenceClass {
        /// The trees agree.
        None => "NONE",
        /// A contract or coil mapping changed.
        Contract => "CONTRACT",
        /// Code, environment, or provenance changed.
        CodeEnv => "CODE_ENV",
        /// Machine reference data changed.
        DataAuthority => "DATA_AUTHORITY",
        /// An audit-layer artifact changed.
        AuditLayer => "AUDIT_LAYER",
        /// Reconstruction output changed.
        DataOutput => "DATA_OUTPUT",
    }
}

impl DivergenceClass {
    /// Fixed mapping from artifact category to divergence bucket.
    #[must_use]
    pub const fn from_category(category: ArtifactCategory) -> Self {
        match category {
            ArtifactCategory::Contracts => Self::Contract,
            ArtifactCategory::CodeEnvProvenance => Self::CodeEnv,
            ArtifactCategory::MachineAuthority => Self::DataAuthority,
            ArtifactCategory::Audits => Self::AuditLayer,
            ArtifactCategory::DataOutput => Self::DataOutput,
        }
    }

    /// Bucket for an optional first-difference path; `None` maps to [`Self::None`].
    #[must_use]
    pub fn for_path(path: Option<&str>) -> Self {
        path.map_or(Self::None, |p| Self::from_category(categorize(p)))
    }
}
