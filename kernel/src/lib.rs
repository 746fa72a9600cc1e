//! Authority Kernel: the deterministic primitives of artifact verification.
//!
//! # API Surface
//!
//! - [`proof::canon::canonical_json_bytes`] -- canonical JSON text for hashing
//! - [`proof::hash::digest_file`] -- streamed SHA-256 of a file's exact bytes
//! - [`proof::hash::digest_document`] -- SHA-256 of a document's canonical JSON
//! - [`taxonomy::category::categorize`] -- semantic category of an artifact path
//! - [`taxonomy::divergence::DivergenceClass`] -- attribution bucket for a divergence
//!
//! # Module Dependency Direction
//!
//! `taxonomy` and `proof` are independent of each other. Nothing in the
//! kernel reads manifests or writes reports; that is the replay crate's job.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod proof;
pub mod taxonomy;
