//! Authority Replay: truth-by-replay verification of run artifacts.
//!
//! Three operations, each of which either fails with an input error before
//! doing any work or completes and persists a report:
//!
//! - [`replayer::verify`] -- re-hash a target tree against its declared manifest
//! - [`forensics::compare`] -- diff two trees and attribute the first divergence
//! - [`sentinel::check`] -- repeat manifest resolution and assert digest stability
//!
//! All three resolve manifests through [`manifest::ManifestResolver`]. The
//! kernel supplies hashing, canonical JSON and the path taxonomy; this crate
//! never hashes or serializes for hashing on its own.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod forensics;
pub mod manifest;
pub mod replayer;
pub mod report_dir;
pub mod sentinel;

/// Schema version stamped into every report.
pub const SCHEMA_VERSION: &str = "v8.0.0";
