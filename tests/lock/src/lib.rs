//! Lock-test support for the artifact authority workspace.
//!
//! Integration tests live in `tests/`; the `replay_fixture` binary is spawned
//! by the cross-process determinism test through [`fixture_process`].

pub mod run_tree;
pub mod tracing_setup;
