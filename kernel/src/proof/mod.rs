//! Proof module: canonical JSON and content digests.
//!
//! Every digest that ends up in a manifest comparison or a report flows
//! through [`hash`]; every JSON text that gets digested flows through [`canon`].

pub mod canon;
pub mod hash;
