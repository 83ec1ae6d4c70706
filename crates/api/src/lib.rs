#![deny(missing_docs)]
//! Wire types and canonical encoding for the agent.json site truth
//! discovery protocol.
//!
//! A site publishes an authoritative description of its capabilities (a
//! [TruthDocument]) at `/.well-known/agent.json`, optionally wrapped in a
//! [SignedEnvelope] proving it was produced by the holder of an Ed25519
//! private key. This crate defines those wire shapes, the intent header
//! enumeration, the deterministic [canonical] encoding that both signing
//! and verification operate on, and the error taxonomy shared by the
//! publisher and client crates.
//!
//! Cryptography and the fail-closed envelope validation live in
//! `agent_truth_core`; HTTP plumbing lives in `agent_truth_srv` and
//! `agent_truth_client`.

mod error;
pub use error::*;

pub mod canonical;
pub use canonical::canonicalize;

mod intent;
pub use intent::*;

mod truth;
pub use truth::*;
