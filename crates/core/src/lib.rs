#![deny(missing_docs)]
//! Cryptographic trust for the agent.json site truth protocol.
//!
//! Two concerns live here, both operating on the canonical encoding
//! defined in `agent_truth_api`:
//!
//! - [crypto]: Ed25519 key import/export in the protocol's hex wire
//!   forms, and sign/verify over canonical bytes.
//! - [envelope]: the client-side fail-closed decision procedure that
//!   classifies an inbound body as a signed envelope or a plain truth
//!   document and either verifies it or rejects it. A body that looks
//!   signed is processed exclusively through the signature path; there is
//!   no fallback to unsigned acceptance.

pub mod crypto;
pub use crypto::{generate_keypair, sign, verify};

mod envelope;
pub use envelope::*;
