#![deny(missing_docs)]
//! The agent-truth publisher: an HTTP server answering
//! `GET /.well-known/agent.json` with a site's truth document.
//!
//! The response body is always derived from the same canonical encoding
//! the signature (when keys are configured) is bound to:
//!
//! - no keys configured: the body is the canonical payload bytes
//!   themselves (unsigned mode is an explicit operator choice);
//! - keys configured: the body is a signed envelope wrapping the payload,
//!   constructed fresh for every response.
//!
//! Either way the server reflects the client's declared intent, derives
//! an `ETag` from the canonical bytes, and answers conditional requests
//! with `304` before doing any signing work.
//!
//! The HTTP layer itself is deliberately boring: an axum router on a
//! dedicated tokio thread feeds a bounded channel, and blocking worker
//! threads produce the responses.

mod config;
pub use config::*;

mod publisher;
use publisher::*;

mod http;
use http::*;

mod server;
pub use server::*;

#[cfg(test)]
mod test;
