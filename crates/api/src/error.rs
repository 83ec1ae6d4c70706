//! agent-truth error types.

use std::sync::Arc;

/// The core agent-truth error type, used across the api, core, publisher,
/// and client crates.
///
/// This type is required to implement `Clone` so results can be shared
/// across futures and cached without re-running the work that produced
/// them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TruthError {
    /// Malformed or non-conforming JSON: the body failed to parse, or it
    /// parsed but matches neither the signed envelope nor the plain truth
    /// document shape. Recoverable; a caller may retry elsewhere or report
    /// to the user.
    #[error("schema error: {0}")]
    Schema(Arc<str>),

    /// A malformed signed envelope, an invalid signature, or a signature
    /// made under a different key. Never recovered automatically, never
    /// downgraded to a plain-document interpretation.
    #[error("security violation: {0}")]
    SecurityViolation(Arc<str>),

    /// Malformed hex or malformed key material. Distinct from a signature
    /// verification failure.
    #[error("key format error: {0}")]
    KeyFormat(Arc<str>),

    /// The publisher is misconfigured, e.g. a private key without a
    /// matching public key. Fatal to the response it occurred in.
    #[error("configuration error: {0}")]
    Configuration(Arc<str>),

    /// A transport-level failure. The caller decides retry policy; the
    /// protocol performs no implicit retries.
    #[error("network error: {0}")]
    Network(Arc<str>),

    /// The bounded fetch timeout elapsed before a response arrived.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl TruthError {
    /// Construct a [TruthError::Schema] error.
    pub fn schema<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Schema(ctx.to_string().into_boxed_str().into())
    }

    /// Construct a [TruthError::SecurityViolation] error.
    pub fn security<C: std::fmt::Display>(ctx: C) -> Self {
        Self::SecurityViolation(ctx.to_string().into_boxed_str().into())
    }

    /// Construct a [TruthError::KeyFormat] error.
    pub fn key_format<C: std::fmt::Display>(ctx: C) -> Self {
        Self::KeyFormat(ctx.to_string().into_boxed_str().into())
    }

    /// Construct a [TruthError::Configuration] error.
    pub fn configuration<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Configuration(ctx.to_string().into_boxed_str().into())
    }

    /// Construct a [TruthError::Network] error.
    pub fn network<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Network(ctx.to_string().into_boxed_str().into())
    }
}

/// The core agent-truth result type.
pub type TruthResult<T> = Result<T, TruthError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "schema error: bad json",
            TruthError::schema("bad json").to_string().as_str(),
        );
        assert_eq!(
            "security violation: invalid signature",
            TruthError::security("invalid signature")
                .to_string()
                .as_str(),
        );
        assert_eq!(
            "timed out after 5s",
            TruthError::Timeout(std::time::Duration::from_secs(5))
                .to_string()
                .as_str(),
        );
    }

    #[test]
    fn error_clone_keeps_variant() {
        let err = TruthError::security("tampered");
        assert!(matches!(err.clone(), TruthError::SecurityViolation(_)));
    }
}
