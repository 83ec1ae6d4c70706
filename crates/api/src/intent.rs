//! The agent intent declaration header values.

use crate::TruthError;

/// A declared purpose sent by an agent client via the `X-Agent-Intent`
/// request header. The publisher reflects the intent back via
/// `X-Agent-Intent-Reflected` but does not enforce it; an unrecognized
/// value is replaced with [AgentIntent::Discovery] plus a warning header,
/// never rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AgentIntent {
    /// Read-only content access.
    Read,
    /// Booking a reservation or appointment.
    Book,
    /// Making a purchase.
    Purchase,
    /// Contacting support.
    Support,
    /// Compliance or capability auditing.
    Audit,
    /// Capability discovery. The implicit default.
    #[default]
    Discovery,
}

impl AgentIntent {
    /// The lowercase wire form of this intent.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Book => "book",
            Self::Purchase => "purchase",
            Self::Support => "support",
            Self::Audit => "audit",
            Self::Discovery => "discovery",
        }
    }
}

impl std::fmt::Display for AgentIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentIntent {
    type Err = TruthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "book" => Ok(Self::Book),
            "purchase" => Ok(Self::Purchase),
            "support" => Ok(Self::Support),
            "audit" => Ok(Self::Audit),
            "discovery" => Ok(Self::Discovery),
            oth => Err(TruthError::schema(format!("unrecognized intent: {oth}"))),
        }
    }
}
