//! Party event kinds and the payload they deliver.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RpcError;

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The remote events a party session can wait on.
///
/// Serializes to the peer's wire names (`ACTIVITY_JOIN`,
/// `ACTIVITY_SPECTATE`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A party join request targeted at the current user.
    ActivityJoin,
    /// A spectate request targeted at the current user.
    ActivitySpectate,
}

impl EventKind {
    /// The wire name the peer uses for this event.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::ActivityJoin => "ACTIVITY_JOIN",
            Self::ActivitySpectate => "ACTIVITY_SPECTATE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

/// The body of a delivered party event.
///
/// Both join and spectate events carry a `secret` — the opaque string that
/// authorizes joining (or spectating) the originating party. Any other
/// fields the peer includes are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// The authorizing secret. Required by the protocol, but modeled as
    /// optional so a violating peer produces a typed error instead of a
    /// deserialization failure.
    pub secret: Option<String>,

    /// Whatever else the peer attached to the event.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EventPayload {
    /// A payload carrying just a secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            extra: serde_json::Map::new(),
        }
    }

    /// A payload with no fields at all — what a misbehaving peer sends.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The authorizing secret.
    ///
    /// # Errors
    /// [`RpcError::MissingField`] when the peer omitted it.
    pub fn secret(&self) -> Result<&str, RpcError> {
        self.secret
            .as_deref()
            .ok_or(RpcError::MissingField("secret"))
    }
}
