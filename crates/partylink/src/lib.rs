//! # Partylink
//!
//! Party presence sessions over a local remote-procedure pipe.
//!
//! Partylink wraps an [`RpcClient`] — the external client that talks to
//! the local desktop application — and exposes multiplayer-lobby presence
//! fields as simple typed accessors, synchronizing the full status
//! snapshot to the peer on demand or continuously.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use partylink::{Party, PartyConfig};
//!
//! let mut party = Party::connect(PartyConfig::default(), client).await?;
//! party.set_state("Looking for Players");
//! party.set_party_id(42i64)?;
//! party.set_join_secret("abc");
//! party.set_size(1);
//! party.set_max(4);
//! party.update().await?;
//!
//! // Repaint the lobby screen twice a second until someone joins.
//! let secret = party
//!     .wait_for_join_with(|| async { repaint().await }, Duration::from_millis(500))
//!     .await?;
//! ```
//!
//! A session whose peer isn't running is not an error by default: the
//! session absorbs the failed connect and every operation becomes a
//! silent no-op, so games need not branch on whether the desktop app is
//! up. See [`FailurePolicy`].

mod client;
mod config;
mod error;
mod session;
mod updater;

pub use config::{CallbackPolicy, FailurePolicy, PartyConfig};
pub use error::{CallbackError, PartyError};
pub use session::{ConnectionStatus, Party, DEFAULT_WAIT_INTERVAL};

// Re-export the sub-crate surfaces callers need.
pub use partylink_rpc::{
    EventKind, EventPayload, EventSink, RpcClient, RpcError,
};
pub use partylink_status::{
    Field, FieldKind, FieldValue, PartyStatus, StatusError, StatusSnapshot,
    FIELD_TABLE, PID_KEY,
};
