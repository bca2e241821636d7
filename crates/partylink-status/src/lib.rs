//! Presence data model for Partylink.
//!
//! This crate defines the party status mapping that gets transmitted
//! wholesale to the remote peer on every update:
//!
//! - **Fields** ([`Field`], [`FieldKind`], [`FIELD_TABLE`]) — the declarative
//!   table of every recognized presence field and its storage key.
//! - **Values** ([`FieldValue`]) — the three value shapes a field can hold
//!   (text, integer, or the size/max pair).
//! - **Status** ([`PartyStatus`], [`StatusSnapshot`]) — the mapping itself
//!   and the serializable snapshot sent to the peer.
//! - **Errors** ([`StatusError`]) — what can go wrong when setting a field.
//!
//! # Architecture
//!
//! The status layer sits below the session. It knows nothing about
//! connections or events — it only knows which fields exist, how they are
//! stored, and how a snapshot serializes.
//!
//! ```text
//! Session (party lifecycle) → Status (this crate) → JSON on the wire
//! ```

mod error;
mod fields;
mod status;

pub use error::StatusError;
pub use fields::{Field, FieldKind, FieldSpec, FieldValue, FIELD_TABLE};
pub use status::{PartyStatus, StatusSnapshot, PID_KEY};
