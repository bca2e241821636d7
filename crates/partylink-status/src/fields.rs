//! The declarative field table: every recognized presence field, its
//! storage key on the wire, and the value shape it accepts.
//!
//! The table replaces accessor metaprogramming — one static array drives
//! the generic getter/setter/delete in [`PartyStatus`](crate::PartyStatus),
//! and the session's typed accessors are thin wrappers over it.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A recognized presence field.
///
/// `Size` and `Max` are halves of one paired storage entry (`party_size`):
/// setting one before the other initializes both halves to that value, and
/// afterwards each setter overwrites only its own half. This keeps a
/// `size` update from clobbering `max` and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Identifier of the player's party, lobby, or group.
    PartyId,
    /// Opaque string that authorizes joining this party. Must differ from
    /// the party id — the peer rejects activities where they match.
    JoinSecret,
    /// Opaque string that authorizes spectating.
    SpectateSecret,
    /// The user's current status line.
    State,
    /// What the player is currently doing.
    Details,
    /// Epoch seconds for game start.
    StartTime,
    /// Epoch seconds for game end.
    EndTime,
    /// Asset name for the large profile artwork.
    LargeImage,
    /// Tooltip for the large image.
    LargeText,
    /// Asset name for the small profile artwork.
    SmallImage,
    /// Tooltip for the small image.
    SmallText,
    /// Current party occupancy (low half of the pair).
    Size,
    /// Party capacity (high half of the pair).
    Max,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().key)?;
        // Both halves share one key; disambiguate in messages.
        match self {
            Self::Size => f.write_str("[size]"),
            Self::Max => f.write_str("[max]"),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// The value shape a field accepts, as declared in the field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Epoch seconds (signed to allow pre-1970 test fixtures).
    Epoch,
    /// Either text or an integer — party ids come in both shapes.
    Identifier,
    /// Low half of the `party_size` pair.
    PairLow,
    /// High half of the `party_size` pair.
    PairHigh,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Epoch => write!(f, "epoch-seconds"),
            Self::Identifier => write!(f, "text-or-integer"),
            Self::PairLow | Self::PairHigh => write!(f, "party-size"),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec and the table
// ---------------------------------------------------------------------------

/// One row of the field table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// The field this row describes.
    pub field: Field,
    /// The storage key used in transmitted snapshots.
    pub key: &'static str,
    /// The value shape the field accepts.
    pub kind: FieldKind,
}

/// The complete table of recognized fields.
///
/// Storage keys match what the remote peer's activity payload expects.
/// `Size` and `Max` share the `party_size` key.
pub const FIELD_TABLE: &[FieldSpec] = &[
    FieldSpec { field: Field::PartyId, key: "party_id", kind: FieldKind::Identifier },
    FieldSpec { field: Field::JoinSecret, key: "join", kind: FieldKind::Text },
    FieldSpec { field: Field::SpectateSecret, key: "spectate", kind: FieldKind::Text },
    FieldSpec { field: Field::State, key: "state", kind: FieldKind::Text },
    FieldSpec { field: Field::Details, key: "details", kind: FieldKind::Text },
    FieldSpec { field: Field::StartTime, key: "start", kind: FieldKind::Epoch },
    FieldSpec { field: Field::EndTime, key: "end", kind: FieldKind::Epoch },
    FieldSpec { field: Field::LargeImage, key: "large_image", kind: FieldKind::Text },
    FieldSpec { field: Field::LargeText, key: "large_text", kind: FieldKind::Text },
    FieldSpec { field: Field::SmallImage, key: "small_image", kind: FieldKind::Text },
    FieldSpec { field: Field::SmallText, key: "small_text", kind: FieldKind::Text },
    FieldSpec { field: Field::Size, key: "party_size", kind: FieldKind::PairLow },
    FieldSpec { field: Field::Max, key: "party_size", kind: FieldKind::PairHigh },
];

impl Field {
    /// Looks up this field's row in [`FIELD_TABLE`].
    pub fn spec(self) -> &'static FieldSpec {
        FIELD_TABLE
            .iter()
            .find(|spec| spec.field == self)
            .expect("every Field variant has a table row")
    }

    /// The storage key used in transmitted snapshots.
    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// The value shape this field accepts.
    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A stored field value.
///
/// Serializes untagged, so a snapshot comes out as plain JSON values:
/// `"Looking for Players"`, `42`, or `[1, 4]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text (status lines, secrets, asset names).
    Text(String),
    /// An integer (epoch seconds, numeric party ids).
    Int(i64),
    /// The `[size, max]` pair.
    Pair([u32; 2]),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<[u32; 2]> for FieldValue {
    fn from(value: [u32; 2]) -> Self {
        Self::Pair(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_a_table_row() {
        // spec() panics if a variant is missing, so exercising all
        // variants proves the table is complete.
        let all = [
            Field::PartyId,
            Field::JoinSecret,
            Field::SpectateSecret,
            Field::State,
            Field::Details,
            Field::StartTime,
            Field::EndTime,
            Field::LargeImage,
            Field::LargeText,
            Field::SmallImage,
            Field::SmallText,
            Field::Size,
            Field::Max,
        ];
        for field in all {
            let _ = field.spec();
        }
        assert_eq!(FIELD_TABLE.len(), all.len());
    }

    #[test]
    fn test_size_and_max_share_storage_key() {
        assert_eq!(Field::Size.key(), "party_size");
        assert_eq!(Field::Max.key(), "party_size");
        assert_eq!(Field::Size.kind(), FieldKind::PairLow);
        assert_eq!(Field::Max.kind(), FieldKind::PairHigh);
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let text = serde_json::to_string(&FieldValue::from("abc")).unwrap();
        assert_eq!(text, "\"abc\"");

        let int = serde_json::to_string(&FieldValue::Int(42)).unwrap();
        assert_eq!(int, "42");

        let pair = serde_json::to_string(&FieldValue::Pair([1, 4])).unwrap();
        assert_eq!(pair, "[1,4]");
    }

    #[test]
    fn test_field_value_deserializes_from_plain_json() {
        let v: FieldValue = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(v, FieldValue::Text("abc".into()));

        let v: FieldValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, FieldValue::Int(42));

        let v: FieldValue = serde_json::from_str("[1,4]").unwrap();
        assert_eq!(v, FieldValue::Pair([1, 4]));
    }

    #[test]
    fn test_field_display_distinguishes_pair_halves() {
        assert_eq!(Field::Size.to_string(), "party_size[size]");
        assert_eq!(Field::Max.to_string(), "party_size[max]");
        assert_eq!(Field::State.to_string(), "state");
    }
}
