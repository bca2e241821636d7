//! Error types for the status layer.

use crate::{Field, FieldKind};

/// Errors that can occur when mutating the status mapping.
///
/// These are the only failure modes of the generic field driver — the
/// typed accessors on the session construct well-shaped values and can
/// never hit them.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// The value's shape doesn't match the field table entry.
    /// E.g. storing a text value into an epoch field.
    #[error("field {field} expects a {expected} value")]
    WrongKind {
        /// The field that rejected the value.
        field: Field,
        /// The kind the field table declares for it.
        expected: FieldKind,
    },

    /// A pair half (size/max) was given an integer outside `u32` range.
    #[error("field {field} is out of range for a party size")]
    OutOfRange {
        /// The field that rejected the value.
        field: Field,
    },
}
