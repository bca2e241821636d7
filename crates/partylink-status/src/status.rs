//! The party status mapping and its transmitted snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{Field, FieldKind, FieldValue, StatusError};

/// Storage key for the process-id entry that every status carries.
pub const PID_KEY: &str = "pid";

// ---------------------------------------------------------------------------
// PartyStatus
// ---------------------------------------------------------------------------

/// The full set of presence fields for one session.
///
/// Created with only the process-id entry; mutated through the generic
/// field driver; transmitted wholesale via [`snapshot`](Self::snapshot).
///
/// There are no cross-field invariants except the size/max pairing — both
/// halves live in one `party_size` entry so that setting one never clobbers
/// the other (see [`Field`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyStatus {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl PartyStatus {
    /// Creates a status holding only the current process id.
    pub fn new() -> Self {
        Self::with_pid(std::process::id())
    }

    /// Creates a status with an explicit process id. Useful in tests where
    /// the snapshot must be fully deterministic.
    pub fn with_pid(pid: u32) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(PID_KEY, FieldValue::Int(i64::from(pid)));
        Self { fields }
    }

    /// Sets a field, validating the value shape against the field table.
    ///
    /// For `Size`/`Max`: if the pair doesn't exist yet, both halves are
    /// initialized to the given value; otherwise only the addressed half
    /// is overwritten.
    ///
    /// # Errors
    /// - [`StatusError::WrongKind`] — value shape doesn't match the table.
    /// - [`StatusError::OutOfRange`] — pair half outside `u32` range.
    pub fn set(
        &mut self,
        field: Field,
        value: impl Into<FieldValue>,
    ) -> Result<(), StatusError> {
        let value = value.into();
        let spec = field.spec();

        match spec.kind {
            FieldKind::Text => match value {
                FieldValue::Text(_) => {
                    self.fields.insert(spec.key, value);
                    Ok(())
                }
                _ => Err(StatusError::WrongKind {
                    field,
                    expected: spec.kind,
                }),
            },
            FieldKind::Epoch => match value {
                FieldValue::Int(_) => {
                    self.fields.insert(spec.key, value);
                    Ok(())
                }
                _ => Err(StatusError::WrongKind {
                    field,
                    expected: spec.kind,
                }),
            },
            FieldKind::Identifier => match value {
                FieldValue::Text(_) | FieldValue::Int(_) => {
                    self.fields.insert(spec.key, value);
                    Ok(())
                }
                FieldValue::Pair(_) => Err(StatusError::WrongKind {
                    field,
                    expected: spec.kind,
                }),
            },
            FieldKind::PairLow | FieldKind::PairHigh => {
                let half = match value {
                    FieldValue::Int(n) => u32::try_from(n)
                        .map_err(|_| StatusError::OutOfRange { field })?,
                    _ => {
                        return Err(StatusError::WrongKind {
                            field,
                            expected: spec.kind,
                        });
                    }
                };
                let index = usize::from(spec.kind == FieldKind::PairHigh);
                match self.fields.get_mut(spec.key) {
                    Some(FieldValue::Pair(pair)) => pair[index] = half,
                    // First set of either half seeds both halves.
                    _ => {
                        self.fields
                            .insert(spec.key, FieldValue::Pair([half, half]));
                    }
                }
                Ok(())
            }
        }
    }

    /// Reads a field. Pair halves come back as `Int` with just that half.
    /// Returns `None` for unset fields.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        let spec = field.spec();
        let stored = self.fields.get(spec.key)?;
        match spec.kind {
            FieldKind::PairLow | FieldKind::PairHigh => match stored {
                FieldValue::Pair(pair) => {
                    let index =
                        usize::from(spec.kind == FieldKind::PairHigh);
                    Some(FieldValue::Int(i64::from(pair[index])))
                }
                _ => None,
            },
            _ => Some(stored.clone()),
        }
    }

    /// Removes a field from the mapping, so it disappears from subsequent
    /// snapshots. Clearing either `Size` or `Max` removes the whole pair.
    ///
    /// Returns `true` if the field was set.
    pub fn clear(&mut self, field: Field) -> bool {
        self.fields.remove(field.key()).is_some()
    }

    /// Number of stored entries, including the process id.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` only if even the process-id entry is gone — which never
    /// happens through this API, so this reports `false` in practice.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copies the full mapping into a transmitted snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            entries: self.fields.clone(),
        }
    }
}

impl Default for PartyStatus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// A point-in-time copy of the whole status mapping.
///
/// This is what travels to the remote peer on every update — always the
/// full set of fields, never a diff. Serializes as one flat JSON object:
///
/// ```json
/// { "join": "abc", "party_id": 42, "party_size": [1, 4], "pid": 4242,
///   "state": "Looking for Players" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusSnapshot {
    entries: BTreeMap<&'static str, FieldValue>,
}

impl StatusSnapshot {
    /// Looks up an entry by its storage key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.get(key)
    }

    /// `true` if the snapshot carries the given storage key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries, including the process id.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> PartyStatus {
        PartyStatus::with_pid(4242)
    }

    // =====================================================================
    // Construction
    // =====================================================================

    #[test]
    fn test_new_status_holds_only_pid() {
        let s = status();
        assert_eq!(s.len(), 1);
        let snap = s.snapshot();
        assert_eq!(snap.get(PID_KEY), Some(&FieldValue::Int(4242)));
    }

    #[test]
    fn test_new_uses_current_process_id() {
        let s = PartyStatus::new();
        let expected = i64::from(std::process::id());
        assert_eq!(s.snapshot().get(PID_KEY), Some(&FieldValue::Int(expected)));
    }

    // =====================================================================
    // Generic set / get / clear
    // =====================================================================

    #[test]
    fn test_set_and_get_text_field() {
        let mut s = status();
        s.set(Field::State, "Looking for Players").unwrap();
        assert_eq!(
            s.get(Field::State),
            Some(FieldValue::Text("Looking for Players".into()))
        );
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let mut s = status();
        s.set(Field::Details, "warmup").unwrap();
        s.set(Field::Details, "ranked").unwrap();
        assert_eq!(s.get(Field::Details), Some(FieldValue::Text("ranked".into())));
    }

    #[test]
    fn test_get_unset_field_returns_none() {
        let s = status();
        assert_eq!(s.get(Field::State), None);
        assert_eq!(s.get(Field::Size), None);
    }

    #[test]
    fn test_identifier_accepts_text_and_int() {
        let mut s = status();
        s.set(Field::PartyId, 42i64).unwrap();
        assert_eq!(s.get(Field::PartyId), Some(FieldValue::Int(42)));

        s.set(Field::PartyId, "lobby-9").unwrap();
        assert_eq!(s.get(Field::PartyId), Some(FieldValue::Text("lobby-9".into())));
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let mut s = status();

        let err = s.set(Field::State, 7i64).unwrap_err();
        assert!(matches!(err, StatusError::WrongKind { field: Field::State, .. }));

        let err = s.set(Field::StartTime, "noon").unwrap_err();
        assert!(matches!(
            err,
            StatusError::WrongKind { field: Field::StartTime, .. }
        ));

        let err = s.set(Field::PartyId, [1u32, 2u32]).unwrap_err();
        assert!(matches!(err, StatusError::WrongKind { field: Field::PartyId, .. }));
    }

    #[test]
    fn test_rejected_set_leaves_mapping_untouched() {
        let mut s = status();
        s.set(Field::State, "ok").unwrap();
        let _ = s.set(Field::State, 1i64);
        assert_eq!(s.get(Field::State), Some(FieldValue::Text("ok".into())));
    }

    #[test]
    fn test_clear_removes_field_and_reports_presence() {
        let mut s = status();
        s.set(Field::State, "here").unwrap();

        assert!(s.clear(Field::State));
        assert_eq!(s.get(Field::State), None);
        // Second clear: nothing left to remove.
        assert!(!s.clear(Field::State));
    }

    #[test]
    fn test_cleared_field_absent_from_snapshot() {
        let mut s = status();
        s.set(Field::JoinSecret, "abc").unwrap();
        s.clear(Field::JoinSecret);

        let snap = s.snapshot();
        assert!(!snap.contains_key("join"));
    }

    // =====================================================================
    // Pair semantics (size / max)
    // =====================================================================

    #[test]
    fn test_first_size_set_seeds_both_halves() {
        let mut s = status();
        s.set(Field::Size, 5u32).unwrap();
        assert_eq!(s.get(Field::Size), Some(FieldValue::Int(5)));
        assert_eq!(s.get(Field::Max), Some(FieldValue::Int(5)));
    }

    #[test]
    fn test_max_alone_first_yields_max_max() {
        let mut s = status();
        s.set(Field::Max, 10u32).unwrap();
        assert_eq!(
            s.snapshot().get("party_size"),
            Some(&FieldValue::Pair([10, 10]))
        );
    }

    #[test]
    fn test_size_then_max_yields_final_pair() {
        let mut s = status();
        s.set(Field::Size, 5u32).unwrap();
        s.set(Field::Max, 10u32).unwrap();
        assert_eq!(
            s.snapshot().get("party_size"),
            Some(&FieldValue::Pair([5, 10]))
        );
    }

    #[test]
    fn test_setting_one_half_never_resets_the_other() {
        let mut s = status();
        s.set(Field::Size, 1u32).unwrap();
        s.set(Field::Max, 4u32).unwrap();

        // Churn one half repeatedly; the other must hold.
        for n in [2u32, 3, 4] {
            s.set(Field::Size, n).unwrap();
            assert_eq!(s.get(Field::Max), Some(FieldValue::Int(4)));
        }
        s.set(Field::Max, 8u32).unwrap();
        assert_eq!(s.get(Field::Size), Some(FieldValue::Int(4)));
    }

    #[test]
    fn test_each_half_reads_most_recent_set() {
        let mut s = status();
        s.set(Field::Size, 1u32).unwrap();
        s.set(Field::Size, 2u32).unwrap();
        s.set(Field::Max, 6u32).unwrap();
        s.set(Field::Max, 7u32).unwrap();
        assert_eq!(s.get(Field::Size), Some(FieldValue::Int(2)));
        assert_eq!(s.get(Field::Max), Some(FieldValue::Int(7)));
    }

    #[test]
    fn test_clearing_either_half_removes_whole_pair() {
        let mut s = status();
        s.set(Field::Size, 1u32).unwrap();
        s.set(Field::Max, 4u32).unwrap();

        assert!(s.clear(Field::Max));
        assert_eq!(s.get(Field::Size), None);
        assert_eq!(s.get(Field::Max), None);
        assert!(!s.snapshot().contains_key("party_size"));
    }

    #[test]
    fn test_pair_half_rejects_negative_and_text() {
        let mut s = status();
        let err = s.set(Field::Size, -1i64).unwrap_err();
        assert!(matches!(err, StatusError::OutOfRange { field: Field::Size }));

        let err = s.set(Field::Max, "lots").unwrap_err();
        assert!(matches!(err, StatusError::WrongKind { field: Field::Max, .. }));
    }

    // =====================================================================
    // Snapshots
    // =====================================================================

    #[test]
    fn test_lobby_scenario_snapshot_exact_keys() {
        // state + id + join + size/max → exactly five entries
        // (the four set fields, size/max paired, plus pid).
        let mut s = status();
        s.set(Field::State, "Looking for Players").unwrap();
        s.set(Field::PartyId, 42i64).unwrap();
        s.set(Field::JoinSecret, "abc").unwrap();
        s.set(Field::Size, 1u32).unwrap();
        s.set(Field::Max, 4u32).unwrap();

        let snap = s.snapshot();
        assert_eq!(snap.len(), 5);
        assert_eq!(
            snap.get("state"),
            Some(&FieldValue::Text("Looking for Players".into()))
        );
        assert_eq!(snap.get("party_id"), Some(&FieldValue::Int(42)));
        assert_eq!(snap.get("join"), Some(&FieldValue::Text("abc".into())));
        assert_eq!(snap.get("party_size"), Some(&FieldValue::Pair([1, 4])));
        assert_eq!(snap.get(PID_KEY), Some(&FieldValue::Int(4242)));
    }

    #[test]
    fn test_snapshot_serializes_as_flat_object() {
        let mut s = status();
        s.set(Field::State, "Looking for Players").unwrap();
        s.set(Field::Size, 1u32).unwrap();
        s.set(Field::Max, 4u32).unwrap();

        let json = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pid": 4242,
                "state": "Looking for Players",
                "party_size": [1, 4],
            })
        );
    }

    #[test]
    fn test_snapshot_is_a_copy_not_a_view() {
        let mut s = status();
        s.set(Field::State, "before").unwrap();
        let snap = s.snapshot();
        s.set(Field::State, "after").unwrap();

        // Earlier snapshot is unaffected by later mutation.
        assert_eq!(snap.get("state"), Some(&FieldValue::Text("before".into())));
    }

    #[test]
    fn test_snapshot_iter_is_key_ordered() {
        let mut s = status();
        s.set(Field::State, "x").unwrap();
        s.set(Field::JoinSecret, "y").unwrap();

        let keys: Vec<&str> = s.snapshot().iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }
}
