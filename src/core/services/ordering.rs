//! Sibling ordering helpers shared by sections, blocks, tiles, key
//! statistics and data files
//!
//! Every sibling set keeps `ord` values exactly `0..n-1`. Inserts clamp the
//! requested position into range and shift the tail; reorders must name the
//! complete current id set.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::error::{Result, StatDeskError, ValidationCode, ValidationError};

/// The position a new sibling lands at: the requested order clamped into
/// `0..=n`, or the end when unspecified.
pub fn insert_position(requested: Option<i64>, sibling_count: usize) -> i64 {
    let end = sibling_count as i64;
    match requested {
        Some(ord) if ord >= 0 => ord.min(end),
        _ => end,
    }
}

/// Reject a reorder whose id set differs from the actual sibling set.
/// Extra, missing, duplicated and substituted ids all fail with the given
/// code; the detail names the mismatch.
pub fn validate_reorder(
    provided: &[Uuid],
    actual: &[Uuid],
    code: ValidationCode,
) -> Result<()> {
    let provided_set: BTreeSet<Uuid> = provided.iter().copied().collect();
    let actual_set: BTreeSet<Uuid> = actual.iter().copied().collect();

    if provided.len() == provided_set.len() && provided_set == actual_set {
        return Ok(());
    }

    let extra: Vec<String> = provided_set
        .difference(&actual_set)
        .map(Uuid::to_string)
        .collect();
    let missing: Vec<String> = actual_set
        .difference(&provided_set)
        .map(Uuid::to_string)
        .collect();

    let mut parts = Vec::new();
    if provided.len() != provided_set.len() {
        parts.push("duplicated ids".to_string());
    }
    if !extra.is_empty() {
        parts.push(format!("unknown ids: {}", extra.join(", ")));
    }
    if !missing.is_empty() {
        parts.push(format!("missing ids: {}", missing.join(", ")));
    }

    Err(StatDeskError::validation_all(vec![
        ValidationError::with_detail(code, parts.join("; ")),
    ]))
}

/// Pair each id with its dense position.
pub fn dense_orders(ids: &[Uuid]) -> Vec<(Uuid, i64)> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_position_appends_by_default() {
        assert_eq!(insert_position(None, 0), 0);
        assert_eq!(insert_position(None, 3), 3);
    }

    #[test]
    fn test_insert_position_clamps_out_of_range() {
        assert_eq!(insert_position(Some(10), 2), 2);
        assert_eq!(insert_position(Some(-1), 2), 2);
        assert_eq!(insert_position(Some(1), 2), 1);
    }

    #[test]
    fn test_validate_reorder_accepts_permutation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(validate_reorder(&[b, a], &[a, b], ValidationCode::SectionIdsDifferFromActual).is_ok());
    }

    #[test]
    fn test_validate_reorder_rejects_missing_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let err = validate_reorder(&[a], &[a, b], ValidationCode::SectionIdsDifferFromActual)
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::SectionIdsDifferFromActual]
        );
    }

    #[test]
    fn test_validate_reorder_rejects_extra_id() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let err = validate_reorder(&[a, b], &[a], ValidationCode::BlockIdsDifferFromActual)
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::BlockIdsDifferFromActual]
        );
    }

    #[test]
    fn test_validate_reorder_rejects_substituted_id_of_same_size() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let err = validate_reorder(&[a, c], &[a, b], ValidationCode::TileIdsDifferFromActual)
            .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::TileIdsDifferFromActual]
        );
    }

    #[test]
    fn test_validate_reorder_rejects_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let err = validate_reorder(
            &[a, a],
            &[a, b],
            ValidationCode::KeyStatisticIdsDifferFromActual,
        )
        .unwrap_err();
        assert_eq!(
            err.validation_codes(),
            vec![ValidationCode::KeyStatisticIdsDifferFromActual]
        );
    }

    #[test]
    fn test_dense_orders() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dense_orders(&[a, b]), vec![(a, 0), (b, 1)]);
    }
}
