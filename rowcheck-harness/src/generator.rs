//! Dataset generator.
//!
//! Builds the mutated dataset for one scale point: `N` base rows, the row
//! with id 1 updated, ten rows appended after `N` and the row with id 2
//! deleted, for a cardinality of `N + 9`.

use tracing::debug;

use crate::{
    dataset::Dataset,
    error::{HarnessError, HarnessResult},
};

/// Rows appended after the base range
pub const APPENDED_ROWS: u64 = 10;
/// Row whose opaque fields are regenerated
pub const UPDATED_ROW_ID: u64 = 1;
/// Row removed after the union
pub const DELETED_ROW_ID: u64 = 2;

/// Produces test datasets with a known cardinality
#[derive(Debug, Clone, Default)]
pub struct DatasetGenerator {
    seed: Option<u64>,
}

impl DatasetGenerator {
    /// Generator drawing opaque values from OS entropy
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator with reproducible opaque values
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Plan the dataset for `row_count` base rows.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidInput`] when `row_count` is zero or the appended
    /// ids would overflow.
    pub fn generate(&self, row_count: u64) -> HarnessResult<Dataset> {
        if row_count == 0 {
            return Err(HarnessError::InvalidInput {
                reason: "row_count must be greater than zero".to_string(),
            });
        }
        let last_id = row_count.checked_add(APPENDED_ROWS).ok_or_else(|| {
            HarnessError::InvalidInput { reason: format!("row_count {row_count} is too large") }
        })?;

        let base = Dataset::fresh(1..=row_count).update(UPDATED_ROW_ID);
        let appended = Dataset::fresh(row_count + 1..=last_id);
        let dataset = appended.union(base).delete(DELETED_ROW_ID).with_seed(self.seed);

        debug!(row_count, expected = dataset.expected_cardinality(), "Planned dataset");
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_zero_rows_rejected() {
        let result = DatasetGenerator::new().generate(0);
        assert!(matches!(result, Err(HarnessError::InvalidInput { .. })));
    }

    #[test]
    fn test_overflow_rejected() {
        let result = DatasetGenerator::new().generate(u64::MAX - 3);
        assert!(matches!(result, Err(HarnessError::InvalidInput { .. })));
    }

    #[test]
    fn test_mutation_pattern() {
        let dataset = DatasetGenerator::with_seed(1).generate(5).unwrap();
        let ids: Vec<u64> = dataset.records().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 1, 3, 4, 5]);
        assert_eq!(dataset.expected_cardinality(), 14);
    }

    #[test]
    fn test_single_row_deletes_appended_id_two() {
        let dataset = DatasetGenerator::new().generate(1).unwrap();
        let ids: Vec<u64> = dataset.records().map(|r| r.row_id).collect();
        assert_eq!(ids.len(), 10);
        assert!(!ids.contains(&DELETED_ROW_ID));
    }

    proptest! {
        #[test]
        fn prop_cardinality_is_n_plus_nine(row_count in 1u64..500, seed in any::<u64>()) {
            let dataset = DatasetGenerator::with_seed(seed).generate(row_count).unwrap();
            prop_assert_eq!(dataset.records().count() as u64, row_count + 9);
            prop_assert_eq!(dataset.expected_cardinality(), row_count + 9);
        }

        #[test]
        fn prop_row_ids_are_distinct(row_count in 1u64..500) {
            let dataset = DatasetGenerator::new().generate(row_count).unwrap();
            let mut seen = HashSet::new();
            for record in dataset.records() {
                prop_assert!(seen.insert(record.row_id), "duplicate row_id {}", record.row_id);
            }
        }
    }
}
