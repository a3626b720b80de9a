//! Core type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::Error;

/// One scale point of a run: a named target cardinality.
///
/// The row count is deliberately not range-validated here. A non-positive
/// count is rejected by the dataset generator so that the rejection is
/// reported against the case it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TestCase {
    /// Case name, also the directory name of its persisted artifact
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    /// Requested number of base rows
    pub row_count: u64,
}

impl TestCase {
    /// Create a new test case.
    pub fn new(name: impl Into<String>, row_count: u64) -> Self {
        Self { name: name.into(), row_count }
    }

    /// The scale points of the reference run.
    pub fn reference_suite() -> Vec<TestCase> {
        vec![
            TestCase::new("100k", 100_000),
            TestCase::new("1m", 1_000_000),
            TestCase::new("5m", 5_000_000),
            TestCase::new("10m", 10_000_000),
            TestCase::new("10.01m", 10_010_000),
            TestCase::new("20m", 20_000_000),
            TestCase::new("30m", 30_000_000),
        ]
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.row_count)
    }
}

/// Parses `name=rows`, the form used on the command line.
impl FromStr for TestCase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rows) = s.split_once('=').ok_or_else(|| {
            Error::Configuration(format!("Test case '{s}' must have the form name=rows"))
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Configuration(format!("Test case '{s}' has an empty name")));
        }

        let row_count = rows.trim().replace('_', "").parse::<u64>().map_err(|e| {
            Error::Configuration(format!("Test case '{s}' has an invalid row count: {e}"))
        })?;

        Ok(TestCase::new(name, row_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_suite() {
        let suite = TestCase::reference_suite();
        assert_eq!(suite.len(), 7);
        assert_eq!(suite[0], TestCase::new("100k", 100_000));
        assert_eq!(suite[4].row_count, 10_010_000);
        assert_eq!(suite[6].name, "30m");
    }

    #[test]
    fn test_parse_test_case() {
        let case: TestCase = "20m=20_000_000".parse().unwrap();
        assert_eq!(case, TestCase::new("20m", 20_000_000));

        let case: TestCase = " tiny = 10 ".parse().unwrap();
        assert_eq!(case, TestCase::new("tiny", 10));

        // Zero parses; the generator is responsible for rejecting it
        let case: TestCase = "empty=0".parse().unwrap();
        assert_eq!(case.row_count, 0);
    }

    #[test]
    fn test_parse_test_case_errors() {
        assert!("100000".parse::<TestCase>().is_err());
        assert!("=100".parse::<TestCase>().is_err());
        assert!("neg=-5".parse::<TestCase>().is_err());
        assert!("words=many".parse::<TestCase>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let case = TestCase::new("1m", 1_000_000);
        assert_eq!(case.to_string(), "1m=1000000");
        assert_eq!(case.to_string().parse::<TestCase>().unwrap(), case);
    }
}
