//! Synthetic records and the lazy dataset plan.
//!
//! A [`Dataset`] never holds its fresh rows in memory. It records which id
//! ranges exist, which ids get their opaque fields regenerated and which ids
//! are removed, and streams the resulting records on demand.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Column names of the synthetic schema, in file order.
pub const COLUMNS: [&str; 8] = [
    "row_id",
    "basic_data",
    "more_data",
    "more_data_2",
    "more_data_3",
    "more_data_4",
    "more_data_5",
    "more_data_6",
];

/// Number of opaque payload fields per record
pub const OPAQUE_FIELDS: usize = COLUMNS.len() - 1;

/// One row of the synthetic schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticRecord {
    /// Intended unique key
    pub row_id: u64,
    /// `basic_data`, `more_data`, `more_data_2..6`
    pub fields: [String; OPAQUE_FIELDS],
}

impl SyntheticRecord {
    /// Record with freshly drawn opaque fields
    pub fn random<R: Rng + ?Sized>(row_id: u64, rng: &mut R) -> Self {
        Self { row_id, fields: random_fields(rng) }
    }

    /// Header line matching [`SyntheticRecord::into_row`]
    pub fn header() -> Vec<String> {
        COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    /// Field values in column order
    pub fn into_row(self) -> Vec<String> {
        let mut row = Vec::with_capacity(COLUMNS.len());
        row.push(self.row_id.to_string());
        row.extend(self.fields);
        row
    }
}

/// Version 4 UUIDs drawn from `rng`
fn random_fields<R: Rng + ?Sized>(rng: &mut R) -> [String; OPAQUE_FIELDS] {
    std::array::from_fn(|_| uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string())
}

#[derive(Debug, Clone)]
enum Source {
    Fresh(RangeInclusive<u64>),
    Records(Vec<SyntheticRecord>),
}

#[derive(Debug, Clone)]
struct Part {
    source: Source,
    updated: BTreeSet<u64>,
    deleted: BTreeSet<u64>,
}

impl Part {
    fn len(&self) -> u64 {
        match &self.source {
            Source::Fresh(ids) => {
                let total = if ids.is_empty() { 0 } else { ids.end() - ids.start() + 1 };
                total - self.deleted.iter().filter(|id| ids.contains(id)).count() as u64
            },
            Source::Records(records) => {
                records.iter().filter(|r| !self.deleted.contains(&r.row_id)).count() as u64
            },
        }
    }
}

/// A lazily evaluated dataset: a union of parts with updates and deletions.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    parts: Vec<Part>,
    seed: Option<u64>,
}

impl Dataset {
    /// Records with ids `ids` and freshly drawn opaque fields
    pub fn fresh(ids: RangeInclusive<u64>) -> Self {
        Self::from_source(Source::Fresh(ids))
    }

    /// Explicit records, kept in the given order
    pub fn from_records(records: Vec<SyntheticRecord>) -> Self {
        Self::from_source(Source::Records(records))
    }

    fn from_source(source: Source) -> Self {
        let part = Part { source, updated: BTreeSet::new(), deleted: BTreeSet::new() };
        Self { parts: vec![part], seed: None }
    }

    /// Seed for every opaque value drawn while streaming
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Regenerate the opaque fields of every current record with `row_id`
    pub fn update(mut self, row_id: u64) -> Self {
        for part in &mut self.parts {
            part.updated.insert(row_id);
        }
        self
    }

    /// Remove every current record with `row_id`
    pub fn delete(mut self, row_id: u64) -> Self {
        for part in &mut self.parts {
            part.deleted.insert(row_id);
        }
        self
    }

    /// All records of `self` followed by all records of `other`
    pub fn union(mut self, other: Dataset) -> Self {
        self.parts.extend(other.parts);
        self
    }

    /// Number of records [`Dataset::records`] will yield
    pub fn expected_cardinality(&self) -> u64 {
        self.parts.iter().map(Part::len).sum()
    }

    /// Stream the records. Unseeded datasets draw new opaque values on every call.
    pub fn records(&self) -> Records<'_> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Records { parts: self.parts.iter(), current: None, rng }
    }
}

enum PartCursor<'a> {
    Fresh(RangeInclusive<u64>),
    Records(std::slice::Iter<'a, SyntheticRecord>),
}

/// Iterator over the records of a [`Dataset`]
pub struct Records<'a> {
    parts: std::slice::Iter<'a, Part>,
    current: Option<(&'a Part, PartCursor<'a>)>,
    rng: StdRng,
}

impl<'a> Iterator for Records<'a> {
    type Item = SyntheticRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let part = self.parts.next()?;
                let cursor = match &part.source {
                    Source::Fresh(ids) => PartCursor::Fresh(ids.clone()),
                    Source::Records(records) => PartCursor::Records(records.iter()),
                };
                self.current = Some((part, cursor));
            }
            let Some((part, cursor)) = self.current.as_mut() else {
                continue;
            };
            let part: &'a Part = *part;

            let record = match cursor {
                PartCursor::Fresh(ids) => {
                    ids.next().map(|id| SyntheticRecord::random(id, &mut self.rng))
                },
                PartCursor::Records(records) => records.next().cloned(),
            };
            let Some(mut record) = record else {
                self.current = None;
                continue;
            };

            if part.deleted.contains(&record.row_id) {
                continue;
            }
            if part.updated.contains(&record.row_id) {
                record.fields = random_fields(&mut self.rng);
            }
            return Some(record);
        }
    }
}
