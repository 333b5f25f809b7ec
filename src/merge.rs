// 🔀 Merge Store - one record per canonical course code
// Pathway files overwrite, flat files only fill gaps

use crate::entities::CourseRecord;
use crate::parser::{CourseSource, SourceShape};
use std::collections::HashMap;
use tracing::{debug, warn};

// ============================================================================
// MERGE POLICY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Replace any existing record (last write wins)
    Overwrite,

    /// Insert only when the code is absent (first write wins)
    KeepFirst,
}

impl MergePolicy {
    pub fn for_shape(shape: SourceShape) -> Self {
        match shape {
            SourceShape::Pathway => MergePolicy::Overwrite,
            SourceShape::Flat => MergePolicy::KeepFirst,
        }
    }
}

/// What happened to a record offered to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Replaced,
    Ignored,
}

// ============================================================================
// MERGE STORE
// ============================================================================

/// In-memory reconciliation of course records across all source files.
///
/// Keeps first-insertion order so downstream passes are stable for a given
/// directory listing. Overwriting a record keeps its original position.
#[derive(Debug, Default)]
pub struct MergeStore {
    records: Vec<CourseRecord>,
    index: HashMap<String, usize>,
}

impl MergeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one record under the given policy
    pub fn merge(&mut self, record: CourseRecord, policy: MergePolicy) -> MergeOutcome {
        match self.index.get(&record.code) {
            None => {
                self.index.insert(record.code.clone(), self.records.len());
                self.records.push(record);
                MergeOutcome::Inserted
            }
            Some(&pos) => match policy {
                MergePolicy::Overwrite => {
                    let existing = &mut self.records[pos];
                    if existing.title != record.title {
                        warn!(
                            code = %record.code,
                            previous = %existing.title,
                            replacement = %record.title,
                            "pathway record overwrites existing course with a different title"
                        );
                    }
                    *existing = record;
                    MergeOutcome::Replaced
                }
                MergePolicy::KeepFirst => {
                    debug!(code = %record.code, "course already merged, ignoring flat record");
                    MergeOutcome::Ignored
                }
            },
        }
    }

    /// Merge every record of a source under the policy its shape implies
    pub fn merge_source<S: CourseSource>(&mut self, source: &S) -> MergeStats {
        let policy = MergePolicy::for_shape(source.shape());
        let mut stats = MergeStats::default();

        for record in source.course_records() {
            match self.merge(record, policy) {
                MergeOutcome::Inserted => stats.inserted += 1,
                MergeOutcome::Replaced => stats.replaced += 1,
                MergeOutcome::Ignored => stats.ignored += 1,
            }
        }

        stats
    }

    pub fn get(&self, code: &str) -> Option<&CourseRecord> {
        self.index.get(code).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Records in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CourseRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-source merge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub replaced: usize,
    pub ignored: usize,
}

// ============================================================================
// TESTS
// ============================================================================
