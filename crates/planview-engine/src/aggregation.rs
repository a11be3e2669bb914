//! Cumulative statistics over a set of result entities.
//!
//! The same test case can appear in several suites or under several
//! configurations. Entities are grouped by test id; inside a group the most
//! recent entity (see [`ResultEntity::cmp_recency`]) is the primary result and
//! every other member is a duplicate. Counting with `latest_only` looks at
//! primaries only.

use planview_types::{ResultEntity, TestOutcome};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Results grouped by test id, each group ordered oldest to newest
#[derive(Debug, Clone, Default)]
pub struct AllResults<'a> {
    groups: BTreeMap<i32, Vec<&'a ResultEntity>>,
    count: usize,
}

impl<'a> AllResults<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entity. Suite placeholders are ignored.
    pub fn insert(&mut self, entity: &'a ResultEntity) {
        if entity.is_placeholder() {
            return;
        }
        let group = self.groups.entry(entity.test_id).or_default();
        // Insert after equal keys so that the later of two ties wins.
        let at = group.partition_point(|e| e.cmp_recency(entity) != Ordering::Greater);
        group.insert(at, entity);
        self.count += 1;
    }

    /// Number of entities, duplicates included
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of distinct test ids
    pub fn non_dup_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Every entity with its primary flag. Groups come in ascending test id,
    /// members newest first, so the first member of each group is primary.
    pub fn types_and_results(&self) -> impl Iterator<Item = (bool, &'a ResultEntity)> + '_ {
        self.groups.values().flat_map(|group| {
            group
                .iter()
                .rev()
                .enumerate()
                .map(|(i, entity)| (i == 0, *entity))
        })
    }

    /// The primary result of each test id
    pub fn primaries(&self) -> impl Iterator<Item = &'a ResultEntity> + '_ {
        self.groups.values().filter_map(|group| group.last().copied())
    }

    pub fn primary(&self, test_id: i32) -> Option<&'a ResultEntity> {
        self.groups.get(&test_id).and_then(|group| group.last().copied())
    }

    fn examined(&self, latest_only: bool) -> Box<dyn Iterator<Item = &'a ResultEntity> + '_> {
        if latest_only {
            Box::new(self.primaries())
        } else {
            Box::new(self.groups.values().flatten().copied())
        }
    }

    /// Entities whose outcome has no dedicated counter and that are not active
    pub fn other_count(&self, latest_only: bool) -> usize {
        self.examined(latest_only)
            .filter(|e| !e.state.is_active() && e.outcome.is_other())
            .count()
    }

    /// Entities currently queued or running
    pub fn active_count(&self, latest_only: bool) -> usize {
        self.examined(latest_only)
            .filter(|e| e.state.is_active())
            .count()
    }

    /// Entities with `outcome` that are not active
    pub fn outcome_count(&self, outcome: TestOutcome, latest_only: bool) -> usize {
        self.examined(latest_only)
            .filter(|e| !e.state.is_active() && e.outcome == outcome)
            .count()
    }

    pub fn breakdown(&self, latest_only: bool) -> OutcomeBreakdown {
        OutcomeBreakdown {
            passed: self.outcome_count(TestOutcome::Passed, latest_only),
            failed: self.outcome_count(TestOutcome::Failed, latest_only),
            blocked: self.outcome_count(TestOutcome::Blocked, latest_only),
            queued: self.outcome_count(TestOutcome::None, latest_only),
            inconclusive: self.outcome_count(TestOutcome::Inconclusive, latest_only),
            never_executed: self.outcome_count(TestOutcome::Unspecified, latest_only),
            active: self.active_count(latest_only),
            other: self.other_count(latest_only),
            not_executed: self.outcome_count(TestOutcome::NotExecuted, latest_only),
            total: if latest_only {
                self.non_dup_count()
            } else {
                self.count()
            },
        }
    }
}

impl<'a> FromIterator<&'a ResultEntity> for AllResults<'a> {
    fn from_iter<I: IntoIterator<Item = &'a ResultEntity>>(iter: I) -> Self {
        let mut results = AllResults::new();
        for entity in iter {
            results.insert(entity);
        }
        results
    }
}

impl<'a> Extend<&'a ResultEntity> for AllResults<'a> {
    fn extend<I: IntoIterator<Item = &'a ResultEntity>>(&mut self, iter: I) {
        for entity in iter {
            self.insert(entity);
        }
    }
}

/// Counter set shown for a plan or a selection.
///
/// `not_executed` is already part of `other`; the remaining counters
/// partition `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OutcomeBreakdown {
    pub passed: usize,
    pub failed: usize,
    pub blocked: usize,
    pub queued: usize,
    pub inconclusive: usize,
    pub never_executed: usize,
    pub active: usize,
    pub other: usize,
    pub not_executed: usize,
    pub total: usize,
}
