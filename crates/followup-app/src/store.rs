// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::RecordId;
use crate::model::Record;

/// Freshness of the held snapshot relative to the last load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    #[default]
    NeverLoaded,
    Fresh,
    /// The latest load failed; the snapshot predates it.
    Stale,
}

/// Authoritative copy of every record from the last successful fetch. The
/// snapshot is only ever replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<Record>,
    freshness: Freshness,
    generation: u64,
}

impl RecordStore {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// Bumped on every replacement.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
        self.freshness = Freshness::Fresh;
        self.generation = self.generation.saturating_add(1);
    }

    pub fn mark_stale(&mut self) {
        if self.freshness == Freshness::Fresh {
            self.freshness = Freshness::Stale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Freshness, RecordStore};
    use crate::{Record, RecordId};

    fn record(id: &str) -> Record {
        Record {
            id: RecordId::from(id),
            ..Record::default()
        }
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let mut store = RecordStore::default();
        assert_eq!(store.freshness(), Freshness::NeverLoaded);

        store.replace(vec![record("1"), record("2")]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.generation(), 1);

        store.replace(vec![record("3")]);
        assert_eq!(store.len(), 1);
        assert!(store.find(&RecordId::from("1")).is_none());
        assert!(store.find(&RecordId::from("3")).is_some());
        assert_eq!(store.generation(), 2);
    }

    #[test]
    fn failed_load_marks_loaded_snapshot_stale() {
        let mut store = RecordStore::default();
        store.mark_stale();
        assert_eq!(store.freshness(), Freshness::NeverLoaded);

        store.replace(vec![record("1")]);
        store.mark_stale();
        assert_eq!(store.freshness(), Freshness::Stale);
        assert_eq!(store.len(), 1);

        store.replace(Vec::new());
        assert_eq!(store.freshness(), Freshness::Fresh);
        assert!(store.is_empty());
    }
}
