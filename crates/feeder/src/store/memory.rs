use std::collections::{BTreeSet, HashMap, hash_map::Entry};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{
    BookkeepingStore, OutcomeRecord, OutcomeStatus, Result, StoreError, StoreSummary,
};
use crate::error::FailureCategory;

#[derive(Debug, Default)]
struct MemoryState {
    outcomes: HashMap<String, OutcomeRecord>,
    organizations: BTreeSet<String>,
}

/// In-process bookkeeping store.
///
/// A single mutex serializes writes, which gives the same at-most-once
/// guarantee per key as the database primary key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, record: OutcomeRecord) -> Result<()> {
        match self.lock().outcomes.entry(record.item.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyRecorded { key: record.item }),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Snapshot of all outcome records, sorted by item key.
    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        let mut records: Vec<_> = self.lock().outcomes.values().cloned().collect();
        records.sort_by(|a, b| a.item.cmp(&b.item));
        records
    }

    /// The record for one item, if any.
    pub fn outcome(&self, item_key: &str) -> Option<OutcomeRecord> {
        self.lock().outcomes.get(item_key).cloned()
    }

    /// Declared organizations, sorted.
    pub fn organizations(&self) -> Vec<String> {
        self.lock().organizations.iter().cloned().collect()
    }
}

#[async_trait]
impl BookkeepingStore for MemoryStore {
    async fn declare_organization(&self, name: &str) -> Result<()> {
        self.lock().organizations.insert(name.to_string());
        Ok(())
    }

    async fn record_success(&self, item_key: &str, org: Option<&str>) -> Result<()> {
        self.insert(OutcomeRecord {
            item: item_key.to_string(),
            status: OutcomeStatus::Succeeded,
            category: None,
            organization: org.map(str::to_string),
            recorded_at: Utc::now(),
        })
    }

    async fn record_failure(&self, item_key: &str, category: FailureCategory) -> Result<()> {
        self.insert(OutcomeRecord {
            item: item_key.to_string(),
            status: OutcomeStatus::Failed,
            category: Some(category),
            organization: None,
            recorded_at: Utc::now(),
        })
    }

    async fn is_recorded(&self, item_key: &str) -> Result<bool> {
        Ok(self.lock().outcomes.contains_key(item_key))
    }

    async fn summary(&self) -> Result<StoreSummary> {
        let state = self.lock();
        let mut summary = StoreSummary {
            organizations: state.organizations.len() as u64,
            ..Default::default()
        };
        for record in state.outcomes.values() {
            match (record.status, record.category) {
                (OutcomeStatus::Succeeded, _) => summary.succeeded += 1,
                (OutcomeStatus::Failed, Some(category)) => summary.add_failures(category, 1),
                (OutcomeStatus::Failed, None) => {}
            }
        }
        Ok(summary)
    }
}
