//! In-memory repository for tests, local development and the default binary

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{DataProductRepository, RepositoryResult};
use crate::model::{DataProduct, DataProductId, DataProductPatch, NewDataProduct, ENTITY_TYPE};

/// `DashMap`-backed repository
///
/// Updates run under the map's per-entry lock, so the revision check and the
/// write happen atomically with respect to other writers of the same record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataProductRepository {
    records: Arc<DashMap<DataProductId, DataProduct>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryDataProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a store outage: every call fails with `ConnectionFailed` while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self, operation: RepositoryOperation) -> RepositoryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(
                RepositoryError::connection_failed("in-memory store marked unavailable")
                    .with_operation(operation),
            );
        }
        Ok(())
    }
}

#[async_trait]
impl DataProductRepository for InMemoryDataProductRepository {
    async fn create(&self, data: NewDataProduct) -> RepositoryResult<DataProduct> {
        self.ensure_available(RepositoryOperation::Create)?;

        let record = DataProduct::from_new(DataProductId::new(), data, Utc::now());
        if self.records.contains_key(&record.id) {
            return Err(RepositoryError::already_exists(
                ENTITY_TYPE,
                record.id.to_string(),
            ));
        }
        self.records.insert(record.id, record.clone());
        tracing::debug!(id = %record.id, "stored new record");
        Ok(record)
    }

    async fn find_by_id(&self, id: &DataProductId) -> RepositoryResult<Option<DataProduct>> {
        self.ensure_available(RepositoryOperation::FindById)?;
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    async fn update(
        &self,
        id: &DataProductId,
        patch: DataProductPatch,
    ) -> RepositoryResult<DataProduct> {
        self.ensure_available(RepositoryOperation::Update)?;

        let mut entry = self.records.get_mut(id).ok_or_else(|| {
            RepositoryError::not_found(ENTITY_TYPE, id.to_string())
                .with_operation(RepositoryOperation::Update)
        })?;

        if let Some(expected) = patch.expected_revision {
            if entry.revision != expected {
                return Err(RepositoryError::revision_conflict(
                    ENTITY_TYPE,
                    id.to_string(),
                    expected,
                    entry.revision,
                ));
            }
        }

        entry.apply(patch, Utc::now());
        tracing::debug!(id = %id, revision = entry.revision, "updated record");
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: &DataProductId) -> RepositoryResult<()> {
        self.ensure_available(RepositoryOperation::Delete)?;
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| {
                RepositoryError::not_found(ENTITY_TYPE, id.to_string())
                    .with_operation(RepositoryOperation::Delete)
            })
    }

    async fn count(&self) -> RepositoryResult<u64> {
        self.ensure_available(RepositoryOperation::Count)?;
        Ok(self.records.len() as u64)
    }
}
