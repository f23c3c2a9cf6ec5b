//! Repository trait definition
//!
//! The contract is object-safe (via `async_trait`) so business handlers can hold
//! an `Arc<dyn DataProductRepository>` and stay independent of the storage
//! technology behind it.

use async_trait::async_trait;

use super::error::RepositoryError;
use crate::model::{DataProduct, DataProductId, DataProductPatch, NewDataProduct};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Persistence contract consumed by business handlers and strategies
///
/// Implementations assign identifiers and timestamps; callers never supply them.
///
/// # Example
///
/// ```rust,ignore
/// use dataproduct_service::repository::{DataProductRepository, RepositoryResult};
///
/// struct PgDataProductRepository { pool: PgPool }
///
/// #[async_trait]
/// impl DataProductRepository for PgDataProductRepository {
///     async fn find_by_id(&self, id: &DataProductId) -> RepositoryResult<Option<DataProduct>> {
///         // SELECT ... WHERE id = $1
///         todo!()
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait DataProductRepository: Send + Sync {
    /// Persist a new record, assigning its id, timestamps and initial revision
    async fn create(&self, data: NewDataProduct) -> RepositoryResult<DataProduct>;

    /// Find a record by its identifier
    ///
    /// Returns `Ok(None)` if not found.
    async fn find_by_id(&self, id: &DataProductId) -> RepositoryResult<Option<DataProduct>>;

    /// Overwrite the fields present in `patch`
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record doesn't exist
    /// - `Conflict` if `patch.expected_revision` is set and doesn't match
    async fn update(
        &self,
        id: &DataProductId,
        patch: DataProductPatch,
    ) -> RepositoryResult<DataProduct>;

    /// Delete a record (hard delete)
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record doesn't exist.
    async fn delete(&self, id: &DataProductId) -> RepositoryResult<()>;

    /// Number of stored records
    async fn count(&self) -> RepositoryResult<u64>;
}
