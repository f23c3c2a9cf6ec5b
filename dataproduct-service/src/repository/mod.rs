//! Persistence boundary for DataProduct records
//!
//! - [`DataProductRepository`]: the storage-agnostic contract business handlers use
//! - [`RepositoryError`]: structured errors with operation and entity context
//! - [`InMemoryDataProductRepository`]: `DashMap`-backed implementation
//!
//! Optimistic concurrency lives here rather than in the pipeline: a patch that
//! carries `expected_revision` is applied only if the stored revision matches.

mod error;
mod memory;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::InMemoryDataProductRepository;
pub use traits::{DataProductRepository, RepositoryResult};
