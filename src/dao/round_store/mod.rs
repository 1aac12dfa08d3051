pub mod file;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::models::RoundStateEntity;
use crate::dao::storage::StorageResult;

pub use file::FileRoundStore;
pub use memory::MemoryRoundStore;

/// Abstraction over the medium holding the shared round document.
///
/// Backends only offer whole-document reads and whole-document replacement;
/// read-modify-write cycles and retries live one layer up.
pub trait RoundStore: Send + Sync {
    /// Load the current document, `None` when it was never written.
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<RoundStateEntity>>>;
    /// Atomically replace the whole document.
    fn replace(&self, round: RoundStateEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend is still reachable and writable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
