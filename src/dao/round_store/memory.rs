use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::dao::{models::RoundStateEntity, round_store::RoundStore, storage::StorageResult};

/// Round store keeping the document in process memory.
///
/// Clones share the same document, which makes it convenient for tests that
/// simulate several participants and for single-process deployments.
#[derive(Clone, Default)]
pub struct MemoryRoundStore {
    document: Arc<Mutex<Option<RoundStateEntity>>>,
}

impl MemoryRoundStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoundStore for MemoryRoundStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<Option<RoundStateEntity>>> {
        let document = self.document.clone();
        Box::pin(async move { Ok(document.lock().await.clone()) })
    }

    fn replace(&self, round: RoundStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let document = self.document.clone();
        Box::pin(async move {
            *document.lock().await = Some(round);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
