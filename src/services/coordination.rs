//! Read/modify/write access to the shared round document.
//!
//! Every participant (host session, team routes, team consoles in other
//! processes) goes through a [`CoordinationStore`]. There is no locking beyond
//! the backend's atomic replace: concurrent writers race and the last full
//! document written wins.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    dao::{
        round_store::RoundStore,
        storage::{StorageError, StorageResult},
    },
    state::round::{RoundState, RoundUpdate},
};

/// Default number of attempts for a read or a write.
pub const DEFAULT_ATTEMPTS: u32 = 5;
/// Default base delay between attempts, multiplied by the attempt number.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(50);

/// Bounded linear retry used for every store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Build a policy; at least one attempt is always made.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Total number of attempts.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause before retrying after the `attempt`-th failure.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BACKOFF)
    }
}

/// Shared handle over a [`RoundStore`] applying the retry rules of the
/// coordination protocol.
#[derive(Clone)]
pub struct CoordinationStore {
    store: Arc<dyn RoundStore>,
    retry: RetryPolicy,
}

impl CoordinationStore {
    /// Wrap a backend with the given retry policy.
    pub fn new(store: Arc<dyn RoundStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Retry policy in use.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Read the current document.
    ///
    /// A missing document reads as the default state. When every attempt
    /// fails the default state is returned as well, so callers always get a
    /// value; this is the degraded read path.
    pub async fn read(&self) -> RoundState {
        match self.load().await {
            Ok(round) => round.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "round document unreadable; using defaults");
                RoundState::default()
            }
        }
    }

    /// Apply a partial update. Returns the persisted document, or `None` when
    /// the update had to be dropped.
    pub async fn write(&self, update: RoundUpdate) -> Option<RoundState> {
        self.modify(|round| update.applied_to(round)).await
    }

    /// Apply a partial update, reporting why it was dropped.
    pub async fn try_write(&self, update: RoundUpdate) -> StorageResult<RoundState> {
        self.try_modify(|round| Ok(update.applied_to(round))).await
    }

    /// Apply `f` to the current document and persist the result. Returns
    /// `None` when the update had to be dropped.
    pub async fn modify<F>(&self, f: F) -> Option<RoundState>
    where
        F: FnOnce(RoundState) -> RoundState,
    {
        match self
            .try_modify(|round| Ok::<_, StorageError>(f(round)))
            .await
        {
            Ok(round) => Some(round),
            Err(err) => {
                warn!(error = %err, "dropping round update");
                None
            }
        }
    }

    /// Fallible read-modify-write cycle.
    ///
    /// The current document is loaded strictly: an unreadable document is
    /// retried and never replaced by defaults. `f` may reject the update, in
    /// which case nothing is written and its error is returned.
    pub async fn try_modify<F, E>(&self, f: F) -> Result<RoundState, E>
    where
        F: FnOnce(RoundState) -> Result<RoundState, E>,
        E: From<StorageError>,
    {
        let current = self.load().await?.unwrap_or_default();
        let next = f(current)?;
        self.persist(&next).await?;
        Ok(next)
    }

    /// Replace the whole document.
    pub async fn overwrite(&self, round: RoundState) -> StorageResult<()> {
        self.persist(&round).await
    }

    /// Create the default document when none exists yet and return the
    /// current one.
    pub async fn ensure_initialized(&self) -> StorageResult<RoundState> {
        match self.load().await? {
            Some(round) => Ok(round),
            None => {
                let round = RoundState::default();
                self.persist(&round).await?;
                debug!("created default round document");
                Ok(round)
            }
        }
    }

    /// Check the backend once, without retries.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.store.health_check().await
    }

    async fn load(&self) -> StorageResult<Option<RoundState>> {
        let mut attempt = 1;
        loop {
            match self.store.load().await {
                Ok(entity) => return Ok(entity.map(RoundState::from)),
                Err(err) if attempt >= self.retry.attempts => return Err(err),
                Err(err) => {
                    debug!(attempt, error = %err, "round document read failed; retrying");
                    sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn persist(&self, round: &RoundState) -> StorageResult<()> {
        let mut attempt = 1;
        loop {
            match self.store.replace(round.clone().into()).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt >= self.retry.attempts => return Err(err),
                Err(err) => {
                    debug!(attempt, error = %err, "round document write failed; retrying");
                    sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
