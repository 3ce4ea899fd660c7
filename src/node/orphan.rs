//! Chain rollback
//!
//! Winds the chain tip back to a target height one block at a time. Every
//! step undoes the tip, commits, and clears any pending repository state
//! before moving on, so a failure leaves the chain at the last committed
//! height.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::node::ports::{BlockProcessor, OrphanObserver};
use crate::storage::{BlockRepository, DataError};

/// Process-wide lock guarding chain mutation.
///
/// Re-entrant: a thread already holding it may acquire it again. Cloning
/// shares the same underlying lock.
#[derive(Clone, Default)]
pub struct ChainLock {
    inner: Arc<ReentrantMutex<()>>,
}

/// Held while the chain is being mutated. Releases on drop.
pub struct ChainLockGuard<'a> {
    _guard: ReentrantMutexGuard<'a, ()>,
}

impl ChainLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire without blocking. `None` means another thread is mutating
    /// the chain.
    pub fn try_lock(&self) -> Option<ChainLockGuard<'_>> {
        self.inner
            .try_lock()
            .map(|guard| ChainLockGuard { _guard: guard })
    }

    /// Acquire, blocking until available. For forward block processing.
    pub fn lock(&self) -> ChainLockGuard<'_> {
        ChainLockGuard {
            _guard: self.inner.lock(),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

impl fmt::Debug for ChainLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainLock")
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Drop staged writes after a failed step, keeping the step's error
fn discard_after_failure(repository: &mut dyn BlockRepository, height: u32) {
    if let Err(e) = repository.discard() {
        warn!(height, error = %e, "Unable to discard pending changes");
    }
}

/// Rolls the chain back under the chain lock
pub struct OrphanController {
    lock: ChainLock,
    processor: Arc<dyn BlockProcessor>,
    observers: Vec<Arc<dyn OrphanObserver>>,
}

impl OrphanController {
    pub fn new(lock: ChainLock, processor: Arc<dyn BlockProcessor>) -> Self {
        Self {
            lock,
            processor,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn OrphanObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn chain_lock(&self) -> &ChainLock {
        &self.lock
    }

    /// Orphan blocks until the tip is at `target_height`.
    ///
    /// Returns `Ok(false)` without doing anything if the chain lock is held
    /// elsewhere. On error the chain stays at the last committed height.
    pub fn orphan(
        &self,
        repository: &mut dyn BlockRepository,
        target_height: u32,
    ) -> Result<bool, DataError> {
        let Some(_guard) = self.lock.try_lock() else {
            debug!(target_height, "Chain lock busy, orphan not attempted");
            return Ok(false);
        };

        let Some(mut block) = repository.get_tip()? else {
            return Ok(true);
        };
        let mut height = block.height;

        if height > target_height {
            info!(from = height, to = target_height, "Orphaning blocks");
        }

        while height > target_height {
            if let Err(e) = self.processor.undo(repository, &block) {
                discard_after_failure(repository, height);
                error!(height, error = %e, "Unable to orphan block");
                return Err(match e {
                    DataError::UndoFailed { .. } => e,
                    other => DataError::UndoFailed {
                        height,
                        reason: other.to_string(),
                    },
                });
            }

            if let Err(e) = repository.commit() {
                discard_after_failure(repository, height);
                error!(height, error = %e, "Unable to commit orphaned block");
                return Err(DataError::StorageCommitFailed {
                    height,
                    reason: e.to_string(),
                });
            }

            // Committed: the block is gone whatever happens next
            for observer in &self.observers {
                observer.on_block_orphaned(block.height, &block);
            }
            debug!(height = block.height, "Block orphaned");

            // Clear transactional state before moving on so readers are not held up
            repository.discard()?;

            height -= 1;
            if height > target_height {
                block = repository
                    .get_by_height(height)?
                    .ok_or(DataError::MissingBlock(height))?;
            }
        }

        Ok(true)
    }
}
