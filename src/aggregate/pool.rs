// src/aggregate/pool.rs
//! Process-wide bound on concurrent adapter calls.
//!
//! Created once at service start, shared by every request, closed on
//! shutdown. A closed pool refuses new work; waiting tasks wake with an error.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const DEFAULT_POOL_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("worker pool is shut down")]
pub struct PoolClosed;

impl WorkerPool {
    /// Pool with `size` slots; zero is bumped to one.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots currently held by running adapter calls.
    pub fn in_flight(&self) -> usize {
        self.size.saturating_sub(self.permits.available_permits())
    }

    /// Wait for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, PoolClosed> {
        self.permits.clone().acquire_owned().await.map_err(|_| PoolClosed)
    }

    pub fn shutdown(&self) {
        if !self.permits.is_closed() {
            tracing::info!(size = self.size, "worker pool shutting down");
        }
        self.permits.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
