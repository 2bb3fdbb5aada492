//! Resource management

use crate::error::AnalyticsError;

use tokio::sync::{Semaphore, SemaphorePermit};

/// [crate::resource_manager::ResourceManager] bounds the resources used by concurrent pipeline
/// runs. Each type of resource is managed by an optional Tokio Semaphore; an absent semaphore
/// means the resource is unlimited.
#[derive(Debug)]
pub struct ResourceManager {
    /// Optional semaphore for S3 connections.
    s3_connections: Option<Semaphore>,

    /// Optional semaphore for buffered dataset memory (bytes).
    memory: Option<Semaphore>,

    /// Optional total memory pool in bytes.
    total_memory: Option<usize>,

    /// Optional semaphore for CPU-bound parse and aggregation tasks.
    tasks: Option<Semaphore>,
}

impl ResourceManager {
    /// Returns a new ResourceManager object.
    pub fn new(
        s3_connection_limit: Option<usize>,
        memory_limit: Option<usize>,
        task_limit: Option<usize>,
    ) -> Self {
        Self {
            s3_connections: s3_connection_limit.map(Semaphore::new),
            memory: memory_limit.map(Semaphore::new),
            total_memory: memory_limit,
            tasks: task_limit.map(Semaphore::new),
        }
    }

    /// Acquire an S3 connection resource.
    pub async fn s3_connection(&self) -> Result<Option<SemaphorePermit>, AnalyticsError> {
        optional_acquire(&self.s3_connections, 1).await
    }

    /// Acquire memory for a dataset of `bytes` bytes.
    ///
    /// Fails immediately if the request can never be satisfied.
    pub async fn memory(&self, bytes: usize) -> Result<Option<SemaphorePermit>, AnalyticsError> {
        match self.total_memory {
            Some(total) if bytes > total => Err(AnalyticsError::InsufficientMemory {
                requested: bytes,
                total,
            }),
            _ => optional_acquire(&self.memory, bytes).await,
        }
    }

    /// Acquire a task resource.
    pub async fn task(&self) -> Result<Option<SemaphorePermit>, AnalyticsError> {
        optional_acquire(&self.tasks, 1).await
    }
}

/// Acquire permits on an optional Semaphore, if present.
async fn optional_acquire(
    sem: &Option<Semaphore>,
    n: usize,
) -> Result<Option<SemaphorePermit>, AnalyticsError> {
    let n = n.try_into()?;
    match sem {
        Some(sem) => Ok(Some(sem.acquire_many(n).await?)),
        None => Ok(None),
    }
}
