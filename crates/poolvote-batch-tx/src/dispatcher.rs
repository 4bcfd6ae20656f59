//! A bounded job pool. At most `capacity` jobs run between dispatch and
//! completion; `join_all` is the barrier that must fire before any result is
//! read.

use crate::{BatchError, BatchResult};
use futures::future::{Future, FutureExt};
use std::sync::Arc;
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    task::JoinSet,
};
use tracing::error;

pub struct BoundedDispatcher<T> {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    jobs: JoinSet<T>,
}

impl<T: Send + 'static> BoundedDispatcher<T> {
    /// Create a dispatcher that runs at most `capacity` jobs at once (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            jobs: JoinSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs dispatched and not yet finished
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Start `job` once a slot is free; waits while `capacity` jobs are running
    pub async fn dispatch<F>(&mut self, job: F) -> BatchResult<()>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BatchError::DispatcherClosed)?;
        self.jobs.spawn(job_with_permit(job, permit));
        Ok(())
    }

    /// Wait for every dispatched job and return their results in completion order
    ///
    /// A job that panicked is logged and contributes no result.
    pub async fn join_all(mut self) -> Vec<T> {
        let mut results = Vec::with_capacity(self.jobs.len());
        while let Some(joined) = self.jobs.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(err) => error!("dispatched job did not complete: {}", err),
            }
        }
        results
    }
}

/// Release the slot as soon as the job's own future resolves
fn job_with_permit<F>(job: F, permit: OwnedSemaphorePermit) -> impl Future<Output = F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    job.map(move |ret| {
        drop(permit);
        ret
    })
}
