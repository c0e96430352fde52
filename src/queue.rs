//! Serializing request queue for the shared remote client.
//!
//! Every remote operation in the pipeline (stash, publish, finalize) runs
//! through a single [`RequestQueue`], which executes at most one task at a
//! time against the shared [`RemoteClient`]. Tasks submitted with
//! [`push`](RequestQueue::push) run in FIFO order; tasks submitted with
//! [`force`](RequestQueue::force) jump ahead of the waiting backlog but
//! never interrupt the task currently holding the slot.
//!
//! The queue has no retry logic and a task failure does not stop the
//! worker; interpreting failures is the caller's job.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::RemoteClient;
use crate::error::{Error, Result};

/// Channel capacity of each lane.
const QUEUE_CAPACITY: usize = 256;

/// A queued unit of work: performs one remote call and reports its outcome
/// through a captured oneshot channel.
type QueuedTask = Box<dyn FnOnce(Arc<dyn RemoteClient>) -> BoxFuture<'static, ()> + Send>;

/// Handle to the background worker that serializes remote calls.
///
/// The worker runs until every `RequestQueue` handle is dropped, then
/// drains nothing further and exits. Submissions after shutdown resolve to
/// [`Error::QueueClosed`].
pub struct RequestQueue {
    normal_tx: mpsc::Sender<QueuedTask>,
    priority_tx: mpsc::Sender<QueuedTask>,
}

impl RequestQueue {
    /// Create a new queue and spawn its worker task around `client`.
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        let (normal_tx, normal_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (priority_tx, priority_rx) = mpsc::channel(QUEUE_CAPACITY);

        tokio::spawn(run_worker(client, normal_rx, priority_rx));

        Self {
            normal_tx,
            priority_tx,
        }
    }

    /// Append `task` to the normal FIFO lane and wait for its outcome.
    ///
    /// `task` is invoked with the shared client once it reaches the head of
    /// the lane and the slot is free. If `cancel` fires before the task
    /// starts, the task is skipped entirely and the call resolves to
    /// [`Error::Cancelled`]; a task that has already started is never
    /// aborted by the queue — racing against its own token is the task's
    /// responsibility.
    pub async fn push<T, F>(&self, cancel: CancellationToken, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn RemoteClient>) -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        Self::submit(&self.normal_tx, cancel, task).await
    }

    /// Run `task` ahead of the waiting backlog.
    ///
    /// The task still waits for the in-flight slot holder (if any) to
    /// finish, and forced tasks run in the order they were forced. Used for
    /// finalize work, which must not be starved behind other records'
    /// stash and publish traffic.
    pub async fn force<T, F>(&self, cancel: CancellationToken, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn RemoteClient>) -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        Self::submit(&self.priority_tx, cancel, task).await
    }

    async fn submit<T, F>(lane: &mpsc::Sender<QueuedTask>, cancel: CancellationToken, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn RemoteClient>) -> BoxFuture<'static, Result<T>> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let entry: QueuedTask = Box::new(move |client| {
            Box::pin(async move {
                if cancel.is_cancelled() {
                    debug!("skipping task cancelled before start");
                    let _ = reply_tx.send(Err(Error::Cancelled));
                    return;
                }
                let _ = reply_tx.send(task(client).await);
            })
        });

        lane.send(entry).await.map_err(|_| Error::QueueClosed)?;
        reply_rx.await.map_err(|_| Error::QueueClosed)?
    }
}

/// Worker loop: drains both lanes, priority first, one task at a time.
async fn run_worker(
    client: Arc<dyn RemoteClient>,
    mut normal_rx: mpsc::Receiver<QueuedTask>,
    mut priority_rx: mpsc::Receiver<QueuedTask>,
) {
    info!("request queue worker started");

    loop {
        let task = tokio::select! {
            biased;
            Some(task) = priority_rx.recv() => task,
            Some(task) = normal_rx.recv() => task,
            else => break,
        };

        // Awaiting the task here is what gives global mutual exclusion:
        // nothing else touches the client until this future settles.
        task(client.clone()).await;
    }

    info!("request queue worker stopped (all handles dropped)");
}
