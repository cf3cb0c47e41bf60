// =============================================================================
// Prediction Dispatcher - bounded queue + fixed worker pool
// =============================================================================
//
// Submissions never wait. A job is either placed on the bounded queue, or the
// caller immediately gets a handle that is already resolved to a failure
// (queue full, or the dispatcher closed). Workers pull jobs one at a time, so
// each worker processes its jobs in arrival order; completions across workers
// are unordered.
//
// A failing remote call is terminal for that job only. The worker writes the
// failure into the job's result slot and moves on to the next job.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::client::PredictionClient;
use super::handle::ResultHandle;
use super::{PredictionError, PredictionOutcome};

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One queued prediction request. Consumed by exactly one worker.
#[derive(Debug)]
pub struct PredictionJob {
    pub id: Uuid,
    pub file_name: String,
    pub payload: Vec<u8>,
    reply: tokio::sync::oneshot::Sender<PredictionOutcome>,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<PredictionJob>>>;

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Fixed-size worker pool fed by a bounded FIFO queue.
pub struct PredictionDispatcher {
    sender: RwLock<Option<mpsc::Sender<PredictionJob>>>,
    /// Keeps the queue open even when the pool has no workers.
    _queue: JobQueue,
    capacity: usize,
    workers: usize,
}

impl PredictionDispatcher {
    /// Spawn `workers` worker tasks sharing a queue of `capacity` jobs.
    ///
    /// Must be called from within a Tokio runtime. A `capacity` of zero is
    /// raised to one since the queue cannot be unbuffered.
    pub fn new(client: PredictionClient, workers: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let queue: JobQueue = Arc::new(Mutex::new(rx));

        for worker_id in 0..workers {
            let queue = queue.clone();
            let client = client.clone();
            tokio::spawn(async move {
                run_worker(worker_id, queue, client).await;
            });
        }

        info!(workers, capacity, base_url = ?client.base_url(), "prediction dispatcher started");

        Self {
            sender: RwLock::new(Some(tx)),
            _queue: queue,
            capacity,
            workers,
        }
    }

    /// Queue a prediction for `payload` and return its result handle.
    ///
    /// Never blocks. When the queue is full the returned handle is already
    /// resolved to [`PredictionError::Busy`].
    pub fn submit(&self, file_name: impl Into<String>, payload: Vec<u8>) -> ResultHandle {
        let (reply, handle) = ResultHandle::channel();
        let job = PredictionJob {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            payload,
            reply,
        };
        let job_id = job.id;

        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            warn!(job_id = %job_id, "prediction rejected - dispatcher closed");
            return ResultHandle::resolved(PredictionError::Closed.into());
        };

        match sender.try_send(job) {
            Ok(()) => {
                debug!(job_id = %job_id, queued = self.capacity - sender.capacity(), "prediction job queued");
                handle
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(
                    job_id = %job.id,
                    file_name = %job.file_name,
                    capacity = self.capacity,
                    "prediction rejected - queue full"
                );
                ResultHandle::resolved(PredictionError::Busy.into())
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(job_id = %job.id, "prediction rejected - queue closed");
                ResultHandle::resolved(PredictionError::Closed.into())
            }
        }
    }

    /// Stop accepting submissions. Jobs already queued still run; workers exit
    /// once the queue is drained.
    pub fn close(&self) {
        if self.sender.write().take().is_some() {
            info!("prediction dispatcher closed to new submissions");
        }
    }

    /// Number of jobs waiting in the queue (zero once closed).
    pub fn queued(&self) -> usize {
        self.sender
            .read()
            .as_ref()
            .map(|s| self.capacity - s.capacity())
            .unwrap_or(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

async fn run_worker(worker_id: usize, queue: JobQueue, client: PredictionClient) {
    debug!(worker_id, "prediction worker started");

    loop {
        // Only one idle worker waits on the receiver at a time; the lock is
        // released before the job runs.
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        let PredictionJob {
            id,
            file_name,
            payload,
            reply,
        } = job;

        info!(worker_id, job_id = %id, file_name = %file_name, "prediction job started");
        let started = Instant::now();

        let outcome = match client.predict(&file_name, payload).await {
            Ok(data) => {
                info!(
                    worker_id,
                    job_id = %id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "prediction job succeeded"
                );
                PredictionOutcome::Success(data)
            }
            Err(e) => {
                warn!(
                    worker_id,
                    job_id = %id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "prediction job failed"
                );
                e.into()
            }
        };

        if reply.send(outcome).is_err() {
            debug!(worker_id, job_id = %id, "result handle gone - outcome discarded");
        }
    }

    debug!(worker_id, "prediction worker exiting - queue closed");
}

#[cfg(test)]
mod tests {
    use std::task::Poll;
    use std::time::Duration;

    use super::*;
    use crate::prediction::testing::{fake_service, unreachable_base_url, SLOW_DELAY};

    const WAIT: Duration = Duration::from_secs(5);

    fn client(base: Option<String>) -> PredictionClient {
        PredictionClient::new(base, Duration::from_secs(5)).unwrap()
    }

    async fn resolve(handle: ResultHandle) -> PredictionOutcome {
        tokio::time::timeout(WAIT, handle.wait())
            .await
            .expect("job did not resolve in time")
    }

    fn failure_cause(outcome: PredictionOutcome) -> String {
        match outcome {
            PredictionOutcome::Failed(cause) => cause,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn overflow_fails_fast_without_workers() {
        let dispatcher = PredictionDispatcher::new(client(None), 0, 2);

        let mut first = dispatcher.submit("a.csv", b"1".to_vec());
        let mut second = dispatcher.submit("b.csv", b"2".to_vec());
        assert_eq!(dispatcher.queued(), 2);

        let started = Instant::now();
        let mut third = dispatcher.submit("c.csv", b"3".to_vec());
        assert!(started.elapsed() < Duration::from_millis(50));

        assert!(first.try_take().is_pending());
        assert!(second.try_take().is_pending());
        match third.try_take() {
            Poll::Ready(Some(PredictionOutcome::Failed(cause))) => {
                assert!(cause.contains("busy"), "cause: {cause}");
            }
            other => panic!("expected immediate busy failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_capacity_is_raised_to_one() {
        let dispatcher = PredictionDispatcher::new(client(None), 0, 0);
        assert_eq!(dispatcher.capacity(), 1);
        let mut queued = dispatcher.submit("a.csv", Vec::new());
        assert!(queued.try_take().is_pending());
    }

    #[tokio::test]
    async fn job_resolves_to_remote_payload() {
        let base = fake_service().await;
        let dispatcher = PredictionDispatcher::new(client(Some(base)), 2, 8);

        match resolve(dispatcher.submit("aapl.csv", b"Close\n1\n2\n".to_vec())).await {
            PredictionOutcome::Success(data) => {
                assert_eq!(data["file_name"], "aapl.csv");
                assert!(data.contains_key("predictions"));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn remote_500_does_not_affect_concurrent_job() {
        let base = fake_service().await;
        let dispatcher = PredictionDispatcher::new(client(Some(base)), 2, 8);

        let failing = dispatcher.submit("bad.csv", b"FAIL".to_vec());
        let healthy = dispatcher.submit("good.csv", b"Close\n1\n".to_vec());

        let (failing, healthy) = tokio::join!(resolve(failing), resolve(healthy));
        let cause = failure_cause(failing);
        assert!(cause.contains("500"), "cause: {cause}");
        assert!(matches!(healthy, PredictionOutcome::Success(_)));
    }

    #[tokio::test]
    async fn worker_survives_a_failed_job() {
        let base = fake_service().await;
        let dispatcher = PredictionDispatcher::new(client(Some(base)), 1, 8);

        let failing = dispatcher.submit("bad.csv", b"ARRAY".to_vec());
        let next = dispatcher.submit("good.csv", b"Close\n1\n".to_vec());

        assert!(failure_cause(resolve(failing).await).contains("decode"));
        assert!(matches!(resolve(next).await, PredictionOutcome::Success(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_captured() {
        let base = unreachable_base_url().await;
        let dispatcher = PredictionDispatcher::new(client(Some(base)), 1, 4);

        let cause = failure_cause(resolve(dispatcher.submit("a.csv", b"x".to_vec())).await);
        assert!(cause.contains("request failed"), "cause: {cause}");
    }

    #[tokio::test]
    async fn remote_call_past_timeout_fails() {
        let base = fake_service().await;
        let client = PredictionClient::new(Some(base), Duration::from_millis(100)).unwrap();
        let dispatcher = PredictionDispatcher::new(client, 1, 4);

        let started = Instant::now();
        let cause = failure_cause(resolve(dispatcher.submit("slow.csv", b"SLOW".to_vec())).await);
        assert!(cause.contains("request failed"), "cause: {cause}");
        assert!(started.elapsed() < SLOW_DELAY, "timeout was not applied");
    }

    #[tokio::test]
    async fn unconfigured_backend_fails_each_job() {
        let dispatcher = PredictionDispatcher::new(client(None), 1, 4);
        let cause = failure_cause(resolve(dispatcher.submit("a.csv", b"x".to_vec())).await);
        assert!(cause.contains("not configured"), "cause: {cause}");
    }

    #[tokio::test]
    async fn close_rejects_new_jobs_but_drains_queue() {
        let base = fake_service().await;
        let dispatcher = PredictionDispatcher::new(client(Some(base)), 1, 4);

        let queued = dispatcher.submit("slow.csv", b"SLOW".to_vec());
        dispatcher.close();
        assert_eq!(dispatcher.queued(), 0);

        let mut rejected = dispatcher.submit("late.csv", b"x".to_vec());
        match rejected.try_take() {
            Poll::Ready(Some(PredictionOutcome::Failed(cause))) => {
                assert!(cause.contains("shutting down"), "cause: {cause}");
            }
            other => panic!("expected closed failure, got {other:?}"),
        }

        assert!(matches!(resolve(queued).await, PredictionOutcome::Success(_)));
    }
}
