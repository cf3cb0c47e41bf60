// =============================================================================
// Result Handle - write-once, non-blocking read
// =============================================================================

use std::task::Poll;

use tokio::sync::oneshot::{self, error::TryRecvError};

use super::{PredictionError, PredictionOutcome};

/// Receive side of a job's single-use result slot.
///
/// The producing worker writes exactly one [`PredictionOutcome`]. Reading
/// never blocks: [`ResultHandle::try_take`] reports `Pending` until the value
/// is written, yields it once, and reports `Ready(None)` afterwards.
#[derive(Debug)]
pub struct ResultHandle {
    rx: oneshot::Receiver<PredictionOutcome>,
    taken: bool,
}

impl ResultHandle {
    /// Create a linked producer / handle pair for a new job.
    pub fn channel() -> (oneshot::Sender<PredictionOutcome>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx, taken: false })
    }

    /// A handle that is already resolved to `outcome`.
    pub fn resolved(outcome: PredictionOutcome) -> Self {
        let (tx, handle) = Self::channel();
        // The receiver is alive in `handle`, so the send cannot fail.
        let _ = tx.send(outcome);
        handle
    }

    /// Non-blocking read of the slot.
    ///
    /// A producer that went away without writing resolves the handle to
    /// [`PredictionError::Dropped`] instead of leaving it pending forever.
    pub fn try_take(&mut self) -> Poll<Option<PredictionOutcome>> {
        if self.taken {
            return Poll::Ready(None);
        }

        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return Poll::Pending,
            Err(TryRecvError::Closed) => PredictionError::Dropped.into(),
        };

        self.taken = true;
        Poll::Ready(Some(outcome))
    }

    /// Wait for the outcome.
    pub async fn wait(self) -> PredictionOutcome {
        if self.taken {
            return PredictionError::Dropped.into();
        }
        self.rx
            .await
            .unwrap_or_else(|_| PredictionError::Dropped.into())
    }
}
