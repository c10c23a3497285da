//! Background worker lifecycle.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a running pipeline worker: cancel it and wait for it to drain.
///
/// Cancellation is cooperative — the worker finishes the message or batch it
/// is on before stopping, so nothing is left half-processed. Dropping the
/// handle cancels the worker.
#[derive(Debug)]
pub struct WorkerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn new(token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            token,
            task: Some(task),
        }
    }

    /// Requests the worker to stop after its current message.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Waits for the worker task to finish.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
