use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::errors::BootError;

/// Completion signal handed to an asynchronous initializer step as its
/// reserved trailing `done` argument.
///
/// Fires exactly once; later calls are ignored. Dropping the handle
/// without firing resolves the step as failed on the awaiting side, so a
/// step that errors out of every path still cannot hang the pipeline.
pub struct Completion {
    tx: Mutex<Option<oneshot::Sender<Option<BootError>>>>,
}

impl Completion {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Option<BootError>>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Signal the step's outcome.
    pub fn resolve(&self, outcome: Result<(), BootError>) {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => {
                tracing::warn!("completion signal lock poisoned; outcome dropped");
                return;
            }
        };
        match sender {
            // A send error only means the pipeline stopped listening.
            Some(tx) => {
                let _ = tx.send(outcome.err());
            }
            None => {
                tracing::debug!("completion signal already fired; ignoring");
            }
        }
    }

    /// Signal success.
    pub fn ok(&self) {
        self.resolve(Ok(()));
    }

    /// Signal failure with the given error.
    pub fn fail(&self, error: BootError) {
        self.resolve(Err(error));
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fired = self.tx.lock().map(|g| g.is_none()).unwrap_or(true);
        f.debug_struct("Completion").field("fired", &fired).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fires_once_with_success() {
        let (done, rx) = Completion::channel();
        done.ok();
        assert!(rx.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn carries_the_error() {
        let (done, rx) = Completion::channel();
        done.fail(BootError::configuration("db down"));
        let outcome = rx.await.unwrap();
        assert!(outcome.unwrap().is_configuration());
    }

    #[tokio::test]
    async fn second_fire_is_ignored() {
        let (done, rx) = Completion::channel();
        done.ok();
        done.fail(BootError::configuration("late"));
        assert!(rx.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dropping_without_firing_closes_the_channel() {
        let (done, rx) = Completion::channel();
        drop(done);
        assert!(rx.await.is_err());
    }
}
