//! Cooperative cancellation for lifecycle poll loops.
//!
//! A [`CancelHandle`] flips a shared flag; every [`Cancellation`] cloned from
//! the same pair observes it at the next poll trigger. In-flight requests are
//! never interrupted.

use tokio::sync::watch;

/// Creates a connected handle and signal.
#[must_use]
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (sender, receiver) = watch::channel(false);
    (
        CancelHandle { sender },
        Cancellation {
            receiver: Some(receiver),
        },
    )
}

/// Sender side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Requests cancellation. Repeated calls are harmless.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns a new signal observing this handle.
    #[must_use]
    pub fn signal(&self) -> Cancellation {
        Cancellation {
            receiver: Some(self.sender.subscribe()),
        }
    }
}

/// Receiver side of a cancellation pair.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    receiver: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// Signal that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self { receiver: None }
    }

    /// True once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.receiver
            .as_ref()
            .is_some_and(|receiver| *receiver.borrow())
    }

    /// Resolves once cancellation has been requested.
    ///
    /// Stays pending forever when the handle was dropped without cancelling
    /// or when the signal is [`Cancellation::never`].
    pub async fn cancelled(&mut self) {
        let Some(receiver) = self.receiver.as_mut() else {
            return std::future::pending().await;
        };
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
