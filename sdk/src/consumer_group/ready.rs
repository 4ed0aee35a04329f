use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;

/// One-shot "a session is running" signal, re-armed for the next session.
#[derive(Debug)]
pub struct ReadySignal {
    inner: Mutex<ReadyChannel>,
}

#[derive(Debug)]
struct ReadyChannel {
    sender: Option<oneshot::Sender<()>>,
    receiver: Option<oneshot::Receiver<()>>,
}

impl ReadyChannel {
    fn armed() -> Self {
        let (sender, receiver) = oneshot::channel();
        ReadyChannel {
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySignal {
    pub fn new() -> Self {
        ReadySignal {
            inner: Mutex::new(ReadyChannel::armed()),
        }
    }

    /// Fires the current signal. Further calls before [`ReadySignal::rearm`] do nothing.
    pub fn notify(&self) {
        let mut channel = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = channel.sender.take() {
            // The waiter may be gone already, which is fine.
            let _ = sender.send(());
        }
    }

    /// Arms a fresh signal if the current one has fired.
    pub fn rearm(&self) {
        let mut channel = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if channel.sender.is_none() {
            *channel = ReadyChannel::armed();
        }
    }

    /// Takes the receiver of the current signal; `None` if it was already taken.
    pub fn subscribe(&self) -> Option<oneshot::Receiver<()>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .receiver
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waiter_should_be_released_by_notify() {
        let signal = ReadySignal::new();
        let ready = signal.subscribe().unwrap();
        assert!(signal.subscribe().is_none());

        signal.notify();
        signal.notify();
        assert!(ready.await.is_ok());
    }

    #[tokio::test]
    async fn early_subscriber_should_see_a_session_that_already_ended() {
        let signal = ReadySignal::new();
        let ready = signal.subscribe().unwrap();

        // Setup of the first session, then the rejoin after it ended.
        signal.notify();
        signal.rearm();

        assert!(ready.await.is_ok());
    }

    #[tokio::test]
    async fn rearm_should_only_replace_a_fired_signal() {
        let signal = ReadySignal::new();
        let first = signal.subscribe().unwrap();

        // Not fired yet, so the first waiter keeps its channel.
        signal.rearm();
        assert!(signal.subscribe().is_none());

        signal.notify();
        assert!(first.await.is_ok());

        signal.rearm();
        let second = signal.subscribe().unwrap();
        signal.notify();
        assert!(second.await.is_ok());
    }
}
