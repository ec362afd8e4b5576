//! Cancellable delayed retries.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::navigation::driver::BrowserEvent;
use crate::navigation::state::LoadToken;

/// Schedules a one-shot "retry due" signal for a load token.
pub trait RetryScheduler {
    type Handle;

    fn schedule(&mut self, delay: Duration, token: LoadToken) -> Self::Handle;

    /// Prevent a scheduled signal from firing. Cancelling a fired handle is a no-op.
    fn cancel(&mut self, handle: Self::Handle);
}

/// [`RetryScheduler`] backed by `tokio::time::sleep` tasks.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    events: mpsc::UnboundedSender<BrowserEvent>,
}

impl TokioScheduler {
    pub fn new(events: mpsc::UnboundedSender<BrowserEvent>) -> Self {
        Self { events }
    }
}

impl RetryScheduler for TokioScheduler {
    type Handle = JoinHandle<()>;

    fn schedule(&mut self, delay: Duration, token: LoadToken) -> Self::Handle {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(BrowserEvent::RetryDue { token });
        })
    }

    fn cancel(&mut self, handle: Self::Handle) {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        scheduler.schedule(Duration::from_secs(5), LoadToken(7));

        match rx.recv().await {
            Some(BrowserEvent::RetryDue { token }) => assert_eq!(token, LoadToken(7)),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_retry_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TokioScheduler::new(tx);

        let handle = scheduler.schedule(Duration::from_secs(5), LoadToken(1));
        scheduler.cancel(handle);
        scheduler.schedule(Duration::from_secs(10), LoadToken(2));

        match rx.recv().await {
            Some(BrowserEvent::RetryDue { token }) => assert_eq!(token, LoadToken(2)),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
