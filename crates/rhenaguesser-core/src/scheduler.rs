//! Delayed, cancellable per-session tasks.
//!
//! After a round completes the next location is published only once the
//! reveal delay has elapsed. The scheduler keeps at most one pending task
//! per session: scheduling again replaces (aborts) the previous one, and
//! removing a session cancels whatever it had pending.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use rhenaguesser_types::SessionId;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Pending delayed tasks keyed by session.
#[derive(Debug, Default)]
pub struct RoundScheduler {
    pending: Mutex<HashMap<SessionId, JoinHandle<()>>>,
}

impl RoundScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing any task pending for `session`.
    pub async fn schedule<F>(&self, session: SessionId, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|_, h| !h.is_finished());
        if let Some(previous) = pending.insert(session.clone(), handle) {
            debug!(%session, "replacing pending round task");
            previous.abort();
        }
    }

    /// Abort the task pending for `session`, returning whether one was.
    pub async fn cancel(&self, session: &SessionId) -> bool {
        match self.pending.lock().await.remove(session) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a task for `session` is still waiting to fire.
    pub async fn is_pending(&self, session: &SessionId) -> bool {
        self.pending
            .lock()
            .await
            .get(session)
            .is_some_and(|h| !h.is_finished())
    }

    /// Number of tasks that have not fired yet.
    pub async fn pending(&self) -> usize {
        self.pending
            .lock()
            .await
            .values()
            .filter(|h| !h.is_finished())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter_task(counter: &Arc<AtomicUsize>, add: usize) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(add, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn task_fires_after_delay() {
        let scheduler = RoundScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        scheduler
            .schedule(SessionId::from("AAAA"), Duration::from_secs(7), counter_task(&counter, 1))
            .await;

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending(&SessionId::from("AAAA")).await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending().await, 0);
        assert!(!scheduler.is_pending(&SessionId::from("AAAA")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_previous_task() {
        let scheduler = RoundScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = SessionId::from("AAAA");
        scheduler
            .schedule(id.clone(), Duration::from_secs(7), counter_task(&counter, 1))
            .await;
        scheduler
            .schedule(id, Duration::from_secs(7), counter_task(&counter, 10))
            .await;

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_fires() {
        let scheduler = RoundScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = SessionId::from("AAAA");
        scheduler
            .schedule(id.clone(), Duration::from_secs(7), counter_task(&counter, 1))
            .await;

        assert!(scheduler.cancel(&id).await);
        assert!(!scheduler.cancel(&id).await);

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
