use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::Notifier;

/// Bounded queue between the cycle and the notification sender.
///
/// - `push` never blocks: when full, the oldest queued message is dropped.
/// - `pop` waits for a message; after `close` it drains what is left and
///   then returns `None`.
#[derive(Debug, Clone)]
pub struct Outbox {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    queue: Mutex<VecDeque<String>>,
    capacity: usize,
    ready: Notify,
    closed: AtomicBool,
}

impl Outbox {
    /// `capacity` of 0 is treated as 1.
    pub fn bounded(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                capacity,
                ready: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Enqueue `msg`. Returns the message that was evicted to make room, if any.
    pub fn push(&self, msg: String) -> Option<String> {
        let dropped = {
            let mut q = self.inner.queue.lock().expect("outbox mutex poisoned");
            let dropped = if q.len() >= self.inner.capacity {
                q.pop_front()
            } else {
                None
            };
            q.push_back(msg);
            dropped
        };
        counter!("notifications_enqueued_total").increment(1);
        if let Some(old) = &dropped {
            counter!("notifications_dropped_total").increment(1);
            tracing::warn!(target: "notify", dropped = %old, "outbox full, dropped oldest message");
        }
        self.inner.ready.notify_one();
        dropped
    }

    pub async fn pop(&self) -> Option<String> {
        loop {
            let ready = self.inner.ready.notified();
            {
                let mut q = self.inner.queue.lock().expect("outbox mutex poisoned");
                if let Some(msg) = q.pop_front() {
                    return Some(msg);
                }
                if self.inner.closed.load(Ordering::Acquire) {
                    return None;
                }
            }
            ready.await;
        }
    }

    /// Mark the queue closed: the sender delivers what is queued and exits.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.ready.notify_waiters();
        self.inner.ready.notify_one();
    }

    pub fn len(&self) -> usize {
        self.inner.queue.lock().expect("outbox mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take everything currently queued without sending it.
    pub fn drain(&self) -> Vec<String> {
        let mut q = self.inner.queue.lock().expect("outbox mutex poisoned");
        q.drain(..).collect()
    }
}

/// Spawn the sender task: delivers queued messages one by one, sleeping
/// `delay` after each send so the channel is not flooded.
pub fn spawn_sender(outbox: Outbox, notifier: Arc<dyn Notifier>, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = outbox.pop().await {
            match notifier.deliver(&msg).await {
                Ok(()) => {
                    counter!("notifications_sent_total").increment(1);
                    tracing::info!(target: "notify", channel = notifier.name(), text = %msg, "notification sent");
                }
                Err(e) => {
                    counter!("notifications_failed_total").increment(1);
                    tracing::warn!(target: "notify", channel = notifier.name(), text = %msg, "delivery failed: {e:#}");
                }
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        tracing::debug!(target: "notify", "outbox closed, sender stopped");
    })
}
