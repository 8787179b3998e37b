//! Shares the latest item of an upstream stream between subscribers, running the upstream only
//! while someone is watching.
//!
//! The upstream is started by the first [Subscription]. When the last subscription is dropped
//! the upstream keeps running for a grace period, so a subscriber that comes back quickly (a
//! screen being recreated, say) sees the live value instead of a reload. Once the grace period
//! runs out the upstream task is aborted, and the next subscription starts a fresh one. The last
//! published value survives the restart until the fresh upstream publishes.

use futures::stream::{BoxStream, StreamExt};
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingStatus {
    /// No upstream running.
    Detached,
    /// Upstream running with at least one subscriber.
    Attached,
    /// Upstream running with no subscribers, waiting out the grace period.
    Draining,
}

enum Phase {
    Detached,
    Attached {
        observers: usize,
        collector: JoinHandle<()>,
    },
    Draining {
        collector: JoinHandle<()>,
        generation: u64,
    },
}

struct Lifecycle {
    phase: Phase,
    // bumped every time draining starts, so a stale grace timer can tell it lost the race
    generation: u64,
}

type Upstream<T> = dyn Fn() -> BoxStream<'static, T> + Send + Sync;

struct Shared<T> {
    value: Arc<watch::Sender<T>>,
    upstream: Box<Upstream<T>>,
    grace_period: Duration,
    lifecycle: Mutex<Lifecycle>,
    starts: AtomicUsize,
}

pub struct WhileSubscribed<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> WhileSubscribed<T> {
    /// `upstream` is called each time the upstream (re)starts and must return a fresh stream.
    pub fn new<F>(initial: T, grace_period: Duration, upstream: F) -> WhileSubscribed<T>
    where
        F: Fn() -> BoxStream<'static, T> + Send + Sync + 'static,
    {
        let (value, _) = watch::channel(initial);
        WhileSubscribed {
            shared: Arc::new(Shared {
                value: Arc::new(value),
                upstream: Box::new(upstream),
                grace_period,
                lifecycle: Mutex::new(Lifecycle {
                    phase: Phase::Detached,
                    generation: 0,
                }),
                starts: AtomicUsize::new(0),
            }),
        }
    }

    /// Must be called from within a Tokio runtime, as the upstream may be spawned.
    pub fn subscribe(&self) -> Subscription<T> {
        // subscribe before starting, so the first upstream item counts as a change
        let receiver = self.shared.value.subscribe();

        let mut lifecycle = self.shared.lock();
        let next = match mem::replace(&mut lifecycle.phase, Phase::Detached) {
            Phase::Detached => Phase::Attached {
                observers: 1,
                collector: self.shared.start(),
            },
            Phase::Attached {
                observers,
                collector,
            } => Phase::Attached {
                observers: observers + 1,
                collector,
            },
            Phase::Draining { collector, .. } => {
                debug!("Observer returned within grace period");
                Phase::Attached {
                    observers: 1,
                    collector,
                }
            }
        };
        lifecycle.phase = next;
        drop(lifecycle);

        Subscription {
            receiver,
            shared: self.shared.clone(),
        }
    }

    pub fn status(&self) -> SharingStatus {
        match self.shared.lock().phase {
            Phase::Detached => SharingStatus::Detached,
            Phase::Attached { .. } => SharingStatus::Attached,
            Phase::Draining { .. } => SharingStatus::Draining,
        }
    }

    /// Number of times the upstream has been started.
    pub fn starts(&self) -> usize {
        self.shared.starts.load(Ordering::Relaxed)
    }

    pub fn value(&self) -> T {
        T::clone(&self.shared.value.borrow())
    }
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + 'static> Shared<T> {
    fn start(&self) -> JoinHandle<()> {
        self.starts.fetch_add(1, Ordering::Relaxed);
        debug!("Starting upstream");

        let mut upstream = (self.upstream)();
        let value = self.value.clone();
        tokio::spawn(async move {
            while let Some(next) = upstream.next().await {
                value.send_replace(next);
            }
        })
    }

    fn release(self: &Arc<Self>) {
        let mut lifecycle = self.lock();
        let collector = match mem::replace(&mut lifecycle.phase, Phase::Detached) {
            Phase::Attached {
                observers,
                collector,
            } if observers > 1 => {
                lifecycle.phase = Phase::Attached {
                    observers: observers - 1,
                    collector,
                };
                return;
            }
            Phase::Attached { collector, .. } => collector,
            other => {
                lifecycle.phase = other;
                return;
            }
        };

        let handle = match Handle::try_current() {
            Ok(handle) if !self.grace_period.is_zero() => handle,
            _ => {
                debug!("Last observer left, stopping upstream");
                collector.abort();
                return;
            }
        };

        lifecycle.generation = lifecycle.generation.wrapping_add(1);
        let generation = lifecycle.generation;
        lifecycle.phase = Phase::Draining {
            collector,
            generation,
        };
        drop(lifecycle);
        debug!(grace_period = ?self.grace_period, "Last observer left, draining");

        let shared: Weak<Self> = Arc::downgrade(self);
        let grace_period = self.grace_period;
        handle.spawn(async move {
            tokio::time::sleep(grace_period).await;
            if let Some(shared) = shared.upgrade() {
                shared.expire(generation);
            }
        });
    }

    fn expire(&self, generation: u64) {
        let mut lifecycle = self.lock();
        match mem::replace(&mut lifecycle.phase, Phase::Detached) {
            Phase::Draining {
                collector,
                generation: draining,
            } if draining == generation => {
                debug!("Grace period over, stopping upstream");
                collector.abort();
            }
            other => lifecycle.phase = other,
        }
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        match mem::replace(&mut lifecycle.phase, Phase::Detached) {
            Phase::Attached { collector, .. } | Phase::Draining { collector, .. } => {
                collector.abort()
            }
            Phase::Detached => {}
        }
    }
}

/// A live view of the shared value. Dropping it releases the upstream.
pub struct Subscription<T: Send + Sync + 'static> {
    receiver: watch::Receiver<T>,
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub fn get(&self) -> T {
        T::clone(&self.receiver.borrow())
    }

    pub fn borrow(&self) -> watch::Ref<'_, T> {
        self.receiver.borrow()
    }

    /// Waits until a value newer than the last one seen through this subscription is published.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.receiver.changed().await
    }

    /// Waits until the current value satisfies `f` and returns it.
    pub async fn wait_for(
        &mut self,
        mut f: impl FnMut(&T) -> bool,
    ) -> Result<T, watch::error::RecvError> {
        loop {
            {
                let current = self.receiver.borrow_and_update();
                if f(&current) {
                    return Ok(T::clone(&current));
                }
            }
            self.receiver.changed().await?;
        }
    }
}

impl<T: Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.shared.release();
    }
}
