//! Connection registry and event fan-out.
//!
//! All hub state sits behind one `std::sync::Mutex` that is never held across
//! an `.await`. Each registered connection owns the receiving half of a
//! bounded queue; the hub holds the only sending half, so removing a slot from
//! the map is the one and only way a queue gets closed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::event::Event;
use super::RealtimeError;

pub type ConnectionId = u64;

/// Tunables for the hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Outbound messages buffered per connection before it counts as
    /// unresponsive and is evicted.
    pub queue_capacity: usize,
    /// How long `shutdown` waits for connections to release their transports.
    pub shutdown_grace: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Which events a connection receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every event. For in-process subscribers only; sockets are always
    /// bound to a board.
    All,
    /// Events of one board, delivered to one of its members.
    Board { board_id: String, user_id: String },
}

impl Scope {
    pub fn board(board_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::Board {
            board_id: board_id.into(),
            user_id: user_id.into(),
        }
    }

    pub fn accepts(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Board { board_id, .. } => event.board_id.as_deref() == Some(board_id.as_str()),
        }
    }

    fn watches(&self, board: &str) -> bool {
        matches!(self, Self::Board { board_id, .. } if board_id == board)
    }
}

struct Slot {
    scope: Scope,
    queue: mpsc::Sender<Arc<str>>,
    /// Resolves once the connection has dropped its transport.
    released: oneshot::Receiver<()>,
}

struct Registry {
    running: bool,
    next_id: ConnectionId,
    connections: HashMap<ConnectionId, Slot>,
}

struct HubInner {
    config: HubConfig,
    registry: Mutex<Registry>,
}

/// Process-wide registry of live connections. Cheap to clone.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

/// The connection side of a registration: the outbound queue and the handle
/// that tells the hub the transport has been released.
pub struct Subscription {
    pub(crate) id: ConnectionId,
    pub(crate) queue: mpsc::Receiver<Arc<str>>,
    pub(crate) released: oneshot::Sender<()>,
    pub(crate) hub: Hub,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next queued message. `None` once the hub has closed this queue.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.queue.recv().await
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                config,
                registry: Mutex::new(Registry {
                    running: true,
                    next_id: 1,
                    connections: HashMap::new(),
                }),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection. Fails once the hub has been shut down.
    pub fn register(&self, scope: Scope) -> Result<Subscription, RealtimeError> {
        let (tx, rx) = mpsc::channel(self.inner.config.queue_capacity.max(1));
        let (released_tx, released_rx) = oneshot::channel();

        let mut registry = self.registry();
        if !registry.running {
            return Err(RealtimeError::HubShutDown);
        }
        let id = registry.next_id;
        registry.next_id += 1;
        debug!(connection_id = id, ?scope, "Connection registered");
        registry.connections.insert(
            id,
            Slot {
                scope,
                queue: tx,
                released: released_rx,
            },
        );
        drop(registry);

        Ok(Subscription {
            id,
            queue: rx,
            released: released_tx,
            hub: self.clone(),
        })
    }

    /// Remove a connection if present. Returns whether it was registered.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.registry().connections.remove(&id).is_some();
        if removed {
            debug!(connection_id = id, "Connection unregistered");
        }
        removed
    }

    /// Close every connection `user_id` holds on `board_id`, e.g. after the
    /// user lost access to the board. Returns how many were closed.
    pub fn revoke(&self, board_id: &str, user_id: &str) -> usize {
        let closed = self.close_where(|scope| {
            matches!(scope, Scope::Board { board_id: b, user_id: u } if b == board_id && u == user_id)
        });
        if closed > 0 {
            info!(board_id = %board_id, user_id = %user_id, closed, "Revoked board connections");
        }
        closed
    }

    /// Close every connection watching `board_id`. Returns how many were closed.
    pub fn close_board(&self, board_id: &str) -> usize {
        let closed = self.close_where(|scope| scope.watches(board_id));
        if closed > 0 {
            info!(board_id = %board_id, closed, "Closed board connections");
        }
        closed
    }

    /// Dropping a slot closes its queue; the connection then sends Close.
    fn close_where(&self, closes: impl Fn(&Scope) -> bool) -> usize {
        let mut registry = self.registry();
        let before = registry.connections.len();
        registry.connections.retain(|id, slot| {
            let close = closes(&slot.scope);
            if close {
                debug!(connection_id = *id, "Closing connection");
            }
            !close
        });
        before - registry.connections.len()
    }

    /// Deliver `event` to every matching connection without waiting.
    ///
    /// A connection whose queue is full or closed is evicted; delivery to
    /// the others continues. Returns the number of queues the event reached.
    pub fn publish(&self, event: &Event) -> usize {
        let payload: Arc<str> = match event.to_json() {
            Ok(json) => json.into(),
            Err(e) => {
                warn!(error = %e, "Failed to serialize event");
                return 0;
            }
        };

        let mut registry = self.registry();
        if !registry.running {
            return 0;
        }

        let mut delivered = 0;
        registry.connections.retain(|id, slot| {
            if !slot.scope.accepts(event) {
                return true;
            }
            match slot.queue.try_send(Arc::clone(&payload)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(connection_id = *id, "Outbound queue full, evicting connection");
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(connection_id = *id, "Outbound queue closed, evicting connection");
                    false
                }
            }
        });
        delivered
    }

    /// Stop accepting work, close every queue, and wait (up to the grace
    /// period) for the connections to release their transports.
    ///
    /// Only the first call does anything.
    pub async fn shutdown(&self) {
        let slots: Vec<Slot> = {
            let mut registry = self.registry();
            if !registry.running {
                return;
            }
            registry.running = false;
            registry.connections.drain().map(|(_, slot)| slot).collect()
        };

        info!(connections = slots.len(), "Shutting down realtime hub");
        let released: Vec<_> = slots
            .into_iter()
            .map(|slot| {
                drop(slot.queue);
                slot.released
            })
            .collect();

        let grace = self.inner.config.shutdown_grace;
        if tokio::time::timeout(grace, join_all(released)).await.is_err() {
            warn!(?grace, "Connections still open after shutdown grace period");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry().connections.len()
    }

    pub fn is_running(&self) -> bool {
        self.registry().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::event::EventKind;
    use serde_json::json;

    fn event(n: u32) -> Event {
        Event::for_board(EventKind::Updated, "b1", json!({ "n": n }))
    }

    fn wire(n: u32) -> Arc<str> {
        event(n).to_json().unwrap().into()
    }

    fn hub_with_capacity(queue_capacity: usize) -> Hub {
        Hub::new(HubConfig {
            queue_capacity,
            shutdown_grace: Duration::from_millis(200),
        })
    }

    #[tokio::test]
    async fn test_unregister_twice_is_noop() {
        let hub = Hub::default();
        let sub = hub.register(Scope::All).unwrap();
        assert_eq!(hub.connection_count(), 1);

        assert!(hub.unregister(sub.id()));
        assert!(!hub.unregister(sub.id()));
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_full_queue_evicts_only_that_connection() {
        let hub = hub_with_capacity(1);
        let mut fast: Vec<Subscription> = (0..3).map(|_| hub.register(Scope::All).unwrap()).collect();
        let mut stalled = hub.register(Scope::All).unwrap();

        assert_eq!(hub.publish(&event(1)), 4);
        for sub in fast.iter_mut() {
            assert_eq!(sub.recv().await.unwrap(), wire(1));
        }

        // The stalled connection never drained event 1.
        assert_eq!(hub.publish(&event(2)), 3);
        assert_eq!(hub.connection_count(), 3);
        for sub in fast.iter_mut() {
            assert_eq!(sub.recv().await.unwrap(), wire(2));
        }

        assert_eq!(stalled.recv().await.unwrap(), wire(1));
        assert!(stalled.recv().await.is_none());
        assert!(!hub.unregister(stalled.id()));
    }

    #[tokio::test]
    async fn test_per_connection_order() {
        let hub = hub_with_capacity(16);
        let mut sub = hub.register(Scope::All).unwrap();
        for n in 0..10 {
            hub.publish(&event(n));
        }
        for n in 0..10 {
            assert_eq!(sub.recv().await.unwrap(), wire(n));
        }
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_evicted_on_publish() {
        let hub = Hub::default();
        let sub = hub.register(Scope::All).unwrap();
        drop(sub);
        assert_eq!(hub.publish(&event(1)), 0);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_are_not_lost() {
        let hub = Hub::default();
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let hub = hub.clone();
                tokio::spawn(async move { hub.register(Scope::All).unwrap() })
            })
            .collect();

        let mut subs = Vec::new();
        for handle in handles {
            subs.push(handle.await.unwrap());
        }
        assert_eq!(hub.connection_count(), 64);

        assert_eq!(hub.publish(&event(7)), 64);
        for sub in subs.iter_mut() {
            assert!(sub.recv().await.is_some());
        }
    }

    #[tokio::test]
    async fn test_board_scope_filters_events() {
        let hub = Hub::default();
        let mut all = hub.register(Scope::All).unwrap();
        let mut b1 = hub.register(Scope::board("b1", "u1")).unwrap();
        let mut b2 = hub.register(Scope::board("b2", "u1")).unwrap();

        assert_eq!(hub.publish(&event(1)), 2);
        assert!(all.recv().await.is_some());
        assert!(b1.recv().await.is_some());

        hub.unregister(b2.id());
        assert!(b2.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_revoke_closes_only_that_members_queues() {
        let hub = Hub::default();
        let mut ada = hub.register(Scope::board("b1", "ada")).unwrap();
        let mut bob = hub.register(Scope::board("b1", "bob")).unwrap();
        let mut bob_elsewhere = hub.register(Scope::board("b2", "bob")).unwrap();

        assert_eq!(hub.revoke("b1", "bob"), 1);
        assert!(bob.recv().await.is_none());
        assert!(!hub.unregister(bob.id()));

        assert_eq!(hub.publish(&event(1)), 1);
        assert_eq!(ada.recv().await.unwrap(), wire(1));
        assert_eq!(hub.connection_count(), 2);
        assert!(hub.unregister(bob_elsewhere.id()));
        assert!(bob_elsewhere.recv().await.is_none());

        assert_eq!(hub.revoke("b1", "bob"), 0);
    }

    #[tokio::test]
    async fn test_close_board_keeps_other_boards() {
        let hub = Hub::default();
        let mut all = hub.register(Scope::All).unwrap();
        let mut a = hub.register(Scope::board("b1", "ada")).unwrap();
        let mut b = hub.register(Scope::board("b1", "bob")).unwrap();
        let _other = hub.register(Scope::board("b2", "ada")).unwrap();

        assert_eq!(hub.close_board("b1"), 2);
        assert!(a.recv().await.is_none());
        assert!(b.recv().await.is_none());
        assert_eq!(hub.connection_count(), 2);

        assert_eq!(hub.publish(&event(1)), 1);
        assert_eq!(all.recv().await.unwrap(), wire(1));
    }

    #[tokio::test]
    async fn test_two_subscribers_receive_identical_wire_text() {
        let hub = Hub::default();
        let mut a = hub.register(Scope::All).unwrap();
        let mut b = hub.register(Scope::All).unwrap();

        let update = Event::for_board(EventKind::Updated, "b1", json!({ "id": "t1" }));
        assert_eq!(hub.publish(&update), 2);

        let expected = r#"{"type":"update","data":{"id":"t1"}}"#;
        assert_eq!(&*a.recv().await.unwrap(), expected);
        assert_eq!(&*b.recv().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_shutdown_closes_queues_and_is_terminal() {
        let hub = hub_with_capacity(4);
        let mut sub = hub.register(Scope::All).unwrap();

        let waiter = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.shutdown().await })
        };

        // Queue closes; releasing the subscription lets shutdown finish.
        assert!(sub.recv().await.is_none());
        drop(sub);
        waiter.await.unwrap();

        assert!(!hub.is_running());
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.register(Scope::All).err(), Some(RealtimeError::HubShutDown));
        assert_eq!(hub.publish(&event(1)), 0);

        // Second call returns immediately.
        hub.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_grace_is_bounded() {
        let hub = hub_with_capacity(4);
        let _held = hub.register(Scope::All).unwrap();

        let started = tokio::time::Instant::now();
        hub.shutdown().await;
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(hub.connection_count(), 0);
    }
}
