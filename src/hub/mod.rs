//! Broadcast hub for the operator and public channels
//!
//! Two independent subscriber groups fan out state-change events. Frames
//! are shared behind an `Arc`, so a broadcast clones a pointer per
//! subscriber, not the payload. Delivery is best-effort at-most-once: a
//! handle whose channel is gone is pruned during the broadcast and never
//! retried, without disturbing delivery to the remaining handles.
//!
//! A new subscriber is caught up before it joins the group: the live
//! snapshot (operator scope only), then the public snapshot when it has
//! anything to show, then the background reference when set, in that
//! order, ahead of any subsequent broadcast.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Event, Scope};
use crate::state::CompetitionState;

struct Handle {
    id: Uuid,
    sender: mpsc::UnboundedSender<Arc<Event>>,
}

/// A live subscription to one channel
///
/// Dropping the subscription (or just its receiver) disconnects; the hub
/// prunes the dead handle on the next broadcast to that group.
pub struct Subscription {
    pub id: Uuid,
    pub scope: Scope,
    pub receiver: mpsc::UnboundedReceiver<Arc<Event>>,
}

/// Fan-out hub over the operator and public subscriber groups
pub struct BroadcastHub {
    state: Arc<CompetitionState>,
    operator: Mutex<Vec<Handle>>,
    public: Mutex<Vec<Handle>>,
}

impl BroadcastHub {
    pub fn new(state: Arc<CompetitionState>) -> Self {
        Self {
            state,
            operator: Mutex::new(Vec::new()),
            public: Mutex::new(Vec::new()),
        }
    }

    fn group(&self, scope: Scope) -> &Mutex<Vec<Handle>> {
        match scope {
            Scope::Operator => &self.operator,
            Scope::Public => &self.public,
        }
    }

    /// Register a subscriber and deliver its catch-up snapshots
    pub fn subscribe(&self, scope: Scope) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        // Catch-up goes into the channel before the handle joins the
        // group, so it always precedes broadcast traffic.
        if scope == Scope::Operator {
            let _ = sender.send(Arc::new(Event::LiveUpdate {
                data: self.state.live(),
            }));
        }
        let public = self.state.public();
        if !public.is_empty() {
            let _ = sender.send(Arc::new(Event::PublicUpdate { data: public }));
        }
        if let Some(url) = self.state.background() {
            let _ = sender.send(Arc::new(Event::BackgroundUpdate { url }));
        }

        self.group(scope)
            .lock()
            .expect("subscriber group lock poisoned")
            .push(Handle { id, sender });

        info!(%id, %scope, "Subscriber joined");
        Subscription {
            id,
            scope,
            receiver,
        }
    }

    /// Remove a subscriber; safe to call for an already-removed handle
    pub fn unsubscribe(&self, scope: Scope, id: Uuid) {
        let mut group = self
            .group(scope)
            .lock()
            .expect("subscriber group lock poisoned");
        let before = group.len();
        group.retain(|handle| handle.id != id);
        if group.len() < before {
            info!(%id, %scope, "Subscriber left");
        }
    }

    /// Deliver an event to every handle in the group, pruning dead ones
    pub fn broadcast(&self, scope: Scope, event: Event) {
        let frame = Arc::new(event);
        let mut group = self
            .group(scope)
            .lock()
            .expect("subscriber group lock poisoned");
        group.retain(|handle| match handle.sender.send(Arc::clone(&frame)) {
            Ok(()) => true,
            Err(_) => {
                debug!(id = %handle.id, %scope, "Pruning disconnected subscriber");
                false
            }
        });
    }

    /// Deliver an event to both groups
    pub fn broadcast_both(&self, event: Event) {
        self.broadcast(Scope::Operator, event.clone());
        self.broadcast(Scope::Public, event);
    }

    /// Current number of subscribers in a group
    pub fn subscriber_count(&self, scope: Scope) -> usize {
        self.group(scope)
            .lock()
            .expect("subscriber group lock poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Competitor, ResultSet};

    fn hub_with_state() -> (Arc<CompetitionState>, BroadcastHub) {
        let state = Arc::new(CompetitionState::new());
        let hub = BroadcastHub::new(Arc::clone(&state));
        (state, hub)
    }

    fn one_competitor() -> Vec<Competitor> {
        vec![Competitor {
            rank: 1,
            name: "A".into(),
            ..Default::default()
        }]
    }

    #[tokio::test]
    async fn test_operator_catchup_order() {
        let (state, hub) = hub_with_state();
        state.load(ResultSet::new(None, None, one_competitor()));
        state.publish(None);
        state.set_background("/backgrounds/rink.png");

        let mut sub = hub.subscribe(Scope::Operator);
        let kinds: Vec<&str> = [
            sub.receiver.try_recv().unwrap(),
            sub.receiver.try_recv().unwrap(),
            sub.receiver.try_recv().unwrap(),
        ]
        .iter()
        .map(|e| e.kind())
        .collect();

        assert_eq!(kinds, vec!["live_update", "public_update", "background_update"]);
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_operator_gets_live_even_when_empty() {
        let (_state, hub) = hub_with_state();
        let mut sub = hub.subscribe(Scope::Operator);

        let event = sub.receiver.try_recv().unwrap();
        assert_eq!(event.kind(), "live_update");
        // Nothing else: public view is empty and no background is set
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_public_catchup_skips_live() {
        let (state, hub) = hub_with_state();
        state.load(ResultSet::new(None, None, one_competitor()));
        state.publish(None);

        let mut sub = hub.subscribe(Scope::Public);
        let event = sub.receiver.try_recv().unwrap();
        assert_eq!(event.kind(), "public_update");
        assert!(sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_message_only_public_view_is_caught_up() {
        let (state, hub) = hub_with_state();
        state.display_message("Doors open 18:00");

        let mut sub = hub.subscribe(Scope::Public);
        let event = sub.receiver.try_recv().unwrap();
        match event.as_ref() {
            Event::PublicUpdate { data } => assert_eq!(data.message, "Doors open 18:00"),
            other => panic!("expected public_update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_broadcast_order_within_scope() {
        let (_state, hub) = hub_with_state();
        let mut sub = hub.subscribe(Scope::Public);

        hub.broadcast(Scope::Public, Event::BackgroundUpdate { url: "a".into() });
        hub.broadcast(Scope::Public, Event::BackgroundUpdate { url: "b".into() });

        let urls: Vec<String> = [
            sub.receiver.try_recv().unwrap(),
            sub.receiver.try_recv().unwrap(),
        ]
        .iter()
        .map(|e| match e.as_ref() {
            Event::BackgroundUpdate { url } => url.clone(),
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
        assert_eq!(urls, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_dead_subscriber_pruned_without_aborting() {
        let (_state, hub) = hub_with_state();
        let dead = hub.subscribe(Scope::Operator);
        let mut alive = hub.subscribe(Scope::Operator);
        drop(dead.receiver);
        // Drain the catch-up event so only broadcast traffic remains
        let _ = alive.receiver.try_recv();

        hub.broadcast(Scope::Operator, Event::BackgroundUpdate { url: "x".into() });

        assert_eq!(hub.subscriber_count(Scope::Operator), 1);
        assert_eq!(alive.receiver.try_recv().unwrap().kind(), "background_update");
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let (_state, hub) = hub_with_state();
        let sub = hub.subscribe(Scope::Public);
        assert_eq!(hub.subscriber_count(Scope::Public), 1);

        hub.unsubscribe(Scope::Public, sub.id);
        hub.unsubscribe(Scope::Public, sub.id);
        assert_eq!(hub.subscriber_count(Scope::Public), 0);
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let (_state, hub) = hub_with_state();
        let mut operator = hub.subscribe(Scope::Operator);
        let mut public = hub.subscribe(Scope::Public);
        let _ = operator.receiver.try_recv(); // drain catch-up

        hub.broadcast(Scope::Operator, Event::BackgroundUpdate { url: "op".into() });

        assert_eq!(operator.receiver.try_recv().unwrap().kind(), "background_update");
        assert!(public.receiver.try_recv().is_err());
    }
}
