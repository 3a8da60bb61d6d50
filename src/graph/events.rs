//! Synchronous event dispatch for structural graph changes.

use crate::types::{EventFilter, GraphEvent, UniqueIndex};
use super::state::GraphState;

/// Callback invoked for every event passing its subscription filter.
///
/// Handlers see the graph read-only. The state they observe is the state
/// right after the change the event describes.
pub type EventHandler = Box<dyn FnMut(&GraphEvent, &GraphState) + Send>;

/// Token returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionToken(u64);

struct Subscription {
    token: SubscriptionToken,
    filter: EventFilter,
    handler: EventHandler,
}

/// Subscriber registry owned by a graph.
///
/// Subscribers run in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_token: u64,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler.
    pub fn subscribe(&mut self, filter: EventFilter, handler: EventHandler) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscriptions.push(Subscription { token, filter, handler });
        token
    }

    /// Remove a handler. Returns `false` if the token is unknown.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.token != token);
        self.subscriptions.len() != before
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub(crate) fn dispatch(&mut self, event: &GraphEvent, state: &GraphState) {
        let scope = event.scope();
        for subscription in &mut self.subscriptions {
            if subscription.filter.matches(scope) {
                (subscription.handler)(event, state);
            }
        }
    }

    /// Drop subscriptions bound to a vertex that no longer exists.
    pub(crate) fn drop_vertex_scope(&mut self, vertex: UniqueIndex) {
        self.subscriptions
            .retain(|s| s.filter != EventFilter::Vertex(vertex));
    }

    /// Drop subscriptions bound to a destroyed island.
    pub(crate) fn drop_island_scope(&mut self, island: UniqueIndex) {
        self.subscriptions
            .retain(|s| s.filter != EventFilter::Island(island));
    }

    /// Follow a vertex rename.
    pub(crate) fn rescope_vertex(&mut self, old: UniqueIndex, new: UniqueIndex) {
        for subscription in &mut self.subscriptions {
            if subscription.filter == EventFilter::Vertex(old) {
                subscription.filter = EventFilter::Vertex(new);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
