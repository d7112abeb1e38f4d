//! Typed action bus for broadcasting dispatched actions.
//!
//! # Guarantees
//!
//! - **Dispatch order**: receivers observe actions in the order the store
//!   reduced them
//! - **At-most-once delivery**: slow receivers may miss actions
//! - **In-memory only**: actions are not persisted
//! - **No replay**: lagged receivers get `RecvError::Lagged`

use tokio::sync::broadcast;

use crate::core::{Action, ActionEnvelope, CorrelationId};

/// Default channel capacity for the action bus.
const DEFAULT_CAPACITY: usize = 10000;

/// Broadcast channel carrying [`ActionEnvelope`]s to effect runners and
/// observers.
///
/// The store is the only producer in normal operation; dispatching directly
/// on the bus skips the reducers.
pub struct ActionBus<A> {
    sender: broadcast::Sender<ActionEnvelope<A>>,
}

impl<A: Action> ActionBus<A> {
    /// Create a new action bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new action bus with the specified capacity.
    ///
    /// The capacity determines how many actions can be buffered before
    /// slow receivers start lagging.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an action with a fresh random correlation ID.
    ///
    /// Returns the number of receivers that received the action.
    pub fn emit(&self, action: A) -> usize {
        self.emit_envelope(ActionEnvelope::new_random(action))
    }

    /// Emit an action with a specific correlation ID.
    pub fn emit_with_correlation(&self, action: A, cid: CorrelationId) -> usize {
        self.emit_envelope(ActionEnvelope::new(cid, action))
    }

    /// Emit an envelope directly.
    pub fn emit_envelope(&self, envelope: ActionEnvelope<A>) -> usize {
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to actions on this bus.
    ///
    /// Actions emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ActionEnvelope<A>> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<A> Clone for ActionBus<A> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<A: Action> Default for ActionBus<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> std::fmt::Debug for ActionBus<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Add(i32),
        Clear,
    }

    impl Action for TestAction {
        fn kind(&self) -> &'static str {
            match self {
                TestAction::Add(_) => "test/add",
                TestAction::Clear => "test/clear",
            }
        }
    }

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = ActionBus::new();
        let mut receiver = bus.subscribe();

        bus.emit(TestAction::Add(42));

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.action, TestAction::Add(42));
        assert_eq!(envelope.kind(), "test/add");
    }

    #[tokio::test]
    async fn test_emit_with_correlation() {
        let bus = ActionBus::new();
        let mut receiver = bus.subscribe();

        let cid = CorrelationId::new();
        bus.emit_with_correlation(TestAction::Clear, cid);

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.cid, cid);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_share_correlation() {
        let bus = ActionBus::new();
        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        bus.emit(TestAction::Add(100));

        let envelope1 = receiver1.recv().await.unwrap();
        let envelope2 = receiver2.recv().await.unwrap();
        assert_eq!(envelope1.action, envelope2.action);
        assert_eq!(envelope1.cid, envelope2.cid);
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let bus = ActionBus::new();
        let mut receiver = bus.subscribe();

        bus.emit(TestAction::Add(1));
        bus.emit(TestAction::Clear);
        bus.emit(TestAction::Add(2));

        assert_eq!(receiver.recv().await.unwrap().action, TestAction::Add(1));
        assert_eq!(receiver.recv().await.unwrap().action, TestAction::Clear);
        assert_eq!(receiver.recv().await.unwrap().action, TestAction::Add(2));
    }

    #[tokio::test]
    async fn test_emit_returns_receiver_count() {
        let bus = ActionBus::new();
        assert_eq!(bus.emit(TestAction::Clear), 0);

        let _receiver1 = bus.subscribe();
        assert_eq!(bus.emit(TestAction::Clear), 1);

        let _receiver2 = bus.subscribe();
        assert_eq!(bus.emit(TestAction::Clear), 2);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_actions() {
        let bus = ActionBus::new();
        bus.emit(TestAction::Add(1));

        let mut receiver = bus.subscribe();
        bus.emit(TestAction::Add(2));

        assert_eq!(receiver.recv().await.unwrap().action, TestAction::Add(2));
    }

    #[tokio::test]
    async fn test_clone_shares_channel() {
        let bus1: ActionBus<TestAction> = ActionBus::with_capacity(8);
        let bus2 = bus1.clone();
        let mut receiver = bus1.subscribe();

        bus2.emit(TestAction::Add(55));

        assert_eq!(receiver.recv().await.unwrap().action, TestAction::Add(55));
    }

    #[test]
    fn test_debug_impl() {
        let bus: ActionBus<TestAction> = ActionBus::new();
        let _r1 = bus.subscribe();
        let debug_str = format!("{:?}", bus);
        assert!(debug_str.contains("ActionBus"));
        assert!(debug_str.contains("subscriber_count"));
    }
}
