//! In-memory scripted client for tests and demos.
//!
//! [`MockClient`] satisfies [`RpcClient`] without any pipe: it records
//! every call, and the paired [`MockController`] lets a test (or demo)
//! observe those records and inject events from outside — standing in for
//! the local desktop application.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use partylink_status::StatusSnapshot;

use crate::{EventKind, EventPayload, EventSink, RpcClient, RpcError};

#[derive(Default)]
struct MockState {
    fail_connect: bool,
    connected: bool,
    closed: bool,
    activities: Vec<StatusSnapshot>,
    subscriptions: Vec<EventKind>,
    sinks: HashMap<EventKind, EventSink>,
    unregistered: Vec<EventKind>,
}

/// A scripted [`RpcClient`] with no real transport behind it.
pub struct MockClient {
    shared: Arc<Mutex<MockState>>,
}

/// Observer/injector handle paired with a [`MockClient`].
///
/// Cheap to clone; stays usable after the client has been moved into the
/// session.
#[derive(Clone)]
pub struct MockController {
    shared: Arc<Mutex<MockState>>,
}

fn lock(shared: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockClient {
    /// A client whose `connect` succeeds.
    pub fn new() -> (Self, MockController) {
        Self::build(false)
    }

    /// A client whose `connect` fails with [`RpcError::PipeUnavailable`],
    /// simulating "the desktop app isn't running".
    pub fn unavailable() -> (Self, MockController) {
        Self::build(true)
    }

    fn build(fail_connect: bool) -> (Self, MockController) {
        let shared = Arc::new(Mutex::new(MockState {
            fail_connect,
            ..MockState::default()
        }));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockController { shared },
        )
    }
}

impl RpcClient for MockClient {
    async fn connect(&mut self) -> Result<(), RpcError> {
        let mut state = lock(&self.shared);
        if state.fail_connect {
            return Err(RpcError::PipeUnavailable);
        }
        state.connected = true;
        Ok(())
    }

    async fn set_activity(
        &mut self,
        snapshot: &StatusSnapshot,
    ) -> Result<(), RpcError> {
        let mut state = lock(&self.shared);
        if !state.connected {
            return Err(RpcError::Closed);
        }
        state.activities.push(snapshot.clone());
        Ok(())
    }

    async fn subscribe(&mut self, kind: EventKind) -> Result<(), RpcError> {
        let mut state = lock(&self.shared);
        if !state.connected {
            return Err(RpcError::Closed);
        }
        state.subscriptions.push(kind);
        Ok(())
    }

    async fn register_event(
        &mut self,
        kind: EventKind,
        sink: EventSink,
    ) -> Result<(), RpcError> {
        let mut state = lock(&self.shared);
        if !state.connected {
            return Err(RpcError::Closed);
        }
        // Re-registration replaces the previous single-use sink.
        state.sinks.insert(kind, sink);
        Ok(())
    }

    async fn unregister_event(
        &mut self,
        kind: EventKind,
    ) -> Result<(), RpcError> {
        let mut state = lock(&self.shared);
        state.sinks.remove(&kind);
        state.unregistered.push(kind);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RpcError> {
        let mut state = lock(&self.shared);
        state.connected = false;
        state.closed = true;
        state.sinks.clear();
        Ok(())
    }
}

impl MockController {
    /// Delivers an event to the registered sink, consuming it (single
    /// use). Returns `false` if no sink was registered for `kind` or the
    /// receiver was already dropped.
    pub fn inject_event(&self, kind: EventKind, payload: EventPayload) -> bool {
        let sink = lock(&self.shared).sinks.remove(&kind);
        match sink {
            Some(sink) => sink.send(payload).is_ok(),
            None => false,
        }
    }

    /// Every snapshot the client was asked to push, in order.
    pub fn activities(&self) -> Vec<StatusSnapshot> {
        lock(&self.shared).activities.clone()
    }

    /// Number of snapshots pushed so far.
    pub fn activity_count(&self) -> usize {
        lock(&self.shared).activities.len()
    }

    /// The most recently pushed snapshot.
    pub fn last_activity(&self) -> Option<StatusSnapshot> {
        lock(&self.shared).activities.last().cloned()
    }

    /// Every subscription the client made, in order.
    pub fn subscriptions(&self) -> Vec<EventKind> {
        lock(&self.shared).subscriptions.clone()
    }

    /// Every unregistration the client performed, in order.
    pub fn unregistered(&self) -> Vec<EventKind> {
        lock(&self.shared).unregistered.clone()
    }

    /// `true` while a sink is registered for `kind`.
    pub fn has_registration(&self, kind: EventKind) -> bool {
        lock(&self.shared).sinks.contains_key(&kind)
    }

    /// `true` after a successful `connect` and before `close`.
    pub fn is_connected(&self) -> bool {
        lock(&self.shared).connected
    }

    /// `true` once `close` has been called.
    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use partylink_status::{Field, PartyStatus};

    #[tokio::test]
    async fn test_mock_records_activities_in_order() {
        let (mut client, controller) = MockClient::new();
        client.connect().await.unwrap();

        let mut status = PartyStatus::with_pid(1);
        status.set(Field::State, "one").unwrap();
        client.set_activity(&status.snapshot()).await.unwrap();
        status.set(Field::State, "two").unwrap();
        client.set_activity(&status.snapshot()).await.unwrap();

        assert_eq!(controller.activity_count(), 2);
        let last = controller.last_activity().unwrap();
        assert_eq!(
            last.get("state"),
            Some(&partylink_status::FieldValue::Text("two".into()))
        );
    }

    #[tokio::test]
    async fn test_unavailable_mock_fails_connect() {
        let (mut client, controller) = MockClient::unavailable();
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, RpcError::PipeUnavailable));
        assert!(!controller.is_connected());
    }

    #[tokio::test]
    async fn test_calls_before_connect_are_rejected() {
        let (mut client, _controller) = MockClient::new();
        let status = PartyStatus::with_pid(1);
        let err = client.set_activity(&status.snapshot()).await.unwrap_err();
        assert!(matches!(err, RpcError::Closed));
    }

    #[tokio::test]
    async fn test_inject_event_resolves_registered_sink_once() {
        let (mut client, controller) = MockClient::new();
        client.connect().await.unwrap();

        let (tx, rx) = tokio::sync::oneshot::channel();
        client
            .register_event(EventKind::ActivityJoin, tx)
            .await
            .unwrap();
        assert!(controller.has_registration(EventKind::ActivityJoin));

        assert!(controller
            .inject_event(EventKind::ActivityJoin, EventPayload::with_secret("s")));
        let payload = rx.await.unwrap();
        assert_eq!(payload.secret().unwrap(), "s");

        // Sink consumed — a second delivery has nowhere to go.
        assert!(!controller
            .inject_event(EventKind::ActivityJoin, EventPayload::with_secret("t")));
    }

    #[tokio::test]
    async fn test_unregister_drops_sink_and_is_recorded() {
        let (mut client, controller) = MockClient::new();
        client.connect().await.unwrap();

        let (tx, _rx) = tokio::sync::oneshot::channel();
        client
            .register_event(EventKind::ActivityJoin, tx)
            .await
            .unwrap();
        client
            .unregister_event(EventKind::ActivityJoin)
            .await
            .unwrap();

        assert!(!controller.has_registration(EventKind::ActivityJoin));
        assert_eq!(controller.unregistered(), vec![EventKind::ActivityJoin]);
        assert!(!controller
            .inject_event(EventKind::ActivityJoin, EventPayload::empty()));
    }

    #[tokio::test]
    async fn test_close_marks_client_closed() {
        let (mut client, controller) = MockClient::new();
        client.connect().await.unwrap();
        client.close().await.unwrap();
        assert!(controller.is_closed());
        assert!(!controller.is_connected());
    }
}
