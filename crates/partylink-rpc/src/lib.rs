//! Protocol-client contract for Partylink.
//!
//! The pipe transport, discovery handshake, and wire serialization belong
//! to the remote-procedure client — an external collaborator. This crate
//! defines only the capability contract the session layer consumes:
//!
//! - **Client** ([`RpcClient`]) — connect, push an activity snapshot,
//!   subscribe to and (un)register one-shot event handlers, close.
//! - **Events** ([`EventKind`], [`EventPayload`], [`EventSink`]) — the two
//!   party event kinds and the payload shape they deliver.
//! - **Errors** ([`RpcError`]) — pipe discovery failure, closed clients,
//!   and protocol violations.
//!
//! A client either satisfies the whole trait or isn't usable; capabilities
//! are never bolted on at runtime.
//!
//! # Feature flags
//!
//! - `mock` — an in-memory scripted client ([`MockClient`]) for tests and
//!   demos.

mod error;
mod event;
#[cfg(feature = "mock")]
mod mock;

use std::future::Future;

pub use error::RpcError;
pub use event::{EventKind, EventPayload};
#[cfg(feature = "mock")]
pub use mock::{MockClient, MockController};

use partylink_status::StatusSnapshot;

/// Single-use delivery slot for one registered event.
///
/// A oneshot sender is the resolve-exactly-once handler: the protocol
/// guarantees at most one delivery per registration, and the channel type
/// guarantees at most one resolution on this side.
pub type EventSink = tokio::sync::oneshot::Sender<EventPayload>;

/// The remote-procedure client the session layer drives.
///
/// Implementations own the pipe connection to the local desktop
/// application. All methods may suspend; none are expected to be
/// re-entered concurrently (the session serializes calls through a
/// dedicated task). That task lives on a multithreaded runtime, so the
/// methods are spelled as `impl Future + Send` rather than plain
/// `async fn` — implementations can still write `async fn` bodies as
/// long as their futures are `Send`.
pub trait RpcClient: Send + 'static {
    /// Establishes the pipe connection.
    ///
    /// Fails with [`RpcError::PipeUnavailable`] when no compatible peer
    /// process is found — the one failure the session may absorb by
    /// policy instead of surfacing.
    fn connect(&mut self) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Pushes the full status snapshot to the peer. Always the whole
    /// mapping, never a diff.
    fn set_activity(
        &mut self,
        snapshot: &StatusSnapshot,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Subscribes to an event kind so the peer starts delivering it.
    fn subscribe(
        &mut self,
        kind: EventKind,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Registers a single-use sink for the next delivery of `kind`.
    ///
    /// Registering again for the same kind replaces the previous sink.
    fn register_event(
        &mut self,
        kind: EventKind,
        sink: EventSink,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Drops the registration for `kind`. A no-op if none exists.
    fn unregister_event(
        &mut self,
        kind: EventKind,
    ) -> impl Future<Output = Result<(), RpcError>> + Send;

    /// Closes the pipe connection.
    fn close(&mut self) -> impl Future<Output = Result<(), RpcError>> + Send;
}
