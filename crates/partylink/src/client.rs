//! Client task: an isolated Tokio task that owns the concrete
//! [`RpcClient`], processing commands through an mpsc channel.
//!
//! Moving the client into its own task does two things for the session:
//! every pipe call is serialized (the trait takes `&mut self`), and the
//! cheap-to-clone [`ClientHandle`] makes cleanup possible from places
//! that can't `.await` — a `Drop` guard can `try_send` an unregister
//! command when a wait is cancelled.

use partylink_rpc::{EventKind, EventSink, RpcClient, RpcError};
use partylink_status::StatusSnapshot;
use tokio::sync::{mpsc, oneshot};

/// Commands sent to the client task through its channel.
pub(crate) enum ClientCommand {
    /// Push the full status snapshot to the peer.
    SetActivity {
        snapshot: StatusSnapshot,
        reply: oneshot::Sender<Result<(), RpcError>>,
    },

    /// Subscribe to an event kind.
    Subscribe {
        kind: EventKind,
        reply: oneshot::Sender<Result<(), RpcError>>,
    },

    /// Register a single-use sink for the next delivery of `kind`.
    RegisterEvent {
        kind: EventKind,
        sink: EventSink,
        reply: oneshot::Sender<Result<(), RpcError>>,
    },

    /// Drop the registration for `kind`. The reply is optional because
    /// cancellation cleanup fires this without anyone left to listen.
    UnregisterEvent {
        kind: EventKind,
        reply: Option<oneshot::Sender<Result<(), RpcError>>>,
    },

    /// Close the pipe and stop the task.
    Close,
}

/// Handle to the running client task.
///
/// Cheap to clone — just an `mpsc::Sender` wrapper. The update loop and
/// wait cleanup each hold their own clone.
#[derive(Clone)]
pub(crate) struct ClientHandle {
    sender: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    pub(crate) async fn set_activity(
        &self,
        snapshot: StatusSnapshot,
    ) -> Result<(), RpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ClientCommand::SetActivity {
                snapshot,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RpcError::Unavailable)?;
        reply_rx.await.map_err(|_| RpcError::Unavailable)?
    }

    pub(crate) async fn subscribe(
        &self,
        kind: EventKind,
    ) -> Result<(), RpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ClientCommand::Subscribe {
                kind,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RpcError::Unavailable)?;
        reply_rx.await.map_err(|_| RpcError::Unavailable)?
    }

    pub(crate) async fn register_event(
        &self,
        kind: EventKind,
        sink: EventSink,
    ) -> Result<(), RpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ClientCommand::RegisterEvent {
                kind,
                sink,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RpcError::Unavailable)?;
        reply_rx.await.map_err(|_| RpcError::Unavailable)?
    }

    pub(crate) async fn unregister_event(
        &self,
        kind: EventKind,
    ) -> Result<(), RpcError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ClientCommand::UnregisterEvent {
                kind,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| RpcError::Unavailable)?;
        reply_rx.await.map_err(|_| RpcError::Unavailable)?
    }

    /// Best-effort unregister for `Drop` paths. No waiting, no result.
    pub(crate) fn unregister_nowait(&self, kind: EventKind) {
        let _ = self
            .sender
            .try_send(ClientCommand::UnregisterEvent { kind, reply: None });
    }

    pub(crate) async fn close(&self) {
        let _ = self.sender.send(ClientCommand::Close).await;
    }

    /// Best-effort close for `Drop` paths.
    pub(crate) fn close_nowait(&self) {
        let _ = self.sender.try_send(ClientCommand::Close);
    }
}

/// Spawns the client task and returns a handle to it.
///
/// The task runs until it receives `Close` or every handle is dropped.
pub(crate) fn spawn_client<C: RpcClient>(
    client: C,
    channel_size: usize,
) -> ClientHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    tokio::spawn(run_client(client, rx));
    ClientHandle { sender: tx }
}

async fn run_client<C: RpcClient>(
    mut client: C,
    mut receiver: mpsc::Receiver<ClientCommand>,
) {
    tracing::debug!("client task started");

    while let Some(cmd) = receiver.recv().await {
        match cmd {
            ClientCommand::SetActivity { snapshot, reply } => {
                let _ = reply.send(client.set_activity(&snapshot).await);
            }
            ClientCommand::Subscribe { kind, reply } => {
                let _ = reply.send(client.subscribe(kind).await);
            }
            ClientCommand::RegisterEvent { kind, sink, reply } => {
                let _ = reply.send(client.register_event(kind, sink).await);
            }
            ClientCommand::UnregisterEvent { kind, reply } => {
                let result = client.unregister_event(kind).await;
                if let Err(error) = &result {
                    tracing::debug!(%kind, %error, "unregister failed");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            ClientCommand::Close => {
                if let Err(error) = client.close().await {
                    tracing::debug!(%error, "close failed");
                }
                break;
            }
        }
    }

    tracing::debug!("client task stopped");
}
