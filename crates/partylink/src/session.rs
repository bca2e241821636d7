//! The party session: typed presence accessors, connection lifecycle,
//! the continuous update loop, and the wait-for-event primitive.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use partylink_rpc::{EventKind, RpcClient, RpcError};
use partylink_status::{Field, FieldValue, PartyStatus, StatusSnapshot};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, trace, warn};

use crate::client::{spawn_client, ClientHandle};
use crate::updater::spawn_updater;
use crate::{CallbackError, CallbackPolicy, FailurePolicy, PartyConfig, PartyError};

/// Default interval between periodic-callback invocations during a wait.
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_millis(500);

/// Locks the shared status, recovering the data from a poisoned lock.
/// No accessor can leave the mapping half-mutated, so recovery is safe.
pub(crate) fn lock_status(
    status: &Mutex<PartyStatus>,
) -> MutexGuard<'_, PartyStatus> {
    status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Connection state
// ---------------------------------------------------------------------------

/// Explicit connectivity of a session — never inferred from a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The pipe is up and the client task is running.
    Connected,
    /// The session was closed; every operation is a silent no-op.
    Disconnected,
    /// Connecting found no peer and the absorb policy kept the session
    /// usable as a no-op shell.
    Failed,
}

enum Connection {
    Connected(ClientHandle),
    Disconnected,
    Failed,
}

impl Connection {
    fn handle(&self) -> Option<&ClientHandle> {
        match self {
            Self::Connected(handle) => Some(handle),
            _ => None,
        }
    }

    fn status(&self) -> ConnectionStatus {
        match self {
            Self::Connected(_) => ConnectionStatus::Connected,
            Self::Disconnected => ConnectionStatus::Disconnected,
            Self::Failed => ConnectionStatus::Failed,
        }
    }
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// A party presence session.
///
/// Owns the status mapping, at most one client task, at most one update
/// loop, and — while a wait is in flight — at most one periodic-callback
/// task. Field accessors mutate the mapping locally; [`update`](Self::update)
/// and the update loop transmit it wholesale.
///
/// # Example
///
/// ```rust,ignore
/// let party = Party::connect(PartyConfig::default(), my_client).await?;
/// party.set_state("Looking for Players");
/// party.set_party_id(42i64)?;
/// party.set_join_secret("abc");
/// party.set_size(1);
/// party.set_max(4);
/// party.update().await?;
/// let secret = party.wait_for_join().await?;
/// ```
pub struct Party {
    status: Arc<Mutex<PartyStatus>>,
    conn: Connection,
    updater: Option<JoinHandle<()>>,
    config: PartyConfig,
}

impl Party {
    /// Connects to the peer and builds a session around `client`.
    ///
    /// On [`RpcError::PipeUnavailable`] the configured
    /// [`FailurePolicy`] decides: `Absorb` (default) returns a session in
    /// the [`Failed`](ConnectionStatus::Failed) state whose operations
    /// are silent no-ops; `Propagate` surfaces the error. Every other
    /// connect error always propagates.
    pub async fn connect<C: RpcClient>(
        config: PartyConfig,
        mut client: C,
    ) -> Result<Self, PartyError> {
        let conn = match client.connect().await {
            Ok(()) => {
                info!("session connected");
                Connection::Connected(spawn_client(
                    client,
                    config.command_buffer,
                ))
            }
            Err(RpcError::PipeUnavailable)
                if config.on_connect_failure == FailurePolicy::Absorb =>
            {
                warn!("peer pipe unavailable; session will no-op");
                Connection::Failed
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Self {
            status: Arc::new(Mutex::new(PartyStatus::new())),
            conn,
            updater: None,
            config,
        })
    }

    /// Current connectivity.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.conn.status()
    }

    // -----------------------------------------------------------------
    // Field accessors
    //
    // All of these mutate only the local mapping; nothing reaches the
    // peer until `update` (or the update loop) transmits a snapshot.
    // -----------------------------------------------------------------

    /// Generic setter driven by the field table.
    pub fn set(
        &self,
        field: Field,
        value: impl Into<FieldValue>,
    ) -> Result<(), PartyError> {
        lock_status(&self.status).set(field, value)?;
        Ok(())
    }

    /// Generic getter. Pair halves come back as `Int`.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        lock_status(&self.status).get(field)
    }

    /// Removes a field from subsequent snapshots. Returns `true` if it
    /// was set. Clearing `Size` or `Max` removes the whole pair.
    pub fn clear(&self, field: Field) -> bool {
        lock_status(&self.status).clear(field)
    }

    fn set_text(&self, field: Field, value: String) {
        lock_status(&self.status)
            .set(field, value)
            .expect("text value matches the field table");
    }

    fn text(&self, field: Field) -> Option<String> {
        match lock_status(&self.status).get(field) {
            Some(FieldValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    fn set_epoch(&self, field: Field, value: i64) {
        lock_status(&self.status)
            .set(field, value)
            .expect("epoch value matches the field table");
    }

    fn epoch(&self, field: Field) -> Option<i64> {
        match lock_status(&self.status).get(field) {
            Some(FieldValue::Int(value)) => Some(value),
            _ => None,
        }
    }

    fn set_pair_half(&self, field: Field, value: u32) {
        lock_status(&self.status)
            .set(field, value)
            .expect("party-size value matches the field table");
    }

    fn pair_half(&self, field: Field) -> Option<u32> {
        match lock_status(&self.status).get(field) {
            Some(FieldValue::Int(value)) => u32::try_from(value).ok(),
            _ => None,
        }
    }

    /// Identifier of the party, lobby, or group. Accepts text or integer.
    pub fn set_party_id(
        &self,
        id: impl Into<FieldValue>,
    ) -> Result<(), PartyError> {
        self.set(Field::PartyId, id)
    }

    /// The party identifier, if set.
    pub fn party_id(&self) -> Option<FieldValue> {
        self.get(Field::PartyId)
    }

    /// Unsets the party identifier.
    pub fn clear_party_id(&self) {
        self.clear(Field::PartyId);
    }

    /// Join-invite secret. Must differ from the party id — the peer
    /// rejects activities where they match.
    pub fn set_join_secret(&self, secret: impl Into<String>) {
        self.set_text(Field::JoinSecret, secret.into());
    }

    /// The join secret, if set.
    pub fn join_secret(&self) -> Option<String> {
        self.text(Field::JoinSecret)
    }

    /// Unsets the join secret.
    pub fn clear_join_secret(&self) {
        self.clear(Field::JoinSecret);
    }

    /// Spectate-invite secret.
    pub fn set_spectate_secret(&self, secret: impl Into<String>) {
        self.set_text(Field::SpectateSecret, secret.into());
    }

    /// The spectate secret, if set.
    pub fn spectate_secret(&self) -> Option<String> {
        self.text(Field::SpectateSecret)
    }

    /// Unsets the spectate secret.
    pub fn clear_spectate_secret(&self) {
        self.clear(Field::SpectateSecret);
    }

    /// The user's current status line.
    pub fn set_state(&self, state: impl Into<String>) {
        self.set_text(Field::State, state.into());
    }

    /// The status line, if set.
    pub fn state(&self) -> Option<String> {
        self.text(Field::State)
    }

    /// Unsets the status line.
    pub fn clear_state(&self) {
        self.clear(Field::State);
    }

    /// What the player is currently doing.
    pub fn set_details(&self, details: impl Into<String>) {
        self.set_text(Field::Details, details.into());
    }

    /// The details line, if set.
    pub fn details(&self) -> Option<String> {
        self.text(Field::Details)
    }

    /// Unsets the details line.
    pub fn clear_details(&self) {
        self.clear(Field::Details);
    }

    /// Epoch seconds for game start.
    pub fn set_start_time(&self, epoch_secs: i64) {
        self.set_epoch(Field::StartTime, epoch_secs);
    }

    /// The start time, if set.
    pub fn start_time(&self) -> Option<i64> {
        self.epoch(Field::StartTime)
    }

    /// Unsets the start time.
    pub fn clear_start_time(&self) {
        self.clear(Field::StartTime);
    }

    /// Epoch seconds for game end.
    pub fn set_end_time(&self, epoch_secs: i64) {
        self.set_epoch(Field::EndTime, epoch_secs);
    }

    /// The end time, if set.
    pub fn end_time(&self) -> Option<i64> {
        self.epoch(Field::EndTime)
    }

    /// Unsets the end time.
    pub fn clear_end_time(&self) {
        self.clear(Field::EndTime);
    }

    /// Asset name for the large profile artwork.
    pub fn set_large_image(&self, asset: impl Into<String>) {
        self.set_text(Field::LargeImage, asset.into());
    }

    /// The large-image asset name, if set.
    pub fn large_image(&self) -> Option<String> {
        self.text(Field::LargeImage)
    }

    /// Tooltip for the large image.
    pub fn set_large_text(&self, tooltip: impl Into<String>) {
        self.set_text(Field::LargeText, tooltip.into());
    }

    /// The large-image tooltip, if set.
    pub fn large_text(&self) -> Option<String> {
        self.text(Field::LargeText)
    }

    /// Asset name for the small profile artwork.
    pub fn set_small_image(&self, asset: impl Into<String>) {
        self.set_text(Field::SmallImage, asset.into());
    }

    /// The small-image asset name, if set.
    pub fn small_image(&self) -> Option<String> {
        self.text(Field::SmallImage)
    }

    /// Tooltip for the small image.
    pub fn set_small_text(&self, tooltip: impl Into<String>) {
        self.set_text(Field::SmallText, tooltip.into());
    }

    /// The small-image tooltip, if set.
    pub fn small_text(&self) -> Option<String> {
        self.text(Field::SmallText)
    }

    /// Current party occupancy. Setting it before `max` seeds both
    /// halves of the pair; afterwards it overwrites only its own half.
    pub fn set_size(&self, size: u32) {
        self.set_pair_half(Field::Size, size);
    }

    /// The occupancy half of the pair, if set.
    pub fn size(&self) -> Option<u32> {
        self.pair_half(Field::Size)
    }

    /// Party capacity. Same pairing rules as [`set_size`](Self::set_size).
    pub fn set_max(&self, max: u32) {
        self.set_pair_half(Field::Max, max);
    }

    /// The capacity half of the pair, if set.
    pub fn max(&self) -> Option<u32> {
        self.pair_half(Field::Max)
    }

    /// Removes the size/max pair entirely.
    pub fn clear_party_size(&self) {
        self.clear(Field::Size);
    }

    /// A point-in-time copy of the full mapping — what `update` sends.
    pub fn snapshot(&self) -> StatusSnapshot {
        lock_status(&self.status).snapshot()
    }

    // -----------------------------------------------------------------
    // Transmission
    // -----------------------------------------------------------------

    /// Transmits the full status snapshot to the peer.
    ///
    /// A silent no-op when the session is disconnected or failed.
    pub async fn update(&self) -> Result<(), PartyError> {
        let Some(handle) = self.conn.handle() else {
            trace!("update on inactive session; ignoring");
            return Ok(());
        };
        handle.set_activity(self.snapshot()).await?;
        Ok(())
    }

    /// Starts the continuous update loop: push the current snapshot every
    /// `interval` until stopped.
    ///
    /// At most one loop runs per session — starting another replaces the
    /// old one (cancel-then-replace). A no-op on an inactive session.
    pub fn start_update_loop(&mut self, interval: Duration) {
        self.stop_update_loop();
        let Some(handle) = self.conn.handle() else {
            trace!("update loop on inactive session; ignoring");
            return;
        };
        self.updater = Some(spawn_updater(
            handle.clone(),
            Arc::clone(&self.status),
            interval,
            self.config.update_jitter,
        ));
    }

    /// Stops the update loop, if one is running. Cancellation is absorbed
    /// whether the loop was mid-push or mid-sleep.
    pub fn stop_update_loop(&mut self) {
        if let Some(task) = self.updater.take() {
            task.abort();
            debug!("update loop stopped");
        }
    }

    /// `true` while an update loop is running.
    pub fn update_loop_running(&self) -> bool {
        self.updater.as_ref().is_some_and(|task| !task.is_finished())
    }

    // -----------------------------------------------------------------
    // Waiting for events
    // -----------------------------------------------------------------

    /// Blocks until someone asks to join via the peer, returning the join
    /// secret from the event. Uses [`DEFAULT_WAIT_INTERVAL`] with a no-op
    /// periodic callback.
    pub async fn wait_for_join(&mut self) -> Result<String, PartyError> {
        self.wait_for_event(EventKind::ActivityJoin, noop, DEFAULT_WAIT_INTERVAL)
            .await
    }

    /// Like [`wait_for_join`](Self::wait_for_join), but invokes
    /// `meanwhile` every `interval` while waiting (first invocation
    /// immediately). See [`wait_for_event`](Self::wait_for_event) for the
    /// full contract.
    pub async fn wait_for_join_with<F, Fut>(
        &mut self,
        meanwhile: F,
        interval: Duration,
    ) -> Result<String, PartyError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.wait_for_event(EventKind::ActivityJoin, meanwhile, interval)
            .await
    }

    /// Blocks until someone asks to spectate, returning the spectate
    /// secret.
    pub async fn wait_for_spectate(&mut self) -> Result<String, PartyError> {
        self.wait_for_event(
            EventKind::ActivitySpectate,
            noop,
            DEFAULT_WAIT_INTERVAL,
        )
        .await
    }

    /// Like [`wait_for_spectate`](Self::wait_for_spectate), with a
    /// periodic callback.
    pub async fn wait_for_spectate_with<F, Fut>(
        &mut self,
        meanwhile: F,
        interval: Duration,
    ) -> Result<String, PartyError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        self.wait_for_event(EventKind::ActivitySpectate, meanwhile, interval)
            .await
    }

    /// The wait-for-event primitive.
    ///
    /// Pushes the current status (so the advertised secret is what the
    /// peer sees), registers a single-use handler for `kind`, runs
    /// `meanwhile` every `interval` in a background task, and suspends
    /// until the event delivers. On resolution by any path — event
    /// arrival, callback failure, or cancellation of this future — the
    /// periodic task is cancelled (silently) and the handler is
    /// unregistered before control leaves this function.
    ///
    /// Callback failures follow [`CallbackPolicy`]: propagated failures
    /// cancel the wait and surface as [`PartyError::Callback`]; absorbed
    /// ones are logged and the loop keeps ticking. A panicking callback
    /// is always surfaced.
    ///
    /// No timeout is imposed — callers wanting a bounded wait wrap this
    /// in `tokio::time::timeout`. `&mut self` keeps registrations to one
    /// outstanding wait per session.
    ///
    /// # Errors
    /// - [`PartyError::NotConnected`] — the session is disconnected or
    ///   failed; a wait that could never resolve fails fast instead of
    ///   no-opping.
    /// - [`PartyError::Rpc`] — push/subscribe/registration failed, the
    ///   client went away mid-wait, or the payload lacked its secret.
    /// - [`PartyError::Callback`] — propagated callback failure.
    async fn wait_for_event<F, Fut>(
        &mut self,
        kind: EventKind,
        mut meanwhile: F,
        interval: Duration,
    ) -> Result<String, PartyError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        let Some(handle) = self.conn.handle() else {
            return Err(PartyError::NotConnected);
        };
        let handle = handle.clone();

        // The status push and the registration must both complete before
        // the wait starts, or the event could arrive unobserved.
        handle.set_activity(self.snapshot()).await?;
        handle.subscribe(kind).await?;
        let (sink, mut delivery) = oneshot::channel();
        handle.register_event(kind, sink).await?;
        debug!(%kind, interval_ms = interval.as_millis() as u64, "waiting");

        let policy = self.config.on_callback_error;
        let ticker = tokio::spawn(async move {
            loop {
                match meanwhile().await {
                    Ok(()) => {}
                    Err(error) => match policy {
                        CallbackPolicy::Absorb => {
                            warn!(%error, "periodic callback failed; continuing");
                        }
                        CallbackPolicy::Propagate => {
                            return Err(PartyError::Callback(error));
                        }
                    },
                }
                time::sleep(interval).await;
            }
        });

        // From here on, cleanup is unconditional: if this future is
        // dropped before resolution, the guard aborts the ticker and
        // fires a best-effort unregister.
        let mut cleanup = WaitCleanup {
            handle,
            kind,
            ticker,
            armed: true,
        };

        tokio::select! {
            delivered = &mut delivery => {
                let payload =
                    delivered.map_err(|_| PartyError::Rpc(RpcError::Closed))?;

                // Event won: tear down the ticker, swallowing its
                // cancellation, then drop the registration.
                cleanup.ticker.abort();
                let _ = (&mut cleanup.ticker).await;
                cleanup.armed = false;
                cleanup.handle.unregister_event(kind).await?;

                let secret = payload.secret()?.to_owned();
                debug!(%kind, "wait resolved");
                Ok(secret)
            }
            finished = &mut cleanup.ticker => {
                // The ticker only finishes by propagating a callback
                // failure (or panicking).
                let error = match finished {
                    Ok(Err(error)) => error,
                    Err(join_error) => {
                        PartyError::Callback(Box::new(join_error))
                    }
                    Ok(Ok(())) => PartyError::Callback(
                        "periodic task exited unexpectedly".into(),
                    ),
                };
                cleanup.armed = false;
                let _ = cleanup.handle.unregister_event(kind).await;
                warn!(%kind, %error, "wait aborted by periodic callback");
                Err(error)
            }
        }
    }

    // -----------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------

    /// Closes the session: stops the update loop, closes the client, and
    /// transitions to [`Disconnected`](ConnectionStatus::Disconnected).
    /// Every later operation is a silent no-op. Idempotent.
    pub async fn close(&mut self) {
        self.stop_update_loop();
        if let Some(handle) = self.conn.handle() {
            handle.close().await;
            info!("session closed");
        }
        self.conn = Connection::Disconnected;
    }
}

impl Drop for Party {
    fn drop(&mut self) {
        if let Some(task) = self.updater.take() {
            task.abort();
        }
        if let Some(handle) = self.conn.handle() {
            handle.close_nowait();
        }
    }
}

/// No-op periodic callback for the plain wait methods.
fn noop() -> std::future::Ready<Result<(), CallbackError>> {
    std::future::ready(Ok(()))
}

// ---------------------------------------------------------------------------
// Wait cleanup guard
// ---------------------------------------------------------------------------

/// Drop guard covering cancellation of the outer wait.
///
/// While armed, dropping it (the wait future was cancelled before
/// resolving) aborts the periodic task and fires a best-effort
/// unregister through the client task. Neither path can panic or block,
/// so nothing escapes the cancellation boundary.
struct WaitCleanup {
    handle: ClientHandle,
    kind: EventKind,
    ticker: JoinHandle<Result<(), PartyError>>,
    armed: bool,
}

impl Drop for WaitCleanup {
    fn drop(&mut self) {
        self.ticker.abort();
        if self.armed {
            self.handle.unregister_nowait(self.kind);
        }
    }
}
