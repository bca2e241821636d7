//! The continuous-sync loop: push the current snapshot every interval
//! until stopped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use partylink_rpc::RpcError;
use partylink_status::PartyStatus;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, trace};

use crate::client::ClientHandle;
use crate::session::lock_status;

/// Spawns the update loop.
///
/// Each tick takes a fresh snapshot of the shared status and pushes it —
/// always the full mapping, fire-and-forget. Push failures are logged and
/// the loop keeps its cadence; only a vanished client task ends it.
/// Aborting the returned handle is the expected way to stop it, and is
/// absorbed silently whether the loop is mid-push or mid-sleep.
pub(crate) fn spawn_updater(
    handle: ClientHandle,
    status: Arc<Mutex<PartyStatus>>,
    interval: Duration,
    jitter: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Desynchronize many clients started at the same instant. Guard
        // on whole microseconds: a sub-microsecond jitter truncates to
        // zero and an empty range would panic the task.
        let jitter_us = jitter.as_micros() as u64;
        if jitter_us > 0 {
            let delay = rand::rng().random_range(0..jitter_us);
            time::sleep(Duration::from_micros(delay)).await;
        }

        debug!(interval_ms = interval.as_millis() as u64, "update loop started");

        loop {
            let snapshot = lock_status(&status).snapshot();
            match handle.set_activity(snapshot).await {
                Ok(()) => trace!("pushed status snapshot"),
                Err(RpcError::Unavailable) => {
                    debug!("client task gone; update loop stopping");
                    break;
                }
                Err(error) => {
                    debug!(%error, "status push failed; retrying next tick");
                }
            }
            time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use partylink_rpc::{MockClient, MockController, RpcClient};

    use crate::client::spawn_client;

    async fn live_handle() -> (ClientHandle, MockController) {
        let (mut client, controller) = MockClient::new();
        client.connect().await.unwrap();
        (spawn_client(client, 8), controller)
    }

    fn shared_status() -> Arc<Mutex<PartyStatus>> {
        Arc::new(Mutex::new(PartyStatus::with_pid(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_updater_stops_when_client_task_is_gone() {
        let (handle, controller) = live_handle().await;
        handle.close().await;
        tokio::task::yield_now().await;
        assert!(controller.is_closed());

        let task = spawn_updater(
            handle,
            shared_status(),
            Duration::from_millis(100),
            Duration::ZERO,
        );

        // First push hits a vanished client task; the loop ends itself.
        time::sleep(Duration::from_millis(50)).await;
        assert!(task.is_finished());
        assert_eq!(controller.activity_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submicrosecond_jitter_does_not_kill_the_loop() {
        let (handle, controller) = live_handle().await;

        // Truncates to zero whole microseconds; must behave like no
        // jitter, not panic the task on an empty range.
        let task = spawn_updater(
            handle,
            shared_status(),
            Duration::from_millis(100),
            Duration::from_nanos(500),
        );

        time::sleep(Duration::from_millis(250)).await;
        assert!(!task.is_finished());
        assert!(controller.activity_count() >= 2);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_delays_first_push_within_bound() {
        let (handle, controller) = live_handle().await;

        // Jitter is drawn below one second; with a ten-second interval
        // exactly one push lands in the first second.
        let task = spawn_updater(
            handle,
            shared_status(),
            Duration::from_secs(10),
            Duration::from_secs(1),
        );

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.activity_count(), 1);
        task.abort();
    }
}
