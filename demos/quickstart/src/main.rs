//! End-to-end tour of the party session against the scripted mock peer:
//! advertise a lobby, keep it fresh with the update loop, then block until
//! a (simulated) friend asks to join.
//!
//! Run with `RUST_LOG=debug cargo run -p quickstart` for the full trace.

use std::time::Duration;

use partylink::{Party, PartyConfig};
use partylink_rpc::{EventKind, EventPayload, MockClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (client, controller) = MockClient::new();
    let mut party = Party::connect(PartyConfig::default(), client).await?;
    info!(status = ?party.connection_status(), "session up");

    // Describe the lobby. Nothing is transmitted until an update runs.
    party.set_state("Looking for Players");
    party.set_details("Ranked Doubles");
    party.set_party_id("lobby-1337")?;
    party.set_join_secret("join-1337-xyz");
    party.set_size(1);
    party.set_max(4);

    // Keep the advertised status fresh while we wait.
    party.start_update_loop(Duration::from_secs(2));

    // Pretend a friend clicks "Ask to Join" five seconds from now.
    let friend = controller.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        friend.inject_event(
            EventKind::ActivityJoin,
            EventPayload::with_secret("join-1337-xyz"),
        );
    });

    info!("waiting for someone to join");
    let secret = party
        .wait_for_join_with(
            || {
                info!("still waiting...");
                std::future::ready(Ok(()))
            },
            Duration::from_secs(1),
        )
        .await?;
    info!(%secret, "join request received");

    party.set_size(2);
    party.update().await?;
    info!(pushes = controller.activity_count(), "final status transmitted");

    party.close().await;
    Ok(())
}
