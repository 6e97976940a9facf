//! Browser entry: connect the injected wallet and follow its events.

use eyre::{eyre, Result};

use nexus_deployer_adapters::{BrowserSurface, DeployerConfig, Eip1193Adapter, SystemClockAdapter};
use nexus_deployer_core::{acquire_provider, ClockPort, WalletError, WalletSession};

const EVENT_POLL_MS: u64 = 500;

pub async fn run() -> Result<()> {
    let config = DeployerConfig::default();
    let acquired = acquire_provider(&BrowserSurface, &SystemClockAdapter, config.acquire_policy())
        .await
        .ok_or_else(|| eyre!(WalletError::ProviderMissing))?;
    tracing::info!(brand = %acquired.brand, "wallet provider found");

    let mut session = WalletSession::new(acquired.provider, config.network);
    if !session.reconnect_silently().await? {
        session.connect().await?;
    }
    log_state(&session);

    loop {
        SystemClockAdapter.sleep_ms(EVENT_POLL_MS).await;
        if session.process_events().await > 0 {
            log_state(&session);
        }
    }
}

fn log_state(session: &WalletSession<Eip1193Adapter>) {
    let state = session.state();
    tracing::info!(
        connected = state.is_connected,
        address = %state.display_address(),
        chain_id = ?state.chain_id,
        on_target = state.network.is_some(),
        "wallet state"
    );
    if let Some(err) = session.last_error() {
        tracing::warn!("{err}");
    }
}
