//! Owner of the `WalletState` slot.

use crate::domain::{NetworkConfig, WalletEvent, WalletState};
use crate::events::Subscription;
use crate::handshake::{self, connect_error, Authorization, WalletError};
use crate::ports::Eip1193Port;
use crate::rpc;

/// Keeps `WalletState` in sync with the handshake and with out-of-band
/// wallet events. Dropping the session releases the provider listeners.
#[derive(Debug)]
pub struct WalletSession<P: Eip1193Port> {
    provider: P,
    network: NetworkConfig,
    state: WalletState,
    last_error: Option<String>,
    subscription: Option<Subscription>,
}

impl<P: Eip1193Port> WalletSession<P> {
    pub fn new(provider: P, network: NetworkConfig) -> Self {
        Self {
            provider,
            network,
            state: WalletState::default(),
            last_error: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub async fn connect(&mut self) -> Result<&WalletState, WalletError> {
        self.run_handshake(Authorization::Prompt).await?;
        Ok(&self.state)
    }

    /// Reconnects a previously authorised wallet without prompting.
    /// Returns `false` when the wallet has no authorised accounts.
    pub async fn reconnect_silently(&mut self) -> Result<bool, WalletError> {
        match self.run_handshake(Authorization::Silent).await {
            Ok(()) => Ok(true),
            Err(WalletError::NoAccounts) => {
                self.last_error = None;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn run_handshake(&mut self, authorization: Authorization) -> Result<(), WalletError> {
        self.last_error = None;
        match handshake::perform_handshake(&self.provider, &self.network, authorization).await {
            Ok(outcome) => {
                self.state = outcome.state;
                self.last_error = outcome.network_error.map(|e| e.to_string());
                self.ensure_subscribed();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("error connecting wallet: {e}");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn ensure_subscribed(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        match self.provider.subscribe() {
            Ok(sub) => self.subscription = Some(sub),
            Err(e) => tracing::warn!("failed to set up wallet event listeners: {e}"),
        }
    }

    /// Resets to the initial shape and releases the provider listeners.
    pub fn disconnect(&mut self) {
        self.reset_state();
        if let Some(sub) = self.subscription.take() {
            if let Err(e) = sub.unsubscribe() {
                tracing::warn!("failed to remove wallet event listeners: {e}");
            }
        }
    }

    fn reset_state(&mut self) {
        self.state = WalletState::default();
        self.last_error = None;
    }

    pub async fn switch_network(&mut self) -> Result<(), WalletError> {
        let result = handshake::switch_network(&self.provider, &self.network).await;
        match &result {
            Ok(()) => {
                self.last_error = None;
                let chain_id = rpc::chain_id(&self.provider).await.map_err(connect_error)?;
                self.apply_chain(chain_id).await;
            }
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    pub async fn refresh_balance(&mut self) -> Result<(), WalletError> {
        let Some(address) = self.state.address else {
            return Ok(());
        };
        let balance = rpc::balance(&self.provider, address)
            .await
            .map_err(connect_error)?;
        let mut next = self.state.clone();
        next.balance = Some(alloy::primitives::utils::format_ether(balance));
        next.balance_wei = Some(balance);
        self.state = next;
        Ok(())
    }

    /// Applies queued wallet events. Returns how many were handled.
    pub async fn process_events(&mut self) -> usize {
        let events = match self.subscription.as_ref().map(Subscription::drain) {
            Some(Ok(events)) => events,
            Some(Err(e)) => {
                tracing::warn!("failed to read wallet events: {e}");
                return 0;
            }
            None => return 0,
        };

        let count = events.len();
        for event in events {
            tracing::debug!(sequence = event.sequence, event = ?event.event, "wallet event");
            match event.event {
                WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                    None => self.reset_state(),
                    Some(first) if Some(*first) != self.state.address => {
                        if let Err(e) = self.run_handshake(Authorization::Prompt).await {
                            tracing::error!("error handling accounts change: {e}");
                        }
                    }
                    Some(_) => {}
                },
                WalletEvent::ChainChanged(chain_id) => self.apply_chain(chain_id).await,
                WalletEvent::Disconnect => self.reset_state(),
            }
        }
        count
    }

    async fn apply_chain(&mut self, chain_id: u64) {
        if !self.state.is_connected {
            return;
        }
        let mut next = self.state.clone();
        next.chain_id = Some(chain_id);
        next.network = (chain_id == self.network.chain_id).then_some(self.network);
        self.state = next;
        if let Err(e) = self.refresh_balance().await {
            tracing::error!("failed to update balance: {e}");
        }
    }
}
