//! Account authorisation and the switch / add-network dance.

use thiserror::Error;

use crate::domain::{NetworkConfig, WalletState};
use crate::ports::{rpc_codes, Eip1193Port, ErrorKind, PortError};
use crate::rpc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("No Web3 wallet detected. Please install MetaMask or another Web3 wallet.")]
    ProviderMissing,
    #[error("Connection rejected by user")]
    Rejected,
    #[error("Connection request already pending")]
    RequestPending,
    #[error("No accounts found. Please unlock your wallet.")]
    NoAccounts,
    #[error("Failed to switch to {network}")]
    SwitchFailed {
        network: &'static str,
        reason: String,
    },
    #[error("Failed to add {network} to wallet")]
    AddFailed {
        network: &'static str,
        reason: String,
    },
    #[error("{0}")]
    Provider(String),
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderMissing => ErrorKind::ProviderAbsent,
            Self::Rejected => ErrorKind::UserRejected,
            Self::RequestPending => ErrorKind::PendingRequest,
            Self::NoAccounts | Self::SwitchFailed { .. } | Self::AddFailed { .. } => {
                ErrorKind::Generic
            }
            Self::Provider(_) => ErrorKind::Generic,
        }
    }
}

/// Maps an authorisation-stage failure to the message shown on the connect button.
pub fn connect_error(err: PortError) -> WalletError {
    match err.kind() {
        ErrorKind::ProviderAbsent => WalletError::ProviderMissing,
        ErrorKind::UserRejected => WalletError::Rejected,
        ErrorKind::PendingRequest => WalletError::RequestPending,
        _ => {
            let message = err.provider_message();
            if message.trim().is_empty() {
                WalletError::Provider("Failed to connect wallet".to_owned())
            } else {
                WalletError::Provider(message)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// `eth_requestAccounts`; may open a wallet prompt.
    Prompt,
    /// `eth_accounts`; only succeeds for already-authorised sites.
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeOutcome {
    pub state: WalletState,
    /// Set when the wallet connected but stayed on another chain.
    pub network_error: Option<WalletError>,
}

/// Switch first; on 4902 add the network once and retry the switch once.
pub async fn switch_network<P: Eip1193Port>(
    provider: &P,
    network: &NetworkConfig,
) -> Result<(), WalletError> {
    let first = match rpc::switch_chain(provider, network).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    if !first.has_code(rpc_codes::UNRECOGNIZED_CHAIN) {
        tracing::warn!(chain_id = network.chain_id, "failed to switch network: {first}");
        return Err(WalletError::SwitchFailed {
            network: network.name,
            reason: first.provider_message(),
        });
    }

    tracing::info!(chain_id = network.chain_id, "network unknown to wallet; adding it");
    rpc::add_chain(provider, network).await.map_err(|e| {
        tracing::error!(chain_id = network.chain_id, "failed to add network: {e}");
        WalletError::AddFailed {
            network: network.name,
            reason: e.provider_message(),
        }
    })?;
    rpc::switch_chain(provider, network).await.map_err(|e| {
        tracing::warn!(chain_id = network.chain_id, "switch after add failed: {e}");
        WalletError::SwitchFailed {
            network: network.name,
            reason: e.provider_message(),
        }
    })
}

/// Authorise, move to `network` if needed, then read the balance.
pub async fn perform_handshake<P: Eip1193Port>(
    provider: &P,
    network: &NetworkConfig,
    authorization: Authorization,
) -> Result<HandshakeOutcome, WalletError> {
    let accounts = match authorization {
        Authorization::Prompt => rpc::request_accounts(provider).await,
        Authorization::Silent => rpc::accounts(provider).await,
    }
    .map_err(connect_error)?;
    let address = accounts.first().copied().ok_or(WalletError::NoAccounts)?;

    let mut chain_id = rpc::chain_id(provider).await.map_err(connect_error)?;
    let mut network_error = None;
    if chain_id != network.chain_id {
        match switch_network(provider, network).await {
            Ok(()) => {
                chain_id = rpc::chain_id(provider).await.map_err(connect_error)?;
                if chain_id != network.chain_id {
                    tracing::warn!(chain_id, "network switch may not have completed");
                }
            }
            Err(e) => network_error = Some(e),
        }
    }

    let balance = rpc::balance(provider, address)
        .await
        .map_err(connect_error)?;
    tracing::info!(%address, chain_id, "wallet connected");

    Ok(HandshakeOutcome {
        state: WalletState::connected(address, Some(balance), chain_id, network),
        network_error,
    })
}
