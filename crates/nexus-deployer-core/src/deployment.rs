//! Validate, estimate, submit and confirm one contract deployment.
//!
//! Every step goes through [`deploy_transition`], so an attempt that is
//! already in flight cannot be started twice.

use std::pin::pin;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, B256, U256};
use futures::future::{select, Either};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::abi::{self, ValidationErrors};
use crate::domain::{
    ContractTemplate, DeployedContract, DeploymentResult, GasEstimate, GasOverrides,
    NetworkConfig, TimestampMs, WalletState,
};
use crate::history::DeploymentHistory;
use crate::ports::{ClockPort, Eip1193Port, ErrorKind, PortError};
use crate::rpc::{self, TxReceipt};
use crate::state_machine::{deploy_transition, DeployAction, DeployPhase, TransitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentPolicy {
    pub estimate_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_ms: u64,
}

impl Default for DeploymentPolicy {
    fn default() -> Self {
        Self {
            estimate_timeout_ms: 10_000,
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("Invalid constructor arguments: {0}")]
    Validation(ValidationErrors),
    #[error("Template '{0}' has no compiled bytecode")]
    MissingBytecode(String),
    #[error("Please connect your wallet first")]
    NotConnected,
    #[error("Please switch to {network}")]
    WrongNetwork { network: &'static str },
    #[error("Insufficient funds: deployment needs {needed} {symbol}, wallet holds {available} {symbol}")]
    InsufficientFunds {
        needed: String,
        available: String,
        symbol: &'static str,
    },
    #[error("Gas estimation failed: {0}")]
    Estimation(String),
    #[error("Gas estimation timed out")]
    EstimationTimeout,
    #[error("Transaction rejected by user")]
    Rejected,
    #[error("Transaction request already pending")]
    RequestPending,
    #[error("Deployment failed: {0}")]
    Submission(String),
    #[error("Deployment transaction failed: {0}")]
    Reverted(B256),
    #[error("Failed to get contract address from {0}")]
    MissingContractAddress(B256),
    #[error("Timed out waiting for receipt of {0}")]
    ReceiptTimeout(B256),
    #[error("Failed to encode deployment data: {0}")]
    Encoding(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::MissingBytecode(_) | Self::Encoding(_) => {
                ErrorKind::InputValidation
            }
            Self::NotConnected => ErrorKind::ProviderAbsent,
            Self::WrongNetwork { .. } => ErrorKind::UnrecognizedNetwork,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::EstimationTimeout | Self::ReceiptTimeout(_) => ErrorKind::Timeout,
            Self::Rejected => ErrorKind::UserRejected,
            Self::RequestPending => ErrorKind::PendingRequest,
            Self::Estimation(_)
            | Self::Submission(_)
            | Self::Reverted(_)
            | Self::MissingContractAddress(_)
            | Self::Transition(_) => ErrorKind::Generic,
        }
    }

    fn from_wallet(err: PortError) -> Self {
        match err.kind() {
            ErrorKind::UserRejected => Self::Rejected,
            ErrorKind::PendingRequest => Self::RequestPending,
            _ => {
                let message = err.provider_message();
                if message.trim().is_empty() {
                    Self::Submission(
                        "Please check your wallet connection and try again.".to_owned(),
                    )
                } else {
                    Self::Submission(message)
                }
            }
        }
    }
}

/// Coerced inputs ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDeployment {
    pub template_id: String,
    pub template_name: String,
    pub args: Vec<DynSolValue>,
    pub data: Bytes,
}

#[derive(Debug)]
pub struct Deployer<P: Eip1193Port, C: ClockPort> {
    provider: P,
    clock: C,
    network: NetworkConfig,
    policy: DeploymentPolicy,
    phase: DeployPhase,
    prepared: Option<PreparedDeployment>,
    estimate: Option<GasEstimate>,
    result: Option<DeploymentResult>,
    pending_tx: Option<B256>,
    last_error: Option<DeployError>,
    history: DeploymentHistory,
}

impl<P: Eip1193Port, C: ClockPort> Deployer<P, C> {
    pub fn new(provider: P, clock: C, network: NetworkConfig) -> Self {
        Self::with_policy(provider, clock, network, DeploymentPolicy::default())
    }

    pub fn with_policy(
        provider: P,
        clock: C,
        network: NetworkConfig,
        policy: DeploymentPolicy,
    ) -> Self {
        Self {
            provider,
            clock,
            network,
            policy,
            phase: DeployPhase::Idle,
            prepared: None,
            estimate: None,
            result: None,
            pending_tx: None,
            last_error: None,
            history: DeploymentHistory::default(),
        }
    }

    pub fn phase(&self) -> DeployPhase {
        self.phase
    }

    pub fn prepared(&self) -> Option<&PreparedDeployment> {
        self.prepared.as_ref()
    }

    pub fn estimate(&self) -> Option<&GasEstimate> {
        self.estimate.as_ref()
    }

    pub fn result(&self) -> Option<&DeploymentResult> {
        self.result.as_ref()
    }

    pub fn pending_tx(&self) -> Option<B256> {
        self.pending_tx
    }

    pub fn last_error(&self) -> Option<&DeployError> {
        self.last_error.as_ref()
    }

    pub fn history(&self) -> &DeploymentHistory {
        &self.history
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Field-level errors from the last rejected validation.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match &self.last_error {
            Some(DeployError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }

    pub fn can_submit(&self, wallet: &WalletState) -> bool {
        self.phase == DeployPhase::Ready && wallet.is_on(&self.network)
    }

    fn step(&mut self, action: DeployAction) -> Result<(), DeployError> {
        let (to, transition) = deploy_transition(self.phase, action)?;
        tracing::debug!(
            from = ?transition.from,
            to = ?transition.to,
            action = ?transition.action,
            "deploy transition"
        );
        self.phase = to;
        Ok(())
    }

    /// Coerces `inputs` against the template. Makes no provider calls.
    pub fn validate(
        &mut self,
        template: &ContractTemplate,
        inputs: &[String],
    ) -> Result<&PreparedDeployment, DeployError> {
        self.step(DeployAction::Validate)?;
        self.prepared = None;
        self.estimate = None;
        self.result = None;
        self.last_error = None;

        match prepare(template, inputs) {
            Ok(prepared) => {
                self.step(DeployAction::InputAccepted)?;
                Ok(&*self.prepared.insert(prepared))
            }
            Err(err) => {
                self.step(DeployAction::InputRejected)?;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// `eth_estimateGas` plus `eth_gasPrice`, bounded by the estimate timeout.
    /// A failure leaves the deployment ready to submit with explicit overrides.
    pub async fn estimate_gas(&mut self, wallet: &WalletState) -> Result<GasEstimate, DeployError> {
        let from = wallet.address.ok_or(DeployError::NotConnected)?;
        self.step(DeployAction::Estimate)?;
        let Some(prepared) = self.prepared.as_ref() else {
            self.step(DeployAction::EstimateSettled)?;
            return Err(DeployError::Encoding("no prepared deployment".to_owned()));
        };
        let tx = json!({
            "from": from.to_string(),
            "data": prepared.data.to_string(),
        });

        let outcome = {
            let provider = &self.provider;
            let work = pin!(async {
                let gas_limit = rpc::estimate_gas(provider, &tx).await?;
                let gas_price = rpc::gas_price(provider).await?;
                Ok::<_, PortError>(GasEstimate {
                    gas_limit,
                    gas_price,
                })
            });
            let timeout = pin!(self.clock.sleep_ms(self.policy.estimate_timeout_ms));
            match select(work, timeout).await {
                Either::Left((Ok(estimate), _)) => Ok(estimate),
                Either::Left((Err(e), _)) => Err(DeployError::Estimation(e.provider_message())),
                Either::Right(((), _)) => Err(DeployError::EstimationTimeout),
            }
        };

        self.step(DeployAction::EstimateSettled)?;
        match outcome {
            Ok(estimate) => {
                tracing::info!(
                    gas_limit = estimate.gas_limit,
                    gas_price = %estimate.gas_price,
                    "gas estimated"
                );
                self.estimate = Some(estimate);
                Ok(estimate)
            }
            Err(err) => {
                tracing::warn!("gas estimation failed: {err}");
                self.estimate = None;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Sends the creation transaction and waits for its receipt.
    pub async fn submit(
        &mut self,
        wallet: &WalletState,
        overrides: GasOverrides,
    ) -> Result<DeploymentResult, DeployError> {
        deploy_transition(self.phase, DeployAction::Submit)?;
        let from = self.check_wallet(wallet, overrides)?;
        let prepared = self
            .prepared
            .clone()
            .ok_or_else(|| DeployError::Encoding("no prepared deployment".to_owned()))?;
        let gas_limit = overrides
            .gas_limit
            .or(self.estimate.map(|e| e.gas_limit));
        let gas_price = overrides
            .gas_price
            .or(self.estimate.map(|e| e.gas_price));
        let tx = creation_tx(from, &prepared.data, gas_limit, gas_price);

        self.step(DeployAction::Submit)?;
        self.result = None;
        self.last_error = None;
        tracing::info!(template = %prepared.template_id, %from, "submitting deployment");

        let hash = match rpc::send_transaction(&self.provider, &tx).await {
            Ok(hash) => hash,
            Err(e) => {
                let err = DeployError::from_wallet(e);
                return self.fail(DeployAction::WalletRejected, err, None);
            }
        };
        self.step(DeployAction::WalletApproved)?;
        self.pending_tx = Some(hash);
        tracing::info!(tx_hash = %hash, "deployment transaction sent");

        let receipt = match self.wait_for_receipt(hash).await {
            Ok(receipt) => receipt,
            Err(err) => return self.fail(DeployAction::ConfirmationFailed, err, Some(hash)),
        };
        if receipt.status == Some(false) {
            return self.fail(
                DeployAction::ConfirmationFailed,
                DeployError::Reverted(hash),
                Some(hash),
            );
        }
        let Some(address) = receipt.contract_address else {
            return self.fail(
                DeployAction::ConfirmationFailed,
                DeployError::MissingContractAddress(hash),
                Some(hash),
            );
        };

        let price = receipt.effective_gas_price.or(gas_price);
        let cost = price.map(|p| format_ether(U256::from(receipt.gas_used).saturating_mul(p)));
        let result = DeploymentResult::succeeded(address, hash, receipt.gas_used, cost);
        self.step(DeployAction::Confirmed)?;
        self.pending_tx = None;
        self.result = Some(result.clone());

        let timestamp_ms = self.clock.now_ms().unwrap_or_else(|e| {
            tracing::warn!("clock unavailable: {e}");
            0
        });
        self.history.record(DeployedContract {
            address,
            template_id: prepared.template_id,
            name: prepared.template_name,
            transaction_hash: hash,
            deployer: from,
            timestamp_ms: TimestampMs(timestamp_ms),
        });
        tracing::info!(%address, gas_used = receipt.gas_used, "contract deployed");
        Ok(result)
    }

    fn check_wallet(
        &self,
        wallet: &WalletState,
        overrides: GasOverrides,
    ) -> Result<Address, DeployError> {
        let from = wallet
            .address
            .filter(|_| wallet.is_connected)
            .ok_or(DeployError::NotConnected)?;
        if !wallet.is_on(&self.network) {
            return Err(DeployError::WrongNetwork {
                network: self.network.name,
            });
        }

        let gas_limit = overrides.gas_limit.or(self.estimate.map(|e| e.gas_limit));
        let gas_price = overrides.gas_price.or(self.estimate.map(|e| e.gas_price));
        if let (Some(limit), Some(price), Some(balance)) = (gas_limit, gas_price, wallet.balance_wei)
        {
            let needed = U256::from(limit).saturating_mul(price);
            if needed > balance {
                return Err(DeployError::InsufficientFunds {
                    needed: format_ether(needed),
                    available: format_ether(balance),
                    symbol: self.network.symbol,
                });
            }
        }
        Ok(from)
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, DeployError> {
        let interval = self.policy.receipt_poll_interval_ms.max(1);
        let mut waited = 0u64;
        loop {
            match rpc::transaction_receipt(&self.provider, hash).await {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => tracing::warn!(tx_hash = %hash, "receipt lookup failed: {e}"),
            }
            if waited >= self.policy.receipt_timeout_ms {
                return Err(DeployError::ReceiptTimeout(hash));
            }
            self.clock.sleep_ms(interval).await;
            waited += interval;
        }
    }

    fn fail(
        &mut self,
        action: DeployAction,
        err: DeployError,
        hash: Option<B256>,
    ) -> Result<DeploymentResult, DeployError> {
        tracing::error!("deployment failed: {err}");
        self.step(action)?;
        self.pending_tx = None;
        self.result = Some(DeploymentResult::failed(err.to_string(), hash));
        self.last_error = Some(err.clone());
        Err(err)
    }

    /// "Deploy another": drops the attempt but keeps the history.
    pub fn reset(&mut self) -> Result<(), DeployError> {
        self.step(DeployAction::Reset)?;
        self.prepared = None;
        self.estimate = None;
        self.result = None;
        self.pending_tx = None;
        self.last_error = None;
        Ok(())
    }
}

fn prepare(
    template: &ContractTemplate,
    inputs: &[String],
) -> Result<PreparedDeployment, DeployError> {
    if !template.is_deployable() {
        return Err(DeployError::MissingBytecode(template.id.clone()));
    }
    let args = abi::coerce_args(&template.parameters, inputs).map_err(DeployError::Validation)?;
    let data = abi::encode_deploy_data(template, &args)
        .map_err(|e| DeployError::Encoding(e.provider_message()))?;
    Ok(PreparedDeployment {
        template_id: template.id.clone(),
        template_name: template.name.clone(),
        args,
        data,
    })
}

fn creation_tx(
    from: Address,
    data: &Bytes,
    gas_limit: Option<u64>,
    gas_price: Option<U256>,
) -> Value {
    let mut tx = Map::new();
    tx.insert("from".to_owned(), Value::String(from.to_string()));
    tx.insert("data".to_owned(), Value::String(data.to_string()));
    if let Some(limit) = gas_limit {
        tx.insert("gas".to_owned(), Value::String(format!("{limit:#x}")));
    }
    if let Some(price) = gas_price {
        tx.insert("gasPrice".to_owned(), Value::String(format!("{price:#x}")));
    }
    Value::Object(tx)
}
