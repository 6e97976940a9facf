//! Typed wrappers over the raw JSON-RPC calls the deployer makes.

use alloy::primitives::{Address, B256, U256};
use serde_json::{json, Value};

use crate::domain::NetworkConfig;
use crate::ports::{Eip1193Port, PortError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub effective_gas_price: Option<U256>,
    /// `None` for pre-Byzantium receipts without a status field.
    pub status: Option<bool>,
}

pub async fn request_accounts<P: Eip1193Port>(provider: &P) -> Result<Vec<Address>, PortError> {
    let result = provider.request("eth_requestAccounts", json!([])).await?;
    parse_accounts(&result)
}

/// Already-authorised accounts, without prompting.
pub async fn accounts<P: Eip1193Port>(provider: &P) -> Result<Vec<Address>, PortError> {
    let result = provider.request("eth_accounts", json!([])).await?;
    parse_accounts(&result)
}

pub async fn chain_id<P: Eip1193Port>(provider: &P) -> Result<u64, PortError> {
    let result = provider.request("eth_chainId", json!([])).await?;
    parse_chain_id(&result)
}

pub async fn switch_chain<P: Eip1193Port>(
    provider: &P,
    network: &NetworkConfig,
) -> Result<(), PortError> {
    provider
        .request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": network.hex_chain_id() }]),
        )
        .await
        .map(|_| ())
}

pub async fn add_chain<P: Eip1193Port>(
    provider: &P,
    network: &NetworkConfig,
) -> Result<(), PortError> {
    provider
        .request("wallet_addEthereumChain", json!([network.add_chain_params()]))
        .await
        .map(|_| ())
}

pub async fn balance<P: Eip1193Port>(provider: &P, address: Address) -> Result<U256, PortError> {
    let result = provider
        .request("eth_getBalance", json!([address.to_string(), "latest"]))
        .await?;
    parse_quantity(&result)
}

pub async fn gas_price<P: Eip1193Port>(provider: &P) -> Result<U256, PortError> {
    let result = provider.request("eth_gasPrice", json!([])).await?;
    parse_quantity(&result)
}

pub async fn estimate_gas<P: Eip1193Port>(provider: &P, tx: &Value) -> Result<u64, PortError> {
    let result = provider.request("eth_estimateGas", json!([tx])).await?;
    quantity_to_u64(&result)
}

pub async fn send_transaction<P: Eip1193Port>(provider: &P, tx: &Value) -> Result<B256, PortError> {
    let result = provider.request("eth_sendTransaction", json!([tx])).await?;
    let raw = result.as_str().ok_or_else(|| {
        PortError::Transport("eth_sendTransaction must return tx hash".to_owned())
    })?;
    raw.parse()
        .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")))
}

pub async fn transaction_receipt<P: Eip1193Port>(
    provider: &P,
    hash: B256,
) -> Result<Option<TxReceipt>, PortError> {
    let result = provider
        .request("eth_getTransactionReceipt", json!([hash.to_string()]))
        .await?;
    if result.is_null() {
        return Ok(None);
    }
    parse_receipt(&result).map(Some)
}

pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Transport("accounts result must be array".to_owned()))?;
    arr.iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| PortError::Transport("account must be string".to_owned()))?;
            raw.parse()
                .map_err(|e| PortError::Validation(format!("invalid account: {e}")))
        })
        .collect()
}

pub fn parse_chain_id(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

pub fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}

/// Hex (`0x..`) or decimal quantity.
pub fn parse_quantity(value: &Value) -> Result<U256, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(U256::from(n));
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation(format!("quantity must be string: {value}")))?;
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => Ok(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex quantity {s}: {e}"))),
        None => U256::from_str_radix(s, 10)
            .map_err(|e| PortError::Validation(format!("invalid quantity {s}: {e}"))),
    }
}

fn quantity_to_u64(value: &Value) -> Result<u64, PortError> {
    let q = parse_quantity(value)?;
    u64::try_from(q).map_err(|_| PortError::Validation(format!("quantity overflows u64: {q}")))
}

fn parse_receipt(value: &Value) -> Result<TxReceipt, PortError> {
    let transaction_hash = value
        .get("transactionHash")
        .and_then(Value::as_str)
        .ok_or_else(|| PortError::Transport("receipt missing transactionHash".to_owned()))?
        .parse()
        .map_err(|e| PortError::Validation(format!("invalid receipt hash: {e}")))?;
    let contract_address = match value.get("contractAddress") {
        Some(Value::String(raw)) => Some(
            raw.parse()
                .map_err(|e| PortError::Validation(format!("invalid contract address: {e}")))?,
        ),
        _ => None,
    };
    let gas_used = value
        .get("gasUsed")
        .map(quantity_to_u64)
        .transpose()?
        .unwrap_or_default();
    let effective_gas_price = value
        .get("effectiveGasPrice")
        .filter(|v| !v.is_null())
        .map(parse_quantity)
        .transpose()?;
    let status = value
        .get("status")
        .filter(|v| !v.is_null())
        .map(parse_quantity)
        .transpose()?
        .map(|s| s == U256::from(1u8));

    Ok(TxReceipt {
        transaction_hash,
        contract_address,
        gas_used,
        effective_gas_price,
        status,
    })
}
