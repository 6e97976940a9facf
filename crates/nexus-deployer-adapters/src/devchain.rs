//! In-memory chain behind the deterministic provider runtime.
//!
//! Answers the wallet methods the deployer uses with wallet-like errors
//! (`4902` for unknown chains, `-32000` for insufficient funds). No EVM:
//! gas is a fixed formula and receipts are available immediately.

use std::collections::{BTreeSet, HashMap};

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use serde_json::{json, Value};

use nexus_deployer_core::ports::rpc_codes;
use nexus_deployer_core::rpc::{parse_chain_id, parse_quantity};
use nexus_deployer_core::{PortError, WalletEvent};

const TX_BASE_GAS: u64 = 21_000;
const CREATE_GAS: u64 = 32_000;
const CODE_DEPOSIT_GAS_PER_BYTE: u64 = 200;

#[derive(Debug, Clone)]
pub struct SimChain {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    gas_price: U256,
    block_number: u64,
    receipts: HashMap<B256, Value>,
}

impl Default for SimChain {
    fn default() -> Self {
        let account: Address = "0x1000000000000000000000000000000000000001"
            .parse()
            .expect("valid built-in deterministic account");
        Self {
            accounts: vec![account],
            authorized: false,
            chain_id: 1,
            known_chains: BTreeSet::from([1]),
            balances: HashMap::from([(account, U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64)))]),
            nonces: HashMap::new(),
            gas_price: U256::from(1_000_000_000u64),
            block_number: 1,
            receipts: HashMap::new(),
        }
    }
}

/// A response plus the wallet event a real extension would emit for it.
pub type SimResponse = (Value, Option<WalletEvent>);

impl SimChain {
    pub fn accounts(&self) -> &[Address] {
        &self.accounts
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn set_accounts(&mut self, accounts: Vec<Address>) {
        self.accounts = accounts;
    }

    pub fn set_chain(&mut self, chain_id: u64) {
        self.known_chains.insert(chain_id);
        self.chain_id = chain_id;
    }

    pub fn set_balance(&mut self, account: Address, balance: U256) {
        self.balances.insert(account, balance);
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn handle(&mut self, method: &str, params: &Value) -> Result<SimResponse, PortError> {
        let no_event = |v: Value| Ok((v, None));
        match method {
            "eth_requestAccounts" => {
                self.authorized = true;
                no_event(json!(self.accounts))
            }
            "eth_accounts" => {
                if self.authorized {
                    no_event(json!(self.accounts))
                } else {
                    no_event(json!([]))
                }
            }
            "eth_chainId" => no_event(json!(format!("{:#x}", self.chain_id))),
            "net_version" => no_event(json!(self.chain_id.to_string())),
            "eth_blockNumber" => no_event(json!(format!("{:#x}", self.block_number))),
            "wallet_switchEthereumChain" => {
                let chain_id = param_chain_id(params)?;
                if !self.known_chains.contains(&chain_id) {
                    return Err(PortError::rpc(
                        rpc_codes::UNRECOGNIZED_CHAIN,
                        format!("Unrecognized chain ID \"{chain_id:#x}\". Try adding the chain using wallet_addEthereumChain first."),
                    ));
                }
                let changed = self.chain_id != chain_id;
                self.chain_id = chain_id;
                Ok((Value::Null, changed.then_some(WalletEvent::ChainChanged(chain_id))))
            }
            "wallet_addEthereumChain" => {
                let chain_id = param_chain_id(params)?;
                let has_rpc = params
                    .pointer("/0/rpcUrls/0")
                    .and_then(Value::as_str)
                    .is_some();
                if !has_rpc {
                    return Err(PortError::rpc(-32602, "rpcUrls must contain at least one url"));
                }
                self.known_chains.insert(chain_id);
                no_event(Value::Null)
            }
            "eth_getBalance" => {
                let account = param_address(params.get(0))?;
                no_event(json!(format!("{:#x}", self.balance_of(account))))
            }
            "eth_gasPrice" => no_event(json!(format!("{:#x}", self.gas_price))),
            "eth_estimateGas" => {
                let tx = params.get(0).unwrap_or(&Value::Null);
                let data = param_data(tx)?;
                no_event(json!(format!("{:#x}", intrinsic_gas(&data))))
            }
            "eth_sendTransaction" => self.send_transaction(params.get(0).unwrap_or(&Value::Null)),
            "eth_getTransactionReceipt" => {
                let hash: B256 = params
                    .get(0)
                    .and_then(Value::as_str)
                    .ok_or_else(|| PortError::rpc(-32602, "missing transaction hash"))?
                    .parse()
                    .map_err(|e| PortError::rpc(-32602, format!("invalid hash: {e}")))?;
                no_event(self.receipts.get(&hash).cloned().unwrap_or(Value::Null))
            }
            other => Err(PortError::rpc(
                rpc_codes::METHOD_NOT_FOUND,
                format!("The method \"{other}\" does not exist / is not available."),
            )),
        }
    }

    fn send_transaction(&mut self, tx: &Value) -> Result<SimResponse, PortError> {
        let from = param_address(tx.get("from"))?;
        if !self.authorized || !self.accounts.contains(&from) {
            return Err(PortError::rpc(
                rpc_codes::UNAUTHORIZED,
                "The requested account and/or method has not been authorized by the user.",
            ));
        }
        let data = param_data(tx)?;
        let estimated = intrinsic_gas(&data);
        let gas_limit = match tx.get("gas") {
            Some(v) => u64::try_from(parse_quantity(v)?)
                .map_err(|_| PortError::rpc(-32602, "gas overflows u64"))?,
            None => estimated,
        };
        if gas_limit < estimated {
            return Err(PortError::rpc(
                rpc_codes::SERVER_ERROR,
                format!("intrinsic gas too low: have {gas_limit}, want {estimated}"),
            ));
        }
        let gas_price = match tx.get("gasPrice") {
            Some(v) => parse_quantity(v)?,
            None => self.gas_price,
        };
        let max_cost = U256::from(gas_limit).saturating_mul(gas_price);
        let balance = self.balance_of(from);
        if balance < max_cost {
            return Err(PortError::rpc(
                rpc_codes::SERVER_ERROR,
                format!("insufficient funds for gas * price + value: have {balance} want {max_cost}"),
            ));
        }

        let nonce = self.nonces.get(&from).copied().unwrap_or_default();
        let mut preimage = Vec::with_capacity(28 + data.len());
        preimage.extend_from_slice(from.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(&self.chain_id.to_be_bytes());
        preimage.extend_from_slice(&data);
        let hash = keccak256(&preimage);

        let contract_address = tx
            .get("to")
            .filter(|v| !v.is_null())
            .is_none()
            .then(|| from.create(nonce));
        let fee = U256::from(estimated).saturating_mul(gas_price);
        self.balances.insert(from, balance - fee);
        self.nonces.insert(from, nonce + 1);
        self.block_number += 1;
        self.receipts.insert(
            hash,
            json!({
                "transactionHash": hash.to_string(),
                "blockNumber": format!("{:#x}", self.block_number),
                "from": from.to_string(),
                "contractAddress": contract_address.map(|a| a.to_string()),
                "gasUsed": format!("{estimated:#x}"),
                "effectiveGasPrice": format!("{gas_price:#x}"),
                "status": "0x1",
            }),
        );
        tracing::debug!(%hash, nonce, "simulated transaction mined");
        Ok((json!(hash.to_string()), None))
    }
}

/// Base cost, calldata cost, and for creations a per-byte code deposit.
fn intrinsic_gas(data: &[u8]) -> u64 {
    let calldata: u64 = data
        .iter()
        .map(|b| if *b == 0 { 4 } else { 16 })
        .sum();
    if data.is_empty() {
        TX_BASE_GAS
    } else {
        TX_BASE_GAS + CREATE_GAS + calldata + CODE_DEPOSIT_GAS_PER_BYTE * data.len() as u64
    }
}

fn param_chain_id(params: &Value) -> Result<u64, PortError> {
    let raw = params
        .pointer("/0/chainId")
        .ok_or_else(|| PortError::rpc(-32602, "missing chainId"))?;
    parse_chain_id(raw).map_err(|e| PortError::rpc(-32602, e.to_string()))
}

fn param_address(value: Option<&Value>) -> Result<Address, PortError> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| PortError::rpc(-32602, "missing address"))?
        .parse()
        .map_err(|e| PortError::rpc(-32602, format!("invalid address: {e}")))
}

fn param_data(tx: &Value) -> Result<Bytes, PortError> {
    match tx.get("data").or_else(|| tx.get("input")).and_then(Value::as_str) {
        Some(raw) => raw
            .parse()
            .map_err(|e| PortError::rpc(-32602, format!("invalid data: {e}"))),
        None => Ok(Bytes::new()),
    }
}
