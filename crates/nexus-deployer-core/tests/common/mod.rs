#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, B256, U256};
use serde_json::{json, Value};

use nexus_deployer_core::domain::{Injected, InjectedProvider, ProviderFlags};
use nexus_deployer_core::{
    ClockPort, Eip1193Port, EventHub, InjectionSurface, PortError, Subscription, WalletEvent,
};

/// Virtual clock: sleeping advances time and returns immediately.
#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl TestClock {
    pub fn elapsed_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(1_739_750_400_000 + self.now.load(Ordering::SeqCst))
    }

    async fn sleep_ms(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct WalletInner {
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    balance: U256,
    gas_limit: u64,
    gas_price: U256,
    receipt_after_polls: u32,
    receipt_polls: u32,
    receipt_status: &'static str,
    omit_contract_address: bool,
    sent: Vec<Value>,
    calls: Vec<String>,
    failures: HashMap<String, VecDeque<PortError>>,
    hanging: BTreeSet<String>,
}

/// Scripted EIP-1193 wallet that records every call it receives.
#[derive(Debug, Clone)]
pub struct ScriptedWallet {
    inner: Arc<Mutex<WalletInner>>,
    hub: EventHub,
    released: Arc<AtomicU64>,
}

impl Default for ScriptedWallet {
    fn default() -> Self {
        Self::on_chain(3940)
    }
}

impl ScriptedWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WalletInner {
                accounts: vec![account_a()],
                authorized: true,
                chain_id,
                known_chains: BTreeSet::from([1, chain_id]),
                balance: U256::from(10u64).pow(U256::from(18u64)),
                gas_limit: 120_000,
                gas_price: U256::from(1_000_000_000u64),
                receipt_after_polls: 1,
                receipt_polls: 0,
                receipt_status: "0x1",
                omit_contract_address: false,
                sent: Vec::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
                hanging: BTreeSet::new(),
            })),
            hub: EventHub::default(),
            released: Arc::new(AtomicU64::new(0)),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut WalletInner) -> R) -> R {
        f(&mut self.inner.lock().expect("wallet lock"))
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.with(|w| w.accounts = accounts);
    }

    pub fn set_authorized(&self, authorized: bool) {
        self.with(|w| w.authorized = authorized);
    }

    pub fn forget_chain(&self, chain_id: u64) {
        self.with(|w| w.known_chains.remove(&chain_id));
    }

    pub fn set_balance(&self, balance: U256) {
        self.with(|w| w.balance = balance);
    }

    pub fn set_receipt_after_polls(&self, polls: u32) {
        self.with(|w| w.receipt_after_polls = polls);
    }

    pub fn set_receipt_status(&self, status: &'static str) {
        self.with(|w| w.receipt_status = status);
    }

    pub fn omit_contract_address(&self) {
        self.with(|w| w.omit_contract_address = true);
    }

    /// The next call to `method` fails with `err`.
    pub fn fail_next(&self, method: &str, err: PortError) {
        self.with(|w| {
            w.failures
                .entry(method.to_owned())
                .or_default()
                .push_back(err)
        });
    }

    /// Calls to `method` never resolve.
    pub fn hang(&self, method: &str) {
        self.with(|w| w.hanging.insert(method.to_owned()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|w| w.calls.clone())
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.with(|w| w.calls.iter().filter(|c| *c == method).count())
    }

    pub fn sent(&self) -> Vec<Value> {
        self.with(|w| w.sent.clone())
    }

    pub fn chain_id(&self) -> u64 {
        self.with(|w| w.chain_id)
    }

    pub fn emit(&self, event: WalletEvent) -> u64 {
        self.hub.publish(event)
    }

    pub fn listener_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    pub fn released_count(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    fn respond(&self, method: &str, params: &Value) -> Result<Value, PortError> {
        let mut w = self.inner.lock().expect("wallet lock");
        w.calls.push(method.to_owned());
        if let Some(err) = w.failures.get_mut(method).and_then(VecDeque::pop_front) {
            return Err(err);
        }
        match method {
            "eth_requestAccounts" => Ok(json!(w.accounts)),
            "eth_accounts" => {
                if w.authorized {
                    Ok(json!(w.accounts))
                } else {
                    Ok(json!([]))
                }
            }
            "eth_chainId" => Ok(json!(format!("{:#x}", w.chain_id))),
            "wallet_switchEthereumChain" => {
                let raw = params
                    .pointer("/0/chainId")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let id = u64::from_str_radix(raw.trim_start_matches("0x"), 16)
                    .map_err(|e| PortError::rpc(-32602, e.to_string()))?;
                if !w.known_chains.contains(&id) {
                    return Err(PortError::rpc(
                        4902,
                        format!("Unrecognized chain ID \"{raw}\""),
                    ));
                }
                w.chain_id = id;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let raw = params
                    .pointer("/0/chainId")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let id = u64::from_str_radix(raw.trim_start_matches("0x"), 16)
                    .map_err(|e| PortError::rpc(-32602, e.to_string()))?;
                w.known_chains.insert(id);
                Ok(Value::Null)
            }
            "eth_getBalance" => Ok(json!(format!("{:#x}", w.balance))),
            "eth_gasPrice" => Ok(json!(format!("{:#x}", w.gas_price))),
            "eth_estimateGas" => Ok(json!(format!("{:#x}", w.gas_limit))),
            "eth_sendTransaction" => {
                let tx = params.get(0).cloned().unwrap_or(Value::Null);
                w.sent.push(tx);
                Ok(json!(tx_hash(w.sent.len()).to_string()))
            }
            "eth_getTransactionReceipt" => {
                w.receipt_polls += 1;
                if w.receipt_polls < w.receipt_after_polls {
                    return Ok(Value::Null);
                }
                let contract: Value = if w.omit_contract_address {
                    Value::Null
                } else {
                    json!(contract_address().to_string())
                };
                Ok(json!({
                    "transactionHash": params.get(0).cloned().unwrap_or(Value::Null),
                    "contractAddress": contract,
                    "gasUsed": "0x1d4c0",
                    "effectiveGasPrice": format!("{:#x}", w.gas_price),
                    "status": w.receipt_status,
                }))
            }
            other => Err(PortError::rpc(
                -32601,
                format!("the method {other} does not exist/is not available"),
            )),
        }
    }
}

impl Eip1193Port for ScriptedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let hangs = self.with(|w| w.hanging.contains(method));
        if hangs {
            self.with(|w| w.calls.push(method.to_owned()));
            futures::future::pending::<()>().await;
        }
        self.respond(method, &params)
    }

    fn subscribe(&self) -> Result<Subscription, PortError> {
        let released = Arc::clone(&self.released);
        Ok(self.hub.subscribe_with_release(Some(Box::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))))
    }
}

/// Surface whose injection appears after a number of empty probes.
#[derive(Debug)]
pub struct LateSurface {
    pub appears_after: Option<u32>,
    pub root: ProviderFlags,
    pub siblings: Vec<(&'static str, ProviderFlags)>,
    probes: Cell<u32>,
}

impl LateSurface {
    pub fn new(appears_after: Option<u32>) -> Self {
        Self {
            appears_after,
            root: ProviderFlags::default(),
            siblings: Vec::new(),
            probes: Cell::new(0),
        }
    }

    pub fn probes(&self) -> u32 {
        self.probes.get()
    }
}

impl InjectionSurface for LateSurface {
    type Provider = &'static str;

    async fn probe(&self) -> Option<Injected<Self::Provider>> {
        let seen = self.probes.get();
        self.probes.set(seen + 1);
        let ready = self.appears_after.is_some_and(|n| seen >= n);
        ready.then(|| Injected {
            root: InjectedProvider {
                provider: "root",
                flags: self.root,
            },
            siblings: self
                .siblings
                .iter()
                .map(|(name, flags)| InjectedProvider {
                    provider: *name,
                    flags: *flags,
                })
                .collect(),
        })
    }
}

pub fn metamask() -> ProviderFlags {
    ProviderFlags {
        is_metamask: true,
        ..ProviderFlags::default()
    }
}

pub fn coinbase() -> ProviderFlags {
    ProviderFlags {
        is_coinbase_wallet: true,
        ..ProviderFlags::default()
    }
}

pub fn account_a() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid account a")
}

pub fn account_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid account b")
}

pub fn contract_address() -> Address {
    "0x000000000000000000000000000000000000cafe"
        .parse()
        .expect("valid contract address")
}

pub fn tx_hash(n: usize) -> B256 {
    keccak256(n.to_be_bytes())
}

pub fn rejected() -> PortError {
    PortError::rpc(4001, "User rejected the request.")
}
