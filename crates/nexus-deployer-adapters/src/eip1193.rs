use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};
use serde_json::Value;

use nexus_deployer_core::ports::rpc_codes;
use nexus_deployer_core::{Eip1193Port, EventHub, PortError, Subscription, WalletEvent};

use crate::devchain::SimChain;
use crate::DeployerConfig;

#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    hub: EventHub,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser(crate::browser::BrowserRuntime),
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Default)]
struct ProviderState {
    chain: SimChain,
    /// Last values seen from the proxy; a change is published as an event.
    seen_accounts: Option<Vec<Address>>,
    seen_chain_id: Option<u64>,
    request_id: u64,
    scripted_failures: HashMap<String, VecDeque<PortError>>,
}

/// Which runtime backs the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Disabled,
    Deterministic,
    Proxy,
    Browser,
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(DeployerConfig::from_env())
    }
}

impl Eip1193Adapter {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_config(config: DeployerConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.request_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        tracing::warn!("proxy client unavailable, using simulated wallet: {e}");
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };
        Self::from_mode(mode)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn with_config(config: DeployerConfig) -> Self {
        let mode = match crate::browser::BrowserRuntime::root() {
            Ok(runtime) => ProviderMode::Browser(runtime),
            Err(e) if config.strict_runtime_required() => ProviderMode::Disabled(format!(
                "EIP-1193 browser provider not found in production runtime profile: {e}"
            )),
            Err(_) => ProviderMode::Deterministic,
        };
        Self::from_mode(mode)
    }

    /// Simulated wallet regardless of configuration.
    pub fn deterministic() -> Self {
        Self::from_mode(ProviderMode::Deterministic)
    }

    #[cfg(target_arch = "wasm32")]
    pub(crate) fn browser(runtime: crate::browser::BrowserRuntime) -> Self {
        Self::from_mode(ProviderMode::Browser(runtime))
    }

    fn from_mode(mode: ProviderMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
            hub: EventHub::default(),
        }
    }

    pub fn runtime(&self) -> RuntimeKind {
        match &self.mode {
            ProviderMode::Disabled(_) => RuntimeKind::Disabled,
            ProviderMode::Deterministic => RuntimeKind::Deterministic,
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(_) => RuntimeKind::Proxy,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser(_) => RuntimeKind::Browser,
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<u64, PortError> {
        self.lock()?.chain.set_accounts(accounts.clone());
        Ok(self.hub.publish(WalletEvent::AccountsChanged(accounts)))
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<u64, PortError> {
        self.lock()?.chain.set_chain(chain_id);
        Ok(self.hub.publish(WalletEvent::ChainChanged(chain_id)))
    }

    pub fn debug_inject_disconnect(&self) -> u64 {
        self.hub.publish(WalletEvent::Disconnect)
    }

    /// The next `method` call fails with `err` before reaching the runtime.
    pub fn debug_fail_next(&self, method: &str, err: PortError) -> Result<(), PortError> {
        self.lock()?
            .scripted_failures
            .entry(method.to_owned())
            .or_default()
            .push_back(err);
        Ok(())
    }

    pub fn debug_set_balance(&self, account: Address, balance: U256) -> Result<(), PortError> {
        self.lock()?.chain.set_balance(account, balance);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn take_scripted_failure(&self, method: &str) -> Result<Option<PortError>, PortError> {
        Ok(self
            .lock()?
            .scripted_failures
            .get_mut(method)
            .and_then(VecDeque::pop_front))
    }

    fn simulate(&self, method: &str, params: &Value) -> Result<Value, PortError> {
        let (value, event) = self.lock()?.chain.handle(method, params)?;
        if let Some(event) = event {
            self.hub.publish(event);
        }
        Ok(value)
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn proxy_call(
        &self,
        proxy: &ProxyRuntime,
        method: &str,
        params: &Value,
    ) -> Result<Value, PortError> {
        let id = {
            let mut g = self.lock()?;
            g.request_id = g.request_id.saturating_add(1);
            g.request_id
        };
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn proxy_request(
        &self,
        proxy: &ProxyRuntime,
        method: &str,
        params: Value,
    ) -> Result<Value, PortError> {
        let result = match self.proxy_call(proxy, method, &params).await {
            // Plain nodes have no authorisation step.
            Err(e)
                if method == "eth_requestAccounts"
                    && e.has_code(rpc_codes::METHOD_NOT_FOUND) =>
            {
                tracing::debug!("eth_requestAccounts unsupported by node; using eth_accounts");
                self.proxy_call(proxy, "eth_accounts", &params).await?
            }
            other => other?,
        };
        self.observe(method, &result)?;
        Ok(result)
    }

    /// Publishes `accountsChanged` / `chainChanged` when a proxy read differs
    /// from the previous one. The first read only primes the snapshot.
    #[cfg(not(target_arch = "wasm32"))]
    fn observe(&self, method: &str, result: &Value) -> Result<(), PortError> {
        use nexus_deployer_core::rpc::{parse_accounts, parse_chain_id};

        let event = match method {
            "eth_requestAccounts" | "eth_accounts" => {
                let accounts = parse_accounts(result)?;
                let mut g = self.lock()?;
                let previous = g.seen_accounts.replace(accounts.clone());
                previous
                    .filter(|p| *p != accounts)
                    .map(|_| WalletEvent::AccountsChanged(accounts))
            }
            "eth_chainId" => {
                let chain_id = parse_chain_id(result)?;
                let mut g = self.lock()?;
                let previous = g.seen_chain_id.replace(chain_id);
                previous
                    .filter(|p| *p != chain_id)
                    .map(|_| WalletEvent::ChainChanged(chain_id))
            }
            _ => None,
        };
        if let Some(event) = event {
            self.hub.publish(event);
        }
        Ok(())
    }
}

impl Eip1193Port for Eip1193Adapter {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        self.check_mode()?;
        if let Some(err) = self.take_scripted_failure(method)? {
            tracing::debug!(method, "scripted provider failure");
            return Err(err);
        }

        match &self.mode {
            ProviderMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => self.simulate(method, &params),
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(proxy) => self.proxy_request(proxy, method, params).await,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser(runtime) => runtime.request(method, params).await,
        }
    }

    fn subscribe(&self) -> Result<Subscription, PortError> {
        self.check_mode()?;
        #[cfg(target_arch = "wasm32")]
        if let ProviderMode::Browser(runtime) = &self.mode {
            // One hub per registration so each listener set feeds one queue.
            let hub = EventHub::default();
            let release = runtime.register_listeners(hub.clone())?;
            return Ok(hub.subscribe_with_release(Some(release)));
        }
        Ok(self.hub.subscribe())
    }
}

/// JSON-RPC error object to `PortError::Rpc`.
pub(crate) fn rpc_error(err: &Value) -> PortError {
    PortError::Rpc {
        code: err.get("code").and_then(Value::as_i64).unwrap_or(rpc_codes::INTERNAL_ERROR),
        message: err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        data: err.get("data").filter(|d| !d.is_null()).cloned(),
    }
}
