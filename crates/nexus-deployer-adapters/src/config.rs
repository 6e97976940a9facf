use std::path::PathBuf;

use nexus_deployer_core::{AcquirePolicy, DeploymentPolicy, NetworkConfig, LOCAL_DEVNET, NEXUS_TESTNET};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    /// No silent fallback to the simulated wallet.
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeployerConfig {
    pub runtime_profile: RuntimeProfile,
    pub network: NetworkConfig,
    /// JSON-RPC endpoint used by the native proxy runtime.
    pub eip1193_proxy_url: Option<String>,
    pub request_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
    pub acquire_poll_interval_ms: u64,
    pub estimate_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_ms: u64,
    /// Hardhat `artifacts/` directory providing compiled bytecode.
    pub artifacts_dir: Option<PathBuf>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        let acquire = AcquirePolicy::default();
        let deploy = DeploymentPolicy::default();
        Self {
            runtime_profile: RuntimeProfile::Development,
            network: NEXUS_TESTNET,
            eip1193_proxy_url: None,
            request_timeout_ms: 30_000,
            acquire_timeout_ms: acquire.timeout_ms,
            acquire_poll_interval_ms: acquire.poll_interval_ms,
            estimate_timeout_ms: deploy.estimate_timeout_ms,
            receipt_poll_interval_ms: deploy.receipt_poll_interval_ms,
            receipt_timeout_ms: deploy.receipt_timeout_ms,
            artifacts_dir: None,
        }
    }
}

impl DeployerConfig {
    /// Reads `NEXUS_DEPLOYER_*` variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(profile) = get("NEXUS_DEPLOYER_PROFILE") {
            match profile.to_ascii_lowercase().as_str() {
                "production" | "prod" => cfg.runtime_profile = RuntimeProfile::Production,
                "development" | "dev" => cfg.runtime_profile = RuntimeProfile::Development,
                other => tracing::warn!(value = other, "unknown NEXUS_DEPLOYER_PROFILE"),
            }
        }
        if let Some(network) = get("NEXUS_DEPLOYER_NETWORK") {
            match network_by_name(&network) {
                Some(n) => cfg.network = n,
                None => tracing::warn!(value = %network, "unknown NEXUS_DEPLOYER_NETWORK"),
            }
        }
        if let Some(url) = get("NEXUS_DEPLOYER_RPC_URL") {
            cfg.eip1193_proxy_url = Some(url);
        }
        if let Some(dir) = get("NEXUS_DEPLOYER_ARTIFACTS") {
            cfg.artifacts_dir = Some(PathBuf::from(dir));
        }

        let millis = |key: &str, slot: &mut u64| {
            if let Some(raw) = get(key) {
                match raw.parse::<u64>() {
                    Ok(v) => *slot = v,
                    Err(e) => tracing::warn!(key, value = %raw, "ignoring invalid duration: {e}"),
                }
            }
        };
        millis("NEXUS_DEPLOYER_REQUEST_TIMEOUT_MS", &mut cfg.request_timeout_ms);
        millis("NEXUS_DEPLOYER_ACQUIRE_TIMEOUT_MS", &mut cfg.acquire_timeout_ms);
        millis("NEXUS_DEPLOYER_ESTIMATE_TIMEOUT_MS", &mut cfg.estimate_timeout_ms);
        millis("NEXUS_DEPLOYER_RECEIPT_POLL_MS", &mut cfg.receipt_poll_interval_ms);
        millis("NEXUS_DEPLOYER_RECEIPT_TIMEOUT_MS", &mut cfg.receipt_timeout_ms);
        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn acquire_policy(&self) -> AcquirePolicy {
        AcquirePolicy {
            timeout_ms: self.acquire_timeout_ms,
            poll_interval_ms: self.acquire_poll_interval_ms,
        }
    }

    pub fn deployment_policy(&self) -> DeploymentPolicy {
        DeploymentPolicy {
            estimate_timeout_ms: self.estimate_timeout_ms,
            receipt_poll_interval_ms: self.receipt_poll_interval_ms,
            receipt_timeout_ms: self.receipt_timeout_ms,
        }
    }
}

/// `nexus-testnet` / `local`, or a chain id.
pub fn network_by_name(name: &str) -> Option<NetworkConfig> {
    match name.trim().to_ascii_lowercase().as_str() {
        "nexus" | "nexus-testnet" | "testnet" | "3940" => Some(NEXUS_TESTNET),
        "local" | "localhost" | "devnet" | "hardhat" | "31337" => Some(LOCAL_DEVNET),
        _ => None,
    }
}
