use std::fmt;
use std::str::FromStr;

use alloy::json_abi::JsonAbi;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

/// Static descriptor of a chain the wallet can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: &'static str,
    pub currency_name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub rpc_url: &'static str,
    pub ws_url: &'static str,
    pub explorer_url: &'static str,
}

pub const NEXUS_TESTNET: NetworkConfig = NetworkConfig {
    chain_id: 3940,
    name: "Nexus Testnet",
    currency_name: "Nexus",
    symbol: "NXS",
    decimals: 18,
    rpc_url: "https://testnet3.rpc.nexus.xyz",
    ws_url: "wss://testnet3.rpc.nexus.xyz",
    explorer_url: "https://testnet3.explorer.nexus.xyz",
};

/// Hardhat / anvil style development node.
pub const LOCAL_DEVNET: NetworkConfig = NetworkConfig {
    chain_id: 31337,
    name: "Local Devnet",
    currency_name: "Ether",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "http://127.0.0.1:8545",
    ws_url: "ws://127.0.0.1:8545",
    explorer_url: "",
};

impl NetworkConfig {
    /// `0x`-prefixed chain id as expected by `wallet_switchEthereumChain`.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// EIP-3085 parameter object for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> serde_json::Value {
        let explorers: Vec<&str> = if self.explorer_url.is_empty() {
            Vec::new()
        } else {
            vec![self.explorer_url]
        };
        serde_json::json!({
            "chainId": self.hex_chain_id(),
            "chainName": self.name,
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": explorers,
            "nativeCurrency": {
                "name": self.currency_name,
                "symbol": self.symbol,
                "decimals": self.decimals,
            },
        })
    }

    pub fn tx_url(&self, hash: B256) -> Option<String> {
        (!self.explorer_url.is_empty()).then(|| format!("{}/tx/{hash}", self.explorer_url))
    }

    pub fn address_url(&self, address: Address) -> Option<String> {
        (!self.explorer_url.is_empty()).then(|| format!("{}/address/{address}", self.explorer_url))
    }
}

/// Snapshot of the connected wallet. Always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub is_connected: bool,
    pub address: Option<Address>,
    /// Native balance in whole units, e.g. `"1.5"`.
    pub balance: Option<String>,
    pub balance_wei: Option<U256>,
    pub chain_id: Option<u64>,
    /// Set only while the wallet is on the target network.
    pub network: Option<NetworkConfig>,
}

impl WalletState {
    pub fn connected(
        address: Address,
        balance_wei: Option<U256>,
        chain_id: u64,
        target: &NetworkConfig,
    ) -> Self {
        Self {
            is_connected: true,
            address: Some(address),
            balance: balance_wei.map(format_ether),
            balance_wei,
            chain_id: Some(chain_id),
            network: (chain_id == target.chain_id).then_some(*target),
        }
    }

    pub fn is_on(&self, network: &NetworkConfig) -> bool {
        self.is_connected && self.chain_id == Some(network.chain_id)
    }

    /// `0x1234...7890`, or `"Not connected"`.
    pub fn display_address(&self) -> String {
        match self.address {
            Some(address) => {
                let full = address.to_checksum(None);
                format!("{}...{}", &full[..6], &full[full.len() - 4..])
            }
            None => "Not connected".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFlags {
    pub is_metamask: bool,
    pub is_coinbase_wallet: bool,
    pub is_rabby: bool,
    pub is_zerion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletBrand {
    MetaMask,
    CoinbaseWallet,
    Rabby,
    Zerion,
    Unknown,
}

impl WalletBrand {
    pub fn from_flags(flags: ProviderFlags) -> Self {
        if flags.is_metamask {
            Self::MetaMask
        } else if flags.is_coinbase_wallet {
            Self::CoinbaseWallet
        } else if flags.is_rabby {
            Self::Rabby
        } else if flags.is_zerion {
            Self::Zerion
        } else {
            Self::Unknown
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MetaMask => "MetaMask",
            Self::CoinbaseWallet => "Coinbase Wallet",
            Self::Rabby => "Rabby",
            Self::Zerion => "Zerion",
            Self::Unknown => "Unknown Wallet",
        }
    }
}

impl fmt::Display for WalletBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct InjectedProvider<P> {
    pub provider: P,
    pub flags: ProviderFlags,
}

/// What the host exposes at one probe: the root provider and, when several
/// extensions compete, their individual providers.
#[derive(Debug, Clone)]
pub struct Injected<P> {
    pub root: InjectedProvider<P>,
    pub siblings: Vec<InjectedProvider<P>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub event: WalletEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Storage,
    Token,
    Nft,
    Defi,
}

/// Constructor parameter types the deploy form knows how to coerce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Uint(u16),
    String,
    Address,
    AddressList,
}

impl ParamType {
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Uint(_) => "e.g., 1000000",
            Self::String => "e.g., \"My Token\"",
            Self::Address => "e.g., 0x1234...",
            Self::AddressList => "e.g., 0x123..., 0x456...",
        }
    }
}

impl FromStr for ParamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(Self::String),
            "address" => Ok(Self::Address),
            "address[]" => Ok(Self::AddressList),
            "uint" => Ok(Self::Uint(256)),
            other => {
                let bits = other
                    .strip_prefix("uint")
                    .and_then(|b| b.parse::<u16>().ok())
                    .filter(|b| *b >= 8 && *b <= 256 && b % 8 == 0)
                    .ok_or_else(|| format!("unsupported constructor parameter type: {other}"))?;
                Ok(Self::Uint(bits))
            }
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::String => f.write_str("string"),
            Self::Address => f.write_str("address"),
            Self::AddressList => f.write_str("address[]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractParameter {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub max_len: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ContractTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: TemplateCategory,
    /// Solidity contract name, used to match compiled artifacts.
    pub artifact_name: String,
    pub parameters: Vec<ContractParameter>,
    pub source_code: String,
    pub abi: JsonAbi,
    pub bytecode: Option<Bytes>,
}

impl ContractTemplate {
    pub fn is_deployable(&self) -> bool {
        self.bytecode.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Form prefill: each parameter's default, or blank.
    pub fn default_inputs(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|p| p.default_value.clone().unwrap_or_default())
            .collect()
    }

    /// Pads `provided` with blanks up to the parameter count so trailing
    /// parameters fall back to their defaults. Longer lists are returned
    /// unchanged and fail coercion with a count mismatch.
    pub fn fill_inputs(&self, provided: &[String]) -> Vec<String> {
        let mut inputs = provided.to_vec();
        if inputs.len() < self.parameters.len() {
            inputs.resize(self.parameters.len(), String::new());
        }
        inputs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub gas_limit: u64,
    /// Wei per gas unit.
    pub gas_price: U256,
}

impl GasEstimate {
    pub fn cost_wei(&self) -> U256 {
        U256::from(self.gas_limit).saturating_mul(self.gas_price)
    }

    pub fn estimated_cost(&self) -> String {
        format_ether(self.cost_wei())
    }

    pub fn gas_price_gwei(&self) -> String {
        alloy::primitives::utils::format_units(self.gas_price, "gwei")
            .unwrap_or_else(|_| self.gas_price.to_string())
    }
}

/// User-supplied gas settings that take precedence over the estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasOverrides {
    pub gas_limit: Option<u64>,
    pub gas_price: Option<U256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    pub contract_address: Option<Address>,
    pub transaction_hash: Option<B256>,
    pub gas_used: Option<u64>,
    pub deployment_cost: Option<String>,
    pub error: Option<String>,
}

impl DeploymentResult {
    pub fn succeeded(
        contract_address: Address,
        transaction_hash: B256,
        gas_used: u64,
        deployment_cost: Option<String>,
    ) -> Self {
        Self {
            success: true,
            contract_address: Some(contract_address),
            transaction_hash: Some(transaction_hash),
            gas_used: Some(gas_used),
            deployment_cost,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, transaction_hash: Option<B256>) -> Self {
        Self {
            success: false,
            transaction_hash,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContract {
    pub address: Address,
    pub template_id: String,
    pub name: String,
    pub transaction_hash: B256,
    pub deployer: Address,
    pub timestamp_ms: TimestampMs,
}
