use serde_json::Value;
use thiserror::Error;

use crate::domain::Injected;
use crate::events::Subscription;

/// EIP-1193 / JSON-RPC error codes the handshake and deploy flow branch on.
pub mod rpc_codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const REQUEST_PENDING: i64 = -32002;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const SERVER_ERROR: i64 = -32000;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("wallet provider not found: {0}")]
    ProviderMissing(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

/// Coarse classification used to pick the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ProviderAbsent,
    UserRejected,
    PendingRequest,
    UnrecognizedNetwork,
    InputValidation,
    InsufficientFunds,
    Timeout,
    Generic,
}

impl PortError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Top-level code, or the one MetaMask nests under `data.originalError.code`.
    pub fn has_code(&self, wanted: i64) -> bool {
        match self {
            Self::Rpc { code, data, .. } => {
                *code == wanted
                    || data
                        .as_ref()
                        .and_then(|d| d.pointer("/originalError/code"))
                        .and_then(Value::as_i64)
                        == Some(wanted)
            }
            _ => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProviderMissing(_) => ErrorKind::ProviderAbsent,
            Self::Validation(_) => ErrorKind::InputValidation,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Rpc { message, .. } => {
                if self.has_code(rpc_codes::USER_REJECTED) {
                    ErrorKind::UserRejected
                } else if self.has_code(rpc_codes::REQUEST_PENDING) {
                    ErrorKind::PendingRequest
                } else if self.has_code(rpc_codes::UNRECOGNIZED_CHAIN) {
                    ErrorKind::UnrecognizedNetwork
                } else if message.to_ascii_lowercase().contains("insufficient funds") {
                    ErrorKind::InsufficientFunds
                } else {
                    ErrorKind::Generic
                }
            }
            Self::NotImplemented(_) | Self::Policy(_) | Self::Transport(_) => ErrorKind::Generic,
        }
    }

    /// The provider's own wording, without the code prefix.
    pub fn provider_message(&self) -> String {
        match self {
            Self::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// An injected wallet (or anything speaking its JSON-RPC dialect).
#[allow(async_fn_in_trait)]
pub trait Eip1193Port {
    async fn request(&self, method: &str, params: Value) -> Result<Value, PortError>;

    /// Start receiving `accountsChanged` / `chainChanged` / `disconnect`.
    /// Listeners are released when the returned handle is dropped.
    fn subscribe(&self) -> Result<Subscription, PortError>;
}

#[allow(async_fn_in_trait)]
pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, PortError>;
    async fn sleep_ms(&self, ms: u64);
}

/// Host environment that may expose injected providers, possibly late.
#[allow(async_fn_in_trait)]
pub trait InjectionSurface {
    type Provider;

    async fn probe(&self) -> Option<Injected<Self::Provider>>;
}
