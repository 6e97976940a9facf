pub mod abi;
pub mod acquisition;
pub mod deployment;
pub mod domain;
pub mod events;
pub mod handshake;
pub mod history;
pub mod ports;
pub mod rpc;
pub mod session;
pub mod state_machine;
pub mod templates;

pub use acquisition::{acquire_provider, AcquirePolicy, Acquired};
pub use deployment::{DeployError, Deployer, DeploymentPolicy, PreparedDeployment};
pub use domain::{
    ContractTemplate, DeploymentResult, GasEstimate, GasOverrides, NetworkConfig, TimestampMs,
    WalletBrand, WalletEvent, WalletState, LOCAL_DEVNET, NEXUS_TESTNET,
};
pub use events::{EventHub, Subscription};
pub use handshake::WalletError;
pub use ports::{ClockPort, Eip1193Port, ErrorKind, InjectionSurface, PortError};
pub use session::WalletSession;
pub use state_machine::{DeployAction, DeployPhase, StateTransition};
pub use templates::TemplateRegistry;
