use nexus_deployer_core::domain::{Injected, InjectedProvider, ProviderFlags};
use nexus_deployer_core::rpc;
use nexus_deployer_core::InjectionSurface;

use crate::eip1193::{Eip1193Adapter, RuntimeKind};

/// Native stand-in for the browser's injected providers: the configured
/// adapter "appears" once its runtime answers `eth_chainId`.
#[derive(Debug, Clone)]
pub struct ConfiguredSurface {
    adapter: Eip1193Adapter,
}

impl ConfiguredSurface {
    pub fn new(adapter: Eip1193Adapter) -> Self {
        Self { adapter }
    }
}

impl InjectionSurface for ConfiguredSurface {
    type Provider = Eip1193Adapter;

    async fn probe(&self) -> Option<Injected<Eip1193Adapter>> {
        match self.adapter.runtime() {
            RuntimeKind::Disabled => return None,
            RuntimeKind::Proxy => {
                if let Err(e) = rpc::chain_id(&self.adapter).await {
                    tracing::debug!("json-rpc endpoint not ready: {e}");
                    return None;
                }
            }
            RuntimeKind::Deterministic | RuntimeKind::Browser => {}
        }
        Some(Injected {
            root: InjectedProvider {
                provider: self.adapter.clone(),
                flags: ProviderFlags::default(),
            },
            siblings: Vec::new(),
        })
    }
}
