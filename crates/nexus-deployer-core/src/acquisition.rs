//! Picking one wallet provider out of whatever the host injected.

use crate::domain::{Injected, WalletBrand};
use crate::ports::{ClockPort, InjectionSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquirePolicy {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 3_000,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Acquired<P> {
    pub provider: P,
    pub brand: WalletBrand,
}

/// MetaMask wins among siblings regardless of position; otherwise the first
/// sibling; otherwise the root provider.
pub fn select_provider<P>(injected: Injected<P>) -> Acquired<P> {
    let Injected { root, siblings } = injected;
    if siblings.is_empty() {
        return Acquired {
            brand: WalletBrand::from_flags(root.flags),
            provider: root.provider,
        };
    }

    let preferred = siblings
        .iter()
        .position(|p| p.flags.is_metamask)
        .unwrap_or(0);
    let chosen = siblings
        .into_iter()
        .nth(preferred)
        .map(|p| Acquired {
            brand: WalletBrand::from_flags(p.flags),
            provider: p.provider,
        });
    chosen.unwrap_or(Acquired {
        brand: WalletBrand::from_flags(root.flags),
        provider: root.provider,
    })
}

/// Polls `surface` until a provider shows up or `policy.timeout_ms` of sleep
/// has elapsed. `None` means no wallet is installed.
pub async fn acquire_provider<S, C>(
    surface: &S,
    clock: &C,
    policy: AcquirePolicy,
) -> Option<Acquired<S::Provider>>
where
    S: InjectionSurface,
    C: ClockPort,
{
    let interval = policy.poll_interval_ms.max(1);
    let mut waited = 0u64;
    loop {
        if let Some(injected) = surface.probe().await {
            let acquired = select_provider(injected);
            tracing::debug!(brand = %acquired.brand, waited_ms = waited, "wallet provider acquired");
            return Some(acquired);
        }
        if waited >= policy.timeout_ms {
            tracing::info!(timeout_ms = policy.timeout_ms, "no wallet provider injected");
            return None;
        }
        clock.sleep_ms(interval).await;
        waited = waited.saturating_add(interval);
    }
}
