mod common;

use nexus_deployer_core::acquisition::select_provider;
use nexus_deployer_core::domain::{Injected, InjectedProvider, ProviderFlags};
use nexus_deployer_core::{acquire_provider, AcquirePolicy, WalletBrand};

use common::{coinbase, metamask, LateSurface, TestClock};

fn injected(siblings: Vec<(&'static str, ProviderFlags)>) -> Injected<&'static str> {
    Injected {
        root: InjectedProvider {
            provider: "root",
            flags: ProviderFlags::default(),
        },
        siblings: siblings
            .into_iter()
            .map(|(provider, flags)| InjectedProvider { provider, flags })
            .collect(),
    }
}

#[test]
fn metamask_sibling_wins_regardless_of_position() {
    let first = select_provider(injected(vec![("b", metamask()), ("a", coinbase())]));
    let second = select_provider(injected(vec![("a", coinbase()), ("b", metamask())]));
    assert_eq!(first.provider, "b");
    assert_eq!(second.provider, "b");
    assert_eq!(second.brand, WalletBrand::MetaMask);
}

#[test]
fn first_sibling_without_metamask_then_root() {
    let chosen = select_provider(injected(vec![("a", coinbase()), ("c", ProviderFlags::default())]));
    assert_eq!(chosen.provider, "a");
    assert_eq!(chosen.brand.name(), "Coinbase Wallet");

    let root = select_provider(injected(Vec::new()));
    assert_eq!(root.provider, "root");
    assert_eq!(root.brand.to_string(), "Unknown Wallet");
}

#[tokio::test]
async fn late_injection_is_picked_up_by_polling() {
    let mut surface = LateSurface::new(Some(5));
    surface.siblings = vec![("a", coinbase()), ("b", metamask())];
    let clock = TestClock::default();

    let acquired = acquire_provider(&surface, &clock, AcquirePolicy::default())
        .await
        .expect("provider after late injection");
    assert_eq!(acquired.provider, "b");
    assert_eq!(surface.probes(), 6);
    assert_eq!(clock.elapsed_ms(), 500);
}

#[tokio::test]
async fn absent_provider_resolves_to_none_after_timeout() {
    let surface = LateSurface::new(None);
    let clock = TestClock::default();

    let acquired = acquire_provider(&surface, &clock, AcquirePolicy::default()).await;
    assert!(acquired.is_none());
    assert_eq!(clock.elapsed_ms(), 3_000);
    assert_eq!(surface.probes(), 31);
}
