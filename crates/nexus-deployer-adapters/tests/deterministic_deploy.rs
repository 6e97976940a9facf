mod common;

use alloy::primitives::{Address, U256};

use nexus_deployer_adapters::{ConfiguredSurface, Eip1193Adapter, SystemClockAdapter};
use nexus_deployer_core::{
    acquire_provider, AcquirePolicy, DeployError, DeployPhase, Deployer, DeploymentPolicy,
    GasOverrides, TemplateRegistry, WalletBrand, WalletSession, NEXUS_TESTNET,
};

use common::{owner_address, TestClock};

#[tokio::test]
async fn simulated_wallet_deploys_simple_storage_on_nexus() {
    let surface = ConfiguredSurface::new(Eip1193Adapter::deterministic());
    let acquired = acquire_provider(&surface, &TestClock::default(), AcquirePolicy::default())
        .await
        .expect("deterministic runtime is always injected");
    assert_eq!(acquired.brand, WalletBrand::Unknown);

    // The simulated wallet starts on mainnet and has never seen Nexus.
    let mut session = WalletSession::new(acquired.provider.clone(), NEXUS_TESTNET);
    let wallet = session.connect().await.expect("connect").clone();
    assert!(wallet.is_connected);
    assert_eq!(wallet.address, Some(owner_address()));
    assert_eq!(wallet.chain_id, Some(3940));
    assert_eq!(wallet.network, Some(NEXUS_TESTNET));
    assert!(session.last_error().is_none());
    assert!(session.is_subscribed());

    let registry = TemplateRegistry::builtin();
    let template = registry.get("simple-storage").expect("simple storage");
    let mut deployer = Deployer::new(acquired.provider, TestClock::default(), NEXUS_TESTNET);
    deployer
        .validate(template, &["42".to_owned()])
        .expect("valid input");

    let estimate = deployer.estimate_gas(&wallet).await.expect("estimate");
    assert!(estimate.gas_limit > 53_000);
    assert_eq!(estimate.gas_price, U256::from(1_000_000_000u64));
    assert_eq!(deployer.phase(), DeployPhase::Ready);

    let result = deployer
        .submit(&wallet, GasOverrides::default())
        .await
        .expect("deploy");
    assert!(result.success);
    assert_eq!(result.contract_address, Some(owner_address().create(0)));
    assert_eq!(result.gas_used, Some(estimate.gas_limit));
    assert_eq!(deployer.phase(), DeployPhase::Succeeded);
    assert_eq!(deployer.history().len(), 1);
    let url = NEXUS_TESTNET
        .address_url(owner_address().create(0))
        .expect("explorer url");
    assert!(url.starts_with("https://testnet3.explorer.nexus.xyz/address/0x"));

    session.refresh_balance().await.expect("balance");
    let balance = session.state().balance_wei.expect("balance wei");
    assert!(balance < U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64)));
}

#[tokio::test]
async fn second_deployment_gets_next_create_address() {
    let adapter = Eip1193Adapter::deterministic();
    let mut session = WalletSession::new(adapter.clone(), NEXUS_TESTNET);
    let wallet = session.connect().await.expect("connect").clone();

    let registry = TemplateRegistry::builtin();
    let template = registry.get("simple-storage").expect("simple storage");
    let mut deployer = Deployer::with_policy(
        adapter,
        SystemClockAdapter,
        NEXUS_TESTNET,
        DeploymentPolicy {
            receipt_poll_interval_ms: 10,
            ..DeploymentPolicy::default()
        },
    );

    let mut addresses = Vec::new();
    for value in ["1", "2"] {
        deployer
            .validate(template, &[value.to_owned()])
            .expect("valid input");
        let result = deployer
            .submit(&wallet, GasOverrides::default())
            .await
            .expect("deploy");
        addresses.extend(result.contract_address);
        deployer.reset().expect("reset");
    }
    assert_eq!(
        addresses,
        vec![owner_address().create(0), owner_address().create(1)]
    );
    let history = deployer.history().entries();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].address, owner_address().create(1));
}

#[tokio::test]
async fn explicit_gas_limit_below_intrinsic_is_a_submission_error() {
    let adapter = Eip1193Adapter::deterministic();
    let mut session = WalletSession::new(adapter.clone(), NEXUS_TESTNET);
    let wallet = session.connect().await.expect("connect").clone();

    let registry = TemplateRegistry::builtin();
    let template = registry.get("simple-storage").expect("simple storage");
    let mut deployer = Deployer::new(adapter, TestClock::default(), NEXUS_TESTNET);
    deployer
        .validate(template, &["7".to_owned()])
        .expect("valid input");

    let err = deployer
        .submit(
            &wallet,
            GasOverrides {
                gas_limit: Some(21_000),
                gas_price: None,
            },
        )
        .await
        .expect_err("gas too low");
    match err {
        DeployError::Submission(message) => assert!(message.contains("intrinsic gas too low")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(deployer.phase(), DeployPhase::Failed);
    assert!(deployer.history().is_empty());
}

#[tokio::test]
async fn chain_change_after_connect_blocks_submission() {
    let adapter = Eip1193Adapter::deterministic();
    let mut session = WalletSession::new(adapter.clone(), NEXUS_TESTNET);
    session.connect().await.expect("connect");

    adapter.debug_inject_chain_changed(1).expect("inject chain");
    assert_eq!(session.process_events().await, 1);
    let wallet = session.state().clone();
    assert_eq!(wallet.chain_id, Some(1));
    assert_eq!(wallet.network, None);

    let registry = TemplateRegistry::builtin();
    let template = registry.get("simple-storage").expect("simple storage");
    let mut deployer = Deployer::new(adapter, TestClock::default(), NEXUS_TESTNET);
    deployer
        .validate(template, &["42".to_owned()])
        .expect("valid input");
    assert!(!deployer.can_submit(&wallet));
    let err = deployer
        .submit(&wallet, GasOverrides::default())
        .await
        .expect_err("wrong network");
    assert_eq!(
        err,
        DeployError::WrongNetwork {
            network: "Nexus Testnet"
        }
    );
    assert_eq!(deployer.phase(), DeployPhase::Ready);
}

#[tokio::test]
async fn drained_wallet_is_refused_before_sending() {
    let adapter = Eip1193Adapter::deterministic();
    let poor: Address = owner_address();
    adapter
        .debug_set_balance(poor, U256::from(1_000u64))
        .expect("set balance");
    let mut session = WalletSession::new(adapter.clone(), NEXUS_TESTNET);
    let wallet = session.connect().await.expect("connect").clone();

    let registry = TemplateRegistry::builtin();
    let template = registry.get("simple-storage").expect("simple storage");
    let mut deployer = Deployer::new(adapter, TestClock::default(), NEXUS_TESTNET);
    deployer
        .validate(template, &["42".to_owned()])
        .expect("valid input");
    deployer.estimate_gas(&wallet).await.expect("estimate");

    let err = deployer
        .submit(&wallet, GasOverrides::default())
        .await
        .expect_err("insufficient funds");
    assert!(matches!(err, DeployError::InsufficientFunds { symbol: "NXS", .. }));
    assert_eq!(deployer.phase(), DeployPhase::Ready);
}

#[tokio::test]
async fn token_deploys_with_leading_arguments_only() {
    let adapter = Eip1193Adapter::deterministic();
    let mut session = WalletSession::new(adapter.clone(), NEXUS_TESTNET);
    let wallet = session.connect().await.expect("connect").clone();

    let mut registry = TemplateRegistry::builtin();
    registry.attach_artifact(
        "SimpleToken",
        "0x6080604052348015600e575f80fd5b50".parse().expect("bytecode"),
        None,
    );
    let template = registry.get("simple-token").expect("simple token");
    let mut deployer = Deployer::new(adapter, TestClock::default(), NEXUS_TESTNET);
    let args = template.fill_inputs(&["Nexus Token".to_owned(), "NXT".to_owned()]);
    deployer.validate(template, &args).expect("defaults fill decimals and supply");

    let result = deployer
        .submit(&wallet, GasOverrides::default())
        .await
        .expect("deploy");
    assert_eq!(result.contract_address, Some(owner_address().create(0)));
    assert_eq!(
        deployer.history().latest().map(|c| c.template_id.as_str()),
        Some("simple-token")
    );
}
