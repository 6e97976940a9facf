//! Command implementations shared by the native CLI.

use alloy::primitives::utils::format_ether;
use eyre::{bail, eyre, Result, WrapErr};

use nexus_deployer_adapters::{
    attach_artifacts, ConfiguredSurface, DeployerConfig, Eip1193Adapter, RuntimeKind,
    SystemClockAdapter,
};
use nexus_deployer_core::abi::parse_gas_overrides;
use nexus_deployer_core::{
    acquire_provider, ContractTemplate, DeployError, Deployer, GasEstimate,
    TemplateRegistry, WalletSession,
};

use crate::cli::{GasArgs, TemplateArgs};
use crate::report;

/// Templates and constructor arguments used by `deploy-all`.
const DEPLOY_ALL: &[(&str, &[&str])] = &[
    ("simple-storage", &["42"]),
    ("simple-token", &["MyToken", "MTK", "18", "1000000"]),
    ("simple-nft", &["MyNFT", "MNFT"]),
];

type Session = WalletSession<Eip1193Adapter>;
type NexusDeployer = Deployer<Eip1193Adapter, SystemClockAdapter>;

pub struct App {
    config: DeployerConfig,
    registry: TemplateRegistry,
    json: bool,
}

impl App {
    pub fn new(config: DeployerConfig, json: bool) -> Result<Self> {
        let mut registry = TemplateRegistry::builtin();
        if let Some(dir) = &config.artifacts_dir {
            let attached = attach_artifacts(&mut registry, dir)
                .wrap_err_with(|| format!("loading artifacts from {}", dir.display()))?;
            if attached.is_empty() {
                tracing::warn!(dir = %dir.display(), "no template artifacts found");
            }
        }
        Ok(Self {
            config,
            registry,
            json,
        })
    }

    pub fn list_templates(&self, with_source: bool) -> Result<()> {
        if self.json {
            let listing: Vec<_> = self.registry.iter().map(report::template_json).collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
            return Ok(());
        }
        for template in self.registry.iter() {
            report::print_template(template, with_source);
        }
        Ok(())
    }

    pub async fn connect(&self) -> Result<Session> {
        let adapter = Eip1193Adapter::with_config(self.config.clone());
        match adapter.runtime() {
            RuntimeKind::Deterministic => {
                tracing::warn!("no RPC url configured, using the simulated wallet")
            }
            RuntimeKind::Disabled => {
                bail!("production profile requires NEXUS_DEPLOYER_RPC_URL")
            }
            RuntimeKind::Proxy | RuntimeKind::Browser => {}
        }

        let surface = ConfiguredSurface::new(adapter);
        let acquired = acquire_provider(&surface, &SystemClockAdapter, self.config.acquire_policy())
            .await
            .ok_or_else(|| eyre!(nexus_deployer_core::WalletError::ProviderMissing))?;
        tracing::info!(brand = %acquired.brand, "wallet provider found");

        let mut session = WalletSession::new(acquired.provider, self.config.network);
        session.connect().await?;
        if let Some(err) = session.last_error() {
            tracing::warn!("{err}");
        }
        Ok(session)
    }

    pub async fn show_connection(&self) -> Result<()> {
        let session = self.connect().await?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(session.state())?);
        } else {
            report::print_wallet(session.state(), session.network());
        }
        Ok(())
    }

    fn template(&self, id: &str) -> Result<&ContractTemplate> {
        self.registry.get(id).ok_or_else(|| {
            let known: Vec<_> = self.registry.iter().map(|t| t.id.as_str()).collect();
            eyre!("unknown template '{id}' (known: {})", known.join(", "))
        })
    }

    fn deployer(&self, session: &Session) -> NexusDeployer {
        Deployer::with_policy(
            session.provider().clone(),
            SystemClockAdapter,
            self.config.network,
            self.config.deployment_policy(),
        )
    }

    pub async fn estimate(&self, args: &TemplateArgs) -> Result<()> {
        let template = self.template(&args.template)?;
        let session = self.connect().await?;
        let mut deployer = self.deployer(&session);
        prepare(&mut deployer, template, &args.args)?;

        let estimate = deployer.estimate_gas(session.state()).await?;
        self.print_estimate(&estimate)
    }

    pub async fn deploy(&self, args: &TemplateArgs, gas: &GasArgs) -> Result<()> {
        let template = self.template(&args.template)?;
        let overrides = parse_gas_overrides(
            gas.gas_limit.as_deref().unwrap_or_default(),
            gas.gas_price_gwei.as_deref().unwrap_or_default(),
        )
        .map_err(|e| eyre!("invalid gas settings: {e}"))?;

        let session = self.connect().await?;
        let mut deployer = self.deployer(&session);
        prepare(&mut deployer, template, &args.args)?;

        if !gas.skip_estimate {
            match deployer.estimate_gas(session.state()).await {
                Ok(estimate) => self.print_estimate(&estimate)?,
                // The wallet picks gas when the estimate is unavailable.
                Err(e) => tracing::warn!("{e}"),
            }
        }

        let outcome = deployer.submit(session.state(), overrides).await;
        self.print_result(&deployer, template)?;
        outcome?;
        Ok(())
    }

    /// Deploys the three standard templates in order, skipping any without
    /// bytecode, and stops at the first failure.
    pub async fn deploy_all(&self) -> Result<()> {
        let session = self.connect().await?;
        let wallet = session.state();
        if let (Some(address), Some(balance)) = (wallet.address, wallet.balance_wei) {
            tracing::info!(
                %address,
                balance = %format_ether(balance),
                symbol = self.config.network.symbol,
                "deploying contracts"
            );
        }

        let mut deployer = self.deployer(&session);
        let mut skipped = Vec::new();
        for (id, inputs) in DEPLOY_ALL {
            let template = self.template(id)?;
            if !template.is_deployable() {
                tracing::warn!(template = %id, "skipping template without bytecode");
                skipped.push(template.artifact_name.as_str());
                continue;
            }
            let inputs: Vec<String> = inputs.iter().map(|s| (*s).to_owned()).collect();
            prepare(&mut deployer, template, &inputs)?;
            if let Err(e) = deployer.estimate_gas(session.state()).await {
                tracing::warn!("{e}");
            }
            let outcome = deployer.submit(session.state(), Default::default()).await;
            self.print_result(&deployer, template)?;
            outcome?;
            deployer.reset()?;
        }

        if !self.json {
            report::print_summary(deployer.history(), &self.config.network, &skipped);
        }
        Ok(())
    }

    fn print_estimate(&self, estimate: &GasEstimate) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(estimate)?);
        } else {
            report::print_estimate(estimate, &self.config.network);
        }
        Ok(())
    }

    fn print_result(&self, deployer: &NexusDeployer, template: &ContractTemplate) -> Result<()> {
        let Some(result) = deployer.result() else {
            return Ok(());
        };
        if self.json {
            println!("{}", serde_json::to_string_pretty(result)?);
        } else {
            report::print_result(result, &template.artifact_name, &self.config.network);
        }
        Ok(())
    }
}

fn prepare(deployer: &mut NexusDeployer, template: &ContractTemplate, args: &[String]) -> Result<()> {
    match deployer.validate(template, &template.fill_inputs(args)) {
        Ok(_) => Ok(()),
        Err(DeployError::Validation(errors)) => {
            for field in &errors.0 {
                tracing::error!(parameter = %field.name, "{}", field.message);
            }
            Err(DeployError::Validation(errors).into())
        }
        Err(e) => Err(e.into()),
    }
}
