//! nexus-deployer: deploy contract templates to the Nexus testnet.

#[cfg(not(target_arch = "wasm32"))]
mod app;
#[cfg(not(target_arch = "wasm32"))]
mod cli;
#[cfg(not(target_arch = "wasm32"))]
mod report;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> eyre::Result<()> {
    use clap::Parser;
    use nexus_deployer_adapters::{network_by_name, DeployerConfig};

    use crate::cli::{Cli, Command};

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = DeployerConfig::from_env();
    if let Some(name) = &cli.network {
        config.network =
            network_by_name(name).ok_or_else(|| eyre::eyre!("unknown network '{name}'"))?;
    }
    if cli.rpc_url.is_some() {
        config.eip1193_proxy_url = cli.rpc_url.clone();
    }
    if cli.artifacts.is_some() {
        config.artifacts_dir = cli.artifacts.clone();
    }

    tracing::info!(network = config.network.name, "Starting nexus-deployer");
    let app = app::App::new(config, cli.json)?;
    match &cli.command {
        Command::Templates { source } => app.list_templates(*source),
        Command::Connect => app.show_connection().await,
        Command::Estimate(args) => app.estimate(args).await,
        Command::Deploy { template, gas } => app.deploy(template, gas).await,
        Command::DeployAll => app.deploy_all().await,
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    tracing_wasm::set_as_global_default();
    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = web::run().await {
            tracing::error!("{e:#}");
        }
    });
}
