use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

/// Deploy contract templates to the Nexus testnet through an EIP-1193 wallet.
#[derive(Debug, Parser)]
#[command(name = "nexus-deployer", version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Target network: `nexus-testnet` or `local`.
    #[arg(long, global = true, env = "NEXUS_DEPLOYER_NETWORK")]
    pub network: Option<String>,

    /// JSON-RPC endpoint that signs for its unlocked accounts (anvil, hardhat node).
    /// Without one the simulated wallet is used.
    #[arg(long, global = true, env = "NEXUS_DEPLOYER_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Hardhat `artifacts/` directory with compiled template bytecode.
    #[arg(long, global = true, env = "NEXUS_DEPLOYER_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the contract templates.
    Templates {
        /// Also print each template's Solidity source.
        #[arg(long)]
        source: bool,
    },
    /// Connect the wallet and switch it to the target network.
    Connect,
    /// Estimate gas for a deployment without sending it.
    Estimate(TemplateArgs),
    /// Deploy one template.
    Deploy {
        #[command(flatten)]
        template: TemplateArgs,
        #[command(flatten)]
        gas: GasArgs,
    },
    /// Deploy SimpleStorage, SimpleToken and SimpleNFT with their default arguments.
    DeployAll,
}

#[derive(Debug, Clone, Args)]
pub struct TemplateArgs {
    /// Template id, e.g. `simple-storage`.
    #[arg(long, short)]
    pub template: String,

    /// Constructor argument, in parameter order. Trailing parameters left out take their defaults.
    #[arg(long = "arg", short = 'a', value_name = "VALUE")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct GasArgs {
    /// Gas limit; overrides the estimate.
    #[arg(long)]
    pub gas_limit: Option<String>,

    /// Gas price in gwei; overrides the estimate.
    #[arg(long, value_name = "GWEI")]
    pub gas_price_gwei: Option<String>,

    /// Send without estimating first and let the wallet choose gas.
    #[arg(long)]
    pub skip_estimate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deploy_with_overrides() {
        let cli = Cli::try_parse_from([
            "nexus-deployer",
            "deploy",
            "--template",
            "simple-token",
            "--arg",
            "MyToken",
            "--arg",
            "MTK",
            "--gas-limit",
            "900000",
            "--gas-price-gwei",
            "1.5",
            "--network",
            "local",
        ])
        .expect("valid command line");
        assert_eq!(cli.network.as_deref(), Some("local"));
        let Command::Deploy { template, gas } = cli.command else {
            panic!("expected deploy");
        };
        assert_eq!(template.template, "simple-token");
        assert_eq!(template.args, vec!["MyToken", "MTK"]);
        assert_eq!(gas.gas_limit.as_deref(), Some("900000"));
        assert_eq!(gas.gas_price_gwei.as_deref(), Some("1.5"));
        assert!(!gas.skip_estimate);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
