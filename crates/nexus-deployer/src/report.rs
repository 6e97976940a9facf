//! Human-readable output.

use serde_json::{json, Value};

use nexus_deployer_core::history::DeploymentHistory;
use nexus_deployer_core::{
    ContractTemplate, DeploymentResult, GasEstimate, NetworkConfig, WalletState,
};

pub fn template_json(template: &ContractTemplate) -> Value {
    json!({
        "id": template.id,
        "name": template.name,
        "description": template.description,
        "category": template.category,
        "deployable": template.is_deployable(),
        "parameters": template.parameters,
    })
}

pub fn print_template(template: &ContractTemplate, with_source: bool) {
    let status = if template.is_deployable() {
        "ready"
    } else {
        "needs compiled artifact"
    };
    println!("{} ({}) [{status}]", template.name, template.id);
    println!("  {}", template.description);
    for param in &template.parameters {
        let default = param
            .default_value
            .as_deref()
            .map(|d| format!(" = {d}"))
            .unwrap_or_default();
        println!("  - {}: {}{default}  {}", param.name, param.kind, param.description);
    }
    if with_source {
        println!();
        println!("{}", template.source_code);
    }
    println!();
}

pub fn print_wallet(state: &WalletState, target: &NetworkConfig) {
    if !state.is_connected {
        println!("Wallet not connected");
        return;
    }
    println!("Account:  {}", state.display_address());
    if let Some(balance) = &state.balance {
        println!("Balance:  {balance} {}", target.symbol);
    }
    match (state.network, state.chain_id) {
        (Some(network), _) => println!("Network:  {} ({})", network.name, network.chain_id),
        (None, Some(chain_id)) => {
            println!("Network:  chain {chain_id} (wrong network, expected {})", target.name)
        }
        (None, None) => println!("Network:  unknown"),
    }
}

pub fn print_estimate(estimate: &GasEstimate, network: &NetworkConfig) {
    println!("Gas limit:      {}", estimate.gas_limit);
    println!("Gas price:      {} gwei", estimate.gas_price_gwei());
    println!(
        "Estimated cost: {} {}",
        estimate.estimated_cost(),
        network.symbol
    );
}

pub fn print_result(result: &DeploymentResult, contract: &str, network: &NetworkConfig) {
    if result.success {
        if let Some(address) = result.contract_address {
            println!("{contract} deployed to: {address}");
            if let Some(url) = network.address_url(address) {
                println!("  {url}");
            }
        }
        if let Some(gas_used) = result.gas_used {
            println!("  gas used: {gas_used}");
        }
        if let Some(cost) = &result.deployment_cost {
            println!("  cost: {cost} {}", network.symbol);
        }
    } else {
        println!(
            "{contract} deployment failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(url) = result.transaction_hash.and_then(|h| network.tx_url(h)) {
        println!("  tx: {url}");
    }
}

pub fn print_summary(history: &DeploymentHistory, network: &NetworkConfig, skipped: &[&str]) {
    println!();
    println!("Deployment summary ({})", network.name);
    for entry in history.entries().iter().rev() {
        println!("  {:<14} {}", entry.name, entry.address);
    }
    for name in skipped {
        println!("  {name:<14} skipped (no bytecode)");
    }
}
