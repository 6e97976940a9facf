use std::fs;
use std::path::Path;

use serde_json::json;

use nexus_deployer_adapters::{attach_artifacts, ArtifactError};
use nexus_deployer_core::{DeployError, Deployer, TemplateRegistry, NEXUS_TESTNET};

mod common;
use common::TestClock;

const TOKEN_BYTECODE: &str = "0x6080604052348015600e575f80fd5b50";

fn write_json(path: &Path, value: serde_json::Value) {
    fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
    fs::write(path, serde_json::to_vec_pretty(&value).expect("encode")).expect("write artifact");
}

fn token_artifact() -> serde_json::Value {
    json!({
        "_format": "hh-sol-artifact-1",
        "contractName": "SimpleToken",
        "sourceName": "contracts/SimpleToken.sol",
        "abi": [{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                {"name": "name", "type": "string", "internalType": "string"},
                {"name": "symbol", "type": "string", "internalType": "string"},
                {"name": "decimals_", "type": "uint8", "internalType": "uint8"},
                {"name": "initialSupply", "type": "uint256", "internalType": "uint256"}
            ]
        }],
        "bytecode": TOKEN_BYTECODE,
        "deployedBytecode": "0x",
        "linkReferences": {},
        "deployedLinkReferences": {}
    })
}

#[test]
fn hardhat_artifacts_make_token_deployable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write_json(
        &root.join("contracts/SimpleToken.sol/SimpleToken.json"),
        token_artifact(),
    );
    write_json(
        &root.join("contracts/SimpleToken.sol/SimpleToken.dbg.json"),
        json!({ "_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/x.json" }),
    );
    write_json(
        &root.join("contracts/IToken.sol/IToken.json"),
        json!({ "contractName": "IToken", "abi": [], "bytecode": "0x" }),
    );
    write_json(&root.join("build-info/x.json"), json!({ "id": "x" }));

    let mut registry = TemplateRegistry::builtin();
    assert!(!registry.get("simple-token").expect("token").is_deployable());

    let attached = attach_artifacts(&mut registry, root).expect("attach");
    assert_eq!(attached, vec!["SimpleToken".to_owned()]);

    let token = registry.get("simple-token").expect("token");
    assert!(token.is_deployable());
    assert!(!registry.get("simple-nft").expect("nft").is_deployable());

    let mut deployer = Deployer::new(
        nexus_deployer_adapters::Eip1193Adapter::deterministic(),
        TestClock::default(),
        NEXUS_TESTNET,
    );
    let prepared = deployer
        .validate(token, &token.default_inputs())
        .expect("defaults are valid")
        .clone();
    assert_eq!(prepared.args.len(), 4);
    assert!(prepared.data.to_string().starts_with(TOKEN_BYTECODE));
    // bytecode plus head words and two dynamic string tails
    assert_eq!(prepared.data.len(), 16 + 32 * 4 + 64 * 2);
}

#[test]
fn templates_without_artifacts_stay_undeployable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = TemplateRegistry::builtin();
    let attached = attach_artifacts(&mut registry, dir.path()).expect("attach");
    assert!(attached.is_empty());

    let nft = registry.get("simple-nft").expect("nft");
    let mut deployer = Deployer::new(
        nexus_deployer_adapters::Eip1193Adapter::deterministic(),
        TestClock::default(),
        NEXUS_TESTNET,
    );
    let err = deployer
        .validate(nft, &nft.default_inputs())
        .expect_err("no bytecode");
    assert_eq!(err, DeployError::MissingBytecode("simple-nft".to_owned()));
}

#[test]
fn missing_artifacts_dir_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = TemplateRegistry::builtin();
    let err = attach_artifacts(&mut registry, &dir.path().join("nope")).expect_err("missing");
    assert!(matches!(err, ArtifactError::Io { .. }));
}
