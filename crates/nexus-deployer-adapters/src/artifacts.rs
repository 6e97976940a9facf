//! Hardhat artifact loading.
//!
//! `npx hardhat compile` writes `artifacts/contracts/<File>.sol/<Name>.json`.
//! Each artifact whose `contractName` matches a template supplies that
//! template's bytecode and ABI.

use std::fs;
use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use serde::Deserialize;
use thiserror::Error;

use nexus_deployer_core::TemplateRegistry;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardhatArtifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

pub fn load_artifact(path: &Path) -> Result<HardhatArtifact, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// Walks `dir` and attaches every matching artifact. Returns the contract
/// names that were attached. Debug files and bytecode-less artifacts
/// (interfaces, abstract contracts) are skipped.
pub fn attach_artifacts(
    registry: &mut TemplateRegistry,
    dir: &Path,
) -> Result<Vec<String>, ArtifactError> {
    let mut files = Vec::new();
    collect_json(dir, &mut files)?;
    files.sort();

    let mut attached = Vec::new();
    for path in files {
        let artifact = match load_artifact(&path) {
            Ok(a) => a,
            Err(ArtifactError::Parse { path, source }) => {
                tracing::debug!(path = %path.display(), "skipping non-artifact json: {source}");
                continue;
            }
            Err(e) => return Err(e),
        };
        if artifact.bytecode.is_empty() {
            continue;
        }
        let name = artifact.contract_name.clone();
        if registry.attach_artifact(&name, artifact.bytecode, Some(artifact.abi)) {
            tracing::info!(contract = %name, path = %path.display(), "attached compiled artifact");
            attached.push(name);
        }
    }
    Ok(attached)
}

fn collect_json(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: dir.to_owned(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_json(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "json")
            && !path.to_string_lossy().ends_with(".dbg.json")
        {
            out.push(path);
        }
    }
    Ok(())
}
