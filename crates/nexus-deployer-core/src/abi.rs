//! Constructor argument coercion and creation-data encoding.
//!
//! Coercion is all-or-nothing: every field is checked and every failure is
//! reported, and nothing is encoded unless all of them pass.

use std::fmt;

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, Bytes, U256};
use thiserror::Error;

use crate::domain::{ContractParameter, ContractTemplate, GasOverrides, ParamType};
use crate::ports::PortError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct FieldError {
    pub index: usize,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn for_field(&self, name: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Coerces one form value. A blank value falls back to the parameter default.
pub fn coerce_value(param: &ContractParameter, raw: &str) -> Result<DynSolValue, String> {
    let trimmed = raw.trim();
    let value = if trimmed.is_empty() {
        param.default_value.as_deref().unwrap_or("").trim()
    } else {
        trimmed
    };
    if value.is_empty() {
        return if param.required {
            Err(format!("{} is required", param.name))
        } else {
            empty_value(param.kind)
        };
    }

    match param.kind {
        ParamType::Uint(bits) => parse_uint(value, bits)
            .map(|v| DynSolValue::Uint(v, bits as usize))
            .map_err(|e| format!("{} {e}", param.name)),
        ParamType::String => {
            if let Some(max) = param.max_len {
                if value.chars().count() > max {
                    return Err(format!("{} must be less than {max} characters", param.name));
                }
            }
            Ok(DynSolValue::String(value.to_owned()))
        }
        ParamType::Address => parse_address(value)
            .map(DynSolValue::Address)
            .map_err(|e| format!("Invalid address for {}: {e}", param.name)),
        ParamType::AddressList => {
            let mut out = Vec::new();
            for (pos, entry) in value.split(',').map(str::trim).enumerate() {
                let addr = parse_address(entry).map_err(|e| {
                    format!("Invalid address #{} for {}: {e}", pos + 1, param.name)
                })?;
                out.push(DynSolValue::Address(addr));
            }
            Ok(DynSolValue::Array(out))
        }
    }
}

fn empty_value(kind: ParamType) -> Result<DynSolValue, String> {
    Ok(match kind {
        ParamType::Uint(bits) => DynSolValue::Uint(U256::ZERO, bits as usize),
        ParamType::String => DynSolValue::String(String::new()),
        ParamType::Address => DynSolValue::Address(Address::ZERO),
        ParamType::AddressList => DynSolValue::Array(Vec::new()),
    })
}

fn parse_uint(value: &str, bits: u16) -> Result<U256, String> {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err("must be a positive number".to_owned());
    }
    let parsed = U256::from_str_radix(value, 10).map_err(|_| format!("exceeds uint{bits}"))?;
    if bits < 256 && parsed.bit_len() > bits as usize {
        return Err(format!("exceeds uint{bits}"));
    }
    Ok(parsed)
}

/// `0x` + 40 hex digits. Mixed-case input must carry a valid EIP-55 checksum.
pub fn parse_address(raw: &str) -> Result<Address, String> {
    let hex = raw
        .strip_prefix("0x")
        .ok_or_else(|| "missing 0x prefix".to_owned())?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err("expected 40 hex characters".to_owned());
    }
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    if has_upper && has_lower {
        Address::parse_checksummed(raw, None).map_err(|_| "bad checksum".to_owned())
    } else {
        raw.parse::<Address>().map_err(|e| e.to_string())
    }
}

/// Checks every field; fails with all field errors at once.
pub fn coerce_args(
    params: &[ContractParameter],
    inputs: &[String],
) -> Result<Vec<DynSolValue>, ValidationErrors> {
    if params.len() != inputs.len() {
        return Err(ValidationErrors(vec![FieldError {
            index: inputs.len(),
            name: "arguments".to_owned(),
            message: format!(
                "argument count mismatch: expected {}, got {}",
                params.len(),
                inputs.len()
            ),
        }]));
    }

    let mut values = Vec::with_capacity(params.len());
    let mut errors = Vec::new();
    for (index, (param, raw)) in params.iter().zip(inputs).enumerate() {
        match coerce_value(param, raw) {
            Ok(v) => values.push(v),
            Err(message) => errors.push(FieldError {
                index,
                name: param.name.clone(),
                message,
            }),
        }
    }
    if errors.is_empty() {
        Ok(values)
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Creation bytecode followed by the ABI-encoded constructor arguments.
pub fn encode_deploy_data(
    template: &ContractTemplate,
    args: &[DynSolValue],
) -> Result<Bytes, PortError> {
    let bytecode = template
        .bytecode
        .as_ref()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| {
            PortError::Validation(format!("template '{}' has no bytecode", template.id))
        })?;

    let encoded_args = match &template.abi.constructor {
        Some(ctor) => ctor
            .abi_encode_input(args)
            .map_err(|e| PortError::Validation(format!("abi encoding failed: {e}")))?,
        None if args.is_empty() => Vec::new(),
        None => {
            return Err(PortError::Validation(format!(
                "template '{}' takes no constructor arguments",
                template.id
            )))
        }
    };

    let mut data = Vec::with_capacity(bytecode.len() + encoded_args.len());
    data.extend_from_slice(bytecode);
    data.extend_from_slice(&encoded_args);
    Ok(Bytes::from(data))
}

/// Parses the optional gas-limit and gas-price (gwei) fields. Blank means auto.
pub fn parse_gas_overrides(
    gas_limit: &str,
    gas_price_gwei: &str,
) -> Result<GasOverrides, ValidationErrors> {
    let mut errors = Vec::new();
    let mut overrides = GasOverrides::default();

    let limit = gas_limit.trim();
    if !limit.is_empty() {
        match limit.parse::<u64>() {
            Ok(v) if v > 0 => overrides.gas_limit = Some(v),
            _ => errors.push(FieldError {
                index: 0,
                name: "gasLimit".to_owned(),
                message: "Gas limit must be a positive integer".to_owned(),
            }),
        }
    }

    let price = gas_price_gwei.trim();
    if !price.is_empty() {
        match parse_units(price, "gwei") {
            Ok(units) if !units.is_negative() => overrides.gas_price = Some(units.get_absolute()),
            _ => errors.push(FieldError {
                index: 1,
                name: "gasPrice".to_owned(),
                message: "Gas price must be a non-negative number of gwei".to_owned(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(overrides)
    } else {
        Err(ValidationErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, kind: &str) -> ContractParameter {
        ContractParameter {
            name: name.to_owned(),
            kind: kind.parse().expect("param type"),
            description: String::new(),
            required: true,
            default_value: None,
            max_len: None,
        }
    }

    #[test]
    fn uint8_rejects_overflow() {
        let p = param("decimals", "uint8");
        assert!(coerce_value(&p, "255").is_ok());
        let err = coerce_value(&p, "256").expect_err("overflow");
        assert!(err.contains("exceeds uint8"));
    }

    #[test]
    fn address_checksum_is_enforced_for_mixed_case() {
        assert!(parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_ok());
        assert!(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_ok());
        assert!(parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD").is_err());
        assert!(parse_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
    }

    #[test]
    fn address_list_rejects_blank_entry() {
        let p = param("owners", "address[]");
        let err = coerce_value(
            &p,
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed, ,0x000000000000000000000000000000000000dead",
        )
        .expect_err("blank entry");
        assert!(err.contains("#2"));
    }

    #[test]
    fn gas_overrides_parse_gwei() {
        let o = parse_gas_overrides("500000", "1.5").expect("overrides");
        assert_eq!(o.gas_limit, Some(500_000));
        assert_eq!(o.gas_price, Some(U256::from(1_500_000_000u64)));
        assert_eq!(parse_gas_overrides("", "").expect("auto"), GasOverrides::default());
        assert_eq!(parse_gas_overrides("abc", "-1").expect_err("bad").len(), 2);
    }
}
