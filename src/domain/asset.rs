use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, TondealError};

/// Prefix markers used by the pool registry for non-native tokens
const JETTON_PREFIX: &str = "jetton:";
const NATIVE_SYMBOL: &str = "TON";

/// A fungible asset: either the chain's native coin or a jetton contract.
///
/// Pool metadata stores jettons with a `jetton:` prefix; the prefix is
/// stripped here so the rest of the engine only ever sees bare addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Asset {
    Native,
    Jetton(String),
}

impl Asset {
    pub fn jetton(address: impl Into<String>) -> Self {
        Self::Jetton(address.into())
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// Bare on-chain contract address, if this is a jetton
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Native => None,
            Self::Jetton(addr) => Some(addr.as_str()),
        }
    }

    /// Registry representation, with the non-native prefix marker restored
    pub fn to_registry_string(&self) -> String {
        match self {
            Self::Native => NATIVE_SYMBOL.to_string(),
            Self::Jetton(addr) => format!("{JETTON_PREFIX}{addr}"),
        }
    }
}

impl FromStr for Asset {
    type Err = TondealError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TondealError::Validation("empty asset identifier".to_string()));
        }

        if raw.eq_ignore_ascii_case(NATIVE_SYMBOL) {
            return Ok(Self::Native);
        }

        let address = raw.strip_prefix(JETTON_PREFIX).unwrap_or(raw);
        if address.is_empty() {
            return Err(TondealError::Validation(format!(
                "jetton identifier has no address: '{raw}'"
            )));
        }

        Ok(Self::Jetton(address.to_string()))
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => write!(f, "{NATIVE_SYMBOL}"),
            Self::Jetton(addr) => write!(f, "{addr}"),
        }
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_registry_string()
    }
}

impl TryFrom<String> for Asset {
    type Error = TondealError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_native_symbol() {
        let asset: Asset = "TON".parse().unwrap();
        assert!(asset.is_native());
        assert_eq!(asset.address(), None);
    }

    #[test]
    fn strips_jetton_prefix() {
        let asset: Asset = "jetton:EQAbc123".parse().unwrap();
        assert_eq!(asset, Asset::jetton("EQAbc123"));
        assert_eq!(asset.address(), Some("EQAbc123"));
    }

    #[test]
    fn bare_address_is_a_jetton() {
        let asset: Asset = "EQAbc123".parse().unwrap();
        assert_eq!(asset.address(), Some("EQAbc123"));
    }

    #[test]
    fn registry_round_trip_keeps_prefix() {
        let asset: Asset = "jetton:EQAbc123".parse().unwrap();
        assert_eq!(asset.to_registry_string(), "jetton:EQAbc123");
        assert_eq!(Asset::Native.to_registry_string(), "TON");
    }

    #[test]
    fn rejects_empty_identifiers() {
        assert!("".parse::<Asset>().is_err());
        assert!("jetton:".parse::<Asset>().is_err());
    }
}
