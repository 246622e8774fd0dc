use serde::{Deserialize, Serialize};

use super::Asset;
use crate::error::{Result, TondealError};

/// Metadata for a tradable pair: constituent assets and per-asset decimal
/// precision. Read-only to the engine; resolved fresh (or from a short-TTL
/// cache) per evaluation, because registry contents can change between
/// cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub caption: String,
    pub assets: [Asset; 2],
    pub decimals: [u32; 2],
}

impl Pool {
    pub fn new(caption: impl Into<String>, assets: [Asset; 2], decimals: [u32; 2]) -> Self {
        Self {
            caption: caption.into(),
            assets,
            decimals,
        }
    }

    /// Parse registry rows that store assets as prefixed strings
    pub fn from_registry(
        caption: impl Into<String>,
        assets: [&str; 2],
        decimals: [u32; 2],
    ) -> Result<Self> {
        let caption = caption.into();
        let parse = |raw: &str| -> Result<Asset> {
            raw.parse().map_err(|e| {
                TondealError::Validation(format!("pool '{caption}' has a bad asset: {e}"))
            })
        };
        Ok(Self {
            assets: [parse(assets[0])?, parse(assets[1])?],
            decimals,
            caption,
        })
    }
}
