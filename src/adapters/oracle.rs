use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::{Asset, Quote};
use crate::error::{Result, TondealError};

/// Price oracle seam. `amount_base` is the smallest-unit quantity of the
/// wanted asset the quote is taken for (always one whole unit, see
/// [`crate::domain::Quote`]); the returned price is in held-asset smallest
/// units for that base.
///
/// Any failure here means "hold, retry next cycle"; callers must never read
/// a failed quote as a fulfilment.
#[async_trait]
pub trait PriceQuoter: Send + Sync {
    async fn get_quote(&self, amount_base: u128, from: &Asset, to: &Asset) -> Result<Quote>;
}

/// REST client for the price oracle
pub struct HttpPriceOracle {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    price: Decimal,
}

impl HttpPriceOracle {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TondealError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PriceQuoter for HttpPriceOracle {
    async fn get_quote(&self, amount_base: u128, from: &Asset, to: &Asset) -> Result<Quote> {
        let unavailable = |reason: String| TondealError::QuoteUnavailable {
            from: from.to_string(),
            to: to.to_string(),
            reason,
        };

        let url = format!("{}/quote", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("amount", amount_base.to_string()),
                ("from", from.to_registry_string()),
                ("to", to.to_registry_string()),
            ])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("oracle returned {}", response.status())));
        }

        let body: QuoteResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed oracle response: {e}")))?;

        if body.price <= Decimal::ZERO {
            return Err(unavailable(format!("non-positive price {}", body.price)));
        }

        debug!(%from, %to, amount_base, price = %body.price, "quote fetched");
        Ok(Quote::new(body.price))
    }
}
