use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::TokenAmount;
use crate::error::{Result, TondealError};
use crate::signing::Sender;

/// Confirmed swap submission. Failure is carried in the `Result`, never in
/// this type, so a returned `TxResult` always means the chain accepted the
/// message.
#[derive(Debug, Clone)]
pub struct TxResult {
    pub tx_hash: String,
}

/// The three swap primitives, selected by which side of the pair is the
/// chain's native coin. Submission and signing mechanics live behind this
/// seam; the engine only decides which primitive fires and with what
/// arguments.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    async fn native_to_token(
        &self,
        sender: &Sender,
        to_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult>;

    async fn token_to_native(
        &self,
        sender: &Sender,
        wallet_address: &str,
        from_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult>;

    async fn token_to_token(
        &self,
        sender: &Sender,
        wallet_address: &str,
        from_address: &str,
        to_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult>;
}

/// DEX swap client submitting through the chain RPC gateway
pub struct DexClient {
    client: reqwest::Client,
    rpc_url: String,
}

#[derive(Serialize)]
struct SwapRequest<'a> {
    kind: &'a str,
    wallet: &'a str,
    from: Option<&'a str>,
    to: Option<&'a str>,
    amount: String,
    /// Seed material the gateway signs with. Carried only in the request
    /// body; the log context below never includes it.
    auth: String,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    tx_hash: String,
}

impl DexClient {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TondealError::Http)?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    async fn submit(&self, request: SwapRequest<'_>) -> Result<TxResult> {
        let context = format!(
            "{} {} -> {} amount {} wallet {}",
            request.kind,
            request.from.unwrap_or("TON"),
            request.to.unwrap_or("TON"),
            request.amount,
            request.wallet,
        );

        let url = format!("{}/swap", self.rpc_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TondealError::Timeout(format!("swap submission timed out: {context}"))
                } else {
                    TondealError::SwapSubmission(format!("{context}: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(TondealError::SwapSubmission(format!(
                "{context}: chain RPC returned {}",
                response.status()
            )));
        }

        let body: SwapResponse = response
            .json()
            .await
            .map_err(|e| TondealError::SwapSubmission(format!("{context}: bad response: {e}")))?;

        debug!(tx_hash = %body.tx_hash, "swap submitted");
        Ok(TxResult { tx_hash: body.tx_hash })
    }
}

#[async_trait]
impl SwapExecutor for DexClient {
    async fn native_to_token(
        &self,
        sender: &Sender,
        to_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult> {
        self.submit(SwapRequest {
            kind: "native_to_token",
            wallet: &sender.wallet_address,
            from: None,
            to: Some(to_address),
            amount: amount.raw().to_string(),
            auth: sender.seed().to_stored(),
        })
        .await
    }

    async fn token_to_native(
        &self,
        sender: &Sender,
        wallet_address: &str,
        from_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult> {
        self.submit(SwapRequest {
            kind: "token_to_native",
            wallet: wallet_address,
            from: Some(from_address),
            to: None,
            amount: amount.raw().to_string(),
            auth: sender.seed().to_stored(),
        })
        .await
    }

    async fn token_to_token(
        &self,
        sender: &Sender,
        wallet_address: &str,
        from_address: &str,
        to_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult> {
        self.submit(SwapRequest {
            kind: "token_to_token",
            wallet: wallet_address,
            from: Some(from_address),
            to: Some(to_address),
            amount: amount.raw().to_string(),
            auth: sender.seed().to_stored(),
        })
        .await
    }
}

/// No-op executor for dry runs: logs what would have been submitted and
/// returns a synthetic transaction hash.
#[derive(Default)]
pub struct DryRunSwapExecutor {
    counter: AtomicU64,
}

impl DryRunSwapExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn fake_tx(&self, kind: &str, wallet: &str, amount: &TokenAmount) -> TxResult {
        let seq = self.counter.fetch_add(1, Ordering::SeqCst);
        info!(kind, wallet, %amount, "dry run: swap not submitted");
        TxResult {
            tx_hash: format!("dry-run-{seq}"),
        }
    }
}

#[async_trait]
impl SwapExecutor for DryRunSwapExecutor {
    async fn native_to_token(
        &self,
        sender: &Sender,
        _to_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult> {
        Ok(self.fake_tx("native_to_token", &sender.wallet_address, &amount))
    }

    async fn token_to_native(
        &self,
        _sender: &Sender,
        wallet_address: &str,
        _from_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult> {
        Ok(self.fake_tx("token_to_native", wallet_address, &amount))
    }

    async fn token_to_token(
        &self,
        _sender: &Sender,
        wallet_address: &str,
        _from_address: &str,
        _to_address: &str,
        amount: TokenAmount,
    ) -> Result<TxResult> {
        Ok(self.fake_tx("token_to_token", wallet_address, &amount))
    }
}
