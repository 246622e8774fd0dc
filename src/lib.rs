pub mod adapters;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod signing;
pub mod store;

pub use adapters::{
    CachedPoolResolver, DexClient, DryRunSwapExecutor, HttpPriceOracle, PoolResolver,
    PostgresStore, PriceQuoter, SwapExecutor, TxResult,
};
pub use config::AppConfig;
pub use domain::{Asset, LimitOrder, Pool, Quote, TokenAmount, User};
pub use engine::{CycleReport, Decision, ExecutionEngine, Scheduler, SwapKind, SwapPlan};
pub use error::{Result, TondealError};
pub use signing::{SecretKeyMaterial, Sender, Wallet};
pub use store::{DeleteOutcome, MemoryStore, OrderStore, ReadOnlyStore};
