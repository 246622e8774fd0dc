pub mod oracle;
pub mod pools;
pub mod postgres;
pub mod swap;

pub use oracle::{HttpPriceOracle, PriceQuoter};
pub use pools::{CachedPoolResolver, PoolResolver};
pub use postgres::PostgresStore;
pub use swap::{DexClient, DryRunSwapExecutor, SwapExecutor, TxResult};
