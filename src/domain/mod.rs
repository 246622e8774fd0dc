pub mod amount;
pub mod asset;
pub mod order;
pub mod pool;
pub mod quote;
pub mod user;

pub use amount::{one_unit, TokenAmount, MAX_DECIMALS};
pub use asset::Asset;
pub use order::LimitOrder;
pub use pool::Pool;
pub use quote::Quote;
pub use user::User;
