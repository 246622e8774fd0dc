pub mod wallet;

pub use wallet::{SecretKeyMaterial, Sender, Wallet, SEED_LEN};
