use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, TondealError};

/// Length of a stored key-pair seed (ed25519 secret key, 64 bytes)
pub const SEED_LEN: usize = 64;

/// Opaque signing seed as persisted at onboarding time.
///
/// Supports the legacy comma-separated byte format as well as base64.
/// Zeroized on drop and never printed; `Debug` is redacted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeyMaterial(Vec<u8>);

impl SecretKeyMaterial {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse the stored representation: either `"12,7,255,..."` or base64
    pub fn from_stored(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TondealError::Signing("empty key material".to_string()));
        }

        if raw.contains(',') {
            let bytes = raw
                .split(',')
                .map(|part| {
                    part.trim().parse::<u8>().map_err(|_| {
                        TondealError::Signing(format!("bad byte in key material: '{part}'"))
                    })
                })
                .collect::<Result<Vec<u8>>>()?;
            return Ok(Self(bytes));
        }

        BASE64
            .decode(raw)
            .map(Self)
            .map_err(|e| TondealError::Signing(format!("key material is not base64: {e}")))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Canonical persisted representation (base64)
    pub fn to_stored(&self) -> String {
        BASE64.encode(&self.0)
    }
}

impl std::fmt::Debug for SecretKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeyMaterial")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl Serialize for SecretKeyMaterial {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for SecretKeyMaterial {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_stored(&raw).map_err(serde::de::Error::custom)
    }
}

/// A user's reconstructed signing capability.
///
/// Actual key derivation and transaction signing live behind the chain RPC
/// layer; this type only vouches that the stored material had a valid shape
/// and pairs it with the wallet it belongs to.
#[derive(Debug, Clone)]
pub struct Wallet {
    address: String,
    seed: SecretKeyMaterial,
}

impl Wallet {
    /// Rebuild the signing capability from stored material. Fails when the
    /// material cannot possibly be a key-pair seed; the caller then skips the
    /// user's orders for this cycle.
    pub fn from_material(seed: SecretKeyMaterial, address: impl Into<String>) -> Result<Self> {
        if seed.len() != SEED_LEN {
            return Err(TondealError::Signing(format!(
                "key material has {} bytes, expected {SEED_LEN}",
                seed.len()
            )));
        }

        let address = address.into();
        if address.trim().is_empty() {
            return Err(TondealError::Signing("empty wallet address".to_string()));
        }

        debug!(wallet = %address, "signing capability reconstructed");
        Ok(Self { address, seed })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Capability handed to the swap executor for transaction submission
    pub fn sender(&self) -> Sender {
        Sender {
            wallet_address: self.address.clone(),
            seed: self.seed.clone(),
        }
    }
}

/// Transaction-authorizing capability consumed by the swap executor
#[derive(Debug, Clone)]
pub struct Sender {
    pub wallet_address: String,
    seed: SecretKeyMaterial,
}

impl Sender {
    pub fn seed(&self) -> &SecretKeyMaterial {
        &self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_string(len: usize) -> String {
        (0..len).map(|i| (i % 256).to_string()).collect::<Vec<_>>().join(",")
    }

    #[test]
    fn parses_comma_separated_material() {
        let material = SecretKeyMaterial::from_stored(&seed_string(SEED_LEN)).unwrap();
        assert_eq!(material.len(), SEED_LEN);
        assert_eq!(material.as_bytes()[1], 1);
    }

    #[test]
    fn parses_base64_material() {
        let encoded = BASE64.encode(vec![7u8; SEED_LEN]);
        let material = SecretKeyMaterial::from_stored(&encoded).unwrap();
        assert_eq!(material.len(), SEED_LEN);
    }

    #[test]
    fn rejects_garbage_material() {
        assert!(SecretKeyMaterial::from_stored("").is_err());
        assert!(SecretKeyMaterial::from_stored("1,2,foo").is_err());
        assert!(SecretKeyMaterial::from_stored("not base64 !!!").is_err());
    }

    #[test]
    fn wallet_requires_full_length_seed() {
        let short = SecretKeyMaterial::from_bytes(vec![0u8; 31]);
        assert!(Wallet::from_material(short, "EQWallet").is_err());

        let full = SecretKeyMaterial::from_bytes(vec![0u8; SEED_LEN]);
        let wallet = Wallet::from_material(full, "EQWallet").unwrap();
        assert_eq!(wallet.address(), "EQWallet");
        assert_eq!(wallet.sender().wallet_address, "EQWallet");
    }

    #[test]
    fn debug_output_is_redacted() {
        let material = SecretKeyMaterial::from_bytes(vec![42u8; SEED_LEN]);
        let debug = format!("{material:?}");
        assert!(!debug.contains("42"));
    }
}
