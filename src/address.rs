//! Account addresses
use std::{fmt, str::FromStr};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// A 20-byte account identifier, shown as 0x-prefixed hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive an address from arbitrary seed material: the last 20 bytes of its SHA3-256 digest
    pub fn derive(seed: &[u8]) -> Self {
        let digest = Sha3_256::digest(seed);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }

    /// The account controlled by a signing key
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self::derive(key.as_bytes())
    }

    /// The address a deployer creates at a given nonce
    pub fn for_deployment(deployer: &Address, nonce: u64) -> Self {
        let mut seed = Vec::with_capacity(28);
        seed.extend_from_slice(deployer.as_bytes());
        seed.extend_from_slice(&nonce.to_be_bytes());
        Self::derive(&seed)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}
