//! Opaque references to ciphertexts held by the coprocessor
use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::{address::Address, arithmetics::OpaqueResidue};

/// A 32-byte reference to a ciphertext. Handles are public; the ciphertext behind one never
/// leaves the coprocessor except through the decryption path.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle([u8; 32]);

impl Handle {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The handle a client-supplied ciphertext is registered under. Binding the contract, the
    /// user and the position means the same ciphertext submitted elsewhere gets another handle.
    pub fn for_input(
        ciphertext: &OpaqueResidue,
        contract: &Address,
        user: &Address,
        index: usize,
    ) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(b"input");
        hasher.update(ciphertext.to_be_bytes());
        hasher.update(contract.as_bytes());
        hasher.update(user.as_bytes());
        hasher.update((index as u64).to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// The handle of a homomorphic result
    pub fn for_result(op: &str, operands: &[&Handle], sequence: u64) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(op.as_bytes());
        for operand in operands {
            hasher.update(operand.as_bytes());
        }
        hasher.update(sequence.to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// Trivial encryptions of the same constant always share one handle
    pub fn for_constant(value: u32) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(b"trivial");
        hasher.update(value.to_be_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", &hex::encode(self.0)[..8])
    }
}

/// An encrypted 32-bit unsigned integer. There is deliberately no way to read the value: it can
/// only be combined through a [`super::Homomorphic`] backend or decrypted through the relayer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Euint32(Handle);

impl Euint32 {
    pub fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> &Handle {
        &self.0
    }
}

/// An encrypted boolean, the result of an encrypted comparison
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ebool(Handle);

impl Ebool {
    pub fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> &Handle {
        &self.0
    }
}
