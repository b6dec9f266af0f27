//! The confidential-computing capabilities the ledger is built on. The ledger only ever talks to
//! these traits; [`coprocessor::Coprocessor`] is the implementation backed by higher residue
//! encryption.
use serde::{Deserialize, Serialize};

use crate::{address::Address, error::FheError, keys::PublicKey};

pub mod coprocessor;
pub mod handle;

pub use coprocessor::Coprocessor;
pub use handle::{Ebool, Euint32, Handle};

/// Arithmetic over encrypted values. Every result is a new ciphertext with a new handle.
pub trait Homomorphic {
    /// Encrypt a public constant
    fn trivial_encrypt(&self, value: u32) -> Result<Euint32, FheError>;

    fn add(&self, lhs: &Euint32, rhs: &Euint32) -> Result<Euint32, FheError>;

    fn eq(&self, lhs: &Euint32, rhs: &Euint32) -> Result<Ebool, FheError>;

    /// `if condition { if_true } else { if_false }` without learning the condition
    fn select(
        &self,
        condition: &Ebool,
        if_true: &Euint32,
        if_false: &Euint32,
    ) -> Result<Euint32, FheError>;

    /// Forget a ciphertext that nobody will read again. Releasing an unknown handle is a no-op.
    /// Constants are shared between callers and must not be released.
    fn release(&self, handle: &Handle) -> Result<(), FheError>;
}

/// Who an encrypted input claims to come from and where it is being submitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub contract: Address,
    pub user: Address,
}

/// Admits client ciphertexts into the coprocessor
pub trait InputVerifier {
    /// Check the proof for the given handles and context, and return them as usable encrypted
    /// values. Any mismatch is an error and nothing is admitted.
    fn verify_input(
        &self,
        handles: &[Handle],
        proof: &[u8],
        context: &InputContext,
    ) -> Result<Vec<Euint32>, FheError>;
}

/// The key holder's side of decryption. Authorization is checked by the caller.
pub trait Decryptor {
    fn decrypt(&self, handle: &Handle) -> Result<u32, FheError>;
}

/// Everything a client needs to produce inputs the coprocessor accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParams {
    pub public_key: PublicKey,
    /// Number of capsules in each ballot proof
    pub confidence: usize,
    /// Inputs must encrypt a value in 0..input_range
    pub input_range: u32,
}
