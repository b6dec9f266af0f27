//! A confidential survey ledger over higher residue (Benaloh) encryption.
//!
//! Respondents submit one encrypted answer per question together with a proof that each
//! ciphertext is a well-formed answer bound to the respondent and the ledger. The ledger expands
//! every answer into encrypted per-option increments and accumulates them homomorphically, so no
//! individual answer is ever seen in the clear. Each question can be switched to public results,
//! after which anyone may ask the relayer to decrypt its tallies.
use crypto_bigint::U256;

/// Use the same big integer type everywhere
pub type BigInt = U256;
pub const LIMBS: usize = BigInt::LIMBS;

pub mod acl;
pub mod address;
pub mod arithmetics;
pub mod client;
pub mod config;
pub mod error;
pub mod fhe;
pub mod keys;
pub mod ledger;
pub mod proofs;
pub mod relayer;

pub use address::Address;
pub use error::{
    ClientError, ConfigError, CryptoError, FheError, LedgerError, ProofError, RelayerError,
};
