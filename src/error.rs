//! Error types for every layer of the survey
use thiserror::Error;

use crate::{address::Address, fhe::Handle};

/// Failures of the underlying residue arithmetic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("arithmetic overflow while {0}")]
    Overflow(&'static str),

    #[error("value is not invertible modulo n")]
    NotInvertible,

    #[error("plaintext {0} is not below the ring modulus r")]
    PlaintextOutOfRange(u32),

    #[error("ciphertext has no discrete log below r")]
    NoDiscreteLog,

    #[error("key generation failed: {0}")]
    KeyGeneration(&'static str),
}

/// Failures while producing or checking a membership proof
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("statement is not in any of the allowed residue classes")]
    StatementOutsideClasses,

    #[error("confidence must be between 1 and {max}, got {got}")]
    InvalidConfidence { got: usize, max: usize },

    #[error("proof has {got} capsules, {expected} are required")]
    CapsuleCount { expected: usize, got: usize },

    #[error("proof has {commitments} commitments but {responses} responses")]
    LengthMismatch { commitments: usize, responses: usize },

    #[error("response {index} does not match its commitment")]
    BadResponse { index: usize },

    #[error("malformed proof encoding: {0}")]
    Encoding(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Failures of the homomorphic coprocessor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("no ciphertext is stored under handle {0}")]
    UnknownHandle(Handle),

    #[error("expected {expected} input handles, got {got}")]
    HandleCountMismatch { expected: usize, got: usize },

    #[error("invalid input proof: {0}")]
    InvalidInputProof(String),

    #[error("ciphertext store lock was poisoned")]
    StorePoisoned,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<ProofError> for FheError {
    fn from(err: ProofError) -> Self {
        FheError::InvalidInputProof(err.to_string())
    }
}

/// Failures surfaced by the ballot ledger
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("address has already submitted its responses")]
    AlreadyParticipated,

    #[error("question {0} does not exist")]
    InvalidQuestion(u64),

    #[error("chain {chain_id} has no confidential protocol deployment")]
    ProtocolUnsupported { chain_id: u64 },

    #[error(transparent)]
    Fhe(#[from] FheError),
}

/// Failures while building an encrypted input on the client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("answer {value} is outside the accepted range 0..{range}")]
    ValueOutOfRange { value: u32, range: u32 },

    #[error("expected {expected} encrypted values, got {got}")]
    WrongArity { expected: usize, got: usize },

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Failures of the decryption relayer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayerError {
    #[error("handle {0} is not publicly decryptable")]
    NotPubliclyDecryptable(Handle),

    #[error("{account} is not allowed to decrypt handle {handle}")]
    NotAllowed { handle: Handle, account: Address },

    #[error("authorization duration must be between 1 and {max} days, got {got}")]
    InvalidDuration { got: u64, max: u64 },

    #[error("authorization is not valid at timestamp {now}")]
    OutsideWindow { now: u64 },

    #[error("request is signed by a key that does not control {user}")]
    SignerMismatch { user: Address },

    #[error("request signature does not verify")]
    BadSignature,

    #[error("decryption request names no handles")]
    EmptyRequest,

    #[error(transparent)]
    Fhe(#[from] FheError),
}

/// Failures while loading configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has unparseable value {value:?}")]
    Unparseable { var: &'static str, value: String },

    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfBounds {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("ring of {ring_bits} bits and modulus of {modulus_bits} bits do not fit in 256 bits")]
    ParametersTooLarge { ring_bits: usize, modulus_bits: usize },
}
