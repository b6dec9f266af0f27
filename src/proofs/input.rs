//! The input proof that travels next to a batch of encrypted values. It carries the ciphertexts
//! themselves, so the verifier can recompute every handle, and one ballot proof per ciphertext
//! bound to the ledger, the respondent and the value's position in the batch.
use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::{address::Address, arithmetics::OpaqueResidue, error::ProofError};

use super::ballot::BallotProof;

/// Upper bound on an encoded proof; anything larger is rejected before decoding
pub const MAX_PROOF_BYTES: u64 = 4 * 1024 * 1024;

const CONTEXT_DOMAIN: &[u8] = b"confidential-survey/input/v1";

/// The bytes every ballot proof in an input is bound to
pub fn input_context(contract: &Address, user: &Address, index: usize) -> Vec<u8> {
    let mut context = Vec::with_capacity(CONTEXT_DOMAIN.len() + 48);
    context.extend_from_slice(CONTEXT_DOMAIN);
    context.extend_from_slice(contract.as_bytes());
    context.extend_from_slice(user.as_bytes());
    context.extend_from_slice(&(index as u64).to_be_bytes());
    context
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct InputProof {
    ciphertexts: Vec<OpaqueResidue>,
    proofs: Vec<BallotProof>,
}

impl InputProof {
    pub fn new(ciphertexts: Vec<OpaqueResidue>, proofs: Vec<BallotProof>) -> Self {
        Self {
            ciphertexts,
            proofs,
        }
    }

    pub fn get_ciphertexts(&self) -> &[OpaqueResidue] {
        &self.ciphertexts
    }

    pub fn get_proofs(&self) -> &[BallotProof] {
        &self.proofs
    }

    fn codec() -> impl Options {
        bincode::DefaultOptions::new()
            .with_limit(MAX_PROOF_BYTES)
            .reject_trailing_bytes()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProofError> {
        Self::codec()
            .serialize(self)
            .map_err(|err| ProofError::Encoding(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofError> {
        Self::codec()
            .deserialize(bytes)
            .map_err(|err| ProofError::Encoding(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_depends_on_every_field() {
        let contract = Address::derive(b"ledger");
        let alice = Address::derive(b"alice");
        let bob = Address::derive(b"bob");
        let base = input_context(&contract, &alice, 0);
        assert_ne!(base, input_context(&contract, &bob, 0));
        assert_ne!(base, input_context(&contract, &alice, 1));
        assert_ne!(base, input_context(&bob, &alice, 0));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(
            InputProof::from_bytes(&[0xff; 7]),
            Err(ProofError::Encoding(_))
        ));
    }
}
