//! Non-interactive proof that a ballot is in one of a few specified residue classes, for example
//! that an encrypted answer is one of the option indices 0, 1, 2 or 3.
//!
//! The statement of the proof is a single higher residue. The prover wants to convince the
//! verifier that the statement belongs to one of the specified residue classes.
//!
//! The commit is a list of "capsules", each containing one fresh element per allowed residue
//! class, though which element belongs to which class is obscured by shuffling.
//!
//! The challenge selects a subset of the capsules. For capsules in the subset, the prover reveals
//! the decomposition of every element; for capsules not selected, the prover shows that the
//! statement times some r-th residue equals one of the capsule's elements, i.e. that the statement
//! shares a residue class with that element.
//!
//! The challenge is derived by hashing the context together with the statement and the commitment
//! (Fiat-Shamir), so the proof only verifies for the context it was produced in.
use crate::{
    arithmetics::{self, ClearResidue, OpaqueResidue},
    error::ProofError,
    keys::PublicKey,
    BigInt,
};
use crypto_bigint::rand_core::OsRng;
use digest::Digest;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sha3::Sha3_256;

/// Each capsule halves a cheating prover's odds, and the challenge bits come from one SHA3-256
/// digest, so at most 256 capsules can be used
pub const MAX_CONFIDENCE: usize = 256;

/// The residue classes 0..range
pub fn classes_below(range: u32) -> Vec<u32> {
    (0..range).collect()
}

/// Proof that the ballot belongs to one of the pre-specified residue classes without revealing
/// which specific class
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct BallotProof {
    commitment: Vec<OpaqueCapsule>,
    response: Vec<Response>,
}

impl BallotProof {
    pub fn new(commitment: Vec<OpaqueCapsule>, response: Vec<Response>) -> Self {
        Self {
            commitment,
            response,
        }
    }

    pub fn get_commitment(&self) -> &[OpaqueCapsule] {
        &self.commitment
    }

    pub fn get_response(&self) -> &[Response] {
        &self.response
    }

    /// Produce a proof that the statement is in one of the specified residue classes
    pub fn from_statement(
        statement: &ClearResidue,
        classes: &[u32],
        context: &[u8],
        confidence: usize,
        pk: &PublicKey,
    ) -> Result<Self, ProofError> {
        if confidence == 0 || confidence > MAX_CONFIDENCE {
            return Err(ProofError::InvalidConfidence {
                got: confidence,
                max: MAX_CONFIDENCE,
            });
        }
        if !classes.contains(&statement.get_class()) {
            return Err(ProofError::StatementOutsideClasses);
        }

        let answers = (0..confidence)
            .map(|_| ClearCapsule::generate(classes, pk))
            .collect::<Result<Vec<ClearCapsule>, ProofError>>()?;
        let commitment = answers
            .iter()
            .map(|clear| clear.obscure())
            .collect::<Vec<OpaqueCapsule>>();
        let challenge =
            Self::generate_challenge::<Sha3_256>(context, statement.get_val(), &commitment);

        let response = answers
            .iter()
            .zip(challenge.iter())
            .map(|(capsule, open)| {
                if *open {
                    Ok(Response::OpenCapsule(capsule.open()))
                } else {
                    capsule.consume(statement, pk).map(Response::ConsumeCapsule)
                }
            })
            .collect::<Result<Vec<Response>, ProofError>>()?;

        Ok(Self::new(commitment, response))
    }

    /// Hash the context, the statement and every committed element into one challenge bit per
    /// capsule. A set bit asks the prover to open the capsule.
    fn generate_challenge<D: Digest>(
        context: &[u8],
        statement: &OpaqueResidue,
        commitment: &[OpaqueCapsule],
    ) -> Vec<bool> {
        let mut hasher = D::new();
        hasher.update(context);
        hasher.update(statement.to_be_bytes());
        for capsule in commitment {
            for residue in capsule.get_elements() {
                hasher.update(residue.to_be_bytes());
            }
        }
        let hash = hasher.finalize();

        (0..commitment.len())
            .map(|loc| {
                let mask = 0b1000_0000u8 >> (loc % 8);
                hash.get(loc / 8).map_or(false, |byte| byte & mask != 0)
            })
            .collect()
    }

    /// Verify the proof against a statement, the allowed classes and the context it claims to be
    /// bound to. The verifier, not the prover, decides how many capsules make a proof: with k
    /// capsules a forger succeeds with probability 2^-k.
    pub fn verify(
        &self,
        statement: &OpaqueResidue,
        classes: &[u32],
        context: &[u8],
        confidence: usize,
        pk: &PublicKey,
    ) -> Result<(), ProofError> {
        if confidence == 0 || confidence > MAX_CONFIDENCE {
            return Err(ProofError::InvalidConfidence {
                got: confidence,
                max: MAX_CONFIDENCE,
            });
        }
        if self.commitment.len() != self.response.len() {
            return Err(ProofError::LengthMismatch {
                commitments: self.commitment.len(),
                responses: self.response.len(),
            });
        }
        if self.commitment.len() != confidence {
            return Err(ProofError::CapsuleCount {
                expected: confidence,
                got: self.commitment.len(),
            });
        }
        if !is_unit(statement.retrieve(), pk) {
            return Err(ProofError::StatementOutsideClasses);
        }

        let challenge = Self::generate_challenge::<Sha3_256>(context, statement, &self.commitment);
        for (index, ((commitment, response), open)) in self
            .commitment
            .iter()
            .zip(self.response.iter())
            .zip(challenge.iter())
            .enumerate()
        {
            let valid = match response {
                Response::OpenCapsule(_) if !*open => false,
                Response::ConsumeCapsule(_) if *open => false,
                _ => Self::verify_response(statement, commitment, response, classes, pk),
            };
            if !valid {
                return Err(ProofError::BadResponse { index });
            }
        }
        Ok(())
    }

    /// Verify a single response. If the response is "open capsule", then recompose every element
    /// from its decomposition, check that it matches the commitment, and check that the classes
    /// are exactly the allowed ones. If the response is "consume capsule", then use the response
    /// to reconstruct an element from the statement and check that the capsule contains it.
    fn verify_response(
        statement: &OpaqueResidue,
        commitment: &OpaqueCapsule,
        response: &Response,
        classes: &[u32],
        pk: &PublicKey,
    ) -> bool {
        if commitment.get_elements().len() != classes.len() {
            return false;
        }
        match response {
            Response::ConsumeCapsule(root) => {
                if !is_unit(root, pk) {
                    return false;
                }
                let quotient = arithmetics::pow(root, pk.get_r(), pk.get_n());
                let reconstructed = statement.mul(&OpaqueResidue::new(quotient), pk);
                commitment
                    .get_elements()
                    .iter()
                    .any(|elem| *elem == reconstructed)
            }
            Response::OpenCapsule(opened) => {
                if opened.len() != classes.len() {
                    return false;
                }
                let mut revealed = opened.iter().map(|elem| elem.class).collect::<Vec<u32>>();
                let mut expected = classes.to_vec();
                revealed.sort_unstable();
                expected.sort_unstable();
                if revealed != expected {
                    return false;
                }
                commitment
                    .get_elements()
                    .iter()
                    .zip(opened.iter())
                    .all(|(commit_elem, open_elem)| {
                        if !is_unit(&open_elem.witness, pk) {
                            return false;
                        }
                        match ClearResidue::compose(open_elem.class, open_elem.witness, pk) {
                            Ok(recomposed) => recomposed.get_val() == commit_elem,
                            Err(_) => false,
                        }
                    })
            }
        }
    }
}

/// Zero or anything sharing a factor with n would let a forged response absorb the statement
fn is_unit(value: &BigInt, pk: &PublicKey) -> bool {
    *value != BigInt::ZERO && arithmetics::invert(value, pk.get_n()).is_ok()
}

/// Each closed capsule contains one random element from each of the specified residue
/// classes, but we don't know which one is which
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct OpaqueCapsule {
    elements: Vec<OpaqueResidue>,
}

impl OpaqueCapsule {
    pub fn new(elements: Vec<OpaqueResidue>) -> Self {
        Self { elements }
    }

    pub fn get_elements(&self) -> &[OpaqueResidue] {
        &self.elements
    }
}

/// The decomposition of one element of an opened capsule
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct OpenedElement {
    pub class: u32,
    pub witness: BigInt,
}

/// The prover's copy of a capsule, with every decomposition known
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ClearCapsule {
    elements: Vec<ClearResidue>,
}

impl ClearCapsule {
    pub fn new(elements: Vec<ClearResidue>) -> Self {
        Self { elements }
    }

    pub fn get_elements(&self) -> &[ClearResidue] {
        &self.elements
    }

    pub fn generate(classes: &[u32], pk: &PublicKey) -> Result<Self, ProofError> {
        let mut elements = classes
            .iter()
            .map(|class| ClearResidue::random(*class, pk))
            .collect::<Result<Vec<ClearResidue>, _>>()?;
        elements.shuffle(&mut OsRng);
        Ok(Self::new(elements))
    }

    pub fn obscure(&self) -> OpaqueCapsule {
        let elements = self
            .elements
            .iter()
            .map(|clear| clear.clone_val())
            .collect::<Vec<OpaqueResidue>>();
        OpaqueCapsule::new(elements)
    }

    pub fn open(&self) -> Vec<OpenedElement> {
        self.elements
            .iter()
            .map(|clear| OpenedElement {
                class: clear.get_class(),
                witness: *clear.get_witness(),
            })
            .collect()
    }

    /// If the capsule is not selected to be opened, it will be consumed alongside the
    /// statement to show that the statement has the same residue class as one of its
    /// elements.
    ///
    /// If two elements w, w' have the same residue class, then w' * w^(-1) is an r-th
    /// residue. The returned value is its r-th root.
    pub fn consume(&self, statement: &ClearResidue, pk: &PublicKey) -> Result<BigInt, ProofError> {
        let element = self
            .elements
            .iter()
            .find(|element| element.get_class() == statement.get_class())
            .ok_or(ProofError::StatementOutsideClasses)?;
        let inverse = arithmetics::invert(statement.get_witness(), pk.get_n())?;
        Ok(arithmetics::mul(element.get_witness(), &inverse, pk.get_n()))
    }
}

/// Depending on whether the capsule is chosen, you either "open the capsule"
/// and reveal which element belongs to which residue class, or "consume the capsule" and
/// show the r-th root of (capsule element / statement)
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub enum Response {
    OpenCapsule(Vec<OpenedElement>),
    ConsumeCapsule(BigInt),
}
