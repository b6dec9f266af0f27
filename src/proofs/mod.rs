//! Proofs that respondents act in accordance with the protocol: every submitted ciphertext
//! encrypts an admissible answer and was produced for a specific ledger and respondent.

pub mod ballot; // prove that a ciphertext lies in one of a few residue classes
pub mod input; // bundle one ballot proof per submitted ciphertext

pub use ballot::{classes_below, BallotProof, MAX_CONFIDENCE};
pub use input::{input_context, InputProof};
