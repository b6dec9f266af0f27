//! The respondent's side: encrypt answers and prove they are well formed
use crate::{
    address::Address,
    arithmetics::ClearResidue,
    error::ClientError,
    fhe::{Handle, PublicParams},
    proofs::{classes_below, input_context, BallotProof, InputProof},
};

/// Collects cleartext values for one submission and encrypts them in one go, producing the handles
/// and the proof a ledger will accept from `user`
///
/// ```ignore
/// let input = EncryptedInputBuilder::new(&params, contract, alice)
///     .add32(0)
///     .add32(2)
///     .encrypt()?;
/// ```
#[derive(Debug, Clone)]
pub struct EncryptedInputBuilder {
    params: PublicParams,
    contract: Address,
    user: Address,
    values: Vec<u32>,
}

/// What a client sends along with its transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub handles: Vec<Handle>,
    pub input_proof: Vec<u8>,
}

impl EncryptedInput {
    /// The handles as a fixed-size array, for calls that take exactly N encrypted values
    pub fn handle_array<const N: usize>(&self) -> Result<[Handle; N], ClientError> {
        self.handles
            .as_slice()
            .try_into()
            .map_err(|_| ClientError::WrongArity {
                expected: N,
                got: self.handles.len(),
            })
    }
}

impl EncryptedInputBuilder {
    pub fn new(params: &PublicParams, contract: Address, user: Address) -> Self {
        Self {
            params: *params,
            contract,
            user,
            values: vec![],
        }
    }

    pub fn add32(mut self, value: u32) -> Self {
        self.values.push(value);
        self
    }

    pub fn encrypt(self) -> Result<EncryptedInput, ClientError> {
        let pk = &self.params.public_key;
        let classes = classes_below(self.params.input_range);
        let mut handles = Vec::with_capacity(self.values.len());
        let mut ciphertexts = Vec::with_capacity(self.values.len());
        let mut proofs = Vec::with_capacity(self.values.len());

        for (index, value) in self.values.iter().copied().enumerate() {
            if value >= self.params.input_range {
                return Err(ClientError::ValueOutOfRange {
                    value,
                    range: self.params.input_range,
                });
            }
            let statement = ClearResidue::random(value, pk)?;
            let context = input_context(&self.contract, &self.user, index);
            let proof = BallotProof::from_statement(
                &statement,
                &classes,
                &context,
                self.params.confidence,
                pk,
            )?;
            handles.push(Handle::for_input(
                statement.get_val(),
                &self.contract,
                &self.user,
                index,
            ));
            ciphertexts.push(statement.clone_val());
            proofs.push(proof);
        }

        let input_proof = InputProof::new(ciphertexts, proofs).to_bytes()?;
        tracing::debug!(
            values = handles.len(),
            proof_bytes = input_proof.len(),
            user = %self.user,
            "encrypted input prepared"
        );
        Ok(EncryptedInput {
            handles,
            input_proof,
        })
    }
}
