//! A key-holding coprocessor that evaluates the survey's encrypted arithmetic over higher residue
//! ciphertexts.
//!
//! Addition is native to the scheme: multiplying two ciphertexts adds their residue classes.
//! Equality and selection are not, so the coprocessor answers them with its secret key. An
//! equality test decides whether `a * b^-1` is an r-th residue and stores the outcome as a fresh
//! encryption of 0 or 1; a selection re-randomizes the chosen branch, so the result cannot be
//! linked to either operand. Callers only ever see handles.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        RwLock,
    },
};

use crate::{
    arithmetics::OpaqueResidue,
    config::Config,
    error::{CryptoError, FheError},
    keys::KeyPair,
    proofs::{classes_below, input_context, InputProof},
};

use super::{
    Decryptor, Ebool, Euint32, Handle, Homomorphic, InputContext, InputVerifier, PublicParams,
};

/// Encrypted answers are option indices, and no question has more than four options
pub const INPUT_RANGE: u32 = 4;

#[derive(Debug)]
pub struct Coprocessor {
    keypair: KeyPair,
    params: PublicParams,
    store: RwLock<HashMap<Handle, OpaqueResidue>>,
    counter: AtomicU64,
}

impl Coprocessor {
    pub fn new(keypair: KeyPair, confidence: usize) -> Self {
        let params = PublicParams {
            public_key: *keypair.get_pk(),
            confidence,
            input_range: INPUT_RANGE,
        };
        Self {
            keypair,
            params,
            store: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Generate a fresh key pair sized by the configuration
    pub fn generate(config: &Config) -> Result<Self, CryptoError> {
        let keypair = KeyPair::keygen(config.ring_bits, config.modulus_bits)?;
        tracing::info!(
            ring_bits = config.ring_bits,
            modulus_bits = config.modulus_bits,
            confidence = config.proof_confidence,
            "coprocessor keys generated"
        );
        Ok(Self::new(keypair, config.proof_confidence))
    }

    pub fn public_params(&self) -> &PublicParams {
        &self.params
    }

    /// Number of ciphertexts currently held
    pub fn stored(&self) -> Result<usize, FheError> {
        Ok(self.store.read().map_err(|_| FheError::StorePoisoned)?.len())
    }

    fn load(&self, handle: &Handle) -> Result<OpaqueResidue, FheError> {
        let store = self.store.read().map_err(|_| FheError::StorePoisoned)?;
        store
            .get(handle)
            .copied()
            .ok_or(FheError::UnknownHandle(*handle))
    }

    fn store(&self, handle: Handle, ciphertext: OpaqueResidue) -> Result<(), FheError> {
        let mut store = self.store.write().map_err(|_| FheError::StorePoisoned)?;
        store.insert(handle, ciphertext);
        Ok(())
    }

    fn next_handle(&self, op: &str, operands: &[&Handle]) -> Handle {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        Handle::for_result(op, operands, sequence)
    }

    fn encrypt_bit(&self, bit: bool) -> Result<OpaqueResidue, FheError> {
        Ok(self.params.public_key.encrypt(u32::from(bit))?)
    }
}

impl Homomorphic for Coprocessor {
    fn trivial_encrypt(&self, value: u32) -> Result<Euint32, FheError> {
        let handle = Handle::for_constant(value);
        if self.load(&handle).is_err() {
            let ciphertext = self.params.public_key.encrypt_trivial(value)?;
            self.store(handle, ciphertext)?;
        }
        Ok(Euint32::from_handle(handle))
    }

    fn add(&self, lhs: &Euint32, rhs: &Euint32) -> Result<Euint32, FheError> {
        let a = self.load(lhs.handle())?;
        let b = self.load(rhs.handle())?;
        let sum = a.mul(&b, &self.params.public_key);
        let handle = self.next_handle("add", &[lhs.handle(), rhs.handle()]);
        self.store(handle, sum)?;
        Ok(Euint32::from_handle(handle))
    }

    fn eq(&self, lhs: &Euint32, rhs: &Euint32) -> Result<Ebool, FheError> {
        let a = self.load(lhs.handle())?;
        let b = self.load(rhs.handle())?;
        let pk = &self.params.public_key;
        let difference = a.mul(&b.invert(pk)?, pk);
        let outcome = self.encrypt_bit(self.keypair.is_rth_residue(&difference))?;
        let handle = self.next_handle("eq", &[lhs.handle(), rhs.handle()]);
        self.store(handle, outcome)?;
        Ok(Ebool::from_handle(handle))
    }

    fn select(
        &self,
        condition: &Ebool,
        if_true: &Euint32,
        if_false: &Euint32,
    ) -> Result<Euint32, FheError> {
        let flag = self.load(condition.handle())?;
        let chosen = if self.keypair.decrypt(&flag)? != 0 {
            self.load(if_true.handle())?
        } else {
            self.load(if_false.handle())?
        };
        let result = self.params.public_key.rerandomize(&chosen);
        let handle = self.next_handle(
            "select",
            &[condition.handle(), if_true.handle(), if_false.handle()],
        );
        self.store(handle, result)?;
        Ok(Euint32::from_handle(handle))
    }

    fn release(&self, handle: &Handle) -> Result<(), FheError> {
        let mut store = self.store.write().map_err(|_| FheError::StorePoisoned)?;
        store.remove(handle);
        Ok(())
    }
}

impl InputVerifier for Coprocessor {
    fn verify_input(
        &self,
        handles: &[Handle],
        proof: &[u8],
        context: &InputContext,
    ) -> Result<Vec<Euint32>, FheError> {
        let input = InputProof::from_bytes(proof)?;
        let ciphertexts = input.get_ciphertexts();
        if ciphertexts.len() != handles.len() {
            return Err(FheError::HandleCountMismatch {
                expected: handles.len(),
                got: ciphertexts.len(),
            });
        }
        if input.get_proofs().len() != ciphertexts.len() {
            return Err(FheError::InvalidInputProof(format!(
                "{} ciphertexts but {} ballot proofs",
                ciphertexts.len(),
                input.get_proofs().len()
            )));
        }

        let classes = classes_below(self.params.input_range);
        let pk = &self.params.public_key;
        for (index, ((handle, ciphertext), ballot)) in handles
            .iter()
            .zip(ciphertexts)
            .zip(input.get_proofs())
            .enumerate()
        {
            if Handle::for_input(ciphertext, &context.contract, &context.user, index) != *handle {
                return Err(FheError::InvalidInputProof(format!(
                    "handle {index} is not bound to this contract and user"
                )));
            }
            let bound_to = input_context(&context.contract, &context.user, index);
            ballot.verify(ciphertext, &classes, &bound_to, self.params.confidence, pk)?;
        }

        let mut store = self.store.write().map_err(|_| FheError::StorePoisoned)?;
        for (handle, ciphertext) in handles.iter().zip(ciphertexts) {
            store.insert(*handle, *ciphertext);
        }
        tracing::debug!(
            count = handles.len(),
            user = %context.user,
            "input ciphertexts admitted"
        );
        Ok(handles.iter().copied().map(Euint32::from_handle).collect())
    }
}

impl Decryptor for Coprocessor {
    fn decrypt(&self, handle: &Handle) -> Result<u32, FheError> {
        let ciphertext = self.load(handle)?;
        Ok(self.keypair.decrypt(&ciphertext)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{address::Address, client::EncryptedInputBuilder};

    const RINGSIZE: usize = 12;
    const MODSIZE: usize = 48;
    const CONFIDENCE: usize = 16;

    fn coprocessor() -> Coprocessor {
        Coprocessor::new(KeyPair::keygen(RINGSIZE, MODSIZE).unwrap(), CONFIDENCE)
    }

    #[test]
    fn test_add_then_decrypt() {
        let cop = coprocessor();
        let two = cop.trivial_encrypt(2).unwrap();
        let three = cop.trivial_encrypt(3).unwrap();
        let sum = cop.add(&two, &three).unwrap();
        assert_eq!(cop.decrypt(sum.handle()).unwrap(), 5);
        assert_ne!(sum.handle(), two.handle());
    }

    #[test]
    fn test_trivial_constants_share_a_handle() {
        let cop = coprocessor();
        let a = cop.trivial_encrypt(1).unwrap();
        let b = cop.trivial_encrypt(1).unwrap();
        assert_eq!(a, b);
        assert_eq!(cop.stored().unwrap(), 1);
    }

    #[test]
    fn test_eq_and_select() {
        let cop = coprocessor();
        let one = cop.trivial_encrypt(1).unwrap();
        let zero = cop.trivial_encrypt(0).unwrap();
        let two = cop.trivial_encrypt(2).unwrap();
        let other_two = cop.add(&one, &one).unwrap();

        let same = cop.eq(&two, &other_two).unwrap();
        let different = cop.eq(&two, &one).unwrap();
        assert_eq!(cop.decrypt(same.handle()).unwrap(), 1);
        assert_eq!(cop.decrypt(different.handle()).unwrap(), 0);

        let picked = cop.select(&same, &one, &zero).unwrap();
        let skipped = cop.select(&different, &one, &zero).unwrap();
        assert_eq!(cop.decrypt(picked.handle()).unwrap(), 1);
        assert_eq!(cop.decrypt(skipped.handle()).unwrap(), 0);
    }

    #[test]
    fn test_unknown_handle() {
        let cop = coprocessor();
        let stray = Euint32::from_handle(Handle::new([7; 32]));
        let one = cop.trivial_encrypt(1).unwrap();
        assert_eq!(
            cop.add(&stray, &one),
            Err(FheError::UnknownHandle(*stray.handle()))
        );
    }

    #[test]
    fn test_release_drops_ciphertext() {
        let cop = coprocessor();
        let one = cop.trivial_encrypt(1).unwrap();
        let two = cop.add(&one, &one).unwrap();
        assert_eq!(cop.stored().unwrap(), 2);
        cop.release(two.handle()).unwrap();
        cop.release(two.handle()).unwrap();
        assert_eq!(cop.stored().unwrap(), 1);
        assert_eq!(
            cop.decrypt(two.handle()),
            Err(FheError::UnknownHandle(*two.handle()))
        );
    }

    #[test]
    fn test_verify_input_rejects_short_proofs() {
        let cop = coprocessor();
        let contract = Address::derive(b"ledger");
        let alice = Address::derive(b"alice");
        let short = PublicParams {
            confidence: 1,
            ..*cop.public_params()
        };
        let input = EncryptedInputBuilder::new(&short, contract, alice)
            .add32(2)
            .encrypt()
            .unwrap();
        let context = InputContext {
            contract,
            user: alice,
        };
        assert!(matches!(
            cop.verify_input(&input.handles, &input.input_proof, &context),
            Err(FheError::InvalidInputProof(_))
        ));
        assert!(cop.decrypt(&input.handles[0]).is_err());
    }

    #[test]
    fn test_verify_input_accepts_bound_inputs() {
        let cop = coprocessor();
        let contract = Address::derive(b"ledger");
        let alice = Address::derive(b"alice");
        let input = EncryptedInputBuilder::new(cop.public_params(), contract, alice)
            .add32(3)
            .add32(0)
            .encrypt()
            .unwrap();
        let context = InputContext {
            contract,
            user: alice,
        };
        let values = cop
            .verify_input(&input.handles, &input.input_proof, &context)
            .unwrap();
        assert_eq!(cop.decrypt(values[0].handle()).unwrap(), 3);
        assert_eq!(cop.decrypt(values[1].handle()).unwrap(), 0);
    }

    #[test]
    fn test_verify_input_rejects_other_user() {
        let cop = coprocessor();
        let contract = Address::derive(b"ledger");
        let alice = Address::derive(b"alice");
        let input = EncryptedInputBuilder::new(cop.public_params(), contract, alice)
            .add32(1)
            .encrypt()
            .unwrap();
        let context = InputContext {
            contract,
            user: Address::derive(b"bob"),
        };
        assert!(matches!(
            cop.verify_input(&input.handles, &input.input_proof, &context),
            Err(FheError::InvalidInputProof(_))
        ));
        assert!(cop.decrypt(&input.handles[0]).is_err());
    }

    #[test]
    fn test_verify_input_rejects_count_mismatch() {
        let cop = coprocessor();
        let contract = Address::derive(b"ledger");
        let alice = Address::derive(b"alice");
        let input = EncryptedInputBuilder::new(cop.public_params(), contract, alice)
            .add32(1)
            .add32(2)
            .encrypt()
            .unwrap();
        let context = InputContext {
            contract,
            user: alice,
        };
        assert_eq!(
            cop.verify_input(&input.handles[..1], &input.input_proof, &context),
            Err(FheError::HandleCountMismatch {
                expected: 1,
                got: 2
            })
        );
    }
}
