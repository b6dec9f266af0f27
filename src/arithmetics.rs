//! Convenience functions for arithmetics
use std::collections::HashMap;

use crate::{error::CryptoError, keys::PublicKey, BigInt, LIMBS};
use crypto_bigint::{
    modular::runtime_mod::{DynResidue, DynResidueParams},
    rand_core::OsRng,
    Encoding, NonZero, RandomMod,
};
use serde::{Deserialize, Serialize};

/// Lift an integer into Montgomery form under the given (odd) modulus
pub fn residue(value: &BigInt, modulus: &BigInt) -> DynResidue<LIMBS> {
    DynResidue::new(value, DynResidueParams::new(modulus))
}

/// base ** exp (mod modulus). Only the significant bits of the exponent are walked, so this is
/// variable time in the exponent, which is fine for the public exponents used here.
pub fn pow(base: &BigInt, exp: &BigInt, modulus: &BigInt) -> BigInt {
    let bits = exp.bits();
    if bits == 0 {
        return BigInt::ONE;
    }
    residue(base, modulus).pow_bounded_exp(exp, bits).retrieve()
}

/// a * b (mod modulus)
pub fn mul(a: &BigInt, b: &BigInt, modulus: &BigInt) -> BigInt {
    residue(a, modulus).mul(&residue(b, modulus)).retrieve()
}

/// The multiplicative inverse (mod modulus), if there is one
pub fn invert(value: &BigInt, modulus: &BigInt) -> Result<BigInt, CryptoError> {
    let (inverse, invertible) = residue(value, modulus).invert();
    if invertible.into() {
        return Ok(inverse.retrieve());
    }
    Err(CryptoError::NotInvertible)
}

/// Sample a random element from the multiplicative group Z/n
pub fn sample_invertible(modulus: &BigInt) -> BigInt {
    let bound = NonZero::new(*modulus).unwrap();
    loop {
        let val = BigInt::random_mod(&mut OsRng, &bound);
        if val != BigInt::ZERO && invert(&val, modulus).is_ok() {
            return val;
        }
    }
}

/// An encrypted value: an invertible element of Z/n whose residue class is the plaintext. Only
/// the value itself is known, never its decomposition.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct OpaqueResidue {
    val: BigInt,
}

impl OpaqueResidue {
    pub fn new(val: BigInt) -> Self {
        Self { val }
    }

    pub fn retrieve(&self) -> &BigInt {
        &self.val
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.val.to_be_bytes()
    }

    /// Multiplying ciphertexts adds their residue classes
    pub fn mul(&self, other: &Self, ambience: &PublicKey) -> Self {
        Self::new(mul(&self.val, &other.val, ambience.get_n()))
    }

    /// The inverse ciphertext, whose residue class is the negated plaintext
    pub fn invert(&self, ambience: &PublicKey) -> Result<Self, CryptoError> {
        invert(&self.val, ambience.get_n()).map(Self::new)
    }
}

/// A clear residue contains the value and its decomposition into the residue class and witness:
/// val = (y ** class) * (witness ** r)
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ClearResidue {
    val: OpaqueResidue,

    /// The residue class that this value belongs to, unique up to (mod r)
    class: u32,

    /// The r-th root of val * (y ** -class); an invertible integer under (mod n)
    witness: BigInt,
}

impl ClearResidue {
    /// Construct a higher residue from its decomposition
    pub fn compose(
        class: u32,
        witness: BigInt,
        ambience: &PublicKey,
    ) -> Result<Self, CryptoError> {
        let n = ambience.get_n();
        let z = pow(&witness, ambience.get_r(), n); // z is (x ** r)
        let val = mul(ambience.encrypt_trivial(class)?.retrieve(), &z, n);
        Ok(Self {
            val: OpaqueResidue::new(val),
            class,
            witness,
        })
    }

    /// Generate a random member of the given residue class, including its decomposition
    pub fn random(class: u32, ambience: &PublicKey) -> Result<Self, CryptoError> {
        let witness = sample_invertible(ambience.get_n());
        Self::compose(class, witness, ambience)
    }

    /// Return a reference to the element itself
    pub fn get_val(&self) -> &OpaqueResidue {
        &self.val
    }

    /// Return the residue class
    pub fn get_class(&self) -> u32 {
        self.class
    }

    /// Return a reference to the witness
    pub fn get_witness(&self) -> &BigInt {
        &self.witness
    }

    /// Drop the decomposition
    pub fn clone_val(&self) -> OpaqueResidue {
        self.val
    }
}

/// Baby-step giant-step discrete log of target with respect to a base of small order.
/// If no discrete log below the order can be found, return None.
pub fn discrete_log(
    base: &BigInt,
    target: &BigInt,
    order: &BigInt,
    modulus: &BigInt,
) -> Option<u32> {
    if order.bits() > 32 {
        return None;
    }
    let order = u64::from(order_to_u32(order)?);
    let step = ((order as f64).sqrt().ceil() as u64).max(1);

    // baby steps: base ** j for j in [0, step)
    let mut table: HashMap<[u8; 32], u64> = HashMap::with_capacity(step as usize);
    let mut current = BigInt::ONE;
    for j in 0..step {
        table.entry(current.to_be_bytes()).or_insert(j);
        current = mul(&current, base, modulus);
    }

    // giant steps: target * (base ** -step) ** i
    let giant = invert(&pow(base, &BigInt::from_u64(step), modulus), modulus).ok()?;
    let mut gamma = *target;
    for i in 0..step {
        if let Some(j) = table.get(&gamma.to_be_bytes()) {
            let exp = i * step + j;
            if exp < order {
                return u32::try_from(exp).ok();
            }
        }
        gamma = mul(&gamma, &giant, modulus);
    }
    None
}

fn order_to_u32(value: &BigInt) -> Option<u32> {
    let bytes = value.to_be_bytes();
    let (high, low) = bytes.split_at(bytes.len() - 4);
    if high.iter().any(|byte| *byte != 0) {
        return None;
    }
    Some(u32::from_be_bytes(low.try_into().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;
    const RINGSIZE: usize = 12;
    const MODSIZE: usize = 48;

    /// Test the r-th residue check by checking that the residue class RC[0] passes while
    /// all other classes fail
    #[test]
    fn test_rth_residue() {
        let keypair = KeyPair::keygen(RINGSIZE, MODSIZE).unwrap();
        // 1 is always an r-th residue
        assert!(keypair.is_rth_residue(&OpaqueResidue::new(BigInt::ONE)));
        let zero = ClearResidue::random(0, keypair.get_pk()).unwrap();
        assert!(keypair.is_rth_residue(zero.get_val()));

        // y^e for 1 <= e < r is never an r-th residue
        for e in 1..50u32 {
            let nonresidue = keypair.get_pk().encrypt(e).unwrap();
            assert!(!keypair.is_rth_residue(&nonresidue));
        }
    }

    /// Multiplying ciphertexts adds plaintexts
    #[test]
    fn test_homomorphic_addition() {
        let keypair = KeyPair::keygen(RINGSIZE, MODSIZE).unwrap();
        let pk = keypair.get_pk();
        let mut acc = pk.encrypt_trivial(0).unwrap();
        for m in [1u32, 0, 1, 1, 3] {
            acc = acc.mul(&pk.encrypt(m).unwrap(), pk);
        }
        assert_eq!(keypair.decrypt(&acc).unwrap(), 6);
    }

    #[test]
    fn test_compose_matches_encryption_class() {
        let keypair = KeyPair::keygen(RINGSIZE, MODSIZE).unwrap();
        let clear = ClearResidue::random(3, keypair.get_pk()).unwrap();
        assert_eq!(keypair.decrypt(clear.get_val()).unwrap(), 3);
        let again =
            ClearResidue::compose(3, *clear.get_witness(), keypair.get_pk()).unwrap();
        assert_eq!(again, clear);
    }

    #[test]
    fn test_discrete_log_small_group() {
        // 2 has order 11 modulo 23
        let modulus = BigInt::from_u8(23);
        let base = BigInt::from_u8(2);
        let order = BigInt::from_u8(11);
        for exp in 0..11u32 {
            let target = pow(&base, &BigInt::from_u32(exp), &modulus);
            assert_eq!(discrete_log(&base, &target, &order, &modulus), Some(exp));
        }
        // 5 is not a power of 2 modulo 23
        assert_eq!(
            discrete_log(&base, &BigInt::from_u8(5), &order, &modulus),
            None
        );
    }
}
