//! The key pairs
use crate::{
    arithmetics::{self, OpaqueResidue},
    error::CryptoError,
    BigInt,
};
use crypto_bigint::{
    rand_core::OsRng, subtle::CtOption, CheckedAdd, CheckedMul, CheckedSub, NonZero, RandomMod,
};
use serde::{Deserialize, Serialize};

/// The public parameters (r, n, y). Ciphertexts are elements of (Z/n)* and plaintexts live in
/// the ring Z/r.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct PublicKey {
    r: BigInt,
    n: BigInt,
    y: BigInt,
}

impl PublicKey {
    /// Instantiate an instance with no check
    pub fn new(r: BigInt, n: BigInt, y: BigInt) -> Self {
        Self { r, n, y }
    }

    pub fn get_r(&self) -> &BigInt {
        &self.r
    }

    pub fn get_n(&self) -> &BigInt {
        &self.n
    }

    pub fn get_y(&self) -> &BigInt {
        &self.y
    }

    /// Return true iff the plaintext is an element of Z/r
    pub fn holds_plaintext(&self, value: u32) -> bool {
        BigInt::from_u32(value) < self.r
    }

    /// Return the multiplicative inverse of y
    pub fn invert_y(&self) -> Result<BigInt, CryptoError> {
        arithmetics::invert(&self.y, &self.n)
    }

    /// Encrypt with no randomness: y^m (mod n). Anyone can compute this, so it is only suitable for
    /// public constants.
    pub fn encrypt_trivial(&self, plaintext: u32) -> Result<OpaqueResidue, CryptoError> {
        if !self.holds_plaintext(plaintext) {
            return Err(CryptoError::PlaintextOutOfRange(plaintext));
        }
        let val = arithmetics::pow(&self.y, &BigInt::from_u32(plaintext), &self.n);
        Ok(OpaqueResidue::new(val))
    }

    /// Probabilistic encryption: y^m * x^r (mod n) with a fresh invertible x
    pub fn encrypt(&self, plaintext: u32) -> Result<OpaqueResidue, CryptoError> {
        let trivial = self.encrypt_trivial(plaintext)?;
        Ok(self.rerandomize(&trivial))
    }

    /// Multiply by a fresh r-th residue. The residue class, hence the plaintext, is unchanged.
    pub fn rerandomize(&self, ciphertext: &OpaqueResidue) -> OpaqueResidue {
        let x = arithmetics::sample_invertible(&self.n);
        let mask = arithmetics::pow(&x, &self.r, &self.n);
        ciphertext.mul(&OpaqueResidue::new(mask), self)
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct SecretKey {
    phi: BigInt,
}

impl SecretKey {
    /// Instantiate an instance with no check
    pub fn new(phi: BigInt) -> Self {
        Self { phi }
    }

    pub fn get_phi(&self) -> &BigInt {
        &self.phi
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct KeyPair {
    pk: PublicKey,
    sk: SecretKey,
}

impl KeyPair {
    pub fn new(pk: PublicKey, sk: SecretKey) -> Self {
        Self { pk, sk }
    }

    pub fn get_pk(&self) -> &PublicKey {
        &self.pk
    }

    pub fn get_sk(&self) -> &SecretKey {
        &self.sk
    }

    /// phi / r, the exponent that maps every r-th residue to 1
    fn phi_over_r(&self) -> BigInt {
        let (quotient, _) = self.sk.phi.div_rem(&nonzero(self.pk.r));
        quotient
    }

    /// Return true iff z is an r-th residue (mod n), i.e. its residue class is 0. Uses the fact
    /// that z^(phi/r) = 1 exactly when z = x^r for some x.
    pub fn is_rth_residue(&self, z: &OpaqueResidue) -> bool {
        arithmetics::pow(z.retrieve(), &self.phi_over_r(), &self.pk.n) == BigInt::ONE
    }

    /// Recover the residue class of a ciphertext. The class is the discrete log of
    /// c^(phi/r) with respect to y^(phi/r), which has order r.
    pub fn decrypt(&self, ciphertext: &OpaqueResidue) -> Result<u32, CryptoError> {
        let exponent = self.phi_over_r();
        let base = arithmetics::pow(&self.pk.y, &exponent, &self.pk.n);
        let target = arithmetics::pow(ciphertext.retrieve(), &exponent, &self.pk.n);
        arithmetics::discrete_log(&base, &target, &self.pk.r, &self.pk.n)
            .ok_or(CryptoError::NoDiscreteLog)
    }

    /// generate p according to the arithmetic sequence:
    /// p = r * r * x + b * r + 1
    fn generate_p(r: BigInt, xbound: BigInt, b: BigInt) -> Result<BigInt, CryptoError> {
        loop {
            let x = BigInt::random_mod(&mut OsRng, &nonzero(xbound));
            let rrx = checked(r.checked_mul(&r), "computing r^2")?;
            let rrx = checked(rrx.checked_mul(&x), "computing r^2 * x")?;
            let rb = checked(r.checked_mul(&b), "computing b * r")?;
            let p = checked(rrx.checked_add(&rb), "computing p")?;
            let p = checked(p.checked_add(&BigInt::ONE), "computing p")?;
            if crypto_primes::is_prime(&p) {
                return Ok(p);
            }
        }
    }

    /// Generate q according to the arithmetic sequence:
    /// q = r * x + b
    fn generate_q(r: BigInt, xbound: BigInt, b: BigInt) -> Result<BigInt, CryptoError> {
        loop {
            let x = BigInt::random_mod(&mut OsRng, &nonzero(xbound));
            let rx = checked(r.checked_mul(&x), "computing r * x")?;
            let q = checked(rx.checked_add(&b), "computing q")?;
            if crypto_primes::is_prime(&q) {
                return Ok(q);
            }
        }
    }

    /// Sample a non-residue. A non-residue is an invertible element such that
    /// y^{phi/r} != 1 (mod n)
    fn sample_nonresidue(modulus: BigInt, r: BigInt, phi: BigInt) -> BigInt {
        let (quotient, _) = phi.div_rem(&nonzero(r));
        loop {
            let y = arithmetics::sample_invertible(&modulus);
            if arithmetics::pow(&y, &quotient, &modulus) != BigInt::ONE {
                return y;
            }
        }
    }

    /// Check that (r, n, y) is perfectly consonant:
    /// 1. r divides phi
    /// 2. r and phi/r are relatively prime
    /// 3. y is not an r-th residue
    pub fn check_perfect_consonance(&self) -> bool {
        let r = nonzero(self.pk.r);
        let (phi_over_r, remainder) = self.sk.phi.div_rem(&r);
        let divisible = remainder == BigInt::ZERO;
        let indivisible = phi_over_r.rem(&r) != BigInt::ZERO;
        let y = OpaqueResidue::new(self.pk.y);
        divisible && indivisible && !self.is_rth_residue(&y)
    }

    /// Generate a valid set of parameters such that (r, n, y) is perfectly consonant
    /// First generate r, then use arithmetic sequence to generate p, q:
    /// q = r * x + b
    /// p = (r ** 2) * x + br + 1
    ///
    /// With b outside {0, 1}, r divides p - 1 exactly once and does not divide q - 1, which is
    /// what perfect consonance needs.
    ///
    /// The ring size bounds every tally (a count wraps around at r), while the modulus size is the
    /// main security parameter. Both are measured in number of bits.
    pub fn keygen(ring_size: usize, modulus_size: usize) -> Result<Self, CryptoError> {
        if ring_size < 3 || 3 * ring_size + 2 * modulus_size + 4 > BigInt::BITS {
            return Err(CryptoError::KeyGeneration("parameters do not fit in 256 bits"));
        }
        let r: BigInt = crypto_primes::generate_prime(Some(ring_size));
        let xbound = BigInt::ONE.shl_vartime(modulus_size);
        let two = BigInt::from_u8(2);
        let mut b = BigInt::random_mod(&mut OsRng, &nonzero(r));
        while b < two {
            b = BigInt::random_mod(&mut OsRng, &nonzero(r));
        }

        let q = Self::generate_q(r, xbound, b)?;
        let p = Self::generate_p(r, xbound, b)?;

        // Compute n and phi
        let n = checked(p.checked_mul(&q), "computing n")?;
        let p_minus_one = checked(p.checked_sub(&BigInt::ONE), "computing p - 1")?;
        let q_minus_one = checked(q.checked_sub(&BigInt::ONE), "computing q - 1")?;
        let phi = checked(p_minus_one.checked_mul(&q_minus_one), "computing phi")?;
        let y = Self::sample_nonresidue(n, r, phi);

        let keypair = Self::new(PublicKey::new(r, n, y), SecretKey::new(phi));
        if !keypair.check_perfect_consonance() {
            return Err(CryptoError::KeyGeneration("parameters are not perfectly consonant"));
        }
        tracing::debug!(ring_bits = r.bits(), modulus_bits = n.bits(), "generated key pair");
        Ok(keypair)
    }
}

/// Callers only pass values that are non-zero by construction (primes and powers of two)
fn nonzero(value: BigInt) -> NonZero<BigInt> {
    NonZero::new(value).unwrap()
}

fn checked(value: CtOption<BigInt>, context: &'static str) -> Result<BigInt, CryptoError> {
    Option::<BigInt>::from(value).ok_or(CryptoError::Overflow(context))
}
