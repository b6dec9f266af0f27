//! The decryption oracle. It holds no keys: it checks the access list and forwards to whoever
//! can decrypt.
use std::sync::Arc;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::{
    acl::DecryptionAcl,
    address::Address,
    error::RelayerError,
    fhe::{Decryptor, Handle},
};

const SECONDS_PER_DAY: u64 = 86_400;

const USER_DECRYPT_DOMAIN: &[u8] = b"confidential-survey/user-decrypt/v1";

/// Longest window a user decryption authorization may cover
pub const MAX_DURATION_DAYS: u64 = 365;

/// A user's request to read handles through a given contract. `user` must be the address of
/// `public_key`, and `signature` covers everything else in the request; the window bounds when
/// the request may be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecryptRequest {
    pub handles: Vec<Handle>,
    pub contract: Address,
    pub user: Address,
    pub start_timestamp: u64,
    pub duration_days: u64,
    pub public_key: VerifyingKey,
    pub signature: Signature,
}

impl UserDecryptRequest {
    /// Build a request on behalf of the account controlled by `key`
    pub fn sign(
        key: &SigningKey,
        handles: Vec<Handle>,
        contract: Address,
        start_timestamp: u64,
        duration_days: u64,
    ) -> Self {
        let public_key = key.verifying_key();
        let message = Self::signing_message(&handles, &contract, start_timestamp, duration_days);
        Self {
            handles,
            contract,
            user: Address::from_verifying_key(&public_key),
            start_timestamp,
            duration_days,
            public_key,
            signature: key.sign(&message),
        }
    }

    /// The bytes a user signs: a domain tag, the contract, the window, then every handle
    pub fn signing_message(
        handles: &[Handle],
        contract: &Address,
        start_timestamp: u64,
        duration_days: u64,
    ) -> Vec<u8> {
        let mut message = Vec::with_capacity(USER_DECRYPT_DOMAIN.len() + 36 + 32 * handles.len());
        message.extend_from_slice(USER_DECRYPT_DOMAIN);
        message.extend_from_slice(contract.as_bytes());
        message.extend_from_slice(&start_timestamp.to_be_bytes());
        message.extend_from_slice(&duration_days.to_be_bytes());
        for handle in handles {
            message.extend_from_slice(handle.as_bytes());
        }
        message
    }

    fn check_signature(&self) -> Result<(), RelayerError> {
        if Address::from_verifying_key(&self.public_key) != self.user {
            return Err(RelayerError::SignerMismatch { user: self.user });
        }
        let message = Self::signing_message(
            &self.handles,
            &self.contract,
            self.start_timestamp,
            self.duration_days,
        );
        self.public_key
            .verify_strict(&message, &self.signature)
            .map_err(|_| RelayerError::BadSignature)
    }

    fn check_window(&self, now: u64) -> Result<(), RelayerError> {
        if self.duration_days == 0 || self.duration_days > MAX_DURATION_DAYS {
            return Err(RelayerError::InvalidDuration {
                got: self.duration_days,
                max: MAX_DURATION_DAYS,
            });
        }
        let end = self
            .duration_days
            .checked_mul(SECONDS_PER_DAY)
            .and_then(|span| self.start_timestamp.checked_add(span))
            .unwrap_or(u64::MAX);
        if now < self.start_timestamp || now >= end {
            return Err(RelayerError::OutsideWindow { now });
        }
        Ok(())
    }
}

pub struct Relayer<D, A> {
    decryptor: Arc<D>,
    acl: Arc<A>,
}

impl<D, A> Relayer<D, A>
where
    D: Decryptor,
    A: DecryptionAcl,
{
    pub fn new(decryptor: Arc<D>, acl: Arc<A>) -> Self {
        Self { decryptor, acl }
    }

    /// Decrypt handles anyone may read. Fails without decrypting anything if one of them is
    /// not public.
    pub fn public_decrypt(&self, handles: &[Handle]) -> Result<Vec<u32>, RelayerError> {
        if handles.is_empty() {
            return Err(RelayerError::EmptyRequest);
        }
        if let Some(handle) = handles
            .iter()
            .find(|handle| !self.acl.is_publicly_decryptable(handle))
        {
            tracing::warn!(%handle, "public decryption refused");
            return Err(RelayerError::NotPubliclyDecryptable(*handle));
        }
        let values = self.decrypt_all(handles)?;
        tracing::info!(count = values.len(), "public decryption served");
        Ok(values)
    }

    /// Decrypt handles for one user. The request must be signed by the user, and each handle
    /// must be readable by both the user and the contract unless it is public anyway.
    pub fn user_decrypt(
        &self,
        request: &UserDecryptRequest,
        now: u64,
    ) -> Result<Vec<u32>, RelayerError> {
        if request.handles.is_empty() {
            return Err(RelayerError::EmptyRequest);
        }
        request.check_window(now)?;
        if let Err(err) = request.check_signature() {
            tracing::warn!(user = %request.user, %err, "user decryption refused");
            return Err(err);
        }
        for handle in &request.handles {
            if self.acl.is_publicly_decryptable(handle) {
                continue;
            }
            for account in [&request.user, &request.contract] {
                if !self.acl.is_allowed(handle, account) {
                    tracing::warn!(%handle, %account, "user decryption refused");
                    return Err(RelayerError::NotAllowed {
                        handle: *handle,
                        account: *account,
                    });
                }
            }
        }
        let values = self.decrypt_all(&request.handles)?;
        tracing::info!(
            user = %request.user,
            count = values.len(),
            "user decryption served"
        );
        Ok(values)
    }

    fn decrypt_all(&self, handles: &[Handle]) -> Result<Vec<u32>, RelayerError> {
        handles
            .iter()
            .map(|handle| self.decryptor.decrypt(handle).map_err(RelayerError::from))
            .collect()
    }
}
