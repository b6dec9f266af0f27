//! Who may decrypt which ciphertext
use std::{
    collections::{HashMap, HashSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{address::Address, fhe::Handle};

/// The decryption-authorization capability. Grants are additive: nothing is ever revoked.
pub trait DecryptionAcl: Send + Sync {
    fn allow(&self, handle: &Handle, account: &Address);

    fn make_publicly_decryptable(&self, handle: &Handle);

    fn is_allowed(&self, handle: &Handle, account: &Address) -> bool;

    fn is_publicly_decryptable(&self, handle: &Handle) -> bool;
}

#[derive(Debug, Default)]
struct Grants {
    allowed: HashMap<Handle, HashSet<Address>>,
    public: HashSet<Handle>,
}

/// An in-memory access list
#[derive(Debug, Default)]
pub struct AccessList {
    grants: RwLock<Grants>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    // Grants are single inserts, so a poisoned lock still guards consistent data
    fn read(&self) -> RwLockReadGuard<'_, Grants> {
        self.grants.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Grants> {
        self.grants.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DecryptionAcl for AccessList {
    fn allow(&self, handle: &Handle, account: &Address) {
        self.write().allowed.entry(*handle).or_default().insert(*account);
    }

    fn make_publicly_decryptable(&self, handle: &Handle) {
        self.write().public.insert(*handle);
    }

    fn is_allowed(&self, handle: &Handle, account: &Address) -> bool {
        self.read()
            .allowed
            .get(handle)
            .map_or(false, |accounts| accounts.contains(account))
    }

    fn is_publicly_decryptable(&self, handle: &Handle) -> bool {
        self.read().public.contains(handle)
    }
}
