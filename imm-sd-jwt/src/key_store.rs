// Copyright (C) 2020-2025  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! An in-memory [`KeyStore`].

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Mutex,
};

use bherror::{traits::PropagateError as _, Error, Result};
use chrono::Utc;
use imm_jws::{Ed25519KeyPair, SigningAlgorithm, SigningKey};
use tracing::info;

use crate::{utils::lock, KeyStore, KeyStoreError, SigningKeyRecord};

/// A [`KeyStore`] keeping all keys in process memory.
///
/// Key creation holds the lock across the lookup and the insert, so
/// concurrent first requests for an issuer always agree on one key.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: Mutex<HashMap<String, SigningKeyRecord>>,
}

impl InMemoryKeyStore {
    /// Creates an empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pre-existing `HS256` secret for `issuer_did`.
    ///
    /// This exists only for issuers provisioned before Ed25519 keys were
    /// introduced; such issuers keep signing with `HS256`.
    ///
    /// # Errors
    ///
    /// [`KeyStoreError::KeyAlreadyExists`] if the issuer already has a key.
    pub fn import_legacy_hs256_key(&self, issuer_did: &str, secret: Vec<u8>) -> Result<(), KeyStoreError> {
        let mut keys = lock(&self.keys);

        match keys.entry(issuer_did.to_owned()) {
            Entry::Occupied(_) => Err(Error::root(KeyStoreError::KeyAlreadyExists(
                issuer_did.to_owned(),
            ))),
            Entry::Vacant(entry) => {
                entry.insert(SigningKeyRecord {
                    issuer_did: issuer_did.to_owned(),
                    private_key: secret,
                    public_key: None,
                    algorithm: SigningAlgorithm::Hs256,
                    created_at: Utc::now(),
                });
                info!(issuer_did, "imported legacy HS256 issuer key");
                Ok(())
            }
        }
    }

    /// The stored record of `issuer_did`, if any.
    pub fn record(&self, issuer_did: &str) -> Option<SigningKeyRecord> {
        lock(&self.keys).get(issuer_did).cloned()
    }

    fn get_or_create(&self, issuer_did: &str) -> Result<SigningKey, KeyStoreError> {
        let mut keys = lock(&self.keys);

        let record = match keys.entry(issuer_did.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let (private_key, public_key) = Ed25519KeyPair::generate()
                    .with_err(|| KeyStoreError::KeyGeneration)?
                    .into_parts();
                info!(issuer_did, "created Ed25519 issuer key");

                entry.insert(SigningKeyRecord {
                    issuer_did: issuer_did.to_owned(),
                    private_key,
                    public_key: Some(public_key),
                    algorithm: SigningAlgorithm::EdDsa,
                    created_at: Utc::now(),
                })
            }
        };

        Ok(record.signing_key())
    }
}

impl KeyStore for InMemoryKeyStore {
    async fn get_or_create_signing_key(&self, issuer_did: &str) -> Result<SigningKey, KeyStoreError> {
        self.get_or_create(issuer_did)
    }

    async fn get_public_key(&self, issuer_did: &str) -> Result<Option<Vec<u8>>, KeyStoreError> {
        Ok(lock(&self.keys)
            .get(issuer_did)
            .map(|record| record.verification_key().to_vec()))
    }

    async fn get_algorithm(&self, issuer_did: &str) -> Result<SigningAlgorithm, KeyStoreError> {
        Ok(lock(&self.keys)
            .get(issuer_did)
            .map(|record| record.algorithm)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use imm_jws::{verify_with_key, Signer as _};

    use super::*;

    const ISSUER: &str = "did:web:school.example";

    #[tokio::test]
    async fn creates_eddsa_key_once() {
        let store = InMemoryKeyStore::new();

        assert_eq!(store.get_public_key(ISSUER).await.unwrap(), None);
        assert_eq!(store.get_algorithm(ISSUER).await.unwrap(), SigningAlgorithm::EdDsa);

        let first = store.get_or_create_signing_key(ISSUER).await.unwrap();
        let second = store.get_or_create_signing_key(ISSUER).await.unwrap();
        assert_eq!(first.algorithm(), SigningAlgorithm::EdDsa);

        let public_key = store.get_public_key(ISSUER).await.unwrap().unwrap();
        let record = store.record(ISSUER).unwrap();
        assert_ne!(public_key, record.private_key);

        // Both handles sign with the same key.
        for signer in [first, second] {
            let signature = signer.sign(b"payload").unwrap();
            assert!(
                verify_with_key(SigningAlgorithm::EdDsa, &public_key, b"payload", &signature)
                    .unwrap()
            );
        }
    }

    #[tokio::test]
    async fn legacy_key_is_its_own_verification_key() {
        let store = InMemoryKeyStore::new();
        store
            .import_legacy_hs256_key(ISSUER, b"legacy-secret".to_vec())
            .unwrap();

        assert_eq!(store.get_algorithm(ISSUER).await.unwrap(), SigningAlgorithm::Hs256);
        assert_eq!(
            store.get_public_key(ISSUER).await.unwrap(),
            Some(b"legacy-secret".to_vec())
        );

        let signer = store.get_or_create_signing_key(ISSUER).await.unwrap();
        assert_eq!(signer.algorithm(), SigningAlgorithm::Hs256);
    }

    #[test]
    fn existing_keys_are_never_replaced() {
        let store = InMemoryKeyStore::new();
        store.get_or_create(ISSUER).unwrap();

        let err = store
            .import_legacy_hs256_key(ISSUER, b"secret".to_vec())
            .unwrap_err();
        assert_matches!(err.error, KeyStoreError::KeyAlreadyExists(did) if did == ISSUER);
        assert_eq!(store.record(ISSUER).unwrap().algorithm, SigningAlgorithm::EdDsa);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_agree() {
        let store = Arc::new(InMemoryKeyStore::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.get_or_create_signing_key(ISSUER).await.unwrap();
                    store.get_public_key(ISSUER).await.unwrap().unwrap()
                })
            })
            .collect();

        let mut public_keys = Vec::new();
        for handle in handles {
            public_keys.push(handle.await.unwrap());
        }

        assert!(public_keys.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
