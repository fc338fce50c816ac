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

use std::future::Future;

use bherror::Result;
use imm_jws::{SigningAlgorithm, SigningKey};
use imm_status_list::StatusListRecord;

use crate::{IssuedCredentialRecord, KeyStoreError, RepositoryError};

mod hasher;
pub(crate) use hasher::SHA_256_ALG_NAME;
pub use hasher::{Hasher, HashingAlgorithm};
mod r#impl;
pub use r#impl::Sha256;

/// Per-issuer signing key material.
///
/// Every issuer DID owns exactly one key. Keys are created lazily on first
/// use and are always Ed25519 (`EdDSA`); `HS256` keys only exist for issuers
/// that were provisioned before asymmetric keys were introduced.
///
/// # Concurrency
///
/// Implementations MUST guarantee that concurrent first calls of
/// [`KeyStore::get_or_create_signing_key`] for the same issuer end up with the
/// same key, e.g. by holding a lock across the check and the insert, or by a
/// uniqueness constraint in the backing store.
pub trait KeyStore: Sync {
    /// Returns the issuer's signing key, creating an `EdDSA` key if the issuer
    /// has none yet.
    fn get_or_create_signing_key(
        &self,
        issuer_did: &str,
    ) -> impl Future<Output = Result<SigningKey, KeyStoreError>> + Send;

    /// Returns the key verifying the issuer's signatures, or `None` for an
    /// unknown issuer.
    ///
    /// For `HS256` issuers this is the shared secret itself.
    fn get_public_key(
        &self,
        issuer_did: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, KeyStoreError>> + Send;

    /// Returns the issuer's algorithm; issuers without a key get `EdDSA`.
    fn get_algorithm(
        &self,
        issuer_did: &str,
    ) -> impl Future<Output = Result<SigningAlgorithm, KeyStoreError>> + Send;
}

/// Storage of issued credentials and the per-issuer revocation status lists.
pub trait CredentialRepository: Sync {
    /// Persists a freshly issued credential.
    fn store(
        &self,
        record: IssuedCredentialRecord,
    ) -> impl Future<Output = Result<IssuedCredentialRecord, RepositoryError>> + Send;

    /// Looks up a credential by its id.
    fn get_by_id(
        &self,
        credential_id: &str,
    ) -> impl Future<Output = Result<Option<IssuedCredentialRecord>, RepositoryError>> + Send;

    /// All credentials issued to `subject_did`, newest first.
    fn get_by_subject(
        &self,
        subject_did: &str,
    ) -> impl Future<Output = Result<Vec<IssuedCredentialRecord>, RepositoryError>> + Send;

    /// All credentials issued by `issuer_did`, newest first.
    fn get_by_issuer(
        &self,
        issuer_did: &str,
    ) -> impl Future<Output = Result<Vec<IssuedCredentialRecord>, RepositoryError>> + Send;

    /// Revokes the credential and sets its bit on the issuer's status list.
    ///
    /// Returns `false` if the credential is unknown or was already revoked.
    /// The bit flip and the record update MUST be atomic with respect to other
    /// revocations under the same issuer.
    fn revoke(
        &self,
        credential_id: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// The issuer's status list, if it has issued anything.
    fn get_status_list(
        &self,
        issuer_did: &str,
    ) -> impl Future<Output = Result<Option<StatusListRecord>, RepositoryError>> + Send;

    /// Hands out the next status list index of the issuer, creating the list on
    /// first use. Indices are never reused.
    fn allocate_index(
        &self,
        issuer_did: &str,
    ) -> impl Future<Output = Result<usize, RepositoryError>> + Send;
}
