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

use chrono::{DateTime, Utc};
use imm_jws::{SigningAlgorithm, SigningKey};
use serde::{Deserialize, Serialize};

/// The persisted metadata of an issued credential.
///
/// Created at issuance and changed only by revocation, which is one-way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredentialRecord {
    /// The credential id without the `urn:uuid:` prefix.
    pub id: String,
    /// Issuer DID.
    pub issuer_did: String,
    /// Subject DID.
    pub subject_did: String,
    /// Credential type, e.g. `I20Credential`.
    pub credential_type: String,
    /// The full compact SD-JWT, all disclosures included.
    pub serialized_credential: String,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// Expiry, if the credential has one.
    pub expires_at: Option<DateTime<Utc>>,
    /// The credential's bit on the issuer's status list.
    pub status_list_index: usize,
    /// Whether the credential has been revoked.
    pub is_revoked: bool,
    /// When the credential was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// An issuer's signing key as held by a [`KeyStore`](crate::KeyStore).
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKeyRecord {
    /// Issuer DID.
    pub issuer_did: String,
    /// Raw Ed25519 private key, or the `HS256` secret.
    pub private_key: Vec<u8>,
    /// Raw Ed25519 public key; `None` for `HS256`.
    pub public_key: Option<Vec<u8>>,
    /// The algorithm the key is used with.
    pub algorithm: SigningAlgorithm,
    /// When the key was created or imported.
    pub created_at: DateTime<Utc>,
}

impl SigningKeyRecord {
    /// The key verifying the issuer's signatures.
    ///
    /// For `HS256` that is the secret itself, kept only so that credentials of
    /// legacy issuers keep verifying.
    pub fn verification_key(&self) -> &[u8] {
        match (&self.public_key, self.algorithm) {
            (Some(public_key), SigningAlgorithm::EdDsa) => public_key,
            _ => &self.private_key,
        }
    }

    /// The key as a [`Signer`](imm_jws::Signer).
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::new(self.algorithm, self.private_key.clone())
    }
}

impl std::fmt::Debug for SigningKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyRecord")
            .field("issuer_did", &self.issuer_did)
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key.as_ref().map(|_| "[PRESENT]"))
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(algorithm: SigningAlgorithm, public_key: Option<Vec<u8>>) -> SigningKeyRecord {
        SigningKeyRecord {
            issuer_did: "did:web:school.example".to_owned(),
            private_key: vec![1, 2, 3],
            public_key,
            algorithm,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verification_key_per_algorithm() {
        let eddsa = record(SigningAlgorithm::EdDsa, Some(vec![9, 9]));
        assert_eq!(eddsa.verification_key(), &[9, 9]);

        let hs256 = record(SigningAlgorithm::Hs256, None);
        assert_eq!(hs256.verification_key(), &[1, 2, 3]);
    }

    #[test]
    fn debug_hides_key_material() {
        let debug = format!("{:?}", record(SigningAlgorithm::Hs256, None));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("[1, 2, 3]"));
    }
}
