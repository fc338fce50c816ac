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

//! The [`did:key`][1] method: the DID is the multicodec-prefixed public key
//! in multibase `base58btc`, and the document is derived from it locally.
//!
//! [1]: https://w3c-ccg.github.io/did-method-key/

use bherror::{traits::PropagateError as _, Result};
use imm_jws::Ed25519KeyPair;
use multibase::Base;
use tracing::{debug, info};

use crate::{
    DidCreationOptions, DidDocument, DidError, DidManager, DidResolver, VerificationMethod,
    DID_CONTEXT_V1,
};

const DID_KEY_PREFIX: &str = "did:key:";
const ED25519_2020_CONTEXT: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
const PUBLIC_KEY_LEN: usize = 32;

/// Key types a `did:key` can carry, by multicodec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCodec {
    /// `ed25519-pub`, `0xed`.
    Ed25519,
    /// `x25519-pub`, `0xec`.
    X25519,
}

impl KeyCodec {
    /// The two-byte varint multicodec prefix.
    pub fn prefix(self) -> [u8; 2] {
        match self {
            Self::Ed25519 => [0xed, 0x01],
            Self::X25519 => [0xec, 0x01],
        }
    }

    /// The verification method type of the key.
    pub fn verification_method_type(self) -> &'static str {
        match self {
            Self::Ed25519 => "Ed25519VerificationKey2020",
            Self::X25519 => "X25519KeyAgreementKey2020",
        }
    }

    fn from_prefix(prefix: &[u8]) -> Option<Self> {
        [Self::Ed25519, Self::X25519]
            .into_iter()
            .find(|codec| codec.prefix() == prefix)
    }
}

/// Encodes a raw public key as a `did:key`.
pub fn encode_did_key(codec: KeyCodec, public_key: &[u8]) -> String {
    let mut bytes = codec.prefix().to_vec();
    bytes.extend_from_slice(public_key);
    format!("{DID_KEY_PREFIX}{}", multibase::encode(Base::Base58Btc, bytes))
}

/// Decodes a `did:key` into its codec and raw public key.
///
/// Only `base58btc` multibase, the two supported codecs and 32 byte keys are
/// accepted.
pub fn decode_did_key(did: &str) -> Option<(KeyCodec, Vec<u8>)> {
    let multikey = did.strip_prefix(DID_KEY_PREFIX)?;
    if !multikey.starts_with('z') {
        return None;
    }

    let (Base::Base58Btc, decoded) = multibase::decode(multikey).ok()? else {
        return None;
    };
    if decoded.len() < 2 {
        return None;
    }
    let (prefix, key) = decoded.split_at(2);
    let codec = KeyCodec::from_prefix(prefix)?;

    (key.len() == PUBLIC_KEY_LEN).then(|| (codec, key.to_vec()))
}

/// The document of a `did:key`: one verification method, referenced for
/// authentication and assertion, and for key agreement if it is an X25519
/// key.
fn key_document(did: &str, codec: KeyCodec, public_key: &[u8]) -> DidDocument {
    let multikey = &did[DID_KEY_PREFIX.len()..];
    let method_id = format!("{did}#{multikey}");

    let mut document = DidDocument::new(did);
    document.context = vec![DID_CONTEXT_V1.to_owned(), ED25519_2020_CONTEXT.to_owned()];
    document.verification_method = Some(vec![VerificationMethod {
        id: method_id.clone(),
        method_type: codec.verification_method_type().to_owned(),
        controller: did.to_owned(),
        public_key_multibase: Some(multibase::encode(Base::Base58Btc, public_key)),
        public_key_jwk: None,
    }]);
    document.authentication = Some(vec![method_id.clone()]);
    document.assertion_method = Some(vec![method_id.clone()]);
    if codec == KeyCodec::X25519 {
        document.key_agreement = Some(vec![method_id]);
    }

    document
}

/// Resolves `did:key` DIDs without any network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKeyResolver;

impl DidResolver for DidKeyResolver {
    fn method(&self) -> &str {
        "key"
    }

    async fn resolve(&self, did: &str) -> Option<DidDocument> {
        let Some((codec, public_key)) = decode_did_key(did) else {
            debug!(did, "not a decodable did:key");
            return None;
        };

        Some(key_document(did, codec, &public_key))
    }
}

/// Creates `did:key` DIDs from fresh Ed25519 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKeyManager;

impl DidKeyManager {
    /// Creates a DID and returns its document together with the key pair.
    pub fn create_with_keys(&self) -> Result<(DidDocument, Ed25519KeyPair), DidError> {
        let keys = Ed25519KeyPair::generate().with_err(|| DidError::KeyGeneration)?;

        let did = encode_did_key(KeyCodec::Ed25519, keys.public_key());
        info!(%did, "created did:key");

        Ok((key_document(&did, KeyCodec::Ed25519, keys.public_key()), keys))
    }
}

impl DidManager for DidKeyManager {
    async fn create_did(&self, _options: &DidCreationOptions) -> Result<DidDocument, DidError> {
        self.create_with_keys().map(|(document, _)| document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DID: &str = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";

    #[tokio::test]
    async fn resolves_ed25519_key() {
        let document = DidKeyResolver.resolve(DID).await.unwrap();
        let method_id = format!("{DID}#z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK");

        assert_eq!(document.id, DID);
        assert_eq!(document.context, [DID_CONTEXT_V1, ED25519_2020_CONTEXT]);
        let method = document.verification_method(&method_id).unwrap();
        assert_eq!(method.method_type, "Ed25519VerificationKey2020");
        assert_eq!(method.controller, DID);
        assert_eq!(
            method.public_key_multibase.as_deref(),
            Some("z48GdbJyVULjHDaBNS6ct9oAGtckZUS5v8asrPzvZ7R1w")
        );
        assert_eq!(document.authentication, Some(vec![method_id.clone()]));
        assert_eq!(document.assertion_method, Some(vec![method_id]));
        assert_eq!(document.key_agreement, None);
    }

    #[tokio::test]
    async fn resolves_x25519_key_with_key_agreement() {
        let did = "did:key:z6LSbgC4DpuCf7zxewhFPnYcyBm3YgxjEEovsehvWqZzTm8z";

        let document = DidKeyResolver.resolve(did).await.unwrap();

        let methods = document.verification_method.as_deref().unwrap();
        assert_eq!(methods[0].method_type, "X25519KeyAgreementKey2020");
        assert_eq!(document.key_agreement, Some(vec![methods[0].id.clone()]));
    }

    #[tokio::test]
    async fn rejects_malformed_keys() {
        for did in [
            "did:key:z0000",
            "did:key:",
            "did:key:6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
            // Unknown codec 0x12 0x00.
            "did:key:zQbrzXjvR2ew9AFuZgHdj4f7hbsDDgsLcwSbMUhB4fDRbZQ",
            // Ed25519 codec with a 16 byte key.
            "did:key:zAq9r99PUfP1Xyitb5n8V9sxht",
            "did:web:example.com",
        ] {
            assert_eq!(DidKeyResolver.resolve(did).await, None, "{did}");
        }
    }

    #[tokio::test]
    async fn public_key_round_trips_to_did() {
        let document = DidKeyResolver.resolve(DID).await.unwrap();
        let multibase_key = document.verification_method.unwrap()[0]
            .public_key_multibase
            .clone()
            .unwrap();

        let (_, raw) = multibase::decode(multibase_key).unwrap();

        assert_eq!(encode_did_key(KeyCodec::Ed25519, &raw), DID);
    }

    #[tokio::test]
    async fn created_did_resolves_to_same_document() {
        let (created, keys) = DidKeyManager.create_with_keys().unwrap();

        assert!(created.id.starts_with("did:key:z6Mk"));
        assert_eq!(
            decode_did_key(&created.id),
            Some((KeyCodec::Ed25519, keys.public_key().to_vec()))
        );
        assert_eq!(DidKeyResolver.resolve(&created.id).await, Some(created));

        let other = DidKeyManager
            .create_did(&DidCreationOptions::default())
            .await
            .unwrap();
        assert_ne!(other.id, DID);
    }
}
