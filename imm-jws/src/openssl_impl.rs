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

use bherror::{traits::ForeignError as _, Result};
use openssl::{
    hash::MessageDigest,
    memcmp,
    pkey::{Id, PKey},
    rand::rand_bytes,
    sign,
};

use crate::{
    error::CryptoError, BoxError, Signer, SigningAlgorithm, SIGNING_ALG_EDDSA, SIGNING_ALG_HS256,
};

/// Length in bytes of freshly generated `HS256` secrets.
const HS256_SECRET_LEN: usize = 32;

/// A raw Ed25519 key pair.
///
/// Both halves are kept as the 32-byte raw encodings from [RFC8032], which is
/// what gets persisted in the key store and embedded in `did:key` identifiers.
///
/// [RFC8032]: https://datatracker.ietf.org/doc/html/rfc8032#section-5.1.5
#[derive(Clone)]
pub struct Ed25519KeyPair {
    private_key: Vec<u8>,
    public_key: Vec<u8>,
}

impl Ed25519KeyPair {
    /// Generate a fresh Ed25519 key pair.
    pub fn generate() -> Result<Self, CryptoError> {
        let pkey = PKey::generate_ed25519().foreign_err(|| CryptoError::KeyGenerationFailed)?;

        Ok(Self {
            private_key: pkey
                .raw_private_key()
                .foreign_err(|| CryptoError::CryptoBackend)?,
            public_key: pkey
                .raw_public_key()
                .foreign_err(|| CryptoError::CryptoBackend)?,
        })
    }

    /// Rebuild the key pair from the raw private key, deriving the public half.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, CryptoError> {
        let pkey = PKey::private_key_from_raw_bytes(private_key, Id::ED25519)
            .foreign_err(|| CryptoError::InvalidKey(SIGNING_ALG_EDDSA))?;

        Ok(Self {
            private_key: private_key.to_vec(),
            public_key: pkey
                .raw_public_key()
                .foreign_err(|| CryptoError::CryptoBackend)?,
        })
    }

    /// The raw private key.
    pub fn private_key(&self) -> &[u8] {
        &self.private_key
    }

    /// The raw public key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Split the pair into `(private, public)`.
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.private_key, self.public_key)
    }
}

impl std::fmt::Debug for Ed25519KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519KeyPair")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Generate a random secret for `HS256`.
///
/// Only needed to provision legacy issuers in tests and migrations; new
/// issuers get Ed25519 keys.
pub fn generate_hs256_secret() -> Result<Vec<u8>, CryptoError> {
    let mut secret = vec![0u8; HS256_SECRET_LEN];
    rand_bytes(&mut secret).foreign_err(|| CryptoError::KeyGenerationFailed)?;
    Ok(secret)
}

/// Sign the `message` with the raw `key`, using the primitive selected by the
/// `algorithm` tag.
///
/// For `EdDSA` the `key` is the raw Ed25519 private key, for `HS256` it is the
/// shared secret.
pub fn sign_with_key(
    algorithm: SigningAlgorithm,
    key: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match algorithm {
        SigningAlgorithm::EdDsa => {
            let pkey = PKey::private_key_from_raw_bytes(key, Id::ED25519)
                .foreign_err(|| CryptoError::InvalidKey(SIGNING_ALG_EDDSA))?;
            let mut signer =
                sign::Signer::new_without_digest(&pkey).foreign_err(|| CryptoError::CryptoBackend)?;
            signer
                .sign_oneshot_to_vec(message)
                .foreign_err(|| CryptoError::CryptoBackend)
        }
        SigningAlgorithm::Hs256 => hmac_sha256(key, message),
    }
}

/// Verify the `signature` over `message` against the raw `key`, using the
/// primitive selected by the `algorithm` tag.
///
/// For `EdDSA` the `key` is the raw Ed25519 public key, for `HS256` it is the
/// shared secret and the MAC is compared in constant time.
///
/// # Return
/// `Ok(true)` if the signature is valid, `Ok(false)` if it isn't, and `Err(_)`
/// if the key itself is unusable or the backend fails.
pub fn verify_with_key(
    algorithm: SigningAlgorithm,
    key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, CryptoError> {
    match algorithm {
        SigningAlgorithm::EdDsa => {
            let pkey = PKey::public_key_from_raw_bytes(key, Id::ED25519)
                .foreign_err(|| CryptoError::InvalidKey(SIGNING_ALG_EDDSA))?;
            let mut verifier = sign::Verifier::new_without_digest(&pkey)
                .foreign_err(|| CryptoError::CryptoBackend)?;
            // OpenSSL reports a signature of the wrong length as an error.
            Ok(verifier.verify_oneshot(signature, message).unwrap_or(false))
        }
        SigningAlgorithm::Hs256 => {
            let expected = hmac_sha256(key, message)?;
            // `memcmp::eq` panics on length mismatch.
            Ok(expected.len() == signature.len() && memcmp::eq(&expected, signature))
        }
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let pkey = PKey::hmac(key).foreign_err(|| CryptoError::InvalidKey(SIGNING_ALG_HS256))?;
    let mut signer = sign::Signer::new(MessageDigest::sha256(), &pkey)
        .foreign_err(|| CryptoError::CryptoBackend)?;
    signer
        .update(message)
        .foreign_err(|| CryptoError::CryptoBackend)?;
    signer.sign_to_vec().foreign_err(|| CryptoError::CryptoBackend)
}

/// Raw signing key material together with its algorithm tag.
///
/// This is the [`Signer`] the issuer uses: whatever the key store returns for
/// an issuer is wrapped here and signing dispatches on the tag.
#[derive(Clone)]
pub struct SigningKey {
    algorithm: SigningAlgorithm,
    key: Vec<u8>,
}

impl SigningKey {
    /// Wrap raw key material tagged with `algorithm`.
    pub fn new(algorithm: SigningAlgorithm, key: Vec<u8>) -> Self {
        Self { algorithm, key }
    }

    /// Wrap a raw Ed25519 private key.
    pub fn eddsa(private_key: Vec<u8>) -> Self {
        Self::new(SigningAlgorithm::EdDsa, private_key)
    }

    /// Wrap a legacy `HS256` secret.
    pub fn hs256(secret: Vec<u8>) -> Self {
        Self::new(SigningAlgorithm::Hs256, secret)
    }
}

impl Signer for SigningKey {
    fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, BoxError> {
        sign_with_key(self.algorithm, &self.key, message).map_err(|e| -> BoxError { Box::new(e) })
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn ed25519_sign_and_verify() {
        let keys = Ed25519KeyPair::generate().unwrap();
        assert_eq!(keys.private_key().len(), 32);
        assert_eq!(keys.public_key().len(), 32);
        assert_ne!(keys.private_key(), keys.public_key());

        let signature = sign_with_key(SigningAlgorithm::EdDsa, keys.private_key(), b"msg").unwrap();
        assert_eq!(signature.len(), 64);

        assert!(
            verify_with_key(SigningAlgorithm::EdDsa, keys.public_key(), b"msg", &signature)
                .unwrap()
        );
        assert!(
            !verify_with_key(SigningAlgorithm::EdDsa, keys.public_key(), b"msh", &signature)
                .unwrap()
        );
        assert!(!verify_with_key(
            SigningAlgorithm::EdDsa,
            keys.public_key(),
            b"msg",
            &signature[..10]
        )
        .unwrap());
    }

    #[test]
    fn ed25519_public_key_is_derived_from_private() {
        let keys = Ed25519KeyPair::generate().unwrap();
        let restored = Ed25519KeyPair::from_private_key(keys.private_key()).unwrap();
        assert_eq!(restored.public_key(), keys.public_key());
    }

    #[test]
    fn ed25519_rejects_malformed_keys() {
        let err = sign_with_key(SigningAlgorithm::EdDsa, &[1, 2, 3], b"msg").unwrap_err();
        assert_matches!(err.error, CryptoError::InvalidKey(SIGNING_ALG_EDDSA));

        let err = verify_with_key(SigningAlgorithm::EdDsa, &[1, 2, 3], b"msg", &[0; 64])
            .unwrap_err();
        assert_matches!(err.error, CryptoError::InvalidKey(SIGNING_ALG_EDDSA));
    }

    /// Test case 2 from [RFC4231].
    ///
    /// [RFC4231]: https://datatracker.ietf.org/doc/html/rfc4231#section-4.3
    #[test]
    fn hs256_matches_rfc4231_vector() {
        let mac = sign_with_key(
            SigningAlgorithm::Hs256,
            b"Jefe",
            b"what do ya want for nothing?",
        )
        .unwrap();

        assert_eq!(
            hex::encode(&mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert!(verify_with_key(
            SigningAlgorithm::Hs256,
            b"Jefe",
            b"what do ya want for nothing?",
            &mac
        )
        .unwrap());
    }

    #[test]
    fn hs256_rejects_wrong_secret_and_truncated_mac() {
        let secret = generate_hs256_secret().unwrap();
        assert_eq!(secret.len(), HS256_SECRET_LEN);

        let mac = sign_with_key(SigningAlgorithm::Hs256, &secret, b"msg").unwrap();
        assert!(!verify_with_key(SigningAlgorithm::Hs256, b"other", b"msg", &mac).unwrap());
        assert!(!verify_with_key(SigningAlgorithm::Hs256, &secret, b"msg", &mac[1..]).unwrap());
    }

    #[test]
    fn signing_key_dispatches_on_its_tag() {
        let keys = Ed25519KeyPair::generate().unwrap();
        let signer = SigningKey::eddsa(keys.private_key().to_vec());
        assert_eq!(signer.algorithm(), SigningAlgorithm::EdDsa);
        let signature = signer.sign(b"msg").unwrap();
        assert!(
            verify_with_key(SigningAlgorithm::EdDsa, keys.public_key(), b"msg", &signature)
                .unwrap()
        );

        let signer = SigningKey::hs256(b"secret".to_vec());
        assert_eq!(signer.algorithm(), SigningAlgorithm::Hs256);
        let mac = signer.sign(b"msg").unwrap();
        assert!(verify_with_key(SigningAlgorithm::Hs256, b"secret", b"msg", &mac).unwrap());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let keys = Ed25519KeyPair::generate().unwrap();
        let rendered = format!("{:?}", SigningKey::eddsa(keys.private_key().to_vec()));
        assert!(rendered.contains("REDACTED"));
        assert!(format!("{keys:?}").contains("REDACTED"));
    }
}
