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

use std::str::FromStr;

use bherror::Error;
use serde::{Deserialize, Serialize};

use crate::{error::SignatureError, utils::BoxError};

/// The algorithm an issuer key is tagged with.
///
/// # Algorithms
///
/// - `EdDSA` is the default for every key created from now on. The private
///   and the public halves are distinct.
/// - `HS256` is kept only for keys created before asymmetric signatures were
///   introduced. The same secret both produces and checks the MAC, so the
///   "public" key of such an issuer is the secret itself.
///
/// For the registered JOSE names see [RFC7518] and [RFC8037].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
/// [RFC8037]: https://datatracker.ietf.org/doc/html/rfc8037#section-3.1
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// Ed25519 signatures
    #[default]
    #[serde(rename = "EdDSA")]
    EdDsa,
    /// HMAC using SHA-256
    #[serde(rename = "HS256")]
    Hs256,
}

/// JWS `"alg"` header parameter value for **Edwards-curve signatures**, as
/// specified in [RFC8037].
///
/// [RFC8037]: https://datatracker.ietf.org/doc/html/rfc8037#section-3.1
pub const SIGNING_ALG_EDDSA: &str = "EdDSA";
/// JWS `"alg"` header parameter value for **HMAC using SHA-256**, as specified
/// in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.2
pub const SIGNING_ALG_HS256: &str = "HS256";

impl SigningAlgorithm {
    /// Returns the JOSE name of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EdDsa => SIGNING_ALG_EDDSA,
            Self::Hs256 => SIGNING_ALG_HS256,
        }
    }

    /// Whether the same key material is used to sign and to verify.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::Hs256)
    }
}

impl FromStr for SigningAlgorithm {
    type Err = Error<SignatureError>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            SIGNING_ALG_EDDSA => Ok(Self::EdDsa),
            SIGNING_ALG_HS256 => Ok(Self::Hs256),
            _ => Err(Error::root(SignatureError::InvalidSigningAlgorithm(
                value.to_string(),
            ))),
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signing backend used to compute the JWS signature.
///
/// The output of the signer must be the raw signature (or MAC) bytes, not yet
/// `base64url`-encoded. See step 5 in [section 5.1 of RFC7515].
///
/// [section 5.1 of RFC7515]: https://www.rfc-editor.org/rfc/rfc7515.html#section-5.1
pub trait Signer {
    /// The algorithm this signer uses. Must be a constant function.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Produce a JWS signature over the `message`.
    ///
    /// The `message` is guaranteed to be a valid JWS signing input.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, BoxError>;
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn signing_algorithms_use_jose_names() {
        for (alg, name) in [
            (SigningAlgorithm::EdDsa, "EdDSA"),
            (SigningAlgorithm::Hs256, "HS256"),
        ] {
            assert_eq!(alg.to_string(), name);
            assert_eq!(name.parse::<SigningAlgorithm>().unwrap(), alg);
            assert_eq!(serde_json::to_string(&alg).unwrap(), format!("\"{name}\""));
            assert_eq!(
                serde_json::from_str::<SigningAlgorithm>(&format!("\"{name}\"")).unwrap(),
                alg
            );
        }
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let err = "ES256".parse::<SigningAlgorithm>().unwrap_err();
        assert_matches!(err.error, SignatureError::InvalidSigningAlgorithm(alg) if alg == "ES256");
    }

    #[test]
    fn eddsa_is_the_default() {
        assert_eq!(SigningAlgorithm::default(), SigningAlgorithm::EdDsa);
        assert!(!SigningAlgorithm::EdDsa.is_symmetric());
        assert!(SigningAlgorithm::Hs256.is_symmetric());
    }
}
