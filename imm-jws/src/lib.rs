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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides functions and types for producing and checking
//! [JSON Web Signatures (JWS)][1] in the compact serialization.
//!
//! Issuer keys are tagged with a [`SigningAlgorithm`]. Newly created keys are
//! always `EdDSA` (Ed25519); `HS256` exists only so that symmetric keys
//! created before the move to asymmetric signatures keep verifying.
//!
//! Signing and verification dispatch on that tag through [`sign_with_key`]
//! and [`verify_with_key`], both backed by `openssl`.
//!
//! # Example
//!
//! ```
//! use imm_jws::{CompactJws, Ed25519KeyPair, SigningKey, sign_compact};
//! use serde_json::json;
//!
//! let keys = Ed25519KeyPair::generate().unwrap();
//! let signer = SigningKey::eddsa(keys.private_key().to_vec());
//!
//! let claims = json!({ "iss": "did:example:issuer" });
//! let token = sign_compact("JWT", &claims, &signer).unwrap();
//!
//! let parsed = CompactJws::parse(&token).unwrap();
//! assert!(parsed.verify(imm_jws::SigningAlgorithm::EdDsa, keys.public_key()).unwrap());
//! ```
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7515.html

mod compact;
mod error;
mod openssl_impl;
mod traits;
mod utils;

pub use compact::{sign_compact, CompactJws, JwsHeader};
pub use error::{CryptoError, FormatError, SignatureError};
pub use openssl_impl::{
    generate_hs256_secret, sign_with_key, verify_with_key, Ed25519KeyPair, SigningKey,
};
pub use traits::{Signer, SigningAlgorithm, SIGNING_ALG_EDDSA, SIGNING_ALG_HS256};
pub use utils::{base64_url_decode, base64_url_encode, construct_jws_payload, BoxError};

/// Type alias for the JSON object type used in JWS headers and claims.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Creates a [`JsonObject`] from a JSON object literal, mirroring
/// [`serde_json::json`].
///
/// Panics when the literal is not a JSON object, so it is meant for constant
/// input only.
#[macro_export]
macro_rules! json_object {
    ($stuff:tt) => {
        match ::serde_json::json!($stuff) {
            ::serde_json::Value::Object(o) => o,
            _ => unreachable!("json_object! takes an object literal"),
        }
    };
}
