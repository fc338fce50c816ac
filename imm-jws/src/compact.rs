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

use bherror::{
    traits::{ForeignBoxed as _, ForeignError as _},
    Error, Result,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    base64_url_decode, base64_url_encode, construct_jws_payload, verify_with_key, CryptoError,
    FormatError, SignatureError, Signer, SigningAlgorithm,
};

/// The protected header written by [`sign_compact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Taken from [`Signer::algorithm`], never chosen by the caller.
    pub alg: SigningAlgorithm,
    /// The media type of the whole token, e.g. `vc+sd-jwt`.
    pub typ: String,
}

/// Serialize the `claims`, sign them with `signer` and return the compact JWS
/// `base64url(header).base64url(claims).base64url(signature)`.
///
/// The header's `alg` always matches the signer.
pub fn sign_compact<C: Serialize>(
    typ: &str,
    claims: &C,
    signer: &(impl Signer + ?Sized),
) -> Result<String, SignatureError> {
    let header = JwsHeader {
        alg: signer.algorithm(),
        typ: typ.to_owned(),
    };
    let header =
        serde_json::to_vec(&header).foreign_err(|| SignatureError::Serialization("header"))?;
    let claims =
        serde_json::to_vec(claims).foreign_err(|| SignatureError::Serialization("claims"))?;

    let signing_input = construct_jws_payload(&base64_url_encode(header), &base64_url_encode(claims));
    let signature = signer
        .sign(signing_input.as_bytes())
        .foreign_boxed_err(|| SignatureError::SigningFailed)?;

    Ok(format!("{signing_input}.{}", base64_url_encode(signature)))
}

/// A compact JWS split into its three still-encoded segments.
///
/// Nothing is decoded on [`CompactJws::parse`]; each part is decoded on
/// demand so that callers can report which part was malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactJws<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
}

impl<'a> CompactJws<'a> {
    /// Split `token` on `.`; anything other than exactly three segments is an
    /// error.
    pub fn parse(token: &'a str) -> Result<Self, FormatError> {
        let segments: Vec<&str> = token.split('.').collect();

        let [header, payload, signature] = segments[..] else {
            return Err(Error::root(FormatError::InvalidSegmentCount(
                segments.len(),
            )));
        };

        Ok(Self {
            header,
            payload,
            signature,
        })
    }

    /// The bytes the signature was computed over.
    pub fn signing_input(&self) -> String {
        construct_jws_payload(self.header, self.payload)
    }

    /// Decode the header as JSON into `H`.
    pub fn header<H: DeserializeOwned>(&self) -> Result<H, FormatError> {
        decode_json(self.header, "header")
    }

    /// Decode the payload as JSON into `C`.
    pub fn claims<C: DeserializeOwned>(&self) -> Result<C, FormatError> {
        decode_json(self.payload, "payload")
    }

    /// Decode the raw signature bytes.
    pub fn signature(&self) -> Result<Vec<u8>, FormatError> {
        base64_url_decode(self.signature).foreign_err(|| FormatError::InvalidBase64("signature"))
    }

    /// Check the signature with `algorithm` and the raw verification `key`.
    ///
    /// A signature segment that is not even valid `base64url` cannot match and
    /// yields `Ok(false)`.
    pub fn verify(&self, algorithm: SigningAlgorithm, key: &[u8]) -> Result<bool, CryptoError> {
        let Ok(signature) = self.signature() else {
            return Ok(false);
        };

        verify_with_key(
            algorithm,
            key,
            self.signing_input().as_bytes(),
            &signature,
        )
    }
}

fn decode_json<T: DeserializeOwned>(segment: &str, part: &'static str) -> Result<T, FormatError> {
    let bytes = base64_url_decode(segment).foreign_err(|| FormatError::InvalidBase64(part))?;
    serde_json::from_slice(&bytes).foreign_err(|| FormatError::InvalidJson(part))
}
