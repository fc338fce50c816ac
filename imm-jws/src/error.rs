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

/// Error in the compact JWS format.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum FormatError {
    /// The token does not consist of exactly three `.`-separated segments.
    #[strum(to_string = "Expected 3 JWS segments, found {0}")]
    InvalidSegmentCount(usize),
    /// A segment is not valid `base64url` without padding.
    #[strum(to_string = "JWS {0} is not valid base64url")]
    InvalidBase64(&'static str),
    /// A segment decoded to something that is not the expected JSON.
    #[strum(to_string = "JWS {0} is not valid JSON")]
    InvalidJson(&'static str),
}

impl bherror::BhError for FormatError {}

/// Error in JWS signing.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum SignatureError {
    /// The `alg` value is not one we know how to handle.
    #[strum(to_string = "Invalid signing algorithm {0}")]
    InvalidSigningAlgorithm(String),
    /// The header or the claims could not be serialized.
    #[strum(to_string = "Unable to serialize JWS {0}")]
    Serialization(&'static str),
    /// The signing backend failed.
    #[strum(to_string = "Signing failed")]
    SigningFailed,
}

impl bherror::BhError for SignatureError {}

/// Cryptographic error
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum CryptoError {
    /// Error that occurs when key generation failed
    #[strum(to_string = "Key generation failed")]
    KeyGenerationFailed,
    /// Error that occurs when the cryptographic backend
    /// unexpectedly failed
    #[strum(to_string = "Crypto backend failed")]
    CryptoBackend,
    /// The key bytes do not form a valid key for the algorithm.
    #[strum(to_string = "Invalid key for {0}")]
    InvalidKey(&'static str),
}

impl bherror::BhError for CryptoError {}
