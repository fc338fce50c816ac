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

use crate::utils::ClaimNames;

/// Errors that can occur while issuing a credential.
///
/// The first group of variants are validation errors caused by the request
/// itself; see [`IssuanceError::is_validation`].
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum IssuanceError {
    /// The credential type has no schema in the registry.
    #[strum(to_string = "Unknown credential type: {0}")]
    UnknownCredentialType(String),

    /// Required claims of the credential type are absent from the request.
    #[strum(to_string = "Missing required claims for {0}: {1}")]
    MissingRequiredClaims(String, ClaimNames),

    /// A claim uses a name reserved by SD-JWT.
    #[strum(to_string = "Claim name `{0}` is reserved")]
    ReservedClaimName(&'static str),

    /// The issuer DID is empty.
    #[strum(to_string = "Issuer DID must not be empty")]
    EmptyIssuer,

    /// The subject DID is empty.
    #[strum(to_string = "Subject DID must not be empty")]
    EmptySubject,

    /// The validity period does not yield a representable expiry time.
    #[strum(to_string = "Invalid validity period of {0} days")]
    InvalidValidityPeriod(i64),

    /// The issuer's signing key could not be obtained.
    #[strum(to_string = "Signing key unavailable")]
    KeyStore,

    /// No status list index could be allocated.
    #[strum(to_string = "Status list index allocation failed")]
    StatusList,

    /// A disclosure salt could not be generated.
    #[strum(to_string = "Salt generation failed")]
    Salt,

    /// The JWT could not be signed.
    #[strum(to_string = "Credential signing failed")]
    Signing,

    /// The issued credential could not be persisted.
    #[strum(to_string = "Credential could not be stored")]
    Repository,
}

impl bherror::BhError for IssuanceError {}

impl IssuanceError {
    /// Whether the error was caused by invalid input rather than by a failing
    /// dependency.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownCredentialType(_)
                | Self::MissingRequiredClaims(..)
                | Self::ReservedClaimName(_)
                | Self::EmptyIssuer
                | Self::EmptySubject
                | Self::InvalidValidityPeriod(_)
        )
    }
}

/// Errors of a [`KeyStore`](crate::KeyStore).
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum KeyStoreError {
    /// A new key pair could not be generated.
    #[strum(to_string = "Key generation failed")]
    KeyGeneration,

    /// The issuer already holds a key, which is never replaced.
    #[strum(to_string = "Issuer {0} already holds a signing key")]
    KeyAlreadyExists(String),

    /// The backing storage failed.
    #[strum(to_string = "Key storage failure")]
    Storage,
}

impl bherror::BhError for KeyStoreError {}

/// Errors of a [`CredentialRepository`](crate::CredentialRepository).
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum RepositoryError {
    /// Every index of the issuer's status list has been handed out.
    #[strum(to_string = "Status list of {0} is exhausted")]
    StatusListExhausted(String),

    /// A record with the same id is already stored.
    #[strum(to_string = "Credential {0} already exists")]
    DuplicateCredential(String),

    /// The status list is missing or inconsistent with the record.
    #[strum(to_string = "Status list error")]
    StatusList,

    /// The backing storage failed.
    #[strum(to_string = "Credential storage failure")]
    Storage,
}

impl bherror::BhError for RepositoryError {}

/// Reasons a presented credential fails verification.
///
/// These never leave the crate as errors: their [`Display`](std::fmt::Display)
/// text becomes the
/// [`VerificationResult::error`](crate::VerificationResult::error) of an
/// invalid result.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum VerificationError {
    /// The token does not consist of three `.`-separated segments, or the
    /// header is unreadable.
    #[strum(to_string = "Invalid JWT format")]
    InvalidFormat,

    /// The payload is not the expected JSON object.
    #[strum(to_string = "Cannot parse JWT payload")]
    InvalidPayload,

    /// The payload has no `iss`.
    #[strum(to_string = "Missing issuer")]
    MissingIssuer,

    /// The key store has no key for `iss`.
    #[strum(to_string = "Unknown issuer key")]
    UnknownIssuerKey,

    /// The key store could not be queried.
    #[strum(to_string = "Issuer key lookup failed")]
    KeyStore,

    /// The header names an algorithm other than `EdDSA` or `HS256`.
    #[strum(to_string = "Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature does not match.
    #[strum(to_string = "Invalid signature")]
    InvalidSignature,

    /// The payload names an `_sd_alg` other than `sha-256`.
    #[strum(to_string = "Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// A presented disclosure is not a `[salt, name, value]` array.
    #[strum(to_string = "Invalid disclosure")]
    InvalidDisclosure,

    /// A presented disclosure's digest is not part of the signed `_sd` array.
    #[strum(to_string = "Disclosure digest not found in credential")]
    DisclosureNotFound,

    /// The credential's `exp` lies in the past.
    #[strum(to_string = "Credential expired")]
    Expired,
}

impl bherror::BhError for VerificationError {}
