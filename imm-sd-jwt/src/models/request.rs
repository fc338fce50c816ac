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
use serde::{Deserialize, Serialize};

use crate::{JsonObject, VerifiableCredential, VerificationError};

/// The format tag of every credential this crate issues.
pub const VC_SD_JWT_FORMAT: &str = "vc+sd-jwt";

/// A request to issue one credential.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRequest {
    /// Issuer DID; also selects the signing key.
    pub issuer_did: String,
    /// Subject (holder) DID, written to `credentialSubject.id`.
    pub subject_did: String,
    /// A type from the schema registry, e.g. `I20Credential`.
    pub credential_type: String,
    /// Claim values by name.
    #[serde(default)]
    pub claims: JsonObject,
    /// Claims to make selectively disclosable instead of the schema default.
    ///
    /// An absent or empty list selects the schema default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selective_disclosure_claims: Option<Vec<String>>,
    /// Validity in days from now; no expiry when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_days: Option<i64>,
}

/// The result of a successful issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    /// The repository id of the credential.
    pub credential_id: String,
    /// The compact SD-JWT with all disclosures.
    pub serialized_credential: String,
    /// Always [`VC_SD_JWT_FORMAT`].
    pub format: String,
    /// The credential the token was built from.
    pub credential: VerifiableCredential,
}

/// The outcome of verifying a presented credential.
///
/// Verification never fails with an error; a bad credential yields
/// `is_valid == false` with the reason in `error`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the signature, disclosures and validity period all check out.
    pub is_valid: bool,
    /// Why the credential is invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The `iss` of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    /// `credentialSubject.id`, if it was disclosed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_did: Option<String>,
    /// The credential type from `vc.type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    /// The `jti` of the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    /// The always-visible claims plus the claims of the presented disclosures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosed_claims: Option<JsonObject>,
    /// From `iat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,
    /// From `exp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    /// The revocation state, when the credential is known to the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_revoked: Option<bool>,
}

impl VerificationResult {
    pub(crate) fn invalid(reason: &VerificationError) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.to_string()),
            ..Default::default()
        }
    }
}
