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

use serde::{Deserialize, Serialize};

use crate::{CredentialStatus, JsonObject};

/// The signed payload of an issued SD-JWT VC.
///
/// Every field is optional on the way in, so that a token lacking e.g. `iss`
/// is reported as such instead of as an unparseable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdJwtVcClaims {
    /// Issuer DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Issuance time, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// The credential id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// The disclosure hash algorithm; only present when there are disclosures.
    #[serde(rename = "_sd_alg", default, skip_serializing_if = "Option::is_none")]
    pub sd_alg: Option<String>,
    /// The credential body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc: Option<VcClaims>,
}

/// The `vc` claim of [`SdJwtVcClaims`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcClaims {
    /// JSON-LD contexts.
    #[serde(rename = "@context", default)]
    pub context: Vec<String>,
    /// `["VerifiableCredential", <credential type>]`.
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
    /// Claims shown unconditionally, plus the `_sd` digests of the rest.
    #[serde(default)]
    pub credential_subject: JsonObject,
    /// The revocation entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
}
