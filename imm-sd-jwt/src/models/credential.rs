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

use crate::JsonObject;

pub(crate) const CONTEXT_VC_V2: &str = "https://www.w3.org/ns/credentials/v2";
pub(crate) const TYPE_VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";
const STATUS_ENTRY_TYPE: &str = "BitstringStatusListEntry";
const STATUS_PURPOSE_REVOCATION: &str = "revocation";

/// A credential in the [W3C Verifiable Credentials Data Model 2.0][1], as it
/// exists before its subject is split into visible claims and disclosures.
///
/// [1]: https://www.w3.org/TR/vc-data-model-2.0/
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// `urn:uuid:<v4>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `["VerifiableCredential", <credential type>]`.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// The issuer DID.
    pub issuer: String,
    /// Issuance time.
    pub valid_from: DateTime<Utc>,
    /// Expiry, absent for credentials without a validity period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    /// All claims plus the subject `id`.
    pub credential_subject: JsonObject,
    /// Where the revocation bit of the credential lives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<CredentialStatus>,
}

impl VerifiableCredential {
    /// The credential type, i.e. the first `type` entry that is not
    /// `VerifiableCredential`.
    pub fn credential_type(&self) -> Option<&str> {
        credential_type_of(&self.types)
    }
}

pub(crate) fn credential_type_of(types: &[String]) -> Option<&str> {
    types
        .iter()
        .map(String::as_str)
        .find(|t| *t != TYPE_VERIFIABLE_CREDENTIAL)
}

/// A [`BitstringStatusListEntry`][1] pointing at the credential's revocation
/// bit.
///
/// [1]: https://www.w3.org/TR/vc-bitstring-status-list/#bitstringstatuslistentry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    /// `<issuer>#status-<index>`.
    pub id: String,
    /// Always `BitstringStatusListEntry`.
    #[serde(rename = "type")]
    pub status_type: String,
    /// Always `revocation`.
    pub status_purpose: String,
    /// The bit index, as a decimal string.
    pub status_list_index: String,
    /// URL of the issuer's status list credential.
    pub status_list_credential: String,
}

impl CredentialStatus {
    /// The revocation entry for bit `index` of `issuer_did`'s list published at
    /// `status_list_url`.
    pub fn revocation(issuer_did: &str, index: usize, status_list_url: String) -> Self {
        Self {
            id: format!("{issuer_did}#status-{index}"),
            status_type: STATUS_ENTRY_TYPE.to_owned(),
            status_purpose: STATUS_PURPOSE_REVOCATION.to_owned(),
            status_list_index: index.to_string(),
            status_list_credential: status_list_url,
        }
    }

    /// The bit index, if it is a valid decimal number.
    pub fn index(&self) -> Option<usize> {
        self.status_list_index.parse().ok()
    }
}
