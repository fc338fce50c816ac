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

const CONTEXT_VC_V2: &str = "https://www.w3.org/ns/credentials/v2";
const TYPE_VC: &str = "VerifiableCredential";
const TYPE_CREDENTIAL: &str = "BitstringStatusListCredential";
const TYPE_LIST: &str = "BitstringStatusList";
const PURPOSE_REVOCATION: &str = "revocation";

/// The public, unsigned [`BitstringStatusListCredential`][1] of an issuer.
///
/// [1]: https://www.w3.org/TR/vc-bitstring-status-list/#bitstringstatuslistcredential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitstringStatusListCredential {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The URL the list is published under.
    pub id: String,
    /// `["VerifiableCredential", "BitstringStatusListCredential"]`.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// DID of the issuer.
    pub issuer: String,
    /// Time of the last change of the list.
    pub valid_from: DateTime<Utc>,
    /// The list itself.
    pub credential_subject: BitstringStatusList,
}

/// The `credentialSubject` of a [`BitstringStatusListCredential`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitstringStatusList {
    /// `<url>#list`.
    pub id: String,
    /// Always `BitstringStatusList`.
    #[serde(rename = "type")]
    pub list_type: String,
    /// Always `revocation`.
    pub status_purpose: String,
    /// GZIP-compressed bits, multibase `base64url`.
    pub encoded_list: String,
}

impl BitstringStatusListCredential {
    pub(crate) fn new(
        issuer_did: &str,
        url: &str,
        encoded_list: String,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            context: vec![CONTEXT_VC_V2.to_owned()],
            id: url.to_owned(),
            types: vec![TYPE_VC.to_owned(), TYPE_CREDENTIAL.to_owned()],
            issuer: issuer_did.to_owned(),
            valid_from: last_updated,
            credential_subject: BitstringStatusList {
                id: format!("{url}#list"),
                list_type: TYPE_LIST.to_owned(),
                status_purpose: PURPOSE_REVOCATION.to_owned(),
                encoded_list,
            },
        }
    }
}
