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

//! Models of [OpenID for Verifiable Presentations][1] with
//! [DIF Presentation Exchange][2] definitions.
//!
//! [1]: https://openid.net/specs/openid-4-verifiable-presentations-1_0.html
//! [2]: https://identity.foundation/presentation-exchange/spec/v2.0.0/

use std::collections::BTreeMap;

use imm_sd_jwt::{JsonObject, VerificationResult, VC_SD_JWT_FORMAT};
use serde::{Deserialize, Serialize};

/// The only supported response type.
pub const VP_TOKEN: &str = "vp_token";

/// Path receiving wallet responses, relative to the verifier URL.
pub const RESPONSE_PATH: &str = "/api/oid4vp/response";

fn new_definition_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn default_format() -> String {
    VC_SD_JWT_FORMAT.to_owned()
}

fn default_filter_type() -> String {
    "string".to_owned()
}

fn default_descriptor_path() -> String {
    "$".to_owned()
}

/// What a verifier asks the holder to present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationDefinition {
    /// Definition id; a random one when absent on the wire.
    #[serde(default = "new_definition_id")]
    pub id: String,
    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Why the verifier asks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// One descriptor per requested credential.
    #[serde(default)]
    pub input_descriptors: Vec<InputDescriptor>,
}

/// A requested credential.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputDescriptor {
    /// Descriptor id, referenced by the submission.
    #[serde(default)]
    pub id: String,
    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Why the credential is needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Accepted formats and their algorithms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<BTreeMap<String, FormatRequirement>>,
    /// Claims the credential must contain.
    #[serde(default)]
    pub constraints: Constraints,
}

/// Accepted signing algorithms of a format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormatRequirement {
    /// `alg` values, e.g. `EdDSA`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<Vec<String>>,
}

/// Constraints of an input descriptor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Required fields.
    #[serde(default)]
    pub fields: Vec<FieldConstraint>,
}

/// A required field, given as JSONPath alternatives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldConstraint {
    /// JSONPath expressions, e.g. `$.vc.credentialSubject.programStatus`.
    #[serde(default)]
    pub path: Vec<String>,
    /// A JSON Schema the field value must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterConstraint>,
}

impl FieldConstraint {
    /// A constraint requiring the field at `path`.
    pub fn required(path: &str) -> Self {
        Self {
            path: vec![path.to_owned()],
            filter: None,
        }
    }

    /// A constraint requiring the field at `path` to equal `value`.
    pub fn equal_to(path: &str, value: &str) -> Self {
        Self {
            path: vec![path.to_owned()],
            filter: Some(FilterConstraint {
                filter_type: default_filter_type(),
                constant: Some(value.to_owned()),
                pattern: None,
            }),
        }
    }
}

/// The JSON Schema subset used in field filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConstraint {
    /// The JSON type.
    #[serde(rename = "type", default = "default_filter_type")]
    pub filter_type: String,
    /// The required value.
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,
    /// A regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// An authorization request sent to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationRequest {
    /// Always [`VP_TOKEN`].
    pub response_type: String,
    /// What to present.
    pub presentation_definition: PresentationDefinition,
    /// Nonce binding the presentation to this request.
    pub nonce: String,
    /// Where the wallet posts its response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_uri: Option<String>,
    /// Correlates the response with this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// The wallet's response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PresentationResponse {
    /// The presented SD-JWT with the chosen disclosures.
    #[serde(default)]
    pub vp_token: String,
    /// How the token satisfies the definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_submission: Option<PresentationSubmission>,
    /// The `state` of the request being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Maps presented credentials to input descriptors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PresentationSubmission {
    /// Submission id.
    #[serde(default)]
    pub id: String,
    /// The answered definition.
    #[serde(default)]
    pub definition_id: String,
    /// One entry per presented credential.
    #[serde(default)]
    pub descriptor_map: Vec<DescriptorMap>,
}

/// Locates the credential answering one input descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorMap {
    /// The input descriptor id.
    pub id: String,
    /// Format of the presented credential.
    #[serde(default = "default_format")]
    pub format: String,
    /// JSONPath into the VP token.
    #[serde(default = "default_descriptor_path")]
    pub path: String,
}

/// The verifier's verdict on a presentation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationVerificationResult {
    /// Whether the presented credential verified.
    pub is_valid: bool,
    /// Why it did not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The definition named in the submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_definition_id: Option<String>,
    /// The disclosed claims.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosed_claims: Option<JsonObject>,
    /// The credential issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_did: Option<String>,
    /// The credential subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_did: Option<String>,
}

impl PresentationVerificationResult {
    /// The verdict from a credential `verification` answering
    /// `definition_id`.
    pub fn new(verification: VerificationResult, definition_id: Option<String>) -> Self {
        Self {
            is_valid: verification.is_valid,
            error: verification.error,
            presentation_definition_id: definition_id,
            disclosed_claims: verification.disclosed_claims,
            issuer_did: verification.issuer_did,
            subject_did: verification.subject_did,
        }
    }
}
