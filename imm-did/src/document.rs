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

//! [W3C DID Core][1] documents and the results of resolution, creation and
//! publication.
//!
//! [1]: https://www.w3.org/TR/did-core/

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The base DID Core JSON-LD context.
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";

/// Media type of resolved DID Documents.
pub const DID_LD_JSON: &str = "application/did+ld+json";

/// JSON object type, used for JWKs.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

fn default_context() -> Vec<String> {
    vec![DID_CONTEXT_V1.to_owned()]
}

/// A DID Document.
///
/// Documents are snapshots: resolvers and managers hand out fresh values and
/// never update a returned document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// JSON-LD contexts.
    #[serde(rename = "@context", default = "default_context")]
    pub context: Vec<String>,
    /// The DID.
    pub id: String,
    /// Controllers of the DID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<Vec<String>>,
    /// Verification methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,
    /// Ids of verification methods usable for authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<String>>,
    /// Ids of verification methods usable for issuing credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<String>>,
    /// Ids of verification methods usable for key agreement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<String>>,
    /// Service endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<DidService>>,
}

impl DidDocument {
    /// An otherwise empty document of `id` with the base context.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: default_context(),
            id: id.into(),
            controller: None,
            verification_method: None,
            authentication: None,
            assertion_method: None,
            key_agreement: None,
            service: None,
        }
    }

    /// Looks up a verification method by its id.
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|method| method.id == id)
    }
}

/// A public key of a DID subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// The method id, usually `<did>#<fragment>`.
    pub id: String,
    /// The key type, e.g. `Ed25519VerificationKey2020`.
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID controlling the key.
    pub controller: String,
    /// The key as a multibase string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    /// The key as a JWK.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JsonObject>,
}

/// A service endpoint of a DID subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidService {
    /// The service id.
    pub id: String,
    /// The service type.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Where the service is reachable.
    pub service_endpoint: String,
}

/// Why a DID could not be resolved.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionError {
    /// The input is not a DID.
    #[strum(to_string = "invalidDid")]
    InvalidDid,
    /// No resolver produced a document.
    #[strum(to_string = "notFound")]
    NotFound,
}

/// Metadata of a resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionMetadata {
    /// Media type of the document.
    pub content_type: String,
    /// Set if no document was resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionError>,
    /// When the resolution started.
    pub retrieved: DateTime<Utc>,
    /// How long the resolution took, in milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// The result of resolving a DID with the
/// [`UniversalDidResolver`](crate::UniversalDidResolver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolutionResult {
    /// The document, absent on failure.
    pub did_document: Option<DidDocument>,
    /// Resolution metadata.
    #[serde(rename = "didResolutionMetadata")]
    pub metadata: DidResolutionMetadata,
}

/// Method-specific options for creating a DID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCreationOptions {
    /// For `did:prism`: an agent URL overriding the configured one.
    #[serde(default)]
    pub agent_api_url: Option<String>,
    /// For `did:prism`: an API key overriding the configured one.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// The outcome of a publication request the agent answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidPublicationResult {
    /// Whether the agent accepted the publication.
    pub success: bool,
    /// `publication_pending` on success, `error` on rejection.
    pub status: String,
    /// Id of the scheduled ledger operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_operation: Option<String>,
    /// The rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DidPublicationResult {
    pub(crate) fn failed(status: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.to_owned(),
            scheduled_operation: None,
            error: Some(error.into()),
        }
    }
}

/// The outcome of [`DidPublisher::publish`](crate::DidPublisher::publish).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicationOutcome {
    /// The agent answered, accepting or rejecting the publication.
    Answered(DidPublicationResult),
    /// The agent could not be reached; carries the reason.
    Unreachable(String),
}

impl PublicationOutcome {
    /// The outcome as a publication result; an unreachable agent is an
    /// unsuccessful result without a status.
    pub fn into_result(self) -> DidPublicationResult {
        match self {
            Self::Answered(result) => result,
            Self::Unreachable(reason) => DidPublicationResult::failed("", reason),
        }
    }
}

/// The ledger status of a DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidStatusResult {
    /// The DID.
    pub did: String,
    /// Uppercase status, e.g. `CREATED`, `PUBLICATION_PENDING`, `PUBLISHED`.
    pub status: String,
    /// The ledger, e.g. `cardano`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,
    /// The ledger network, e.g. `preprod`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl DidStatusResult {
    pub(crate) fn bare(did: &str, status: &str) -> Self {
        Self {
            did: did.to_owned(),
            status: status.to_owned(),
            blockchain: None,
            network: None,
        }
    }
}
