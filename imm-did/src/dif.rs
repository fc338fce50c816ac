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

//! Read-only resolvers speaking the [DIF resolution API][1]
//! (`GET {base}/1.0/identifiers/{did}`), used for `did:cheqd` and
//! `did:midnight`.
//!
//! [1]: https://w3c.github.io/did-resolution/

use serde::Deserialize;
use serde_json::Value;

use crate::{
    document::JsonObject,
    utils::{fetch_json, identifiers_url, trim_url},
    DidDocument, DidResolver, DidService, VerificationMethod, DID_CONTEXT_V1,
};

/// Default public resolver of `did:cheqd`.
pub const CHEQD_RESOLVER_URL: &str = "https://resolver.cheqd.net";
/// Default resolver of `did:midnight`.
pub const MIDNIGHT_RESOLVER_URL: &str = "https://indexer.testnet.midnight.network";

const DEFAULT_VERIFICATION_METHOD_TYPE: &str = "Ed25519VerificationKey2020";

/// A DIF resolution response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResolutionEnvelope {
    did_document: Option<RemoteDocument>,
}

/// A DID Document as returned by remote resolvers, every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteDocument {
    #[serde(rename = "@context", default, deserialize_with = "context")]
    context: Option<Vec<String>>,
    id: Option<String>,
    controller: Option<Value>,
    verification_method: Option<Vec<RemoteVerificationMethod>>,
    authentication: Option<Vec<Value>>,
    assertion_method: Option<Vec<Value>>,
    key_agreement: Option<Vec<Value>>,
    service: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteVerificationMethod {
    id: Option<String>,
    #[serde(rename = "type")]
    method_type: Option<String>,
    controller: Option<String>,
    public_key_multibase: Option<String>,
    public_key_jwk: Option<JsonObject>,
}

/// `@context` may be a single string or a list mixing strings and objects;
/// only the strings are kept.
fn context<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(context)) => Some(vec![context]),
        Some(Value::Array(contexts)) => Some(
            contexts
                .into_iter()
                .filter_map(|context| match context {
                    Value::String(context) => Some(context),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Keeps the string references of a verification relationship; embedded
/// verification methods are referenced by their id.
fn references(relationship: Option<Vec<Value>>) -> Vec<String> {
    relationship
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(reference) => Some(reference),
            Value::Object(method) => method.get("id").and_then(Value::as_str).map(str::to_owned),
            _ => None,
        })
        .collect()
}

impl RemoteDocument {
    /// Converts to a [`DidDocument`], filling in the defaults: the base
    /// context, `Ed25519VerificationKey2020` as method type and the document
    /// itself as controller.
    pub(crate) fn into_document(self) -> DidDocument {
        let id = self.id.unwrap_or_default();

        let verification_method = self
            .verification_method
            .unwrap_or_default()
            .into_iter()
            .map(|method| VerificationMethod {
                id: method.id.unwrap_or_default(),
                method_type: method
                    .method_type
                    .unwrap_or_else(|| DEFAULT_VERIFICATION_METHOD_TYPE.to_owned()),
                controller: method.controller.unwrap_or_else(|| id.clone()),
                public_key_multibase: method.public_key_multibase,
                public_key_jwk: method.public_key_jwk,
            })
            .collect();

        let controller = match self.controller {
            Some(Value::String(controller)) => Some(vec![controller]),
            Some(Value::Array(controllers)) => Some(references(Some(controllers))),
            _ => None,
        };

        DidDocument {
            context: self
                .context
                .filter(|context| !context.is_empty())
                .unwrap_or_else(|| vec![DID_CONTEXT_V1.to_owned()]),
            controller,
            verification_method: Some(verification_method),
            authentication: Some(references(self.authentication)),
            assertion_method: Some(references(self.assertion_method)),
            key_agreement: self.key_agreement.map(|refs| references(Some(refs))),
            // Services with structured endpoints are not representable.
            service: self.service.map(|services| {
                services
                    .into_iter()
                    .filter_map(|service| serde_json::from_value::<DidService>(service).ok())
                    .collect()
            }),
            id,
        }
    }
}

impl ResolutionEnvelope {
    pub(crate) fn into_document(self) -> Option<DidDocument> {
        self.did_document.map(RemoteDocument::into_document)
    }
}

/// Resolves one DID method through a DIF resolver endpoint.
#[derive(Debug, Clone)]
pub struct DifResolver {
    method: &'static str,
    base_url: String,
    client: reqwest::Client,
}

impl DifResolver {
    /// A resolver of `did:<method>` DIDs against `base_url`.
    pub fn new(method: &'static str, base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            method,
            base_url: trim_url(base_url),
            client,
        }
    }

    /// The `did:cheqd` resolver.
    pub fn cheqd(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self::new("cheqd", base_url, client)
    }

    /// The `did:midnight` resolver.
    pub fn midnight(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self::new("midnight", base_url, client)
    }

    /// The resolver endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DidResolver for DifResolver {
    fn method(&self) -> &str {
        self.method
    }

    async fn resolve(&self, did: &str) -> Option<DidDocument> {
        if !self.can_resolve(did) {
            return None;
        }

        let url = identifiers_url(&self.base_url, did);
        fetch_json::<ResolutionEnvelope>(self.client.get(url), did)
            .await?
            .into_document()
    }
}
