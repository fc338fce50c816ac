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

//! `did:prism` through the REST API of a Hyperledger Identus Cloud Agent:
//!
//! * `GET  /did-registrar/dids/{did}` resolves a DID and reports its status,
//! * `POST /did-registrar/dids` creates a DID,
//! * `POST /did-registrar/dids/{did}/publications` publishes it to Cardano.

use bherror::{traits::ForeignError as _, Error, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    utils::{fetch_json, trim_url},
    DidCreationOptions, DidDocument, DidError, DidManager, DidPublicationResult, DidPublisher,
    DidResolver, DidStatusResult, PublicationOutcome, VerificationMethod,
};

/// Default URL of a local Identus Cloud Agent.
pub const PRISM_AGENT_URL: &str = "http://localhost:8080/cloud-agent";

const PRISM_PREFIX: &str = "did:prism:";
const API_KEY_HEADER: &str = "apikey";
const AUTHENTICATION_KEY: &str = "key-1";
const ASSERTION_KEY: &str = "key-2";
const KEY_TYPE: &str = "Ed25519VerificationKey2020";

const STATUS_PUBLICATION_PENDING: &str = "publication_pending";
const STATUS_UNKNOWN: &str = "UNKNOWN";
const STATUS_UNSUPPORTED: &str = "UNSUPPORTED";
const STATUS_AGENT_UNREACHABLE: &str = "AGENT_UNREACHABLE";
const LEDGER: &str = "cardano";
const LEDGER_NETWORK: &str = "preprod";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagedDid {
    did: Option<String>,
    long_form_did: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicationResponse {
    scheduled_operation: Option<ScheduledOperation>,
}

#[derive(Debug, Deserialize)]
struct ScheduledOperation {
    id: Option<String>,
}

/// Client of an Identus Cloud Agent, resolving, creating and publishing
/// `did:prism` DIDs.
#[derive(Clone)]
pub struct PrismAgentClient {
    agent_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for PrismAgentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrismAgentClient")
            .field("agent_url", &self.agent_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PrismAgentClient {
    /// A client of the agent at `agent_url`, authenticating with `api_key` if
    /// given.
    pub fn new(agent_url: impl Into<String>, api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            agent_url: trim_url(agent_url),
            api_key: api_key.filter(|key| !key.is_empty()),
            client,
        }
    }

    /// The agent URL.
    pub fn agent_url(&self) -> &str {
        &self.agent_url
    }

    fn dids_url(agent_url: &str) -> String {
        format!("{agent_url}/did-registrar/dids")
    }

    fn did_url(&self, did: &str) -> String {
        format!("{}/{}", Self::dids_url(&self.agent_url), urlencoding::encode(did))
    }

    fn authenticated(
        &self,
        request: reqwest::RequestBuilder,
        api_key: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match api_key.or(self.api_key.as_deref()) {
            Some(api_key) => request.header(API_KEY_HEADER, api_key),
            None => request,
        }
    }

    fn unreachable(&self) -> String {
        format!("Cannot reach Identus Cloud Agent at {}", self.agent_url)
    }
}

/// The document of a freshly created, not yet published DID.
fn created_document(did: String, long_form_did: Option<String>) -> DidDocument {
    let method = |fragment: &str| VerificationMethod {
        id: format!("{did}#{fragment}"),
        method_type: KEY_TYPE.to_owned(),
        controller: did.clone(),
        public_key_multibase: None,
        public_key_jwk: None,
    };

    let mut document = DidDocument::new(long_form_did.unwrap_or_else(|| did.clone()));
    document.verification_method = Some(vec![method(AUTHENTICATION_KEY), method(ASSERTION_KEY)]);
    document.authentication = Some(vec![format!("{did}#{AUTHENTICATION_KEY}")]);
    document.assertion_method = Some(vec![format!("{did}#{ASSERTION_KEY}")]);
    document
}

fn prefixed(did: String) -> String {
    if did.starts_with(PRISM_PREFIX) {
        did
    } else {
        format!("{PRISM_PREFIX}{did}")
    }
}

impl DidResolver for PrismAgentClient {
    fn method(&self) -> &str {
        "prism"
    }

    async fn resolve(&self, did: &str) -> Option<DidDocument> {
        if !self.can_resolve(did) {
            return None;
        }

        let request = self.authenticated(self.client.get(self.did_url(did)), None);
        let managed: ManagedDid = fetch_json(request, did).await?;

        let mut document = DidDocument::new(managed.long_form_did.or(managed.did)?);
        document.verification_method = Some(Vec::new());
        document.authentication = Some(Vec::new());
        document.assertion_method = Some(Vec::new());
        Some(document)
    }
}

impl DidManager for PrismAgentClient {
    async fn create_did(&self, options: &DidCreationOptions) -> Result<DidDocument, DidError> {
        let agent_url = options
            .agent_api_url
            .as_deref()
            .map(trim_url)
            .unwrap_or_else(|| self.agent_url.clone());

        let template = json!({
            "documentTemplate": {
                "publicKeys": [
                    {"id": AUTHENTICATION_KEY, "purpose": "authentication"},
                    {"id": ASSERTION_KEY, "purpose": "assertionMethod"},
                ],
                "services": [],
            }
        });
        let request = self.authenticated(
            self.client.post(Self::dids_url(&agent_url)).json(&template),
            options.api_key.as_deref(),
        );

        let response = request
            .send()
            .await
            .foreign_err(|| DidError::AgentUnreachable(agent_url.clone()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::root(DidError::AgentRejected(status.as_u16(), body)));
        }

        let created: ManagedDid = response
            .json()
            .await
            .foreign_err(|| DidError::InvalidResponse(agent_url.clone()))?;
        let Some(did) = created.did.or_else(|| created.long_form_did.clone()) else {
            return Err(Error::root(DidError::InvalidResponse(agent_url))
                .ctx("no DID in creation response"));
        };

        let document = created_document(prefixed(did), created.long_form_did);
        info!(did = %document.id, "created did:prism");

        Ok(document)
    }
}

impl DidPublisher for PrismAgentClient {
    async fn publish(&self, did: &str) -> PublicationOutcome {
        if !self.can_resolve(did) {
            return PublicationOutcome::Answered(DidPublicationResult::failed(
                "",
                "Only did:prism DIDs can be published to Cardano",
            ));
        }

        let url = format!("{}/publications", self.did_url(did));
        let response = match self.authenticated(self.client.post(url), None).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(agent_url = %self.agent_url, %err, "Identus Cloud Agent unreachable");
                return PublicationOutcome::Unreachable(self.unreachable());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(did, %status, body = %body, "publication rejected");
            return PublicationOutcome::Answered(DidPublicationResult::failed(
                "error",
                format!("Identus agent returned {}: {body}", status.as_u16()),
            ));
        }

        let publication: PublicationResponse = response.json().await.unwrap_or_default();
        let scheduled_operation = publication
            .scheduled_operation
            .and_then(|operation| operation.id);
        info!(did, scheduled_operation = ?scheduled_operation, "published did:prism to Cardano");

        PublicationOutcome::Answered(DidPublicationResult {
            success: true,
            status: STATUS_PUBLICATION_PENDING.to_owned(),
            scheduled_operation,
            error: None,
        })
    }

    async fn status(&self, did: &str) -> DidStatusResult {
        if !self.can_resolve(did) {
            return DidStatusResult::bare(did, STATUS_UNSUPPORTED);
        }

        let request = self.authenticated(self.client.get(self.did_url(did)), None);
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(agent_url = %self.agent_url, %err, "Identus Cloud Agent unreachable");
                return DidStatusResult::bare(did, STATUS_AGENT_UNREACHABLE);
            }
        };
        if !response.status().is_success() {
            return DidStatusResult::bare(did, STATUS_UNKNOWN);
        }

        let status = response
            .json::<ManagedDid>()
            .await
            .ok()
            .and_then(|managed| managed.status)
            .map_or_else(|| STATUS_UNKNOWN.to_owned(), |status| status.to_uppercase());

        DidStatusResult {
            did: did.to_owned(),
            status,
            blockchain: Some(LEDGER.to_owned()),
            network: Some(LEDGER_NETWORK.to_owned()),
        }
    }
}
