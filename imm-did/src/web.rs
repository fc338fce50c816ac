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

//! The [`did:web`][1] method: the document is fetched from a URL derived
//! from the DID.
//!
//! [1]: https://w3c-ccg.github.io/did-method-web/

use tracing::debug;

use crate::{utils::fetch_json, DidDocument, DidResolver};

const DID_WEB_PREFIX: &str = "did:web:";

/// Maps a `did:web` to the URL of its document.
///
/// ```
/// use imm_did::did_web_to_url;
///
/// assert_eq!(
///     did_web_to_url("did:web:example.com").as_deref(),
///     Some("https://example.com/.well-known/did.json")
/// );
/// assert_eq!(
///     did_web_to_url("did:web:example.com%3A3000:user:alice").as_deref(),
///     Some("https://example.com:3000/user/alice/did.json")
/// );
/// assert_eq!(did_web_to_url("did:key:z6Mk"), None);
/// ```
pub fn did_web_to_url(did: &str) -> Option<String> {
    web_url("https", did)
}

fn web_url(scheme: &str, did: &str) -> Option<String> {
    let mut segments = did.strip_prefix(DID_WEB_PREFIX)?.split(':');

    let domain = urlencoding::decode(segments.next()?).ok()?;
    if domain.is_empty() {
        return None;
    }

    let path = segments
        .map(|segment| urlencoding::decode(segment).ok().filter(|s| !s.is_empty()))
        .collect::<Option<Vec<_>>>()?;

    if path.is_empty() {
        Some(format!("{scheme}://{domain}/.well-known/did.json"))
    } else {
        Some(format!("{scheme}://{domain}/{}/did.json", path.join("/")))
    }
}

/// Resolves `did:web` DIDs over HTTPS.
#[derive(Debug, Clone)]
pub struct DidWebResolver {
    client: reqwest::Client,
    scheme: &'static str,
}

impl DidWebResolver {
    /// Creates a resolver fetching documents with `client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            scheme: "https",
        }
    }

    #[cfg(test)]
    fn plain_http(client: reqwest::Client) -> Self {
        Self {
            client,
            scheme: "http",
        }
    }
}

impl DidResolver for DidWebResolver {
    fn method(&self) -> &str {
        "web"
    }

    async fn resolve(&self, did: &str) -> Option<DidDocument> {
        let Some(url) = web_url(self.scheme, did) else {
            debug!(did, "not a valid did:web");
            return None;
        };

        fetch_json(self.client.get(url), did).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::utils::http_client;

    fn client() -> reqwest::Client {
        http_client(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn url_mapping() {
        assert_eq!(
            did_web_to_url("did:web:w3c-ccg.github.io:user:alice").as_deref(),
            Some("https://w3c-ccg.github.io/user/alice/did.json")
        );
        assert_eq!(
            did_web_to_url("did:web:school.example:dso%20office").as_deref(),
            Some("https://school.example/dso office/did.json")
        );
        assert_eq!(did_web_to_url("did:web:"), None);
        assert_eq!(did_web_to_url("did:web:example.com::x"), None);
        assert_eq!(did_web_to_url("did:web:%FF"), None);
        assert_eq!(did_web_to_url("web:example.com"), None);
    }

    #[tokio::test]
    async fn fetches_document() {
        let server = MockServer::start().await;
        let host = server.address().to_string().replace(':', "%3A");
        let did = format!("did:web:{host}:issuers:consulate");

        Mock::given(method("GET"))
            .and(path("/issuers/consulate/did.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "@context": ["https://www.w3.org/ns/did/v1"],
                "id": did,
                "assertionMethod": [format!("{did}#key-1")]
            })))
            .mount(&server)
            .await;

        let resolver = DidWebResolver::plain_http(client());
        let document = resolver.resolve(&did).await.unwrap();

        assert_eq!(document.id, did);
        assert_eq!(document.assertion_method, Some(vec![format!("{did}#key-1")]));
    }

    #[tokio::test]
    async fn failures_resolve_to_none() {
        let server = MockServer::start().await;
        let host = server.address().to_string().replace(':', "%3A");

        Mock::given(method("GET"))
            .and(path("/broken/did.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let resolver = DidWebResolver::plain_http(client());

        // Unmatched paths answer 404.
        assert_eq!(resolver.resolve(&format!("did:web:{host}")).await, None);
        assert_eq!(resolver.resolve(&format!("did:web:{host}:broken")).await, None);
        assert_eq!(resolver.resolve("did:web:127.0.0.1%3A1").await, None);
    }
}
