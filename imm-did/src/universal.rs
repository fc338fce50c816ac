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

use std::time::Instant;

use bherror::{Error, Result};
use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::{
    dif::{RemoteDocument, ResolutionEnvelope},
    utils::{fetch_json, identifiers_url, trim_url},
    DidDocument, DidError, DidResolutionMetadata, DidResolutionResult, DidResolver,
    ResolutionError, DID_LD_JSON,
};

/// Object safe view of a [`DidResolver`].
trait RegisteredResolver: Send + Sync {
    fn method(&self) -> &str;
    fn can_resolve(&self, did: &str) -> bool;
    fn resolve<'a>(&'a self, did: &'a str) -> BoxFuture<'a, Option<DidDocument>>;
}

impl<R: DidResolver + Send> RegisteredResolver for R {
    fn method(&self) -> &str {
        DidResolver::method(self)
    }

    fn can_resolve(&self, did: &str) -> bool {
        DidResolver::can_resolve(self, did)
    }

    fn resolve<'a>(&'a self, did: &'a str) -> BoxFuture<'a, Option<DidDocument>> {
        Box::pin(DidResolver::resolve(self, did))
    }
}

#[derive(Debug, Clone)]
struct Fallback {
    base_url: String,
    client: reqwest::Client,
}

/// Routes DIDs to the resolver of their method.
///
/// Resolvers are tried in registration order and the first document wins;
/// since at most one resolver is registered per method, that is the resolver
/// of the DID's method. If it yields nothing, a configured DIF universal
/// resolver endpoint is asked as a last resort.
#[derive(Default)]
pub struct UniversalDidResolver {
    resolvers: Vec<Box<dyn RegisteredResolver>>,
    fallback: Option<Fallback>,
}

impl std::fmt::Debug for UniversalDidResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniversalDidResolver")
            .field("methods", &self.supported_methods())
            .field("fallback", &self.fallback.as_ref().map(|f| &f.base_url))
            .finish()
    }
}

impl UniversalDidResolver {
    /// A resolver without any methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `resolver` for its method.
    ///
    /// # Errors
    ///
    /// [`DidError::DuplicateMethod`] if the method already has a resolver.
    pub fn register<R>(&mut self, resolver: R) -> Result<(), DidError>
    where
        R: DidResolver + Send + 'static,
    {
        let method = DidResolver::method(&resolver);
        if self.resolvers.iter().any(|r| r.method() == method) {
            return Err(Error::root(DidError::DuplicateMethod(method.to_owned())));
        }

        self.resolvers.push(Box::new(resolver));
        Ok(())
    }

    /// Registers `resolver`, consuming and returning `self`.
    pub fn with_resolver<R>(mut self, resolver: R) -> Result<Self, DidError>
    where
        R: DidResolver + Send + 'static,
    {
        self.register(resolver)?;
        Ok(self)
    }

    /// Falls back to the DIF universal resolver at `base_url`.
    pub fn with_fallback(mut self, base_url: impl Into<String>, client: reqwest::Client) -> Self {
        self.fallback = Some(Fallback {
            base_url: trim_url(base_url),
            client,
        });
        self
    }

    /// The methods of the registered resolvers, in registration order.
    pub fn supported_methods(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.method()).collect()
    }

    /// Resolves `did`.
    ///
    /// Never fails; the metadata carries `invalidDid` for input that is not a
    /// DID and `notFound` if no resolver produced a document.
    pub async fn resolve(&self, did: &str) -> DidResolutionResult {
        let started = Instant::now();
        let retrieved = Utc::now();

        let outcome = if did.trim().is_empty() || !did.starts_with("did:") {
            Err(ResolutionError::InvalidDid)
        } else {
            self.resolve_document(did)
                .await
                .ok_or(ResolutionError::NotFound)
        };

        let (did_document, error) = match outcome {
            Ok(document) => (Some(document), None),
            Err(error) => (None, Some(error)),
        };

        DidResolutionResult {
            did_document,
            metadata: DidResolutionMetadata {
                content_type: DID_LD_JSON.to_owned(),
                error,
                retrieved,
                duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            },
        }
    }

    async fn resolve_document(&self, did: &str) -> Option<DidDocument> {
        for resolver in self.resolvers.iter().filter(|r| r.can_resolve(did)) {
            debug!(did, method = resolver.method(), "resolving DID");

            if let Some(document) = resolver.resolve(did).await {
                return Some(document);
            }
        }

        let fallback = self.fallback.as_ref()?;
        debug!(did, "falling back to the universal resolver");

        let url = identifiers_url(&fallback.base_url, did);
        let response: Value = fetch_json(fallback.client.get(url), did).await?;
        universal_document(response)
    }
}

/// Accepts either a DIF resolution envelope or a bare DID Document.
fn universal_document(response: Value) -> Option<DidDocument> {
    if response.get("didDocument").is_some() {
        return serde_json::from_value::<ResolutionEnvelope>(response)
            .ok()?
            .into_document();
    }

    let document: RemoteDocument = serde_json::from_value(response).ok()?;
    let document = document.into_document();
    (!document.id.is_empty()).then_some(document)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    struct Fixed {
        method: &'static str,
        document: Option<&'static str>,
    }

    impl DidResolver for Fixed {
        fn method(&self) -> &str {
            self.method
        }

        async fn resolve(&self, _did: &str) -> Option<DidDocument> {
            self.document.map(DidDocument::new)
        }
    }

    fn fixed(method: &'static str, document: Option<&'static str>) -> Fixed {
        Fixed { method, document }
    }

    #[test]
    fn duplicate_methods_are_rejected() {
        let mut resolver = UniversalDidResolver::new();
        resolver.register(fixed("key", None)).unwrap();
        resolver.register(fixed("web", None)).unwrap();

        let err = resolver.register(fixed("key", Some("x"))).unwrap_err();

        assert_matches!(err.error, DidError::DuplicateMethod(ref m) if m == "key");
        assert_eq!(resolver.supported_methods(), ["key", "web"]);
    }

    #[tokio::test]
    async fn invalid_and_unknown_dids() {
        let resolver = UniversalDidResolver::new()
            .with_resolver(fixed("key", Some("did:key:z6Mk")))
            .unwrap();

        for input in ["", "   ", "key:z6Mk", "https://example.com"] {
            let result = resolver.resolve(input).await;
            assert_eq!(result.did_document, None);
            assert_eq!(result.metadata.error, Some(ResolutionError::InvalidDid));
        }

        let result = resolver.resolve("did:unknown:abc").await;
        assert_eq!(result.did_document, None);
        assert_eq!(result.metadata.error, Some(ResolutionError::NotFound));
        assert_eq!(result.metadata.content_type, DID_LD_JSON);
    }

    #[tokio::test]
    async fn dispatches_by_method() {
        let resolver = UniversalDidResolver::new()
            .with_resolver(fixed("web", Some("did:web:school.example")))
            .unwrap()
            .with_resolver(fixed("key", Some("did:key:z6Mk")))
            .unwrap()
            .with_resolver(fixed("cheqd", None))
            .unwrap();

        let result = resolver.resolve("did:key:z6Mk").await;
        assert_eq!(result.did_document.unwrap().id, "did:key:z6Mk");
        assert_eq!(result.metadata.error, None);

        let result = resolver.resolve("did:cheqd:mainnet:abc123").await;
        assert_eq!(result.metadata.error, Some(ResolutionError::NotFound));
    }

    #[test]
    fn universal_response_shapes() {
        let envelope = json!({
            "didDocument": {"id": "did:ion:abc"},
            "didResolutionMetadata": {},
            "didDocumentMetadata": {}
        });
        assert_eq!(universal_document(envelope).unwrap().id, "did:ion:abc");

        let bare = json!({"@context": "https://www.w3.org/ns/did/v1", "id": "did:ion:abc"});
        assert_eq!(universal_document(bare).unwrap().id, "did:ion:abc");

        assert_eq!(universal_document(json!({"didDocument": null})), None);
        assert_eq!(universal_document(json!({"error": "notFound"})), None);
        assert_eq!(universal_document(json!([1, 2])), None);
    }
}
