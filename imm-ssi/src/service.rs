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

use bherror::{traits::PropagateError as _, Error, Result};
use chrono::Duration;
use imm_did::{
    http_client, DidCreationOptions, DidDocument, DidError, DidKeyManager, DidKeyResolver,
    DidManager as _, DidPublicationResult, DidPublisher as _, DidResolutionResult,
    DidStatusResult, DidWebResolver, DifResolver, PrismAgentClient, PublicationOutcome,
    UniversalDidResolver,
};
use imm_oid4vc::{OfferStore, OfferTtls, PresentationStore};
use imm_sd_jwt::{
    imm_status_list::{BitstringStatusListCredential, StatusListRecord},
    key_store::InMemoryKeyStore,
    repository::InMemoryCredentialRepository,
    schema::{all_schemas, CredentialSchema},
    IssuanceRequest, IssuedCredential, SdJwtIssuer, VerificationResult,
};
use serde::Serialize;
use tracing::info;

use crate::{ServiceError, SsiConfig};

const PRISM_PREFIX: &str = "did:prism:";
const CREATABLE_METHODS: [&str; 2] = ["key", "prism"];
/// A century; longer lifetimes are clamped.
const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// The credential issuer wired by [`SsiService`].
pub type Issuer = SdJwtIssuer<InMemoryKeyStore, InMemoryCredentialRepository>;

/// The DID methods the service can resolve and create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DidMethods {
    /// Methods with a resolver, in resolution order.
    pub resolve: Vec<String>,
    /// Methods with a manager.
    pub create: Vec<String>,
}

/// The immigration SSI core: issuance, verification and revocation of
/// credentials, DIDs, and the OID4VCI/OID4VP handshakes.
///
/// One instance is shared by all requests; every operation takes `&self`.
#[derive(Debug)]
pub struct SsiService {
    pub(crate) config: SsiConfig,
    pub(crate) issuer: Issuer,
    resolver: UniversalDidResolver,
    prism: PrismAgentClient,
    key_manager: DidKeyManager,
    pub(crate) offers: OfferStore,
    pub(crate) presentations: PresentationStore,
}

impl SsiService {
    /// Wires every component according to `config`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Internal`] if the HTTP client cannot be built.
    pub fn new(config: SsiConfig) -> Result<Self, ServiceError> {
        let client = http_client(config.http_timeout()).with_err(|| ServiceError::Internal)?;

        let prism = PrismAgentClient::new(
            config.prism_agent_url.clone(),
            config.prism_api_key.clone(),
            client.clone(),
        );

        let mut resolver = UniversalDidResolver::new()
            .with_resolver(DidKeyResolver)
            .and_then(|r| r.with_resolver(DidWebResolver::new(client.clone())))
            .and_then(|r| r.with_resolver(prism.clone()))
            .and_then(|r| r.with_resolver(DifResolver::cheqd(&config.cheqd_resolver_url, client.clone())))
            .and_then(|r| {
                r.with_resolver(DifResolver::midnight(&config.midnight_resolver_url, client.clone()))
            })
            .with_err(|| ServiceError::Internal)?;
        if let Some(url) = &config.universal_resolver_url {
            resolver = resolver.with_fallback(url, client);
        }

        let issuer = SdJwtIssuer::new(
            InMemoryKeyStore::new(),
            InMemoryCredentialRepository::with_capacity(config.status_list_capacity()),
            config.base_url(),
        );

        let offers = OfferStore::with_ttls(OfferTtls {
            offer: seconds(config.offer_ttl_secs),
            session: seconds(config.session_ttl_secs),
            c_nonce: seconds(config.c_nonce_ttl_secs),
        });
        let presentations = PresentationStore::with_ttl(seconds(config.presentation_ttl_secs));

        info!(
            base_url = config.base_url(),
            methods = ?resolver.supported_methods(),
            "SSI service ready"
        );

        Ok(Self {
            config,
            issuer,
            resolver,
            prism,
            key_manager: DidKeyManager,
            offers,
            presentations,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &SsiConfig {
        &self.config
    }

    /// The credential issuer, with its key store and repository.
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// The OID4VCI offer store.
    pub fn offers(&self) -> &OfferStore {
        &self.offers
    }

    /// The OID4VP presentation store.
    pub fn presentations(&self) -> &PresentationStore {
        &self.presentations
    }

    /// Every credential type the service issues.
    pub fn schemas(&self) -> &'static [CredentialSchema] {
        all_schemas()
    }

    /// Issues a credential.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a bad request, otherwise
    /// [`ServiceError::Issuance`].
    pub async fn issue(&self, request: &IssuanceRequest) -> Result<IssuedCredential, ServiceError> {
        self.issuer.issue(request).await.match_err(|err| {
            if err.is_validation() {
                ServiceError::Validation(err.to_string())
            } else {
                ServiceError::Issuance
            }
        })
    }

    /// Verifies a presented credential. Never fails.
    pub async fn verify(&self, serialized_credential: &str) -> VerificationResult {
        self.issuer.verify(serialized_credential).await
    }

    /// Revokes a credential; `false` if it is unknown or already revoked.
    pub async fn revoke(&self, credential_id: &str) -> Result<bool, ServiceError> {
        self.issuer
            .revoke(credential_id)
            .await
            .with_err(|| ServiceError::Internal)
    }

    /// The status list of `issuer_did`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the issuer has not issued anything.
    pub async fn status_list(&self, issuer_did: &str) -> Result<StatusListRecord, ServiceError> {
        self.issuer
            .status_list(issuer_did)
            .await
            .with_err(|| ServiceError::Internal)?
            .ok_or_else(|| no_status_list(issuer_did))
    }

    /// The public W3C view of `issuer_did`'s status list.
    ///
    /// # Errors
    ///
    /// [`ServiceError::NotFound`] if the issuer has not issued anything.
    pub async fn status_list_credential(
        &self,
        issuer_did: &str,
    ) -> Result<BitstringStatusListCredential, ServiceError> {
        self.issuer
            .status_list_credential(issuer_did)
            .await
            .with_err(|| ServiceError::Internal)?
            .ok_or_else(|| no_status_list(issuer_did))
    }

    /// Resolves a DID. Never fails; see [`UniversalDidResolver::resolve`].
    pub async fn resolve_did(&self, did: &str) -> DidResolutionResult {
        self.resolver.resolve(did.trim()).await
    }

    /// The methods the service resolves and creates.
    pub fn did_methods(&self) -> DidMethods {
        DidMethods {
            resolve: self
                .resolver
                .supported_methods()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            create: CREATABLE_METHODS.map(str::to_owned).to_vec(),
        }
    }

    /// Creates a DID of `method`, `key` or `prism`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnsupportedMethod`] for other methods, and the
    /// gateway errors if the Identus agent fails.
    pub async fn create_did(
        &self,
        method: &str,
        options: &DidCreationOptions,
    ) -> Result<DidDocument, ServiceError> {
        let method = method.trim().to_lowercase();

        let created = match method.as_str() {
            "" => {
                return Err(Error::root(ServiceError::Validation(
                    "DID method is required (e.g., 'key', 'web', 'prism')".to_owned(),
                )))
            }
            "key" => self.key_manager.create_did(options).await,
            "prism" => self.prism.create_did(options).await,
            _ => return Err(Error::root(ServiceError::UnsupportedMethod(method))),
        };

        created.match_err(|err| match err {
            DidError::AgentUnreachable(url) => {
                ServiceError::GatewayUnreachable(format!("Cannot reach Identus Cloud Agent at {url}"))
            }
            DidError::AgentRejected(..) | DidError::InvalidResponse(_) => {
                ServiceError::GatewayRejected(err.to_string())
            }
            _ => ServiceError::Internal,
        })
    }

    /// Publishes a `did:prism` DID to Cardano.
    ///
    /// A publication the agent refused is returned with `success == false`.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for other DIDs, checked before any
    /// network call, and [`ServiceError::GatewayUnreachable`] if the agent
    /// cannot be reached.
    pub async fn publish_did(&self, did: &str) -> Result<DidPublicationResult, ServiceError> {
        let did = did.trim();
        if !did.starts_with(PRISM_PREFIX) {
            return Err(Error::root(ServiceError::Validation(
                "Only did:prism DIDs can be published to Cardano".to_owned(),
            )));
        }

        match self.prism.publish(did).await {
            PublicationOutcome::Answered(result) => Ok(result),
            PublicationOutcome::Unreachable(reason) => {
                Err(Error::root(ServiceError::GatewayUnreachable(reason)).ctx(did.to_owned()))
            }
        }
    }

    /// The ledger status of a `did:prism` DID.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for other DIDs, checked before any
    /// network call.
    pub async fn did_status(&self, did: &str) -> Result<DidStatusResult, ServiceError> {
        let did = did.trim();
        if !did.starts_with(PRISM_PREFIX) {
            return Err(Error::root(ServiceError::Validation(
                "Status tracking is only available for did:prism DIDs".to_owned(),
            )));
        }

        Ok(self.prism.status(did).await)
    }
}

fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX).min(MAX_TTL_SECS))
}

fn no_status_list(issuer_did: &str) -> Error<ServiceError> {
    Error::root(ServiceError::NotFound(format!(
        "No status list found for issuer {issuer_did}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wires_every_method() {
        let service = SsiService::new(SsiConfig::default()).unwrap();

        assert_eq!(
            service.did_methods(),
            DidMethods {
                resolve: ["key", "web", "prism", "cheqd", "midnight"]
                    .map(str::to_owned)
                    .to_vec(),
                create: vec!["key".to_owned(), "prism".to_owned()],
            }
        );
        assert_eq!(service.offers().ttls().session, Duration::hours(1));
        assert_eq!(service.issuer().repository().capacity(), 16384);
    }

    #[test]
    fn status_list_capacity_is_bounded() {
        let service = SsiService::new(SsiConfig {
            status_list_capacity: usize::MAX,
            ..SsiConfig::default()
        })
        .unwrap();

        assert_eq!(
            service.issuer().repository().capacity(),
            crate::config::MAX_STATUS_LIST_CAPACITY
        );
    }

    #[test]
    fn ttl_conversion_saturates() {
        assert_eq!(seconds(600), Duration::minutes(10));
        assert_eq!(seconds(u64::MAX), Duration::days(100 * 365));
    }
}
