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

//! The OID4VCI pre-authorized code flow.

use bherror::{traits::PropagateError as _, Error, Result};
use imm_oid4vc::{
    AuthorizedSession, CredentialIssuerMetadata, CredentialOffer, CredentialRequest,
    CredentialResponse, TokenRequest, TokenResponse, BEARER, PRE_AUTHORIZED_CODE_GRANT,
};
use imm_sd_jwt::{schema::get_schema, IssuanceRequest, JsonObject, VC_SD_JWT_FORMAT};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ServiceError, SsiService};

const BEARER_PREFIX: &str = "Bearer ";

/// A request to offer a credential to a holder.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    /// The issuing DID.
    #[serde(default)]
    pub issuer_did: Option<String>,
    /// The holder's DID.
    #[serde(default)]
    pub subject_did: Option<String>,
    /// The offered configuration, i.e. the credential type.
    #[serde(default)]
    pub credential_configuration_id: Option<String>,
    /// Claim values of the credential.
    #[serde(default)]
    pub claims: JsonObject,
    /// Claims to make selectively disclosable instead of the schema default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selective_disclosure_claims: Option<Vec<String>>,
    /// Validity in days from issuance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_days: Option<i64>,
}

impl SsiService {
    /// The issuer metadata, advertising every credential type.
    pub fn issuer_metadata(&self) -> CredentialIssuerMetadata {
        CredentialIssuerMetadata::for_schemas(self.config.base_url(), self.schemas())
    }

    /// Offers a credential; the offer carries a single-use pre-authorized
    /// code.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] if the configuration is missing or
    /// unknown.
    pub fn create_offer(&self, request: CreateOfferRequest) -> Result<CredentialOffer, ServiceError> {
        let Some(configuration_id) = request
            .credential_configuration_id
            .filter(|id| !id.trim().is_empty())
        else {
            return Err(Error::root(ServiceError::Validation(
                "credentialConfigurationId is required".to_owned(),
            )));
        };
        if get_schema(&configuration_id).is_none() {
            return Err(Error::root(ServiceError::Validation(format!(
                "Unknown credential configuration: {configuration_id}"
            ))));
        }

        let issuance = IssuanceRequest {
            issuer_did: request.issuer_did.unwrap_or_default(),
            subject_did: request.subject_did.unwrap_or_default(),
            credential_type: configuration_id.clone(),
            claims: request.claims,
            selective_disclosure_claims: request.selective_disclosure_claims,
            validity_days: request.validity_days,
        };

        let created = self
            .offers
            .create_offer(issuance, &configuration_id)
            .with_err(|| ServiceError::Internal)?;

        Ok(CredentialOffer::pre_authorized(
            self.config.base_url(),
            configuration_id,
            created.pre_authorized_code,
        ))
    }

    /// Exchanges a pre-authorized code for an access token.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UnsupportedGrantType`] for other grants and
    /// [`ServiceError::InvalidGrant`] for missing, unknown, used or expired
    /// codes.
    pub fn exchange_token(&self, request: &TokenRequest) -> Result<TokenResponse, ServiceError> {
        if request.grant_type.as_deref() != Some(PRE_AUTHORIZED_CODE_GRANT) {
            return Err(Error::root(ServiceError::UnsupportedGrantType));
        }

        let Some(code) = request
            .pre_authorized_code
            .as_deref()
            .filter(|code| !code.is_empty())
        else {
            return Err(Error::root(ServiceError::InvalidGrant(
                "pre-authorized_code is required",
            )));
        };

        let token = self
            .offers
            .exchange_pre_authorized_code(code)
            .with_err(|| ServiceError::Internal)?
            .ok_or_else(|| {
                Error::root(ServiceError::InvalidGrant(
                    "Invalid or expired pre-authorized code",
                ))
            })?;

        Ok(TokenResponse {
            access_token: token.access_token,
            token_type: BEARER.to_owned(),
            expires_in: token.expires_in,
            c_nonce: Some(token.session.c_nonce),
            c_nonce_expires_in: Some(token.c_nonce_expires_in),
        })
    }

    /// Issues the credential of the session behind an access token.
    ///
    /// `authorization` is the value of the `Authorization` header. The
    /// session is taken out of the store for the duration of the request, so
    /// concurrent requests with the same token get at most one credential.
    /// It ends once the credential is issued; if the request is rejected or
    /// issuance fails, the token stays usable.
    ///
    /// # Errors
    ///
    /// [`ServiceError::InvalidToken`] without a live session, a
    /// [`ServiceError::Validation`] if the request does not match the offer,
    /// and the errors of [`SsiService::issue`].
    pub async fn issue_for_token(
        &self,
        authorization: &str,
        request: &CredentialRequest,
    ) -> Result<CredentialResponse, ServiceError> {
        let Some(access_token) = authorization.strip_prefix(BEARER_PREFIX) else {
            return Err(Error::root(ServiceError::InvalidToken(
                "Bearer access token required",
            )));
        };
        let access_token = access_token.trim();
        let Some(session) = self.offers.take_session(access_token) else {
            return Err(Error::root(ServiceError::InvalidToken(
                "Token expired or invalid",
            )));
        };

        match self.issue_for_session(&session, request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.offers.restore_session(access_token, session);
                Err(err)
            }
        }
    }

    async fn issue_for_session(
        &self,
        session: &AuthorizedSession,
        request: &CredentialRequest,
    ) -> Result<CredentialResponse, ServiceError> {
        if request.format != VC_SD_JWT_FORMAT {
            return Err(Error::root(ServiceError::Validation(format!(
                "Unsupported credential format: {}",
                request.format
            ))));
        }
        let requested_type = request
            .credential_definition
            .as_ref()
            .and_then(|definition| definition.specific_type());
        if requested_type.is_some_and(|t| t != session.credential_configuration_id) {
            return Err(Error::root(ServiceError::Validation(
                "Requested credential does not match the offer".to_owned(),
            )));
        }

        let issued = self.issue(&session.request).await?;
        info!(
            credential_id = %issued.credential_id,
            credential_type = %session.credential_configuration_id,
            "issued credential through OID4VCI"
        );

        Ok(CredentialResponse::sd_jwt(issued.serialized_credential))
    }
}
