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

//! Models of [OpenID for Verifiable Credential Issuance][1], pre-authorized
//! code flow.
//!
//! [1]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html

use std::collections::BTreeMap;

use imm_sd_jwt::{schema::CredentialSchema, VC_SD_JWT_FORMAT};
use serde::{Deserialize, Serialize};

/// The grant type of the pre-authorized code flow.
pub const PRE_AUTHORIZED_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:pre-authorized_code";

/// The only token type handed out.
pub const BEARER: &str = "Bearer";

/// Path of the token endpoint, relative to the issuer URL.
pub const TOKEN_PATH: &str = "/api/oid4vci/token";

/// Path of the credential endpoint, relative to the issuer URL.
pub const CREDENTIAL_PATH: &str = "/api/oid4vci/credential";

const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";
const DEFAULT_LOCALE: &str = "en-US";

fn default_format() -> String {
    VC_SD_JWT_FORMAT.to_owned()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_owned()
}

/// Credential Issuer Metadata, served at
/// `/.well-known/openid-credential-issuer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialIssuerMetadata {
    /// The issuer URL.
    pub credential_issuer: String,
    /// Where credentials are requested with an access token.
    pub credential_endpoint: String,
    /// Where pre-authorized codes are exchanged.
    pub token_endpoint: String,
    /// Issuable credentials by configuration id.
    pub credential_configurations_supported: BTreeMap<String, CredentialConfiguration>,
}

impl CredentialIssuerMetadata {
    /// Metadata of the issuer at `issuer_url` offering one configuration per
    /// schema, keyed by the credential type.
    pub fn for_schemas<'a>(
        issuer_url: &str,
        schemas: impl IntoIterator<Item = &'a CredentialSchema>,
    ) -> Self {
        let issuer_url = issuer_url.trim_end_matches('/');

        Self {
            credential_issuer: issuer_url.to_owned(),
            credential_endpoint: format!("{issuer_url}{CREDENTIAL_PATH}"),
            token_endpoint: format!("{issuer_url}{TOKEN_PATH}"),
            credential_configurations_supported: schemas
                .into_iter()
                .map(|schema| {
                    (
                        schema.credential_type.to_owned(),
                        CredentialConfiguration::for_schema(schema),
                    )
                })
                .collect(),
        }
    }
}

/// One issuable credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfiguration {
    /// Always `vc+sd-jwt`.
    #[serde(default = "default_format")]
    pub format: String,
    /// OAuth scope requesting the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// The credential type and its claims.
    pub credential_definition: CredentialDefinition,
    /// How wallets should present the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<CredentialDisplay>>,
}

impl CredentialConfiguration {
    /// The configuration issuing credentials of `schema`.
    pub fn for_schema(schema: &CredentialSchema) -> Self {
        let claim = |mandatory: bool| ClaimDefinition {
            mandatory: Some(mandatory),
            display: None,
        };
        let subject = schema
            .required_claims
            .iter()
            .map(|name| (name.to_string(), claim(true)))
            .chain(
                schema
                    .optional_claims
                    .iter()
                    .map(|name| (name.to_string(), claim(false))),
            )
            .collect();

        Self {
            format: default_format(),
            scope: Some(scope_of(schema.credential_type)),
            credential_definition: CredentialDefinition {
                credential_type: vec![
                    BASE_CREDENTIAL_TYPE.to_owned(),
                    schema.credential_type.to_owned(),
                ],
                credential_subject: Some(subject),
            },
            display: Some(vec![CredentialDisplay {
                name: schema.description.to_owned(),
                locale: default_locale(),
                description: None,
            }]),
        }
    }
}

/// `I20Credential` becomes `i20_credential`.
fn scope_of(credential_type: &str) -> String {
    let mut scope = String::with_capacity(credential_type.len() + 4);
    let mut previous: Option<char> = None;

    for c in credential_type.chars() {
        if c.is_ascii_uppercase()
            && previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
        {
            scope.push('_');
        }
        scope.push(c.to_ascii_lowercase());
        previous = Some(c);
    }

    scope
}

/// The credential type, as `["VerifiableCredential", "<type>"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialDefinition {
    /// The VC `type` array.
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    /// Claims of the credential subject.
    #[serde(
        rename = "credentialSubject",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub credential_subject: Option<BTreeMap<String, ClaimDefinition>>,
}

impl CredentialDefinition {
    /// The specific type, i.e. the first entry that is not
    /// `VerifiableCredential`.
    pub fn specific_type(&self) -> Option<&str> {
        self.credential_type
            .iter()
            .map(String::as_str)
            .find(|t| *t != BASE_CREDENTIAL_TYPE)
    }
}

/// Metadata of a single claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDefinition {
    /// Whether the claim is always present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
    /// Localized claim names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<Vec<ClaimDisplay>>,
}

/// A localized claim name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDisplay {
    /// The name.
    pub name: String,
    /// Its locale.
    #[serde(default = "default_locale")]
    pub locale: String,
}

/// A localized credential name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialDisplay {
    /// The name.
    pub name: String,
    /// Its locale.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// A longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A Credential Offer, handed to the holder as a QR code or deep link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialOffer {
    /// The issuer URL.
    pub credential_issuer: String,
    /// Offered configurations.
    pub credential_configuration_ids: Vec<String>,
    /// How the holder obtains an access token.
    pub grants: OfferGrants,
}

impl CredentialOffer {
    /// An offer of `configuration_id` redeemable with the pre-authorized
    /// `code`.
    pub fn pre_authorized(
        issuer_url: &str,
        configuration_id: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            credential_issuer: issuer_url.trim_end_matches('/').to_owned(),
            credential_configuration_ids: vec![configuration_id.into()],
            grants: OfferGrants {
                pre_authorized_code: Some(PreAuthorizedCodeGrant {
                    pre_authorized_code: code.into(),
                }),
            },
        }
    }
}

/// The grants of an offer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OfferGrants {
    /// The pre-authorized code grant.
    #[serde(
        rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pre_authorized_code: Option<PreAuthorizedCodeGrant>,
}

/// The code of a pre-authorized code grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreAuthorizedCodeGrant {
    /// The single-use code.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,
}

/// A token request, form encoded on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Must be [`PRE_AUTHORIZED_CODE_GRANT`].
    #[serde(default)]
    pub grant_type: Option<String>,
    /// The code from the offer.
    #[serde(rename = "pre-authorized_code", default)]
    pub pre_authorized_code: Option<String>,
}

/// A successful token response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,
    /// Always [`BEARER`].
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// Nonce for proofs of possession.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,
    /// Nonce lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<u64>,
}

/// A credential request from the holder's wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRequest {
    /// The requested format.
    #[serde(default = "default_format")]
    pub format: String,
    /// The requested credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_definition: Option<CredentialDefinition>,
}

impl Default for CredentialRequest {
    fn default() -> Self {
        Self {
            format: default_format(),
            credential_definition: None,
        }
    }
}

/// The issued credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialResponse {
    /// Always `vc+sd-jwt`.
    pub format: String,
    /// The serialized SD-JWT.
    pub credential: String,
    /// A fresh nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,
    /// Nonce lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<u64>,
}

impl CredentialResponse {
    /// Wraps a serialized SD-JWT credential.
    pub fn sd_jwt(credential: String) -> Self {
        Self {
            format: default_format(),
            credential,
            c_nonce: None,
            c_nonce_expires_in: None,
        }
    }
}
