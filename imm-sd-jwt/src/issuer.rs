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

//! Issuance of SD-JWT VCs, revocation and the status list views.
//!
//! The serialized form of an issued credential is
//!
//! ```text
//! base64url(header).base64url(payload).base64url(signature)~<disclosure>~...~<disclosure>~
//! ```
//!
//! with the trailing `~` present only when there is at least one disclosure.

use std::collections::HashSet;

use bherror::{
    traits::{ForeignError as _, PropagateError as _},
    Error, Result,
};
use chrono::{DateTime, TimeDelta, Utc};
use imm_jws::{sign_compact, Signer as _};
use imm_status_list::{BitstringStatusListCredential, StatusList, StatusListRecord};
use serde_json::Value;
use tracing::info;

use crate::{
    models::{CONTEXT_VC_V2, TYPE_VERIFIABLE_CREDENTIAL},
    schema::{self, CredentialSchema},
    utils::{find_reserved_claim_name, ClaimNames, SD_FIELD_NAME},
    CredentialRepository, CredentialStatus, Disclosure, IssuanceError, IssuanceRequest,
    IssuedCredential, IssuedCredentialRecord, JsonObject, KeyStore, RepositoryError,
    SdJwtVcClaims, Sha256, VcClaims, VerifiableCredential, SHA_256_ALG_NAME, VC_SD_JWT_FORMAT,
};

/// Separator of the JWT and the disclosures.
pub(crate) const DISCLOSURE_SEPARATOR: char = '~';

const CREDENTIAL_ID_PREFIX: &str = "urn:uuid:";
const STATUS_LIST_PATH: &str = "/api/credentials/status-list/";

/// Issues, verifies and revokes SD-JWT VCs of a set of issuers.
///
/// The issuer is generic over where keys and credentials are kept; see
/// [`InMemoryKeyStore`](crate::key_store::InMemoryKeyStore) and
/// [`InMemoryCredentialRepository`](crate::repository::InMemoryCredentialRepository).
#[derive(Debug)]
pub struct SdJwtIssuer<K, R> {
    pub(crate) key_store: K,
    pub(crate) repository: R,
    public_base_url: String,
}

impl<K: KeyStore, R: CredentialRepository> SdJwtIssuer<K, R> {
    /// Creates an issuer publishing status lists under `public_base_url`.
    pub fn new(key_store: K, repository: R, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_owned();
        Self {
            key_store,
            repository,
            public_base_url,
        }
    }

    /// The key store.
    pub fn key_store(&self) -> &K {
        &self.key_store
    }

    /// The credential repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The URL of `issuer_did`'s status list credential.
    pub fn status_list_url(&self, issuer_did: &str) -> String {
        format!(
            "{}{STATUS_LIST_PATH}{}",
            self.public_base_url,
            urlencoding::encode(issuer_did)
        )
    }

    /// Issues a credential.
    ///
    /// The request is validated against the schema registry first; only a
    /// valid request allocates a status list index or touches a key.
    ///
    /// # Errors
    ///
    /// Validation errors (see [`IssuanceError::is_validation`]) for a bad
    /// request, otherwise the failing dependency.
    pub async fn issue(&self, request: &IssuanceRequest) -> Result<IssuedCredential, IssuanceError> {
        let schema = validate(request)?;

        let credential_id = format!("{CREDENTIAL_ID_PREFIX}{}", uuid::Uuid::new_v4());
        let status_index = self
            .repository
            .allocate_index(&request.issuer_did)
            .await
            .with_err(|| IssuanceError::StatusList)?;

        let valid_from = Utc::now();
        let valid_until = request
            .validity_days
            .map(|days| expiry(valid_from, days))
            .transpose()?;

        let mut credential_subject = request.claims.clone();
        credential_subject.insert("id".to_owned(), Value::String(request.subject_did.clone()));

        let credential = VerifiableCredential {
            context: vec![CONTEXT_VC_V2.to_owned()],
            id: Some(credential_id.clone()),
            types: vec![
                TYPE_VERIFIABLE_CREDENTIAL.to_owned(),
                request.credential_type.clone(),
            ],
            issuer: request.issuer_did.clone(),
            valid_from,
            valid_until,
            credential_subject,
            credential_status: Some(CredentialStatus::revocation(
                &request.issuer_did,
                status_index,
                self.status_list_url(&request.issuer_did),
            )),
        };

        let selectively_disclosed = selectively_disclosed_claims(request, schema);
        let (visible_subject, disclosures) =
            conceal_claims(&credential.credential_subject, &selectively_disclosed)?;

        let claims = SdJwtVcClaims {
            iss: Some(request.issuer_did.clone()),
            iat: Some(valid_from.timestamp()),
            jti: Some(credential_id.clone()),
            exp: valid_until.map(|exp| exp.timestamp()),
            sd_alg: (!disclosures.is_empty()).then(|| SHA_256_ALG_NAME.to_owned()),
            vc: Some(VcClaims {
                context: credential.context.clone(),
                types: credential.types.clone(),
                credential_subject: visible_subject,
                credential_status: credential.credential_status.clone(),
            }),
        };

        let signer = self
            .key_store
            .get_or_create_signing_key(&request.issuer_did)
            .await
            .with_err(|| IssuanceError::KeyStore)?;
        let jwt = sign_compact(VC_SD_JWT_FORMAT, &claims, &signer)
            .with_err(|| IssuanceError::Signing)?;
        let serialized_credential = serialize(jwt, &disclosures);

        let record = IssuedCredentialRecord {
            id: credential_id
                .trim_start_matches(CREDENTIAL_ID_PREFIX)
                .to_owned(),
            issuer_did: request.issuer_did.clone(),
            subject_did: request.subject_did.clone(),
            credential_type: request.credential_type.clone(),
            serialized_credential: serialized_credential.clone(),
            issued_at: valid_from,
            expires_at: valid_until,
            status_list_index: status_index,
            is_revoked: false,
            revoked_at: None,
        };
        let record = self
            .repository
            .store(record)
            .await
            .with_err(|| IssuanceError::Repository)?;

        info!(
            credential_type = %request.credential_type,
            credential_id = %record.id,
            issuer_did = %request.issuer_did,
            subject_did = %request.subject_did,
            alg = %signer.algorithm(),
            disclosures = disclosures.len(),
            "issued credential"
        );

        Ok(IssuedCredential {
            credential_id: record.id,
            serialized_credential,
            format: VC_SD_JWT_FORMAT.to_owned(),
            credential,
        })
    }

    /// Revokes the credential with the repository id `credential_id`.
    ///
    /// Returns `true` exactly once per credential; unknown and already revoked
    /// credentials yield `false`.
    pub async fn revoke(&self, credential_id: &str) -> Result<bool, RepositoryError> {
        self.repository.revoke(credential_id).await
    }

    /// The persisted status list of `issuer_did`.
    pub async fn status_list(
        &self,
        issuer_did: &str,
    ) -> Result<Option<StatusListRecord>, RepositoryError> {
        self.repository.get_status_list(issuer_did).await
    }

    /// The public W3C view of `issuer_did`'s status list.
    pub async fn status_list_credential(
        &self,
        issuer_did: &str,
    ) -> Result<Option<BitstringStatusListCredential>, RepositoryError> {
        let Some(record) = self.repository.get_status_list(issuer_did).await? else {
            return Ok(None);
        };

        let credential = StatusList::from_record(&record)
            .and_then(|list| list.to_credential(issuer_did, &self.status_list_url(issuer_did)))
            .with_err(|| RepositoryError::StatusList)?;

        Ok(Some(credential))
    }
}

fn validate(request: &IssuanceRequest) -> Result<&'static CredentialSchema, IssuanceError> {
    if request.issuer_did.trim().is_empty() {
        return Err(Error::root(IssuanceError::EmptyIssuer));
    }
    if request.subject_did.trim().is_empty() {
        return Err(Error::root(IssuanceError::EmptySubject));
    }

    let Some(schema) = schema::get_schema(&request.credential_type) else {
        let supported: Vec<_> = schema::supported_types().collect();
        return Err(Error::root(IssuanceError::UnknownCredentialType(
            request.credential_type.clone(),
        ))
        .ctx(format!("supported types: {}", supported.join(", "))));
    };

    if let Some(name) = find_reserved_claim_name(&request.claims) {
        return Err(Error::root(IssuanceError::ReservedClaimName(name)));
    }

    let missing = schema.missing_claims(&request.claims);
    if !missing.is_empty() {
        return Err(Error::root(IssuanceError::MissingRequiredClaims(
            schema.credential_type.to_owned(),
            ClaimNames(missing.into_iter().map(str::to_owned).collect()),
        )));
    }

    Ok(schema)
}

fn expiry(valid_from: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, IssuanceError> {
    TimeDelta::try_days(days)
        .and_then(|validity| valid_from.checked_add_signed(validity))
        .ok_or_else(|| Error::root(IssuanceError::InvalidValidityPeriod(days)))
}

/// The explicit override if non-empty, otherwise the schema default.
fn selectively_disclosed_claims<'a>(
    request: &'a IssuanceRequest,
    schema: &'static CredentialSchema,
) -> HashSet<&'a str> {
    match &request.selective_disclosure_claims {
        Some(names) if !names.is_empty() => names.iter().map(String::as_str).collect(),
        _ => schema.default_selective_disclosure.iter().copied().collect(),
    }
}

/// Replaces every claim named in `disclosed` by the digest of its disclosure.
///
/// Returns the visible subject and the disclosures in subject order.
fn conceal_claims(
    subject: &JsonObject,
    disclosed: &HashSet<&str>,
) -> Result<(JsonObject, Vec<Disclosure>), IssuanceError> {
    let mut visible = JsonObject::new();
    let mut disclosures = Vec::new();

    for (name, value) in subject {
        if disclosed.contains(name.as_str()) {
            let disclosure = Disclosure::with_random_salt(name.clone(), value.clone())
                .foreign_err(|| IssuanceError::Salt)?;
            disclosures.push(disclosure);
        } else {
            visible.insert(name.clone(), value.clone());
        }
    }

    if !disclosures.is_empty() {
        let mut digests: Vec<String> = disclosures.iter().map(|d| d.digest(Sha256)).collect();
        // Sorted so the digest order does not leak the claim order.
        digests.sort_unstable();
        visible.insert(
            SD_FIELD_NAME.to_owned(),
            Value::Array(digests.into_iter().map(Value::String).collect()),
        );
    }

    Ok((visible, disclosures))
}

fn serialize(jwt: String, disclosures: &[Disclosure]) -> String {
    if disclosures.is_empty() {
        return jwt;
    }

    let mut serialized = jwt;
    for disclosure in disclosures {
        serialized.push(DISCLOSURE_SEPARATOR);
        serialized.push_str(disclosure.as_str());
    }
    serialized.push(DISCLOSURE_SEPARATOR);
    serialized
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use imm_jws::json_object;
    use serde_json::json;

    use super::*;

    fn request(credential_type: &str, claims: JsonObject) -> IssuanceRequest {
        IssuanceRequest {
            issuer_did: "did:web:school.example".to_owned(),
            subject_did: "did:key:z6MkStudent".to_owned(),
            credential_type: credential_type.to_owned(),
            claims,
            ..Default::default()
        }
    }

    fn i94_claims() -> JsonObject {
        json_object!({
            "holderName": "Jane Roe",
            "i94Number": "123456789A1",
            "classOfAdmission": "F1",
            "admissionDate": "2024-08-10",
            "admittedUntil": "D/S",
        })
    }

    #[test]
    fn validation_order_and_reasons() {
        let mut empty_issuer = request("I94Credential", i94_claims());
        empty_issuer.issuer_did = " ".to_owned();
        assert_matches!(validate(&empty_issuer).unwrap_err().error, IssuanceError::EmptyIssuer);

        let mut empty_subject = request("I94Credential", i94_claims());
        empty_subject.subject_did.clear();
        assert_matches!(validate(&empty_subject).unwrap_err().error, IssuanceError::EmptySubject);

        let err = validate(&request("GreenCard", i94_claims())).unwrap_err();
        assert_matches!(err.error, IssuanceError::UnknownCredentialType(ref t) if t == "GreenCard");
        assert!(err.error.is_validation());

        let mut reserved = i94_claims();
        reserved.insert("_sd".to_owned(), json!([]));
        assert_matches!(
            validate(&request("I94Credential", reserved)).unwrap_err().error,
            IssuanceError::ReservedClaimName("_sd")
        );

        let mut missing = i94_claims();
        missing.remove("admittedUntil");
        missing.remove("i94Number");
        let err = validate(&request("I94Credential", missing)).unwrap_err();
        assert_eq!(
            err.error.to_string(),
            "Missing required claims for I94Credential: i94Number, admittedUntil"
        );

        assert_eq!(
            validate(&request("I94Credential", i94_claims())).unwrap(),
            &schema::I94_CREDENTIAL
        );
    }

    #[test]
    fn override_replaces_schema_default() {
        let schema = &schema::I94_CREDENTIAL;
        let mut req = request("I94Credential", i94_claims());

        assert_eq!(
            selectively_disclosed_claims(&req, schema),
            HashSet::from(["i94Number", "holderName"])
        );

        req.selective_disclosure_claims = Some(vec![]);
        assert_eq!(
            selectively_disclosed_claims(&req, schema),
            HashSet::from(["i94Number", "holderName"])
        );

        req.selective_disclosure_claims = Some(vec!["portOfEntry".to_owned()]);
        assert_eq!(
            selectively_disclosed_claims(&req, schema),
            HashSet::from(["portOfEntry"])
        );
    }

    #[test]
    fn concealed_claims_leave_only_digests() {
        let subject = json_object!({"a": 1, "b": "two", "id": "did:key:z6MkStudent"});

        let (visible, disclosures) = conceal_claims(&subject, &HashSet::from(["b"])).unwrap();

        assert_eq!(disclosures.len(), 1);
        assert_eq!(disclosures[0].claim_name(), "b");
        assert_eq!(visible["a"], json!(1));
        assert_eq!(visible["id"], json!("did:key:z6MkStudent"));
        assert!(!visible.contains_key("b"));
        assert_eq!(visible["_sd"], json!([disclosures[0].digest(Sha256)]));
    }

    #[test]
    fn nothing_concealed_means_no_sd_array() {
        let subject = json_object!({"a": 1});
        let (visible, disclosures) = conceal_claims(&subject, &HashSet::new()).unwrap();

        assert!(disclosures.is_empty());
        assert_eq!(visible, subject);
    }

    #[test]
    fn serialization_trailing_separator() {
        assert_eq!(serialize("h.p.s".to_owned(), &[]), "h.p.s");

        let disclosure = Disclosure::new("salt".to_owned(), "a".to_owned(), json!(1));
        assert_eq!(
            serialize("h.p.s".to_owned(), &[disclosure.clone(), disclosure.clone()]),
            format!("h.p.s~{0}~{0}~", disclosure.as_str())
        );
    }

    #[test]
    fn expiry_bounds() {
        let now = Utc::now();
        assert_eq!(expiry(now, 1).unwrap(), now + TimeDelta::days(1));
        assert!(expiry(now, -1).unwrap() < now);
        assert_matches!(
            expiry(now, i64::MAX).unwrap_err().error,
            IssuanceError::InvalidValidityPeriod(i64::MAX)
        );
    }
}
