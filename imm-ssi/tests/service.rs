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

use std::sync::Arc;

use assert_matches::assert_matches;
use imm_ssi::{
    imm_did::{DidCreationOptions, ResolutionError},
    imm_oid4vc::{
        CredentialDefinition, CredentialRequest, PresentationResponse, PresentationSubmission,
        TokenRequest, PRE_AUTHORIZED_CODE_GRANT,
    },
    imm_sd_jwt::{
        imm_jws::{base64_url_decode, json_object},
        imm_status_list::StatusList,
        IssuanceRequest, JsonObject,
    },
    CreateOfferRequest, CreatePresentationRequest, PresentationState, ServiceError, SsiConfig,
    SsiService,
};
use serde_json::{json, Value};
use tokio::sync::Barrier;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ISSUER_DID: &str = "did:web:university.example";
const SUBJECT_DID: &str = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
const PRISM_DID: &str = "did:prism:4a5b6c";
/// An address nothing listens on.
const DEAD_URL: &str = "http://127.0.0.1:1";

fn service_with(config: SsiConfig) -> SsiService {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    SsiService::new(config).unwrap()
}

fn service() -> SsiService {
    service_with(SsiConfig::default())
}

fn i20_claims() -> JsonObject {
    json_object!({
        "sevisId": "N0001234567",
        "studentName": "John Doe",
        "programStatus": "Active",
        "educationLevel": "Master's",
        "primaryMajor": "Computer Science",
        "programStartDate": "2024-08-15",
        "programEndDate": "2026-05-15",
        "institutionName": "Test University",
    })
}

fn i20_request() -> IssuanceRequest {
    IssuanceRequest {
        issuer_did: ISSUER_DID.to_owned(),
        subject_did: SUBJECT_DID.to_owned(),
        credential_type: "I20Credential".to_owned(),
        claims: i20_claims(),
        selective_disclosure_claims: None,
        validity_days: Some(365),
    }
}

/// Keeps only the disclosures of the `keep` claims.
fn present(serialized: &str, keep: &[&str]) -> String {
    let mut segments = serialized.split('~');
    let mut presentation = segments.next().unwrap().to_owned();

    for disclosure in segments.filter(|s| !s.is_empty()) {
        let decoded: Vec<Value> =
            serde_json::from_slice(&base64_url_decode(disclosure).unwrap()).unwrap();
        if keep.contains(&decoded[1].as_str().unwrap()) {
            presentation.push('~');
            presentation.push_str(disclosure);
        }
    }

    presentation.push('~');
    presentation
}

fn agent_did(did: &str) -> String {
    format!("/did-registrar/dids/{}", urlencoding::encode(did))
}

#[tokio::test]
async fn issue_verify_revoke() {
    let service = service();

    let issued = service.issue(&i20_request()).await.unwrap();
    let index = issued
        .credential
        .credential_status
        .as_ref()
        .and_then(|status| status.index())
        .unwrap();

    let verified = service.verify(&issued.serialized_credential).await;
    assert!(verified.is_valid, "{:?}", verified.error);
    assert_eq!(verified.issuer_did.as_deref(), Some(ISSUER_DID));
    assert_eq!(verified.subject_did.as_deref(), Some(SUBJECT_DID));
    assert_eq!(verified.is_revoked, Some(false));

    assert!(service.revoke(&issued.credential_id).await.unwrap());
    assert!(!service.revoke(&issued.credential_id).await.unwrap());
    assert!(!service.revoke("unknown").await.unwrap());

    let verified = service.verify(&issued.serialized_credential).await;
    assert_eq!(verified.is_revoked, Some(true));

    let record = service.status_list(ISSUER_DID).await.unwrap();
    assert_eq!(record.size, 16384);
    assert_eq!(
        StatusList::from_record(&record).unwrap().is_revoked(index),
        Some(true)
    );

    let credential = service.status_list_credential(ISSUER_DID).await.unwrap();
    assert_eq!(credential.issuer, ISSUER_DID);
    assert_eq!(
        Some(credential.id),
        issued
            .credential
            .credential_status
            .map(|status| status.status_list_credential)
    );
}

#[tokio::test]
async fn issuance_errors_are_classified() {
    let service = service();

    let err = service
        .issue(&IssuanceRequest {
            credential_type: "DriverLicense".to_owned(),
            ..i20_request()
        })
        .await
        .unwrap_err();
    assert_matches!(err.error, ServiceError::Validation(ref m) if m.contains("DriverLicense"));

    let mut claims = i20_claims();
    claims.remove("sevisId");
    let err = service
        .issue(&IssuanceRequest {
            claims,
            ..i20_request()
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::Validation("Missing required claims for I20Credential: sevisId".to_owned())
    );
    assert!(err.error.is_client_error());

    let err = service.status_list("did:web:nobody.example").await.unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::NotFound("No status list found for issuer did:web:nobody.example".to_owned())
    );
}

#[tokio::test]
async fn oid4vci_then_oid4vp() {
    let service = service();

    let offer = service.create_offer(offer_request()).unwrap();
    assert_eq!(offer.credential_issuer, "http://localhost:5000");
    assert_eq!(offer.credential_configuration_ids, ["I20Credential"]);
    let code = offer.grants.pre_authorized_code.unwrap().pre_authorized_code;

    let exchange = TokenRequest {
        grant_type: Some(PRE_AUTHORIZED_CODE_GRANT.to_owned()),
        pre_authorized_code: Some(code),
    };
    let token = service.exchange_token(&exchange).unwrap();
    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, 3600);
    assert!(token.c_nonce.is_some());

    let err = service.exchange_token(&exchange).unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::InvalidGrant("Invalid or expired pre-authorized code")
    );
    assert_eq!(err.error.oauth_error(), Some("invalid_grant"));

    let authorization = format!("Bearer {}", token.access_token);
    let mismatched = CredentialRequest {
        credential_definition: Some(CredentialDefinition {
            credential_type: vec!["VerifiableCredential".to_owned(), "DS2019Credential".to_owned()],
            credential_subject: None,
        }),
        ..Default::default()
    };
    let err = service
        .issue_for_token(&authorization, &mismatched)
        .await
        .unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::Validation("Requested credential does not match the offer".to_owned())
    );

    // A rejected request leaves the token usable.
    let response = service
        .issue_for_token(&authorization, &CredentialRequest::default())
        .await
        .unwrap();
    assert_eq!(response.format, "vc+sd-jwt");

    let err = service
        .issue_for_token(&authorization, &CredentialRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.error, ServiceError::InvalidToken("Token expired or invalid"));

    let request = service
        .create_presentation_request(CreatePresentationRequest {
            scenario: Some("f1-status".to_owned()),
            presentation_definition: None,
        })
        .unwrap();
    let state = request.state.unwrap();

    let result = service
        .receive_presentation(&PresentationResponse {
            vp_token: present(&response.credential, &["studentName"]),
            presentation_submission: Some(PresentationSubmission {
                definition_id: request.presentation_definition.id.clone(),
                ..Default::default()
            }),
            state: Some(state.clone()),
        })
        .await
        .unwrap();
    assert!(result.is_valid, "{:?}", result.error);
    assert_eq!(result.issuer_did.as_deref(), Some(ISSUER_DID));
    let disclosed = result.disclosed_claims.clone().unwrap();
    assert_eq!(disclosed.get("studentName"), Some(&json!("John Doe")));
    assert_eq!(disclosed.get("sevisId"), None);

    let status = service.presentation_status(&state).unwrap();
    assert_eq!(status.status, PresentationState::Completed);
    assert_eq!(status.result, Some(result));
    assert_eq!(
        serde_json::to_value(&status).unwrap()["status"],
        json!("completed")
    );
}

fn offer_request() -> CreateOfferRequest {
    CreateOfferRequest {
        issuer_did: Some(ISSUER_DID.to_owned()),
        subject_did: Some(SUBJECT_DID.to_owned()),
        credential_configuration_id: Some("I20Credential".to_owned()),
        claims: i20_claims(),
        selective_disclosure_claims: None,
        validity_days: Some(30),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_credential_requests_get_one_credential() {
    const WALLETS: usize = 8;
    let service = Arc::new(service());

    for _ in 0..20 {
        let offer = service.create_offer(offer_request()).unwrap();
        let token = service
            .exchange_token(&TokenRequest {
                grant_type: Some(PRE_AUTHORIZED_CODE_GRANT.to_owned()),
                pre_authorized_code: offer
                    .grants
                    .pre_authorized_code
                    .map(|grant| grant.pre_authorized_code),
            })
            .unwrap();
        let authorization = format!("Bearer {}", token.access_token);
        let barrier = Arc::new(Barrier::new(WALLETS));

        let handles: Vec<_> = (0..WALLETS)
            .map(|_| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let authorization = authorization.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    service
                        .issue_for_token(&authorization, &CredentialRequest::default())
                        .await
                })
            })
            .collect();

        let mut issued = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => issued += 1,
                Err(err) => {
                    assert_eq!(err.error, ServiceError::InvalidToken("Token expired or invalid"))
                }
            }
        }
        assert_eq!(issued, 1);
    }
}

#[tokio::test]
async fn did_key_round_trip() {
    let service = service();

    let document = service
        .create_did(" KEY ", &DidCreationOptions::default())
        .await
        .unwrap();
    assert!(document.id.starts_with("did:key:z6Mk"));

    let resolved = service.resolve_did(&document.id).await;
    assert_eq!(resolved.metadata.error, None);
    assert_eq!(resolved.did_document, Some(document));

    let resolved = service.resolve_did("not a did").await;
    assert_eq!(resolved.metadata.error, Some(ResolutionError::InvalidDid));
}

#[tokio::test]
async fn did_creation_errors() {
    let service = service();

    let err = service
        .create_did("web", &DidCreationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.error, ServiceError::UnsupportedMethod("web".to_owned()));
    assert_eq!(
        err.error.to_string(),
        "Unsupported DID method for creation: web. Supported: key, prism"
    );

    let err = service
        .create_did("", &DidCreationOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err.error, ServiceError::Validation(_));

    let err = service
        .create_did(
            "prism",
            &DidCreationOptions {
                agent_api_url: Some(DEAD_URL.to_owned()),
                api_key: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::GatewayUnreachable(format!("Cannot reach Identus Cloud Agent at {DEAD_URL}"))
    );
}

#[tokio::test]
async fn prism_publication_through_the_agent() {
    let agent = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/publications", agent_did(PRISM_DID))))
        .and(header("apikey", "agent-key"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "scheduledOperation": {"id": "op-123", "didRef": PRISM_DID}
        })))
        .mount(&agent)
        .await;
    Mock::given(method("GET"))
        .and(path(agent_did(PRISM_DID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "did": PRISM_DID,
            "status": "PUBLICATION_PENDING"
        })))
        .mount(&agent)
        .await;

    let service = service_with(SsiConfig {
        prism_agent_url: agent.uri(),
        prism_api_key: Some("agent-key".to_owned()),
        ..SsiConfig::default()
    });

    let published = service.publish_did(PRISM_DID).await.unwrap();
    assert!(published.success);
    assert_eq!(published.scheduled_operation.as_deref(), Some("op-123"));

    let status = service.did_status(PRISM_DID).await.unwrap();
    assert_eq!(status.status, "PUBLICATION_PENDING");
    assert_eq!(status.blockchain.as_deref(), Some("cardano"));

    let err = service.publish_did("did:key:z6Mk").await.unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::Validation("Only did:prism DIDs can be published to Cardano".to_owned())
    );
    let err = service.did_status("did:web:school.example").await.unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::Validation("Status tracking is only available for did:prism DIDs".to_owned())
    );
}

#[tokio::test]
async fn unreachable_agent() {
    let service = service_with(SsiConfig {
        prism_agent_url: DEAD_URL.to_owned(),
        ..SsiConfig::default()
    });

    let err = service.publish_did(PRISM_DID).await.unwrap_err();
    assert_eq!(
        err.error,
        ServiceError::GatewayUnreachable(format!("Cannot reach Identus Cloud Agent at {DEAD_URL}"))
    );
    assert!(!err.error.is_client_error());

    assert_eq!(service.did_status(PRISM_DID).await.unwrap().status, "AGENT_UNREACHABLE");
}
