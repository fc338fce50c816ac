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

//! Verification of presented SD-JWT VCs.
//!
//! A presentation is the issued serialization with any subset of the
//! disclosures left out. Verification checks, in order:
//!
//! 1. the JWT structure,
//! 2. the signature, with the algorithm named in the header (`HS256` if
//!    absent) and the issuer's key from the [`KeyStore`],
//! 3. that each presented disclosure is well formed and that its digest is
//!    listed in the signed `_sd` array,
//! 4. the validity period.
//!
//! The third step is stricter than merely decoding the disclosures: a
//! disclosure whose digest is not signed by the issuer is rejected, so a
//! holder cannot swap in a different claim value.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use imm_jws::{CompactJws, SigningAlgorithm};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    issuer::DISCLOSURE_SEPARATOR, models::credential_type_of, utils::SD_FIELD_NAME,
    CredentialRepository, Disclosure, HashingAlgorithm, JsonObject, KeyStore, SdJwtIssuer,
    SdJwtVcClaims, Sha256, VerificationError, VerificationResult,
};

const CREDENTIAL_ID_PREFIX: &str = "urn:uuid:";

type Outcome<T> = std::result::Result<T, VerificationError>;

impl<K: KeyStore, R: CredentialRepository> SdJwtIssuer<K, R> {
    /// Verifies a presented credential.
    ///
    /// Never fails: malformed or forged input yields an invalid
    /// [`VerificationResult`] with the reason. A revoked credential is still
    /// cryptographically valid and is reported through
    /// [`VerificationResult::is_revoked`].
    pub async fn verify(&self, serialized_credential: &str) -> VerificationResult {
        match self.verify_presentation(serialized_credential).await {
            Ok(result) => result,
            Err(reason) => {
                debug!(%reason, "credential verification failed");
                VerificationResult::invalid(&reason)
            }
        }
    }

    async fn verify_presentation(&self, serialized: &str) -> Outcome<VerificationResult> {
        let mut segments = serialized.split(DISCLOSURE_SEPARATOR);
        let jwt = segments.next().unwrap_or_default();
        let presented: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();

        let jws = CompactJws::parse(jwt).map_err(|_| VerificationError::InvalidFormat)?;
        let header: JsonObject = jws
            .header()
            .map_err(|_| VerificationError::InvalidFormat)?;
        let claims: SdJwtVcClaims = jws
            .claims()
            .map_err(|_| VerificationError::InvalidPayload)?;

        let algorithm = header_algorithm(&header)?;
        let issuer_did = claims
            .iss
            .clone()
            .filter(|iss| !iss.is_empty())
            .ok_or(VerificationError::MissingIssuer)?;

        let key = self
            .key_store
            .get_public_key(&issuer_did)
            .await
            .map_err(|err| {
                warn!(issuer_did = %issuer_did, %err, "issuer key lookup failed");
                VerificationError::KeyStore
            })?
            .ok_or(VerificationError::UnknownIssuerKey)?;

        // An unusable key, e.g. an `HS256` secret presented as Ed25519, cannot
        // have produced the signature either.
        if !jws.verify(algorithm, &key).unwrap_or(false) {
            return Err(VerificationError::InvalidSignature);
        }

        let vc = claims.vc.clone().unwrap_or_default();
        let disclosed_claims = reveal_claims(&claims, vc.credential_subject, &presented)?;

        let subject_did = disclosed_claims
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let valid_from = claims.iat.and_then(|iat| DateTime::from_timestamp(iat, 0));
        let valid_until = claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0));

        let mut result = VerificationResult {
            is_valid: true,
            error: None,
            issuer_did: Some(issuer_did),
            subject_did,
            credential_type: credential_type_of(&vc.types).map(str::to_owned),
            credential_id: claims.jti.clone(),
            disclosed_claims: None,
            valid_from,
            valid_until,
            is_revoked: None,
        };

        if valid_until.is_some_and(|exp| exp < Utc::now()) {
            result.is_valid = false;
            result.error = Some(VerificationError::Expired.to_string());
            return Ok(result);
        }

        result.disclosed_claims = Some(disclosed_claims);
        if let Some(jti) = &claims.jti {
            result.is_revoked = self.revocation_state(jti).await;
        }

        Ok(result)
    }

    async fn revocation_state(&self, jti: &str) -> Option<bool> {
        let id = jti.trim_start_matches(CREDENTIAL_ID_PREFIX);

        match self.repository.get_by_id(id).await {
            Ok(record) => record.map(|record| record.is_revoked),
            Err(err) => {
                warn!(credential_id = id, %err, "revocation state unavailable");
                None
            }
        }
    }
}

/// The `alg` of the header; absent means `HS256`, which is all tokens of
/// legacy issuers carry.
fn header_algorithm(header: &JsonObject) -> Outcome<SigningAlgorithm> {
    match header.get("alg") {
        None => Ok(SigningAlgorithm::Hs256),
        Some(Value::String(alg)) => alg
            .parse::<SigningAlgorithm>()
            .map_err(|_| VerificationError::UnsupportedAlgorithm(alg.clone())),
        Some(other) => Err(VerificationError::UnsupportedAlgorithm(other.to_string())),
    }
}

/// Checks the `presented` disclosures against the signed `_sd` digests and
/// merges their claims with the always-visible claims of `subject`.
///
/// A disclosed claim wins over a visible claim of the same name.
fn reveal_claims(
    claims: &SdJwtVcClaims,
    mut subject: JsonObject,
    presented: &[&str],
) -> Outcome<JsonObject> {
    let digests: HashSet<String> = match subject.remove(SD_FIELD_NAME) {
        Some(Value::Array(digests)) => digests
            .into_iter()
            .filter_map(|digest| match digest {
                Value::String(digest) => Some(digest),
                _ => None,
            })
            .collect(),
        _ => HashSet::new(),
    };

    let mut disclosed = JsonObject::new();
    if !presented.is_empty() {
        if let Some(sd_alg) = &claims.sd_alg {
            sd_alg
                .parse::<HashingAlgorithm>()
                .map_err(|err| err.error)?;
        }

        for serialized in presented {
            let disclosure =
                Disclosure::try_from(*serialized).map_err(|err| err.error)?;
            if !digests.contains(&disclosure.digest(Sha256)) {
                return Err(VerificationError::DisclosureNotFound);
            }
            let (name, value) = disclosure.into_claim();
            disclosed.insert(name, value);
        }
    }

    for (name, value) in subject {
        disclosed.entry(name).or_insert(value);
    }

    Ok(disclosed)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use imm_jws::json_object;
    use serde_json::json;

    use super::*;
    use crate::VcClaims;

    fn claims_with(sd_alg: Option<&str>) -> SdJwtVcClaims {
        SdJwtVcClaims {
            iss: Some("did:web:school.example".to_owned()),
            iat: None,
            jti: None,
            exp: None,
            sd_alg: sd_alg.map(str::to_owned),
            vc: Some(VcClaims::default()),
        }
    }

    #[test]
    fn header_algorithm_defaults_to_hs256() {
        assert_eq!(header_algorithm(&JsonObject::new()), Ok(SigningAlgorithm::Hs256));
        assert_eq!(
            header_algorithm(&json_object!({"alg": "EdDSA"})),
            Ok(SigningAlgorithm::EdDsa)
        );
        assert_eq!(
            header_algorithm(&json_object!({"alg": "none"})),
            Err(VerificationError::UnsupportedAlgorithm("none".to_owned()))
        );
        assert_matches!(
            header_algorithm(&json_object!({"alg": 5})),
            Err(VerificationError::UnsupportedAlgorithm(_))
        );
    }

    #[test]
    fn disclosed_claims_override_visible_ones() {
        let disclosure = Disclosure::new("salt".to_owned(), "a".to_owned(), json!("hidden"));
        let subject = json_object!({
            "a": "visible",
            "b": 2,
            "_sd": [disclosure.digest(Sha256)],
        });

        let revealed =
            reveal_claims(&claims_with(Some("sha-256")), subject, &[disclosure.as_str()]).unwrap();

        assert_eq!(revealed, json_object!({"a": "hidden", "b": 2}));
    }

    #[test]
    fn unsigned_disclosures_are_rejected() {
        let signed = Disclosure::new("salt".to_owned(), "a".to_owned(), json!(1));
        let forged = Disclosure::new("salt".to_owned(), "a".to_owned(), json!(2));
        let subject = json_object!({"_sd": [signed.digest(Sha256)]});

        assert_eq!(
            reveal_claims(&claims_with(None), subject, &[forged.as_str()]),
            Err(VerificationError::DisclosureNotFound)
        );
    }

    #[test]
    fn malformed_disclosures_and_hash_algorithms_are_rejected() {
        let disclosure = Disclosure::new("salt".to_owned(), "a".to_owned(), json!(1));
        let subject = json_object!({"_sd": [disclosure.digest(Sha256)]});

        assert_eq!(
            reveal_claims(&claims_with(None), subject.clone(), &["%%%"]),
            Err(VerificationError::InvalidDisclosure)
        );
        assert_eq!(
            reveal_claims(&claims_with(Some("md5")), subject, &[disclosure.as_str()]),
            Err(VerificationError::UnsupportedHashAlgorithm("md5".to_owned()))
        );
    }

    #[test]
    fn no_disclosures_reveal_only_visible_claims() {
        let subject = json_object!({"id": "did:key:z6MkStudent", "_sd": ["abc"]});

        let revealed = reveal_claims(&claims_with(Some("sha-256")), subject, &[]).unwrap();

        assert_eq!(revealed, json_object!({"id": "did:key:z6MkStudent"}));
    }
}
