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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate issues and verifies immigration Verifiable Credentials as
//! [Selective Disclosure JWTs (SD-JWT)][1].
//!
//! # Details
//!
//! * [`schema`] -- the Credential Schema Registry: required, optional and
//!   selectively disclosable claims per credential type.
//! * [`KeyStore`] -- per-issuer signing keys; new issuers get Ed25519 keys,
//!   `HS256` is kept for legacy issuers only.
//! * [`CredentialRepository`] -- issued-credential records and the
//!   per-issuer revocation status lists.
//! * [`SdJwtIssuer`] -- issuance, verification and revocation.
//!
//! # Example
//!
//! ```
//! use imm_sd_jwt::{
//!     key_store::InMemoryKeyStore, repository::InMemoryCredentialRepository, IssuanceRequest,
//!     SdJwtIssuer,
//! };
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let issuer = SdJwtIssuer::new(
//!     InMemoryKeyStore::new(),
//!     InMemoryCredentialRepository::new(),
//!     "https://issuer.example",
//! );
//!
//! let request: IssuanceRequest = serde_json::from_value(json!({
//!     "issuerDid": "did:web:consulate.example",
//!     "subjectDid": "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
//!     "credentialType": "VisaCredential",
//!     "claims": {
//!         "holderName": "Jane Roe",
//!         "visaType": "F-1",
//!         "issuingPost": "Frankfurt",
//!         "issueDate": "2024-06-01",
//!         "expirationDate": "2029-05-31",
//!         "nationality": "DE"
//!     },
//!     "validityDays": 365
//! }))
//! .unwrap();
//!
//! let issued = issuer.issue(&request).await.unwrap();
//! let result = issuer.verify(&issued.serialized_credential).await;
//!
//! assert!(result.is_valid);
//! assert_eq!(result.disclosed_claims.unwrap()["nationality"], "DE");
//! # });
//! ```
//!
//! [1]: <https://datatracker.ietf.org/doc/html/draft-ietf-oauth-selective-disclosure-jwt>

mod error;
mod issuer;
pub mod key_store;
mod models;
pub mod repository;
pub mod schema;
mod traits;
mod utils;
mod verifier;

pub use error::{IssuanceError, KeyStoreError, RepositoryError, VerificationError};
pub use imm_jws;
pub use imm_status_list;
pub use issuer::SdJwtIssuer;
pub use models::*;
pub use traits::*;
pub use utils::{base64_url_digest, ClaimNames};
