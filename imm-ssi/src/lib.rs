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

//! This crate is the self-sovereign identity core of an immigration
//! credential system.
//!
//! # Details
//!
//! [`SsiService`] wires the pieces together from an [`SsiConfig`]:
//!
//! * issuance, verification and revocation of SD-JWT credentials and their
//!   status lists, from [`imm_sd_jwt`],
//! * resolution and creation of DIDs, from [`imm_did`],
//! * the OID4VCI pre-authorized code flow and OID4VP presentation requests,
//!   from [`imm_oid4vc`].
//!
//! All state is held in memory and every operation takes `&self`, so a
//! single service can be shared between concurrent requests.
//!
//! # Example
//!
//! ```
//! use imm_sd_jwt::{imm_jws::json_object, IssuanceRequest};
//! use imm_ssi::{SsiConfig, SsiService};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let service = SsiService::new(SsiConfig::default()).unwrap();
//!
//! let issued = service
//!     .issue(&IssuanceRequest {
//!         issuer_did: "did:web:consulate.example".to_owned(),
//!         subject_did: "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK".to_owned(),
//!         credential_type: "PassportCredential".to_owned(),
//!         claims: json_object!({
//!             "holderName": "Jane Doe",
//!             "nationality": "CAN",
//!             "issuingState": "CAN",
//!             "documentNumber": "X1234567",
//!             "dateOfBirth": "1999-01-31",
//!             "expirationDate": "2031-01-30",
//!             "sex": "F",
//!         }),
//!         selective_disclosure_claims: None,
//!         validity_days: None,
//!     })
//!     .await
//!     .unwrap();
//!
//! let verified = service.verify(&issued.serialized_credential).await;
//! assert!(verified.is_valid);
//! assert_eq!(verified.is_revoked, Some(false));
//!
//! assert!(service.revoke(&issued.credential_id).await.unwrap());
//! let verified = service.verify(&issued.serialized_credential).await;
//! assert_eq!(verified.is_revoked, Some(true));
//! # });
//! ```

mod config;
mod error;
mod oid4vci;
mod oid4vp;
mod service;

pub use config::{ConfigError, SsiConfig, MAX_STATUS_LIST_CAPACITY};
pub use error::ServiceError;
pub use imm_did;
pub use imm_oid4vc;
pub use imm_sd_jwt;
pub use oid4vci::CreateOfferRequest;
pub use oid4vp::{CreatePresentationRequest, PresentationState, PresentationStatus};
pub use service::{DidMethods, Issuer, SsiService};
