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

//! This crate holds the protocol side of [OpenID for Verifiable Credential
//! Issuance (OID4VCI)][1] and [OpenID for Verifiable Presentations
//! (OID4VP)][2].
//!
//! # Details
//!
//! The wire models live in [`vci`] and [`vp`]. The [`OfferStore`] tracks
//! credential offers through the pre-authorized code flow: an offer mints a
//! single-use code, the code is exchanged for an access token, and the token
//! is good for one credential. The [`PresentationStore`] tracks presentation
//! requests until the wallet answers. Both stores are safe to share between
//! concurrent requests.
//!
//! # Example
//!
//! ```
//! use imm_oid4vc::{OfferStore, PresentationStore, Scenario};
//! use imm_sd_jwt::IssuanceRequest;
//!
//! let offers = OfferStore::new();
//! let offer = offers
//!     .create_offer(IssuanceRequest::default(), "I20Credential")
//!     .unwrap();
//!
//! let token = offers
//!     .exchange_pre_authorized_code(&offer.pre_authorized_code)
//!     .unwrap()
//!     .unwrap();
//! assert!(offers.get_session(&token.access_token).is_some());
//!
//! // The code is single use.
//! assert!(offers
//!     .exchange_pre_authorized_code(&offer.pre_authorized_code)
//!     .unwrap()
//!     .is_none());
//!
//! let presentations = PresentationStore::new();
//! let request = presentations
//!     .create_request(Scenario::F1Status.definition())
//!     .unwrap();
//! assert!(!presentations.get_request(&request.state).unwrap().is_completed());
//! ```
//!
//! [1]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html
//! [2]: https://openid.net/specs/openid-4-verifiable-presentations-1_0.html

mod error;
mod offer_store;
mod presentation_store;
mod scenarios;
mod utils;
pub mod vci;
pub mod vp;

pub use error::StoreError;
pub use offer_store::{
    AuthorizedSession, CreatedOffer, IssuedToken, OfferStore, OfferTtls, PendingOffer,
};
pub use presentation_store::{Completion, CreatedRequest, PendingPresentation, PresentationStore};
pub use scenarios::{scenarios, Scenario, ScenarioSummary};
pub use vci::*;
pub use vp::*;
