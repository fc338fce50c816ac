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

//! This crate resolves and creates [Decentralized Identifiers (DIDs)][1].
//!
//! # Details
//!
//! DID methods are served by independent components, each implementing only
//! the capabilities its backend offers:
//!
//! | method | [`DidResolver`] | [`DidManager`] | [`DidPublisher`] |
//! |---|---|---|---|
//! | `key` | [`DidKeyResolver`], local | [`DidKeyManager`], local | |
//! | `web` | [`DidWebResolver`] | | |
//! | `prism` | [`PrismAgentClient`] | [`PrismAgentClient`] | [`PrismAgentClient`] |
//! | `cheqd`, `midnight` | [`DifResolver`] | | |
//!
//! The [`UniversalDidResolver`] routes a DID to the resolver of its method,
//! optionally falling back to a DIF universal resolver endpoint.
//!
//! # Example
//!
//! ```
//! use imm_did::{DidKeyResolver, ResolutionError, UniversalDidResolver};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let resolver = UniversalDidResolver::new()
//!     .with_resolver(DidKeyResolver)
//!     .unwrap();
//!
//! let did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
//! let resolved = resolver.resolve(did).await;
//! assert_eq!(resolved.did_document.unwrap().id, did);
//!
//! let resolved = resolver.resolve("did:unknown:abc").await;
//! assert_eq!(resolved.metadata.error, Some(ResolutionError::NotFound));
//! # });
//! ```
//!
//! [1]: https://www.w3.org/TR/did-core/

mod dif;
mod document;
mod error;
mod key;
mod prism;
mod traits;
mod universal;
mod utils;
mod web;

pub use dif::{DifResolver, CHEQD_RESOLVER_URL, MIDNIGHT_RESOLVER_URL};
pub use document::*;
pub use error::DidError;
pub use key::{decode_did_key, encode_did_key, DidKeyManager, DidKeyResolver, KeyCodec};
pub use prism::{PrismAgentClient, PRISM_AGENT_URL};
pub use traits::{DidManager, DidPublisher, DidResolver};
pub use universal::UniversalDidResolver;
pub use utils::http_client;
pub use web::{did_web_to_url, DidWebResolver};
