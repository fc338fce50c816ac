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

//! A `crate` dedicated to revocation Status Lists for Verifiable Credentials.
//!
//! Every issuer owns exactly one [`StatusList`]: a bitstring with a capacity
//! fixed at creation (by default [`DEFAULT_CAPACITY`] bits). Each issued
//! credential gets the next free index on its issuer's list and carries it
//! in its `credentialStatus`. A bit set to `1` means the credential was
//! revoked.
//!
//! Indices are handed out monotonically and never reused, even after the
//! credential at that index is revoked.
//!
//! # Details
//!
//! - [`StatusList`] is the mutable list the issuer works with.
//! - [`StatusListRecord`] is its persisted form, with the bits encoded as
//!   standard `base64`.
//! - [`BitstringStatusListCredential`] is the public view following the
//!   [W3C Bitstring Status List][1] data model, with a GZIP-compressed,
//!   multibase `base64url` encoded list.
//!
//! # Example
//!
//! ```
//! use imm_status_list::StatusList;
//!
//! let mut list = StatusList::default();
//! let first = list.allocate().unwrap();
//! let second = list.allocate().unwrap();
//! assert_eq!((first, second), (0, 1));
//!
//! assert!(list.set_revoked(second).unwrap());
//! assert_eq!(list.is_revoked(first), Some(false));
//! assert_eq!(list.is_revoked(second), Some(true));
//!
//! let record = list.to_record("did:key:z6Mk");
//! let restored = StatusList::from_record(&record).unwrap();
//! assert_eq!(restored.is_revoked(second), Some(true));
//! ```
//!
//! [1]: https://www.w3.org/TR/vc-bitstring-status-list/

mod credential;
mod error;
mod record;
mod status_list;
mod utils;

pub use credential::{BitstringStatusList, BitstringStatusListCredential};
pub use error::{Error, Result};
pub use record::StatusListRecord;
pub use status_list::{StatusList, DEFAULT_CAPACITY};
pub use utils::decode_compressed_list;
