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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted form of a [`StatusList`](crate::StatusList), one per issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListRecord {
    /// The DID of the issuer owning the list.
    pub issuer_did: String,
    /// The bits, standard `base64` with padding.
    pub encoded_list: String,
    /// Total capacity in entries, fixed at creation.
    pub size: usize,
    /// The next index to be handed out; never decreases.
    pub next_index: usize,
    /// When the list was created or last changed.
    pub last_updated: DateTime<Utc>,
}
