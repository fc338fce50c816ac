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

mod claims;
mod credential;
mod disclosure;
mod record;
mod request;

pub use claims::{SdJwtVcClaims, VcClaims};
pub(crate) use credential::{credential_type_of, CONTEXT_VC_V2, TYPE_VERIFIABLE_CREDENTIAL};
pub use credential::{CredentialStatus, VerifiableCredential};
pub use disclosure::{Digest, Disclosure, Salt};
pub use record::{IssuedCredentialRecord, SigningKeyRecord};
pub use request::{IssuanceRequest, IssuedCredential, VerificationResult, VC_SD_JWT_FORMAT};

/// Type alias for a JSON object.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
