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

/// Errors of DID creation, publication and resolver registration.
///
/// Resolution itself never fails; see [`DidResolver`](crate::DidResolver).
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum DidError {
    /// The string is not a DID.
    #[strum(to_string = "Invalid DID: {0}")]
    InvalidDid(String),

    /// The DID method is not supported by the operation.
    #[strum(to_string = "Unsupported DID method: {0}")]
    UnsupportedMethod(String),

    /// The remote agent could not be reached.
    #[strum(to_string = "Cannot reach agent at {0}")]
    AgentUnreachable(String),

    /// The remote agent answered with an error status.
    #[strum(to_string = "Agent returned {0}: {1}")]
    AgentRejected(u16, String),

    /// The remote response could not be interpreted.
    #[strum(to_string = "Invalid response from {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be built.
    #[strum(to_string = "HTTP client could not be created")]
    HttpClient,

    /// Key material for a new DID could not be generated.
    #[strum(to_string = "Key generation failed")]
    KeyGeneration,

    /// A resolver for the method is already registered.
    #[strum(to_string = "A resolver for did:{0} is already registered")]
    DuplicateMethod(String),
}

impl bherror::BhError for DidError {}
