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

/// Errors of the [`SsiService`](crate::SsiService) operations.
///
/// The messages are meant for API clients; the OAuth errors of the token and
/// credential endpoints carry their error code in
/// [`ServiceError::oauth_error`].
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ServiceError {
    /// The request is invalid.
    #[strum(to_string = "{0}")]
    Validation(String),

    /// The addressed resource does not exist.
    #[strum(to_string = "{0}")]
    NotFound(String),

    /// The DID method cannot be used for the operation.
    #[strum(to_string = "Unsupported DID method for creation: {0}. Supported: key, prism")]
    UnsupportedMethod(String),

    /// A remote agent could not be reached.
    #[strum(to_string = "{0}")]
    GatewayUnreachable(String),

    /// A remote agent refused the request.
    #[strum(to_string = "{0}")]
    GatewayRejected(String),

    /// Issuance failed for a reason other than the request.
    #[strum(to_string = "Credential issuance failed")]
    Issuance,

    /// The pre-authorized code is missing, unknown, used or expired.
    #[strum(to_string = "{0}")]
    InvalidGrant(&'static str),

    /// The access token is missing, unknown, used or expired.
    #[strum(to_string = "{0}")]
    InvalidToken(&'static str),

    /// The token request uses a grant other than the pre-authorized code.
    #[strum(to_string = "unsupported_grant_type")]
    UnsupportedGrantType,

    /// An internal dependency failed.
    #[strum(to_string = "Internal error")]
    Internal,
}

impl bherror::BhError for ServiceError {}

impl ServiceError {
    /// The OAuth 2.0 `error` code of the variant, if it is an OAuth error.
    pub fn oauth_error(&self) -> Option<&'static str> {
        match self {
            Self::InvalidGrant(_) => Some("invalid_grant"),
            Self::InvalidToken(_) => Some("invalid_token"),
            Self::UnsupportedGrantType => Some("unsupported_grant_type"),
            _ => None,
        }
    }

    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::GatewayUnreachable(_) | Self::GatewayRejected(_) | Self::Issuance | Self::Internal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_codes() {
        let err = ServiceError::InvalidGrant("Invalid or expired pre-authorized code");
        assert_eq!(err.oauth_error(), Some("invalid_grant"));
        assert_eq!(err.to_string(), "Invalid or expired pre-authorized code");

        assert_eq!(
            ServiceError::UnsupportedGrantType.to_string(),
            ServiceError::UnsupportedGrantType.oauth_error().unwrap()
        );
        assert_eq!(ServiceError::Validation("x".to_owned()).oauth_error(), None);
    }

    #[test]
    fn unsupported_method_lists_alternatives() {
        let err = ServiceError::UnsupportedMethod("web".to_owned());

        assert_eq!(
            err.to_string(),
            "Unsupported DID method for creation: web. Supported: key, prism"
        );
        assert!(err.is_client_error());
        assert!(!ServiceError::GatewayUnreachable(String::new()).is_client_error());
    }
}
