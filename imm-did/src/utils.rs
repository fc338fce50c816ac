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

use std::time::Duration;

use bherror::{traits::ForeignError as _, Result};
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::DidError;

/// Builds the HTTP client shared by the networked resolvers.
///
/// Every request is bounded by `timeout`; a timed out request is a failed
/// resolution like any other network error.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, DidError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .foreign_err(|| DidError::HttpClient)
}

/// Sends `request` and decodes a successful JSON response.
///
/// Every failure is logged and yields `None`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    did: &str,
) -> Option<T> {
    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(did, %err, "DID resolution request failed");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(did, %status, "DID resolution rejected");
        return None;
    }

    match response.json().await {
        Ok(value) => Some(value),
        Err(err) => {
            error!(did, %err, "malformed DID resolution response");
            None
        }
    }
}

/// The DIF resolution path of `did` under `base_url`.
pub(crate) fn identifiers_url(base_url: &str, did: &str) -> String {
    format!("{base_url}/1.0/identifiers/{}", urlencoding::encode(did))
}

pub(crate) fn trim_url(url: impl Into<String>) -> String {
    let mut url = url.into();
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_url_escapes_did() {
        assert_eq!(
            identifiers_url("https://resolver.cheqd.net", "did:cheqd:mainnet:abc"),
            "https://resolver.cheqd.net/1.0/identifiers/did%3Acheqd%3Amainnet%3Aabc"
        );
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(trim_url("http://agent//"), "http://agent");
        assert_eq!(trim_url("http://agent"), "http://agent");
    }
}
