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

use std::future::Future;

use bherror::Result;

use crate::{
    DidCreationOptions, DidDocument, DidError, DidStatusResult, PublicationOutcome,
};

/// Resolves the DIDs of one DID method.
///
/// Resolution never fails: network errors, missing documents and malformed
/// responses all yield `None` after being logged.
pub trait DidResolver: Sync {
    /// The DID method, e.g. `key` or `web`.
    fn method(&self) -> &str;

    /// Whether `did` belongs to [`DidResolver::method`].
    fn can_resolve(&self, did: &str) -> bool {
        did.strip_prefix("did:")
            .and_then(|rest| rest.strip_prefix(self.method()))
            .is_some_and(|rest| rest.starts_with(':'))
    }

    /// Resolves `did`, which [`DidResolver::can_resolve`].
    fn resolve(&self, did: &str) -> impl Future<Output = Option<DidDocument>> + Send;
}

/// Creates new DIDs of one method.
pub trait DidManager: Sync {
    /// Creates a DID and returns its document.
    fn create_did(
        &self,
        options: &DidCreationOptions,
    ) -> impl Future<Output = Result<DidDocument, DidError>> + Send;
}

/// Anchors DIDs on a ledger and reports their ledger status.
pub trait DidPublisher: Sync {
    /// Requests publication of `did`.
    fn publish(&self, did: &str) -> impl Future<Output = PublicationOutcome> + Send;

    /// The ledger status of `did`.
    fn status(&self, did: &str) -> impl Future<Output = DidStatusResult> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DidKeyResolver, DidWebResolver, DifResolver, PrismAgentClient, CHEQD_RESOLVER_URL,
        MIDNIGHT_RESOLVER_URL, PRISM_AGENT_URL,
    };

    struct Fixed(&'static str);

    impl DidResolver for Fixed {
        fn method(&self) -> &str {
            self.0
        }

        async fn resolve(&self, did: &str) -> Option<DidDocument> {
            Some(DidDocument::new(did))
        }
    }

    #[test]
    fn method_prefix_matching() {
        let cheqd = Fixed("cheqd");

        assert!(cheqd.can_resolve("did:cheqd:mainnet:abc123"));
        assert!(!cheqd.can_resolve("did:cheqdx:mainnet:abc123"));
        assert!(!cheqd.can_resolve("did:cheqd"));
        assert!(!cheqd.can_resolve("cheqd:mainnet:abc123"));
        assert!(!Fixed("key").can_resolve("did:cheqd:mainnet:abc123"));
    }

    #[test]
    fn only_the_cheqd_resolver_claims_cheqd_dids() {
        let client = reqwest::Client::new();
        let did = "did:cheqd:mainnet:abc123";

        assert!(!DidKeyResolver.can_resolve(did));
        assert!(!DidWebResolver::new(client.clone()).can_resolve(did));
        assert!(!PrismAgentClient::new(PRISM_AGENT_URL, None, client.clone()).can_resolve(did));
        assert!(!DifResolver::midnight(MIDNIGHT_RESOLVER_URL, client.clone()).can_resolve(did));
        assert!(DifResolver::cheqd(CHEQD_RESOLVER_URL, client).can_resolve(did));

        assert!(DidKeyResolver.can_resolve("did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"));
        assert!(!DidKeyResolver.can_resolve("did:keyx:z6Mk"));
    }
}
