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

//! Session state of OID4VP presentation requests.

use bherror::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::{
    utils::{is_live, random_code, NONCE_BYTES},
    PresentationDefinition, PresentationVerificationResult, StoreError,
};

/// A presentation request and, once answered, its verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPresentation {
    /// Correlates the wallet response with the request.
    pub state: String,
    /// Nonce the presentation is bound to.
    pub nonce: String,
    /// What was asked for.
    pub definition: PresentationDefinition,
    /// When the request was made.
    pub created_at: DateTime<Utc>,
    /// When the request is forgotten.
    pub expires_at: DateTime<Utc>,
    /// When the latest verdict arrived.
    pub completed_at: Option<DateTime<Utc>>,
    /// The latest verdict.
    pub result: Option<PresentationVerificationResult>,
}

impl PendingPresentation {
    /// Whether a verdict has arrived.
    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }
}

/// A freshly created request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRequest {
    /// The request state.
    pub state: String,
    /// The request nonce.
    pub nonce: String,
}

/// What [`PresentationStore::complete_request`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The first verdict was recorded.
    Recorded,
    /// An earlier verdict was replaced.
    Replaced,
    /// No live request has the state; nothing was recorded.
    Unknown,
}

/// In-memory store of presentation requests, keyed by state.
#[derive(Debug)]
pub struct PresentationStore {
    requests: DashMap<String, PendingPresentation>,
    ttl: Duration,
}

impl Default for PresentationStore {
    fn default() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }
}

impl PresentationStore {
    /// Creates an empty store; requests live ten minutes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose requests live `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            ttl,
        }
    }

    /// Stores a request for `definition`, minting its state and nonce.
    pub fn create_request(
        &self,
        definition: PresentationDefinition,
    ) -> Result<CreatedRequest, StoreError> {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let nonce = random_code(NONCE_BYTES)?;
        let created_at = Utc::now();

        debug!(%state, definition_id = %definition.id, "created presentation request");
        self.requests.insert(
            state.clone(),
            PendingPresentation {
                state: state.clone(),
                nonce: nonce.clone(),
                definition,
                created_at,
                expires_at: created_at + self.ttl,
                completed_at: None,
                result: None,
            },
        );

        Ok(CreatedRequest { state, nonce })
    }

    /// The live request of `state`, completed or not.
    pub fn get_request(&self, state: &str) -> Option<PendingPresentation> {
        self.drop_if_expired(state);
        self.requests.get(state).map(|pending| pending.value().clone())
    }

    /// Attaches a verdict to the live request of `state`.
    ///
    /// A later verdict replaces an earlier one.
    pub fn complete_request(&self, state: &str, result: PresentationVerificationResult) -> Completion {
        self.drop_if_expired(state);

        let Some(mut pending) = self.requests.get_mut(state) else {
            debug!(state, "verdict for unknown presentation request");
            return Completion::Unknown;
        };

        pending.completed_at = Some(Utc::now());
        match pending.result.replace(result) {
            Some(_) => Completion::Replaced,
            None => Completion::Recorded,
        }
    }

    /// Drops every expired request, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.requests.len();
        self.requests
            .retain(|_, pending| is_live(pending.expires_at, now));
        before.saturating_sub(self.requests.len())
    }

    fn drop_if_expired(&self, state: &str) {
        let now = Utc::now();
        self.requests
            .remove_if(state, |_, pending| !is_live(pending.expires_at, now));
    }
}

#[cfg(test)]
mod tests {
    use crate::Scenario;

    use super::*;

    fn verdict(is_valid: bool) -> PresentationVerificationResult {
        PresentationVerificationResult {
            is_valid,
            ..Default::default()
        }
    }

    #[test]
    fn request_lifecycle() {
        let store = PresentationStore::new();
        let created = store
            .create_request(Scenario::F1Status.definition())
            .unwrap();

        let pending = store.get_request(&created.state).unwrap();
        assert!(!pending.is_completed());
        assert_eq!(pending.nonce, created.nonce);
        assert_eq!(pending.definition.id, "f1-status-verification");

        assert_eq!(store.complete_request(&created.state, verdict(false)), Completion::Recorded);
        assert_eq!(store.complete_request(&created.state, verdict(true)), Completion::Replaced);

        let pending = store.get_request(&created.state).unwrap();
        assert!(pending.is_completed());
        assert!(pending.completed_at.is_some());
        assert_eq!(pending.result, Some(verdict(true)));
    }

    #[test]
    fn states_and_nonces_are_fresh() {
        let store = PresentationStore::new();
        let a = store.create_request(Scenario::J1Status.definition()).unwrap();
        let b = store.create_request(Scenario::J1Status.definition()).unwrap();

        assert_ne!(a.state, b.state);
        assert_ne!(a.nonce, b.nonce);
        assert_eq!(a.state.len(), 32);
    }

    #[test]
    fn expired_requests_are_gone() {
        let store = PresentationStore::with_ttl(Duration::zero());
        let created = store
            .create_request(Scenario::AdmissionStatus.definition())
            .unwrap();

        assert_eq!(store.get_request(&created.state), None);
        assert_eq!(store.complete_request(&created.state, verdict(true)), Completion::Unknown);
        assert_eq!(store.complete_request("never-issued", verdict(true)), Completion::Unknown);
    }

    #[test]
    fn purge_counts_expired_requests() {
        let store = PresentationStore::with_ttl(Duration::zero());
        store.create_request(Scenario::F1Status.definition()).unwrap();
        store.create_request(Scenario::J1Status.definition()).unwrap();

        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.purge_expired(), 0);
    }
}
