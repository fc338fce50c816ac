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

//! Session state of the OID4VCI pre-authorized code flow.

use bherror::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use imm_sd_jwt::IssuanceRequest;
use tracing::debug;

use crate::{
    utils::{is_live, random_code, whole_seconds, CODE_BYTES},
    StoreError,
};

/// Lifetimes of offers, sessions and nonces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferTtls {
    /// How long a pre-authorized code can be exchanged.
    pub offer: Duration,
    /// How long an access token is accepted.
    pub session: Duration,
    /// The advertised lifetime of `c_nonce`.
    pub c_nonce: Duration,
}

impl Default for OfferTtls {
    fn default() -> Self {
        Self {
            offer: Duration::minutes(10),
            session: Duration::hours(1),
            c_nonce: Duration::minutes(5),
        }
    }
}

/// An offer waiting for its pre-authorized code.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOffer {
    /// The offer id.
    pub offer_id: String,
    /// What will be issued.
    pub request: IssuanceRequest,
    /// The offered configuration.
    pub credential_configuration_id: String,
    /// When the offer was made.
    pub created_at: DateTime<Utc>,
    /// When the code stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// A session opened by exchanging a pre-authorized code.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedSession {
    /// What will be issued.
    pub request: IssuanceRequest,
    /// The offered configuration.
    pub credential_configuration_id: String,
    /// Nonce for proofs of possession.
    pub c_nonce: String,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// A freshly created offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedOffer {
    /// The offer id.
    pub offer_id: String,
    /// The single-use code handed to the holder.
    pub pre_authorized_code: String,
}

/// A freshly opened session.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// The access token.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// Nonce lifetime in seconds.
    pub c_nonce_expires_in: u64,
    /// The session behind the token.
    pub session: AuthorizedSession,
}

/// In-memory store of credential offers and authorized sessions.
///
/// Codes and tokens are looked up concurrently by unrelated requests, so both
/// maps are concurrent maps. Expired entries are dropped when they are read
/// and by [`OfferStore::purge_expired`].
#[derive(Debug, Default)]
pub struct OfferStore {
    offers: DashMap<String, PendingOffer>,
    sessions: DashMap<String, AuthorizedSession>,
    ttls: OfferTtls,
}

impl OfferStore {
    /// Creates an empty store with the default lifetimes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given lifetimes.
    pub fn with_ttls(ttls: OfferTtls) -> Self {
        Self {
            ttls,
            ..Self::default()
        }
    }

    /// The lifetimes in use.
    pub fn ttls(&self) -> OfferTtls {
        self.ttls
    }

    /// Stores an offer to issue `request` and mints its pre-authorized code.
    pub fn create_offer(
        &self,
        request: IssuanceRequest,
        credential_configuration_id: &str,
    ) -> Result<CreatedOffer, StoreError> {
        let offer_id = uuid::Uuid::new_v4().simple().to_string();
        let pre_authorized_code = random_code(CODE_BYTES)?;
        let created_at = Utc::now();

        self.offers.insert(
            pre_authorized_code.clone(),
            PendingOffer {
                offer_id: offer_id.clone(),
                request,
                credential_configuration_id: credential_configuration_id.to_owned(),
                created_at,
                expires_at: created_at + self.ttls.offer,
            },
        );
        debug!(%offer_id, credential_configuration_id, "created credential offer");

        Ok(CreatedOffer {
            offer_id,
            pre_authorized_code,
        })
    }

    /// Exchanges a pre-authorized code for an access token.
    ///
    /// The code is consumed before its expiry is checked, so it can be
    /// exchanged at most once even by concurrent callers. Returns `None` for
    /// unknown, used or expired codes.
    pub fn exchange_pre_authorized_code(
        &self,
        pre_authorized_code: &str,
    ) -> Result<Option<IssuedToken>, StoreError> {
        let Some((_, offer)) = self.offers.remove(pre_authorized_code) else {
            return Ok(None);
        };

        let now = Utc::now();
        if !is_live(offer.expires_at, now) {
            debug!(offer_id = %offer.offer_id, "pre-authorized code expired");
            return Ok(None);
        }

        let access_token = random_code(CODE_BYTES)?;
        let session = AuthorizedSession {
            request: offer.request,
            credential_configuration_id: offer.credential_configuration_id,
            c_nonce: random_code(CODE_BYTES)?,
            expires_at: now + self.ttls.session,
        };
        self.sessions.insert(access_token.clone(), session.clone());
        debug!(offer_id = %offer.offer_id, "exchanged pre-authorized code");

        Ok(Some(IssuedToken {
            access_token,
            expires_in: whole_seconds(self.ttls.session),
            c_nonce_expires_in: whole_seconds(self.ttls.c_nonce),
            session,
        }))
    }

    /// The live session of `access_token`.
    pub fn get_session(&self, access_token: &str) -> Option<AuthorizedSession> {
        let now = Utc::now();
        self.sessions
            .remove_if(access_token, |_, session| !is_live(session.expires_at, now));

        self.sessions
            .get(access_token)
            .map(|session| session.value().clone())
    }

    /// Takes the live session of `access_token` out of the store.
    ///
    /// Like a pre-authorized code, the session is removed before its expiry
    /// is checked, so of concurrent callers at most one gets it. Hand it back
    /// with [`OfferStore::restore_session`] if it was not used up.
    pub fn take_session(&self, access_token: &str) -> Option<AuthorizedSession> {
        let (_, session) = self.sessions.remove(access_token)?;
        is_live(session.expires_at, Utc::now()).then_some(session)
    }

    /// Puts back a session taken with [`OfferStore::take_session`]. Its
    /// expiry is unchanged.
    pub fn restore_session(&self, access_token: &str, session: AuthorizedSession) {
        self.sessions.insert(access_token.to_owned(), session);
    }

    /// Ends the session of `access_token`, returning it if it existed.
    pub fn remove_session(&self, access_token: &str) -> Option<AuthorizedSession> {
        self.sessions
            .remove(access_token)
            .map(|(_, session)| session)
    }

    /// Drops every expired offer and session, returning how many were
    /// dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.offers.len() + self.sessions.len();

        self.offers.retain(|_, offer| is_live(offer.expires_at, now));
        self.sessions
            .retain(|_, session| is_live(session.expires_at, now));

        before.saturating_sub(self.offers.len() + self.sessions.len())
    }
}
