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

//! An in-memory [`CredentialRepository`] with the Status List Manager.

use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Mutex,
};

use bherror::{traits::PropagateError as _, Error, Result};
use chrono::Utc;
use imm_status_list::{StatusList, StatusListRecord, DEFAULT_CAPACITY};
use tracing::{debug, info};

use crate::{utils::lock, CredentialRepository, IssuedCredentialRecord, RepositoryError};

#[derive(Debug, Default)]
struct State {
    records: HashMap<String, IssuedCredentialRecord>,
    status_lists: HashMap<String, StatusList>,
}

/// A [`CredentialRepository`] keeping records and status lists in process
/// memory.
///
/// Records and status lists share a single lock, which makes the bit flip
/// and the record update of a revocation one atomic step.
#[derive(Debug)]
pub struct InMemoryCredentialRepository {
    capacity: usize,
    state: Mutex<State>,
}

impl Default for InMemoryCredentialRepository {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl InMemoryCredentialRepository {
    /// Creates an empty repository whose status lists hold
    /// [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty repository whose status lists hold `capacity`
    /// entries each.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State::default()),
        }
    }

    /// The capacity of newly created status lists.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn records_where(
        &self,
        predicate: impl Fn(&IssuedCredentialRecord) -> bool,
    ) -> Vec<IssuedCredentialRecord> {
        let mut records: Vec<_> = lock(&self.state)
            .records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        records
    }
}

impl CredentialRepository for InMemoryCredentialRepository {
    async fn store(
        &self,
        record: IssuedCredentialRecord,
    ) -> Result<IssuedCredentialRecord, RepositoryError> {
        let mut state = lock(&self.state);

        match state.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(Error::root(RepositoryError::DuplicateCredential(record.id))),
            Entry::Vacant(entry) => Ok(entry.insert(record).clone()),
        }
    }

    async fn get_by_id(
        &self,
        credential_id: &str,
    ) -> Result<Option<IssuedCredentialRecord>, RepositoryError> {
        Ok(lock(&self.state).records.get(credential_id).cloned())
    }

    async fn get_by_subject(
        &self,
        subject_did: &str,
    ) -> Result<Vec<IssuedCredentialRecord>, RepositoryError> {
        Ok(self.records_where(|record| record.subject_did == subject_did))
    }

    async fn get_by_issuer(
        &self,
        issuer_did: &str,
    ) -> Result<Vec<IssuedCredentialRecord>, RepositoryError> {
        Ok(self.records_where(|record| record.issuer_did == issuer_did))
    }

    async fn revoke(&self, credential_id: &str) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.state);
        let State {
            records,
            status_lists,
        } = &mut *guard;

        let Some(record) = records.get_mut(credential_id) else {
            debug!(credential_id, "revocation of unknown credential");
            return Ok(false);
        };
        if record.is_revoked {
            debug!(credential_id, "credential already revoked");
            return Ok(false);
        }

        let Some(status_list) = status_lists.get_mut(&record.issuer_did) else {
            return Err(Error::root(RepositoryError::StatusList)
                .ctx(format!("no status list for {}", record.issuer_did)));
        };
        status_list
            .set_revoked(record.status_list_index)
            .with_err(|| RepositoryError::StatusList)?;

        record.is_revoked = true;
        record.revoked_at = Some(Utc::now());
        info!(
            credential_id,
            issuer_did = %record.issuer_did,
            index = record.status_list_index,
            "credential revoked"
        );

        Ok(true)
    }

    async fn get_status_list(
        &self,
        issuer_did: &str,
    ) -> Result<Option<StatusListRecord>, RepositoryError> {
        Ok(lock(&self.state)
            .status_lists
            .get(issuer_did)
            .map(|list| list.to_record(issuer_did)))
    }

    async fn allocate_index(&self, issuer_did: &str) -> Result<usize, RepositoryError> {
        let mut state = lock(&self.state);

        state
            .status_lists
            .entry(issuer_did.to_owned())
            .or_insert_with(|| StatusList::new(self.capacity))
            .allocate()
            .with_err(|| RepositoryError::StatusListExhausted(issuer_did.to_owned()))
    }
}
