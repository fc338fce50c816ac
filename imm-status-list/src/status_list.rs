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

use crate::{
    utils::{
        base64_decode, base64_encode, byte_and_inner_idx, bytes_for, compress_and_encode,
        msb_first,
    },
    BitstringStatusListCredential, Error, Result, StatusListRecord,
};

/// The number of entries on a freshly created Status List.
pub const DEFAULT_CAPACITY: usize = 16384;

/// A revocation Status List of a single issuer.
///
/// The list has a fixed `capacity` and a `next_index` pointing at the first
/// entry that was never handed out. Each entry takes exactly one bit, stored
/// least significant bit first within each `byte`.
///
/// # Note
///
/// The list does not synchronize itself. Whoever owns it must serialize
/// [`StatusList::allocate`] and [`StatusList::set_revoked`] calls, otherwise
/// concurrent revocations can overwrite each other's bit flips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusList {
    lst: Vec<u8>,
    capacity: usize,
    next_index: usize,
    last_updated: DateTime<Utc>,
}

impl Default for StatusList {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StatusList {
    /// Creates a new list of `capacity` entries, all set to `0`.
    pub fn new(capacity: usize) -> Self {
        Self {
            lst: vec![0; bytes_for(capacity)],
            capacity,
            next_index: 0,
            last_updated: Utc::now(),
        }
    }

    /// Loads a list from its persisted form.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidEncoding`] if the list is not valid `base64`, and
    /// [`Error::InconsistentSize`] if the decoded length does not match the
    /// `size`, or the `next_index` lies beyond it.
    pub fn from_record(record: &StatusListRecord) -> Result<Self> {
        let lst = base64_decode(&record.encoded_list)?;

        if lst.len() != bytes_for(record.size) {
            return Err(bherror::Error::root(Error::InconsistentSize)
                .ctx("decoded list length does not match `size`"));
        }

        if record.next_index > record.size {
            return Err(bherror::Error::root(Error::InconsistentSize)
                .ctx("`next_index` is beyond `size`"));
        }

        Ok(Self {
            lst,
            capacity: record.size,
            next_index: record.next_index,
            last_updated: record.last_updated,
        })
    }

    /// The fixed number of entries on the list.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The index the next [`StatusList::allocate`] call returns.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// When the list was created or last had an entry revoked.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Gets the reference to the raw bits.
    pub fn lst(&self) -> &[u8] {
        &self.lst
    }

    /// Hands out the next free index.
    ///
    /// # Errors
    ///
    /// [`Error::Exhausted`] once all `capacity` indices were handed out.
    pub fn allocate(&mut self) -> Result<usize> {
        if self.next_index >= self.capacity {
            return Err(bherror::Error::root(Error::Exhausted(self.capacity)));
        }

        let index = self.next_index;
        self.next_index += 1;

        Ok(index)
    }

    /// Sets the bit at `index` to `1`, marking the credential as revoked, and
    /// bumps `last_updated`.
    ///
    /// Returns `false`, leaving the list untouched, if the bit was already set.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfBounds`] if `index` is not below the capacity.
    pub fn set_revoked(&mut self, index: usize) -> Result<bool> {
        if index >= self.capacity {
            return Err(bherror::Error::root(Error::IndexOutOfBounds(
                self.capacity,
                index,
            )));
        }

        let (byte_idx, inner_idx) = byte_and_inner_idx(index);
        let byte = self
            .lst
            .get_mut(byte_idx)
            // Unreachable given the capacity check and the list length.
            .ok_or_else(|| bherror::Error::root(Error::IndexOutOfBounds(self.capacity, index)))?;

        let mask = 1u8 << inner_idx;
        if *byte & mask != 0 {
            return Ok(false);
        }

        *byte |= mask;
        self.last_updated = Utc::now();

        Ok(true)
    }

    /// Returns whether the entry at `index` is revoked, or `None` if the
    /// `index` is out of bounds.
    pub fn is_revoked(&self, index: usize) -> Option<bool> {
        if index >= self.capacity {
            return None;
        }

        let (byte_idx, inner_idx) = byte_and_inner_idx(index);
        let byte = self.lst.get(byte_idx)?;

        Some((byte >> inner_idx) & 1 == 1)
    }

    /// The bits as standard `base64`, as stored in the [`StatusListRecord`].
    pub fn encoded_list(&self) -> String {
        base64_encode(&self.lst)
    }

    /// Produces the persisted form of the list for `issuer_did`.
    pub fn to_record(&self, issuer_did: &str) -> StatusListRecord {
        StatusListRecord {
            issuer_did: issuer_did.to_owned(),
            encoded_list: self.encoded_list(),
            size: self.capacity,
            next_index: self.next_index,
            last_updated: self.last_updated,
        }
    }

    /// Produces the public [`BitstringStatusListCredential`] for `issuer_did`,
    /// published under `url`.
    ///
    /// Unlike the record, the `encodedList` holds index `0` in the most
    /// significant bit of the first byte.
    ///
    /// # Errors
    ///
    /// [`Error::Compression`] if the list cannot be compressed.
    pub fn to_credential(&self, issuer_did: &str, url: &str) -> Result<BitstringStatusListCredential> {
        let encoded_list = compress_and_encode(msb_first(&self.lst))?;

        Ok(BitstringStatusListCredential::new(
            issuer_did,
            url,
            encoded_list,
            self.last_updated,
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::decode_compressed_list;

    #[test]
    fn new_list_is_empty_and_sized() {
        let list = StatusList::default();

        assert_eq!(list.capacity(), DEFAULT_CAPACITY);
        assert_eq!(list.next_index(), 0);
        assert_eq!(list.lst().len(), 2048);
        assert!(list.lst().iter().all(|b| *b == 0));
    }

    #[test]
    fn allocation_is_monotonic_until_exhausted() {
        let mut list = StatusList::new(3);

        assert_eq!(list.allocate().unwrap(), 0);
        assert_eq!(list.allocate().unwrap(), 1);
        list.set_revoked(1).unwrap();
        assert_eq!(list.allocate().unwrap(), 2);

        let err = list.allocate().unwrap_err();
        assert_matches!(err.error, Error::Exhausted(3));
        assert_eq!(list.next_index(), 3);
    }

    #[test]
    fn revoking_sets_lsb_first_bits() {
        let mut list = StatusList::new(16);

        assert!(list.set_revoked(0).unwrap());
        assert!(list.set_revoked(9).unwrap());

        assert_eq!(list.lst(), &[0b0000_0001, 0b0000_0010]);
        assert_eq!(list.is_revoked(0), Some(true));
        assert_eq!(list.is_revoked(1), Some(false));
        assert_eq!(list.is_revoked(9), Some(true));
        assert_eq!(list.is_revoked(16), None);
    }

    #[test]
    fn revoking_twice_is_a_no_op() {
        let mut list = StatusList::new(8);
        assert!(list.set_revoked(5).unwrap());
        let updated = list.last_updated();

        assert!(!list.set_revoked(5).unwrap());
        assert_eq!(list.last_updated(), updated);
        assert_eq!(list.is_revoked(5), Some(true));
    }

    #[test]
    fn revoking_out_of_bounds_fails() {
        let mut list = StatusList::new(8);
        let err = list.set_revoked(8).unwrap_err();
        assert_matches!(err.error, Error::IndexOutOfBounds(8, 8));
    }

    #[test]
    fn record_round_trip_keeps_state() {
        let mut list = StatusList::default();
        for _ in 0..20 {
            list.allocate().unwrap();
        }
        list.set_revoked(3).unwrap();
        list.set_revoked(17).unwrap();

        let record = list.to_record("did:key:z6MkIssuer");
        assert_eq!(record.issuer_did, "did:key:z6MkIssuer");
        assert_eq!(record.size, DEFAULT_CAPACITY);
        assert_eq!(record.next_index, 20);

        let restored = StatusList::from_record(&record).unwrap();
        assert_eq!(restored, list);
    }

    #[test]
    fn inconsistent_records_are_rejected() {
        let list = StatusList::new(16);

        let mut record = list.to_record("did:web:example.com");
        record.size = 32;
        let err = StatusList::from_record(&record).unwrap_err();
        assert_matches!(err.error, Error::InconsistentSize);

        let mut record = list.to_record("did:web:example.com");
        record.next_index = 17;
        let err = StatusList::from_record(&record).unwrap_err();
        assert_matches!(err.error, Error::InconsistentSize);

        let mut record = list.to_record("did:web:example.com");
        record.encoded_list = "not base64!".to_owned();
        let err = StatusList::from_record(&record).unwrap_err();
        assert_matches!(err.error, Error::InvalidEncoding);
    }

    #[test]
    fn credential_view_carries_compressed_bits() {
        let mut list = StatusList::new(64);
        list.set_revoked(0).unwrap();
        list.set_revoked(10).unwrap();

        let credential = list
            .to_credential("did:key:z6MkIssuer", "https://issuer.example/status/1")
            .unwrap();
        let bits = decode_compressed_list(&credential.credential_subject.encoded_list).unwrap();

        assert_eq!(bits.len(), 8);
        assert_eq!(bits[0], 0x80);
        assert_eq!(bits[1], 0b0010_0000);
        assert!(bits[2..].iter().all(|b| *b == 0));
        // The persisted record keeps the least significant bit first.
        assert_eq!(&list.lst()[..2], &[0x01, 0b0000_0100]);
        assert_eq!(credential.issuer, "did:key:z6MkIssuer");
    }
}
