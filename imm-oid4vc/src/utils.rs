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

use bherror::{traits::ForeignError as _, Result};
use chrono::{DateTime, Utc};
use imm_jws::base64_url_encode;

use crate::StoreError;

/// Bytes of entropy in pre-authorized codes and access tokens.
pub(crate) const CODE_BYTES: usize = 24;

/// Bytes of entropy in presentation nonces.
pub(crate) const NONCE_BYTES: usize = 16;

/// A fresh `base64url` string of `len` random bytes.
pub(crate) fn random_code(len: usize) -> Result<String, StoreError> {
    let mut bytes = vec![0u8; len];
    openssl::rand::rand_bytes(&mut bytes).foreign_err(|| StoreError::Randomness)?;
    Ok(base64_url_encode(bytes))
}

/// Whether an entry expiring at `expires_at` is still usable at `now`.
pub(crate) fn is_live(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at > now
}

/// Converts a TTL into whole seconds for wire models.
pub(crate) fn whole_seconds(ttl: chrono::Duration) -> u64 {
    u64::try_from(ttl.num_seconds()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unpadded_base64url() {
        let code = random_code(CODE_BYTES).unwrap();

        assert_eq!(code.len(), 32);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(code, random_code(CODE_BYTES).unwrap());
        assert_eq!(random_code(NONCE_BYTES).unwrap().len(), 22);
    }

    #[test]
    fn expiry_is_exclusive() {
        let now = Utc::now();

        assert!(is_live(now + chrono::Duration::seconds(1), now));
        assert!(!is_live(now, now));
        assert_eq!(whole_seconds(chrono::Duration::minutes(5)), 300);
        assert_eq!(whole_seconds(chrono::Duration::seconds(-3)), 0);
    }
}
