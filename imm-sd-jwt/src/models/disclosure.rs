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

use std::fmt;

use bherror::{
    traits::{ErrorContext as _, ForeignError as _},
    Error,
};
use imm_jws::{base64_url_decode, base64_url_encode};
use serde_json::Value;

use crate::{utils::base64_url_digest, Hasher, VerificationError};

/// Number of random bytes in a disclosure salt.
const SALT_LEN: usize = 16;

/// Base64url encoded disclosure salt.
pub type Salt = String;

/// Base64url encoded disclosure digest.
pub type Digest = String;

/// A `[salt, claim name, claim value]` disclosure of an object property,
/// kept together with its serialized form.
///
/// The digest is always computed over the serialized form exactly as it was
/// received or produced, never over a re-serialization.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Disclosure {
    salt: Salt,
    claim_name: String,
    value: Value,
    serialized: String,
}

impl Disclosure {
    /// Builds the disclosure of `claim_name` with the given `salt`.
    pub fn new(salt: Salt, claim_name: String, value: Value) -> Self {
        let array = Value::Array(vec![
            Value::String(salt.clone()),
            Value::String(claim_name.clone()),
            value.clone(),
        ]);
        let serialized = base64_url_encode(array.to_string());

        Self {
            salt,
            claim_name,
            value,
            serialized,
        }
    }

    /// Builds the disclosure of `claim_name` with a fresh random salt.
    pub fn with_random_salt(
        claim_name: String,
        value: Value,
    ) -> Result<Self, openssl::error::ErrorStack> {
        let mut salt = [0u8; SALT_LEN];
        openssl::rand::rand_bytes(&mut salt)?;
        Ok(Self::new(base64_url_encode(salt), claim_name, value))
    }

    /// The salt.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// The disclosed claim name.
    pub fn claim_name(&self) -> &str {
        &self.claim_name
    }

    /// The disclosed claim value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The `base64url` serialized form.
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Consumes the disclosure into its claim name and value.
    pub fn into_claim(self) -> (String, Value) {
        (self.claim_name, self.value)
    }

    /// The digest referencing this disclosure from an `_sd` array.
    pub fn digest(&self, hasher: impl Hasher) -> Digest {
        base64_url_digest(self.serialized.as_bytes(), hasher)
    }
}

impl TryFrom<&str> for Disclosure {
    type Error = Error<VerificationError>;

    fn try_from(serialized: &str) -> Result<Self, Self::Error> {
        let decoded = base64_url_decode(serialized)
            .foreign_err(|| VerificationError::InvalidDisclosure)
            .ctx(|| "disclosure is not base64url")?;
        let array: Vec<Value> = serde_json::from_slice(&decoded)
            .foreign_err(|| VerificationError::InvalidDisclosure)
            .ctx(|| "disclosure is not a JSON array")?;

        let Ok([salt, claim_name, value]) = <[Value; 3]>::try_from(array) else {
            return Err(Error::root(VerificationError::InvalidDisclosure)
                .ctx("disclosure array must have exactly three elements"));
        };
        let (Value::String(salt), Value::String(claim_name)) = (salt, claim_name) else {
            return Err(Error::root(VerificationError::InvalidDisclosure)
                .ctx("salt and claim name must be strings"));
        };

        Ok(Self {
            salt,
            claim_name,
            value,
            serialized: serialized.to_owned(),
        })
    }
}

impl fmt::Display for Disclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.salt, self.claim_name, self.value)
    }
}
