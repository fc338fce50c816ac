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

use std::{
    fmt::{self, Display},
    sync::{Mutex, MutexGuard, PoisonError},
};

use imm_jws::base64_url_encode;
use serde_json::Value;

use crate::{Hasher, JsonObject};

/// Claim names that SD-JWT reserves for its own hash pointers.
pub(crate) const RESERVED_CLAIM_NAMES: [&str; 2] = [SD_FIELD_NAME, "..."];

/// The field holding the disclosure digests.
pub(crate) const SD_FIELD_NAME: &str = "_sd";

/// A list of claim names, displayed comma separated.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ClaimNames(pub Vec<String>);

impl Display for ClaimNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Returns the `base64url`-encoded digest of `input`.
pub fn base64_url_digest(input: &[u8], hasher: impl Hasher) -> String {
    base64_url_encode(hasher.digest(input))
}

/// Returns the first reserved claim name used anywhere inside `object`,
/// nested objects and arrays included.
pub(crate) fn find_reserved_claim_name(object: &JsonObject) -> Option<&'static str> {
    object.iter().find_map(|(name, value)| {
        RESERVED_CLAIM_NAMES
            .iter()
            .find(|reserved| name.as_str() == **reserved)
            .copied()
            .or_else(|| find_reserved_in_value(value))
    })
}

fn find_reserved_in_value(value: &Value) -> Option<&'static str> {
    match value {
        Value::Object(object) => find_reserved_claim_name(object),
        Value::Array(array) => array.iter().find_map(find_reserved_in_value),
        _ => None,
    }
}

/// Locks the `mutex`, recovering the data if a previous holder panicked.
///
/// The in-memory stores only perform single-step updates under the lock, so
/// the data is consistent even after a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
