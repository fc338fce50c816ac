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

/// Error type defining possible Status List related errors.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum Error {
    /// Error when compressing Status List.
    #[strum(to_string = "Status List compression error")]
    Compression,

    /// Error when decompressing Status List.
    #[strum(to_string = "Status List decompression error")]
    Decompression,

    /// Error when the encoded list is not valid `base64`.
    #[strum(to_string = "Status List is not valid base64")]
    InvalidEncoding,

    /// Error when the stored size or next index does not fit the actual list.
    #[strum(to_string = "Status List size is inconsistent with the actual list")]
    InconsistentSize,

    /// Error when the Status List index is out of bounds.
    #[strum(to_string = "index={1} is out of bounds (size={0})")]
    IndexOutOfBounds(usize, usize),

    /// Error when every index of the list has already been handed out.
    #[strum(to_string = "Status List is full (size={0})")]
    Exhausted(usize),
}

impl bherror::BhError for Error {}

/// Result type alias for the crate.
pub type Result<T> = bherror::Result<T, Error>;
