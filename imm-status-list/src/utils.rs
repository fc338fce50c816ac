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

use std::io::{Read as _, Write as _};

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use bherror::traits::ForeignError as _;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::{Error, Result};

/// Multibase prefix of `base64url` without padding.
const MULTIBASE_BASE64URL_PREFIX: char = 'u';

/// Compresses the given `payload` with GZIP, `base64url`-encodes the result
/// and adds the multibase `u` prefix, as the [`encodedList`][1] of a Bitstring
/// Status List requires.
///
/// [1]: https://www.w3.org/TR/vc-bitstring-status-list/#bitstringstatuslist
pub(crate) fn compress_and_encode(payload: impl AsRef<[u8]>) -> Result<String> {
    let compressed = compress_gzip(payload).foreign_err(|| Error::Compression)?;
    Ok(format!(
        "{MULTIBASE_BASE64URL_PREFIX}{}",
        URL_SAFE_NO_PAD.encode(compressed)
    ))
}

/// Reverses [`compress_and_encode`], so that relying parties holding only the
/// public credential can read the raw bitstring.
pub fn decode_compressed_list(encoded: &str) -> Result<Vec<u8>> {
    let Some(encoded) = encoded.strip_prefix(MULTIBASE_BASE64URL_PREFIX) else {
        return Err(bherror::Error::root(Error::InvalidEncoding).ctx("missing multibase `u` prefix"));
    };
    let decoded = URL_SAFE_NO_PAD
        .decode(encoded)
        .foreign_err(|| Error::InvalidEncoding)?;
    decompress_gzip(decoded).foreign_err(|| Error::Decompression)
}

/// Standard `base64` with padding, used for the persisted record.
pub(crate) fn base64_encode(payload: impl AsRef<[u8]>) -> String {
    STANDARD.encode(payload)
}

pub(crate) fn base64_decode(payload: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    STANDARD
        .decode(payload)
        .foreign_err(|| Error::InvalidEncoding)
}

fn compress_gzip(payload: impl AsRef<[u8]>) -> std::io::Result<Vec<u8>> {
    let mut e = GzEncoder::new(Vec::new(), Compression::best());
    e.write_all(payload.as_ref())?;
    e.finish()
}

fn decompress_gzip(payload: impl AsRef<[u8]>) -> std::io::Result<Vec<u8>> {
    let mut d = GzDecoder::new(payload.as_ref());
    let mut decompressed = Vec::new();
    d.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Returns the index of the `byte` holding the bit at `idx`, and the position
/// of that bit within the `byte`, counting from the least significant bit.
pub(crate) fn byte_and_inner_idx(idx: usize) -> (usize, u8) {
    (idx / 8, (idx % 8) as u8)
}

/// Re-packs a least significant bit first list so that index `0` is the
/// left-most bit of the first byte, as the W3C Bitstring Status List orders
/// its entries.
pub(crate) fn msb_first(lst: &[u8]) -> Vec<u8> {
    lst.iter().map(|byte| byte.reverse_bits()).collect()
}

/// Number of bytes needed to hold `capacity` bits.
pub(crate) fn bytes_for(capacity: usize) -> usize {
    capacity.div_ceil(8)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn compressed_list_round_trip() {
        let payload = vec![0u8; 2048];
        let encoded = compress_and_encode(&payload).unwrap();

        assert!(encoded.starts_with('u'));
        // An empty 16k list compresses to a few dozen bytes.
        assert!(encoded.len() < 100);
        assert_eq!(decode_compressed_list(&encoded).unwrap(), payload);
    }

    #[test]
    fn compressed_list_requires_prefix() {
        let encoded = compress_and_encode([1u8, 2, 3]).unwrap();
        let err = decode_compressed_list(&encoded[1..]).unwrap_err();
        assert_matches!(err.error, Error::InvalidEncoding);

        let err = decode_compressed_list("uAAAA").unwrap_err();
        assert_matches!(err.error, Error::Decompression);
    }

    #[test]
    fn bit_positions() {
        assert_eq!(byte_and_inner_idx(0), (0, 0));
        assert_eq!(byte_and_inner_idx(7), (0, 7));
        assert_eq!(byte_and_inner_idx(8), (1, 0));
        assert_eq!(byte_and_inner_idx(16383), (2047, 7));
        assert_eq!(bytes_for(16384), 2048);
        assert_eq!(bytes_for(9), 2);
    }

    #[test]
    fn msb_first_mirrors_each_byte() {
        assert_eq!(msb_first(&[0b0000_0001, 0b0000_0110]), [0b1000_0000, 0b0110_0000]);
        assert_eq!(msb_first(&[]), Vec::<u8>::new());
    }

    #[test]
    fn standard_base64_keeps_padding() {
        assert_eq!(base64_encode([0xffu8]), "/w==");
        assert_eq!(base64_decode("/w==").unwrap(), vec![0xff]);
        assert_matches!(base64_decode("-_8").unwrap_err().error, Error::InvalidEncoding);
    }
}
