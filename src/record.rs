use arrayref::array_ref;
use bytes::Bytes;
use byteorder::{BigEndian, ByteOrder};

use crate::content_type::ContentType;
use crate::error::{RecordError, Result};

/// Plaintext fragments larger than this are rejected by the fragmenter; see
/// `RecordLayer::set_max_fragment_length`.
pub const MAX_PLAINTEXT_FRAGMENT_LENGTH: usize = 1 << 14;

/// Largest fragment length that may legally appear in a record header,
/// accounting for AEAD/CBC expansion (tag, padding, explicit IV, the TLS 1.3
/// inner content-type byte).
pub const MAX_CIPHERTEXT_FRAGMENT_LENGTH: usize = (1 << 14) + 256;

const HEADER_LEN: usize = 5;

/// Outermost data type transmitted on the wire: `(content_type, version,
/// fragment)`. The fragment is carried as `Bytes` and decoded synchronously
/// from an in-memory buffer rather than read incrementally off an async
/// stream, since the record layer's own transport contract is blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub content_type: ContentType,
    pub version: u16,
    pub fragment: Bytes,
}

impl Record {
    pub fn new(content_type: ContentType, version: u16, fragment: Bytes) -> Self {
        Self {
            content_type,
            version,
            fragment,
        }
    }

    /// Emits `content_type || version_major || version_minor ||
    /// length(be16) || fragment`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.fragment.len());
        self.encode_into(&mut out);
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.content_type.to_u8());
        out.extend_from_slice(&self.version.to_be_bytes());
        // The caller is responsible for keeping fragments within
        // MAX_CIPHERTEXT_FRAGMENT_LENGTH; this is a last-resort guard
        // against a silently truncated length field.
        debug_assert!(self.fragment.len() <= u16::MAX as usize);
        let mut length_be = [0u8; 2];
        BigEndian::write_u16(&mut length_be, self.fragment.len() as u16);
        out.extend_from_slice(&length_be);
        out.extend_from_slice(&self.fragment);
    }

    /// Requires `>= 5` bytes for the header, then requires `5 + length`
    /// bytes total. Returns `Ok(None)` (not an error) when the buffer holds
    /// a valid but incomplete prefix, so that callers can distinguish "need
    /// more bytes" from "malformed input" -- the latter is the only case
    /// that should clear the receive buffer (see `ReceiveBuffer`).
    pub fn try_decode(buf: &[u8]) -> Result<Option<(Record, usize)>> {
        if buf.len() < HEADER_LEN {
            return Ok(None);
        }

        let header = array_ref![buf, 0, HEADER_LEN];
        let content_type = ContentType::from_u8(header[0]).ok_or(RecordError::IncompleteRecord)?;
        let version = BigEndian::read_u16(array_ref![header, 1, 2]);
        let length = BigEndian::read_u16(array_ref![header, 3, 2]) as usize;

        if length > MAX_CIPHERTEXT_FRAGMENT_LENGTH {
            return Err(RecordError::IncompleteRecord);
        }

        let total_len = HEADER_LEN + length;
        if buf.len() < total_len {
            return Ok(None);
        }

        let fragment = Bytes::copy_from_slice(&buf[HEADER_LEN..total_len]);
        Ok(Some((
            Record {
                content_type,
                version,
                fragment,
            },
            total_len,
        )))
    }
}
