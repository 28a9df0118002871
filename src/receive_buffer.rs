use bytes::BytesMut;

use crate::error::{RecordError, Result};
use crate::record::{Record, MAX_CIPHERTEXT_FRAGMENT_LENGTH};
use crate::transport::Transport;

/// Caps the buffer at twice the largest legal ciphertext record plus header
/// slack. Any well-behaved peer keeps the buffer far below this; a peer
/// that doesn't is mounting a memory exhaustion attempt and gets a decode
/// error instead of unbounded growth.
const MAX_BUFFER_LEN: usize = 2 * (MAX_CIPHERTEXT_FRAGMENT_LENGTH + 64);

/// Receive-side reassembly buffer. Owned exclusively by the read direction
/// of a `RecordLayer`. Tolerates partial reads and coalesced records:
/// `try_parse_from_buffer` never blocks, while `fill_until_record` loops --
/// pull a record out if one is already buffered, otherwise read more from
/// the transport and retry.
#[derive(Default)]
pub struct ReceiveBuffer {
    buf: BytesMut,
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to parse one record from the front of the buffer without
    /// touching the transport. On a decode failure the buffer is cleared
    /// (DoS mitigation against a peer that sends an unparseable length
    /// field) and the error is propagated; on "not enough bytes yet" this
    /// returns `Ok(None)` and leaves the buffer untouched.
    pub fn try_parse_from_buffer(&mut self) -> Result<Option<Record>> {
        match Record::try_decode(&self.buf) {
            Ok(Some((record, consumed))) => {
                let _ = self.buf.split_to(consumed);
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.buf.clear();
                Err(e)
            }
        }
    }

    /// Drains the transport until a complete record can be parsed.
    pub fn fill_until_record(&mut self, transport: &mut dyn Transport) -> Result<Record> {
        loop {
            if let Some(record) = self.try_parse_from_buffer()? {
                return Ok(record);
            }

            if self.buf.len() >= MAX_BUFFER_LEN {
                self.buf.clear();
                return Err(RecordError::IncompleteRecord);
            }

            let chunk = transport.receive(MAX_CIPHERTEXT_FRAGMENT_LENGTH)?;
            if chunk.is_empty() {
                return Err(RecordError::TransportClosed);
            }
            self.buf.extend_from_slice(&chunk);
        }
    }
}
