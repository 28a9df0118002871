use crate::error::Result;

/// The only collaborator the record layer depends on outside of itself: a
/// reliable, full-duplex byte-stream transport (normally a TCP socket).
/// Generalized from `common::io::{Readable, Writeable}`'s async traits to
/// an explicit synchronous, blocking-call contract (`send` / `receive` /
/// `has_data_available` / `close`), since the record layer itself runs
/// single-threaded per connection with no async suspension points of its
/// own.
pub trait Transport {
    /// Writes `data` and returns the number of bytes actually written.
    /// Partial writes are the caller's responsibility to detect -- the
    /// record layer turns a short write into `RecordError::IncompleteSend`.
    fn send(&mut self, data: &[u8]) -> Result<u32>;

    /// Reads up to `max` bytes. An empty result means the peer closed the
    /// connection or a configured timeout elapsed.
    fn receive(&mut self, max: usize) -> Result<Vec<u8>>;

    /// True if at least one byte can be read within `timeout_ms`.
    fn has_data_available(&mut self, timeout_ms: u64) -> bool;

    /// Idempotent teardown.
    fn close(&mut self);
}

/// An in-memory `Transport` fake for this crate's own tests: a
/// dependency-injected fake constructed directly from pre-supplied bytes,
/// with no reflection into a real socket's private fields involved.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    /// Queued reads, each returned whole (up to `max`) by one call to
    /// `receive`. Modeling reads as discrete chunks (rather than one flat
    /// byte stream) is what lets a test express "the transport delivers
    /// these bytes, then later these bytes" for split-delivery reassembly.
    reads: std::collections::VecDeque<Vec<u8>>,
    /// Bytes written by `send`, in order.
    pub outbound: Vec<u8>,
    closed: bool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for tests that don't care about read boundaries: the
    /// whole buffer is delivered as a single queued read.
    pub fn with_inbound(data: &[u8]) -> Self {
        let mut t = Self::new();
        t.queue_read(data);
        t
    }

    pub fn queue_read(&mut self, data: &[u8]) {
        self.reads.push_back(data.to_vec());
    }
}

impl Transport for InMemoryTransport {
    fn send(&mut self, data: &[u8]) -> Result<u32> {
        self.outbound.extend_from_slice(data);
        Ok(data.len() as u32)
    }

    fn receive(&mut self, max: usize) -> Result<Vec<u8>> {
        let Some(mut chunk) = self.reads.pop_front() else {
            return Ok(Vec::new());
        };
        if chunk.len() > max {
            let remainder = chunk.split_off(max);
            self.reads.push_front(remainder);
        }
        Ok(chunk)
    }

    fn has_data_available(&mut self, _timeout_ms: u64) -> bool {
        !self.reads.is_empty()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
