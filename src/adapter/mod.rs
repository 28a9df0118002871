//! `VersionAdapter`: the per-version framing/encryption contract, with a
//! TLS 1.2 and a TLS 1.3 implementation. Dispatch between them is a sealed
//! two-case enum resolved once at construction time -- this also owns wire
//! encode/decode, not just encrypt/decrypt, since `RecordLayer` is a
//! standalone orchestrator rather than a shared-state machine relying on
//! the handshake to have already fixed every detail.

mod tls12;
mod tls13;

pub use tls12::Tls12RecordAdapter;
pub use tls13::Tls13RecordAdapter;

use crate::cipher_state::CipherState;
use crate::content_type::ContentType;
use crate::error::Result;
use crate::record::Record;

/// Common contract implemented by both the TLS 1.2 and TLS 1.3 adapters.
pub trait VersionAdapter {
    /// Emits the wire bytes for `record` (forcing the outer version to
    /// `0x0303` for TLS 1.3).
    fn encode_record(&self, record: &Record) -> Vec<u8> {
        record.encode()
    }

    /// Parses one record (or reports "need more bytes" as `Ok(None)`, or a
    /// malformed header as an error) from the front of `buf`.
    fn decode_record(&self, buf: &[u8]) -> Result<Option<(Record, usize)>> {
        Record::try_decode(buf)
    }

    /// Encrypts `plaintext` under `state`, returning the outer content type
    /// to stamp on the wire record (TLS 1.3 always returns
    /// `ApplicationData`; TLS 1.2 returns `content_type` unchanged) and the
    /// ciphertext fragment.
    fn apply_encryption(
        &self,
        plaintext: &[u8],
        state: &mut CipherState,
        content_type: ContentType,
    ) -> Result<(ContentType, Vec<u8>)>;

    /// Decrypts `ciphertext` (the fragment of a record whose outer content
    /// type was `outer_content_type` and outer version `outer_version`),
    /// returning the recovered plaintext and its true content type (the
    /// inner type for TLS 1.3; the outer type, unchanged, for TLS 1.2).
    fn apply_decryption(
        &self,
        ciphertext: &[u8],
        outer_content_type: ContentType,
        outer_version: u16,
        state: &mut CipherState,
    ) -> Result<(Vec<u8>, ContentType)>;
}

/// Sealed dispatch between the two supported wire protocols. Built once by
/// `RecordFactory`/`RecordLayerFactory` and never re-selected afterwards.
pub enum VersionAdapterImpl {
    Tls12(Tls12RecordAdapter),
    Tls13(Tls13RecordAdapter),
}

impl VersionAdapter for VersionAdapterImpl {
    fn encode_record(&self, record: &Record) -> Vec<u8> {
        match self {
            VersionAdapterImpl::Tls12(a) => a.encode_record(record),
            VersionAdapterImpl::Tls13(a) => a.encode_record(record),
        }
    }

    fn decode_record(&self, buf: &[u8]) -> Result<Option<(Record, usize)>> {
        match self {
            VersionAdapterImpl::Tls12(a) => a.decode_record(buf),
            VersionAdapterImpl::Tls13(a) => a.decode_record(buf),
        }
    }

    fn apply_encryption(
        &self,
        plaintext: &[u8],
        state: &mut CipherState,
        content_type: ContentType,
    ) -> Result<(ContentType, Vec<u8>)> {
        match self {
            VersionAdapterImpl::Tls12(a) => a.apply_encryption(plaintext, state, content_type),
            VersionAdapterImpl::Tls13(a) => a.apply_encryption(plaintext, state, content_type),
        }
    }

    fn apply_decryption(
        &self,
        ciphertext: &[u8],
        outer_content_type: ContentType,
        outer_version: u16,
        state: &mut CipherState,
    ) -> Result<(Vec<u8>, ContentType)> {
        match self {
            VersionAdapterImpl::Tls12(a) => {
                a.apply_decryption(ciphertext, outer_content_type, outer_version, state)
            }
            VersionAdapterImpl::Tls13(a) => {
                a.apply_decryption(ciphertext, outer_content_type, outer_version, state)
            }
        }
    }
}
