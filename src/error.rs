use thiserror::Error;

/// Errors produced by the record layer, tagged per the failure kind so that
/// callers can react appropriately -- except [`RecordError::RecordVerificationFailed`],
/// which is intentionally generic: padding failures and MAC failures must be
/// indistinguishable to avoid a Lucky-13-class oracle.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("unsupported TLS version")]
    UnsupportedVersion,

    #[error("invalid parameter")]
    InvalidParameter,

    #[error("incomplete record")]
    IncompleteRecord,

    #[error("transport closed")]
    TransportClosed,

    #[error("incomplete send: wrote {written} of {requested} bytes")]
    IncompleteSend { written: usize, requested: usize },

    /// AEAD tag invalid, MAC invalid, or padding invalid. Deliberately
    /// carries no further detail.
    #[error("record verification failed")]
    RecordVerificationFailed,

    #[error("replay detected")]
    ReplayDetected,

    #[error("decrypted record has no content")]
    EmptyPlaintext,

    /// Needed so the sequence counter's exhaustion is representable as a
    /// value rather than silently wrapping.
    #[error("sequence number exhausted; connection must be rekeyed or closed")]
    SequenceNumberExhausted,
}

pub type Result<T> = core::result::Result<T, RecordError>;
