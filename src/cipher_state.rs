use bytes::Bytes;

use crate::error::{RecordError, Result};

/// Immutable-after-construction key material plus the one field that must
/// mutate: the monotonically increasing sequence number, owned exclusively
/// by one direction and incremented once per record.
///
/// The sequence counter is kept alongside the rest of the key bundle here
/// (not split out into the orchestrator) because each `CipherState` is
/// already owned exclusively by one direction of one `RecordLayer` -- there
/// is no shared mutable state to protect against, just a single owner
/// incrementing its own counter.
pub struct CipherState {
    pub cipher_suite_name: String,
    pub key: Bytes,
    pub iv: Bytes,
    /// Empty in TLS 1.3, where there is no separate MAC.
    pub mac_key: Bytes,
    pub tls_version: u16,
    sequence_number: u64,
    exhausted: bool,
}

impl CipherState {
    pub fn new(
        cipher_suite_name: impl Into<String>,
        key: Bytes,
        iv: Bytes,
        mac_key: Bytes,
        tls_version: u16,
    ) -> Self {
        Self {
            cipher_suite_name: cipher_suite_name.into(),
            key,
            iv,
            mac_key,
            tls_version,
            sequence_number: 0,
            exhausted: false,
        }
    }

    /// Returns the current sequence number and increments the counter. On
    /// overflow this returns `SequenceNumberExhausted` instead of wrapping
    /// back to 0, which would let a connection silently reuse a nonce.
    /// Once exhausted, every subsequent call keeps failing -- the
    /// connection must be rekeyed or closed.
    pub fn get_and_increment_sequence_number(&mut self) -> Result<u64> {
        if self.exhausted {
            return Err(RecordError::SequenceNumberExhausted);
        }
        let current = self.sequence_number;
        match self.sequence_number.checked_add(1) {
            Some(next) => {
                self.sequence_number = next;
                Ok(current)
            }
            None => {
                self.exhausted = true;
                Err(RecordError::SequenceNumberExhausted)
            }
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn is_aead_suite(&self) -> bool {
        let name = self.cipher_suite_name.to_ascii_uppercase();
        name.contains("GCM") || name.contains("CCM") || name.contains("CHACHA20_POLY1305")
    }

    #[cfg(test)]
    pub(crate) fn set_sequence_number_for_test(&mut self, value: u64) {
        self.sequence_number = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_version::TLS_1_2_VERSION;

    fn state() -> CipherState {
        CipherState::new(
            "TLS_AES_128_GCM_SHA256",
            Bytes::from_static(&[0u8; 16]),
            Bytes::from_static(&[0u8; 12]),
            Bytes::new(),
            TLS_1_2_VERSION,
        )
    }

    #[test]
    fn sequence_numbers_are_strictly_monotonic() {
        let mut s = state();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let seq = s.get_and_increment_sequence_number().unwrap();
            assert!(seen.insert(seq));
        }
    }

    #[test]
    fn overflow_signals_exhaustion_instead_of_wrapping() {
        let mut s = state();
        // Force the counter right up to the wrap boundary without looping
        // a billion times.
        s.set_sequence_number_for_test(u64::MAX);
        assert_eq!(s.get_and_increment_sequence_number().unwrap(), u64::MAX);
        assert!(matches!(
            s.get_and_increment_sequence_number(),
            Err(RecordError::SequenceNumberExhausted)
        ));
        // Stays exhausted rather than resetting to 0.
        assert!(matches!(
            s.get_and_increment_sequence_number(),
            Err(RecordError::SequenceNumberExhausted)
        ));
    }

    #[test]
    fn suite_name_selects_aead_path() {
        assert!(state().is_aead_suite());
        let cbc = CipherState::new(
            "TLS_RSA_WITH_AES_128_CBC_SHA",
            Bytes::from_static(&[0u8; 16]),
            Bytes::from_static(&[0u8; 16]),
            Bytes::from_static(&[0u8; 20]),
            TLS_1_2_VERSION,
        );
        assert!(!cbc.is_aead_suite());
    }
}
