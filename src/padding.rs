use subtle::{Choice, ConditionallySelectable};

use crate::protocol_version::{TLS_1_0_VERSION, TLS_1_3_VERSION};

/// What a suite/version pair needs done to its plaintext before encryption
/// to defend against the BEAST/Lucky-13 family of attacks, per RFC 5246
/// §6.2.3.2 and RFC 8446 §5.2's guidance on CBC padding-oracle mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionStrategy {
    /// AEAD suites and all of TLS 1.3: no block-cipher padding exists.
    None,
    /// TLS 1.0 CBC: BEAST mitigation via 1/n-1 record splitting.
    SplitRecords,
    /// TLS 1.1/1.2 CBC: padding oracle is mitigated by verifying in
    /// constant time instead, since the explicit per-record IV already
    /// defeats BEAST.
    ConstantTimePadding,
}

pub fn select_protection_strategy(tls_version: u16, is_aead_suite: bool) -> ProtectionStrategy {
    if tls_version == TLS_1_3_VERSION || is_aead_suite {
        return ProtectionStrategy::None;
    }
    if tls_version == TLS_1_0_VERSION {
        return ProtectionStrategy::SplitRecords;
    }
    ProtectionStrategy::ConstantTimePadding
}

/// Appends `p = block_size - (len(data) mod block_size)` bytes of value
/// `p` (`1 <= p <= block_size`), so the result is always strictly longer
/// than `data` even when `data` is already block-aligned.
pub fn apply_pkcs7_padding(data: &[u8], block_size: usize) -> Vec<u8> {
    assert!(block_size > 0 && block_size <= 255);
    let pad_len = block_size - (data.len() % block_size);
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

/// Verifies PKCS#7 padding on the last `block_size` bytes of `data` in time
/// independent of the padding's validity or the padding length. Always
/// runs exactly `block_size` comparison steps. Returns
/// `(false, 0)` (rather than an early-exit error) on structurally invalid
/// input (`len == 0` or `len % block_size != 0`), so the caller still sees
/// a fixed-shape result instead of a distinguishable error path.
pub fn verify_pkcs7_padding_constant_time(data: &[u8], block_size: usize) -> (bool, u8) {
    if data.is_empty() || data.len() % block_size != 0 {
        return (false, 0);
    }

    let len = data.len();
    let pad_value = data[len - 1];

    let mut valid = Choice::from(if (pad_value as usize) >= 1 && (pad_value as usize) <= block_size {
        1
    } else {
        0
    });

    for i in 0..block_size {
        let is_pad_position = Choice::from((i < pad_value as usize) as u8);
        let byte_at = data[len - 1 - i];
        let is_correct_value = Choice::from((byte_at == pad_value) as u8);

        // is_pad_position => is_correct_value, i.e. !is_pad_position | is_correct_value
        let implication = !is_pad_position | is_correct_value;
        valid &= implication;
    }

    let pad_len = u8::conditional_select(&0, &pad_value, valid);
    (valid.into(), pad_len)
}

/// BEAST mitigation for TLS 1.0 CBC: split `plaintext` into its first byte
/// and the remainder, so that each is encrypted as its own record and the
/// attacker never again controls a whole cipher block boundary. Inputs
/// shorter than two bytes are returned unchanged (nothing to split).
pub fn apply_split_record_mitigation(plaintext: &[u8]) -> Vec<Vec<u8>> {
    if plaintext.len() < 2 {
        return vec![plaintext.to_vec()];
    }
    vec![plaintext[..1].to_vec(), plaintext[1..].to_vec()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs7_round_trips_for_all_block_sizes_up_to_16() {
        for block_size in 1..=16usize {
            let data = b"some test data!!";
            let padded = apply_pkcs7_padding(data, block_size);
            assert_eq!(padded.len() % block_size, 0);
            assert!(padded.len() > data.len());

            let (valid, pad_len) = verify_pkcs7_padding_constant_time(&padded, block_size);
            assert!(valid);
            assert_eq!(&padded[..padded.len() - pad_len as usize], &data[..]);
        }
    }

    #[test]
    fn pkcs7_removes_exactly_the_padding_that_was_applied() {
        let data = b"hello";
        let padded = apply_pkcs7_padding(data, 16);
        let (valid, pad_len) = verify_pkcs7_padding_constant_time(&padded, 16);
        assert!(valid);
        let unpadded = &padded[..padded.len() - pad_len as usize];
        assert_eq!(unpadded, data);
    }

    #[test]
    fn tampered_last_byte_is_rejected() {
        let data = b"hello world";
        let mut padded = apply_pkcs7_padding(data, 16);
        let last = padded.len() - 1;
        padded[last] ^= 0xFF;
        let (valid, _) = verify_pkcs7_padding_constant_time(&padded, 16);
        assert!(!valid);
    }

    #[test]
    fn empty_input_is_rejected() {
        let (valid, _) = verify_pkcs7_padding_constant_time(&[], 16);
        assert!(!valid);
    }

    #[test]
    fn misaligned_length_is_rejected() {
        let (valid, _) = verify_pkcs7_padding_constant_time(&[1, 2, 3], 16);
        assert!(!valid);
    }

    #[test]
    fn strategy_selection_matches_spec_table() {
        assert_eq!(
            select_protection_strategy(TLS_1_3_VERSION, false),
            ProtectionStrategy::None
        );
        assert_eq!(
            select_protection_strategy(crate::protocol_version::TLS_1_2_VERSION, true),
            ProtectionStrategy::None
        );
        assert_eq!(
            select_protection_strategy(TLS_1_0_VERSION, false),
            ProtectionStrategy::SplitRecords
        );
        assert_eq!(
            select_protection_strategy(crate::protocol_version::TLS_1_1_VERSION, false),
            ProtectionStrategy::ConstantTimePadding
        );
        assert_eq!(
            select_protection_strategy(crate::protocol_version::TLS_1_2_VERSION, false),
            ProtectionStrategy::ConstantTimePadding
        );
    }

    #[test]
    fn split_record_mitigation_splits_first_byte() {
        let parts = apply_split_record_mitigation(b"abcdef");
        assert_eq!(parts, vec![b"a".to_vec(), b"bcdef".to_vec()]);
    }

    #[test]
    fn short_input_is_not_split() {
        assert_eq!(apply_split_record_mitigation(b"a"), vec![b"a".to_vec()]);
        assert_eq!(apply_split_record_mitigation(b""), vec![b"".to_vec()]);
    }
}
