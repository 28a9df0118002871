/// Derives a per-record AEAD nonce: the write/read IV XORed with the
/// 64-bit big-endian sequence number, zero-extended at the *high* end to
/// the IV's length.
///
/// Both RFC 5246 §6.2.3.3 (TLS 1.2 AEAD) and RFC 8446 §5.3 (TLS 1.3) define
/// this as touching only the low-order bytes of the IV, leaving the
/// high-order bytes (here, the first `iv.len() - 8` bytes) untouched -- not
/// a cyclic XOR of the sequence number across the whole IV.
pub fn derive_aead_nonce(iv: &[u8], sequence_number: u64) -> Vec<u8> {
    let mut nonce = iv.to_vec();
    let seq_bytes = sequence_number.to_be_bytes();
    assert!(
        nonce.len() >= seq_bytes.len(),
        "IV shorter than the sequence number"
    );
    let offset = nonce.len() - seq_bytes.len();
    for (i, b) in seq_bytes.iter().enumerate() {
        nonce[offset + i] ^= b;
    }
    nonce
}
