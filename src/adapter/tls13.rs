use crate::cipher_state::CipherState;
use crate::content_type::ContentType;
use crate::error::{RecordError, Result};
use crate::nonce::derive_aead_nonce;
use crate::primitives::aead_for_suite;
use crate::protocol_version::TLS_1_3_WIRE_VERSION;

use super::VersionAdapter;

/// TLS 1.3 record adapter: AEAD-only, with the true content type carried
/// inside the encrypted fragment rather than the header. The content type
/// byte is appended before sealing and recovered by scanning back over any
/// trailing zero padding bytes after opening.
pub struct Tls13RecordAdapter;

impl Tls13RecordAdapter {
    pub fn new() -> Self {
        Self
    }

    /// AAD is the record's own (already on-the-wire) header: the outer
    /// content type (always `ApplicationData`), the pinned wire version
    /// `0x0303`, and the length of the sealed fragment (plaintext + inner
    /// content type byte + tag).
    fn additional_data(sealed_len: u16) -> Vec<u8> {
        let mut aad = Vec::with_capacity(5);
        aad.push(ContentType::ApplicationData.to_u8());
        aad.extend_from_slice(&TLS_1_3_WIRE_VERSION.to_be_bytes());
        aad.extend_from_slice(&sealed_len.to_be_bytes());
        aad
    }
}

impl Default for Tls13RecordAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionAdapter for Tls13RecordAdapter {
    fn apply_encryption(
        &self,
        plaintext: &[u8],
        state: &mut CipherState,
        content_type: ContentType,
    ) -> Result<(ContentType, Vec<u8>)> {
        if plaintext.is_empty() {
            return Err(RecordError::EmptyPlaintext);
        }

        let seq = state.get_and_increment_sequence_number()?;
        let aead = aead_for_suite(&state.cipher_suite_name)?;
        let nonce = derive_aead_nonce(&state.iv, seq);

        let mut inner = Vec::with_capacity(plaintext.len() + 1);
        inner.extend_from_slice(plaintext);
        inner.push(content_type.to_u8());

        let sealed_len = (inner.len() + aead.tag_size()) as u16;
        let aad = Self::additional_data(sealed_len);

        let ciphertext = aead.encrypt(&state.key, &nonce, &inner, &aad);

        // Outer content type and version are pinned regardless of the true
        // (inner) content type, for middlebox compatibility.
        Ok((ContentType::ApplicationData, ciphertext))
    }

    fn apply_decryption(
        &self,
        ciphertext: &[u8],
        _outer_content_type: ContentType,
        _outer_version: u16,
        state: &mut CipherState,
    ) -> Result<(Vec<u8>, ContentType)> {
        let seq = state.get_and_increment_sequence_number()?;
        let aead = aead_for_suite(&state.cipher_suite_name)?;
        let nonce = derive_aead_nonce(&state.iv, seq);
        let aad = Self::additional_data(ciphertext.len() as u16);

        let inner = aead.decrypt(&state.key, &nonce, ciphertext, &aad)?;

        // Recover the true content type: scan back from the end over any
        // trailing zero padding bytes to the first nonzero byte, which is
        // the inner content type. An all-zero inner plaintext (no content
        // type byte present) is malformed.
        let mut idx = inner.len();
        while idx > 0 && inner[idx - 1] == 0 {
            idx -= 1;
        }
        if idx == 0 {
            return Err(RecordError::EmptyPlaintext);
        }

        let content_type = ContentType::from_u8(inner[idx - 1])
            .ok_or(RecordError::RecordVerificationFailed)?;
        let plaintext = inner[..idx - 1].to_vec();

        Ok((plaintext, content_type))
    }
}
