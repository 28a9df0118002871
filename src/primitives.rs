//! The cryptographic primitives the record layer treats as an external
//! collaborator: it invokes these traits and assumes correct,
//! side-channel-aware implementations, taking raw key/nonce/plaintext/aad
//! slices in and ciphertext (or an opaque verification failure) out. The
//! concrete backends are adapters over the RustCrypto crates rather than
//! reimplementations of AES/ChaCha20/HMAC.

use aead::{Aead, KeyInit, Payload};
use aes::{Aes128, Aes256};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ccm::consts::{U12, U16, U8};
use hmac::{Hmac, Mac as HmacMacTrait};
use sha1::Sha1;
use sha2::{Sha256, Sha384};

use crate::error::{RecordError, Result};

/// AEAD construction used by a cipher suite. Output of `encrypt` is
/// `ciphertext || tag`; `decrypt` expects the same and fails (without
/// revealing why) on an invalid tag.
pub trait AeadAlgorithm: Send + Sync {
    fn key_size(&self) -> usize;
    fn nonce_size(&self) -> usize;
    fn tag_size(&self) -> usize;

    fn encrypt(&self, key: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Vec<u8>;
    fn decrypt(&self, key: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;
}

/// HMAC construction used by a TLS 1.2 CBC cipher suite.
pub trait MacAlgorithm: Send + Sync {
    fn mac_size(&self) -> usize;
    fn compute(&self, key: &[u8], data: &[u8]) -> Vec<u8>;
}

/// Block cipher in CBC mode, operating on already-padded input (the record
/// layer applies its own constant-time-verified PKCS#7 padding, see
/// `padding.rs`, rather than delegating padding to the cipher).
pub trait BlockCipherCbc: Send + Sync {
    fn block_size(&self) -> usize;
    fn encrypt(&self, key: &[u8], iv: &[u8], padded_plaintext: &[u8]) -> Vec<u8>;
    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;
}

macro_rules! aead_impl {
    ($name:ident, $inner:ty, $key_size:expr, $nonce_size:expr, $tag_size:expr) => {
        pub struct $name;

        impl AeadAlgorithm for $name {
            fn key_size(&self) -> usize {
                $key_size
            }
            fn nonce_size(&self) -> usize {
                $nonce_size
            }
            fn tag_size(&self) -> usize {
                $tag_size
            }

            fn encrypt(&self, key: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Vec<u8> {
                let cipher = <$inner>::new_from_slice(key).expect("invalid key length");
                let nonce = aead::generic_array::GenericArray::from_slice(nonce);
                cipher
                    .encrypt(
                        nonce,
                        Payload {
                            msg: plaintext,
                            aad,
                        },
                    )
                    .expect("AEAD encryption cannot fail")
            }

            fn decrypt(
                &self,
                key: &[u8],
                nonce: &[u8],
                ciphertext: &[u8],
                aad: &[u8],
            ) -> Result<Vec<u8>> {
                let cipher = <$inner>::new_from_slice(key).expect("invalid key length");
                let nonce = aead::generic_array::GenericArray::from_slice(nonce);
                cipher
                    .decrypt(
                        nonce,
                        Payload {
                            msg: ciphertext,
                            aad,
                        },
                    )
                    .map_err(|_| RecordError::RecordVerificationFailed)
            }
        }
    };
}

aead_impl!(Aes128GcmAlgorithm, aes_gcm::Aes128Gcm, 16, 12, 16);
aead_impl!(Aes256GcmAlgorithm, aes_gcm::Aes256Gcm, 32, 12, 16);
aead_impl!(
    ChaCha20Poly1305Algorithm,
    chacha20poly1305::ChaCha20Poly1305,
    32,
    12,
    16
);

type Aes128Ccm = ccm::Ccm<Aes128, U16, U12>;
type Aes128Ccm8 = ccm::Ccm<Aes128, U8, U12>;

aead_impl!(Aes128CcmAlgorithm, Aes128Ccm, 16, 12, 16);
aead_impl!(Aes128Ccm8Algorithm, Aes128Ccm8, 16, 12, 8);

/// Looks up the AEAD implementation for a TLS 1.2/1.3 suite name, dispatched
/// by marker substring (GCM, CCM, CCM_8, ChaCha20-Poly1305).
pub fn aead_for_suite(suite_name: &str) -> Result<Box<dyn AeadAlgorithm>> {
    let name = suite_name.to_ascii_uppercase();
    Ok(if name.contains("CHACHA20_POLY1305") {
        Box::new(ChaCha20Poly1305Algorithm)
    } else if name.contains("AES_128_CCM_8") || name.contains("AES_128_CCM8") {
        Box::new(Aes128Ccm8Algorithm)
    } else if name.contains("AES_128_CCM") {
        Box::new(Aes128CcmAlgorithm)
    } else if name.contains("AES_256_GCM") {
        Box::new(Aes256GcmAlgorithm)
    } else if name.contains("AES_128_GCM") {
        Box::new(Aes128GcmAlgorithm)
    } else {
        return Err(RecordError::UnsupportedVersion);
    })
}

macro_rules! hmac_impl {
    ($name:ident, $hash:ty, $size:expr) => {
        pub struct $name;

        impl MacAlgorithm for $name {
            fn mac_size(&self) -> usize {
                $size
            }

            fn compute(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
                let mut mac =
                    Hmac::<$hash>::new_from_slice(key).expect("HMAC accepts any key length");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }
        }
    };
}

hmac_impl!(HmacSha1Algorithm, Sha1, 20);
hmac_impl!(HmacSha256Algorithm, Sha256, 32);
hmac_impl!(HmacSha384Algorithm, Sha384, 48);

/// Derives the MAC algorithm from the suite name:
/// `SHA384 -> HMAC-SHA-384`, `SHA256 -> HMAC-SHA-256`, else `HMAC-SHA-1`.
pub fn mac_for_suite(suite_name: &str) -> Box<dyn MacAlgorithm> {
    let name = suite_name.to_ascii_uppercase();
    if name.contains("SHA384") {
        Box::new(HmacSha384Algorithm)
    } else if name.contains("SHA256") {
        Box::new(HmacSha256Algorithm)
    } else {
        Box::new(HmacSha1Algorithm)
    }
}

macro_rules! cbc_impl {
    ($name:ident, $block:ty, $block_size:expr) => {
        pub struct $name;

        impl BlockCipherCbc for $name {
            fn block_size(&self) -> usize {
                $block_size
            }

            fn encrypt(&self, key: &[u8], iv: &[u8], padded_plaintext: &[u8]) -> Vec<u8> {
                cbc::Encryptor::<$block>::new_from_slices(key, iv)
                    .expect("invalid key/iv length")
                    .encrypt_padded_vec_mut::<NoPadding>(padded_plaintext)
            }

            fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
                cbc::Decryptor::<$block>::new_from_slices(key, iv)
                    .expect("invalid key/iv length")
                    .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
                    .map_err(|_| RecordError::RecordVerificationFailed)
            }
        }
    };
}

cbc_impl!(Aes128CbcAlgorithm, Aes128, 16);
cbc_impl!(Aes256CbcAlgorithm, Aes256, 16);

/// TLS 1.2 CBC suites in this crate are AES-only; legacy 3DES suites are
/// deliberately not supported -- they have not appeared in any modern
/// cipher suite priority list in years.
pub fn block_cipher_for_suite(suite_name: &str) -> Result<Box<dyn BlockCipherCbc>> {
    let name = suite_name.to_ascii_uppercase();
    if name.contains("AES_256_CBC") {
        Ok(Box::new(Aes256CbcAlgorithm))
    } else if name.contains("AES_128_CBC") {
        Ok(Box::new(Aes128CbcAlgorithm))
    } else {
        Err(RecordError::UnsupportedVersion)
    }
}
