//! AES-CBC primitives and key derivation for individual field values.
//!
//! **Algorithm choice:** AES in CBC mode with PKCS#7 padding and a fresh random
//! 16-byte IV per value. This is what already-stored field values were written
//! with, so it is kept for compatibility. CBC carries no authentication tag;
//! corruption is detected through the padding and UTF-8 checks only.

use std::fmt;
use std::str::FromStr;

use aes::cipher::{
    block_padding::Pkcs7, generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut,
    KeyIvInit,
};
use aes::{Aes128, Aes192, Aes256};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Byte length of the CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The configured cipher identifier is not supported.
    #[error("unsupported cipher: {0}")]
    UnknownCipher(String),

    /// The configured key derivation name is not supported.
    #[error("unsupported key derivation: {0}")]
    UnknownKeyDerivation(String),

    /// Decryption produced invalid padding (wrong key or corrupted data).
    #[error("decryption failed")]
    Decryption,
}

/// Block cipher used for field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum CipherKind {
    Aes128Cbc,
    Aes192Cbc,
    #[default]
    Aes256Cbc,
}

impl CipherKind {
    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            CipherKind::Aes128Cbc => 16,
            CipherKind::Aes192Cbc => 24,
            CipherKind::Aes256Cbc => 32,
        }
    }

    /// Canonical identifier, e.g. `"AES-256-CBC"`.
    pub fn as_str(self) -> &'static str {
        match self {
            CipherKind::Aes128Cbc => "AES-128-CBC",
            CipherKind::Aes192Cbc => "AES-192-CBC",
            CipherKind::Aes256Cbc => "AES-256-CBC",
        }
    }
}

impl FromStr for CipherKind {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AES-128-CBC" => Ok(CipherKind::Aes128Cbc),
            "AES-192-CBC" => Ok(CipherKind::Aes192Cbc),
            "AES-256-CBC" => Ok(CipherKind::Aes256Cbc),
            _ => Err(CipherError::UnknownCipher(s.to_owned())),
        }
    }
}

impl TryFrom<String> for CipherKind {
    type Error = CipherError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the secret is turned into key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum KeyDerivation {
    /// Lowercase hex text of `SHA-256(secret)`, truncated to the key length.
    /// Matches values written by the PHP plugin, whose cipher library took
    /// the 64-character hex digest as key material.
    #[default]
    HexDigest,
    /// Raw `SHA-256(secret)` bytes, truncated to the key length.
    RawDigest,
}

impl FromStr for KeyDerivation {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "hex-digest" | "hex" => Ok(KeyDerivation::HexDigest),
            "raw-digest" | "raw" => Ok(KeyDerivation::RawDigest),
            _ => Err(CipherError::UnknownKeyDerivation(s.to_owned())),
        }
    }
}

impl TryFrom<String> for KeyDerivation {
    type Error = CipherError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Zeroize, ZeroizeOnDrop)]
enum KeyBytes {
    Aes128([u8; 16]),
    Aes192([u8; 24]),
    Aes256([u8; 32]),
}

/// Key bound to its cipher, derived once from the configured secret.
///
/// There is no accessor for the raw bytes. The key is zeroized on drop, as are
/// the intermediate digest and key material used to derive it.
pub struct CipherKey(KeyBytes);

impl CipherKey {
    /// Derive the key for `kind` from `secret`.
    pub fn derive(secret: &str, kind: CipherKind, derivation: KeyDerivation) -> Self {
        let mut digest = Zeroizing::new([0u8; 32]);
        Sha256::new_with_prefix(secret.as_bytes())
            .finalize_into(GenericArray::from_mut_slice(&mut digest[..]));
        let material = Zeroizing::new(match derivation {
            KeyDerivation::HexDigest => hex::encode(&digest[..]).into_bytes(),
            KeyDerivation::RawDigest => digest.to_vec(),
        });

        let key = match kind {
            CipherKind::Aes128Cbc => KeyBytes::Aes128(take(&material)),
            CipherKind::Aes192Cbc => KeyBytes::Aes192(take(&material)),
            CipherKind::Aes256Cbc => KeyBytes::Aes256(take(&material)),
        };
        Self(key)
    }

    /// The cipher this key belongs to.
    pub fn kind(&self) -> CipherKind {
        match self.0 {
            KeyBytes::Aes128(_) => CipherKind::Aes128Cbc,
            KeyBytes::Aes192(_) => CipherKind::Aes192Cbc,
            KeyBytes::Aes256(_) => CipherKind::Aes256Cbc,
        }
    }

    /// Encrypt `plaintext` under `iv`, returning the padded raw ciphertext.
    pub fn encrypt(&self, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
        let iv = GenericArray::from_slice(iv);
        match &self.0 {
            KeyBytes::Aes128(k) => cbc::Encryptor::<Aes128>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyBytes::Aes192(k) => cbc::Encryptor::<Aes192>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
            KeyBytes::Aes256(k) => cbc::Encryptor::<Aes256>::new(GenericArray::from_slice(k), iv)
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        }
    }

    /// Decrypt raw `ciphertext` under `iv` and strip the padding.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] if the padding is invalid, which is
    /// what a wrong key or corrupted ciphertext almost always produces.
    pub fn decrypt(&self, iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let iv = GenericArray::from_slice(iv);
        let result = match &self.0 {
            KeyBytes::Aes128(k) => cbc::Decryptor::<Aes128>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyBytes::Aes192(k) => cbc::Decryptor::<Aes192>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
            KeyBytes::Aes256(k) => cbc::Decryptor::<Aes256>::new(GenericArray::from_slice(k), iv)
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        };
        result.map_err(|_| CipherError::Decryption)
    }
}

fn take<const N: usize>(material: &[u8]) -> [u8; N] {
    let mut key = [0u8; N];
    key.copy_from_slice(&material[..N]);
    key
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        write!(f, "CipherKey({}, [REDACTED])", self.kind())
    }
}
