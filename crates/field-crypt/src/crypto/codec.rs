//! Tagged blob encoding of field values.
//!
//! ```text
//! <prefix><base64(iv[16] || base64(ciphertext))>
//! ```
//!
//! The inner ciphertext segment is base64 text rather than raw bytes; values
//! written by the PHP plugin carry it that way and must stay readable.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

use common::TransformError;

use super::cipher::{CipherKey, CipherKind, KeyDerivation, BLOCK_LEN, IV_LEN};

/// Blob prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "_acf_efo_";

/// Errors produced while decoding a tagged value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The value does not start with the blob prefix.
    #[error("value is not a tagged blob")]
    MissingPrefix,

    /// The payload after the prefix is not valid base64.
    #[error("blob payload is not valid base64")]
    InvalidBase64,

    /// The decoded payload has no room for a ciphertext after the IV.
    #[error("blob truncated: {0} bytes after decoding, need more than {IV_LEN}")]
    Truncated(usize),

    /// The ciphertext segment is not base64 or not whole cipher blocks.
    #[error("blob ciphertext segment is malformed")]
    InvalidCiphertext,

    /// The cipher rejected the ciphertext (wrong key or corrupted data).
    #[error("blob could not be decrypted")]
    Decryption,

    /// Decryption succeeded but did not yield UTF-8 text.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

impl From<DecodeError> for TransformError {
    fn from(e: DecodeError) -> Self {
        TransformError::Decode(e.to_string())
    }
}

/// A parsed, encrypted field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// Raw IV bytes.
    pub iv: [u8; IV_LEN],
    /// Raw (padded) ciphertext bytes.
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Encode this blob to its stored string form under `prefix`.
    pub fn to_string_repr(&self, prefix: &str) -> String {
        let armored = STANDARD.encode(&self.ciphertext);
        let mut payload = Vec::with_capacity(IV_LEN + armored.len());
        payload.extend_from_slice(&self.iv);
        payload.extend_from_slice(armored.as_bytes());
        format!("{prefix}{}", STANDARD.encode(payload))
    }

    /// Parse a stored string back into an [`EncryptedBlob`].
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] describing the first structural problem found.
    pub fn parse(value: &str, prefix: &str) -> Result<Self, DecodeError> {
        let encoded = value
            .strip_prefix(prefix)
            .ok_or(DecodeError::MissingPrefix)?;
        let payload = STANDARD
            .decode(encoded)
            .map_err(|_| DecodeError::InvalidBase64)?;
        if payload.len() <= IV_LEN {
            return Err(DecodeError::Truncated(payload.len()));
        }

        let (iv_bytes, armored) = payload.split_at(IV_LEN);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);

        let ciphertext = STANDARD
            .decode(armored)
            .map_err(|_| DecodeError::InvalidCiphertext)?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(DecodeError::InvalidCiphertext);
        }

        Ok(Self { iv, ciphertext })
    }
}

/// Encodes plaintext into tagged blobs and back with one fixed key.
#[derive(Debug)]
pub struct FieldCodec {
    key: CipherKey,
    prefix: String,
}

impl FieldCodec {
    /// Build a codec, deriving the key from `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Configuration`] if `secret` is blank or
    /// `prefix` is empty.
    pub fn new(
        secret: &str,
        cipher: CipherKind,
        derivation: KeyDerivation,
        prefix: &str,
    ) -> Result<Self, TransformError> {
        if secret.trim().is_empty() {
            return Err(TransformError::Configuration(
                "secret key must not be blank".into(),
            ));
        }
        if prefix.is_empty() {
            return Err(TransformError::Configuration(
                "blob prefix must not be empty".into(),
            ));
        }
        Ok(Self {
            key: CipherKey::derive(secret, cipher, derivation),
            prefix: prefix.to_owned(),
        })
    }

    /// The tag every encoded value starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The cipher values are encrypted with.
    pub fn cipher(&self) -> CipherKind {
        self.key.kind()
    }

    /// Returns `true` if `value` carries the blob tag.
    pub fn is_encoded(&self, value: &str) -> bool {
        value.starts_with(&self.prefix)
    }

    /// Encrypt `plaintext` under a fresh random IV.
    ///
    /// Two calls with the same input never return the same blob.
    pub fn encode(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.encode_with_iv(plaintext, iv)
    }

    fn encode_with_iv(&self, plaintext: &str, iv: [u8; IV_LEN]) -> String {
        EncryptedBlob {
            iv,
            ciphertext: self.key.encrypt(&iv, plaintext.as_bytes()),
        }
        .to_string_repr(&self.prefix)
    }

    /// Decrypt a tagged blob; untagged values are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if a tagged value is malformed or does not
    /// decrypt to UTF-8 text under this codec's key.
    pub fn decode(&self, value: &str) -> Result<String, DecodeError> {
        if !self.is_encoded(value) {
            return Ok(value.to_owned());
        }
        let blob = EncryptedBlob::parse(value, &self.prefix)?;
        let plain = self
            .key
            .decrypt(&blob.iv, &blob.ciphertext)
            .map_err(|_| DecodeError::Decryption)?;
        String::from_utf8(plain).map_err(|_| DecodeError::InvalidUtf8)
    }
}
