//! Field value encryption: AES-CBC primitives and the tagged blob codec.
//!
//! This module is intentionally free of policy and host concerns. It provides
//! the encode/decode operations the orchestrator composes.
//!
//! # Stored format
//!
//! ```text
//! <prefix><base64(iv[16] || base64(AES-CBC-PKCS7(plaintext)))>
//! ```
//!
//! Anything without the prefix is plaintext and decodes to itself, so
//! encrypted and unencrypted values can coexist in one store.

pub mod cipher;
pub mod codec;

pub use cipher::{CipherKind, KeyDerivation, IV_LEN};
pub use codec::{DecodeError, EncryptedBlob, FieldCodec, DEFAULT_PREFIX};
