//! Role-based visibility and write resolution for encrypted fields.
//!
//! Viewing and changing an encrypted value are gated by the same rule: the
//! actor must hold at least one of the field's visible roles. A submission
//! from an actor who fails the gate is not an error; the stored value is
//! kept and the submission is dropped.

use common::{Actor, FieldConfig};

use crate::crypto::{DecodeError, FieldCodec};

/// Returns `true` if `actor` may see the decrypted value of `config`'s field.
pub fn can_view(actor: &Actor, config: &FieldConfig) -> bool {
    actor.holds_any(&config.visible_roles)
}

/// What the save path does with a submitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDecision {
    /// Encryption is off: store plaintext, decrypting leftovers from when it was on.
    StorePlaintext,
    /// Encrypt and store the submitted value.
    EncryptSubmitted,
    /// Discard the submission and store the re-encrypted original.
    PreserveOriginal,
}

/// Decide how a submission to `config`'s field by `actor` is stored.
pub fn decide_write(actor: &Actor, config: &FieldConfig) -> WriteDecision {
    if !config.is_encrypted {
        WriteDecision::StorePlaintext
    } else if can_view(actor, config) {
        WriteDecision::EncryptSubmitted
    } else {
        WriteDecision::PreserveOriginal
    }
}

/// Compute the value to persist for a submission.
///
/// `fetch_original` is called at most once, and only when the submission is
/// discarded. The original may come back as a stored blob or as already
/// decoded plaintext; both are re-encrypted to the same plaintext. A missing
/// original is stored as an encrypted empty string.
///
/// # Errors
///
/// Returns a [`DecodeError`] if a tagged submitted or original value cannot
/// be decoded.
pub fn resolve_write_value<F>(
    submitted: &str,
    fetch_original: F,
    actor: &Actor,
    config: &FieldConfig,
    codec: &FieldCodec,
) -> Result<String, DecodeError>
where
    F: FnOnce() -> Option<String>,
{
    match decide_write(actor, config) {
        WriteDecision::StorePlaintext => codec.decode(submitted),
        WriteDecision::EncryptSubmitted => Ok(codec.encode(submitted)),
        WriteDecision::PreserveOriginal => {
            let original = fetch_original().unwrap_or_default();
            let plain = codec.decode(&original)?;
            Ok(codec.encode(&plain))
        }
    }
}
