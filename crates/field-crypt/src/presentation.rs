//! Render-time filtering of decrypted values.
//!
//! ```text
//! encrypted? ── no ──> Plain
//!     │ yes
//! viewable?  ── no ──> Redacted
//!     │ yes
//! hidden?    ── yes ─> Masked
//!     │ no
//!     └──────────────> Plain
//! ```

use common::{Actor, FieldConfig, Presentation, RevealPrompt};

use crate::policy::can_view;

/// Decide what the host renders for `plain_value`.
///
/// Unencrypted fields are never filtered. Rendering of the reveal action is
/// left to the host; this only reports which state applies.
pub fn present(plain_value: &str, config: &FieldConfig, actor: &Actor) -> Presentation {
    if !config.is_encrypted {
        return Presentation::Plain {
            value: plain_value.to_owned(),
            encrypted: false,
        };
    }
    if !can_view(actor, config) {
        return Presentation::redacted();
    }
    if config.hide_value {
        Presentation::Masked {
            value: plain_value.to_owned(),
            reveal: RevealPrompt::for_value(plain_value),
        }
    } else {
        Presentation::Plain {
            value: plain_value.to_owned(),
            encrypted: true,
        }
    }
}
