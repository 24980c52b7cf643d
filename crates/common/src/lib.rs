//! Common types, field model, and errors shared across `field-crypt` crates.

pub mod error;
pub mod protocol;

pub use error::TransformError;
pub use protocol::{Actor, FieldConfig, Presentation, PresentationState, RevealPrompt, RoleId};
