//! `field-crypt` — encrypted-field transform service.
//!
//! Hosts call into one [`FieldTransformService`] around their own persistence:
//!
//! 1. [`FieldTransformService::on_save`] before writing a field value.
//! 2. [`FieldTransformService::on_load`] after reading it back.
//! 3. [`FieldTransformService::present`] before rendering it to a user.
//!
//! Values of encrypted fields are stored as tagged AES-CBC blobs (see
//! [`crypto`]); who may see or change them is decided by [`policy`].

pub mod catalog;
pub mod config;
pub mod crypto;
pub mod policy;
pub mod presentation;
pub mod service;
pub mod telemetry;

pub use catalog::FieldCatalog;
pub use crate::config::Config;
pub use crypto::{CipherKind, DecodeError, FieldCodec, KeyDerivation};
pub use service::{FieldTransformService, OriginalValueSource};

pub use common::{
    Actor, FieldConfig, Presentation, PresentationState, RevealPrompt, RoleId, TransformError,
};
