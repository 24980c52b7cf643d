//! [`FieldTransformService`]: the entry point hosts call around persistence.
//!
//! - `on_save` before a configured field's value is written.
//! - `on_load` after a value is read, before anything else sees it.
//! - `present` before a value is rendered to a user.
//!
//! The service holds only the immutable codec, so one instance can be shared
//! across threads behind an `Arc` without locking.

use tracing::{debug, warn};

use common::{Actor, FieldConfig, Presentation, TransformError};

use crate::config::Config;
use crate::crypto::FieldCodec;
use crate::policy::{self, WriteDecision};
use crate::presentation;

/// Host collaborator that re-reads the currently persisted value of a field.
///
/// Only consulted when a submission is discarded.
#[cfg_attr(test, mockall::automock)]
pub trait OriginalValueSource {
    /// Return the stored value for `field_key`, if any.
    fn fetch_original(&self, field_key: &str) -> Option<String>;
}

impl<F> OriginalValueSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn fetch_original(&self, field_key: &str) -> Option<String> {
        self(field_key)
    }
}

/// Encrypts, decrypts, and filters field values on behalf of a host.
#[derive(Debug)]
pub struct FieldTransformService {
    codec: FieldCodec,
}

impl FieldTransformService {
    /// Build the service, deriving the cipher key once.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Configuration`] if `cfg` fails
    /// [`Config::validate`], e.g. a blank secret or an empty blob prefix.
    pub fn new(cfg: &Config) -> Result<Self, TransformError> {
        cfg.validate()
            .map_err(|e| TransformError::Configuration(e.to_string()))?;
        let codec = FieldCodec::new(
            &cfg.secret_key,
            cfg.cipher,
            cfg.key_derivation,
            &cfg.blob_prefix,
        )?;
        debug!(cipher = %codec.cipher(), "field transform service ready");
        Ok(Self { codec })
    }

    /// Wrap an already-built codec.
    pub fn from_codec(codec: FieldCodec) -> Self {
        Self { codec }
    }

    /// The codec used for every value.
    pub fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    /// Transform a submitted value into what should be persisted.
    ///
    /// A submission from an actor without a visible role is silently replaced
    /// by the re-encrypted original from `source`; no error is raised.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Decode`] if a tagged value involved in the
    /// write cannot be decoded. The host decides whether that fails the save.
    pub fn on_save<S>(
        &self,
        value: &str,
        config: &FieldConfig,
        actor: &Actor,
        source: &S,
    ) -> Result<String, TransformError>
    where
        S: OriginalValueSource + ?Sized,
    {
        let decision = policy::decide_write(actor, config);
        debug!(field_key = %config.field_key, ?decision, "resolving field write");
        if decision == WriteDecision::PreserveOriginal {
            warn!(
                field_key = %config.field_key,
                "actor holds no visible role; submission discarded, stored value kept"
            );
        }

        policy::resolve_write_value(
            value,
            || source.fetch_original(&config.field_key),
            actor,
            config,
            &self.codec,
        )
        .map_err(|e| {
            warn!(field_key = %config.field_key, error = %e, "field write could not be resolved");
            e.into()
        })
    }

    /// Transform a retrieved value into its true plaintext.
    ///
    /// Always decodes, whatever the field's settings; untagged values pass
    /// through. No visibility filtering happens here, see [`Self::present`].
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Decode`] if a tagged value cannot be decoded.
    pub fn on_load(
        &self,
        value: &str,
        config: &FieldConfig,
        _actor: &Actor,
    ) -> Result<String, TransformError> {
        self.codec.decode(value).map_err(|e| {
            warn!(field_key = %config.field_key, error = %e, "stored field value could not be decoded");
            e.into()
        })
    }

    /// Decide how a decrypted value is rendered for `actor`.
    pub fn present(&self, plain_value: &str, config: &FieldConfig, actor: &Actor) -> Presentation {
        let p = presentation::present(plain_value, config, actor);
        debug!(field_key = %config.field_key, state = ?p.state(), "field presentation resolved");
        p
    }
}
