//! Types exchanged between a host application and the transform service.
//!
//! A host supplies a [`FieldConfig`] and an [`Actor`] with every call and gets
//! back either a transformed string or a [`Presentation`]. All types are
//! serialisable as JSON so they can cross process boundaries unchanged.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role granted visibility when a field does not configure any.
pub const DEFAULT_VISIBLE_ROLE: &str = "administrator";

/// Message shown in place of a value the actor is not allowed to see.
pub const REDACTED_MESSAGE: &str = "You do not have permission to view this field.";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque, host-defined role identifier (e.g. `"administrator"`, `"editor"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Wrap a role name.
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// The role name as given by the host.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleId {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}

impl From<String> for RoleId {
    fn from(role: String) -> Self {
        Self(role)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The principal on whose behalf a transform call is made.
///
/// Supplied fresh by the host for every call; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Roles held by the actor. Order and duplicates are irrelevant.
    #[serde(default)]
    pub roles: BTreeSet<RoleId>,
}

impl Actor {
    /// Build an actor from any collection of role names.
    pub fn with_roles<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the actor holds at least one of `roles`.
    pub fn holds_any(&self, roles: &BTreeSet<RoleId>) -> bool {
        !self.roles.is_disjoint(roles)
    }
}

// ---------------------------------------------------------------------------
// Field configuration
// ---------------------------------------------------------------------------

/// Per-field encryption and visibility settings.
///
/// Created and edited by the host's settings surface; read-only to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Stable identifier used to re-fetch the persisted value of this field.
    pub field_key: String,

    /// Whether values of this field are stored encrypted.
    #[serde(default)]
    pub is_encrypted: bool,

    /// Whether a viewable value should be rendered behind a reveal action.
    #[serde(default)]
    pub hide_value: bool,

    /// Roles allowed to see (and therefore change) the decrypted value.
    #[serde(default = "default_visible_roles")]
    pub visible_roles: BTreeSet<RoleId>,
}

fn default_visible_roles() -> BTreeSet<RoleId> {
    BTreeSet::from([RoleId::from(DEFAULT_VISIBLE_ROLE)])
}

impl FieldConfig {
    /// A plaintext field visible to [`DEFAULT_VISIBLE_ROLE`].
    pub fn new(field_key: impl Into<String>) -> Self {
        Self {
            field_key: field_key.into(),
            is_encrypted: false,
            hide_value: false,
            visible_roles: default_visible_roles(),
        }
    }

    /// Set whether the field is stored encrypted.
    pub fn encrypted(mut self, on: bool) -> Self {
        self.is_encrypted = on;
        self
    }

    /// Set whether the value is rendered behind a reveal action.
    pub fn hidden(mut self, on: bool) -> Self {
        self.hide_value = on;
        self
    }

    /// Replace the set of roles allowed to view the value.
    pub fn visible_to<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleId>,
    {
        self.visible_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Read a field definition as stored by the host's settings surface.
    ///
    /// Settings live under slug-prefixed names (`<slug>is_encrypted`,
    /// `<slug>hide_value`, `<slug>visible_roles`) next to the field's `key`.
    /// An absent or `null` setting falls back to its default; a present but
    /// empty role list is kept as-is and hides the value from everyone.
    pub fn from_settings(settings: &Map<String, Value>, slug: &str) -> Self {
        let get = |name: &str| {
            settings
                .get(&format!("{slug}{name}"))
                .filter(|v| !v.is_null())
        };

        let field_key = settings
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Self {
            field_key,
            is_encrypted: get("is_encrypted").map(setting_flag).unwrap_or(false),
            hide_value: get("hide_value").map(setting_flag).unwrap_or(false),
            visible_roles: get("visible_roles")
                .map(setting_roles)
                .unwrap_or_else(default_visible_roles),
        }
    }
}

/// Interpret a toggle setting; hosts store these as booleans, `0`/`1`, or strings.
fn setting_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        _ => false,
    }
}

fn setting_roles(value: &Value) -> BTreeSet<RoleId> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(RoleId::from)
            .collect(),
        Value::String(s) if !s.is_empty() => BTreeSet::from([RoleId::from(s.as_str())]),
        _ => BTreeSet::new(),
    }
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Terminal state of a single field render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationState {
    Plain,
    Redacted,
    Masked,
}

/// Reveal action the host should render in front of a masked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPrompt {
    /// A value exists and is hidden until revealed.
    Show,
    /// No value exists yet; revealing opens an empty input.
    Add,
}

impl RevealPrompt {
    /// Choose the prompt for a masked value.
    pub fn for_value(value: &str) -> Self {
        if value.is_empty() {
            RevealPrompt::Add
        } else {
            RevealPrompt::Show
        }
    }

    /// Button text for this prompt.
    pub fn label(&self) -> &'static str {
        match self {
            RevealPrompt::Show => "Click to Show",
            RevealPrompt::Add => "Click to Add",
        }
    }
}

/// What the host should render for a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Presentation {
    /// Render the value as-is. `encrypted` marks fields stored encrypted so the
    /// host can decorate the label.
    Plain { value: String, encrypted: bool },
    /// Render `message` instead of the value.
    Redacted { message: String },
    /// Render the value hidden behind a reveal action.
    Masked { value: String, reveal: RevealPrompt },
}

impl Presentation {
    /// The bare state tag.
    pub fn state(&self) -> PresentationState {
        match self {
            Presentation::Plain { .. } => PresentationState::Plain,
            Presentation::Redacted { .. } => PresentationState::Redacted,
            Presentation::Masked { .. } => PresentationState::Masked,
        }
    }

    /// The value the host may render, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Presentation::Plain { value, .. } | Presentation::Masked { value, .. } => Some(value.as_str()),
            Presentation::Redacted { .. } => None,
        }
    }

    /// A redaction carrying the fixed [`REDACTED_MESSAGE`].
    pub fn redacted() -> Self {
        Presentation::Redacted {
            message: REDACTED_MESSAGE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SLUG: &str = "_acf_efo_";

    fn settings(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn default_config_is_visible_to_administrator_only() {
        let cfg = FieldConfig::new("field_1");
        assert!(!cfg.is_encrypted);
        assert!(!cfg.hide_value);
        assert_eq!(cfg.visible_roles, BTreeSet::from([RoleId::from("administrator")]));
    }

    #[test]
    fn actor_role_membership_ignores_order_and_duplicates() {
        let actor = Actor::with_roles(["editor", "author", "editor"]);
        assert_eq!(actor.roles.len(), 2);
        let allowed = BTreeSet::from([RoleId::from("author")]);
        assert!(actor.holds_any(&allowed));
        assert!(!Actor::default().holds_any(&allowed));
    }

    #[test]
    fn from_settings_applies_fallbacks() {
        let cfg = FieldConfig::from_settings(&settings(json!({"key": "field_abc"})), SLUG);
        assert_eq!(cfg, FieldConfig::new("field_abc"));
    }

    #[test]
    fn from_settings_reads_prefixed_values() {
        let cfg = FieldConfig::from_settings(
            &settings(json!({
                "key": "field_ssn",
                "_acf_efo_is_encrypted": 1,
                "_acf_efo_hide_value": "1",
                "_acf_efo_visible_roles": ["editor", "administrator"],
            })),
            SLUG,
        );
        assert!(cfg.is_encrypted);
        assert!(cfg.hide_value);
        assert!(cfg.visible_roles.contains(&RoleId::from("editor")));
        assert_eq!(cfg.visible_roles.len(), 2);
    }

    #[test]
    fn from_settings_ignores_unprefixed_names() {
        let cfg = FieldConfig::from_settings(
            &settings(json!({"key": "k", "is_encrypted": true})),
            SLUG,
        );
        assert!(!cfg.is_encrypted);
    }

    #[test]
    fn from_settings_keeps_explicitly_empty_roles() {
        let cfg = FieldConfig::from_settings(
            &settings(json!({"key": "k", "_acf_efo_visible_roles": []})),
            SLUG,
        );
        assert!(cfg.visible_roles.is_empty());
    }

    #[test]
    fn from_settings_null_roles_fall_back() {
        let cfg = FieldConfig::from_settings(
            &settings(json!({"key": "k", "_acf_efo_visible_roles": null})),
            SLUG,
        );
        assert_eq!(cfg.visible_roles, default_visible_roles());
    }

    #[test]
    fn setting_flag_variants() {
        assert!(setting_flag(&json!(true)));
        assert!(setting_flag(&json!("true")));
        assert!(!setting_flag(&json!(0)));
        assert!(!setting_flag(&json!("0")));
        assert!(!setting_flag(&json!("")));
        assert!(!setting_flag(&json!([1])));
    }

    #[test]
    fn single_role_string_is_accepted() {
        assert_eq!(
            setting_roles(&json!("editor")),
            BTreeSet::from([RoleId::from("editor")])
        );
    }

    #[test]
    fn field_config_serde_defaults() {
        let cfg: FieldConfig = serde_json::from_str(r#"{"field_key":"f"}"#).unwrap();
        assert_eq!(cfg, FieldConfig::new("f"));
    }

    #[test]
    fn presentation_serialises_with_state_tag() {
        let p = Presentation::Masked {
            value: "secret".into(),
            reveal: RevealPrompt::Show,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["state"], "masked");
        assert_eq!(v["reveal"], "show");

        let r = serde_json::to_value(Presentation::redacted()).unwrap();
        assert_eq!(r["state"], "redacted");
        assert_eq!(r["message"], REDACTED_MESSAGE);
        assert!(r.get("value").is_none());
    }

    #[test]
    fn reveal_prompt_depends_on_emptiness() {
        assert_eq!(RevealPrompt::for_value(""), RevealPrompt::Add);
        assert_eq!(RevealPrompt::for_value("x"), RevealPrompt::Show);
        assert_eq!(RevealPrompt::Add.label(), "Click to Add");
    }
}
