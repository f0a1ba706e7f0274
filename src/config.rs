//! Configuration and field schema.
//!
//! A [`Config`] is built once per request by the embedding application,
//! usually with struct-update syntax over the template:
//!
//! ```
//! use notionslot::config::Config;
//!
//! let config = Config {
//!     notion_token: "secret_xxx".into(),
//!     notion_db_id: "123456aa-bc12-1234-5678-0987654321aa".into(),
//!     site_domain: "foo.example".into(),
//!     site_name: "My Foo".into(),
//!     notify_to: "me@foo.example".into(),
//!     reply_to: "hello@foo.example".into(),
//!     mail_from: "noreply@foo.example".into(),
//!     ..Config::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;

use crate::error::ConfigError;

/// Notion page-property type a submission field maps to.
///
/// `Block` fields become page body paragraphs instead of database
/// properties. `Other` carries a property type the archive builder does
/// not understand; it is reported during archive-record construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    Email,
    RichText,
    Block,
    Other(String),
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Email => f.write_str("email"),
            Self::RichText => f.write_str("rich_text"),
            Self::Block => f.write_str("block"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One submission field: drives validation, mail-body rendering, and the
/// archive payload from a single declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Submission key the value arrives under.
    pub key: String,
    /// Whether validation rejects a missing/empty value.
    pub required: bool,
    /// Human-readable label, also the Notion property name.
    pub display_name: String,
    /// Notion property type this field maps to.
    pub kind: PropertyKind,
}

impl FieldSpec {
    pub fn new(
        key: impl Into<String>,
        required: bool,
        display_name: impl Into<String>,
        kind: PropertyKind,
    ) -> Self {
        Self {
            key: key.into(),
            required,
            display_name: display_name.into(),
            kind,
        }
    }
}

/// Handler configuration. Immutable once validated; field order is
/// preserved end-to-end (error list, mail body lines, Notion properties).
#[derive(Debug, Clone)]
pub struct Config {
    /// Notion pages endpoint.
    pub notion_endpoint: String,
    /// Emoji used as the page icon.
    pub notion_emoji: String,
    /// Notion integration token.
    pub notion_token: String,
    /// Target Notion database id.
    pub notion_db_id: String,
    /// Site domain, used for CORS origin, redirects, and mail wording.
    pub site_domain: String,
    /// Site name, used in the mail footer.
    pub site_name: String,
    /// Address the notification mail goes to.
    pub notify_to: String,
    /// Reply-To header on both outbound mails.
    pub reply_to: String,
    /// From header on both outbound mails.
    pub mail_from: String,
    /// Submission key holding the sender address the reply mail goes to.
    pub mail_to_key: String,
    /// Ordered field schema.
    pub fields: Vec<FieldSpec>,
}

impl Default for Config {
    /// The template the embedding application merges its values over.
    /// Secrets and site identity are intentionally empty and fail
    /// [`Config::validate`] until supplied.
    fn default() -> Self {
        Self {
            notion_endpoint: "https://api.notion.com/v1/pages".to_string(),
            notion_emoji: "\u{1F4E7}".to_string(),
            notion_token: String::new(),
            notion_db_id: String::new(),
            site_domain: String::new(),
            site_name: String::new(),
            notify_to: String::new(),
            reply_to: String::new(),
            mail_from: String::new(),
            mail_to_key: "email".to_string(),
            fields: vec![
                FieldSpec::new("name", true, "Full name", PropertyKind::Title),
                FieldSpec::new("email", true, "Email address", PropertyKind::Email),
                FieldSpec::new("ip", true, "IP", PropertyKind::RichText),
                FieldSpec::new("message", true, "Message", PropertyKind::Block),
            ],
        }
    }
}

impl Config {
    /// Check completeness. Every value, including every field-spec
    /// attribute, must be non-empty; the first offender is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("notion_endpoint", &self.notion_endpoint),
            ("notion_emoji", &self.notion_emoji),
            ("notion_token", &self.notion_token),
            ("notion_db_id", &self.notion_db_id),
            ("site_domain", &self.site_domain),
            ("site_name", &self.site_name),
            ("notify_to", &self.notify_to),
            ("reply_to", &self.reply_to),
            ("mail_from", &self.mail_from),
            ("mail_to_key", &self.mail_to_key),
        ];
        for (key, value) in scalars {
            if value.is_empty() {
                return Err(ConfigError::Missing { key: key.into() });
            }
        }

        if self.fields.is_empty() {
            return Err(ConfigError::Missing {
                key: "fields".into(),
            });
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.key.is_empty() {
                return Err(ConfigError::Missing {
                    key: format!("fields[{i}].key"),
                });
            }
            if field.display_name.is_empty() {
                return Err(ConfigError::Missing {
                    key: format!("fields[{i}].display_name"),
                });
            }
            if let PropertyKind::Other(kind) = &field.kind
                && kind.is_empty()
            {
                return Err(ConfigError::Missing {
                    key: format!("fields[{i}].kind"),
                });
            }
        }

        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
