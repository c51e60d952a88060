//! Session parameters and per-notification message templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default capacity for sessions created without an explicit one.
pub const DEFAULT_CAPACITY: usize = 5;

/// Descriptive and behavioural settings of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParameters {
    pub name: String,
    /// Maximum number of confirmed members. Always at least 1.
    pub capacity: usize,
    #[serde(default)]
    pub description: String,
    /// Start the session automatically once every seat is taken.
    #[serde(default)]
    pub fire_when_full: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: MessageTemplates,
    /// Link handed to confirmed members when the session starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self {
            name: "Session".to_string(),
            capacity: DEFAULT_CAPACITY,
            description: String::new(),
            fire_when_full: false,
            date: None,
            messages: MessageTemplates::default(),
            url: None,
        }
    }
}

impl SessionParameters {
    /// Apply every field set in `overrides` on top of these parameters.
    pub fn apply(&mut self, overrides: &SessionOverrides) {
        if let Some(name) = &overrides.name {
            self.name = name.clone();
        }
        if let Some(capacity) = overrides.capacity {
            self.capacity = capacity;
        }
        if let Some(description) = &overrides.description {
            self.description = description.clone();
        }
        if let Some(fire) = overrides.fire_when_full {
            self.fire_when_full = fire;
        }
        if overrides.date.is_some() {
            self.date = overrides.date;
        }
        if let Some(messages) = &overrides.messages {
            self.messages = messages.clone();
        }
        if overrides.url.is_some() {
            self.url = overrides.url.clone();
        }
    }

    /// Builder form of [`apply`](Self::apply).
    pub fn with_overrides(mut self, overrides: &SessionOverrides) -> Self {
        self.apply(overrides);
        self
    }
}

/// Partial [`SessionParameters`]; unset fields keep the base value.
///
/// This is the shape of the `[session]` and `[templates.<name>]` config
/// sections, and of per-request overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fire_when_full: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<MessageTemplates>,
}

impl SessionOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_fire_when_full(mut self, fire: bool) -> Self {
        self.fire_when_full = Some(fire);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Layer `other` on top of `self` (other takes priority).
    pub fn merge(&mut self, other: SessionOverrides) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.capacity.is_some() {
            self.capacity = other.capacity;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.fire_when_full.is_some() {
            self.fire_when_full = other.fire_when_full;
        }
        if other.date.is_some() {
            self.date = other.date;
        }
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.messages.is_some() {
            self.messages = other.messages;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Text templates for each direct notification a session sends.
///
/// Placeholders: `{name}`, `{position}`, `{url}`, `{owner}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub confirmed: String,
    pub waitlisted: String,
    pub removed: String,
    pub removed_from_waitlist: String,
    pub promoted: String,
    pub started: String,
    pub started_waitlisted: String,
    pub cancelled: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            confirmed: "You're confirmed for **{name}**.".to_string(),
            waitlisted: "**{name}** is full. You're on the waitlist at position {position}."
                .to_string(),
            removed: "You've been removed from **{name}**.".to_string(),
            removed_from_waitlist: "You've been removed from the waitlist for **{name}**."
                .to_string(),
            promoted: "A seat opened up: you've been upgraded from the waitlist for **{name}**."
                .to_string(),
            started: "**{name}** has started! {url}".to_string(),
            started_waitlisted: "**{name}** has started, but you were on the waitlist."
                .to_string(),
            cancelled: "**{name}** has been cancelled.".to_string(),
        }
    }
}

/// Substitute `{key}` placeholders in `template`.
///
/// Unknown placeholders are left as written.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out.trim_end().to_string()
}
