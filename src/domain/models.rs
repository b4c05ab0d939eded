//! Domain models for generated cloud-config documents.
//!
//! A [`CloudConfig`] only ever carries the facet produced by one handler;
//! fields the handler does not own stay empty and are omitted on render.

use serde::Serialize;

use super::{AppError, Result};

/// Header line that marks a YAML document as cloud-config.
const CLOUD_CONFIG_HEADER: &str = "#cloud-config\n";

/// A generated unit file (e.g. a networkd interface definition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    /// Unit file name, e.g. `50-eth0.network`.
    pub name: String,
    /// Literal unit file content.
    pub content: String,
}

impl Unit {
    /// Build the networkd unit for an interface.
    #[must_use]
    pub fn network(interface: &str, content: String) -> Self {
        Self {
            name: format!("50-{interface}.network"),
            content,
        }
    }
}

/// A user account entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Login name.
    pub name: String,
    /// Crypted password hash.
    #[serde(rename = "passwd", skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Keys authorized for this user, in file order.
    #[serde(
        rename = "ssh-authorized-keys",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ssh_authorized_keys: Vec<String>,
}

impl User {
    /// Create a user with no password and no keys.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password_hash: None,
            ssh_authorized_keys: Vec::new(),
        }
    }
}

/// Host-specific section of a cloud-config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coreos {
    /// Unit files to install.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

impl Coreos {
    fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Normalized configuration document handed to the apply tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloudConfig {
    /// Host-specific section.
    #[serde(skip_serializing_if = "Coreos::is_empty")]
    pub coreos: Coreos,
    /// Keys authorized for the default user.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
    /// Machine hostname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// User accounts. Names are unique.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
}

impl CloudConfig {
    /// Authorize a key at top level and on the first user, creating `root`
    /// if no user exists yet.
    pub fn authorize_key(&mut self, key: &str) {
        self.ssh_authorized_keys.push(key.to_owned());
        if self.users.is_empty() {
            self.users.push(User::named("root"));
        }
        if let Some(user) = self.users.first_mut() {
            user.ssh_authorized_keys.push(key.to_owned());
        }
    }

    /// Whether the document carries nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Render the document in the format the apply tool reads.
    ///
    /// # Errors
    /// Returns error if YAML serialization fails.
    pub fn render(&self) -> Result<String> {
        let body = serde_yaml::to_string(self).map_err(AppError::render)?;
        Ok(format!("{CLOUD_CONFIG_HEADER}{body}"))
    }
}

/// Conflict policy when a transient unit with the same name is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    /// Replace the existing job.
    Replace,
}

impl JobMode {
    /// Mode string understood by systemd.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "replace",
        }
    }
}

impl std::fmt::Display for JobMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot request to run a command as a transient service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientUnitRequest {
    /// Unit name including the `.service` suffix.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Command line; the first element is the executable.
    pub command: Vec<String>,
    /// Conflict policy.
    pub mode: JobMode,
}
