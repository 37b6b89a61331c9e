//! Data types for the send pipeline.

use std::fmt;

use tableau_send_protocol::{Datasource, OverwritePolicy};

use crate::error::SendError;

/// How the target project is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectSelector {
    /// Server-assigned project id.
    Id(String),
    /// Slash-separated display path (`Finance/Reports`) or a unique name.
    Path(String),
}

impl ProjectSelector {
    fn is_empty(&self) -> bool {
        match self {
            Self::Id(s) | Self::Path(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for ProjectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Path(path) => f.write_str(path),
        }
    }
}

/// Where and how to publish.
#[derive(Clone, PartialEq, Eq)]
pub struct SendSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Empty selects the default site.
    pub site_content_url: String,
    pub project: ProjectSelector,
    pub datasource_name: String,
    pub overwrite: OverwritePolicy,
}

impl SendSettings {
    /// Checks that every required field is set.
    pub fn validate(&self) -> Result<(), SendError> {
        let missing = [
            ("host", self.host.trim().is_empty()),
            ("username", self.username.trim().is_empty()),
            ("project", self.project.is_empty()),
            ("datasource name", self.datasource_name.trim().is_empty()),
        ];
        match missing.iter().find(|(_, empty)| *empty) {
            Some((field, _)) => Err(SendError::InvalidSettings(format!("{field} must be set"))),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("site_content_url", &self.site_content_url)
            .field("project", &self.project)
            .field("datasource_name", &self.datasource_name)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

/// Progress event emitted while sending.
#[derive(Debug, Clone, PartialEq)]
pub enum SendEvent {
    /// Progress update, `progress` in `[0.0, 1.0]`.
    Progress { progress: f64, status: String },
    /// The datasource was published.
    Completed { datasource_id: String, name: String },
    /// The send failed or was cancelled.
    Failed { error: String },
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendResult {
    pub datasource: Datasource,
    pub project_id: String,
    pub overwrite: bool,
    pub append: bool,
}
