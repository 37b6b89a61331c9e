//! Element types nested inside `tsRequest` / `tsResponse`.
//!
//! Tableau encodes most scalar values as XML attributes, so most fields
//! here carry an `@` rename.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A site reference: `<site id="..." contentUrl="..."/>`.
///
/// Requests only carry the content URL; responses also carry the id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRef {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "@contentUrl", default)]
    pub content_url: String,
}

/// Sign-in payload: `<credentials name="..." password="..."><site contentUrl="..."/></credentials>`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CredentialsRequest {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@password")]
    pub password: String,
    pub site: SiteRef,
}

impl CredentialsRequest {
    pub fn new(name: &str, password: &str, site_content_url: &str) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            site: SiteRef {
                id: None,
                content_url: site_content_url.to_string(),
            },
        }
    }
}

impl fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .field("site", &self.site)
            .finish()
    }
}

/// Sign-in result: the session token and the resolved site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialsResponse {
    #[serde(rename = "@token")]
    pub token: String,
    pub site: SiteRef,
}

/// A project on the server. Projects form a forest via `parent_project_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Project {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@description", default)]
    pub description: Option<String>,
    #[serde(rename = "@parentProjectId", default)]
    pub parent_project_id: Option<String>,
}

impl Project {
    pub fn new(id: &str, name: &str, parent_project_id: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            parent_project_id: parent_project_id.map(str::to_string),
        }
    }

    /// Parent id, treating an empty attribute as "no parent".
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_project_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Returns `true` for top-level projects.
    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }
}

/// `<projects>` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectList {
    #[serde(rename = "project", default)]
    pub projects: Vec<Project>,
}

/// Reference to a project from a datasource: `<project id="..." name="..."/>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A published datasource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Datasource {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@type", default)]
    pub datasource_type: Option<String>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
}

impl Datasource {
    /// Id of the owning project, if the server reported one.
    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.id.as_str())
    }
}

/// `<datasources>` wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DatasourceList {
    #[serde(rename = "datasource", default)]
    pub datasources: Vec<Datasource>,
}

/// Publish payload: `<datasource name="..."><project id="..."/></datasource>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasourceRequest {
    #[serde(rename = "@name")]
    pub name: String,
    pub project: ProjectRef,
}

impl DatasourceRequest {
    pub fn new(name: &str, project_id: &str) -> Self {
        Self {
            name: name.to_string(),
            project: ProjectRef {
                id: project_id.to_string(),
                name: None,
            },
        }
    }
}

/// Handle to a server-side upload session.
///
/// Created by "initiate", referenced by every "append", consumed by "publish".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileUpload {
    #[serde(rename = "@uploadSessionId")]
    pub upload_session_id: String,
    /// Accumulated size in megabytes, as reported by the server.
    #[serde(rename = "@fileSize", default)]
    pub file_size: Option<u64>,
}

/// `<pagination pageNumber=".." pageSize=".." totalAvailable=".."/>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(rename = "@pageNumber")]
    pub page_number: u32,
    #[serde(rename = "@pageSize")]
    pub page_size: u32,
    #[serde(rename = "@totalAvailable")]
    pub total_available: u32,
}

impl Pagination {
    /// Number of pages needed to cover `total_available` items.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        self.total_available.div_ceil(self.page_size).max(1)
    }
}

/// Structured server error: `<error code=".."><summary/><detail/></error>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TsError {
    #[serde(rename = "@code")]
    pub code: String,
    pub summary: String,
    #[serde(default)]
    pub detail: String,
}
