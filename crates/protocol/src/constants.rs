use std::time::Duration;

/// REST API version used in the `/api/{version}/` path segment.
pub const DEFAULT_API_VERSION: &str = "2.8";

/// Header carrying the session token on every authenticated request.
pub const AUTH_HEADER: &str = "X-Tableau-Auth";

/// Time allowed to establish a TCP/TLS connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed between two reads of a response.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size used when listing projects.
pub const PROJECTS_PAGE_SIZE: u32 = 100;

/// Page size used when listing datasources: fewer round-trips.
pub const DATASOURCES_PAGE_SIZE: u32 = 500;

/// Name of the XML part in multipart bodies.
pub const REQUEST_PAYLOAD_PART: &str = "request_payload";

/// Name of the raw file part in multipart bodies.
pub const FILE_PART: &str = "tableau_file";

/// Endpoint paths, relative to `{base}/api/{version}/`.
pub mod endpoints {
    /// `POST` credentials, receive a token and the site id.
    pub const SIGN_IN: &str = "auth/signin";

    /// `GET` projects of a site.
    pub fn projects(site_id: &str) -> String {
        format!("sites/{site_id}/projects")
    }

    /// `GET` lists datasources, `POST` publishes one.
    pub fn datasources(site_id: &str) -> String {
        format!("sites/{site_id}/datasources")
    }

    /// `POST` starts a new upload session.
    pub fn file_uploads(site_id: &str) -> String {
        format!("sites/{site_id}/fileUploads")
    }

    /// `PUT` appends a chunk to an upload session.
    pub fn file_upload(site_id: &str, upload_session_id: &str) -> String {
        format!("sites/{site_id}/fileUploads/{upload_session_id}")
    }
}
