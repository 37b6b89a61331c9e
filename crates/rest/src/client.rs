//! Tableau Server REST client.
//!
//! Async HTTP client using `reqwest`. Every call is awaited on the caller's
//! task; the client never spawns work of its own.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use tokio::sync::RwLock;
use tracing::{debug, info};

use tableau_send_protocol::constants::{
    AUTH_HEADER, DATASOURCES_PAGE_SIZE, DEFAULT_API_VERSION, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_READ_TIMEOUT, PROJECTS_PAGE_SIZE, endpoints,
};
use tableau_send_protocol::{
    CredentialsRequest, Datasource, FilterExpression, Project, TsRequest, TsResponse,
};
use tableau_send_transfer::DEFAULT_CHUNK_SIZE;

use crate::error::{Error, check_response};
use crate::projects::ProjectTree;
use crate::session::{Auth, Session};

/// Per-client connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_version: String,
    pub connect_timeout: Duration,
    /// Maximum idle time between two reads of a response.
    pub read_timeout: Duration,
    /// Bytes per append-upload request.
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Tableau Server REST API client.
///
/// Holds a single [`Session`]. Sign in once, then issue queries and
/// uploads; all of them fail with [`Error::NotSignedIn`] before that.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    session: RwLock<Session>,
}

impl Client {
    /// Creates a client for `host` with default settings.
    ///
    /// `host` may omit the scheme, in which case HTTPS is assumed.
    pub fn new(host: &str) -> Result<Self, Error> {
        Self::with_config(host, ClientConfig::default())
    }

    /// Creates a client with explicit timeouts, API version and chunk size.
    pub fn with_config(host: &str, config: ClientConfig) -> Result<Self, Error> {
        let session = Session::new(host, &config.api_version)?;
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            session: RwLock::new(session),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.is_signed_in()
    }

    /// Site id obtained at sign-in.
    pub async fn site_id(&self) -> Option<String> {
        self.session.read().await.site_id().map(str::to_string)
    }

    /// Signs in and stores the session token and site id.
    ///
    /// An empty `site_content_url` selects the server's default site. The
    /// session lock is held for the whole exchange, so concurrent callers
    /// observe either the old or the new credentials, never a mix.
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
        site_content_url: &str,
    ) -> Result<(), Error> {
        let mut session = self.session.write().await;
        let url = session.url(endpoints::SIGN_IN);
        let payload =
            TsRequest::sign_in(CredentialsRequest::new(username, password, site_content_url))
                .to_xml()?;

        debug!(%url, username, site = site_content_url, "signing in");
        let resp = self
            .execute(
                self.http
                    .post(&url)
                    .header(CONTENT_TYPE, "application/xml")
                    .body(payload),
            )
            .await?;

        let credentials = resp.credentials.ok_or(Error::MissingElement("credentials"))?;
        let site_id = credentials
            .site
            .id
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingElement("site"))?;

        info!(site_id = %site_id, username, "signed in to Tableau Server");
        session.set_auth(Auth {
            token: credentials.token,
            site_id,
        });
        Ok(())
    }

    /// Lists every project of the site, following pagination.
    pub async fn query_projects(&self) -> Result<Vec<Project>, Error> {
        let (session, auth) = self.authorized().await?;
        let url = session.url(&endpoints::projects(&auth.site_id));
        let projects = self
            .get_paged(&url, &auth, PROJECTS_PAGE_SIZE, &[], |resp| {
                Ok(resp.projects.unwrap_or_default().projects)
            })
            .await?;
        debug!(count = projects.len(), "queried projects");
        Ok(projects)
    }

    /// Lists the projects and links them into a tree.
    pub async fn query_project_tree(&self) -> Result<ProjectTree, Error> {
        ProjectTree::resolve(self.query_projects().await?)
    }

    /// Lists one page of datasources, optionally narrowed by a server-side filter.
    pub async fn query_datasources(
        &self,
        filter: Option<&FilterExpression>,
    ) -> Result<Vec<Datasource>, Error> {
        let (session, auth) = self.authorized().await?;
        let mut url = session.url(&endpoints::datasources(&auth.site_id));
        // The expression is already percent-encoded; appending it by hand
        // keeps the query builder from encoding it a second time.
        if let Some(filter) = filter {
            url.push_str("?filter=");
            url.push_str(&filter.expression());
        }

        let resp = self
            .execute(self.authed(Method::GET, &url, &auth))
            .await?;
        let datasources = resp
            .datasources
            .ok_or(Error::MissingElement("datasources"))?
            .datasources;
        debug!(count = datasources.len(), filtered = filter.is_some(), "queried datasources");
        Ok(datasources)
    }

    /// Lists every datasource of the site, following pagination.
    ///
    /// `fields` restricts the returned attributes; empty means server default.
    pub async fn query_all_datasources(&self, fields: &[&str]) -> Result<Vec<Datasource>, Error> {
        let (session, auth) = self.authorized().await?;
        let url = session.url(&endpoints::datasources(&auth.site_id));
        let extra: Vec<(&str, String)> = if fields.is_empty() {
            Vec::new()
        } else {
            vec![("fields", fields.join(","))]
        };
        let datasources = self
            .get_paged(&url, &auth, DATASOURCES_PAGE_SIZE, &extra, |resp| {
                Ok(resp.datasources.unwrap_or_default().datasources)
            })
            .await?;
        debug!(count = datasources.len(), "queried all datasources");
        Ok(datasources)
    }

    /// Looks up a datasource by exact name inside a project.
    ///
    /// Narrows server-side with a `name:eq:` filter, walks every page of the
    /// result, then confirms the exact name and the owning project locally.
    pub async fn find_datasource(
        &self,
        name: &str,
        project_id: &str,
    ) -> Result<Option<Datasource>, Error> {
        let (session, auth) = self.authorized().await?;
        let filter = FilterExpression::eq("name", name);
        let url = format!(
            "{}?filter={}",
            session.url(&endpoints::datasources(&auth.site_id)),
            filter.expression()
        );
        let found = self
            .get_paged(&url, &auth, DATASOURCES_PAGE_SIZE, &[], |resp| {
                Ok(resp.datasources.unwrap_or_default().datasources)
            })
            .await?
            .into_iter()
            .find(|ds| ds.name == name && ds.project_id() == Some(project_id));
        Ok(found)
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    /// Snapshot of the session, or [`Error::NotSignedIn`].
    pub(crate) async fn authorized(&self) -> Result<(Session, Auth), Error> {
        let session = self.session.read().await;
        let auth = session.auth()?.clone();
        Ok((session.clone(), auth))
    }

    /// Builds a request carrying the session token.
    pub(crate) fn authed(&self, method: Method, url: &str, auth: &Auth) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTH_HEADER, auth.token.as_str())
    }

    /// Sends a request and classifies the response.
    pub(crate) async fn execute(&self, request: RequestBuilder) -> Result<TsResponse, Error> {
        let resp = request.header(ACCEPT, "application/xml").send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        check_response(status, &body)
    }

    /// Walks `pageNumber=1..` until the last page reported by the server.
    ///
    /// Stops early on an empty page or a response without pagination.
    async fn get_paged<T>(
        &self,
        url: &str,
        auth: &Auth,
        page_size: u32,
        extra: &[(&str, String)],
        items_of: impl Fn(TsResponse) -> Result<Vec<T>, Error>,
    ) -> Result<Vec<T>, Error> {
        let mut items = Vec::new();
        let mut page_number: u32 = 1;

        loop {
            let mut query = vec![
                ("pageNumber", page_number.to_string()),
                ("pageSize", page_size.to_string()),
            ];
            query.extend(extra.iter().cloned());

            let resp = self
                .execute(self.authed(Method::GET, url, auth).query(&query))
                .await?;
            let pagination = resp.pagination;
            let page = items_of(resp)?;
            let empty = page.is_empty();
            items.extend(page);

            match pagination {
                Some(p) if !empty && page_number < p.total_pages() => {
                    debug!(page_number, total_pages = p.total_pages(), "fetching next page");
                    page_number += 1;
                }
                _ => break,
            }
        }

        Ok(items)
    }
}
