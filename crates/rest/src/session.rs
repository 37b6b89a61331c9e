use crate::error::Error;

/// Credentials returned by a successful sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth {
    pub token: String,
    pub site_id: String,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("token", &"<redacted>")
            .field("site_id", &self.site_id)
            .finish()
    }
}

/// Connection state for one Tableau Server.
///
/// Starts signed out; [`Client::sign_in`](crate::Client::sign_in) fills in
/// the token and site id. A session is never signed out again, the client
/// is simply dropped.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: String,
    auth: Option<Auth>,
}

impl Session {
    /// Creates a signed-out session rooted at `{host}/api/{api_version}/`.
    pub fn new(host: &str, api_version: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: api_base_url(host, api_version)?,
            auth: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path relative to the API root.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.is_some()
    }

    /// Returns the credentials, or [`Error::NotSignedIn`].
    pub fn auth(&self) -> Result<&Auth, Error> {
        self.auth.as_ref().ok_or(Error::NotSignedIn)
    }

    pub fn site_id(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.site_id.as_str())
    }

    pub(crate) fn set_auth(&mut self, auth: Auth) {
        self.auth = Some(auth);
    }
}

/// Normalizes a host into the API root URL.
///
/// A missing scheme defaults to `https://`; trailing slashes are dropped.
fn api_base_url(host: &str, api_version: &str) -> Result<String, Error> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(Error::InvalidUrl("empty host".into()));
    }
    let host = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let parsed = reqwest::Url::parse(&host).map_err(|e| Error::InvalidUrl(format!("{host}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!(
            "unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok(format!("{host}/api/{}/", api_version.trim_matches('/')))
}
