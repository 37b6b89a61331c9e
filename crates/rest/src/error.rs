use reqwest::StatusCode;
use tableau_send_protocol::{ErrorEnvelope, TsResponse};
use tableau_send_transfer::TransferError;

/// Errors from the Tableau REST client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure: unreachable host, TLS, timeout, broken stream.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error(transparent)]
    ServerResponse(#[from] ServerResponseError),

    /// An authenticated operation was invoked before `sign_in`.
    #[error("invoke sign-in before communicating with the server")]
    NotSignedIn,

    /// A success response whose body is not a valid `tsResponse`.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("failed to encode request: {0}")]
    Encode(#[from] quick_xml::SeError),

    /// A success response without the element the endpoint must return.
    #[error("response is missing the <{0}> element")]
    MissingElement(&'static str),

    /// The project listing has cycles or references unknown parents.
    #[error("inconsistent project hierarchy, unresolved projects: {}", .0.join(", "))]
    InconsistentProjects(Vec<String>),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project name {name:?} is ambiguous ({} matches)", .ids.len())]
    AmbiguousProject { name: String, ids: Vec<String> },

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("upload cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` for user-requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// A non-success response, classified by whether its body could be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ServerResponseError {
    /// The server sent a well-formed `<error>` element.
    #[error("{summary}: {detail} (Error code: {code}).")]
    Structured {
        status: u16,
        code: String,
        summary: String,
        detail: String,
    },

    /// The body was not an error envelope (HTML error page, empty body, ...).
    #[error("Invalid response from server: {reason} (Error Code: {status})")]
    InvalidResponse {
        status: u16,
        reason: String,
        #[source]
        source: quick_xml::DeError,
    },
}

impl ServerResponseError {
    /// Classifies a non-success response body.
    pub fn classify(status: StatusCode, body: &[u8]) -> Self {
        match ErrorEnvelope::from_xml(body) {
            Ok(envelope) => Self::Structured {
                status: status.as_u16(),
                code: envelope.error.code,
                summary: envelope.error.summary,
                detail: envelope.error.detail,
            },
            Err(source) => Self::InvalidResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                source,
            },
        }
    }

    /// HTTP status code of the response.
    pub fn status(&self) -> u16 {
        match self {
            Self::Structured { status, .. } | Self::InvalidResponse { status, .. } => *status,
        }
    }

    /// Tableau error code, if the server supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Structured { code, .. } => Some(code),
            Self::InvalidResponse { .. } => None,
        }
    }
}

/// Decodes a response body, classifying non-success statuses as errors.
pub fn check_response(status: StatusCode, body: &[u8]) -> Result<TsResponse, Error> {
    if !status.is_success() {
        return Err(ServerResponseError::classify(status, body).into());
    }
    Ok(TsResponse::from_xml(body)?)
}
