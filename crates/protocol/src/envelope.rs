use serde::{Deserialize, Serialize};

use crate::messages::{
    CredentialsRequest, CredentialsResponse, Datasource, DatasourceList, DatasourceRequest,
    FileUpload, Pagination, ProjectList, TsError,
};

/// Root element of every request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename = "tsRequest")]
pub struct TsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceRequest>,
}

impl TsRequest {
    /// Builds a sign-in request.
    pub fn sign_in(credentials: CredentialsRequest) -> Self {
        Self {
            credentials: Some(credentials),
            ..Default::default()
        }
    }

    /// Builds a publish-datasource request.
    pub fn publish(datasource: DatasourceRequest) -> Self {
        Self {
            datasource: Some(datasource),
            ..Default::default()
        }
    }

    /// Serializes to an XML document.
    pub fn to_xml(&self) -> Result<String, quick_xml::SeError> {
        quick_xml::se::to_string(self)
    }
}

/// Root element of every response body.
///
/// Each endpoint fills in exactly one of the optional children; unknown
/// elements and namespace attributes are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TsResponse {
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub credentials: Option<CredentialsResponse>,
    #[serde(default)]
    pub projects: Option<ProjectList>,
    #[serde(default)]
    pub datasources: Option<DatasourceList>,
    #[serde(default)]
    pub datasource: Option<Datasource>,
    #[serde(rename = "fileUpload", default)]
    pub file_upload: Option<FileUpload>,
    #[serde(default)]
    pub error: Option<TsError>,
}

impl TsResponse {
    /// Parses a response body.
    pub fn from_xml(body: &[u8]) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_reader(body)
    }
}

/// Error responses: a `tsResponse` that must contain an `error` element.
///
/// Decoding fails when the element is absent, which lets callers tell a
/// well-formed server error from an unexpected body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error: TsError,
}

impl ErrorEnvelope {
    /// Parses an error body.
    pub fn from_xml(body: &[u8]) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_reader(body)
    }
}
