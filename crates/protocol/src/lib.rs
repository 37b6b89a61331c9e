//! Wire types for the Tableau Server REST API.
//!
//! Every request and response body is an XML document rooted at
//! `tsRequest` / `tsResponse`. File-bearing requests are sent as
//! `multipart/mixed` bodies with an XML part and a raw-bytes part.

pub mod constants;
pub mod envelope;
pub mod filter;
pub mod messages;
pub mod multipart;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::{ErrorEnvelope, TsRequest, TsResponse};
pub use filter::{FilterExpression, FilterOperator};
pub use messages::{
    CredentialsRequest, CredentialsResponse, Datasource, DatasourceList, DatasourceRequest,
    FileUpload, Pagination, Project, ProjectList, ProjectRef, SiteRef, TsError,
};
pub use multipart::MultipartBody;
pub use types::{OverwritePolicy, ParsePolicyError};
