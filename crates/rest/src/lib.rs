//! Async client for the Tableau Server REST API.
//!
//! Covers the publishing workflow: sign in, discover projects, check for an
//! existing datasource and upload an extract file in chunks.

pub mod client;
pub mod error;
pub mod projects;
pub mod publish;
pub mod session;

#[cfg(test)]
mod test_server;

pub use client::{Client, ClientConfig};
pub use error::{Error, ServerResponseError};
pub use projects::ProjectTree;
pub use publish::PublishRequest;
pub use session::{Auth, Session};
pub use tableau_send_transfer::UploadProgress;
