//! The "send to Tableau Server" pipeline.
//!
//! Library crate with no UI dependencies. The server is reached through
//! the [`TableauServer`] trait, implemented for the REST client and mocked
//! in tests.
//!
//! # Pipeline
//!
//! 1. **Write** (tables only): stream rows into a temporary extract file
//! 2. **Sign in** to the configured site
//! 3. **Resolve** the target project from an id, path or unique name
//! 4. **Check** for an existing datasource against the overwrite policy
//! 5. **Publish** the file in chunks, reporting progress

pub mod error;
pub mod send;
pub mod server;
pub mod target;
pub mod types;

pub use error::SendError;
pub use send::SendOrchestrator;
pub use server::TableauServer;
pub use target::{PublishFlags, publish_flags, resolve_project};
pub use types::{ProjectSelector, SendEvent, SendResult, SendSettings};
