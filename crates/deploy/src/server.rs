//! Abstract connection to a Tableau Server.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use tableau_send_protocol::Datasource;
use tableau_send_rest::{Client, Error, ProjectTree, PublishRequest, UploadProgress};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The server operations the send pipeline needs.
///
/// Implemented for the REST [`Client`]; tests substitute a mock.
pub trait TableauServer: Send + Sync {
    fn sign_in<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
        site_content_url: &'a str,
    ) -> BoxFuture<'a, Result<(), Error>>;

    fn project_tree(&self) -> BoxFuture<'_, Result<ProjectTree, Error>>;

    /// Looks up a datasource by exact name inside one project.
    fn find_datasource<'a>(
        &'a self,
        name: &'a str,
        project_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Datasource>, Error>>;

    /// Uploads and publishes `request.file_path`, one progress update per chunk.
    fn publish<'a>(
        &'a self,
        request: &'a PublishRequest,
        progress: &'a mpsc::Sender<UploadProgress>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Datasource, Error>>;
}

impl TableauServer for Client {
    fn sign_in<'a>(
        &'a self,
        username: &'a str,
        password: &'a str,
        site_content_url: &'a str,
    ) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(Client::sign_in(self, username, password, site_content_url))
    }

    fn project_tree(&self) -> BoxFuture<'_, Result<ProjectTree, Error>> {
        Box::pin(self.query_project_tree())
    }

    fn find_datasource<'a>(
        &'a self,
        name: &'a str,
        project_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Datasource>, Error>> {
        Box::pin(Client::find_datasource(self, name, project_id))
    }

    fn publish<'a>(
        &'a self,
        request: &'a PublishRequest,
        progress: &'a mpsc::Sender<UploadProgress>,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Datasource, Error>> {
        Box::pin(self.publish_datasource_chunked(request, progress, cancel))
    }
}
