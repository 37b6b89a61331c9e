//! Upload sessions and datasource publishing.

use std::path::PathBuf;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tableau_send_protocol::constants::endpoints;
use tableau_send_protocol::{Datasource, DatasourceRequest, FileUpload, MultipartBody, TsRequest};
use tableau_send_transfer::{ChunkProgress, ChunkReader, UploadProgress};

use crate::client::Client;
use crate::error::Error;

/// Everything needed to publish one extract file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub project_id: String,
    pub datasource_name: String,
    /// `hyper` or `tde`.
    pub datasource_type: String,
    pub file_path: PathBuf,
    pub overwrite: bool,
    pub append: bool,
}

impl PublishRequest {
    pub fn new(
        project_id: &str,
        datasource_name: &str,
        datasource_type: &str,
        file_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            datasource_name: datasource_name.to_string(),
            datasource_type: datasource_type.to_string(),
            file_path: file_path.into(),
            overwrite: false,
            append: false,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    fn query(&self, upload_session_id: &str) -> [(&'static str, String); 4] {
        [
            ("uploadSessionId", upload_session_id.to_string()),
            ("datasourceType", self.datasource_type.clone()),
            ("overwrite", self.overwrite.to_string()),
            ("append", self.append.to_string()),
        ]
    }
}

impl Client {
    /// Starts a new upload session.
    pub async fn initiate_file_upload(&self) -> Result<FileUpload, Error> {
        let (session, auth) = self.authorized().await?;
        let url = session.url(&endpoints::file_uploads(&auth.site_id));
        let resp = self
            .execute(self.authed(Method::POST, &url, &auth))
            .await?;
        let upload = resp.file_upload.ok_or(Error::MissingElement("fileUpload"))?;
        debug!(upload_session_id = %upload.upload_session_id, "initiated file upload");
        Ok(upload)
    }

    /// Appends one chunk of raw bytes to an upload session.
    pub async fn append_file_upload(
        &self,
        upload: &FileUpload,
        filename: &str,
        data: &[u8],
    ) -> Result<FileUpload, Error> {
        let (session, auth) = self.authorized().await?;
        let url = session.url(&endpoints::file_upload(
            &auth.site_id,
            &upload.upload_session_id,
        ));
        let body = MultipartBody::new().xml_payload("").file(filename, data);
        let content_type = body.content_type();

        let resp = self
            .execute(
                self.authed(Method::PUT, &url, &auth)
                    .header(CONTENT_TYPE, content_type)
                    .body(body.into_bytes()),
            )
            .await?;
        resp.file_upload.ok_or(Error::MissingElement("fileUpload"))
    }

    /// Commits an upload session as a datasource.
    ///
    /// Takes the session by value: it cannot be reused whether this succeeds
    /// or fails.
    pub async fn publish_datasource(
        &self,
        upload: FileUpload,
        request: &PublishRequest,
    ) -> Result<Datasource, Error> {
        let (session, auth) = self.authorized().await?;
        let url = session.url(&endpoints::datasources(&auth.site_id));
        let payload = TsRequest::publish(DatasourceRequest::new(
            &request.datasource_name,
            &request.project_id,
        ))
        .to_xml()?;
        let body = MultipartBody::new().xml_payload(&payload);
        let content_type = body.content_type();

        let resp = self
            .execute(
                self.authed(Method::POST, &url, &auth)
                    .query(&request.query(&upload.upload_session_id))
                    .header(CONTENT_TYPE, content_type)
                    .body(body.into_bytes()),
            )
            .await?;
        resp.datasource.ok_or(Error::MissingElement("datasource"))
    }

    /// Uploads a file in chunks and publishes it.
    ///
    /// Offers one [`UploadProgress`] after every acknowledged chunk and checks
    /// `cancel` right after. Updates are dropped while `progress` is full, so
    /// a slow or absent reader never stalls the upload. A cancelled upload is
    /// abandoned server-side and reported as [`Error::Cancelled`]. Nothing is
    /// retried.
    pub async fn publish_datasource_chunked(
        &self,
        request: &PublishRequest,
        progress: &mpsc::Sender<UploadProgress>,
        cancel: &CancellationToken,
    ) -> Result<Datasource, Error> {
        self.authorized().await?;

        let mut reader = ChunkReader::open(&request.file_path, self.config().chunk_size).await?;
        let upload = self.initiate_file_upload().await?;
        let mut tracker = ChunkProgress::new(reader.file_size(), reader.chunk_size());

        info!(
            datasource = %request.datasource_name,
            project_id = %request.project_id,
            bytes = reader.file_size(),
            chunks = reader.total_chunks(),
            "uploading datasource"
        );

        while let Some(chunk) = reader.next_chunk().await? {
            self.append_file_upload(&upload, &request.datasource_name, &chunk.data)
                .await?;
            let snapshot = tracker.advance(chunk.data.len());
            debug!(
                chunk = chunk.index + 1,
                of = snapshot.total_chunks,
                bytes = snapshot.bytes_sent,
                "chunk uploaded"
            );
            if let Err(TrySendError::Full(_)) = progress.try_send(snapshot) {
                debug!(chunk = chunk.index + 1, "progress receiver full, update dropped");
            }

            if cancel.is_cancelled() {
                warn!(
                    upload_session_id = %upload.upload_session_id,
                    "upload cancelled"
                );
                return Err(Error::Cancelled);
            }
        }

        let datasource = self.publish_datasource(upload, request).await?;
        info!(
            datasource = %datasource.name,
            id = %datasource.id,
            overwrite = request.overwrite,
            append = request.append,
            "published datasource"
        );
        Ok(datasource)
    }
}
