//! Send orchestrator.
//!
//! Drives one send from settings to a published datasource, reporting
//! progress on an event channel and honoring a cancellation token.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tableau_send_extract::{
    Cell, ColumnSpec, ExtractBackend, ExtractKind, ExtractWriter, WriteSummary,
};
use tableau_send_protocol::{Datasource, OverwritePolicy};
use tableau_send_rest::{PublishRequest, UploadProgress};
use tableau_send_transfer::SpeedCalculator;

use crate::error::SendError;
use crate::server::TableauServer;
use crate::target::{publish_flags, resolve_project};
use crate::types::{SendEvent, SendResult, SendSettings};

/// Portion of the overall progress bar owned by one phase.
#[derive(Debug, Clone, Copy)]
struct Phase {
    start: f64,
    end: f64,
}

impl Phase {
    const WRITE: Self = Self { start: 0.0, end: 0.5 };
    const UPLOAD_AFTER_WRITE: Self = Self { start: 0.5, end: 1.0 };
    const UPLOAD_ONLY: Self = Self { start: 0.0, end: 1.0 };

    fn at(self, fraction: f64) -> f64 {
        self.start + (self.end - self.start) * fraction.clamp(0.0, 1.0)
    }
}

/// Event channel capacity.
const EVENT_CAPACITY: usize = 256;

/// Slots progress updates leave free for the terminal event.
const TERMINAL_RESERVE: usize = 1;

/// Sends extracts to a Tableau Server.
///
/// Events are never awaited: progress updates are dropped while the receiver
/// lags or was never taken, and one slot stays free so each send can still
/// deliver its `Completed` or `Failed` event.
pub struct SendOrchestrator {
    events_tx: mpsc::Sender<SendEvent>,
    events_rx: Option<mpsc::Receiver<SendEvent>>,
    cancel: CancellationToken,
}

impl Default for SendOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl SendOrchestrator {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        Self {
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<SendEvent>> {
        self.events_rx.take()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Publishes an existing extract file.
    pub async fn send_file(
        &self,
        server: &dyn TableauServer,
        settings: &SendSettings,
        file: &Path,
        kind: ExtractKind,
    ) -> Result<SendResult, SendError> {
        let outcome = async {
            settings.validate()?;
            self.upload(server, settings, file, kind, Phase::UPLOAD_ONLY)
                .await
        }
        .await;
        self.finish(settings, outcome).await
    }

    /// Writes `rows` into a temporary extract, then publishes it.
    ///
    /// The extract is written on the blocking pool and removed once the
    /// send finishes, successful or not.
    pub async fn send_table<B>(
        &self,
        server: &dyn TableauServer,
        writer: Arc<ExtractWriter<B>>,
        settings: &SendSettings,
        schema: Vec<ColumnSpec>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<SendResult, SendError>
    where
        B: ExtractBackend + 'static,
    {
        let outcome = self
            .write_and_upload(server, writer, settings, schema, rows)
            .await;
        self.finish(settings, outcome).await
    }

    async fn write_and_upload<B>(
        &self,
        server: &dyn TableauServer,
        writer: Arc<ExtractWriter<B>>,
        settings: &SendSettings,
        schema: Vec<ColumnSpec>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<SendResult, SendError>
    where
        B: ExtractBackend + 'static,
    {
        settings.validate()?;
        self.check_cancelled()?;

        let kind = writer.kind()?;
        let dir = tempfile::Builder::new().prefix("tableau-send-").tempdir()?;
        let path = dir
            .path()
            .join(format!("{}.{}", file_stem(&settings.datasource_name), kind.extension()));

        self.emit_progress(Phase::WRITE.at(0.0), "Writing extract");
        let summary = self.write_extract(writer, path.clone(), schema, rows).await?;
        info!(
            path = %path.display(),
            rows = summary.rows_written,
            columns = summary.columns_written,
            "extract written"
        );

        self.upload(server, settings, &path, kind, Phase::UPLOAD_AFTER_WRITE)
            .await
    }

    async fn write_extract<B>(
        &self,
        writer: Arc<ExtractWriter<B>>,
        path: PathBuf,
        schema: Vec<ColumnSpec>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<WriteSummary, SendError>
    where
        B: ExtractBackend + 'static,
    {
        let total = rows.len() as u64;
        let events_tx = self.events_tx.clone();
        let cancel = self.cancel.clone();

        let summary = tokio::task::spawn_blocking(move || {
            let mut last_percent = 0;
            writer.write_with_progress(
                &path,
                OverwritePolicy::Overwrite,
                &schema,
                &rows,
                &cancel,
                |written| {
                    let percent = written * 100 / total.max(1);
                    if percent > last_percent {
                        last_percent = percent;
                        offer_progress(
                            &events_tx,
                            Phase::WRITE.at(percent as f64 / 100.0),
                            format!("Writing extract ({written}/{total} rows)"),
                        );
                    }
                },
            )
        })
        .await
        .map_err(|e| SendError::Task(format!("task join error: {e}")))??;
        Ok(summary)
    }

    async fn upload(
        &self,
        server: &dyn TableauServer,
        settings: &SendSettings,
        file: &Path,
        kind: ExtractKind,
        phase: Phase,
    ) -> Result<SendResult, SendError> {
        self.check_cancelled()?;
        self.emit_progress(phase.at(0.0), "Signing in");
        server
            .sign_in(
                &settings.username,
                &settings.password,
                &settings.site_content_url,
            )
            .await?;

        self.check_cancelled()?;
        self.emit_progress(phase.at(0.0), "Resolving project");
        let tree = server.project_tree().await?;
        let project = resolve_project(&tree, &settings.project)?;
        let project_path = tree
            .display_path(&project.id)
            .unwrap_or_else(|| project.name.clone());

        let existing = server
            .find_datasource(&settings.datasource_name, &project.id)
            .await?;
        let flags = publish_flags(
            existing.is_some(),
            settings.overwrite,
            &settings.datasource_name,
            &project_path,
        )?;
        debug!(
            project = %project_path,
            exists = existing.is_some(),
            overwrite = flags.overwrite,
            append = flags.append,
            "publish target resolved"
        );

        self.check_cancelled()?;
        let request = PublishRequest::new(
            &project.id,
            &settings.datasource_name,
            kind.datasource_type(),
            file,
        )
        .with_overwrite(flags.overwrite)
        .with_append(flags.append);
        let datasource = self.publish(server, &request, phase).await?;

        Ok(SendResult {
            datasource,
            project_id: project.id.clone(),
            overwrite: flags.overwrite,
            append: flags.append,
        })
    }

    /// Runs the chunked upload while forwarding its progress as events.
    async fn publish(
        &self,
        server: &dyn TableauServer,
        request: &PublishRequest,
        phase: Phase,
    ) -> Result<Datasource, SendError> {
        let (progress_tx, mut progress_rx) = mpsc::channel::<UploadProgress>(16);

        let upload = async move {
            let result = server.publish(request, &progress_tx, &self.cancel).await;
            drop(progress_tx);
            result
        };
        let forward = async {
            let mut speed = SpeedCalculator::default();
            let mut last_bytes = 0;
            while let Some(p) = progress_rx.recv().await {
                speed.add_sample(p.bytes_sent.saturating_sub(last_bytes));
                last_bytes = p.bytes_sent;
                let remaining = p.total_bytes.saturating_sub(p.bytes_sent);
                let status = upload_status(&p, speed.bytes_per_second(), speed.eta(remaining));
                self.emit_progress(phase.at(p.fraction()), &status);
            }
        };

        let (result, ()) = tokio::join!(upload, forward);
        Ok(result?)
    }

    async fn finish(
        &self,
        settings: &SendSettings,
        outcome: Result<SendResult, SendError>,
    ) -> Result<SendResult, SendError> {
        match &outcome {
            Ok(result) => {
                self.emit_progress(1.0, "Published");
                self.emit_terminal(SendEvent::Completed {
                    datasource_id: result.datasource.id.clone(),
                    name: result.datasource.name.clone(),
                });
                info!(
                    datasource = %settings.datasource_name,
                    id = %result.datasource.id,
                    project_id = %result.project_id,
                    "send completed"
                );
            }
            Err(e) => {
                self.emit_terminal(SendEvent::Failed {
                    error: e.to_string(),
                });
                if e.is_cancelled() {
                    warn!(datasource = %settings.datasource_name, "send cancelled");
                } else {
                    error!(datasource = %settings.datasource_name, error = %e, "send failed");
                }
            }
        }
        outcome
    }

    fn check_cancelled(&self) -> Result<(), SendError> {
        if self.cancel.is_cancelled() {
            Err(SendError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn emit_progress(&self, progress: f64, status: &str) {
        offer_progress(&self.events_tx, progress, status.to_string());
    }

    fn emit_terminal(&self, event: SendEvent) {
        if let Err(TrySendError::Full(_)) = self.events_tx.try_send(event) {
            warn!("event receiver full, terminal event dropped");
        }
    }
}

/// Queues a progress event unless that would take the reserved slot.
fn offer_progress(events: &mpsc::Sender<SendEvent>, progress: f64, status: String) {
    if events.capacity() <= TERMINAL_RESERVE {
        debug!(%status, "event receiver lagging, progress dropped");
        return;
    }
    let _ = events.try_send(SendEvent::Progress { progress, status });
}

/// `Uploading (n/m chunks)`, plus rate and time left once a rate is known.
fn upload_status(p: &UploadProgress, bytes_per_second: f64, eta: Option<Duration>) -> String {
    let chunks = format!("{}/{} chunks", p.chunks_sent, p.total_chunks);
    if bytes_per_second <= 0.0 {
        return format!("Uploading ({chunks})");
    }
    let rate = bytes_per_second / 1_000_000.0;
    match eta {
        Some(eta) => format!("Uploading ({chunks}, {rate:.1} MB/s, {}s left)", eta.as_secs()),
        None => format!("Uploading ({chunks}, {rate:.1} MB/s)"),
    }
}

/// File name for a temporary extract, derived from the datasource name.
fn file_stem(datasource_name: &str) -> String {
    let stem: String = datasource_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        "extract".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectSelector;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use tableau_send_extract::{
        BackendError, EXTRACT_TABLE, ExtractFile, TableDefinition, TableSink, TableauValue,
        ValueType,
    };
    use tableau_send_protocol::{Project, ProjectRef};
    use tableau_send_rest::{Error, ProjectTree};

    type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    #[derive(Default)]
    struct MockServer {
        existing: bool,
        fail_sign_in: bool,
        chunks: u64,
        cancel_on_publish: Option<CancellationToken>,
        calls: Mutex<Vec<String>>,
        published: Mutex<Option<(PublishRequest, Vec<u8>)>>,
    }

    impl MockServer {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    impl TableauServer for MockServer {
        fn sign_in<'a>(
            &'a self,
            username: &'a str,
            _password: &'a str,
            site_content_url: &'a str,
        ) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                self.record(&format!("sign_in {username}@{site_content_url}"));
                if self.fail_sign_in {
                    return Err(Error::NotSignedIn);
                }
                Ok(())
            })
        }

        fn project_tree(&self) -> BoxFuture<'_, Result<ProjectTree, Error>> {
            Box::pin(async move {
                self.record("project_tree");
                ProjectTree::resolve(vec![
                    Project::new("p-1", "Finance", None),
                    Project::new("p-2", "Reports", Some("p-1")),
                ])
            })
        }

        fn find_datasource<'a>(
            &'a self,
            name: &'a str,
            project_id: &'a str,
        ) -> BoxFuture<'a, Result<Option<Datasource>, Error>> {
            Box::pin(async move {
                self.record(&format!("find {name} in {project_id}"));
                Ok(self.existing.then(|| datasource("ds-old", name, project_id)))
            })
        }

        fn publish<'a>(
            &'a self,
            request: &'a PublishRequest,
            progress: &'a mpsc::Sender<UploadProgress>,
            cancel: &'a CancellationToken,
        ) -> BoxFuture<'a, Result<Datasource, Error>> {
            Box::pin(async move {
                self.record("publish");
                let bytes = std::fs::read(&request.file_path).unwrap();
                *self.published.lock().unwrap() = Some((request.clone(), bytes));
                for i in 1..=self.chunks {
                    let _ = progress
                        .send(UploadProgress {
                            chunks_sent: i,
                            total_chunks: self.chunks,
                            bytes_sent: i * 10,
                            total_bytes: self.chunks * 10,
                        })
                        .await;
                    if let Some(token) = &self.cancel_on_publish {
                        token.cancel();
                    }
                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                }
                Ok(datasource("ds-new", &request.datasource_name, &request.project_id))
            })
        }
    }

    fn datasource(id: &str, name: &str, project_id: &str) -> Datasource {
        Datasource {
            id: id.into(),
            name: name.into(),
            datasource_type: Some("hyper".into()),
            project: Some(ProjectRef {
                id: project_id.into(),
                name: None,
            }),
        }
    }

    fn settings(policy: OverwritePolicy) -> SendSettings {
        SendSettings {
            host: "https://tableau.example.com".into(),
            username: "alice".into(),
            password: "pw".into(),
            site_content_url: "marketing".into(),
            project: ProjectSelector::Path("Finance/Reports".into()),
            datasource_name: "Sales".into(),
            overwrite: policy,
        }
    }

    fn extract_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("sales.hyper");
        std::fs::write(&path, b"extract-bytes").unwrap();
        path
    }

    fn drain(rx: &mut mpsc::Receiver<SendEvent>) -> Vec<SendEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn progress_values(events: &[SendEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                SendEvent::Progress { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn send_file_publishes_new_datasource() {
        let dir = tempfile::tempdir().unwrap();
        let file = extract_file(&dir);
        let server = MockServer {
            chunks: 3,
            ..Default::default()
        };
        let mut orch = SendOrchestrator::new();
        let mut rx = orch.take_events().unwrap();

        let result = orch
            .send_file(&server, &settings(OverwritePolicy::Abort), &file, ExtractKind::Hyper)
            .await
            .unwrap();

        assert_eq!(result.datasource.id, "ds-new");
        assert_eq!(result.project_id, "p-2");
        assert!(!result.overwrite && !result.append);
        assert_eq!(
            server.calls(),
            vec!["sign_in alice@marketing", "project_tree", "find Sales in p-2", "publish"]
        );

        let (request, bytes) = server.published.lock().unwrap().clone().unwrap();
        assert_eq!(request.datasource_type, "hyper");
        assert_eq!(request.file_path, file);
        assert_eq!(bytes, b"extract-bytes");

        let events = drain(&mut rx);
        let progress = progress_values(&events);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert_eq!(progress.last(), Some(&1.0));
        assert!(events.iter().any(|e| matches!(
            e,
            SendEvent::Progress { status, .. } if status.starts_with("Uploading (2/3 chunks")
        )));
        assert_eq!(
            events.last(),
            Some(&SendEvent::Completed {
                datasource_id: "ds-new".into(),
                name: "Sales".into()
            })
        );
    }

    #[tokio::test]
    async fn unread_events_do_not_stall_send() {
        let dir = tempfile::tempdir().unwrap();
        let file = extract_file(&dir);
        let server = MockServer {
            chunks: 300,
            ..Default::default()
        };
        let orch = SendOrchestrator::new();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            orch.send_file(&server, &settings(OverwritePolicy::Abort), &file, ExtractKind::Hyper),
        )
        .await
        .expect("send stalled on a full event channel")
        .unwrap();
        assert_eq!(result.datasource.id, "ds-new");
    }

    #[tokio::test]
    async fn lagging_receiver_still_gets_completion() {
        let dir = tempfile::tempdir().unwrap();
        let file = extract_file(&dir);
        let server = MockServer {
            chunks: 300,
            ..Default::default()
        };
        let mut orch = SendOrchestrator::new();
        let mut rx = orch.take_events().unwrap();

        orch.send_file(&server, &settings(OverwritePolicy::Abort), &file, ExtractKind::Hyper)
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), EVENT_CAPACITY);
        assert!(matches!(events.last(), Some(SendEvent::Completed { .. })));
    }

    #[test]
    fn upload_status_adds_rate_once_known() {
        let p = UploadProgress {
            chunks_sent: 2,
            total_chunks: 4,
            bytes_sent: 200_000,
            total_bytes: 400_000,
        };
        assert_eq!(upload_status(&p, 0.0, None), "Uploading (2/4 chunks)");
        assert_eq!(
            upload_status(&p, 1_300_000.0, Some(Duration::from_millis(3_200))),
            "Uploading (2/4 chunks, 1.3 MB/s, 3s left)"
        );
        assert_eq!(
            upload_status(&p, 500_000.0, None),
            "Uploading (2/4 chunks, 0.5 MB/s)"
        );
    }

    #[tokio::test]
    async fn abort_policy_stops_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let file = extract_file(&dir);
        let server = MockServer {
            existing: true,
            ..Default::default()
        };
        let mut orch = SendOrchestrator::new();
        let mut rx = orch.take_events().unwrap();

        let err = orch
            .send_file(&server, &settings(OverwritePolicy::Abort), &file, ExtractKind::Hyper)
            .await
            .unwrap_err();

        match err {
            SendError::DatasourceExists { name, project } => {
                assert_eq!(name, "Sales");
                assert_eq!(project, "Finance/Reports");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!server.calls().contains(&"publish".to_string()));
        assert!(matches!(drain(&mut rx).last(), Some(SendEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn existing_datasource_sets_publish_flags() {
        for (policy, overwrite, append) in [
            (OverwritePolicy::Overwrite, true, false),
            (OverwritePolicy::Append, false, true),
        ] {
            let dir = tempfile::tempdir().unwrap();
            let file = extract_file(&dir);
            let server = MockServer {
                existing: true,
                chunks: 1,
                ..Default::default()
            };
            let orch = SendOrchestrator::new();

            let result = orch
                .send_file(&server, &settings(policy), &file, ExtractKind::Tde)
                .await
                .unwrap();

            assert_eq!((result.overwrite, result.append), (overwrite, append));
            let (request, _) = server.published.lock().unwrap().clone().unwrap();
            assert_eq!((request.overwrite, request.append), (overwrite, append));
            assert_eq!(request.datasource_type, "tde");
        }
    }

    #[tokio::test]
    async fn invalid_settings_touch_nothing() {
        let server = MockServer::default();
        let orch = SendOrchestrator::new();
        let mut s = settings(OverwritePolicy::Abort);
        s.datasource_name.clear();

        let err = orch
            .send_file(&server, &s, Path::new("/nonexistent.hyper"), ExtractKind::Hyper)
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::InvalidSettings(_)));
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn sign_in_failure_is_reported() {
        let server = MockServer {
            fail_sign_in: true,
            ..Default::default()
        };
        let mut orch = SendOrchestrator::new();
        let mut rx = orch.take_events().unwrap();

        let err = orch
            .send_file(
                &server,
                &settings(OverwritePolicy::Abort),
                Path::new("/nonexistent.hyper"),
                ExtractKind::Hyper,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SendError::Rest(Error::NotSignedIn)));
        assert_eq!(server.calls().len(), 1);
        assert!(matches!(drain(&mut rx).last(), Some(SendEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn cancel_before_start() {
        let server = MockServer::default();
        let orch = SendOrchestrator::new();
        orch.cancel_token().cancel();

        let err = orch
            .send_file(
                &server,
                &settings(OverwritePolicy::Abort),
                Path::new("/nonexistent.hyper"),
                ExtractKind::Hyper,
            )
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn cancel_during_upload() {
        let dir = tempfile::tempdir().unwrap();
        let file = extract_file(&dir);
        let orch = SendOrchestrator::new();
        let server = MockServer {
            chunks: 5,
            cancel_on_publish: Some(orch.cancel_token()),
            ..Default::default()
        };

        let err = orch
            .send_file(&server, &settings(OverwritePolicy::Abort), &file, ExtractKind::Hyper)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    /// Backend that writes one line per row into the extract file.
    #[derive(Clone, Default)]
    struct LineBackend {
        rows: Arc<Mutex<Vec<Vec<TableauValue>>>>,
    }

    struct LineFile {
        path: PathBuf,
        backend: LineBackend,
    }

    struct LineSink {
        path: PathBuf,
        backend: LineBackend,
    }

    impl ExtractBackend for LineBackend {
        fn kind(&self) -> ExtractKind {
            ExtractKind::Hyper
        }

        fn initialize(&mut self) -> Result<(), BackendError> {
            Ok(())
        }

        fn cleanup(&mut self) -> Result<(), BackendError> {
            Ok(())
        }

        fn open(&mut self, path: &Path) -> Result<Box<dyn ExtractFile>, BackendError> {
            std::fs::write(path, b"")?;
            Ok(Box::new(LineFile {
                path: path.to_path_buf(),
                backend: self.clone(),
            }))
        }
    }

    impl ExtractFile for LineFile {
        fn has_table(&self, _name: &str) -> Result<bool, BackendError> {
            Ok(false)
        }

        fn create_table(
            &mut self,
            _name: &str,
            _definition: &TableDefinition,
        ) -> Result<Box<dyn TableSink>, BackendError> {
            self.open_table(EXTRACT_TABLE)
        }

        fn open_table(&mut self, _name: &str) -> Result<Box<dyn TableSink>, BackendError> {
            Ok(Box::new(LineSink {
                path: self.path.clone(),
                backend: self.backend.clone(),
            }))
        }

        fn close(self: Box<Self>) -> Result<(), BackendError> {
            Ok(())
        }
    }

    impl TableSink for LineSink {
        fn insert(&mut self, row: &[TableauValue]) -> Result<(), BackendError> {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
            writeln!(file, "{row:?}")?;
            self.backend.rows.lock().unwrap().push(row.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn send_table_writes_then_publishes() {
        let backend = LineBackend::default();
        let writer = Arc::new(ExtractWriter::new(backend.clone()));
        let server = MockServer {
            chunks: 2,
            ..Default::default()
        };
        let mut orch = SendOrchestrator::new();
        let mut rx = orch.take_events().unwrap();
        let schema = vec![
            ColumnSpec::new("region", ValueType::String),
            ColumnSpec::new("amount", ValueType::Double),
        ];
        let rows: Vec<Vec<Cell>> = (0..4)
            .map(|i| vec![Cell::String(format!("r{i}")), Cell::Double(f64::from(i))])
            .collect();

        let result = orch
            .send_table(&server, writer, &settings(OverwritePolicy::Abort), schema, rows)
            .await
            .unwrap();

        assert_eq!(result.datasource.name, "Sales");
        assert_eq!(backend.rows.lock().unwrap().len(), 4);

        let (request, bytes) = server.published.lock().unwrap().clone().unwrap();
        assert_eq!(request.datasource_type, "hyper");
        assert_eq!(request.file_path.file_name().unwrap(), "Sales.hyper");
        assert_eq!(String::from_utf8(bytes).unwrap().lines().count(), 4);
        assert!(!request.file_path.exists(), "temporary extract is removed");

        let events = drain(&mut rx);
        let progress = progress_values(&events);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
        assert!(events.iter().any(|e| matches!(
            e,
            SendEvent::Progress { progress, status } if *progress == 0.5 && status.starts_with("Writing")
        )));
        assert!(matches!(events.last(), Some(SendEvent::Completed { .. })));
    }

    #[tokio::test]
    async fn send_table_with_no_rows() {
        let writer = Arc::new(ExtractWriter::new(LineBackend::default()));
        let server = MockServer::default();
        let orch = SendOrchestrator::new();

        let result = orch
            .send_table(
                &server,
                writer,
                &settings(OverwritePolicy::Abort),
                vec![ColumnSpec::new("id", ValueType::Integer)],
                Vec::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.datasource.id, "ds-new");
        let (_, bytes) = server.published.lock().unwrap().clone().unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn temp_file_names() {
        assert_eq!(file_stem("Sales Q1"), "Sales Q1");
        assert_eq!(file_stem("a/b:c"), "a_b_c");
        assert_eq!(file_stem("  "), "extract");
        assert_eq!(file_stem(".."), "extract");
    }

    #[test]
    fn phases_split_progress() {
        assert_eq!(Phase::WRITE.at(1.0), 0.5);
        assert_eq!(Phase::UPLOAD_AFTER_WRITE.at(0.0), 0.5);
        assert_eq!(Phase::UPLOAD_AFTER_WRITE.at(0.5), 0.75);
        assert_eq!(Phase::UPLOAD_ONLY.at(2.0), 1.0);
    }
}
