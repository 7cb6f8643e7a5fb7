//! Conversion session.
//!
//! Drives one file through `select → convert → save`:
//!
//! ```text
//! NoFileSelected ──select──▶ FileSelected ──convert──▶ Converting
//!       ▲                         ▲                       │
//!       │                         └──────── failure ──────┤
//!     reset                                               ▼
//!  (any state)          Saved ◀──────save────────── Completed
//! ```
//!
//! `convert` hands the parse to a blocking worker and returns at once; the
//! outcome arrives as a [`Status`] change plus a [`Notice`]. The verse data
//! is only touched by the worker until it hands back a finished [`Corpus`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::error::{TanzilError, TanzilResult};
use crate::parser;
use crate::transpiler::{SaveMode, TableSchema, ToSql, output_file_name};
use crate::verse::Corpus;

/// Where the session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoFileSelected,
    FileSelected,
    Converting,
    Completed,
    Saved,
}

impl Status {
    pub fn name(self) -> &'static str {
        match self {
            Status::NoFileSelected => "no file selected",
            Status::FileSelected => "file selected",
            Status::Converting => "converting",
            Status::Completed => "completed",
            Status::Saved => "saved",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw XML content plus the name shown to the user.
#[derive(Debug, Clone)]
pub struct XmlSource {
    name: String,
    content: Arc<[u8]>,
}

impl XmlSource {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let content: Vec<u8> = content.into();
        Self {
            name: name.into(),
            content: Arc::from(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    fn check(&self) -> TanzilResult<()> {
        if self.content.is_empty() {
            return Err(TanzilError::input(format!("{} is empty", self.name)));
        }
        std::str::from_utf8(&self.content).map_err(|e| {
            TanzilError::input(format!("{} is not valid UTF-8 text: {}", self.name, e))
        })?;
        Ok(())
    }
}

/// Completion signals for the presentation layer.
#[derive(Debug, Clone)]
pub enum Notice {
    /// Conversion finished; counts without and with Bismillah verses.
    Completed { raw: usize, total: usize },
    /// A script was written.
    Saved(PathBuf),
    /// A background conversion failed; the session is back at `FileSelected`.
    Failed(Arc<TanzilError>),
}

/// Receiving ends handed out by [`Session::new`].
pub struct SessionEvents {
    pub status: watch::Receiver<Status>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

#[derive(Debug, Default)]
struct SessionData {
    source: Option<XmlSource>,
    corpus: Option<Arc<Corpus>>,
    saved_to: Option<PathBuf>,
    // Bumped on every convert and reset so stale results are dropped.
    run: u64,
}

impl SessionData {
    fn clear(&mut self) {
        self.source = None;
        self.corpus = None;
        self.saved_to = None;
        self.run += 1;
    }
}

struct Shared {
    data: Mutex<SessionData>,
    status: watch::Sender<Status>,
    notices: mpsc::UnboundedSender<Notice>,
}

/// Handle to a conversion session. Clones share the same session.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    pub fn new() -> (Self, SessionEvents) {
        let (status_tx, status_rx) = watch::channel(Status::NoFileSelected);
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let session = Self {
            shared: Arc::new(Shared {
                data: Mutex::new(SessionData::default()),
                status: status_tx,
                notices: notice_tx,
            }),
        };
        let events = SessionEvents {
            status: status_rx,
            notices: notice_rx,
        };
        (session, events)
    }

    pub fn status(&self) -> Status {
        *self.shared.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.shared.status.subscribe()
    }

    /// Display name of the selected file.
    pub async fn source_name(&self) -> Option<String> {
        let data = self.shared.data.lock().await;
        data.source.as_ref().map(|s| s.name().to_string())
    }

    /// The converted corpus, once `Completed`.
    pub async fn corpus(&self) -> Option<Arc<Corpus>> {
        self.shared.data.lock().await.corpus.clone()
    }

    /// Path of the last script written.
    pub async fn saved_to(&self) -> Option<PathBuf> {
        self.shared.data.lock().await.saved_to.clone()
    }

    /// Read an XML file from disk and select it.
    pub async fn select_file(&self, path: impl AsRef<Path>) -> TanzilResult<()> {
        let path = path.as_ref();
        self.ensure_not_converting("select a file")?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read(path).await {
            Ok(content) => self.select_source(XmlSource::new(name, content)).await,
            Err(e) => {
                let mut data = self.shared.data.lock().await;
                data.clear();
                self.set_status(Status::NoFileSelected);
                Err(TanzilError::input(format!(
                    "Failed to read selected XML file's content ({}): {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    /// Select in-memory XML content, discarding any earlier conversion.
    pub async fn select_source(&self, source: XmlSource) -> TanzilResult<()> {
        let mut data = self.shared.data.lock().await;
        self.ensure_not_converting("select a file")?;

        data.clear();
        if let Err(err) = source.check() {
            self.set_status(Status::NoFileSelected);
            return Err(err);
        }

        tracing::debug!(
            "Selected {} ({} bytes)",
            source.name(),
            source.as_bytes().len()
        );
        data.source = Some(source);
        self.set_status(Status::FileSelected);
        Ok(())
    }

    /// Start converting the selected file in the background.
    ///
    /// Returns as soon as the worker is spawned. Await the handle, or watch
    /// [`Session::subscribe`], to learn the outcome.
    pub async fn convert(&self) -> TanzilResult<JoinHandle<()>> {
        let mut data = self.shared.data.lock().await;
        self.ensure_status(&[Status::FileSelected], "convert")?;

        let content = data
            .source
            .as_ref()
            .map(|s| Arc::clone(&s.content))
            .ok_or_else(|| TanzilError::input("File content wasn't set correctly!"))?;

        data.run += 1;
        let run = data.run;
        self.set_status(Status::Converting);
        drop(data);

        let session = self.clone();
        Ok(tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || parser::parse(&content).map(Corpus::assemble))
                    .await;
            session.finish_conversion(run, outcome).await;
        }))
    }

    async fn finish_conversion(&self, run: u64, outcome: Result<TanzilResult<Corpus>, JoinError>) {
        let outcome = outcome.unwrap_or_else(|e| Err(TanzilError::Task(e.to_string())));

        let mut data = self.shared.data.lock().await;
        if data.run != run || self.status() != Status::Converting {
            tracing::debug!("Discarding result of superseded conversion run {}", run);
            return;
        }

        match outcome {
            Ok(corpus) => {
                let raw = corpus.raw_count();
                let total = corpus.len();
                tracing::info!("Conversion completed: {} verses, {} with Bismillah", raw, total);
                data.corpus = Some(Arc::new(corpus));
                self.set_status(Status::Completed);
                self.notify(Notice::Completed { raw, total });
            }
            Err(err) => {
                tracing::warn!("Conversion failed: {}", err);
                self.set_status(Status::FileSelected);
                self.notify(Notice::Failed(Arc::new(err)));
            }
        }
    }

    /// Render the corpus and write `<table>-<mode>-sqlite.sql` into `dir`.
    ///
    /// A failed write drops back to `Completed`; the corpus is kept.
    pub async fn save(
        &self,
        mode: SaveMode,
        schema: &TableSchema,
        dir: impl AsRef<Path>,
    ) -> TanzilResult<PathBuf> {
        let (corpus, run) = {
            let data = self.shared.data.lock().await;
            self.ensure_status(&[Status::Completed, Status::Saved], "save")?;
            let corpus = data.corpus.clone().ok_or(TanzilError::InvalidState {
                state: self.status().name(),
                action: "save",
            })?;
            (corpus, data.run)
        };

        let path = dir.as_ref().join(output_file_name(schema, mode));
        let render_schema = schema.clone();
        let sql = tokio::task::spawn_blocking(move || corpus.to_sql(&render_schema, mode))
            .await
            .map_err(|e| TanzilError::Task(e.to_string()))?;

        if let Err(source) = write_atomic(&path, sql.as_bytes()).await {
            tracing::warn!("Failed to write {}: {}", path.display(), source);
            let mut data = self.shared.data.lock().await;
            if data.run == run {
                data.saved_to = None;
                self.set_status(Status::Completed);
            }
            return Err(TanzilError::Write { path, source });
        }
        tracing::info!("Wrote {} ({} bytes)", path.display(), sql.len());

        let mut data = self.shared.data.lock().await;
        if data.run == run {
            data.saved_to = Some(path.clone());
            self.set_status(Status::Saved);
            self.notify(Notice::Saved(path.clone()));
        }
        Ok(path)
    }

    /// Drop the selected file and any converted data.
    ///
    /// A conversion still running finishes, but its result is ignored.
    pub async fn reset(&self) {
        let mut data = self.shared.data.lock().await;
        data.clear();
        self.set_status(Status::NoFileSelected);
    }

    fn set_status(&self, status: Status) {
        let previous = self.shared.status.send_replace(status);
        if previous != status {
            tracing::debug!("Session: {} -> {}", previous, status);
        }
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine.
        let _ = self.shared.notices.send(notice);
    }

    fn ensure_status(&self, allowed: &[Status], action: &'static str) -> TanzilResult<()> {
        let status = self.status();
        if allowed.contains(&status) {
            Ok(())
        } else {
            Err(TanzilError::InvalidState {
                state: status.name(),
                action,
            })
        }
    }

    fn ensure_not_converting(&self, action: &'static str) -> TanzilResult<()> {
        if self.status() == Status::Converting {
            return Err(TanzilError::InvalidState {
                state: Status::Converting.name(),
                action,
            });
        }
        Ok(())
    }
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("sql.tmp");
    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
