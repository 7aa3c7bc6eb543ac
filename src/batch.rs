//! Batch pipeline: work items, status tracking, and the sequential run loop.
//!
//! A [`BatchSession`] owns the ordered collection of [`WorkItem`]s, the
//! aggregate [`BatchRun`] state, and the [`ResourceRegistry`] holding every
//! source and artifact binary. Front ends interact with it through four
//! operations:
//!
//! ```text
//! add_files   → append pending items (sources registered, ids issued)
//! run         → crop eligible items one at a time, publishing BatchEvents
//! package     → hand done items to the archive packager
//! clear_all   → release every handle and empty the collection
//! ```
//!
//! ## Item State Machine
//!
//! ```text
//! pending ──► processing ──► done
//!                       └──► error ──(reset_failed)──► pending
//! ```
//!
//! `done` items are never processed again, so re-running a finished batch is
//! a no-op. Whether `error` items are retried on the next run is decided by
//! [`ErrorPolicy`].
//!
//! ## Progress
//!
//! The denominator is the number of eligible items at run start and is not
//! recomputed mid-run. Progress is published once per settled item, so a run
//! over N eligible items emits exactly N [`BatchEvent::ItemFinished`] events
//! with non-decreasing progress ending at 100.
//!
//! "Eligible" follows the [`ErrorPolicy`]. Under the default `Skip`, only
//! `pending` items count, so a batch with earlier failures reaches 100% without
//! touching them. Under `Retry` the denominator is every item that is not
//! `done`. A front end that wants "finished out of everything" should read
//! [`BatchSession::count`] instead of `progress`.
//!
//! If a backend panics mid-item, the run flag is still cleared and the item
//! in flight returns to `pending`, so the session stays usable.
//!
//! ## Concurrency
//!
//! Items are processed strictly in collection order and never overlap: the
//! next item is not started until the previous one settles. Mutation requires
//! `&mut BatchSession`, so ingestion and clearing cannot interleave with a
//! run. Events go out over an `mpsc` channel so a printer or UI thread can
//! render them while the run continues.

use crate::archive::{self, Archive, ArchiveError};
use crate::config::ArchiveConfig;
use crate::imaging::{CropError, CropSettings, ImageBackend, RustBackend, crop_to_target};
use crate::resources::{Handle, ResourceRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("a batch run is in progress")]
    Busy,
}

/// A per-item crop failure, tagged with the item it belongs to.
#[derive(Error, Debug)]
#[error("failed to crop {name} ({id}): {source}")]
pub struct ProcessingError {
    pub id: Uuid,
    pub name: String,
    pub source: CropError,
}

/// Raw input supplied by the collaborator.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original filename, preserved verbatim into the archive.
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl ItemStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// What a run does with items that failed in an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Leave `error` items alone until [`BatchSession::reset_failed`].
    #[default]
    Skip,
    /// Treat every item that is not `done` as eligible.
    Retry,
}

/// One image's tracked unit of work.
///
/// Fields are read-only outside this module so the artifact/status invariant
/// holds: `artifact` is `Some` exactly when `status` is `Done`, and `failure`
/// is `Some` exactly when `status` is `Error`.
#[derive(Debug, Clone)]
pub struct WorkItem {
    id: Uuid,
    name: String,
    source: Handle,
    artifact: Option<Handle>,
    status: ItemStatus,
    failure: Option<String>,
}

impl WorkItem {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Handle {
        self.source
    }

    pub fn artifact(&self) -> Option<Handle> {
        self.artifact
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn is_eligible(&self, policy: ErrorPolicy) -> bool {
        match policy {
            ErrorPolicy::Skip => self.status == ItemStatus::Pending,
            ErrorPolicy::Retry => self.status != ItemStatus::Done,
        }
    }
}

/// Aggregate state of the current (or last) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchRun {
    pub is_running: bool,
    /// 0..=100 over the items eligible at run start.
    pub progress: u8,
}

/// How one item settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Done { bytes: usize },
    Failed { reason: String },
}

/// Totals for one call to [`BatchSession::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    /// Items eligible at run start.
    pub total: usize,
    pub done: usize,
    pub failed: usize,
    /// Items not eligible at run start (already done, or failed under `Skip`).
    pub skipped: usize,
    pub cancelled: bool,
}

/// State changes published during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// The item moved to `processing`.
    ItemStarted {
        position: usize,
        total: usize,
        id: Uuid,
        name: String,
    },
    /// The item settled and progress was recomputed.
    ItemFinished {
        position: usize,
        total: usize,
        id: Uuid,
        name: String,
        outcome: ItemOutcome,
        progress: u8,
    },
    /// The run ended (`is_running` is now false).
    Finished(RunSummary),
}

/// Read-only view of one item, without binary payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: Uuid,
    pub name: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub source: Handle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Handle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_bytes: Option<usize>,
}

/// Everything a renderer needs: item list plus run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub items: Vec<ItemView>,
    pub run: BatchRun,
}

/// Cooperative cancellation, checked between items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub crop: CropSettings,
    pub on_error: ErrorPolicy,
}

/// Rounded percentage, halves rounding up.
fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((200 * completed + total) / (2 * total)).min(100) as u8
}

fn publish(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A closed receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}

/// Marks a run in progress for as long as it lives.
///
/// Dropping it clears the flag even when a backend panics mid-item, so the
/// session never stays `Busy`. An item caught in `processing` goes back to
/// `pending`.
struct RunGuard<'a>(&'a mut BatchSession);

impl<'a> RunGuard<'a> {
    fn start(session: &'a mut BatchSession) -> Self {
        session.run = BatchRun {
            is_running: true,
            progress: 0,
        };
        Self(session)
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.run.is_running = false;
        for item in self
            .0
            .items
            .iter_mut()
            .filter(|item| item.status == ItemStatus::Processing)
        {
            warn!(id = %item.id, name = %item.name, "run aborted mid-item, back to pending");
            item.status = ItemStatus::Pending;
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchSession {
    items: Vec<WorkItem>,
    run: BatchRun,
    resources: ResourceRegistry,
    config: SessionConfig,
}

impl BatchSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.config.on_error = policy;
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn item(&self, id: Uuid) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn batch_run(&self) -> BatchRun {
        self.run
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }

    /// Items the next run would process under the current policy.
    pub fn eligible_count(&self) -> usize {
        let policy = self.config.on_error;
        self.items.iter().filter(|item| item.is_eligible(policy)).count()
    }

    /// Bytes of the produced artifact for `id`, if it is done.
    pub fn artifact_bytes(&self, id: Uuid) -> Option<Arc<[u8]>> {
        self.item(id)
            .and_then(|item| item.artifact)
            .and_then(|handle| self.resources.resolve(handle))
    }

    pub fn snapshot(&self) -> Snapshot {
        let items = self
            .items
            .iter()
            .map(|item| ItemView {
                id: item.id,
                name: item.name.clone(),
                status: item.status,
                failure: item.failure.clone(),
                source: item.source,
                artifact: item.artifact,
                artifact_bytes: item.artifact.and_then(|h| self.resources.len_of(h)),
            })
            .collect();
        Snapshot {
            items,
            run: self.run,
        }
    }

    /// Append `files` as pending items, in order. Returns the new ids.
    pub fn add_files(&mut self, files: Vec<SourceFile>) -> Result<Vec<Uuid>, SessionError> {
        if self.run.is_running {
            return Err(SessionError::Busy);
        }

        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            let id = Uuid::new_v4();
            let source = self.resources.register(file.bytes);
            debug!(%id, name = %file.name, %source, "queued");
            self.items.push(WorkItem {
                id,
                name: file.name,
                source,
                artifact: None,
                status: ItemStatus::Pending,
                failure: None,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Move every `error` item back to `pending`. Returns how many moved.
    pub fn reset_failed(&mut self) -> Result<usize, SessionError> {
        if self.run.is_running {
            return Err(SessionError::Busy);
        }

        let mut reset = 0;
        for item in self.items.iter_mut().filter(|i| i.status == ItemStatus::Error) {
            item.status = ItemStatus::Pending;
            item.failure = None;
            reset += 1;
        }
        Ok(reset)
    }

    /// Release every source and artifact handle and empty the collection.
    ///
    /// Returns the number of items removed.
    pub fn clear_all(&mut self) -> Result<usize, SessionError> {
        if self.run.is_running {
            return Err(SessionError::Busy);
        }

        let removed = self.items.len();
        for item in self.items.drain(..) {
            self.resources.release(item.source);
            if let Some(artifact) = item.artifact {
                self.resources.release(artifact);
            }
        }
        debug_assert_eq!(
            self.resources.live_count(),
            0,
            "every handle belongs to exactly one item"
        );
        self.run = BatchRun::default();
        info!(removed, "cleared all items");
        Ok(removed)
    }

    /// Run the batch with the built-in backend.
    pub fn run(&mut self, events: Option<Sender<BatchEvent>>) -> Result<RunSummary, SessionError> {
        self.run_with_cancel(events, &CancelToken::new())
    }

    /// Run the batch with the built-in backend, stopping early if `cancel`
    /// fires.
    pub fn run_with_cancel(
        &mut self,
        events: Option<Sender<BatchEvent>>,
        cancel: &CancelToken,
    ) -> Result<RunSummary, SessionError> {
        self.run_with_backend(&RustBackend::new(), events, cancel)
    }

    /// Run the batch with a specific backend (allows testing with mock).
    ///
    /// Eligible items are cropped one at a time in collection order. A failed
    /// item is marked `error` and the run moves on. The cancel token is
    /// checked before each item; remaining items stay `pending` on cancel.
    pub fn run_with_backend(
        &mut self,
        backend: &impl ImageBackend,
        events: Option<Sender<BatchEvent>>,
        cancel: &CancelToken,
    ) -> Result<RunSummary, SessionError> {
        if self.run.is_running {
            return Err(SessionError::Busy);
        }

        let policy = self.config.on_error;
        let eligible: Vec<usize> = (0..self.items.len())
            .filter(|&i| self.items[i].is_eligible(policy))
            .collect();
        let total = eligible.len();
        let mut summary = RunSummary {
            total,
            skipped: self.items.len() - total,
            ..RunSummary::default()
        };

        if total == 0 {
            debug!(skipped = summary.skipped, "nothing to process");
            return Ok(summary);
        }

        info!(total, skipped = summary.skipped, "starting batch run");
        let mut guard = RunGuard::start(self);
        let session = &mut *guard.0;

        for (n, &index) in eligible.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(remaining = total - n, "batch run cancelled");
                summary.cancelled = true;
                break;
            }
            let position = n + 1;

            let item = &mut session.items[index];
            item.status = ItemStatus::Processing;
            item.failure = None;
            let (id, name) = (item.id, item.name.clone());
            publish(
                &events,
                BatchEvent::ItemStarted {
                    position,
                    total,
                    id,
                    name: name.clone(),
                },
            );

            let result = match session.resources.resolve(item.source) {
                Some(source) => crop_to_target(backend, &source, &session.config.crop),
                None => Err(CropError::Decode("source has been released".to_string())),
            };

            let outcome = match result {
                Ok(artifact) => {
                    let bytes = artifact.len();
                    let handle = session.resources.register(artifact);
                    let item = &mut session.items[index];
                    item.artifact = Some(handle);
                    item.status = ItemStatus::Done;
                    summary.done += 1;
                    debug!(%id, %name, bytes, "cropped");
                    ItemOutcome::Done { bytes }
                }
                Err(source) => {
                    let error = ProcessingError {
                        id,
                        name: name.clone(),
                        source,
                    };
                    warn!(%id, %name, cause = %error.source, "{error}");
                    let reason = error.source.to_string();
                    let item = &mut session.items[index];
                    item.status = ItemStatus::Error;
                    item.failure = Some(reason.clone());
                    summary.failed += 1;
                    ItemOutcome::Failed { reason }
                }
            };

            session.run.progress = progress_percent(position, total);
            publish(
                &events,
                BatchEvent::ItemFinished {
                    position,
                    total,
                    id,
                    name,
                    outcome,
                    progress: session.run.progress,
                },
            );
        }

        drop(guard);
        info!(
            done = summary.done,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "batch run finished"
        );
        publish(&events, BatchEvent::Finished(summary));
        Ok(summary)
    }

    /// Package every `done` item into one archive.
    pub fn package(&self, config: &ArchiveConfig) -> Result<Archive, ArchiveError> {
        archive::package(&self.items, &self.resources, config)
    }
}
