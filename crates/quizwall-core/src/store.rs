//! Client-resident progress persistence.
//!
//! [`ProgressStore`] owns the single progress document for a course, kept in
//! a key/value [`StorageBackend`] under a fixed key. Every logical mutation is
//! load → mutate → save with no suspension point in between, so no locking is
//! needed on a single-learner device.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ImportValidationError, StoreError};
use crate::progress::{AttemptRecord, ModuleRecord, Progress, ENGINE_VERSION};
use crate::time::{Clock, SystemClock};

/// Key/value persistence for serialized documents.
pub trait StorageBackend: Send + Sync {
    /// Read the value under `key`, or `None` if absent.
    fn read(&self, key: &str) -> std::io::Result<Option<String>>;

    /// Replace the value under `key`. Readers must never see a partial write.
    fn write(&self, key: &str, value: &str) -> std::io::Result<()>;

    /// Delete `key`; deleting a missing key succeeds.
    fn remove(&self, key: &str) -> std::io::Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> std::io::Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, value: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        // Write beside the target, then rename over it.
        let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
        if let Err(e) = std::fs::write(&tmp, value) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        std::fs::rename(&tmp, self.path_for(key)).inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp);
        })
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Process-local storage for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> std::io::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Identity of the course a store belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreIdentity {
    /// Course identifier written into every store and export.
    pub course: String,
    /// Version written into freshly created stores.
    pub version: String,
    /// Backend key holding the progress document.
    pub storage_key: String,
}

impl StoreIdentity {
    /// Identity with the conventional `<COURSE>_PROGRESS_V1` key.
    pub fn for_course(course: &str) -> Self {
        Self {
            course: course.to_string(),
            version: ENGINE_VERSION.to_string(),
            storage_key: default_storage_key(course),
        }
    }
}

/// `<COURSE>_PROGRESS_V1`.
pub fn default_storage_key(course: &str) -> String {
    format!("{}_PROGRESS_V1", course.to_uppercase())
}

/// `<course>-progress-export.json`.
pub fn progress_export_filename(course: &str) -> String {
    format!("{course}-progress-export.json")
}

/// `<course>-module-<id>-export.json`.
pub fn module_export_filename(course: &str, module_id: &str) -> String {
    format!("{course}-module-{module_id}-export.json")
}

/// `<course>-final-export.json`.
pub fn final_export_filename(course: &str) -> String {
    format!("{course}-final-export.json")
}

/// One module's record paired with its course and module identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleExport {
    pub course: String,
    pub module_id: String,
    pub module: Option<ModuleRecord>,
}

/// What happened to an import request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The snapshot replaced the stored progress.
    Imported { modules: usize },
    /// The snapshot belonged to another course and the caller declined it.
    Declined { course: String },
}

/// The progress store for one course.
#[derive(Clone)]
pub struct ProgressStore {
    backend: Arc<dyn StorageBackend>,
    identity: StoreIdentity,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(backend: Arc<dyn StorageBackend>, identity: StoreIdentity) -> Self {
        Self {
            backend,
            identity,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for `createdAt`/`updatedAt` stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn identity(&self) -> &StoreIdentity {
        &self.identity
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn key(&self) -> &str {
        &self.identity.storage_key
    }

    fn fresh(&self) -> Progress {
        Progress::new(
            &self.identity.course,
            &self.identity.version,
            self.clock.now(),
        )
    }

    /// Load the stored progress.
    ///
    /// Never fails: a missing, unreadable, or corrupt document yields a fresh
    /// empty store so a bad record cannot block the learner.
    pub fn load(&self) -> Progress {
        let raw = match self.backend.read(self.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.fresh(),
            Err(e) => {
                tracing::warn!("progress store unreadable, starting fresh: {e}");
                return self.fresh();
            }
        };

        match serde_json::from_str::<Progress>(&raw) {
            Ok(mut progress) => {
                repair_logged(&mut progress, "stored progress");
                progress
            }
            Err(e) => {
                tracing::warn!("progress store corrupt, starting fresh: {e}");
                self.fresh()
            }
        }
    }

    /// Stamp `updatedAt` and persist the whole document.
    pub fn save(&self, progress: &mut Progress) -> Result<(), StoreError> {
        progress.touch(self.clock.now());
        let json = serde_json::to_string(progress)?;
        self.backend
            .write(self.key(), &json)
            .map_err(|e| StoreError::io(self.key(), e))
    }

    /// Erase all persisted progress for the course.
    pub fn reset_all(&self) -> Result<(), StoreError> {
        self.backend
            .remove(self.key())
            .map_err(|e| StoreError::io(self.key(), e))?;
        tracing::info!(course = %self.identity.course, "progress reset");
        Ok(())
    }

    /// Delete one module's record, leaving the rest untouched.
    pub fn reset_module(&self, module_id: &str) -> Result<(), StoreError> {
        let mut progress = self.load();
        progress.modules.remove(module_id);
        self.save(&mut progress)?;
        tracing::info!(module_id, "module progress reset");
        Ok(())
    }

    /// Apply a finished attempt to `progress` and persist it.
    ///
    /// This is the only path by which attempts enter the store.
    pub fn record_attempt(
        &self,
        progress: &mut Progress,
        module_id: &str,
        record: AttemptRecord,
        mastery_pct: u8,
    ) -> Result<(), StoreError> {
        let score_pct = record.score_pct;
        progress.record_attempt(module_id, record, mastery_pct);
        self.save(progress)?;
        if let Some(module) = progress.module(module_id) {
            tracing::info!(
                module_id,
                score_pct,
                attempts = module.attempts,
                completed = module.completed,
                "attempt recorded"
            );
        }
        Ok(())
    }

    /// Pretty JSON of the whole stored document.
    pub fn export_snapshot(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.load())?)
    }

    /// Pretty JSON of one module's record with course/module identifiers.
    pub fn export_module(&self, module_id: &str) -> Result<String, StoreError> {
        let progress = self.load();
        let export = ModuleExport {
            course: self.identity.course.clone(),
            module_id: module_id.to_string(),
            module: progress.module(module_id).cloned(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Replace the stored document with an exported snapshot.
    ///
    /// The text must be a JSON object shaped like a progress store; a missing
    /// `modules` field is treated as empty. If the snapshot names a different
    /// course, `confirm_foreign` is asked (with that course) whether to go
    /// ahead; declining leaves the store untouched.
    pub fn import_snapshot(
        &self,
        text: &str,
        confirm_foreign: impl FnOnce(&str) -> bool,
    ) -> Result<ImportOutcome, ImportValidationError> {
        let mut progress = parse_snapshot(text)?;

        if !progress.course.is_empty() && progress.course != self.identity.course {
            if !confirm_foreign(&progress.course) {
                tracing::info!(course = %progress.course, "foreign import declined");
                return Ok(ImportOutcome::Declined {
                    course: progress.course,
                });
            }
            tracing::warn!(
                "importing progress for course {} into {}",
                progress.course,
                self.identity.course
            );
        }

        repair_logged(&mut progress, "imported progress");

        // A consistent export is stored verbatim and reproduces exactly.
        let json = serde_json::to_string(&progress).map_err(StoreError::from)?;
        self.backend
            .write(self.key(), &json)
            .map_err(|e| StoreError::io(self.key(), e))?;

        let modules = progress.modules.len();
        tracing::info!(modules, "progress imported");
        Ok(ImportOutcome::Imported { modules })
    }

    /// Timestamp of the last save, if anything is stored.
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.backend.read(self.key()).ok()??;
        serde_json::from_str::<Progress>(&raw)
            .ok()
            .map(|p| p.updated_at)
    }
}

/// Log every broken invariant in `progress`, then repair it.
fn repair_logged(progress: &mut Progress, context: &str) {
    let violations = progress.audit();
    for violation in &violations {
        tracing::warn!("{context}: {violation}");
    }
    if progress.repair() {
        tracing::info!(
            violations = violations.len(),
            "{context}: derived fields rebuilt"
        );
    }
}

/// Structurally validate an exported snapshot.
pub fn parse_snapshot(text: &str) -> Result<Progress, ImportValidationError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ImportValidationError::InvalidJson(e.to_string()))?;

    let kind = match &value {
        serde_json::Value::Object(_) => None,
        serde_json::Value::Null => Some("null"),
        serde_json::Value::Bool(_) => Some("a boolean"),
        serde_json::Value::Number(_) => Some("a number"),
        serde_json::Value::String(_) => Some("a string"),
        serde_json::Value::Array(_) => Some("an array"),
    };
    if let Some(kind) = kind {
        return Err(ImportValidationError::NotAnObject(kind));
    }

    serde_json::from_value(value).map_err(|e| ImportValidationError::Shape(e.to_string()))
}
