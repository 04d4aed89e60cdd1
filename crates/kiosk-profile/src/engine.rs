//! The profile engine: committed state, staged overlay and working view

use std::fmt;
use std::sync::Arc;

use kiosk_diff::Diff;
use kiosk_errors::{KioskError, Result, ValidationError};
use kiosk_profile_repository::{
    Commit, CommitId, HistoryEntry, JsonFileLoader, ProfileLoader, ProfileRepository,
};
use kiosk_schemas::{Profile, ProfilePatch, ProfileValidator, now_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, HistoryConfig};
use crate::history::HistoryManager;

/// Engine lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Not yet initialized, or destroyed
    #[default]
    Uninitialized,
    /// `initialize` is running
    Initializing,
    /// Accepting calls
    Ready,
    /// Initialization failed
    Error,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Uninitialized => write!(f, "uninitialized"),
            EngineStatus::Initializing => write!(f, "initializing"),
            EngineStatus::Ready => write!(f, "ready"),
            EngineStatus::Error => write!(f, "error"),
        }
    }
}

/// Where the initial document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Stored,
    History,
    Loader,
}

impl Source {
    fn describe(self) -> &'static str {
        match self {
            Source::Stored => "stored snapshot",
            Source::History => "commit history",
            Source::Loader => "profile source",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct EngineState {
    pub(crate) current: Profile,
    pub(crate) working: Profile,
    pub(crate) staged: Option<ProfilePatch>,
}

impl EngineState {
    fn new(profile: Profile) -> Self {
        Self {
            current: profile.clone(),
            working: profile,
            staged: None,
        }
    }

    /// Install a new overlay. An overlay that changes nothing is dropped.
    fn stage(&mut self, staged: ProfilePatch, working: Profile) {
        if working == self.current {
            self.staged = None;
            self.working = self.current.clone();
        } else {
            self.staged = Some(staged);
            self.working = working;
        }
    }

    fn reset(&mut self, profile: Profile) {
        *self = Self::new(profile);
    }
}

fn ready_mut(status: EngineStatus, state: &mut Option<EngineState>) -> Result<&mut EngineState> {
    match (status, state.as_mut()) {
        (EngineStatus::Ready, Some(state)) => Ok(state),
        _ => Err(KioskError::not_ready(status)),
    }
}

fn accept(validator: &mut ProfileValidator, profile: &Profile, source: Source) -> bool {
    if validator.validate_profile(profile) {
        return true;
    }
    warn!(
        source = source.describe(),
        issues = validator.errors().len(),
        "Ignoring invalid profile candidate"
    );
    false
}

/// Fully validate an untyped document and decode it.
fn decode(validator: &mut ProfileValidator, document: Value) -> Result<Profile> {
    validator.check(&document)?;
    serde_json::from_value(document)
        .map_err(|e| ValidationError::single("", e.to_string()).into())
}

/// Store `next` in the snapshot slot, then append `commit`.
///
/// If the commit cannot be stored the slot is put back to `previous`, so a
/// restart never sees a snapshot that history does not end at.
async fn persist(
    history: &HistoryManager,
    commit: &Commit,
    next: &Profile,
    previous: &Profile,
) -> Result<()> {
    let repository = history.repository();
    repository.save_profile(next).await?;
    if let Err(e) = history.append(commit).await {
        if let Err(restore) = repository.save_profile(previous).await {
            error!(commit_id = %commit.id, error = %restore, "Failed to restore profile snapshot");
        }
        return Err(e);
    }
    Ok(())
}

/// Versioned kiosk profile with staging, commit and rollback.
///
/// All mutating operations take `&mut self`; reads borrow the engine state
/// and never touch storage.
#[derive(Debug)]
pub struct ProfileEngine {
    status: EngineStatus,
    history: HistoryManager,
    validator: ProfileValidator,
    default_author: Option<String>,
    state: Option<EngineState>,
}

impl ProfileEngine {
    /// Create an engine over `repository`. Call [`initialize`](Self::initialize)
    /// before use.
    pub fn new(repository: ProfileRepository, history: HistoryConfig) -> Self {
        Self {
            status: EngineStatus::Uninitialized,
            history: HistoryManager::new(repository, history),
            validator: ProfileValidator::new(),
            default_author: None,
            state: None,
        }
    }

    /// Create an engine from configuration, loading the canonical profile
    /// from `config.source` when one is set.
    pub async fn from_config(config: &EngineConfig) -> Self {
        let loader = config
            .source
            .as_ref()
            .map(|path| Arc::new(JsonFileLoader::new(path)) as Arc<dyn ProfileLoader>);
        Self::with_loader(config, loader).await
    }

    /// Create an engine from configuration with an explicit loader.
    pub async fn with_loader(
        config: &EngineConfig,
        loader: Option<Arc<dyn ProfileLoader>>,
    ) -> Self {
        let repository = ProfileRepository::open(config.repository.clone(), loader).await;
        let mut engine = Self::new(repository, config.history.clone());
        engine.default_author.clone_from(&config.default_author);
        engine
    }

    /// Builder: record `author` on commits that do not name one.
    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = Some(author.into());
        self
    }

    /// Current lifecycle status.
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// History manager.
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub(crate) fn state(&self) -> Result<&EngineState> {
        match (self.status, self.state.as_ref()) {
            (EngineStatus::Ready, Some(state)) => Ok(state),
            _ => Err(KioskError::not_ready(self.status)),
        }
    }

    /// Load the profile and become ready.
    ///
    /// Candidates are tried in order: the stored snapshot, the commit
    /// history, then the profile source. The first fully valid candidate
    /// wins. The root commit is created when history is empty, and a
    /// snapshot commit is appended when the history head differs from the
    /// loaded profile.
    ///
    /// # Errors
    ///
    /// Loader failures, an invalid source document and corrupted history
    /// fail initialization and leave the engine in [`EngineStatus::Error`].
    pub async fn initialize(&mut self) -> Result<()> {
        if self.status == EngineStatus::Ready {
            return Ok(());
        }
        self.status = EngineStatus::Initializing;
        info!("Initializing profile engine");

        match self.load_initial().await {
            Ok(profile) => {
                info!(profile_id = %profile.id, version = %profile.version, "Profile engine ready");
                self.state = Some(EngineState::new(profile));
                self.status = EngineStatus::Ready;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Profile engine initialization failed");
                self.state = None;
                self.status = EngineStatus::Error;
                Err(e)
            }
        }
    }

    async fn load_initial(&mut self) -> Result<Profile> {
        if !self.history.repository().is_initialized() {
            self.history.repository().initialize().await?;
        }
        let (profile, source) = self.select_initial().await?;
        info!(source = source.describe(), "Profile loaded");
        self.reconcile_history(&profile, source).await?;
        Ok(profile)
    }

    async fn select_initial(&mut self) -> Result<(Profile, Source)> {
        let repository = self.history.repository();

        if let Some(stored) = repository.get_stored_profile().await? {
            if accept(&mut self.validator, &stored, Source::Stored) {
                return Ok((stored, Source::Stored));
            }
        }
        if let Some(rebuilt) = repository.reconstruct_profile_from_commits().await? {
            if accept(&mut self.validator, &rebuilt, Source::History) {
                return Ok((rebuilt, Source::History));
            }
        }

        let document = repository.load_profile().await?;
        let profile = decode(&mut self.validator, document)?;
        Ok((profile, Source::Loader))
    }

    async fn reconcile_history(&self, profile: &Profile, source: Source) -> Result<()> {
        let author = self.default_author.as_deref();
        if !self.history.has_history().await? {
            self.history
                .create_commit(profile, None, "Initial profile", author)
                .await?;
        } else if source != Source::History {
            let head = self
                .history
                .repository()
                .reconstruct_profile_from_commits()
                .await?;
            if head.as_ref() != Some(profile) {
                warn!(
                    source = source.describe(),
                    "Commit history does not end at the loaded profile, recording a snapshot"
                );
                let message = format!("Re-snapshot from {}", source.describe());
                self.history
                    .create_commit(profile, None, &message, author)
                    .await?;
            }
        }

        if source != Source::Stored {
            self.save_snapshot_slot(profile).await;
        }
        Ok(())
    }

    async fn save_snapshot_slot(&self, profile: &Profile) {
        if let Err(e) = self.history.repository().save_profile(profile).await {
            warn!(error = %e, "Failed to save profile snapshot");
        }
    }

    /// Drop in-memory state and close the repository.
    pub async fn destroy(&mut self) -> Result<()> {
        self.state = None;
        self.status = EngineStatus::Uninitialized;
        self.history.repository().destroy().await?;
        info!("Profile engine destroyed");
        Ok(())
    }

    /// The working document, or the committed one when `committed_only`.
    pub fn get_profile(&self, committed_only: bool) -> Result<&Profile> {
        let state = self.state()?;
        Ok(if committed_only {
            &state.current
        } else {
            &state.working
        })
    }

    /// Stage a typed partial update.
    ///
    /// The update is merged into any existing overlay and the resulting
    /// working document must pass full validation.
    ///
    /// # Errors
    ///
    /// `Validation` if the update or the resulting document is invalid; the
    /// overlay and working document are then unchanged.
    pub fn stage_changes(&mut self, patch: ProfilePatch) -> Result<()> {
        self.state()?;
        let document = serde_json::to_value(&patch)?;
        self.validator.check_partial(&document)?;
        self.stage_patch(patch)
    }

    /// Stage an untyped partial document.
    pub fn stage_json(&mut self, document: &Value) -> Result<()> {
        self.state()?;
        self.validator.check_partial(document)?;
        let patch: ProfilePatch = serde_json::from_value(document.clone())
            .map_err(|e| ValidationError::single("", e.to_string()))?;
        self.stage_patch(patch)
    }

    pub(crate) fn stage_patch(&mut self, patch: ProfilePatch) -> Result<()> {
        let state = ready_mut(self.status, &mut self.state)?;
        if patch.is_empty() {
            return Ok(());
        }

        let mut staged = state.staged.clone().unwrap_or_default();
        staged.merge(patch);
        let working = staged.applied(&state.current);
        if !self.validator.validate_profile(&working) {
            return Err(ValidationError::new(self.validator.errors().to_vec()).into());
        }

        state.stage(staged, working);
        debug!(staged = state.staged.is_some(), "Changes staged");
        Ok(())
    }

    /// The staged overlay, if any.
    pub fn get_staged_changes(&self) -> Result<Option<&ProfilePatch>> {
        Ok(self.state()?.staged.as_ref())
    }

    /// Whether an overlay is staged.
    pub fn has_staged_changes(&self) -> Result<bool> {
        Ok(self.state()?.staged.is_some())
    }

    /// Drop the overlay; the working document returns to the committed one.
    pub fn discard_changes(&mut self) -> Result<()> {
        let state = ready_mut(self.status, &mut self.state)?;
        let current = state.current.clone();
        state.reset(current);
        debug!("Staged changes discarded");
        Ok(())
    }

    /// Commit the staged overlay.
    ///
    /// The committed state only advances once both the snapshot slot and
    /// the commit are stored.
    ///
    /// # Errors
    ///
    /// `NoStagedChanges` without an overlay; storage errors leave the
    /// overlay and the committed state in place.
    pub async fn commit_changes(&mut self, message: &str, author: Option<&str>) -> Result<Commit> {
        let state = ready_mut(self.status, &mut self.state)?;
        if state.staged.is_none() {
            return Err(KioskError::NoStagedChanges);
        }
        if state.working == state.current {
            return Err(KioskError::NothingToCommit);
        }

        let mut next = state.working.clone();
        next.updated_at = now_timestamp();
        let author = author.or(self.default_author.as_deref());
        let commit = self
            .history
            .prepare_commit(&next, Some(&state.current), message, author)
            .await?;
        persist(&self.history, &commit, &next, &state.current).await?;

        state.reset(next);
        info!(commit_id = %commit.id, "Changes committed");
        Ok(commit)
    }

    /// Restore the document of `commit_id` by appending a rollback commit.
    ///
    /// Any staged overlay is dropped once the rollback is stored; on error
    /// the engine state is unchanged.
    pub async fn rollback(&mut self, commit_id: &CommitId, author: Option<&str>) -> Result<Commit> {
        let state = ready_mut(self.status, &mut self.state)?;
        let author = author.or(self.default_author.as_deref());
        let (commit, restored) = self
            .history
            .prepare_rollback(commit_id, &state.current, author)
            .await?;
        persist(&self.history, &commit, &restored, &state.current).await?;

        info!(commit_id = %commit.id, target = %commit_id, "Rolled back");
        state.reset(restored);
        Ok(commit)
    }

    /// Stage a complete JSON document as a replacing overlay.
    ///
    /// Nothing is committed. An invalid document is rejected wholesale.
    pub fn import_profile(&mut self, json: &str) -> Result<()> {
        self.state()?;
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ValidationError::single("", format!("invalid JSON: {e}")))?;
        let profile = decode(&mut self.validator, document)?;

        let state = ready_mut(self.status, &mut self.state)?;
        state.stage(ProfilePatch::from(profile.clone()), profile);
        info!(staged = state.staged.is_some(), "Profile imported");
        Ok(())
    }

    /// The working document as pretty JSON.
    pub fn export_profile(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.state()?.working).map_err(KioskError::from)
    }

    /// History entries newest first.
    pub async fn get_history(&self, limit: usize, offset: usize) -> Result<Vec<HistoryEntry>> {
        self.state()?;
        self.history.get_history(limit, offset).await
    }

    /// Number of stored commits.
    pub async fn get_commit_count(&self) -> Result<usize> {
        self.state()?;
        self.history.get_commit_count().await
    }

    /// Diff between the documents of two commits.
    pub async fn get_diff(&self, from: &CommitId, to: &CommitId) -> Result<Diff> {
        self.state()?;
        self.history.get_diff(from, to).await
    }

    /// Human-readable description of a commit.
    pub async fn get_commit_summary(&self, id: &CommitId) -> Result<Vec<String>> {
        self.state()?;
        self.history.get_commit_summary(id).await
    }

    /// Document as of commit `id`.
    pub async fn get_profile_at_commit(&self, id: &CommitId) -> Result<Profile> {
        self.state()?;
        self.history.get_profile_at_commit(id).await
    }

    /// Whether any commit exists.
    pub async fn has_history(&self) -> Result<bool> {
        self.state()?;
        self.history.has_history().await
    }

    /// Document of the oldest stored snapshot commit.
    pub async fn get_initial_profile(&self) -> Result<Option<Profile>> {
        self.state()?;
        self.history.get_initial_profile().await
    }

    /// Prune old commits now. Returns the number of deleted commits.
    pub async fn prune_history(&self) -> Result<usize> {
        self.state()?;
        self.history.prune().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_errors::ErrorCategory;
    use kiosk_profile_repository::{RepositoryConfig, StaticLoader};
    use kiosk_test_helpers::prelude::*;
    use serde_json::json;

    async fn engine_with(doc: Value) -> ProfileEngine {
        let loader: Arc<dyn ProfileLoader> = Arc::new(StaticLoader::new(doc));
        ProfileEngine::with_loader(&EngineConfig::default(), Some(loader)).await
    }

    async fn ready_engine() -> ProfileEngine {
        let mut engine = engine_with(sample_profile_json()).await;
        must(engine.initialize().await);
        engine
    }

    #[test]
    fn test_status_defaults_to_uninitialized() {
        assert_eq!(EngineStatus::default(), EngineStatus::Uninitialized);
        assert_eq!(EngineStatus::Ready.to_string(), "ready");
    }

    #[tokio::test]
    async fn test_calls_before_initialize_are_not_ready() -> TestResult {
        let mut engine = engine_with(sample_profile_json()).await;
        assert_eq!(engine.status(), EngineStatus::Uninitialized);

        let err = engine.get_profile(false).err();
        assert_eq!(err.map(|e| e.category()), Some(ErrorCategory::NotReady));
        assert!(engine.stage_json(&json!({"version": "2.0.0"})).is_err());
        assert!(engine.get_history(10, 0).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_creates_root_commit() -> TestResult {
        let engine = ready_engine().await;
        assert_eq!(engine.status(), EngineStatus::Ready);
        assert_eq!(engine.get_commit_count().await?, 1);
        assert!(!engine.has_staged_changes()?);
        assert_eq!(engine.get_profile(false)?.store_info.name, "X");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_source_moves_to_error() -> TestResult {
        let mut engine = engine_with(json!({"id": "broken"})).await;
        let err = engine.initialize().await.err();
        assert_eq!(err.map(|e| e.category()), Some(ErrorCategory::Validation));
        assert_eq!(engine.status(), EngineStatus::Error);
        assert!(engine.get_profile(true).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_file_moves_to_error() -> TestResult {
        let config = EngineConfig::default().with_source("/nonexistent/profile.json");
        let mut engine = ProfileEngine::from_config(&config).await;
        let err = engine.initialize().await.err();
        assert_eq!(err.map(|e| e.category()), Some(ErrorCategory::Loader));
        assert_eq!(engine.status(), EngineStatus::Error);
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_merges_and_commit_advances() -> TestResult {
        let mut engine = ready_engine().await;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
        engine.stage_json(&json!({"settings": {"theme": "dark"}}))?;

        assert!(engine.has_staged_changes()?);
        assert_eq!(engine.get_profile(false)?.store_info.name, "Y");
        assert_eq!(engine.get_profile(true)?.store_info.name, "X");

        let commit = engine.commit_changes("Rename and theme", Some("staff")).await?;
        assert!(!commit.is_snapshot());
        assert!(!engine.has_staged_changes()?);
        let committed = engine.get_profile(true)?;
        assert_eq!(committed.store_info.name, "Y");
        assert_ne!(committed.updated_at, "2026-01-05T09:00:00.000Z");
        assert_eq!(engine.get_profile(false)?, committed);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_stage_is_noop() -> TestResult {
        let mut engine = ready_engine().await;
        let before = engine.get_profile(false)?.clone();
        engine.stage_changes(ProfilePatch::default())?;
        assert_eq!(engine.get_profile(false)?, &before);
        assert!(!engine.has_staged_changes()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_stage_leaves_state() -> TestResult {
        let mut engine = ready_engine().await;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;

        let err = engine.stage_json(&json!({"storeInfo": {"taxRate": 3}})).err();
        assert!(err.is_some_and(|e| e.validation_issues().is_some()));
        assert_eq!(engine.get_profile(false)?.store_info.name, "Y");
        assert_eq!(engine.get_profile(false)?.store_info.tax_rate, Some(0.1));
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_back_to_committed_clears_overlay() -> TestResult {
        let mut engine = ready_engine().await;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
        engine.stage_json(&json!({"storeInfo": {"name": "X"}}))?;
        assert!(!engine.has_staged_changes()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_without_staged_changes_fails() -> TestResult {
        let mut engine = ready_engine().await;
        let err = engine.commit_changes("nothing", None).await.err();
        assert!(matches!(err, Some(KioskError::NoStagedChanges)));
        assert_eq!(engine.get_commit_count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_discard_restores_committed() -> TestResult {
        let mut engine = ready_engine().await;
        engine.stage_json(&json!({"version": "2.0.0"}))?;
        engine.discard_changes()?;
        assert_eq!(engine.get_profile(false)?.version, "1.0.0");
        assert!(engine.get_staged_changes()?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_scenario() -> TestResult {
        let mut engine = ready_engine().await;
        let root = must_some(engine.get_history(1, 0).await?.pop(), "root entry");

        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
        engine.commit_changes("Rename to Y", None).await?;
        engine.stage_json(&json!({"version": "1.1.0"}))?;

        let before = engine.get_commit_count().await?;
        let commit = engine.rollback(&root.id, None).await?;
        assert_eq!(engine.get_commit_count().await?, before + 1);

        assert_eq!(engine.get_profile(true)?.store_info.name, "X");
        assert_eq!(engine.get_profile(false)?.version, "1.0.0");
        assert!(!engine.has_staged_changes()?);

        let history = engine.get_history(10, 0).await?;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, commit.id);
        assert!(history[0].message.starts_with("Rollback to"));
        Ok(())
    }

    #[tokio::test]
    async fn test_import_replaces_working() -> TestResult {
        let mut engine = ready_engine().await;
        let imported = ProfileFixture::minimal().with_store_name("Imported").build();
        engine.import_profile(&imported.to_string())?;

        let working = engine.get_profile(false)?;
        assert_eq!(working.store_info.name, "Imported");
        assert_eq!(working.store_info.phone, None);
        assert!(working.menu.categories.is_empty());
        assert_eq!(engine.get_profile(true)?.store_info.name, "X");

        engine.commit_changes("Import", None).await?;
        assert_eq!(engine.get_profile(true)?.store_info.name, "Imported");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_import_is_rejected() -> TestResult {
        let mut engine = ready_engine().await;
        let before = engine.get_profile(false)?.clone();

        let err = engine.import_profile("{}").err();
        assert_eq!(err.map(|e| e.category()), Some(ErrorCategory::Validation));
        let err = engine.import_profile("{ not json").err();
        assert_eq!(err.map(|e| e.category()), Some(ErrorCategory::Validation));

        assert_eq!(engine.get_profile(false)?, &before);
        assert!(!engine.has_staged_changes()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_export_is_working_json() -> TestResult {
        let mut engine = ready_engine().await;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
        let exported: Value = serde_json::from_str(&engine.export_profile()?)?;
        assert_eq!(exported["storeInfo"]["name"], "Y");
        Ok(())
    }

    #[tokio::test]
    async fn test_destroy_returns_to_uninitialized() -> TestResult {
        let mut engine = ready_engine().await;
        engine.destroy().await?;
        assert_eq!(engine.status(), EngineStatus::Uninitialized);
        assert!(engine.get_profile(false).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_default_author_applies() -> TestResult {
        let loader: Arc<dyn ProfileLoader> = Arc::new(StaticLoader::new(sample_profile_json()));
        let config = EngineConfig::default()
            .with_repository(RepositoryConfig::in_memory())
            .with_default_author("kiosk");
        let mut engine = ProfileEngine::with_loader(&config, Some(loader)).await;
        engine.initialize().await?;

        engine.stage_json(&json!({"version": "1.0.1"}))?;
        let commit = engine.commit_changes("Bump", None).await?;
        assert_eq!(commit.author.as_deref(), Some("kiosk"));
        Ok(())
    }
}
