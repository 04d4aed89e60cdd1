//! End-to-end engine tests over both repository backends

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use kiosk_profile::prelude::*;
use kiosk_profile_repository::{Commit, CommitStore, IndexEntry, MemoryCommitStore, ProfileRepository};
use kiosk_test_helpers::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use tracing_test::traced_test;

fn file_config(dir: &TempDir) -> TestResult<EngineConfig> {
    let source = dir.path().join("profile.json");
    write_json(&source, &sample_profile_json())?;
    Ok(EngineConfig::default()
        .with_source(source)
        .with_repository(RepositoryConfig::new(dir.path().join("store"))))
}

async fn started(config: &EngineConfig) -> TestResult<ProfileEngine> {
    let mut engine = ProfileEngine::from_config(config).await;
    engine.initialize().await?;
    Ok(engine)
}

/// Memory store whose writes can be switched off.
#[derive(Debug, Default)]
struct FailingStore {
    inner: MemoryCommitStore,
    fail_snapshots: AtomicBool,
    fail_commits: AtomicBool,
}

impl FailingStore {
    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(KioskError::storage(format!("{what} write refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl CommitStore for FailingStore {
    fn kind(&self) -> &'static str {
        "failing"
    }

    async fn open(&self) -> Result<()> {
        self.inner.open().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }

    async fn put_commit(&self, commit: &Commit) -> Result<()> {
        Self::check(&self.fail_commits, "commit")?;
        self.inner.put_commit(commit).await
    }

    async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>> {
        self.inner.get_commit(id).await
    }

    async fn delete_commit(&self, id: &CommitId) -> Result<bool> {
        self.inner.delete_commit(id).await
    }

    async fn entries(&self) -> Result<Vec<IndexEntry>> {
        self.inner.entries().await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    async fn put_snapshot(&self, profile: &Profile) -> Result<()> {
        Self::check(&self.fail_snapshots, "snapshot")?;
        self.inner.put_snapshot(profile).await
    }

    async fn get_snapshot(&self) -> Result<Option<Profile>> {
        self.inner.get_snapshot().await
    }
}

/// Start an engine over `store`; a second call simulates a restart.
async fn started_on(store: &Arc<FailingStore>) -> ProfileEngine {
    let shared: Arc<dyn CommitStore> = store.clone();
    let loader: Arc<dyn ProfileLoader> = Arc::new(StaticLoader::new(sample_profile_json()));
    let repository = ProfileRepository::new(RepositoryConfig::in_memory(), shared, Some(loader));
    let mut engine = ProfileEngine::new(repository, HistoryConfig::default());
    must_with(engine.initialize().await, "engine over failing store");
    engine
}

mod durability {
    use super::*;

    #[tokio::test]
    async fn test_restart_resumes_committed_state() -> TestResult {
        let dir = TempDir::new()?;
        let config = file_config(&dir)?;
        {
            let mut engine = started(&config).await?;
            assert_eq!(engine.history().repository().backend(), "file");
            engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
            engine.commit_changes("Rename", Some("staff")).await?;
            engine.stage_json(&json!({"version": "9.9.9"}))?;
            engine.destroy().await?;
        }

        let engine = started(&config).await?;
        assert_eq!(engine.get_profile(true)?.store_info.name, "Y");
        assert_eq!(engine.get_profile(false)?.version, "1.0.0");
        assert_eq!(engine.get_commit_count().await?, 2);

        let history = engine.get_history(10, 0).await?;
        assert_eq!(history[0].message, "Rename");
        assert_eq!(history[0].author.as_deref(), Some("staff"));
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_at_each_commit_matches_what_was_committed() -> TestResult {
        let dir = TempDir::new()?;
        let config = file_config(&dir)?;
        let mut engine = started(&config).await?;

        let mut expected = Vec::new();
        for name in ["A", "B", "C", "D"] {
            engine.stage_json(&json!({"storeInfo": {"name": name}}))?;
            let commit = engine.commit_changes(&format!("Rename to {name}"), None).await?;
            expected.push((commit.id, engine.get_profile(true)?.clone()));
        }

        for (id, profile) in &expected {
            assert_eq!(&engine.get_profile_at_commit(id).await?, profile);
        }
        let (first, _) = must_some(expected.first().cloned(), "first commit");
        let (last, _) = must_some(expected.last().cloned(), "last commit");
        let diff = engine.get_diff(&first, &last).await?;
        assert!(diff.describe().iter().any(|line| line.contains("/storeInfo/name")));
        Ok(())
    }
}

mod write_failures {
    use super::*;

    #[tokio::test]
    async fn test_refused_snapshot_keeps_commit_uncommitted() -> TestResult {
        let store = Arc::new(FailingStore::default());
        let mut engine = started_on(&store).await;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;

        store.fail_snapshots.store(true, Ordering::SeqCst);
        let err = engine.commit_changes("Rename", None).await.err();
        assert!(matches!(err, Some(KioskError::Storage(_))));
        assert_eq!(engine.get_profile(true)?.store_info.name, "X");
        assert_eq!(engine.get_profile(false)?.store_info.name, "Y");
        assert!(engine.has_staged_changes()?);
        assert_eq!(engine.get_commit_count().await?, 1);

        store.fail_snapshots.store(false, Ordering::SeqCst);
        let commit = engine.commit_changes("Rename", None).await?;
        engine.destroy().await?;

        let engine = started_on(&store).await;
        assert_eq!(engine.get_profile(true)?.store_info.name, "Y");
        assert_eq!(engine.get_commit_count().await?, 2);
        let latest = must_some(engine.get_history(1, 0).await?.pop(), "latest");
        assert_eq!(latest.id, commit.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_commit_restores_snapshot_slot() -> TestResult {
        let store = Arc::new(FailingStore::default());
        let mut engine = started_on(&store).await;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;

        store.fail_commits.store(true, Ordering::SeqCst);
        assert!(engine.commit_changes("Rename", None).await.is_err());
        assert_eq!(engine.get_profile(true)?.store_info.name, "X");
        assert!(engine.has_staged_changes()?);
        store.fail_commits.store(false, Ordering::SeqCst);

        let slot = must_async(store.get_snapshot()).await;
        assert_eq!(slot.map(|p| p.store_info.name), Some("X".to_string()));

        engine.destroy().await?;
        let engine = started_on(&store).await;
        assert_eq!(engine.get_profile(true)?.store_info.name, "X");
        assert_eq!(engine.get_commit_count().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_rollback_leaves_state_alone() -> TestResult {
        let store = Arc::new(FailingStore::default());
        let mut engine = started_on(&store).await;
        let root = must_some(engine.get_history(1, 0).await?.pop(), "root").id;
        engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
        engine.commit_changes("Rename", None).await?;
        engine.stage_json(&json!({"version": "2.0.0"}))?;

        store.fail_snapshots.store(true, Ordering::SeqCst);
        assert!(engine.rollback(&root, None).await.is_err());
        assert_eq!(engine.get_profile(true)?.store_info.name, "Y");
        assert_eq!(engine.get_profile(false)?.version, "2.0.0");
        assert_eq!(engine.get_commit_count().await?, 2);

        store.fail_snapshots.store(false, Ordering::SeqCst);
        engine.rollback(&root, None).await?;
        assert_eq!(engine.get_profile(true)?.store_info.name, "X");
        assert!(!engine.has_staged_changes()?);
        assert_eq!(engine.get_commit_count().await?, 3);
        Ok(())
    }
}

mod recovery {
    use super::*;

    #[tokio::test]
    #[traced_test]
    async fn test_stale_snapshot_is_resnapshotted() -> TestResult {
        let dir = TempDir::new()?;
        let config = file_config(&dir)?;
        {
            let mut engine = started(&config).await?;
            engine.destroy().await?;
        }
        let slot = dir.path().join("store").join("profile.json");
        write_json(&slot, &ProfileFixture::new().with_store_name("Edited").build())?;

        let engine = started(&config).await?;
        assert_eq!(engine.get_profile(true)?.store_info.name, "Edited");
        assert_eq!(engine.get_commit_count().await?, 2);
        assert!(logs_contain("recording a snapshot"));

        let latest = must_some(engine.get_history(1, 0).await?.pop(), "latest");
        let rebuilt = engine.get_profile_at_commit(&latest.id).await?;
        assert_eq!(rebuilt.store_info.name, "Edited");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn test_invalid_snapshot_falls_back_to_history() -> TestResult {
        let dir = TempDir::new()?;
        let config = file_config(&dir)?;
        {
            let mut engine = started(&config).await?;
            engine.stage_json(&json!({"storeInfo": {"name": "Y"}}))?;
            engine.commit_changes("Rename", None).await?;
            engine.destroy().await?;
        }
        let mut invalid = sample_profile_json();
        invalid["storeInfo"]["taxRate"] = json!(7);
        write_json(&dir.path().join("store").join("profile.json"), &invalid)?;

        let engine = started(&config).await?;
        assert_eq!(engine.get_profile(true)?.store_info.name, "Y");
        assert_eq!(engine.get_commit_count().await?, 2);
        assert!(logs_contain("Ignoring invalid profile candidate"));
        Ok(())
    }

    #[tokio::test]
    async fn test_undecodable_snapshot_fails_initialize() -> TestResult {
        let dir = TempDir::new()?;
        let config = file_config(&dir)?;
        {
            let mut engine = started(&config).await?;
            engine.destroy().await?;
        }
        std::fs::write(dir.path().join("store").join("profile.json"), "{ torn")?;

        let mut engine = ProfileEngine::from_config(&config).await;
        let err = engine.initialize().await.err();
        assert!(matches!(err, Some(KioskError::Corruption(_))));
        assert_eq!(engine.status(), EngineStatus::Error);
        Ok(())
    }
}

mod retention {
    use super::*;

    #[tokio::test]
    async fn test_pruned_history_still_reconstructs() -> TestResult {
        let loader: Arc<dyn ProfileLoader> = Arc::new(StaticLoader::new(sample_profile_json()));
        let config = EngineConfig {
            repository: RepositoryConfig::in_memory().with_max_commits(3),
            history: HistoryConfig {
                snapshot_interval: 2,
            },
            ..EngineConfig::default()
        };
        let mut engine = ProfileEngine::with_loader(&config, Some(loader)).await;
        engine.initialize().await?;

        for step in 0..8 {
            engine.stage_json(&json!({"version": format!("1.1.{step}")}))?;
            engine.commit_changes("Bump", None).await?;
        }
        assert_eq!(engine.get_commit_count().await?, 9);

        assert!(engine.prune_history().await? > 0);
        assert!(engine.get_commit_count().await? < 9);
        let latest = must_some(engine.get_history(1, 0).await?.pop(), "latest");
        let rebuilt = engine.get_profile_at_commit(&latest.id).await?;
        assert_eq!(rebuilt.version, "1.1.7");
        assert_eq!(&rebuilt, engine.get_profile(true)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_past_retention_limit_only_appends() -> TestResult {
        let loader: Arc<dyn ProfileLoader> = Arc::new(StaticLoader::new(sample_profile_json()));
        let config = EngineConfig::default();
        let max_commits = config.repository.max_commits;
        let mut engine = ProfileEngine::with_loader(&config, Some(loader)).await;
        engine.initialize().await?;
        let root = must_some(engine.get_history(1, 0).await?.pop(), "root").id;

        for step in 0..max_commits + 20 {
            engine.stage_json(&json!({"version": format!("1.1.{step}")}))?;
            engine.commit_changes("Bump", None).await?;
        }
        let before = engine.get_commit_count().await?;
        assert_eq!(before, max_commits + 21);

        engine.rollback(&root, None).await?;
        assert_eq!(engine.get_commit_count().await?, before + 1);
        assert_eq!(engine.get_profile(true)?.version, "1.0.0");
        assert!(engine.get_profile_at_commit(&root).await.is_ok());
        Ok(())
    }
}
