//! Durable report store.
//!
//! One JSON document holds the whole ordered collection. Appends are
//! serialized: each one rewrites the document (temp file + rename) and only
//! then publishes the new collection to readers.
//!
//! The append critical section runs on the blocking pool and owns its
//! lock guard. Dropping the caller's future does not stop it, so the
//! document and the in-memory collection always move together.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use crate::storage::models::{ReportMeta, StoredReport};
use crate::validation::schema::CspReport;

/// Immutable snapshot of the collection, in arrival order.
pub type ReportCollection = Arc<Vec<StoredReport>>;

/// Durable storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read report store {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("report store {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize reports: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write report store {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("report store writer task failed: {0}")]
    Writer(#[source] tokio::task::JoinError),
}

#[derive(Debug)]
struct StoreInner {
    path: PathBuf,
    reports: RwLock<ReportCollection>,
    append_lock: Mutex<()>,
}

/// Owner of the report collection and its backing document.
#[derive(Debug)]
pub struct ReportStore {
    inner: Arc<StoreInner>,
}

impl ReportStore {
    /// Load the collection from `path`.
    ///
    /// A missing document yields an empty store. An unreadable or
    /// unparseable one is an error the caller must treat as fatal.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let reports: Vec<StoredReport> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("STORE_EMPTY path={} reason=not_found", path.display());
                Vec::new()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        log::info!(
            "STORE_LOADED path={} reports={}",
            path.display(),
            reports.len()
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                path,
                reports: RwLock::new(Arc::new(reports)),
                append_lock: Mutex::new(()),
            }),
        })
    }

    /// Current snapshot. Never the live structure; later appends do not
    /// change a snapshot already handed out.
    pub fn all(&self) -> ReportCollection {
        self.inner.all()
    }

    pub fn len(&self) -> usize {
        self.inner.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a report and persist the whole collection.
    ///
    /// Returns only after the document is durably replaced. On error the
    /// report is not visible to readers and the document is unchanged.
    /// The stored timestamp is clamped to be no earlier than the previous
    /// report's. Once polled, the append runs to completion even if this
    /// future is dropped.
    pub async fn append(
        &self,
        report: CspReport,
        meta: ReportMeta,
    ) -> Result<StoredReport, StoreError> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.append(report, meta))
            .await
            .map_err(StoreError::Writer)?
    }
}

impl StoreInner {
    fn all(&self) -> ReportCollection {
        self.reports.read().clone()
    }

    fn append(&self, report: CspReport, mut meta: ReportMeta) -> Result<StoredReport, StoreError> {
        let _guard = self.append_lock.lock();

        let current = self.all();
        if let Some(last) = current.last() {
            if last.timestamp > meta.timestamp {
                meta.timestamp = last.timestamp;
            }
        }

        let stored = StoredReport::new(report, meta);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(stored.clone());

        self.persist(&next)?;
        *self.reports.write() = Arc::new(next);

        Ok(stored)
    }

    fn persist(&self, reports: &[StoredReport]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(reports).map_err(StoreError::Serialize)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp_path = temp_path(&self.path);
        if let Err(e) = write_and_rename(&tmp_path, &self.path, &bytes) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    log::warn!(
                        "STORE_TMP_CLEANUP_FAILED path={} error={}",
                        tmp_path.display(),
                        cleanup
                    );
                }
            }
            return Err(write_err(e));
        }

        log::debug!(
            "STORE_PERSISTED path={} reports={} bytes={}",
            self.path.display(),
            reports.len(),
            bytes.len()
        );
        Ok(())
    }
}

fn write_and_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp_path, path)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn report(directive: &str, blocked_uri: &str) -> CspReport {
        CspReport {
            document_uri: "https://example.com/".to_string(),
            referrer: None,
            violated_directive: directive.to_string(),
            effective_directive: None,
            original_policy: "default-src 'self'".to_string(),
            blocked_uri: blocked_uri.to_string(),
            status_code: None,
            script_sample: None,
        }
    }

    fn meta_at(secs: i64) -> ReportMeta {
        ReportMeta {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs),
            user_agent: Some("test-agent".to_string()),
        }
    }

    #[tokio::test]
    async fn test_missing_document_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::load(dir.path().join("reports.json")).await.unwrap();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let err = ReportStore::load(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let err = ReportStore::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }

    #[tokio::test]
    async fn test_append_then_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reports.json");
        let store = ReportStore::load(&path).await.unwrap();

        for (i, uri) in ["inline", "data:", "https://cdn.example/a.js"].iter().enumerate() {
            store.append(report("script-src", uri), meta_at(i as i64)).await.unwrap();
        }
        let before = store.all();
        assert_eq!(before.len(), 3);

        let reloaded = ReportStore::load(&path).await.unwrap();
        assert_eq!(*reloaded.all(), *before);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_snapshot_is_not_affected_by_later_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::load(dir.path().join("r.json")).await.unwrap();
        store.append(report("img-src", ""), meta_at(0)).await.unwrap();

        let snapshot = store.all();
        store.append(report("img-src", "data:"), meta_at(1)).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_timestamps_never_go_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::load(dir.path().join("r.json")).await.unwrap();
        let first = store.append(report("a", "inline"), meta_at(10)).await.unwrap();
        let second = store.append(report("a", "inline"), meta_at(5)).await.unwrap();
        assert_eq!(second.timestamp, first.timestamp);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        let store = ReportStore::load(blocker.join("reports.json")).await.unwrap();
        // The parent directory can no longer be created.
        std::fs::write(&blocker, b"file, not a dir").unwrap();

        let err = store.append(report("a", "inline"), meta_at(0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        let store = Arc::new(ReportStore::load(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append(report("script-src", &format!("https://x.example/{i}")), ReportMeta::now(None))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 32);
        let reloaded = ReportStore::load(&path).await.unwrap();
        assert_eq!(*reloaded.all(), *store.all());
        let timestamps: Vec<_> = store.all().iter().map(|r| r.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.json");
        let store = ReportStore::load(&path).await.unwrap();
        // A non-empty directory in the document's place makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = store.append(report("a", "inline"), meta_at(0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(store.is_empty());
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_append_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        let store = ReportStore::load(&path).await.unwrap();

        // Poll each append once, then drop it, as a disconnecting client would.
        for i in 0..8 {
            tokio::select! {
                biased;
                _ = store.append(report("script-src", &format!("https://x.example/{i}")), meta_at(i)) => {}
                _ = std::future::ready(()) => {}
            }
        }
        store.append(report("script-src", "inline"), meta_at(100)).await.unwrap();
        while store.len() < 9 {
            tokio::task::yield_now().await;
        }

        assert_eq!(store.len(), 9);
        let reloaded = ReportStore::load(&path).await.unwrap();
        assert_eq!(*reloaded.all(), *store.all());
        assert!(!temp_path(&path).exists());
    }
}
