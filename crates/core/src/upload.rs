//! Upload orchestration
//!
//! One run goes: optional bucket clear, file discovery, then a sliding window
//! of at most `concurrency` put-object calls. The first failed upload stops
//! further dispatch; uploads already in flight are drained before the run
//! reports an [`AggregateError`].

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;

use crate::cache_control::resolve;
use crate::config::UploadOptions;
use crate::content_type;
use crate::discovery::discover;
use crate::error::{AggregateError, Result, UploadFailure};
use crate::pattern::{PatternSet, to_key};
use crate::traits::{ObjectStore, PutObject};

/// Maximum number of put-object calls in flight
pub const DEFAULT_CONCURRENCY: usize = 10;

/// A file resolved to its object key and headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedUpload {
    pub path: PathBuf,
    pub key: String,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

/// Result of a successful run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    /// Objects deleted by the bucket clear, when it ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<usize>,
    pub uploaded: usize,
    pub bytes: u64,
}

/// Compiled include/exclude globs of a run
struct Filters {
    include: PatternSet,
    exclude: PatternSet,
}

impl Filters {
    fn new(options: &UploadOptions) -> Result<Self> {
        Ok(Self {
            include: PatternSet::new(&options.include)?,
            exclude: PatternSet::new(&options.exclude)?,
        })
    }

    fn plan(&self, options: &UploadOptions) -> Result<Vec<PlannedUpload>> {
        let base = &options.working_directory;
        let files = discover(base, &self.include, &self.exclude)?;

        Ok(files
            .into_iter()
            .filter_map(|path| {
                let key = to_key(base, &path)?;
                let cache_control = resolve(&key, &options.cache_control).map(str::to_string);
                Some(PlannedUpload {
                    content_type: content_type::lookup(&path),
                    cache_control,
                    key,
                    path,
                })
            })
            .collect())
    }
}

/// Discover files and resolve their keys, content types and cache-control
///
/// Touches only the local filesystem; used for dry runs.
pub fn plan(options: &UploadOptions) -> Result<Vec<PlannedUpload>> {
    Filters::new(options)?.plan(options)
}

/// Drives uploads against an [`ObjectStore`]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    concurrency: usize,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Override the in-flight bound (minimum 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run a full deployment
    pub async fn upload(&self, options: &UploadOptions) -> Result<UploadSummary> {
        tracing::info!("Include patterns: {}.", options.include.join(", "));
        tracing::info!("Exclude patterns: {}.", options.exclude.join(", "));
        tracing::info!(
            "Working directory: {}.",
            options.working_directory.display()
        );
        if !options.cache_control.is_empty() {
            tracing::info!(
                "Cache control rules configured: {} rule(s).",
                options.cache_control.len()
            );
        }

        // Bad globs must fail before the bucket is emptied
        let filters = Filters::new(options)?;

        let cleared = if options.clear {
            let count = self.store.clear_bucket().await?;
            tracing::info!("Successfully deleted {count} objects from bucket.");
            Some(count)
        } else {
            None
        };

        let plan = filters.plan(options)?;
        tracing::info!("Found {} files to upload.", plan.len());

        let (uploaded, bytes) = self.upload_all(plan).await?;

        Ok(UploadSummary {
            cleared,
            uploaded,
            bytes,
        })
    }

    /// Upload planned files with a sliding window of `concurrency` tasks
    pub async fn upload_all(&self, plan: Vec<PlannedUpload>) -> Result<(usize, u64)> {
        let mut queue = plan.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut failure: Option<AggregateError> = None;
        let mut uploaded = 0;
        let mut bytes = 0;

        loop {
            while failure.is_none() && in_flight.len() < self.concurrency {
                let Some(item) = queue.next() else {
                    break;
                };
                in_flight.push(self.upload_one(item));
            }

            let Some((key, result)) = in_flight.next().await else {
                break;
            };

            match result {
                Ok(size) => {
                    uploaded += 1;
                    bytes += size;
                }
                Err(error) => {
                    let failed = UploadFailure::new(key, error);
                    match failure.as_mut() {
                        Some(aggregate) => aggregate.suppressed.push(failed),
                        None => {
                            tracing::warn!(
                                "Upload of {} failed, waiting for {} in-flight upload(s)",
                                failed.key,
                                in_flight.len()
                            );
                            failure = Some(AggregateError::new(failed));
                        }
                    }
                }
            }
        }

        match failure {
            Some(aggregate) => Err(aggregate.into()),
            None => Ok((uploaded, bytes)),
        }
    }

    async fn upload_one(&self, item: PlannedUpload) -> (String, Result<u64>) {
        match &item.cache_control {
            Some(cc) => tracing::info!(
                "Uploading: {} ({}) [cache-control: {cc}]...",
                item.key,
                item.content_type
            ),
            None => tracing::info!("Uploading: {} ({})...", item.key, item.content_type),
        }

        let key = item.key.clone();
        (key, self.put_file(item).await)
    }

    async fn put_file(&self, item: PlannedUpload) -> Result<u64> {
        let body = tokio::fs::read(&item.path).await?;
        let size = body.len() as u64;

        self.store
            .put_object(PutObject {
                key: item.key,
                body,
                content_type: item.content_type,
                cache_control: item.cache_control,
            })
            .await?;

        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_control::parse_rules;
    use crate::error::Error;
    use crate::traits::MockObjectStore;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Store that records calls, tracks concurrency and fails chosen keys
    #[derive(Default)]
    struct FakeStore {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        attempts: AtomicUsize,
        completed: AtomicUsize,
        delay: Duration,
        fail_keys: HashSet<String>,
        fail_all: bool,
        events: Mutex<Vec<String>>,
        puts: Mutex<Vec<PutObject>>,
    }

    impl FakeStore {
        fn with_delay(ms: u64) -> Self {
            Self {
                delay: Duration::from_millis(ms),
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl ObjectStore for FakeStore {
        async fn clear_bucket(&self) -> Result<usize> {
            self.events.lock().unwrap().push("clear".to_string());
            Ok(7)
        }

        async fn put_object(&self, object: PutObject) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.events
                .lock()
                .unwrap()
                .push(format!("put:{}", object.key));

            if self.fail_all || self.fail_keys.contains(&object.key) {
                return Err(Error::Storage(format!("rejected {}", object.key)));
            }

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.completed.fetch_add(1, Ordering::SeqCst);
            self.puts.lock().unwrap().push(object);
            Ok(())
        }
    }

    fn write_files(dir: &TempDir, names: &[&str]) {
        for name in names {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, name.as_bytes()).unwrap();
        }
    }

    fn numbered_files(dir: &TempDir, count: usize) {
        let names: Vec<String> = (0..count).map(|i| format!("f{i:02}.txt")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        write_files(dir, &refs);
    }

    fn options(dir: &TempDir) -> UploadOptions {
        UploadOptions {
            clear: false,
            include: vec!["**".to_string()],
            exclude: Vec::new(),
            working_directory: dir.path().to_path_buf(),
            cache_control: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_uploads_every_file_once() {
        let dir = TempDir::new().unwrap();
        numbered_files(&dir, 25);
        let store = Arc::new(FakeStore::default());

        let summary = Uploader::new(store.clone())
            .upload(&options(&dir))
            .await
            .unwrap();

        assert_eq!(summary.uploaded, 25);
        assert_eq!(summary.cleared, None);
        assert_eq!(store.attempts.load(Ordering::SeqCst), 25);

        let keys: HashSet<String> = store
            .puts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.key.clone())
            .collect();
        assert_eq!(keys.len(), 25);
    }

    #[tokio::test]
    async fn test_concurrency_bound_is_exact() {
        let dir = TempDir::new().unwrap();
        numbered_files(&dir, 25);
        let store = Arc::new(FakeStore::with_delay(50));

        Uploader::new(store.clone())
            .upload(&options(&dir))
            .await
            .unwrap();

        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), DEFAULT_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_custom_concurrency() {
        let dir = TempDir::new().unwrap();
        numbered_files(&dir, 8);
        let store = Arc::new(FakeStore::with_delay(20));

        let uploader = Uploader::new(store.clone()).with_concurrency(3);
        uploader.upload(&options(&dir)).await.unwrap();

        assert!(store.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert_eq!(store.completed.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_concurrency_clamped() {
        let store = Arc::new(FakeStore::default());
        assert_eq!(Uploader::new(store).with_concurrency(0).concurrency(), 1);
    }

    #[tokio::test]
    async fn test_failure_drains_in_flight_and_stops_dispatch() {
        let dir = TempDir::new().unwrap();
        numbered_files(&dir, 10);
        let store = Arc::new(FakeStore {
            delay: Duration::from_millis(30),
            fail_keys: HashSet::from(["f00.txt".to_string()]),
            ..Default::default()
        });

        let err = Uploader::new(store.clone())
            .with_concurrency(3)
            .upload(&options(&dir))
            .await
            .unwrap_err();

        match err {
            Error::Aggregate(aggregate) => {
                assert_eq!(aggregate.first.key, "f00.txt");
                assert!(aggregate.suppressed.is_empty());
                assert!(aggregate.to_string().contains("rejected f00.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // f01 and f02 were already dispatched and ran to completion
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(store.completed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sibling_failures_are_kept() {
        let dir = TempDir::new().unwrap();
        numbered_files(&dir, 15);
        let store = Arc::new(FakeStore {
            fail_all: true,
            ..Default::default()
        });

        let err = Uploader::new(store.clone())
            .upload(&options(&dir))
            .await
            .unwrap_err();

        let Error::Aggregate(aggregate) = err else {
            panic!("expected aggregate error");
        };
        assert_eq!(aggregate.len(), DEFAULT_CONCURRENCY);
        assert_eq!(store.attempts.load(Ordering::SeqCst), DEFAULT_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_cache_control_applied_per_file() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["index.html", "docs/index.html", "assets/app.js"]);
        let store = Arc::new(FakeStore::default());

        let mut opts = options(&dir);
        opts.cache_control = parse_rules(&[
            r#"no-store,max-age=0,must-revalidate: ["index.html", "**/index.html"]"#,
            r#"private,max-age=31536000: ["**"]"#,
        ])
        .unwrap();

        Uploader::new(store.clone()).upload(&opts).await.unwrap();

        let puts = store.puts.lock().unwrap();
        let find = |key: &str| puts.iter().find(|p| p.key == key).unwrap().clone();

        let index = find("index.html");
        assert_eq!(
            index.cache_control.as_deref(),
            Some("no-store,max-age=0,must-revalidate")
        );
        assert_eq!(index.content_type, "text/html");
        assert_eq!(index.body, b"index.html");

        assert_eq!(
            find("docs/index.html").cache_control.as_deref(),
            Some("no-store,max-age=0,must-revalidate")
        );
        assert_eq!(
            find("assets/app.js").cache_control.as_deref(),
            Some("private,max-age=31536000")
        );
    }

    #[tokio::test]
    async fn test_no_rules_means_no_directive() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["index.html", "assets/app.js"]);
        let store = Arc::new(FakeStore::default());

        Uploader::new(store.clone())
            .upload(&options(&dir))
            .await
            .unwrap();

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        assert!(puts.iter().all(|p| p.cache_control.is_none()));
    }

    #[tokio::test]
    async fn test_clear_runs_before_uploads() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["a.txt", "b.txt"]);
        let store = Arc::new(FakeStore::default());

        let mut opts = options(&dir);
        opts.clear = true;
        let summary = Uploader::new(store.clone()).upload(&opts).await.unwrap();

        assert_eq!(summary.cleared, Some(7));
        assert_eq!(summary.uploaded, 2);
        assert_eq!(summary.bytes, 10);
        let events = store.events.lock().unwrap();
        assert_eq!(events[0], "clear");
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn test_clear_failure_aborts() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["index.html"]);

        let mut mock = MockObjectStore::new();
        mock.expect_clear_bucket()
            .times(1)
            .returning(|| Err(Error::Storage("access denied".to_string())));
        mock.expect_put_object().never();

        let mut opts = options(&dir);
        opts.clear = true;
        let err = Uploader::new(Arc::new(mock))
            .upload(&opts)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage(ref msg) if msg == "access denied"));
    }

    #[tokio::test]
    async fn test_bad_pattern_fails_before_clear() {
        let dir = TempDir::new().unwrap();

        let mut mock = MockObjectStore::new();
        mock.expect_clear_bucket().never();
        mock.expect_put_object().never();

        let mut opts = options(&dir);
        opts.clear = true;
        opts.include = vec!["[broken".to_string()];
        let err = Uploader::new(Arc::new(mock))
            .upload(&opts)
            .await
            .unwrap_err();

        assert!(err.is_usage());
    }

    #[tokio::test]
    async fn test_empty_discovery_is_noop() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["readme.md"]);

        let mut mock = MockObjectStore::new();
        mock.expect_put_object().never();

        let mut opts = options(&dir);
        opts.include = vec!["*.html".to_string()];
        let summary = Uploader::new(Arc::new(mock)).upload(&opts).await.unwrap();

        assert_eq!(summary, UploadSummary::default());
    }

    #[tokio::test]
    async fn test_put_receives_headers_from_mock() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["styles/site.css"]);

        let mut mock = MockObjectStore::new();
        mock.expect_put_object()
            .withf(|object| {
                object.key == "styles/site.css"
                    && object.content_type == "text/css"
                    && object.cache_control.as_deref() == Some("public,max-age=60")
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut opts = options(&dir);
        opts.cache_control = parse_rules(&[r#"public,max-age=60: ["*.css"]"#]).unwrap();
        let summary = Uploader::new(Arc::new(mock)).upload(&opts).await.unwrap();

        assert_eq!(summary.uploaded, 1);
    }

    #[test]
    fn test_plan() {
        let dir = TempDir::new().unwrap();
        write_files(&dir, &["index.html", "data.bin.unknownext"]);

        let mut opts = options(&dir);
        opts.cache_control = parse_rules(&[r#"no-cache: ["*.html"]"#]).unwrap();
        let planned = plan(&opts).unwrap();

        assert_eq!(planned.len(), 2);
        let bin = planned.iter().find(|p| p.key == "data.bin.unknownext").unwrap();
        assert_eq!(bin.content_type, "application/octet-stream");
        assert_eq!(bin.cache_control, None);
        let html = planned.iter().find(|p| p.key == "index.html").unwrap();
        assert_eq!(html.cache_control.as_deref(), Some("no-cache"));
    }
}
