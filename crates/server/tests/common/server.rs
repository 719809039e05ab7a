//! Server test utilities.

use super::fixtures::put_headers;
use axum::body::Body;
use axum::http::{Request, Response};
use bytes::Bytes;
use rawx_core::config::{AppConfig, StorageConfig};
use rawx_server::notify::NoopNotifier;
use rawx_server::{AppState, Notifier, RawxMetrics, create_router};
use rawx_storage::{ChunkRepository, FilesystemRepository};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub storage_path: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server over a temporary filesystem repository.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let (temp_dir, storage_path) = temp_storage();
        let mut config = test_config(&storage_path);
        modifier(&mut config);

        let repository = rawx_storage::from_config(&config.storage)
            .await
            .expect("Failed to create storage backend");
        Self::assemble(config, repository, Arc::new(NoopNotifier), temp_dir, storage_path)
    }

    /// Create a test server whose repository is built by `make_repository`
    /// on top of a temporary filesystem repository.
    ///
    /// Returns the built repository alongside the server for inspection.
    pub async fn with_collaborators<R, F>(
        make_repository: F,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, Arc<R>)
    where
        R: ChunkRepository,
        F: FnOnce(Arc<dyn ChunkRepository>) -> Arc<R>,
    {
        let (temp_dir, storage_path) = temp_storage();
        let config = test_config(&storage_path);
        let inner: Arc<dyn ChunkRepository> = Arc::new(
            FilesystemRepository::new(&storage_path)
                .await
                .expect("Failed to create storage backend")
                .with_fsync(false),
        );
        let built = make_repository(inner);
        let repository: Arc<dyn ChunkRepository> = built.clone();
        let server = Self::assemble(config, repository, notifier, temp_dir, storage_path);
        (server, built)
    }

    fn assemble(
        config: AppConfig,
        repository: Arc<dyn ChunkRepository>,
        notifier: Arc<dyn Notifier>,
        temp_dir: TempDir,
        storage_path: PathBuf,
    ) -> Self {
        let metrics = RawxMetrics::new().expect("Failed to create metrics");
        let state = AppState::new(config, repository, notifier, metrics);
        let router = create_router(state.clone());
        Self {
            router,
            state,
            storage_path,
            _temp_dir: temp_dir,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// PUT `data` as chunk `id` with the standard metadata headers.
    pub async fn put(&self, id: &str, data: impl Into<Bytes>) -> Response<Body> {
        self.send(put_request(id).body(Body::from(data.into())).unwrap())
            .await
    }

    pub async fn get(&self, id: &str) -> Response<Body> {
        self.send(request("GET", id).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_range(&self, id: &str, range: &str) -> Response<Body> {
        self.send(
            request("GET", id)
                .header("Range", range)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn head(&self, id: &str) -> Response<Body> {
        self.send(request("HEAD", id).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, id: &str) -> Response<Body> {
        self.send(request("DELETE", id).body(Body::empty()).unwrap())
            .await
    }

    /// COPY `source` to `destination` with the given full path.
    pub async fn copy(&self, source: &str, destination: &str, full_path: &str) -> Response<Body> {
        self.send(
            request("COPY", source)
                .header("Destination", destination)
                .header("X-oio-Chunk-Meta-Full-Path", full_path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Rendered Prometheus metrics of this instance.
    pub fn metrics_text(&self) -> String {
        let encoded = self.state.metrics.encode().expect("Failed to encode metrics");
        String::from_utf8(encoded).expect("Metrics are not UTF-8")
    }
}

fn temp_storage() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().join("chunks");
    std::fs::create_dir_all(&storage_path).expect("Failed to create storage directory");
    (temp_dir, storage_path)
}

fn test_config(storage_path: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.storage = StorageConfig::Filesystem {
        path: storage_path.to_path_buf(),
        hash_width: 3,
        hash_depth: 1,
        fsync: false,
    };
    config
}

/// Request builder for chunk `id`.
#[allow(dead_code)]
pub fn request(method: &str, id: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(format!("/{id}"))
}

/// PUT request builder carrying the standard metadata headers.
#[allow(dead_code)]
pub fn put_request(id: &str) -> axum::http::request::Builder {
    put_headers()
        .into_iter()
        .fold(request("PUT", id), |builder, (name, value)| {
            builder.header(name, value)
        })
}

/// PUT request builder with one standard header replaced or added.
#[allow(dead_code)]
pub fn put_request_with(id: &str, name: &str, value: &str) -> axum::http::request::Builder {
    put_headers()
        .into_iter()
        .filter(|(standard, _)| !standard.eq_ignore_ascii_case(name))
        .fold(request("PUT", id), |builder, (name, value)| {
            builder.header(name, value)
        })
        .header(name, value)
}

/// Collect a response body.
#[allow(dead_code)]
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

/// Value of a response header as text.
#[allow(dead_code)]
pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// The `code` field of a JSON error reply.
#[allow(dead_code)]
pub async fn error_code(response: Response<Body>) -> String {
    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).expect("error body is not JSON");
    json["code"].as_str().unwrap_or_default().to_string()
}

/// Files under `root` whose name marks them as staged or temporary.
#[allow(dead_code)]
pub fn leftover_files(root: &std::path::Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else if path.to_string_lossy().contains(".pending.") {
                found.push(path);
            }
        }
    }
    found
}
