use std::path::PathBuf;
use std::sync::Arc;

use regionmap_core::{GeometryStore, StoreError};
use tokio::sync::OnceCell;
use tracing::warn;

use crate::config::{self, upstream_connect_timeout, upstream_http_timeout};

#[derive(Clone)]
pub struct AppState {
    /// Boundary geometry, loaded on first use and shared by every render.
    pub geometry: Arc<OnceCell<Arc<GeometryStore>>>,
    pub http_client: reqwest::Client,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new() -> Self {
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("regionmap/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            geometry: Arc::new(OnceCell::new()),
            http_client,
            data_dir: config::data_dir(),
            upload_dir: config::upload_dir(),
            export_dir: config::export_dir(),
        }
    }

    /// The shared geometry store, loading it on first call. Concurrent
    /// callers during a cold start share a single initialization.
    pub async fn geometry_store(&self) -> Result<Arc<GeometryStore>, StoreError> {
        self.geometry
            .get_or_try_init(|| async {
                GeometryStore::load(&self.http_client, &self.data_dir)
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    pub fn geometry_loaded(&self) -> bool {
        self.geometry.get().is_some()
    }
}
