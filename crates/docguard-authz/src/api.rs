//! DataApi trait: the host's HTTP data API as the engine consumes it.

use async_trait::async_trait;

use crate::error::Result;

/// Read-only JSON access to the host's data API.
///
/// `path` is absolute from the API origin, e.g. `/api/profile/user`.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// GET `path` and decode the body as JSON.
    ///
    /// Non-success statuses are errors.
    async fn get_json(&self, path: &str) -> Result<serde_json::Value>;
}

/// Routed in-memory data API for tests.
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use crate::error::AuthzError;

    #[derive(Debug, Clone)]
    enum Route {
        Json(serde_json::Value),
        Status(u16),
        Fail(String),
        Stall(Duration),
    }

    /// Answers GETs from a fixed route table; unknown paths are 404.
    #[derive(Default)]
    pub struct MemoryDataApi {
        routes: Mutex<HashMap<String, Route>>,
        requests: Mutex<Vec<String>>,
    }

    impl MemoryDataApi {
        pub fn new() -> Self {
            Self::default()
        }

        fn route(&self, path: impl Into<String>, route: Route) {
            self.routes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path.into(), route);
        }

        /// Serve `body` at `path`.
        pub fn with_json(self, path: impl Into<String>, body: serde_json::Value) -> Self {
            self.route(path, Route::Json(body));
            self
        }

        /// Answer `path` with a non-success status.
        pub fn with_status(self, path: impl Into<String>, status: u16) -> Self {
            self.route(path, Route::Status(status));
            self
        }

        /// Fail `path` at the network level.
        pub fn with_failure(self, path: impl Into<String>, message: impl Into<String>) -> Self {
            self.route(path, Route::Fail(message.into()));
            self
        }

        /// Sleep `delay` before serving a 503 at `path`.
        pub fn with_stall(self, path: impl Into<String>, delay: Duration) -> Self {
            self.route(path, Route::Stall(delay));
            self
        }

        /// Paths requested so far, in order.
        pub fn requests(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl DataApi for MemoryDataApi {
        async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(path.to_string());

            let route = self
                .routes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(path)
                .cloned();

            match route {
                Some(Route::Json(body)) => Ok(body),
                Some(Route::Status(status)) => Err(AuthzError::Status {
                    path: path.to_string(),
                    status,
                }),
                Some(Route::Fail(message)) => Err(AuthzError::Request {
                    path: path.to_string(),
                    message,
                }),
                Some(Route::Stall(delay)) => {
                    tokio::time::sleep(delay).await;
                    Err(AuthzError::Status {
                        path: path.to_string(),
                        status: 503,
                    })
                }
                None => Err(AuthzError::Status {
                    path: path.to_string(),
                    status: 404,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryDataApi;
    use super::*;
    use crate::error::AuthzError;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_routes() {
        let api = MemoryDataApi::new()
            .with_json("/a", json!({"k": 1}))
            .with_status("/b", 500)
            .with_failure("/c", "reset");

        assert_eq!(api.get_json("/a").await.unwrap(), json!({"k": 1}));
        assert!(matches!(
            api.get_json("/b").await,
            Err(AuthzError::Status { status: 500, .. })
        ));
        assert!(matches!(api.get_json("/c").await, Err(AuthzError::Request { .. })));
        assert!(matches!(
            api.get_json("/missing").await,
            Err(AuthzError::Status { status: 404, .. })
        ));
        assert_eq!(api.requests(), vec!["/a", "/b", "/c", "/missing"]);
    }
}
