//! The authorization loader.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use docguard_core::{AuthorizationRecord, DocumentIdentity};

use crate::api::DataApi;
use crate::error::{AuthzError, Result};
use crate::table::ColumnarTable;

/// Configuration for authorization loading.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Profile endpoint.
    pub profile_path: String,
    /// Authorization table name inside the document.
    pub table: String,
    /// Bound on each individual request.
    pub request_timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            profile_path: "/api/profile/user".to_string(),
            table: "SysUsers".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// The caller's profile. Only the email is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Joins the caller's profile with a document's authorization table.
pub struct AuthorizationLoader {
    api: Arc<dyn DataApi>,
    config: LoaderConfig,
}

impl AuthorizationLoader {
    /// Create a loader over `api`.
    pub fn new(api: Arc<dyn DataApi>, config: LoaderConfig) -> Self {
        Self { api, config }
    }

    /// Path of the authorization table for `doc`.
    pub fn table_path(&self, doc: &DocumentIdentity) -> Result<String> {
        if !is_path_safe(doc.as_str()) {
            return Err(AuthzError::UnsafeIdentity(doc.to_string()));
        }
        Ok(format!("/api/docs/{}/tables/{}/data", doc, self.config.table))
    }

    /// Load the caller's record for `doc`, failing closed.
    ///
    /// Never errors: any failure, or a missing row, yields
    /// [`AuthorizationRecord::fail_closed`]. Not memoised; each call reads
    /// fresh data.
    pub async fn load(&self, doc: &DocumentIdentity) -> AuthorizationRecord {
        match self.try_load(doc).await {
            Ok((email, record)) => {
                tracing::info!(
                    doc_id = %doc,
                    %email,
                    can_alter_structure = record.can_alter_structure,
                    can_export = record.can_export,
                    idle_timeout_minutes = record.idle_timeout_minutes,
                    "permissions loaded"
                );
                record
            }
            Err(AuthzError::UserNotFound { email }) => {
                tracing::info!(doc_id = %doc, %email, "user not in authorization table; all permissions denied");
                AuthorizationRecord::fail_closed()
            }
            Err(e) => {
                tracing::warn!(doc_id = %doc, error = %e, "permission lookup failed; all permissions denied");
                AuthorizationRecord::fail_closed()
            }
        }
    }

    /// The fallible steps behind [`load`](Self::load).
    pub async fn try_load(&self, doc: &DocumentIdentity) -> Result<(String, AuthorizationRecord)> {
        let table_path = self.table_path(doc)?;

        let profile: UserProfile = serde_json::from_value(self.fetch(&self.config.profile_path).await?)
            .map_err(|e| AuthzError::Malformed(format!("profile: {e}")))?;
        let email = profile
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(AuthzError::MissingEmail)?;

        let table = ColumnarTable::from_value(self.fetch(&table_path).await?)?;
        let row = table
            .find_row_by_email(&email)
            .ok_or_else(|| AuthzError::UserNotFound {
                email: email.clone(),
            })?;

        Ok((email, table.record_for_row(row)))
    }

    async fn fetch(&self, path: &str) -> Result<serde_json::Value> {
        match tokio::time::timeout(self.config.request_timeout, self.api.get_json(path)).await {
            Ok(result) => result,
            Err(_) => Err(AuthzError::Timeout {
                path: path.to_string(),
            }),
        }
    }
}

fn is_path_safe(token: &str) -> bool {
    token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
