//! Authorization records.
//!
//! An [`AuthorizationRecord`] is rebuilt on every page load from the
//! document's own authorization table. It only ever carries precomputed
//! booleans and numbers; there is no permission model here beyond reading them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Idle budget applied when the configured value is absent or invalid.
pub const DEFAULT_IDLE_TIMEOUT_MINUTES: u32 = 60;

/// Smallest idle budget accepted from the authorization table.
pub const MIN_IDLE_TIMEOUT_MINUTES: u32 = 3;

/// A capability the authorization table can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Add or insert structural elements (columns, tables).
    AlterStructure,
    /// Share, export, or download.
    Export,
}

/// Presentation theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Parse a table cell, case-insensitively. Unrecognised values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Row density preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayDensity {
    Compact,
    Normal,
    Comfortable,
}

impl DisplayDensity {
    /// Parse a table cell, case-insensitively. Unrecognised values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(DisplayDensity::Compact),
            "normal" => Some(DisplayDensity::Normal),
            "comfortable" => Some(DisplayDensity::Comfortable),
            _ => None,
        }
    }
}

/// Per-user, per-document authorization.
///
/// Immutable once constructed; consumers share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
    /// Permission to add/insert structural elements.
    pub can_alter_structure: bool,
    /// Permission to share/export/download.
    pub can_export: bool,
    /// Session inactivity budget. Always `>= MIN_IDLE_TIMEOUT_MINUTES`.
    pub idle_timeout_minutes: u32,
    /// Optional theme preference.
    pub theme: Option<Theme>,
    /// Optional density preference.
    pub display_density: Option<DisplayDensity>,
}

impl AuthorizationRecord {
    /// The least-privilege record: every capability denied, default timeout.
    pub const fn fail_closed() -> Self {
        Self {
            can_alter_structure: false,
            can_export: false,
            idle_timeout_minutes: DEFAULT_IDLE_TIMEOUT_MINUTES,
            theme: None,
            display_density: None,
        }
    }

    /// Whether the given capability is granted.
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::AlterStructure => self.can_alter_structure,
            Capability::Export => self.can_export,
        }
    }

    /// The idle budget as a duration.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.idle_timeout_minutes) * 60)
    }

    /// Whether every capability is denied.
    pub fn is_fail_closed(&self) -> bool {
        !self.can_alter_structure && !self.can_export
    }
}

impl Default for AuthorizationRecord {
    fn default() -> Self {
        Self::fail_closed()
    }
}

/// Validate a raw idle-timeout cell.
///
/// Absent, non-finite, zero, negative, and sub-minimum values are replaced
/// by [`DEFAULT_IDLE_TIMEOUT_MINUTES`]. Fractional minutes are truncated.
pub fn validate_timeout_minutes(raw: Option<f64>) -> u32 {
    match raw {
        Some(v) if v.is_finite() && v >= f64::from(MIN_IDLE_TIMEOUT_MINUTES) => v as u32,
        _ => DEFAULT_IDLE_TIMEOUT_MINUTES,
    }
}
