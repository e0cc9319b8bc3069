//! Bounded, polling identity resolution.
//!
//! Candidate sources, in priority order:
//!
//! 1. the host application's own exposed state,
//! 2. the sniffed `openDoc` argument,
//! 3. the current page path.
//!
//! The resolver sleeps between polls and gives up after
//! [`ResolverConfig::timeout`]. Giving up is not an error: callers apply the
//! most restrictive defaults.

use std::sync::Arc;
use std::time::Duration;

use docguard_core::DocumentIdentity;
use tokio::time::Instant;

use crate::capture::CapturedIdentity;
use crate::transport::{install_sniffer, Outbound};

/// The host's global application state.
pub trait HostState: Send + Sync {
    /// The identifier the host itself exposes, once it has one.
    fn exposed_document_id(&self) -> Option<String>;
}

/// The current page address.
pub trait PageLocation: Send + Sync {
    /// The path component, e.g. `/o/team/4kQx2mR7pZ9w/Sales`.
    fn path(&self) -> String;
}

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    HostState,
    Sniffed,
    PagePath,
}

/// Configuration for identity resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on resolution.
    pub timeout: Duration,
    /// Sleep between polls.
    pub poll_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Produces the single authoritative document identity for the page.
pub struct IdentityResolver {
    config: ResolverConfig,
    host: Arc<dyn HostState>,
    location: Arc<dyn PageLocation>,
    captured: CapturedIdentity,
}

impl IdentityResolver {
    /// Create a resolver with a fresh capture slot.
    pub fn new(
        config: ResolverConfig,
        host: Arc<dyn HostState>,
        location: Arc<dyn PageLocation>,
    ) -> Self {
        Self {
            config,
            host,
            location,
            captured: CapturedIdentity::new(),
        }
    }

    /// Wrap the host's outbound channel so it feeds this resolver.
    ///
    /// Call at load time, before any traffic. Safe to call more than once.
    pub fn install_sniffer(&self, channel: Arc<dyn Outbound>) -> Arc<dyn Outbound> {
        install_sniffer(channel, &self.captured)
    }

    /// Read-only view of the sniffed identity.
    pub fn sniffed(&self) -> Option<DocumentIdentity> {
        self.captured.current()
    }

    /// One poll over all sources, in priority order.
    pub fn candidate(&self) -> Option<(DocumentIdentity, IdentitySource)> {
        if let Some(id) = DocumentIdentity::from_candidate(self.host.exposed_document_id()) {
            return Some((id, IdentitySource::HostState));
        }
        if let Some(id) = self.captured.current() {
            return Some((id, IdentitySource::Sniffed));
        }
        document_id_from_path(&self.location.path()).map(|id| (id, IdentitySource::PagePath))
    }

    /// Resolve within the configured timeout.
    pub async fn resolve(&self) -> Option<DocumentIdentity> {
        self.resolve_within(self.config.timeout).await
    }

    /// Resolve within `timeout`, yielding between polls.
    pub async fn resolve_within(&self, timeout: Duration) -> Option<DocumentIdentity> {
        let start = Instant::now();

        loop {
            if let Some((id, source)) = self.candidate() {
                tracing::info!(doc_id = %id, ?source, "document identity resolved");
                return Some(id);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "could not resolve document identity; applying restrictive defaults"
                );
                return None;
            }

            tokio::time::sleep(self.config.poll_interval.min(timeout - elapsed)).await;
        }
    }
}

/// First path segments that are routes, never document ids.
const RESERVED_SEGMENTS: &[&str] = &[
    "o", "doc", "docs", "api", "welcome", "login", "logout", "signin", "account", "admin",
];

/// Minimum length of a bare document token in a path.
const MIN_PATH_ID_LEN: usize = 12;

/// Extract a document identity from a page path.
///
/// Recognises `/doc/{id}`, `/o/{org}/{id}/...`, and `/{id}/...`. A bare
/// segment must be alphanumeric and at least 12 characters long.
pub fn document_id_from_path(path: &str) -> Option<DocumentIdentity> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.first() == Some(&"o") {
        let org_prefix = segments.len().min(2);
        segments.drain(..org_prefix);
    }

    match segments.as_slice() {
        ["doc", id, ..] => DocumentIdentity::new(id).ok(),
        [first, ..] if looks_like_document_id(first) => DocumentIdentity::new(first).ok(),
        _ => None,
    }
}

fn looks_like_document_id(segment: &str) -> bool {
    segment.len() >= MIN_PATH_ID_LEN
        && segment.chars().all(|c| c.is_ascii_alphanumeric())
        && !RESERVED_SEGMENTS.contains(&segment)
}

/// Fixed-value host ports for tests and shims.
pub mod memory {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// Host state whose exposed identifier can be set at any time.
    #[derive(Default)]
    pub struct StaticHostState {
        id: Mutex<Option<String>>,
    }

    impl StaticHostState {
        pub fn empty() -> Self {
            Self::default()
        }

        pub fn with_id(id: impl Into<String>) -> Self {
            Self {
                id: Mutex::new(Some(id.into())),
            }
        }

        pub fn set(&self, id: impl Into<String>) {
            *self.id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id.into());
        }
    }

    impl HostState for StaticHostState {
        fn exposed_document_id(&self) -> Option<String> {
            self.id.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }
    }

    /// A fixed page path.
    pub struct StaticLocation(String);

    impl StaticLocation {
        pub fn new(path: impl Into<String>) -> Self {
            Self(path.into())
        }
    }

    impl PageLocation for StaticLocation {
        fn path(&self) -> String {
            self.0.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{StaticHostState, StaticLocation};
    use super::*;
    use crate::transport::memory::RecordingOutbound;
    use bytes::Bytes;

    fn resolver(host: StaticHostState, path: &str) -> (IdentityResolver, Arc<dyn Outbound>) {
        let resolver = IdentityResolver::new(
            ResolverConfig::default(),
            Arc::new(host),
            Arc::new(StaticLocation::new(path)),
        );
        let channel = resolver.install_sniffer(Arc::new(RecordingOutbound::new()));
        (resolver, channel)
    }

    fn open_doc(channel: &Arc<dyn Outbound>, id: &str) {
        let frame = format!(r#"{{"method":"openDoc","args":["{id}"]}}"#);
        channel.send(Bytes::from(frame)).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_state_wins_over_other_sources() {
        let (resolver, channel) = resolver(StaticHostState::with_id("hostDoc"), "/doc/pathDoc123456");
        open_doc(&channel, "sniffedDoc");

        let (id, source) = resolver.candidate().unwrap();
        assert_eq!(id.as_str(), "hostDoc");
        assert_eq!(source, IdentitySource::HostState);
        assert_eq!(resolver.resolve().await.unwrap().as_str(), "hostDoc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sniffed_wins_over_path() {
        let (resolver, channel) = resolver(StaticHostState::empty(), "/doc/pathDoc123456");
        open_doc(&channel, "sniffedDoc");

        assert_eq!(resolver.candidate().unwrap().1, IdentitySource::Sniffed);
        assert_eq!(resolver.resolve().await.unwrap().as_str(), "sniffedDoc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_path_is_last_resort() {
        let (resolver, _channel) = resolver(StaticHostState::empty(), "/o/team/4kQx2mR7pZ9wAb/Sales");
        assert_eq!(resolver.resolve().await.unwrap().as_str(), "4kQx2mR7pZ9wAb");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_host_value_is_not_a_candidate() {
        let (resolver, channel) = resolver(StaticHostState::with_id(""), "/");
        open_doc(&channel, "sniffedDoc");
        assert_eq!(resolver.candidate().unwrap().1, IdentitySource::Sniffed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_to_none_after_three_seconds() {
        let (resolver, _channel) = resolver(StaticHostState::empty(), "/welcome/home");
        let start = Instant::now();

        assert!(resolver.resolve().await.is_none());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_sniffed_identity_found_before_timeout() {
        let (resolver, channel) = resolver(StaticHostState::empty(), "/");
        let start = Instant::now();

        let sender = channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1250)).await;
            open_doc(&sender, "lateDoc");
        });

        assert_eq!(resolver.resolve().await.unwrap().as_str(), "lateDoc");
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1250));
        assert!(elapsed <= Duration::from_millis(1300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_polls_once() {
        let (resolver, channel) = resolver(StaticHostState::empty(), "/");
        assert!(resolver.resolve_within(Duration::ZERO).await.is_none());
        open_doc(&channel, "doc");
        assert!(resolver.resolve_within(Duration::ZERO).await.is_some());
    }

    #[test]
    fn test_path_patterns() {
        let id = |p: &str| document_id_from_path(p).map(String::from);

        assert_eq!(id("/doc/abc"), Some("abc".into()));
        assert_eq!(id("/o/docs/doc/abc"), Some("abc".into()));
        assert_eq!(id("/o/team/4kQx2mR7pZ9wAb/Sales/p/2"), Some("4kQx2mR7pZ9wAb".into()));
        assert_eq!(id("/4kQx2mR7pZ9wAb/Sales?x=1#f"), Some("4kQx2mR7pZ9wAb".into()));
        assert_eq!(id("/4kQx2mR7pZ9wAb"), Some("4kQx2mR7pZ9wAb".into()));

        assert_eq!(id("/"), None);
        assert_eq!(id(""), None);
        assert_eq!(id("/o/team"), None);
        assert_eq!(id("/o/team/"), None);
        assert_eq!(id("/short/x"), None);
        assert_eq!(id("/not-alnum-token-here"), None);
        assert_eq!(id("/welcome/home"), None);
    }
}
