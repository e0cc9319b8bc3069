//! The Engine: resolve, authorize, enforce, and time out.
//!
//! The engine owns no host state. It is wired to the host through
//! [`HostPorts`] and produces an [`EngineHandle`] once started.

use std::sync::Arc;

use docguard_authz::{AuthorizationLoader, DataApi, LoaderConfig};
use docguard_core::{standard_rules, AuthorizationRecord, DocumentIdentity, EnforcementRule};
use docguard_dom::{DomTree, EnforcementHandle, Reconciler, Selector};
use docguard_identity::{HostState, IdentityResolver, Outbound, PageLocation, ResolverConfig};
use docguard_session::{
    ActivitySender, Navigator, SessionConfig, SessionHandle, SessionRunner, SessionUi,
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;

/// Configuration for the Engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identity resolution bounds.
    pub identity: ResolverConfig,
    /// Authorization endpoints.
    pub authz: LoaderConfig,
    /// Idle session settings.
    pub session: SessionConfig,
    /// Rules to enforce.
    pub rules: Vec<EnforcementRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            identity: ResolverConfig::default(),
            authz: LoaderConfig::default(),
            session: SessionConfig::default(),
            rules: standard_rules(),
        }
    }
}

/// The host collaborators the engine talks to.
#[derive(Clone)]
pub struct HostPorts {
    pub host_state: Arc<dyn HostState>,
    pub location: Arc<dyn PageLocation>,
    pub data_api: Arc<dyn DataApi>,
    pub dom: Arc<dyn DomTree>,
    pub ui: Arc<dyn SessionUi>,
    pub navigator: Arc<dyn Navigator>,
}

/// The main Engine struct.
pub struct Engine {
    config: EngineConfig,
    resolver: IdentityResolver,
    loader: AuthorizationLoader,
    reconciler: Reconciler,
    ui: Arc<dyn SessionUi>,
    navigator: Arc<dyn Navigator>,
}

impl Engine {
    /// Create an engine.
    ///
    /// Fails if a rule carries an unparseable selector, or if the session
    /// settings could not run the shortest valid idle timeout.
    pub fn new(ports: HostPorts, config: EngineConfig) -> Result<Self> {
        for rule in &config.rules {
            Selector::parse(&rule.selector)?;
            if let Some(ancestor) = &rule.target_ancestor {
                Selector::parse(ancestor)?;
            }
        }
        config.session.validate()?;

        Ok(Self {
            resolver: IdentityResolver::new(config.identity.clone(), ports.host_state, ports.location),
            loader: AuthorizationLoader::new(ports.data_api, config.authz.clone()),
            reconciler: Reconciler::new(ports.dom),
            ui: ports.ui,
            navigator: ports.navigator,
            config,
        })
    }

    /// Wrap the host's outbound channel. Call at load time, before any traffic.
    ///
    /// The host must send through the returned channel. Wrapping an
    /// already-wrapped channel returns it unchanged.
    pub fn install_sniffer(&self, channel: Arc<dyn Outbound>) -> Arc<dyn Outbound> {
        self.resolver.install_sniffer(channel)
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Startup
    // ─────────────────────────────────────────────────────────────────────────

    /// Run the page-ready sequence.
    ///
    /// Rules are installed against the fail-closed record before anything
    /// is awaited, so guarded UI is hidden while identity and authorization
    /// are still pending. The loaded record then replaces it, and this
    /// returns once every rule has reconciled against it. Identity and
    /// authorization failures leave the fail-closed record in force.
    pub async fn start(&self) -> Result<EngineHandle> {
        let (records, feed) = watch::channel(Arc::new(AuthorizationRecord::fail_closed()));
        let mut enforcements = self
            .reconciler
            .enforce_all(self.config.rules.iter().cloned(), feed)?;

        let document = self.resolver.resolve().await;
        let record = match &document {
            Some(doc) => self.loader.load(doc).await,
            None => {
                warn!("no document identity, applying fail-closed defaults");
                AuthorizationRecord::fail_closed()
            }
        };
        let record = Arc::new(record);

        // Session settings were validated against the minimum timeout in `new`.
        let session = SessionRunner::new(
            self.config.session.clone(),
            Arc::clone(&self.ui),
            Arc::clone(&self.navigator),
        )
        .spawn(record.idle_timeout())?;

        let passes: Vec<u64> = enforcements.iter().map(EnforcementHandle::passes).collect();
        records.send_replace(Arc::clone(&record));
        for (handle, before) in enforcements.iter_mut().zip(passes) {
            handle.wait_past(before).await;
        }

        info!(
            doc_id = document.as_ref().map(DocumentIdentity::as_str).unwrap_or("-"),
            alter_structure = record.can_alter_structure,
            export = record.can_export,
            timeout_minutes = record.idle_timeout_minutes,
            rules = enforcements.len(),
            "engine started"
        );

        Ok(EngineHandle {
            document,
            record,
            enforcements,
            session,
        })
    }
}

/// A started engine.
#[derive(Debug)]
pub struct EngineHandle {
    document: Option<DocumentIdentity>,
    record: Arc<AuthorizationRecord>,
    enforcements: Vec<EnforcementHandle>,
    session: SessionHandle,
}

impl EngineHandle {
    /// The resolved document, if any.
    pub fn document(&self) -> Option<&DocumentIdentity> {
        self.document.as_ref()
    }

    /// The record in force. Shared read-only by every component.
    pub fn record(&self) -> &AuthorizationRecord {
        &self.record
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn enforcements(&self) -> &[EnforcementHandle] {
        &self.enforcements
    }

    pub fn enforcements_mut(&mut self) -> &mut [EnforcementHandle] {
        &mut self.enforcements
    }

    /// Sender for the host's input listeners.
    pub fn activity(&self) -> ActivitySender {
        self.session.activity()
    }

    /// Wait until every rule has run one more pass, e.g. after a tree mutation.
    pub async fn settle(&mut self) {
        for handle in &mut self.enforcements {
            let before = handle.passes();
            handle.wait_past(before).await;
        }
    }

    /// Stop enforcement and the session timers without terminating.
    pub fn stop(&self) {
        for handle in &self.enforcements {
            handle.stop();
        }
        self.session.stop();
    }
}
