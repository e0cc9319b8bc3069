//! Reconciler: keeps each rule's targets at their desired presentation.

use std::sync::Arc;

use docguard_core::{AuthorizationRecord, EnforcementRule, Presentation};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{DomError, Result};
use crate::tree::{DomTree, MutationBatch, NodeId};

/// The record a rule is enforced against. Each replacement triggers a pass.
pub type RecordFeed = watch::Receiver<Arc<AuthorizationRecord>>;

/// A feed that never changes.
pub fn fixed_record(record: AuthorizationRecord) -> RecordFeed {
    let (_, rx) = watch::channel(Arc::new(record));
    rx
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Targets the rule currently governs.
    pub matched: usize,
    /// Targets whose presentation had to change.
    pub written: usize,
}

/// Applies enforcement rules to a [`DomTree`].
#[derive(Clone)]
pub struct Reconciler {
    dom: Arc<dyn DomTree>,
}

impl Reconciler {
    pub fn new(dom: Arc<dyn DomTree>) -> Self {
        Self { dom }
    }

    /// Run one pass of `rule` against the current tree.
    ///
    /// Only targets whose presentation differs from the desired one are
    /// written, so repeating a pass on an unchanged tree writes nothing.
    pub fn apply(&self, rule: &EnforcementRule, record: &AuthorizationRecord) -> Result<PassReport> {
        let desired = rule.desired(record);
        let mut report = PassReport::default();

        for candidate in self.dom.query_all(&rule.selector)? {
            if !rule.accepts_label(self.dom.text_of(candidate).as_deref()) {
                continue;
            }
            let Some(target) = self.target_of(rule, candidate)? else {
                continue;
            };
            report.matched += 1;
            if self.correct(target, desired)? {
                report.written += 1;
            }
        }

        if report.written > 0 {
            debug!(
                rule = %rule.name,
                matched = report.matched,
                written = report.written,
                ?desired,
                "reconciled rule"
            );
        }
        Ok(report)
    }

    /// Install `rule`: one pass now, then one pass per mutation batch and
    /// per record update.
    ///
    /// The subscription is taken before the initial pass so that no batch
    /// published in between is missed. An invalid selector is reported here
    /// and nothing is spawned.
    pub fn enforce(&self, rule: EnforcementRule, mut records: RecordFeed) -> Result<EnforcementHandle> {
        let events = self.dom.subscribe();
        let record = Arc::clone(&records.borrow_and_update());
        self.apply(&rule, &record)?;

        let (passes_tx, passes_rx) = watch::channel(1u64);
        let name = rule.name.clone();
        let reconciler = self.clone();
        let task = tokio::spawn(async move {
            reconciler.follow(rule, records, events, passes_tx).await;
        });

        Ok(EnforcementHandle {
            rule: name,
            passes: passes_rx,
            task,
        })
    }

    /// Install every rule in `rules` against the same record feed.
    pub fn enforce_all(
        &self,
        rules: impl IntoIterator<Item = EnforcementRule>,
        records: RecordFeed,
    ) -> Result<Vec<EnforcementHandle>> {
        rules
            .into_iter()
            .map(|rule| self.enforce(rule, records.clone()))
            .collect()
    }

    async fn follow(
        &self,
        rule: EnforcementRule,
        mut records: RecordFeed,
        mut events: broadcast::Receiver<MutationBatch>,
        passes: watch::Sender<u64>,
    ) {
        let mut records_open = true;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        debug!(rule = %rule.name, missed, "mutation stream lagged, running full pass");
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = records.changed(), if records_open => {
                    if changed.is_err() {
                        // The current record is final.
                        records_open = false;
                        continue;
                    }
                    debug!(rule = %rule.name, "authorization record replaced");
                }
            }

            // Batches already queued are covered by the pass below.
            loop {
                match events.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }

            let record = Arc::clone(&records.borrow_and_update());
            if let Err(e) = self.apply(&rule, &record) {
                warn!(rule = %rule.name, error = %e, "reconciliation pass failed");
            }
            passes.send_modify(|n| *n += 1);
        }
        debug!(rule = %rule.name, "mutation stream closed, enforcement stopped");
    }

    fn target_of(&self, rule: &EnforcementRule, candidate: NodeId) -> Result<Option<NodeId>> {
        match &rule.target_ancestor {
            Some(selector) => self.dom.closest(candidate, selector),
            None => Ok(Some(candidate)),
        }
    }

    /// Returns whether a write was made.
    fn correct(&self, target: NodeId, desired: Presentation) -> Result<bool> {
        match self.dom.presentation(target) {
            Some(current) if current == desired => Ok(false),
            None => Ok(false),
            Some(_) => match self.dom.set_presentation(target, desired) {
                Ok(()) => Ok(true),
                // Detached between read and write; the next batch covers it.
                Err(DomError::NodeGone(_)) => Ok(false),
                Err(e) => Err(e),
            },
        }
    }
}

/// A running enforcement of one rule.
#[derive(Debug)]
pub struct EnforcementHandle {
    rule: String,
    passes: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl EnforcementHandle {
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Number of passes completed, including the initial one.
    pub fn passes(&self) -> u64 {
        *self.passes.borrow()
    }

    /// Wait until more than `after` passes have completed.
    ///
    /// Returns the pass count, or the last known count if enforcement ended.
    pub async fn wait_past(&mut self, after: u64) -> u64 {
        let reached = self.passes.wait_for(|n| *n > after).await.map(|n| *n);
        match reached {
            Ok(n) => n,
            Err(_) => *self.passes.borrow(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop watching for mutations.
    pub fn stop(&self) {
        self.task.abort();
    }
}
