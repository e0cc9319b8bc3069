//! Enforcement rules: which DOM regions follow which capability.
//!
//! Rules are declared statically and evaluated over and over against a live
//! tree. Each rule governs a disjoint set of selectors, so evaluation order
//! across rules does not matter.

use serde::{Deserialize, Serialize};

use crate::authorization::{AuthorizationRecord, Capability};
use crate::error::{CoreError, Result};

/// The only attribute the engine ever writes on a host-owned node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presentation {
    /// Host default presentation (`display: ''`).
    Visible,
    /// Suppressed (`display: none`).
    Hidden,
}

impl Presentation {
    /// The inline `display` value for this presentation.
    pub fn display_value(self) -> &'static str {
        match self {
            Presentation::Visible => "",
            Presentation::Hidden => "none",
        }
    }
}

/// A (selector, required capability, visibility-if-granted) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementRule {
    /// Human-readable name used in logs.
    pub name: String,
    /// Selector for the candidate nodes.
    pub selector: String,
    /// When non-empty, only candidates whose trimmed text equals one of these match.
    pub labels: Vec<String>,
    /// When set, presentation is applied to the closest ancestor matching this
    /// selector instead of the candidate itself.
    pub target_ancestor: Option<String>,
    /// Capability consulted for this rule.
    pub required: Capability,
    /// Visibility when the capability is granted; the opposite applies when denied.
    pub visible_when_granted: bool,
}

impl EnforcementRule {
    /// Create a rule that shows its nodes iff `required` is granted.
    pub fn new(name: impl Into<String>, selector: impl Into<String>, required: Capability) -> Result<Self> {
        let selector = selector.into();
        if selector.trim().is_empty() {
            return Err(CoreError::EmptySelector);
        }
        Ok(Self {
            name: name.into(),
            selector,
            labels: Vec::new(),
            target_ancestor: None,
            required,
            visible_when_granted: true,
        })
    }

    /// Restrict matches to candidates with one of the given text labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Apply presentation to the closest ancestor matching `selector`.
    pub fn targeting_closest(mut self, selector: impl Into<String>) -> Self {
        self.target_ancestor = Some(selector.into());
        self
    }

    /// Invert the rule: hide when granted, show when denied.
    pub fn hidden_when_granted(mut self) -> Self {
        self.visible_when_granted = false;
        self
    }

    /// Whether a candidate's text satisfies the label filter.
    pub fn accepts_label(&self, text: Option<&str>) -> bool {
        if self.labels.is_empty() {
            return true;
        }
        let Some(text) = text else {
            return false;
        };
        let text = text.trim();
        self.labels.iter().any(|label| label == text)
    }

    /// The presentation this rule requires under `record`.
    pub fn desired(&self, record: &AuthorizationRecord) -> Presentation {
        if record.allows(self.required) == self.visible_when_granted {
            Presentation::Visible
        } else {
            Presentation::Hidden
        }
    }
}

/// The rule set guarding the spreadsheet UI.
pub fn standard_rules() -> Vec<EnforcementRule> {
    // Selectors are literals; construction cannot fail.
    let rule = |name: &str, selector: &str, capability| EnforcementRule {
        name: name.to_string(),
        selector: selector.to_string(),
        labels: Vec::new(),
        target_ancestor: None,
        required: capability,
        visible_when_granted: true,
    };

    vec![
        rule("add-column-button", ".mod-add-column", Capability::AlterStructure),
        rule("share-icon", ".test-tb-share", Capability::Export),
        rule("download-section", ".test-download-section", Capability::Export),
        rule("insert-column-menu-item", ".test-cmd-name", Capability::AlterStructure)
            .with_labels(["Insert column to the left", "Insert column to the right"])
            .targeting_closest("li"),
    ]
}
