//! In-memory document tree.
//!
//! Reference [`DomTree`] used by tests and headless hosts. Structural
//! changes publish one [`MutationBatch`] each; presentation writes publish
//! nothing and are counted instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use docguard_core::Presentation;
use tokio::sync::broadcast;

use crate::error::{DomError, Result};
use crate::selector::{Element, Selector};
use crate::tree::{DomTree, MutationBatch, NodeId};

const EVENT_CAPACITY: usize = 64;

/// Description of a subtree to insert.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: Option<String>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    presentation: Presentation,
}

impl Element for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn element_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    body: NodeId,
}

impl Tree {
    fn insert(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                tag: spec.tag,
                id: spec.id,
                classes: spec.classes,
                text: spec.text,
                parent: Some(parent),
                children: Vec::new(),
                presentation: Presentation::Visible,
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        for child in spec.children {
            self.insert(id, child);
        }
        id
    }

    fn detach(&mut self, node: NodeId) {
        let Some(removed) = self.nodes.remove(&node) else {
            return;
        };
        for child in removed.children {
            self.detach(child);
        }
    }

    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.body];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: NodeId) -> Option<String> {
        let root = self.nodes.get(&node)?;
        let mut out = root.text.clone().unwrap_or_default();
        for child in &root.children {
            if let Some(t) = self.text_content(*child) {
                out.push_str(&t);
            }
        }
        Some(out)
    }
}

/// In-memory [`DomTree`] with a body root.
#[derive(Debug)]
pub struct MemoryDom {
    tree: RwLock<Tree>,
    events: broadcast::Sender<MutationBatch>,
    writes: AtomicU64,
}

impl MemoryDom {
    /// Create an empty document containing only `body`.
    pub fn new() -> Self {
        let body = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            body,
            Node {
                tag: "body".to_string(),
                id: None,
                classes: Vec::new(),
                text: None,
                parent: None,
                children: Vec::new(),
                presentation: Presentation::Visible,
            },
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tree: RwLock::new(Tree {
                nodes,
                next_id: 1,
                body,
            }),
            events,
            writes: AtomicU64::new(0),
        }
    }

    pub fn body(&self) -> NodeId {
        self.read(|t| t.body)
    }

    /// Insert a subtree under `parent` and publish one batch.
    pub fn append(&self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        let id = self.write(|t| {
            if !t.nodes.contains_key(&parent) {
                return Err(DomError::NodeGone(parent));
            }
            Ok(t.insert(parent, spec))
        })?;
        self.publish(MutationBatch {
            added: vec![id],
            removed: Vec::new(),
        });
        Ok(id)
    }

    /// Insert several subtrees under `parent` as a single batch.
    pub fn append_all(
        &self,
        parent: NodeId,
        specs: impl IntoIterator<Item = NodeSpec>,
    ) -> Result<Vec<NodeId>> {
        let added = self.write(|t| {
            if !t.nodes.contains_key(&parent) {
                return Err(DomError::NodeGone(parent));
            }
            Ok(specs.into_iter().map(|s| t.insert(parent, s)).collect::<Vec<_>>())
        })?;
        self.publish(MutationBatch {
            added: added.clone(),
            removed: Vec::new(),
        });
        Ok(added)
    }

    /// Remove `node` and its subtree and publish one batch.
    pub fn remove(&self, node: NodeId) -> Result<()> {
        self.write(|t| {
            if node == t.body {
                return Ok(());
            }
            let parent = t
                .nodes
                .get(&node)
                .ok_or(DomError::NodeGone(node))?
                .parent;
            if let Some(p) = parent.and_then(|p| t.nodes.get_mut(&p)) {
                p.children.retain(|c| *c != node);
            }
            t.detach(node);
            Ok(())
        })?;
        self.publish(MutationBatch {
            added: Vec::new(),
            removed: vec![node],
        });
        Ok(())
    }

    /// Replace the text of `node`. Text edits are not child-list mutations.
    pub fn set_text(&self, node: NodeId, text: impl Into<String>) -> Result<()> {
        self.write(|t| {
            let n = t.nodes.get_mut(&node).ok_or(DomError::NodeGone(node))?;
            n.text = Some(text.into());
            Ok(())
        })
    }

    /// Number of presentation writes performed so far.
    pub fn presentation_writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.read(|t| t.nodes.contains_key(&node))
    }

    fn publish(&self, batch: MutationBatch) {
        // No subscribers is fine.
        let _ = self.events.send(batch);
    }

    fn read<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        let guard = self.tree.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        let mut guard = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree for MemoryDom {
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.read(|t| {
            t.document_order()
                .into_iter()
                .filter(|id| t.nodes.get(id).is_some_and(|n| selector.matches(n)))
                .collect()
        }))
    }

    fn text_of(&self, node: NodeId) -> Option<String> {
        self.read(|t| t.text_content(node))
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        Ok(self.read(|t| {
            let mut cursor = Some(node);
            while let Some(id) = cursor {
                let n = t.nodes.get(&id)?;
                if selector.matches(n) {
                    return Some(id);
                }
                cursor = n.parent;
            }
            None
        }))
    }

    fn presentation(&self, node: NodeId) -> Option<Presentation> {
        self.read(|t| t.nodes.get(&node).map(|n| n.presentation))
    }

    fn set_presentation(&self, node: NodeId, presentation: Presentation) -> Result<()> {
        self.write(|t| {
            let n = t.nodes.get_mut(&node).ok_or(DomError::NodeGone(node))?;
            n.presentation = presentation;
            Ok(())
        })?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationBatch> {
        self.events.subscribe()
    }
}
