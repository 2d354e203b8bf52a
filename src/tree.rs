use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::action::{TreeAction, TreeEvent};
use crate::config::{AutoOpen, ClassNames, TreeConfig};
use crate::dom::{Document, ElementId};
use crate::error::{Result, TreeError};
use crate::node::{Node, NodeId, NodeKind, NodeMut, NodeRef, Placement};
use crate::parser::{DataParser, HtmlParser};
use crate::template::TreeTemplates;

const HOST_TAG: &str = "div";

/// Current selection; its shape follows the `multi_select` option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// At most one selected node.
    Single(Option<NodeId>),
    /// Selected nodes in selection order.
    Multi(Vec<NodeId>),
}

impl Selection {
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Self::Single(node) => node.as_slice(),
            Self::Multi(nodes) => nodes,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.as_slice().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub(crate) fn forget(&mut self, id: NodeId) {
        match self {
            Self::Single(current) => {
                if *current == Some(id) {
                    *current = None;
                }
            }
            Self::Multi(nodes) => nodes.retain(|node| *node != id),
        }
    }
}

/// A tree bound to its own document.
///
/// Every list item of the tree carries one node; nodes are addressed by
/// [`NodeId`] or by a path of 1-based sibling indices from the root.
pub struct Tree {
    pub(crate) document: Document,
    // Element identity to node state; the only place nodes live.
    pub(crate) nodes: FxHashMap<ElementId, Node>,
    pub(crate) root: NodeId,
    pub(crate) selection: Selection,
    pub(crate) config: TreeConfig,
    pub(crate) classes: ClassNames,
    pub(crate) templates: Arc<dyn TreeTemplates>,
}

impl Tree {
    /// Builds a tree inside a host element holding `host_markup`.
    ///
    /// With `data_from_html` the first list found in the host markup is
    /// rewritten in place; otherwise the host content is replaced by the
    /// rendered `data`.
    pub fn new(host_markup: &str, config: TreeConfig) -> Result<Self> {
        let classes = config.class_names();
        let templates = Arc::clone(&config.templates);
        let mut document = Document::from_markup(HOST_TAG, host_markup);
        let host = document.host();

        let root_list = if config.data_from_html {
            let list = document
                .descendants(host)
                .find(|id| document.is_tag(*id, "ul"))
                .ok_or(TreeError::MissingList)?;
            HtmlParser::new(templates.as_ref(), &classes).render_tree(&mut document, list);
            list
        } else {
            let data = config.data.as_ref().ok_or(TreeError::MissingData)?;
            let markup = DataParser::new(templates.as_ref(), &classes).tree(data, true);
            document.set_inner_markup(host, &markup);
            document
                .child_by_tag(host, "ul")
                .ok_or(TreeError::MissingList)?
        };

        let selection = if config.multi_select {
            Selection::Multi(Vec::new())
        } else {
            Selection::Single(None)
        };

        let mut tree = Self {
            document,
            nodes: FxHashMap::default(),
            root: NodeId(root_list),
            selection,
            config,
            classes,
            templates,
        };
        tree.attach(root_list, true);
        tree.apply_auto_open();

        tracing::debug!(
            from_html = tree.config.data_from_html,
            multi_select = tree.config.multi_select,
            nodes = tree.nodes.len(),
            "tree built"
        );
        Ok(tree)
    }

    /// Builds a tree from an item collection.
    pub fn from_data(items: Value, config: TreeConfig) -> Result<Self> {
        Self::new("", config.with_data_from_html(false).with_data(items))
    }

    /// Builds a tree from existing list markup.
    pub fn from_html(markup: &str, config: TreeConfig) -> Result<Self> {
        Self::new(markup, config.with_data_from_html(true))
    }

    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub const fn classes(&self) -> &ClassNames {
        &self.classes
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Serialized content of the host element.
    pub fn html(&self) -> String {
        self.document.inner_html(self.document.host())
    }

    pub fn root(&self) -> NodeRef<'_> {
        // The root node is attached in `new` and never removed.
        self.node(self.root)
            .unwrap_or_else(|| unreachable!("root node is always attached"))
    }

    pub const fn root_id(&self) -> NodeId {
        self.root
    }

    /// Number of list items in the tree; the root is not counted.
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Returns `true` if the root holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(&id.0).map(|node| NodeRef::new(self, node))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<NodeMut<'_>> {
        if self.nodes.contains_key(&id.0) {
            Some(NodeMut::new(self, id))
        } else {
            None
        }
    }

    /// Node attached to `element`, if any.
    pub fn node_for_element(&self, element: ElementId) -> Option<NodeRef<'_>> {
        self.node(NodeId(element))
    }

    /// Resolves a path of 1-based sibling indices from the root.
    ///
    /// Empty paths, zero indices and out-of-range indices resolve to `None`.
    pub fn get(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        self.resolve(path).and_then(|id| self.node(id))
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<NodeMut<'_>> {
        let id = self.resolve(path)?;
        self.node_mut(id)
    }

    fn resolve(&self, path: &[usize]) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        let mut current = self.root;
        for &index in path {
            let node = self.nodes.get(&current.0)?;
            let list = self.child_list(node)?;
            let child = self
                .document
                .element_children(list)
                .nth(index.checked_sub(1)?)?;
            if !self.nodes.contains_key(&child) {
                return None;
            }
            current = NodeId(child);
        }
        Some(current)
    }

    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected nodes in selection order.
    pub fn selected(&self) -> Vec<NodeRef<'_>> {
        self.selection
            .as_slice()
            .iter()
            .filter_map(|id| self.node(*id))
            .collect()
    }

    pub fn open(&mut self, path: &[usize], iterate: bool) -> bool {
        self.resolve(path)
            .is_some_and(|id| self.open_node(id, iterate))
    }

    pub fn close(&mut self, path: &[usize], iterate: bool) -> bool {
        self.resolve(path)
            .is_some_and(|id| self.close_node(id, iterate))
    }

    pub fn toggle_open(&mut self, path: &[usize]) -> bool {
        self.resolve(path)
            .is_some_and(|id| self.toggle_open_node(id))
    }

    pub fn select(&mut self, path: &[usize]) -> bool {
        self.resolve(path).is_some_and(|id| self.select_node(id))
    }

    pub fn unselect(&mut self, path: &[usize]) -> bool {
        self.resolve(path)
            .is_some_and(|id| self.unselect_node(id, false))
    }

    pub fn toggle_select(&mut self, path: &[usize]) -> bool {
        self.resolve(path)
            .is_some_and(|id| self.toggle_select_node(id))
    }

    pub fn append(&mut self, path: &[usize], item: &Value) -> bool {
        self.insert_at(path, item, Placement::Append)
    }

    pub fn prepend(&mut self, path: &[usize], item: &Value) -> bool {
        self.insert_at(path, item, Placement::Prepend)
    }

    pub fn after(&mut self, path: &[usize], item: &Value) -> bool {
        self.insert_at(path, item, Placement::After)
    }

    pub fn before(&mut self, path: &[usize], item: &Value) -> bool {
        self.insert_at(path, item, Placement::Before)
    }

    fn insert_at(&mut self, path: &[usize], item: &Value, placement: Placement) -> bool {
        self.resolve(path)
            .is_some_and(|id| self.insert_item(id, item, placement))
    }

    pub fn remove(&mut self, path: &[usize]) -> bool {
        self.resolve(path).is_some_and(|id| self.remove_node(id))
    }

    /// Runs a path-addressed command.
    pub fn dispatch(&mut self, action: &TreeAction) -> TreeEvent {
        tracing::debug!(?action, "dispatch");
        let applied = match action {
            TreeAction::Open { path, iterate } => self.open(path, *iterate),
            TreeAction::Close { path, iterate } => self.close(path, *iterate),
            TreeAction::ToggleOpen { path } => self.toggle_open(path),
            TreeAction::Select { path } => self.select(path),
            TreeAction::Unselect { path } => self.unselect(path),
            TreeAction::ToggleSelect { path } => self.toggle_select(path),
            TreeAction::Append { path, data } => self.append(path, data),
            TreeAction::Prepend { path, data } => self.prepend(path, data),
            TreeAction::After { path, data } => self.after(path, data),
            TreeAction::Before { path, data } => self.before(path, data),
            TreeAction::Remove { path } => self.remove(path),
        };
        applied.into()
    }

    /// Handles a click on `target`.
    ///
    /// The nearest toggler or list item around the target decides the effect:
    /// a toggler flips the open state of its item, anything else inside an
    /// item flips the item's selection.
    pub fn click(&mut self, target: ElementId) -> TreeEvent {
        let doc = &self.document;
        let toggler = &self.classes.toggler;
        let Some(hit) = doc.closest(target, |doc, id| {
            doc.has_class(id, toggler) || doc.is_tag(id, "li")
        }) else {
            return TreeEvent::Unhandled;
        };
        let Some(item) = doc.closest(target, |doc, id| doc.is_tag(id, "li")) else {
            return TreeEvent::Unhandled;
        };
        if !self.nodes.contains_key(&item) {
            return TreeEvent::Unhandled;
        }
        let id = NodeId(item);

        let on_toggler = doc.has_class(hit, toggler);
        tracing::debug!(element = ?item, on_toggler, "click");
        if on_toggler {
            self.toggle_open_node(id).into()
        } else {
            self.toggle_select_node(id).into()
        }
    }

    fn apply_auto_open(&mut self) {
        let depth = match self.config.auto_open.clone() {
            AutoOpen::Disabled => return,
            AutoOpen::AllBranches => u16::MAX,
            AutoOpen::MaxDepth(depth) => depth,
            AutoOpen::Path(path) => {
                match self.resolve(&path) {
                    Some(id) => {
                        self.open_node(id, true);
                    }
                    None => tracing::debug!(?path, "auto-open path does not resolve"),
                }
                return;
            }
        };

        let doc = &self.document;
        let branches: SmallVec<[NodeId; 16]> = doc
            .descendants(self.root.0)
            .filter(|id| doc.is_tag(*id, "li"))
            .filter_map(|id| self.nodes.get(&id).map(|node| (id, node)))
            .filter(|(_, node)| node.kind == NodeKind::Branch && node.level <= depth)
            .map(|(id, _)| NodeId(id))
            .collect();
        for id in branches {
            self.open_node(id, false);
        }
    }
}

impl std::fmt::Debug for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("selection", &self.selection)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
