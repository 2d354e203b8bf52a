//! Per-node state and the operations that keep it in sync with the document.

use serde_json::Value;
use smallvec::SmallVec;

use crate::config::Path;
use crate::dom::ElementId;
use crate::parser::DataParser;
use crate::tree::{Selection, Tree};

/// Identifier of a node: the element it is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) ElementId);

impl NodeId {
    /// The backing element.
    #[inline]
    pub const fn element(self) -> ElementId {
        self.0
    }
}

/// Structural role of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The top-level list; level 0, never selected or collapsed.
    Root,
    /// An item with child items.
    Branch,
    /// An item without child items.
    Leaf,
}

/// State attached to one structural element.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) element: ElementId,
    pub(crate) kind: NodeKind,
    pub(crate) level: u16,
    pub(crate) parent: Option<NodeId>,
    pub(crate) selected: bool,
    pub(crate) opened: bool,
}

impl Node {
    pub(crate) const fn root(element: ElementId) -> Self {
        Self {
            element,
            kind: NodeKind::Root,
            level: 0,
            parent: None,
            selected: false,
            opened: false,
        }
    }
}

/// Where new items go relative to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Append,
    Prepend,
    After,
    Before,
}

/// Read-only view of a node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub(crate) const fn new(tree: &'a Tree, node: &'a Node) -> Self {
        Self { tree, node }
    }

    pub const fn id(&self) -> NodeId {
        NodeId(self.node.element)
    }

    pub const fn element(&self) -> ElementId {
        self.node.element
    }

    pub const fn kind(&self) -> NodeKind {
        self.node.kind
    }

    pub const fn level(&self) -> u16 {
        self.node.level
    }

    pub fn is_root(&self) -> bool {
        self.node.kind == NodeKind::Root
    }

    pub const fn is_open(&self) -> bool {
        self.node.opened
    }

    pub const fn is_selected(&self) -> bool {
        self.node.selected
    }

    pub fn parent(&self) -> Option<Self> {
        self.node.parent.and_then(|id| self.tree.node(id))
    }

    /// 1-based sibling indices from the root down to this node.
    ///
    /// The root itself has an empty position.
    pub fn position(&self) -> Path {
        let doc = self.tree.document();
        let mut positions = Path::new();
        let mut current = *self;
        while !current.is_root() {
            let Some(index) = doc.index_in_parent(current.element()) else {
                break;
            };
            positions.push(index + 1);
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        positions.reverse();
        positions
    }

    /// Ancestors from the immediate parent up to the root.
    pub fn parents(&self) -> Vec<Self> {
        let mut parents = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            parents.push(node);
            current = node.parent();
        }
        parents
    }

    /// Child nodes; items that carry no node are skipped.
    pub fn children(&self) -> Vec<Self> {
        self.tree
            .child_list(self.node)
            .map(|list| {
                self.tree
                    .document()
                    .element_children(list)
                    .filter_map(|child| self.tree.node(NodeId(child)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Other nodes in the same list.
    pub fn siblings(&self) -> Vec<Self> {
        if self.is_root() {
            return Vec::new();
        }
        let doc = self.tree.document();
        doc.parent(self.element())
            .map(|list| {
                doc.element_children(list)
                    .filter(|sibling| *sibling != self.element())
                    .filter_map(|sibling| self.tree.node(NodeId(sibling)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns `true` if an item below this node carries the selected class.
    pub fn has_selected_descendant(&self) -> bool {
        self.tree.has_selected_descendant(self.element())
    }

    /// Whether the element carries the open marker class.
    pub fn has_open_class(&self) -> bool {
        self.tree
            .document()
            .has_class(self.element(), &self.tree.classes().open)
    }

    /// Whether the element shows a toggler (branch markup), even with no children yet.
    pub fn has_branch_class(&self) -> bool {
        self.tree
            .document()
            .has_class(self.element(), &self.tree.classes().branch)
    }

    /// Whether the element carries the children-selected marker class.
    pub fn has_children_selected_class(&self) -> bool {
        self.tree
            .document()
            .has_class(self.element(), &self.tree.classes().children_selected)
    }

    /// Visible text of the item, without nested lists and the toggler.
    pub fn label(&self) -> String {
        let toggler = &self.tree.classes().toggler;
        self.tree
            .document()
            .text_content_where(self.element(), |doc, id| {
                doc.is_tag(id, "ul") || doc.has_class(id, toggler)
            })
    }

    /// The toggler element of this item, if its markup has one.
    pub fn toggler(&self) -> Option<ElementId> {
        let doc = self.tree.document();
        let toggler = &self.tree.classes().toggler;
        let mut stack: SmallVec<[ElementId; 8]> = doc.element_children(self.element()).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            if doc.has_class(current, toggler) {
                return Some(current);
            }
            if doc.is_tag(current, "ul") {
                continue;
            }
            let children: SmallVec<[ElementId; 8]> = doc.element_children(current).collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    pub fn outer_html(&self) -> String {
        self.tree.document().outer_html(self.element())
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeRef").field(self.node).finish()
    }
}

/// Mutable handle to a node; every operation reports whether it applied.
pub struct NodeMut<'a> {
    tree: &'a mut Tree,
    id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub(crate) const fn new(tree: &'a mut Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Read-only view of the same node.
    pub fn view(&self) -> Option<NodeRef<'_>> {
        self.tree.node(self.id)
    }

    /// Opens the node; with `iterate`, also every non-root ancestor.
    pub fn open(&mut self, iterate: bool) -> bool {
        self.tree.open_node(self.id, iterate)
    }

    /// Closes the node; with `iterate`, also every descendant branch.
    pub fn close(&mut self, iterate: bool) -> bool {
        self.tree.close_node(self.id, iterate)
    }

    pub fn toggle_open(&mut self) -> bool {
        self.tree.toggle_open_node(self.id)
    }

    pub fn select(&mut self) -> bool {
        self.tree.select_node(self.id)
    }

    /// Unselects the node if the configuration allows it or `force` is set.
    pub fn unselect(&mut self, force: bool) -> bool {
        self.tree.unselect_node(self.id, force)
    }

    pub fn toggle_select(&mut self) -> bool {
        self.tree.toggle_select_node(self.id)
    }

    /// Promotes a leaf to a branch in place.
    pub fn to_branch(&mut self) -> bool {
        self.tree.to_branch_node(self.id)
    }

    /// Adds an item as the last child, promoting a leaf first.
    pub fn append(&mut self, item: &Value) -> bool {
        self.tree.insert_item(self.id, item, Placement::Append)
    }

    /// Adds an item as the first child, promoting a leaf first.
    pub fn prepend(&mut self, item: &Value) -> bool {
        self.tree.insert_item(self.id, item, Placement::Prepend)
    }

    /// Adds an item as the next sibling.
    pub fn after(&mut self, item: &Value) -> bool {
        self.tree.insert_item(self.id, item, Placement::After)
    }

    /// Adds an item as the previous sibling.
    pub fn before(&mut self, item: &Value) -> bool {
        self.tree.insert_item(self.id, item, Placement::Before)
    }

    /// Removes the node and its subtree from the document.
    pub fn remove(self) -> bool {
        self.tree.remove_node(self.id)
    }
}

impl Tree {
    fn state(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id.0)
    }

    fn state_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id.0)
    }

    /// The list element holding the node's children.
    pub(crate) fn child_list(&self, node: &Node) -> Option<ElementId> {
        match node.kind {
            NodeKind::Root => Some(node.element),
            NodeKind::Branch | NodeKind::Leaf => self.document.child_by_tag(node.element, "ul"),
        }
    }

    pub(crate) fn has_selected_descendant(&self, element: ElementId) -> bool {
        let doc = &self.document;
        doc.descendants(element)
            .any(|id| doc.is_tag(id, "li") && doc.has_class(id, &self.classes.selected))
    }

    fn has_child_items(&self, element: ElementId) -> bool {
        self.document
            .child_by_tag(element, "ul")
            .is_some_and(|list| self.document.child_by_tag(list, "li").is_some())
    }

    /// Nearest branch item above `element`, else its direct parent, else the root.
    fn resolve_parent(&self, element: ElementId) -> NodeId {
        let doc = &self.document;
        doc.ancestors(element)
            .find(|id| doc.is_tag(*id, "li") && doc.has_class(*id, &self.classes.branch))
            .or_else(|| doc.parent(element))
            .filter(|id| self.nodes.contains_key(id))
            .map_or(self.root, NodeId)
    }

    /// Creates a node for `element` and, recursively, for every item below it.
    pub(crate) fn attach(&mut self, element: ElementId, is_root: bool) {
        let node = if is_root {
            Node::root(element)
        } else {
            let kind = if self.has_child_items(element) {
                NodeKind::Branch
            } else {
                NodeKind::Leaf
            };
            let parent = self.resolve_parent(element);
            let level = self.state(parent).map_or(1, |p| p.level.saturating_add(1));
            Node {
                element,
                kind,
                level,
                parent: Some(parent),
                selected: false,
                opened: kind == NodeKind::Branch
                    && self.document.has_class(element, &self.classes.open),
            }
        };
        let list = self.child_list(&node);
        self.nodes.insert(element, node);

        if let Some(list) = list {
            let items: SmallVec<[ElementId; 16]> = self.document.children_by_tag(list, "li").collect();
            for item in items {
                self.attach(item, false);
            }
        }
    }

    pub(crate) fn open_node(&mut self, id: NodeId, iterate: bool) -> bool {
        let Some(node) = self.state_mut(id) else {
            return false;
        };
        if node.kind == NodeKind::Root {
            return false;
        }
        node.opened = true;
        let element = node.element;
        self.document.add_class(element, &self.classes.open);
        tracing::trace!(?element, iterate, "open");

        if iterate {
            let ancestors: SmallVec<[NodeId; 8]> = self
                .node(id)
                .map(|node| node.parents().iter().map(NodeRef::id).collect())
                .unwrap_or_default();
            for ancestor in ancestors {
                self.open_node(ancestor, false);
            }
        }

        if !self.config.multi_select && self.has_selected_descendant(element) {
            self.document
                .remove_class(element, &self.classes.children_selected);
        }
        true
    }

    pub(crate) fn close_node(&mut self, id: NodeId, iterate: bool) -> bool {
        let Some(node) = self.state_mut(id) else {
            return false;
        };
        if node.kind == NodeKind::Root {
            return false;
        }
        node.opened = false;
        let element = node.element;
        self.document.remove_class(element, &self.classes.open);
        tracing::trace!(?element, iterate, "close");

        if iterate {
            let branches: SmallVec<[NodeId; 8]> = self
                .node(id)
                .map(|node| {
                    node.children()
                        .iter()
                        .filter(|child| child.kind() == NodeKind::Branch)
                        .map(NodeRef::id)
                        .collect()
                })
                .unwrap_or_default();
            for branch in branches {
                self.close_node(branch, true);
            }
        }

        if !self.config.multi_select && self.has_selected_descendant(element) {
            self.document
                .add_class(element, &self.classes.children_selected);
        }
        true
    }

    pub(crate) fn toggle_open_node(&mut self, id: NodeId) -> bool {
        match self.state(id) {
            Some(node) if node.opened => self.close_node(id, false),
            Some(_) => self.open_node(id, false),
            None => false,
        }
    }

    pub(crate) fn select_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.state_mut(id) else {
            return false;
        };
        if node.kind == NodeKind::Root {
            return false;
        }
        node.selected = true;
        let element = node.element;
        self.document.add_class(element, &self.classes.selected);
        tracing::trace!(?element, "select");

        match &mut self.selection {
            Selection::Multi(list) => {
                if !list.contains(&id) {
                    list.push(id);
                }
            }
            Selection::Single(current) => {
                let previous = current.replace(id);
                if let Some(previous) = previous.filter(|prev| *prev != id) {
                    self.unselect_node(previous, true);
                }
            }
        }

        if !self.config.multi_select {
            let doc = &self.document;
            let stale: SmallVec<[ElementId; 4]> = doc
                .descendants(doc.host())
                .filter(|el| doc.is_tag(*el, "li") && doc.has_class(*el, &self.classes.children_selected))
                .collect();
            for el in stale {
                self.document
                    .remove_class(el, &self.classes.children_selected);
            }
        }
        true
    }

    pub(crate) fn unselect_node(&mut self, id: NodeId, force: bool) -> bool {
        if !(self.config.can_unselect || force) {
            return false;
        }
        let Some(node) = self.state_mut(id) else {
            return false;
        };
        if node.kind == NodeKind::Root {
            return false;
        }
        node.selected = false;
        let element = node.element;
        self.document.remove_class(element, &self.classes.selected);
        tracing::trace!(?element, force, "unselect");
        self.selection.forget(id);
        true
    }

    pub(crate) fn toggle_select_node(&mut self, id: NodeId) -> bool {
        match self.state(id) {
            Some(node) if node.selected => self.unselect_node(id, false),
            Some(_) => self.select_node(id),
            None => false,
        }
    }

    pub(crate) fn to_branch_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.state(id) else {
            return false;
        };
        if node.kind != NodeKind::Leaf {
            return false;
        }
        let element = node.element;

        // Items rendered as branches with an empty list only need the kind switch.
        if self.document.child_by_tag(element, "ul").is_none() {
            let content = Value::String(self.document.inner_html(element));
            let markup = format!("{}<ul></ul>", self.templates.branch(&self.classes, &content));
            self.document.set_inner_markup(element, &markup);
        }
        self.document.add_class(element, &self.classes.branch);

        let opened = self.document.has_class(element, &self.classes.open);
        if let Some(node) = self.state_mut(id) {
            node.kind = NodeKind::Branch;
            node.opened = opened;
        }
        true
    }

    pub(crate) fn insert_item(&mut self, id: NodeId, item: &Value, placement: Placement) -> bool {
        let Some(node) = self.state(id) else {
            return false;
        };
        let kind = node.kind;
        let element = node.element;

        let list = match placement {
            Placement::Append | Placement::Prepend => {
                if kind == NodeKind::Leaf && !self.to_branch_node(id) {
                    return false;
                }
                let Some(list) = self.state(id).and_then(|node| self.child_list(node)) else {
                    return false;
                };
                Some(list)
            }
            Placement::After | Placement::Before => {
                if kind == NodeKind::Root {
                    return false;
                }
                None
            }
        };

        let markup = DataParser::new(self.templates.as_ref(), &self.classes).node(item);
        let fragment = self.document.parse_fragment(&markup, "ul");

        match (placement, list) {
            (Placement::Append, Some(list)) => {
                for entry in &fragment {
                    self.document.append_child(list, *entry);
                }
            }
            (Placement::Prepend, Some(list)) => {
                for entry in fragment.iter().rev() {
                    self.document.prepend_child(list, *entry);
                }
            }
            (Placement::After, _) => {
                for entry in fragment.iter().rev() {
                    self.document.insert_after(element, *entry);
                }
            }
            (Placement::Before, _) => {
                for entry in &fragment {
                    self.document.insert_before(element, *entry);
                }
            }
            _ => return false,
        }

        for entry in fragment {
            if self.document.is_tag(entry, "li") {
                self.attach(entry, false);
            }
        }
        true
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.state(id) else {
            return false;
        };
        if node.kind == NodeKind::Root {
            return false;
        }
        let element = node.element;
        let freed = self.document.remove(element);
        tracing::trace!(?element, freed = freed.len(), "remove");
        for element in freed {
            if self.nodes.remove(&element).is_some() {
                self.selection.forget(NodeId(element));
            }
        }
        true
    }
}
