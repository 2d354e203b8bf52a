//! Arena-backed presentation document the tree reads structure from and writes state into.

use html5ever::QualName;
use markup5ever_rcdom::{Handle, NodeData};
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::markup::{self, Scope, attr_name, html_name};

new_key_type! {
    /// Handle to an entry (element or text run) of a [`Document`].
    ///
    /// Handles are generational: once an entry is removed its handle never
    /// resolves again, even after the slot is reused.
    pub struct ElementId;
}

/// Tag, classes and attributes of an element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementData {
    name: QualName,
    classes: SmallVec<[String; 2]>,
    attrs: Vec<(QualName, String)>,
}

impl ElementData {
    fn new(name: QualName) -> Self {
        Self {
            name,
            classes: SmallVec::new(),
            attrs: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.name.local
    }

    pub const fn name(&self) -> &QualName {
        &self.name
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Attributes other than `class`, in source order.
    pub fn attrs(&self) -> &[(QualName, String)] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find_map(|(key, value)| (&*key.local == name).then_some(value.as_str()))
    }
}

#[derive(Clone, Debug)]
enum Content {
    Element(ElementData),
    Text(String),
}

#[derive(Clone, Debug)]
struct Slot {
    content: Content,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// Mutable element tree with a fixed host element.
#[derive(Clone, Debug)]
pub struct Document {
    slots: SlotMap<ElementId, Slot>,
    host: ElementId,
}

impl Document {
    /// Creates an empty document whose host element has the given tag.
    pub fn new(host_tag: &str) -> Self {
        let mut slots = SlotMap::with_key();
        let host = slots.insert(Slot {
            content: Content::Element(ElementData::new(html_name(host_tag))),
            parent: None,
            children: Vec::new(),
        });
        Self { slots, host }
    }

    /// Creates a document and fills its host element with parsed markup.
    pub fn from_markup(host_tag: &str, markup: &str) -> Self {
        let mut doc = Self::new(host_tag);
        doc.set_inner_markup(doc.host, markup);
        doc
    }

    /// The element the document is bound to.
    #[inline]
    pub const fn host(&self) -> ElementId {
        self.host
    }

    /// Returns `true` if the handle names a live entry.
    pub fn contains(&self, id: ElementId) -> bool {
        self.slots.contains_key(id)
    }

    /// Returns `true` if the entry is the host or one of its descendants.
    pub fn is_attached(&self, id: ElementId) -> bool {
        id == self.host || self.ancestors(id).any(|ancestor| ancestor == self.host)
    }

    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.alloc(Content::Element(ElementData::new(html_name(tag))))
    }

    pub fn create_text(&mut self, text: &str) -> ElementId {
        self.alloc(Content::Text(text.to_owned()))
    }

    fn alloc(&mut self, content: Content) -> ElementId {
        self.slots.insert(Slot {
            content,
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementData> {
        match &self.slots.get(id)?.content {
            Content::Element(data) => Some(data),
            Content::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        match &mut self.slots.get_mut(id)?.content {
            Content::Element(data) => Some(data),
            Content::Text(_) => None,
        }
    }

    pub fn text(&self, id: ElementId) -> Option<&str> {
        match &self.slots.get(id)?.content {
            Content::Text(text) => Some(text),
            Content::Element(_) => None,
        }
    }

    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    pub fn is_tag(&self, id: ElementId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.slots.get(id)?.parent
    }

    /// All child entries, text runs included.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.slots
            .get(id)
            .map_or(&[], |slot| slot.children.as_slice())
    }

    /// Child elements in document order.
    pub fn element_children(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Child elements with the given tag.
    pub fn children_by_tag<'a>(
        &'a self,
        id: ElementId,
        tag: &'a str,
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.element_children(id)
            .filter(move |child| self.is_tag(*child, tag))
    }

    /// First child element with the given tag.
    pub fn child_by_tag(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        self.children_by_tag(id, tag).next()
    }

    /// Position among the parent's child elements (0-based).
    pub fn index_in_parent(&self, id: ElementId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.element_children(parent).position(|child| child == id)
    }

    /// Ancestors from the parent up to the top of the detached or attached tree.
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Nearest ancestor-or-self element satisfying `pred`.
    pub fn closest<F>(&self, id: ElementId, pred: F) -> Option<ElementId>
    where
        F: Fn(&Self, ElementId) -> bool,
    {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|candidate| self.element(*candidate).is_some() && pred(self, *candidate))
    }

    /// Descendant elements in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: ElementId) -> Descendants<'_> {
        let mut stack: Vec<ElementId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.element(id)
            .is_some_and(|data| data.classes.iter().any(|c| c == class))
    }

    /// Adds a class; returns `false` if it was already present.
    pub fn add_class(&mut self, id: ElementId, class: &str) -> bool {
        let Some(data) = self.element_mut(id) else {
            return false;
        };
        if data.classes.iter().any(|c| c == class) {
            return false;
        }
        data.classes.push(class.to_owned());
        true
    }

    /// Removes a class; returns `false` if it was absent.
    pub fn remove_class(&mut self, id: ElementId, class: &str) -> bool {
        let Some(data) = self.element_mut(id) else {
            return false;
        };
        let before = data.classes.len();
        data.classes.retain(|c| c != class);
        data.classes.len() != before
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) {
        let Some(data) = self.element_mut(id) else {
            return;
        };
        if let Some(entry) = data.attrs.iter_mut().find(|(key, _)| &*key.local == name) {
            entry.1 = value.to_owned();
        } else {
            data.attrs.push((attr_name(name), value.to_owned()));
        }
    }

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        if let Some(slot) = self.slots.get_mut(parent) {
            slot.children.push(child);
        } else {
            return;
        }
        self.set_parent(child, Some(parent));
    }

    /// Inserts `child` as the first child of `parent`, detaching it first.
    pub fn prepend_child(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        if let Some(slot) = self.slots.get_mut(parent) {
            slot.children.insert(0, child);
        } else {
            return;
        }
        self.set_parent(child, Some(parent));
    }

    /// Inserts `node` immediately before `reference`.
    pub fn insert_before(&mut self, reference: ElementId, node: ElementId) {
        self.insert_relative(reference, node, 0);
    }

    /// Inserts `node` immediately after `reference`.
    pub fn insert_after(&mut self, reference: ElementId, node: ElementId) {
        self.insert_relative(reference, node, 1);
    }

    fn insert_relative(&mut self, reference: ElementId, node: ElementId, shift: usize) {
        if reference == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let Some(slot) = self.slots.get_mut(parent) else {
            return;
        };
        let Some(at) = slot.children.iter().position(|child| *child == reference) else {
            return;
        };
        slot.children.insert(at + shift, node);
        self.set_parent(node, Some(parent));
    }

    fn set_parent(&mut self, id: ElementId, parent: Option<ElementId>) {
        if let Some(slot) = self.slots.get_mut(id) {
            slot.parent = parent;
        }
    }

    /// Unlinks an entry from its parent, keeping its subtree alive.
    pub fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(parent) {
            slot.children.retain(|child| *child != id);
        }
        self.set_parent(id, None);
    }

    /// Detaches an entry and frees it with its whole subtree.
    ///
    /// Returns every freed handle so owners of per-element metadata can drop it.
    /// The host element cannot be removed.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        if id == self.host || !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        let mut freed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.slots.remove(current) {
                stack.extend(slot.children);
                freed.push(current);
            }
        }
        freed
    }

    /// Parses markup as the content of a `context` element into detached
    /// entries and returns the top-level handles.
    ///
    /// Malformed markup is repaired the way a browser repairs it; comments
    /// and doctypes are dropped.
    pub fn parse_fragment(&mut self, markup: &str, context: &str) -> Vec<ElementId> {
        markup::parse_nodes(markup, context)
            .iter()
            .filter_map(|handle| self.import(handle))
            .collect()
    }

    fn import(&mut self, handle: &Handle) -> Option<ElementId> {
        match &handle.data {
            NodeData::Text { contents } => {
                Some(self.alloc(Content::Text((**contents.borrow()).to_owned())))
            }
            NodeData::Element { name, attrs, .. } => {
                let class_name = attr_name("class");
                let mut data = ElementData::new(name.clone());
                for attr in attrs.borrow().iter() {
                    if attr.name == class_name {
                        for class in attr.value.split_ascii_whitespace() {
                            if !data.classes.iter().any(|c| c == class) {
                                data.classes.push(class.to_owned());
                            }
                        }
                    } else {
                        data.attrs
                            .push((attr.name.clone(), (*attr.value).to_owned()));
                    }
                }
                let id = self.alloc(Content::Element(data));
                for child in handle.children.borrow().iter() {
                    if let Some(child_id) = self.import(child) {
                        self.append_child(id, child_id);
                    }
                }
                Some(id)
            }
            _ => None,
        }
    }

    /// Replaces the children of `id` with markup parsed in the context of its tag.
    pub fn set_inner_markup(&mut self, id: ElementId, markup: &str) -> Vec<ElementId> {
        let context = self.tag(id).unwrap_or("div").to_owned();
        let fresh = self.parse_fragment(markup, &context);
        for child in self.children(id).to_vec() {
            self.remove(child);
        }
        for child in &fresh {
            self.append_child(id, *child);
        }
        fresh
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, id: ElementId) -> String {
        self.text_content_where(id, |_, _| false)
    }

    /// Concatenated text of the subtree, skipping elements matched by `skip`.
    pub fn text_content_where<F>(&self, id: ElementId, skip: F) -> String
    where
        F: Fn(&Self, ElementId) -> bool,
    {
        let mut out = String::new();
        self.collect_text(id, &skip, &mut out);
        out
    }

    fn collect_text<F>(&self, id: ElementId, skip: &F, out: &mut String)
    where
        F: Fn(&Self, ElementId) -> bool,
    {
        for child in self.children(id) {
            if let Some(text) = self.text(*child) {
                out.push_str(text);
            } else if !skip(self, *child) {
                self.collect_text(*child, skip, out);
            }
        }
    }

    /// Serialized children of `id`.
    pub fn inner_html(&self, id: ElementId) -> String {
        markup::to_html(self, id, Scope::Inner)
    }

    /// Serialized entry including its own tag.
    pub fn outer_html(&self, id: ElementId) -> String {
        if !self.contains(id) {
            return String::new();
        }
        markup::to_html(self, id, Scope::Outer)
    }
}

/// Iterator over the ancestors of an entry.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<ElementId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<ElementId>,
}

impl Iterator for Descendants<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if self.doc.element(current).is_none() {
                continue;
            }
            self.stack
                .extend(self.doc.children(current).iter().rev().copied());
            return Some(current);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<ul class="tree"><li>A</li><li class="tree-branch"><div>B</div><ul><li>C</li><li>D</li></ul></li></ul>"#;

    fn sample() -> Document {
        Document::from_markup("div", SAMPLE)
    }

    fn list(doc: &Document) -> ElementId {
        doc.child_by_tag(doc.host(), "ul").unwrap()
    }

    #[test]
    fn round_trips_markup() {
        let doc = sample();
        assert_eq!(doc.inner_html(doc.host()), SAMPLE);
        assert_eq!(doc.outer_html(list(&doc)), SAMPLE);
    }

    #[test]
    fn escaped_values_round_trip() {
        let markup = r#"<ul class="a&amp;b"><li title="say &quot;hi&quot;">1 &lt; 2 &amp; 3</li></ul>"#;
        let doc = Document::from_markup("div", markup);
        let root = list(&doc);
        let item = doc.child_by_tag(root, "li").unwrap();

        assert_eq!(doc.element(root).unwrap().classes(), ["a&b"]);
        assert!(doc.has_class(root, "a&b"));
        assert_eq!(doc.element(item).unwrap().attr("title"), Some("say \"hi\""));
        assert_eq!(doc.text_content(item), "1 < 2 & 3");
        assert_eq!(doc.inner_html(doc.host()), markup);
    }

    #[test]
    fn serializes_classes_first_and_escapes_set_values() {
        let mut doc = Document::new("div");
        let item = doc.create_element("LI");
        doc.set_attr(item, "data-x", "a\"b&c");
        doc.add_class(item, "x&y");
        doc.add_class(item, "z");
        let text = doc.create_text("<b>");
        doc.append_child(item, text);

        assert_eq!(
            doc.outer_html(item),
            r#"<li class="x&amp;y z" data-x="a&quot;b&amp;c">&lt;b&gt;</li>"#
        );
    }

    #[test]
    fn duplicate_classes_collapse() {
        let doc = Document::from_markup("div", r#"<ul class=" tree  tree tree-branch "></ul>"#);
        assert_eq!(
            doc.element(list(&doc)).unwrap().classes(),
            ["tree", "tree-branch"]
        );
    }

    #[test]
    fn navigation_by_tag_and_index() {
        let doc = sample();
        let items: Vec<_> = doc.children_by_tag(list(&doc), "li").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(doc.index_in_parent(items[1]), Some(1));

        let nested = doc.child_by_tag(items[1], "ul").unwrap();
        let d = doc.element_children(nested).nth(1).unwrap();
        assert_eq!(doc.text_content(d), "D");
        assert_eq!(
            doc.closest(d, |doc, id| doc.has_class(id, "tree-branch")),
            Some(items[1])
        );
        assert!(doc.is_attached(d));
    }

    #[test]
    fn descendants_are_pre_order_elements() {
        let doc = sample();
        let tags: Vec<_> = doc
            .descendants(list(&doc))
            .filter_map(|id| doc.tag(id).map(str::to_owned))
            .collect();
        assert_eq!(tags, vec!["li", "li", "div", "ul", "li", "li"]);
    }

    #[test]
    fn class_toggling_is_idempotent() {
        let mut doc = sample();
        let root = list(&doc);
        assert!(doc.add_class(root, "tree_open"));
        assert!(!doc.add_class(root, "tree_open"));
        assert!(doc.has_class(root, "tree_open"));
        assert!(doc.remove_class(root, "tree_open"));
        assert!(!doc.remove_class(root, "tree_open"));
    }

    #[test]
    fn insertion_relative_to_siblings() {
        let mut doc = sample();
        let root = list(&doc);
        let first = doc.element_children(root).next().unwrap();

        let before = doc.parse_fragment("<li>Z</li>", "ul")[0];
        doc.insert_before(first, before);
        let after = doc.parse_fragment("<li>Y</li>", "ul")[0];
        doc.insert_after(first, after);
        let head = doc.parse_fragment("<li>X</li>", "ul")[0];
        doc.prepend_child(root, head);

        let texts: Vec<_> = doc
            .children_by_tag(root, "li")
            .map(|id| doc.text_content_where(id, |doc, el| doc.is_tag(el, "ul")))
            .collect();
        assert_eq!(texts, vec!["X", "Z", "A", "Y", "B"]);
    }

    #[test]
    fn removed_handles_never_resolve_again() {
        let mut doc = sample();
        let branch = doc.element_children(list(&doc)).nth(1).unwrap();
        let freed = doc.remove(branch);

        // li, div, text, ul, 2 x (li + text)
        assert_eq!(freed.len(), 8);
        assert!(!doc.contains(branch));
        assert_eq!(doc.element_children(list(&doc)).count(), 1);

        let fresh: Vec<_> = (0..freed.len()).map(|_| doc.create_element("li")).collect();
        for stale in &freed {
            assert!(!fresh.contains(stale));
            assert!(!doc.contains(*stale));
            assert!(doc.element(*stale).is_none());
            assert!(doc.parent(*stale).is_none());
        }
    }

    #[test]
    fn malformed_inner_markup_is_repaired() {
        let mut doc = sample();
        let root = list(&doc);

        doc.set_inner_markup(root, "<li>A<li>B<!-- gone -->");
        assert_eq!(doc.inner_html(root), "<li>A</li><li>B</li>");

        doc.set_inner_markup(root, "<li class=\"x");
        assert_eq!(doc.inner_html(root), "");
    }

    #[test]
    fn host_cannot_be_removed() {
        let mut doc = sample();
        assert!(doc.remove(doc.host()).is_empty());
        assert!(doc.contains(doc.host()));
    }
}
