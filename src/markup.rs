//! HTML fragment parsing and serialization for the list markup the tree consumes and emits.
//!
//! Parsing is html5ever's fragment algorithm, so malformed input is repaired the
//! way a browser would repair it and never fails.

use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{Document, ElementId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Qualified name of an HTML element.
pub fn html_name(tag: &str) -> QualName {
    QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(tag.to_ascii_lowercase()),
    )
}

/// Qualified name of a plain (namespace-less) attribute.
pub fn attr_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// Parses `markup` as the content of a `context` element.
///
/// Returns the top-level nodes; comments, doctypes and processing
/// instructions are kept in the returned tree and skipped by the importer.
pub(crate) fn parse_nodes(markup: &str, context: &str) -> Vec<Handle> {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        html_name(context),
        Vec::new(),
    )
    .one(markup);

    // The fragment algorithm wraps the content in a synthetic `html` element.
    let top = dom.document.children.borrow();
    top.iter()
        .find(|handle| matches!(handle.data, NodeData::Element { .. }))
        .map(|html| html.children.borrow().clone())
        .unwrap_or_default()
}

/// How much of an entry to serialize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Outer,
    Inner,
}

struct Subtree<'a> {
    doc: &'a Document,
    id: ElementId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => write_entry(self.doc, self.id, serializer),
            TraversalScope::ChildrenOnly(_) => {
                for child in self.doc.children(self.id) {
                    write_entry(self.doc, *child, serializer)?;
                }
                Ok(())
            }
        }
    }
}

fn write_entry<S: Serializer>(doc: &Document, id: ElementId, serializer: &mut S) -> io::Result<()> {
    if let Some(text) = doc.text(id) {
        return serializer.write_text(text);
    }
    let Some(data) = doc.element(id) else {
        return Ok(());
    };

    // Classes go first, as a single attribute.
    let class_name = attr_name("class");
    let classes = data.classes().join(" ");
    let class_attr = (!classes.is_empty()).then_some((&class_name, classes.as_str()));
    let attrs = class_attr.into_iter().chain(
        data.attrs()
            .iter()
            .map(|(name, value)| (name, value.as_str())),
    );

    serializer.start_elem(data.name().clone(), attrs)?;
    for child in doc.children(id) {
        write_entry(doc, *child, serializer)?;
    }
    serializer.end_elem(data.name().clone())
}

/// Serializes an entry, or only its children, as HTML.
pub(crate) fn to_html(doc: &Document, id: ElementId, scope: Scope) -> String {
    let traversal_scope = match scope {
        Scope::Outer => TraversalScope::IncludeNode,
        Scope::Inner => TraversalScope::ChildrenOnly(doc.element(id).map(|data| data.name().clone())),
    };
    let opts = SerializeOpts {
        traversal_scope,
        ..SerializeOpts::default()
    };

    let mut out = Vec::new();
    if let Err(err) = serialize(&mut out, &Subtree { doc, id }, opts) {
        tracing::warn!(%err, "serializing markup failed");
    }
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
