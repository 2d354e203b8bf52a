//! Builders that bring either existing list markup or nested data into the tree shape.

use serde_json::Value;
use smallvec::SmallVec;

use crate::config::ClassNames;
use crate::dom::{Document, ElementId};
use crate::template::TreeTemplates;

/// Rewrites an existing nested list in place.
pub struct HtmlParser<'a> {
    templates: &'a dyn TreeTemplates,
    classes: &'a ClassNames,
}

impl<'a> HtmlParser<'a> {
    pub const fn new(templates: &'a dyn TreeTemplates, classes: &'a ClassNames) -> Self {
        Self { templates, classes }
    }

    /// Marks `list` as the tree root and rewrites every item below it.
    ///
    /// The root list gets both the root and the branch class. Each item's
    /// direct `div` children are replaced by the branch template applied to
    /// their content; items holding a nested list get the branch class.
    pub fn render_tree(&self, doc: &mut Document, list: ElementId) {
        doc.add_class(list, &self.classes.root);
        doc.add_class(list, &self.classes.branch);
        self.render_list(doc, list);
    }

    fn render_list(&self, doc: &mut Document, list: ElementId) {
        let items: SmallVec<[ElementId; 16]> = doc.children_by_tag(list, "li").collect();
        for item in items {
            let wrappers: SmallVec<[ElementId; 2]> = doc.children_by_tag(item, "div").collect();
            for wrapper in wrappers {
                let content = Value::String(doc.inner_html(wrapper));
                let markup = self.templates.branch(self.classes, &content);
                for replacement in doc.parse_fragment(&markup, "li") {
                    doc.insert_before(wrapper, replacement);
                }
                doc.remove(wrapper);
            }

            if let Some(nested) = doc.child_by_tag(item, "ul") {
                doc.add_class(item, &self.classes.branch);
                self.render_list(doc, nested);
            }
        }
    }
}

/// Renders nested data into list markup.
///
/// An object whose `children` is present and truthy becomes a branch holding
/// its children; every other item becomes a leaf. Arrays are walked in order,
/// objects by value in insertion order.
pub struct DataParser<'a> {
    templates: &'a dyn TreeTemplates,
    classes: &'a ClassNames,
}

impl<'a> DataParser<'a> {
    pub const fn new(templates: &'a dyn TreeTemplates, classes: &'a ClassNames) -> Self {
        Self { templates, classes }
    }

    pub fn leaf(&self, item: &Value) -> String {
        format!("<li>{}</li>", self.templates.leaf(self.classes, item))
    }

    pub fn branch(&self, item: &Value) -> String {
        let children = item.get("children").unwrap_or(&Value::Null);
        format!(
            r#"<li class="{}">{}{}</li>"#,
            self.classes.branch,
            self.templates.branch(self.classes, item),
            self.tree(children, false),
        )
    }

    pub fn node(&self, item: &Value) -> String {
        if has_children(item) {
            self.branch(item)
        } else {
            self.leaf(item)
        }
    }

    pub fn tree(&self, items: &Value, is_root: bool) -> String {
        let mut output = String::new();
        match items {
            Value::Array(list) => list.iter().for_each(|item| output.push_str(&self.node(item))),
            Value::Object(map) => map.values().for_each(|item| output.push_str(&self.node(item))),
            _ => {}
        }
        if is_root {
            format!(r#"<ul class="{}">{output}</ul>"#, self.classes.root)
        } else {
            format!("<ul>{output}</ul>")
        }
    }
}

fn has_children(item: &Value) -> bool {
    item.as_object()
        .and_then(|map| map.get("children"))
        .is_some_and(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::DefaultTemplates;
    use serde_json::json;

    const TOGGLER: &str = r#"<i class="tree-toggler"></i>"#;

    fn branch_row(content: &str) -> String {
        format!(
            r#"<div class="tree-element">{TOGGLER}<div class="element-content">{content}</div></div>"#
        )
    }

    #[test]
    fn leaf_and_branch_items() {
        let classes = ClassNames::default();
        let parser = DataParser::new(&DefaultTemplates, &classes);

        assert_eq!(parser.node(&json!({ "name": "X" })), "<li>X</li>");
        assert_eq!(parser.node(&json!("plain")), "<li>plain</li>");
        assert_eq!(
            parser.node(&json!({ "name": "Y", "children": [{ "name": "Z" }] })),
            format!(r#"<li class="tree-branch">{}<ul><li>Z</li></ul></li>"#, branch_row("Y"))
        );
    }

    #[test]
    fn falsy_children_make_a_leaf() {
        let classes = ClassNames::default();
        let parser = DataParser::new(&DefaultTemplates, &classes);

        assert_eq!(parser.node(&json!({ "name": "N", "children": null })), "<li>N</li>");
        assert_eq!(parser.node(&json!({ "name": "F", "children": false })), "<li>F</li>");
        assert_eq!(
            parser.node(&json!({ "name": "E", "children": [] })),
            format!(r#"<li class="tree-branch">{}<ul></ul></li>"#, branch_row("E"))
        );
    }

    #[test]
    fn keyed_collections_keep_insertion_order() {
        let classes = ClassNames::default();
        let parser = DataParser::new(&DefaultTemplates, &classes);
        let data = json!({ "b": { "name": "second" }, "a": { "name": "first" } });

        assert_eq!(
            parser.tree(&data, true),
            r#"<ul class="tree"><li>second</li><li>first</li></ul>"#
        );
    }

    #[test]
    fn html_parser_rewrites_items() {
        let classes = ClassNames::default();
        let mut doc = Document::from_markup(
            "div",
            "<ul><li><div>A</div></li><li><div>B</div><ul><li><div>C</div></li></ul></li></ul>",
        );
        let list = doc.child_by_tag(doc.host(), "ul").unwrap();

        HtmlParser::new(&DefaultTemplates, &classes)
            .render_tree(&mut doc, list);

        assert_eq!(
            doc.inner_html(doc.host()),
            format!(
                r#"<ul class="tree tree-branch"><li>{}</li><li class="tree-branch">{}<ul><li>{}</li></ul></li></ul>"#,
                branch_row("A"),
                branch_row("B"),
                branch_row("C"),
            )
        );
    }

    #[test]
    fn html_parser_keeps_items_without_wrapper() {
        let classes = ClassNames::default();
        let mut doc = Document::from_markup("div", "<ul><li>plain</li></ul>");
        let list = doc.child_by_tag(doc.host(), "ul").unwrap();

        HtmlParser::new(&DefaultTemplates, &classes)
            .render_tree(&mut doc, list);

        assert_eq!(
            doc.inner_html(doc.host()),
            r#"<ul class="tree tree-branch"><li>plain</li></ul>"#
        );
    }
}
