use std::borrow::Cow;

use serde_json::Value;

use crate::config::ClassNames;

/// Markup fragments for one item.
///
/// Items are data values (data mode) or the existing content markup as a string
/// (markup mode). Returned strings are markup and are inserted verbatim.
/// Override any subset; the defaults compose `branch` from `toggler` and
/// `branch_content`.
pub trait TreeTemplates: Send + Sync {
    /// The expand/collapse handle.
    fn toggler(&self, classes: &ClassNames, _item: &Value) -> String {
        format!(r#"<i class="{}"></i>"#, classes.toggler)
    }

    /// Wrapper of a branch row: toggler plus content.
    fn branch(&self, classes: &ClassNames, item: &Value) -> String {
        format!(
            r#"<div class="{}">{}<div class="{}">{}</div></div>"#,
            classes.element,
            self.toggler(classes, item),
            classes.content,
            self.branch_content(classes, item),
        )
    }

    fn branch_content(&self, _classes: &ClassNames, item: &Value) -> String {
        item_content(item).into_owned()
    }

    fn leaf(&self, classes: &ClassNames, item: &Value) -> String {
        self.leaf_content(classes, item)
    }

    fn leaf_content(&self, _classes: &ClassNames, item: &Value) -> String {
        item_content(item).into_owned()
    }
}

/// The stock template set.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultTemplates;

impl TreeTemplates for DefaultTemplates {}

/// Display content of an item: the `name` of an object, otherwise the value itself.
pub fn item_content(item: &Value) -> Cow<'_, str> {
    match item {
        Value::Object(map) => map.get("name").map_or(Cow::Borrowed(""), scalar_content),
        other => scalar_content(other),
    }
}

fn scalar_content(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text),
        Value::Number(number) => Cow::Owned(number.to_string()),
        Value::Bool(flag) => Cow::Owned(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Bold;

    impl TreeTemplates for Bold {
        fn leaf_content(&self, _classes: &ClassNames, item: &Value) -> String {
            format!("<b>{}</b>", item_content(item))
        }
    }

    #[test]
    fn content_prefers_name() {
        assert_eq!(item_content(&json!({ "name": "Docs" })), "Docs");
        assert_eq!(item_content(&json!("plain")), "plain");
        assert_eq!(item_content(&json!(42)), "42");
        assert_eq!(item_content(&json!({ "id": 3 })), "");
        assert_eq!(item_content(&json!(null)), "");
    }

    #[test]
    fn default_branch_markup() {
        let classes = ClassNames::default();
        assert_eq!(
            DefaultTemplates.branch(&classes, &json!({ "name": "B" })),
            r#"<div class="tree-element"><i class="tree-toggler"></i><div class="element-content">B</div></div>"#
        );
        assert_eq!(DefaultTemplates.leaf(&classes, &json!("A")), "A");
    }

    #[test]
    fn overrides_compose_with_defaults() {
        let classes = ClassNames::new("menu");
        assert_eq!(Bold.leaf(&classes, &json!({ "name": "x" })), "<b>x</b>");
        assert!(Bold.branch(&classes, &json!("y")).contains(r#"<i class="menu-toggler"></i>"#));
    }
}
