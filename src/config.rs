use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use smallvec::SmallVec;

use crate::template::{DefaultTemplates, TreeTemplates};

/// Path of 1-based sibling indices from the root to a node.
pub type Path = SmallVec<[usize; 8]>;

/// Which nodes start expanded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutoOpen {
    /// Nothing is opened.
    Disabled,
    /// Every branch is opened.
    AllBranches,
    /// Every branch whose level is at most the given depth is opened.
    MaxDepth(u16),
    /// The node at the path is opened together with its ancestors.
    Path(Path),
}

impl Default for AutoOpen {
    fn default() -> Self {
        Self::Path(Path::from_slice(&[1, 2]))
    }
}

impl<'de> Deserialize<'de> for AutoOpen {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Same loose typing as the options object: `false`, `true`, a depth or a path.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Depth(f64),
            Path(Vec<usize>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Self::Disabled,
            Raw::Flag(true) => Self::AllBranches,
            Raw::Depth(depth) => Self::MaxDepth(clamp_depth(depth)),
            Raw::Path(path) => Self::Path(path.into()),
        })
    }
}

/// Levels are whole numbers from 1, so a fractional depth rounds down and
/// anything below 1 opens nothing.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_depth(depth: f64) -> u16 {
    depth.floor().clamp(0.0, f64::from(u16::MAX)) as u16
}

/// Marker classes derived from the namespace; stylesheets key off these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassNames {
    pub root: String,
    pub branch: String,
    pub open: String,
    pub selected: String,
    pub children_selected: String,
    pub toggler: String,
    pub element: String,
    pub content: String,
}

impl ClassNames {
    pub fn new(namespace: &str) -> Self {
        Self {
            root: namespace.to_owned(),
            branch: format!("{namespace}-branch"),
            open: format!("{namespace}_open"),
            selected: format!("{namespace}_selected"),
            children_selected: format!("{namespace}_childrenSelected"),
            toggler: format!("{namespace}-toggler"),
            element: format!("{namespace}-element"),
            content: "element-content".to_owned(),
        }
    }
}

impl Default for ClassNames {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

const DEFAULT_NAMESPACE: &str = "tree";

fn default_templates() -> Arc<dyn TreeTemplates> {
    Arc::new(DefaultTemplates)
}

/// Tree options, fixed once handed to a [`crate::Tree`].
///
/// Deserializes from an options object with camelCase keys
/// (`namespace`, `autoOpen`, `dataFromHtml`, `data`, `multiSelect`, `canUnselect`);
/// missing keys keep their defaults.
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    /// Prefix of every marker class.
    pub namespace: String,
    pub auto_open: AutoOpen,
    /// Build from the host markup instead of `data`.
    pub data_from_html: bool,
    /// Item collection used when `data_from_html` is off.
    pub data: Option<Value>,
    pub multi_select: bool,
    /// Whether a selected node may be unselected without force.
    pub can_unselect: bool,
    #[serde(skip, default = "default_templates")]
    pub templates: Arc<dyn TreeTemplates>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            auto_open: AutoOpen::default(),
            data_from_html: false,
            data: None,
            multi_select: false,
            can_unselect: true,
            templates: default_templates(),
        }
    }
}

impl fmt::Debug for TreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConfig")
            .field("namespace", &self.namespace)
            .field("auto_open", &self.auto_open)
            .field("data_from_html", &self.data_from_html)
            .field("data", &self.data)
            .field("multi_select", &self.multi_select)
            .field("can_unselect", &self.can_unselect)
            .finish_non_exhaustive()
    }
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_auto_open(mut self, auto_open: AutoOpen) -> Self {
        self.auto_open = auto_open;
        self
    }

    #[must_use]
    pub const fn with_data_from_html(mut self, from_html: bool) -> Self {
        self.data_from_html = from_html;
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub const fn with_multi_select(mut self, multi: bool) -> Self {
        self.multi_select = multi;
        self
    }

    #[must_use]
    pub const fn with_can_unselect(mut self, can_unselect: bool) -> Self {
        self.can_unselect = can_unselect;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: impl TreeTemplates + 'static) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    /// Marker classes for the configured namespace.
    pub fn class_names(&self) -> ClassNames {
        ClassNames::new(&self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_plugin_options() {
        let config = TreeConfig::default();
        assert_eq!(config.namespace, "tree");
        assert_eq!(config.auto_open, AutoOpen::Path(Path::from_slice(&[1, 2])));
        assert!(!config.data_from_html);
        assert!(config.data.is_none());
        assert!(!config.multi_select);
        assert!(config.can_unselect);
    }

    #[test]
    fn auto_open_accepts_loose_values() {
        let parse = |value| serde_json::from_value::<AutoOpen>(value).unwrap();
        assert_eq!(parse(json!(false)), AutoOpen::Disabled);
        assert_eq!(parse(json!(true)), AutoOpen::AllBranches);
        assert_eq!(parse(json!(2)), AutoOpen::MaxDepth(2));
        assert_eq!(parse(json!([3, 1])), AutoOpen::Path(Path::from_slice(&[3, 1])));
        assert!(serde_json::from_value::<AutoOpen>(json!("all")).is_err());
    }

    #[test]
    fn auto_open_depth_is_clamped() {
        let parse = |value| serde_json::from_value::<AutoOpen>(value).unwrap();
        assert_eq!(parse(json!(-1)), AutoOpen::MaxDepth(0));
        assert_eq!(parse(json!(0)), AutoOpen::MaxDepth(0));
        assert_eq!(parse(json!(1.5)), AutoOpen::MaxDepth(1));
        assert_eq!(parse(json!(70000)), AutoOpen::MaxDepth(u16::MAX));
    }

    #[test]
    fn deserializes_camel_case_options() {
        let config: TreeConfig = serde_json::from_value(json!({
            "namespace": "menu",
            "autoOpen": 1,
            "multiSelect": true,
            "canUnselect": false,
            "data": [{ "name": "A" }]
        }))
        .unwrap();

        assert_eq!(config.namespace, "menu");
        assert_eq!(config.auto_open, AutoOpen::MaxDepth(1));
        assert!(config.multi_select);
        assert!(!config.can_unselect);
        assert!(!config.data_from_html);
        assert_eq!(config.data, Some(json!([{ "name": "A" }])));
    }

    #[test]
    fn class_names_follow_namespace() {
        let classes = ClassNames::new("menu");
        assert_eq!(classes.root, "menu");
        assert_eq!(classes.branch, "menu-branch");
        assert_eq!(classes.open, "menu_open");
        assert_eq!(classes.selected, "menu_selected");
        assert_eq!(classes.children_selected, "menu_childrenSelected");
        assert_eq!(classes.toggler, "menu-toggler");
    }
}
