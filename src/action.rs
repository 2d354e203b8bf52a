use serde::Deserialize;
use serde_json::Value;

/// Path-addressed commands a caller can send to a tree.
///
/// Deserializes from `{"method": "open", "path": [1, 2], "iterate": true}`
/// style objects, one variant per public tree operation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum TreeAction {
    /// Open the node; with `iterate`, also its ancestors.
    Open {
        path: Vec<usize>,
        #[serde(default)]
        iterate: bool,
    },
    /// Close the node; with `iterate`, also its descendant branches.
    Close {
        path: Vec<usize>,
        #[serde(default)]
        iterate: bool,
    },
    /// Flip the open state of the node.
    ToggleOpen { path: Vec<usize> },
    Select { path: Vec<usize> },
    /// Unselect the node, subject to the `can_unselect` option.
    Unselect { path: Vec<usize> },
    /// Flip the selection of the node.
    ToggleSelect { path: Vec<usize> },
    /// Add an item as the last child.
    Append { path: Vec<usize>, data: Value },
    /// Add an item as the first child.
    Prepend { path: Vec<usize>, data: Value },
    /// Add an item as the next sibling.
    After { path: Vec<usize>, data: Value },
    /// Add an item as the previous sibling.
    Before { path: Vec<usize>, data: Value },
    Remove { path: Vec<usize> },
}

impl TreeAction {
    /// The path the action is addressed to.
    pub fn path(&self) -> &[usize] {
        match self {
            Self::Open { path, .. }
            | Self::Close { path, .. }
            | Self::ToggleOpen { path }
            | Self::Select { path }
            | Self::Unselect { path }
            | Self::ToggleSelect { path }
            | Self::Append { path, .. }
            | Self::Prepend { path, .. }
            | Self::After { path, .. }
            | Self::Before { path, .. }
            | Self::Remove { path } => path,
        }
    }
}

/// Result of handling an action or click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// The target resolved and the state was updated.
    Handled,
    /// Nothing to do (path or element did not resolve, or the operation was refused).
    Unhandled,
}

impl From<bool> for TreeEvent {
    fn from(applied: bool) -> Self {
        if applied {
            Self::Handled
        } else {
            Self::Unhandled
        }
    }
}
