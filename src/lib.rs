//! Collapsible tree over nested list markup, with open and selection state kept
//! in sync through marker classes, plus a Ratatui view.
//!
//! A [`Tree`] owns a small [`Document`]: either existing `<ul>/<li>` markup is
//! rewritten in place, or nested data is rendered through [`TreeTemplates`].
//! Nodes are addressed by [`NodeId`] or by paths of 1-based sibling indices.
//!
//! Feature flags:
//! - `mouse`: crossterm mouse handling via `TreeViewState::handle_mouse`.

mod action;
mod config;
mod context;
pub mod dom;
mod error;
mod glyphs;
mod markup;
mod node;
mod parser;
pub mod prelude;
mod state;
mod style;
mod template;
mod tree;
mod widget;

pub use action::{TreeAction, TreeEvent};
pub use config::{AutoOpen, ClassNames, Path, TreeConfig};
pub use context::TreeRowContext;
pub use dom::{Document, ElementId};
pub use error::{Result, TreeError};
pub use glyphs::{TreeGlyphs, TreeLabelLine, tree_label_line};
pub use node::{NodeId, NodeKind, NodeMut, NodeRef};
pub use parser::{DataParser, HtmlParser};
pub use state::{RowHit, TreeViewState, VisibleRow};
pub use style::TreeViewStyle;
pub use template::{DefaultTemplates, TreeTemplates, item_content};
pub use tree::{Selection, Tree};
pub use widget::TreeView;
