pub use crate::{
    AutoOpen, ClassNames, DefaultTemplates, NodeId, NodeKind, NodeMut, NodeRef, RowHit, Selection,
    Tree, TreeAction, TreeConfig, TreeError, TreeEvent, TreeGlyphs, TreeRowContext, TreeTemplates,
    TreeView, TreeViewState, TreeViewStyle, item_content,
};
