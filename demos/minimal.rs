// Minimal example: build a tree from data, drive it with actions, render it once.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;
use serde_json::json;

use tui_treemarkup::{
    AutoOpen, Tree, TreeAction, TreeConfig, TreeView, TreeViewState, TreeViewStyle,
};

fn main() -> tui_treemarkup::Result<()> {
    // Items with a truthy `children` become branches.
    let data = json!([
        { "name": "Cargo.toml" },
        { "name": "src", "children": [
            { "name": "lib.rs" },
            { "name": "tree", "children": ["node.rs", "parser.rs"] }
        ] },
        { "name": "README" }
    ]);

    // Open every branch down to depth 1; deeper ones stay collapsed.
    let config = TreeConfig::new().with_auto_open(AutoOpen::MaxDepth(1));
    let mut tree = Tree::from_data(data, config)?;

    // Path-addressed commands; these also deserialize from `{"method": ..}` objects.
    tree.dispatch(&TreeAction::Select {
        path: vec![2, 2, 1],
    });
    tree.open(&[2, 2], true);

    // State keeps the scroll offset and row layout across frames.
    let mut state = TreeViewState::new();
    let widget = TreeView::new(&tree, TreeViewStyle::default());

    // Render into an in-memory buffer (no terminal required for the example).
    let area = Rect::new(0, 0, 40, 8);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer, &mut state);

    // Screen positions map back to elements for click handling.
    if let Some(hit) = state.hit_test(4, 2) {
        tree.click(hit.target());
    }
    println!("{}", tree.html());
    Ok(())
}
