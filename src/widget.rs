use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::widgets::{
    Block, Borders, Cell, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
    Table,
};

use crate::context::TreeRowContext;
use crate::glyphs::{TreeGlyphs, tree_label_line};
use crate::state::TreeViewState;
use crate::style::TreeViewStyle;
use crate::tree::Tree;

/// Основной виджет дерева (table + stateful).
///
/// Draws the items of a [`Tree`] that are reachable through open branches.
/// Row layout is stored in [`TreeViewState`] so screen positions can be mapped
/// back to elements for [`Tree::click`].
pub struct TreeView<'a> {
    tree: &'a Tree,
    style: TreeViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
}

impl<'a> TreeView<'a> {
    pub const fn new(tree: &'a Tree, style: TreeViewStyle<'a>) -> Self {
        Self {
            tree,
            style,
            glyphs: TreeGlyphs::unicode(),
        }
    }

    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }

    #[inline]
    fn build_rows(&self, state: &mut TreeViewState) -> Vec<Row<'a>> {
        let draw_lines = state.draw_lines();
        let mut rows = Vec::with_capacity(state.visible_len());
        for visible in state.rows_mut() {
            let Some(node) = self.tree.node(visible.node) else {
                continue;
            };
            let ctx = TreeRowContext {
                level: visible.level,
                is_tail_stack: visible.is_tail_stack.as_slice(),
                is_branch: node.has_branch_class(),
                is_open: node.is_open(),
                is_selected: node.is_selected(),
                children_selected: node.has_children_selected_class(),
                draw_lines,
                line_style: self.style.line_style,
            };
            let label = tree_label_line(&ctx, node.label(), &self.glyphs);
            visible.toggler_columns = label.toggler;

            let mut row = Row::new([Cell::from(label.line)]);
            if ctx.is_selected {
                row = row.style(self.style.selected_style);
            } else if ctx.children_selected {
                row = row.style(self.style.children_selected_style);
            }
            rows.push(row);
        }
        rows
    }

    #[inline]
    fn render_scrollbar(
        area: Rect,
        buf: &mut Buffer,
        state: &TreeViewState,
        inner_height: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = state
            .list_state()
            .offset()
            .min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(inner_height);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl StatefulWidget for TreeView<'_> {
    type State = TreeViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.rebuild(self.tree);

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let inner_height = block.inner(area).height as usize;
        state.clamp_offset(inner_height);
        let total_rows = state.visible_len();
        let scroll_rows = total_rows.saturating_sub(inner_height);

        let (table_area, table_block, scrollbar_area) = if scroll_rows > 0 {
            let table_area = Rect {
                width: area.width.saturating_sub(1),
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut table_borders = self.style.borders;
            table_borders.remove(Borders::RIGHT);
            (table_area, block.borders(table_borders), Some(scrollbar_area))
        } else {
            (area, block, None)
        };
        state.set_area(table_block.inner(table_area));

        let rows = self.build_rows(state);
        let table = Table::new(rows, [Constraint::Percentage(100)])
            .style(self.style.block_style)
            .block(table_block);
        table.render(table_area, buf, state.list_state_mut());

        if let Some(scrollbar_area) = scrollbar_area {
            Self::render_scrollbar(scrollbar_area, buf, state, inner_height, scroll_rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AutoOpen, TreeConfig};
    use serde_json::json;

    fn tree() -> Tree {
        Tree::from_data(
            json!([
                { "name": "A" },
                { "name": "B", "children": [{ "name": "C" }, { "name": "D" }] }
            ]),
            TreeConfig::new().with_auto_open(AutoOpen::AllBranches),
        )
        .unwrap()
    }

    fn lines(buffer: &Buffer) -> Vec<String> {
        let area = buffer.area;
        (area.y..area.bottom())
            .map(|y| {
                (area.x..area.right())
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_owned()
            })
            .collect()
    }

    fn plain_style() -> TreeViewStyle<'static> {
        TreeViewStyle {
            borders: Borders::NONE,
            ..TreeViewStyle::default()
        }
    }

    #[test]
    fn renders_guides_and_records_togglers() {
        let tree = tree();
        let widget = TreeView::new(&tree, plain_style()).glyphs(TreeGlyphs::ascii());
        let mut state = TreeViewState::new();
        let area = Rect::new(0, 0, 16, 5);
        let mut buffer = Buffer::empty(area);

        widget.render(area, &mut buffer, &mut state);

        assert_eq!(
            lines(&buffer),
            vec!["|--* A", "`--v B", "   |--* C", "   `--* D", ""]
        );
        let hit = state.hit_test(3, 1).unwrap();
        assert!(hit.on_toggler);
        assert_eq!(hit.node, tree.get(&[2]).unwrap().id());
        assert!(!state.hit_test(0, 1).unwrap().on_toggler);
        assert!(state.hit_test(0, 4).is_none());
    }

    #[test]
    fn click_through_rendered_rows() {
        let mut tree = tree();
        let mut state = TreeViewState::new();
        let area = Rect::new(0, 0, 16, 5);

        let mut buffer = Buffer::empty(area);
        TreeView::new(&tree, plain_style())
            .glyphs(TreeGlyphs::ascii())
            .render(area, &mut buffer, &mut state);

        let toggler = state.hit_test(3, 1).unwrap().target();
        tree.click(toggler);

        let mut buffer = Buffer::empty(area);
        TreeView::new(&tree, plain_style())
            .glyphs(TreeGlyphs::ascii())
            .render(area, &mut buffer, &mut state);
        assert_eq!(lines(&buffer), vec!["|--* A", "`--> B", "", "", ""]);
    }

    #[test]
    fn render_smoke_with_scrollbar() {
        let items: Vec<_> = (1..=12).map(|idx| json!(format!("node-{idx}"))).collect();
        let tree = Tree::from_data(json!(items), TreeConfig::new()).unwrap();
        let widget = TreeView::new(&tree, TreeViewStyle::default());
        let mut state = TreeViewState::new();

        let area = Rect::new(0, 0, 20, 6);
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, &mut state);

        assert_eq!(state.visible_len(), 12);
        state.scroll_down_by(100);
        assert_eq!(state.offset(), 8);
    }
}
