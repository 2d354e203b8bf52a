use std::ops::Range;

use ratatui::layout::{Position, Rect};
use ratatui::widgets::TableState;
use smallvec::SmallVec;

use crate::dom::ElementId;
use crate::node::{NodeId, NodeRef};
use crate::tree::Tree;

#[cfg(feature = "mouse")]
use crate::action::TreeEvent;
#[cfg(feature = "mouse")]
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// A visible row with the element ids needed to route clicks back into the tree.
#[derive(Clone, Debug)]
pub struct VisibleRow {
    pub(crate) node: NodeId,
    pub(crate) element: ElementId,
    pub(crate) toggler: Option<ElementId>,
    pub(crate) level: u16,
    pub(crate) is_tail_stack: SmallVec<[bool; 8]>,
    // Filled in by the widget once the label line is laid out.
    pub(crate) toggler_columns: Option<Range<u16>>,
}

impl VisibleRow {
    pub const fn node(&self) -> NodeId {
        self.node
    }

    pub const fn level(&self) -> u16 {
        self.level
    }
}

/// What lies under a screen position after the last render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowHit {
    pub node: NodeId,
    pub element: ElementId,
    pub toggler: Option<ElementId>,
    pub on_toggler: bool,
}

impl RowHit {
    /// The element a click at this position lands on.
    pub fn target(&self) -> ElementId {
        match self.toggler {
            Some(toggler) if self.on_toggler => toggler,
            _ => self.element,
        }
    }
}

/// Widget state: scroll offset and the row layout of the last render.
pub struct TreeViewState {
    list_state: TableState,
    rows: Vec<VisibleRow>,
    // Inner table area of the last render, used for hit testing.
    area: Rect,
    draw_lines: bool,
}

impl Default for TreeViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeViewState {
    pub fn new() -> Self {
        Self {
            list_state: TableState::default(),
            rows: Vec::new(),
            area: Rect::default(),
            draw_lines: true,
        }
    }

    pub(crate) const fn list_state(&self) -> &TableState {
        &self.list_state
    }

    pub(crate) const fn list_state_mut(&mut self) -> &mut TableState {
        &mut self.list_state
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [VisibleRow] {
        &mut self.rows
    }

    pub(crate) const fn set_area(&mut self, area: Rect) {
        self.area = area;
    }

    /// Rows laid out by the last render, top to bottom.
    pub fn rows(&self) -> &[VisibleRow] {
        &self.rows
    }

    pub const fn visible_len(&self) -> usize {
        self.rows.len()
    }

    pub fn offset(&self) -> usize {
        self.list_state.offset()
    }

    /// Returns whether guide lines are drawn.
    #[inline]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    /// Enables or disables drawing of guide lines.
    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Scrolls the view down by the given number of rows.
    pub fn scroll_down_by(&mut self, amount: u16) {
        let max_offset = self.max_offset();
        let offset = self.list_state.offset_mut();
        *offset = offset.saturating_add(usize::from(amount)).min(max_offset);
    }

    /// Scrolls the view up by the given number of rows.
    pub fn scroll_up_by(&mut self, amount: u16) {
        let offset = self.list_state.offset_mut();
        *offset = offset.saturating_sub(usize::from(amount));
    }

    fn max_offset(&self) -> usize {
        self.rows
            .len()
            .saturating_sub(usize::from(self.area.height))
    }

    /// Keeps the offset inside the scrollable range for a viewport of `height` rows.
    pub(crate) fn clamp_offset(&mut self, height: usize) {
        let max_offset = self.rows.len().saturating_sub(height);
        let offset = self.list_state.offset_mut();
        *offset = (*offset).min(max_offset);
    }

    /// Rebuilds the visible rows: top-level items, descending only into open nodes.
    pub(crate) fn rebuild(&mut self, tree: &Tree) {
        self.rows.clear();
        let mut is_tail_stack: SmallVec<[bool; 8]> = SmallVec::new();
        let children = tree.root().children();
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            is_tail_stack.push(i + 1 == count);
            self.build_visible_rows(child, &mut is_tail_stack);
            is_tail_stack.pop();
        }
    }

    fn build_visible_rows(&mut self, node: NodeRef<'_>, is_tail_stack: &mut SmallVec<[bool; 8]>) {
        self.rows.push(VisibleRow {
            node: node.id(),
            element: node.element(),
            toggler: node.toggler(),
            level: node.level(),
            is_tail_stack: is_tail_stack.clone(),
            toggler_columns: None,
        });
        if !node.is_open() {
            return;
        }

        let children = node.children();
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            is_tail_stack.push(i + 1 == count);
            self.build_visible_rows(child, is_tail_stack);
            is_tail_stack.pop();
        }
    }

    /// Maps a screen position to the row drawn there by the last render.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<RowHit> {
        if !self.area.contains(Position::new(column, row)) {
            return None;
        }
        let index = self.list_state.offset() + usize::from(row - self.area.y);
        let visible = self.rows.get(index)?;
        let local = column - self.area.x;
        let on_toggler = visible
            .toggler_columns
            .as_ref()
            .is_some_and(|columns| columns.contains(&local));
        Some(RowHit {
            node: visible.node,
            element: visible.element,
            toggler: visible.toggler,
            on_toggler,
        })
    }

    /// Routes a left-button press to [`Tree::click`] and the wheel to scrolling.
    #[cfg(feature = "mouse")]
    pub fn handle_mouse(&mut self, tree: &mut Tree, event: MouseEvent) -> TreeEvent {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self
                .hit_test(event.column, event.row)
                .map_or(TreeEvent::Unhandled, |hit| tree.click(hit.target())),
            MouseEventKind::ScrollDown => {
                self.scroll_down_by(1);
                TreeEvent::Handled
            }
            MouseEventKind::ScrollUp => {
                self.scroll_up_by(1);
                TreeEvent::Handled
            }
            _ => TreeEvent::Unhandled,
        }
    }
}
