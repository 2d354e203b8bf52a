use ratatui::style::Style;

/// Everything the label renderer needs to know about one visible row.
#[derive(Clone, Copy)]
pub struct TreeRowContext<'a> {
    pub level: u16,
    pub is_tail_stack: &'a [bool],
    /// The item shows a toggler (branch markup), even with no children yet.
    pub is_branch: bool,
    pub is_open: bool,
    pub is_selected: bool,
    pub children_selected: bool,
    pub draw_lines: bool,
    pub line_style: Style,
}
