use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// Визуальные настройки виджета дерева.
#[derive(Clone)]
pub struct TreeViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    /// Rows of selected items.
    pub selected_style: Style,
    /// Collapsed branches hiding the selected item.
    pub children_selected_style: Style,
    pub line_style: Style,
    pub borders: Borders,
}

impl Default for TreeViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            selected_style: Style::default().add_modifier(Modifier::REVERSED),
            children_selected_style: Style::default().add_modifier(Modifier::BOLD),
            line_style: Style::default(),
            borders: Borders::ALL,
        }
    }
}
