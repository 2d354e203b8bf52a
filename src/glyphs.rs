use std::ops::Range;

use ratatui::text::{Line, Span};

use crate::context::TreeRowContext;

#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
        }
    }
}

impl Default for TreeGlyphs<'static> {
    fn default() -> Self {
        Self::unicode()
    }
}

/// A rendered row label and the columns its toggler glyph occupies.
pub struct TreeLabelLine<'a> {
    pub line: Line<'a>,
    /// Columns relative to the start of the line; `None` for leaf rows.
    pub toggler: Option<Range<u16>>,
}

/// Builds the label line of a row: guides, toggler or leaf glyph, then the text.
pub fn tree_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    label: String,
    glyphs: &TreeGlyphs<'a>,
) -> TreeLabelLine<'a> {
    let expander = if ctx.is_branch {
        if ctx.is_open {
            glyphs.expanded
        } else {
            glyphs.collapsed
        }
    } else {
        glyphs.leaf
    };

    let mut spans = Vec::with_capacity(ctx.is_tail_stack.len() + 4);
    if ctx.draw_lines {
        let depth = ctx.is_tail_stack.len();
        for (l, is_last) in ctx.is_tail_stack.iter().enumerate() {
            let part = if l + 1 == depth {
                if *is_last {
                    glyphs.branch_last
                } else {
                    glyphs.branch
                }
            } else if *is_last {
                glyphs.indent
            } else {
                glyphs.vert
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    } else {
        for _ in 0..ctx.level {
            spans.push(Span::raw(glyphs.empty));
        }
    }

    let start = spans.iter().map(Span::width).sum::<usize>();
    let start = u16::try_from(start).unwrap_or(u16::MAX);
    let width = u16::try_from(Span::raw(expander).width()).unwrap_or(u16::MAX);
    let toggler = ctx
        .is_branch
        .then(|| start..start.saturating_add(width.max(1)));

    if !expander.is_empty() {
        spans.push(Span::raw(expander));
    }
    spans.push(Span::raw(" "));
    spans.push(Span::raw(label));

    TreeLabelLine {
        line: Line::from(spans),
        toggler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Style;

    fn ctx(stack: &[bool], is_branch: bool, is_open: bool, draw_lines: bool) -> TreeRowContext<'_> {
        TreeRowContext {
            level: u16::try_from(stack.len()).unwrap(),
            is_tail_stack: stack,
            is_branch,
            is_open,
            is_selected: false,
            children_selected: false,
            draw_lines,
            line_style: Style::default(),
        }
    }

    #[test]
    fn guide_lines_and_toggler_columns() {
        let glyphs = TreeGlyphs::ascii();
        let label = tree_label_line(&ctx(&[true, false], true, false, true), "docs".into(), &glyphs);
        assert_eq!(label.line.to_string(), "   |--> docs");
        assert_eq!(label.toggler, Some(6..7));

        let label = tree_label_line(&ctx(&[false], false, false, true), "a".into(), &glyphs);
        assert_eq!(label.line.to_string(), "|--* a");
        assert_eq!(label.toggler, None);
    }

    #[test]
    fn plain_indent_without_lines() {
        let glyphs = TreeGlyphs::unicode();
        let label = tree_label_line(&ctx(&[false, true], true, true, false), "src".into(), &glyphs);
        assert_eq!(label.line.to_string(), "      ▼ src");
        assert_eq!(label.toggler, Some(6..7));
    }
}
