//! # Caret Layout
//!
//! Computes screen coordinates for a document position so the autocomplete
//! popover can anchor at the trigger. Text measurement is supplied by the
//! host platform through [`TextMeasure`]; the layout itself is a simple
//! greedy wrap: each textblock starts a new line, text wraps per character,
//! and a mention chip wraps as one unit.

use mention_document::{Document, Inline};
use serde::Serialize;

/// Text measurement provided by the host
pub trait TextMeasure: Send + Sync {
    /// Width of `text` rendered in the editor's font
    fn text_width(&self, text: &str) -> f32;

    fn line_height(&self) -> f32;
}

/// Visible area of the editing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Width available to text before wrapping
    pub width: f32,

    /// Vertical scroll offset of the surface
    pub scroll_top: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Monospace measurement: every character is `char_width` wide
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    pub char_width: f32,
    pub line_height: f32,
}

impl TextMeasure for MonospaceMeasure {
    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}

/// Top-left corner of the caret at `pos`, relative to the viewport
pub fn caret_coordinates(doc: &Document, pos: usize, measure: &dyn TextMeasure, viewport: Viewport) -> Point {
    let line_height = measure.line_height();
    let mut y = 0.0_f32;
    let mut start = 0;
    let mut caret = Point { x: 0.0, y: 0.0 };

    for (index, content) in doc.textblocks().into_iter().enumerate() {
        if index > 0 {
            y += line_height;
        }

        let mut x = 0.0_f32;
        let mut current = start;
        if current == pos {
            caret = Point { x, y };
        }

        for inline in content {
            match inline {
                Inline::Text { text, .. } => {
                    let mut buf = [0u8; 4];
                    for c in text.chars() {
                        let width = measure.text_width(c.encode_utf8(&mut buf));
                        advance(&mut x, &mut y, width, viewport.width, line_height);
                        current += 1;
                        if current == pos {
                            caret = Point { x, y };
                        }
                    }
                }
                Inline::Mention { attrs } => {
                    let width = measure.text_width(&attrs.label());
                    advance(&mut x, &mut y, width, viewport.width, line_height);
                    current += 1;
                    if current == pos {
                        caret = Point { x, y };
                    }
                }
            }
        }

        start = current + 1;
    }

    Point {
        x: caret.x,
        y: caret.y - viewport.scroll_top,
    }
}

/// Anchor for a popover shown below the caret line
pub fn popover_anchor(doc: &Document, pos: usize, measure: &dyn TextMeasure, viewport: Viewport) -> Point {
    let caret = caret_coordinates(doc, pos, measure, viewport);
    Point {
        x: caret.x,
        y: caret.y + measure.line_height(),
    }
}

/// Place a unit of `width`, wrapping first when it doesn't fit
fn advance(x: &mut f32, y: &mut f32, width: f32, max_width: f32, line_height: f32) {
    if *x > 0.0 && *x + width > max_width {
        *x = 0.0;
        *y += line_height;
    }
    *x += width;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mention_document::{parse_flat, Block};

    const MONO: MonospaceMeasure = MonospaceMeasure {
        char_width: 10.0,
        line_height: 20.0,
    };

    fn viewport(width: f32) -> Viewport {
        Viewport {
            width,
            scroll_top: 0.0,
        }
    }

    #[test]
    fn test_single_line() {
        let doc = parse_flat("hello@");
        let point = caret_coordinates(&doc, 6, &MONO, viewport(500.0));
        assert_eq!(point, Point { x: 60.0, y: 0.0 });
    }

    #[test]
    fn test_wrapping() {
        let doc = parse_flat("abcdefgh");
        // Four characters per line
        let point = caret_coordinates(&doc, 6, &MONO, viewport(40.0));
        assert_eq!(point, Point { x: 20.0, y: 20.0 });
    }

    #[test]
    fn test_mention_measured_by_label() {
        let doc = parse_flat("@mcp<a|b>x");
        // Label "a/b" is three characters wide
        let point = caret_coordinates(&doc, 1, &MONO, viewport(500.0));
        assert_eq!(point.x, 30.0);
    }

    #[test]
    fn test_blocks_start_new_lines_and_scroll_applies() {
        let doc = Document::from_blocks(vec![
            Block::paragraph(vec![Inline::text("ab")]),
            Block::paragraph(vec![Inline::text("cd")]),
        ]);
        let point = caret_coordinates(
            &doc,
            4,
            &MONO,
            Viewport {
                width: 500.0,
                scroll_top: 5.0,
            },
        );
        assert_eq!(point, Point { x: 10.0, y: 15.0 });

        let anchor = popover_anchor(&doc, 4, &MONO, viewport(500.0));
        assert_eq!(anchor, Point { x: 10.0, y: 40.0 });
    }
}
