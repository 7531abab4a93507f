/// Box layout of a result card: rows stacked top to bottom, text wrapped by
/// measured width and clamped to a fixed number of lines.

use crate::measure::{overflows, truncate_to_width, FontSpec, TextMeasurer};
use crate::Result;

pub const CARD_PADDING: u32 = 16;
pub const FAVICON_SIZE: u32 = 16;
pub const FAVICON_GAP: u32 = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Favicon,
    Url,
    Title,
    Description,
    Meta,
}

impl RowKind {
    /// Line height and bottom margin in pixels.
    fn metrics(self) -> (u32, u32) {
        match self {
            RowKind::Favicon => (FAVICON_SIZE, 0),
            RowKind::Url => (20, 4),
            RowKind::Title => (28, 8),
            RowKind::Description => (23, 8),
            RowKind::Meta => (20, 0),
        }
    }
}

/// One laid-out row of the card
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub kind: RowKind,
    pub lines: Vec<String>,
}

/// Text column geometry for a card of `container_width` pixels.
pub fn content_box(container_width: u32, with_favicon: bool) -> Rect {
    let offset = if with_favicon {
        FAVICON_SIZE + FAVICON_GAP
    } else {
        0
    };
    Rect {
        x: (CARD_PADDING + offset) as i32,
        y: CARD_PADDING as i32,
        width: container_width.saturating_sub(CARD_PADDING * 2 + offset),
        height: 0,
    }
}

/// Greedy word wrap by measured width, at most `max_lines` lines.
///
/// When text remains after the last allowed line, that line ends with an
/// ellipsis. Words wider than the line are cut the same way.
pub fn wrap_lines(
    measurer: &dyn TextMeasurer,
    text: &str,
    font: &FontSpec,
    max_width: f32,
    max_lines: usize,
) -> Result<Vec<String>> {
    let max_lines = max_lines.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut lines: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut i = 0;

    while i < words.len() {
        let candidate = if cur.is_empty() {
            words[i].to_string()
        } else {
            format!("{} {}", cur, words[i])
        };
        if cur.is_empty() || !overflows(measurer.measure(&candidate, font)?, max_width) {
            cur = candidate;
            i += 1;
            continue;
        }
        if lines.len() + 1 == max_lines {
            // last line: keep the rest so truncation below adds the ellipsis
            cur = format!("{} {}", cur, words[i..].join(" "));
            break;
        }
        lines.push(std::mem::take(&mut cur));
    }
    if !cur.is_empty() {
        lines.push(cur);
    }

    lines
        .iter()
        .map(|l| truncate_to_width(measurer, l, font, max_width))
        .collect()
}

/// A row's text and font, in display order.
pub struct RowText<'a> {
    pub kind: RowKind,
    pub text: &'a str,
    pub font: &'a FontSpec,
    pub max_lines: usize,
}

/// Stack the rows inside a card of `container_width` pixels.
pub fn layout_card(
    measurer: &dyn TextMeasurer,
    container_width: u32,
    with_favicon: bool,
    rows: &[RowText<'_>],
) -> Result<Vec<LayoutNode>> {
    let content = content_box(container_width, with_favicon);
    let mut nodes = Vec::new();

    if with_favicon {
        nodes.push(LayoutNode {
            rect: Rect {
                x: CARD_PADDING as i32,
                y: CARD_PADDING as i32 + 4,
                width: FAVICON_SIZE,
                height: FAVICON_SIZE,
            },
            kind: RowKind::Favicon,
            lines: Vec::new(),
        });
    }

    let mut y = content.y as u32;
    for row in rows {
        let lines = wrap_lines(
            measurer,
            row.text,
            row.font,
            content.width as f32,
            row.max_lines,
        )?;
        if lines.is_empty() {
            continue;
        }
        let (line_height, margin) = row.kind.metrics();
        let height = line_height * lines.len() as u32;
        nodes.push(LayoutNode {
            rect: Rect {
                x: content.x,
                y: y as i32,
                width: content.width,
                height,
            },
            kind: row.kind,
            lines,
        });
        y += height + margin;
    }

    Ok(nodes)
}
