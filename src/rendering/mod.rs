//! Projection of a snippet model into a mock search result

pub mod layout;

use serde::Serialize;

use crate::measure::truncate_to_width;
use crate::snippet::{DeviceMode, FieldKind, SnippetModel};
use crate::Result;

use layout::{layout_card, LayoutNode, RowKind, RowText};

pub const RESULT_STATS: &str = "About 1,230,000 results (0.45 seconds)";
pub const RATING_STARS: u8 = 4;
pub const RATING_LABEL: &str = "4.2 (1,234)";
pub const DATE_LABEL: &str = "Jan 15, 2025";

const TITLE_LINES: usize = 2;
const DESCRIPTION_LINES: usize = 3;

/// Icon shown next to the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "src")]
pub enum Icon {
    Remote(String),
    /// Placeholder globe, used when no favicon is known or it failed to load
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub stars: u8,
    pub label: String,
}

/// What the result card shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerpPreview {
    pub device: DeviceMode,
    pub container_width: u32,
    pub favicon: Option<Icon>,
    /// Fields cut to their pixel budgets
    pub url: String,
    pub title: String,
    pub description: String,
    pub rating: Option<Rating>,
    pub date: Option<String>,
    #[serde(skip)]
    pub rows: Vec<LayoutNode>,
}

/// Render the current state of `model`.
pub fn render_preview(model: &SnippetModel) -> Result<SerpPreview> {
    let state = model.state();
    let measurer = model.measurer();
    let fonts = model.fonts();

    let fit = |kind: FieldKind| -> Result<String> {
        let field = state.field(kind);
        match field.max_pixel_width() {
            Some(max) => truncate_to_width(measurer, field.value(), fonts.for_field(kind), max),
            None => Ok(field.value().to_string()),
        }
    };

    let favicon = state.show_favicon.then(|| match &state.favicon_url {
        Some(src) if !state.favicon_failed && !src.trim().is_empty() => Icon::Remote(src.clone()),
        _ => Icon::Default,
    });

    let url = fit(FieldKind::Url)?;
    let title = fit(FieldKind::Title)?;
    let description = fit(FieldKind::Description)?;
    let rating = state.show_rating.then(|| Rating {
        stars: RATING_STARS,
        label: RATING_LABEL.to_string(),
    });
    let date = state.show_date.then(|| DATE_LABEL.to_string());
    let meta = meta_line(rating.as_ref(), date.as_deref());

    let container_width = state.device.container_width();
    let rows = layout_card(
        measurer,
        container_width,
        favicon.is_some(),
        &[
            RowText {
                kind: RowKind::Url,
                text: &url,
                font: &fonts.url,
                max_lines: 1,
            },
            RowText {
                kind: RowKind::Title,
                text: &title,
                font: &fonts.title,
                max_lines: TITLE_LINES,
            },
            RowText {
                kind: RowKind::Description,
                text: &description,
                font: &fonts.description,
                max_lines: DESCRIPTION_LINES,
            },
            RowText {
                kind: RowKind::Meta,
                text: &meta,
                font: &fonts.description,
                max_lines: 1,
            },
        ],
    )?;

    Ok(SerpPreview {
        device: state.device,
        container_width,
        favicon,
        url,
        title,
        description,
        rating,
        date,
        rows,
    })
}

fn meta_line(rating: Option<&Rating>, date: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(r) = rating {
        parts.push(format!("{} {}", stars(r.stars), r.label));
    }
    if let Some(d) = date {
        parts.push(d.to_string());
    }
    parts.join(" · ")
}

fn stars(filled: u8) -> String {
    (0..5u8).map(|i| if i < filled { '★' } else { '☆' }).collect()
}

impl SerpPreview {
    /// Plain-text rendering of the laid-out card.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("[{} preview, {}px]\n", self.device.label(), self.container_width));
        out.push_str(RESULT_STATS);
        out.push_str("\n\n");
        let icon = match &self.favicon {
            Some(Icon::Remote(_)) => "[*] ",
            Some(Icon::Default) => "[o] ",
            None => "",
        };
        let indent = " ".repeat(icon.chars().count());
        for node in &self.rows {
            if node.kind == RowKind::Favicon {
                continue;
            }
            for line in &node.lines {
                if node.kind == RowKind::Url {
                    out.push_str(icon);
                } else {
                    out.push_str(&indent);
                }
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    pub fn row(&self, kind: RowKind) -> Option<&LayoutNode> {
        self.rows.iter().find(|n| n.kind == kind)
    }
}
