//! Editable snippet fields and their budgets

use serde::{Deserialize, Serialize};

use crate::measure::overflows;

/// Title pixel budget before a results page truncates it
pub const TITLE_MAX_PX: f32 = 580.0;
/// Display url pixel budget
pub const URL_MAX_PX: f32 = 385.0;
/// Description pixel budget
pub const DESCRIPTION_MAX_PX: f32 = 990.0;
/// Character budget shown next to the title
pub const TITLE_MAX_CHARS: usize = 60;
/// Default character budget for the description
pub const DEFAULT_DESCRIPTION_MAX_CHARS: usize = 157;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Url,
    Title,
    Description,
    SearchQuery,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Url,
        FieldKind::Title,
        FieldKind::Description,
        FieldKind::SearchQuery,
    ];

    /// Pixel budget; the search query has none.
    pub fn max_pixel_width(self) -> Option<f32> {
        match self {
            FieldKind::Url => Some(URL_MAX_PX),
            FieldKind::Title => Some(TITLE_MAX_PX),
            FieldKind::Description => Some(DESCRIPTION_MAX_PX),
            FieldKind::SearchQuery => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FieldKind::Url => "url",
            FieldKind::Title => "title",
            FieldKind::Description => "description",
            FieldKind::SearchQuery => "search query",
        }
    }
}

/// A text field with its measured width
///
/// The width is written only by [`crate::SnippetModel`], which re-measures
/// the field every time its value changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetField {
    kind: FieldKind,
    value: String,
    pixel_width: f32,
}

impl SnippetField {
    pub(crate) fn new(kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            pixel_width: 0.0,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn pixel_width(&self) -> f32 {
        self.pixel_width
    }

    pub fn max_pixel_width(&self) -> Option<f32> {
        self.kind.max_pixel_width()
    }

    pub fn overflow(&self) -> bool {
        self.max_pixel_width()
            .is_some_and(|max| overflows(self.pixel_width, max))
    }

    /// Length in Unicode scalar values, as a text input counts it.
    pub fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    pub(crate) fn set_value(&mut self, value: String) {
        self.value = value;
    }

    pub(crate) fn set_pixel_width(&mut self, width: f32) {
        self.pixel_width = width.max(0.0);
    }
}

/// A character-count budget, evaluated without any font measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBudget {
    pub count: usize,
    pub max: usize,
    pub overflow: bool,
}

impl CharacterBudget {
    pub fn new(count: usize, max: usize) -> Self {
        Self {
            count,
            max,
            overflow: count > max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_overflow_uses_its_budget() {
        let mut f = SnippetField::new(FieldKind::Title, "t");
        f.set_pixel_width(600.0);
        assert!(f.overflow());
        f.set_pixel_width(580.0);
        assert!(!f.overflow());
    }

    #[test]
    fn search_query_never_overflows() {
        let mut f = SnippetField::new(FieldKind::SearchQuery, "q");
        f.set_pixel_width(10_000.0);
        assert!(!f.overflow());
    }

    #[test]
    fn char_count_counts_scalars_not_bytes() {
        let f = SnippetField::new(FieldKind::Description, "日本語");
        assert_eq!(f.char_count(), 3);
    }

    #[test]
    fn character_budget_is_strict() {
        assert!(!CharacterBudget::new(157, 157).overflow);
        assert!(CharacterBudget::new(158, 157).overflow);
    }
}
