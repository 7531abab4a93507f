//! Text measurement
//!
//! Everything that decides whether a snippet field fits its pixel budget goes
//! through the [`TextMeasurer`] trait. The production backend is
//! [`GlyphMeasurer`], which sums real glyph advances from a font file; counting
//! characters is not a substitute because glyph widths vary wildly (compare
//! `"iiii"` with `"WWWW"`, or any CJK text).

#[cfg(feature = "glyph")]
pub mod glyph;

#[cfg(feature = "glyph")]
pub use glyph::GlyphMeasurer;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Suffix appended to text cut down to a pixel budget
pub const ELLIPSIS: &str = "...";

/// Font selection for a measurement: pixel size plus a CSS-style family list
///
/// `family` may name several families separated by commas
/// (`"arial, sans-serif"`); backends use the first one they know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub size_px: f32,
    pub family: String,
}

impl FontSpec {
    pub fn new(size_px: f32, family: impl Into<String>) -> Self {
        Self {
            size_px,
            family: family.into(),
        }
    }

    /// Normalized family names in preference order.
    pub fn families(&self) -> impl Iterator<Item = String> + '_ {
        self.family
            .split(',')
            .map(normalize_family)
            .filter(|f| !f.is_empty())
    }
}

/// Lowercases a family name and strips surrounding quotes and whitespace.
pub(crate) fn normalize_family(name: &str) -> String {
    name.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_ascii_lowercase()
}

/// Immutable measurement request
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSpec {
    pub text: String,
    pub font: FontSpec,
}

impl MeasurementSpec {
    pub fn new(text: impl Into<String>, font: FontSpec) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

/// Measures the rendered width of text.
///
/// Implementations must be deterministic for a fixed font set, return `0.0`
/// for empty text, never return a negative width, and never shrink when
/// characters are appended.
pub trait TextMeasurer: Send + Sync {
    /// Rendered width of `text` in pixels.
    fn measure(&self, text: &str, font: &FontSpec) -> Result<f32>;

    /// Convenience wrapper taking a bundled [`MeasurementSpec`].
    fn measure_spec(&self, spec: &MeasurementSpec) -> Result<f32> {
        self.measure(&spec.text, &spec.font)
    }
}

/// Strict overflow check: a width equal to the budget still fits.
pub fn overflows(width: f32, budget: f32) -> bool {
    width > budget
}

/// Cut `text` down so that it plus [`ELLIPSIS`] fits within `max_width`.
///
/// Text that already fits is returned unchanged. If not even the bare
/// ellipsis fits, an empty string is returned.
pub fn truncate_to_width(
    measurer: &dyn TextMeasurer,
    text: &str,
    font: &FontSpec,
    max_width: f32,
) -> Result<String> {
    if !overflows(measurer.measure(text, font)?, max_width) {
        return Ok(text.to_string());
    }

    let starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let fits = |kept: usize| -> Result<bool> {
        let candidate = format!("{}{}", &text[..starts[kept]], ELLIPSIS);
        Ok(!overflows(measurer.measure(&candidate, font)?, max_width))
    };

    if !fits(0)? {
        return Ok(String::new());
    }

    // Largest kept-char count that fits; the full text (starts.len()) does not.
    let (mut lo, mut hi) = (0usize, starts.len());
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid)? {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Ok(format!("{}{}", text[..starts[lo]].trim_end(), ELLIPSIS))
}


#[cfg(test)]
mod tests {
    use super::testing::FixedAdvance;
    use super::*;

    fn font() -> FontSpec {
        FontSpec::new(14.0, "arial, sans-serif")
    }

    #[test]
    fn families_are_normalized_in_order() {
        let f = FontSpec::new(12.0, " \"Arial\" , 'Liberation Sans',sans-serif,");
        let fams: Vec<_> = f.families().collect();
        assert_eq!(fams, vec!["arial", "liberation sans", "sans-serif"]);
    }

    #[test]
    fn overflow_is_strict() {
        assert!(overflows(600.0, 580.0));
        assert!(!overflows(580.0, 580.0));
        assert!(!overflows(0.0, 580.0));
    }

    #[test]
    fn truncate_keeps_fitting_text() {
        let m = FixedAdvance { advance: 10.0 };
        let out = truncate_to_width(&m, "hello", &font(), 50.0).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn truncate_cuts_with_ellipsis_within_budget() {
        let m = FixedAdvance { advance: 10.0 };
        let out = truncate_to_width(&m, "abcdefghij", &font(), 80.0).unwrap();
        // 5 chars + 3 dots = 80px
        assert_eq!(out, "abcde...");
        assert!(m.measure(&out, &font()).unwrap() <= 80.0);
    }

    #[test]
    fn truncate_trims_trailing_space_before_ellipsis() {
        let m = FixedAdvance { advance: 10.0 };
        let out = truncate_to_width(&m, "abcd efghij", &font(), 80.0).unwrap();
        assert_eq!(out, "abcd...");
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        let m = FixedAdvance { advance: 10.0 };
        let out = truncate_to_width(&m, "ééééééééé", &font(), 60.0).unwrap();
        assert_eq!(out, "ééé...");
    }

    #[test]
    fn truncate_returns_empty_when_ellipsis_does_not_fit() {
        let m = FixedAdvance { advance: 10.0 };
        let out = truncate_to_width(&m, "abcdef", &font(), 20.0).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn measure_spec_delegates() {
        let m = FixedAdvance { advance: 3.0 };
        let spec = MeasurementSpec::new("WW", font());
        assert_eq!(m.measure_spec(&spec).unwrap(), 12.0);
    }
}
