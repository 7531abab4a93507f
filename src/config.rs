//! Preview configuration
//!
//! The defaults are chosen to match a desktop results page: Arial at 20px
//! for titles and 14px for the url and description lines.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::measure::FontSpec;
use crate::snippet::{DeviceMode, FieldKind, DEFAULT_DESCRIPTION_MAX_CHARS};
use crate::{Error, Result};

/// Default CSS family list for every snippet line
pub const DEFAULT_FONT_FAMILY: &str = "arial, sans-serif";

/// Font used to measure each snippet field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetFonts {
    pub title: FontSpec,
    pub url: FontSpec,
    pub description: FontSpec,
    pub search_query: FontSpec,
}

impl Default for SnippetFonts {
    fn default() -> Self {
        Self {
            title: FontSpec::new(20.0, DEFAULT_FONT_FAMILY),
            url: FontSpec::new(14.0, DEFAULT_FONT_FAMILY),
            description: FontSpec::new(14.0, DEFAULT_FONT_FAMILY),
            search_query: FontSpec::new(16.0, DEFAULT_FONT_FAMILY),
        }
    }
}

impl SnippetFonts {
    pub fn for_field(&self, kind: FieldKind) -> &FontSpec {
        match kind {
            FieldKind::Url => &self.url,
            FieldKind::Title => &self.title,
            FieldKind::Description => &self.description,
            FieldKind::SearchQuery => &self.search_query,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (FieldKind, &FontSpec)> {
        FieldKind::ALL.into_iter().map(move |k| (k, self.for_field(k)))
    }
}

/// A font file registered under a family name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFile {
    pub family: String,
    pub path: PathBuf,
}

/// Configuration for a preview session
///
/// # Examples
///
/// ```
/// let cfg = serp_preview::PreviewConfig::default();
/// assert_eq!(cfg.description_max_characters, 157);
/// assert_eq!(cfg.fonts.title.size_px, 20.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Font per snippet field
    pub fonts: SnippetFonts,
    /// Extra font files, registered on top of the system font
    pub font_files: Vec<FontFile>,
    /// Whether to probe well-known system font locations
    pub use_system_fonts: bool,
    /// Simulated latency of the mock metadata provider in milliseconds
    pub fetch_delay_ms: u64,
    /// Initial description character budget
    pub description_max_characters: usize,
    /// Initial device mode
    pub device: DeviceMode,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            fonts: SnippetFonts::default(),
            font_files: Vec::new(),
            use_system_fonts: true,
            fetch_delay_ms: 1500,
            description_max_characters: DEFAULT_DESCRIPTION_MAX_CHARS,
            device: DeviceMode::Desktop,
        }
    }
}

impl PreviewConfig {
    /// Parse a JSON configuration file; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        for (kind, font) in self.fonts.iter() {
            if !(font.size_px.is_finite() && font.size_px > 0.0) {
                return Err(Error::Config(format!(
                    "{} font size must be positive, got {}",
                    kind.label(),
                    font.size_px
                )));
            }
            if font.families().next().is_none() {
                return Err(Error::Config(format!("{} font family is empty", kind.label())));
            }
        }
        if self.description_max_characters == 0 {
            return Err(Error::Config(
                "description_max_characters must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Build the glyph measurer described by this configuration.
    #[cfg(feature = "glyph")]
    pub fn build_measurer(&self) -> Result<crate::measure::GlyphMeasurer> {
        use crate::measure::GlyphMeasurer;

        let mut measurer = if self.use_system_fonts {
            match GlyphMeasurer::from_system() {
                Ok(m) => m,
                Err(e) if !self.font_files.is_empty() => {
                    log::warn!("{}; continuing with configured fonts only", e);
                    GlyphMeasurer::new()
                }
                Err(e) => return Err(e),
            }
        } else {
            GlyphMeasurer::new()
        };

        for file in &self.font_files {
            measurer.register_file(&file.family, &file.path)?;
        }
        if self.font_files.is_empty() && !self.use_system_fonts {
            return Err(Error::Config(
                "no fonts configured and system fonts disabled".into(),
            ));
        }
        Ok(measurer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = PreviewConfig::from_json_str(r#"{ "fetch_delay_ms": 0, "device": "mobile" }"#)
            .unwrap();
        assert_eq!(cfg.fetch_delay_ms, 0);
        assert_eq!(cfg.device, DeviceMode::Mobile);
        assert_eq!(cfg.fonts, SnippetFonts::default());
        assert!(cfg.use_system_fonts);
    }

    #[test]
    fn zero_character_budget_is_rejected() {
        let err =
            PreviewConfig::from_json_str(r#"{ "description_max_characters": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn non_positive_font_size_is_rejected() {
        let mut cfg = PreviewConfig::default();
        cfg.fonts.url.size_px = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            PreviewConfig::from_json_str("{ nope"),
            Err(Error::Config(_))
        ));
    }

    #[cfg(feature = "glyph")]
    #[test]
    fn measurer_without_any_font_source_fails() {
        let cfg = PreviewConfig {
            use_system_fonts: false,
            ..Default::default()
        };
        assert!(matches!(cfg.build_measurer(), Err(Error::Config(_))));
    }
}
