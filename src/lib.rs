//! SERP Preview
//!
//! Preview how a page's title, url and description would appear in a search
//! results listing, and check each line against the pixel budgets a results
//! page truncates at.
//!
//! # Features
//!
//! - **Glyph measurement** (default, `glyph`): widths come from real font
//!   advance and kerning tables, not character counts
//! - **Dual budgets**: pixel overflow and character counts are reported side
//!   by side and never merged
//! - **Single-flight fetch**: metadata fetches are validated, normalized and
//!   serialized at the model level
//!
//! # Example
//!
//! ```no_run
//! use serp_preview::{PreviewConfig, SnippetModel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PreviewConfig::default();
//! let measurer = serp_preview::new_measurer(&config)?;
//! let mut model = SnippetModel::with_config(measurer, &config)?;
//! model.set_title("A very long page title that may or may not fit in a results page")?;
//! let report = model.overflow_report();
//! println!("title: {:.1}px overflow={}", report.title.pixel_width, report.title.overflow);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "glyph")]
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod measure;
pub mod notification;
pub mod rendering;
pub mod session;
pub mod snippet;

pub use config::{FontFile, PreviewConfig, SnippetFonts};
pub use error::{Error, Result};
pub use export::{export_snapshot, ExportArtifact, ExportPayload, SnippetSnapshot};
pub use fetch::{
    normalize_url, FailingMetadataProvider, FetchResult, FetchState, FetchTicket,
    MetadataProvider, MockMetadataProvider,
};
pub use measure::{FontSpec, MeasurementSpec, TextMeasurer};
pub use notification::{Level, Notification};
pub use rendering::{render_preview, Icon, SerpPreview};
pub use session::Session;
pub use snippet::{
    CharacterBudget, DeviceMode, FieldKind, OverflowReport, SnippetField, SnippetModel,
    SnippetState,
};

#[cfg(feature = "glyph")]
pub use measure::GlyphMeasurer;

/// Create the measurer described by `config` with the default backend.
#[cfg(feature = "glyph")]
pub fn new_measurer(config: &PreviewConfig) -> Result<Arc<dyn TextMeasurer>> {
    Ok(Arc::new(config.build_measurer()?))
}

/// Create a session with a mock metadata provider using the configured delay.
#[cfg(feature = "glyph")]
pub fn new_session(config: &PreviewConfig) -> Result<Session> {
    let measurer = new_measurer(config)?;
    let model = SnippetModel::with_config(measurer, config)?;
    let provider = MockMetadataProvider::new(std::time::Duration::from_millis(
        config.fetch_delay_ms,
    ));
    Ok(Session::new(model, Arc::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PreviewConfig::default();
        assert_eq!(config.device, DeviceMode::Desktop);
        assert_eq!(config.fetch_delay_ms, 1500);
        assert!(config.use_system_fonts);
    }

    #[test]
    fn test_budgets() {
        assert_eq!(FieldKind::Title.max_pixel_width(), Some(580.0));
        assert_eq!(FieldKind::Url.max_pixel_width(), Some(385.0));
        assert_eq!(FieldKind::Description.max_pixel_width(), Some(990.0));
        assert_eq!(FieldKind::SearchQuery.max_pixel_width(), None);
    }
}
