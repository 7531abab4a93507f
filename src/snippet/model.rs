//! Snippet state and the commands that mutate it

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use super::device::DeviceMode;
use super::field::{CharacterBudget, FieldKind, SnippetField, TITLE_MAX_CHARS};
use crate::config::{PreviewConfig, SnippetFonts};
use crate::fetch::{normalize_url, FetchResult, FetchState, FetchTicket};
use crate::measure::TextMeasurer;
use crate::{Error, Result};

pub const DEFAULT_URL: &str = "https://example.com";
pub const DEFAULT_TITLE: &str = "Example Domain - Your Website Title Here";
pub const DEFAULT_DESCRIPTION: &str = "This domain is for use in illustrative examples in documents. You may use this domain in literature without prior coordination or asking for permission.";
/// Failure reason recorded when a pending fetch is dropped
pub const FETCH_CANCELLED: &str = "cancelled";

/// Everything the user can edit, plus the fetch lifecycle
#[derive(Debug, Clone)]
pub struct SnippetState {
    pub url: SnippetField,
    pub title: SnippetField,
    pub description: SnippetField,
    pub search_query: SnippetField,
    pub device: DeviceMode,
    pub show_date: bool,
    pub show_rating: bool,
    pub show_favicon: bool,
    pub favicon_url: Option<String>,
    /// Set once the favicon failed to load; the renderer then shows the default icon
    pub favicon_failed: bool,
    pub description_max_characters: usize,
    pub fetch: FetchState,
}

impl SnippetState {
    fn initial(config: &PreviewConfig) -> Self {
        Self {
            url: SnippetField::new(FieldKind::Url, DEFAULT_URL),
            title: SnippetField::new(FieldKind::Title, DEFAULT_TITLE),
            description: SnippetField::new(FieldKind::Description, DEFAULT_DESCRIPTION),
            search_query: SnippetField::new(FieldKind::SearchQuery, ""),
            device: config.device,
            show_date: true,
            show_rating: true,
            show_favicon: true,
            favicon_url: None,
            favicon_failed: false,
            description_max_characters: config.description_max_characters,
            fetch: FetchState::Idle,
        }
    }

    pub fn field(&self, kind: FieldKind) -> &SnippetField {
        match kind {
            FieldKind::Url => &self.url,
            FieldKind::Title => &self.title,
            FieldKind::Description => &self.description,
            FieldKind::SearchQuery => &self.search_query,
        }
    }

    fn field_mut(&mut self, kind: FieldKind) -> &mut SnippetField {
        match kind {
            FieldKind::Url => &mut self.url,
            FieldKind::Title => &mut self.title,
            FieldKind::Description => &mut self.description,
            FieldKind::SearchQuery => &mut self.search_query,
        }
    }
}

/// Pixel verdict for one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldReport {
    pub pixel_width: f32,
    pub max_pixel_width: Option<f32>,
    pub overflow: bool,
}

impl From<&SnippetField> for FieldReport {
    fn from(f: &SnippetField) -> Self {
        Self {
            pixel_width: f.pixel_width(),
            max_pixel_width: f.max_pixel_width(),
            overflow: f.overflow(),
        }
    }
}

/// All derived budgets at a glance. Pixel and character verdicts are kept
/// separate and may disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverflowReport {
    pub device: DeviceMode,
    pub container_width: u32,
    pub url: FieldReport,
    pub title: FieldReport,
    pub description: FieldReport,
    pub search_query: FieldReport,
    pub title_chars: CharacterBudget,
    pub description_chars: CharacterBudget,
}

/// Owns the snippet state and keeps its measurements current
///
/// Every command that changes a text field re-measures it before returning,
/// so widths read from [`SnippetModel::state`] always match the text.
pub struct SnippetModel {
    state: SnippetState,
    fonts: SnippetFonts,
    measurer: Arc<dyn TextMeasurer>,
    next_ticket: u64,
}

impl std::fmt::Debug for SnippetModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetModel")
            .field("state", &self.state)
            .field("fonts", &self.fonts)
            .finish_non_exhaustive()
    }
}

impl SnippetModel {
    /// Model with the default fields and fonts.
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Result<Self> {
        Self::with_config(measurer, &PreviewConfig::default())
    }

    pub fn with_config(measurer: Arc<dyn TextMeasurer>, config: &PreviewConfig) -> Result<Self> {
        config.validate()?;
        let mut model = Self {
            state: SnippetState::initial(config),
            fonts: config.fonts.clone(),
            measurer,
            next_ticket: 0,
        };
        model.recompute_overflow()?;
        Ok(model)
    }

    pub fn state(&self) -> &SnippetState {
        &self.state
    }

    pub fn field(&self, kind: FieldKind) -> &SnippetField {
        self.state.field(kind)
    }

    pub fn fonts(&self) -> &SnippetFonts {
        &self.fonts
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    pub fn set_url(&mut self, value: impl Into<String>) -> Result<()> {
        self.set_text(FieldKind::Url, value.into())
    }

    pub fn set_title(&mut self, value: impl Into<String>) -> Result<()> {
        self.set_text(FieldKind::Title, value.into())
    }

    pub fn set_description(&mut self, value: impl Into<String>) -> Result<()> {
        self.set_text(FieldKind::Description, value.into())
    }

    pub fn set_search_query(&mut self, value: impl Into<String>) -> Result<()> {
        self.set_text(FieldKind::SearchQuery, value.into())
    }

    pub fn set_device_mode(&mut self, device: DeviceMode) -> Result<()> {
        self.state.device = device;
        self.recompute_overflow()
    }

    pub fn set_show_date(&mut self, show: bool) {
        self.state.show_date = show;
    }

    pub fn set_show_rating(&mut self, show: bool) {
        self.state.show_rating = show;
    }

    pub fn set_show_favicon(&mut self, show: bool) {
        self.state.show_favicon = show;
    }

    /// Change the description's character budget; zero is rejected.
    pub fn set_description_max_characters(&mut self, max: usize) -> Result<()> {
        if max == 0 {
            return Err(Error::Validation(
                "description character budget must be at least 1".into(),
            ));
        }
        self.state.description_max_characters = max;
        Ok(())
    }

    /// Point at a new favicon; clears any earlier load failure.
    pub fn set_favicon_url(&mut self, url: Option<String>) {
        self.state.favicon_url = url;
        self.state.favicon_failed = false;
    }

    /// Record that the favicon image failed to load.
    pub fn mark_favicon_failed(&mut self) {
        debug!("Favicon failed to load; falling back to default icon");
        self.state.favicon_failed = true;
    }

    /// Re-measure every field against the current fonts.
    ///
    /// All fields are attempted even if one fails; the first error is
    /// returned and failed fields read as zero width.
    pub fn recompute_overflow(&mut self) -> Result<()> {
        let mut first_err = None;
        for kind in FieldKind::ALL {
            if let Err(e) = self.remeasure(kind) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn set_text(&mut self, kind: FieldKind, value: String) -> Result<()> {
        self.state.field_mut(kind).set_value(value);
        self.remeasure(kind)
    }

    fn remeasure(&mut self, kind: FieldKind) -> Result<()> {
        let font = self.fonts.for_field(kind);
        let field = self.state.field(kind);
        match self.measurer.measure(field.value(), font) {
            Ok(width) => {
                self.state.field_mut(kind).set_pixel_width(width);
                Ok(())
            }
            Err(e) => {
                warn!("Measuring {} failed: {}", kind.label(), e);
                self.state.field_mut(kind).set_pixel_width(0.0);
                Err(e)
            }
        }
    }

    pub fn title_chars(&self) -> CharacterBudget {
        CharacterBudget::new(self.state.title.char_count(), TITLE_MAX_CHARS)
    }

    pub fn description_chars(&self) -> CharacterBudget {
        CharacterBudget::new(
            self.state.description.char_count(),
            self.state.description_max_characters,
        )
    }

    pub fn overflow_report(&self) -> OverflowReport {
        OverflowReport {
            device: self.state.device,
            container_width: self.state.device.container_width(),
            url: (&self.state.url).into(),
            title: (&self.state.title).into(),
            description: (&self.state.description).into(),
            search_query: (&self.state.search_query).into(),
            title_chars: self.title_chars(),
            description_chars: self.description_chars(),
        }
    }

    /// True while a fetch is pending.
    pub fn is_loading(&self) -> bool {
        self.state.fetch.is_pending()
    }

    /// Validate and normalize `raw_url` and mark a fetch as pending.
    ///
    /// Fails without touching the state when the URL is blank or invalid, or
    /// when another fetch has not completed yet.
    pub fn begin_fetch(&mut self, raw_url: &str) -> Result<FetchTicket> {
        if self.is_loading() {
            return Err(Error::FetchInFlight);
        }
        let url = normalize_url(raw_url)?;
        self.next_ticket += 1;
        let id = self.next_ticket;
        self.state.fetch = FetchState::Pending {
            url: url.clone(),
            ticket: id,
        };
        Ok(FetchTicket { id, url })
    }

    /// Finish the fetch started with `ticket`.
    ///
    /// On success the title, description, favicon and search query are
    /// replaced. On failure, including a measurement failure of the fetched
    /// text, no field changes and the error is handed back.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<FetchResult>,
    ) -> Result<FetchResult> {
        match &self.state.fetch {
            FetchState::Pending { ticket: id, .. } if *id == ticket.id => {}
            _ => {
                return Err(Error::Fetch(format!(
                    "no pending fetch for {}",
                    ticket.url
                )))
            }
        }

        let applied = match result {
            Ok(res) => self.apply_fetch_result(&res).map(|()| res),
            Err(Error::Fetch(reason)) => Err(Error::Fetch(reason)),
            Err(other) => Err(Error::Fetch(other.to_string())),
        };
        match applied {
            Ok(res) => {
                self.state.fetch = FetchState::Succeeded { url: ticket.url };
                Ok(res)
            }
            Err(e) => {
                self.state.fetch = FetchState::Failed {
                    url: ticket.url,
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Give up on the fetch started with `ticket`; no field changes.
    pub fn cancel_fetch(&mut self, ticket: FetchTicket) {
        self.abandon_fetch(ticket.id);
    }

    /// Move a still-pending fetch with id `ticket` to `Failed`.
    ///
    /// Does nothing once the fetch was completed or superseded.
    pub(crate) fn abandon_fetch(&mut self, ticket: u64) {
        let url = match &self.state.fetch {
            FetchState::Pending { url, ticket: id } if *id == ticket => url.clone(),
            _ => return,
        };
        warn!("Fetch for {} cancelled before it completed", url);
        self.state.fetch = FetchState::Failed {
            url,
            reason: FETCH_CANCELLED.into(),
        };
    }

    /// Merge fetched metadata into the fields.
    ///
    /// New values are measured before any field is written, so a measurement
    /// error leaves the snippet unchanged.
    pub fn apply_fetch_result(&mut self, res: &FetchResult) -> Result<()> {
        let title = self.measure_value(FieldKind::Title, &res.title)?;
        let description = self.measure_value(FieldKind::Description, &res.description)?;
        let query = if res.title.is_empty() {
            None
        } else {
            Some(self.measure_value(FieldKind::SearchQuery, &res.title)?)
        };

        self.commit(FieldKind::Title, res.title.clone(), title);
        self.commit(FieldKind::Description, res.description.clone(), description);
        if let Some(width) = query {
            self.commit(FieldKind::SearchQuery, res.title.clone(), width);
        }
        self.set_favicon_url(res.favicon.clone());
        Ok(())
    }

    fn measure_value(&self, kind: FieldKind, value: &str) -> Result<f32> {
        self.measurer.measure(value, self.fonts.for_field(kind))
    }

    fn commit(&mut self, kind: FieldKind, value: String, width: f32) {
        let field = self.state.field_mut(kind);
        field.set_value(value);
        field.set_pixel_width(width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::testing::FixedAdvance;
    use crate::measure::FontSpec;

    /// Returns a fixed width for any text, 0 for empty text.
    struct Constant(f32);

    impl TextMeasurer for Constant {
        fn measure(&self, text: &str, _font: &FontSpec) -> Result<f32> {
            Ok(if text.is_empty() { 0.0 } else { self.0 })
        }
    }

    struct Broken;

    impl TextMeasurer for Broken {
        fn measure(&self, _text: &str, font: &FontSpec) -> Result<f32> {
            Err(Error::UnknownFont(font.family.clone()))
        }
    }

    fn model(advance: f32) -> SnippetModel {
        SnippetModel::new(Arc::new(FixedAdvance { advance })).unwrap()
    }

    #[test]
    fn defaults_are_measured_on_creation() {
        let m = model(1.0);
        let s = m.state();
        assert_eq!(s.url.value(), DEFAULT_URL);
        // one extra unit for the double-width 'W' in "Website"
        assert_eq!(
            s.title.pixel_width(),
            DEFAULT_TITLE.chars().count() as f32 + 1.0
        );
        assert_eq!(s.search_query.pixel_width(), 0.0);
        assert!(s.show_date && s.show_rating && s.show_favicon);
        assert_eq!(s.description_max_characters, 157);
        assert_eq!(s.device, DeviceMode::Desktop);
    }

    #[test]
    fn title_at_600_overflows_but_580_does_not() {
        let mut m = SnippetModel::new(Arc::new(Constant(600.0))).unwrap();
        m.set_title("anything").unwrap();
        assert!(m.field(FieldKind::Title).overflow());

        let mut m = SnippetModel::new(Arc::new(Constant(580.0))).unwrap();
        m.set_title("anything").unwrap();
        assert!(!m.field(FieldKind::Title).overflow());
    }

    #[test]
    fn empty_fields_never_overflow() {
        let mut m = SnippetModel::new(Arc::new(Constant(5000.0))).unwrap();
        m.set_title("").unwrap();
        m.set_url("").unwrap();
        m.set_description("").unwrap();
        let r = m.overflow_report();
        assert!(!r.title.overflow && !r.url.overflow && !r.description.overflow);
    }

    #[test]
    fn width_follows_every_edit() {
        let mut m = model(10.0);
        m.set_title("abc").unwrap();
        assert_eq!(m.field(FieldKind::Title).pixel_width(), 30.0);
        m.set_title("abcdef").unwrap();
        assert_eq!(m.field(FieldKind::Title).pixel_width(), 60.0);
    }

    #[test]
    fn pixel_and_character_budgets_are_independent() {
        // 50 chars rendered at 1200px
        let mut m = SnippetModel::new(Arc::new(Constant(1200.0))).unwrap();
        m.set_description("x".repeat(50)).unwrap();
        let r = m.overflow_report();
        assert!(r.description.overflow);
        assert!(!r.description_chars.overflow);
        assert_eq!(r.description_chars.count, 50);
        assert_eq!(r.description_chars.max, 157);

        // and the other way round: many narrow chars
        let mut m = model(1.0);
        m.set_description("i".repeat(200)).unwrap();
        let r = m.overflow_report();
        assert!(!r.description.overflow);
        assert!(r.description_chars.overflow);
    }

    #[test]
    fn character_budget_is_configurable() {
        let mut m = model(1.0);
        m.set_description("hello world").unwrap();
        m.set_description_max_characters(5).unwrap();
        assert!(m.description_chars().overflow);
        m.set_description_max_characters(11).unwrap();
        assert!(!m.description_chars().overflow);
    }

    #[test]
    fn zero_character_budget_is_rejected() {
        let mut m = model(1.0);
        let err = m.set_description_max_characters(0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(m.state().description_max_characters, 157);
    }

    #[test]
    fn device_mode_keeps_pixel_budgets() {
        let mut m = SnippetModel::new(Arc::new(Constant(600.0))).unwrap();
        let desktop = m.overflow_report();
        m.set_device_mode(DeviceMode::Mobile).unwrap();
        let mobile = m.overflow_report();
        assert_eq!(mobile.container_width, 384);
        assert_eq!(desktop.title, mobile.title);
        assert_eq!(mobile.title.max_pixel_width, Some(580.0));
    }

    #[test]
    fn measurement_failure_is_reported() {
        let err = SnippetModel::new(Arc::new(Broken)).unwrap_err();
        assert!(matches!(err, Error::UnknownFont(_)));
    }

    #[test]
    fn blank_fetch_leaves_state_untouched() {
        let mut m = model(1.0);
        let before = m.state().clone();
        assert!(matches!(m.begin_fetch("  "), Err(Error::Validation(_))));
        assert!(!m.is_loading());
        assert_eq!(m.state().title, before.title);
        assert_eq!(m.state().fetch, FetchState::Idle);
    }

    #[test]
    fn fetch_lifecycle_overwrites_fields() {
        let mut m = model(1.0);
        let ticket = m.begin_fetch("example.org").unwrap();
        assert!(m.is_loading());
        assert_eq!(ticket.url().as_str(), "https://example.org/");

        let res = FetchResult {
            title: "Fetched".into(),
            description: "Fetched description".into(),
            favicon: Some("https://example.org/favicon.ico".into()),
        };
        m.complete_fetch(ticket, Ok(res)).unwrap();
        assert!(!m.is_loading());
        let s = m.state();
        assert_eq!(s.title.value(), "Fetched");
        assert_eq!(s.title.pixel_width(), 7.0);
        assert_eq!(s.description.value(), "Fetched description");
        assert_eq!(s.search_query.value(), "Fetched");
        assert_eq!(s.favicon_url.as_deref(), Some("https://example.org/favicon.ico"));
        assert!(matches!(s.fetch, FetchState::Succeeded { .. }));
    }

    #[test]
    fn second_fetch_while_pending_is_rejected() {
        let mut m = model(1.0);
        let ticket = m.begin_fetch("example.com").unwrap();
        assert!(matches!(m.begin_fetch("example.org"), Err(Error::FetchInFlight)));
        m.complete_fetch(ticket, Err(Error::Fetch("down".into())))
            .unwrap_err();
        assert!(m.begin_fetch("example.org").is_ok());
    }

    #[test]
    fn failed_fetch_mutates_nothing() {
        let mut m = model(1.0);
        m.set_search_query("my query").unwrap();
        let before = m.state().clone();
        let ticket = m.begin_fetch("example.com").unwrap();
        let err = m
            .complete_fetch(ticket, Err(Error::Validation("boom".into())))
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(_)));
        let s = m.state();
        assert!(!m.is_loading());
        assert_eq!(s.title, before.title);
        assert_eq!(s.description, before.description);
        assert_eq!(s.search_query, before.search_query);
        assert_eq!(s.favicon_url, before.favicon_url);
        assert!(matches!(s.fetch, FetchState::Failed { .. }));
    }

    #[test]
    fn empty_fetched_title_keeps_search_query() {
        let mut m = model(1.0);
        m.set_search_query("kept").unwrap();
        let ticket = m.begin_fetch("example.com").unwrap();
        let res = FetchResult {
            title: String::new(),
            description: "d".into(),
            favicon: None,
        };
        m.complete_fetch(ticket, Ok(res)).unwrap();
        assert_eq!(m.state().search_query.value(), "kept");
    }

    #[test]
    fn favicon_failure_is_cleared_by_new_favicon() {
        let mut m = model(1.0);
        m.set_favicon_url(Some("https://a.test/favicon.ico".into()));
        m.mark_favicon_failed();
        assert!(m.state().favicon_failed);
        m.set_favicon_url(Some("https://b.test/favicon.ico".into()));
        assert!(!m.state().favicon_failed);
    }

    #[test]
    fn cancelled_fetch_can_be_retried() {
        let mut m = model(1.0);
        let before = m.state().clone();
        let ticket = m.begin_fetch("example.com").unwrap();
        m.cancel_fetch(ticket);
        assert!(!m.is_loading());
        assert!(matches!(
            &m.state().fetch,
            FetchState::Failed { reason, .. } if reason == FETCH_CANCELLED
        ));
        assert_eq!(m.state().title, before.title);
        assert!(m.begin_fetch("example.com").is_ok());
    }

    #[test]
    fn abandoning_a_stale_ticket_keeps_the_newer_fetch() {
        let mut m = model(1.0);
        let first = m.begin_fetch("example.com").unwrap();
        let first_id = first.id;
        m.complete_fetch(first, Err(Error::Fetch("down".into())))
            .unwrap_err();
        let _second = m.begin_fetch("example.org").unwrap();
        m.abandon_fetch(first_id);
        assert!(m.is_loading());
    }

    /// Fails for one exact text, measures everything else at 1px per char.
    struct FailsOn(&'static str);

    impl TextMeasurer for FailsOn {
        fn measure(&self, text: &str, font: &FontSpec) -> Result<f32> {
            if text == self.0 {
                Err(Error::UnknownFont(font.family.clone()))
            } else {
                Ok(text.chars().count() as f32)
            }
        }
    }

    #[test]
    fn unmeasurable_fetch_result_leaves_fields_untouched() {
        let mut m = SnippetModel::new(Arc::new(FailsOn("unmeasurable"))).unwrap();
        let before = m.state().clone();
        let ticket = m.begin_fetch("example.com").unwrap();
        let res = FetchResult {
            title: "Fine title".into(),
            description: "unmeasurable".into(),
            favicon: Some("https://example.com/favicon.ico".into()),
        };
        let err = m.complete_fetch(ticket, Ok(res)).unwrap_err();
        assert!(matches!(err, Error::UnknownFont(_)));
        let s = m.state();
        assert!(!m.is_loading());
        assert!(matches!(s.fetch, FetchState::Failed { .. }));
        assert_eq!(s.title, before.title);
        assert_eq!(s.description, before.description);
        assert_eq!(s.search_query, before.search_query);
        assert_eq!(s.favicon_url, before.favicon_url);
    }
}
