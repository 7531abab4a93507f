//! Glyph-metric measurement backed by `fontdue`.
//!
//! Widths are the sum of horizontal advances plus pair kerning, which is what
//! a browser's canvas `measureText` reports for a single run of text without
//! shaping. Results are stable for a given font file but can differ by a few
//! pixels from other rendering engines.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use fontdue::{Font, FontSettings};
use log::{debug, warn};

use super::{normalize_family, FontSpec, TextMeasurer};
use crate::{Error, Result};

/// Well-known locations of Arial-compatible faces, in preference order.
const SYSTEM_FONT_CANDIDATES: &[(&str, &str)] = &[
    ("arial", "/usr/share/fonts/truetype/msttcorefonts/Arial.ttf"),
    ("arial", "/Library/Fonts/Arial.ttf"),
    ("arial", "/System/Library/Fonts/Supplemental/Arial.ttf"),
    ("arial", "C:\\Windows\\Fonts\\arial.ttf"),
    (
        "liberation sans",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ),
    (
        "liberation sans",
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    ),
    (
        "liberation sans",
        "/usr/share/fonts/truetype/liberation2/LiberationSans-Regular.ttf",
    ),
    ("dejavu sans", "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
    ("dejavu sans", "/usr/share/fonts/dejavu/DejaVuSans.ttf"),
    ("dejavu sans", "/usr/share/fonts/TTF/DejaVuSans.ttf"),
];

/// A parsed font plus its advance cache.
struct Face {
    font: Font,
    // (glyph index, size bits) -> advance width
    advances: Mutex<HashMap<(u16, u32), f32>>,
}

impl Face {
    fn advance(&self, glyph: u16, px: f32) -> f32 {
        let key = (glyph, px.to_bits());
        if let Ok(cache) = self.advances.lock() {
            if let Some(w) = cache.get(&key) {
                return *w;
            }
        }
        let w = self.font.metrics_indexed(glyph, px).advance_width;
        if let Ok(mut cache) = self.advances.lock() {
            cache.insert(key, w);
        }
        w
    }

    fn width(&self, text: &str, px: f32) -> f32 {
        let mut total = 0.0f32;
        let mut prev: Option<u16> = None;
        for c in text.chars() {
            // Missing glyphs resolve to index 0 (.notdef) and still take space.
            let glyph = self.font.lookup_glyph_index(c);
            let kern = prev
                .and_then(|p| self.font.horizontal_kern_indexed(p, glyph, px))
                .unwrap_or(0.0);
            // Clamped per step so appending text can never shrink the width.
            total += (self.advance(glyph, px) + kern).max(0.0);
            prev = Some(glyph);
        }
        total
    }
}

/// [`TextMeasurer`] over a set of registered font families.
#[derive(Default)]
pub struct GlyphMeasurer {
    faces: HashMap<String, Arc<Face>>,
}

impl std::fmt::Debug for GlyphMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut families: Vec<_> = self.faces.keys().collect();
        families.sort();
        f.debug_struct("GlyphMeasurer")
            .field("families", &families)
            .finish()
    }
}

impl GlyphMeasurer {
    /// An empty measurer; register at least one family before measuring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a measurer from the first Arial-compatible font found on this
    /// machine. The face is also registered as `arial` and `sans-serif` so
    /// the default snippet fonts resolve.
    pub fn from_system() -> Result<Self> {
        let mut measurer = Self::new();
        for (family, path) in SYSTEM_FONT_CANDIDATES {
            let path = Path::new(path);
            if !path.exists() {
                continue;
            }
            match measurer.register_file(family, path) {
                Ok(()) => {
                    debug!("Using system font {} for '{}'", path.display(), family);
                    for alias in ["arial", "sans-serif"] {
                        if !measurer.has_family(alias) {
                            measurer.alias(alias, family)?;
                        }
                    }
                    return Ok(measurer);
                }
                Err(e) => warn!("Skipping system font {}: {}", path.display(), e),
            }
        }
        Err(Error::FontLoad(
            "no Arial-compatible system font found; register one explicitly".into(),
        ))
    }

    /// Paths probed by [`GlyphMeasurer::from_system`].
    pub fn system_font_candidates() -> impl Iterator<Item = PathBuf> {
        SYSTEM_FONT_CANDIDATES.iter().map(|(_, p)| PathBuf::from(p))
    }

    /// Register raw TrueType/OpenType bytes under `family`.
    pub fn register_bytes(&mut self, family: &str, bytes: Vec<u8>) -> Result<()> {
        let family = normalize_family(family);
        if family.is_empty() {
            return Err(Error::FontLoad("font family name is empty".into()));
        }
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| Error::FontLoad(format!("{}: {}", family, e)))?;
        self.faces.insert(
            family,
            Arc::new(Face {
                font,
                advances: Mutex::new(HashMap::new()),
            }),
        );
        Ok(())
    }

    /// Read a font file and register it under `family`.
    pub fn register_file(&mut self, family: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::FontLoad(format!("{}: {}", path.display(), e)))?;
        self.register_bytes(family, bytes)
    }

    /// Make `alias` resolve to the face registered as `family`.
    pub fn alias(&mut self, alias: &str, family: &str) -> Result<()> {
        let face = self
            .faces
            .get(&normalize_family(family))
            .cloned()
            .ok_or_else(|| Error::UnknownFont(family.to_string()))?;
        self.faces.insert(normalize_family(alias), face);
        Ok(())
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.faces.contains_key(&normalize_family(family))
    }

    fn resolve(&self, font: &FontSpec) -> Result<&Face> {
        font.families()
            .find_map(|f| self.faces.get(&f))
            .map(|f| f.as_ref())
            .ok_or_else(|| Error::UnknownFont(font.family.clone()))
    }
}

impl TextMeasurer for GlyphMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> Result<f32> {
        let face = self.resolve(font)?;
        if text.is_empty() || font.size_px <= 0.0 {
            return Ok(0.0);
        }
        Ok(face.width(text, font.size_px))
    }
}
