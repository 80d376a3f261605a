//! Font-metrics collaborator
//!
//! The layout engine never parses font files; it consumes per-glyph metrics
//! through the narrow [`GlyphSource`] seam. A [`FontCatalog`] is the default
//! implementation, a name-keyed registry of [`FontFace`] metric tables.
//!
//! # Font units
//!
//! Glyph advance widths and the letter/word spacing values are expressed in
//! font units, which are scaled up by a factor of 9 relative to the text's
//! nominal height (a convention of the underlying stroke-font sources). A run
//! of height `h` therefore scales every font-unit value by `h / 9.0`.

use crate::error::{FontError, Result};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Substituted for characters the active font has no glyph for.
pub const REPLACEMENT_GLYPH: char = '\u{fffd}';

/// Per-font glyph metrics, in font units.
///
/// Implementations are expected to be cheap, read-only queries; the engine
/// calls them once per placed character.
pub trait GlyphMetrics {
    /// Horizontal gap inserted between consecutive glyphs.
    fn letter_spacing(&self) -> f64;

    /// Advance used for a space character.
    fn word_spacing(&self) -> f64;

    /// Whether the font can draw `c` at all.
    fn has_glyph(&self, c: char) -> bool;

    /// Advance width of `c`, in font units.
    fn advance_width(&self, c: char) -> f64;
}

/// Resolves a text style name to a font.
///
/// Returning `None` makes the engine skip glyph construction for the
/// requesting leaf; layout of sibling runs continues unaffected.
pub trait GlyphSource {
    /// Looks up the font registered under `style`.
    fn request_font(&self, style: &str) -> Option<Arc<FontFace>>;
}

/// A loaded font: metric defaults plus a per-character advance table.
#[derive(Debug, Clone)]
pub struct FontFace {
    letter_spacing: f64,
    word_spacing: f64,
    advances: FxHashMap<char, f64>,
    /// Advance used for characters present in the font but absent from the
    /// table. `None` means such characters have no glyph.
    fallback_advance: Option<f64>,
}

impl FontFace {
    /// Creates a face with an explicit advance table.
    ///
    /// Characters missing from `advances` are reported as having no glyph.
    pub fn new(letter_spacing: f64, word_spacing: f64, advances: FxHashMap<char, f64>) -> Self {
        Self {
            letter_spacing,
            word_spacing,
            advances,
            fallback_advance: None,
        }
    }

    /// Creates a face where every character has the same advance width.
    ///
    /// Deterministic fixed-advance metrics; the unit-test font.
    pub fn fixed(letter_spacing: f64, word_spacing: f64, advance: f64) -> Self {
        Self {
            letter_spacing,
            word_spacing,
            advances: FxHashMap::default(),
            fallback_advance: Some(advance),
        }
    }

    /// Marks characters absent from the advance table as drawable with the
    /// given advance, instead of glyph-less.
    pub fn with_fallback_advance(mut self, advance: f64) -> Self {
        self.fallback_advance = Some(advance);
        self
    }
}

impl GlyphMetrics for FontFace {
    fn letter_spacing(&self) -> f64 {
        self.letter_spacing
    }

    fn word_spacing(&self) -> f64 {
        self.word_spacing
    }

    fn has_glyph(&self, c: char) -> bool {
        self.advances.contains_key(&c) || self.fallback_advance.is_some()
    }

    fn advance_width(&self, c: char) -> f64 {
        self.advances
            .get(&c)
            .copied()
            .or(self.fallback_advance)
            .unwrap_or(0.0)
    }
}

/// Name-keyed font registry.
///
/// # Examples
///
/// ```
/// use textflow::font::{FontCatalog, FontFace, GlyphSource};
///
/// let mut catalog = FontCatalog::new();
/// catalog.register("standard", FontFace::fixed(0.6, 3.0, 6.0));
/// assert!(catalog.request_font("standard").is_some());
/// assert!(catalog.request_font("missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    fonts: FxHashMap<String, Arc<FontFace>>,
}

impl FontCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `face` under `style`, replacing any previous entry.
    pub fn register(&mut self, style: impl Into<String>, face: FontFace) {
        self.fonts.insert(style.into(), Arc::new(face));
    }

    /// Number of registered fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether the catalog has no fonts.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Like [`GlyphSource::request_font`] but failing loudly, for callers
    /// that want to validate a style name up front.
    pub fn require_font(&self, style: &str) -> Result<Arc<FontFace>> {
        self.request_font(style).ok_or_else(|| {
            FontError::UnknownStyle {
                style: style.to_string(),
            }
            .into()
        })
    }
}

impl GlyphSource for FontCatalog {
    fn request_font(&self, style: &str) -> Option<Arc<FontFace>> {
        self.fonts.get(style).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_face_reports_every_glyph() {
        let face = FontFace::fixed(0.5, 3.0, 6.0);
        assert!(face.has_glyph('a'));
        assert!(face.has_glyph('\u{4e2d}'));
        assert_eq!(face.advance_width('a'), 6.0);
    }

    #[test]
    fn table_face_rejects_unknown_chars() {
        let mut advances = FxHashMap::default();
        advances.insert('a', 5.0);
        let face = FontFace::new(0.5, 3.0, advances);
        assert!(face.has_glyph('a'));
        assert!(!face.has_glyph('b'));
    }

    #[test]
    fn catalog_lookup_and_require() {
        let mut catalog = FontCatalog::new();
        catalog.register("iso", FontFace::fixed(0.6, 3.2, 6.0));
        assert!(catalog.request_font("iso").is_some());
        assert!(catalog.require_font("nope").is_err());
    }
}
