//! textflow — a rich-markup text layout engine
//!
//! Parses an annotated text string (escape codes controlling font, height,
//! width factor, stacked fractions, decorations, forced breaks, and list
//! indents) into a tree of styled runs, places one glyph per visible
//! character using font metrics, and lays the tree out against left/right
//! margins with automatic word wrap.
//!
//! # Pipeline
//!
//! ```text
//! markup string → section boundaries → run tree → layout → decorations
//! ```
//!
//! The engine is a pure in-memory transform: it owns no file format and
//! draws no pixels. Font metrics come in through the narrow
//! [`font::GlyphSource`] seam, and the laid-out [`run::Run`] tree goes out
//! to whatever rendering collaborator walks it. Malformed markup degrades to
//! a best-effort layout instead of failing; there are no fatal conditions.
//!
//! # Example
//!
//! ```
//! use textflow::font::{FontCatalog, FontFace};
//! use textflow::{RichText, RichTextParams, Vector};
//!
//! let mut fonts = FontCatalog::new();
//! fonts.register("standard", FontFace::fixed(0.9, 3.0, 6.0));
//!
//! let params = RichTextParams {
//!     insertion_point: Vector::new(0.0, 0.0),
//!     height: 9.0,
//!     width: 500.0,
//!     text: "Plain text".to_string(),
//!     style: "standard".to_string(),
//!     ..RichTextParams::default()
//! };
//! let text = RichText::new(params, &fonts, &textflow::trace::NoTrace);
//! assert!(text.used_text_width() > 0.0);
//! ```

pub mod decor;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod markup;
pub mod run;
pub mod style;
pub mod trace;

pub use error::{Error, Result};
pub use geometry::{BoundingBox, Vector};
pub use run::{GlyphPlacement, Run, RunContent, StackStyle};
pub use style::{
    BreakMode, Decoration, DrawingDirection, HAlign, LineSpacingStyle, StyleState, VAlign,
};

use crate::font::GlyphSource;
use crate::run::builder::build_tree;
use crate::style::StyleState as Style;
use crate::trace::TraceSink;

/// Whether construction and setters lay the text out immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Rebuild the layout on every change.
    #[default]
    Now,
    /// Defer until [`RichText::update`] is called.
    Deferred,
}

/// Everything that defines a rich text entity.
#[derive(Debug, Clone)]
pub struct RichTextParams {
    /// Insertion point: top-left corner of the first line.
    pub insertion_point: Vector,
    /// Nominal (initial) text height.
    pub height: f64,
    /// Reference rectangle width; the wrap margin.
    pub width: f64,
    /// Vertical alignment.
    pub valign: VAlign,
    /// Horizontal alignment.
    pub halign: HAlign,
    /// Drawing direction.
    pub direction: DrawingDirection,
    /// Line spacing style.
    pub line_spacing_style: LineSpacingStyle,
    /// Line spacing factor.
    pub line_spacing_factor: f64,
    /// The annotated text.
    pub text: String,
    /// Text style (font) name.
    pub style: String,
    /// Rotation angle in radians.
    pub angle: f64,
    /// Whether changes lay out immediately.
    pub update_mode: UpdateMode,
}

impl Default for RichTextParams {
    fn default() -> Self {
        Self {
            insertion_point: Vector::ZERO,
            height: 1.0,
            width: 100.0,
            valign: VAlign::default(),
            halign: HAlign::default(),
            direction: DrawingDirection::default(),
            line_spacing_style: LineSpacingStyle::default(),
            line_spacing_factor: 1.0,
            text: String::new(),
            style: "standard".to_string(),
            angle: 0.0,
            update_mode: UpdateMode::default(),
        }
    }
}

/// A laid-out rich text entity: the parameters plus the run tree they
/// produce.
#[derive(Debug, Clone)]
pub struct RichText {
    data: RichTextParams,
    root: Option<Run>,
    used_text_width: f64,
    used_text_height: f64,
}

impl RichText {
    /// Creates the entity, laying it out immediately unless the update mode
    /// defers.
    pub fn new(data: RichTextParams, fonts: &dyn GlyphSource, trace: &dyn TraceSink) -> RichText {
        let mut text = RichText {
            data,
            root: None,
            used_text_width: 0.0,
            used_text_height: 0.0,
        };
        if text.data.update_mode == UpdateMode::Now {
            text.update(fonts, trace);
        }
        text
    }

    /// Re-runs the whole pipeline: segmentation, tree build, layout, border
    /// aggregation, and the decoration pass.
    pub fn update(&mut self, fonts: &dyn GlyphSource, trace: &dyn TraceSink) {
        if self.data.text.is_empty() {
            self.root = None;
            self.used_text_width = 0.0;
            self.used_text_height = 0.0;
            return;
        }
        let chars: Vec<char> = self.data.text.chars().collect();
        let mut root = build_tree(self.initial_style(), &chars, fonts, trace);

        let ins = self.data.insertion_point;
        layout::layout(&mut root, ins, ins.x, ins.x + self.data.width, trace);
        self.used_text_width = root.bounds.width();
        self.used_text_height = root.bounds.height();

        if let Some(line) = decor::decorate(&mut root) {
            // The root itself is decorated: wrap it so the segment can sit
            // beside it.
            let style = root.style.clone();
            let old = std::mem::replace(&mut root, Run::empty(style, RunContent::Children(Vec::new())));
            root.content = RunContent::Children(vec![old, line]);
            root.recalc_bounds();
        }
        self.root = Some(root);
    }

    fn initial_style(&self) -> Style {
        Style {
            insertion_point: self.data.insertion_point,
            height: self.data.height,
            width: self.data.width,
            width_factor: 1.0,
            style: self.data.style.clone(),
            angle: self.data.angle,
            valign: self.data.valign,
            halign: self.data.halign,
            direction: self.data.direction,
            line_spacing_style: self.data.line_spacing_style,
            line_spacing_factor: self.data.line_spacing_factor,
            ..Style::default()
        }
    }

    /// The laid-out run tree, if the entity has text.
    pub fn root(&self) -> Option<&Run> {
        self.root.as_ref()
    }

    /// Defining parameters.
    pub fn data(&self) -> &RichTextParams {
        &self.data
    }

    /// Replaces the text, re-laying out unless deferred.
    pub fn set_text(
        &mut self,
        text: impl Into<String>,
        fonts: &dyn GlyphSource,
        trace: &dyn TraceSink,
    ) {
        self.data.text = text.into();
        if self.data.update_mode == UpdateMode::Now {
            self.update(fonts, trace);
        }
    }

    /// The annotated text.
    pub fn text(&self) -> &str {
        &self.data.text
    }

    /// Insertion point.
    pub fn insertion_point(&self) -> Vector {
        self.data.insertion_point
    }

    /// Nominal height.
    pub fn height(&self) -> f64 {
        self.data.height
    }

    /// Sets the nominal height; takes effect on the next update.
    pub fn set_height(&mut self, height: f64) {
        self.data.height = height;
    }

    /// Reference rectangle width.
    pub fn width(&self) -> f64 {
        self.data.width
    }

    /// Text style (font) name.
    pub fn style_name(&self) -> &str {
        &self.data.style
    }

    /// Sets the style name; takes effect on the next update.
    pub fn set_style_name(&mut self, style: impl Into<String>) {
        self.data.style = style.into();
    }

    /// Rotation angle in radians.
    pub fn angle(&self) -> f64 {
        self.data.angle
    }

    /// Tight width of the rendered content.
    pub fn used_text_width(&self) -> f64 {
        self.used_text_width
    }

    /// Tight height of the rendered content.
    pub fn used_text_height(&self) -> f64 {
        self.used_text_height
    }

    /// Bounding box of the laid-out content, when there is any.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.root.as_ref().map(|r| r.bounds)
    }

    /// The alignment as a 1..=9 grid value, 1 = top left through 9 = bottom
    /// right.
    pub fn alignment(&self) -> u8 {
        let row = match self.data.valign {
            VAlign::Top => 0,
            VAlign::Middle => 1,
            VAlign::Bottom => 2,
        };
        let col = match self.data.halign {
            HAlign::Left => 1,
            HAlign::Center => 2,
            HAlign::Right => 3,
        };
        row * 3 + col
    }

    /// Sets the alignment from a 1..=9 grid value.
    pub fn set_alignment(&mut self, a: u8) {
        self.data.halign = match a % 3 {
            1 => HAlign::Left,
            2 => HAlign::Center,
            _ => HAlign::Right,
        };
        self.data.valign = match (f64::from(a) / 3.0).ceil() as u8 {
            0 | 1 => VAlign::Top,
            2 => VAlign::Middle,
            _ => VAlign::Bottom,
        };
    }

    /// Moves the entity (and its laid-out tree) by `offset`.
    pub fn translate(&mut self, offset: Vector) {
        self.data.insertion_point = self.data.insertion_point + offset;
        if let Some(root) = &mut self.root {
            root.translate(offset);
        }
    }

    /// Rotates the entity about `center`.
    pub fn rotate(&mut self, center: Vector, angle: f64) {
        self.data.insertion_point = self.data.insertion_point.rotated_about(center, angle);
        self.data.angle += angle;
        if let Some(root) = &mut self.root {
            root.rotate_about(center, angle);
        }
    }

    /// Scales the entity about `center` and rebuilds the layout.
    pub fn scale(
        &mut self,
        center: Vector,
        factor: Vector,
        fonts: &dyn GlyphSource,
        trace: &dyn TraceSink,
    ) {
        self.data.insertion_point = self.data.insertion_point.scaled_about(center, factor);
        self.data.width *= factor.x;
        self.data.height *= factor.x;
        self.update(fonts, trace);
    }

    /// Mirrors the entity across the line through `p1` and `p2`, keeping the
    /// text readable, and rebuilds the layout.
    pub fn mirror(
        &mut self,
        p1: Vector,
        p2: Vector,
        fonts: &dyn GlyphSource,
        trace: &dyn TraceSink,
    ) {
        self.data.insertion_point = self.data.insertion_point.mirrored(p1, p2);
        let readable = is_angle_readable(self.data.angle);

        let axis = p2 - p1;
        let mirrored_dir = Vector::from_angle(self.data.angle).mirrored(Vector::ZERO, axis);
        let (angle, corrected) = make_angle_readable(mirrored_dir.angle(), readable);
        self.data.angle = angle;

        if corrected {
            self.data.halign = match self.data.halign {
                HAlign::Left => HAlign::Right,
                HAlign::Right => HAlign::Left,
                HAlign::Center => HAlign::Center,
            };
        } else {
            self.data.valign = match self.data.valign {
                VAlign::Top => VAlign::Bottom,
                VAlign::Bottom => VAlign::Top,
                VAlign::Middle => VAlign::Middle,
            };
        }
        self.update(fonts, trace);
    }
}

fn normalize_angle(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let a = angle % tau;
    if a < 0.0 {
        a + tau
    } else {
        a
    }
}

/// Whether text at this angle reads left to right without standing on its
/// head: within a hair of the right half-plane.
fn is_angle_readable(angle: f64) -> bool {
    let a = normalize_angle(angle);
    a < std::f64::consts::FRAC_PI_2 + 0.001 || a > 1.5 * std::f64::consts::PI - 0.001
}

/// Flips the angle by half a turn when its readability disagrees with
/// `readable`; reports whether it flipped.
fn make_angle_readable(angle: f64, readable: bool) -> (f64, bool) {
    if is_angle_readable(angle) == readable {
        (normalize_angle(angle), false)
    } else {
        (normalize_angle(angle + std::f64::consts::PI), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontCatalog, FontFace};
    use crate::trace::NoTrace;

    fn catalog() -> FontCatalog {
        let mut c = FontCatalog::new();
        c.register("standard", FontFace::fixed(0.9, 3.0, 6.0));
        c
    }

    fn entity(text: &str) -> RichText {
        let params = RichTextParams {
            insertion_point: Vector::new(0.0, 0.0),
            height: 9.0,
            width: 500.0,
            text: text.to_string(),
            ..RichTextParams::default()
        };
        RichText::new(params, &catalog(), &NoTrace)
    }

    #[test]
    fn empty_text_builds_nothing() {
        let text = entity("");
        assert!(text.root().is_none());
        assert_eq!(text.used_text_width(), 0.0);
    }

    #[test]
    fn used_width_matches_sum_of_advances() {
        let text = entity("Plain text");
        let root = text.root().expect("laid out");
        assert_eq!(root.glyphs().len(), 9);
        // "Plain" = 5*6 + 4*0.9 = 33.6, the word space 3.0, and
        // "text" = 4*6 + 3*0.9 = 26.7.
        assert!((text.used_text_width() - 63.3).abs() < 1e-6);
    }

    #[test]
    fn deferred_mode_waits_for_update() {
        let params = RichTextParams {
            text: "abc".to_string(),
            height: 9.0,
            update_mode: UpdateMode::Deferred,
            ..RichTextParams::default()
        };
        let mut text = RichText::new(params, &catalog(), &NoTrace);
        assert!(text.root().is_none());
        text.update(&catalog(), &NoTrace);
        assert!(text.root().is_some());
    }

    #[test]
    fn alignment_grid_round_trips() {
        let mut text = entity("x");
        for a in 1..=9u8 {
            text.set_alignment(a);
            assert_eq!(text.alignment(), a);
        }
    }

    #[test]
    fn translate_moves_tree_and_data() {
        let mut text = entity("ab");
        let before = text.root().unwrap().bounds;
        text.translate(Vector::new(5.0, -2.0));
        assert_eq!(text.insertion_point(), Vector::new(5.0, -2.0));
        let after = text.root().unwrap().bounds;
        assert!((after.min.x - (before.min.x + 5.0)).abs() < 1e-9);
        assert!((after.max.y - (before.max.y - 2.0)).abs() < 1e-9);
    }

    #[test]
    fn scale_rebuilds_with_new_height() {
        let mut text = entity("ab");
        let w = text.used_text_width();
        text.scale(Vector::ZERO, Vector::new(2.0, 2.0), &catalog(), &NoTrace);
        assert_eq!(text.height(), 18.0);
        assert!((text.used_text_width() - 2.0 * w).abs() < 1e-9);
    }

    #[test]
    fn mirror_across_vertical_axis_flips_halign() {
        let mut text = entity("ab");
        assert_eq!(text.data().halign, HAlign::Left);
        text.mirror(
            Vector::new(0.0, -1.0),
            Vector::new(0.0, 1.0),
            &catalog(),
            &NoTrace,
        );
        // Mirroring across a vertical axis reverses reading order; the
        // angle is corrected back to readable and the alignment flips.
        assert_eq!(text.data().halign, HAlign::Right);
    }

    #[test]
    fn readable_angles() {
        assert!(is_angle_readable(0.0));
        assert!(is_angle_readable(std::f64::consts::FRAC_PI_4));
        assert!(!is_angle_readable(std::f64::consts::PI));
        assert!(is_angle_readable(-std::f64::consts::FRAC_PI_4));
    }
}
