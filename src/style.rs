//! Formatting state
//!
//! A [`StyleState`] is the mutable snapshot of every formatting property a
//! code tag can influence. The tree builder threads one forward through the
//! source: applying a tag mutates the state in place, and each child run
//! inherits a copy at the moment of its creation, so later tags never act
//! retroactively on earlier siblings. The one shared piece is the tab group,
//! an `Arc` that stays aliased across siblings until a later `\p` tag
//! rebinds it.

use crate::geometry::Vector;
use crate::markup::{TabGroup, TabStopKind, TagKind};
use crate::markup::tag::CodeTag;
use crate::trace::{TraceEvent, TraceSink};
use std::sync::Arc;

/// Baseline-to-baseline distance in multiples of the text height.
///
/// The DXF reference calls 5/3 the standard, subject to the line spacing
/// factor.
pub const STD_LINE_SPACING: f64 = 1.666_667;

/// Height multiplier for superscript/subscript parts of a stacked assembly.
pub const SUPER_SUB_FACTOR: f64 = 0.58;

/// Upward shift of a stack's upper part, in multiples of the base height.
pub const RAISE_SUPERSCRIPT: f64 = 0.33;

/// Downward shift of a stack's lower part, in multiples of the base height.
pub const DROP_SUBSCRIPT: f64 = 0.33;

/// Drop of an underline below a run's bottom, in multiples of the height.
/// Matches the underscore glyph position of the stroke fonts.
pub const DROP_UNDERLINE: f64 = 0.33;

/// Font-unit scale: glyph source data is scaled up by 9 relative to the
/// nominal text height.
pub const FONT_UNIT_SCALE: f64 = 9.0;

/// Text decoration applied by `\L`, `\O`, `\K` spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decoration {
    /// No decoration
    #[default]
    None,
    /// `\L…\l`
    Underline,
    /// `\O…\o`
    Overline,
    /// `\K…\k`
    Strikethrough,
}

/// Line-break behavior of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakMode {
    /// Wrap at the right margin as needed
    #[default]
    AtNeed,
    /// Never split this run; move it whole to the next line instead
    Never,
    /// Return to the left margin before laying this run out
    ForceNow,
}

/// Vertical alignment of the text body within its reference rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    /// Top
    #[default]
    Top,
    /// Middle
    Middle,
    /// Bottom
    Bottom,
}

/// Horizontal alignment of the text body within its reference rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    /// Left
    #[default]
    Left,
    /// Centered
    Center,
    /// Right
    Right,
}

/// Drawing direction of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingDirection {
    /// Left to right
    #[default]
    LeftToRight,
    /// Top to bottom
    TopToBottom,
    /// Inherited from the associated text style
    ByStyle,
}

/// Line spacing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSpacingStyle {
    /// Taller characters may stretch the line
    #[default]
    AtLeast,
    /// Taller characters may not stretch the line
    Exact,
}

/// Snapshot of the formatting state a run is built under.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleState {
    /// Insertion point: top-left corner of the run's first line.
    pub insertion_point: Vector,
    /// Nominal text height.
    pub height: f64,
    /// Reference rectangle width (right margin distance).
    pub width: f64,
    /// Width factor relative to height, set by `\W`.
    pub width_factor: f64,
    /// Text style (font) name.
    pub style: String,
    /// Rotation angle in radians.
    pub angle: f64,
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
    /// Active decoration span.
    pub decoration: Decoration,
    /// Line-break behavior.
    pub linebreak: BreakMode,
    /// Tab/list settings shared with subsequent siblings until rebound.
    pub tabs: Option<Arc<TabGroup>>,
    /// Whether the display text is the entry of a list item.
    pub list_text: bool,
    /// Extra vertical clearance accrued by repeated `\P` codes.
    pub vert_clear: f64,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            insertion_point: Vector::ZERO,
            height: 1.0,
            width: 100.0,
            width_factor: 1.0,
            style: String::new(),
            angle: 0.0,
            valign: VAlign::default(),
            halign: HAlign::default(),
            direction: DrawingDirection::default(),
            line_spacing_style: LineSpacingStyle::default(),
            line_spacing_factor: 1.0,
            decoration: Decoration::None,
            linebreak: BreakMode::AtNeed,
            tabs: None,
            list_text: false,
            vert_clear: 0.0,
        }
    }
}

impl StyleState {
    /// Folds one code tag into this state.
    ///
    /// Structural tags (stack, braces, decoration closes) are handled by the
    /// tree builder and are no-ops here.
    pub fn apply_tag(&mut self, tag: &CodeTag, trace: &dyn TraceSink) {
        match &tag.kind {
            TagKind::Font(name) => {
                self.style = name.clone();
                trace.record(TraceEvent::TagApplied { code: 'F' });
            }
            TagKind::Height(h) => {
                self.height = *h;
                trace.record(TraceEvent::TagApplied { code: 'H' });
            }
            TagKind::WidthFactor(w) => {
                self.width_factor = *w;
                trace.record(TraceEvent::TagApplied { code: 'W' });
            }
            TagKind::Paragraph(body) => {
                let group = TabGroup::parse(body, trace);
                // An empty settings body clears the binding.
                self.tabs = if group.is_empty() {
                    None
                } else {
                    Some(Arc::new(group))
                };
                trace.record(TraceEvent::TagApplied { code: 'p' });
            }
            TagKind::ForceBreak => {
                if self.linebreak == BreakMode::ForceNow {
                    self.vert_clear += self.height * STD_LINE_SPACING * self.line_spacing_factor;
                } else {
                    self.linebreak = BreakMode::ForceNow;
                    self.vert_clear = 0.0;
                }
                trace.record(TraceEvent::TagApplied { code: 'P' });
            }
            TagKind::DecorOpen(decor) => {
                self.decoration = *decor;
                trace.record(TraceEvent::TagApplied { code: 'L' });
            }
            TagKind::Indent => {
                if self.has_list_format() {
                    self.list_text = true;
                }
                trace.record(TraceEvent::TagApplied { code: 'I' });
            }
            // Recognized but currently without effect on layout.
            TagKind::Alignment(_)
            | TagKind::Color(_)
            | TagKind::Oblique(_)
            | TagKind::Tracking(_)
            | TagKind::DimFlag(_) => {}
            // Handled positionally by the tree builder.
            TagKind::Stack
            | TagKind::DecorClose(_)
            | TagKind::Brace
            | TagKind::BraceClose
            | TagKind::Text { .. } => {}
            TagKind::Unknown(code) => {
                trace.record(TraceEvent::UnknownCode { code: *code });
            }
        }
    }

    /// Whether the bound tab group is a list formatter.
    pub fn has_list_format(&self) -> bool {
        self.tabs.as_ref().is_some_and(|t| t.is_list_format())
    }

    /// Whether this run should be laid out as list item text.
    pub fn is_list_text(&self) -> bool {
        self.has_list_format() && self.list_text
    }

    /// Left indent of the item body from the bound tab group.
    pub fn item_left_indent(&self) -> f64 {
        self.tabs
            .as_ref()
            .and_then(|t| t.find(TabStopKind::LeftIndent))
            .unwrap_or(0.0)
    }

    /// Baseline-to-baseline advance for this state.
    pub fn line_advance(&self) -> f64 {
        self.height * STD_LINE_SPACING * self.line_spacing_factor
    }

    /// Clears the one-use flags after they have shaped a run: the forced
    /// break, the list-item marker, and any accrued clearance.
    pub fn reset_one_use(&mut self) {
        self.linebreak = BreakMode::AtNeed;
        self.list_text = false;
        self.vert_clear = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoTrace;

    fn apply(state: &mut StyleState, src: &str) {
        let chars: Vec<char> = src.chars().collect();
        let mut cursor = 0;
        while cursor < chars.len() {
            let tag = CodeTag::scan(&chars, &mut cursor);
            state.apply_tag(&tag, &NoTrace);
        }
    }

    #[test]
    fn height_and_width_factor() {
        let mut state = StyleState::default();
        apply(&mut state, "\\H2.5;\\W0.8;");
        assert_eq!(state.height, 2.5);
        assert_eq!(state.width_factor, 0.8);
    }

    #[test]
    fn font_tag_sets_style_name() {
        let mut state = StyleState::default();
        apply(&mut state, "\\Fiso|b0;");
        assert_eq!(state.style, "iso");
    }

    #[test]
    fn repeated_force_break_accrues_clearance() {
        let mut state = StyleState::default();
        apply(&mut state, "\\P");
        assert_eq!(state.linebreak, BreakMode::ForceNow);
        assert_eq!(state.vert_clear, 0.0);

        apply(&mut state, "\\P\\P");
        assert_eq!(state.linebreak, BreakMode::ForceNow);
        let one_line = state.height * STD_LINE_SPACING * state.line_spacing_factor;
        assert!((state.vert_clear - 2.0 * one_line).abs() < 1e-9);
    }

    #[test]
    fn decoration_open_applies() {
        let mut state = StyleState::default();
        let chars: Vec<char> = "\\LUnder\\l".chars().collect();
        let mut cursor = 0;
        let tag = CodeTag::scan(&chars, &mut cursor);
        state.apply_tag(&tag, &NoTrace);
        assert_eq!(state.decoration, Decoration::Underline);
    }

    #[test]
    fn indent_without_list_format_is_inert() {
        let mut state = StyleState::default();
        apply(&mut state, "^I");
        assert!(!state.list_text);
    }

    #[test]
    fn indent_with_list_format_marks_list_text() {
        let mut state = StyleState::default();
        apply(&mut state, "\\pi2,l4;^I");
        assert!(state.is_list_text());
        assert_eq!(state.item_left_indent(), 4.0);
    }

    #[test]
    fn paragraph_tag_rebinds_and_clears() {
        let mut state = StyleState::default();
        apply(&mut state, "\\pi2,l4;");
        let first = state.tabs.clone().expect("tabs bound");

        // Inherit, then rebind on the copy only.
        let mut child = state.clone();
        apply(&mut child, "\\pt8;");
        assert!(Arc::ptr_eq(&first, state.tabs.as_ref().unwrap()));
        assert!(!Arc::ptr_eq(&first, child.tabs.as_ref().unwrap()));

        // Empty body clears.
        apply(&mut child, "\\p;");
        assert!(child.tabs.is_none());
    }
}
