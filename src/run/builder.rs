//! Tree builder
//!
//! Turns a markup string (as a char buffer) plus an inherited style state
//! into a run tree. Input with at most one display section becomes a single
//! glyph leaf; anything richer becomes a composite with one child per
//! section pair, one stacked assembly per stacking tag, and recursive calls
//! for span-tag bodies. The style state is threaded forward so each child
//! inherits every setting applied before it.

use crate::font::{GlyphMetrics, GlyphSource, REPLACEMENT_GLYPH};
use crate::geometry::{BoundingBox, Vector};
use crate::markup::tag::CodeTag;
use crate::markup::{section_of, section_starts, stack_found_at, TagKind};
use crate::run::{stack, GlyphPlacement, Run, RunContent};
use crate::style::{StyleState, FONT_UNIT_SCALE};
use crate::trace::{TraceEvent, TraceSink};

/// Builds the run tree for `chars` under the inherited `style`.
///
/// Never fails: malformed markup degrades to a best-effort tree, a missing
/// font yields a glyph-less leaf, and unknown characters fall back to the
/// replacement glyph.
pub fn build_tree(
    style: StyleState,
    chars: &[char],
    fonts: &dyn GlyphSource,
    trace: &dyn TraceSink,
) -> Run {
    let starts = section_starts(chars);
    trace.record(TraceEvent::Sections { starts: &starts });

    if starts.len() <= 4 && !stack_found_at(chars, 0, &starts) {
        build_leaf(style, chars, &starts, fonts, trace)
    } else {
        build_composite(style, chars, &starts, fonts, trace)
    }
}

/// At most one display section: apply the leading tags, then place one glyph
/// per non-whitespace character.
fn build_leaf(
    mut style: StyleState,
    chars: &[char],
    starts: &[usize],
    fonts: &dyn GlyphSource,
    trace: &dyn TraceSink,
) -> Run {
    let len = chars.len();
    let display_start = starts.get(1).copied().unwrap_or(len);
    let display_end = starts.get(2).copied().unwrap_or(len);

    let mut cursor = 0;
    while cursor < display_start {
        let tag = CodeTag::scan(chars, &mut cursor);
        if tag.kind == TagKind::Brace {
            // Step inside the group so the settings it contains still apply.
            cursor = tag.start + 1;
        } else {
            style.apply_tag(&tag, trace);
        }
    }

    let display = substitute_literals(&chars[display_start.min(len)..display_end.min(len)]);
    let mut run = Run::empty(style, RunContent::Glyphs(Vec::new()));
    run.text = display.iter().collect();
    place_glyphs(&mut run, &display, fonts, trace);
    run.recalc_bounds();
    run
}

/// Replaces the escaped literals `\\`, `\{`, `\}`, `\~` in a display slice
/// with the characters they stand for (`\~` becomes a no-break space).
fn substitute_literals(display: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(display.len());
    let mut i = 0;
    while i < display.len() {
        if display[i] == '\\' && i + 1 < display.len() {
            match display[i + 1] {
                '\\' | '{' | '}' => {
                    out.push(display[i + 1]);
                    i += 2;
                    continue;
                }
                '~' => {
                    out.push('\u{a0}');
                    i += 2;
                    continue;
                }
                _ => {}
            }
        }
        out.push(display[i]);
        i += 1;
    }
    out
}

/// Walks the display text, advancing an insertion cursor and emitting one
/// placement per non-whitespace character. Whitespace contributes only a
/// spacing advance: a word space for ` `/no-break space, and a letter-space
/// retraction when leaving a non-space character run.
fn place_glyphs(run: &mut Run, display: &[char], fonts: &dyn GlyphSource, trace: &dyn TraceSink) {
    if display.is_empty() {
        return;
    }
    let style = &run.style;
    let font = match fonts.request_font(&style.style) {
        Some(f) => f,
        None => {
            trace.record(TraceEvent::FontMissing {
                style: &style.style,
            });
            return; // leaf stays glyph-less; sibling layout is unaffected
        }
    };

    let net_height_fac = style.height / FONT_UNIT_SCALE;
    let net_width_fac = net_height_fac * style.width_factor;
    let net_space_width = net_width_fac * font.word_spacing();
    let net_letter_space = net_width_fac * font.letter_spacing();
    run.word_advance = net_space_width;

    let baseline_y = style.insertion_point.y - style.height;
    let height = style.height;
    let mut x = style.insertion_point.x;
    let mut glyphs = Vec::with_capacity(display.len());

    for (i, &c) in display.iter().enumerate() {
        if c.is_whitespace() {
            if i > 0 && !display[i - 1].is_whitespace() {
                x -= net_letter_space;
            }
            if c == ' ' || c == '\u{a0}' {
                x += net_space_width;
            }
        } else {
            let ch = if font.has_glyph(c) {
                c
            } else {
                trace.record(TraceEvent::UnknownGlyph { ch: c });
                REPLACEMENT_GLYPH
            };
            let advance = font.advance_width(ch) * net_width_fac;
            glyphs.push(GlyphPlacement {
                ch,
                insertion: Vector::new(x, baseline_y),
                scale: Vector::new(net_width_fac, net_height_fac),
                rotation: 0.0,
                extent: BoundingBox::new(
                    Vector::new(x, baseline_y),
                    Vector::new(x + advance, baseline_y + height),
                ),
            });
            x += advance + net_letter_space;
        }
    }
    run.content = RunContent::Glyphs(glyphs);
}

/// More than one display section: one child per section pair, one stacked
/// assembly per reachable stacking tag.
fn build_composite(
    style: StyleState,
    chars: &[char],
    starts: &[usize],
    fonts: &dyn GlyphSource,
    trace: &dyn TraceSink,
) -> Run {
    let len = chars.len();
    let mut parent = Run::empty(style.clone(), RunContent::Children(Vec::new()));
    let mut style_now = style;
    let mut children: Vec<Run> = Vec::new();
    let mut nsecn = 0usize;

    while nsecn + 1 < starts.len() {
        let mut nchr = starts[nsecn];
        if nchr >= len {
            break;
        }

        let child = if stack_found_at(chars, nsecn, starts) {
            let mut built = None;
            let mut next_secn = None;
            while nchr < len {
                let tag = CodeTag::scan(chars, &mut nchr);
                if tag.is_stack() {
                    built = stack::build_stack(style_now.clone(), chars, &tag, fonts, trace);
                    // Resume at the section just past the stack's terminator.
                    let resume = if tag.end < len && chars[tag.end] == ';' {
                        tag.end + 1
                    } else {
                        tag.end
                    };
                    next_secn = Some(section_of(resume.min(len), starts));
                    break;
                }
                match tag.kind {
                    TagKind::DecorOpen(_) => {
                        style_now.apply_tag(&tag, trace);
                        nchr = tag.start + 2;
                    }
                    TagKind::Brace => nchr = tag.start + 1,
                    _ => style_now.apply_tag(&tag, trace),
                }
            }
            nsecn = next_secn.unwrap_or(nsecn + 1);
            built
        } else if nsecn % 2 == 0 {
            // A code section followed by its display section.
            let sec_end = starts[nsecn + 1];
            let mut last_span = None;
            while nchr < sec_end {
                let tag = CodeTag::scan(chars, &mut nchr);
                if tag.is_span() {
                    // Scope runs past the section; the child re-applies it.
                    last_span = Some(tag);
                    break;
                }
                style_now.apply_tag(&tag, trace);
            }
            match last_span {
                Some(tag) => {
                    let span_end = tag.end.min(len);
                    nsecn = section_of(span_end, starts);
                    let slice = &chars[tag.start..span_end];
                    Some(build_tree(style_now.clone(), slice, fonts, trace))
                }
                None => {
                    let d0 = starts[nsecn + 1];
                    let d1 = starts.get(nsecn + 2).copied().unwrap_or(len);
                    nsecn += 2;
                    if d0 < d1 {
                        Some(build_tree(style_now.clone(), &chars[d0..d1], fonts, trace))
                    } else {
                        None
                    }
                }
            }
        } else {
            // A bare display section, as left behind after a stack.
            let d0 = starts[nsecn];
            let d1 = starts[nsecn + 1];
            nsecn += 1;
            if d0 < d1 {
                Some(build_tree(style_now.clone(), &chars[d0..d1], fonts, trace))
            } else {
                None
            }
        };

        if let Some(child) = child {
            // Chain the next sibling's insertion from this child's right
            // extent; break and list flags are consumed by the child.
            style_now.insertion_point.x = child.bounds.max.x;
            style_now.reset_one_use();
            children.push(child);
        }
    }

    parent.content = RunContent::Children(children);
    parent.recalc_bounds();
    parent
}
