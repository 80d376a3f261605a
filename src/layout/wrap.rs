//! Word wrap
//!
//! Scans a glyph leaf backward from the right margin for a break point,
//! keeping two cursors synchronized: a glyph index and a display-text index.
//! Whitespace exists only on the text side (spaces place no glyph), so the
//! text cursor steps over whitespace runs while the glyph cursor does not;
//! the invariant that both cursors name the same character is asserted at
//! every step.
//!
//! A successful split replaces the leaf's content with two fresh leaves, the
//! second moved to the left margin one line down. The caller keeps calling
//! until no further wrap is needed; for a composite, wrapping is delegated
//! to the last child and the resulting fragments are spliced up in place.

use crate::font::REPLACEMENT_GLYPH;
use crate::geometry::Vector;
use crate::run::{Run, RunContent};
use crate::style::BreakMode;
use crate::trace::{TraceEvent, TraceSink};

/// Wraps `run` once against the margins. Returns true while further calls
/// are needed.
pub fn wordwrap(run: &mut Run, left_margin: f64, right_margin: f64, trace: &dyn TraceSink) -> bool {
    if run.has_glyphs() {
        wrap_leaf(run, left_margin, right_margin, trace)
    } else {
        wrap_composite(run, left_margin, right_margin, trace)
    }
}

fn wrap_leaf(run: &mut Run, left_margin: f64, right_margin: f64, trace: &dyn TraceSink) -> bool {
    let glyphs = run.glyphs();
    if glyphs.is_empty() {
        return false;
    }
    let tchars: Vec<char> = run.text.chars().collect();

    // Parallel cursors, starting on the last placed character.
    let mut g = glyphs.len() - 1;
    let mut t = tchars.len() - 1;
    while t > 0 && tchars[t].is_whitespace() {
        t -= 1;
    }
    assert_cursors_synced(&tchars, t, glyphs[g].ch);

    // Walk back while the glyph under the cursor overhangs the margin.
    while g > 0 && glyphs[g].extent.max.x > right_margin {
        t -= 1;
        while t > 0 && tchars[t].is_whitespace() {
            t -= 1;
        }
        g -= 1;
        assert_cursors_synced(&tchars, t, glyphs[g].ch);
    }

    if g == glyphs.len() - 1 {
        // The rightmost glyph fits; no wrap needed.
        return false;
    }

    if t + 1 < tchars.len() && tchars[t + 1].is_whitespace() {
        // The last fitting character ends a word; break just after the
        // whitespace run that follows it.
        g += 1;
        t += 1;
        while t < tchars.len() && tchars[t].is_whitespace() {
            t += 1;
        }
    } else {
        // Mid-word: back up to the nearest preceding whitespace.
        while g > 0 && !tchars[t].is_whitespace() {
            t -= 1;
            g -= 1;
        }
        if tchars[t].is_whitespace() {
            g += 1;
            t += 1;
        } else {
            // No legal break point in the whole leaf: push it down whole.
            // Once it already sits at the left margin there is nothing left
            // to gain, and the overflow is accepted.
            if run.style.insertion_point.x > left_margin {
                let drop = run.style.line_advance();
                run.translate(Vector::new(
                    left_margin - run.style.insertion_point.x,
                    -drop,
                ));
                trace.record(TraceEvent::WrapPush);
                return true;
            }
            return false;
        }
    }
    assert_cursors_synced(&tchars, t, run.glyphs()[g].ch);
    trace.record(TraceEvent::WrapSplit { at: t });

    split_leaf(run, t, g, left_margin);
    true
}

/// Splits the leaf's glyphs at index `g` and its text at index `t` into two
/// fragment leaves, moving the second to the left margin one line down.
fn split_leaf(run: &mut Run, t: usize, g: usize, left_margin: f64) {
    let glyphs = match std::mem::replace(&mut run.content, RunContent::Children(Vec::new())) {
        RunContent::Glyphs(glyphs) => glyphs,
        _ => unreachable!("split_leaf called on a non-leaf"),
    };
    let tchars: Vec<char> = run.text.chars().collect();

    let mut second_glyphs = glyphs;
    let first_glyphs = {
        let tail = second_glyphs.split_off(g);
        std::mem::replace(&mut second_glyphs, tail)
    };

    let first = fragment(run, first_glyphs, tchars[..t].iter().collect());
    let mut second = fragment(run, second_glyphs, tchars[t..].iter().collect());

    // Re-laying the tree out must reproduce this geometry, so the second
    // fragment carries its line return explicitly.
    second.style.linebreak = BreakMode::ForceNow;
    let drop = run.style.line_advance();
    second.translate(Vector::new(
        left_margin - second.style.insertion_point.x,
        -drop,
    ));

    run.text.clear();
    run.multi_line = false;
    run.content = RunContent::Children(vec![first, second]);
    run.recalc_bounds();
}

/// A fragment leaf inheriting this run's style, anchored on its first glyph.
fn fragment(run: &Run, glyphs: Vec<crate::run::GlyphPlacement>, text: String) -> Run {
    let mut style = run.style.clone();
    if let Some(first) = glyphs.first() {
        style.insertion_point.x = first.insertion.x;
    }
    style.vert_clear = 0.0;
    let mut frag = Run::empty(style, RunContent::Glyphs(glyphs));
    frag.text = text;
    frag.multi_line = true;
    frag.word_advance = run.word_advance;
    frag.recalc_bounds();
    frag
}

/// Wrapping a composite delegates to its last child; the fragments the child
/// splits into are spliced up into this node's child list, and the cycle
/// continues on the newest fragment until it settles.
fn wrap_composite(
    run: &mut Run,
    left_margin: f64,
    right_margin: f64,
    trace: &dyn TraceSink,
) -> bool {
    let children = match &mut run.content {
        RunContent::Children(children) => children,
        _ => return false,
    };
    let Some(mut last) = children.pop() else {
        return false;
    };
    while wordwrap(&mut last, left_margin, right_margin, trace) {
        if last.has_glyphs() {
            // Pushed down whole; give it another look.
            continue;
        }
        let fragments = last.take_children();
        children.extend(fragments);
        last = match children.pop() {
            Some(c) => c,
            None => return false,
        };
    }
    children.push(last);
    run.recalc_bounds();
    false
}

fn assert_cursors_synced(tchars: &[char], t: usize, glyph_ch: char) {
    debug_assert!(
        tchars[t] == glyph_ch || glyph_ch == REPLACEMENT_GLYPH,
        "wrap cursors desynced: text '{}' vs glyph '{}'",
        tchars[t],
        glyph_ch
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontCatalog, FontFace};
    use crate::run::builder::build_tree;
    use crate::style::{StyleState, STD_LINE_SPACING};
    use crate::trace::NoTrace;

    fn catalog() -> FontCatalog {
        let mut c = FontCatalog::new();
        c.register("standard", FontFace::fixed(0.9, 3.0, 6.0));
        c
    }

    fn leaf(src: &str) -> Run {
        let style = StyleState {
            insertion_point: Vector::new(0.0, 0.0),
            height: 9.0,
            width: 1000.0,
            style: "standard".to_string(),
            ..StyleState::default()
        };
        let chars: Vec<char> = src.chars().collect();
        build_tree(style, &chars, &catalog(), &NoTrace)
    }

    #[test]
    fn no_wrap_when_everything_fits() {
        let mut run = leaf("ab cd");
        assert!(!wordwrap(&mut run, 0.0, 500.0, &NoTrace));
        assert!(run.has_glyphs());
    }

    #[test]
    fn split_preserves_text_exactly() {
        let mut run = leaf("aaaa bb");
        assert!(wordwrap(&mut run, 0.0, 34.0, &NoTrace));
        let children = run.children();
        assert_eq!(children.len(), 2);
        let rejoined = format!("{}{}", children[0].text, children[1].text);
        assert_eq!(rejoined, "aaaa bb");
    }

    #[test]
    fn split_preserves_glyph_sequence() {
        let mut run = leaf("aaaa bb");
        let before: Vec<char> = run.glyphs().iter().map(|g| g.ch).collect();
        wordwrap(&mut run, 0.0, 34.0, &NoTrace);
        let after: Vec<char> = run
            .children()
            .iter()
            .flat_map(|c| c.glyphs().iter().map(|g| g.ch))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn second_fragment_lands_on_left_margin_one_line_down() {
        let mut run = leaf("aaaa bb");
        wordwrap(&mut run, 0.0, 34.0, &NoTrace);
        let second = &run.children()[1];
        assert!((second.style.insertion_point.x - 0.0).abs() < 1e-9);
        let line = 9.0 * STD_LINE_SPACING;
        assert!((second.style.insertion_point.y - (-line)).abs() < 1e-9);
        assert!(second.multi_line);
    }

    #[test]
    fn break_lands_after_trailing_whitespace_run() {
        let mut run = leaf("aaaa  bb");
        wordwrap(&mut run, 0.0, 34.0, &NoTrace);
        let children = run.children();
        assert_eq!(children[0].text, "aaaa  ");
        assert_eq!(children[1].text, "bb");
    }

    #[test]
    fn mid_word_overflow_backs_up_to_previous_space() {
        // The overflow begins inside "ccc"; the break point is before it.
        let mut run = leaf("aa ccc");
        wordwrap(&mut run, 0.0, 24.0, &NoTrace);
        let children = run.children();
        assert_eq!(children[0].text, "aa ");
        assert_eq!(children[1].text, "ccc");
    }

    #[test]
    fn unbroken_text_is_pushed_not_split() {
        let mut run = leaf("aaaaaaaa");
        // Starts right of the margin: one push down, then acceptance.
        run.translate(Vector::new(10.0, 0.0));
        assert!(wordwrap(&mut run, 0.0, 30.0, &NoTrace));
        assert!(run.has_glyphs());
        assert!((run.style.insertion_point.x - 0.0).abs() < 1e-9);
        assert!(!wordwrap(&mut run, 0.0, 30.0, &NoTrace));
    }

    #[test]
    fn empty_leaf_never_wraps() {
        let mut run = leaf("");
        assert!(!wordwrap(&mut run, 0.0, 10.0, &NoTrace));
    }
}
