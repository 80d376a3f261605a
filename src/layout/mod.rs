//! Layout engine
//!
//! A recursive, depth-first positioning pass. Each node is translated so its
//! anchor meets the target cursor, given a fresh line if a forced break or a
//! pending list indent demands one, and then either accepted, pushed down,
//! or word-wrapped until it fits between the margins. Composites thread the
//! running cursor through their children; stacked assemblies move as a unit.
//!
//! The pass is idempotent: running it again with the same margins reproduces
//! the same geometry, because wrap fragments carry a forced-break mark that
//! re-derives their line position from the same cursor.

pub mod wrap;

use crate::geometry::Vector;
use crate::run::{Run, RunContent};
use crate::style::BreakMode;
use crate::trace::{TraceEvent, TraceSink};
use self::wrap::wordwrap;

/// Positions `run` (and its subtree) at `target`, returning the cursor for
/// the next sibling.
///
/// `left_margin`/`right_margin` bound every line; the returned cursor is the
/// top-right extent of whatever this run ended up occupying.
pub fn layout(
    run: &mut Run,
    target: Vector,
    left_margin: f64,
    right_margin: f64,
    trace: &dyn TraceSink,
) -> Vector {
    if matches!(run.content, RunContent::Decoration(_)) {
        return target;
    }

    run.translate(target - run.style.insertion_point);
    let mut cursor = run.style.insertion_point;

    if wants_line_return(run, left_margin) {
        let drop = run.style.line_advance() + run.style.vert_clear;
        run.translate(Vector::new(left_margin - cursor.x, -drop));
        trace.record(TraceEvent::LineReturn {
            to: run.style.insertion_point,
        });
        cursor = run.bounds.max;
    }

    if run.has_glyphs() {
        cursor = layout_leaf(run, cursor, left_margin, right_margin, trace);
    } else if run.stack.is_some() {
        // A stacked assembly keeps its internal geometry; it is accepted or
        // pushed down as one block.
        if run.bounds.max.x > right_margin && run.style.insertion_point.x > left_margin {
            let drop = run.style.line_advance();
            run.translate(Vector::new(
                left_margin - run.style.insertion_point.x,
                -drop,
            ));
            trace.record(TraceEvent::LineReturn {
                to: run.style.insertion_point,
            });
        }
        cursor = Vector::new(run.bounds.max.x, run.style.insertion_point.y);
    } else if let RunContent::Children(children) = &mut run.content {
        let mut thread = run.style.insertion_point;
        for child in children.iter_mut() {
            if matches!(child.content, RunContent::Decoration(_)) {
                continue;
            }
            thread = layout(child, thread, left_margin, right_margin, trace);
        }
        cursor = thread;
    }

    run.recalc_bounds();
    run.used_width = run.bounds.width();
    run.used_height = run.bounds.height();
    cursor
}

/// A line return happens only when the node sits right of the left margin
/// and either demands one (force-now) or carries a pending list indent
/// without being the list item's own text.
fn wants_line_return(run: &Run, left_margin: f64) -> bool {
    run.style.insertion_point.x > left_margin
        && (run.style.linebreak == BreakMode::ForceNow
            || (run.style.has_list_format() && !run.style.is_list_text()))
}

fn layout_leaf(
    run: &mut Run,
    mut cursor: Vector,
    left_margin: f64,
    right_margin: f64,
    trace: &dyn TraceSink,
) -> Vector {
    if run.style.is_list_text() {
        // List item text hangs at the item's left indent.
        let local_left = left_margin + run.style.item_left_indent();
        run.translate(Vector::new(
            local_left - run.style.insertion_point.x,
            0.0,
        ));
        if run.bounds.max.x <= right_margin {
            cursor.x = run.bounds.max.x;
            cursor.y = run.style.insertion_point.y;
        } else {
            while wordwrap(run, local_left, right_margin, trace) {}
            cursor = last_extent(run);
        }
    } else if run.bounds.max.x <= right_margin {
        cursor = Vector::new(run.bounds.max.x, run.style.insertion_point.y);
    } else if run.style.linebreak == BreakMode::Never {
        // Not splittable: a fresh line is the only help there is.
        if run.style.insertion_point.x > left_margin {
            let drop = run.style.line_advance();
            run.translate(Vector::new(
                left_margin - run.style.insertion_point.x,
                -drop,
            ));
            trace.record(TraceEvent::LineReturn {
                to: run.style.insertion_point,
            });
        }
        cursor = Vector::new(run.bounds.max.x, run.style.insertion_point.y);
    } else {
        while wordwrap(run, left_margin, right_margin, trace) {}
        cursor = last_extent(run);
    }
    cursor
}

/// Top-right extent of the last laid-out fragment: the last child if the
/// run wrapped into a composite, the run itself otherwise.
fn last_extent(run: &Run) -> Vector {
    match &run.content {
        RunContent::Children(children) => children
            .last()
            .map(|c| Vector::new(c.bounds.max.x, c.style.insertion_point.y))
            .unwrap_or(run.bounds.max),
        _ => Vector::new(run.bounds.max.x, run.style.insertion_point.y),
    }
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

    fn styled(width: f64) -> StyleState {
        StyleState {
            insertion_point: Vector::new(0.0, 0.0),
            height: 9.0,
            width,
            style: "standard".to_string(),
            ..StyleState::default()
        }
    }

    fn build_and_layout(src: &str, width: f64) -> Run {
        let chars: Vec<char> = src.chars().collect();
        let mut run = build_tree(styled(width), &chars, &catalog(), &NoTrace);
        layout(&mut run, Vector::ZERO, 0.0, width, &NoTrace);
        run
    }

    #[test]
    fn fitting_text_stays_on_one_line() {
        let run = build_and_layout("ab cd", 500.0);
        assert!(run.has_glyphs());
        assert_eq!(run.style.insertion_point, Vector::ZERO);
        let cursor_y = run.glyphs()[0].insertion.y;
        assert!((cursor_y - (-9.0)).abs() < 1e-9);
    }

    #[test]
    fn forced_break_drops_a_line() {
        let run = build_and_layout("aa\\Pbb", 500.0);
        let children = run.children();
        assert_eq!(children.len(), 2);
        let line = 9.0 * STD_LINE_SPACING;
        assert!((children[1].style.insertion_point.x - 0.0).abs() < 1e-9);
        assert!((children[1].style.insertion_point.y - (-line)).abs() < 1e-9);
    }

    #[test]
    fn double_forced_break_adds_clearance() {
        let run = build_and_layout("aa\\P\\Pbb", 500.0);
        let children = run.children();
        let line = 9.0 * STD_LINE_SPACING;
        assert!((children[1].style.insertion_point.y - (-2.0 * line)).abs() < 1e-9);
    }

    #[test]
    fn wrap_splits_at_word_boundary() {
        // "aaaa bb": the second word overflows a margin that holds ~5 glyphs.
        let run = build_and_layout("aaaa bb", 34.0);
        assert!(!run.has_glyphs());
        let children = run.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].text, "aaaa ");
        assert_eq!(children[1].text, "bb");
        assert!((children[1].style.insertion_point.x - 0.0).abs() < 1e-9);
        let line = 9.0 * STD_LINE_SPACING;
        assert!((children[1].style.insertion_point.y - (-line)).abs() < 1e-9);
    }

    #[test]
    fn wrap_round_trip_preserves_text_and_glyphs() {
        let src = "one two three four five";
        let flat = build_and_layout(src, 500.0);
        let glyph_count = flat.glyphs().len();

        let wrapped = build_and_layout(src, 40.0);
        let children = wrapped.children();
        assert!(children.len() >= 2);
        let rejoined: String = children.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(rejoined, src);
        let total: usize = children.iter().map(|c| c.glyphs().len()).sum();
        assert_eq!(total, glyph_count);
    }

    #[test]
    fn layout_is_idempotent() {
        fn snapshot(run: &Run) -> Vec<(Vector, Vector, Vector)> {
            let mut out = vec![(run.style.insertion_point, run.bounds.min, run.bounds.max)];
            for child in run.children() {
                out.extend(snapshot(child));
            }
            out
        }

        let chars: Vec<char> = "one two three four five".chars().collect();
        let mut run = build_tree(styled(40.0), &chars, &catalog(), &NoTrace);
        layout(&mut run, Vector::ZERO, 0.0, 40.0, &NoTrace);
        let first = snapshot(&run);
        layout(&mut run, Vector::ZERO, 0.0, 40.0, &NoTrace);
        let second = snapshot(&run);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a.0.x - b.0.x).abs() < 1e-9 && (a.0.y - b.0.y).abs() < 1e-9);
            assert!((a.1.x - b.1.x).abs() < 1e-9 && (a.1.y - b.1.y).abs() < 1e-9);
            assert!((a.2.x - b.2.x).abs() < 1e-9 && (a.2.y - b.2.y).abs() < 1e-9);
        }
    }

    #[test]
    fn never_break_run_moves_whole_to_next_line() {
        // The second child cannot split; it starts mid-line and overflows,
        // so it is re-aligned to the left margin one line down.
        let chars: Vec<char> = "aaaa\\H9;bbbb".chars().collect();
        let mut run = build_tree(styled(40.0), &chars, &catalog(), &NoTrace);
        if let RunContent::Children(children) = &mut run.content {
            children[1].style.linebreak = BreakMode::Never;
        }
        layout(&mut run, Vector::ZERO, 0.0, 40.0, &NoTrace);
        let children = run.children();
        let line = 9.0 * STD_LINE_SPACING;
        assert_eq!(children[1].text, "bbbb");
        assert!(children[1].has_glyphs());
        assert!((children[1].style.insertion_point.x - 0.0).abs() < 1e-9);
        assert!((children[1].style.insertion_point.y - (-line)).abs() < 1e-9);
    }

    #[test]
    fn unbreakable_overflow_pushes_once_then_accepts() {
        // No spaces, no legal break point: one push to the next line, then
        // the overflow is accepted.
        let chars: Vec<char> = "x\\H9;aaaaaaaaaa".chars().collect();
        let mut run = build_tree(styled(40.0), &chars, &catalog(), &NoTrace);
        layout(&mut run, Vector::ZERO, 0.0, 40.0, &NoTrace);
        let children = run.children();
        assert_eq!(children.len(), 2);
        // Pushed to the margin on a new line, still a single leaf.
        assert!(children[1].has_glyphs());
        assert!((children[1].style.insertion_point.x - 0.0).abs() < 1e-9);
        let line = 9.0 * STD_LINE_SPACING;
        assert!((children[1].style.insertion_point.y - (-line)).abs() < 1e-9);
        assert!(children[1].bounds.max.x > 40.0);
    }

    #[test]
    fn list_text_hangs_at_item_indent() {
        // A lone code section and one display section build a single leaf.
        let run = build_and_layout("\\pi2,l10;^Iitem", 500.0);
        assert!(run.has_glyphs());
        assert!(run.style.is_list_text());
        assert!((run.style.insertion_point.x - 10.0).abs() < 1e-9);
        // Its own indent does not force a line return.
        assert!((run.style.insertion_point.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn run_with_list_format_but_not_item_text_returns() {
        // Text built after a list formatter without ^I gets pushed to a new
        // line when it sits right of the margin.
        let run = build_and_layout("head\\pi2,l10;tail", 500.0);
        let children = run.children();
        assert_eq!(children.len(), 2);
        let line = 9.0 * STD_LINE_SPACING;
        assert!((children[1].style.insertion_point.x - 0.0).abs() < 1e-9);
        assert!((children[1].style.insertion_point.y - (-line)).abs() < 1e-9);
    }

    #[test]
    fn stack_assembly_is_moved_as_a_unit() {
        let run = build_and_layout("a\\Sb^c;d", 500.0);
        let children = run.children();
        assert_eq!(children.len(), 3);
        let stack = &children[1];
        let upper_y = stack.children()[0].style.insertion_point.y;
        let lower_y = stack.children()[1].style.insertion_point.y;
        // The vertical offsets survive layout.
        assert!((upper_y - 9.0 * 0.33).abs() < 1e-9);
        assert!((lower_y - (-9.0 * 0.33)).abs() < 1e-9);
        // The following run chains after the assembly.
        assert!((children[2].style.insertion_point.x - stack.bounds.max.x).abs() < 1e-9);
    }

    #[test]
    fn used_size_reflects_bounds() {
        let run = build_and_layout("ab", 500.0);
        assert!((run.used_width - run.bounds.width()).abs() < 1e-9);
        assert!((run.used_height - 9.0).abs() < 1e-9);
    }
}
