//! Decoration pass
//!
//! After layout, runs that carry a decoration gain a line-segment run
//! spanning their bounding box: an underline 0.33× the height below the
//! bottom, an overline the same distance above the top, a strike through the
//! middle. The segment is inserted as a sibling of the decorated run; when
//! the root itself is decorated the caller wraps it into a composite first.
//!
//! Fragments produced by word wrap are marked multi-line and are skipped;
//! the decoration then belongs to the composite that replaced the original
//! run, giving one segment across the wrapped block.

use crate::geometry::{BoundingBox, Vector};
use crate::run::{LineSegment, Run, RunContent};
use crate::style::{Decoration, DROP_UNDERLINE};

/// Walks the subtree inserting decoration siblings.
///
/// Returns the segment for `run` itself when it qualifies, so the caller can
/// insert it at the right level (the library entry point wraps a qualifying
/// root into a composite).
pub fn decorate(run: &mut Run) -> Option<Run> {
    if run.style.decoration != Decoration::None && !run.multi_line {
        return Some(decoration_line(run));
    }
    if !run.has_glyphs() {
        if let RunContent::Children(children) = &mut run.content {
            let taken = std::mem::take(children);
            let mut out = Vec::with_capacity(taken.len());
            for mut child in taken {
                let line = decorate(&mut child);
                out.push(child);
                if let Some(line) = line {
                    out.push(line);
                }
            }
            *children = out;
        }
        run.recalc_bounds();
    }
    None
}

fn decoration_line(run: &Run) -> Run {
    let h = run.style.height;
    let y = match run.style.decoration {
        Decoration::Underline => run.bounds.min.y - h * DROP_UNDERLINE,
        Decoration::Overline => run.bounds.max.y + h * DROP_UNDERLINE,
        Decoration::Strikethrough => (run.bounds.min.y + run.bounds.max.y) / 2.0,
        Decoration::None => unreachable!("only decorated runs get here"),
    };
    let seg = LineSegment {
        from: Vector::new(run.bounds.min.x, y),
        to: Vector::new(run.bounds.max.x, y),
    };
    let mut style = run.style.clone();
    style.insertion_point = seg.from;
    let mut line = Run::empty(style, RunContent::Decoration(seg));
    line.bounds = BoundingBox::new(seg.from, seg.to);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontCatalog, FontFace};
    use crate::layout::layout;
    use crate::run::builder::build_tree;
    use crate::style::StyleState;
    use crate::trace::NoTrace;

    fn catalog() -> FontCatalog {
        let mut c = FontCatalog::new();
        c.register("standard", FontFace::fixed(0.9, 3.0, 6.0));
        c
    }

    fn built(src: &str) -> Run {
        let style = StyleState {
            insertion_point: Vector::new(0.0, 0.0),
            height: 9.0,
            width: 1000.0,
            style: "standard".to_string(),
            ..StyleState::default()
        };
        let chars: Vec<char> = src.chars().collect();
        let mut run = build_tree(style, &chars, &catalog(), &NoTrace);
        layout(&mut run, Vector::ZERO, 0.0, 1000.0, &NoTrace);
        run
    }

    #[test]
    fn underline_spans_box_below_bottom() {
        let mut run = built("\\LUnder\\l more");
        assert!(decorate(&mut run).is_none());
        let children = run.children();
        // under, its line, then the trailing text.
        assert_eq!(children.len(), 3);
        let decorated = &children[0];
        let line = &children[1];
        let RunContent::Decoration(seg) = &line.content else {
            panic!("expected a decoration run");
        };
        assert!((seg.from.x - decorated.bounds.min.x).abs() < 1e-9);
        assert!((seg.to.x - decorated.bounds.max.x).abs() < 1e-9);
        let expect_y = decorated.bounds.min.y - 9.0 * DROP_UNDERLINE;
        assert!((seg.from.y - expect_y).abs() < 1e-9);
    }

    #[test]
    fn undecorated_tree_is_untouched() {
        let mut run = built("plain text");
        assert!(decorate(&mut run).is_none());
        assert!(run.has_glyphs());
    }

    #[test]
    fn decorated_root_leaf_bubbles_its_line_up() {
        let mut run = built("\\LUnderlined\\l");
        let line = decorate(&mut run).expect("root qualifies");
        assert!(matches!(line.content, RunContent::Decoration(_)));
    }

    #[test]
    fn overline_sits_above_the_box() {
        let mut run = built("\\Oover\\o x");
        assert!(decorate(&mut run).is_none());
        let children = run.children();
        let decorated = &children[0];
        let RunContent::Decoration(seg) = &children[1].content else {
            panic!("expected a decoration run");
        };
        let expect_y = decorated.bounds.max.y + 9.0 * DROP_UNDERLINE;
        assert!((seg.from.y - expect_y).abs() < 1e-9);
    }
}
