//! The run tree
//!
//! Parsing a markup string produces a tree of [`Run`] nodes. A leaf owns a
//! sequence of positioned glyph placements plus the exact display substring
//! they came from; a composite owns child runs laid out left to right along
//! one band; a stacked assembly is a composite with fixed part slots and is
//! moved as a unit by layout. Decoration line segments are inserted as
//! sibling runs after layout.
//!
//! Every node participates in the container protocol: recursive translate,
//! rotate, scale, and mirror, plus min/max bounding-box aggregation. The
//! tree is strictly owned; the only structure shared between nodes is the
//! tab group inside [`StyleState`].

pub mod builder;
pub mod stack;

use crate::geometry::{BoundingBox, Vector};
use crate::style::StyleState;

/// One placed character glyph inside a leaf run.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPlacement {
    /// Character identity (possibly the replacement character).
    pub ch: char,
    /// Baseline insertion point of the glyph.
    pub insertion: Vector,
    /// Per-axis scale from font units to drawing units.
    pub scale: Vector,
    /// Rotation of the glyph, in radians.
    pub rotation: f64,
    /// Extent of the glyph in drawing units.
    pub extent: BoundingBox,
}

/// A straight decoration segment (underline and friends).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    /// Start point.
    pub from: Vector,
    /// End point.
    pub to: Vector,
}

/// Divider style of a stacked assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStyle {
    /// `^` — superscript over subscript, no divider
    SuperSub,
    /// `/` — horizontal fraction bar
    Horizontal,
    /// `#` — slanted fraction bar, parts staggered horizontally
    Slanted,
}

/// Content payload of a run node.
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    /// Leaf: placed glyphs.
    Glyphs(Vec<GlyphPlacement>),
    /// Composite: child runs in sibling order.
    Children(Vec<Run>),
    /// A decoration line inserted after layout.
    Decoration(LineSegment),
}

/// A node of the laid-out text tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Formatting state the node was built under.
    pub style: StyleState,
    /// For glyph leaves, the exact display substring the glyphs represent
    /// (escape literals already substituted). Empty for composites.
    pub text: String,
    /// Node payload.
    pub content: RunContent,
    /// Current bounding box.
    pub bounds: BoundingBox,
    /// Width of the box after the last layout pass.
    pub used_width: f64,
    /// Height of the box after the last layout pass.
    pub used_height: f64,
    /// Set on the fragments a word wrap produces; such runs span part of a
    /// line and are skipped by the decoration pass.
    pub multi_line: bool,
    /// Set on stacked assemblies; layout then moves the node as a unit.
    pub stack: Option<StackStyle>,
    /// Net advance of one space in this leaf's metrics, captured at build
    /// time for the trailing-space bound correction.
    pub word_advance: f64,
}

impl Run {
    /// Creates an empty node at the style's insertion point. The initial box
    /// spans one line height below the insertion point.
    pub fn empty(style: StyleState, content: RunContent) -> Run {
        let ins = style.insertion_point;
        let bounds = BoundingBox {
            min: Vector::new(ins.x, ins.y - style.height),
            max: ins,
        };
        Run {
            style,
            text: String::new(),
            content,
            bounds,
            used_width: 0.0,
            used_height: 0.0,
            multi_line: false,
            stack: None,
            word_advance: 0.0,
        }
    }

    /// Whether this node is a glyph-holding leaf.
    pub fn has_glyphs(&self) -> bool {
        matches!(self.content, RunContent::Glyphs(_))
    }

    /// Glyph placements of a leaf, empty otherwise.
    pub fn glyphs(&self) -> &[GlyphPlacement] {
        match &self.content {
            RunContent::Glyphs(g) => g,
            _ => &[],
        }
    }

    /// Child runs of a composite, empty otherwise.
    pub fn children(&self) -> &[Run] {
        match &self.content {
            RunContent::Children(c) => c,
            _ => &[],
        }
    }

    /// Mutable child runs of a composite, empty otherwise.
    pub fn children_mut(&mut self) -> &mut [Run] {
        match &mut self.content {
            RunContent::Children(c) => c,
            _ => &mut [],
        }
    }

    /// Takes ownership of a composite's children, leaving it empty.
    pub fn take_children(&mut self) -> Vec<Run> {
        match &mut self.content {
            RunContent::Children(c) => std::mem::take(c),
            _ => Vec::new(),
        }
    }

    /// Number of direct children (composites) or glyphs (leaves).
    pub fn count(&self) -> usize {
        match &self.content {
            RunContent::Glyphs(g) => g.len(),
            RunContent::Children(c) => c.len(),
            RunContent::Decoration(_) => 0,
        }
    }

    /// Moves this node and all its descendants by `delta`.
    pub fn translate(&mut self, delta: Vector) {
        self.style.insertion_point = self.style.insertion_point + delta;
        self.bounds.translate(delta);
        match &mut self.content {
            RunContent::Glyphs(glyphs) => {
                for g in glyphs {
                    g.insertion = g.insertion + delta;
                    g.extent.translate(delta);
                }
            }
            RunContent::Children(children) => {
                for child in children {
                    child.translate(delta);
                }
            }
            RunContent::Decoration(seg) => {
                seg.from = seg.from + delta;
                seg.to = seg.to + delta;
            }
        }
    }

    /// Rotates this node and all its descendants about `center`.
    pub fn rotate_about(&mut self, center: Vector, angle: f64) {
        self.transform(&mut |p| p.rotated_about(center, angle));
        self.for_each_glyph(&mut |g| g.rotation += angle);
        self.for_each_style(&mut |s| s.angle += angle);
    }

    /// Scales this node and all its descendants about `center`.
    ///
    /// The style height and reference width follow the horizontal factor,
    /// the convention of the surrounding drawing model.
    pub fn scale_about(&mut self, center: Vector, factor: Vector) {
        self.transform(&mut |p| p.scaled_about(center, factor));
        self.for_each_glyph(&mut |g| {
            g.scale = Vector::new(g.scale.x * factor.x, g.scale.y * factor.x);
        });
        self.for_each_style(&mut |s| {
            s.height *= factor.x;
            s.width *= factor.x;
        });
    }

    /// Mirrors this node and all its descendants across the line through
    /// `p1` and `p2`.
    pub fn mirror_about(&mut self, p1: Vector, p2: Vector) {
        self.transform(&mut |p| p.mirrored(p1, p2));
    }

    fn transform(&mut self, f: &mut dyn FnMut(Vector) -> Vector) {
        self.style.insertion_point = f(self.style.insertion_point);
        self.bounds = self.bounds.transformed(&mut *f);
        match &mut self.content {
            RunContent::Glyphs(glyphs) => {
                for g in glyphs {
                    g.insertion = f(g.insertion);
                    g.extent = g.extent.transformed(&mut *f);
                }
            }
            RunContent::Children(children) => {
                for child in children {
                    child.transform(f);
                }
            }
            RunContent::Decoration(seg) => {
                seg.from = f(seg.from);
                seg.to = f(seg.to);
            }
        }
    }

    fn for_each_glyph(&mut self, f: &mut dyn FnMut(&mut GlyphPlacement)) {
        match &mut self.content {
            RunContent::Glyphs(glyphs) => glyphs.iter_mut().for_each(&mut *f),
            RunContent::Children(children) => {
                for child in children {
                    child.for_each_glyph(f);
                }
            }
            RunContent::Decoration(_) => {}
        }
    }

    fn for_each_style(&mut self, f: &mut dyn FnMut(&mut StyleState)) {
        f(&mut self.style);
        if let RunContent::Children(children) = &mut self.content {
            for child in children {
                child.for_each_style(f);
            }
        }
    }

    /// Recomputes this node's box from its content.
    ///
    /// A leaf's box spans from its insertion column across every glyph
    /// extent, widened by one space advance when its text ends in
    /// whitespace (the advance would otherwise be lost, since spaces place
    /// no glyph). A composite's box is the union of its children's.
    pub fn recalc_bounds(&mut self) {
        let ins = self.style.insertion_point;
        let mut bounds = BoundingBox {
            min: Vector::new(ins.x, ins.y - self.style.height),
            max: ins,
        };
        match &self.content {
            RunContent::Glyphs(glyphs) => {
                for g in glyphs {
                    bounds.merge(&g.extent);
                }
                if self.text.chars().last().is_some_and(char::is_whitespace) {
                    bounds.max.x += self.word_advance;
                }
            }
            RunContent::Children(children) => {
                for child in children {
                    bounds.merge(&child.bounds);
                }
            }
            RunContent::Decoration(seg) => {
                bounds.merge(&BoundingBox::new(seg.from, seg.to));
            }
        }
        self.bounds = bounds;
    }

    /// Recomputes boxes bottom-up through the whole subtree.
    pub fn recalc_bounds_deep(&mut self) {
        if let RunContent::Children(children) = &mut self.content {
            for child in children {
                child.recalc_bounds_deep();
            }
        }
        self.recalc_bounds();
    }
}
