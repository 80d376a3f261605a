//! Stacked assemblies
//!
//! A stacking tag `\S…;` builds a small composite of up to three parts: an
//! optional prefix (the unspaced text just before the tag), an upper part,
//! and a lower part, separated by the stack operator:
//!
//! - `^` — superscript over subscript, no divider
//! - `/` — fraction with a horizontal bar
//! - `#` — fraction with a slanted bar, parts staggered horizontally
//!
//! Upper and lower parts are scaled to 0.58× the base height and shifted
//! ±0.33× the base height. An assembly with fewer than two parts present is
//! discarded. Drawing the divider line itself is left to a future pass; the
//! part positioning here is complete without it.

use crate::font::GlyphSource;
use crate::markup::find_pair;
use crate::markup::tag::CodeTag;
use crate::run::builder::build_tree;
use crate::run::{Run, RunContent, StackStyle};
use crate::style::{BreakMode, StyleState, DROP_SUBSCRIPT, RAISE_SUPERSCRIPT, SUPER_SUB_FACTOR};
use crate::trace::{TraceEvent, TraceSink};

/// Builds the assembly for a stack-carrying tag, or `None` when the tag
/// does not amount to a valid stack.
///
/// `tag` is either a `\S…;` code tag or a text run carrying an embedded
/// stack; its extent covers the prefix (if any) and the stack body, with the
/// terminating `;` excluded.
pub fn build_stack(
    style: StyleState,
    chars: &[char],
    tag: &CodeTag,
    fonts: &dyn GlyphSource,
    trace: &dyn TraceSink,
) -> Option<Run> {
    let body = &chars[tag.start..tag.end.min(chars.len())];
    let stack_at = find_pair(body, 0, '\\', 'S')?;

    let mut style_now = style;
    style_now.linebreak = BreakMode::Never;
    let base = style_now.insertion_point;
    let base_height = style_now.height;
    let assembly_style = style_now.clone();

    let mut children: Vec<Run> = Vec::new();

    // Prefix: only when the stack does not start the tag body.
    if stack_at != 0 {
        let child = build_tree(style_now.clone(), &body[..stack_at], fonts, trace);
        style_now.insertion_point.x = child.bounds.max.x;
        children.push(child);
    }

    let parts_start = stack_at + 2;
    let op_at = body[parts_start.min(body.len())..]
        .iter()
        .position(|c| matches!(c, '^' | '/' | '#'))
        .map(|i| parts_start + i);
    let stack_style = match op_at.map(|i| body[i]) {
        Some('/') => StackStyle::Horizontal,
        Some('#') => StackStyle::Slanted,
        _ => StackStyle::SuperSub,
    };

    // Upper part: between the stack code and the operator.
    let upper = &body[parts_start.min(body.len())..op_at.unwrap_or(parts_start).max(parts_start)];
    if !upper.is_empty() {
        style_now.height = base_height * SUPER_SUB_FACTOR;
        style_now.insertion_point.y = base.y + base_height * RAISE_SUPERSCRIPT;
        children.push(build_tree(style_now.clone(), upper, fonts, trace));
    }

    // Lower part: between the operator and the terminator.
    let lower_start = op_at.map(|i| i + 1).unwrap_or(parts_start);
    let lower = &body[lower_start.min(body.len())..];
    if !lower.is_empty() {
        style_now.height = base_height * SUPER_SUB_FACTOR;
        style_now.insertion_point.y = base.y - base_height * DROP_SUBSCRIPT;
        if stack_style == StackStyle::Slanted {
            // Slanted fractions stagger: the lower part starts where the
            // previous sibling ends rather than under it.
            if let Some(prev) = children.last() {
                style_now.insertion_point.x = prev.bounds.max.x;
            }
        }
        children.push(build_tree(style_now.clone(), lower, fonts, trace));
    }

    if children.len() < 2 {
        trace.record(TraceEvent::StackDiscarded);
        return None;
    }
    trace.record(TraceEvent::StackBuilt {
        parts: children.len() as u8,
    });

    let mut assembly = Run::empty(assembly_style, RunContent::Children(children));
    assembly.stack = Some(stack_style);
    assembly.recalc_bounds();
    Some(assembly)
}
