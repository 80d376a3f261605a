//! Rich-markup parsing
//!
//! The markup language is a flat string with embedded escape codes: setting
//! codes that run to a terminating semicolon (`\H2.5;`), two-character codes
//! (`\P`, `\l`, `^I`), and span codes bracketed by a matching close construct
//! (`{`…`}`, `\L`…`\l`, `\S`…`;`).
//!
//! Parsing happens in two passes over the same character buffer:
//!
//! ```text
//! source chars → section boundaries (section.rs) → code tags (tag.rs)
//! ```
//!
//! All offsets throughout this module are character indices, not byte
//! offsets; the builder materializes the source as a `Vec<char>` once and
//! every cursor walks that buffer.

pub mod section;
pub mod tabs;
pub mod tag;

pub use section::{section_of, section_starts, stack_found_at};
pub use tabs::{TabGroup, TabStopKind};
pub use tag::{matching_brace_end, CodeTag, TagKind};

/// First occurrence of `needle` at or after `from`.
pub(crate) fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    if from >= chars.len() {
        return None;
    }
    chars[from..].iter().position(|&c| c == needle).map(|i| from + i)
}

/// First occurrence of the two-character sequence `a b` at or after `from`.
pub(crate) fn find_pair(chars: &[char], from: usize, a: char, b: char) -> Option<usize> {
    if chars.len() < 2 || from + 1 >= chars.len() {
        return None;
    }
    (from..chars.len() - 1).find(|&i| chars[i] == a && chars[i + 1] == b)
}

/// Collects a character range back into an owned string.
pub(crate) fn to_string(chars: &[char]) -> String {
    chars.iter().collect()
}
