//! Code tag lexer
//!
//! A [`CodeTag`] is the ephemeral result of scanning one escape code (or one
//! plain-text run) out of the source buffer. Classification happens on the
//! character after the backslash; where a value ends depends on the tag
//! family:
//!
//! - setting tags run one past their terminating `;`
//! - two-character tags (`\P`, `\l`, `\o`, `\k`, `^I`, `}`) end after two
//!   (or one) characters
//! - span tags end *at* the first character of their matching close
//!   construct: the matching `}` for a brace, the `\l`/`\o`/`\k` pair for a
//!   decoration, the `;` for a stack
//!
//! An unterminated construct clamps its end to the buffer length instead of
//! failing; callers must tolerate a tag whose end equals the source length.

use crate::markup::{find_char, find_pair, to_string};
use crate::style::Decoration;

/// Discriminated, decoded form of one code tag.
///
/// Payload-carrying variants hold the decoded value; span and structural
/// variants carry none and are interpreted positionally via
/// [`CodeTag::start`]/[`CodeTag::end`].
#[derive(Debug, Clone, PartialEq)]
pub enum TagKind {
    /// `\P` forced paragraph break
    ForceBreak,
    /// `\L`, `\O`, `\K` decoration span open
    DecorOpen(Decoration),
    /// `\l`, `\o`, `\k` decoration span close
    DecorClose(Decoration),
    /// `\A…;` alignment setting
    Alignment(i64),
    /// `\C…;` color index setting
    Color(i64),
    /// `\H…;` absolute text height
    Height(f64),
    /// `\Q…;` oblique angle
    Oblique(f64),
    /// `\T…;` tracking factor
    Tracking(f64),
    /// `\W…;` width factor, relative to height
    WidthFactor(f64),
    /// `\X…;` dimension-line partition flag
    DimFlag(f64),
    /// `\F…;` / `\f…;` font name (portion before any `|` qualifier)
    Font(String),
    /// `\p…;` paragraph/tab settings body (undecoded; see
    /// [`crate::markup::TabGroup`])
    Paragraph(String),
    /// `\S…;` stacked fraction/superscript span
    Stack,
    /// `^I` list-item indent
    Indent,
    /// `{` group span
    Brace,
    /// `}` group close
    BraceClose,
    /// `\?` escape with no known meaning; ignored
    Unknown(char),
    /// A plain display-text run. `has_stack` is true when a stacking escape
    /// occurs in the run before the first space, making the run's head the
    /// stack's prefix.
    Text {
        /// stacking escape before the first space
        has_stack: bool,
    },
}

/// One scanned code tag (or plain-text run) with its source extent.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeTag {
    /// Decoded classification and payload.
    pub kind: TagKind,
    /// Offset of the tag's first character.
    pub start: usize,
    /// For setting tags, one past the terminating `;`; for span tags, the
    /// offset of the close construct's first character. Always `>= start`,
    /// clamped to the source length when unterminated.
    pub end: usize,
}

impl CodeTag {
    /// Scans the tag starting at `*cursor`, advancing the cursor to the
    /// tag's end.
    pub fn scan(chars: &[char], cursor: &mut usize) -> CodeTag {
        let start = *cursor;
        let len = chars.len();
        debug_assert!(start < len, "tag scan past end of source");

        let c0 = chars[start];
        let tag = if c0 == '\\' && start + 1 < len {
            Self::scan_escape(chars, start)
        } else if c0 == '^' && start + 1 < len && chars[start + 1] == 'I' {
            CodeTag {
                kind: TagKind::Indent,
                start,
                end: start + 2,
            }
        } else if c0 == '{' {
            let end = matching_brace_end(chars, start).unwrap_or(len);
            CodeTag {
                kind: TagKind::Brace,
                start,
                end,
            }
        } else if c0 == '}' {
            CodeTag {
                kind: TagKind::BraceClose,
                start,
                end: start + 1,
            }
        } else {
            Self::scan_text(chars, start)
        };

        debug_assert!(tag.end >= tag.start);
        *cursor = tag.end.min(len).max(start + 1);
        tag
    }

    fn scan_escape(chars: &[char], start: usize) -> CodeTag {
        let len = chars.len();
        let code = chars[start + 1];
        // Value of a setting tag runs from just past the code letter to the
        // terminating semicolon.
        let semi = find_char(chars, start + 2, ';');
        let setting_end = semi.map(|s| s + 1).unwrap_or(len);
        let value_end = semi.unwrap_or(len);
        let value = &chars[(start + 2).min(len)..value_end.max(start + 2).min(len)];

        let (kind, end) = match code {
            'A' => (TagKind::Alignment(parse_int(value)), setting_end),
            'C' => (TagKind::Color(parse_int(value)), setting_end),
            'H' => (TagKind::Height(parse_float(value)), setting_end),
            'Q' => (TagKind::Oblique(parse_float(value)), setting_end),
            'T' => (TagKind::Tracking(parse_float(value)), setting_end),
            'W' => (TagKind::WidthFactor(parse_float(value)), setting_end),
            'X' => (TagKind::DimFlag(parse_float(value)), setting_end),
            'F' | 'f' => {
                let name_end = find_char(chars, start + 2, '|')
                    .filter(|&p| p < value_end)
                    .unwrap_or(value_end);
                let name = to_string(&chars[(start + 2).min(len)..name_end.max(start + 2)]);
                (TagKind::Font(name), setting_end)
            }
            'p' => {
                let body = to_string(value);
                (TagKind::Paragraph(body), setting_end)
            }
            'P' => (TagKind::ForceBreak, start + 2),
            'S' => {
                // Span tag; ends at the terminating semicolon itself.
                (TagKind::Stack, semi.unwrap_or(len))
            }
            'L' => (
                TagKind::DecorOpen(Decoration::Underline),
                find_pair(chars, start + 2, '\\', 'l').unwrap_or(len),
            ),
            'O' => (
                TagKind::DecorOpen(Decoration::Overline),
                find_pair(chars, start + 2, '\\', 'o').unwrap_or(len),
            ),
            'K' => (
                TagKind::DecorOpen(Decoration::Strikethrough),
                find_pair(chars, start + 2, '\\', 'k').unwrap_or(len),
            ),
            'l' => (TagKind::DecorClose(Decoration::Underline), start + 2),
            'o' => (TagKind::DecorClose(Decoration::Overline), start + 2),
            'k' => (TagKind::DecorClose(Decoration::Strikethrough), start + 2),
            '\\' | '{' | '}' | '~' => {
                // Escaped literal; display text, not a code.
                (TagKind::Text { has_stack: false }, start + 2)
            }
            other => (TagKind::Unknown(other), setting_end),
        };
        CodeTag { kind, start, end }
    }

    fn scan_text(chars: &[char], start: usize) -> CodeTag {
        let len = chars.len();
        let stack_at = find_pair(chars, start, '\\', 'S');
        let space_at = find_char(chars, start, ' ');
        let has_stack = match (stack_at, space_at) {
            (Some(s), Some(sp)) => s < sp,
            (Some(_), None) => true,
            (None, _) => false,
        };
        let end = if has_stack {
            // The run carries a stack; it terminates where the stack does.
            find_char(chars, stack_at.unwrap_or(start), ';').unwrap_or(len)
        } else {
            find_char(chars, start, ';').map(|s| s + 1).unwrap_or(len)
        };
        CodeTag {
            kind: TagKind::Text { has_stack },
            start,
            end,
        }
    }

    /// Whether this tag's scope runs to a matching close construct rather
    /// than a semicolon.
    pub fn is_span(&self) -> bool {
        matches!(
            self.kind,
            TagKind::Stack
                | TagKind::DecorOpen(_)
                | TagKind::Brace
                | TagKind::Text { has_stack: true }
        )
    }

    /// Whether this tag carries (or is) a stacking command.
    pub fn is_stack(&self) -> bool {
        matches!(self.kind, TagKind::Stack | TagKind::Text { has_stack: true })
    }
}

/// Offset of the `}` matching the `{` at `start`, honoring nesting.
///
/// Re-enters itself one level deeper whenever an inner `{` opens before the
/// next `}`, so the returned offset always closes the initiating brace, never
/// an inner one. Returns `None` for an unmatched open brace.
pub fn matching_brace_end(chars: &[char], start: usize) -> Option<usize> {
    matching_end(chars, start, '{', '}')
}

fn matching_end(chars: &[char], start: usize, open: char, close: char) -> Option<usize> {
    let mut n0 = start;
    loop {
        let inner = find_char(chars, n0 + 1, open);
        let closing = find_char(chars, n0 + 1, close)?;
        match inner {
            Some(i) if i < closing => n0 = matching_end(chars, i, open, close)?,
            _ => return Some(closing),
        }
    }
}

fn parse_int(value: &[char]) -> i64 {
    let s: String = value.iter().collect();
    s.trim().parse().unwrap_or(0)
}

fn parse_float(value: &[char]) -> f64 {
    // Height and width values may carry a trailing 'x' marking a relative
    // factor; the numeric part is what we keep either way.
    let s: String = value.iter().collect();
    let t = s.trim().trim_end_matches(&['x', 'X'][..]);
    t.parse().unwrap_or(0.0)
}
