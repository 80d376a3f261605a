//! Paragraph/tab settings
//!
//! A `\p…;` tag carries an ordered list of tab stops and indents, each a
//! single letter followed by a numeric value: `\pi2,l4,t8;`. The decoded
//! [`TabGroup`] is shared read-only (via `Arc`) by every sibling run built
//! after the tag, until a later `\p` tag rebinds it.

use crate::trace::{TraceEvent, TraceSink};

/// Kind of one tab-stop entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStopKind {
    /// `i` — hanging indent of the list-item marker
    ItemIndent,
    /// `l` — left indent of the item body
    LeftIndent,
    /// `t` — plain left-aligned tab stop
    LeftAlign,
    /// `c` — center-aligned tab stop
    CenterAlign,
    /// `r` — right-aligned tab stop
    RightAlign,
    /// `d` — decimal-point-aligned tab stop
    DecimalAlign,
    /// `x` — bullet/numbering index
    BulletIndex,
}

impl TabStopKind {
    fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'i' => Self::ItemIndent,
            'l' => Self::LeftIndent,
            't' => Self::LeftAlign,
            'c' => Self::CenterAlign,
            'r' => Self::RightAlign,
            'd' => Self::DecimalAlign,
            'x' => Self::BulletIndex,
            _ => return None,
        })
    }
}

/// Ordered tab stops decoded from one `\p…;` tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabGroup {
    entries: Vec<(TabStopKind, f64)>,
}

impl TabGroup {
    /// Decodes a tag body such as `i2,l4,t8` (the text between `\p` and the
    /// terminating `;`). Unknown stop letters are skipped.
    pub fn parse(body: &str, trace: &dyn TraceSink) -> TabGroup {
        let chars: Vec<char> = body.chars().collect();
        let mut entries = Vec::new();
        let mut n = 0;
        while n < chars.len() {
            let code = chars[n];
            n += 1;
            let value_start = n;
            while n < chars.len() && chars[n] != ',' {
                n += 1;
            }
            let value: String = chars[value_start..n].iter().collect();
            if n < chars.len() {
                n += 1; // step over the comma
            }
            match TabStopKind::from_code(code) {
                Some(kind) => {
                    entries.push((kind, value.trim().parse().unwrap_or(0.0)));
                }
                None => trace.record(TraceEvent::UnknownCode { code }),
            }
        }
        TabGroup { entries }
    }

    /// All decoded entries, in tag order.
    pub fn entries(&self) -> &[(TabStopKind, f64)] {
        &self.entries
    }

    /// Whether the group has no entries (a clearing `\p;` tag).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True iff the first two entries are exactly (item-indent, left-indent):
    /// the signature of a list formatter.
    pub fn is_list_format(&self) -> bool {
        matches!(
            self.entries.as_slice(),
            [(TabStopKind::ItemIndent, _), (TabStopKind::LeftIndent, _), ..]
        )
    }

    /// Value of the first entry of the given kind.
    pub fn find(&self, kind: TabStopKind) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoTrace;

    #[test]
    fn parses_list_format() {
        let tabs = TabGroup::parse("i2,l4", &NoTrace);
        assert_eq!(
            tabs.entries(),
            &[(TabStopKind::ItemIndent, 2.0), (TabStopKind::LeftIndent, 4.0)]
        );
        assert!(tabs.is_list_format());
        assert_eq!(tabs.find(TabStopKind::LeftIndent), Some(4.0));
    }

    #[test]
    fn order_matters_for_list_format() {
        let tabs = TabGroup::parse("l4,i2", &NoTrace);
        assert!(!tabs.is_list_format());
    }

    #[test]
    fn plain_tab_stops_are_not_a_list() {
        let tabs = TabGroup::parse("t4,t8,t12", &NoTrace);
        assert!(!tabs.is_list_format());
        assert_eq!(tabs.entries().len(), 3);
    }

    #[test]
    fn unknown_codes_are_skipped() {
        let tabs = TabGroup::parse("z9,i2,l4", &NoTrace);
        assert!(tabs.is_list_format());
    }

    #[test]
    fn empty_body_clears() {
        let tabs = TabGroup::parse("", &NoTrace);
        assert!(tabs.is_empty());
    }

    #[test]
    fn decimal_values() {
        let tabs = TabGroup::parse("i2.5,l4.25", &NoTrace);
        assert_eq!(tabs.find(TabStopKind::ItemIndent), Some(2.5));
        assert_eq!(tabs.find(TabStopKind::LeftIndent), Some(4.25));
    }
}
