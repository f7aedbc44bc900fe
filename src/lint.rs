//! Linter for record layouts: checks declared offsets against field widths.
//!
//! ## Rules
//!
//! - **Gap**: a field starts after the end of the previous field (the first field is
//!   compared with byte 0).
//! - **Overlap**: a field starts before the end of the previous field, which includes
//!   rows listed out of offset order.
//! - **Misaligned**: a multi-byte field's offset is not a multiple of its element width.
//!
//! Run the linter via the `lint_table` binary: `cargo run --bin lint_table -- superblock.tsv`.
//! Exit code 1 if any error-level findings.

use crate::layout::{LayoutOptions, OffsetCheck, RecordLayout};
use crate::parser::parse_table;
use crate::CompileError;

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Identifies which rule produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintRule {
    Gap,
    Overlap,
    Misaligned,
}

impl LintRule {
    /// Gaps and overlaps mean the declared offsets disagree with the summed width.
    pub fn breaks_contiguity(self) -> bool {
        matches!(self, LintRule::Gap | LintRule::Overlap)
    }

    pub fn id(self) -> &'static str {
        match self {
            LintRule::Gap => "gap",
            LintRule::Overlap => "overlap",
            LintRule::Misaligned => "misaligned",
        }
    }
}

/// A single lint message with its source line.
#[derive(Debug, Clone, PartialEq)]
pub struct LintMessage {
    pub line: usize,
    pub rule: LintRule,
    pub severity: Severity,
    pub message: String,
}

/// Run all lint rules on a layout. Returns messages in source order.
pub fn lint_layout(layout: &RecordLayout) -> Vec<LintMessage> {
    let mut out = Vec::new();
    let mut expected: u64 = 0;
    let mut previous: Option<&str> = None;

    for e in layout.entries() {
        if e.offset > expected {
            out.push(LintMessage {
                line: e.line,
                rule: LintRule::Gap,
                severity: Severity::Warning,
                message: format!(
                    "`{}` starts at {} but {} ends at {} ({} unaccounted byte(s))",
                    e.name,
                    e.offset,
                    previous.map_or("the record start".to_string(), |p| format!("`{}`", p)),
                    expected,
                    e.offset - expected
                ),
            });
        } else if e.offset < expected {
            out.push(LintMessage {
                line: e.line,
                rule: LintRule::Overlap,
                severity: Severity::Error,
                message: format!(
                    "`{}` starts at {} inside `{}`, which ends at {}",
                    e.name,
                    e.offset,
                    previous.unwrap_or_default(),
                    expected
                ),
            });
        }

        let align = e.ty.byte_width();
        if e.offset % align != 0 {
            out.push(LintMessage {
                line: e.line,
                rule: LintRule::Misaligned,
                severity: Severity::Warning,
                message: format!(
                    "`{}` ({}) at offset {} is not {}-byte aligned",
                    e.name, e.ty, e.offset, align
                ),
            });
        }

        expected = e.end();
        previous = Some(e.name.as_str());
    }

    out
}

/// Parse and build a table without enforcing offsets, then lint it.
pub fn lint_source(source: &str) -> Result<Vec<LintMessage>, CompileError> {
    let rows = parse_table(source)?;
    let layout = RecordLayout::build(
        rows,
        &LayoutOptions {
            offset_check: OffsetCheck::Ignore,
        },
    )?;
    Ok(lint_layout(&layout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_aligned_table_is_clean() {
        let msgs = lint_source("0\t__le32\ta\t\n4\t__le16\tb[2]\t\n8\t__le64\tc\t").expect("lint");
        assert!(msgs.is_empty(), "{:?}", msgs);
    }

    #[test]
    fn leading_gap_is_reported() {
        let msgs = lint_source("1\tu8\ta\t\n0\tu8\tb\t").expect("lint");
        let rules: Vec<_> = msgs.iter().map(|m| (m.line, m.rule)).collect();
        assert_eq!(rules, [(1, LintRule::Gap), (2, LintRule::Overlap)]);
    }

    #[test]
    fn gap_between_fields() {
        let msgs = lint_source("0\tu8\ta\t\n2\tu8\tb\t\n3\tu8\tc\t").expect("lint");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].rule, LintRule::Gap);
        assert_eq!(msgs[0].severity, Severity::Warning);
        assert_eq!(msgs[0].line, 2);
    }

    #[test]
    fn declared_ends_past_packed_width_still_lint() {
        // packed width is 4, d is declared at 4..5
        let msgs = lint_source("0\tu8\ta\t\n2\tu8\tb\t\n3\tu8\tc\t\n4\tu8\td\t").expect("lint");
        let rules: Vec<_> = msgs.iter().map(|m| (m.line, m.rule)).collect();
        assert_eq!(rules, [(2, LintRule::Gap)]);
    }

    #[test]
    fn layout_errors_propagate() {
        assert!(matches!(
            lint_source("0\t__be16\ta\t"),
            Err(CompileError::Layout(_))
        ));
    }

    #[test]
    fn out_of_order_rows_overlap() {
        let msgs = lint_source("2\t__le16\tb\t\n0\t__le16\ta\t").expect("lint");
        let overlap: Vec<_> = msgs.iter().filter(|m| m.rule == LintRule::Overlap).collect();
        assert_eq!(overlap.len(), 1);
        assert_eq!(overlap[0].line, 2);
        assert_eq!(overlap[0].severity, Severity::Error);
        // b itself starts after byte 0
        assert!(msgs.iter().any(|m| m.rule == LintRule::Gap && m.line == 1));
    }

    #[test]
    fn misaligned_field() {
        let msgs = lint_source("0\tu8\ta\t\n1\t__le32\tb\t\n5\tu8\tc[3]\t").expect("lint");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].rule, LintRule::Misaligned);
        assert!(!msgs[0].rule.breaks_contiguity());
    }

    #[test]
    fn parse_errors_propagate() {
        assert!(matches!(lint_source("xyz\tu8\ta\t"), Err(CompileError::Parse(_))));
    }
}
