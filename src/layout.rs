//! Record layout: resolved fields with byte lengths and the record's total width.
//!
//! The builder keeps source order. Width is the sum of every field's byte length; it is
//! never derived from the largest offset. Fields are packed back to back: each one is read
//! at its [`LayoutEntry::position`], the running sum of the lengths before it. Declared
//! offsets annotate the output, and how strictly they must agree with the packed positions
//! is chosen with [`OffsetCheck`].

use crate::ast::{FieldDescriptor, PrimitiveType, TableRow, TypeRef};
use crate::lint::{lint_layout, LintMessage};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("line {line}: field `{name}` has unknown type {spelling:?}")]
    UnknownType {
        line: usize,
        name: String,
        spelling: String,
    },
    #[error("line {line}: field `{name}` has array length {length}, expected at least 1")]
    NonPositiveArrayLength {
        line: usize,
        name: String,
        length: i64,
    },
    #[error("line {line}: `{name}` is not a valid field name")]
    InvalidName { line: usize, name: String },
    #[error("line {line}: duplicate field name `{name}`")]
    DuplicateName { line: usize, name: String },
    #[error("line {line}: field `{name}` makes the record larger than {max} bytes", max = MAX_WIDTH)]
    Overflow { line: usize, name: String },
    #[error("offsets do not match field widths: {}", summarize(.0))]
    Offsets(Vec<LintMessage>),
}

fn summarize(findings: &[LintMessage]) -> String {
    findings
        .iter()
        .map(|m| format!("line {}: {}", m.line, m.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Largest record accepted, in bytes. Generated code spells out one conversion per
/// array element, so unbounded lengths would produce unbounded source.
pub const MAX_WIDTH: u64 = 1 << 20;

/// How declared offsets are checked against the running width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetCheck {
    /// Offsets are documentation only.
    Ignore,
    /// Log every finding with `log::warn!` and continue.
    #[default]
    Warn,
    /// Any gap or overlap fails the build, so every declared offset equals the packed
    /// position.
    Strict,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    pub offset_check: OffsetCheck,
}

/// One resolved field.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub line: usize,
    /// Offset declared in the table.
    pub offset: u64,
    /// Where the field sits in the packed record: the summed lengths of earlier fields.
    pub position: u64,
    pub ty: PrimitiveType,
    pub name: String,
    pub array_length: u64,
    /// `ty.byte_width() * array_length`.
    pub byte_length: u64,
    pub description: String,
}

impl LayoutEntry {
    fn resolve(field: FieldDescriptor, position: u64) -> Result<Self, LayoutError> {
        let FieldDescriptor {
            line,
            offset,
            ty,
            name,
            array_length,
            description,
        } = field;
        let ty = match ty {
            TypeRef::Primitive(p) => p,
            TypeRef::Unresolved(spelling) => {
                return Err(LayoutError::UnknownType {
                    line,
                    name,
                    spelling,
                })
            }
        };
        if !is_field_name(&name) {
            return Err(LayoutError::InvalidName { line, name });
        }
        let length = array_length;
        let Some(array_length) = u64::try_from(length).ok().filter(|n| *n >= 1) else {
            return Err(LayoutError::NonPositiveArrayLength { line, name, length });
        };
        let byte_length = ty
            .byte_width()
            .checked_mul(array_length)
            .filter(|len| *len <= MAX_WIDTH && offset.checked_add(*len).is_some());
        let Some(byte_length) = byte_length else {
            return Err(LayoutError::Overflow { line, name });
        };
        Ok(LayoutEntry {
            line,
            offset,
            position,
            ty,
            name,
            array_length,
            byte_length,
            description,
        })
    }

    /// One past the last byte of the declared range.
    pub fn end(&self) -> u64 {
        self.offset + self.byte_length
    }

    /// One past the last byte the field occupies in the packed record.
    pub fn packed_end(&self) -> u64 {
        self.position + self.byte_length
    }

    /// Arrays of one element are rendered as scalars.
    pub fn is_array(&self) -> bool {
        self.array_length > 1
    }

    /// Single-byte fields read the same in either byte order.
    pub fn is_byte_order_sensitive(&self) -> bool {
        self.ty.byte_width() > 1
    }

    /// Rust type of the field: `u32` or `[u32; 4]`.
    pub fn rust_type(&self) -> String {
        if self.is_array() {
            format!("[{}; {}]", self.ty, self.array_length)
        } else {
            self.ty.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutItem {
    Entry(LayoutEntry),
    /// Section comment kept at its source position.
    Comment { line: usize, text: String },
}

/// All fields of one record, in source order, and its width in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    items: Vec<LayoutItem>,
    total_width: u64,
}

impl RecordLayout {
    /// Build a layout from parsed rows. Blank rows are dropped; comments are kept.
    pub fn build(rows: Vec<TableRow>, options: &LayoutOptions) -> Result<Self, LayoutError> {
        let mut items = Vec::new();
        let mut total_width: u64 = 0;
        let mut names = HashSet::new();

        for row in rows {
            match row {
                TableRow::Blank => {}
                TableRow::Comment { line, text } => items.push(LayoutItem::Comment { line, text }),
                TableRow::Field(field) => {
                    let entry = LayoutEntry::resolve(field, total_width)?;
                    if !names.insert(entry.name.clone()) {
                        return Err(LayoutError::DuplicateName {
                            line: entry.line,
                            name: entry.name,
                        });
                    }
                    total_width = total_width
                        .checked_add(entry.byte_length)
                        .filter(|w| *w <= MAX_WIDTH)
                        .ok_or_else(|| LayoutError::Overflow {
                            line: entry.line,
                            name: entry.name.clone(),
                        })?;
                    items.push(LayoutItem::Entry(entry));
                }
            }
        }

        let layout = RecordLayout { items, total_width };

        match options.offset_check {
            OffsetCheck::Ignore => {}
            OffsetCheck::Warn => {
                for m in lint_layout(&layout) {
                    log::warn!("line {}: {}", m.line, m.message);
                }
            }
            OffsetCheck::Strict => {
                let findings: Vec<_> = lint_layout(&layout)
                    .into_iter()
                    .filter(|m| m.rule.breaks_contiguity())
                    .collect();
                if !findings.is_empty() {
                    return Err(LayoutError::Offsets(findings));
                }
            }
        }

        log::debug!(
            "layout: {} field(s), {} comment(s), {} byte(s)",
            layout.entries().count(),
            layout.comments().count(),
            layout.total_width
        );
        Ok(layout)
    }

    pub fn items(&self) -> &[LayoutItem] {
        &self.items
    }

    pub fn entries(&self) -> impl Iterator<Item = &LayoutEntry> {
        self.items.iter().filter_map(|item| match item {
            LayoutItem::Entry(e) => Some(e),
            LayoutItem::Comment { .. } => None,
        })
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            LayoutItem::Comment { text, .. } => Some(text.as_str()),
            LayoutItem::Entry(_) => None,
        })
    }

    pub fn total_width(&self) -> u64 {
        self.total_width
    }

    pub fn get(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries().find(|e| e.name == name)
    }
}

/// Identifier usable as a struct field (keywords are escaped at emission).
fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(name, "_" | "self" | "Self" | "super" | "crate")
}
