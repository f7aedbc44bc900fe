//! Parse field-table text into classified rows using PEST.
//!
//! The parser never rejects a row for its shape: short or partly empty rows degrade to
//! section comments or blanks. Only a bad offset or array-length literal is fatal.

use crate::ast::*;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "table.pest"]
struct TableParser;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: offset {text:?} is not a hexadecimal number")]
    InvalidOffset { line: usize, text: String },
    #[error("line {line}: array length {text:?} is not a decimal number")]
    InvalidArrayLength { line: usize, text: String },
    #[error("Syntax: {0}")]
    Syntax(String),
}

const OFFSET_CELL: usize = 0;
const TYPE_CELL: usize = 1;
const NAME_CELL: usize = 2;
const DESCRIPTION_CELL: usize = 3;

/// Parse a whole table. Rows come back in source order, one per line.
pub fn parse_table(source: &str) -> Result<Vec<TableRow>, ParseError> {
    let table = TableParser::parse(Rule::table, source)
        .map_err(|e| ParseError::Syntax(e.to_string()))?
        .next()
        .ok_or_else(|| ParseError::Syntax("Empty parse".to_string()))?;

    let mut rows = Vec::new();
    for (i, row) in table
        .into_inner()
        .filter(|p| p.as_rule() == Rule::row)
        .enumerate()
    {
        let cells: Vec<&str> = row.into_inner().map(|c| c.as_str().trim()).collect();
        rows.push(build_row(i + 1, &cells)?);
    }

    log::debug!(
        "parsed {} line(s): {} field(s), {} comment(s)",
        rows.len(),
        rows.iter().filter(|r| matches!(r, TableRow::Field(_))).count(),
        rows.iter().filter(|r| matches!(r, TableRow::Comment { .. })).count()
    );
    Ok(rows)
}

fn build_row(line: usize, cells: &[&str]) -> Result<TableRow, ParseError> {
    if cells.iter().all(|c| c.is_empty()) {
        return Ok(TableRow::Blank);
    }
    match (cells.get(NAME_CELL), cells.get(DESCRIPTION_CELL)) {
        (Some(name), _) if !name.is_empty() => build_field(line, cells).map(TableRow::Field),
        // A nameless row cut short before the description column, such as free text
        // pasted between table rows, keeps its first cell as the comment.
        (_, None) if !cells[OFFSET_CELL].is_empty() => Ok(TableRow::Comment {
            line,
            text: cells[OFFSET_CELL].to_string(),
        }),
        (_, None) => Ok(TableRow::Blank),
        (_, Some(_)) => {
            let description = description(cells);
            if description.is_empty() {
                Ok(TableRow::Blank)
            } else {
                Ok(TableRow::Comment { line, text: description })
            }
        }
    }
}

fn build_field(line: usize, cells: &[&str]) -> Result<FieldDescriptor, ParseError> {
    let offset = parse_offset(line, cells[OFFSET_CELL])?;
    let ty = TypeRef::from_spelling(cells.get(TYPE_CELL).copied().unwrap_or_default());
    let (name, array_length) = parse_name(line, cells[NAME_CELL])?;
    Ok(FieldDescriptor {
        line,
        offset,
        ty,
        name,
        array_length,
        description: description(cells),
    })
}

/// Description cell; stray tabs inside a description split it, so later cells are joined back.
fn description(cells: &[&str]) -> String {
    cells
        .get(DESCRIPTION_CELL..)
        .unwrap_or_default()
        .iter()
        .filter(|c| !c.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hexadecimal offset, with or without a `0x` prefix.
fn parse_offset(line: usize, text: &str) -> Result<u64, ParseError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidOffset {
        line,
        text: text.to_string(),
    })
}

/// Split `name[len]` into the bare name and its element count (1 without a suffix).
fn parse_name(line: usize, raw: &str) -> Result<(String, i64), ParseError> {
    let pair = TableParser::parse(Rule::field_name, raw)
        .map_err(|e| ParseError::Syntax(e.to_string()))?
        .next()
        .ok_or_else(|| ParseError::Syntax("Empty field name".to_string()))?;

    let mut name = raw;
    let mut array_length = 1;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::base_name => name = inner.as_str().trim(),
            Rule::array_suffix => {
                let text = inner
                    .into_inner()
                    .next()
                    .map(|p| p.as_str())
                    .unwrap_or_default();
                array_length =
                    text.trim()
                        .parse::<i64>()
                        .map_err(|_| ParseError::InvalidArrayLength {
                            line,
                            text: text.to_string(),
                        })?;
            }
            _ => {}
        }
    }
    Ok((name.to_string(), array_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_field(rows: Vec<TableRow>) -> FieldDescriptor {
        let mut fields: Vec<_> = rows
            .into_iter()
            .filter_map(|r| match r {
                TableRow::Field(f) => Some(f),
                _ => None,
            })
            .collect();
        assert_eq!(fields.len(), 1, "expected exactly one field");
        fields.remove(0)
    }

    #[test]
    fn scalar_le32_row() {
        let f = only_field(parse_table("0\t__le32\tcounter\tpacket counter").expect("parse"));
        assert_eq!(f.offset, 0);
        assert_eq!(f.ty, TypeRef::Primitive(PrimitiveType::U32));
        assert_eq!(f.name, "counter");
        assert_eq!(f.array_length, 1);
        assert_eq!(f.description, "packet counter");
        assert_eq!(f.line, 1);
    }

    #[test]
    fn char_array_row() {
        let f = only_field(parse_table("4\tchar\ttag[8]\tASCII tag").expect("parse"));
        assert_eq!(f.offset, 4);
        assert_eq!(f.ty, TypeRef::Primitive(PrimitiveType::U8));
        assert_eq!(f.name, "tag");
        assert_eq!(f.array_length, 8);
    }

    #[test]
    fn offset_is_hex() {
        let f = only_field(parse_table("1A\t__le16\tx\t").expect("parse"));
        assert_eq!(f.offset, 0x1a);
        let f = only_field(parse_table("0x100\t__le16\tx\t").expect("parse"));
        assert_eq!(f.offset, 0x100);
    }

    #[test]
    fn description_only_row_is_comment() {
        let rows = parse_table("\t\t\tThese fields are for dynamic revisions only.").expect("parse");
        assert_eq!(
            rows,
            vec![TableRow::Comment {
                line: 1,
                text: "These fields are for dynamic revisions only.".to_string()
            }]
        );
    }

    #[test]
    fn single_cell_free_text_is_comment() {
        let rows = parse_table("Note: the difference between compat and incompat").expect("parse");
        assert!(matches!(&rows[0], TableRow::Comment { text, .. } if text.starts_with("Note:")));
    }

    #[test]
    fn blank_and_empty_cell_rows_are_skipped() {
        let rows = parse_table("\n\t\t\t\n   \n").expect("parse");
        assert!(rows.iter().all(|r| *r == TableRow::Blank));
    }

    #[test]
    fn missing_description_is_empty() {
        let f = only_field(parse_table("8\t__le64\tstamp").expect("parse"));
        assert_eq!(f.description, "");
        assert_eq!(f.ty, TypeRef::Primitive(PrimitiveType::U64));
    }

    #[test]
    fn tabs_inside_description_are_joined() {
        let f = only_field(parse_table("0\tu8\tflags\tsee\ttable 3").expect("parse"));
        assert_eq!(f.description, "see table 3");
    }

    #[test]
    fn unknown_type_is_kept_unresolved() {
        let f = only_field(parse_table("0\t__be32\tx\t").expect("parse"));
        assert_eq!(f.ty, TypeRef::Unresolved("__be32".to_string()));
    }

    #[test]
    fn crlf_line_endings() {
        let rows = parse_table("0\t__le16\ta\t\r\n2\t__le16\tb\t\r\n").expect("parse");
        let names: Vec<_> = rows
            .iter()
            .filter_map(|r| match r {
                TableRow::Field(f) => Some(f.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn line_numbers_count_blank_lines() {
        let rows = parse_table("\n\n0\tu8\tx\t").expect("parse");
        match &rows[2] {
            TableRow::Field(f) => assert_eq!(f.line, 3),
            other => panic!("expected field, got {:?}", other),
        }
    }

    #[test]
    fn malformed_offset_is_fatal() {
        let err = parse_table("0\tu8\ta\t\nzz\t__le32\tb\t").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidOffset {
                line: 2,
                text: "zz".to_string()
            }
        );
    }

    #[test]
    fn empty_offset_on_field_row_is_fatal() {
        assert!(matches!(
            parse_table("\t__le32\tb\t"),
            Err(ParseError::InvalidOffset { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_array_length_is_fatal() {
        assert!(matches!(
            parse_table("0\t__le16\tx[four]\t"),
            Err(ParseError::InvalidArrayLength { line: 1, ref text }) if text == "four"
        ));
        assert!(matches!(
            parse_table("0\t__le16\tx[]\t"),
            Err(ParseError::InvalidArrayLength { .. })
        ));
    }

    #[test]
    fn bracket_not_at_end_is_part_of_name() {
        let f = only_field(parse_table("0\tu8\ta[2]b\t").expect("parse"));
        assert_eq!(f.name, "a[2]b");
        assert_eq!(f.array_length, 1);
    }

    #[test]
    fn non_positive_array_lengths_parse() {
        // rejected later by the layout builder
        let f = only_field(parse_table("0\tu8\tpad[0]\t").expect("parse"));
        assert_eq!(f.array_length, 0);
        let f = only_field(parse_table("0\tu16\tx[-1]\t").expect("parse"));
        assert_eq!(f.name, "x");
        assert_eq!(f.array_length, -1);
    }

    #[test]
    fn nameless_row_without_description_keeps_offset_as_comment() {
        assert_eq!(
            parse_table("10\tu8\t").expect("parse"),
            vec![TableRow::Comment {
                line: 1,
                text: "10".to_string()
            }]
        );
        assert_eq!(
            parse_table("10\tu8\t\t").expect("parse"),
            vec![TableRow::Blank]
        );
        assert_eq!(parse_table("\tu8\t").expect("parse"), vec![TableRow::Blank]);
    }
}
