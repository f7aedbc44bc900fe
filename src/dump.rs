//! Format decoded records for display.

use crate::codec::DecodedField;
use crate::value::Value;

/// Scalar as hex with its decimal value: `0xef53 (61267)`.
pub fn format_scalar(v: &Value) -> String {
    match v.as_u64() {
        Some(n) if n < 10 => format!("{}", n),
        Some(n) => format!("{:#x} ({})", n, n),
        None => format_value(v),
    }
}

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// Printable text of a byte array up to its first NUL, if it is all ASCII.
fn ascii_text(b: &[u8]) -> Option<String> {
    let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
    let text = &b[..end];
    if text.is_empty() || !text.iter().all(|c| c.is_ascii_graphic() || *c == b' ') {
        return None;
    }
    if b[end..].iter().any(|&c| c != 0) {
        return None;
    }
    Some(String::from_utf8_lossy(text).into_owned())
}

/// One-line rendering of any value.
pub fn format_value(v: &Value) -> String {
    if let Some(bytes) = v.as_bytes() {
        return match ascii_text(&bytes) {
            Some(text) => format!("{:?} (hex({}))", text, hex_string(&bytes)),
            None => format!("hex({})", hex_string(&bytes)),
        };
    }
    match v {
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(format_scalar).collect::<Vec<_>>().join(", ")
        ),
        _ => format_scalar(v),
    }
}

/// `name = value  [start..end)` per field, names padded to a common width.
pub fn format_record(fields: &[DecodedField]) -> String {
    let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    fields
        .iter()
        .map(|f| {
            format!(
                "{:<width$} = {}  [{}..{})",
                f.name,
                format_value(&f.value),
                f.byte_range.0,
                f.byte_range.1,
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
