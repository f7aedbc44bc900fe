//! Render a [`RecordLayout`] as Rust source.
//!
//! Output, in order:
//!
//! 1. the structure, one field per entry with its declared byte range, section comments in
//!    place;
//! 2. `impl Name { const WIDTH }` plus `from_native`, which reads every field at its packed
//!    position in native byte order;
//! 3. `From<&[u8; Name::WIDTH]>` for little-endian targets, which is `from_native` as is;
//! 4. `From<&[u8; Name::WIDTH]>` for big-endian targets, which converts every multi-byte
//!    field (each array element separately) with `from_le`. Byte fields are left alone.
//!
//! Rendering is pure: [`emit_layout`] returns a `String`, [`write_layout`] writes into any
//! [`fmt::Write`] sink.

use crate::layout::{LayoutEntry, LayoutItem, RecordLayout};
use std::fmt::{self, Write};

/// Visibility of the generated structure, its fields and `WIDTH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Private,
    #[default]
    Crate,
    Public,
}

impl Visibility {
    fn prefix(self) -> &'static str {
        match self {
            Visibility::Private => "",
            Visibility::Crate => "pub(crate) ",
            Visibility::Public => "pub ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub visibility: Visibility,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Optional line written as a `//` comment above everything else.
    pub header: Option<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            visibility: Visibility::Crate,
            indent: 2,
            header: None,
        }
    }
}

/// Render the layout as Rust source for a structure called `struct_name`.
pub fn emit_layout(layout: &RecordLayout, struct_name: &str, options: &EmitOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_layout(&mut out, layout, struct_name, options);
    out
}

/// Render the layout into `out`.
pub fn write_layout<W: Write>(
    out: &mut W,
    layout: &RecordLayout,
    struct_name: &str,
    options: &EmitOptions,
) -> fmt::Result {
    let e = Emitter {
        layout,
        name: struct_name,
        vis: options.visibility.prefix(),
        unit: " ".repeat(options.indent),
    };
    if let Some(header) = &options.header {
        for line in header.lines() {
            writeln!(out, "// {}", line)?;
        }
        writeln!(out)?;
    }
    e.write_struct(out)?;
    writeln!(out)?;
    e.write_width_and_native(out)?;
    writeln!(out)?;
    e.write_from_impl(out)
}

struct Emitter<'a> {
    layout: &'a RecordLayout,
    name: &'a str,
    vis: &'static str,
    unit: String,
}

impl Emitter<'_> {
    fn pad(&self, depth: usize) -> String {
        self.unit.repeat(depth)
    }

    fn write_struct<W: Write>(&self, out: &mut W) -> fmt::Result {
        let pad = self.pad(1);
        writeln!(out, "#[derive(Debug, Clone, Copy, PartialEq, Eq)]")?;
        writeln!(out, "{}struct {} {{", self.vis, self.name)?;
        let mut blank_before_field = false;
        for (i, item) in self.layout.items().iter().enumerate() {
            match item {
                LayoutItem::Comment { text, .. } => {
                    if i > 0 {
                        writeln!(out)?;
                    }
                    writeln!(out, "{}// {}", pad, text)?;
                    blank_before_field = true;
                }
                LayoutItem::Entry(entry) => {
                    if blank_before_field {
                        writeln!(out)?;
                        blank_before_field = false;
                    }
                    if !entry.description.is_empty() {
                        writeln!(out, "{}/// {}", pad, entry.description)?;
                    }
                    writeln!(
                        out,
                        "{}{}{}: {}, // {} - {}",
                        pad,
                        self.vis,
                        field_ident(&entry.name),
                        entry.rust_type(),
                        entry.offset,
                        entry.end()
                    )?;
                }
            }
        }
        writeln!(out, "}}")
    }

    fn write_width_and_native<W: Write>(&self, out: &mut W) -> fmt::Result {
        let (p1, p2, p3) = (self.pad(1), self.pad(2), self.pad(3));
        writeln!(out, "impl {} {{", self.name)?;
        writeln!(
            out,
            "{}{}const WIDTH: usize = {};",
            p1,
            self.vis,
            self.layout.total_width()
        )?;
        writeln!(out)?;
        writeln!(out, "{}/// Reads every field at its packed position in native byte order.", p1)?;
        writeln!(out, "{}fn from_native(block: &[u8; Self::WIDTH]) -> Self {{", p1)?;
        if self.layout.entries().next().is_none() {
            writeln!(out, "{}let _ = block;", p2)?;
            writeln!(out, "{}Self {{}}", p2)?;
        } else {
            writeln!(out, "{}Self {{", p2)?;
            for entry in self.layout.entries() {
                writeln!(
                    out,
                    "{}{}: {},",
                    p3,
                    field_ident(&entry.name),
                    native_read(entry)
                )?;
            }
            writeln!(out, "{}}}", p2)?;
        }
        writeln!(out, "{}}}", p1)?;
        writeln!(out, "}}")
    }

    fn write_from_impl<W: Write>(&self, out: &mut W) -> fmt::Result {
        let (p1, p2, p3) = (self.pad(1), self.pad(2), self.pad(3));
        writeln!(out, "impl From<&[u8; {}::WIDTH]> for {} {{", self.name, self.name)?;

        writeln!(out, "{}#[cfg(target_endian = \"little\")]", p1)?;
        writeln!(out, "{}fn from(block: &[u8; Self::WIDTH]) -> Self {{", p1)?;
        writeln!(out, "{}Self::from_native(block)", p2)?;
        writeln!(out, "{}}}", p1)?;
        writeln!(out)?;

        writeln!(out, "{}#[cfg(target_endian = \"big\")]", p1)?;
        writeln!(out, "{}fn from(block: &[u8; Self::WIDTH]) -> Self {{", p1)?;
        let swapped: Vec<&LayoutEntry> = self
            .layout
            .entries()
            .filter(|e| e.is_byte_order_sensitive())
            .collect();
        if swapped.is_empty() {
            writeln!(out, "{}Self::from_native(block)", p2)?;
        } else {
            writeln!(out, "{}let mut raw = Self::from_native(block);", p2)?;
            for entry in swapped {
                let field = field_ident(&entry.name);
                if entry.is_array() {
                    writeln!(out, "{}raw.{} = [", p2, field)?;
                    for i in 0..entry.array_length {
                        writeln!(out, "{}{}::from_le(raw.{}[{}]),", p3, entry.ty, field, i)?;
                    }
                    writeln!(out, "{}];", p2)?;
                } else {
                    writeln!(out, "{}raw.{} = {}::from_le(raw.{});", p2, field, entry.ty, field)?;
                }
            }
            writeln!(out, "{}raw", p2)?;
        }
        writeln!(out, "{}}}", p1)?;
        writeln!(out, "}}")
    }
}

/// Expression reading `entry` out of `block` at its packed position.
fn native_read(entry: &LayoutEntry) -> String {
    let width = entry.ty.byte_width();
    if entry.is_array() {
        let at = match (entry.position, width) {
            (0, 1) => "i".to_string(),
            (0, w) => format!("i * {}", w),
            (o, 1) => format!("{} + i", o),
            (o, w) => format!("{} + i * {}", o, w),
        };
        if width == 1 {
            format!("core::array::from_fn(|i| block[{}])", at)
        } else {
            let bytes = (0..width)
                .map(|b| match b {
                    0 => "block[at]".to_string(),
                    b => format!("block[at + {}]", b),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "core::array::from_fn(|i| {{ let at = {}; {}::from_ne_bytes([{}]) }})",
                at, entry.ty, bytes
            )
        }
    } else if width == 1 {
        format!("block[{}]", entry.position)
    } else {
        let bytes = (entry.position..entry.packed_end())
            .map(|b| format!("block[{}]", b))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}::from_ne_bytes([{}])", entry.ty, bytes)
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Field name as a Rust identifier; keywords become raw identifiers.
fn field_ident(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}
