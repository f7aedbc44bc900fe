//! # rawlayout: field tables to byte-exact Rust records
//!
//! Compiles a tab-separated description of a fixed-size on-disk or on-wire record into a
//! Rust structure, a width constant, and `From<&[u8; WIDTH]>` constructors for both byte
//! orders. The tables are the kind found in kernel header documentation: little-endian
//! hex offsets and `__le32`-style types.
//!
//! ## Pipeline
//!
//! - [parser]: table text → [`TableRow`]s (fields, section comments, blanks)
//! - [layout]: rows → [`RecordLayout`] (byte lengths, total width, offset checks)
//! - [emit]: layout → Rust source
//!
//! [lint] reports gaps, overlaps and misaligned fields; [codec] decodes raw records with a
//! layout at runtime, and [dump] prints them.
//!
//! ## Table format
//!
//! ```text
//! 0	__le32	s_inodes_count	Total inode count.
//! 4	__le32	s_blocks_count_lo	Total block count.
//! 			These fields are for EXT4_DYNAMIC_REV superblocks only.
//! 68	__u8	s_uuid[16]	128-bit UUID for volume.
//! ```
//!
//! Cells are offset (hex), type, name (`[n]` suffix for arrays), description. A row
//! with no name and a description is a section comment.
//!
//! ## Usage
//!
//! ```
//! use rawlayout::{compile, CompileOptions};
//!
//! let src = "0\t__le32\tcounter\tpacket counter\n4\tchar\ttag[8]\tASCII tag\n";
//! let code = compile("Packet", src, &CompileOptions::default()).unwrap();
//! assert!(code.contains("pub(crate) const WIDTH: usize = 12;"));
//! ```

pub mod ast;
pub mod codec;
pub mod dump;
pub mod emit;
pub mod layout;
pub mod lint;
pub mod parser;
pub mod value;

use std::path::Path;

pub use ast::{FieldDescriptor, PrimitiveType, TableRow, TypeRef};
pub use codec::{Codec, CodecError, DecodedField, Endianness};
pub use emit::{emit_layout, write_layout, EmitOptions, Visibility};
pub use layout::{LayoutEntry, LayoutError, LayoutItem, LayoutOptions, OffsetCheck, RecordLayout};
pub use lint::{lint_layout, lint_source, LintMessage, LintRule, Severity};
pub use parser::{parse_table, ParseError};
pub use value::Value;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Parse: {0}")]
    Parse(#[from] ParseError),
    #[error("Layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub layout: LayoutOptions,
    pub emit: EmitOptions,
}

/// Parse a table and build its layout.
pub fn load_layout(source: &str, options: &LayoutOptions) -> Result<RecordLayout, CompileError> {
    let rows = parse_table(source)?;
    Ok(RecordLayout::build(rows, options)?)
}

/// Compile table text into Rust source for `struct_name`. Nothing is returned on error.
pub fn compile(
    struct_name: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    let layout = load_layout(source, &options.layout)?;
    Ok(emit_layout(&layout, struct_name, &options.emit))
}

/// [`compile`] a table read from `path`.
pub fn compile_file(
    struct_name: &str,
    path: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    let source = std::fs::read_to_string(path)?;
    compile(struct_name, &source, options)
}
