//! Row model for field tables: what the parser produces and the layout builder consumes.

use std::fmt;

/// One classified line of a field table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Field(FieldDescriptor),
    /// Section comment: documentation only, contributes no bytes.
    Comment { line: usize, text: String },
    Blank,
}

/// A single field row: `offset<TAB>type<TAB>name[len]<TAB>description`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// 1-based source line.
    pub line: usize,
    pub offset: u64,
    pub ty: TypeRef,
    pub name: String,
    /// Element count as written; 1 when the name has no `[n]` suffix. Counts below 1 are
    /// kept so the layout builder can reject them.
    pub array_length: i64,
    pub description: String,
}

/// Field type as written in the table, normalized when the spelling is known.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Unresolved(String),
}

impl TypeRef {
    pub fn from_spelling(spelling: &str) -> Self {
        match PrimitiveType::from_spelling(spelling) {
            Some(p) => TypeRef::Primitive(p),
            None => TypeRef::Unresolved(spelling.to_string()),
        }
    }
}

/// Canonical unsigned integer widths a record field may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    U8,
    U16,
    U32,
    U64,
}

/// Every recognised source spelling and its canonical width.
///
/// Kernel headers write little-endian fields as `__le16`/`__le32`/`__le64` and
/// host-order fields as `__u8`.. `__u64`; `char` arrays hold raw bytes.
const SPELLINGS: &[(&str, PrimitiveType)] = &[
    ("u8", PrimitiveType::U8),
    ("__u8", PrimitiveType::U8),
    ("__le8", PrimitiveType::U8),
    ("uint8_t", PrimitiveType::U8),
    ("char", PrimitiveType::U8),
    ("unsigned char", PrimitiveType::U8),
    ("uchar", PrimitiveType::U8),
    ("byte", PrimitiveType::U8),
    ("u16", PrimitiveType::U16),
    ("__u16", PrimitiveType::U16),
    ("__le16", PrimitiveType::U16),
    ("le16", PrimitiveType::U16),
    ("uint16_t", PrimitiveType::U16),
    ("u32", PrimitiveType::U32),
    ("__u32", PrimitiveType::U32),
    ("__le32", PrimitiveType::U32),
    ("le32", PrimitiveType::U32),
    ("uint32_t", PrimitiveType::U32),
    ("u64", PrimitiveType::U64),
    ("__u64", PrimitiveType::U64),
    ("__le64", PrimitiveType::U64),
    ("le64", PrimitiveType::U64),
    ("uint64_t", PrimitiveType::U64),
];

impl PrimitiveType {
    /// Look up a raw type token. Inner whitespace runs are collapsed so
    /// `unsigned  char` matches `unsigned char`.
    pub fn from_spelling(spelling: &str) -> Option<Self> {
        let normalized = spelling.split_whitespace().collect::<Vec<_>>().join(" ");
        SPELLINGS
            .iter()
            .find(|(s, _)| *s == normalized)
            .map(|&(_, p)| p)
    }

    /// All spellings that normalize to this type, in table order.
    pub fn spellings(self) -> impl Iterator<Item = &'static str> {
        SPELLINGS
            .iter()
            .filter(move |(_, p)| *p == self)
            .map(|(s, _)| *s)
    }

    pub fn bits(self) -> u32 {
        match self {
            PrimitiveType::U8 => 8,
            PrimitiveType::U16 => 16,
            PrimitiveType::U32 => 32,
            PrimitiveType::U64 => 64,
        }
    }

    pub fn byte_width(self) -> u64 {
        u64::from(self.bits() / 8)
    }

    /// Rust type name used in generated code.
    pub fn rust_name(self) -> &'static str {
        match self {
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name())
    }
}
