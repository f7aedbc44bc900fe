//! Decode/encode raw records through a [`RecordLayout`].
//!
//! This is the runtime counterpart of the generated constructors: every field is read from
//! (or written to) its packed position in the configured byte order, array elements in
//! index order.

use crate::ast::PrimitiveType;
use crate::layout::{LayoutEntry, RecordLayout};
use crate::value::Value;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    /// Byte order of the target this crate was built for.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Record needs {need} byte(s), buffer has {have}")]
    TooShort { need: u64, have: usize },
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Field `{name}` expects {expected}, got {found:?}")]
    TypeMismatch {
        name: String,
        expected: String,
        found: Value,
    },
}

/// One decoded field and the bytes it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub name: String,
    pub value: Value,
    pub byte_range: (u64, u64),
}

#[derive(Debug)]
pub struct Codec {
    pub endianness: Endianness,
    layout: RecordLayout,
}

impl Codec {
    pub fn new(layout: RecordLayout, endianness: Endianness) -> Self {
        Codec { endianness, layout }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Decode one record from the start of `bytes`. Extra trailing bytes are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<DecodedField>, CodecError> {
        let need = self.layout.total_width();
        if (bytes.len() as u64) < need {
            return Err(CodecError::TooShort {
                need,
                have: bytes.len(),
            });
        }
        let record = &bytes[..need as usize];
        self.layout
            .entries()
            .map(|e| -> Result<DecodedField, CodecError> {
                Ok(DecodedField {
                    name: e.name.clone(),
                    value: self.decode_entry(record, e)?,
                    byte_range: (e.position, e.packed_end()),
                })
            })
            .collect()
    }

    /// Encode one record. Every field must be present; bytes no field covers stay zero.
    pub fn encode(&self, values: &HashMap<String, Value>) -> Result<Vec<u8>, CodecError> {
        let mut out = vec![0u8; self.layout.total_width() as usize];
        for e in self.layout.entries() {
            let v = values
                .get(&e.name)
                .ok_or_else(|| CodecError::MissingField(e.name.clone()))?;
            let mut w = Cursor::new(&mut out[e.position as usize..e.packed_end() as usize]);
            if e.is_array() {
                let elems = v
                    .as_array()
                    .filter(|a| a.len() as u64 == e.array_length)
                    .ok_or_else(|| mismatch(e, v))?;
                for elem in elems {
                    self.encode_base(&mut w, e, elem)?;
                }
            } else {
                self.encode_base(&mut w, e, v)?;
            }
        }
        Ok(out)
    }

    fn decode_entry(&self, record: &[u8], e: &LayoutEntry) -> Result<Value, CodecError> {
        let mut r = Cursor::new(&record[e.position as usize..e.packed_end() as usize]);
        if e.is_array() {
            let elems = (0..e.array_length)
                .map(|_| self.decode_base(&mut r, e.ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(elems))
        } else {
            self.decode_base(&mut r, e.ty)
        }
    }

    fn decode_base(&self, r: &mut Cursor<&[u8]>, ty: PrimitiveType) -> Result<Value, CodecError> {
        Ok(match ty {
            PrimitiveType::U8 => Value::U8(r.read_u8()?),
            PrimitiveType::U16 => Value::U16(self.read_u16(r)?),
            PrimitiveType::U32 => Value::U32(self.read_u32(r)?),
            PrimitiveType::U64 => Value::U64(self.read_u64(r)?),
        })
    }

    fn encode_base(
        &self,
        w: &mut Cursor<&mut [u8]>,
        e: &LayoutEntry,
        v: &Value,
    ) -> Result<(), CodecError> {
        match (e.ty, v) {
            (PrimitiveType::U8, Value::U8(x)) => w.write_u8(*x)?,
            (PrimitiveType::U16, Value::U16(x)) => match self.endianness {
                Endianness::Big => w.write_u16::<BigEndian>(*x)?,
                Endianness::Little => w.write_u16::<LittleEndian>(*x)?,
            },
            (PrimitiveType::U32, Value::U32(x)) => match self.endianness {
                Endianness::Big => w.write_u32::<BigEndian>(*x)?,
                Endianness::Little => w.write_u32::<LittleEndian>(*x)?,
            },
            (PrimitiveType::U64, Value::U64(x)) => match self.endianness {
                Endianness::Big => w.write_u64::<BigEndian>(*x)?,
                Endianness::Little => w.write_u64::<LittleEndian>(*x)?,
            },
            _ => return Err(mismatch(e, v)),
        }
        Ok(())
    }

    fn read_u16(&self, r: &mut Cursor<&[u8]>) -> Result<u16, CodecError> {
        Ok(match self.endianness {
            Endianness::Big => r.read_u16::<BigEndian>()?,
            Endianness::Little => r.read_u16::<LittleEndian>()?,
        })
    }
    fn read_u32(&self, r: &mut Cursor<&[u8]>) -> Result<u32, CodecError> {
        Ok(match self.endianness {
            Endianness::Big => r.read_u32::<BigEndian>()?,
            Endianness::Little => r.read_u32::<LittleEndian>()?,
        })
    }
    fn read_u64(&self, r: &mut Cursor<&[u8]>) -> Result<u64, CodecError> {
        Ok(match self.endianness {
            Endianness::Big => r.read_u64::<BigEndian>()?,
            Endianness::Little => r.read_u64::<LittleEndian>()?,
        })
    }
}

fn mismatch(e: &LayoutEntry, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        name: e.name.clone(),
        expected: e.rust_type(),
        found: found.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutOptions, OffsetCheck};
    use crate::parser::parse_table;

    const TABLE: &str = "0\t__le32\tcounter\t\n4\tchar\ttag[4]\t\n8\t__le16\tpair[2]\t\n";

    fn codec(endianness: Endianness) -> Codec {
        let layout = RecordLayout::build(
            parse_table(TABLE).expect("parse"),
            &LayoutOptions {
                offset_check: OffsetCheck::Strict,
            },
        )
        .expect("build");
        Codec::new(layout, endianness)
    }

    const RECORD: [u8; 12] = [0x04, 0x03, 0x02, 0x01, b'e', b'x', b't', b'4', 0x34, 0x12, 0x01, 0x00];

    #[test]
    fn decode_little_endian() {
        let fields = codec(Endianness::Little).decode(&RECORD).expect("decode");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].value, Value::U32(0x0102_0304));
        assert_eq!(fields[0].byte_range, (0, 4));
        assert_eq!(fields[1].value.as_bytes(), Some(b"ext4".to_vec()));
        assert_eq!(
            fields[2].value,
            Value::Array(vec![Value::U16(0x1234), Value::U16(0x0001)])
        );
    }

    #[test]
    fn decode_big_endian_swaps_only_wide_fields() {
        let fields = codec(Endianness::Big).decode(&RECORD).expect("decode");
        assert_eq!(fields[0].value, Value::U32(0x0403_0201));
        assert_eq!(fields[1].value.as_bytes(), Some(b"ext4".to_vec()));
        assert_eq!(
            fields[2].value,
            Value::Array(vec![Value::U16(0x3412), Value::U16(0x0100)])
        );
    }

    #[test]
    fn native_order_matches_target() {
        let c = codec(Endianness::native());
        let fields = c.decode(&RECORD).expect("decode");
        let counter = u32::from_ne_bytes([RECORD[0], RECORD[1], RECORD[2], RECORD[3]]);
        assert_eq!(fields[0].value, Value::U32(counter));
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(matches!(
            codec(Endianness::Little).decode(&RECORD[..11]),
            Err(CodecError::TooShort { need: 12, have: 11 })
        ));
    }

    #[test]
    fn encode_reproduces_record() {
        let c = codec(Endianness::Little);
        let values: HashMap<_, _> = c
            .decode(&RECORD)
            .expect("decode")
            .into_iter()
            .map(|f| (f.name, f.value))
            .collect();
        assert_eq!(c.encode(&values).expect("encode"), RECORD);
    }

    #[test]
    fn encode_checks_types_and_presence() {
        let c = codec(Endianness::Little);
        let mut values = HashMap::new();
        values.insert("counter".to_string(), Value::U16(1));
        assert!(matches!(c.encode(&values), Err(CodecError::TypeMismatch { .. })));

        values.insert("counter".to_string(), Value::U32(1));
        assert!(matches!(c.encode(&values), Err(CodecError::MissingField(name)) if name == "tag"));

        values.insert("tag".to_string(), Value::Array(vec![Value::U8(0); 3]));
        assert!(matches!(c.encode(&values), Err(CodecError::TypeMismatch { name, .. }) if name == "tag"));
    }
}
