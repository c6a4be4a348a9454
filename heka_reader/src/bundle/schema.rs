//! Declarative fixed-layout record descriptions.
//!
//! A [`Schema`] lists the fields of one packed binary record in file order.
//! Field widths are fixed, so the packed size of a schema is known at compile
//! time; [`crate::bundle::layouts`] asserts every declared `required_size`
//! with `const` checks, and [`Schema::validate`] repeats the check when a
//! stream registers its level table.

use serde::Serialize;

use super::error::{BundleError, Result};

/// Byte order of a record or stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Tag at the start of a little-endian tree stream ("Tree" reversed).
    pub const LITTLE_TAG: [u8; 4] = *b"eerT";
    /// Tag at the start of a big-endian tree stream.
    pub const BIG_TAG: [u8; 4] = *b"Tree";

    /// Detect the byte order from a stream's four-byte tag.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        if tag == Self::LITTLE_TAG {
            Some(Endian::Little)
        } else if tag == Self::BIG_TAG {
            Some(Endian::Big)
        } else {
            None
        }
    }

    pub fn tag(self) -> [u8; 4] {
        match self {
            Endian::Little => Self::LITTLE_TAG,
            Endian::Big => Self::BIG_TAG,
        }
    }
}

/// Primitive field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prim {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
    Bool,
    /// One raw byte (Pascal `CHAR`/`BYTE`).
    Char,
}

impl Prim {
    pub const fn width(self) -> usize {
        match self {
            Prim::I8 | Prim::U8 | Prim::Bool | Prim::Char => 1,
            Prim::I16 | Prim::U16 => 2,
            Prim::I32 | Prim::U32 | Prim::F32 => 4,
            Prim::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Prim(Prim),
    PrimArray(Prim, usize),
    /// Fixed-length byte or character run.
    Bytes(usize),
    Nested(&'static Schema),
    NestedArray(&'static Schema, usize),
}

impl FieldKind {
    pub const fn width(&self) -> usize {
        match *self {
            FieldKind::Prim(prim) => prim.width(),
            FieldKind::PrimArray(prim, count) => prim.width() * count,
            FieldKind::Bytes(len) => len,
            FieldKind::Nested(schema) => schema.packed_size(),
            FieldKind::NestedArray(schema, count) => schema.packed_size() * count,
        }
    }
}

/// Post-processing applied to a decoded field value.
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    Raw,
    /// NUL-terminated text; bytes after the first NUL are dropped.
    CStr,
    /// Bit `i` of an integer becomes the flag named `names[i]`.
    Flags(&'static [&'static str]),
    /// Byte code `i` becomes `names[i]`; codes outside the table render as `Unknown(i)`.
    Named(&'static [&'static str]),
    /// Consume the bytes but leave the field out of the record.
    Omit,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub transform: Transform,
}

impl Field {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Field {
            name,
            kind,
            transform: Transform::Raw,
        }
    }

    pub const fn with(self, transform: Transform) -> Self {
        Field { transform, ..self }
    }

    pub const fn omit(self) -> Self {
        self.with(Transform::Omit)
    }

    pub const fn i16(name: &'static str) -> Self {
        Self::new(name, FieldKind::Prim(Prim::I16))
    }

    pub const fn u16(name: &'static str) -> Self {
        Self::new(name, FieldKind::Prim(Prim::U16))
    }

    pub const fn i32(name: &'static str) -> Self {
        Self::new(name, FieldKind::Prim(Prim::I32))
    }

    pub const fn f64(name: &'static str) -> Self {
        Self::new(name, FieldKind::Prim(Prim::F64))
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Prim(Prim::Bool))
    }

    pub const fn byte(name: &'static str) -> Self {
        Self::new(name, FieldKind::Prim(Prim::Char))
    }

    pub const fn f64s(name: &'static str, count: usize) -> Self {
        Self::new(name, FieldKind::PrimArray(Prim::F64, count))
    }

    pub const fn i16s(name: &'static str, count: usize) -> Self {
        Self::new(name, FieldKind::PrimArray(Prim::I16, count))
    }

    pub const fn bytes(name: &'static str, len: usize) -> Self {
        Self::new(name, FieldKind::Bytes(len))
    }

    /// Fixed-length text, trimmed at the first NUL.
    pub const fn text(name: &'static str, len: usize) -> Self {
        Self::bytes(name, len).with(Transform::CStr)
    }

    pub const fn nested(name: &'static str, schema: &'static Schema) -> Self {
        Self::new(name, FieldKind::Nested(schema))
    }

    pub const fn nested_array(name: &'static str, schema: &'static Schema, count: usize) -> Self {
        Self::new(name, FieldKind::NestedArray(schema, count))
    }

    pub const fn width(&self) -> usize {
        self.kind.width()
    }
}

/// A packed record layout.
#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub required_size: usize,
    pub fields: &'static [Field],
}

impl Schema {
    pub const fn new(name: &'static str, required_size: usize, fields: &'static [Field]) -> Self {
        Schema {
            name,
            required_size,
            fields,
        }
    }

    /// Sum of all field widths.
    ///
    /// Records are packed without alignment padding, so the same sum holds
    /// for the little- and big-endian layouts.
    pub const fn packed_size(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.fields.len() {
            total += self.fields[i].width();
            i += 1;
        }
        total
    }

    /// Packed size when laid out in `endian` byte order.
    pub const fn packed_size_in(&self, endian: Endian) -> usize {
        match endian {
            Endian::Little | Endian::Big => self.packed_size(),
        }
    }

    pub const fn is_consistent(&self) -> bool {
        self.packed_size_in(Endian::Little) == self.required_size
            && self.packed_size_in(Endian::Big) == self.required_size
    }

    /// Check the size contract of this schema and every nested schema.
    pub fn validate(&self) -> Result<()> {
        if !self.is_consistent() {
            return Err(BundleError::SchemaSizeMismatch {
                schema: self.name,
                required: self.required_size,
                little: self.packed_size_in(Endian::Little),
                big: self.packed_size_in(Endian::Big),
            });
        }

        for field in self.fields {
            match field.kind {
                FieldKind::Nested(schema) | FieldKind::NestedArray(schema, _) => {
                    schema.validate()?
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Byte offset of a top-level field from the start of the record.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        let mut offset = 0;
        for field in self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.width();
        }
        None
    }
}
