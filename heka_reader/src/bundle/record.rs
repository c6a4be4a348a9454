//! Decoded records and the schema-driven decoder.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Serialize, Serializer};

use super::error::{BundleError, Result};
use super::schema::{Endian, FieldKind, Prim, Schema, Transform};

/// Named bits decoded from an integer field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flags(Vec<(&'static str, bool)>);

impl Flags {
    pub fn from_bits(names: &'static [&'static str], bits: i64) -> Self {
        Flags(
            names
                .iter()
                .enumerate()
                .map(|(bit, name)| (*name, (bits >> bit) & 1 == 1))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<bool> {
        self.0
            .iter()
            .find(|(flag, _)| *flag == name)
            .map(|(_, set)| *set)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.0.iter().copied()
    }
}

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, set)| (*name, *set)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Byte(u8),
    Text(String),
    Bytes(Vec<u8>),
    Flags(Flags),
    Array(Vec<Value>),
    Record(Record),
    Records(Vec<Record>),
}

impl Value {
    fn as_code(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            Value::Byte(v) => Some(i64::from(v)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => {
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Flags(flags) => {
                write!(f, "{{")?;
                for (i, (name, set)) in flags.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {set}")?;
                }
                write!(f, "}}")
            }
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Value::Record(record) => write!(f, "{}(..)", record.schema_name()),
            Value::Records(records) => match records.first() {
                Some(first) => write!(f, "[{} x {}]", records.len(), first.schema_name()),
                None => write!(f, "[]"),
            },
        }
    }
}

/// A decoded record: the schema name plus its non-omitted fields in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(name, value)| (*name, value)))
    }
}

impl Record {
    pub fn schema_name(&self) -> &'static str {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(name, value)| (*name, value))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| BundleError::FieldMissing {
            record: self.schema,
            field: name.to_string(),
        })
    }

    fn wrong_type(&self, name: &str, expected: &'static str) -> BundleError {
        BundleError::FieldType {
            record: self.schema,
            field: name.to_string(),
            expected,
        }
    }

    pub fn i64(&self, name: &str) -> Result<i64> {
        self.require(name)?
            .as_code()
            .ok_or_else(|| self.wrong_type(name, "an integer"))
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        match *self.require(name)? {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::UInt(v) => Ok(v as f64),
            _ => Err(self.wrong_type(name, "a number")),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            Value::Text(text) => Ok(text),
            _ => Err(self.wrong_type(name, "text")),
        }
    }

    pub fn byte(&self, name: &str) -> Result<u8> {
        match *self.require(name)? {
            Value::Byte(v) => Ok(v),
            _ => Err(self.wrong_type(name, "a byte")),
        }
    }

    /// Truthiness of a bool, byte or integer field; any non-zero value is set.
    pub fn is_set(&self, name: &str) -> Result<bool> {
        match *self.require(name)? {
            Value::Bool(v) => Ok(v),
            Value::Byte(v) => Ok(v != 0),
            Value::Int(v) => Ok(v != 0),
            Value::UInt(v) => Ok(v != 0),
            _ => Err(self.wrong_type(name, "a bool")),
        }
    }

    pub fn flag(&self, name: &str, flag: &str) -> Result<bool> {
        match self.require(name)? {
            Value::Flags(flags) => flags.get(flag).ok_or_else(|| BundleError::FieldMissing {
                record: self.schema,
                field: format!("{name}.{flag}"),
            }),
            _ => Err(self.wrong_type(name, "flags")),
        }
    }

    pub fn record(&self, name: &str) -> Result<&Record> {
        match self.require(name)? {
            Value::Record(record) => Ok(record),
            _ => Err(self.wrong_type(name, "a record")),
        }
    }

    pub fn records(&self, name: &str) -> Result<&[Record]> {
        match self.require(name)? {
            Value::Records(records) => Ok(records),
            _ => Err(self.wrong_type(name, "a record array")),
        }
    }

    pub fn values(&self, name: &str) -> Result<&[Value]> {
        match self.require(name)? {
            Value::Array(values) => Ok(values),
            _ => Err(self.wrong_type(name, "an array")),
        }
    }
}

/// Decode one record of `schema` from the front of `bytes`.
///
/// Bytes beyond the schema's packed size are ignored.
pub fn decode(schema: &'static Schema, bytes: &[u8], endian: Endian) -> Result<Record> {
    let needed = schema.packed_size();
    if bytes.len() < needed {
        return Err(BundleError::Truncated {
            offset: 0,
            needed,
            available: bytes.len(),
        });
    }

    Ok(match endian {
        Endian::Little => decode_fields::<LittleEndian>(schema, &bytes[..needed]),
        Endian::Big => decode_fields::<BigEndian>(schema, &bytes[..needed]),
    })
}

// Callers guarantee `bytes.len() == schema.packed_size()`.
fn decode_fields<B: ByteOrder>(schema: &'static Schema, bytes: &[u8]) -> Record {
    let mut fields = Vec::with_capacity(schema.fields.len());
    let mut pos = 0;

    for field in schema.fields {
        let raw = &bytes[pos..pos + field.width()];
        pos += field.width();

        if matches!(field.transform, Transform::Omit) {
            continue;
        }

        let value = decode_kind::<B>(field.kind, raw);
        fields.push((field.name, apply_transform(field.transform, value)));
    }

    Record {
        schema: schema.name,
        fields,
    }
}

fn decode_kind<B: ByteOrder>(kind: FieldKind, raw: &[u8]) -> Value {
    match kind {
        FieldKind::Prim(prim) => read_prim::<B>(prim, raw),
        FieldKind::PrimArray(prim, _) => Value::Array(
            raw.chunks_exact(prim.width())
                .map(|chunk| read_prim::<B>(prim, chunk))
                .collect(),
        ),
        FieldKind::Bytes(_) => Value::Bytes(raw.to_vec()),
        FieldKind::Nested(schema) => Value::Record(decode_fields::<B>(schema, raw)),
        FieldKind::NestedArray(schema, count) => {
            let width = schema.packed_size();
            Value::Records(
                (0..count)
                    .map(|i| decode_fields::<B>(schema, &raw[i * width..(i + 1) * width]))
                    .collect(),
            )
        }
    }
}

fn read_prim<B: ByteOrder>(prim: Prim, raw: &[u8]) -> Value {
    match prim {
        Prim::I8 => Value::Int(i64::from(raw[0] as i8)),
        Prim::U8 => Value::UInt(u64::from(raw[0])),
        Prim::I16 => Value::Int(i64::from(B::read_i16(raw))),
        Prim::U16 => Value::UInt(u64::from(B::read_u16(raw))),
        Prim::I32 => Value::Int(i64::from(B::read_i32(raw))),
        Prim::U32 => Value::UInt(u64::from(B::read_u32(raw))),
        Prim::F32 => Value::Float(f64::from(B::read_f32(raw))),
        Prim::F64 => Value::Float(B::read_f64(raw)),
        Prim::Bool => Value::Bool(raw[0] != 0),
        Prim::Char => Value::Byte(raw[0]),
    }
}

fn apply_transform(transform: Transform, value: Value) -> Value {
    match (transform, value) {
        (Transform::CStr, Value::Bytes(bytes)) => Value::Text(c_string(&bytes)),
        (Transform::Flags(names), value) => match value.as_code() {
            Some(bits) => Value::Flags(Flags::from_bits(names, bits)),
            None => value,
        },
        (Transform::Named(names), value) => match value.as_code() {
            Some(code) => Value::Text(code_name(names, code)),
            None => value,
        },
        (_, value) => value,
    }
}

/// Text up to the first NUL. Non-UTF-8 text is read as Latin-1, which is
/// what PatchMaster writes for unit prefixes such as `µ`.
pub fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let bytes = &bytes[..end];
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

pub fn code_name(names: &[&str], code: i64) -> String {
    usize::try_from(code)
        .ok()
        .and_then(|index| names.get(index))
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("Unknown({code})"))
}
