//! The semantic value domain that every field kind reads from and writes
//! into, independent of wire representation.
use std::collections::BTreeMap;

/// A single field's runtime value. One variant per semantic domain named in
/// the data model — not one variant per wire encoding, since e.g. a
/// fixed-point field and a plain float field both speak `Value::Float`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Float(f64),
    Str(String),
    /// Enum value: the discriminant plus, when known, its member name.
    Enum { value: i64, name: Option<String> },
    /// Bit-group value: sub-field name to raw integer.
    Bits(BTreeMap<String, u64>),
    Array(Vec<Value>),
    Message(Instance),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::U8(v) => Some(*v as i64),
            Value::U16(v) => Some(*v as i64),
            Value::U32(v) => Some(*v as i64),
            Value::U64(v) => Some(*v as i64),
            Value::I8(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::Bool(v) => Some(*v as i64),
            Value::Enum { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().map(|v| v as u64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            Value::Float(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Canonical textual rendering used by the ascii framer (§4.6): enum
    /// members render by name, booleans as `True`/`False`, floats and
    /// integers in decimal.
    pub fn to_ascii(&self) -> String {
        match self {
            Value::U8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => if *v { "True" } else { "False" }.to_string(),
            Value::Str(s) => s.clone(),
            Value::Enum { name: Some(n), .. } => n.clone(),
            Value::Enum { value, .. } => value.to_string(),
            Value::Bits(map) => map
                .values()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
            Value::Array(items) => items
                .iter()
                .map(Value::to_ascii)
                .collect::<Vec<_>>()
                .join(","),
            // Schema-unaware fallback: a bare `Value` has no field-order
            // information, so this joins the nested instance's fields
            // alphabetically by name. `crate::ascii::build_frame` renders
            // nested messages itself, in the nested schema's declared field
            // order, and only falls back to this when the nested schema
            // isn't registered.
            Value::Message(inst) => inst
                .values
                .values()
                .map(Value::to_ascii)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// A populated message: every declared field name mapped to its value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Instance {
    pub values: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}
