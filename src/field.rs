//! Field declarations: the leaf nodes a [`crate::schema::SchemaBuilder`]
//! assembles into a message. Mirrors the role this module's teacher gave to
//! `FieldDescriptor` — one tagged struct covering every field kind, built
//! once and never mutated after the owning schema compiles.
use crate::value::Value;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Take the message's default, or little-endian if the message has none.
    #[default]
    Inherit,
    Little,
    Big,
}

/// Encoding used by a [`FieldKind::FixedPoint`] field.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPointEncoding {
    UnsignedRaw,
    SignedTwosComplement,
    DirectionMagnitude,
}

/// Bit ordering for a [`FieldKind::BitGroup`], re-exported from [`crate::bits`]
/// so schema declarations don't need to import both modules.
pub use crate::bits::BitOrder;

/// A single named bit span inside a [`FieldKind::BitGroup`].
///
/// Deliberately has no data-kind (uint/int/bool/enum): every sub-field
/// surfaces through [`crate::value::Value::Bits`] as a raw unsigned integer,
/// width bits wide, with no sign-extension or bool/enum interpretation.
/// Callers who need a signed or enum-valued sub-field reinterpret the raw
/// bits themselves (e.g. `crate::bits::sign_extend(raw, width)`). See
/// DESIGN.md's Open Question decisions for the rationale.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bit {
    pub name: String,
    pub width: u32,
}

impl Bit {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// How a [`FieldKind::Array`] determines its element count.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayMode {
    Fixed(usize),
    /// Four-byte little-endian element count prefix.
    Prefixed,
    /// Consume until the buffer (decode) or sequence (encode) runs out;
    /// only valid as the last field of a message.
    Dynamic,
}

/// The role a field plays beyond carrying a value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SmartRole {
    #[default]
    None,
    Discriminator,
    Length {
        start_field: String,
        end_field: String,
    },
    Checksum {
        start_field: String,
        end_field: String,
        algorithm: String,
    },
    Timestamp {
        resolution: TimestampResolution,
    },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampResolution {
    #[default]
    Seconds,
    Millis,
}

/// An enum field's known members: declared value to name.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub value: i64,
    pub name: String,
}

/// Backing storage for enum and discriminator fields in ascii mode.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub fn bytes(self) -> usize {
        match self {
            IntWidth::W8 => 1,
            IntWidth::W16 => 2,
            IntWidth::W32 => 4,
            IntWidth::W64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    /// Smallest width that fits `bits` total bits, per §4.1's fixed-point rule.
    pub fn smallest_fitting(bits: u32) -> Option<IntWidth> {
        match bits {
            0..=8 => Some(IntWidth::W8),
            9..=16 => Some(IntWidth::W16),
            17..=32 => Some(IntWidth::W32),
            33..=64 => Some(IntWidth::W64),
            _ => None,
        }
    }
}

/// The tagged variant every field kind in the catalog belongs to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
    StringFixed {
        len: usize,
    },
    StringPrefixed,
    Enum {
        backing: IntWidth,
        members: Vec<EnumMember>,
        ascii_as_string: bool,
    },
    FixedPoint {
        integer_bits: u32,
        fractional_bits: u32,
        encoding: FixedPointEncoding,
    },
    BitGroup {
        backing: IntWidth,
        bits: Vec<Bit>,
        order: BitOrder,
    },
    Array {
        item: Box<FieldKind>,
        mode: ArrayMode,
    },
    Message {
        schema_name: String,
    },
}

impl FieldKind {
    /// Byte size if statically known, used by the layout compiler to decide
    /// whether a field can join a `FixedRun`.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            FieldKind::U8 | FieldKind::I8 | FieldKind::Bool => Some(1),
            FieldKind::U16 | FieldKind::I16 => Some(2),
            FieldKind::U32 | FieldKind::I32 | FieldKind::F32 => Some(4),
            FieldKind::U64 | FieldKind::I64 | FieldKind::F64 => Some(8),
            FieldKind::StringFixed { len } => Some(*len),
            FieldKind::Enum { backing, .. } => Some(backing.bytes()),
            FieldKind::FixedPoint {
                integer_bits,
                fractional_bits,
                encoding,
            } => {
                let total = integer_bits
                    + fractional_bits
                    + matches!(encoding, FixedPointEncoding::DirectionMagnitude) as u32;
                IntWidth::smallest_fitting(total).map(IntWidth::bytes)
            }
            FieldKind::BitGroup { backing, .. } => Some(backing.bytes()),
            FieldKind::Array {
                mode: ArrayMode::Fixed(n),
                item,
            } => item.fixed_size().map(|s| s * n),
            FieldKind::Array { .. } => None,
            FieldKind::StringPrefixed => None,
            FieldKind::Message { .. } => None,
        }
    }

    /// Whether this kind can be coalesced into a `FixedRun` packed struct
    /// step (primitive-like and fixed size); arrays, strings, and nested
    /// messages always get their own `Complex` step even when fixed-size.
    pub fn is_packable(&self) -> bool {
        matches!(
            self,
            FieldKind::U8
                | FieldKind::U16
                | FieldKind::U32
                | FieldKind::U64
                | FieldKind::I8
                | FieldKind::I16
                | FieldKind::I32
                | FieldKind::I64
                | FieldKind::F32
                | FieldKind::F64
                | FieldKind::Bool
                | FieldKind::Enum { .. }
                | FieldKind::FixedPoint { .. }
                | FieldKind::BitGroup { .. }
        )
    }
}

/// A declared field: name, kind, default, and any smart-field role.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub byte_order: ByteOrder,
    pub role: SmartRole,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            byte_order: ByteOrder::Inherit,
            role: SmartRole::None,
            default: None,
        }
    }

    pub fn u8(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::U8)
    }
    pub fn u16(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::U16)
    }
    pub fn u32(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::U32)
    }
    pub fn u64(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::U64)
    }
    pub fn i8(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::I8)
    }
    pub fn i16(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::I16)
    }
    pub fn i32(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::I32)
    }
    pub fn i64(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::I64)
    }
    pub fn f32(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::F32)
    }
    pub fn f64(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::F64)
    }
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Bool)
    }
    pub fn string_fixed(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, FieldKind::StringFixed { len })
    }
    pub fn string_prefixed(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::StringPrefixed)
    }
    pub fn bit_group(name: impl Into<String>, backing: IntWidth, bits: Vec<Bit>, order: BitOrder) -> Self {
        Self::new(name, FieldKind::BitGroup { backing, bits, order })
    }
    pub fn fixed_point(
        name: impl Into<String>,
        integer_bits: u32,
        fractional_bits: u32,
        encoding: FixedPointEncoding,
    ) -> Self {
        Self::new(
            name,
            FieldKind::FixedPoint {
                integer_bits,
                fractional_bits,
                encoding,
            },
        )
    }

    pub fn little_endian(mut self) -> Self {
        self.byte_order = ByteOrder::Little;
        self
    }
    pub fn big_endian(mut self) -> Self {
        self.byte_order = ByteOrder::Big;
        self
    }
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
    pub fn as_discriminator(mut self) -> Self {
        self.role = SmartRole::Discriminator;
        self
    }
    pub fn as_length(mut self, start_field: impl Into<String>, end_field: impl Into<String>) -> Self {
        self.role = SmartRole::Length {
            start_field: start_field.into(),
            end_field: end_field.into(),
        };
        self
    }
    pub fn as_checksum(
        mut self,
        start_field: impl Into<String>,
        end_field: impl Into<String>,
        algorithm: impl Into<String>,
    ) -> Self {
        self.role = SmartRole::Checksum {
            start_field: start_field.into(),
            end_field: end_field.into(),
            algorithm: algorithm.into(),
        };
        self
    }
    pub fn as_timestamp(mut self, resolution: TimestampResolution) -> Self {
        self.role = SmartRole::Timestamp { resolution };
        self
    }
}
