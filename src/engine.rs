//! The codec engine (§4.3, §4.4): drives a compiled [`crate::compiled::Plan`]
//! to encode an [`Instance`] to bytes in two passes (emit, then backpatch
//! smart fields) and to decode bytes back into an `Instance` in one pass.
use std::time::{SystemTime, UNIX_EPOCH};

use crate::checksum;
use crate::compiled::Step;
use crate::error::{DecodeError, EncodeError};
use crate::field::{ArrayMode, Field, FieldKind, FixedPointEncoding, IntWidth, SmartRole, TimestampResolution};
use crate::registry::Registry;
use crate::schema::{Endianness, Schema};
use crate::value::{Instance, Value};

/// Encodes `instance` according to `schema`'s compiled plan. `registry` is
/// consulted only for nested-message fields; pass an empty one if the
/// schema has none.
pub fn encode(schema: &Schema, instance: &Instance, registry: &Registry) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let mut offsets: Vec<(usize, usize)> = vec![(0, 0); schema.fields.len()];

    for step in &schema.plan.steps {
        match step {
            Step::FixedRun {
                field_indices,
                endianness,
                ..
            } => {
                for &idx in field_indices {
                    let field = &schema.fields[idx];
                    let start = buf.len();
                    encode_fixed_field(field, instance, *endianness, &mut buf)?;
                    offsets[idx] = (start, buf.len() - start);
                }
            }
            Step::Complex { field_index } => {
                let field = &schema.fields[*field_index];
                let order = resolve_order(field, schema.default_endianness);
                let value = instance
                    .get(&field.name)
                    .or(field.default.as_ref())
                    .ok_or_else(|| EncodeError::MissingValue(field.name.clone()))?;
                let start = buf.len();
                encode_complex(&field.kind, value, order, registry, &mut buf)?;
                offsets[*field_index] = (start, buf.len() - start);
            }
        }
    }

    for lf in &schema.plan.length_fields {
        let start = offsets[lf.start_field_index].0;
        let end = offsets[lf.end_field_index].0 + offsets[lf.end_field_index].1;
        let length = (end - start) as u64;
        let (field_offset, field_len) = offsets[lf.field_index];
        write_through(&mut buf, field_offset, field_len, length, resolve_order(&schema.fields[lf.field_index], schema.default_endianness));
    }

    for cf in &schema.plan.checksum_fields {
        let start = offsets[cf.start_field_index].0;
        let end = offsets[cf.end_field_index].0 + offsets[cf.end_field_index].1;
        let algorithm = cf.algorithm.as_deref().unwrap_or("");
        let value = checksum::calculate(algorithm, &buf[start..end]).unwrap_or(0);
        let (field_offset, field_len) = offsets[cf.field_index];
        write_through(&mut buf, field_offset, field_len, value, resolve_order(&schema.fields[cf.field_index], schema.default_endianness));
    }

    Ok(buf)
}

/// Decodes a message matching `schema` from the front of `data`. Returns the
/// instance and the number of bytes consumed, leaving any trailing bytes in
/// `data` untouched.
pub fn decode(schema: &Schema, data: &[u8], registry: &Registry) -> Result<(Instance, usize), DecodeError> {
    let mut cursor = 0usize;
    let mut instance = Instance::new();

    for step in &schema.plan.steps {
        match step {
            Step::FixedRun {
                field_indices,
                endianness,
                ..
            } => {
                for &idx in field_indices {
                    let field = &schema.fields[idx];
                    let width = field
                        .kind
                        .fixed_size()
                        .expect("fixed run fields are always statically sized");
                    if cursor + width > data.len() {
                        return Err(DecodeError::Incomplete {
                            field: field.name.clone(),
                            needed: width - (data.len() - cursor),
                            available: data.len() - cursor,
                        });
                    }
                    let slice = &data[cursor..cursor + width];
                    let value = decode_scalar(&field.kind, slice, *endianness);
                    instance.set(field.name.clone(), value);
                    cursor += width;
                }
            }
            Step::Complex { field_index } => {
                let field = &schema.fields[*field_index];
                let order = resolve_order(field, schema.default_endianness);
                let (value, consumed) = decode_complex(&field.kind, &data[cursor..], order, registry, &field.name)?;
                instance.set(field.name.clone(), value);
                cursor += consumed;
            }
        }
    }

    Ok((instance, cursor))
}

pub(crate) fn resolve_order(field: &Field, default_endianness: Endianness) -> Endianness {
    match field.byte_order {
        crate::field::ByteOrder::Inherit => default_endianness,
        crate::field::ByteOrder::Little => Endianness::Little,
        crate::field::ByteOrder::Big => Endianness::Big,
    }
}

fn write_through(buf: &mut [u8], offset: usize, len: usize, value: u64, order: Endianness) {
    let bytes = match order {
        Endianness::Little => value.to_le_bytes(),
        Endianness::Big => value.to_be_bytes(),
    };
    match order {
        Endianness::Little => buf[offset..offset + len].copy_from_slice(&bytes[..len]),
        Endianness::Big => buf[offset..offset + len].copy_from_slice(&bytes[8 - len..]),
    }
}

fn encode_fixed_field(field: &Field, instance: &Instance, order: Endianness, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    match &field.role {
        SmartRole::Length { .. } | SmartRole::Checksum { .. } => {
            let width = field.kind.fixed_size().unwrap();
            buf.extend(std::iter::repeat(0u8).take(width));
            Ok(())
        }
        SmartRole::Timestamp { resolution } => {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            let raw = match resolution {
                TimestampResolution::Seconds => now.as_secs(),
                TimestampResolution::Millis => now.as_millis() as u64,
            };
            let width = field.kind.fixed_size().unwrap();
            push_int(buf, raw, width, order);
            Ok(())
        }
        _ => {
            let value = instance
                .get(&field.name)
                .or(field.default.as_ref())
                .ok_or_else(|| EncodeError::MissingValue(field.name.clone()))?;
            encode_scalar(&field.kind, value, order, buf, &field.name)
        }
    }
}

fn push_int(buf: &mut Vec<u8>, value: u64, width: usize, order: Endianness) {
    let bytes = match order {
        Endianness::Little => value.to_le_bytes(),
        Endianness::Big => value.to_be_bytes(),
    };
    match order {
        Endianness::Little => buf.extend_from_slice(&bytes[..width]),
        Endianness::Big => buf.extend_from_slice(&bytes[8 - width..]),
    }
}

fn read_int(slice: &[u8], order: Endianness) -> u64 {
    let mut bytes = [0u8; 8];
    match order {
        Endianness::Little => {
            bytes[..slice.len()].copy_from_slice(slice);
            u64::from_le_bytes(bytes)
        }
        Endianness::Big => {
            bytes[8 - slice.len()..].copy_from_slice(slice);
            u64::from_be_bytes(bytes)
        }
    }
}

fn encode_scalar(kind: &FieldKind, value: &Value, order: Endianness, buf: &mut Vec<u8>, field_name: &str) -> Result<(), EncodeError> {
    match kind {
        FieldKind::Bool => {
            let v = matches!(value, Value::Bool(true)) as u8;
            buf.push(v);
            Ok(())
        }
        FieldKind::U8 | FieldKind::U16 | FieldKind::U32 | FieldKind::U64 => {
            let width = kind.fixed_size().unwrap();
            let raw = value.as_u64().ok_or_else(|| EncodeError::OutOfRange {
                field: field_name.to_string(),
                reason: "expected an unsigned integer value".into(),
            })?;
            push_int(buf, raw, width, order);
            Ok(())
        }
        FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 => {
            let width = kind.fixed_size().unwrap();
            let raw = value.as_i64().ok_or_else(|| EncodeError::OutOfRange {
                field: field_name.to_string(),
                reason: "expected a signed integer value".into(),
            })?;
            push_int(buf, raw as u64, width, order);
            Ok(())
        }
        FieldKind::F32 => {
            let v = value.as_f64().ok_or_else(|| EncodeError::OutOfRange {
                field: field_name.to_string(),
                reason: "expected a float value".into(),
            })? as f32;
            let bytes = match order {
                Endianness::Little => v.to_le_bytes(),
                Endianness::Big => v.to_be_bytes(),
            };
            buf.extend_from_slice(&bytes);
            Ok(())
        }
        FieldKind::F64 => {
            let v = value.as_f64().ok_or_else(|| EncodeError::OutOfRange {
                field: field_name.to_string(),
                reason: "expected a float value".into(),
            })?;
            let bytes = match order {
                Endianness::Little => v.to_le_bytes(),
                Endianness::Big => v.to_be_bytes(),
            };
            buf.extend_from_slice(&bytes);
            Ok(())
        }
        FieldKind::Enum { backing, .. } => {
            let raw = value.as_i64().ok_or_else(|| EncodeError::OutOfRange {
                field: field_name.to_string(),
                reason: "expected an enum or integer value".into(),
            })?;
            push_int(buf, raw as u64, backing.bytes(), order);
            Ok(())
        }
        FieldKind::FixedPoint {
            integer_bits,
            fractional_bits,
            encoding,
        } => encode_fixed_point(*integer_bits, *fractional_bits, *encoding, value, order, buf, field_name),
        FieldKind::BitGroup { backing, bits, order: bit_order } => {
            let map = match value {
                Value::Bits(m) => m.clone(),
                _ => {
                    return Err(EncodeError::OutOfRange {
                        field: field_name.to_string(),
                        reason: "expected a bit-group value".into(),
                    })
                }
            };
            let pairs: Vec<(u64, u32)> = bits
                .iter()
                .map(|b| (*map.get(&b.name).unwrap_or(&0), b.width))
                .collect();
            let packed = crate::bits::pack(&pairs, backing.bits(), *bit_order).map_err(|e| EncodeError::OutOfRange {
                field: field_name.to_string(),
                reason: e.to_string(),
            })?;
            push_int(buf, packed, backing.bytes(), order);
            Ok(())
        }
        other => Err(EncodeError::OutOfRange {
            field: field_name.to_string(),
            reason: format!("{other:?} is not a fixed-run scalar kind"),
        }),
    }
}

/// Decodes a single fixed-run-sized primitive/enum/fixed-point/bit-group
/// value out of `slice`. Exposed beyond this module so the registry can peek
/// a candidate's discriminator field without running a full `decode`.
pub(crate) fn decode_scalar(kind: &FieldKind, slice: &[u8], order: Endianness) -> Value {
    match kind {
        FieldKind::Bool => Value::Bool(slice[0] != 0),
        FieldKind::U8 => Value::U8(slice[0]),
        FieldKind::U16 => Value::U16(read_int(slice, order) as u16),
        FieldKind::U32 => Value::U32(read_int(slice, order) as u32),
        FieldKind::U64 => Value::U64(read_int(slice, order)),
        FieldKind::I8 => Value::I8(slice[0] as i8),
        FieldKind::I16 => Value::I16(read_int(slice, order) as i16),
        FieldKind::I32 => Value::I32(read_int(slice, order) as i32),
        FieldKind::I64 => Value::I64(read_int(slice, order) as i64),
        FieldKind::F32 => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(slice);
            Value::F32(match order {
                Endianness::Little => f32::from_le_bytes(bytes),
                Endianness::Big => f32::from_be_bytes(bytes),
            })
        }
        FieldKind::F64 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(slice);
            Value::F64(match order {
                Endianness::Little => f64::from_le_bytes(bytes),
                Endianness::Big => f64::from_be_bytes(bytes),
            })
        }
        FieldKind::Enum { members, .. } => {
            let raw = read_int(slice, order) as i64;
            let name = members.iter().find(|m| m.value == raw).map(|m| m.name.clone());
            Value::Enum { value: raw, name }
        }
        FieldKind::FixedPoint {
            integer_bits,
            fractional_bits,
            encoding,
        } => decode_fixed_point(*integer_bits, *fractional_bits, *encoding, slice, order),
        FieldKind::BitGroup { bits, order: bit_order, .. } => {
            let raw = read_int(slice, order);
            let widths: Vec<u32> = bits.iter().map(|b| b.width).collect();
            let values = crate::bits::unpack(raw, &widths, *bit_order).unwrap_or_default();
            let mut map = std::collections::BTreeMap::new();
            for (bit, v) in bits.iter().zip(values) {
                map.insert(bit.name.clone(), v);
            }
            Value::Bits(map)
        }
        other => panic!("{other:?} is not a fixed-run scalar kind"),
    }
}

fn encode_fixed_point(
    integer_bits: u32,
    fractional_bits: u32,
    encoding: FixedPointEncoding,
    value: &Value,
    order: Endianness,
    buf: &mut Vec<u8>,
    field_name: &str,
) -> Result<(), EncodeError> {
    let v = value.as_f64().ok_or_else(|| EncodeError::OutOfRange {
        field: field_name.to_string(),
        reason: "expected a numeric value for a fixed-point field".into(),
    })?;
    let scale = (1u64 << fractional_bits) as f64;
    let total_value_bits = integer_bits + fractional_bits;

    match encoding {
        FixedPointEncoding::UnsignedRaw => {
            let raw = (v * scale).round() as i64;
            let width = IntWidth::smallest_fitting(total_value_bits)
                .expect("fixed-point width validated at schema build");
            push_int(buf, raw as u64 & mask_u64(total_value_bits), width.bytes(), order);
        }
        FixedPointEncoding::SignedTwosComplement => {
            let raw = (v * scale).round() as i64;
            let width = IntWidth::smallest_fitting(total_value_bits)
                .expect("fixed-point width validated at schema build");
            push_int(buf, raw as u64, width.bytes(), order);
        }
        FixedPointEncoding::DirectionMagnitude => {
            let magnitude = ((v.abs() * scale).round() as u64) & mask_u64(total_value_bits);
            let sign_bit = if v.is_sign_negative() && v != 0.0 { 1u64 } else { 0u64 };
            let combined = magnitude | (sign_bit << total_value_bits);
            let width = IntWidth::smallest_fitting(total_value_bits + 1)
                .expect("fixed-point width validated at schema build");
            push_int(buf, combined, width.bytes(), order);
        }
    }
    Ok(())
}

fn decode_fixed_point(integer_bits: u32, fractional_bits: u32, encoding: FixedPointEncoding, slice: &[u8], order: Endianness) -> Value {
    let scale = (1u64 << fractional_bits) as f64;
    let total_value_bits = integer_bits + fractional_bits;
    let raw = read_int(slice, order);

    let float_value = match encoding {
        FixedPointEncoding::UnsignedRaw => (raw & mask_u64(total_value_bits)) as f64 / scale,
        FixedPointEncoding::SignedTwosComplement => {
            crate::bits::sign_extend(raw, total_value_bits) as f64 / scale
        }
        FixedPointEncoding::DirectionMagnitude => {
            let magnitude = (raw & mask_u64(total_value_bits)) as f64;
            let sign_bit = (raw >> total_value_bits) & 1;
            let magnitude = magnitude / scale;
            if sign_bit == 1 {
                -magnitude
            } else {
                magnitude
            }
        }
    };
    Value::Float(float_value)
}

fn mask_u64(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn encode_complex(kind: &FieldKind, value: &Value, order: Endianness, registry: &Registry, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    match kind {
        FieldKind::StringFixed { len } => {
            let s = value.as_str().unwrap_or("");
            let mut bytes = s.as_bytes().to_vec();
            bytes.truncate(*len);
            bytes.resize(*len, 0);
            buf.extend_from_slice(&bytes);
            Ok(())
        }
        FieldKind::StringPrefixed => {
            let s = value.as_str().unwrap_or("");
            let bytes = s.as_bytes();
            push_int(buf, bytes.len() as u64, 4, Endianness::Little);
            buf.extend_from_slice(bytes);
            Ok(())
        }
        FieldKind::Array { item, mode } => {
            let items = match value {
                Value::Array(items) => items.clone(),
                _ => Vec::new(),
            };
            match mode {
                ArrayMode::Fixed(n) => {
                    for i in 0..*n {
                        let item_value = items.get(i).cloned().unwrap_or(zero_value_for(item));
                        encode_complex_or_scalar(item, &item_value, order, registry, buf)?;
                    }
                }
                ArrayMode::Prefixed => {
                    push_int(buf, items.len() as u64, 4, Endianness::Little);
                    for item_value in &items {
                        encode_complex_or_scalar(item, item_value, order, registry, buf)?;
                    }
                }
                ArrayMode::Dynamic => {
                    for item_value in &items {
                        encode_complex_or_scalar(item, item_value, order, registry, buf)?;
                    }
                }
            }
            Ok(())
        }
        FieldKind::Message { schema_name } => {
            let nested_schema = registry
                .schema(schema_name)
                .ok_or_else(|| EncodeError::OutOfRange {
                    field: schema_name.clone(),
                    reason: "nested message schema is not registered".into(),
                })?;
            let nested_instance = match value {
                Value::Message(inst) => inst.clone(),
                _ => Instance::new(),
            };
            let bytes = encode(nested_schema, &nested_instance, registry).map_err(|e| EncodeError::OutOfRange {
                field: schema_name.clone(),
                reason: e.to_string(),
            })?;
            buf.extend_from_slice(&bytes);
            Ok(())
        }
        other => encode_scalar(other, value, order, buf, "<complex>"),
    }
}

fn encode_complex_or_scalar(kind: &FieldKind, value: &Value, order: Endianness, registry: &Registry, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    if kind.is_packable() {
        encode_scalar(kind, value, order, buf, "<array item>")
    } else {
        encode_complex(kind, value, order, registry, buf)
    }
}

fn zero_value_for(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Bool => Value::Bool(false),
        FieldKind::F32 => Value::F32(0.0),
        FieldKind::F64 => Value::F64(0.0),
        _ => Value::U64(0),
    }
}

fn decode_complex(
    kind: &FieldKind,
    data: &[u8],
    order: Endianness,
    registry: &Registry,
    field_name: &str,
) -> Result<(Value, usize), DecodeError> {
    match kind {
        FieldKind::StringFixed { len } => {
            if data.len() < *len {
                return Err(DecodeError::Incomplete {
                    field: field_name.to_string(),
                    needed: *len - data.len(),
                    available: data.len(),
                });
            }
            let raw = &data[..*len];
            let end = raw.iter().position(|&b| b == 0).unwrap_or(*len);
            let s = String::from_utf8_lossy(&raw[..end]).to_string();
            Ok((Value::Str(s), *len))
        }
        FieldKind::StringPrefixed => {
            if data.len() < 4 {
                return Err(DecodeError::Incomplete {
                    field: field_name.to_string(),
                    needed: 4 - data.len(),
                    available: data.len(),
                });
            }
            let len = read_int(&data[..4], Endianness::Little) as usize;
            if data.len() < 4 + len {
                return Err(DecodeError::Incomplete {
                    field: field_name.to_string(),
                    needed: 4 + len - data.len(),
                    available: data.len(),
                });
            }
            let s = String::from_utf8_lossy(&data[4..4 + len]).to_string();
            Ok((Value::Str(s), 4 + len))
        }
        FieldKind::Array { item, mode } => decode_array(item, mode, data, order, registry, field_name),
        FieldKind::Message { schema_name } => {
            let nested_schema = registry.schema(schema_name).ok_or(DecodeError::Unknown)?;
            let (inst, consumed) = decode(nested_schema, data, registry)?;
            Ok((Value::Message(inst), consumed))
        }
        other => {
            let width = other.fixed_size().unwrap_or(0);
            if data.len() < width {
                return Err(DecodeError::Incomplete {
                    field: field_name.to_string(),
                    needed: width - data.len(),
                    available: data.len(),
                });
            }
            Ok((decode_scalar(other, &data[..width], order), width))
        }
    }
}

fn decode_array(
    item: &FieldKind,
    mode: &ArrayMode,
    data: &[u8],
    order: Endianness,
    registry: &Registry,
    field_name: &str,
) -> Result<(Value, usize), DecodeError> {
    match mode {
        ArrayMode::Fixed(n) => {
            let mut items = Vec::with_capacity(*n);
            let mut cursor = 0;
            for _ in 0..*n {
                let (value, consumed) = decode_complex(item, &data[cursor..], order, registry, field_name)?;
                items.push(value);
                cursor += consumed;
            }
            Ok((Value::Array(items), cursor))
        }
        ArrayMode::Prefixed => {
            if data.len() < 4 {
                return Err(DecodeError::Incomplete {
                    field: field_name.to_string(),
                    needed: 4 - data.len(),
                    available: data.len(),
                });
            }
            let count = read_int(&data[..4], Endianness::Little) as usize;
            let mut cursor = 4;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                let (value, consumed) = decode_complex(item, &data[cursor..], order, registry, field_name)?;
                items.push(value);
                cursor += consumed;
            }
            Ok((Value::Array(items), cursor))
        }
        ArrayMode::Dynamic => {
            // Best-effort: keep decoding items until the buffer is exhausted
            // or the next item fails to decode, matching the reference
            // implementation's dynamic-array behaviour.
            let mut items = Vec::new();
            let mut cursor = 0;
            loop {
                match decode_complex(item, &data[cursor..], order, registry, field_name) {
                    Ok((value, consumed)) if consumed > 0 => {
                        items.push(value);
                        cursor += consumed;
                    }
                    _ => break,
                }
            }
            Ok((Value::Array(items), cursor))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Bit, BitOrder, Field, IntWidth};
    use crate::schema::{ProtocolMode, SchemaBuilder};

    fn empty_registry() -> Registry {
        Registry::new()
    }

    #[test]
    fn primitive_endianness_mix_matches_spec_scenario_one() {
        let schema = SchemaBuilder::new("scenario1", ProtocolMode::Binary)
            .field(Field::u16("magic").big_endian().default(Value::U16(0xCAFE)))
            .field(Field::u8("version").default(Value::U8(1)))
            .field(Field::u16("value").little_endian().default(Value::U16(0x1234)))
            .build()
            .unwrap();
        let registry = empty_registry();
        let bytes = encode(&schema, &Instance::new(), &registry).unwrap();
        assert_eq!(bytes, vec![0xCA, 0xFE, 0x01, 0x34, 0x12]);

        let (decoded, consumed) = decode(&schema, &bytes, &registry).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(decoded.get("magic"), Some(&Value::U16(0xCAFE)));
        assert_eq!(decoded.get("value"), Some(&Value::U16(0x1234)));
    }

    #[test]
    fn direction_magnitude_fixed_point_matches_spec_scenario_three() {
        let schema = SchemaBuilder::new("scenario3", ProtocolMode::Binary)
            .field(Field::fixed_point(
                "speed",
                7,
                8,
                crate::field::FixedPointEncoding::DirectionMagnitude,
            ))
            .build()
            .unwrap();
        let registry = empty_registry();
        let mut instance = Instance::new();
        instance.set("speed", Value::Float(-5.0));
        let bytes = encode(&schema, &instance, &registry).unwrap();
        assert_eq!(bytes, vec![0x00, 0x85]);

        let (decoded, _) = decode(&schema, &bytes, &registry).unwrap();
        match decoded.get("speed") {
            Some(Value::Float(v)) => assert!((v - (-5.0)).abs() < 1.0 / 256.0),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn length_and_checksum_backpatch_matches_spec_scenario_four() {
        let schema = SchemaBuilder::new("smart", ProtocolMode::Binary)
            .field(Field::u8("sync").default(Value::U8(0xAA)))
            .field(Field::u16("checksum").as_checksum("payload_a", "payload_b", "CRC16"))
            .field(Field::u32("ts").as_timestamp(crate::field::TimestampResolution::Seconds))
            .field(Field::u8("payload_a").default(Value::U8(0x01)))
            .field(Field::u8("payload_b").default(Value::U8(0x02)))
            .build()
            .unwrap();
        let registry = empty_registry();
        let bytes = encode(&schema, &Instance::new(), &registry).unwrap();
        assert_eq!(bytes.len(), 9);
        assert_eq!(&bytes[1..3], &0x1373u16.to_le_bytes());
    }

    #[test]
    fn bit_group_round_trips() {
        let schema = SchemaBuilder::new("bits", ProtocolMode::Binary)
            .field(Field::bit_group(
                "flags",
                IntWidth::W8,
                vec![Bit::new("enable", 1), Bit::new("mode", 3), Bit::new("color", 4)],
                BitOrder::Lsb,
            ))
            .build()
            .unwrap();
        let registry = empty_registry();
        let mut instance = Instance::new();
        let mut map = std::collections::BTreeMap::new();
        map.insert("enable".to_string(), 1u64);
        map.insert("mode".to_string(), 5u64);
        map.insert("color".to_string(), 3u64);
        instance.set("flags", Value::Bits(map));
        let bytes = encode(&schema, &instance, &registry).unwrap();
        assert_eq!(bytes, vec![0x3B]);
    }

    #[test]
    fn short_buffer_reports_incomplete() {
        let schema = SchemaBuilder::new("short", ProtocolMode::Binary)
            .field(Field::u32("value"))
            .build()
            .unwrap();
        let registry = empty_registry();
        let err = decode(&schema, &[0x01, 0x02], &registry).unwrap_err();
        assert!(matches!(err, DecodeError::Incomplete { .. }));
    }
}
