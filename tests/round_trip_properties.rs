//! Property-based tests for the universal invariants in spec.md §8:
//! round-trip fidelity, length-exactness, and bit-order symmetry.

use proptest::prelude::*;

use wireframe_codec::field::{Bit, BitOrder, Field, FixedPointEncoding, IntWidth};
use wireframe_codec::schema::{Endianness, ProtocolMode, SchemaBuilder};
use wireframe_codec::value::{Instance, Value};
use wireframe_codec::{bits, engine, Registry};

fn primitive_schema(endianness: Endianness) -> wireframe_codec::Schema {
    SchemaBuilder::new("prop_primitive", ProtocolMode::Binary)
        .default_endianness(endianness)
        .field(Field::u32("a"))
        .field(Field::i32("b"))
        .field(Field::f64("c"))
        .build()
        .unwrap()
}

proptest! {
    /// decode(encode(v)) == v for a plain primitive message, across both
    /// endiannesses (§8 round-trip + endianness inheritance properties).
    #[test]
    fn primitives_round_trip(a: u32, b: i32, c in -1.0e6f64..1.0e6f64, little in any::<bool>()) {
        let endianness = if little { Endianness::Little } else { Endianness::Big };
        let schema = primitive_schema(endianness);
        let registry = Registry::new();

        let mut instance = Instance::new();
        instance.set("a", Value::U32(a));
        instance.set("b", Value::I32(b));
        instance.set("c", Value::F64(c));

        let bytes = engine::encode(&schema, &instance, &registry).unwrap();
        prop_assert_eq!(bytes.len(), 4 + 4 + 8, "length-exactness: encoded size must match the declared primitive widths");

        let (decoded, consumed) = engine::decode(&schema, &bytes, &registry).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(decoded.get("a"), Some(&Value::U32(a)));
        prop_assert_eq!(decoded.get("b"), Some(&Value::I32(b)));
        prop_assert_eq!(decoded.get("c"), Some(&Value::F64(c)));
    }

    /// Two messages differing only in declared default endianness must
    /// produce mirror-image bytes for the same multi-byte value.
    #[test]
    fn endianness_inheritance_mirrors_bytes(a: u32) {
        let registry = Registry::new();
        let little = primitive_schema(Endianness::Little);
        let big = primitive_schema(Endianness::Big);

        let mut instance = Instance::new();
        instance.set("a", Value::U32(a));
        instance.set("b", Value::I32(0));
        instance.set("c", Value::F64(0.0));

        let little_bytes = engine::encode(&little, &instance, &registry).unwrap();
        let big_bytes = engine::encode(&big, &instance, &registry).unwrap();

        let mut mirrored = little_bytes[..4].to_vec();
        mirrored.reverse();
        prop_assert_eq!(&mirrored, &big_bytes[..4]);
    }

    /// Direction-magnitude fixed-point round-trips within one quantisation
    /// step (§8: |v - v'| <= 2^-F).
    #[test]
    fn fixed_point_round_trips_within_quantisation(v in -63.0f64..63.0f64) {
        let schema = SchemaBuilder::new("prop_fixed_point", ProtocolMode::Binary)
            .field(Field::fixed_point("v", 7, 8, FixedPointEncoding::DirectionMagnitude))
            .build()
            .unwrap();
        let registry = Registry::new();

        let mut instance = Instance::new();
        instance.set("v", Value::Float(v));
        let bytes = engine::encode(&schema, &instance, &registry).unwrap();
        let (decoded, _) = engine::decode(&schema, &bytes, &registry).unwrap();

        match decoded.get("v") {
            Some(Value::Float(restored)) => prop_assert!((restored - v).abs() <= 1.0 / 256.0),
            other => prop_assert!(false, "expected a float value, got {other:?}"),
        }
    }

    /// LSB-packing a bit-group and unpacking it with the same order is the
    /// identity; packing the same values MSB instead produces a different
    /// (bit-reversed-span) layout (§8 bit-order symmetry).
    #[test]
    fn bit_group_round_trips_and_msb_differs_from_lsb(
        enable in 0u64..2,
        mode in 0u64..8,
        color in 0u64..16,
    ) {
        let pairs = [(enable, 1u32), (mode, 3u32), (color, 4u32)];
        let widths: Vec<u32> = pairs.iter().map(|(_, w)| *w).collect();

        let lsb_packed = bits::pack(&pairs, 8, BitOrder::Lsb).unwrap();
        let lsb_unpacked = bits::unpack(lsb_packed, &widths, BitOrder::Lsb).unwrap();
        prop_assert_eq!(lsb_unpacked, vec![enable, mode, color]);

        let msb_packed = bits::pack(&pairs, 8, BitOrder::Msb).unwrap();
        let msb_unpacked = bits::unpack(msb_packed, &widths, BitOrder::Msb).unwrap();
        prop_assert_eq!(msb_unpacked, vec![enable, mode, color]);

        if enable != 0 || mode != 0 || color != 0 {
            prop_assert_ne!(lsb_packed, msb_packed);
        }
    }
}

#[test]
fn schema_level_bit_group_field_round_trips() {
    // Exercise the bit-group through a full schema, not just the bare
    // `bits` module, using `Field::bit_group` the way user code would.
    let schema = SchemaBuilder::new("prop_bit_group_schema", ProtocolMode::Binary)
        .field(Field::bit_group(
            "flags",
            IntWidth::W8,
            vec![Bit::new("enable", 1), Bit::new("mode", 3), Bit::new("color", 4)],
            BitOrder::Lsb,
        ))
        .build()
        .unwrap();
    let registry = Registry::new();

    let mut instance = Instance::new();
    let mut map = std::collections::BTreeMap::new();
    map.insert("enable".to_string(), 1u64);
    map.insert("mode".to_string(), 5u64);
    map.insert("color".to_string(), 3u64);
    instance.set("flags", Value::Bits(map.clone()));

    let bytes = engine::encode(&schema, &instance, &registry).unwrap();
    let (decoded, _) = engine::decode(&schema, &bytes, &registry).unwrap();
    assert_eq!(decoded.get("flags"), Some(&Value::Bits(map)));
}
