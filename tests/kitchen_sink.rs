//! End-to-end integration scenarios exercising the full stack: schema
//! compilation, encode/decode through the registry, and stream reassembly
//! under fragmentation and injected garbage.

use std::collections::{BTreeMap, VecDeque};

use wireframe_codec::ascii::{build_frame, parse_frame, AsciiConfig};
use wireframe_codec::field::{Bit, BitOrder, EnumMember, Field, FieldKind, FixedPointEncoding, IntWidth};
use wireframe_codec::schema::{Endianness, ProtocolMode, SchemaBuilder};
use wireframe_codec::stream::{ProtocolMode as StreamMode, StreamReassembler};
use wireframe_codec::value::{Instance, Value};
use wireframe_codec::{engine, Registry};

fn mixed_endian_schema() -> wireframe_codec::Schema {
    SchemaBuilder::new("kitchen_sink_binary", ProtocolMode::Binary)
        .default_endianness(Endianness::Little)
        .field(Field::u16("msg_id").as_discriminator().default(Value::U16(0x3001)))
        .field(Field::u16("length").as_length("payload", "payload"))
        .field(Field::u16("checksum").as_checksum("payload", "payload", "CRC16"))
        .field(Field::bit_group(
            "flags",
            IntWidth::W8,
            vec![Bit::new("enable", 1), Bit::new("mode", 3), Bit::new("color", 4)],
            BitOrder::Lsb,
        ))
        .field(Field::fixed_point(
            "speed",
            7,
            8,
            FixedPointEncoding::DirectionMagnitude,
        ))
        .field(Field::string_fixed("label", 8))
        .field(Field::u8("payload"))
        .build()
        .expect("kitchen sink schema compiles")
}

#[test]
fn kitchen_sink_round_trip_through_registry() {
    let schema = mixed_endian_schema();
    let mut registry = Registry::new();
    registry.register(schema.clone());

    let mut instance = Instance::new();
    instance.set("msg_id", Value::U16(0x3001));
    let mut flags = BTreeMap::new();
    flags.insert("enable".to_string(), 1u64);
    flags.insert("mode".to_string(), 5u64);
    flags.insert("color".to_string(), 3u64);
    instance.set("flags", Value::Bits(flags));
    instance.set("speed", Value::Float(-5.0));
    instance.set("label", Value::Str("ROVER-1".into()));
    instance.set("payload", Value::U8(0x7E));

    let bytes = engine::encode(&schema, &instance, &registry).expect("encode succeeds");

    let (decoded, consumed) = registry.identify_binary(&bytes).expect("identification succeeds");
    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded.get("label"), Some(&Value::Str("ROVER-1".to_string())));
    assert_eq!(decoded.get("payload"), Some(&Value::U8(0x7E)));
    match decoded.get("speed") {
        Some(Value::Float(v)) => assert!((v - (-5.0)).abs() < 1.0 / 256.0),
        other => panic!("unexpected speed value: {other:?}"),
    }

    // Smart-field idempotence (§8): re-encoding the decoded instance, with
    // the smart fields still attached to the instance, yields the same
    // bytes (the length/checksum/discriminator fields are recomputed, not
    // carried over, so this only holds because the schema has no timestamp
    // field to perturb the output).
    let mut round_tripped = Instance::new();
    for (name, value) in &decoded.values {
        round_tripped.set(name.clone(), value.clone());
    }
    let re_encoded = engine::encode(&schema, &round_tripped, &registry).expect("re-encode succeeds");
    assert_eq!(bytes, re_encoded);
}

#[test]
fn stream_fragmentation_invariance_across_chunk_sizes() {
    let schema = SchemaBuilder::new("heartbeat", ProtocolMode::Binary)
        .field(Field::u16("msg_id").as_discriminator().default(Value::U16(0x10)))
        .field(Field::u8("seq"))
        .build()
        .unwrap();
    let mut registry = Registry::new();
    registry.register(schema.clone());

    let mut full_buffer = Vec::new();
    for seq in 0..100u8 {
        let mut instance = Instance::new();
        instance.set("msg_id", Value::U16(0x10));
        instance.set("seq", Value::U8(seq));
        full_buffer.extend(engine::encode(&schema, &instance, &registry).unwrap());
    }

    // Exercise a handful of representative fixed chunk sizes, including the
    // size-1 extreme named in §8's fragmentation property.
    for chunk_size in [1usize, 2, 3, 5, 7, 50, 1600] {
        let mut reassembler = StreamReassembler::new(StreamMode::Binary);
        let mut out: VecDeque<Instance> = VecDeque::new();
        for chunk in full_buffer.chunks(chunk_size) {
            reassembler.feed(chunk, &registry, &mut out);
        }
        assert_eq!(out.len(), 100, "chunk size {chunk_size} lost messages");
        for (i, instance) in out.iter().enumerate() {
            assert_eq!(instance.get("seq"), Some(&Value::U8(i as u8)));
        }
    }
}

#[test]
fn resync_loses_at_most_the_injected_garbage() {
    let schema = SchemaBuilder::new("heartbeat", ProtocolMode::Binary)
        .field(Field::u16("msg_id").as_discriminator().default(Value::U16(0x10)))
        .field(Field::u8("seq"))
        .build()
        .unwrap();
    let mut registry = Registry::new();
    registry.register(schema.clone());

    let encode_one = |seq: u8| {
        let mut instance = Instance::new();
        instance.set("msg_id", Value::U16(0x10));
        instance.set("seq", Value::U8(seq));
        engine::encode(&schema, &instance, &registry).unwrap()
    };

    let mut buffer = encode_one(0);
    buffer.extend([0xDE, 0xAD, 0xBE, 0xEF, 0x00]); // 5 garbage bytes
    buffer.extend(encode_one(1));

    let mut reassembler = StreamReassembler::new(StreamMode::Binary);
    let mut out: VecDeque<Instance> = VecDeque::new();
    reassembler.feed(&buffer, &registry, &mut out);

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get("seq"), Some(&Value::U8(0)));
    assert_eq!(out[1].get("seq"), Some(&Value::U8(1)));
}

#[test]
fn ascii_kitchen_sink_round_trip_matches_spec_scenario_six() {
    let schema = SchemaBuilder::new("kitchen_sink_string", ProtocolMode::Ascii)
        .msg_id(99)
        .field(Field::new("cmd_type", FieldKind::StringPrefixed).default(Value::Str("TEST".into())))
        .field(Field::new("cmd_str", FieldKind::StringPrefixed).default(Value::Str("KITCHEN".into())))
        .field(Field::u8("msg_id").default(Value::U8(99)))
        .field(Field::string_fixed("label", 10).default(Value::Str("MYLABEL".into())))
        .field(
            Field::new(
                "status",
                FieldKind::Enum {
                    backing: IntWidth::W8,
                    members: vec![
                        EnumMember { value: 0, name: "OK".into() },
                        EnumMember { value: 1, name: "ERROR".into() },
                    ],
                    ascii_as_string: true,
                },
            )
            .default(Value::Enum { value: 1, name: Some("ERROR".into()) }),
        )
        .build()
        .unwrap();

    let mut registry = Registry::new();
    registry.register(schema.clone());
    let config = AsciiConfig::default();

    let frame = build_frame(&schema, &Instance::new(), &registry, &config).unwrap();
    assert!(frame.starts_with("<0063|TEST|KITCHEN|99;MYLABEL   ;ERROR;"));
    assert!(frame.ends_with('>'));

    let (decoded, consumed) = parse_frame(frame.as_bytes(), &registry, &config).unwrap();
    assert_eq!(consumed, frame.len());
    assert_eq!(decoded.get("label"), Some(&Value::Str("MYLABEL".to_string())));
    match decoded.get("status") {
        Some(Value::Enum { name: Some(n), .. }) => assert_eq!(n, "ERROR"),
        other => panic!("unexpected status: {other:?}"),
    }
}
