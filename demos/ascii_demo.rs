//! # ASCII Framing Example
//!
//! Demonstrates the `<header|body|checksum>` ascii wire format: building a
//! frame from an instance, and parsing it back through a `Registry` keyed by
//! `(cmd_type, cmd_str)`.
//!
//! ```bash
//! cargo run --example ascii_demo
//! ```

use wireframe_codec::ascii::{build_frame, parse_frame, AsciiConfig};
use wireframe_codec::field::{EnumMember, Field, FieldKind, IntWidth};
use wireframe_codec::schema::{ProtocolMode, SchemaBuilder};
use wireframe_codec::value::{Instance, Value};
use wireframe_codec::Registry;

fn main() {
    println!("=== wireframe-codec ASCII Framing Demo ===\n");

    println!("1. Building a `TEST|KITCHEN` ascii schema");
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
        .expect("schema compiles");

    let mut registry = Registry::new();
    registry.register(schema.clone());

    println!("2. Encoding an instance to an ascii frame");
    let config = AsciiConfig::default();
    let frame = build_frame(&schema, &Instance::new(), &registry, &config).expect("encode succeeds");
    println!("   Frame: {frame}\n");

    println!("3. Parsing the frame back through the registry");
    match parse_frame(frame.as_bytes(), &registry, &config) {
        Ok((decoded, consumed)) => {
            println!("   Consumed {consumed} byte(s)");
            println!("   label:  {:?}", decoded.get("label"));
            println!("   status: {:?}\n", decoded.get("status"));
        }
        Err(e) => eprintln!("   Parse failed: {e}\n"),
    }

    println!("ASCII demo complete.");
}
