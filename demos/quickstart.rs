//! # Quickstart Example
//!
//! Minimal example demonstrating the basics of `wireframe-codec`:
//! - Build a binary schema with the fluent `SchemaBuilder` API
//! - Populate an instance and encode it to bytes
//! - Register the schema and identify the same bytes back through a
//!   `Registry`
//!
//! ```bash
//! cargo run --example quickstart
//! ```

use wireframe_codec::field::{Bit, BitOrder, Field, FixedPointEncoding, IntWidth};
use wireframe_codec::schema::{Endianness, ProtocolMode, SchemaBuilder};
use wireframe_codec::value::{Instance, Value};
use wireframe_codec::{engine, Registry};

fn main() {
    println!("=== wireframe-codec Quickstart ===\n");

    // ======================================================================
    // 1. Declare a schema: a little-endian telemetry frame with a
    //    discriminator, a bit-packed status byte, and a fixed-point speed.
    // ======================================================================
    println!("1. Building a schema");

    let schema = SchemaBuilder::new("telemetry_frame", ProtocolMode::Binary)
        .default_endianness(Endianness::Little)
        .field(Field::u16("msg_id").as_discriminator().default(Value::U16(0x2001)))
        .field(Field::bit_group(
            "status",
            IntWidth::W8,
            vec![Bit::new("armed", 1), Bit::new("mode", 3), Bit::new("battery", 4)],
            BitOrder::Lsb,
        ))
        .field(Field::fixed_point(
            "speed_mps",
            7,
            8,
            FixedPointEncoding::DirectionMagnitude,
        ))
        .build()
        .expect("schema compiles");

    println!("   Schema `{}` compiled into {} plan step(s)\n", schema.name, schema.plan.steps.len());

    // ======================================================================
    // 2. Populate and encode an instance.
    // ======================================================================
    println!("2. Encoding an instance");

    let mut instance = Instance::new();
    instance.set("msg_id", Value::U16(0x2001));
    let mut status = std::collections::BTreeMap::new();
    status.insert("armed".to_string(), 1u64);
    status.insert("mode".to_string(), 2u64);
    status.insert("battery".to_string(), 9u64);
    instance.set("status", Value::Bits(status));
    instance.set("speed_mps", Value::Float(-3.5));

    let mut registry = Registry::new();
    registry.register(schema.clone());

    let bytes = engine::encode(&schema, &instance, &registry).expect("encode succeeds");
    print!("   Payload: ");
    for byte in &bytes {
        print!("{byte:02X} ");
    }
    println!("\n");

    // ======================================================================
    // 3. Identify the same bytes back through the registry.
    // ======================================================================
    println!("3. Identifying the payload through the registry");

    match registry.identify_binary(&bytes) {
        Ok((decoded, consumed)) => {
            println!("   Consumed {consumed} bytes");
            println!("   msg_id:   {:?}", decoded.get("msg_id"));
            println!("   status:   {:?}", decoded.get("status"));
            println!("   speed:    {:?}\n", decoded.get("speed_mps"));
        }
        Err(e) => eprintln!("   Identification failed: {e}\n"),
    }

    println!("Quickstart complete.");
}
