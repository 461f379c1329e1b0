//! `wireframe-codec`: a declarative message codec framework for telemetry
//! protocols running over TCP-style "sticky" transports.
//!
//! Users declare messages from a fixed catalog of field kinds (primitives,
//! strings, enums, fixed-point scalars, bit-packed groups, arrays, nested
//! messages) against a [`schema::SchemaBuilder`]. Building a schema compiles
//! it into an immutable [`compiled::Plan`] that the [`engine`] drives to
//! encode an [`value::Instance`] to bytes (or ascii text) and back. A
//! [`registry::Registry`] dispatches an in-flight buffer to the schema that
//! matches it, and a [`stream::StreamReassembler`] turns an arbitrarily
//! fragmented byte stream into a sequence of fully decoded instances.
//!
//! See `SPEC_FULL.md` for the full component design and `demos/` for
//! end-to-end usage of the schema-builder API.

/// Bit-level packing primitives shared by bit-group fields and the
/// discriminator-peeking cursor used during identification.
pub mod bits;
/// Checksum algorithms usable by a checksum smart field.
pub mod checksum;
/// The compiled packing plan: runs of fixed-width fields interleaved with
/// complex (variable-length) steps, plus resolved smart-field references.
pub mod compiled;
/// The codec engine: two-pass encode with smart-field backpatching, and
/// single-pass decode, both driven by a schema's compiled plan.
pub mod engine;
/// Error taxonomy for schema construction, encoding, and decoding.
pub mod error;
/// Field declarations: the leaf nodes a schema is assembled from.
pub mod field;
/// Message registry and identification: binary discriminator dispatch and
/// ascii (cmd_type, cmd_str) dispatch, filtered by an active configuration.
pub mod registry;
/// Schema declaration and compilation: the programmatic schema-builder API.
pub mod schema;
/// Stream reassembler: buffers fragmented bytes into complete instances.
pub mod stream;
/// The semantic value domain every field kind reads from and writes into.
pub mod value;
/// ASCII framed format: `<header|body|checksum>` framing and parsing.
pub mod ascii;

pub use bits::BitOrder;
pub use compiled::{Plan, Step};
pub use error::{BitCursorError, DecodeError, EncodeError, SchemaError};
pub use field::{ArrayMode, Bit, ByteOrder, Field, FieldKind, FixedPointEncoding, IntWidth, SmartRole};
pub use registry::Registry;
pub use schema::{Endianness, ProtocolMode, Schema, SchemaBuilder};
pub use stream::StreamReassembler;
pub use value::{Instance, Value};
