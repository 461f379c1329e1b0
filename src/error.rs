//! Error taxonomy for schema construction, encoding, and decoding.
//!
//! Each failure surface gets its own enum so callers can match on the kind of
//! mistake without downcasting: building a [`crate::schema::Schema`] can only
//! ever fail with [`SchemaError`], encoding an instance can only fail with
//! [`EncodeError`], and so on.
use thiserror::Error;

/// Raised while compiling a [`crate::schema::Schema`] from declared fields.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SchemaError {
    #[error("field `{0}` is not defined on this schema")]
    UnknownField(String),

    #[error(
        "discriminator field `{0}` is preceded by a dynamically-sized field; its byte offset \
         cannot be computed statically"
    )]
    UnlocatableDiscriminator(String),

    #[error("fixed-point field `{0}` needs {1} bits, which exceeds the largest backing primitive (64 bits)")]
    FixedPointTooWide(String, u32),

    #[error("bit-group field `{0}` declares {1} bits of sub-fields, exceeding its {2}-bit backing primitive")]
    BitGroupOverflow(String, u32, u32),

    #[error("smart field `{0}` references unknown field `{1}`")]
    DanglingSmartReference(String, String),

    #[error("ascii schema `{0}` is missing a default for required system field `{1}`")]
    MissingSystemField(String, &'static str),

    #[error("field `{0}` is declared twice in the same schema")]
    DuplicateField(String),

    #[error("checksum algorithm `{0}` is not recognised")]
    UnknownChecksumAlgorithm(String),
}

/// Raised while decoding bytes (or ascii text) into an instance.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DecodeError {
    /// The buffer ended before the plan was fully consumed. Recoverable: a
    /// reassembler should wait for more bytes rather than treat this as
    /// corruption.
    #[error("need {needed} more byte(s) to decode field `{field}`, {available} available")]
    Incomplete {
        field: String,
        needed: usize,
        available: usize,
    },

    /// The bytes were structurally invalid for the ascii frame grammar
    /// (bad sentinel, wrong delimiter count, non-hex id).
    #[error("malformed ascii frame: {0}")]
    Malformed(String),

    /// No registered schema matched this buffer's discriminator / command key.
    #[error("no registered schema matches this input")]
    Unknown,
}

/// Raised while encoding an instance to bytes (or ascii text).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EncodeError {
    #[error("value for field `{field}` is out of range: {reason}")]
    OutOfRange { field: String, reason: String },

    #[error("field `{0}` has no value set and no default")]
    MissingValue(String),
}

/// Errors from the bit-level cursor primitives in [`crate::bits`].
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum BitCursorError {
    #[error("bit cursor read past end of buffer: requested {requested} bits, {remaining} remaining")]
    OutOfBounds { requested: u32, remaining: u32 },

    #[error("bit width {0} exceeds 64 bits, the largest value this cursor can hold")]
    WidthTooWide(u32),
}
