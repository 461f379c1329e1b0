//! Message registry and identification (§4.5, §4.6): keyed dispatch tables
//! that, given an in-flight buffer, find the one schema it decodes
//! against — binary messages by (discriminator offset, value), ascii
//! messages by (cmd_type, cmd_str).
use std::collections::BTreeMap;

use crate::engine;
use crate::error::DecodeError;
use crate::schema::{ProtocolMode, Schema};
use crate::value::Instance;

/// Add-only-then-read-only dispatch table. Register every schema during
/// start-up before constructing any [`crate::stream::StreamReassembler`];
/// identification only reads from the tables that exist at call time, so a
/// schema registered after a reassembler starts will simply never match.
#[derive(Debug, Default)]
pub struct Registry {
    schemas: BTreeMap<String, Schema>,
    /// `offset -> (discriminator value -> registration-order schema names)`,
    /// mirroring the spec's binary dispatch table (§3, §4.5 step 1): identify
    /// peeks the discriminator bytes at `offset`, looks up the observed value,
    /// and only trial-decodes the names found there. Names sharing a
    /// `(offset, value)` pair resolve deterministically in registration
    /// order (§4.5 step 2).
    binary_by_offset: BTreeMap<usize, BTreeMap<i64, Vec<String>>>,
    ascii_by_key: BTreeMap<(String, String), String>,
    active_config: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_config(&mut self, tag: impl Into<String>) {
        self.active_config = Some(tag.into());
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Registers `schema`, indexing it by discriminator offset (binary) or
    /// (cmd_type, cmd_str) (ascii). Nested-message schemas referenced only
    /// via [`crate::field::FieldKind::Message`] should also be registered
    /// here so the engine can resolve them by name.
    pub fn register(&mut self, schema: Schema) {
        match schema.mode {
            ProtocolMode::Binary => {
                if let Some(offset) = schema.plan.discriminator_offset {
                    let discriminator_value = schema
                        .discriminator_field()
                        .and_then(|f| f.default.as_ref())
                        .and_then(|v| v.as_i64());
                    match discriminator_value {
                        Some(value) => {
                            let by_value = self.binary_by_offset.entry(offset).or_default();
                            match by_value.get(&value).and_then(|names| names.first()) {
                                Some(existing) => {
                                    tracing::warn!(
                                        schema = %schema.name,
                                        existing = %existing,
                                        offset,
                                        value,
                                        "registering a schema that collides with an already-registered \
                                         (offset, discriminator value) pair; resolved by trial decode in \
                                         registration order"
                                    );
                                }
                                None => {
                                    tracing::debug!(schema = %schema.name, offset, value, "registered binary schema");
                                }
                            }
                            by_value.entry(value).or_default().push(schema.name.clone());
                        }
                        None => {
                            tracing::warn!(
                                schema = %schema.name,
                                offset,
                                "binary schema declares a discriminator field with no default value; it can \
                                 never be matched by identify_binary"
                            );
                        }
                    }
                } else {
                    tracing::debug!(schema = %schema.name, "registered binary schema with no discriminator (never matched by identify_binary)");
                }
            }
            ProtocolMode::Ascii => {
                let cmd_type = schema
                    .field("cmd_type")
                    .and_then(|f| f.default.as_ref())
                    .map(|v| v.to_ascii())
                    .unwrap_or_default();
                let cmd_str = schema
                    .field("cmd_str")
                    .and_then(|f| f.default.as_ref())
                    .map(|v| v.to_ascii())
                    .unwrap_or_default();
                if let Some(existing) = self.ascii_by_key.get(&(cmd_type.clone(), cmd_str.clone())) {
                    tracing::warn!(
                        schema = %schema.name,
                        existing = %existing,
                        cmd_type,
                        cmd_str,
                        "registering an ascii schema that overwrites an existing (cmd_type, cmd_str) key"
                    );
                } else {
                    tracing::debug!(schema = %schema.name, cmd_type, cmd_str, "registered ascii schema");
                }
                self.ascii_by_key.insert((cmd_type, cmd_str), schema.name.clone());
            }
        }
        self.schemas.insert(schema.name.clone(), schema);
    }

    /// Attempts to identify and fully decode the binary message at the
    /// front of `data`. See §4.5 for the exact algorithm: peek the
    /// discriminator field at each registered offset, look up its observed
    /// value, and only trial-decode schemas whose discriminator matches.
    pub fn identify_binary(&self, data: &[u8]) -> Result<(Instance, usize), DecodeError> {
        let mut saw_incomplete = false;

        for (&offset, by_value) in &self.binary_by_offset {
            // All schemas sharing an offset must agree on the discriminator
            // field's width and byte order to be peekable at all; use an
            // arbitrary registered candidate to resolve both.
            let sample = by_value.values().flatten().next().and_then(|name| self.schemas.get(name));
            let sample = match sample {
                Some(s) => s,
                None => continue,
            };
            let discriminator_field = match sample.discriminator_field() {
                Some(f) => f,
                None => continue,
            };
            if !discriminator_field.kind.is_packable() {
                continue;
            }
            let width = match discriminator_field.kind.fixed_size() {
                Some(w) => w,
                None => continue,
            };

            if data.len() <= offset {
                saw_incomplete = true;
                continue;
            }
            if data.len() < offset + width {
                saw_incomplete = true;
                continue;
            }

            let order = engine::resolve_order(discriminator_field, sample.default_endianness);
            let observed = match engine::decode_scalar(&discriminator_field.kind, &data[offset..offset + width], order).as_i64() {
                Some(v) => v,
                None => continue,
            };

            let names = match by_value.get(&observed) {
                Some(names) => names,
                None => continue,
            };

            for name in names {
                let schema = match self.schemas.get(name) {
                    Some(s) if s.is_active_for(self.active_config.as_deref()) => s,
                    _ => continue,
                };
                match engine::decode(schema, data, self) {
                    Ok(result) => return Ok(result),
                    Err(DecodeError::Incomplete { .. }) => saw_incomplete = true,
                    Err(_) => continue,
                }
            }
        }

        if saw_incomplete {
            Err(DecodeError::Incomplete {
                field: "<discriminator>".into(),
                needed: 1,
                available: data.len(),
            })
        } else {
            Err(DecodeError::Unknown)
        }
    }

    pub fn identify_ascii_key(&self, cmd_type: &str, cmd_str: &str) -> Option<&Schema> {
        self.ascii_by_key
            .get(&(cmd_type.to_string(), cmd_str.to_string()))
            .and_then(|name| self.schemas.get(name))
            .filter(|s| s.is_active_for(self.active_config.as_deref()))
    }
}
