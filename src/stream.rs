//! Stream reassembler (§4.7): turns an arbitrarily fragmented byte stream
//! into a sequence of complete decoded instances, resynchronising on
//! corruption by dropping a single byte at a time.
use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::ascii::AsciiConfig;
use crate::error::DecodeError;
use crate::registry::Registry;
use crate::value::Instance;

/// Which wire format(s) the reassembler should try against the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMode {
    Binary,
    Ascii,
    /// Try binary identification first, then ascii; used when a connection
    /// may carry either framing.
    Auto,
}

/// Buffering adapter around a [`Registry`]. One instance per connection.
pub struct StreamReassembler {
    buffer: Vec<u8>,
    mode: ProtocolMode,
    ascii_config: AsciiConfig,
}

impl StreamReassembler {
    pub fn new(mode: ProtocolMode) -> Self {
        Self {
            buffer: Vec::new(),
            mode,
            ascii_config: AsciiConfig::default(),
        }
    }

    pub fn with_ascii_config(mut self, config: AsciiConfig) -> Self {
        self.ascii_config = config;
        self
    }

    /// Appends `bytes` to the internal buffer and drains as many complete
    /// messages as possible into `out`, in arrival order.
    pub fn feed(&mut self, bytes: &[u8], registry: &Registry, out: &mut VecDeque<Instance>) {
        self.buffer.extend_from_slice(bytes);

        loop {
            if self.buffer.is_empty() {
                return;
            }

            match self.try_identify(registry) {
                Ok((instance, consumed)) => {
                    trace!(consumed, "reassembler decoded a complete message");
                    self.buffer.drain(..consumed);
                    out.push_back(instance);
                }
                Err(DecodeError::Incomplete { .. }) => {
                    return;
                }
                Err(DecodeError::Unknown) | Err(DecodeError::Malformed(_)) => {
                    debug!(
                        dropped_byte = self.buffer[0],
                        remaining = self.buffer.len(),
                        "resynchronising: dropping one byte"
                    );
                    self.buffer.remove(0);
                }
            }
        }
    }

    fn try_identify(&self, registry: &Registry) -> Result<(Instance, usize), DecodeError> {
        match self.mode {
            ProtocolMode::Binary => registry.identify_binary(&self.buffer),
            ProtocolMode::Ascii => crate::ascii::parse_frame(&self.buffer, registry, &self.ascii_config),
            ProtocolMode::Auto => match registry.identify_binary(&self.buffer) {
                Ok(result) => Ok(result),
                Err(DecodeError::Incomplete { .. }) => {
                    crate::ascii::parse_frame(&self.buffer, registry, &self.ascii_config)
                }
                Err(_) => {
                    let ascii_result = crate::ascii::parse_frame(&self.buffer, registry, &self.ascii_config);
                    if ascii_result.is_err() {
                        warn!("neither binary nor ascii identification matched the buffer prefix");
                    }
                    ascii_result
                }
            },
        }
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine;
    use crate::field::Field;
    use crate::schema::{ProtocolMode as SchemaProtocolMode, SchemaBuilder};
    use crate::value::Value;

    fn sample_registry() -> (Registry, Vec<u8>) {
        let schema = SchemaBuilder::new("ping", SchemaProtocolMode::Binary)
            .field(Field::u16("msg_id").as_discriminator().default(Value::U16(0x10)))
            .field(Field::u8("seq"))
            .build()
            .unwrap();
        let mut registry = Registry::new();
        registry.register(schema.clone());

        let mut buf = Vec::new();
        for seq in 0..100u8 {
            let mut instance = Instance::new();
            instance.set("msg_id", Value::U16(0x10));
            instance.set("seq", Value::U8(seq));
            buf.extend(engine::encode(&schema, &instance, &registry).unwrap());
        }
        (registry, buf)
    }

    #[test]
    fn fragmentation_invariance_matches_spec_scenario_five() {
        let (registry, full_buffer) = sample_registry();
        let mut reassembler = StreamReassembler::new(ProtocolMode::Binary);
        let mut out = VecDeque::new();

        // Feed in fixed 3-byte chunks to exercise arbitrary fragmentation
        // without pulling in a randomness dependency.
        for chunk in full_buffer.chunks(3) {
            reassembler.feed(chunk, &registry, &mut out);
        }

        assert_eq!(out.len(), 100);
        for (i, instance) in out.iter().enumerate() {
            assert_eq!(instance.get("seq"), Some(&Value::U8(i as u8)));
        }
    }

    #[test]
    fn resynchronises_past_injected_garbage() {
        let (registry, full_buffer) = sample_registry();
        let mut corrupted = full_buffer[..3].to_vec();
        corrupted.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        corrupted.extend_from_slice(&full_buffer[3..6]);

        let mut reassembler = StreamReassembler::new(ProtocolMode::Binary);
        let mut out = VecDeque::new();
        reassembler.feed(&corrupted, &registry, &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("seq"), Some(&Value::U8(0)));
        assert_eq!(out[1].get("seq"), Some(&Value::U8(1)));
    }

    #[test]
    fn single_byte_chunks_still_reassemble() {
        let (registry, full_buffer) = sample_registry();
        let mut reassembler = StreamReassembler::new(ProtocolMode::Binary);
        let mut out = VecDeque::new();
        for byte in &full_buffer {
            reassembler.feed(std::slice::from_ref(byte), &registry, &mut out);
        }
        assert_eq!(out.len(), 100);
    }
}
