//! ASCII framed format (§4.6): `<header|body|checksum>` with configurable
//! sentinels and delimiters, mirroring the reference `ProtocolConfig`
//! singleton as an explicit, injectable value instead of process-wide
//! mutable state (see §5 and the discussion in SPEC_FULL.md §9).
use crate::checksum;
use crate::error::{DecodeError, EncodeError};
use crate::field::{FieldKind, SmartRole};
use crate::registry::Registry;
use crate::schema::Schema;
use crate::value::{Instance, Value};

/// Sentinel and delimiter configuration for ascii framing. The defaults
/// match the reference protocol exactly.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    pub start: char,
    pub end: char,
    pub delim_field: char,
    pub delim_id: char,
    pub delim_type: char,
    pub delim_cmd: char,
    pub use_checksum: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            start: '<',
            end: '>',
            delim_field: ';',
            delim_id: '|',
            delim_type: '|',
            delim_cmd: '|',
            use_checksum: true,
        }
    }
}

/// Builds the ascii frame for `instance` against `schema`. `registry` is
/// consulted only to resolve nested-message field order (§4.6); pass an
/// empty one if the schema has no `FieldKind::Message` fields.
pub fn build_frame(schema: &Schema, instance: &Instance, registry: &Registry, config: &AsciiConfig) -> Result<String, EncodeError> {
    let cmd_type = schema
        .field("cmd_type")
        .and_then(|f| instance.get("cmd_type").or(f.default.as_ref()))
        .map(Value::to_ascii)
        .unwrap_or_default();
    let cmd_str = schema
        .field("cmd_str")
        .and_then(|f| instance.get("cmd_str").or(f.default.as_ref()))
        .map(Value::to_ascii)
        .unwrap_or_default();
    let msg_id = schema.ascii_msg_id.unwrap_or(0);

    let header = format!(
        "{:04X}{}{}{}{}{}",
        msg_id, config.delim_id, cmd_type, config.delim_type, cmd_str, config.delim_cmd
    );

    let mut body = String::new();
    for field in &schema.fields {
        if field.name == "cmd_type" || field.name == "cmd_str" {
            continue;
        }
        if matches!(field.role, SmartRole::Checksum { .. } | SmartRole::Discriminator) {
            continue;
        }
        let value = instance
            .get(&field.name)
            .or(field.default.as_ref())
            .ok_or_else(|| EncodeError::MissingValue(field.name.clone()))?;
        body.push_str(&render_value_ascii(&field.kind, value, registry));
        body.push(config.delim_field);
    }

    let content_to_hash = format!("{}{}{}", config.start, header, body);
    let checksum_str = if config.use_checksum {
        let chk = checksum::xor_sum(content_to_hash.as_bytes());
        format!("{chk:02X}")
    } else {
        String::new()
    };

    Ok(format!("{content_to_hash}{checksum_str}{}", config.end))
}

/// Locates and decodes the leading ascii frame in `data`. Returns the
/// instance and the number of *bytes* consumed (ascii content is assumed to
/// be single-byte-per-char, as in the reference protocol).
pub fn parse_frame(data: &[u8], registry: &Registry, config: &AsciiConfig) -> Result<(Instance, usize), DecodeError> {
    if data.is_empty() || data[0] != config.start as u8 {
        return Err(DecodeError::Unknown);
    }
    let end_pos = match data.iter().position(|&b| b == config.end as u8) {
        Some(p) => p,
        None => {
            return Err(DecodeError::Incomplete {
                field: "<ascii frame>".into(),
                needed: 1,
                available: data.len(),
            })
        }
    };

    let frame = std::str::from_utf8(&data[..end_pos]).map_err(|_| DecodeError::Malformed("invalid utf-8 in ascii frame".into()))?;
    let without_start = &frame[config.start.len_utf8()..];

    let (content_no_checksum, checksum_text) = if config.use_checksum {
        if without_start.len() < 2 {
            return Err(DecodeError::Malformed("ascii frame shorter than its checksum suffix".into()));
        }
        let split_at = without_start.len() - 2;
        (&without_start[..split_at], Some(&without_start[split_at..]))
    } else {
        (without_start, None)
    };

    if let Some(checksum_text) = checksum_text {
        let expected = u8::from_str_radix(checksum_text, 16)
            .map_err(|_| DecodeError::Malformed(format!("invalid checksum hex `{checksum_text}`")))?;
        let content_to_hash = format!("{}{}", config.start, content_no_checksum);
        let actual = checksum::xor_sum(content_to_hash.as_bytes());
        if actual != expected {
            return Err(DecodeError::Malformed("ascii checksum mismatch".into()));
        }
    }

    let mut id_parts = content_no_checksum.splitn(2, config.delim_id);
    let msg_id_hex = id_parts.next().unwrap_or("");
    let rest = id_parts.next().ok_or_else(|| DecodeError::Malformed("missing id delimiter".into()))?;

    let msg_id = i64::from_str_radix(msg_id_hex, 16).map_err(|_| DecodeError::Malformed(format!("invalid hex msg id `{msg_id_hex}`")))?;

    let mut type_parts = rest.splitn(2, config.delim_type);
    let cmd_type = type_parts.next().unwrap_or("");
    let rest = type_parts.next().ok_or_else(|| DecodeError::Malformed("missing type delimiter".into()))?;

    let mut cmd_parts = rest.splitn(2, config.delim_cmd);
    let cmd_str = cmd_parts.next().unwrap_or("");
    let body = cmd_parts.next().unwrap_or("");

    let schema = registry.identify_ascii_key(cmd_type, cmd_str).ok_or(DecodeError::Unknown)?;

    let mut tokens: Vec<&str> = body.split(config.delim_field).collect();
    if tokens.last() == Some(&"") {
        tokens.pop();
    }

    let body_fields: Vec<_> = schema
        .fields
        .iter()
        .filter(|f| {
            f.name != "cmd_type"
                && f.name != "cmd_str"
                && !matches!(f.role, SmartRole::Checksum { .. } | SmartRole::Discriminator)
        })
        .collect();

    if tokens.len() != body_fields.len() {
        return Err(DecodeError::Malformed(format!(
            "expected {} body fields, found {}",
            body_fields.len(),
            tokens.len()
        )));
    }

    let mut instance = Instance::new();
    instance.set("cmd_type", Value::Str(cmd_type.to_string()));
    instance.set("cmd_str", Value::Str(cmd_str.to_string()));
    let _ = msg_id;

    for (field, token) in body_fields.iter().zip(tokens.iter()) {
        instance.set(field.name.clone(), parse_ascii_value(field, token));
    }

    Ok((instance, end_pos + 1))
}

/// Renders `value` (declared as `kind`) the way it appears in an ascii body:
/// fixed-length strings space-padded to their declared width (unlike the
/// null-padding used in binary mode, per `tests/common.py`'s kitchen-sink
/// fixture in the reference implementation); arrays and nested messages
/// comma-joined recursively using the nested schema's declared field order,
/// looked up in `registry`, rather than `Value::to_ascii`'s schema-unaware
/// (and for `Message`, alphabetical) fallback.
fn render_value_ascii(kind: &FieldKind, value: &Value, registry: &Registry) -> String {
    match kind {
        FieldKind::StringFixed { len } => {
            let s = value.as_str().unwrap_or("");
            format!("{s:<len$}", len = *len)
        }
        FieldKind::Array { item, .. } => match value {
            Value::Array(items) => items
                .iter()
                .map(|v| render_value_ascii(item, v, registry))
                .collect::<Vec<_>>()
                .join(","),
            other => other.to_ascii(),
        },
        FieldKind::Message { schema_name } => match (registry.schema(schema_name), value) {
            (Some(nested_schema), Value::Message(inst)) => nested_schema
                .fields
                .iter()
                .map(|f| {
                    inst.get(&f.name)
                        .or(f.default.as_ref())
                        .map(|v| render_value_ascii(&f.kind, v, registry))
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join(","),
            // Schema not registered: fall back to the unordered rendering
            // rather than failing the whole frame.
            _ => value.to_ascii(),
        },
        _ => value.to_ascii(),
    }
}

fn parse_ascii_value(field: &crate::field::Field, token: &str) -> Value {
    match &field.kind {
        FieldKind::Enum { members, ascii_as_string, .. } => {
            if let Some(member) = members.iter().find(|m| m.name == token) {
                Value::Enum {
                    value: member.value,
                    name: Some(member.name.clone()),
                }
            } else if *ascii_as_string {
                Value::Str(token.to_string())
            } else if let Ok(v) = token.parse::<i64>() {
                Value::Enum { value: v, name: None }
            } else {
                Value::Str(token.to_string())
            }
        }
        FieldKind::Bool => Value::Bool(token.eq_ignore_ascii_case("true")),
        FieldKind::F32 => token.parse().map(Value::F32).unwrap_or(Value::F32(0.0)),
        FieldKind::F64 => token.parse().map(Value::F64).unwrap_or(Value::F64(0.0)),
        FieldKind::I8 | FieldKind::I16 | FieldKind::I32 | FieldKind::I64 => {
            token.parse().map(Value::I64).unwrap_or(Value::I64(0))
        }
        FieldKind::StringFixed { .. } => Value::Str(token.trim_end().to_string()),
        FieldKind::StringPrefixed => Value::Str(token.to_string()),
        _ => token.parse().map(Value::U64).unwrap_or(Value::Str(token.to_string())),
    }
}
