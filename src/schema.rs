//! Schema declaration and compilation: the programmatic surface named in
//! §6 — build an ordered field list, then compile it into an immutable
//! [`Schema`] carrying its [`crate::compiled::Plan`].
use crate::compiled::Plan;
use crate::error::SchemaError;
use crate::field::{Field, FieldKind, FixedPointEncoding, IntWidth, SmartRole};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMode {
    Binary,
    Ascii,
}

/// Message-level default endianness; unlike [`crate::field::ByteOrder`] this
/// has no `Inherit` variant — the schema must resolve to a concrete default.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Little
    }
}

/// An immutable, compiled message schema. Build one with [`SchemaBuilder`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub mode: ProtocolMode,
    pub default_endianness: Endianness,
    pub fields: Vec<Field>,
    /// Config tags this schema is restricted to; empty means unrestricted.
    pub config_tags: Vec<String>,
    /// The numeric id rendered as the four-hex-digit MSGID header in ascii
    /// frames (§4.6). Distinct from any same-named `Field` the schema also
    /// declares for its body — mirrors the reference implementation, where
    /// this was a plain class attribute alongside (not inside) the field list.
    pub ascii_msg_id: Option<i64>,
    pub plan: Plan,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn discriminator_field(&self) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| matches!(f.role, SmartRole::Discriminator))
    }

    pub fn is_active_for(&self, active_config: Option<&str>) -> bool {
        if self.config_tags.is_empty() {
            return true;
        }
        match active_config {
            Some(tag) => self.config_tags.iter().any(|t| t == tag),
            None => false,
        }
    }
}

/// Fluent assembler for a [`Schema`]. Mirrors the split between a build-time
/// descriptor and the runtime engine that consumes it: here both halves are
/// runtime, but the seam (`build()` running the layout compiler) is the same
/// shape external schema emitters target.
pub struct SchemaBuilder {
    name: String,
    mode: ProtocolMode,
    default_endianness: Endianness,
    fields: Vec<Field>,
    config_tags: Vec<String>,
    ascii_msg_id: Option<i64>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>, mode: ProtocolMode) -> Self {
        Self {
            name: name.into(),
            mode,
            default_endianness: Endianness::Little,
            fields: Vec::new(),
            config_tags: Vec::new(),
            ascii_msg_id: None,
        }
    }

    pub fn msg_id(mut self, id: i64) -> Self {
        self.ascii_msg_id = Some(id);
        self
    }

    pub fn default_endianness(mut self, endianness: Endianness) -> Self {
        self.default_endianness = endianness;
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn config_tag(mut self, tag: impl Into<String>) -> Self {
        self.config_tags.push(tag.into());
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.name.clone()) {
                return Err(SchemaError::DuplicateField(f.name.clone()));
            }
        }

        if self.mode == ProtocolMode::Ascii {
            require_ascii_system_field(&self.fields, "cmd_type")?;
            require_ascii_system_field(&self.fields, "cmd_str")?;
        }

        validate_smart_references(&self.fields)?;
        validate_checksum_algorithms(&self.fields)?;
        validate_fixed_point_widths(&self.fields)?;
        validate_bit_group_widths(&self.fields)?;

        let plan = match Plan::compile(&self.fields, self.default_endianness) {
            Ok(plan) => plan,
            Err(err) => {
                tracing::warn!(schema = %self.name, %err, "schema failed to compile");
                return Err(err);
            }
        };

        tracing::debug!(
            schema = %self.name,
            fields = self.fields.len(),
            steps = plan.steps.len(),
            discriminator_offset = ?plan.discriminator_offset,
            "compiled schema"
        );

        Ok(Schema {
            name: self.name,
            mode: self.mode,
            default_endianness: self.default_endianness,
            fields: self.fields,
            config_tags: self.config_tags,
            ascii_msg_id: self.ascii_msg_id,
            plan,
        })
    }
}

fn require_ascii_system_field(fields: &[Field], name: &'static str) -> Result<(), SchemaError> {
    let found = fields.iter().find(|f| f.name == name);
    match found {
        Some(f) if f.default.is_some() => Ok(()),
        Some(_) => Err(SchemaError::MissingSystemField("<schema>".into(), name)),
        None => Err(SchemaError::MissingSystemField("<schema>".into(), name)),
    }
}

fn validate_smart_references(fields: &[Field]) -> Result<(), SchemaError> {
    let names: std::collections::HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    for f in fields {
        match &f.role {
            SmartRole::Length { start_field, end_field } => {
                check_ref(&names, f, start_field)?;
                check_ref(&names, f, end_field)?;
            }
            SmartRole::Checksum {
                start_field,
                end_field,
                ..
            } => {
                check_ref(&names, f, start_field)?;
                check_ref(&names, f, end_field)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_ref(names: &std::collections::HashSet<&str>, f: &Field, reference: &str) -> Result<(), SchemaError> {
    if names.contains(reference) {
        Ok(())
    } else {
        Err(SchemaError::DanglingSmartReference(f.name.clone(), reference.to_string()))
    }
}

fn validate_checksum_algorithms(fields: &[Field]) -> Result<(), SchemaError> {
    for f in fields {
        if let SmartRole::Checksum { algorithm, .. } = &f.role {
            if !crate::checksum::known_algorithm(algorithm) {
                return Err(SchemaError::UnknownChecksumAlgorithm(algorithm.clone()));
            }
        }
    }
    Ok(())
}

/// Rejects fixed-point fields whose total value width (plus a sign bit for
/// `DirectionMagnitude`) doesn't fit any backing primitive up to 64 bits
/// (§4.1: "larger fails at schema build").
fn validate_fixed_point_widths(fields: &[Field]) -> Result<(), SchemaError> {
    for f in fields {
        if let FieldKind::FixedPoint {
            integer_bits,
            fractional_bits,
            encoding,
        } = &f.kind
        {
            let total = integer_bits + fractional_bits + matches!(encoding, FixedPointEncoding::DirectionMagnitude) as u32;
            if IntWidth::smallest_fitting(total).is_none() {
                return Err(SchemaError::FixedPointTooWide(f.name.clone(), total));
            }
        }
    }
    Ok(())
}

/// Rejects bit-groups whose summed sub-field widths exceed their backing
/// primitive (§4.1: "Σ w_i ≤ B").
fn validate_bit_group_widths(fields: &[Field]) -> Result<(), SchemaError> {
    for f in fields {
        if let FieldKind::BitGroup { backing, bits, .. } = &f.kind {
            let total: u32 = bits.iter().map(|b| b.width).sum();
            if total > backing.bits() {
                return Err(SchemaError::BitGroupOverflow(f.name.clone(), total, backing.bits()));
            }
        }
    }
    Ok(())
}
