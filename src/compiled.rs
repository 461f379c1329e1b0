//! The layout compiler (§4.2): turns a declared field list into a
//! [`Plan`] of coalesced fixed-width runs and complex (variable-length)
//! steps, and resolves every smart field's references to field indices so
//! the engine never needs a name lookup in its hot path.
use crate::error::SchemaError;
use crate::field::{Field, SmartRole};
use crate::schema::Endianness;

/// One step of the compiled plan, referencing fields by index into the
/// owning [`crate::schema::Schema::fields`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub enum Step {
    /// A contiguous run of fixed-width, packable fields sharing one
    /// resolved endianness, encoded/decoded as a single byte span.
    FixedRun {
        field_indices: Vec<usize>,
        endianness: Endianness,
        byte_size: usize,
    },
    /// A single field whose size is not known ahead of encode time, or
    /// which does not coalesce with neighbours (string, array, nested
    /// message).
    Complex { field_index: usize },
}

/// A smart field's references, resolved to field indices.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ResolvedSmartField {
    pub field_index: usize,
    pub start_field_index: usize,
    pub end_field_index: usize,
    pub algorithm: Option<String>,
}

/// The compiled packing plan for a schema.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub steps: Vec<Step>,
    pub discriminator_field_index: Option<usize>,
    /// Statically computable byte offset of the discriminator field from
    /// the start of the message, if every preceding field is fixed-size.
    pub discriminator_offset: Option<usize>,
    pub length_fields: Vec<ResolvedSmartField>,
    pub checksum_fields: Vec<ResolvedSmartField>,
    pub timestamp_field_indices: Vec<usize>,
}

impl Plan {
    pub fn compile(fields: &[Field], default_endianness: Endianness) -> Result<Plan, SchemaError> {
        let mut steps = Vec::new();
        let mut run: Vec<usize> = Vec::new();
        let mut run_endianness: Option<Endianness> = None;
        let mut run_size = 0usize;

        let flush = |steps: &mut Vec<Step>, run: &mut Vec<usize>, run_endianness: &mut Option<Endianness>, run_size: &mut usize| {
            if !run.is_empty() {
                steps.push(Step::FixedRun {
                    field_indices: std::mem::take(run),
                    endianness: run_endianness.take().unwrap_or(Endianness::Little),
                    byte_size: *run_size,
                });
                *run_size = 0;
            }
        };

        for (idx, field) in fields.iter().enumerate() {
            let resolved_order = resolve_endianness(field, default_endianness);
            let packable = field.kind.is_packable() && field.kind.fixed_size().is_some();

            if packable && (run_endianness.is_none() || run_endianness == Some(resolved_order)) {
                run.push(idx);
                run_endianness = Some(resolved_order);
                run_size += field.kind.fixed_size().expect("packable implies fixed size");
            } else {
                flush(&mut steps, &mut run, &mut run_endianness, &mut run_size);
                if packable {
                    run.push(idx);
                    run_endianness = Some(resolved_order);
                    run_size += field.kind.fixed_size().expect("packable implies fixed size");
                } else {
                    steps.push(Step::Complex { field_index: idx });
                }
            }
        }
        flush(&mut steps, &mut run, &mut run_endianness, &mut run_size);

        let discriminator_field_index = fields
            .iter()
            .position(|f| matches!(f.role, SmartRole::Discriminator));

        let discriminator_offset = match discriminator_field_index {
            Some(disc_idx) => Some(static_offset_of(fields, disc_idx).ok_or_else(|| {
                SchemaError::UnlocatableDiscriminator(fields[disc_idx].name.clone())
            })?),
            None => None,
        };

        let name_to_index: std::collections::HashMap<&str, usize> =
            fields.iter().enumerate().map(|(i, f)| (f.name.as_str(), i)).collect();

        let mut length_fields = Vec::new();
        let mut checksum_fields = Vec::new();
        let mut timestamp_field_indices = Vec::new();

        for (idx, field) in fields.iter().enumerate() {
            match &field.role {
                SmartRole::Length { start_field, end_field } => {
                    length_fields.push(ResolvedSmartField {
                        field_index: idx,
                        start_field_index: *name_to_index.get(start_field.as_str()).unwrap(),
                        end_field_index: *name_to_index.get(end_field.as_str()).unwrap(),
                        algorithm: None,
                    });
                }
                SmartRole::Checksum {
                    start_field,
                    end_field,
                    algorithm,
                } => {
                    checksum_fields.push(ResolvedSmartField {
                        field_index: idx,
                        start_field_index: *name_to_index.get(start_field.as_str()).unwrap(),
                        end_field_index: *name_to_index.get(end_field.as_str()).unwrap(),
                        algorithm: Some(algorithm.clone()),
                    });
                }
                SmartRole::Timestamp { .. } => timestamp_field_indices.push(idx),
                _ => {}
            }
        }

        Ok(Plan {
            steps,
            discriminator_field_index,
            discriminator_offset,
            length_fields,
            checksum_fields,
            timestamp_field_indices,
        })
    }
}

fn resolve_endianness(field: &Field, default_endianness: Endianness) -> Endianness {
    match field.byte_order {
        crate::field::ByteOrder::Inherit => default_endianness,
        crate::field::ByteOrder::Little => Endianness::Little,
        crate::field::ByteOrder::Big => Endianness::Big,
    }
}

/// Sums the fixed sizes of every field before `index`; `None` if any of
/// them is dynamically sized.
fn static_offset_of(fields: &[Field], index: usize) -> Option<usize> {
    let mut offset = 0usize;
    for field in &fields[..index] {
        offset += field.kind.fixed_size()?;
    }
    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn coalesces_contiguous_primitives() {
        let fields = vec![
            Field::u16("magic").big_endian(),
            Field::u8("version"),
            Field::u16("value").little_endian(),
        ];
        let plan = Plan::compile(&fields, Endianness::Little).unwrap();
        // magic(big) alone, version+nothing coalesce with value? version is
        // Inherit->Little, value is explicit Little: they share endianness
        // and both coalesce, magic splits off because it's Big.
        assert_eq!(plan.steps.len(), 2);
    }

    #[test]
    fn discriminator_offset_after_fixed_prefix() {
        let fields = vec![
            Field::u8("sync"),
            Field::u16("msg_id").as_discriminator(),
        ];
        let plan = Plan::compile(&fields, Endianness::Little).unwrap();
        assert_eq!(plan.discriminator_offset, Some(1));
    }

    #[test]
    fn discriminator_after_dynamic_field_is_rejected() {
        let fields = vec![
            Field::string_prefixed("label"),
            Field::u16("msg_id").as_discriminator(),
        ];
        let err = Plan::compile(&fields, Endianness::Little).unwrap_err();
        assert!(matches!(err, SchemaError::UnlocatableDiscriminator(_)));
    }
}
