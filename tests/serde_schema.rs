//! Exercises the optional `serde` feature: a declared (pre-compile) field
//! list round-trips through JSON, for hand-off to the out-of-scope editor
//! and code-emitter tooling named in spec.md §1.
#![cfg(feature = "serde")]

use wireframe_codec::field::{Field, FieldKind};

#[test]
fn field_list_round_trips_through_json() {
    let fields = vec![
        Field::u16("msg_id").as_discriminator(),
        Field::string_fixed("label", 16),
        Field::new(
            "mode",
            FieldKind::Enum {
                backing: wireframe_codec::field::IntWidth::W8,
                members: vec![],
                ascii_as_string: false,
            },
        ),
    ];

    let json = serde_json::to_string(&fields).expect("serializes");
    let restored: Vec<Field> = serde_json::from_str(&json).expect("deserializes");

    assert_eq!(restored.len(), fields.len());
    assert_eq!(restored[0].name, "msg_id");
    assert!(matches!(restored[1].kind, FieldKind::StringFixed { len: 16 }));
}
