//! Property-based test generators using proptest.
//!
//! Generated values survive a write to the table and back. Text may look
//! like a number (`007`, `1e3`) but is never exactly how an integer or float
//! renders, since such a cell reads back as that number. Floats are finite.

use modelreg_core::{FieldValue, ModelId, Record};
use proptest::prelude::*;

/// Strategy for generating allocator-shaped model ids.
pub fn model_id_strategy() -> impl Strategy<Value = ModelId> {
    (0u32..=99, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..5).prop_map(
        |(y, mo, d, h, mi, seq)| ModelId::new(format!("{y:02}{mo:02}{d:02}_{h:02}{mi:02}_{seq}")),
    )
}

/// Strategy for generating column names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}")
        .expect("Invalid regex")
        .prop_filter("`id` is the key column", |s| s != "id")
}

/// Strategy for generating scalar values, including null.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<i64>().prop_map(FieldValue::Int),
        (-1.0e9f64..1.0e9).prop_map(FieldValue::Float),
        text_strategy().prop_map(FieldValue::Text),
    ]
}

/// Strategy for generating non-empty text, including number-like text.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z][a-zA-Z0-9 ,;\"'-]{0,24}").expect("Invalid regex"),
        prop::string::string_regex("[0-9+.-][0-9eE.+-]{0,8}").expect("Invalid regex"),
    ]
    .prop_filter("a rendered number reads back as a number", |s| {
        FieldValue::parse_cell(s) == FieldValue::Text(s.clone())
    })
}

/// Strategy for generating a record with up to `max_fields` fields.
pub fn record_strategy(max_fields: usize) -> impl Strategy<Value = Record> {
    (
        model_id_strategy(),
        prop::collection::vec((field_name_strategy(), field_value_strategy()), 0..=max_fields),
    )
        .prop_map(|(id, fields)| {
            let mut record = Record::new(id);
            for (name, value) in fields {
                record.set(&name, value);
            }
            record
        })
}
