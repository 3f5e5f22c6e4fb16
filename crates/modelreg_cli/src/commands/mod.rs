//! CLI command implementations.

pub mod list;
pub mod prune;
pub mod show;
pub mod unlock;
pub mod verify;

use modelreg_core::{FieldValue, Record, ID_COLUMN};
use serde_json::{Map, Number, Value};

/// Converts a row to a JSON object keyed by column name.
pub fn record_to_json(record: &Record) -> Value {
    let mut obj = Map::new();
    obj.insert(ID_COLUMN.to_string(), Value::String(record.id().to_string()));
    for (name, value) in record.fields() {
        obj.insert(name.to_string(), field_to_json(value));
    }
    Value::Object(obj)
}

fn field_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Int(v) => Value::Number((*v).into()),
        FieldValue::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        FieldValue::Text(s) => Value::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelreg_core::ModelId;

    #[test]
    fn record_json_has_id_and_fields() {
        let mut record = Record::new(ModelId::from("240101_1200_0"));
        record.set("name", "alpha".into());
        record.set("epochs", FieldValue::Int(3));
        record.set("loss", FieldValue::Float(0.5));

        let json = record_to_json(&record);
        assert_eq!(json["id"], "240101_1200_0");
        assert_eq!(json["name"], "alpha");
        assert_eq!(json["epochs"], 3);
        assert_eq!(json["loss"], 0.5);
    }
}
