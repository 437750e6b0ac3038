use crate::{FieldValue, Fields, Record};

/// Maps one record to a document field map.
///
/// Every column becomes a field of the same name holding the value's text
/// form (see [`Value::to_text`](crate::Value::to_text)). No column is added
/// or dropped and names are not validated.
pub fn map_record(record: &Record) -> Fields {
    let mut fields = Fields::with_capacity(record.len());

    for (name, value) in record.iter() {
        fields.insert(name.to_string(), FieldValue::String(value.to_text()));
    }

    fields
}
