use aws_sdk_dynamodb::types::AttributeValue;
use rowdoc_core::{Document, Error, FieldValue, Result};
use std::collections::HashMap;

/// Converts a document to a DynamoDB item.
///
/// Every field is stored as `S` and the path is stored under `key`. A field
/// named like the key attribute is rejected rather than overwritten.
pub(crate) fn document_to_item(
    document: Document,
    key: &str,
) -> Result<HashMap<String, AttributeValue>> {
    if document.fields.contains_key(key) {
        return Err(Error::configuration(format!(
            "field name clashes with the key attribute; pick another with `?key=`; \
             attribute={key}; document={}",
            document.name.as_str()
        )));
    }

    let mut item = HashMap::with_capacity(document.fields.len() + 1);

    for (name, value) in document.fields {
        item.insert(name, to_ddb(value));
    }

    item.insert(key.to_string(), AttributeValue::S(document.name.into_string()));
    Ok(item)
}

fn to_ddb(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::String(v) => AttributeValue::S(v),
    }
}
