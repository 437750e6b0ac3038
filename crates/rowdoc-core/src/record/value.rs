use super::Record;

use std::fmt;

/// A single column value, as produced by a source.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),

    /// Raw bytes
    Bytes(Vec<u8>),

    /// Double-precision float
    F64(f64),

    /// Signed 64-bit integer. Narrower integer columns widen into this.
    I64(i64),

    /// A list of values
    List(Vec<Value>),

    /// Null value
    #[default]
    Null,

    /// Nested record, for struct or JSON object columns
    Record(Record),

    /// String value
    String(String),

    /// UUID value
    Uuid(uuid::Uuid),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the value's textual form.
    ///
    /// Scalars use their `Display` form. Null has no text and becomes the
    /// empty string. Lists and records render as compact JSON, keeping column
    /// order.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::String(v) => v.clone(),
            _ => self.to_string(),
        }
    }

    /// Converts the value to JSON. Used for the text form of nested values.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;

        match self {
            Self::Bool(v) => J::Bool(*v),
            Self::Bytes(v) => J::String(hex(v)),
            Self::F64(v) => serde_json::Number::from_f64(*v)
                .map(J::Number)
                .unwrap_or_else(|| J::String(v.to_string())),
            Self::I64(v) => J::Number((*v).into()),
            Self::List(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Self::Null => J::Null,
            Self::Record(record) => J::Object(
                record
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect(),
            ),
            Self::String(v) => J::String(v.clone()),
            Self::Uuid(v) => J::String(v.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => fmt::Display::fmt(v, f),
            Self::Bytes(v) => f.write_str(&hex(v)),
            Self::F64(v) => fmt::Display::fmt(v, f),
            Self::I64(v) => fmt::Display::fmt(v, f),
            Self::Null => Ok(()),
            Self::String(v) => f.write_str(v),
            Self::Uuid(v) => fmt::Display::fmt(v, f),
            Self::List(_) | Self::Record(_) => fmt::Display::fmt(&self.to_json(), f),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    use fmt::Write;

    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

impl From<bool> for Value {
    fn from(src: bool) -> Self {
        Self::Bool(src)
    }
}

impl From<i16> for Value {
    fn from(src: i16) -> Self {
        Self::I64(src.into())
    }
}

impl From<i32> for Value {
    fn from(src: i32) -> Self {
        Self::I64(src.into())
    }
}

impl From<i64> for Value {
    fn from(src: i64) -> Self {
        Self::I64(src)
    }
}

impl From<f32> for Value {
    fn from(src: f32) -> Self {
        Self::F64(src.into())
    }
}

impl From<f64> for Value {
    fn from(src: f64) -> Self {
        Self::F64(src)
    }
}

impl From<String> for Value {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&str> for Value {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(src: Vec<u8>) -> Self {
        Self::Bytes(src)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(src: uuid::Uuid) -> Self {
        Self::Uuid(src)
    }
}

impl From<Record> for Value {
    fn from(src: Record) -> Self {
        Self::Record(src)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(src: Option<T>) -> Self {
        match src {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(src: Vec<Value>) -> Self {
        Self::List(src)
    }
}

impl From<serde_json::Value> for Value {
    fn from(src: serde_json::Value) -> Self {
        use serde_json::Value as J;

        match src {
            J::Null => Self::Null,
            J::Bool(v) => Self::Bool(v),
            J::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::I64(v)
                } else if n.is_u64() {
                    // Above i64::MAX; kept exact as text.
                    Self::String(n.to_string())
                } else {
                    n.as_f64().map(Self::F64).unwrap_or(Self::String(n.to_string()))
                }
            }
            J::String(v) => Self::String(v),
            J::Array(items) => Self::List(items.into_iter().map(Value::from).collect()),
            J::Object(fields) => Self::Record(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            ),
        }
    }
}
