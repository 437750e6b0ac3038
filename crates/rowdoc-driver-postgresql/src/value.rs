use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rowdoc_core::{Error, Result, Value};
use rust_decimal::Decimal;
use std::fmt;
use tokio_postgres::{
    types::{accepts, FromSql, FromSqlOwned, Kind, Type},
    Row,
};

/// How a column's values are read, by (element) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conversion {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Uuid,
    Bytea,
    Json,
    Numeric,
    Timestamp,
    Timestamptz,
    Date,
    Time,
    Interval,
    /// The value as sent on the wire: text when it is valid UTF-8, bytes
    /// otherwise. Enum labels and most extension types arrive as text.
    Raw,
}

impl Conversion {
    pub(crate) fn of(ty: &Type) -> Self {
        // NOTE: the inner representation of the PostgreSQL type enum is not
        // accessible, so each type is matched by hand.
        if *ty == Type::BOOL {
            Self::Bool
        } else if *ty == Type::INT2 {
            Self::Int2
        } else if *ty == Type::INT4 {
            Self::Int4
        } else if *ty == Type::INT8 {
            Self::Int8
        } else if *ty == Type::FLOAT4 {
            Self::Float4
        } else if *ty == Type::FLOAT8 {
            Self::Float8
        } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
            Self::Text
        } else if *ty == Type::UUID {
            Self::Uuid
        } else if *ty == Type::BYTEA {
            Self::Bytea
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            Self::Json
        } else if *ty == Type::NUMERIC {
            Self::Numeric
        } else if *ty == Type::TIMESTAMP {
            Self::Timestamp
        } else if *ty == Type::TIMESTAMPTZ {
            Self::Timestamptz
        } else if *ty == Type::DATE {
            Self::Date
        } else if *ty == Type::TIME {
            Self::Time
        } else if *ty == Type::INTERVAL {
            Self::Interval
        } else {
            Self::Raw
        }
    }
}

/// Converts a PostgreSQL value within a row to a [`rowdoc_core::Value`].
///
/// Arrays become lists. Date, time and numeric values become their text
/// form, since documents only hold strings.
pub(crate) fn postgres_to_rowdoc(index: usize, row: &Row, ty: &Type) -> Result<Value> {
    let (element, array) = match ty.kind() {
        Kind::Array(element) => (element, true),
        _ => (ty, false),
    };

    match Conversion::of(element) {
        Conversion::Bool => read::<bool>(row, index, array, Value::from),
        Conversion::Int2 => read::<i16>(row, index, array, Value::from),
        Conversion::Int4 => read::<i32>(row, index, array, Value::from),
        Conversion::Int8 => read::<i64>(row, index, array, Value::from),
        Conversion::Float4 => read::<f32>(row, index, array, Value::from),
        Conversion::Float8 => read::<f64>(row, index, array, Value::from),
        Conversion::Text => read::<String>(row, index, array, Value::from),
        Conversion::Uuid => read::<uuid::Uuid>(row, index, array, Value::from),
        Conversion::Bytea => read::<Vec<u8>>(row, index, array, Value::from),
        Conversion::Json => read::<serde_json::Value>(row, index, array, Value::from),
        Conversion::Numeric => read::<Decimal>(row, index, array, text),
        Conversion::Timestamp => read::<NaiveDateTime>(row, index, array, text),
        Conversion::Timestamptz => read::<DateTime<Utc>>(row, index, array, text),
        Conversion::Date => read::<NaiveDate>(row, index, array, text),
        Conversion::Time => read::<NaiveTime>(row, index, array, text),
        Conversion::Interval => read::<Interval>(row, index, array, text),
        Conversion::Raw => {
            log::debug!("reading column as raw value; index={index}; type={ty}");
            read::<Raw>(row, index, array, Raw::into_value)
        }
    }
}

fn read<T>(row: &Row, index: usize, array: bool, to_value: impl Fn(T) -> Value) -> Result<Value>
where
    T: FromSqlOwned,
{
    if array {
        let items = row
            .try_get::<usize, Option<Vec<Option<T>>>>(index)
            .map_err(Error::driver)?;

        Ok(match items {
            Some(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| item.map(&to_value).unwrap_or_default())
                    .collect(),
            ),
            None => Value::Null,
        })
    } else {
        let value = row
            .try_get::<usize, Option<T>>(index)
            .map_err(Error::driver)?;

        Ok(value.map(to_value).unwrap_or_default())
    }
}

fn text<T: fmt::Display>(value: T) -> Value {
    Value::String(value.to_string())
}

type BoxError = Box<dyn std::error::Error + Sync + Send>;

/// An `interval`, displayed the way PostgreSQL's default output style does:
/// `1 year 2 mons 3 days 04:05:06.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    micros: i64,
    days: i32,
    months: i32,
}

impl<'a> FromSql<'a> for Interval {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        let raw: [u8; 16] = raw
            .try_into()
            .map_err(|_| format!("invalid interval length; len={}", raw.len()))?;

        let [m0, m1, m2, m3, m4, m5, m6, m7, d0, d1, d2, d3, n0, n1, n2, n3] = raw;

        Ok(Self {
            micros: i64::from_be_bytes([m0, m1, m2, m3, m4, m5, m6, m7]),
            days: i32::from_be_bytes([d0, d1, d2, d3]),
            months: i32::from_be_bytes([n0, n1, n2, n3]),
        })
    }

    accepts!(INTERVAL);
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn unit(n: i64, name: &str) -> String {
            if n == 1 || n == -1 {
                format!("{n} {name}")
            } else {
                format!("{n} {name}s")
            }
        }

        let mut parts = vec![];

        let years = i64::from(self.months / 12);
        let months = i64::from(self.months % 12);

        if years != 0 {
            parts.push(unit(years, "year"));
        }
        if months != 0 {
            parts.push(unit(months, "mon"));
        }
        if self.days != 0 {
            parts.push(unit(i64::from(self.days), "day"));
        }

        if self.micros != 0 || parts.is_empty() {
            let sign = if self.micros < 0 { "-" } else { "" };
            let micros = self.micros.unsigned_abs();
            let secs = micros / 1_000_000;
            let mut time = format!(
                "{sign}{:02}:{:02}:{:02}",
                secs / 3600,
                secs / 60 % 60,
                secs % 60
            );

            let fraction = micros % 1_000_000;
            if fraction != 0 {
                let digits = format!("{fraction:06}");
                time.push('.');
                time.push_str(digits.trim_end_matches('0'));
            }

            parts.push(time);
        }

        f.write_str(&parts.join(" "))
    }
}

/// Binary wire value of a type with no dedicated conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Raw(Vec<u8>);

impl Raw {
    fn into_value(self) -> Value {
        match String::from_utf8(self.0) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        }
    }
}

impl<'a> FromSql<'a> for Raw {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(Self(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_table() {
        let cases = [
            (Type::BOOL, Conversion::Bool),
            (Type::INT2, Conversion::Int2),
            (Type::INT4, Conversion::Int4),
            (Type::INT8, Conversion::Int8),
            (Type::FLOAT4, Conversion::Float4),
            (Type::FLOAT8, Conversion::Float8),
            (Type::TEXT, Conversion::Text),
            (Type::VARCHAR, Conversion::Text),
            (Type::BPCHAR, Conversion::Text),
            (Type::NAME, Conversion::Text),
            (Type::UUID, Conversion::Uuid),
            (Type::BYTEA, Conversion::Bytea),
            (Type::JSON, Conversion::Json),
            (Type::JSONB, Conversion::Json),
            (Type::NUMERIC, Conversion::Numeric),
            (Type::TIMESTAMP, Conversion::Timestamp),
            (Type::TIMESTAMPTZ, Conversion::Timestamptz),
            (Type::DATE, Conversion::Date),
            (Type::TIME, Conversion::Time),
            (Type::INTERVAL, Conversion::Interval),
            (Type::INET, Conversion::Raw),
            (Type::MONEY, Conversion::Raw),
            (Type::XML, Conversion::Raw),
        ];

        for (ty, expected) in cases {
            assert_eq!(Conversion::of(&ty), expected, "type={ty}");
        }
    }

    #[test]
    fn array_element_types_have_conversions() {
        for ty in [
            Type::FLOAT4_ARRAY,
            Type::UUID_ARRAY,
            Type::JSON_ARRAY,
            Type::JSONB_ARRAY,
            Type::NUMERIC_ARRAY,
            Type::TIMESTAMPTZ_ARRAY,
            Type::DATE_ARRAY,
        ] {
            let Kind::Array(element) = ty.kind() else {
                panic!("not an array type; type={ty}");
            };
            assert_ne!(Conversion::of(element), Conversion::Raw, "type={ty}");
        }
    }

    #[test]
    fn text_values_accept_their_column_types() {
        assert!(<Decimal as FromSql>::accepts(&Type::NUMERIC));
        assert!(<NaiveDateTime as FromSql>::accepts(&Type::TIMESTAMP));
        assert!(<DateTime<Utc> as FromSql>::accepts(&Type::TIMESTAMPTZ));
        assert!(<NaiveDate as FromSql>::accepts(&Type::DATE));
        assert!(<NaiveTime as FromSql>::accepts(&Type::TIME));
        assert!(<Vec<Option<f32>> as FromSql>::accepts(&Type::FLOAT4_ARRAY));
        assert!(<Vec<Option<Raw>> as FromSql>::accepts(&Type::INET_ARRAY));
    }

    #[test]
    fn date_and_time_text() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let time = NaiveTime::from_hms_milli_opt(7, 5, 0, 250).unwrap();

        assert_eq!(text(date), Value::from("2024-03-09"));
        assert_eq!(text(time), Value::from("07:05:00.250"));
        assert_eq!(text(date.and_time(time)), Value::from("2024-03-09 07:05:00.250"));
        assert_eq!(
            text(date.and_time(time).and_utc()),
            Value::from("2024-03-09 07:05:00.250 UTC")
        );
    }

    #[test]
    fn numeric_text_is_exact() {
        let value: Decimal = "12345678901234567890.0050".parse().unwrap();
        assert_eq!(text(value), Value::from("12345678901234567890.0050"));
    }

    fn interval(micros: i64, days: i32, months: i32) -> Interval {
        let mut raw = micros.to_be_bytes().to_vec();
        raw.extend_from_slice(&days.to_be_bytes());
        raw.extend_from_slice(&months.to_be_bytes());
        Interval::from_sql(&Type::INTERVAL, &raw).unwrap()
    }

    #[test]
    fn interval_text() {
        assert_eq!(interval(0, 0, 0).to_string(), "00:00:00");
        assert_eq!(
            interval(14_706_500_000, 3, 14).to_string(),
            "1 year 2 mons 3 days 04:05:06.5"
        );
        assert_eq!(interval(0, 1, 1).to_string(), "1 mon 1 day");
        assert_eq!(interval(-90_000_000, -2, 0).to_string(), "-2 days -00:01:30");
    }

    #[test]
    fn interval_rejects_short_input() {
        assert!(Interval::from_sql(&Type::INTERVAL, &[0; 8]).is_err());
    }

    #[test]
    fn raw_values_fall_back_to_text_then_bytes() {
        let label = Raw::from_sql(&Type::UNKNOWN, b"pending").unwrap();
        assert_eq!(label.into_value(), Value::from("pending"));

        let binary = Raw::from_sql(&Type::INET, &[2, 32, 0, 4, 10, 0, 0, 1]).unwrap();
        assert_eq!(binary.into_value(), Value::Bytes(vec![2, 32, 0, 4, 10, 0, 0, 1]));
    }
}
