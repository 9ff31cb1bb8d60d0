//! FromValue trait for reading typed values out of fetched rows

use std::fmt::Display;
use std::str::FromStr;

use crate::error::ValueError;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

type Result<T> = std::result::Result<T, ValueError>;

/// Trait for types that can be constructed from a database value.
///
/// Queries run without parameters use the MySQL text protocol, which
/// returns every column as a string. The numeric and temporal
/// implementations therefore also parse `Value::String`, so the same
/// `row.get::<i64>("id")` works whichever path fetched the row.
pub trait FromValue: Sized {
    /// Convert a database value to this type.
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> ValueError {
    ValueError::TypeConversion {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn in_range<S, T>(v: S, expected: &'static str) -> Result<T>
where
    S: Copy + Display,
    T: TryFrom<S>,
{
    T::try_from(v).map_err(|_| ValueError::TypeConversion {
        expected,
        actual: format!("{} out of range", v),
    })
}

fn parse_text<T: FromStr>(s: &str, expected: &'static str) -> Result<T> {
    s.trim().parse().map_err(|_| ValueError::TypeConversion {
        expected,
        actual: format!("unparseable string {:?}", s),
    })
}

macro_rules! impl_from_value_int {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Bool(v) => Ok(<$t>::from(v)),
                        Value::I8(v) => in_range(v, $name),
                        Value::I16(v) => in_range(v, $name),
                        Value::I32(v) => in_range(v, $name),
                        Value::I64(v) => in_range(v, $name),
                        Value::U8(v) => in_range(v, $name),
                        Value::U16(v) => in_range(v, $name),
                        Value::U32(v) => in_range(v, $name),
                        Value::U64(v) => in_range(v, $name),
                        Value::String(ref s) => parse_text(s, $name),
                        other => Err(mismatch($name, &other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_int! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F32(v) => Ok(v.into()),
            Value::F64(v) => Ok(v),
            Value::I8(v) => Ok(v.into()),
            Value::I16(v) => Ok(v.into()),
            Value::I32(v) => Ok(v.into()),
            Value::I64(v) => Ok(v as f64),
            Value::U8(v) => Ok(v.into()),
            Value::U16(v) => Ok(v.into()),
            Value::U32(v) => Ok(v.into()),
            Value::U64(v) => Ok(v as f64),
            Value::Decimal(v) => v.to_f64().ok_or_else(|| mismatch("f64", &value)),
            Value::String(ref s) => parse_text(s, "f64"),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F32(v) => Ok(v),
            Value::String(ref s) => parse_text(s, "f32"),
            other => f64::from_value(other).map(|v| v as f32),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::String(ref s) => match s.trim() {
                "1" | "true" | "TRUE" => Ok(true),
                "0" | "false" | "FALSE" => Ok(false),
                _ => Err(ValueError::TypeConversion {
                    expected: "bool",
                    actual: format!("unparseable string {:?}", s),
                }),
            },
            other => i64::from_value(other)
                .map(|v| v != 0)
                .map_err(|_| ValueError::TypeConversion {
                    expected: "bool",
                    actual: "non-integer value".to_string(),
                }),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            Value::Bytes(v) => String::from_utf8(v).map_err(|e| ValueError::TypeConversion {
                expected: "utf8 string",
                actual: format!("invalid utf8: {}", e),
            }),
            Value::I8(v) => Ok(v.to_string()),
            Value::I16(v) => Ok(v.to_string()),
            Value::I32(v) => Ok(v.to_string()),
            Value::I64(v) => Ok(v.to_string()),
            Value::U8(v) => Ok(v.to_string()),
            Value::U16(v) => Ok(v.to_string()),
            Value::U32(v) => Ok(v.to_string()),
            Value::U64(v) => Ok(v.to_string()),
            Value::F32(v) => Ok(v.to_string()),
            Value::F64(v) => Ok(v.to_string()),
            Value::Decimal(v) => Ok(v.to_string()),
            Value::Date(v) => Ok(v.to_string()),
            Value::DateTime(v) => Ok(v.to_string()),
            Value::Time(v) => Ok(v.to_string()),
            Value::Json(v) => Ok(v.to_string()),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::String(v) => Ok(v.into_bytes()),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.date()),
            Value::String(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| mismatch("date", &value)),
            other => Err(mismatch("date", &other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::DateTime(v) => Ok(v),
            Value::Date(v) => Ok(v.and_time(NaiveTime::default())),
            Value::String(ref s) => NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
                .map_err(|_| mismatch("datetime", &value)),
            other => Err(mismatch("datetime", &other)),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Time(v) => Ok(v),
            Value::DateTime(v) => Ok(v.time()),
            Value::String(ref s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                .map_err(|_| mismatch("time", &value)),
            other => Err(mismatch("time", &other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::I8(v) => Ok(Decimal::from(v)),
            Value::I16(v) => Ok(Decimal::from(v)),
            Value::I32(v) => Ok(Decimal::from(v)),
            Value::I64(v) => Ok(Decimal::from(v)),
            Value::U8(v) => Ok(Decimal::from(v)),
            Value::U16(v) => Ok(Decimal::from(v)),
            Value::U32(v) => Ok(Decimal::from(v)),
            Value::U64(v) => Ok(Decimal::from(v)),
            Value::String(ref s) => parse_text(s, "decimal"),
            other => Err(mismatch("decimal", &other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v),
            Value::String(v) => serde_json::from_str(&v).map_err(|e| ValueError::TypeConversion {
                expected: "json",
                actual: format!("invalid json: {}", e),
            }),
            other => Err(mismatch("json", &other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_from_binary_values() {
        assert_eq!(i64::from_value(Value::I64(-3)).unwrap(), -3);
        assert_eq!(u32::from_value(Value::I64(7)).unwrap(), 7);
        assert!(u8::from_value(Value::I64(300)).is_err());
        assert!(i8::from_value(Value::I64(-1)).is_ok());
        assert!(u64::from_value(Value::I64(-1)).is_err());
    }

    #[test]
    fn test_integers_from_text_protocol() {
        assert_eq!(i64::from_value(Value::String("42".into())).unwrap(), 42);
        assert_eq!(u64::from_value(Value::String(" 9 ".into())).unwrap(), 9);
        let err = i32::from_value(Value::String("abc".into())).unwrap_err();
        assert!(matches!(err, ValueError::TypeConversion { expected: "i32", .. }));
    }

    #[test]
    fn test_bool() {
        assert!(bool::from_value(Value::I64(1)).unwrap());
        assert!(!bool::from_value(Value::String("0".into())).unwrap());
        assert!(bool::from_value(Value::String("maybe".into())).is_err());
    }

    #[test]
    fn test_string_from_numbers() {
        assert_eq!(String::from_value(Value::I64(5)).unwrap(), "5");
        assert_eq!(String::from_value(Value::String("x".into())).unwrap(), "x");
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn test_temporal_from_text() {
        let date = NaiveDate::from_value(Value::String("2024-03-01".into())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let dt = NaiveDateTime::from_value(Value::String("2024-03-01 12:30:05".into())).unwrap();
        assert_eq!(dt.date(), date);

        let t = NaiveTime::from_value(Value::String("08:15:00.250000".into())).unwrap();
        assert_eq!(t, NaiveTime::from_hms_milli_opt(8, 15, 0, 250).unwrap());
    }

    #[test]
    fn test_decimal_and_float() {
        let d = Decimal::from_value(Value::String("12.50".into())).unwrap();
        assert_eq!(d, Decimal::new(1250, 2));
        assert_eq!(f64::from_value(Value::Decimal(d)).unwrap(), 12.5);
        assert_eq!(f32::from_value(Value::F64(1.5)).unwrap(), 1.5);
    }

    #[test]
    fn test_decimal_and_float_from_every_integer_width() {
        assert_eq!(f64::from_value(Value::I8(-8)).unwrap(), -8.0);
        assert_eq!(f64::from_value(Value::I32(70_000)).unwrap(), 70_000.0);
        assert_eq!(f64::from_value(Value::U16(65_535)).unwrap(), 65_535.0);
        assert_eq!(f32::from_value(Value::U32(7)).unwrap(), 7.0);
        assert_eq!(Decimal::from_value(Value::I16(-300)).unwrap(), Decimal::from(-300));
        assert_eq!(Decimal::from_value(Value::U8(255)).unwrap(), Decimal::from(255));
        assert_eq!(Decimal::from_value(Value::I32(12)).unwrap(), Decimal::new(12, 0));
    }

    #[test]
    fn test_option() {
        assert_eq!(Option::<i64>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(Value::String("1".into())).unwrap(),
            Some(1)
        );
    }
}
