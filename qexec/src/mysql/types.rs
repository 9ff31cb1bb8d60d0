//! Type conversion utilities for MySQL

use crate::error::{QueryError, Result};
use crate::params::{to_positional, Params};
use crate::value::Value;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::Value as MySqlValue;

/// Convert a qexec Value to a mysql_async Value
///
/// `None` for a date whose year MySQL cannot hold, i.e. outside `0..=9999`.
pub fn to_mysql_value(value: &Value) -> Option<MySqlValue> {
    let value = match value {
        Value::Null => MySqlValue::NULL,
        Value::Bool(v) => MySqlValue::from(*v),
        Value::I8(v) => MySqlValue::from(*v),
        Value::I16(v) => MySqlValue::from(*v),
        Value::I32(v) => MySqlValue::from(*v),
        Value::I64(v) => MySqlValue::from(*v),
        Value::U8(v) => MySqlValue::from(*v),
        Value::U16(v) => MySqlValue::from(*v),
        Value::U32(v) => MySqlValue::from(*v),
        Value::U64(v) => MySqlValue::from(*v),
        Value::F32(v) => MySqlValue::from(*v),
        Value::F64(v) => MySqlValue::from(*v),
        Value::String(v) => MySqlValue::from(v.as_str()),
        Value::Bytes(v) => MySqlValue::from(v.as_slice()),
        Value::Date(v) => {
            MySqlValue::Date(mysql_year(v.year())?, v.month() as u8, v.day() as u8, 0, 0, 0, 0)
        }
        Value::DateTime(v) => MySqlValue::Date(
            mysql_year(v.year())?,
            v.month() as u8,
            v.day() as u8,
            v.hour() as u8,
            v.minute() as u8,
            v.second() as u8,
            v.and_utc().timestamp_subsec_micros(),
        ),
        Value::Time(v) => MySqlValue::Time(
            false,
            0,
            v.hour() as u8,
            v.minute() as u8,
            v.second() as u8,
            v.nanosecond() / 1000,
        ),
        Value::Decimal(v) => MySqlValue::from(v.to_string()),
        Value::Json(v) => MySqlValue::from(v.to_string()),
    };
    Some(value)
}

fn mysql_year(year: i32) -> Option<u16> {
    u16::try_from(year).ok().filter(|&year| year <= 9999)
}

/// Bind a parameter set to the `:name` placeholders of `sql`.
///
/// Returns the query with each placeholder rewritten to `?` and the values
/// in placeholder order, repeated where a name is used more than once. An
/// empty set still means "prepare and execute", just with nothing bound.
pub fn to_mysql_params(sql: &str, params: &Params) -> Result<(String, mysql_async::Params)> {
    let (rewritten, names) = to_positional(sql);

    if let Some(name) = params.names().find(|name| !names.contains(name)) {
        return Err(QueryError::undefined_parameter(name));
    }
    if names.is_empty() {
        return Ok((rewritten, mysql_async::Params::Empty));
    }

    let values = names
        .iter()
        .map(|&name| {
            let value = params
                .get(name)
                .ok_or_else(|| QueryError::missing_parameter(name))?;
            to_mysql_value(value).ok_or_else(|| QueryError::datetime_overflow(name, value))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((rewritten, mysql_async::Params::Positional(values)))
}

/// Convert a mysql_async Value to a qexec Value.
///
/// Never fails: values chrono cannot represent, such as the zero date
/// `0000-00-00` or a TIME outside a single day, come back as their MySQL
/// text form.
pub fn from_mysql_value(value: MySqlValue) -> Value {
    match value {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Bytes(v) => match String::from_utf8(v) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        MySqlValue::Int(v) => Value::I64(v),
        MySqlValue::UInt(v) => Value::U64(v),
        MySqlValue::Float(v) => Value::F32(v),
        MySqlValue::Double(v) => Value::F64(v),
        MySqlValue::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(year.into(), month.into(), day.into());
            let is_date_only = hour == 0 && min == 0 && sec == 0 && micro == 0;
            match date {
                Some(date) if is_date_only => Value::Date(date),
                Some(date) => {
                    match NaiveTime::from_hms_micro_opt(hour.into(), min.into(), sec.into(), micro)
                    {
                        Some(time) => Value::DateTime(NaiveDateTime::new(date, time)),
                        None => Value::String(date_text(year, month, day, hour, min, sec, micro)),
                    }
                }
                None if is_date_only => {
                    Value::String(format!("{:04}-{:02}-{:02}", year, month, day))
                }
                None => Value::String(date_text(year, month, day, hour, min, sec, micro)),
            }
        }
        MySqlValue::Time(is_neg, days, hours, mins, secs, micro) => {
            let in_day = !is_neg && days == 0 && hours < 24;
            let time = in_day
                .then(|| {
                    NaiveTime::from_hms_micro_opt(hours.into(), mins.into(), secs.into(), micro)
                })
                .flatten();
            match time {
                Some(time) => Value::Time(time),
                None => {
                    let total_hours = days * 24 + u32::from(hours);
                    let mut text = format!(
                        "{}{:02}:{:02}:{:02}",
                        if is_neg { "-" } else { "" },
                        total_hours,
                        mins,
                        secs
                    );
                    if micro > 0 {
                        text.push_str(&format!(".{:06}", micro));
                    }
                    Value::String(text)
                }
            }
        }
    }
}

fn date_text(year: u16, month: u8, day: u8, hour: u8, min: u8, sec: u8, micro: u32) -> String {
    let mut text = format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hour, min, sec
    );
    if micro > 0 {
        text.push_str(&format!(".{:06}", micro));
    }
    text
}
