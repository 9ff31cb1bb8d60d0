//! Decoding mysql_async rows

use crate::row::ResultRow;
use mysql_async::Row as MySqlAsyncRow;

use super::types::from_mysql_value;

/// Decode a driver row into a [`ResultRow`], keeping column order.
pub fn to_result_row(mut row: MySqlAsyncRow) -> ResultRow {
    let names: Vec<String> = row
        .columns_ref()
        .iter()
        .map(|column| column.name_str().to_string())
        .collect();

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let value = row
                .take::<mysql_async::Value, usize>(i)
                .map(from_mysql_value)
                .unwrap_or(crate::Value::Null);
            (name, value)
        })
        .collect()
}
