// 把各引擎的行解码成通用的 SqlValue

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

use crate::model::table::{SqlRow, SqlValue};

// 时间统一输出为不带时区的 UTC 文本，三种引擎都能接受
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

fn datetime_text(value: NaiveDateTime) -> SqlValue {
    SqlValue::Text(value.format(DATETIME_FORMAT).to_string())
}

// sqlite 按值的实际存储类型解码
pub fn sqlite_row(row: &SqliteRow) -> Result<SqlRow, sqlx::Error> {
    let mut values = Vec::with_capacity(row.len());
    for i in 0..row.len() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let type_name = raw.type_info().name().to_string();
        let value = match type_name.as_str() {
            "INTEGER" => SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?),
            "REAL" => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
            "BLOB" => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
            _ => SqlValue::Text(row.try_get_unchecked::<String, _>(i)?),
        };
        values.push(value);
    }
    Ok(values)
}

pub fn mysql_row(row: &MySqlRow) -> Result<SqlRow, sqlx::Error> {
    let mut values = Vec::with_capacity(row.len());
    for i in 0..row.len() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let type_name = raw.type_info().name().to_string();
        let value = if type_name == "BOOLEAN" {
            SqlValue::Bool(row.try_get_unchecked::<bool, _>(i)?)
        } else if type_name.ends_with("UNSIGNED") {
            let v = row.try_get_unchecked::<u64, _>(i)?;
            i64::try_from(v)
                .map(SqlValue::Int)
                .unwrap_or_else(|_| SqlValue::Text(v.to_string()))
        } else {
            match type_name.as_str() {
                "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
                    SqlValue::Int(row.try_get_unchecked::<i64, _>(i)?)
                }
                "FLOAT" => SqlValue::Float(row.try_get_unchecked::<f32, _>(i)? as f64),
                "DOUBLE" => SqlValue::Float(row.try_get_unchecked::<f64, _>(i)?),
                "DATETIME" => datetime_text(row.try_get::<NaiveDateTime, _>(i)?),
                "TIMESTAMP" => datetime_text(row.try_get::<DateTime<Utc>, _>(i)?.naive_utc()),
                "DATE" => SqlValue::Text(row.try_get::<NaiveDate, _>(i)?.to_string()),
                "TIME" => SqlValue::Text(
                    row.try_get::<NaiveTime, _>(i)?
                        .format(TIME_FORMAT)
                        .to_string(),
                ),
                "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB"
                | "BIT" | "GEOMETRY" => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                // VARCHAR / TEXT / DECIMAL / JSON / ENUM 都以文本传输
                _ => match row.try_get_unchecked::<String, _>(i) {
                    Ok(text) => SqlValue::Text(text),
                    Err(_) => SqlValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                },
            }
        };
        values.push(value);
    }
    Ok(values)
}

// 非原生类型在查询里已经转成 text
pub fn postgres_row(row: &PgRow) -> Result<SqlRow, sqlx::Error> {
    let mut values = Vec::with_capacity(row.len());
    for i in 0..row.len() {
        let raw = row.try_get_raw(i)?;
        if raw.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let type_name = raw.type_info().name().to_string();
        let value = match type_name.as_str() {
            "BOOL" => SqlValue::Bool(row.try_get::<bool, _>(i)?),
            "INT2" => SqlValue::Int(row.try_get::<i16, _>(i)? as i64),
            "INT4" => SqlValue::Int(row.try_get::<i32, _>(i)? as i64),
            "INT8" => SqlValue::Int(row.try_get::<i64, _>(i)?),
            "FLOAT4" => SqlValue::Float(row.try_get::<f32, _>(i)? as f64),
            "FLOAT8" => SqlValue::Float(row.try_get::<f64, _>(i)?),
            "BYTEA" => SqlValue::Bytes(row.try_get::<Vec<u8>, _>(i)?),
            "TIMESTAMP" => datetime_text(row.try_get::<NaiveDateTime, _>(i)?),
            "TIMESTAMPTZ" => datetime_text(row.try_get::<DateTime<Utc>, _>(i)?.naive_utc()),
            "DATE" => SqlValue::Text(row.try_get::<NaiveDate, _>(i)?.to_string()),
            "TIME" => SqlValue::Text(
                row.try_get::<NaiveTime, _>(i)?
                    .format(TIME_FORMAT)
                    .to_string(),
            ),
            _ => SqlValue::Text(row.try_get::<String, _>(i)?),
        };
        values.push(value);
    }
    Ok(values)
}

// information_schema 里的文本列在部分 MySQL 版本中以二进制返回
pub fn mysql_text(row: &MySqlRow, index: usize) -> Result<String, sqlx::Error> {
    match row.try_get::<String, _>(index) {
        Ok(text) => Ok(text),
        Err(_) => {
            let bytes = row.try_get::<Vec<u8>, _>(index)?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}

#[cfg(test)]
mod test_decode {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    #[tokio::test]
    async fn decodes_sqlite_storage_classes() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open sqlite");
        let row = sqlx::query("SELECT 7, 2.5, 'hi', x'beef', NULL")
            .fetch_one(&pool)
            .await
            .expect("Failed to query");
        let values = sqlite_row(&row).expect("Failed to decode row");
        assert_eq!(
            values,
            vec![
                SqlValue::Int(7),
                SqlValue::Float(2.5),
                SqlValue::Text("hi".to_string()),
                SqlValue::Bytes(vec![0xbe, 0xef]),
                SqlValue::Null,
            ]
        );
    }
}
