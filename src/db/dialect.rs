// 各数据库引擎的 SQL 方言差异：标识符引用、元数据查询、字面量、upsert 语法

use crate::model::descriptor::EngineKind;
use crate::model::table::{ColumnInfo, SqlRow, SqlValue, TargetHint};

const MYSQL_TABLE_EXISTS: &str = "SELECT COUNT(*) FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_name = ?";
const MYSQL_COLUMNS: &str = "SELECT column_name, data_type FROM information_schema.columns \
     WHERE table_schema = DATABASE() AND table_name = ? ORDER BY ordinal_position";
const MYSQL_PRIMARY_KEY: &str = "SELECT column_name FROM information_schema.key_column_usage \
     WHERE table_schema = DATABASE() AND table_name = ? AND constraint_name = 'PRIMARY' \
     ORDER BY ordinal_position";
const MYSQL_LIST_TABLES: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY table_name";

// information_schema 的列是 sql_identifier 域类型，需要转成 text 才能解码
const PG_TABLE_EXISTS: &str = "SELECT COUNT(*) FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_name = $1";
const PG_COLUMNS: &str = "SELECT column_name::text, data_type::text FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position";
const PG_PRIMARY_KEY: &str = "SELECT kcu.column_name::text \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON tc.constraint_name = kcu.constraint_name \
      AND tc.table_schema = kcu.table_schema \
      AND tc.table_name = kcu.table_name \
     WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public' AND tc.table_name = $1 \
     ORDER BY kcu.ordinal_position";
const PG_LIST_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name";

const SQLITE_TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?";
const SQLITE_COLUMNS: &str = "SELECT name, type FROM pragma_table_info(?) ORDER BY cid";
const SQLITE_PRIMARY_KEY: &str = "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk";
const SQLITE_LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

// postgres 里可以直接解码的列类型，其余类型读取时转成 text
const PG_NATIVE_TYPES: [&str; 14] = [
    "boolean",
    "smallint",
    "integer",
    "bigint",
    "real",
    "double precision",
    "text",
    "character varying",
    "character",
    "bytea",
    "timestamp without time zone",
    "timestamp with time zone",
    "date",
    "time without time zone",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Mysql,
    Postgres,
}

impl From<EngineKind> for Dialect {
    fn from(engine: EngineKind) -> Self {
        match engine {
            EngineKind::Sqlite => Dialect::Sqlite,
            EngineKind::Mysql => Dialect::Mysql,
            EngineKind::Postgres => Dialect::Postgres,
        }
    }
}

impl Dialect {
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    pub fn table_exists_sql(&self) -> &'static str {
        match self {
            Dialect::Mysql => MYSQL_TABLE_EXISTS,
            Dialect::Postgres => PG_TABLE_EXISTS,
            Dialect::Sqlite => SQLITE_TABLE_EXISTS,
        }
    }

    pub fn columns_sql(&self) -> &'static str {
        match self {
            Dialect::Mysql => MYSQL_COLUMNS,
            Dialect::Postgres => PG_COLUMNS,
            Dialect::Sqlite => SQLITE_COLUMNS,
        }
    }

    pub fn primary_key_sql(&self) -> &'static str {
        match self {
            Dialect::Mysql => MYSQL_PRIMARY_KEY,
            Dialect::Postgres => PG_PRIMARY_KEY,
            Dialect::Sqlite => SQLITE_PRIMARY_KEY,
        }
    }

    pub fn list_tables_sql(&self) -> &'static str {
        match self {
            Dialect::Mysql => MYSQL_LIST_TABLES,
            Dialect::Postgres => PG_LIST_TABLES,
            Dialect::Sqlite => SQLITE_LIST_TABLES,
        }
    }

    pub fn count_sql(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote_ident(table))
    }

    // 读取时的列表达式，驱动无法直接解码的类型先转成文本
    pub fn select_expr(&self, column: &ColumnInfo) -> String {
        let quoted = self.quote_ident(&column.name);
        let data_type = column.data_type.trim().to_ascii_lowercase();
        match self {
            Dialect::Postgres if !PG_NATIVE_TYPES.contains(&data_type.as_str()) => {
                format!("{}::text AS {}", quoted, quoted)
            }
            Dialect::Mysql if data_type == "time" => {
                format!("CAST({} AS CHAR) AS {}", quoted, quoted)
            }
            _ => quoted,
        }
    }

    pub fn select_batch_sql(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        order_by: &[String],
        limit: usize,
        offset: usize,
    ) -> String {
        let select_list = columns
            .iter()
            .map(|c| self.select_expr(c))
            .collect::<Vec<String>>()
            .join(", ");
        let mut sql = format!("SELECT {} FROM {}", select_list, self.quote_ident(table));
        if !order_by.is_empty() {
            let keys = order_by
                .iter()
                .map(|k| self.quote_ident(k))
                .collect::<Vec<String>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys);
        }
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
        sql
    }

    // 只转义单引号，反斜杠在任何引擎里都按原样保留
    pub fn escape_string(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    fn quote_string(&self, value: &str) -> String {
        match self {
            // MySQL 是否把反斜杠当转义符取决于 NO_BACKSLASH_ESCAPES，这类文本改用十六进制字面量
            Dialect::Mysql if value.contains(['\\', '\0']) => {
                let hex: String = value.bytes().map(|b| format!("{:02x}", b)).collect();
                format!("CONVERT(X'{}' USING utf8mb4)", hex)
            }
            _ => format!("'{}'", self.escape_string(value)),
        }
    }

    fn bool_literal(&self, value: bool, hint: TargetHint) -> String {
        let literal = match hint {
            TargetHint::Integer | TargetHint::Numeric => {
                if value {
                    "1"
                } else {
                    "0"
                }
            }
            TargetHint::Text => return self.quote_string(if value { "true" } else { "false" }),
            TargetHint::Boolean | TargetHint::Binary => {
                if value {
                    "TRUE"
                } else {
                    "FALSE"
                }
            }
        };
        literal.to_string()
    }

    pub fn render_value(&self, value: &SqlValue, hint: TargetHint) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => self.bool_literal(*b, hint),
            // sqlite 没有布尔类型，整数写入 postgres 布尔列需要转换
            SqlValue::Int(i) if hint == TargetHint::Boolean => self.bool_literal(*i != 0, hint),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) if !f.is_finite() => match self {
                Dialect::Postgres => {
                    let text = if f.is_nan() {
                        "NaN"
                    } else if *f > 0.0 {
                        "Infinity"
                    } else {
                        "-Infinity"
                    };
                    self.quote_string(text)
                }
                _ => "NULL".to_string(),
            },
            SqlValue::Float(f) if hint == TargetHint::Boolean => {
                self.bool_literal(*f != 0.0, hint)
            }
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => self.quote_string(s),
            SqlValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) if hint != TargetHint::Binary => self.quote_string(text),
                _ => self.bytes_literal(bytes),
            },
        }
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        match self {
            Dialect::Postgres => format!("'\\x{}'", hex),
            Dialect::Mysql | Dialect::Sqlite => format!("X'{}'", hex),
        }
    }

    // 一批数据一条多行 INSERT；有冲突键时生成 upsert，重复同步不会产生重复行
    // MySQL 总是带 ON DUPLICATE KEY UPDATE，作用于表上任意唯一键
    pub fn insert_batch_sql(
        &self,
        table: &str,
        columns: &[String],
        hints: &[TargetHint],
        rows: &[SqlRow],
        conflict_keys: &[String],
    ) -> String {
        let quoted_columns = columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<String>>()
            .join(", ");

        let values = rows
            .iter()
            .map(|row| {
                let cells = columns
                    .iter()
                    .enumerate()
                    .map(|(index, _)| {
                        let value = row.get(index).unwrap_or(&SqlValue::Null);
                        let hint = hints.get(index).copied().unwrap_or(TargetHint::Text);
                        self.render_value(value, hint)
                    })
                    .collect::<Vec<String>>()
                    .join(", ");
                format!("({})", cells)
            })
            .collect::<Vec<String>>()
            .join(", ");

        let mut statement = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.quote_ident(table),
            quoted_columns,
            values
        );

        let is_key = |column: &String| conflict_keys.iter().any(|k| k.eq_ignore_ascii_case(column));
        match self {
            Dialect::Mysql => {
                let mut assignments = columns
                    .iter()
                    .filter(|c| !is_key(*c))
                    .map(|c| {
                        let quoted = self.quote_ident(c);
                        format!("{} = VALUES({})", quoted, quoted)
                    })
                    .collect::<Vec<String>>();
                // 全部是主键列时写一个空操作赋值
                if assignments.is_empty() {
                    if let Some(first) = columns.first() {
                        let quoted = self.quote_ident(first);
                        assignments.push(format!("{} = {}", quoted, quoted));
                    }
                }
                if !assignments.is_empty() {
                    statement.push_str(" ON DUPLICATE KEY UPDATE ");
                    statement.push_str(&assignments.join(", "));
                }
            }
            Dialect::Postgres | Dialect::Sqlite if !conflict_keys.is_empty() => {
                let keys = conflict_keys
                    .iter()
                    .map(|k| self.quote_ident(k))
                    .collect::<Vec<String>>()
                    .join(", ");
                let updates = columns
                    .iter()
                    .filter(|c| !is_key(*c))
                    .map(|c| {
                        let quoted = self.quote_ident(c);
                        format!("{} = excluded.{}", quoted, quoted)
                    })
                    .collect::<Vec<String>>();
                statement.push_str(&format!(" ON CONFLICT ({})", keys));
                if updates.is_empty() {
                    statement.push_str(" DO NOTHING");
                } else {
                    statement.push_str(" DO UPDATE SET ");
                    statement.push_str(&updates.join(", "));
                }
            }
            _ => {}
        }

        statement
    }
}

#[cfg(test)]
mod test_dialect {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn quotes_identifiers_per_engine() {
        assert_eq!(Dialect::Mysql.quote_ident("or`ders"), "`or``ders`");
        assert_eq!(Dialect::Postgres.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Sqlite.count_sql("orders"), "SELECT COUNT(*) FROM \"orders\"");
    }

    #[test]
    fn escapes_strings_per_engine() {
        assert_eq!(Dialect::Mysql.escape_string(r"it's a\b"), r"it''s a\b");
        assert_eq!(Dialect::Postgres.escape_string(r"it's a\b"), r"it''s a\b");
    }

    #[test]
    fn mysql_backslash_text_does_not_depend_on_sql_mode() {
        let mysql = Dialect::Mysql;
        assert_eq!(
            mysql.render_value(&SqlValue::Text(r"C:\tmp".to_string()), TargetHint::Text),
            "CONVERT(X'433a5c746d70' USING utf8mb4)"
        );
        assert_eq!(
            mysql.render_value(&SqlValue::Text("a\0b".to_string()), TargetHint::Text),
            "CONVERT(X'610062' USING utf8mb4)"
        );
        assert_eq!(
            mysql.render_value(&SqlValue::Text("it's".to_string()), TargetHint::Text),
            "'it''s'"
        );
        assert_eq!(
            Dialect::Postgres.render_value(&SqlValue::Text(r"C:\tmp".to_string()), TargetHint::Text),
            r"'C:\tmp'"
        );
    }

    #[test]
    fn renders_values_with_target_hints() {
        let pg = Dialect::Postgres;
        assert_eq!(pg.render_value(&SqlValue::Int(1), TargetHint::Boolean), "TRUE");
        assert_eq!(pg.render_value(&SqlValue::Int(0), TargetHint::Boolean), "FALSE");
        assert_eq!(pg.render_value(&SqlValue::Int(42), TargetHint::Integer), "42");
        assert_eq!(pg.render_value(&SqlValue::Bool(true), TargetHint::Integer), "1");
        assert_eq!(pg.render_value(&SqlValue::Null, TargetHint::Text), "NULL");
        assert_eq!(
            pg.render_value(&SqlValue::Bytes(vec![0xde, 0xad]), TargetHint::Binary),
            "'\\xdead'"
        );
        assert_eq!(
            Dialect::Mysql.render_value(&SqlValue::Bytes(vec![0xde, 0xad]), TargetHint::Binary),
            "X'dead'"
        );
        assert_eq!(
            pg.render_value(&SqlValue::Bytes(b"abc".to_vec()), TargetHint::Text),
            "'abc'"
        );
        assert_eq!(
            pg.render_value(&SqlValue::Float(f64::NAN), TargetHint::Numeric),
            "'NaN'"
        );
        assert_eq!(
            Dialect::Mysql.render_value(&SqlValue::Float(f64::INFINITY), TargetHint::Numeric),
            "NULL"
        );
        assert_eq!(pg.render_value(&SqlValue::Float(2.5), TargetHint::Numeric), "2.5");
    }

    #[test]
    fn postgres_casts_non_native_columns_on_read() {
        let pg = Dialect::Postgres;
        assert_eq!(
            pg.select_expr(&ColumnInfo::new("amount", "numeric")),
            "\"amount\"::text AS \"amount\""
        );
        assert_eq!(pg.select_expr(&ColumnInfo::new("id", "bigint")), "\"id\"");
        assert_eq!(
            Dialect::Mysql.select_expr(&ColumnInfo::new("at", "time")),
            "CAST(`at` AS CHAR) AS `at`"
        );
    }

    #[test]
    fn builds_batch_select() {
        let sql = Dialect::Sqlite.select_batch_sql(
            "orders",
            &[ColumnInfo::new("id", "INTEGER"), ColumnInfo::new("amount", "REAL")],
            &names(&["id"]),
            500,
            1000,
        );
        assert_eq!(
            sql,
            "SELECT \"id\", \"amount\" FROM \"orders\" ORDER BY \"id\" LIMIT 500 OFFSET 1000"
        );
    }

    #[test]
    fn builds_postgres_upsert() {
        let rows = vec![
            vec![SqlValue::Int(1), SqlValue::Text("a'b".to_string())],
            vec![SqlValue::Int(2), SqlValue::Null],
        ];
        let sql = Dialect::Postgres.insert_batch_sql(
            "orders",
            &names(&["id", "note"]),
            &[TargetHint::Integer, TargetHint::Text],
            &rows,
            &names(&["id"]),
        );
        assert_eq!(
            sql,
            "INSERT INTO \"orders\" (\"id\", \"note\") VALUES (1, 'a''b'), (2, NULL) \
             ON CONFLICT (\"id\") DO UPDATE SET \"note\" = excluded.\"note\""
        );
    }

    #[test]
    fn postgres_without_keys_is_plain_insert() {
        let sql = Dialect::Postgres.insert_batch_sql(
            "logs",
            &names(&["msg"]),
            &[TargetHint::Text],
            &[vec![SqlValue::Text("x".to_string())]],
            &[],
        );
        assert_eq!(sql, "INSERT INTO \"logs\" (\"msg\") VALUES ('x')");
    }

    #[test]
    fn key_only_tables_do_nothing_on_conflict() {
        let sql = Dialect::Sqlite.insert_batch_sql(
            "tags",
            &names(&["id"]),
            &[TargetHint::Integer],
            &[vec![SqlValue::Int(7)]],
            &names(&["id"]),
        );
        assert!(sql.ends_with("ON CONFLICT (\"id\") DO NOTHING"));
    }

    #[test]
    fn builds_mysql_upsert() {
        let sql = Dialect::Mysql.insert_batch_sql(
            "orders",
            &names(&["id", "amount"]),
            &[TargetHint::Integer, TargetHint::Numeric],
            &[vec![SqlValue::Int(1), SqlValue::Float(9.5)]],
            &names(&["id"]),
        );
        assert_eq!(
            sql,
            "INSERT INTO `orders` (`id`, `amount`) VALUES (1, 9.5) \
             ON DUPLICATE KEY UPDATE `amount` = VALUES(`amount`)"
        );
    }

    #[test]
    fn short_rows_are_padded_with_null() {
        let sql = Dialect::Sqlite.insert_batch_sql(
            "t",
            &names(&["a", "b"]),
            &[TargetHint::Integer, TargetHint::Integer],
            &[vec![SqlValue::Int(1)]],
            &[],
        );
        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES (1, NULL)");
    }
}
