pub mod connector;
pub mod decode;
pub mod dialect;

use std::str::FromStr;

use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySql, Pool, Postgres, Row, Sqlite};
use tracing::info;

use crate::error::{Result, SyncError};
use crate::model::descriptor::EngineKind;
use crate::model::table::{ColumnInfo, SqlRow};

use self::dialect::Dialect;

const LOCAL_MAX_CONNECTIONS: u32 = 4;

// 三种引擎的连接池，按引擎分派查询
#[derive(Clone, Debug)]
pub enum DbHandle {
    Sqlite(Pool<Sqlite>),
    Mysql(Pool<MySql>),
    Postgres(Pool<Postgres>),
}

impl DbHandle {
    // 打开本地库，sqlite 以只读方式打开
    pub async fn connect_local(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default().to_ascii_lowercase();
        info!(scheme = %scheme, "opening local store");
        let handle = match scheme.as_str() {
            "sqlite" => {
                let options = SqliteConnectOptions::from_str(url)
                    .map_err(SyncError::connection)?
                    .read_only(true);
                SqlitePoolOptions::new()
                    .max_connections(LOCAL_MAX_CONNECTIONS)
                    .connect_with(options)
                    .await
                    .map(DbHandle::Sqlite)
            }
            "mysql" => MySqlPoolOptions::new()
                .max_connections(LOCAL_MAX_CONNECTIONS)
                .connect(url)
                .await
                .map(DbHandle::Mysql),
            "postgres" | "postgresql" => PgPoolOptions::new()
                .max_connections(LOCAL_MAX_CONNECTIONS)
                .connect(url)
                .await
                .map(DbHandle::Postgres),
            other => {
                return Err(SyncError::Config(format!(
                    "unsupported local database url scheme: {:?}",
                    other
                )));
            }
        };
        handle.map_err(SyncError::connection)
    }

    pub fn engine(&self) -> EngineKind {
        match self {
            DbHandle::Sqlite(_) => EngineKind::Sqlite,
            DbHandle::Mysql(_) => EngineKind::Mysql,
            DbHandle::Postgres(_) => EngineKind::Postgres,
        }
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from(self.engine())
    }

    pub async fn ping(&self) -> std::result::Result<(), sqlx::Error> {
        match self {
            DbHandle::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            DbHandle::Mysql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            DbHandle::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        }
    }

    // 单值 COUNT 查询，bind 为可选的字符串参数
    pub async fn fetch_count(
        &self,
        sql: &str,
        bind: Option<&str>,
    ) -> std::result::Result<i64, sqlx::Error> {
        match self {
            DbHandle::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                if let Some(value) = bind {
                    query = query.bind(value);
                }
                query.fetch_one(pool).await?.try_get::<i64, _>(0)
            }
            DbHandle::Mysql(pool) => {
                let mut query = sqlx::query(sql);
                if let Some(value) = bind {
                    query = query.bind(value);
                }
                query.fetch_one(pool).await?.try_get::<i64, _>(0)
            }
            DbHandle::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                if let Some(value) = bind {
                    query = query.bind(value);
                }
                query.fetch_one(pool).await?.try_get::<i64, _>(0)
            }
        }
    }

    // 取第一列的字符串结果
    pub async fn fetch_strings(
        &self,
        sql: &str,
        bind: Option<&str>,
    ) -> std::result::Result<Vec<String>, sqlx::Error> {
        match self {
            DbHandle::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                if let Some(value) = bind {
                    query = query.bind(value);
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(|row| row.try_get::<String, _>(0)).collect()
            }
            DbHandle::Mysql(pool) => {
                let mut query = sqlx::query(sql);
                if let Some(value) = bind {
                    query = query.bind(value);
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(|row| decode::mysql_text(row, 0)).collect()
            }
            DbHandle::Postgres(pool) => {
                let mut query = sqlx::query(sql);
                if let Some(value) = bind {
                    query = query.bind(value);
                }
                let rows = query.fetch_all(pool).await?;
                rows.iter().map(|row| row.try_get::<String, _>(0)).collect()
            }
        }
    }

    // 列名 + 声明类型
    pub async fn fetch_columns(
        &self,
        sql: &str,
        table: &str,
    ) -> std::result::Result<Vec<ColumnInfo>, sqlx::Error> {
        match self {
            DbHandle::Sqlite(pool) => {
                let rows = sqlx::query(sql).bind(table).fetch_all(pool).await?;
                rows.iter()
                    .map(|row| {
                        let name = row.try_get::<String, _>(0)?;
                        let data_type = row.try_get::<Option<String>, _>(1)?.unwrap_or_default();
                        Ok(ColumnInfo::new(name, data_type))
                    })
                    .collect()
            }
            DbHandle::Mysql(pool) => {
                let rows = sqlx::query(sql).bind(table).fetch_all(pool).await?;
                rows.iter()
                    .map(|row| {
                        Ok(ColumnInfo::new(
                            decode::mysql_text(row, 0)?,
                            decode::mysql_text(row, 1)?,
                        ))
                    })
                    .collect()
            }
            DbHandle::Postgres(pool) => {
                let rows = sqlx::query(sql).bind(table).fetch_all(pool).await?;
                rows.iter()
                    .map(|row| {
                        Ok(ColumnInfo::new(
                            row.try_get::<String, _>(0)?,
                            row.try_get::<String, _>(1)?,
                        ))
                    })
                    .collect()
            }
        }
    }

    // 批量读取行，语句每批不同所以不缓存
    pub async fn fetch_rows(&self, sql: &str) -> std::result::Result<Vec<SqlRow>, sqlx::Error> {
        match self {
            DbHandle::Sqlite(pool) => {
                let rows = sqlx::query(sql).persistent(false).fetch_all(pool).await?;
                rows.iter().map(decode::sqlite_row).collect()
            }
            DbHandle::Mysql(pool) => {
                let rows = sqlx::query(sql).persistent(false).fetch_all(pool).await?;
                rows.iter().map(decode::mysql_row).collect()
            }
            DbHandle::Postgres(pool) => {
                let rows = sqlx::query(sql).persistent(false).fetch_all(pool).await?;
                rows.iter().map(decode::postgres_row).collect()
            }
        }
    }

    // 写入语句走简单查询协议，返回受影响行数
    pub async fn execute(&self, sql: &str) -> std::result::Result<u64, sqlx::Error> {
        match self {
            DbHandle::Sqlite(pool) => Ok(sqlx::raw_sql(sql).execute(pool).await?.rows_affected()),
            DbHandle::Mysql(pool) => Ok(sqlx::raw_sql(sql).execute(pool).await?.rows_affected()),
            DbHandle::Postgres(pool) => {
                Ok(sqlx::raw_sql(sql).execute(pool).await?.rows_affected())
            }
        }
    }

    pub async fn close(&self) {
        match self {
            DbHandle::Sqlite(pool) => pool.close().await,
            DbHandle::Mysql(pool) => pool.close().await,
            DbHandle::Postgres(pool) => pool.close().await,
        }
    }
}
