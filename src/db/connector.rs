// 远程数据库短连接：打开 -> 使用 -> 关闭

use std::str::FromStr;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::{debug, info, warn};

use super::DbHandle;
use crate::error::{Result, SyncError};
use crate::model::descriptor::{ConnectionDescriptor, EngineKind};
use crate::model::job::DEFAULT_CONNECT_TIMEOUT_SECS;

#[derive(Debug, Clone)]
pub struct Connector {
    connect_timeout: Duration,
    max_connections: u32,
}

impl Default for Connector {
    fn default() -> Self {
        Connector::new(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS), 1)
    }
}

impl Connector {
    pub fn new(connect_timeout: Duration, max_connections: u32) -> Self {
        Connector {
            connect_timeout,
            max_connections: max_connections.max(1),
        }
    }

    fn mysql_options(descriptor: &ConnectionDescriptor) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(descriptor.host())
            .port(descriptor.port())
            .username(descriptor.user())
            .password(descriptor.password())
            .database(descriptor.database())
            .charset("utf8mb4")
    }

    fn postgres_options(descriptor: &ConnectionDescriptor) -> Result<PgConnectOptions> {
        let mut options = PgConnectOptions::new()
            .host(descriptor.host())
            .port(descriptor.port())
            .username(descriptor.user())
            .password(descriptor.password())
            .database(descriptor.database())
            .application_name("cloudsync");
        if let Some(mode) = descriptor.ssl_mode() {
            let ssl_mode = PgSslMode::from_str(mode)
                .map_err(|e| SyncError::InvalidDescriptor(e.to_string()))?;
            options = options.ssl_mode(ssl_mode);
        }
        Ok(options)
    }

    // 整个握手受连接超时限制，之后做一次 SELECT 1 校验；失败时先关闭连接池再返回错误
    pub async fn open(&self, descriptor: &ConnectionDescriptor) -> Result<DbHandle> {
        info!(target_db = %descriptor, "opening remote connection");
        let connect = async {
            match descriptor.engine() {
                EngineKind::Mysql => MySqlPoolOptions::new()
                    .max_connections(self.max_connections)
                    .acquire_timeout(self.connect_timeout)
                    .connect_with(Self::mysql_options(descriptor))
                    .await
                    .map(DbHandle::Mysql)
                    .map_err(SyncError::connection),
                EngineKind::Postgres => match Self::postgres_options(descriptor) {
                    Ok(options) => PgPoolOptions::new()
                        .max_connections(self.max_connections)
                        .acquire_timeout(self.connect_timeout)
                        .connect_with(options)
                        .await
                        .map(DbHandle::Postgres)
                        .map_err(SyncError::connection),
                    Err(err) => Err(err),
                },
                EngineKind::Sqlite => Err(SyncError::InvalidDescriptor(
                    "sqlite is not a valid remote target".to_string(),
                )),
            }
        };

        let handle = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(err)) => {
                warn!(target_db = %descriptor, error = %err, "remote connection failed");
                return Err(err);
            }
            Err(_) => {
                warn!(target_db = %descriptor, "remote connection timed out");
                return Err(SyncError::Connection {
                    detail: format!(
                        "timed out after {}s connecting to {}:{}",
                        self.connect_timeout.as_secs(),
                        descriptor.host(),
                        descriptor.port()
                    ),
                });
            }
        };

        if let Err(err) = handle.ping().await {
            handle.close().await;
            return Err(SyncError::connection(err));
        }
        debug!(target_db = %descriptor, "remote connection verified");
        Ok(handle)
    }

    pub async fn close(&self, handle: &DbHandle) {
        handle.close().await;
        debug!(engine = %handle.engine(), "remote connection closed");
    }
}

#[cfg(test)]
mod test_connector {
    use super::*;

    fn descriptor(engine: EngineKind, port: u16) -> ConnectionDescriptor {
        ConnectionDescriptor::new(
            engine,
            "127.0.0.1",
            port,
            "sync",
            "secret",
            "cloud",
            Some("disable".to_string()),
        )
        .expect("Failed to build descriptor")
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        let connector = Connector::new(Duration::from_secs(3), 1);
        let result = connector.open(&descriptor(EngineKind::Postgres, 1)).await;
        assert!(matches!(result, Err(SyncError::Connection { .. })));
    }

    #[tokio::test]
    async fn sqlite_is_not_a_remote_target() {
        let connector = Connector::default();
        let result = connector.open(&descriptor(EngineKind::Sqlite, 1)).await;
        assert!(matches!(result, Err(SyncError::InvalidDescriptor(_))));
    }
}
