// 对外的三个操作：测试连接、对比数据、执行同步
// 远程连接每次调用单独打开，返回前一定关闭

use std::time::Duration;

use tracing::info;

use super::compare::Comparator;
use super::introspect::SchemaIntrospector;
use super::sync::Synchronizer;
use crate::db::DbHandle;
use crate::db::connector::Connector;
use crate::error::Result;
use crate::model::descriptor::ConnectionDescriptor;
use crate::model::job::SyncOptions;
use crate::model::result::{TableComparisonResult, TableSyncResult};

#[derive(Debug, Clone)]
pub struct SyncService {
    // 本地库与应用共享，只读使用
    local: DbHandle,
    connector: Connector,
    introspector: SchemaIntrospector,
    comparator: Comparator,
    synchronizer: Synchronizer,
    default_tables: Vec<String>,
}

impl SyncService {
    pub fn new(local: DbHandle, options: &SyncOptions) -> Self {
        let concurrency = options.max_concurrency.max(1);
        SyncService {
            local,
            connector: Connector::new(
                Duration::from_secs(options.connect_timeout_secs),
                concurrency as u32,
            ),
            introspector: SchemaIntrospector,
            comparator: Comparator::new(concurrency),
            synchronizer: Synchronizer::new(options.batch_size),
            default_tables: options.tables.clone(),
        }
    }

    pub async fn test_connection(&self, descriptor: &ConnectionDescriptor) -> Result<()> {
        let remote = self.connector.open(descriptor).await?;
        self.connector.close(&remote).await;
        info!(target_db = %descriptor, "connection test succeeded");
        Ok(())
    }

    // 未指定表时用配置的表清单，清单也为空则对比本地所有表
    pub async fn compare_data(
        &self,
        descriptor: &ConnectionDescriptor,
        tables: Option<&[String]>,
    ) -> Result<Vec<TableComparisonResult>> {
        let tables = self.resolve_tables(tables).await?;
        let remote = self.connector.open(descriptor).await?;
        let results = self.comparator.compare(&self.local, &remote, &tables).await;
        self.connector.close(&remote).await;
        info!(target_db = %descriptor, tables = results.len(), "compare finished");
        Ok(results)
    }

    pub async fn sync_tables(
        &self,
        descriptor: &ConnectionDescriptor,
        tables: &[String],
    ) -> Result<Vec<TableSyncResult>> {
        let remote = self.connector.open(descriptor).await?;
        let results = self
            .synchronizer
            .sync_tables(&self.local, &remote, tables)
            .await;
        self.connector.close(&remote).await;
        let failed = results.iter().filter(|r| r.is_failure()).count();
        info!(target_db = %descriptor, tables = results.len(), failed, "sync finished");
        Ok(results)
    }

    async fn resolve_tables(&self, requested: Option<&[String]>) -> Result<Vec<String>> {
        match requested {
            Some(tables) => Ok(tables.to_vec()),
            None if !self.default_tables.is_empty() => Ok(self.default_tables.clone()),
            None => self.introspector.list_tables(&self.local).await,
        }
    }
}
