// 对比本地与远程的表记录数

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::introspect::SchemaIntrospector;
use crate::db::DbHandle;
use crate::error::Result;
use crate::model::result::TableComparisonResult;

#[derive(Debug, Clone)]
pub struct Comparator {
    introspector: SchemaIntrospector,
    max_concurrency: usize,
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator::new(1)
    }
}

impl Comparator {
    pub fn new(max_concurrency: usize) -> Self {
        Comparator {
            introspector: SchemaIntrospector,
            max_concurrency: max_concurrency.max(1),
        }
    }

    // 每个表名一条结果，顺序与输入一致；并发时各表使用独立的池连接
    pub async fn compare(
        &self,
        local: &DbHandle,
        remote: &DbHandle,
        tables: &[String],
    ) -> Vec<TableComparisonResult> {
        if self.max_concurrency <= 1 || tables.len() <= 1 {
            let mut results = Vec::with_capacity(tables.len());
            for table in tables {
                results.push(self.compare_table(local, remote, table).await);
            }
            return results;
        }

        // 设置最大并发数
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = Vec::with_capacity(tables.len());
        for table in tables {
            let permit = semaphore.clone().acquire_owned().await.ok();
            let comparator = self.clone();
            let local = local.clone();
            let remote = remote.clone();
            let table_name = table.clone();
            let task = tokio::spawn(async move {
                let result = comparator.compare_table(&local, &remote, &table_name).await;
                // 释放信号量
                drop(permit);
                result
            });
            tasks.push((table.clone(), task));
        }

        // 按提交顺序等待，结果顺序与输入一致
        let mut results = Vec::with_capacity(tasks.len());
        for (table, task) in tasks {
            match task.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(table = %table, error = %e, "compare task failed");
                    results.push(TableComparisonResult::error(&table, e.to_string()));
                }
            }
        }
        results
    }

    pub async fn compare_table(
        &self,
        local: &DbHandle,
        remote: &DbHandle,
        table: &str,
    ) -> TableComparisonResult {
        match self.try_compare(local, remote, table).await {
            Ok(result) => {
                debug!(table = %table, status = ?result.status, "table compared");
                result
            }
            Err(e) => {
                warn!(table = %table, error = %e, "table compare failed");
                TableComparisonResult::error(table, e.detail())
            }
        }
    }

    // 缺表的一侧不做 COUNT；本地缺表时远程也不做 COUNT
    async fn try_compare(
        &self,
        local: &DbHandle,
        remote: &DbHandle,
        table: &str,
    ) -> Result<TableComparisonResult> {
        let local_exists = self.introspector.table_exists(local, table).await?;
        let remote_exists = self.introspector.table_exists(remote, table).await?;

        let result = match (local_exists, remote_exists) {
            // 两边都没有按 local_only 报告，不做任何 COUNT
            (false, false) => TableComparisonResult::local_only(table, None),
            (false, true) => TableComparisonResult::remote_only(table),
            (true, false) => {
                let local_count = self.introspector.row_count(local, table).await?;
                TableComparisonResult::local_only(table, Some(local_count))
            }
            (true, true) => {
                let local_count = self.introspector.row_count(local, table).await?;
                let remote_count = self.introspector.row_count(remote, table).await?;
                TableComparisonResult::counted(table, local_count, remote_count)
            }
        };
        Ok(result)
    }
}
