// 把本地表数据批量写入远程表
// 每张表独立处理，一张表失败不影响后续表

use tracing::{debug, info, warn};

use super::introspect::SchemaIntrospector;
use crate::db::DbHandle;
use crate::error::{Result, SyncError};
use crate::model::job::DEFAULT_BATCH_SIZE;
use crate::model::result::{SyncStatus, TableSyncResult};
use crate::model::table::ColumnMapping;

// 单表传输的累计结果，批次失败不中断循环
#[derive(Debug)]
pub struct TransferAccumulator {
    table: String,
    rows_copied: u64,
    ok_batches: usize,
    failed_batches: usize,
    first_error: Option<String>,
}

impl TransferAccumulator {
    pub fn new(table: &str) -> Self {
        TransferAccumulator {
            table: table.to_string(),
            rows_copied: 0,
            ok_batches: 0,
            failed_batches: 0,
            first_error: None,
        }
    }

    pub fn batch_ok(&mut self, rows: usize) {
        self.ok_batches += 1;
        self.rows_copied += rows as u64;
    }

    pub fn batch_failed(&mut self, err: &SyncError) {
        self.failed_batches += 1;
        if self.first_error.is_none() {
            self.first_error = Some(err.detail());
        }
    }

    pub fn finish(self) -> TableSyncResult {
        let status = if self.failed_batches == 0 {
            SyncStatus::Success
        } else if self.ok_batches > 0 {
            SyncStatus::Partial
        } else {
            SyncStatus::Failed
        };
        TableSyncResult {
            table_name: self.table,
            rows_copied: self.rows_copied,
            status,
            error_detail: if status == SyncStatus::Success {
                None
            } else {
                self.first_error
            },
        }
    }
}

// 分页读取必须有确定顺序：优先本地主键（不要求出现在映射列里），没有主键时按全部映射列排序
pub fn batch_order(local_keys: &[String], mapping: &ColumnMapping) -> Vec<String> {
    if !local_keys.is_empty() {
        return local_keys.to_vec();
    }
    mapping.local.iter().map(|c| c.name.clone()).collect()
}

#[derive(Debug, Clone)]
pub struct Synchronizer {
    introspector: SchemaIntrospector,
    batch_size: usize,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Synchronizer::new(DEFAULT_BATCH_SIZE)
    }
}

impl Synchronizer {
    pub fn new(batch_size: usize) -> Self {
        Synchronizer {
            introspector: SchemaIntrospector,
            batch_size: batch_size.max(1),
        }
    }

    // 按顺序同步，每个表名恰好一条结果
    // 表失败后 ping 远程，连接已断开时剩余表直接记为 failed
    pub async fn sync_tables(
        &self,
        local: &DbHandle,
        remote: &DbHandle,
        tables: &[String],
    ) -> Vec<TableSyncResult> {
        let mut results = Vec::with_capacity(tables.len());
        let mut connection_lost: Option<String> = None;

        for table in tables {
            if let Some(detail) = &connection_lost {
                results.push(TableSyncResult::failed(table, 0, detail.clone()));
                continue;
            }

            let result = self.sync_table(local, remote, table).await;
            info!(
                table = %table,
                status = ?result.status,
                rows = result.rows_copied,
                "table synced"
            );
            if result.is_failure() {
                if let Err(e) = remote.ping().await {
                    warn!(error = %e, "remote connection lost, skipping remaining tables");
                    connection_lost = Some(format!("remote connection lost: {}", e));
                }
            }
            results.push(result);
        }
        results
    }

    pub async fn sync_table(
        &self,
        local: &DbHandle,
        remote: &DbHandle,
        table: &str,
    ) -> TableSyncResult {
        match self.try_sync_table(local, remote, table).await {
            Ok(result) => result,
            Err(e) => {
                warn!(table = %table, error = %e, "table sync failed");
                TableSyncResult::failed(table, 0, e.detail())
            }
        }
    }

    // 元数据阶段的错误直接返回；进入批量阶段后错误记入累计结果
    async fn try_sync_table(
        &self,
        local: &DbHandle,
        remote: &DbHandle,
        table: &str,
    ) -> Result<TableSyncResult> {
        if !self.introspector.table_exists(local, table).await? {
            return Ok(TableSyncResult::skipped(table, SyncStatus::SkippedNoLocalTable));
        }
        // 不负责创建远程表结构
        if !self.introspector.table_exists(remote, table).await? {
            return Ok(TableSyncResult::skipped(
                table,
                SyncStatus::SkippedNoRemoteTable,
            ));
        }

        let local_columns = self.introspector.columns(local, table).await?;
        let remote_columns = self.introspector.columns(remote, table).await?;
        let mapping = ColumnMapping::intersect(&local_columns, &remote_columns);
        if mapping.is_empty() {
            return Err(SyncError::schema(
                table,
                "no common columns between local and remote table",
            ));
        }
        debug!(table = %table, columns = mapping.len(), "column mapping built");

        let remote_keys = self.introspector.primary_key_columns(remote, table).await?;
        let conflict_keys = mapping.conflict_keys(&remote_keys);
        let local_keys = match self.introspector.primary_key_columns(local, table).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(table = %table, error = %e, "local primary key lookup failed, ordering by mapped columns");
                Vec::new()
            }
        };
        let order_by = batch_order(&local_keys, &mapping);

        let local_dialect = local.dialect();
        let remote_dialect = remote.dialect();
        let remote_names = mapping.remote_names();
        let hints = mapping.hints();
        let mut acc = TransferAccumulator::new(table);
        let mut offset = 0usize;

        loop {
            let select = local_dialect.select_batch_sql(
                table,
                &mapping.local,
                &order_by,
                self.batch_size,
                offset,
            );
            let rows = match local.fetch_rows(&select).await {
                Ok(rows) => rows,
                Err(e) => {
                    // 读取失败后无法继续分页
                    acc.batch_failed(&SyncError::transfer(table, e));
                    break;
                }
            };
            if rows.is_empty() {
                break;
            }
            let fetched = rows.len();

            let insert = remote_dialect.insert_batch_sql(
                table,
                &remote_names,
                &hints,
                &rows,
                &conflict_keys,
            );
            match remote.execute(&insert).await {
                Ok(_) => acc.batch_ok(fetched),
                Err(e) => {
                    warn!(table = %table, offset, error = %e, "batch write failed");
                    acc.batch_failed(&SyncError::transfer(table, e));
                    if remote.ping().await.is_err() {
                        break;
                    }
                }
            }

            if fetched < self.batch_size {
                break;
            }
            offset += fetched;
        }

        Ok(acc.finish())
    }
}
