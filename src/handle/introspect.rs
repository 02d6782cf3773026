// 表结构查询：表是否存在、列、主键、表清单
// 表不存在是正常结果，只有元数据查询本身出错才返回 SchemaError

use crate::db::DbHandle;
use crate::error::{Result, SyncError};
use crate::model::table::ColumnInfo;

#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    pub async fn table_exists(&self, handle: &DbHandle, table: &str) -> Result<bool> {
        let sql = handle.dialect().table_exists_sql();
        let count = handle
            .fetch_count(sql, Some(table))
            .await
            .map_err(|e| SyncError::schema(table, e))?;
        Ok(count > 0)
    }

    // 列顺序与表定义一致，同步时按位置映射
    pub async fn columns(&self, handle: &DbHandle, table: &str) -> Result<Vec<ColumnInfo>> {
        let sql = handle.dialect().columns_sql();
        handle
            .fetch_columns(sql, table)
            .await
            .map_err(|e| SyncError::schema(table, e))
    }

    pub async fn column_names(&self, handle: &DbHandle, table: &str) -> Result<Vec<String>> {
        let columns = self.columns(handle, table).await?;
        Ok(columns.into_iter().map(|c| c.name).collect())
    }

    pub async fn primary_key_columns(&self, handle: &DbHandle, table: &str) -> Result<Vec<String>> {
        let sql = handle.dialect().primary_key_sql();
        handle
            .fetch_strings(sql, Some(table))
            .await
            .map_err(|e| SyncError::schema(table, e))
    }

    pub async fn list_tables(&self, handle: &DbHandle) -> Result<Vec<String>> {
        let sql = handle.dialect().list_tables_sql();
        handle
            .fetch_strings(sql, None)
            .await
            .map_err(|e| SyncError::schema("*", e))
    }

    pub async fn row_count(&self, handle: &DbHandle, table: &str) -> Result<u64> {
        let sql = handle.dialect().count_sql(table);
        let count = handle
            .fetch_count(&sql, None)
            .await
            .map_err(|e| SyncError::schema(table, e))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod test_introspect {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn memory_handle() -> DbHandle {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open sqlite");
        sqlx::raw_sql(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, amount REAL, notes TEXT);
             CREATE TABLE order_items (order_id INTEGER, sku TEXT, PRIMARY KEY (order_id, sku));
             INSERT INTO orders (amount, notes) VALUES (1.5, 'a'), (2.5, NULL);",
        )
        .execute(&pool)
        .await
        .expect("Failed to create fixture");
        DbHandle::Sqlite(pool)
    }

    #[tokio::test]
    async fn reports_existence_without_error() {
        let handle = memory_handle().await;
        let introspector = SchemaIntrospector;
        assert!(introspector.table_exists(&handle, "orders").await.unwrap());
        assert!(!introspector.table_exists(&handle, "missing_tbl").await.unwrap());
    }

    #[tokio::test]
    async fn columns_follow_declared_order() {
        let handle = memory_handle().await;
        let introspector = SchemaIntrospector;
        let names = introspector.column_names(&handle, "orders").await.unwrap();
        assert_eq!(names, vec!["id", "amount", "notes"]);
        let columns = introspector.columns(&handle, "orders").await.unwrap();
        assert_eq!(columns[1], ColumnInfo::new("amount", "REAL"));
        assert!(introspector.columns(&handle, "missing_tbl").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn primary_keys_and_table_list() {
        let handle = memory_handle().await;
        let introspector = SchemaIntrospector;
        assert_eq!(
            introspector.primary_key_columns(&handle, "order_items").await.unwrap(),
            vec!["order_id", "sku"]
        );
        assert_eq!(
            introspector.list_tables(&handle).await.unwrap(),
            vec!["order_items", "orders"]
        );
        assert_eq!(introspector.row_count(&handle, "orders").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn closed_handle_is_schema_error() {
        let handle = memory_handle().await;
        handle.close().await;
        let result = SchemaIntrospector.table_exists(&handle, "orders").await;
        assert!(matches!(result, Err(SyncError::Schema { .. })));
    }
}
