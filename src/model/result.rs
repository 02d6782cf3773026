// 对比结果与同步结果，每次调用重新计算，不缓存

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareStatus {
    Match,
    Mismatch,
    // 远程缺表；两边都没有时计数都为空
    LocalOnly,
    // 本地缺表
    RemoteOnly,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableComparisonResult {
    pub table_name: String,
    // None 表示该侧不可用
    pub local_count: Option<u64>,
    pub remote_count: Option<u64>,
    pub status: CompareStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl TableComparisonResult {
    pub fn counted(table_name: &str, local_count: u64, remote_count: u64) -> Self {
        let status = if local_count == remote_count {
            CompareStatus::Match
        } else {
            CompareStatus::Mismatch
        };
        TableComparisonResult {
            table_name: table_name.to_string(),
            local_count: Some(local_count),
            remote_count: Some(remote_count),
            status,
            error_detail: None,
        }
    }

    pub fn local_only(table_name: &str, local_count: Option<u64>) -> Self {
        TableComparisonResult {
            table_name: table_name.to_string(),
            local_count,
            remote_count: None,
            status: CompareStatus::LocalOnly,
            error_detail: None,
        }
    }

    pub fn remote_only(table_name: &str) -> Self {
        Self::uncounted(table_name, CompareStatus::RemoteOnly, None)
    }

    pub fn error(table_name: &str, detail: impl Into<String>) -> Self {
        Self::uncounted(table_name, CompareStatus::Error, Some(detail.into()))
    }

    fn uncounted(table_name: &str, status: CompareStatus, error_detail: Option<String>) -> Self {
        TableComparisonResult {
            table_name: table_name.to_string(),
            local_count: None,
            remote_count: None,
            status,
            error_detail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Partial,
    Failed,
    SkippedNoLocalTable,
    SkippedNoRemoteTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSyncResult {
    pub table_name: String,
    // 远程确认写入的行数
    pub rows_copied: u64,
    pub status: SyncStatus,
    // 仅 failed / partial 时有值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl TableSyncResult {
    pub fn skipped(table_name: &str, status: SyncStatus) -> Self {
        TableSyncResult {
            table_name: table_name.to_string(),
            rows_copied: 0,
            status,
            error_detail: None,
        }
    }

    pub fn failed(table_name: &str, rows_copied: u64, detail: impl Into<String>) -> Self {
        TableSyncResult {
            table_name: table_name.to_string(),
            rows_copied,
            status: SyncStatus::Failed,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, SyncStatus::Failed | SyncStatus::Partial)
    }
}

#[cfg(test)]
mod test_result {
    use super::*;

    #[test]
    fn equal_counts_match_including_zero() {
        assert_eq!(
            TableComparisonResult::counted("t", 0, 0).status,
            CompareStatus::Match
        );
        assert_eq!(
            TableComparisonResult::counted("t", 0, 1).status,
            CompareStatus::Mismatch
        );
        assert_eq!(
            TableComparisonResult::counted("t", u64::MAX, u64::MAX).status,
            CompareStatus::Match
        );
    }

    #[test]
    fn serializes_snake_case_status() {
        let result = TableSyncResult::skipped("orders", SyncStatus::SkippedNoRemoteTable);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "skipped_no_remote_table");
        assert!(json.get("error_detail").is_none());

        let cmp = TableComparisonResult::local_only("orders", Some(3));
        let json = serde_json::to_value(&cmp).unwrap();
        assert_eq!(json["status"], "local_only");
        assert!(json["remote_count"].is_null());
    }

    #[test]
    fn table_absent_everywhere_is_local_only_without_counts() {
        let cmp = TableComparisonResult::local_only("missing_tbl", None);
        assert_eq!(cmp.status, CompareStatus::LocalOnly);
        assert_eq!(cmp.local_count, None);
        assert_eq!(cmp.remote_count, None);
        let json = serde_json::to_value(&cmp).unwrap();
        assert_eq!(json["status"], "local_only");
    }
}
