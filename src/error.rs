// 同步子系统错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    // 连接参数校验失败
    #[error("invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    // 无法连接或认证远程数据库，detail 为驱动原始信息
    #[error("connection error: {detail}")]
    Connection { detail: String },

    // 元数据查询失败（表不存在不算错误）
    #[error("schema error on `{table}`: {detail}")]
    Schema { table: String, detail: String },

    // 批量写入远程失败
    #[error("transfer error on `{table}`: {detail}")]
    Transfer { table: String, detail: String },

    // 任务配置错误
    #[error("config error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        SyncError::Connection {
            detail: err.to_string(),
        }
    }

    pub fn schema(table: &str, err: impl std::fmt::Display) -> Self {
        SyncError::Schema {
            table: table.to_string(),
            detail: err.to_string(),
        }
    }

    pub fn transfer(table: &str, err: impl std::fmt::Display) -> Self {
        SyncError::Transfer {
            table: table.to_string(),
            detail: err.to_string(),
        }
    }

    // 写入结果时只保留原始信息
    pub fn detail(&self) -> String {
        match self {
            SyncError::Connection { detail }
            | SyncError::Schema { detail, .. }
            | SyncError::Transfer { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}
