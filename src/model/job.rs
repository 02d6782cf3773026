// 同步任务配置

use serde::Deserialize;

use super::descriptor::RemoteForm;

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// 声明任务配置结构
#[derive(Debug, Deserialize, Clone)]
pub struct JobModel {
    pub job: Job,
    pub local: Local,
    // 未配置时使用环境变量 SYNC_DB_*
    pub remote: Option<RemoteForm>,
    #[serde(default)]
    pub sync: SyncOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Job {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Local {
    // sqlite://... / mysql://... / postgres://...
    pub url: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SyncOptions {
    // 为空时对比本地所有表
    pub tables: Vec<String>,
    pub batch_size: usize,
    pub connect_timeout_secs: u64,
    pub max_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            tables: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_concurrency: 1,
        }
    }
}

impl JobModel {
    pub fn remote_form(&self) -> RemoteForm {
        self.remote.clone().unwrap_or_else(RemoteForm::from_env)
    }
}

#[cfg(test)]
mod test_job_config {
    use super::*;

    #[test]
    fn parses_full_job() {
        let job: JobModel = toml::from_str(
            r#"
            [job]
            name = "nightly"

            [local]
            url = "sqlite://data/app.db"

            [remote]
            db_type = "postgres"
            host = "db.example"
            port = 5432
            user = "sync"
            password = "secret"
            db_name = "cloud"
            ssl_mode = "require"

            [sync]
            tables = ["orders", "customers"]
            batch_size = 200
            "#,
        )
        .expect("Failed to parse job config");
        assert_eq!(job.job.name, "nightly");
        assert_eq!(job.sync.tables, vec!["orders", "customers"]);
        assert_eq!(job.sync.batch_size, 200);
        assert_eq!(job.sync.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(job.remote_form().ssl_mode.as_deref(), Some("require"));
    }

    #[test]
    fn sync_section_is_optional() {
        let job: JobModel = toml::from_str(
            r#"
            [job]
            name = "adhoc"

            [local]
            url = "sqlite::memory:"
            "#,
        )
        .expect("Failed to parse job config");
        assert!(job.remote.is_none());
        assert_eq!(job.sync, SyncOptions::default());
    }
}
