use std::{fs, path::Path};

use serde::Deserialize;
use tracing::info;

use crate::error::Result;

// 载入任务配置
// 配置文件为toml格式
pub fn load_job_config<T>(toml_path: impl AsRef<Path>) -> Result<T>
where
    for<'de> T: Deserialize<'de>,
{
    let toml_path = toml_path.as_ref();
    info!(path = %toml_path.display(), "loading job config");
    let job_str = fs::read_to_string(toml_path)?;
    let job: T = toml::from_str(&job_str)?;
    Ok(job)
}

// 解析逗号分隔的表名列表，去掉空白和重复项，保持顺序
pub fn parse_table_list(raw: &str) -> Vec<String> {
    let mut tables: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !tables.iter().any(|t| t == name) {
            tables.push(name.to_string());
        }
    }
    tables
}
