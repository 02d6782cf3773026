// 表结构与行数据的通用表示

use serde::Serialize;

// 列名与声明类型，顺序即表定义顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        ColumnInfo {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

// 跨引擎的单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

pub type SqlRow = Vec<SqlValue>;

// 写入远程时按目标列类型渲染
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHint {
    Boolean,
    Integer,
    Numeric,
    Binary,
    Text,
}

impl TargetHint {
    pub fn classify(data_type: &str) -> Self {
        let t = data_type.trim().to_ascii_lowercase();
        if t == "bool" || t == "boolean" {
            TargetHint::Boolean
        } else if (t.contains("int") && !t.contains("interval") && !t.contains("point"))
            || t.ends_with("serial")
        {
            TargetHint::Integer
        } else if ["float", "double", "real", "numeric", "decimal"]
            .iter()
            .any(|k| t.contains(k))
        {
            TargetHint::Numeric
        } else if t == "bytea" || t.contains("blob") || t.contains("binary") {
            TargetHint::Binary
        } else {
            TargetHint::Text
        }
    }
}

// 本地列到远程列的映射：取两边列名交集（忽略大小写），保持本地顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub local: Vec<ColumnInfo>,
    pub remote: Vec<ColumnInfo>,
}

impl ColumnMapping {
    pub fn intersect(local: &[ColumnInfo], remote: &[ColumnInfo]) -> Self {
        let mut mapping = ColumnMapping {
            local: Vec::new(),
            remote: Vec::new(),
        };
        for column in local {
            if let Some(target) = remote
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(&column.name))
            {
                mapping.local.push(column.clone());
                mapping.remote.push(target.clone());
            }
        }
        mapping
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn remote_names(&self) -> Vec<String> {
        self.remote.iter().map(|c| c.name.clone()).collect()
    }

    pub fn hints(&self) -> Vec<TargetHint> {
        self.remote
            .iter()
            .map(|c| TargetHint::classify(&c.data_type))
            .collect()
    }

    // 远程主键全部在映射列里才可以作为冲突键
    pub fn conflict_keys(&self, remote_keys: &[String]) -> Vec<String> {
        if remote_keys.is_empty() {
            return Vec::new();
        }
        let mut keys = Vec::with_capacity(remote_keys.len());
        for key in remote_keys {
            match self
                .remote
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(key))
            {
                Some(column) => keys.push(column.name.clone()),
                None => return Vec::new(),
            }
        }
        keys
    }
}
