// 远程数据库连接参数

use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

// 数据库引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Sqlite,
    Mysql,
    Postgres,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Sqlite => "sqlite",
            EngineKind::Mysql => "mysql",
            EngineKind::Postgres => "postgres",
        }
    }
}

impl FromStr for EngineKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(EngineKind::Sqlite),
            "mysql" => Ok(EngineKind::Mysql),
            "postgres" | "postgresql" => Ok(EngineKind::Postgres),
            other => Err(SyncError::InvalidDescriptor(format!(
                "unsupported engine kind: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const SSL_MODES: [&str; 6] = [
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];

// 调用方提交的原始表单，字段名与前端保持一致
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteForm {
    #[serde(default)]
    pub db_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub ssl_mode: Option<String>,
}

impl RemoteForm {
    // 从 SYNC_DB_* 环境变量预填表单，缺失为空串，端口默认 5432
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).unwrap_or_default();
        let port = read("SYNC_DB_PORT")
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .unwrap_or(5432);
        let ssl_mode = lookup("SYNC_SSL_MODE").filter(|s| !s.trim().is_empty());
        RemoteForm {
            db_type: read("SYNC_DB_TYPE"),
            host: read("SYNC_DB_HOST"),
            port,
            user: read("SYNC_DB_USER"),
            password: read("SYNC_DB_PASSWORD"),
            db_name: read("SYNC_DB_NAME"),
            ssl_mode,
        }
    }
}

// 校验后的连接描述，构造后不可变，不落盘
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    engine: EngineKind,
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
    ssl_mode: Option<String>,
}

impl ConnectionDescriptor {
    pub fn new(
        engine: EngineKind,
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        ssl_mode: Option<String>,
    ) -> Result<Self> {
        let descriptor = ConnectionDescriptor {
            engine,
            host: host.into().trim().to_string(),
            port,
            user: user.into().trim().to_string(),
            password: password.into(),
            database: database.into().trim().to_string(),
            ssl_mode: ssl_mode
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty()),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    // 同步目标只能是网络数据库，sqlite 在这里被拒绝
    pub fn from_form(form: &RemoteForm) -> Result<Self> {
        let engine: EngineKind = form.db_type.parse()?;
        if engine == EngineKind::Sqlite {
            return Err(SyncError::InvalidDescriptor(
                "sqlite is not a valid remote target".to_string(),
            ));
        }
        Self::new(
            engine,
            form.host.as_str(),
            form.port,
            form.user.as_str(),
            form.password.as_str(),
            form.db_name.as_str(),
            form.ssl_mode.clone(),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.engine == EngineKind::Sqlite {
            return Ok(());
        }
        let required = [
            ("host", self.host.is_empty()),
            ("user", self.user.is_empty()),
            ("password", self.password.is_empty()),
            ("db_name", self.database.is_empty()),
            ("port", self.port == 0),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, empty)| *empty)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(SyncError::InvalidDescriptor(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if let Some(mode) = &self.ssl_mode {
            if self.engine == EngineKind::Postgres && !SSL_MODES.contains(&mode.as_str()) {
                return Err(SyncError::InvalidDescriptor(format!(
                    "unknown ssl_mode: {}",
                    mode
                )));
            }
        }
        Ok(())
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    // 仅 postgres 使用
    pub fn ssl_mode(&self) -> Option<&str> {
        match self.engine {
            EngineKind::Postgres => self.ssl_mode.as_deref(),
            _ => None,
        }
    }
}

// 日志输出时隐藏密码
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}@{}:{}/{}",
            self.engine, self.user, self.host, self.port, self.database
        )?;
        match self.engine {
            EngineKind::Mysql => f.write_str("?charset=utf8mb4"),
            EngineKind::Postgres => match &self.ssl_mode {
                Some(mode) => write!(f, "?sslmode={}", mode),
                None => Ok(()),
            },
            EngineKind::Sqlite => Ok(()),
        }
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

#[cfg(test)]
mod test_descriptor {
    use super::*;

    fn form(db_type: &str) -> RemoteForm {
        RemoteForm {
            db_type: db_type.to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "sync".to_string(),
            password: "secret".to_string(),
            db_name: "cloud".to_string(),
            ssl_mode: Some("Disable".to_string()),
        }
    }

    #[test]
    fn parses_engine_kinds() {
        assert_eq!("MySQL".parse::<EngineKind>().unwrap(), EngineKind::Mysql);
        assert_eq!(
            "postgresql".parse::<EngineKind>().unwrap(),
            EngineKind::Postgres
        );
        assert!("oracle".parse::<EngineKind>().is_err());
    }

    #[test]
    fn builds_postgres_descriptor() {
        let desc = ConnectionDescriptor::from_form(&form("postgres")).unwrap();
        assert_eq!(desc.engine(), EngineKind::Postgres);
        assert_eq!(desc.ssl_mode(), Some("disable"));
        assert_eq!(
            desc.to_string(),
            "postgres://sync@localhost:5432/cloud?sslmode=disable"
        );
    }

    #[test]
    fn ssl_mode_ignored_for_mysql() {
        let desc = ConnectionDescriptor::from_form(&form("mysql")).unwrap();
        assert_eq!(desc.ssl_mode(), None);
        assert_eq!(
            desc.to_string(),
            "mysql://sync@localhost:5432/cloud?charset=utf8mb4"
        );
    }

    #[test]
    fn rejects_unknown_engine_and_sqlite_target() {
        assert!(matches!(
            ConnectionDescriptor::from_form(&form("mssql")),
            Err(SyncError::InvalidDescriptor(_))
        ));
        assert!(matches!(
            ConnectionDescriptor::from_form(&form("sqlite")),
            Err(SyncError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn rejects_missing_fields() {
        let mut f = form("mysql");
        f.host = "  ".to_string();
        f.password.clear();
        let err = ConnectionDescriptor::from_form(&f).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("host"));
        assert!(msg.contains("password"));
    }

    #[test]
    fn rejects_unknown_ssl_mode() {
        let mut f = form("postgres");
        f.ssl_mode = Some("sometimes".to_string());
        assert!(ConnectionDescriptor::from_form(&f).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let desc = ConnectionDescriptor::from_form(&form("postgres")).unwrap();
        let out = format!("{:?}", desc);
        assert!(!out.contains("secret"));
    }

    #[test]
    fn env_defaults_fill_port() {
        let form = RemoteForm::from_lookup(|key| match key {
            "SYNC_DB_TYPE" => Some("postgres".to_string()),
            "SYNC_DB_HOST" => Some("db.example".to_string()),
            "SYNC_DB_PORT" => Some("not-a-port".to_string()),
            "SYNC_SSL_MODE" => Some(String::new()),
            _ => None,
        });
        assert_eq!(form.port, 5432);
        assert_eq!(form.host, "db.example");
        assert_eq!(form.user, "");
        assert_eq!(form.ssl_mode, None);
    }
}
