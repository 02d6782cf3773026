// 处理命令行参数
pub mod args_handle {
    use std::ffi::OsString;
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};
    use tracing::debug;

    use crate::util::common::parse_table_list;

    /// Compare and copy local tables into a remote MySQL / PostgreSQL database.
    #[derive(Debug, Parser)]
    #[command(name = "cloudsync")]
    #[command(version, about, long_about = None)]
    pub struct ArgsConfig {
        /// Path to the job config (toml)
        #[arg(global = true, short, long)]
        pub job: Option<PathBuf>,

        /// Enable verbose output
        #[arg(global = true, short, long)]
        pub verbose: bool,

        #[command(subcommand)]
        pub action: Action,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
    pub enum Action {
        /// Check that the remote database is reachable
        Test,

        /// Compare per-table row counts between local and remote
        Compare {
            /// Comma separated table names (defaults to the job's list)
            #[arg(short, long)]
            tables: Option<String>,
        },

        /// Copy local rows into the remote tables
        Sync {
            /// Comma separated table names (defaults to the job's list)
            #[arg(short, long)]
            tables: Option<String>,
        },

        /// Print remote defaults read from SYNC_DB_* environment variables
        EnvConfig,
    }

    impl Action {
        pub fn tables(&self) -> Option<Vec<String>> {
            match self {
                Action::Compare { tables } | Action::Sync { tables } => {
                    tables.as_deref().map(parse_table_list)
                }
                _ => None,
            }
        }
    }

    pub trait PrintMe: std::fmt::Debug {
        fn dump(&self);
    }

    impl PrintMe for ArgsConfig {
        fn dump(&self) {
            debug!("args config: {:?}", self);
        }
    }

    impl ArgsConfig {
        pub fn build<I, T>(args: I) -> Result<Self, clap::Error>
        where
            I: IntoIterator<Item = T>,
            T: Into<OsString> + Clone,
        {
            Self::try_parse_from(args)
        }
    }
}

#[cfg(test)]
mod test_args {
    use super::args_handle::{Action, ArgsConfig};

    #[test]
    fn parses_sync_with_tables() {
        let args = ArgsConfig::build([
            "cloudsync",
            "sync",
            "--job",
            "job/orders.toml",
            "--tables",
            "orders, customers",
        ])
        .expect("Failed to parse args");
        assert_eq!(
            args.job.as_deref(),
            Some(std::path::Path::new("job/orders.toml"))
        );
        assert_eq!(
            args.action.tables(),
            Some(vec!["orders".to_string(), "customers".to_string()])
        );
    }

    #[test]
    fn env_config_needs_no_job() {
        let args = ArgsConfig::build(["cloudsync", "env-config"]).expect("Failed to parse args");
        assert_eq!(args.action, Action::EnvConfig);
        assert!(args.job.is_none());
        assert_eq!(args.action.tables(), None);
    }

    #[test]
    fn rejects_unknown_command() {
        assert!(ArgsConfig::build(["cloudsync", "migrate"]).is_err());
    }
}
