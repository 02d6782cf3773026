use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cloudsync::{
    args::args_handle::{Action, ArgsConfig, PrintMe},
    db::DbHandle,
    error::{Result, SyncError},
    handle::service::SyncService,
    model::{
        descriptor::{ConnectionDescriptor, RemoteForm},
        job::JobModel,
    },
    util::common as util_common,
};

#[tokio::main]
async fn main() -> ExitCode {
    // 处理命令行参数
    let args_config = ArgsConfig::parse();

    // 初始化日志，RUST_LOG 优先
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args_config.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    args_config.dump();

    match run(args_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cloudsync failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args_config: ArgsConfig) -> Result<()> {
    if args_config.action == Action::EnvConfig {
        let mut form = RemoteForm::from_env();
        if !form.password.is_empty() {
            form.password = "***".to_string();
        }
        return print_json(&form);
    }

    // 读取任务配置文件
    let job_path = args_config
        .job
        .clone()
        .ok_or_else(|| SyncError::Config("job config path required (--job)".to_string()))?;
    let job = util_common::load_job_config::<JobModel>(&job_path)?;
    let descriptor = ConnectionDescriptor::from_form(&job.remote_form())?;

    let local = DbHandle::connect_local(&job.local.url).await?;
    let service = SyncService::new(local.clone(), &job.sync);
    let outcome = dispatch(&service, &descriptor, &job, &args_config.action).await;
    local.close().await;
    outcome
}

async fn dispatch(
    service: &SyncService,
    descriptor: &ConnectionDescriptor,
    job: &JobModel,
    action: &Action,
) -> Result<()> {
    match action {
        Action::Test => {
            service.test_connection(descriptor).await?;
            println!("connection ok: {}", descriptor);
            Ok(())
        }
        Action::Compare { .. } => {
            let tables = action.tables();
            let results = service.compare_data(descriptor, tables.as_deref()).await?;
            print_json(&results)
        }
        Action::Sync { .. } => {
            let tables = action.tables().unwrap_or_else(|| job.sync.tables.clone());
            if tables.is_empty() {
                return Err(SyncError::Config(format!(
                    "job {} has no tables to sync",
                    job.job.name
                )));
            }
            let results = service.sync_tables(descriptor, &tables).await?;
            print_json(&results)
        }
        Action::EnvConfig => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| SyncError::Config(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
