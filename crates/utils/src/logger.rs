use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::CargoEnv;

/// 未设置 RUST_LOG 时的默认过滤规则
pub const DEFAULT_LOG_FILTER: &str = "ledger_indexer=info,database=info,utils=info";

pub struct Logger;

impl Logger {
    /// 初始化全局日志，返回的 guard 必须在进程生命周期内持有，否则缓冲日志会丢失
    pub fn new(cargo_env: CargoEnv) -> WorkerGuard {
        Self::new_with_log_dir(cargo_env, None)
    }

    pub fn new_with_log_dir(cargo_env: CargoEnv, log_dir: Option<PathBuf>) -> WorkerGuard {
        let (non_blocking, guard) = match cargo_env {
            CargoEnv::Development => tracing_appender::non_blocking(std::io::stdout()),
            CargoEnv::Production => {
                let log_directory = Self::log_directory(log_dir);
                if let Err(e) = std::fs::create_dir_all(&log_directory) {
                    eprintln!("⚠️ 无法创建日志目录 {:?}: {}，回退到标准输出", log_directory, e);
                    tracing_appender::non_blocking(std::io::stdout())
                } else {
                    let file_logger = tracing_appender::rolling::daily(&log_directory, "ledger.log");
                    tracing_appender::non_blocking(file_logger)
                }
            }
        };

        // env var: `RUST_LOG`
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(false),
            )
            .try_init();

        guard
    }

    fn log_directory(log_dir: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = log_dir {
            return dir;
        }

        if let Ok(log_dir_env) = std::env::var("LOG_DIR") {
            return PathBuf::from(log_dir_env);
        }

        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("logs")
    }
}
