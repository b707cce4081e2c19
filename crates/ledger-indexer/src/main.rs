use clap::{Parser, Subcommand};
use database::{Database, LedgerStore, MemoryStore};
use ledger_indexer::{
    config::LedgerIndexerConfig, contract::EvmSaleContract, subscriber::JsonLinesEventSource, LedgerIndexerService,
};
use std::path::PathBuf;
use tracing::{error, info};
use utils::{CargoEnv, Logger, StoreBackend};

#[derive(Parser, Debug)]
#[clap(name = "ledger-indexer", about = "推荐与销售档位事件聚合")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按顺序处理 JSON 行事件文件
    Run {
        #[clap(long)]
        events: PathBuf,
        /// 跳过事件处理结束后的全量卡包刷新
        #[clap(long)]
        skip_final_refresh: bool,
    },
    /// 核对卡包缓存与合约实时数据
    CheckShop {
        #[clap(long)]
        batch_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cargo_env = CargoEnv::from(std::env::var("CARGO_ENV").unwrap_or_default().as_str());
    let _guard = Logger::new(cargo_env);

    info!("🎯 启动Ledger-Indexer");

    let mut config = match LedgerIndexerConfig::from_env() {
        Ok(config) => {
            info!("✅ 配置加载成功");
            config
        }
        Err(e) => {
            error!("❌ 配置加载失败: {}", e);
            std::process::exit(1);
        }
    };

    match &cli.command {
        Command::Run { skip_final_refresh, .. } if *skip_final_refresh => config.indexer.final_refresh = false,
        Command::CheckShop { batch_size: Some(size) } => config.indexer.check_batch_size = *size,
        _ => {}
    }

    let result = match config.database.backend {
        StoreBackend::Memory => {
            info!("🧪 使用内存存储");
            execute(config, MemoryStore::new(), cli.command).await
        }
        StoreBackend::Mongo => {
            let database = Database::connect(&config.database.uri, &config.database.database_name).await?;
            database.init_repository_indexes().await?;
            execute(config, database, cli.command).await
        }
    };

    if let Err(e) = result {
        error!("❌ Ledger-Indexer运行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn execute<S: LedgerStore>(config: LedgerIndexerConfig, store: S, command: Command) -> anyhow::Result<()> {
    let contract = EvmSaleContract::new(&config.chain.rpc_url, config.get_read_timeout())?;
    let mut service = LedgerIndexerService::new(config, store, contract)?;

    match command {
        Command::Run { events, .. } => {
            let mut source = JsonLinesEventSource::open(&events).await?;
            let summary = service.run(&mut source).await?;
            info!("📊 {:?}", summary);
        }
        Command::CheckShop { .. } => {
            let report = service.check_shop().await?;
            if !report.is_consistent() {
                anyhow::bail!("发现 {} 个不一致的俱乐部", report.problems.len());
            }
        }
    }

    Ok(())
}
