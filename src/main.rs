use anyhow::{Context, Result};
use factor_worker::utils::logging::log_startup;
use factor_worker::{
    logger, strategy_for, CompositeFeed, Config, EngineFactorer, EngineRunner, FactorDbClient,
    ResultReporter, Worker, WorkspaceManager,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::load()?;
    log_startup(&config);

    // 清理上次运行残留的工作目录
    let workspaces =
        WorkspaceManager::new(config.workspace_root.clone(), config.engine_config_file.clone());
    workspaces.clear_root().await;

    let client = FactorDbClient::from_config(&config).context("无法创建 HTTP 客户端")?;
    let mut worker = Worker::new(
        CompositeFeed::new(client.clone()),
        EngineFactorer::new(workspaces, EngineRunner::new(config.engine_binary.clone())),
        ResultReporter::new(client),
        strategy_for(&config),
    );

    // 循环不会自行结束；Ctrl-C 时丢弃进行中的批次，引擎进程组随之被终止
    tokio::select! {
        _ = worker.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("收到 Ctrl-C，停止");
        }
    }

    Ok(())
}
