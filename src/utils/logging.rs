/// 日志工具模块
///
/// 提供启动横幅和每轮结果的日志格式
use crate::config::{Config, Mode};
use crate::orchestrator::IterationOutcome;
use tracing::info;

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 分解工作者启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 远程数据库: {}", config.base_url);
    info!("⚙️ 引擎: {}", config.engine_binary.display());
    info!("📁 工作目录: {}", config.workspace_root.display());
    match config.mode {
        Mode::Normal => info!(
            "📊 普通模式: 每页 {} 个，小合数阈值 {} 位，单个试探限时 {} 秒",
            config.normal.page_size, config.normal.trivial_size, config.normal.probe_timeout_secs
        ),
        Mode::Shaving => info!(
            "📊 刮削模式: 每页 {} 个，至少 {} 位，{} 线程，预测试深度 {}",
            config.shaving.page_size,
            config.shaving.min_digits,
            config.shaving.threads,
            config.shaving.pretest
        ),
    }
    info!("{}", "=".repeat(60));
}

/// 记录一轮循环的结果
pub fn log_iteration_outcome(round: u64, outcome: &IterationOutcome) {
    match outcome {
        IterationOutcome::Idle { fetched } => {
            info!("[第 {} 轮] 本页 {} 个合数均无需处理", round, fetched);
        }
        IterationOutcome::Factored {
            composites,
            reported,
            deadline,
        } => {
            info!(
                "[第 {} 轮] ✓ 完成: {} 个合数，上报 {} 个结果{}",
                round,
                composites,
                reported,
                if deadline.is_some() { "（超时）" } else { "" }
            );
        }
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
