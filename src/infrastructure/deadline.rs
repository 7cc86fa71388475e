//! 限时运行
//!
//! 在可选的墙钟时限内运行引擎。超时后先终止整个进程树、确认停止，
//! 再照常读取结果文件：被终止的引擎写出的部分结果依然有效。

use crate::error::{DeadlineExceeded, EngineError};
use crate::infrastructure::engine::{harvest, EngineRunner, Harvest};
use crate::infrastructure::workspace::Workspace;
use crate::models::{EngineOptions, WorkBatch};
use std::process::ExitStatus;
use std::time::Duration;
use tracing::{info, warn};

/// 引擎是怎么停下来的
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineExit {
    /// 自行退出
    Exited(ExitStatus),
    /// 超时被终止，只用于日志，不算失败
    DeadlineExceeded(DeadlineExceeded),
}

impl EngineExit {
    pub fn deadline_exceeded(&self) -> Option<DeadlineExceeded> {
        match self {
            EngineExit::DeadlineExceeded(d) => Some(*d),
            EngineExit::Exited(_) => None,
        }
    }
}

/// 一次引擎运行的结果
#[derive(Debug)]
pub struct EngineRun {
    pub exit: EngineExit,
    pub elapsed: Duration,
    pub harvest: Harvest,
}

/// 运行引擎，`timeout` 为 `None` 时不限时
pub async fn run_with_deadline(
    runner: &EngineRunner,
    batch: &WorkBatch,
    workspace: &Workspace,
    options: &EngineOptions,
    timeout: Option<Duration>,
) -> Result<EngineRun, EngineError> {
    info!("⚙️ 运行引擎分解 {} 个合数", batch.len());
    let job = runner.spawn(batch, workspace, options).await?;

    let (exit, elapsed) = match timeout {
        None => {
            let (status, elapsed) = job.wait().await?;
            (EngineExit::Exited(status), elapsed)
        }
        Some(timeout) => match job.wait_for(timeout).await? {
            (Some(status), elapsed) => (EngineExit::Exited(status), elapsed),
            (None, elapsed) => (
                EngineExit::DeadlineExceeded(DeadlineExceeded { timeout }),
                elapsed,
            ),
        },
    };

    if let EngineExit::Exited(status) = exit {
        if !status.success() {
            warn!("⚠️ 引擎异常退出: {}", status);
        }
    }

    // 进程已确认停止，此时结果文件不会再变化
    let harvest = harvest(workspace.output_path(), exit.deadline_exceeded().is_some()).await?;

    info!(
        "引擎运行 {:.2} 秒，得到 {} 个分解结果",
        elapsed.as_secs_f64(),
        harvest.results.len()
    );

    Ok(EngineRun {
        exit,
        elapsed,
        harvest,
    })
}
