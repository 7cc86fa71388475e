//! 分解服务 - 业务能力层
//!
//! 一个批次的完整生命周期：分配工作目录 → 限时运行引擎 → 收获结果 → 删除工作目录。
//! 无论引擎成功、失败还是超时，工作目录都会被删除，且删除发生在结果读出之后。

use crate::error::{DeadlineExceeded, EngineError};
use crate::infrastructure::{run_with_deadline, EngineRunner, WorkspaceManager};
use crate::models::{BatchPlan, FactorizationResult};
use crate::services::Factorer;
use futures::future::{BoxFuture, FutureExt};
use std::time::Duration;
use tracing::debug;

/// 一个批次的收获
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRun {
    pub results: Vec<FactorizationResult>,
    /// 超时被终止时为 `Some`
    pub deadline: Option<DeadlineExceeded>,
    pub elapsed: Duration,
    pub malformed_lines: usize,
}

/// 用外部引擎分解
pub struct EngineFactorer {
    workspaces: WorkspaceManager,
    runner: EngineRunner,
}

impl EngineFactorer {
    pub fn new(workspaces: WorkspaceManager, runner: EngineRunner) -> Self {
        Self { workspaces, runner }
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    async fn factor_plan(&self, plan: &BatchPlan) -> Result<BatchRun, EngineError> {
        let workspace = self.workspaces.acquire().await?;
        debug!("批次工作目录: {}", workspace.id());

        let run = run_with_deadline(
            &self.runner,
            &plan.batch,
            &workspace,
            &plan.options,
            plan.timeout,
        )
        .await;

        workspace.release().await;

        let run = run?;
        Ok(BatchRun {
            deadline: run.exit.deadline_exceeded(),
            elapsed: run.elapsed,
            malformed_lines: run.harvest.malformed_lines,
            results: run.harvest.results,
        })
    }
}

impl Factorer for EngineFactorer {
    fn factor<'a>(&'a self, plan: &'a BatchPlan) -> BoxFuture<'a, Result<BatchRun, EngineError>> {
        self.factor_plan(plan).boxed()
    }
}
