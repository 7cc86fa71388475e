//! 主循环 - 编排层
//!
//! ## 职责
//!
//! 每一轮：选页 → 取合数 → 选批次 → 分解 → 上报。
//! 任何一个阶段失败都只记录日志，然后进入下一轮；循环本身永不结束。
//!
//! ## 设计特点
//!
//! - **阶段错误封闭**：失败统一为 [`IterationError`]，按阶段穷尽匹配
//! - **超时不算失败**：被终止的引擎已写出的结果照常上报
//! - **状态归属**：刮削模式的去重集合属于策略对象，由本循环独占

use crate::error::{DeadlineExceeded, IterationError};
use crate::services::{CompositeSource, Factorer, ResultSink};
use crate::utils::logging::{log_iteration_outcome, truncate_text};
use crate::workflow::BatchStrategy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

/// 一轮循环的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// 取到的页中没有需要处理的合数
    Idle { fetched: usize },
    /// 运行了一个批次
    Factored {
        composites: usize,
        reported: usize,
        deadline: Option<DeadlineExceeded>,
    },
}

/// 分解工作者
pub struct Worker<S, F, R> {
    source: S,
    factorer: F,
    sink: R,
    strategy: Box<dyn BatchStrategy>,
    rng: StdRng,
    iterations: u64,
}

impl<S, F, R> Worker<S, F, R>
where
    S: CompositeSource,
    F: Factorer,
    R: ResultSink,
{
    pub fn new(source: S, factorer: F, sink: R, strategy: Box<dyn BatchStrategy>) -> Self {
        Self {
            source,
            factorer,
            sink,
            strategy,
            rng: StdRng::from_entropy(),
            iterations: 0,
        }
    }

    /// 使用固定的随机数发生器（测试用）
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// 永远运行，只能从外部停止
    pub async fn run(&mut self) {
        info!("🚀 开始循环，模式: {}", self.strategy.name());
        loop {
            let outcome = self.run_iteration().await;
            match outcome {
                Ok(outcome) => log_iteration_outcome(self.iterations, &outcome),
                Err(IterationError::Fetch(e)) => {
                    error!("[第 {} 轮] ❌ 获取合数失败: {}", self.iterations, e)
                }
                Err(IterationError::Engine(e)) => {
                    error!("[第 {} 轮] ❌ 批次运行失败，本批无结果: {}", self.iterations, e)
                }
                Err(IterationError::Report(e)) => {
                    error!("[第 {} 轮] ❌ 上报失败，结果已丢弃: {}", self.iterations, e)
                }
            }
        }
    }

    /// 执行一轮
    pub async fn run_iteration(&mut self) -> Result<IterationOutcome, IterationError> {
        self.iterations += 1;
        let round = self.iterations;

        let request = self.strategy.page_request(&mut self.rng);
        let page = self.source.fetch(&request).await?;
        let fetched = page.len();

        let Some(plan) = self.strategy.select(page, &mut self.rng) else {
            return Ok(IterationOutcome::Idle { fetched });
        };

        for composite in plan.batch.composites() {
            info!(
                "[第 {} 轮] {} 位合数: {}",
                round,
                composite.digits(),
                truncate_text(&composite.to_string(), 60)
            );
        }

        let run = self.factorer.factor(&plan).await?;

        if let Some(deadline) = run.deadline {
            error!("[第 {} 轮] ⏱️ {}，上报已有的部分结果", round, deadline);
        }
        if run.malformed_lines > 0 {
            warn!("[第 {} 轮] 跳过 {} 行无法解析的输出", round, run.malformed_lines);
        }

        let reported = run.results.len();
        if reported > 0 {
            self.sink.report(&run.results).await?;
        }

        Ok(IterationOutcome::Factored {
            composites: plan.batch.len(),
            reported,
            deadline: run.deadline,
        })
    }
}
