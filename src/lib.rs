//! # Factor Worker
//!
//! 一个长期运行的合数分解工作者：从远程数据库取合数，交给外部分解引擎，
//! 解析结果文件并上报，永远循环下去。
//!
//! ## 架构设计
//!
//! ### ① 模型层（Models）
//! - `Composite` - 任意精度正整数
//! - `FactorizationResult` - 引擎结果行的解析与上报编码
//! - `WorkBatch` / `EngineOptions` / `BatchPlan` - 一次引擎调用的输入
//!
//! ### ② 基础设施层（Infrastructure）
//! - `WorkspaceManager` - 每个批次独占的临时目录
//! - `EngineRunner` / `EngineJob` - 引擎进程的启动、日志排水、终止
//! - `run_with_deadline` - 限时运行并在终止后收获部分结果
//!
//! ### ③ 业务能力层（Services + Clients）
//! - `FactorDbClient` - 远程数据库 HTTP 调用
//! - `CompositeFeed` / `EngineFactorer` / `ResultReporter` - 三个阶段的实现
//!
//! ### ④ 流程层（Workflow）
//! - `NormalStrategy` / `ShavingStrategy` - 两种批次选择策略
//!
//! ### ⑤ 编排层（Orchestration）
//! - `Worker` - 永久循环，阶段失败只记日志
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::FactorDbClient;
pub use config::{Config, Mode};
pub use error::{
    CodecError, DeadlineExceeded, EngineError, FetchError, IterationError, ReportError,
    WorkspaceError,
};
pub use infrastructure::{run_with_deadline, EngineExit, EngineRunner, Workspace, WorkspaceManager};
pub use models::{BatchPlan, Composite, EngineOptions, FactorizationResult, PageRequest, WorkBatch};
pub use orchestrator::{IterationOutcome, Worker};
pub use services::{
    BatchRun, CompositeFeed, CompositeSource, EngineFactorer, Factorer, ResultReporter, ResultSink,
};
pub use workflow::{strategy_for, BatchStrategy, NormalStrategy, ShavingStrategy};
