//! 业务能力层
//!
//! 循环的三个阶段各有一个接口：取合数、分解、上报。
//! 编排层只认识这些接口，测试可以换成内存实现。

pub mod composite_feed;
pub mod factor_service;
pub mod reporter;

use crate::error::{EngineError, FetchError, ReportError};
use crate::models::{BatchPlan, Composite, FactorizationResult, PageRequest};
use futures::future::BoxFuture;

pub use composite_feed::{parse_composites, CompositeFeed};
pub use factor_service::{BatchRun, EngineFactorer};
pub use reporter::ResultReporter;

/// 合数来源
pub trait CompositeSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        request: &'a PageRequest,
    ) -> BoxFuture<'a, Result<Vec<Composite>, FetchError>>;
}

/// 分解一个批次，返回收获到的结果
pub trait Factorer: Send + Sync {
    fn factor<'a>(&'a self, plan: &'a BatchPlan) -> BoxFuture<'a, Result<BatchRun, EngineError>>;
}

/// 结果上报
pub trait ResultSink: Send + Sync {
    fn report<'a>(
        &'a self,
        results: &'a [FactorizationResult],
    ) -> BoxFuture<'a, Result<(), ReportError>>;
}
