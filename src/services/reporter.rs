//! 结果上报 - 业务能力层
//!
//! 只负责"编码并提交"，失败不重试

use crate::clients::FactorDbClient;
use crate::error::ReportError;
use crate::models::{encode, FactorizationResult};
use crate::services::ResultSink;
use futures::future::{BoxFuture, FutureExt};
use tracing::info;

/// 向远程数据库上报分解结果
pub struct ResultReporter {
    client: FactorDbClient,
}

impl ResultReporter {
    pub fn new(client: FactorDbClient) -> Self {
        Self { client }
    }
}

impl ResultSink for ResultReporter {
    fn report<'a>(
        &'a self,
        results: &'a [FactorizationResult],
    ) -> BoxFuture<'a, Result<(), ReportError>> {
        async move {
            let payload = encode(results);
            info!("📤 提交分解结果:\n{}", payload);
            self.client.submit_report(&payload).await
        }
        .boxed()
    }
}
