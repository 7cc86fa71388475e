//! 合数来源 - 业务能力层
//!
//! 从远程数据库取一页合数，并确认每一行都是十进制正整数

use crate::clients::FactorDbClient;
use crate::error::FetchError;
use crate::models::{Composite, PageRequest};
use crate::services::CompositeSource;
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

/// 远程数据库合数来源
pub struct CompositeFeed {
    client: FactorDbClient,
}

impl CompositeFeed {
    pub fn new(client: FactorDbClient) -> Self {
        Self { client }
    }
}

impl CompositeSource for CompositeFeed {
    fn fetch<'a>(
        &'a self,
        request: &'a PageRequest,
    ) -> BoxFuture<'a, Result<Vec<Composite>, FetchError>> {
        async move {
            let lines = self.client.list_composites(request).await?;
            let composites = parse_composites(&lines)?;
            debug!("取到 {} 个合数 (start={})", composites.len(), request.start);
            Ok(composites)
        }
        .boxed()
    }
}

/// 解析列表内容，任何一行不合法整页作废
pub fn parse_composites<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Composite>, FetchError> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let line = line.as_ref();
            line.parse::<Composite>()
                .map_err(|_| FetchError::MalformedComposite {
                    line_no: idx + 1,
                    line: line.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let composites = parse_composites(&["91", "1000000016000000063"]).unwrap();
        assert_eq!(composites.len(), 2);
        assert_eq!(composites[1].digits(), 19);
    }

    #[test]
    fn test_malformed_line_fails_page() {
        let err = parse_composites(&["91", "<html>", "221"]).unwrap_err();
        match err {
            FetchError::MalformedComposite { line_no, line } => {
                assert_eq!(line_no, 2);
                assert_eq!(line, "<html>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
