/// 远程数据库 API 客户端
///
/// 封装合数列表下载和分解结果上报两个 HTTP 调用，不做任何业务判断
use crate::config::Config;
use crate::error::{FetchError, ReportError};
use crate::models::PageRequest;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// 合数类型：3 = 已知是合数但没有任何已知因子
const COMPOSITE_TYPE: &str = "3";
/// 上报格式选择
const REPORT_FORMAT: &str = "0";

/// 远程数据库客户端
#[derive(Debug, Clone)]
pub struct FactorDbClient {
    http: reqwest::Client,
    base_url: String,
}

impl FactorDbClient {
    /// 创建新的客户端
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(config.base_url.clone(), config.http_timeout())
    }

    /// 下载一页合数
    ///
    /// # 返回
    /// 每行一个十进制合数字符串，末尾空行已去掉；内容合法性由调用方检查
    pub async fn list_composites(&self, request: &PageRequest) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/listtype.php", self.base_url);
        debug!("请求合数列表: {} {:?}", url, request);

        let response = self
            .http
            .get(&url)
            .query(&list_params(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(split_listing(&body))
    }

    /// 提交已编码的分解结果
    pub async fn submit_report(&self, payload: &str) -> Result<(), ReportError> {
        let url = format!("{}/report.php", self.base_url);

        let response = self.http.post(&url).form(&report_form(payload)).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!("上报成功: {}", status);
        Ok(())
    }
}

/// 列表请求的查询参数
pub fn list_params(request: &PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("t", COMPOSITE_TYPE.to_string()),
        ("mindig", request.min_digits.to_string()),
        ("perpage", request.count.to_string()),
        ("start", request.start.to_string()),
        ("download", "1".to_string()),
    ]
}

/// 上报表单字段
pub fn report_form(payload: &str) -> [(&'static str, &str); 2] {
    [("report", payload), ("format", REPORT_FORMAT)]
}

/// 按行拆分列表响应，去掉首尾空白和空行
pub fn split_listing(body: &str) -> Vec<String> {
    body.trim()
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
