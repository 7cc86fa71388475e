//! 错误类型
//!
//! 每个流水线阶段（取数 → 运行 → 上报）都有自己封闭的错误枚举，
//! 外层循环只需要对 [`IterationError`] 做穷尽匹配。

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 因子编码解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// 输出行无法按 `p/q^e` 语法解析
    #[error("无法解析因子行 '{line}': {reason}")]
    MalformedLine { line: String, reason: String },
}

impl CodecError {
    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        CodecError::MalformedLine {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// 工作目录错误
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// 创建目录失败
    #[error("无法创建工作目录 {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 复制引擎配置文件失败
    #[error("无法复制引擎配置 {from} -> {to}: {source}")]
    CopyConfigFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 引擎运行错误（对单个批次致命，对进程不致命）
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    /// 写入表达式文件失败
    #[error("无法写入表达式文件 {path}: {source}")]
    WriteInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 引擎程序不存在或不可执行
    #[error("无法启动引擎 {binary}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 等待进程退出失败
    #[error("等待引擎进程失败: {0}")]
    Wait(#[source] std::io::Error),
    /// 引擎正常退出但结果文件缺失或不可读
    #[error("无法读取引擎结果文件 {path}: {source}")]
    OutputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 远程列表获取错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("列表请求失败: {0}")]
    Http(#[from] reqwest::Error),
    /// 对应 ConnectionError：服务返回非成功状态
    #[error("列表请求返回状态 {status}: {body}")]
    Status { status: u16, body: String },
    /// 返回内容中有无法识别的合数
    #[error("列表第 {line_no} 行不是合法的十进制正整数: '{line}'")]
    MalformedComposite { line_no: usize, line: String },
}

/// 结果上报错误
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("上报请求失败: {0}")]
    Http(#[from] reqwest::Error),
    /// 对应 ReportSubmissionError：服务返回非 200
    #[error("上报返回状态 {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// 一次循环迭代的失败，按阶段区分
#[derive(Debug, Error)]
pub enum IterationError {
    #[error("获取合数失败: {0}")]
    Fetch(#[from] FetchError),
    #[error("批次运行失败: {0}")]
    Engine(#[from] EngineError),
    #[error("上报结果失败: {0}")]
    Report(#[from] ReportError),
}

/// 超时说明，仅用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("引擎运行超过 {timeout:?}，已强制终止")]
pub struct DeadlineExceeded {
    pub timeout: Duration,
}
