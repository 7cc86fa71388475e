use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认配置文件名（工作目录下）
pub const DEFAULT_CONFIG_FILE: &str = "factor_worker.toml";

/// 运行模式，启动时选定
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 优先处理最小的合数
    Normal,
    /// 对大量大合数各做少量 ECM
    Shaving,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "shaving" | "shaver" => Ok(Mode::Shaving),
            other => Err(format!("未知的运行模式: {}", other)),
        }
    }
}

/// 普通模式参数
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalConfig {
    /// 位数小于该值的合数一次性全部分解
    pub trivial_size: usize,
    pub threads: usize,
    /// 每页合数数量
    pub page_size: usize,
    pub min_digits: usize,
    /// 随机起始偏移的上界（不含）
    pub max_start: usize,
    /// 单个难合数的限时（秒）
    pub probe_timeout_secs: u64,
}

impl Default for NormalConfig {
    fn default() -> Self {
        Self {
            trivial_size: 70,
            threads: 1,
            page_size: 20,
            min_digits: 0,
            max_start: 1000,
            probe_timeout_secs: 30,
        }
    }
}

/// 刮削模式参数
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShavingConfig {
    pub page_size: usize,
    pub threads: usize,
    pub min_digits: usize,
    pub work: Option<f64>,
    pub pretest: u32,
    /// 服务允许的最大起始偏移
    pub max_start: usize,
}

impl Default for ShavingConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            threads: 16,
            min_digits: 78,
            work: None,
            pretest: 20,
            max_start: 50000,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 远程数据库地址
    pub base_url: String,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 分解引擎可执行文件
    pub engine_binary: PathBuf,
    /// 复制进每个工作目录的引擎配置文件
    pub engine_config_file: Option<PathBuf>,
    /// 工作目录的父目录，启动时会被清空
    pub workspace_root: PathBuf,
    pub mode: Mode,
    pub normal: NormalConfig,
    pub shaving: ShavingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://factordb.com".to_string(),
            http_timeout_secs: 60,
            engine_binary: PathBuf::from("yafu"),
            engine_config_file: Some(PathBuf::from("yafu.ini")),
            workspace_root: PathBuf::from("temp"),
            mode: Mode::Normal,
            normal: NormalConfig::default(),
            shaving: ShavingConfig::default(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（如果有）+ 环境变量覆盖
    pub fn load() -> Result<Self> {
        let config = match std::env::var_os("FACTOR_WORKER_CONFIG") {
            Some(path) => Self::from_toml_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.with_env_overrides()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        Ok(Self {
            base_url: std::env::var("FACTORDB_URL").unwrap_or(self.base_url),
            engine_binary: std::env::var_os("ENGINE_BINARY")
                .map(PathBuf::from)
                .unwrap_or(self.engine_binary),
            engine_config_file: match std::env::var_os("ENGINE_CONFIG_FILE") {
                Some(v) if v.is_empty() => None,
                Some(v) => Some(PathBuf::from(v)),
                None => self.engine_config_file,
            },
            workspace_root: std::env::var_os("WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(self.workspace_root),
            mode: match std::env::var("WORKER_MODE") {
                Ok(v) => v.parse().map_err(anyhow::Error::msg)?,
                Err(_) => self.mode,
            },
            ..self
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
