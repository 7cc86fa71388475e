//! 引擎运行器 - 基础设施层
//!
//! ## 职责
//!
//! - 在工作目录里写表达式文件，并把它作为引擎的标准输入
//! - 启动外部分解引擎，stdout / stderr 逐行写进日志
//! - 等待退出，或强制终止整个进程树
//! - 进程确认停止后再读取结果文件
//!
//! 日志排水和等待退出是并发的：没人读的管道写满后，引擎会一直阻塞。

use crate::error::EngineError;
use crate::infrastructure::workspace::Workspace;
use crate::models::{decode, EngineOptions, FactorizationResult, WorkBatch};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// 进程停止后等待日志排水结束的最长时间
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// 构造引擎命令行参数
///
/// `<engine> -of <output> -no_expr [-threads N] [-work W] [-pretest P] [-one]`
pub fn engine_args(output_file: &str, options: &EngineOptions) -> Vec<String> {
    let mut args = vec![
        "-of".to_string(),
        output_file.to_string(),
        "-no_expr".to_string(),
    ];
    if options.threads != 1 {
        args.push("-threads".to_string());
        args.push(options.threads.to_string());
    }
    if let Some(work) = options.work {
        args.push("-work".to_string());
        args.push(work.to_string());
    }
    if let Some(pretest) = options.pretest {
        args.push("-pretest".to_string());
        args.push(pretest.to_string());
    }
    if options.one {
        args.push("-one".to_string());
    }
    args
}

/// 引擎启动器
#[derive(Debug, Clone)]
pub struct EngineRunner {
    binary: PathBuf,
}

impl EngineRunner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// 在工作目录中启动引擎
    pub async fn spawn(
        &self,
        batch: &WorkBatch,
        workspace: &Workspace,
        options: &EngineOptions,
    ) -> Result<EngineJob, EngineError> {
        let input_path = workspace.input_path();
        fs::write(input_path, batch.expressions())
            .await
            .map_err(|source| EngineError::WriteInput {
                path: input_path.to_path_buf(),
                source,
            })?;
        let stdin = std::fs::File::open(input_path).map_err(|source| EngineError::WriteInput {
            path: input_path.to_path_buf(),
            source,
        })?;

        let binary = resolve_binary(&self.binary);
        let args = engine_args(workspace.output_file_name(), options);
        debug!("启动引擎: {} {}", binary.display(), args.join(" "));

        let mut command = Command::new(&binary);
        command
            .args(&args)
            .current_dir(workspace.dir())
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            binary: binary.clone(),
            source,
        })?;

        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(drain_to_log(stdout, "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(drain_to_log(stderr, "stderr"));
        }

        Ok(EngineJob {
            pid: child.id(),
            child,
            drains,
            started: Instant::now(),
            reaped: false,
        })
    }
}

/// 带路径分隔符的相对路径按当前目录解析，否则子进程会在工作目录里找它
fn resolve_binary(binary: &Path) -> PathBuf {
    if binary.is_relative() && binary.components().count() > 1 {
        if let Ok(cwd) = std::env::current_dir() {
            return cwd.join(binary);
        }
    }
    binary.to_path_buf()
}

fn drain_to_log<R>(reader: R, stream: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    debug!(target: "engine", "[{}] {}", stream, line.trim_end());
                }
                Err(e) => {
                    warn!("读取引擎 {} 失败: {}", stream, e);
                    break;
                }
            }
        }
    })
}

/// 运行中的引擎
///
/// 在任何退出路径上都会终止进程：正常等待、超时终止，或者被直接丢弃。
#[derive(Debug)]
pub struct EngineJob {
    child: Child,
    pid: Option<u32>,
    drains: Vec<JoinHandle<()>>,
    started: Instant,
    reaped: bool,
}

impl EngineJob {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// 等待引擎自行退出
    pub async fn wait(mut self) -> Result<(ExitStatus, Duration), EngineError> {
        let status = self.child.wait().await.map_err(EngineError::Wait)?;
        self.reaped = true;
        // 清扫仍在进程组里的子进程
        kill_process_group(self.pid);
        self.finish_drains().await;
        Ok((status, self.elapsed()))
    }

    /// 最多等待 `timeout`，超时后终止整个进程树
    ///
    /// 退出状态为 `None` 表示超时后被强制终止。
    pub async fn wait_for(
        mut self,
        timeout: Duration,
    ) -> Result<(Option<ExitStatus>, Duration), EngineError> {
        let waited = tokio::time::timeout(timeout, self.child.wait()).await;
        match waited {
            Ok(status) => {
                let status = status.map_err(EngineError::Wait)?;
                self.reaped = true;
                kill_process_group(self.pid);
                self.finish_drains().await;
                Ok((Some(status), self.elapsed()))
            }
            Err(_) => {
                let (_, elapsed) = self.terminate().await?;
                Ok((None, elapsed))
            }
        }
    }

    /// 立即终止引擎及其子进程，并等待回收
    pub async fn terminate(mut self) -> Result<(ExitStatus, Duration), EngineError> {
        kill_process_group(self.pid);
        if let Err(e) = self.child.start_kill() {
            if e.kind() != io::ErrorKind::InvalidInput {
                warn!("终止引擎进程失败: {}", e);
            }
        }
        let status = self.child.wait().await.map_err(EngineError::Wait)?;
        self.reaped = true;
        self.finish_drains().await;
        Ok((status, self.elapsed()))
    }

    async fn finish_drains(&mut self) {
        for mut handle in self.drains.drain(..) {
            if tokio::time::timeout(DRAIN_GRACE, &mut handle).await.is_err() {
                warn!("引擎输出管道在进程停止后仍未关闭，放弃读取");
                handle.abort();
            }
        }
    }
}

impl Drop for EngineJob {
    fn drop(&mut self) {
        if !self.reaped {
            kill_process_group(self.pid);
        }
        for handle in &self.drains {
            handle.abort();
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) 不涉及内存，负数 pid 表示整个进程组
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("终止引擎进程组 {} 失败: {}", pgid, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// 结果文件的解析结果
#[derive(Debug, Default)]
pub struct Harvest {
    pub results: Vec<FactorizationResult>,
    /// 无法解析而被跳过的行数
    pub malformed_lines: usize,
    /// 只有合数、没有因子的行数
    pub incomplete_lines: usize,
}

/// 读取并解析结果文件
///
/// 只能在进程确认停止后调用。`killed` 为真时，文件不存在视为零结果：
/// 引擎可能在写出任何内容之前就被终止了。
pub async fn harvest(output_path: &Path, killed: bool) -> Result<Harvest, EngineError> {
    let bytes = match fs::read(output_path).await {
        Ok(bytes) => bytes,
        Err(e) if killed && e.kind() == io::ErrorKind::NotFound => {
            info!("引擎被终止前没有写出结果文件");
            return Ok(Harvest::default());
        }
        Err(source) => {
            return Err(EngineError::OutputUnreadable {
                path: output_path.to_path_buf(),
                source,
            })
        }
    };

    let text = String::from_utf8_lossy(&bytes);
    let mut harvest = Harvest::default();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match decode(line) {
            Ok(result) if result.is_complete() => harvest.results.push(result),
            Ok(result) => {
                debug!("合数 {} 没有分解出因子，跳过", result.composite);
                harvest.incomplete_lines += 1;
            }
            Err(e) => {
                error!("{}", e);
                harvest.malformed_lines += 1;
            }
        }
    }
    Ok(harvest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_thread_omits_flag() {
        let args = engine_args("factors.out", &EngineOptions::with_threads(1));
        assert_eq!(args, vec!["-of", "factors.out", "-no_expr"]);
    }

    #[test]
    fn test_all_flags() {
        let options = EngineOptions {
            threads: 16,
            work: Some(35.5),
            pretest: Some(20),
            one: true,
        };
        let args = engine_args("factors.out", &options);
        assert_eq!(
            args,
            vec![
                "-of", "factors.out", "-no_expr", "-threads", "16", "-work", "35.5", "-pretest",
                "20", "-one"
            ]
        );
    }

    #[test]
    fn test_bare_binary_name_is_kept() {
        assert_eq!(resolve_binary(Path::new("yafu")), PathBuf::from("yafu"));
        assert!(resolve_binary(Path::new("bin/yafu")).is_absolute());
    }
}
