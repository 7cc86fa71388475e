//! 工作目录管理 - 基础设施层
//!
//! 每个批次独占一个随机命名的目录，里面放引擎配置副本、表达式文件、
//! 引擎自己的临时文件和结果文件。用完整个删除，不在批次之间留下状态。

use crate::error::WorkspaceError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error};
use uuid::Uuid;

/// 引擎结果文件名
pub const OUTPUT_FILE_NAME: &str = "factors.out";

/// 工作目录分配器
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    engine_config: Option<PathBuf>,
}

/// 一个批次独占的工作目录
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    dir: PathBuf,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl WorkspaceManager {
    /// # 参数
    /// - `root`: 所有工作目录的父目录
    /// - `engine_config`: 每次复制进工作目录的引擎配置文件（可选）
    pub fn new(root: impl Into<PathBuf>, engine_config: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            engine_config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 分配新的工作目录并复制引擎配置
    ///
    /// 目录名是随机 UUID，并发调用也不会冲突；万一冲突，`create_dir` 会直接失败。
    pub async fn acquire(&self) -> Result<Workspace, WorkspaceError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                path: self.root.clone(),
                source,
            })?;

        let id = Uuid::new_v4();
        let dir = self.root.join(id.to_string());
        fs::create_dir(&dir)
            .await
            .map_err(|source| WorkspaceError::CreateFailed {
                path: dir.clone(),
                source,
            })?;

        let workspace = Workspace {
            id,
            input_path: dir.join(format!("temp-{}.dat", id)),
            output_path: dir.join(OUTPUT_FILE_NAME),
            dir,
        };

        if let Some(config) = &self.engine_config {
            let file_name = config.file_name().unwrap_or(config.as_os_str());
            let target = workspace.dir.join(file_name);
            if let Err(source) = fs::copy(config, &target).await {
                let err = WorkspaceError::CopyConfigFailed {
                    from: config.clone(),
                    to: target,
                    source,
                };
                workspace.release().await;
                return Err(err);
            }
        }

        debug!("工作目录已创建: {}", workspace.dir.display());
        Ok(workspace)
    }

    /// 启动时清空整个根目录（尽力而为）
    pub async fn clear_root(&self) {
        remove_tree(&self.root).await;
    }
}

impl Workspace {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 表达式文件路径（由引擎运行器写入）
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// 引擎结果文件路径（引擎可能从未创建它）
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// 引擎参数里用的结果文件名，相对于工作目录
    pub fn output_file_name(&self) -> &str {
        OUTPUT_FILE_NAME
    }

    /// 递归删除工作目录，失败只记日志
    pub async fn release(self) {
        remove_tree(&self.dir).await;
    }
}

async fn remove_tree(path: &Path) {
    match fs::remove_dir_all(path).await {
        Ok(()) => debug!("已删除目录: {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => error!("⚠️ 删除目录失败 {}: {}", path.display(), e),
    }
}
