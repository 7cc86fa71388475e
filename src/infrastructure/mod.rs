//! 基础设施层：持有工作目录和引擎进程，只暴露能力

pub mod deadline;
pub mod engine;
pub mod workspace;

pub use deadline::{run_with_deadline, EngineExit, EngineRun};
pub use engine::{engine_args, harvest, EngineJob, EngineRunner, Harvest};
pub use workspace::{Workspace, WorkspaceManager, OUTPUT_FILE_NAME};
