//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::Worker (永久循环)
//!     ↓
//! workflow::BatchStrategy (选页、选批次)
//!     ↓
//! services (能力层：取合数 / 分解 / 上报)
//!     ↓
//! infrastructure (工作目录、引擎进程) + clients (HTTP)
//! ```

pub mod worker_loop;

pub use worker_loop::{IterationOutcome, Worker};
