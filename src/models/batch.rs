//! 批次与引擎参数

use crate::models::composite::Composite;
use std::time::Duration;

/// 一次引擎调用要分解的合数，保证非空
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkBatch {
    composites: Vec<Composite>,
}

impl WorkBatch {
    /// 空列表返回 `None`
    pub fn new(composites: Vec<Composite>) -> Option<Self> {
        if composites.is_empty() {
            None
        } else {
            Some(Self { composites })
        }
    }

    pub fn composites(&self) -> &[Composite] {
        &self.composites
    }

    pub fn len(&self) -> usize {
        self.composites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.composites.is_empty()
    }

    /// 引擎输入：每个合数一行 `factor(N)`
    pub fn expressions(&self) -> String {
        self.composites
            .iter()
            .map(|c| format!("factor({})\n", c))
            .collect()
    }
}

/// 引擎运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// 线程数，为 1 时不传 `-threads`
    pub threads: usize,
    /// 工作量上限
    pub work: Option<f64>,
    /// 预测试深度
    pub pretest: Option<u32>,
    /// 每个输入找到一个因子即停止
    pub one: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            work: None,
            pretest: None,
            one: false,
        }
    }
}

impl EngineOptions {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Default::default()
        }
    }
}

/// 一次列表请求：从 `start` 起取 `count` 个不少于 `min_digits` 位的合数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub min_digits: usize,
    pub count: usize,
    pub start: usize,
}

/// 批次选择器的产出：要分解什么、怎么分解、最多跑多久
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub batch: WorkBatch,
    pub options: EngineOptions,
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_rejected() {
        assert!(WorkBatch::new(Vec::new()).is_none());
    }

    #[test]
    fn test_expressions_one_per_line() {
        let batch = WorkBatch::new(vec!["91".parse().unwrap(), "221".parse().unwrap()]).unwrap();
        assert_eq!(batch.expressions(), "factor(91)\nfactor(221)\n");
        assert_eq!(batch.len(), 2);
    }
}
