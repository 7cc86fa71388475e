//! 批次选择策略 - 流程层
//!
//! 两种运行模式是同一个接口的两种实现，启动时选定一次，循环中不再分支：
//!
//! - [`NormalStrategy`]：小合数整批全力分解；没有小合数时，
//!   从位数最少的一组里随机挑一个，限时试探
//! - [`ShavingStrategy`]：对很多大合数各做少量工作，本次运行内不重复处理同一个合数

use crate::config::{Config, Mode, NormalConfig, ShavingConfig};
use crate::models::{BatchPlan, Composite, EngineOptions, PageRequest, WorkBatch};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{debug, info};

/// 批次选择接口
pub trait BatchStrategy: Send {
    fn name(&self) -> &'static str;

    /// 下一次要请求哪一页
    fn page_request(&self, rng: &mut dyn RngCore) -> PageRequest;

    /// 从取到的一页中挑出要分解的批次，没有可做的返回 `None`
    fn select(&mut self, page: Vec<Composite>, rng: &mut dyn RngCore) -> Option<BatchPlan>;
}

/// 按运行模式创建策略
pub fn strategy_for(config: &Config) -> Box<dyn BatchStrategy> {
    match config.mode {
        Mode::Normal => Box::new(NormalStrategy::new(&config.normal)),
        Mode::Shaving => Box::new(ShavingStrategy::new(&config.shaving)),
    }
}

fn random_start(rng: &mut dyn RngCore, max_start: usize) -> usize {
    if max_start == 0 {
        0
    } else {
        rng.gen_range(0..max_start)
    }
}

/// 位数小于 `trivial_size` 的合数
pub fn trivial_subset(page: &[Composite], trivial_size: usize) -> Vec<Composite> {
    page.iter()
        .filter(|c| c.digits() < trivial_size)
        .cloned()
        .collect()
}

/// 位数最少的那一组合数
pub fn smallest_digit_group(page: &[Composite]) -> Vec<Composite> {
    let mut by_digits: BTreeMap<usize, Vec<Composite>> = BTreeMap::new();
    for composite in page {
        by_digits
            .entry(composite.digits())
            .or_default()
            .push(composite.clone());
    }
    by_digits
        .into_iter()
        .next()
        .map(|(_, group)| group)
        .unwrap_or_default()
}

/// 普通模式
#[derive(Debug, Clone)]
pub struct NormalStrategy {
    config: NormalConfig,
}

impl NormalStrategy {
    pub fn new(config: &NormalConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.config.probe_timeout_secs)
    }
}

impl BatchStrategy for NormalStrategy {
    fn name(&self) -> &'static str {
        "normal"
    }

    fn page_request(&self, rng: &mut dyn RngCore) -> PageRequest {
        PageRequest {
            min_digits: self.config.min_digits,
            count: self.config.page_size,
            start: random_start(rng, self.config.max_start),
        }
    }

    fn select(&mut self, page: Vec<Composite>, rng: &mut dyn RngCore) -> Option<BatchPlan> {
        let options = EngineOptions::with_threads(self.config.threads);

        let trivial = trivial_subset(&page, self.config.trivial_size);
        if let Some(batch) = WorkBatch::new(trivial) {
            info!("📦 {} 个小于 {} 位的合数，整批分解", batch.len(), self.config.trivial_size);
            return Some(BatchPlan {
                batch,
                options,
                timeout: None,
            });
        }

        let group = smallest_digit_group(&page);
        let chosen = group.choose(rng)?.clone();
        info!(
            "🎯 没有小合数，从 {} 个 {} 位合数中随机试探一个，限时 {:?}",
            group.len(),
            chosen.digits(),
            self.probe_timeout()
        );
        Some(BatchPlan {
            batch: WorkBatch::new(vec![chosen])?,
            options,
            timeout: Some(self.probe_timeout()),
        })
    }
}

/// 刮削模式
#[derive(Debug, Clone)]
pub struct ShavingStrategy {
    config: ShavingConfig,
    seen: HashSet<Composite>,
}

impl ShavingStrategy {
    pub fn new(config: &ShavingConfig) -> Self {
        Self {
            config: config.clone(),
            seen: HashSet::new(),
        }
    }

    /// 本次运行已经见过的合数数量
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn has_seen(&self, composite: &Composite) -> bool {
        self.seen.contains(composite)
    }
}

impl BatchStrategy for ShavingStrategy {
    fn name(&self) -> &'static str {
        "shaving"
    }

    fn page_request(&self, rng: &mut dyn RngCore) -> PageRequest {
        PageRequest {
            min_digits: self.config.min_digits,
            count: self.config.page_size,
            start: random_start(rng, self.config.max_start),
        }
    }

    fn select(&mut self, page: Vec<Composite>, _rng: &mut dyn RngCore) -> Option<BatchPlan> {
        let fetched = page.len();
        let fresh: Vec<Composite> = page
            .into_iter()
            .filter(|c| self.seen.insert(c.clone()))
            .collect();
        debug!("本页 {} 个合数，其中 {} 个未处理过", fetched, fresh.len());

        let batch = WorkBatch::new(fresh)?;
        Some(BatchPlan {
            batch,
            options: EngineOptions {
                threads: self.config.threads,
                work: self.config.work,
                pretest: Some(self.config.pretest),
                one: true,
            },
            timeout: None,
        })
    }
}
