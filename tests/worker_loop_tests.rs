//! 用内存实现替换三个阶段，验证主循环的容错和去重

use factor_worker::config::{NormalConfig, ShavingConfig};
use factor_worker::{
    BatchPlan, BatchRun, Composite, CompositeSource, DeadlineExceeded, EngineError, Factorer,
    FactorizationResult, FetchError, IterationError, IterationOutcome, NormalStrategy,
    PageRequest, ReportError, ResultSink, ShavingStrategy, Worker,
};
use futures::future::{BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn c(text: &str) -> Composite {
    text.parse().unwrap()
}

/// 按顺序返回预设的页，`Err(status)` 模拟服务端错误
#[derive(Clone, Default)]
struct FakeSource {
    pages: Arc<Mutex<VecDeque<Result<Vec<&'static str>, u16>>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl FakeSource {
    fn with_pages(pages: Vec<Result<Vec<&'static str>, u16>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages.into())),
            requests: Arc::default(),
        }
    }
}

impl CompositeSource for FakeSource {
    fn fetch<'a>(
        &'a self,
        request: &'a PageRequest,
    ) -> BoxFuture<'a, Result<Vec<Composite>, FetchError>> {
        async move {
            tokio::task::yield_now().await;
            self.requests.lock().unwrap().push(*request);
            match self.pages.lock().unwrap().pop_front() {
                Some(Ok(page)) => Ok(page.into_iter().map(c).collect()),
                Some(Err(status)) => Err(FetchError::Status {
                    status,
                    body: "Service Unavailable".to_string(),
                }),
                None => Err(FetchError::Status {
                    status: 503,
                    body: "no more pages".to_string(),
                }),
            }
        }
        .boxed()
    }
}

/// 把每个合数"分解"成它自己，并记录收到的批次
#[derive(Clone, Default)]
struct FakeFactorer {
    batches: Arc<Mutex<Vec<BatchPlan>>>,
    deadline: Option<DeadlineExceeded>,
    fail: bool,
    empty: bool,
}

impl Factorer for FakeFactorer {
    fn factor<'a>(&'a self, plan: &'a BatchPlan) -> BoxFuture<'a, Result<BatchRun, EngineError>> {
        async move {
            self.batches.lock().unwrap().push(plan.clone());
            if self.fail {
                return Err(EngineError::Spawn {
                    binary: "yafu".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            let results = if self.empty {
                Vec::new()
            } else {
                plan.batch
                    .composites()
                    .iter()
                    .map(|n| FactorizationResult::new(n.clone(), vec![n.clone()]))
                    .collect()
            };
            Ok(BatchRun {
                results,
                deadline: self.deadline,
                elapsed: Duration::from_millis(10),
                malformed_lines: 0,
            })
        }
        .boxed()
    }
}

#[derive(Clone, Default)]
struct FakeSink {
    reports: Arc<Mutex<Vec<Vec<FactorizationResult>>>>,
    reject: bool,
}

impl ResultSink for FakeSink {
    fn report<'a>(
        &'a self,
        results: &'a [FactorizationResult],
    ) -> BoxFuture<'a, Result<(), ReportError>> {
        async move {
            self.reports.lock().unwrap().push(results.to_vec());
            if self.reject {
                Err(ReportError::Rejected {
                    status: 500,
                    body: "error".to_string(),
                })
            } else {
                Ok(())
            }
        }
        .boxed()
    }
}

fn shaving_worker(
    source: FakeSource,
    factorer: FakeFactorer,
    sink: FakeSink,
) -> Worker<FakeSource, FakeFactorer, FakeSink> {
    Worker::new(
        source,
        factorer,
        sink,
        Box::new(ShavingStrategy::new(&ShavingConfig::default())),
    )
    .with_rng(StdRng::seed_from_u64(42))
}

fn normal_worker(
    source: FakeSource,
    factorer: FakeFactorer,
    sink: FakeSink,
) -> Worker<FakeSource, FakeFactorer, FakeSink> {
    Worker::new(
        source,
        factorer,
        sink,
        Box::new(NormalStrategy::new(&NormalConfig::default())),
    )
    .with_rng(StdRng::seed_from_u64(42))
}

fn batch_members(plans: &[BatchPlan]) -> Vec<Vec<String>> {
    plans
        .iter()
        .map(|p| p.batch.composites().iter().map(|c| c.to_string()).collect())
        .collect()
}

#[tokio::test]
async fn test_shaving_factors_overlapping_pages_once() {
    let source = FakeSource::with_pages(vec![
        Ok(vec!["1001", "1003"]),
        Ok(vec!["1003", "1007"]),
        Ok(vec!["1001", "1007", "1003"]),
    ]);
    let factorer = FakeFactorer::default();
    let batches = factorer.batches.clone();
    let mut worker = shaving_worker(source, factorer, FakeSink::default());

    assert_ok!(worker.run_iteration().await);
    assert_ok!(worker.run_iteration().await);
    let third = assert_ok!(worker.run_iteration().await);
    assert_eq!(third, IterationOutcome::Idle { fetched: 3 });

    let batches = batches.lock().unwrap();
    assert_eq!(
        batch_members(&batches),
        vec![vec!["1001", "1003"], vec!["1007"]]
    );
    assert!(batches.iter().all(|p| p.options.one && p.timeout.is_none()));
}

#[tokio::test]
async fn test_fetch_failure_does_not_disturb_seen_set() {
    let source = FakeSource::with_pages(vec![
        Ok(vec!["1001"]),
        Err(503),
        Ok(vec!["1001", "1003"]),
    ]);
    let factorer = FakeFactorer::default();
    let batches = factorer.batches.clone();
    let mut worker = shaving_worker(source, factorer, FakeSink::default());

    assert_ok!(worker.run_iteration().await);
    let err = assert_err!(worker.run_iteration().await);
    assert!(matches!(err, IterationError::Fetch(FetchError::Status { status: 503, .. })));
    assert_ok!(worker.run_iteration().await);

    assert_eq!(
        batch_members(&batches.lock().unwrap()),
        vec![vec!["1001"], vec!["1003"]]
    );
    assert_eq!(worker.iterations(), 3);
}

#[tokio::test]
async fn test_deadline_results_are_still_reported() {
    let source = FakeSource::with_pages(vec![Ok(vec![
        "1000000000000000000000000000000000000000000000000000000000000000000000000000000007",
    ])]);
    let deadline = DeadlineExceeded {
        timeout: Duration::from_secs(30),
    };
    let factorer = FakeFactorer {
        deadline: Some(deadline),
        ..Default::default()
    };
    let sink = FakeSink::default();
    let reports = sink.reports.clone();
    let mut worker = normal_worker(source, factorer, sink);

    let outcome = assert_ok!(worker.run_iteration().await);
    assert_eq!(
        outcome,
        IterationOutcome::Factored {
            composites: 1,
            reported: 1,
            deadline: Some(deadline),
        }
    );
    assert_eq!(reports.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_normal_mode_probe_gets_timeout() {
    let big_a = "10000000000000000000000000000000000000000000000000000000000000000000000000000000000001";
    let big_b = "10000000000000000000000000000000000000000000000000000000000000000000000000000000000003";
    let bigger = "100000000000000000000000000000000000000000000000000000000000000000000000000000000000000000009";
    let source = FakeSource::with_pages(vec![Ok(vec![bigger, big_a, big_b])]);
    let factorer = FakeFactorer::default();
    let batches = factorer.batches.clone();
    let mut worker = normal_worker(source, factorer, FakeSink::default());

    assert_ok!(worker.run_iteration().await);

    let batches = batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    let plan = &batches[0];
    assert_eq!(plan.batch.len(), 1);
    let chosen = plan.batch.composites()[0].to_string();
    assert!(chosen == big_a || chosen == big_b);
    assert_eq!(plan.timeout, Some(Duration::from_secs(30)));
}

#[tokio::test]
async fn test_normal_mode_batches_trivial_composites() {
    let source = FakeSource::with_pages(vec![Ok(vec!["91", "221", "1001"])]);
    let factorer = FakeFactorer::default();
    let batches = factorer.batches.clone();
    let sink = FakeSink::default();
    let reports = sink.reports.clone();
    let mut worker = normal_worker(source.clone(), factorer, sink);

    let outcome = assert_ok!(worker.run_iteration().await);
    assert_eq!(
        outcome,
        IterationOutcome::Factored {
            composites: 3,
            reported: 3,
            deadline: None,
        }
    );
    assert_eq!(batches.lock().unwrap()[0].timeout, None);
    assert_eq!(reports.lock().unwrap()[0].len(), 3);

    let requests = source.requests.lock().unwrap();
    assert_eq!(requests[0].count, 20);
    assert!(requests[0].start < 1000);
}

#[tokio::test]
async fn test_engine_failure_skips_report() {
    let source = FakeSource::with_pages(vec![Ok(vec!["91"]), Ok(vec!["221"])]);
    let factorer = FakeFactorer {
        fail: true,
        ..Default::default()
    };
    let sink = FakeSink::default();
    let reports = sink.reports.clone();
    let mut worker = normal_worker(source, factorer, sink);

    let err = assert_err!(worker.run_iteration().await);
    assert!(matches!(err, IterationError::Engine(EngineError::Spawn { .. })));
    let err = assert_err!(worker.run_iteration().await);
    assert!(matches!(err, IterationError::Engine(_)));
    assert!(reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_harvest_is_not_reported() {
    let source = FakeSource::with_pages(vec![Ok(vec!["91"])]);
    let factorer = FakeFactorer {
        empty: true,
        ..Default::default()
    };
    let sink = FakeSink::default();
    let reports = sink.reports.clone();
    let mut worker = normal_worker(source, factorer, sink);

    let outcome = assert_ok!(worker.run_iteration().await);
    assert_eq!(
        outcome,
        IterationOutcome::Factored {
            composites: 1,
            reported: 0,
            deadline: None,
        }
    );
    assert!(reports.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_report_rejection_then_loop_continues() {
    let source = FakeSource::with_pages(vec![Ok(vec!["91"]), Ok(vec!["221"])]);
    let sink = FakeSink {
        reject: true,
        ..Default::default()
    };
    let reports = sink.reports.clone();
    let mut worker = normal_worker(source, FakeFactorer::default(), sink);

    let err = assert_err!(worker.run_iteration().await);
    assert!(matches!(err, IterationError::Report(ReportError::Rejected { status: 500, .. })));
    let err = assert_err!(worker.run_iteration().await);
    assert!(matches!(err, IterationError::Report(_)));
    // 失败的上报不会重试
    assert_eq!(reports.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_survives_failures() {
    let _ = tracing_subscriber::fmt::try_init();
    let source = FakeSource::with_pages(vec![Err(500), Ok(vec!["91"]), Err(502)]);
    let factorer = FakeFactorer::default();
    let batches = factorer.batches.clone();
    let mut worker = normal_worker(source, factorer, FakeSink::default());

    // 循环永不返回，只能被超时打断
    let result = tokio::time::timeout(Duration::from_millis(200), worker.run()).await;
    assert!(result.is_err());
    assert!(worker.iterations() > 3);
    assert_eq!(batches.lock().unwrap().len(), 1);
}
