// tests/pool_strategy.rs

use dagkube::dag::Executor;
use dagkube::types::Strategy;
use dagkube_test_utils::builders::GraphBuilder;
use dagkube_test_utils::recording::Recorder;
use dagkube_test_utils::{init_tracing, with_timeout};

fn diamond(recorder: &Recorder, fail_a: bool) -> dagkube::dag::Graph<String> {
    let builder = GraphBuilder::new("root", recorder);
    let builder = if fail_a {
        builder.failing_task("A", &[])
    } else {
        builder.task("A", &[])
    };
    builder
        .task("B", &["A"])
        .task("C", &["A"])
        .task("D", &["B", "C"])
        .root_after(&["A", "B", "C", "D"])
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_diamond_succeeds_in_order() {
    init_tracing();
    let recorder = Recorder::new();
    let executor = Executor::new(diamond(&recorder, false))
        .unwrap()
        .with_strategy(Strategy::Pool { workers: 2 });

    let report = with_timeout(executor.run()).await.unwrap();

    assert!(report.is_success());
    for id in ["A", "B", "C", "D"] {
        assert_eq!(recorder.runs_of(id), 1);
    }
    assert!(recorder.finished_before_started("A", "B"));
    assert!(recorder.finished_before_started("A", "C"));
    assert!(recorder.finished_before_started("B", "D"));
    assert!(recorder.finished_before_started("C", "D"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_failure_skips_dependents() {
    init_tracing();
    let recorder = Recorder::new();
    let executor = Executor::new(diamond(&recorder, true))
        .unwrap()
        .with_strategy(Strategy::Pool { workers: 3 });

    let report = with_timeout(executor.run()).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failed_ids(), vec!["A"]);
    assert_eq!(report.skipped_ids(), vec!["B", "C", "D"]);
    assert_eq!(recorder.started(), vec!["A".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_never_exceeds_worker_count() {
    init_tracing();
    let recorder = Recorder::new();

    // Eight independent tasks, two workers.
    let ids: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
    let mut builder = GraphBuilder::new("root", &recorder);
    for id in &ids {
        builder = builder.with_task(recorder.task(id).delay_ms(30), &[]);
    }
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let graph = builder.root_after(&refs).build();

    let executor = Executor::new(graph)
        .unwrap()
        .with_strategy(Strategy::Pool { workers: 2 });
    let report = with_timeout(executor.run()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(recorder.started().len(), 8);
    assert!(recorder.max_concurrency() <= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_worker_runs_everything_sequentially() {
    init_tracing();
    let recorder = Recorder::new();
    let executor = Executor::new(diamond(&recorder, false))
        .unwrap()
        .with_strategy(Strategy::Pool { workers: 1 });

    let report = with_timeout(executor.run()).await.unwrap();

    assert!(report.is_success());
    assert_eq!(recorder.max_concurrency(), 1);
    assert_eq!(recorder.started().first().map(String::as_str), Some("A"));
    assert_eq!(recorder.started().last().map(String::as_str), Some("D"));
}
