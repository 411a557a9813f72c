// tests/property_scheduler.rs

use std::collections::BTreeSet;

use proptest::prelude::*;

use dagkube::dag::{Executor, Graph};
use dagkube::types::Strategy as RunStrategy;
use dagkube_test_utils::builders::GraphBuilder;
use dagkube_test_utils::recording::Recorder;

#[derive(Debug, Clone)]
struct Shape {
    /// Prerequisites of task `i`, all lower than `i`.
    deps: Vec<BTreeSet<usize>>,
    failing: BTreeSet<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expected {
    Succeeded,
    Failed,
    Skipped,
}

// Acyclic by construction: task N may only depend on tasks 0..N-1.
fn shape_strategy(max_tasks: usize) -> impl Strategy<Value = Shape> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        (
            proptest::collection::vec(
                proptest::collection::vec(any::<usize>(), 0..num_tasks),
                num_tasks,
            ),
            proptest::collection::vec(any::<usize>(), 0..3),
        )
            .prop_map(move |(raw_deps, raw_failing)| {
                let deps = raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, raw)| {
                        if i == 0 {
                            BTreeSet::new()
                        } else {
                            raw.into_iter().map(|d| d % i).collect()
                        }
                    })
                    .collect();
                let failing = raw_failing.into_iter().map(|f| f % num_tasks).collect();
                Shape { deps, failing }
            })
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

fn build_graph(shape: &Shape, recorder: &Recorder) -> Graph<String> {
    let names: Vec<String> = (0..shape.deps.len()).map(name).collect();
    let mut builder = GraphBuilder::new("root", recorder);
    for (i, deps) in shape.deps.iter().enumerate() {
        let dep_names: Vec<&str> = deps.iter().map(|&d| names[d].as_str()).collect();
        let mut task = recorder.task(&names[i]).delay_ms(1);
        if shape.failing.contains(&i) {
            task = task.failing();
        }
        builder = builder.with_task(task, &dep_names);
    }
    let all: Vec<&str> = names.iter().map(String::as_str).collect();
    builder.root_after(&all).build()
}

fn expected(shape: &Shape) -> Vec<Expected> {
    let mut out: Vec<Expected> = Vec::with_capacity(shape.deps.len());
    for (i, deps) in shape.deps.iter().enumerate() {
        let state = if deps.iter().any(|&d| out[d] != Expected::Succeeded) {
            Expected::Skipped
        } else if shape.failing.contains(&i) {
            Expected::Failed
        } else {
            Expected::Succeeded
        };
        out.push(state);
    }
    out
}

fn check_run(shape: &Shape, strategy: RunStrategy) -> Result<(), TestCaseError> {
    let recorder = Recorder::new();
    let graph = build_graph(shape, &recorder);
    let executor = Executor::new(graph)
        .map_err(|e| TestCaseError::fail(format!("valid graph rejected: {e}")))?
        .with_strategy(strategy);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap();
    let report = rt
        .block_on(async { tokio::time::timeout(std::time::Duration::from_secs(10), executor.run()).await })
        .map_err(|_| TestCaseError::fail("run did not terminate"))?
        .map_err(|e| TestCaseError::fail(format!("run errored: {e}")))?;

    let expected = expected(shape);
    let mut want_failed = Vec::new();
    let mut want_skipped = Vec::new();

    for (i, state) in expected.iter().enumerate() {
        let id = name(i);
        let runs = recorder.runs_of(&id);
        match state {
            Expected::Skipped => {
                prop_assert_eq!(runs, 0, "{} should have been skipped", id);
                want_skipped.push(id.clone());
            }
            Expected::Failed | Expected::Succeeded => {
                prop_assert_eq!(runs, 1, "{} should run exactly once", id);
                for &d in &shape.deps[i] {
                    prop_assert!(
                        recorder.finished_before_started(&name(d), &id),
                        "{} started before prerequisite {} finished",
                        id,
                        name(d)
                    );
                }
                if *state == Expected::Failed {
                    want_failed.push(id.clone());
                }
            }
        }
    }

    want_failed.sort();
    want_skipped.sort();
    let got_failed: Vec<String> = report.failed_ids().into_iter().cloned().collect();
    let got_skipped: Vec<String> = report.skipped_ids().into_iter().cloned().collect();
    prop_assert_eq!(got_failed, want_failed);
    prop_assert_eq!(got_skipped, want_skipped);
    prop_assert_eq!(
        report.root_succeeded,
        expected.iter().all(|s| *s == Expected::Succeeded)
    );

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_spawn_strategy_matches_model(shape in shape_strategy(8)) {
        check_run(&shape, RunStrategy::Spawn)?;
    }

    #[test]
    fn test_pool_strategy_matches_model(shape in shape_strategy(8), workers in 1usize..4) {
        check_run(&shape, RunStrategy::Pool { workers })?;
    }
}
