// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use dagkube::config::{load_and_validate, parse_and_validate};
use dagkube::dag::Graph;
use dagkube::errors::DagError;
use dagkube::types::{Strategy, StrategyKind};
use dagkube_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_full_config_loads_with_defaults_applied() {
    let file = write_config(
        r#"
[run]
strategy = "pool"
max_workers = 2

[default]
retries = 2
retry_delay_ms = 250

[task.build]
cmd = "echo build"

[task.test]
cmd = "echo test"
after = ["build"]
retry_delay_ms = 10

[task.lint]
cmd = "echo lint"
retries = 0
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.run.root, "root");
    assert_eq!(cfg.run.strategy, StrategyKind::Pool);
    assert_eq!(cfg.strategy(), Strategy::Pool { workers: 2 });
    assert_eq!(cfg.default.retries, 2);

    let test = &cfg.task["test"];
    assert_eq!(test.after, vec!["build".to_string()]);
    assert_eq!(cfg.retry_delay_for(test), Duration::from_millis(10));
    assert_eq!(
        cfg.retry_delay_for(&cfg.task["build"]),
        Duration::from_millis(250)
    );
    assert_eq!(cfg.terminal_tasks(), vec!["lint", "test"]);
}

#[test]
fn test_minimal_config_uses_spawn_strategy() {
    let cfg = parse_and_validate(
        r#"
[task.only]
cmd = "true"
"#,
    )
    .unwrap();

    assert_eq!(cfg.strategy(), Strategy::Spawn);
    assert_eq!(cfg.run.max_workers, 4);
    assert_eq!(cfg.retry_delay_for(&cfg.task["only"]), Duration::from_secs(1));
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagError::UnknownTask(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected UnknownTask, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let result = parse_and_validate(
        r#"
[task.A]
cmd = "echo A"
after = ["A"]
"#,
    );
    assert!(matches!(result, Err(DagError::DagCycle(_))));
}

#[test]
fn test_zero_workers_is_rejected() {
    let result = parse_and_validate(
        r#"
[run]
max_workers = 0

[task.A]
cmd = "echo A"
"#,
    );

    match result {
        Err(DagError::ConfigError(msg)) => assert!(msg.contains("max_workers")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_task_named_like_root_is_rejected() {
    let result = parse_and_validate(
        r#"
[run]
root = "all"

[task.all]
cmd = "echo all"
"#,
    );

    match result {
        Err(DagError::ConfigError(msg)) => assert!(msg.contains("collides with the root")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_config_is_rejected() {
    assert!(matches!(
        parse_and_validate(""),
        Err(DagError::ConfigError(_))
    ));
}

#[test]
fn test_unknown_strategy_is_a_toml_error() {
    let result = parse_and_validate(
        r#"
[run]
strategy = "fastest"

[task.A]
cmd = "echo A"
"#,
    );
    assert!(matches!(result, Err(DagError::TomlError(_))));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(DagError::IoError(_))));
}

#[test]
fn test_graph_from_config_roots_terminal_tasks() {
    let cfg = ConfigFileBuilder::new()
        .with_root("everything")
        .with_task("A", TaskConfigBuilder::new("echo A").build())
        .with_task("B", TaskConfigBuilder::new("echo B").after("A").build())
        .with_task("C", TaskConfigBuilder::new("echo C").after("A").build())
        .with_task(
            "D",
            TaskConfigBuilder::new("echo D").after("B").after("C").build(),
        )
        .with_task("E", TaskConfigBuilder::new("echo E").retries(3).build())
        .build();

    let graph = Graph::from_config(&cfg).unwrap();
    graph.validate().unwrap();

    assert_eq!(graph.root(), "everything");
    assert_eq!(graph.len(), 5);
    let root_deps: Vec<&String> = graph.dependencies_of(graph.root()).collect();
    assert_eq!(root_deps, vec!["D", "E"]);
    let d_deps: Vec<&String> = graph.dependencies_of(&"D".to_string()).collect();
    assert_eq!(d_deps, vec!["B", "C"]);
}

#[test]
fn test_builder_pool_settings_resolve_strategy() {
    let cfg = ConfigFileBuilder::new()
        .with_pool(3)
        .with_default_retries(1)
        .with_task("A", TaskConfigBuilder::new("true").build())
        .build();

    assert_eq!(cfg.strategy(), Strategy::Pool { workers: 3 });
    assert_eq!(cfg.default.retries, 1);
}

#[test]
fn test_strategy_kind_parses_from_str() {
    assert_eq!("pool".parse::<StrategyKind>().unwrap(), StrategyKind::Pool);
    assert_eq!(" Spawn ".parse::<StrategyKind>().unwrap(), StrategyKind::Spawn);
    assert!("round-robin".parse::<StrategyKind>().is_err());
    assert_eq!(StrategyKind::default(), StrategyKind::Spawn);
    assert_eq!(Strategy::default(), Strategy::Spawn);
    assert_eq!(
        Strategy::from_kind(StrategyKind::Pool, 0),
        Strategy::Pool { workers: 1 }
    );
}
