// tests/graph_validation.rs

use dagkube::dag::{Executor, Graph};
use dagkube::errors::DagError;
use dagkube_test_utils::builders::GraphBuilder;
use dagkube_test_utils::recording::Recorder;

#[test]
fn test_cycle_is_rejected() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new("root", &recorder)
        .task("A", &["B"])
        .task("B", &["A"])
        .root_after(&["A"])
        .build();

    match Executor::new(graph) {
        Err(DagError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_self_dependency_is_rejected() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new("root", &recorder)
        .task("A", &["A"])
        .root_after(&["A"])
        .build();

    assert!(matches!(graph.validate(), Err(DagError::DagCycle(_))));
}

#[test]
fn test_dangling_prerequisite_is_rejected() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new("root", &recorder)
        .task("A", &["ghost"])
        .root_after(&["A"])
        .build();

    match graph.validate() {
        Err(DagError::UnknownTask(msg)) => assert!(msg.contains("ghost")),
        other => panic!("Expected UnknownTask, got: {:?}", other),
    }
}

#[test]
fn test_unreachable_task_is_rejected() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new("root", &recorder)
        .task("A", &[])
        .task("orphan", &[])
        .root_after(&["A"])
        .build();

    match graph.validate() {
        Err(DagError::Unreachable(msg)) => assert_eq!(msg, "orphan"),
        other => panic!("Expected Unreachable, got: {:?}", other),
    }
}

#[test]
fn test_depending_on_root_is_rejected() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new("root", &recorder)
        .task("A", &["root"])
        .root_after(&["A"])
        .build();

    assert!(matches!(graph.validate(), Err(DagError::DagCycle(_))));
}

#[test]
fn test_duplicate_task_is_rejected() {
    let recorder = Recorder::new();
    let mut graph: Graph<String> = Graph::new("root".to_string());
    graph.add_task(recorder.task("A")).unwrap();

    match graph.add_task(recorder.task("A")) {
        Err(DagError::DuplicateTask(id)) => assert_eq!(id, "A"),
        Err(e) => panic!("Expected DuplicateTask, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_valid_graph_reports_shape() {
    let recorder = Recorder::new();
    let graph = GraphBuilder::new("root", &recorder)
        .task("A", &[])
        .task("B", &["A"])
        .task("C", &["A"])
        .task("D", &["B", "C"])
        .root_after(&["A", "B", "C", "D"])
        .build();

    graph.validate().unwrap();
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.edge_count(), 8);
    assert_eq!(graph.root(), "root");

    let deps: Vec<&String> = graph.dependencies_of(&"D".to_string()).collect();
    assert_eq!(deps, vec!["B", "C"]);
    assert_eq!(graph.dependencies_of(&"A".to_string()).count(), 0);
}

#[test]
fn test_duplicate_edges_collapse() {
    let recorder = Recorder::new();
    let mut graph = GraphBuilder::new("root", &recorder)
        .task("A", &[])
        .task("B", &["A"])
        .root_after(&["B"])
        .build();
    graph.add_dependency("B".to_string(), "A".to_string());

    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn test_integer_identifiers_are_supported() {
    use dagkube::dag::{BoxFuture, Task, TaskResult};

    struct Noop(u32);

    impl Task<u32> for Noop {
        fn id(&self) -> &u32 {
            &self.0
        }

        fn run(&self) -> BoxFuture<'_, TaskResult> {
            Box::pin(async { Ok(()) })
        }
    }

    let mut graph = Graph::new(4u32);
    graph.add_task(Noop(0)).unwrap();
    graph.add_task(Noop(1)).unwrap();
    graph.add_dependency(0, 1);
    graph.add_dependency(4, 0);
    graph.add_dependency(4, 1);

    assert!(Executor::new(graph).is_ok());
}
