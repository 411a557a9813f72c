// src/lib.rs

//! Concurrent DAG task executor.
//!
//! A [`Graph`](dag::Graph) has one root and explicit prerequisite edges. The
//! [`Executor`](dag::Executor) runs independent tasks in parallel, attempts
//! every task exactly once however many paths lead to it, skips dependents of
//! failed tasks while unrelated branches carry on, and reports every failure
//! and skip once the root has settled.

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{Executor, Graph, RunReport};
use crate::types::Strategy;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - graph construction
/// - strategy selection (config, overridden by CLI flags)
/// - the run itself and the summary on stdout
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = &args.config;
    let cfg = load_and_validate(config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let strategy = resolve_strategy(&cfg, &args);
    let graph = Graph::from_config(&cfg)?;
    let executor = Executor::new(graph)?.with_strategy(strategy);

    info!(config = ?config_path, ?strategy, "running DAG");
    let report = executor.run().await?;
    print_report(&report);

    if !report.is_success() {
        bail!(
            "DAG run failed: {} task(s) failed, {} skipped",
            report.failed().count(),
            report.skipped().count()
        );
    }

    Ok(())
}

/// CLI flags win over `[run]`.
fn resolve_strategy(cfg: &ConfigFile, args: &CliArgs) -> Strategy {
    let kind = args.strategy.map(Into::into).unwrap_or(cfg.run.strategy);
    let workers = args.max_workers.unwrap_or(cfg.run.max_workers);
    Strategy::from_kind(kind, workers)
}

fn print_report(report: &RunReport<String>) {
    if report.is_success() {
        println!("dagkube: all tasks succeeded");
        return;
    }

    println!("dagkube: run failed");
    for failure in report.failed() {
        println!("  FAILED  {failure}");
    }
    for skip in report.skipped() {
        println!("  SKIPPED {skip}");
    }
}

/// Simple dry-run output: print run settings, tasks, deps and commands.
fn print_dry_run(cfg: &ConfigFile) {
    println!("dagkube dry-run");
    println!("  run.root = {}", cfg.run.root);
    println!("  run.strategy = {:?}", cfg.run.strategy);
    println!("  run.max_workers = {}", cfg.run.max_workers);
    println!("  root depends on: {:?}", cfg.terminal_tasks());
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        let retries = task.retries.unwrap_or(cfg.default.retries);
        if retries > 0 {
            println!(
                "      retries: {retries} (base delay {:?})",
                cfg.retry_delay_for(task)
            );
        }
    }

    debug!("dry-run complete (no execution)");
}
