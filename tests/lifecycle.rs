// tests/lifecycle.rs

use std::sync::{Arc, Mutex};

use dojobber::{DoJobber, JobDefinition, JobRegistry, JobberOptions, NodeMark, NodeStatus, Phase};
use dojobber_test_utils::{CheckBehaviour, RegistryBuilder, capture_logs, init_tracing, statuses};
use tracing::Level;

#[test]
fn failing_dependency_blocks_dependent() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Pass, &["B"])
        .job_with("B", CheckBehaviour::Fail, &[], |job| job.run_fails(true))
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("A", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    assert_eq!(
        jobber.statuses(),
        &statuses(&[("A", NodeStatus::Unattempted), ("B", NodeStatus::Failed)])
    );
    assert!(!jobber.success());
    assert!(!jobber.partial_success());

    // A was never instantiated, so never called.
    assert_eq!(log.calls(), ["B.check", "B.run", "B.recheck", "B.cleanup"]);
    assert!(jobber.exception("A").is_none());
    assert!(jobber.result("A").is_none());
    assert_eq!(jobber.exception("B").unwrap().to_string(), "B check failed");
    assert_eq!(jobber.run_exceptions()["B"].to_string(), "B run failed");
}

#[test]
fn dependency_passing_after_run_unblocks_dependent() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Pass, &["B"])
        .job("B", CheckBehaviour::PassAfterRun, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("A", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    assert_eq!(
        jobber.statuses(),
        &statuses(&[("A", NodeStatus::Succeeded), ("B", NodeStatus::Succeeded)])
    );
    assert!(jobber.success());
    assert!(jobber.partial_success());

    assert_eq!(jobber.marks()["A"], NodeMark::Passed);
    assert_eq!(jobber.marks()["B"], NodeMark::PassedAfterRun);
    assert_eq!(jobber.result("B").unwrap(), "B ok after run");
    assert!(jobber.exceptions().is_empty());
    assert_eq!(log.calls_for(Phase::Check), ["B.check", "A.check"]);
}

#[test]
fn constructor_failure_is_a_node_failure() {
    init_tracing();
    let (registry, _log) = RegistryBuilder::new()
        .job("Top00", CheckBehaviour::Pass, &["BrokenInit"])
        .broken("BrokenInit", &["Passful"])
        .definition(JobDefinition::noop("Passful"))
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("Top00", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    assert_eq!(
        jobber.statuses(),
        &statuses(&[
            ("BrokenInit", NodeStatus::Failed),
            ("Passful", NodeStatus::Succeeded),
            ("Top00", NodeStatus::Unattempted),
        ])
    );
    assert_eq!(
        jobber.exception("BrokenInit").unwrap().to_string(),
        "BrokenInit cannot be constructed"
    );
    assert!(jobber.partial_success());
}

#[test]
fn constructor_failure_does_not_stop_siblings() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("Top", CheckBehaviour::Pass, &["Broken", "Sibling"])
        .broken("Broken", &[])
        .job("Sibling", CheckBehaviour::PassAfterRun, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("Top", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    assert_eq!(jobber.status("Broken"), Some(NodeStatus::Failed));
    assert_eq!(jobber.status("Sibling"), Some(NodeStatus::Succeeded));
    assert_eq!(jobber.status("Top"), Some(NodeStatus::Unattempted));
    assert!(log.calls().contains(&"Sibling.recheck".to_string()));
}

#[test]
fn dependent_waits_for_all_dependencies() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("Z", CheckBehaviour::Pass, &["X", "Y"])
        .job("X", CheckBehaviour::Pass, &[])
        .job("Y", CheckBehaviour::PassAfterRun, &[])
        .build();

    let marks: Arc<Mutex<Vec<(String, NodeMark)>>> = Arc::default();
    let seen = Arc::clone(&marks);

    let mut jobber = DoJobber::new(registry);
    jobber.add_observer(move |job: &str, mark: NodeMark| {
        seen.lock().unwrap().push((job.to_string(), mark));
    });
    jobber.configure("Z", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    assert!(jobber.success());

    let marks = marks.lock().unwrap();
    let position = |job: &str, mark: NodeMark| {
        marks
            .iter()
            .position(|(j, m)| j == job && *m == mark)
            .unwrap()
    };
    let z_first = position("Z", NodeMark::Untested);
    assert!(position("X", NodeMark::Passed) < z_first);
    assert!(position("Y", NodeMark::PassedAfterRun) < z_first);

    assert_eq!(
        log.calls_for(Phase::Check),
        ["X.check", "Y.check", "Z.check"]
    );
}

#[test]
fn shared_dependency_is_attempted_once() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("Top", CheckBehaviour::Pass, &["Left", "Right"])
        .job("Left", CheckBehaviour::Pass, &["Base"])
        .job("Right", CheckBehaviour::Pass, &["Base"])
        .job("Base", CheckBehaviour::PassAfterRun, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("Top", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    assert!(jobber.success());
    let base_calls: Vec<_> = log
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("Base."))
        .collect();
    assert_eq!(
        base_calls,
        ["Base.check", "Base.run", "Base.recheck", "Base.cleanup"]
    );
}

#[test]
fn no_act_never_runs() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Pass, &["B", "C"])
        .job("B", CheckBehaviour::PassAfterRun, &[])
        .job("C", CheckBehaviour::Pass, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber
        .configure("A", JobberOptions::default().with_no_act(true))
        .unwrap();
    jobber.checknrun().unwrap();

    assert_eq!(
        jobber.statuses(),
        &statuses(&[
            ("A", NodeStatus::Unattempted),
            ("B", NodeStatus::Failed),
            ("C", NodeStatus::Succeeded),
        ])
    );
    assert!(log.calls_for(Phase::Run).is_empty());
    assert!(log.calls_for(Phase::Recheck).is_empty());
}

#[test]
fn checknrun_from_runs_a_subgraph() {
    init_tracing();
    let (registry, log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Pass, &["B"])
        .job("B", CheckBehaviour::Pass, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("A", JobberOptions::default()).unwrap();
    jobber.checknrun_from("B").unwrap();

    assert_eq!(
        jobber.statuses(),
        &statuses(&[("B", NodeStatus::Succeeded)])
    );
    assert_eq!(log.calls(), ["B.check", "B.cleanup"]);
}

#[test]
fn fresh_run_resets_results() {
    init_tracing();
    let (registry, _log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Fail, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("A", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();
    assert_eq!(jobber.status("A"), Some(NodeStatus::Failed));
    assert_eq!(jobber.summary().failed, 1);

    jobber.checknrun().unwrap();
    assert_eq!(jobber.summary().total(), 1);
    assert_eq!(jobber.exceptions().len(), 1);
}

#[test]
fn graph_view_carries_marks() {
    init_tracing();
    let (registry, _log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Pass, &["B"])
        .job("B", CheckBehaviour::PassAfterRun, &[])
        .build();

    let mut jobber = DoJobber::new(registry);
    jobber.configure("A", JobberOptions::default()).unwrap();
    jobber.checknrun().unwrap();

    let view = jobber.graph_view().unwrap();
    assert_eq!(view.root, "A");
    assert_eq!(view.node("A").unwrap().color, Some("green"));
    assert_eq!(view.node("B").unwrap().color, Some("darkgreen"));
    assert_eq!(view.edges.len(), 1);
    assert_eq!(view.edges[0].job, "A");
    assert_eq!(view.edges[0].dependency, "B");
}

fn pass_and_fail_registry() -> JobRegistry {
    let (registry, _log) = RegistryBuilder::new()
        .job("A", CheckBehaviour::Pass, &["B"])
        .job("B", CheckBehaviour::Fail, &[])
        .build();
    registry
}

fn run_logged(options: JobberOptions) -> (JobberOptions, String) {
    let mut jobber = DoJobber::new(pass_and_fail_registry());
    capture_logs(Level::INFO, || {
        jobber.configure("B", options).unwrap();
        jobber.checknrun().unwrap();
        jobber.options()
    })
}

#[test]
fn debug_implies_verbose() {
    let mut jobber = DoJobber::new(pass_and_fail_registry());
    jobber
        .configure("A", JobberOptions::default().with_debug(true))
        .unwrap();
    assert!(jobber.options().verbose);
    assert!(jobber.options().debug);
}

#[test]
fn quiet_run_keeps_phase_lines_below_info() {
    let (options, logs) = run_logged(JobberOptions::default());

    assert!(!options.verbose);
    assert!(logs.contains("checknrun finished"));
    assert!(!logs.contains("fail job=B"));
    assert!(!logs.contains("error was"));
}

#[test]
fn verbose_run_logs_each_phase_at_info() {
    let (_, logs) = run_logged(JobberOptions::default().with_verbose(true));

    assert!(logs.contains("INFO fail job=B phase=check error=B check failed"));
    assert!(logs.contains("INFO pass job=B phase=run"));
    assert!(logs.contains("INFO fail job=B phase=recheck error=B check failed"));
    assert!(!logs.contains("error was"));
}

#[test]
fn debug_run_adds_error_chains() {
    let (options, logs) = run_logged(JobberOptions::default().with_debug(true));

    assert!(options.verbose);
    assert!(logs.contains("INFO fail job=B phase=check"));
    assert!(logs.contains("WARN error was: B check failed job=B phase=check"));
}
