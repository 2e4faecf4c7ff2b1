//! Unit tests for phase execution and failure aggregation.

use super::*;
use crate::attrs::Attributes;
use crate::eden::read;
use crate::rules::load;
use std::sync::Mutex;
use test_support::display_error_chain;

/// Records every program it is asked to run; programs named `fail` exit 1.
#[derive(Default)]
struct ScriptedRunner {
    programs: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn ran(&self) -> Vec<String> {
        self.programs.lock().expect("programs lock").clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ProcessError> {
        let marker = invocation
            .argv()
            .iter()
            .find(|arg| arg.ends_with(".c"))
            .cloned()
            .unwrap_or_else(|| invocation.program().to_owned());
        self.programs.lock().expect("programs lock").push(marker);
        if invocation.program() == "fail" {
            return Err(ProcessError::Exit {
                program: "fail".to_owned(),
                status: Some(1),
            });
        }
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

fn registry(spec: &str) -> Registry {
    let doc = read(spec).expect("valid spec");
    let report = load(&doc, &Attributes::new());
    assert!(report.is_clean(), "{:?}", report.errors);
    report.registry
}

#[test]
fn partial_failure_still_attempts_siblings() {
    let registry = registry(
        r#"p (c++lib [] {:compiler "fail" :src "p.c"})
           q (c++lib [] {:compiler "cc" :src "q.c"})"#,
    );
    let runner = ScriptedRunner::default();
    let err = Dispatcher::new(&registry, &runner)
        .resolve_all(["p", "q"])
        .expect_err("p fails");
    let mut ran = runner.ran();
    ran.sort();
    assert_eq!(ran, vec!["p.c", "q.c"]);
    let message = err.to_string();
    assert!(message.contains("[target=p]"), "{message}");
    assert!(!message.contains("[target=q]"), "{message}");
    assert_eq!(
        message,
        "[target=p] compiling failed: `fail` exited with status 1"
    );
    let ResolveError::Failed { failures } = err else {
        panic!("expected aggregated failures");
    };
    let [failure] = failures.as_slice() else {
        panic!("expected exactly one failure");
    };
    assert_eq!(
        display_error_chain(failure.error()),
        "compiling failed: `fail` exited with status 1"
    );
}

#[test]
fn dependencies_build_in_earlier_phases() {
    let registry = registry(
        r#"{:compiler "cc" :linker "ld"}
           app (c++bin [lib] {:src "app.c"})
           lib (c++lib [] {:src "lib.c"})"#,
    );
    let runner = ScriptedRunner::default();
    let artifacts = Dispatcher::new(&registry, &runner)
        .with_jobs(NonZeroUsize::new(2))
        .resolve_all(["app"])
        .expect("build");
    assert_eq!(runner.ran(), vec!["lib.c", "app.c", "ld"]);
    assert_eq!(
        artifacts.get("app").and_then(Artifact::binary).map(|p| p.as_str()),
        Some(".bin/app")
    );
}

#[test]
fn later_phases_run_after_a_failure() {
    let registry = registry(
        r#"{:linker "ld"}
           app (c++bin [broken] {:compiler "cc" :src "app.c"})
           broken (c++lib [] {:compiler "fail" :src "broken.c"})
           other (noop [])"#,
    );
    let runner = ScriptedRunner::default();
    let err = Dispatcher::new(&registry, &runner)
        .resolve_all(["app", "other"])
        .expect_err("broken fails");
    let ResolveError::Failed { failures } = err else {
        panic!("expected aggregated failures");
    };
    let targets: Vec<_> = failures.iter().map(TargetFailure::target).collect();
    assert_eq!(targets, vec!["app", "broken"]);
    assert!(matches!(
        failures.first().map(TargetFailure::error),
        Some(ActionError::DependencyMissing { dep }) if dep == "broken"
    ));
}

#[test]
fn schedule_errors_stop_before_running_anything() {
    let registry = registry("x (noop [y]) y (noop [x])");
    let runner = ScriptedRunner::default();
    let err = Dispatcher::new(&registry, &runner)
        .resolve_all(["x"])
        .expect_err("cycle");
    assert!(matches!(
        err,
        ResolveError::Schedule(ScheduleError::Cycle { .. })
    ));
    assert!(runner.ran().is_empty());
}

#[test]
fn unknown_requested_target_is_named() {
    let registry = registry("a (noop [])");
    let runner = ScriptedRunner::default();
    let err = Dispatcher::new(&registry, &runner)
        .resolve_all(["z"])
        .expect_err("unknown");
    assert_eq!(err.to_string(), "unknown target `z`");
}

#[test]
fn noop_targets_produce_no_artifact_files() {
    let registry = registry("a (noop [b]) b (noop [])");
    let runner = ScriptedRunner::default();
    let artifacts = Dispatcher::new(&registry, &runner)
        .resolve_all(["a"])
        .expect("noop");
    assert_eq!(artifacts.get("a"), Some(&Artifact::Nothing));
    assert_eq!(artifacts.get("b"), Some(&Artifact::Nothing));
    assert!(runner.ran().is_empty());
}
