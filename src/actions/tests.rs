//! Unit tests for the action builders, run against a recording runner.

use super::*;
use crate::eden::read;
use crate::rules::load;
use rstest::rstest;
use std::sync::Mutex;
use tempfile::tempdir;

/// Records invocations instead of running them; optionally fails one program.
#[derive(Default)]
struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    fail: Option<&'static str>,
    creates_dirs: bool,
}

impl RecordingRunner {
    fn failing(program: &'static str) -> Self {
        Self {
            fail: Some(program),
            ..Self::default()
        }
    }

    fn lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ProcessError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(invocation.clone());
        if self.fail == Some(invocation.program()) {
            return Err(ProcessError::Exit {
                program: invocation.program().to_owned(),
                status: Some(1),
            });
        }
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        !self.creates_dirs
    }
}

fn rule(spec: &str, target: &str) -> Rule {
    let doc = read(spec).expect("valid spec");
    let report = load(&doc, &Attributes::new());
    assert!(report.is_clean(), "{:?}", report.errors);
    report.registry.get(target).expect("target rule").clone()
}

fn run_rule(
    rule: &Rule,
    runner: &RecordingRunner,
    artifacts: &BTreeMap<String, Artifact>,
) -> Result<Artifact, ActionError> {
    let home = Utf8Path::new("/home/user");
    build(&BuildContext::new(rule, runner, artifacts, Some(home)))
}

#[rstest]
#[case("c++bin", ActionKind::CppBin)]
#[case("c++lib", ActionKind::CppLib)]
#[case("install", ActionKind::Install)]
#[case("noop", ActionKind::Noop)]
fn action_kinds_parse_from_their_names(#[case] name: &str, #[case] kind: ActionKind) {
    assert_eq!(name.parse::<ActionKind>(), Ok(kind));
    assert_eq!(kind.to_string(), name);
}

#[test]
fn unknown_action_kind_is_rejected() {
    assert_eq!(
        "c++dll".parse::<ActionKind>(),
        Err(UnknownActionKind("c++dll".into()))
    );
}

#[test]
fn library_compiles_sources_into_object() {
    let rule = rule(
        r#"greet (c++lib [] {:compiler "cc" :inc ["pre.h"] :cflags-default ["-O2"]
                              :cflags ["-Wall"] :src ["greet.cc" "util.cc"]})"#,
        "greet",
    );
    let runner = RecordingRunner::default();
    let artifact = run_rule(&rule, &runner, &BTreeMap::new()).expect("build");
    assert_eq!(artifact, Artifact::Object(Utf8PathBuf::from(".out/greet.o")));
    assert_eq!(
        runner.lines(),
        vec!["cc -include pre.h -O2 -Wall -c greet.cc util.cc -o .out/greet.o"]
    );
}

#[test]
fn binary_links_dependency_objects() {
    let rule = rule(
        r#"{:compiler "cc" :linker "cc" :out-dir "o" :bin-dir "b"}
           hello (c++bin [greet marker] {:src "hello.cc" :lib ["m"] :lflags-default ["-s"]
                                         :lflags ["-static"]})"#,
        "hello",
    );
    let artifacts = BTreeMap::from([
        ("greet".to_owned(), Artifact::Object("o/greet.o".into())),
        ("marker".to_owned(), Artifact::Nothing),
    ]);
    let runner = RecordingRunner::default();
    let artifact = run_rule(&rule, &runner, &artifacts).expect("build");
    assert_eq!(
        artifact,
        Artifact::Binary {
            object: "o/hello.o".into(),
            binary: "b/hello".into(),
        }
    );
    assert_eq!(
        runner.lines(),
        vec![
            "cc -c hello.cc -o o/hello.o",
            "cc o/hello.o o/greet.o -o b/hello -lm -s -static",
        ]
    );
}

#[test]
fn repeated_dependency_is_linked_once() {
    let rule = rule(
        r#"hello (c++bin [greet marker greet] {:compiler "cc" :linker "cc" :src "hello.cc"})"#,
        "hello",
    );
    let artifacts = BTreeMap::from([
        ("greet".to_owned(), Artifact::Object(".out/greet.o".into())),
        ("marker".to_owned(), Artifact::Nothing),
    ]);
    let runner = RecordingRunner::default();
    run_rule(&rule, &runner, &artifacts).expect("build");
    assert_eq!(
        runner.lines(),
        vec![
            "cc -c hello.cc -o .out/hello.o",
            "cc .out/hello.o .out/greet.o -o .bin/hello",
        ]
    );
}

#[test]
fn binary_without_src_fails_before_running_tools() {
    let rule = rule(r#"app (c++bin [] {:compiler "cc" :linker "cc"})"#, "app");
    let runner = RecordingRunner::default();
    let err = run_rule(&rule, &runner, &BTreeMap::new()).expect_err("missing src");
    assert!(matches!(
        err,
        ActionError::Attribute(AttrError::Missing { ref key }) if key == ":src"
    ));
    assert!(runner.calls().is_empty());
}

#[test]
fn binary_requires_a_linker() {
    let rule = rule(r#"app (c++bin [] {:compiler "cc" :src "a.c"})"#, "app");
    let runner = RecordingRunner::default();
    let err = run_rule(&rule, &runner, &BTreeMap::new()).expect_err("missing linker");
    assert_eq!(err.to_string(), ":linker key not found");
}

#[test]
fn failed_dependency_blocks_dependent_binary() {
    let rule = rule(
        r#"app (c++bin [lib] {:compiler "cc" :linker "cc" :src "a.c"})"#,
        "app",
    );
    let runner = RecordingRunner::default();
    let err = run_rule(&rule, &runner, &BTreeMap::new()).expect_err("missing dep");
    assert!(matches!(err, ActionError::DependencyMissing { ref dep } if dep == "lib"));
}

#[rstest]
#[case("cc", Stage::Compile, "compiling failed")]
#[case("ld", Stage::Link, "linking failed")]
fn tool_failures_carry_their_stage(
    #[case] failing: &'static str,
    #[case] expected: Stage,
    #[case] message: &str,
) {
    let rule = rule(
        r#"app (c++bin [] {:compiler "cc" :linker "ld" :src "a.c"})"#,
        "app",
    );
    let runner = RecordingRunner::failing(failing);
    let err = run_rule(&rule, &runner, &BTreeMap::new()).expect_err("tool failure");
    assert!(matches!(err, ActionError::Tool { stage, .. } if stage == expected));
    assert_eq!(err.to_string(), message);
}

#[test]
fn install_copies_dependency_binaries() {
    let rule = rule(r#"inst (install [hello] {:install-dir "/opt/bin"})"#, "inst");
    let artifacts = BTreeMap::from([(
        "hello".to_owned(),
        Artifact::Binary {
            object: ".out/hello.o".into(),
            binary: ".bin/hello".into(),
        },
    )]);
    let runner = RecordingRunner::default();
    let artifact = run_rule(&rule, &runner, &artifacts).expect("install");
    assert_eq!(artifact, Artifact::Installed(vec!["/opt/bin/hello".into()]));
    assert_eq!(runner.lines(), vec!["cp .bin/hello /opt/bin/hello"]);
}

#[test]
fn repeated_install_dependency_is_copied_once() {
    let rule = rule(r#"inst (install [hello hello] {:install-dir "/opt/bin"})"#, "inst");
    let artifacts = BTreeMap::from([(
        "hello".to_owned(),
        Artifact::Binary {
            object: ".out/hello.o".into(),
            binary: ".bin/hello".into(),
        },
    )]);
    let runner = RecordingRunner::default();
    let artifact = run_rule(&rule, &runner, &artifacts).expect("install");
    assert_eq!(artifact, Artifact::Installed(vec!["/opt/bin/hello".into()]));
    assert_eq!(runner.lines(), vec!["cp .bin/hello /opt/bin/hello"]);
}

#[test]
fn install_defaults_to_home_local_bin() {
    let rule = rule("inst (install [hello])", "inst");
    let artifacts = BTreeMap::from([(
        "hello".to_owned(),
        Artifact::Binary {
            object: ".out/hello.o".into(),
            binary: ".bin/hello".into(),
        },
    )]);
    let runner = RecordingRunner::default();
    run_rule(&rule, &runner, &artifacts).expect("install");
    assert_eq!(
        runner.lines(),
        vec!["cp .bin/hello /home/user/.local/bin/hello"]
    );
}

#[test]
fn install_without_home_needs_explicit_directory() {
    let rule = rule("inst (install [])", "inst");
    let runner = RecordingRunner::default();
    let artifacts = BTreeMap::new();
    let err = build(&BuildContext::new(&rule, &runner, &artifacts, None)).expect_err("no home");
    assert!(matches!(err, ActionError::NoHomeDirectory));
}

#[test]
fn install_rejects_dependencies_without_binaries() {
    let rule = rule(r#"inst (install [lib] {:install-dir "/opt/bin"})"#, "inst");
    let artifacts = BTreeMap::from([("lib".to_owned(), Artifact::Object("lib.o".into()))]);
    let runner = RecordingRunner::default();
    let err = run_rule(&rule, &runner, &artifacts).expect_err("no binary");
    assert!(matches!(err, ActionError::NoBinary { ref dep } if dep == "lib"));
}

#[test]
fn noop_does_nothing() {
    let rule = rule("n (noop [])", "n");
    let runner = RecordingRunner::default();
    assert_eq!(
        run_rule(&rule, &runner, &BTreeMap::new()).expect("noop"),
        Artifact::Nothing
    );
    assert!(runner.calls().is_empty());
}

#[test]
fn rule_timeout_and_mockingly_reach_the_invocation() {
    let rule = rule(
        r#"lib (c++lib [] {:compiler "cc" :src "a.c" :timeout 7 :mockingly true})"#,
        "lib",
    );
    let runner = RecordingRunner::default();
    run_rule(&rule, &runner, &BTreeMap::new()).expect("build");
    let calls = runner.calls();
    let call = calls.first().expect("one call");
    assert_eq!(call.timeout(), Some(std::time::Duration::from_secs(7)));
    assert!(call.echo());
}

#[test]
fn output_directories_are_created() {
    let dir = tempdir().expect("tempdir");
    let out = dir.path().join("objects");
    let bin = dir.path().join("binaries");
    let spec = format!(
        r#"app (c++bin [] {{:compiler "cc" :linker "cc" :src "a.c" :out-dir "{}" :bin-dir "{}"}})"#,
        out.display(),
        bin.display()
    );
    let rule = rule(&spec, "app");
    let runner = RecordingRunner {
        creates_dirs: true,
        ..RecordingRunner::default()
    };
    run_rule(&rule, &runner, &BTreeMap::new()).expect("build");
    assert!(out.is_dir());
    assert!(bin.is_dir());
}
