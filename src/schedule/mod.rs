//! Layered topological ordering of build targets.
//!
//! [`schedule`] groups the transitive dependency closure of the requested
//! targets into phases. Every target in a phase depends only on targets in
//! earlier phases, so the members of one phase may be built concurrently and
//! phases must run strictly in order.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

mod cycle;

use miette::Diagnostic;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;
use tracing::debug;

/// Targets that may be built concurrently.
pub type Phase = BTreeSet<String>;

/// Errors that prevent a schedule from being produced.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ScheduleError {
    /// A requested or depended-on target has no rule.
    #[error("unknown target `{target}`{}", required_by_suffix(.required_by.as_deref()))]
    #[diagnostic(code(aa::schedule::unknown_target))]
    UnknownTarget {
        /// The missing target.
        target: String,
        /// The target whose dependency list names it; `None` when requested
        /// directly.
        required_by: Option<String>,
    },
    /// Some targets can never become ready.
    #[error(
        "dependency cycle detected: {} (unscheduled: {})",
        .cycle.join(" -> "),
        .unscheduled.join(", ")
    )]
    #[diagnostic(
        code(aa::schedule::cycle),
        help("remove one of the dependencies along the cycle")
    )]
    Cycle {
        /// One concrete cycle, starting and ending at the same target.
        cycle: Vec<String>,
        /// Every target that could not be placed in a phase.
        unscheduled: Vec<String>,
    },
}

fn required_by_suffix(required_by: Option<&str>) -> String {
    required_by.map_or_else(String::new, |parent| format!(" (required by `{parent}`)"))
}

/// Order the dependency closure of `requested` into phases.
///
/// `deps_of` maps every known target to the set of targets it depends on.
///
/// # Errors
///
/// Returns [`ScheduleError::UnknownTarget`] when a requested or transitively
/// required target is absent from `deps_of`, and [`ScheduleError::Cycle`]
/// when the closure contains a dependency cycle.
///
/// # Examples
///
/// ```
/// use aa::schedule::schedule;
/// use std::collections::{BTreeMap, BTreeSet};
///
/// let deps: BTreeMap<String, BTreeSet<String>> = [
///     ("app", vec!["lib"]),
///     ("lib", vec![]),
/// ]
/// .into_iter()
/// .map(|(t, d)| (t.to_owned(), d.into_iter().map(str::to_owned).collect()))
/// .collect();
/// let phases = schedule(["app"], &deps).expect("acyclic");
/// assert_eq!(phases.len(), 2);
/// assert!(phases[0].contains("lib"));
/// ```
pub fn schedule<I, S>(
    requested: I,
    deps_of: &BTreeMap<String, BTreeSet<String>>,
) -> Result<Vec<Phase>, ScheduleError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pending: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut queue: VecDeque<(String, Option<String>)> = requested
        .into_iter()
        .map(|target| (target.as_ref().to_owned(), None))
        .collect();

    while let Some((target, required_by)) = queue.pop_front() {
        if pending.contains_key(&target) {
            continue;
        }
        let Some(deps) = deps_of.get(&target) else {
            return Err(ScheduleError::UnknownTarget {
                target,
                required_by,
            });
        };
        for dep in deps {
            dependents
                .entry(dep.clone())
                .or_default()
                .insert(target.clone());
            if !pending.contains_key(dep) {
                queue.push_back((dep.clone(), Some(target.clone())));
            }
        }
        pending.insert(target, deps.clone());
    }

    let discovered = pending.len();
    let mut phases = Vec::new();
    let mut ready: Phase = pending
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(target, _)| target.clone())
        .collect();

    while !ready.is_empty() {
        let mut next = Phase::new();
        for done in &ready {
            pending.remove(done);
            for dependent in dependents.get(done).into_iter().flatten() {
                if let Some(waiting) = pending.get_mut(dependent) {
                    waiting.remove(done);
                    if waiting.is_empty() {
                        next.insert(dependent.clone());
                    }
                }
            }
        }
        phases.push(ready);
        ready = next;
    }

    if !pending.is_empty() {
        return Err(cycle_error(&pending));
    }
    debug!(
        targets = discovered,
        phases = phases.len(),
        "scheduled dependency closure"
    );
    Ok(phases)
}

fn cycle_error(unscheduled: &BTreeMap<String, BTreeSet<String>>) -> ScheduleError {
    ScheduleError::Cycle {
        cycle: cycle::trace_cycle(unscheduled),
        unscheduled: unscheduled.keys().cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn graph(edges: &[(&str, &str)]) -> BTreeMap<String, BTreeSet<String>> {
        edges
            .iter()
            .map(|(target, deps)| {
                (
                    (*target).to_owned(),
                    deps.split_whitespace().map(str::to_owned).collect(),
                )
            })
            .collect()
    }

    fn phase(names: &str) -> Phase {
        names.split_whitespace().map(str::to_owned).collect()
    }

    #[test]
    fn diamond_is_layered() {
        let deps = graph(&[("a", "b c"), ("b", "d"), ("c", "d"), ("d", "")]);
        let phases = schedule(["a"], &deps).expect("schedule");
        assert_eq!(phases, vec![phase("d"), phase("b c"), phase("a")]);
    }

    #[test]
    fn only_the_requested_closure_is_scheduled() {
        let deps = graph(&[("a", "b"), ("b", ""), ("unrelated", "")]);
        let phases = schedule(["a"], &deps).expect("schedule");
        assert_eq!(phases, vec![phase("b"), phase("a")]);
    }

    #[test]
    fn independent_requests_share_a_phase() {
        let deps = graph(&[("p", ""), ("q", "")]);
        let phases = schedule(["q", "p"], &deps).expect("schedule");
        assert_eq!(phases, vec![phase("p q")]);
    }

    #[test]
    fn target_waits_for_its_deepest_dependency() {
        let deps = graph(&[("a", "b d"), ("b", "c"), ("c", "d"), ("d", "")]);
        let phases = schedule(["a"], &deps).expect("schedule");
        assert_eq!(
            phases,
            vec![phase("d"), phase("c"), phase("b"), phase("a")]
        );
    }

    #[test]
    fn empty_request_yields_no_phases() {
        let deps = graph(&[("a", "")]);
        let phases = schedule(Vec::<String>::new(), &deps).expect("schedule");
        assert!(phases.is_empty());
    }

    #[rstest]
    #[case::requested(&["z"], "z", None)]
    #[case::transitive(&["a"], "missing", Some("a"))]
    fn unknown_targets_are_named(
        #[case] requested: &[&str],
        #[case] target: &str,
        #[case] required_by: Option<&str>,
    ) {
        let deps = graph(&[("a", "missing")]);
        let err = schedule(requested, &deps).expect_err("unknown target");
        assert_eq!(
            err,
            ScheduleError::UnknownTarget {
                target: target.to_owned(),
                required_by: required_by.map(str::to_owned),
            }
        );
    }

    #[test]
    fn cycles_are_reported_not_truncated() {
        let deps = graph(&[("x", "y"), ("y", "x")]);
        let err = schedule(["x"], &deps).expect_err("cycle");
        assert_eq!(
            err,
            ScheduleError::Cycle {
                cycle: vec!["x".into(), "y".into(), "x".into()],
                unscheduled: vec!["x".into(), "y".into()],
            }
        );
        assert_eq!(
            err.to_string(),
            "dependency cycle detected: x -> y -> x (unscheduled: x, y)"
        );
    }

    #[test]
    fn dependents_of_a_cycle_are_unscheduled() {
        let deps = graph(&[("top", "x leaf"), ("x", "y"), ("y", "x"), ("leaf", "")]);
        let err = schedule(["top"], &deps).expect_err("cycle");
        let ScheduleError::Cycle { cycle, unscheduled } = err else {
            panic!("expected a cycle error");
        };
        assert_eq!(cycle, vec!["x", "y", "x"]);
        assert_eq!(unscheduled, vec!["top", "x", "y"]);
    }

    #[test]
    fn unknown_target_message_names_the_parent() {
        let deps = graph(&[("a", "gone")]);
        let err = schedule(["a"], &deps).expect_err("unknown");
        assert_eq!(
            err.to_string(),
            "unknown target `gone` (required by `a`)"
        );
    }
}
