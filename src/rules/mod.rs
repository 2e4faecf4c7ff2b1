//! Rule loading from a parsed build specification.
//!
//! A specification is an optional map of module attributes followed by
//! alternating target names and rule forms:
//!
//! ```text
//! {:out-dir "build"}
//! hello (c++bin [greet] {:src ["hello.cc"]})
//! greet (c++lib [] {:src ["greet.cc"]})
//! ```
//!
//! Each rule form is a list of the action kind, a vector of dependencies and
//! an optional map of rule attributes. Problems with one rule are collected
//! and loading moves on to the next rule.

mod error;

pub use error::RuleError;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::actions::ActionKind;
use crate::attrs::Attributes;
use crate::eden::{Document, NodeKind, NodeRef};

/// One target's action, dependencies and merged attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    target: String,
    action: ActionKind,
    deps: Vec<String>,
    attrs: Attributes,
}

impl Rule {
    /// Assemble a rule from its parts.
    #[must_use]
    pub fn new(
        target: impl Into<String>,
        action: ActionKind,
        deps: Vec<String>,
        attrs: Attributes,
    ) -> Self {
        Self {
            target: target.into(),
            action,
            deps,
            attrs,
        }
    }

    /// Name of the target this rule builds.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The action that builds the target.
    #[must_use]
    pub const fn action(&self) -> ActionKind {
        self.action
    }

    /// Dependencies in declaration order.
    #[must_use]
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Attributes after global, module and rule scopes are merged.
    #[must_use]
    pub const fn attrs(&self) -> &Attributes {
        &self.attrs
    }
}

/// Loaded rules keyed by target name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Registry {
    rules: BTreeMap<String, Rule>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rule`, keeping any earlier rule for the same target.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::DuplicateTarget`] when the target already has a
    /// rule.
    pub fn insert(&mut self, rule: Rule) -> Result<(), RuleError> {
        if self.rules.contains_key(rule.target()) {
            return Err(RuleError::DuplicateTarget {
                target: rule.target,
            });
        }
        self.rules.insert(rule.target.clone(), rule);
        Ok(())
    }

    /// The rule for `target`.
    #[must_use]
    pub fn get(&self, target: &str) -> Option<&Rule> {
        self.rules.get(target)
    }

    /// Target names in sorted order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The dependency relation consumed by [`crate::schedule::schedule`].
    #[must_use]
    pub fn deps_view(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.rules
            .iter()
            .map(|(target, rule)| (target.clone(), rule.deps.iter().cloned().collect()))
            .collect()
    }
}

/// Outcome of [`load`]: every rule that loaded plus every problem found.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Rules that loaded successfully.
    pub registry: Registry,
    /// Problems, in source order.
    pub errors: Vec<RuleError>,
}

impl LoadReport {
    /// Whether loading found no problems.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Load the rules of `spec` on top of the `global` attribute scope.
///
/// A malformed module map is reported and the global scope is used in its
/// place. A target name that is not a symbol ends loading, since the
/// name/form pairing can no longer be recovered; rules loaded before it are
/// kept.
///
/// # Examples
///
/// ```
/// use aa::attrs::Attributes;
/// use aa::eden::read;
/// use aa::rules::load;
///
/// let spec = read("{:k 2} app (noop [lib]) lib (noop [] {:k 3})").expect("spec");
/// let report = load(&spec, &Attributes::new());
/// assert!(report.is_clean());
/// let lib = report.registry.get("lib").expect("lib rule");
/// assert_eq!(lib.attrs().get(":k").and_then(|v| v.as_int()), Some(3));
/// ```
#[must_use]
pub fn load(spec: &Document, global: &Attributes) -> LoadReport {
    let mut report = LoadReport::default();
    let mut forms = spec.forms().peekable();

    let module = match forms.next_if(|form| form.kind() == NodeKind::Map) {
        Some(map) => global.merged(map).unwrap_or_else(|source| {
            report.errors.push(RuleError::ModuleAttributes { source });
            global.clone()
        }),
        None => global.clone(),
    };

    while let Some(name) = forms.next() {
        let Some(target) = name.as_symbol() else {
            report
                .errors
                .push(RuleError::TargetNameRequired { found: name.kind() });
            break;
        };
        let Some(form) = forms.next() else {
            report.errors.push(RuleError::MissingForm {
                target: target.to_owned(),
            });
            break;
        };
        let loaded = parse_rule(target, form, &module)
            .and_then(|rule| report.registry.insert(rule));
        if let Err(err) = loaded {
            report.errors.push(err);
        }
    }

    debug!(
        rules = report.registry.len(),
        errors = report.errors.len(),
        "loaded build specification"
    );
    report
}

fn parse_rule(target: &str, form: NodeRef<'_>, module: &Attributes) -> Result<Rule, RuleError> {
    if form.kind() != NodeKind::List {
        return Err(RuleError::RuleNotList {
            target: target.to_owned(),
            found: form.kind(),
        });
    }
    let mut parts = form.children();

    let action_name = parts
        .next()
        .and_then(NodeRef::as_name)
        .ok_or_else(|| RuleError::MissingActionKind {
            target: target.to_owned(),
        })?;
    let action: ActionKind = action_name
        .parse()
        .map_err(|_| RuleError::UnknownAction {
            target: target.to_owned(),
            action: action_name.to_owned(),
        })?;

    let deps_node = parts
        .next()
        .filter(|node| node.kind() == NodeKind::Vector)
        .ok_or_else(|| RuleError::MissingDependencies {
            target: target.to_owned(),
        })?;
    let deps = deps_node
        .children()
        .map(|dep| {
            dep.as_name()
                .map(str::to_owned)
                .ok_or_else(|| RuleError::BadDependency {
                    target: target.to_owned(),
                    found: dep.kind(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let attrs = match parts.next() {
        None => module.clone(),
        Some(map) if map.kind() == NodeKind::Map => {
            module
                .merged(map)
                .map_err(|source| RuleError::Attributes {
                    target: target.to_owned(),
                    source,
                })?
        }
        Some(other) => {
            return Err(RuleError::AttributesNotMap {
                target: target.to_owned(),
                found: other.kind(),
            });
        }
    };

    if parts.next().is_some() {
        return Err(RuleError::WrongArity {
            target: target.to_owned(),
            count: form.len(),
        });
    }

    Ok(Rule::new(target, action, deps, attrs))
}
