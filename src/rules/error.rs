//! Errors raised while loading rules from a build specification.
//
// Module-level suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use thiserror::Error;

use crate::attrs::AttrError;
use crate::eden::NodeKind;

/// A structural problem with one rule or with the module attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RuleError {
    /// A target name was expected but another kind of node was found.
    #[error("target name is required here, found a {found}")]
    #[diagnostic(
        code(aa::rules::target_name_required),
        help("rules are written as `NAME (ACTION [DEPS...] {{ATTRS}})`")
    )]
    TargetNameRequired {
        /// Kind of the offending node.
        found: NodeKind,
    },
    /// A target name was the last form in the file.
    #[error("target `{target}` has no rule")]
    #[diagnostic(code(aa::rules::missing_form))]
    MissingForm {
        /// The dangling target name.
        target: String,
    },
    /// The rule form was not a list.
    #[error("rule for `{target}` should be a list, found a {found}")]
    #[diagnostic(code(aa::rules::not_a_list))]
    RuleNotList {
        /// Target being defined.
        target: String,
        /// Kind of the offending form.
        found: NodeKind,
    },
    /// The rule list was empty or did not start with a name.
    #[error("rule for `{target}` does not name an action")]
    #[diagnostic(code(aa::rules::missing_action))]
    MissingActionKind {
        /// Target being defined.
        target: String,
    },
    /// The action name is not one of the known kinds.
    #[error("unknown action `{action}` for target `{target}`")]
    #[diagnostic(
        code(aa::rules::unknown_action),
        help("known actions are c++bin, c++lib, install and noop")
    )]
    UnknownAction {
        /// Target being defined.
        target: String,
        /// The unrecognised action name.
        action: String,
    },
    /// The second element of the rule was absent or not a vector.
    #[error("missing vector of dependencies for target `{target}`")]
    #[diagnostic(code(aa::rules::missing_dependencies))]
    MissingDependencies {
        /// Target being defined.
        target: String,
    },
    /// A dependency entry was neither a symbol nor a string.
    #[error("dependency of `{target}` must be a symbol or string, found a {found}")]
    #[diagnostic(code(aa::rules::bad_dependency))]
    BadDependency {
        /// Target being defined.
        target: String,
        /// Kind of the offending entry.
        found: NodeKind,
    },
    /// The optional third element was not a map.
    #[error("attributes of `{target}` should be a map, found a {found}")]
    #[diagnostic(code(aa::rules::attributes_not_map))]
    AttributesNotMap {
        /// Target being defined.
        target: String,
        /// Kind of the offending element.
        found: NodeKind,
    },
    /// The rule list held more than three elements.
    #[error("rule for `{target}` has {count} elements, expected at most 3")]
    #[diagnostic(code(aa::rules::wrong_arity))]
    WrongArity {
        /// Target being defined.
        target: String,
        /// Number of elements found.
        count: usize,
    },
    /// The rule attribute map was malformed.
    #[error("invalid attributes for target `{target}`")]
    #[diagnostic(code(aa::rules::attributes))]
    Attributes {
        /// Target being defined.
        target: String,
        /// What was wrong with the map.
        #[source]
        source: AttrError,
    },
    /// The module attribute map was malformed.
    #[error("invalid module attributes")]
    #[diagnostic(code(aa::rules::module_attributes))]
    ModuleAttributes {
        /// What was wrong with the map.
        #[source]
        source: AttrError,
    },
    /// The same target was defined twice.
    #[error("target `{target}` is defined more than once")]
    #[diagnostic(
        code(aa::rules::duplicate_target),
        help("the first definition is used")
    )]
    DuplicateTarget {
        /// The repeated target.
        target: String,
    },
}
