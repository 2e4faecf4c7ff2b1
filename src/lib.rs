//! `aa` core library.
//!
//! Reads a build specification written in a small Lisp-like notation, turns
//! it into build rules with scoped attributes, orders the requested targets
//! into dependency phases and runs the compile, link and install tools for
//! each phase.

pub mod actions;
pub mod attrs;
pub mod cli;
pub mod config;
pub mod eden;
pub mod rules;
pub mod runner;
pub mod schedule;
