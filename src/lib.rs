//! tonec: a small compiler for the tone string DSL.

pub mod config;
pub mod dsl;

pub use dsl::{compile, Compilation, Compiler};
