//! Core library for the Amaranth scripting language: lexing, parsing,
//! evaluation, and REPL utilities.

pub mod ast;
pub mod diagnostics;
pub mod environment;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runtime;
pub mod stdlib;
pub mod value;

pub use diagnostics::{AmaranthError, Diagnostic, SourceSpan};
pub use repl::Repl;
pub use runtime::{Interpreter, evaluate};
