/// framec - lowers typed source units into frame-tagged command scripts.
///
/// A unit goes through a declaration pre-pass, then statement and expression
/// lowering. The result is one script per unit, function, method, constructor and
/// class.

pub mod allocator;
pub mod bundle;
pub mod command;
pub mod compiler;
pub mod decl;
pub mod diagnostics;
pub mod expr;
pub mod frame;
pub mod output;
pub mod symbol;

mod declare;
mod stmt;

pub use compiler::{Compilation, Transpiler};
pub use diagnostics::{Diagnostic, TranspileError};
