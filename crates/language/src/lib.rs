/// framec language layer: the minimal AST the transpiler consumes, an arena
/// builder for it, and the loader for front-end source documents.

pub mod ast;
pub mod builder;
pub mod loader;
