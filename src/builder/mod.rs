//! Code-emission IR.
//!
//! Writers build a file as a tree of [`Symbol`]s through a
//! [`CodeBuilder`], then render it in one pass. The builder is written once;
//! the [`LangFactory`] is the only per-language seam. Kotlin files resolve
//! their imports after the whole tree exists, so names are shortened or
//! aliased consistently across the file.

pub mod code;
pub mod code_string;
pub mod cpp;
pub mod imports;
pub mod kotlin;
pub mod scope;
pub mod symbol;

pub use code::{Checkpoint, CodeBuilder, FunctionSpec, LangFactory, TypeSpec, Var};
pub use code_string::CodeStringBuilder;
pub use cpp::{CppCodeBuilder, CppFactory};
pub use imports::{resolve_imports, Imports};
pub use kotlin::{KotlinCodeBuilder, KotlinFactory};
pub use scope::Scope;
pub use symbol::{BoxSymbol, Expr, Symbol};
