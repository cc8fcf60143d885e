//! Shimsmith - C ABI shims and Kotlin/Native bindings for C++ libraries
//!
//! This crate provides the core library functionality for shimsmith:
//! declaration scanning, type resolution, tree rewriting and emission of
//! the C header, the C++ shim, the cinterop def file and the Kotlin
//! wrappers.

pub mod builder;
pub mod codegen;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod rewrite;
pub mod sources;
pub mod util;

/// Test utilities and fixtures for shimsmith unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides declaration fixtures, a mock declaration
/// provider and temporary project helpers.
#[cfg(test)]
pub mod test_support;

pub use codegen::{CodeGenerationPolicy, ErrorPolicy, GenerationError, ModuleInfo};
pub use core::{Decl, DeclTree, Filter, Resolved, ResolvedTree};
pub use ops::Session;
pub use resolver::{ReferencePolicy, ResolveError, ResolveOptions};
pub use util::context::GlobalContext;
