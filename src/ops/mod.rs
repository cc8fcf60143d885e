//! High-level operations.
//!
//! This module contains the implementation of shimsmith commands.

pub mod compile;
pub mod fingerprint;
pub mod generate;
pub mod init;
pub mod session;

pub use compile::{compile, CompileOptions, CompileResult};
pub use generate::{generate, resolve_module, GenerateOptions, GenerateResult, ModuleInputs};
pub use init::{init_project, InitOptions};
pub use session::{Session, WriteReport};
