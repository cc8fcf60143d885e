//! Core data structures for shimsmith.
//!
//! This module contains the element and type model shared by every stage:
//! - Arena trees with handle-based parent links
//! - The C++ type model and its canonical spellings
//! - Declaration and resolved trees
//! - Element filters, the namer and the operator table

pub mod decl;
pub mod filter;
pub mod namer;
pub mod operators;
pub mod resolved;
pub mod tree;
pub mod types;

pub use decl::{Decl, DeclTree};
pub use filter::Filter;
pub use namer::Namer;
pub use operators::Operator;
pub use resolved::{Resolved, ResolvedTree};
pub use tree::{Detached, NodeId, Tree};
pub use types::CppType;
