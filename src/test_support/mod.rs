//! Test utilities and mocks for shimsmith unit tests.
//!
//! Fixtures build declaration trees without going through a header scan, and
//! [`MockProvider`] lets tests observe and fail declaration lookups.
//!
//! # Example
//!
//! ```rust,ignore
//! use shimsmith::test_support::{scenario, MockProvider};
//!
//! #[test]
//! fn test_example() {
//!     let provider = MockProvider::new(scenario()).fail_on("TestLib::Broken");
//!     // Resolve against the provider...
//! }
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::path::Path;

use anyhow::{bail, Result};

use crate::core::decl::DeclTree;
use crate::core::tree::NodeId;
use crate::core::types::CppType;
use crate::sources::{DeclarationProvider, IndexedDeclarations};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Declaration provider that records lookups and can be told to fail.
#[derive(Debug)]
pub struct MockProvider {
    inner: IndexedDeclarations,
    failing: Vec<String>,
    lookups: RefCell<Vec<String>>,
}

impl MockProvider {
    /// Wrap a declaration tree.
    pub fn new(tree: DeclTree) -> Self {
        MockProvider {
            inner: IndexedDeclarations::new(tree),
            failing: Vec::new(),
            lookups: RefCell::new(Vec::new()),
        }
    }

    /// Make lookups of `spelling` return an error.
    pub fn fail_on(mut self, spelling: &str) -> Self {
        self.failing.push(spelling.to_string());
        self
    }

    /// Every spelling passed to `resolve_by_name`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }
}

impl DeclarationProvider for MockProvider {
    fn tree(&self) -> &DeclTree {
        self.inner.tree()
    }

    fn resolve_by_name(&self, spelling: &str) -> Result<Option<NodeId>> {
        self.lookups.borrow_mut().push(spelling.to_string());
        if self.failing.iter().any(|f| f == spelling) {
            bail!("lookup of `{}` failed", spelling);
        }
        self.inner.resolve_by_name(spelling)
    }

    fn resolve_template_by_name(&self, spelling: &str) -> Option<NodeId> {
        self.inner.resolve_template_by_name(spelling)
    }

    fn resolve_typedef(&self, spelling: &str) -> Result<Option<CppType>> {
        self.inner.resolve_typedef(spelling)
    }
}

/// Helper to create a temporary project with a Shimsmith.toml and a header.
///
/// Returns the TempDir handle - dropping it will clean up the directory.
pub fn create_test_project(name: &str, header: &str) -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().expect("failed to create temp dir");
    std::fs::write(tmp.path().join("Shimsmith.toml"), minimal_config(name))
        .expect("failed to write config");

    let include = tmp.path().join("include");
    std::fs::create_dir_all(&include).expect("failed to create include dir");
    std::fs::write(include.join(format!("{}.h", name)), header).expect("failed to write header");

    tmp
}

/// Assertion helpers for testing.
pub mod assertions {
    use super::*;

    /// Assert that a result is Ok and return the value.
    pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => panic!("expected Ok, got Err: {:?}", e),
        }
    }

    /// Assert that a result is Err and return the error.
    pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
        match result {
            Ok(v) => panic!("expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    }

    /// Assert that generated text contains every line in `expected`, in order.
    pub fn assert_lines_in_order(actual: &str, expected: &[&str]) {
        let mut rest = actual;
        for line in expected {
            match rest.find(line) {
                Some(pos) => rest = &rest[pos + line.len()..],
                None => panic!(
                    "expected `{}` after the previous lines\nactual content:\n{}",
                    line, actual
                ),
            }
        }
    }

    /// Assert that a file exists and contains specific content.
    pub fn assert_file_contains(path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        let actual = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("file not found: {}", path.display()));
        assert!(
            actual.contains(content),
            "file {} does not contain '{}'\nactual content:\n{}",
            path.display(),
            content,
            actual
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::classes;

    #[test]
    fn test_mock_provider_records_and_fails() {
        let provider = MockProvider::new(test_lib()).fail_on("TestLib::Broken");

        assert!(provider
            .resolve_by_name("TestLib::OtherClass")
            .unwrap()
            .is_some());
        assert!(provider.resolve_by_name("TestLib::Broken").is_err());
        assert_eq!(
            provider.lookups(),
            vec!["TestLib::OtherClass", "TestLib::Broken"]
        );
    }

    #[test]
    fn test_fixture_shapes() {
        assert_eq!(classes(&scenario()).len(), 1);
        assert_eq!(classes(&test_lib()).len(), 2);
        assert_eq!(classes(&cyclic_pair()).len(), 2);
    }

    #[test]
    fn test_create_test_project() {
        let project = create_test_project("testlib", TEST_LIB_HEADER);

        assert!(project.path().join("Shimsmith.toml").exists());
        assertions::assert_file_contains(
            project.path().join("include/testlib.h"),
            "class TestClass",
        );
    }

    #[test]
    fn test_assert_lines_in_order() {
        assertions::assert_lines_in_order("a\nb\nc\n", &["a", "c"]);
    }
}
