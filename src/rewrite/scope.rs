//! Edit collection for mapping handlers.

use super::MapResult;
use crate::core::resolved::Resolved;
use crate::core::tree::Detached;

/// Collects the edits a handler makes against the matched element.
///
/// ```rust,ignore
/// scope.remove();                 // RemoveChild
/// scope.parent().add(sibling);    // AddToParent
/// ```
#[derive(Debug, Default)]
pub struct MappingScope {
    results: Vec<MapResult>,
}

impl MappingScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the matched element.
    pub fn remove(&mut self) -> &mut Self {
        self.results.push(MapResult::RemoveChild);
        self
    }

    /// Replace the matched element in place.
    pub fn replace_with(&mut self, node: Detached<Resolved>) -> &mut Self {
        self.results.push(MapResult::ReplaceChild(node));
        self
    }

    /// Add a child under the matched element.
    pub fn add(&mut self, node: Detached<Resolved>) -> &mut Self {
        self.results.push(MapResult::AddToChild(node));
        self
    }

    /// Edits against the matched element's parent.
    pub fn parent(&mut self) -> ParentScope<'_> {
        ParentScope { scope: self }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The collected edits, in call order.
    pub fn finish(self) -> Vec<MapResult> {
        self.results
    }
}

/// Edits against the parent of the matched element.
pub struct ParentScope<'a> {
    scope: &'a mut MappingScope,
}

impl ParentScope<'_> {
    pub fn remove(self) {
        self.scope.results.push(MapResult::RemoveParent);
    }

    pub fn replace_with(self, node: Detached<Resolved>) {
        self.scope.results.push(MapResult::ReplaceParent(node));
    }

    /// Add a sibling of the matched element.
    pub fn add(self, node: Detached<Resolved>) {
        self.scope.results.push(MapResult::AddToParent(node));
    }
}
