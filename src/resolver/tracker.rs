//! Bookkeeping for one resolution session.

use std::collections::{BTreeSet, HashMap};

use crate::core::tree::NodeId;

/// Classes known to a resolution session, in registration order.
///
/// A class is registered before any of its members are mapped, so a member
/// that refers back to a class under construction finds it here instead of
/// recursing.
#[derive(Debug, Default)]
pub struct Tracker {
    classes: HashMap<String, NodeId>,
    order: Vec<String>,
    otherwise_resolvable: BTreeSet<String>,
    opaque: BTreeSet<String>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under its spelling. Returns false if the spelling
    /// was already taken; the first registration wins.
    pub fn register(&mut self, spelling: impl Into<String>, id: NodeId) -> bool {
        let spelling = spelling.into();
        if self.classes.contains_key(&spelling) {
            return false;
        }
        self.classes.insert(spelling.clone(), id);
        self.order.push(spelling);
        true
    }

    pub fn contains(&self, spelling: &str) -> bool {
        self.classes.contains_key(spelling)
    }

    pub fn get(&self, spelling: &str) -> Option<NodeId> {
        self.classes.get(spelling).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The `index`th registered class.
    pub fn entry(&self, index: usize) -> Option<(&str, NodeId)> {
        let spelling = self.order.get(index)?;
        Some((spelling.as_str(), self.classes[spelling]))
    }

    /// Registered spellings, in registration order.
    pub fn spellings(&self) -> &[String] {
        &self.order
    }

    /// Remember a spelling that is safe to reference without being a class.
    pub fn mark_otherwise_resolvable(&mut self, spelling: impl Into<String>) {
        self.otherwise_resolvable.insert(spelling.into());
    }

    pub fn is_otherwise_resolvable(&self, spelling: &str) -> bool {
        self.otherwise_resolvable.contains(spelling)
    }

    pub fn otherwise_resolvable(&self) -> &BTreeSet<String> {
        &self.otherwise_resolvable
    }

    /// Remember a missing type kept as written under the opaque policy.
    pub fn mark_opaque(&mut self, spelling: impl Into<String>) {
        self.opaque.insert(spelling.into());
    }

    /// Spellings that cross the C boundary as `void*`.
    pub fn opaque(&self) -> &BTreeSet<String> {
        &self.opaque
    }

    /// Whether a spelling may appear in a resolved tree.
    pub fn is_known(&self, spelling: &str) -> bool {
        self.contains(spelling) || self.is_otherwise_resolvable(spelling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{new_decl_tree, ClassDecl, Decl};
    use crate::core::tree::Detached;

    #[test]
    fn test_first_registration_wins() {
        let mut tree = new_decl_tree();
        let root = tree.root();
        let a = tree.add_child(root, Detached::new(Decl::Class(ClassDecl::new("A", "A"))));
        let b = tree.add_child(root, Detached::new(Decl::Class(ClassDecl::new("A", "A"))));

        let mut tracker = Tracker::new();
        assert!(tracker.register("A", a));
        assert!(!tracker.register("A", b));
        assert_eq!(tracker.get("A"), Some(a));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.entry(0), Some(("A", a)));
        assert_eq!(tracker.entry(1), None);
    }

    #[test]
    fn test_otherwise_resolvable() {
        let mut tracker = Tracker::new();
        tracker.mark_otherwise_resolvable("std::vector<int>");
        assert!(tracker.is_known("std::vector<int>"));
        assert!(!tracker.contains("std::vector<int>"));
        assert!(!tracker.is_known("std::vector<long>"));
    }

    #[test]
    fn test_opaque_spellings_are_not_known() {
        let mut tracker = Tracker::new();
        tracker.mark_opaque("other::Missing");
        tracker.mark_opaque("other::Missing");
        assert_eq!(tracker.opaque().len(), 1);
        assert!(!tracker.is_known("other::Missing"));
    }
}
