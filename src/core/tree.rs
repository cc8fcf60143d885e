//! Arena-backed element trees.
//!
//! Both the declaration tree and the resolved tree are stored as a [`Tree`]:
//! nodes live in a flat arena and refer to each other through [`NodeId`]
//! handles. The parent link is a plain handle, so structural edits only have
//! to keep two fields in agreement: a child's `parent` and the parent's
//! `children` list. Every mutating operation here updates both.
//!
//! Removed nodes stay in the arena (handles never dangle) but are no longer
//! reachable from the root; [`Tree::is_attached`] tells them apart.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Node<K> {
    kind: K,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned subtree that is not part of any arena yet.
///
/// Used to build new nodes before inserting them and to copy subtrees out of
/// one tree into another.
#[derive(Debug, Clone, PartialEq)]
pub struct Detached<K> {
    pub kind: K,
    pub children: Vec<Detached<K>>,
}

impl<K> Detached<K> {
    /// Create a leaf subtree.
    pub fn new(kind: K) -> Self {
        Detached {
            kind,
            children: Vec::new(),
        }
    }

    /// Append a child subtree.
    pub fn with_child(mut self, child: Detached<K>) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child subtrees.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Detached<K>>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Arena tree with a synthetic root.
#[derive(Debug, Clone)]
pub struct Tree<K> {
    nodes: Vec<Node<K>>,
    root: NodeId,
}

impl<K: Clone> Tree<K> {
    /// Create a tree holding only its root node.
    pub fn new(root: K) -> Self {
        Tree {
            nodes: vec![Node {
                kind: root,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    /// The synthetic root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &K {
        &self.nodes[id.0].kind
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut K {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Position of `id` within its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Ancestors of `id`, nearest first. The root is included.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, K> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Whether `id` can still be reached from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if id == self.root {
            return true;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if parent == self.root {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Insert `subtree` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, subtree: Detached<K>) -> NodeId {
        let index = self.children(parent).len();
        self.insert_child(parent, index, subtree)
    }

    /// Insert `subtree` under `parent` at `index` (clamped to the end).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, subtree: Detached<K>) -> NodeId {
        let id = self.alloc(subtree, Some(parent));
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Detach `child` from `parent`. Returns false if it was not a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|c| *c == child) {
            Some(pos) => {
                children.remove(pos);
                self.nodes[child.0].parent = None;
                true
            }
            None => false,
        }
    }

    /// Replace `old` under `parent` with `subtree`, keeping its position.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        subtree: Detached<K>,
    ) -> Option<NodeId> {
        let pos = self.children(parent).iter().position(|c| *c == old)?;
        self.remove_child(parent, old);
        Some(self.insert_child(parent, pos, subtree))
    }

    /// Deep copy of the subtree rooted at `id`.
    pub fn detach(&self, id: NodeId) -> Detached<K> {
        Detached {
            kind: self.get(id).clone(),
            children: self
                .children(id)
                .iter()
                .map(|child| self.detach(*child))
                .collect(),
        }
    }

    /// Preorder walk of every attached node below the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    /// Preorder walk below `id`, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn alloc(&mut self, subtree: Detached<K>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: subtree.kind,
            parent,
            children: Vec::new(),
        });
        let children: Vec<NodeId> = subtree
            .children
            .into_iter()
            .map(|child| self.alloc(child, Some(id)))
            .collect();
        self.nodes[id.0].children = children;
        id
    }
}

/// Iterator returned by [`Tree::ancestors`].
pub struct Ancestors<'a, K> {
    tree: &'a Tree<K>,
    next: Option<NodeId>,
}

impl<K: Clone> Iterator for Ancestors<'_, K> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree<&'static str>, NodeId, NodeId) {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let a = tree.add_child(
            root,
            Detached::new("a")
                .with_child(Detached::new("a1"))
                .with_child(Detached::new("a2")),
        );
        let b = tree.add_child(root, Detached::new("b"));
        (tree, a, b)
    }

    #[test]
    fn test_preorder_excludes_root() {
        let (tree, _, _) = sample();
        let names: Vec<_> = tree.preorder().iter().map(|id| *tree.get(*id)).collect();
        assert_eq!(names, vec!["a", "a1", "a2", "b"]);
    }

    #[test]
    fn test_parent_links_agree_with_children() {
        let (tree, a, _) = sample();
        for child in tree.children(a) {
            assert_eq!(tree.parent(*child), Some(a));
        }
        assert_eq!(tree.parent(a), Some(tree.root()));
    }

    #[test]
    fn test_remove_child_detaches_subtree() {
        let (mut tree, a, _) = sample();
        let a1 = tree.children(a)[0];
        let root = tree.root();

        assert!(tree.remove_child(root, a));
        assert!(!tree.is_attached(a));
        assert!(!tree.is_attached(a1));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.preorder().len(), 1);
    }

    #[test]
    fn test_remove_non_child_is_noop() {
        let (mut tree, a, b) = sample();
        assert!(!tree.remove_child(a, b));
        assert!(tree.is_attached(b));
    }

    #[test]
    fn test_replace_child_keeps_position() {
        let (mut tree, a, _) = sample();
        let root = tree.root();
        let c = tree.replace_child(root, a, Detached::new("c")).unwrap();

        assert_eq!(tree.children(root)[0], c);
        assert_eq!(tree.parent(c), Some(root));
        assert!(!tree.is_attached(a));
    }

    #[test]
    fn test_detach_copies_deeply() {
        let (tree, a, _) = sample();
        let copy = tree.detach(a);
        assert_eq!(copy.kind, "a");
        assert_eq!(copy.children.len(), 2);
        assert_eq!(copy.children[1].kind, "a2");
    }

    #[test]
    fn test_insert_child_clamps_index() {
        let (mut tree, a, _) = sample();
        let tail = tree.insert_child(a, 99, Detached::new("tail"));
        assert_eq!(tree.children(a).last(), Some(&tail));
        assert_eq!(tree.index_in_parent(tail), Some(2));
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (tree, a, _) = sample();
        let a2 = tree.children(a)[1];
        let chain: Vec<_> = tree.ancestors(a2).collect();
        assert_eq!(chain, vec![a, tree.root()]);
    }
}
