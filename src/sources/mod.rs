//! Declaration sources.
//!
//! A declaration source turns headers (or a dump of them) into a
//! [`DeclTree`]. The resolver only talks to sources through the
//! [`DeclarationProvider`] trait.

pub mod header;
pub mod json;

use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::debug;

use crate::core::decl::{self, namespace_path, Decl, DeclTree};
use crate::core::filter::Filter;
use crate::core::tree::NodeId;
use crate::core::types::CppType;

pub use header::HeaderParser;

/// Typedef chains longer than this are treated as cyclic.
const MAX_TYPEDEF_DEPTH: usize = 32;

/// A source of declarations.
pub trait DeclarationProvider {
    /// The full declaration tree.
    fn tree(&self) -> &DeclTree;

    /// Classes matching `filter`, in tree order.
    fn find_classes(&self, filter: &Filter) -> Vec<NodeId> {
        let tree = self.tree();
        decl::classes(tree)
            .into_iter()
            .filter(|id| filter.matches(tree, *id))
            .collect()
    }

    /// Look up a class by its canonical spelling.
    fn resolve_by_name(&self, spelling: &str) -> Result<Option<NodeId>>;

    /// Look up the template a spelling instantiates.
    fn resolve_template_by_name(&self, spelling: &str) -> Option<NodeId>;

    /// Expand a typedef or alias to the type it names.
    fn resolve_typedef(&self, _spelling: &str) -> Result<Option<CppType>> {
        Ok(None)
    }
}

/// A [`DeclarationProvider`] over an in-memory tree, with name indexes.
#[derive(Debug, Clone)]
pub struct IndexedDeclarations {
    tree: DeclTree,
    classes: HashMap<String, NodeId>,
    templates: HashMap<String, NodeId>,
    typedefs: HashMap<String, CppType>,
}

impl IndexedDeclarations {
    /// Index every class, template and typedef of `tree`.
    ///
    /// When a spelling is declared twice the first declaration wins.
    pub fn new(tree: DeclTree) -> Self {
        let mut classes = HashMap::new();
        let mut templates = HashMap::new();
        let mut typedefs = HashMap::new();

        for id in tree.preorder() {
            match tree.get(id) {
                Decl::Class(c) => {
                    classes.entry(c.spelling()).or_insert(id);
                }
                Decl::Template(t) => {
                    templates.entry(t.qualified.clone()).or_insert(id);
                }
                Decl::Typedef(t) => {
                    let mut path = namespace_path(&tree, id);
                    path.push(t.name.clone());
                    typedefs
                        .entry(path.join("::"))
                        .or_insert_with(|| t.target.clone());
                }
                _ => {}
            }
        }

        debug!(
            "indexed {} classes, {} templates, {} typedefs",
            classes.len(),
            templates.len(),
            typedefs.len()
        );

        IndexedDeclarations {
            tree,
            classes,
            templates,
            typedefs,
        }
    }

    /// Number of indexed classes.
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl DeclarationProvider for IndexedDeclarations {
    fn tree(&self) -> &DeclTree {
        &self.tree
    }

    fn resolve_by_name(&self, spelling: &str) -> Result<Option<NodeId>> {
        if let Some(id) = self.classes.get(spelling) {
            return Ok(Some(*id));
        }
        // A typedef naming a class resolves to that class.
        match self.resolve_typedef(spelling)? {
            Some(CppType::TypeReference(target)) => Ok(self.classes.get(&target).copied()),
            _ => Ok(None),
        }
    }

    fn resolve_template_by_name(&self, spelling: &str) -> Option<NodeId> {
        match CppType::parse(spelling) {
            CppType::Template { base, .. } => self.templates.get(&base).copied(),
            _ => self.templates.get(spelling).copied(),
        }
    }

    fn resolve_typedef(&self, spelling: &str) -> Result<Option<CppType>> {
        let mut current = match self.typedefs.get(spelling) {
            Some(target) => target.clone(),
            None => return Ok(None),
        };
        for _ in 0..MAX_TYPEDEF_DEPTH {
            let next = match &current {
                CppType::TypeReference(name) => self.typedefs.get(name),
                _ => None,
            };
            match next {
                Some(target) => current = target.clone(),
                None => return Ok(Some(current)),
            }
        }
        bail!("typedef `{}` does not terminate", spelling)
    }
}
