//! Declaration tree, the input side of resolution.
//!
//! A declaration tree is what a declaration provider hands over: namespaces,
//! classes and their members exactly as written in the headers, with every
//! named type still symbolic. Resolution treats it as read-only.

use serde::{Deserialize, Serialize};

use super::tree::{NodeId, Tree};
use super::types::CppType;

/// Kind of a declared method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Constructor,
    Destructor,
    Static,
    StaticOperator,
    #[serde(alias = "method")]
    InstanceMethod,
}

/// A class or struct declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    /// Fully-qualified type, e.g. `ns::TestClass`. This is the resolution key.
    #[serde(rename = "type")]
    pub ty: CppType,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub has_constructor: bool,
    /// `operator new` is deleted or private.
    #[serde(default)]
    pub has_hidden_new: bool,
    /// `operator delete` is deleted or private.
    #[serde(default)]
    pub has_hidden_delete: bool,
}

impl ClassDecl {
    pub fn new(name: impl Into<String>, qualified: &str) -> Self {
        ClassDecl {
            name: name.into(),
            ty: CppType::named(qualified),
            is_abstract: false,
            has_constructor: false,
            has_hidden_new: false,
            has_hidden_delete: false,
        }
    }

    /// Canonical spelling of the class type.
    pub fn spelling(&self) -> String {
        self.ty.spelling()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub kind: MethodKind,
    pub return_type: CppType,
    #[serde(default)]
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CppType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CppType,
    #[serde(default)]
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseDecl {
    #[serde(rename = "type")]
    pub ty: CppType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    pub target: CppType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDecl {
    pub name: String,
    pub qualified: String,
}

/// One node of the declaration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// Synthetic root.
    TranslationUnit,
    Namespace { name: String },
    Class(ClassDecl),
    Method(MethodDecl),
    Field(FieldDecl),
    Argument(ArgumentDecl),
    Base(BaseDecl),
    Typedef(TypedefDecl),
    Template(TemplateDecl),
    TemplateParam { name: String },
}

impl Decl {
    pub fn name(&self) -> Option<&str> {
        match self {
            Decl::TranslationUnit | Decl::Base(_) => None,
            Decl::Namespace { name } | Decl::TemplateParam { name } => Some(name),
            Decl::Class(c) => Some(&c.name),
            Decl::Method(m) => Some(&m.name),
            Decl::Field(f) => Some(&f.name),
            Decl::Argument(a) => Some(&a.name),
            Decl::Typedef(t) => Some(&t.name),
            Decl::Template(t) => Some(&t.name),
        }
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match self {
            Decl::Class(c) => Some(c),
            _ => None,
        }
    }
}

/// Declaration tree rooted at a translation unit.
pub type DeclTree = Tree<Decl>;

/// Create an empty declaration tree.
pub fn new_decl_tree() -> DeclTree {
    Tree::new(Decl::TranslationUnit)
}

/// Every class in the tree, in preorder.
pub fn classes(tree: &DeclTree) -> Vec<NodeId> {
    tree.preorder()
        .into_iter()
        .filter(|id| matches!(tree.get(*id), Decl::Class(_)))
        .collect()
}

/// Arguments of a method node, in order.
pub fn arguments(tree: &DeclTree, method: NodeId) -> Vec<&ArgumentDecl> {
    tree.children(method)
        .iter()
        .filter_map(|id| match tree.get(*id) {
            Decl::Argument(a) => Some(a),
            _ => None,
        })
        .collect()
}

/// Names of the namespaces enclosing `id`, outermost first.
pub fn namespace_path(tree: &DeclTree, id: NodeId) -> Vec<String> {
    let mut path: Vec<String> = tree
        .ancestors(id)
        .filter_map(|a| match tree.get(a) {
            Decl::Namespace { name } => Some(name.clone()),
            _ => None,
        })
        .collect();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::Detached;

    #[test]
    fn test_namespace_path() {
        let mut tree = new_decl_tree();
        let root = tree.root();
        let outer = tree.add_child(
            root,
            Detached::new(Decl::Namespace {
                name: "outer".into(),
            }),
        );
        let inner = tree.add_child(
            outer,
            Detached::new(Decl::Namespace {
                name: "inner".into(),
            }),
        );
        let cls = tree.add_child(
            inner,
            Detached::new(Decl::Class(ClassDecl::new("Foo", "outer::inner::Foo"))),
        );

        assert_eq!(namespace_path(&tree, cls), vec!["outer", "inner"]);
        assert_eq!(classes(&tree), vec![cls]);
    }

    #[test]
    fn test_method_kind_serde() {
        let kind: MethodKind = serde_json::from_str("\"static_operator\"").unwrap();
        assert_eq!(kind, MethodKind::StaticOperator);
        let kind: MethodKind = serde_json::from_str("\"method\"").unwrap();
        assert_eq!(kind, MethodKind::InstanceMethod);
    }
}
