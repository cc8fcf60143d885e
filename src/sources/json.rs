//! JSON declaration dumps.
//!
//! A dump is a nested list of nodes, each with a `kind` and optional
//! `children`:
//!
//! ```json
//! [
//!   { "kind": "namespace", "name": "TestLib", "children": [
//!     { "kind": "class", "name": "TestClass", "type": "TestLib::TestClass", "children": [
//!       { "kind": "field", "name": "b", "type": "bool" },
//!       { "kind": "method", "name": "sum", "method_kind": "method", "return_type": "long" }
//!     ]}
//!   ]}
//! ]
//! ```
//!
//! The document may also be a single `translation_unit` node.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::core::decl::{
    new_decl_tree, ArgumentDecl, BaseDecl, ClassDecl, Decl, DeclTree, FieldDecl, MethodDecl,
    MethodKind, TemplateDecl, TypedefDecl,
};
use crate::core::tree::{Detached, NodeId};
use crate::core::types::CppType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NodeKind {
    TranslationUnit,
    Namespace,
    Class,
    Method,
    Field,
    Argument,
    Base,
    Typedef,
    Template,
    TemplateParam,
}

#[derive(Debug, Deserialize)]
struct JsonNode {
    kind: NodeKind,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    ty: Option<String>,
    #[serde(default)]
    method_kind: Option<MethodKind>,
    #[serde(default)]
    return_type: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    qualified: Option<String>,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    has_constructor: bool,
    #[serde(default)]
    has_hidden_new: bool,
    #[serde(default)]
    has_hidden_delete: bool,
    #[serde(default)]
    is_const: bool,
    #[serde(default)]
    has_default: bool,
    #[serde(default)]
    children: Vec<JsonNode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Nodes(Vec<JsonNode>),
    Root(JsonNode),
}

/// Load a declaration dump from disk.
pub fn load(path: &Path) -> Result<DeclTree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read declarations: {}", path.display()))?;
    parse_str(&content)
        .with_context(|| format!("failed to parse declarations: {}", path.display()))
}

/// Parse a declaration dump.
pub fn parse_str(content: &str) -> Result<DeclTree> {
    let document: Document = serde_json::from_str(content)?;
    let nodes = match document {
        Document::Nodes(nodes) => nodes,
        Document::Root(root) if root.kind == NodeKind::TranslationUnit => root.children,
        Document::Root(node) => vec![node],
    };

    let mut tree = new_decl_tree();
    let root = tree.root();
    for node in nodes {
        insert(&mut tree, root, node)?;
    }
    Ok(tree)
}

fn insert(tree: &mut DeclTree, parent: NodeId, node: JsonNode) -> Result<()> {
    let subtree = convert(node)?;
    tree.add_child(parent, subtree);
    Ok(())
}

fn convert(node: JsonNode) -> Result<Detached<Decl>> {
    let kind = node.kind;
    let decl = match kind {
        NodeKind::TranslationUnit => bail!("`translation_unit` is only valid at the top level"),
        NodeKind::Namespace => Decl::Namespace {
            name: required(node.name.clone(), kind, "name")?,
        },
        NodeKind::Class => {
            let name = required(node.name.clone(), kind, "name")?;
            let qualified = node.ty.clone().unwrap_or_else(|| name.clone());
            let mut class = ClassDecl::new(name, &qualified);
            class.is_abstract = node.is_abstract;
            class.has_constructor = node.has_constructor;
            class.has_hidden_new = node.has_hidden_new;
            class.has_hidden_delete = node.has_hidden_delete;
            Decl::Class(class)
        }
        NodeKind::Method => Decl::Method(MethodDecl {
            name: required(node.name.clone(), kind, "name")?,
            kind: node.method_kind.unwrap_or(MethodKind::InstanceMethod),
            return_type: node
                .return_type
                .as_deref()
                .map(CppType::parse)
                .unwrap_or_else(CppType::void),
            is_const: node.is_const,
        }),
        NodeKind::Field => Decl::Field(FieldDecl {
            name: required(node.name.clone(), kind, "name")?,
            ty: CppType::parse(&required(node.ty.clone(), kind, "type")?),
        }),
        NodeKind::Argument => Decl::Argument(ArgumentDecl {
            name: node.name.clone().unwrap_or_default(),
            ty: CppType::parse(&required(node.ty.clone(), kind, "type")?),
            has_default: node.has_default,
        }),
        NodeKind::Base => Decl::Base(BaseDecl {
            ty: CppType::parse(&required(node.ty.clone(), kind, "type")?),
        }),
        NodeKind::Typedef => Decl::Typedef(TypedefDecl {
            name: required(node.name.clone(), kind, "name")?,
            target: CppType::parse(&required(node.target.clone(), kind, "target")?),
        }),
        NodeKind::Template => {
            let name = required(node.name.clone(), kind, "name")?;
            Decl::Template(TemplateDecl {
                qualified: node.qualified.clone().unwrap_or_else(|| name.clone()),
                name,
            })
        }
        NodeKind::TemplateParam => Decl::TemplateParam {
            name: required(node.name.clone(), kind, "name")?,
        },
    };

    let children = node
        .children
        .into_iter()
        .map(convert)
        .collect::<Result<Vec<_>>>()?;
    Ok(Detached::new(decl).with_children(children))
}

fn required(value: Option<String>, kind: NodeKind, field: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => bail!("{:?} node is missing `{}`", kind, field),
    }
}
