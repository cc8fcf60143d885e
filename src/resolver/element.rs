//! Element mapping over the declaration tree.
//!
//! Mapping is post-order: children are mapped first and any change bubbles up
//! through `needs_mutation`, so an untouched subtree is copied as is and a
//! touched one is rebuilt with its rewritten children.

use tracing::debug;

use super::errors::ResolveError;
use super::type_mapping::{TypeMapper, TypeMapping};
use crate::core::decl::{Decl, DeclTree};
use crate::core::tree::{Detached, NodeId};
use crate::core::types::CppType;
use crate::sources::DeclarationProvider;

/// Outcome of mapping one element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementMapping {
    Unchanged,
    Remove,
    Replace(Detached<Decl>),
}

/// Maps the members of classes against a [`TypeMapper`].
pub struct ElementMapper<'a, 'm, P: DeclarationProvider + ?Sized> {
    tree: &'a DeclTree,
    types: &'m mut TypeMapper<'a, P>,
}

impl<'a, 'm, P: DeclarationProvider + ?Sized> ElementMapper<'a, 'm, P> {
    pub fn new(tree: &'a DeclTree, types: &'m mut TypeMapper<'a, P>) -> Self {
        ElementMapper { tree, types }
    }

    /// Map a class and keep only the members that survive.
    ///
    /// Nested classes, typedefs and templates are not members for
    /// generation and are left out of the copy.
    pub fn map_class(&mut self, class: NodeId, spelling: &str) -> Result<Detached<Decl>, ResolveError> {
        let tree = self.tree;
        let mut members = Vec::new();
        for child in tree.children(class) {
            if !matches!(
                tree.get(*child),
                Decl::Method(_) | Decl::Field(_) | Decl::Base(_)
            ) {
                continue;
            }
            match self.map_element(*child, spelling)? {
                ElementMapping::Unchanged => members.push(tree.detach(*child)),
                ElementMapping::Replace(replacement) => members.push(replacement),
                ElementMapping::Remove => {
                    debug!("removed {} from {}", describe(tree.get(*child)), spelling);
                }
            }
        }
        Ok(Detached::new(tree.get(class).clone()).with_children(members))
    }

    /// Map one element and its subtree. `scope` is the enclosing class.
    pub fn map_element(&mut self, id: NodeId, scope: &str) -> Result<ElementMapping, ResolveError> {
        let tree = self.tree;
        let element = format!("{}::{}", scope, describe(tree.get(id)));
        let mut needs_mutation = false;

        let children = tree.children(id);
        let mut mapped_children = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            match self.map_element(*child, scope)? {
                ElementMapping::Unchanged => mapped_children.push(tree.detach(*child)),
                ElementMapping::Replace(replacement) => {
                    needs_mutation = true;
                    mapped_children.push(replacement);
                }
                ElementMapping::Remove => {
                    needs_mutation = true;
                    if !matches!(tree.get(*child), Decl::Argument(_)) {
                        continue;
                    }
                    // Trailing defaulted arguments can be dropped; the C++
                    // callee fills them in.
                    let rest_defaulted = children[index..].iter().all(|c| {
                        matches!(tree.get(*c), Decl::Argument(a) if a.has_default)
                    });
                    if rest_defaulted {
                        debug!("dropping defaulted arguments of {} from #{}", element, index);
                        break;
                    }
                    return Ok(ElementMapping::Remove);
                }
            }
        }

        let mut node = tree.get(id).clone();
        let is_base = matches!(node, Decl::Base(_));
        if let Some(ty) = own_type(&mut node) {
            match self.types.map(ty, scope, &element)? {
                TypeMapping::Unchanged => {}
                TypeMapping::Remove => return Ok(ElementMapping::Remove),
                // An opaque base has no members to inherit.
                TypeMapping::Opaque if is_base => return Ok(ElementMapping::Remove),
                TypeMapping::Opaque => {}
                TypeMapping::ReplaceWith(new_ty) => {
                    *ty = new_ty;
                    needs_mutation = true;
                }
            }
        }

        // A base must still name a class after mapping.
        if let Decl::Base(base) = &node {
            if !matches!(
                base.ty.unqualified(),
                CppType::TypeReference(_) | CppType::Template { .. }
            ) {
                return Ok(ElementMapping::Remove);
            }
        }

        if needs_mutation {
            Ok(ElementMapping::Replace(
                Detached::new(node).with_children(mapped_children),
            ))
        } else {
            Ok(ElementMapping::Unchanged)
        }
    }
}

/// The type an element depends on, if any.
fn own_type(node: &mut Decl) -> Option<&mut CppType> {
    match node {
        Decl::Method(m) => Some(&mut m.return_type),
        Decl::Field(f) => Some(&mut f.ty),
        Decl::Argument(a) => Some(&mut a.ty),
        Decl::Base(b) => Some(&mut b.ty),
        _ => None,
    }
}

fn describe(decl: &Decl) -> String {
    match decl {
        Decl::Base(b) => format!("<base {}>", b.ty),
        other => other.name().unwrap_or("<anonymous>").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{ArgumentDecl, BaseDecl, ClassDecl, MethodDecl, MethodKind};
    use crate::resolver::tracker::Tracker;
    use crate::resolver::ReferencePolicy;
    use crate::sources::IndexedDeclarations;

    fn arg(name: &str, ty: &str, has_default: bool) -> Detached<Decl> {
        Detached::new(Decl::Argument(ArgumentDecl {
            name: name.into(),
            ty: CppType::parse(ty),
            has_default,
        }))
    }

    fn method(name: &str, ret: &str, args: Vec<Detached<Decl>>) -> Detached<Decl> {
        Detached::new(Decl::Method(MethodDecl {
            name: name.into(),
            kind: MethodKind::InstanceMethod,
            return_type: CppType::parse(ret),
            is_const: false,
        }))
        .with_children(args)
    }

    fn class_with(members: Vec<Detached<Decl>>) -> (IndexedDeclarations, NodeId) {
        let mut tree = crate::core::decl::new_decl_tree();
        let root = tree.root();
        let id = tree.add_child(
            root,
            Detached::new(Decl::Class(ClassDecl::new("A", "A"))).with_children(members),
        );
        (IndexedDeclarations::new(tree), id)
    }

    fn map_members(members: Vec<Detached<Decl>>) -> Vec<String> {
        map_members_with(ReferencePolicy::IgnoreMissing, members)
    }

    fn map_members_with(policy: ReferencePolicy, members: Vec<Detached<Decl>>) -> Vec<String> {
        let (provider, id) = class_with(members);
        let mut tracker = Tracker::new();
        tracker.register("A", id);
        let mut types = TypeMapper::new(&provider, &mut tracker, policy);
        let mut mapper = ElementMapper::new(provider.tree(), &mut types);
        let mapped = mapper.map_class(id, "A").unwrap();
        mapped
            .children
            .iter()
            .map(|m| {
                let args: Vec<&str> = m
                    .children
                    .iter()
                    .filter_map(|a| a.kind.name())
                    .collect();
                format!("{}({})", m.kind.name().unwrap_or(""), args.join(","))
            })
            .collect()
    }

    #[test]
    fn test_missing_return_removes_method() {
        let out = map_members(vec![
            method("keep", "int", vec![]),
            method("drop", "Missing", vec![]),
        ]);
        assert_eq!(out, vec!["keep()"]);
    }

    #[test]
    fn test_missing_trailing_default_is_dropped() {
        let out = map_members(vec![method(
            "set",
            "void",
            vec![
                arg("v", "int", false),
                arg("m", "Missing*", true),
                arg("n", "int", true),
            ],
        )]);
        assert_eq!(out, vec!["set(v)"]);
    }

    #[test]
    fn test_missing_required_argument_removes_method() {
        let out = map_members(vec![method(
            "set",
            "void",
            vec![arg("m", "Missing*", false), arg("v", "int", true)],
        )]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_opaque_keeps_members_and_drops_bases() {
        let out = map_members_with(
            ReferencePolicy::OpaqueMissing,
            vec![
                Detached::new(Decl::Base(BaseDecl {
                    ty: CppType::parse("other::Missing"),
                })),
                method("set", "void", vec![arg("m", "other::Missing*", false)]),
                method("get", "other::Missing&", vec![]),
            ],
        );
        assert_eq!(out, vec!["set(m)", "get()"]);
    }

    #[test]
    fn test_unchanged_subtree_is_copied() {
        let (provider, id) = class_with(vec![method("m", "int", vec![arg("x", "A*", false)])]);
        let mut tracker = Tracker::new();
        tracker.register("A", id);
        let mut types = TypeMapper::new(&provider, &mut tracker, ReferencePolicy::ThrowMissing);
        let mut mapper = ElementMapper::new(provider.tree(), &mut types);
        let method_id = provider.tree().children(id)[0];
        assert_eq!(
            mapper.map_element(method_id, "A").unwrap(),
            ElementMapping::Unchanged
        );
    }
}
