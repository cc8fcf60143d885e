//! Type mapping under a reference policy.
//!
//! [`TypeMapper::map`] decides, for one written type, whether it can stay as
//! is, must be rewritten (a name qualified against its scope or a typedef
//! expanded), is kept opaque, or makes its owning element impossible to
//! generate.

use tracing::debug;

use super::errors::ResolveError;
use super::tracker::Tracker;
use super::ReferencePolicy;
use crate::core::decl::Decl;
use crate::core::types::{CppType, STD_STRING};
use crate::sources::DeclarationProvider;

/// Outcome of mapping one type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeMapping {
    Unchanged,
    /// The type cannot be generated; the element that uses it goes too.
    Remove,
    ReplaceWith(CppType),
    /// Missing under the opaque policy. The written type stays for the
    /// shim's casts; the C and Kotlin sides see an opaque pointer.
    Opaque,
}

/// Intermediate result while walking into a type.
#[derive(Debug, Clone, PartialEq)]
enum Mapped {
    Same,
    Changed(CppType),
    Removed,
    /// Missing under the opaque policy; the whole type is kept as written.
    Opaque,
}

impl Mapped {
    fn rewrap(self, wrap: impl FnOnce(CppType) -> CppType) -> Mapped {
        match self {
            Mapped::Changed(inner) => Mapped::Changed(wrap(inner)),
            other => other,
        }
    }
}

/// Maps types against the classes a session knows about.
pub struct TypeMapper<'a, P: DeclarationProvider + ?Sized> {
    provider: &'a P,
    tracker: &'a mut Tracker,
    policy: ReferencePolicy,
}

impl<'a, P: DeclarationProvider + ?Sized> TypeMapper<'a, P> {
    pub fn new(provider: &'a P, tracker: &'a mut Tracker, policy: ReferencePolicy) -> Self {
        TypeMapper {
            provider,
            tracker,
            policy,
        }
    }

    /// Map `ty` as written inside `scope` (a `::`-separated path such as
    /// `ns::Class`). `element` names the referencing element in errors.
    pub fn map(
        &mut self,
        ty: &CppType,
        scope: &str,
        element: &str,
    ) -> Result<TypeMapping, ResolveError> {
        Ok(match self.map_type(ty, scope, element)? {
            Mapped::Same => TypeMapping::Unchanged,
            Mapped::Changed(t) => TypeMapping::ReplaceWith(t),
            Mapped::Removed => TypeMapping::Remove,
            Mapped::Opaque => TypeMapping::Opaque,
        })
    }

    fn map_type(&mut self, ty: &CppType, scope: &str, element: &str) -> Result<Mapped, ResolveError> {
        Ok(match ty {
            CppType::Native(_) => Mapped::Same,
            CppType::Pointer(inner) => self.map_type(inner, scope, element)?.rewrap(CppType::pointer),
            CppType::Reference(inner) => {
                self.map_type(inner, scope, element)?.rewrap(CppType::reference)
            }
            CppType::Array(inner, len) => {
                let len = *len;
                self.map_type(inner, scope, element)?
                    .rewrap(|t| CppType::Array(Box::new(t), len))
            }
            CppType::Modified {
                base,
                is_const,
                is_volatile,
            } => {
                let (is_const, is_volatile) = (*is_const, *is_volatile);
                self.map_type(base, scope, element)?
                    .rewrap(|t| CppType::Modified {
                        base: Box::new(t),
                        is_const,
                        is_volatile,
                    })
            }
            CppType::TypeReference(name) => self.map_name(name, scope, element)?,
            CppType::Template { base, args } => self.map_template(base, args, scope, element)?,
        })
    }

    fn map_name(&mut self, name: &str, scope: &str, element: &str) -> Result<Mapped, ResolveError> {
        if name == STD_STRING {
            return Ok(Mapped::Same);
        }

        let candidates = candidates(name, scope);
        for candidate in &candidates {
            if self.tracker.is_known(candidate) {
                return Ok(renamed(name, candidate));
            }
        }

        for candidate in &candidates {
            let target = self
                .provider
                .resolve_typedef(candidate)
                .map_err(|e| ResolveError::provider(candidate, e))?;
            if let Some(target) = target {
                debug!("typedef {} expands to {}", candidate, target);
                let typedef_scope = enclosing(candidate);
                return Ok(match self.map_type(&target, typedef_scope, element)? {
                    Mapped::Same => Mapped::Changed(target),
                    Mapped::Opaque => {
                        self.tracker.mark_opaque(name);
                        Mapped::Opaque
                    }
                    other => other,
                });
            }
        }

        match self.policy {
            ReferencePolicy::IgnoreMissing => {
                debug!("dropping unresolved type {} in {}", name, element);
                Ok(Mapped::Removed)
            }
            ReferencePolicy::OpaqueMissing => {
                debug!("treating {} as opaque in {}", name, element);
                self.tracker.mark_opaque(name);
                Ok(Mapped::Opaque)
            }
            ReferencePolicy::ThrowMissing => Err(ResolveError::UnresolvedType {
                ty: name.to_string(),
                element: element.to_string(),
            }),
            ReferencePolicy::IncludeMissing => {
                for candidate in &candidates {
                    if let Some(spelling) = self.include_class(candidate)? {
                        return Ok(renamed(name, &spelling));
                    }
                }
                debug!("no declaration for {} in {}", name, element);
                Ok(Mapped::Removed)
            }
        }
    }

    fn map_template(
        &mut self,
        base: &str,
        args: &[CppType],
        scope: &str,
        element: &str,
    ) -> Result<Mapped, ResolveError> {
        let mut changed = false;
        let mut mapped_args = Vec::with_capacity(args.len());
        for arg in args {
            match self.map_type(arg, scope, element)? {
                Mapped::Same => mapped_args.push(arg.clone()),
                Mapped::Changed(t) => {
                    changed = true;
                    mapped_args.push(t);
                }
                Mapped::Removed => return Ok(Mapped::Removed),
                Mapped::Opaque => break,
            }
        }

        let original = CppType::Template {
            base: base.to_string(),
            args: args.to_vec(),
        };
        if mapped_args.len() < args.len() {
            self.tracker.mark_opaque(original.spelling());
            return Ok(Mapped::Opaque);
        }
        let mapped = CppType::Template {
            base: base.to_string(),
            args: mapped_args,
        };
        let spelling = mapped.spelling();
        let result = if changed {
            Mapped::Changed(mapped)
        } else {
            Mapped::Same
        };

        if self.tracker.is_known(&spelling) {
            return Ok(result);
        }

        match self.policy {
            ReferencePolicy::IgnoreMissing => Ok(Mapped::Removed),
            ReferencePolicy::OpaqueMissing => {
                self.tracker.mark_opaque(original.spelling());
                Ok(Mapped::Opaque)
            }
            ReferencePolicy::ThrowMissing => Err(ResolveError::UnresolvedType {
                ty: original.spelling(),
                element: element.to_string(),
            }),
            ReferencePolicy::IncludeMissing => {
                if let Some(class) = self.include_class(&spelling)? {
                    return Ok(if class == spelling {
                        result
                    } else {
                        Mapped::Changed(CppType::named(class))
                    });
                }
                if self.provider.resolve_template_by_name(&spelling).is_some() {
                    debug!("{} is resolvable as a template instantiation", spelling);
                    self.tracker.mark_otherwise_resolvable(spelling);
                    return Ok(result);
                }
                debug!("no template for {} in {}", spelling, element);
                Ok(Mapped::Removed)
            }
        }
    }

    /// Look a class up through the provider and register it.
    fn include_class(&mut self, spelling: &str) -> Result<Option<String>, ResolveError> {
        let found = self
            .provider
            .resolve_by_name(spelling)
            .map_err(|e| ResolveError::provider(spelling, e))?;
        let Some(id) = found else {
            return Ok(None);
        };
        let Decl::Class(class) = self.provider.tree().get(id) else {
            return Ok(None);
        };
        let class_spelling = class.spelling();
        if self.tracker.register(class_spelling.clone(), id) {
            debug!("including {}", class_spelling);
        }
        Ok(Some(class_spelling))
    }
}

fn renamed(written: &str, resolved: &str) -> Mapped {
    if written == resolved {
        Mapped::Same
    } else {
        Mapped::Changed(CppType::named(resolved))
    }
}

/// Spellings `name` may refer to from inside `scope`, innermost first.
pub fn candidates(name: &str, scope: &str) -> Vec<String> {
    if let Some(absolute) = name.strip_prefix("::") {
        return vec![absolute.to_string()];
    }
    let mut out = Vec::new();
    let segments: Vec<&str> = if scope.is_empty() {
        Vec::new()
    } else {
        scope.split("::").collect()
    };
    for depth in (1..=segments.len()).rev() {
        out.push(format!("{}::{}", segments[..depth].join("::"), name));
    }
    out.push(name.to_string());
    out
}

/// Scope a qualified name is declared in.
fn enclosing(spelling: &str) -> &str {
    spelling.rsplit_once("::").map(|(scope, _)| scope).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{new_decl_tree, ClassDecl, TemplateDecl, TypedefDecl};
    use crate::core::tree::Detached;
    use crate::sources::IndexedDeclarations;

    fn provider() -> IndexedDeclarations {
        let mut tree = new_decl_tree();
        let root = tree.root();
        let ns = tree.add_child(root, Detached::new(Decl::Namespace { name: "lib".into() }));
        tree.add_child(ns, Detached::new(Decl::Class(ClassDecl::new("Known", "lib::Known"))));
        tree.add_child(ns, Detached::new(Decl::Class(ClassDecl::new("Extra", "lib::Extra"))));
        tree.add_child(
            ns,
            Detached::new(Decl::Typedef(TypedefDecl {
                name: "Count".into(),
                target: CppType::native("unsigned int"),
            })),
        );
        tree.add_child(
            root,
            Detached::new(Decl::Template(TemplateDecl {
                name: "vector".into(),
                qualified: "std::vector".into(),
            })),
        );
        IndexedDeclarations::new(tree)
    }

    fn tracker_with_known(provider: &IndexedDeclarations) -> Tracker {
        let mut tracker = Tracker::new();
        let id = provider.resolve_by_name("lib::Known").unwrap().unwrap();
        tracker.register("lib::Known", id);
        tracker
    }

    fn map(policy: ReferencePolicy, ty: &str) -> (Result<TypeMapping, ResolveError>, Tracker) {
        let provider = provider();
        let mut tracker = tracker_with_known(&provider);
        let result =
            TypeMapper::new(&provider, &mut tracker, policy).map(&CppType::parse(ty), "lib::Known", "lib::Known::m");
        (result, tracker)
    }

    #[test]
    fn test_candidates_innermost_first() {
        assert_eq!(
            candidates("X", "a::B"),
            vec!["a::B::X".to_string(), "a::X".to_string(), "X".to_string()]
        );
        assert_eq!(candidates("::X", "a::B"), vec!["X".to_string()]);
        assert_eq!(candidates("X", ""), vec!["X".to_string()]);
    }

    #[test]
    fn test_natives_and_strings_always_resolve() {
        for ty in ["int", "long double", "const char*", "std::string", "void"] {
            let (result, _) = map(ReferencePolicy::ThrowMissing, ty);
            assert_eq!(result.unwrap(), TypeMapping::Unchanged, "{}", ty);
        }
    }

    #[test]
    fn test_unqualified_name_is_qualified() {
        let (result, _) = map(ReferencePolicy::ThrowMissing, "const Known&");
        assert_eq!(
            result.unwrap(),
            TypeMapping::ReplaceWith(CppType::parse("const lib::Known&"))
        );
    }

    #[test]
    fn test_typedef_expands() {
        let (result, _) = map(ReferencePolicy::ThrowMissing, "Count*");
        assert_eq!(
            result.unwrap(),
            TypeMapping::ReplaceWith(CppType::parse("unsigned int*"))
        );
    }

    #[test]
    fn test_ignore_missing_removes() {
        let (result, _) = map(ReferencePolicy::IgnoreMissing, "Missing*");
        assert_eq!(result.unwrap(), TypeMapping::Remove);
    }

    #[test]
    fn test_opaque_missing_keeps_written_type() {
        let (result, tracker) = map(ReferencePolicy::OpaqueMissing, "const other::Missing&");
        assert_eq!(result.unwrap(), TypeMapping::Opaque);
        assert!(tracker.opaque().contains("other::Missing"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_opaque_template_argument_marks_instantiation() {
        let (result, tracker) = map(ReferencePolicy::OpaqueMissing, "std::vector<Missing>*");
        assert_eq!(result.unwrap(), TypeMapping::Opaque);
        assert!(tracker.opaque().contains("Missing"));
        assert!(tracker.opaque().contains("std::vector<Missing>"));
    }

    #[test]
    fn test_throw_missing_names_type_and_element() {
        let (result, _) = map(ReferencePolicy::ThrowMissing, "Missing");
        match result {
            Err(ResolveError::UnresolvedType { ty, element }) => {
                assert_eq!(ty, "Missing");
                assert_eq!(element, "lib::Known::m");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_include_missing_registers_class() {
        let (result, tracker) = map(ReferencePolicy::IncludeMissing, "Extra*");
        assert_eq!(
            result.unwrap(),
            TypeMapping::ReplaceWith(CppType::parse("lib::Extra*"))
        );
        assert_eq!(tracker.spellings(), &["lib::Known".to_string(), "lib::Extra".to_string()]);
    }

    #[test]
    fn test_include_missing_template_is_otherwise_resolvable() {
        let (result, tracker) = map(ReferencePolicy::IncludeMissing, "std::vector<int>");
        assert_eq!(result.unwrap(), TypeMapping::Unchanged);
        assert!(tracker.is_otherwise_resolvable("std::vector<int>"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_template_with_missing_argument_is_removed() {
        let (result, _) = map(ReferencePolicy::IncludeMissing, "std::vector<Missing>");
        assert_eq!(result.unwrap(), TypeMapping::Remove);
    }

    #[test]
    fn test_include_missing_without_declaration_removes() {
        let (result, tracker) = map(ReferencePolicy::IncludeMissing, "Nowhere");
        assert_eq!(result.unwrap(), TypeMapping::Remove);
        assert_eq!(tracker.len(), 1);
    }
}
