//! Serializable element filters.
//!
//! Filters select elements of a declaration or resolved tree. They are used
//! to pick the initial class set and as the predicate of mapping passes.
//! They deserialize from TOML so both can be configured in `Shimsmith.toml`:
//!
//! ```toml
//! [filter]
//! type = "and"
//! filters = [
//!     { type = "type", types = ["class"] },
//!     { type = "string", selector = "class-qualified", matcher = "starts-with", value = "mylib::" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::decl::{namespace_path, Decl, DeclTree};
use super::resolved::{Resolved, ResolvedTree};
use super::tree::NodeId;

/// Element categories a filter can test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterableType {
    Class,
    Method,
    Field,
    Type,
    Namespace,
}

/// Which related elements a hierarchy filter tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HierarchyTarget {
    Parent,
    /// The outermost enclosing element below the root.
    Base,
    AnyChild,
    AllChildren,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringMatcher {
    StartsWith,
    Contains,
    Equals,
    EndsWith,
    Regex,
}

/// The string a string filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringSelector {
    Stringify,
    ClassName,
    ClassQualified,
    MethodName,
    MethodType,
    MethodReturnType,
    Namespace,
}

/// An element predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Filter {
    /// Every class outside `std::` and reserved `__` names.
    Default,
    /// Matches everything.
    All,
    Type {
        types: Vec<FilterableType>,
    },
    And {
        filters: Vec<Filter>,
    },
    Or {
        filters: Vec<Filter>,
    },
    Not {
        filter: Box<Filter>,
    },
    Hierarchy {
        target: HierarchyTarget,
        filter: Box<Filter>,
    },
    String {
        selector: StringSelector,
        matcher: StringMatcher,
        value: String,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Default
    }
}

impl Filter {
    pub fn is_type(types: &[FilterableType]) -> Self {
        Filter::Type {
            types: types.to_vec(),
        }
    }

    pub fn string(selector: StringSelector, matcher: StringMatcher, value: impl Into<String>) -> Self {
        Filter::String {
            selector,
            matcher,
            value: value.into(),
        }
    }

    /// Classes whose qualified spelling equals `qualified`.
    pub fn class_named(qualified: impl Into<String>) -> Self {
        Filter::And {
            filters: vec![
                Filter::is_type(&[FilterableType::Class]),
                Filter::string(StringSelector::ClassQualified, StringMatcher::Equals, qualified),
            ],
        }
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And {
            filters: vec![self, other],
        }
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or {
            filters: vec![self, other],
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not {
            filter: Box::new(self),
        }
    }

    /// Check that every regex in the filter compiles.
    pub fn validate(&self) -> Result<(), regex::Error> {
        match self {
            Filter::Default | Filter::All | Filter::Type { .. } => Ok(()),
            Filter::And { filters } | Filter::Or { filters } => {
                filters.iter().try_for_each(Filter::validate)
            }
            Filter::Not { filter } | Filter::Hierarchy { filter, .. } => filter.validate(),
            Filter::String { matcher, value, .. } => {
                if *matcher == StringMatcher::Regex {
                    regex::Regex::new(value)?;
                }
                Ok(())
            }
        }
    }

    /// Evaluate the filter on one element.
    pub fn matches<T: FilterSubject + ?Sized>(&self, tree: &T, id: NodeId) -> bool {
        match self {
            Filter::All => true,
            Filter::Default => default_filter().matches(tree, id),
            Filter::Type { types } => tree
                .element_type(id)
                .is_some_and(|ty| types.contains(&ty)),
            Filter::And { filters } => filters.iter().all(|f| f.matches(tree, id)),
            Filter::Or { filters } => filters.iter().any(|f| f.matches(tree, id)),
            Filter::Not { filter } => !filter.matches(tree, id),
            Filter::Hierarchy { target, filter } => match target {
                HierarchyTarget::Parent => tree
                    .parent_of(id)
                    .is_some_and(|parent| filter.matches(tree, parent)),
                HierarchyTarget::Base => filter.matches(tree, tree.outermost(id)),
                HierarchyTarget::AnyChild => {
                    tree.children_of(id).iter().any(|c| filter.matches(tree, *c))
                }
                HierarchyTarget::AllChildren => {
                    tree.children_of(id).iter().all(|c| filter.matches(tree, *c))
                }
            },
            Filter::String {
                selector,
                matcher,
                value,
            } => match tree.select(id, *selector) {
                Some(target) => string_matches(*matcher, value, &target),
                None => false,
            },
        }
    }
}

fn default_filter() -> Filter {
    let qualified = |prefix: &str| {
        Filter::string(StringSelector::ClassQualified, StringMatcher::StartsWith, prefix)
    };
    Filter::is_type(&[FilterableType::Class])
        .and(qualified("std::").negate())
        .and(qualified("__").negate())
}

fn string_matches(matcher: StringMatcher, value: &str, target: &str) -> bool {
    match matcher {
        StringMatcher::StartsWith => target.starts_with(value),
        StringMatcher::Contains => target.contains(value),
        StringMatcher::Equals => target == value,
        StringMatcher::EndsWith => target.ends_with(value),
        StringMatcher::Regex => match regex::Regex::new(&format!("^(?:{})$", value)) {
            Ok(re) => re.is_match(target),
            Err(e) => {
                warn!("invalid filter regex `{}`: {}", value, e);
                false
            }
        },
    }
}

/// A tree a [`Filter`] can be evaluated against.
pub trait FilterSubject {
    fn element_type(&self, id: NodeId) -> Option<FilterableType>;

    /// Parent element, `None` for top-level elements.
    fn parent_of(&self, id: NodeId) -> Option<NodeId>;

    fn children_of(&self, id: NodeId) -> Vec<NodeId>;

    fn select(&self, id: NodeId, selector: StringSelector) -> Option<String>;

    /// Outermost ancestor below the root, or `id` itself when top-level.
    fn outermost(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        current
    }
}

impl FilterSubject for DeclTree {
    fn element_type(&self, id: NodeId) -> Option<FilterableType> {
        match self.get(id) {
            Decl::Class(_) | Decl::Template(_) => Some(FilterableType::Class),
            Decl::Method(_) => Some(FilterableType::Method),
            Decl::Field(_) => Some(FilterableType::Field),
            Decl::Typedef(_) | Decl::Base(_) | Decl::TemplateParam { .. } => {
                Some(FilterableType::Type)
            }
            Decl::Namespace { .. } => Some(FilterableType::Namespace),
            Decl::TranslationUnit | Decl::Argument(_) => None,
        }
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| *p != self.root())
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).to_vec()
    }

    fn select(&self, id: NodeId, selector: StringSelector) -> Option<String> {
        let element = self.get(id);
        match (selector, element) {
            (StringSelector::Stringify, _) => Some(stringify_decl(element)),
            (StringSelector::ClassName, Decl::Class(c)) => Some(c.name.clone()),
            (StringSelector::ClassQualified, Decl::Class(c)) => Some(c.spelling()),
            (StringSelector::MethodName, Decl::Method(m)) => Some(m.name.clone()),
            (StringSelector::MethodType, Decl::Method(m)) => {
                Some(format!("{:?}", m.kind).to_uppercase())
            }
            (StringSelector::MethodReturnType, Decl::Method(m)) => Some(m.return_type.spelling()),
            (StringSelector::Namespace, Decl::Namespace { .. }) => {
                let mut path = namespace_path(self, id);
                if let Decl::Namespace { name } = element {
                    path.push(name.clone());
                }
                Some(path.join("::"))
            }
            _ => None,
        }
    }
}

fn stringify_decl(element: &Decl) -> String {
    match element {
        Decl::TranslationUnit => "translation unit".to_string(),
        Decl::Namespace { name } => format!("namespace {}", name),
        Decl::Class(c) => c.spelling(),
        Decl::Method(m) => format!("{}: {}", m.name, m.return_type),
        Decl::Field(f) => format!("{}: {}", f.name, f.ty),
        Decl::Argument(a) => format!("{}: {}", a.name, a.ty),
        Decl::Base(b) => b.ty.spelling(),
        Decl::Typedef(t) => format!("typedef {} {}", t.target, t.name),
        Decl::Template(t) => t.qualified.clone(),
        Decl::TemplateParam { name } => name.clone(),
    }
}

impl FilterSubject for ResolvedTree {
    fn element_type(&self, id: NodeId) -> Option<FilterableType> {
        match self.get(id) {
            Resolved::Class(_) => Some(FilterableType::Class),
            Resolved::Method(_) => Some(FilterableType::Method),
            Resolved::Field(_) => Some(FilterableType::Field),
            Resolved::Base(_) => Some(FilterableType::Type),
            Resolved::Module | Resolved::Argument(_) => None,
        }
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| *p != self.root())
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).to_vec()
    }

    fn select(&self, id: NodeId, selector: StringSelector) -> Option<String> {
        let element = self.get(id);
        match (selector, element) {
            (StringSelector::Stringify, _) => Some(element.to_string()),
            (StringSelector::ClassName, Resolved::Class(c)) => Some(c.name.clone()),
            (StringSelector::ClassQualified, Resolved::Class(c)) => Some(c.spelling.clone()),
            (StringSelector::MethodName, Resolved::Method(m)) => Some(m.name.clone()),
            (StringSelector::MethodType, Resolved::Method(m)) => {
                Some(format!("{:?}", m.method_type).to_uppercase())
            }
            (StringSelector::MethodReturnType, Resolved::Method(m)) => {
                Some(m.return_type.cpp.spelling())
            }
            (StringSelector::Namespace, Resolved::Class(c)) => c
                .spelling
                .rsplit_once("::")
                .map(|(ns, _)| ns.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{new_decl_tree, ClassDecl, MethodDecl, MethodKind};
    use crate::core::tree::Detached;
    use crate::core::types::CppType;

    fn tree() -> (DeclTree, NodeId, NodeId, NodeId) {
        let mut tree = new_decl_tree();
        let root = tree.root();
        let ns = tree.add_child(root, Detached::new(Decl::Namespace { name: "lib".into() }));
        let cls = tree.add_child(
            ns,
            Detached::new(Decl::Class(ClassDecl::new("Widget", "lib::Widget"))),
        );
        let method = tree.add_child(
            cls,
            Detached::new(Decl::Method(MethodDecl {
                name: "draw".into(),
                kind: MethodKind::InstanceMethod,
                return_type: CppType::void(),
                is_const: false,
            })),
        );
        let std_cls = tree.add_child(
            root,
            Detached::new(Decl::Class(ClassDecl::new("string", "std::string"))),
        );
        let _ = std_cls;
        (tree, ns, cls, method)
    }

    #[test]
    fn test_type_filter() {
        let (tree, ns, cls, method) = tree();
        let f = Filter::is_type(&[FilterableType::Class]);
        assert!(f.matches(&tree, cls));
        assert!(!f.matches(&tree, method));
        assert!(!f.matches(&tree, ns));
    }

    #[test]
    fn test_default_filter_skips_std() {
        let (tree, _, cls, _) = tree();
        let std_cls = *tree.children(tree.root()).last().unwrap();
        assert!(Filter::Default.matches(&tree, cls));
        assert!(!Filter::Default.matches(&tree, std_cls));
    }

    #[test]
    fn test_hierarchy_parent_and_base() {
        let (tree, ns, cls, method) = tree();
        let parent_is_class = Filter::Hierarchy {
            target: HierarchyTarget::Parent,
            filter: Box::new(Filter::class_named("lib::Widget")),
        };
        assert!(parent_is_class.matches(&tree, method));
        assert!(!parent_is_class.matches(&tree, cls));

        let base_is_lib = Filter::Hierarchy {
            target: HierarchyTarget::Base,
            filter: Box::new(Filter::string(
                StringSelector::Namespace,
                StringMatcher::Equals,
                "lib",
            )),
        };
        assert_eq!(tree.outermost(method), ns);
        assert!(base_is_lib.matches(&tree, method));
    }

    #[test]
    fn test_children_filters() {
        let (tree, _, cls, _) = tree();
        let draws = Filter::string(StringSelector::MethodName, StringMatcher::Equals, "draw");
        let any = Filter::Hierarchy {
            target: HierarchyTarget::AnyChild,
            filter: Box::new(draws.clone()),
        };
        let all = Filter::Hierarchy {
            target: HierarchyTarget::AllChildren,
            filter: Box::new(draws),
        };
        assert!(any.matches(&tree, cls));
        assert!(all.matches(&tree, cls));
    }

    #[test]
    fn test_regex_matches_whole_string() {
        let (tree, _, cls, _) = tree();
        let f = Filter::string(StringSelector::ClassName, StringMatcher::Regex, "Wid.*");
        assert!(f.matches(&tree, cls));
        let partial = Filter::string(StringSelector::ClassName, StringMatcher::Regex, "idg");
        assert!(!partial.matches(&tree, cls));
    }

    #[test]
    fn test_invalid_regex_fails_validation() {
        let f = Filter::string(StringSelector::ClassName, StringMatcher::Regex, "(");
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_filter_from_toml() {
        let f: Filter = toml::from_str(
            r#"
type = "and"
filters = [
    { type = "type", types = ["class"] },
    { type = "string", selector = "class-qualified", matcher = "starts-with", value = "lib::" },
]
"#,
        )
        .unwrap();
        let (tree, _, cls, _) = tree();
        assert!(f.matches(&tree, cls));
    }
}
