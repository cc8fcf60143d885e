//! Test fixtures for common test scenarios.
//!
//! This module provides pre-built declaration trees, headers and
//! configuration files used across the resolver, rewrite and writer tests.

use crate::core::decl::{
    new_decl_tree, ArgumentDecl, BaseDecl, ClassDecl, Decl, DeclTree, FieldDecl, MethodDecl,
    MethodKind,
};
use crate::core::filter::Filter;
use crate::core::namer::Namer;
use crate::core::resolved::ResolvedTree;
use crate::core::tree::Detached;
use crate::core::types::CppType;
use crate::resolver::{resolve_all, ReferencePolicy, ResolveOptions};
use crate::sources::{DeclarationProvider, IndexedDeclarations};

/// Fluent builder for a class subtree.
#[derive(Debug, Clone)]
pub struct ClassFixture {
    decl: ClassDecl,
    members: Vec<Detached<Decl>>,
}

impl ClassFixture {
    /// Create a class named `name` with the qualified spelling `qualified`.
    pub fn new(name: &str, qualified: &str) -> Self {
        ClassFixture {
            decl: ClassDecl::new(name, qualified),
            members: Vec::new(),
        }
    }

    /// Add a field.
    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.members.push(Detached::new(Decl::Field(FieldDecl {
            name: name.into(),
            ty: CppType::parse(ty),
        })));
        self
    }

    /// Add an instance method with `(name, type)` arguments.
    pub fn method(self, name: &str, ret: &str, args: &[(&str, &str)]) -> Self {
        self.member(name, MethodKind::InstanceMethod, ret, args)
    }

    /// Add a `const`-qualified instance method.
    pub fn const_method(mut self, name: &str, ret: &str, args: &[(&str, &str)]) -> Self {
        self = self.member(name, MethodKind::InstanceMethod, ret, args);
        if let Some(Decl::Method(method)) = self.members.last_mut().map(|m| &mut m.kind) {
            method.is_const = true;
        }
        self
    }

    /// Add a static method.
    pub fn static_method(self, name: &str, ret: &str, args: &[(&str, &str)]) -> Self {
        self.member(name, MethodKind::Static, ret, args)
    }

    /// Add a constructor.
    pub fn constructor(mut self, args: &[(&str, &str)]) -> Self {
        self.decl.has_constructor = true;
        let name = self.decl.name.clone();
        self.member(&name, MethodKind::Constructor, "void", args)
    }

    /// Add a destructor.
    pub fn destructor(self) -> Self {
        let name = format!("~{}", self.decl.name);
        self.member(&name, MethodKind::Destructor, "void", &[])
    }

    /// Add a method whose trailing arguments have defaults.
    pub fn method_with_defaults(
        mut self,
        name: &str,
        ret: &str,
        args: &[(&str, &str, bool)],
    ) -> Self {
        let method = Detached::new(Decl::Method(MethodDecl {
            name: name.into(),
            kind: MethodKind::InstanceMethod,
            return_type: CppType::parse(ret),
            is_const: false,
        }))
        .with_children(args.iter().map(|(arg, ty, has_default)| {
            Detached::new(Decl::Argument(ArgumentDecl {
                name: arg.to_string(),
                ty: CppType::parse(ty),
                has_default: *has_default,
            }))
        }));
        self.members.push(method);
        self
    }

    /// Add a public base class.
    pub fn base(mut self, ty: &str) -> Self {
        self.members.push(Detached::new(Decl::Base(BaseDecl {
            ty: CppType::parse(ty),
        })));
        self
    }

    /// Mark the class abstract.
    pub fn abstract_class(mut self) -> Self {
        self.decl.is_abstract = true;
        self
    }

    /// Hide `operator new` and `operator delete`.
    pub fn hidden_allocation(mut self) -> Self {
        self.decl.has_hidden_new = true;
        self.decl.has_hidden_delete = true;
        self
    }

    fn member(mut self, name: &str, kind: MethodKind, ret: &str, args: &[(&str, &str)]) -> Self {
        let method = Detached::new(Decl::Method(MethodDecl {
            name: name.into(),
            kind,
            return_type: CppType::parse(ret),
            is_const: false,
        }))
        .with_children(args.iter().map(|(arg, ty)| {
            Detached::new(Decl::Argument(ArgumentDecl {
                name: arg.to_string(),
                ty: CppType::parse(ty),
                has_default: false,
            }))
        }));
        self.members.push(method);
        self
    }

    /// Finish the subtree.
    pub fn build(self) -> Detached<Decl> {
        Detached::new(Decl::Class(self.decl)).with_children(self.members)
    }
}

/// Wrap classes in a namespace and return the tree.
pub fn namespace_tree(namespace: &str, classes: Vec<Detached<Decl>>) -> DeclTree {
    let mut tree = new_decl_tree();
    let root = tree.root();
    tree.add_child(
        root,
        Detached::new(Decl::Namespace {
            name: namespace.into(),
        })
        .with_children(classes),
    );
    tree
}

/// `TestLib::TestClass` with two fields, `sum()` and `operator-`.
pub fn test_class() -> ClassFixture {
    ClassFixture::new("TestClass", "TestLib::TestClass")
        .field("b", "bool")
        .field("l", "long")
        .method("sum", "long", &[])
        .method("operator-", "TestClass", &[("other", "TestClass")])
}

/// A tree holding only [`test_class`].
pub fn scenario() -> DeclTree {
    namespace_tree("TestLib", vec![test_class().build()])
}

/// `TestLib` with `TestClass` referring to `OtherClass`.
///
/// `OtherClass` is only reachable through the members that mention it.
pub fn test_lib() -> DeclTree {
    namespace_tree(
        "TestLib",
        vec![
            test_class()
                .method("getOther", "OtherClass*", &[])
                .method("setOther", "void", &[("other", "OtherClass*")])
                .method("missing", "Unknown", &[])
                .build(),
            ClassFixture::new("OtherClass", "TestLib::OtherClass")
                .field("value", "int")
                .method("name", "std::string", &[])
                .build(),
        ],
    )
}

/// Two classes that refer to each other.
pub fn cyclic_pair() -> DeclTree {
    namespace_tree(
        "cycle",
        vec![
            ClassFixture::new("A", "cycle::A").field("b", "B*").build(),
            ClassFixture::new("B", "cycle::B")
                .method("getA", "A", &[])
                .method("peer", "B&", &[])
                .build(),
        ],
    )
}

/// A class exercising every operator emission strategy.
pub fn operator_class() -> DeclTree {
    namespace_tree(
        "ops",
        vec![ClassFixture::new("Num", "ops::Num")
            .constructor(&[("v", "int")])
            .destructor()
            .method("operator+", "Num", &[("other", "const Num&")])
            .method("operator==", "bool", &[("other", "const Num&")])
            .method("operator[]", "int&", &[("index", "int")])
            .method("operator++", "Num&", &[])
            .method("operator++", "Num", &[("dummy", "int")])
            .method("operator-", "Num", &[])
            .method("operator=", "Num&", &[("other", "const Num&")])
            .method("operator+=", "Num&", &[("other", "const Num&")])
            .method("operator~", "Num", &[])
            .method("eq", "bool", &[("other", "int")])
            .static_method("zero", "Num*", &[])
            .build()],
    )
}

/// Accessors overloaded on `const` only.
pub fn const_overloads() -> DeclTree {
    namespace_tree(
        "n",
        vec![ClassFixture::new("C", "n::C")
            .method("get", "int", &[])
            .const_method("get", "int", &[])
            .method("at", "int&", &[("i", "int")])
            .const_method("at", "const int&", &[("i", "int")])
            .build()],
    )
}

/// `(field, type)` pairs of every scalar kind a field can carry.
pub const SCALAR_FIELDS: &[(&str, &str)] = &[
    ("flag", "bool"),
    ("i8", "int8_t"),
    ("u8", "uint8_t"),
    ("i16", "int16_t"),
    ("u16", "uint16_t"),
    ("i32", "int32_t"),
    ("u32", "uint32_t"),
    ("i64", "int64_t"),
    ("u64", "uint64_t"),
    ("f", "float"),
    ("d", "double"),
    ("c", "char"),
    ("ll", "long long"),
];

/// `n::Scalars` with one field per [`SCALAR_FIELDS`] entry.
pub fn scalar_fields() -> DeclTree {
    let class = SCALAR_FIELDS
        .iter()
        .fold(ClassFixture::new("Scalars", "n::Scalars"), |class, (name, ty)| {
            class.field(name, ty)
        });
    namespace_tree("n", vec![class.build()])
}

/// Resolve every non-std class of `tree` under `policy`.
pub fn resolved(tree: DeclTree, policy: ReferencePolicy) -> ResolvedTree {
    let provider = IndexedDeclarations::new(tree);
    let initial = provider.find_classes(&Filter::Default);
    resolve_all(
        &initial,
        &provider,
        &ResolveOptions::new(policy),
        &mut Namer::new(),
    )
    .expect("fixture resolves")
}

/// The resolved [`scenario`] tree.
pub fn resolved_scenario() -> ResolvedTree {
    resolved(scenario(), ReferencePolicy::IgnoreMissing)
}

/// Header text equivalent to [`test_lib`], for scanner-driven tests.
pub const TEST_LIB_HEADER: &str = r#"#pragma once
#include <string>

namespace TestLib {

class OtherClass;

class TestClass {
public:
    bool b;
    long l;

    long sum();
    TestClass operator-(TestClass other);
    OtherClass* getOther();
    void setOther(OtherClass* other);
};

class OtherClass {
public:
    int value;
    std::string name();
};

}  // namespace TestLib
"#;

/// Minimal `Shimsmith.toml` for a module named `name`.
pub fn minimal_config(name: &str) -> String {
    format!(
        r#"[module]
name = "{name}"
package = "com.example.{name}"
headers = ["include/*.h"]

[policy]
reference = "include-missing"
error = "log"
"#
    )
}
