//! Resolved tree, the output side of resolution.
//!
//! Every type in a resolved tree is concrete: it either names a class that is
//! part of the generated module, a native/pointer/void terminal, or an
//! opaque pointer. Methods carry their ABI shape (method type, return style
//! and unique C name) so writers never re-derive it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::operators::Operator;
use super::tree::{NodeId, Tree};
use super::types::CppType;

/// Shape of a generated C function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodType {
    Constructor,
    Destructor,
    Method,
    StaticOp,
    Static,
    SizeOf,
}

/// How a return value crosses the C boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStyle {
    Void,
    /// Pointer returned as `void*`.
    VoidP,
    /// Reference returned as the address of the result.
    VoidPReference,
    /// Written through an appended `ret_value` pointer; the function is void.
    ArgCast,
    /// Copied into a heap `char` buffer the caller frees.
    String,
    StringPointer,
    /// Copied into a heap allocation with the copy constructor.
    CopyConstructor,
    Return,
    ReturnReference,
}

/// How a C-side value is converted back to its C++ type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastMethod {
    /// Used as is.
    Native,
    /// `std::string(x)`.
    String,
    /// Pointer to a `std::string`, carried as `const char*`.
    PointedString,
    /// `reinterpret_cast<T*>(x)`.
    Cast,
    /// C-style `(T)x`, used for `long double` carried as `double`.
    Raw,
}

/// A Kotlin type reference.
///
/// `segments` is the fully-qualified path. Package segments are rendered with
/// their first letter lower-cased, which maps `Outer::Inner` namespaces onto
/// `outer.inner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KotlinType {
    pub segments: Vec<String>,
    /// A generated wrapper class rather than a library type.
    pub is_wrapper: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<KotlinType>,
    #[serde(default)]
    pub nullable: bool,
}

impl KotlinType {
    /// Build from a dotted name such as `kotlinx.cinterop.COpaquePointer`.
    pub fn new(fully_qualified: &str, is_wrapper: bool) -> Self {
        let trimmed = fully_qualified.trim_end_matches('?');
        KotlinType {
            segments: trimmed.split('.').map(str::to_string).collect(),
            is_wrapper,
            templates: Vec::new(),
            nullable: fully_qualified.ends_with('?'),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn non_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_templates(mut self, templates: Vec<KotlinType>) -> Self {
        self.templates = templates;
        self
    }

    /// Last path segment.
    pub fn simple_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Dotted package, empty for unqualified names.
    pub fn pkg(&self) -> String {
        let n = self.segments.len().saturating_sub(1);
        self.segments[..n]
            .iter()
            .map(|s| decapitalize(s))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn fully_qualified(&self) -> String {
        let pkg = self.pkg();
        if pkg.is_empty() {
            self.simple_name().to_string()
        } else {
            format!("{}.{}", pkg, self.simple_name())
        }
    }

    /// Fully-qualified names this type refers to, templates included.
    pub fn fq_names(&self) -> Vec<String> {
        let mut names = vec![self.fully_qualified()];
        for t in &self.templates {
            names.extend(t.fq_names());
        }
        names
    }

    /// Source text, using `remap` for names that were shortened or aliased.
    pub fn render(&self, remap: &HashMap<String, String>) -> String {
        let fq = self.fully_qualified();
        let base = remap
            .get(&fq)
            .cloned()
            .unwrap_or_else(|| self.simple_name().to_string());
        let mut out = base;
        if !self.templates.is_empty() {
            let args: Vec<String> = self.templates.iter().map(|t| t.render(remap)).collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
        if self.nullable {
            out.push('?');
        }
        out
    }
}

impl fmt::Display for KotlinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(&HashMap::new()))
    }
}

fn decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A fully-resolved type, with its C and Kotlin projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedType {
    /// C++ spelling as used in the shim body.
    pub cpp: CppType,
    /// Type used in the C signature.
    pub c_type: CppType,
    /// Kotlin projection, absent when the type has no managed mapping.
    pub kotlin: Option<KotlinType>,
    pub cast: CastMethod,
    /// Spelling of the generated class this type refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<String>,
}

impl ResolvedType {
    pub fn is_void(&self) -> bool {
        self.cpp.is_void()
    }

    pub fn is_wrapper(&self) -> bool {
        self.class_ref.is_some()
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cpp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedClass {
    pub name: String,
    /// Canonical C++ spelling, the class's identity in the module.
    pub spelling: String,
    /// The class by value.
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    /// Prefix of every C symbol generated for this class.
    pub c_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMethod {
    pub name: String,
    pub method_type: MethodType,
    pub return_type: ResolvedType,
    pub return_style: ReturnStyle,
    pub c_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    /// Spelling of the declaring class.
    pub qualified: String,
    #[serde(default)]
    pub is_copy_constructor: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArgument {
    pub name: String,
    /// Type as seen by the C++ callee.
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    /// Type in the C signature.
    pub signature_type: ResolvedType,
    /// The C value is a pointer that must be dereferenced before the call.
    pub needs_dereference: bool,
    #[serde(default)]
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGetter {
    pub c_name: String,
    pub return_style: ReturnStyle,
    pub return_type: ResolvedType,
    pub args: Vec<ResolvedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSetter {
    pub c_name: String,
    pub args: Vec<ResolvedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    pub is_const: bool,
    pub getter: FieldGetter,
    pub setter: FieldSetter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBase {
    #[serde(rename = "type")]
    pub ty: ResolvedType,
}

/// One node of the resolved tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolved {
    /// Synthetic root.
    Module,
    Class(ResolvedClass),
    Method(ResolvedMethod),
    Field(ResolvedField),
    Argument(ResolvedArgument),
    Base(ResolvedBase),
}

impl Resolved {
    pub fn name(&self) -> Option<&str> {
        match self {
            Resolved::Module | Resolved::Base(_) => None,
            Resolved::Class(c) => Some(&c.name),
            Resolved::Method(m) => Some(&m.name),
            Resolved::Field(f) => Some(&f.name),
            Resolved::Argument(a) => Some(&a.name),
        }
    }

    pub fn as_class(&self) -> Option<&ResolvedClass> {
        match self {
            Resolved::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&ResolvedMethod> {
        match self {
            Resolved::Method(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Module => write!(f, "module"),
            Resolved::Class(c) => write!(f, "class {}", c.spelling),
            Resolved::Method(m) => write!(f, "{}::{}: {}", m.qualified, m.name, m.return_type),
            Resolved::Field(fd) => write!(f, "field {}: {}", fd.name, fd.ty),
            Resolved::Argument(a) => write!(f, "{}: {}", a.name, a.ty),
            Resolved::Base(b) => write!(f, "base {}", b.ty),
        }
    }
}

/// Resolved tree rooted at a module node.
pub type ResolvedTree = Tree<Resolved>;

/// Create an empty resolved tree.
pub fn new_resolved_tree() -> ResolvedTree {
    Tree::new(Resolved::Module)
}

/// Attached classes, in tree order.
pub fn classes(tree: &ResolvedTree) -> Vec<NodeId> {
    tree.preorder()
        .into_iter()
        .filter(|id| matches!(tree.get(*id), Resolved::Class(_)))
        .collect()
}

/// Children of `id` that are methods.
pub fn methods(tree: &ResolvedTree, id: NodeId) -> Vec<&ResolvedMethod> {
    tree.children(id)
        .iter()
        .filter_map(|c| tree.get(*c).as_method())
        .collect()
}

/// Children of `id` that are fields.
pub fn fields(tree: &ResolvedTree, id: NodeId) -> Vec<&ResolvedField> {
    tree.children(id)
        .iter()
        .filter_map(|c| match tree.get(*c) {
            Resolved::Field(f) => Some(f),
            _ => None,
        })
        .collect()
}

/// Arguments of a method node, in order.
pub fn arguments(tree: &ResolvedTree, method: NodeId) -> Vec<&ResolvedArgument> {
    tree.children(method)
        .iter()
        .filter_map(|c| match tree.get(*c) {
            Resolved::Argument(a) => Some(a),
            _ => None,
        })
        .collect()
}

/// Base classes of a class node.
pub fn bases(tree: &ResolvedTree, id: NodeId) -> Vec<&ResolvedBase> {
    tree.children(id)
        .iter()
        .filter_map(|c| match tree.get(*c) {
            Resolved::Base(b) => Some(b),
            _ => None,
        })
        .collect()
}

/// Find an attached class by spelling.
pub fn find_class(tree: &ResolvedTree, spelling: &str) -> Option<NodeId> {
    classes(tree)
        .into_iter()
        .find(|id| matches!(tree.get(*id), Resolved::Class(c) if c.spelling == spelling))
}

/// Render the tree as nested JSON.
pub fn to_json(tree: &ResolvedTree) -> serde_json::Value {
    fn node(tree: &ResolvedTree, id: NodeId) -> serde_json::Value {
        let mut value = serde_json::to_value(tree.get(id)).unwrap_or(serde_json::Value::Null);
        let children: Vec<_> = tree.children(id).iter().map(|c| node(tree, *c)).collect();
        if let serde_json::Value::Object(ref mut map) = value {
            if !children.is_empty() {
                map.insert("children".to_string(), serde_json::Value::Array(children));
            }
        }
        value
    }
    node(tree, tree.root())
}

/// Render the tree as indented text, one element per line.
pub fn to_text(tree: &ResolvedTree) -> String {
    let mut out = String::new();
    fn walk(tree: &ResolvedTree, id: NodeId, depth: usize, out: &mut String) {
        for child in tree.children(id) {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&tree.get(*child).to_string());
            out.push('\n');
            walk(tree, *child, depth + 1, out);
        }
    }
    walk(tree, tree.root(), 0, &mut out);
    out
}
