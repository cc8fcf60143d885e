//! C symbol naming.
//!
//! Every C function the shim exports gets its name from a [`Namer`]. The
//! namer owns the module-wide set of allocated names, so two members can
//! never end up with the same symbol: a colliding name is prefixed with `_`
//! until it is free. Names are memoized per class and member, which keeps
//! repeated lookups for the same member stable.

use std::collections::{HashMap, HashSet};

use super::operators::Operator;
use super::resolved::MethodType;

/// Identity of a named class member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberKey {
    Method {
        method_type: MethodType,
        name: String,
        args: Vec<String>,
        is_const: bool,
    },
    FieldGetter(String),
    FieldSetter(String),
}

/// Allocator for unique C symbol names within one generated module.
#[derive(Debug, Default)]
pub struct Namer {
    allocated: HashSet<String>,
    memo: HashMap<(String, MemberKey), String>,
}

impl Namer {
    pub fn new() -> Self {
        Self::default()
    }

    /// C-safe identifier for a class, derived from its type spelling.
    pub fn canonical_name(class_spelling: &str) -> String {
        class_spelling
            .replace("::", "_")
            .replace('<', "_")
            .replace(',', "__")
            .replace('>', "")
            .replace('*', "_P")
            .replace('&', "_R")
            .replace(' ', "_")
    }

    /// Unique name for a method of `class_spelling`.
    ///
    /// `args` are the spellings of the declared arguments; together with
    /// `is_const` they tell overloads apart in the memo. `args` also selects
    /// the operator arity.
    pub fn unique_method_name(
        &mut self,
        class_spelling: &str,
        method_type: MethodType,
        name: &str,
        args: &[String],
        is_const: bool,
    ) -> String {
        let key = MemberKey::Method {
            method_type,
            name: name.to_string(),
            args: args.to_vec(),
            is_const,
        };
        if let Some(existing) = self.memo.get(&(class_spelling.to_string(), key.clone())) {
            return existing.clone();
        }

        let cls = Self::canonical_name(class_spelling);
        let candidate = match method_type {
            MethodType::Constructor => format!("{}_new", cls),
            MethodType::Destructor => format!("{}_dispose", cls),
            MethodType::SizeOf => format!("{}_size_of", cls),
            MethodType::Method | MethodType::Static | MethodType::StaticOp => {
                match Operator::from_method(name, args.len()) {
                    Some(op) => format!("{}_op_{}", cls, op.c_word()),
                    None => format!("{}_{}", cls, snake_case(name)),
                }
            }
        };
        let unique = self.uniqify(&candidate);
        self.memo
            .insert((class_spelling.to_string(), key), unique.clone());
        unique
    }

    /// Unique getter name for a field.
    pub fn unique_field_getter(&mut self, class_spelling: &str, field: &str) -> String {
        self.memoized(
            class_spelling,
            MemberKey::FieldGetter(field.to_string()),
            |cls| format!("{}_{}_get", cls, field),
        )
    }

    /// Unique setter name for a field.
    pub fn unique_field_setter(&mut self, class_spelling: &str, field: &str) -> String {
        self.memoized(
            class_spelling,
            MemberKey::FieldSetter(field.to_string()),
            |cls| format!("{}_{}_set", cls, field),
        )
    }

    /// Allocate `name`, prefixing `_` until it is unused.
    pub fn uniqify(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        while !self.allocated.insert(candidate.clone()) {
            candidate = format!("_{}", candidate);
        }
        candidate
    }

    pub fn is_allocated(&self, name: &str) -> bool {
        self.allocated.contains(name)
    }

    /// Number of names handed out so far.
    pub fn len(&self) -> usize {
        self.allocated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocated.is_empty()
    }

    fn memoized(
        &mut self,
        class_spelling: &str,
        key: MemberKey,
        make: impl FnOnce(&str) -> String,
    ) -> String {
        let memo_key = (class_spelling.to_string(), key);
        if let Some(existing) = self.memo.get(&memo_key) {
            return existing.clone();
        }
        let candidate = make(&Self::canonical_name(class_spelling));
        let unique = self.uniqify(&candidate);
        self.memo.insert(memo_key, unique.clone());
        unique
    }
}

/// Split an identifier on camel-case boundaries.
///
/// Splits between a lowercase and an uppercase letter, and before an
/// uppercase letter that starts a new capitalized word (`HTTPResponse`
/// becomes `HTTP`, `Response`).
pub fn split_camelcase(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_uppercase() && next_lower);
            if boundary && !current.is_empty() {
                parts.push(std::mem::take(&mut current));
            }
        }
        current.push(*c);
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// `getValueAt` becomes `get_value_at`.
pub fn snake_case(s: &str) -> String {
    split_camelcase(s)
        .iter()
        .map(|p| p.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
        .replace('=', "_eq")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_substitutions() {
        assert_eq!(Namer::canonical_name("ns::TestClass"), "ns_TestClass");
        assert_eq!(
            Namer::canonical_name("std::map<int, Foo*>"),
            "std_map_int___Foo_P"
        );
        assert_eq!(Namer::canonical_name("Foo&"), "Foo_R");
    }

    #[test]
    fn test_method_kinds() {
        let mut namer = Namer::new();
        assert_eq!(
            namer.unique_method_name("TestClass", MethodType::Constructor, "TestClass", &[], false),
            "TestClass_new"
        );
        assert_eq!(
            namer.unique_method_name("TestClass", MethodType::Destructor, "~TestClass", &[], false),
            "TestClass_dispose"
        );
        assert_eq!(
            namer.unique_method_name("TestClass", MethodType::SizeOf, "size_of", &[], false),
            "TestClass_size_of"
        );
        assert_eq!(
            namer.unique_method_name("TestClass", MethodType::Method, "getValueAt", &[], false),
            "TestClass_get_value_at"
        );
    }

    #[test]
    fn test_operator_names() {
        let mut namer = Namer::new();
        let args = vec!["TestClass".to_string()];
        assert_eq!(
            namer.unique_method_name("TestClass", MethodType::Method, "operator-", &args, false),
            "TestClass_op_minus"
        );
        assert_eq!(
            namer.unique_method_name("TestClass", MethodType::Method, "operator-", &[], false),
            "TestClass_op_unary_minus"
        );
    }

    #[test]
    fn test_overloads_get_distinct_names() {
        let mut namer = Namer::new();
        let names: Vec<String> = ["int", "long", "double"]
            .iter()
            .map(|arg| {
                namer.unique_method_name(
                    "TestClass",
                    MethodType::Method,
                    "set",
                    &[arg.to_string()],
                    false,
                )
            })
            .collect();
        assert_eq!(names, vec!["TestClass_set", "_TestClass_set", "__TestClass_set"]);
        for name in &names {
            assert!(name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_'));
        }
    }

    #[test]
    fn test_const_overloads_get_distinct_names() {
        let mut namer = Namer::new();
        let int_arg = vec!["int".to_string()];
        let names = vec![
            namer.unique_method_name("C", MethodType::Method, "get", &[], false),
            namer.unique_method_name("C", MethodType::Method, "get", &[], true),
            namer.unique_method_name("C", MethodType::Method, "at", &int_arg, false),
            namer.unique_method_name("C", MethodType::Method, "at", &int_arg, true),
        ];
        assert_eq!(names, vec!["C_get", "_C_get", "C_at", "_C_at"]);
        assert_eq!(
            namer.unique_method_name("C", MethodType::Method, "get", &[], true),
            "_C_get"
        );
    }

    #[test]
    fn test_lookup_is_memoized() {
        let mut namer = Namer::new();
        let first = namer.unique_method_name("A", MethodType::Method, "run", &[], false);
        let again = namer.unique_method_name("A", MethodType::Method, "run", &[], false);
        assert_eq!(first, again);
        assert_eq!(namer.len(), 1);
    }

    #[test]
    fn test_field_accessors() {
        let mut namer = Namer::new();
        assert_eq!(namer.unique_field_getter("TestClass", "b"), "TestClass_b_get");
        assert_eq!(namer.unique_field_setter("TestClass", "b"), "TestClass_b_set");
        assert_eq!(namer.unique_field_getter("TestClass", "b"), "TestClass_b_get");
    }

    #[test]
    fn test_field_and_method_collision() {
        let mut namer = Namer::new();
        let getter = namer.unique_field_getter("A", "x");
        let method = namer.unique_method_name("A", MethodType::Method, "x_get", &[], false);
        assert_eq!(getter, "A_x_get");
        assert_eq!(method, "_A_x_get");
    }

    #[test]
    fn test_split_camelcase() {
        assert_eq!(split_camelcase("TestLib"), vec!["Test", "Lib"]);
        assert_eq!(
            split_camelcase("getHTTPResponse"),
            vec!["get", "HTTP", "Response"]
        );
        assert_eq!(split_camelcase("simple"), vec!["simple"]);
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("sum"), "sum");
        assert_eq!(snake_case("setValue"), "set_value");
        assert_eq!(snake_case("operator="), "operator_eq");
    }
}
