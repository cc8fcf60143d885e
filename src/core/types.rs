//! C++ type model.
//!
//! Types are a closed set of variants. Two types are the same type when their
//! canonical spellings match, and the canonical spelling is also the key the
//! resolver uses to look classes up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in scalar spellings, in canonical form.
pub const NATIVE_TYPES: &[&str] = &[
    "void",
    "bool",
    "char",
    "signed char",
    "unsigned char",
    "short",
    "unsigned short",
    "int",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "float",
    "double",
    "long double",
    "size_t",
    "int8_t",
    "int16_t",
    "int32_t",
    "int64_t",
    "uint8_t",
    "uint16_t",
    "uint32_t",
    "uint64_t",
];

/// Spelling of the standard string class.
pub const STD_STRING: &str = "std::string";

/// A C++ type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CppType {
    /// Built-in scalar or `void`.
    Native(String),
    Pointer(Box<CppType>),
    Reference(Box<CppType>),
    Array(Box<CppType>, Option<usize>),
    /// cv-qualified type.
    Modified {
        base: Box<CppType>,
        is_const: bool,
        is_volatile: bool,
    },
    /// Named type that has not been matched to a class yet.
    TypeReference(String),
    /// Template instantiation such as `std::vector<int>`.
    Template { base: String, args: Vec<CppType> },
}

impl CppType {
    pub fn native(name: &str) -> Self {
        CppType::Native(normalize_native(name).unwrap_or(name).to_string())
    }

    pub fn named(name: impl Into<String>) -> Self {
        CppType::TypeReference(name.into())
    }

    pub fn void() -> Self {
        CppType::Native("void".to_string())
    }

    pub fn void_ptr() -> Self {
        CppType::pointer(CppType::void())
    }

    pub fn pointer(pointee: CppType) -> Self {
        CppType::Pointer(Box::new(pointee))
    }

    pub fn reference(referent: CppType) -> Self {
        CppType::Reference(Box::new(referent))
    }

    pub fn constant(base: CppType) -> Self {
        CppType::Modified {
            base: Box::new(base),
            is_const: true,
            is_volatile: false,
        }
    }

    /// Parse a written C++ type.
    ///
    /// Whitespace is collapsed first, so `const  char *` and `const char*`
    /// produce the same type.
    pub fn parse(s: &str) -> Self {
        let collapsed = collapse_whitespace(s);
        let s = collapsed.as_str();

        // East const: `int* const`
        if let Some(inner) = s.strip_suffix(" const") {
            return CppType::constant(CppType::parse(inner));
        }
        if let Some(inner) = s.strip_suffix(" volatile") {
            return CppType::parse(inner).with_volatile();
        }

        if s.ends_with(']') {
            if let Some(open) = s.rfind('[') {
                let len = s[open + 1..s.len() - 1].trim().parse().ok();
                return CppType::Array(Box::new(CppType::parse(&s[..open])), len);
            }
        }

        // Rvalue references are treated as plain references.
        if let Some(inner) = s.strip_suffix("&&") {
            return CppType::reference(CppType::parse(inner));
        }
        if let Some(inner) = s.strip_suffix('&') {
            return CppType::reference(CppType::parse(inner));
        }
        if let Some(inner) = s.strip_suffix('*') {
            return CppType::pointer(CppType::parse(inner));
        }

        if let Some(inner) = s.strip_prefix("const ") {
            return CppType::constant(CppType::parse(inner));
        }
        if let Some(inner) = s.strip_prefix("volatile ") {
            return CppType::parse(inner).with_volatile();
        }

        let s = ["struct ", "class ", "enum ", "typename "]
            .iter()
            .find_map(|kw| s.strip_prefix(kw))
            .unwrap_or(s)
            .trim();

        if let Some(native) = normalize_native(s) {
            return CppType::Native(native.to_string());
        }

        if s.ends_with('>') {
            if let Some(open) = s.find('<') {
                let args = split_template_args(&s[open + 1..s.len() - 1])
                    .into_iter()
                    .map(CppType::parse)
                    .collect();
                return CppType::Template {
                    base: s[..open].trim().to_string(),
                    args,
                };
            }
        }

        CppType::TypeReference(s.to_string())
    }

    fn with_volatile(self) -> Self {
        match self {
            CppType::Modified { base, is_const, .. } => CppType::Modified {
                base,
                is_const,
                is_volatile: true,
            },
            other => CppType::Modified {
                base: Box::new(other),
                is_const: false,
                is_volatile: true,
            },
        }
    }

    /// Canonical spelling.
    pub fn spelling(&self) -> String {
        self.to_string()
    }

    /// The type with outer cv-qualifiers removed.
    pub fn unqualified(&self) -> &CppType {
        match self {
            CppType::Modified { base, .. } => base.unqualified(),
            other => other,
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self, CppType::Modified { is_const: true, .. })
    }

    pub fn is_native(&self) -> bool {
        matches!(self.unqualified(), CppType::Native(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.unqualified(), CppType::Native(n) if n == "void")
    }

    pub fn is_long_double(&self) -> bool {
        matches!(self.unqualified(), CppType::Native(n) if n == "long double")
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.unqualified(), CppType::Pointer(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.unqualified(), CppType::Reference(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.unqualified(), CppType::Array(..))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.unqualified(), CppType::TypeReference(n) if n == STD_STRING)
    }

    /// `const char*`, the C spelling of a string.
    pub fn is_c_string(&self) -> bool {
        match self.unqualified() {
            CppType::Pointer(inner) => {
                inner.is_const() && matches!(inner.unqualified(), CppType::Native(n) if n == "char")
            }
            _ => false,
        }
    }

    /// Target of a pointer, if this is one.
    pub fn pointee(&self) -> Option<&CppType> {
        match self.unqualified() {
            CppType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Target of a reference, if this is one.
    pub fn referent(&self) -> Option<&CppType> {
        match self.unqualified() {
            CppType::Reference(inner) => Some(inner),
            _ => None,
        }
    }

    /// The type with one level of reference removed.
    pub fn dereferenced(&self) -> &CppType {
        self.referent().unwrap_or(self)
    }

    /// The innermost named or native type, under every pointer, reference,
    /// array and qualifier.
    pub fn innermost(&self) -> &CppType {
        match self {
            CppType::Pointer(inner) | CppType::Reference(inner) | CppType::Array(inner, _) => {
                inner.innermost()
            }
            CppType::Modified { base, .. } => base.innermost(),
            other => other,
        }
    }
}

impl fmt::Display for CppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CppType::Native(name) | CppType::TypeReference(name) => write!(f, "{}", name),
            CppType::Pointer(inner) => write!(f, "{}*", inner),
            CppType::Reference(inner) => write!(f, "{}&", inner),
            CppType::Array(inner, Some(len)) => write!(f, "{}[{}]", inner, len),
            CppType::Array(inner, None) => write!(f, "{}[]", inner),
            CppType::Modified {
                base,
                is_const,
                is_volatile,
            } => {
                let mut quals = Vec::new();
                if *is_const {
                    quals.push("const");
                }
                if *is_volatile {
                    quals.push("volatile");
                }
                let quals = quals.join(" ");
                if base.is_pointer() || base.is_reference() {
                    write!(f, "{} {}", base, quals)
                } else {
                    write!(f, "{} {}", quals, base)
                }
            }
            CppType::Template { base, args } => {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}<{}>", base, args.join(", "))
            }
        }
    }
}

impl From<String> for CppType {
    fn from(s: String) -> Self {
        CppType::parse(&s)
    }
}

impl From<&str> for CppType {
    fn from(s: &str) -> Self {
        CppType::parse(s)
    }
}

impl From<CppType> for String {
    fn from(ty: CppType) -> Self {
        ty.to_string()
    }
}

fn collapse_whitespace(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join(" ");
    // `int *` and `int*` are the same type.
    joined
        .replace(" *", "*")
        .replace(" &", "&")
        .replace(" [", "[")
        .replace("< ", "<")
        .replace(" >", ">")
}

/// Map alternative spellings of scalars onto the canonical ones.
fn normalize_native(s: &str) -> Option<&'static str> {
    let canonical = match s {
        "_Bool" => "bool",
        "signed" | "signed int" => "int",
        "unsigned" => "unsigned int",
        "short int" | "signed short" | "signed short int" => "short",
        "unsigned short int" => "unsigned short",
        "long int" | "signed long" | "signed long int" => "long",
        "unsigned long int" => "unsigned long",
        "long long int" | "signed long long" => "long long",
        "unsigned long long int" => "unsigned long long",
        "std::size_t" => "size_t",
        other => return NATIVE_TYPES.iter().find(|n| **n == other).copied(),
    };
    Some(canonical)
}

/// Split template arguments on top-level commas.
fn split_template_args(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = s[start..].trim();
    if !last.is_empty() {
        out.push(last);
    }
    out
}
