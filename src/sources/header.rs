//! C++ header scanner.
//!
//! Extracts namespaces, classes and their public members from C++ headers.
//! This is not a C++ parser: it understands the declarations that typically
//! appear in headers meant to be wrapped (plain classes, overloads,
//! operators, default arguments, simple templates) and skips anything else.
//! Preprocessor directives are dropped, not evaluated.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::{debug, trace};

use crate::core::decl::{
    new_decl_tree, ArgumentDecl, BaseDecl, ClassDecl, Decl, DeclTree, FieldDecl, MethodDecl,
    MethodKind, TemplateDecl, TypedefDecl,
};
use crate::core::tree::{Detached, NodeId};
use crate::core::types::CppType;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").expect("valid regex"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//[^\n]*").expect("valid regex"));
static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#(?:[^\n]*\\\n)*[^\n]*").expect("valid regex"));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[[^\]]*\]\]|__attribute__\s*\(\([^)]*\)\)|alignas\s*\([^)]*\)")
        .expect("valid regex")
});
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NAMESPACE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:inline\s+)?namespace(?:\s+([\w:]+))?$").expect("valid regex")
});
static USING_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^using\s+(\w+)\s*=\s*(.+)$").expect("valid regex"));
static TEMPLATE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^template\s*<(.*)>\s*(?:class|struct)\s+(?:\w+\s+)*?(\w+)\s*(?:final)?\s*(?::.*)?$")
        .expect("valid regex")
});
static TRAILING_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(~?[A-Za-z_]\w*)\s*$").expect("valid regex"));

/// Words that end a type rather than name a declarator.
const TYPE_WORDS: &[&str] = &[
    "int", "long", "short", "char", "double", "float", "bool", "signed", "unsigned", "void",
    "const", "volatile",
];

/// Leading specifiers that do not affect the wrapped signature.
const SPECIFIERS: &[&str] = &["virtual", "inline", "explicit", "constexpr", "extern"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Protected,
    Private,
}

/// A top-level piece of text: everything up to a `;` or a braced body.
#[derive(Debug)]
struct Statement<'a> {
    head: &'a str,
    body: Option<&'a str>,
}

#[derive(Debug)]
struct ParsedMethod {
    name: String,
    kind: MethodKind,
    return_type: CppType,
    args: Vec<ArgumentDecl>,
    is_const: bool,
    is_pure: bool,
    is_deleted: bool,
}

/// Scanner for C++ header files.
#[derive(Debug, Clone, Default)]
pub struct HeaderParser {
    /// Tokens removed before scanning (export macros and the like).
    ignored_macros: Vec<String>,
}

impl HeaderParser {
    /// Create a new header parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set macros to strip before scanning, e.g. `MYLIB_EXPORT`.
    pub fn with_ignored_macros(mut self, macros: Vec<String>) -> Self {
        self.ignored_macros = macros;
        self
    }

    /// Parse a single header file.
    pub fn parse_file(&self, path: &Path) -> Result<DeclTree> {
        self.parse_files(&[path.to_path_buf()])
    }

    /// Parse several headers into one declaration tree.
    pub fn parse_files(&self, paths: &[PathBuf]) -> Result<DeclTree> {
        let mut tree = new_decl_tree();
        for path in paths {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read header: {}", path.display()))?;
            self.parse_into(&mut tree, &content)
                .with_context(|| format!("failed to scan header: {}", path.display()))?;
        }
        Ok(tree)
    }

    /// Parse header content.
    pub fn parse_content(&self, content: &str, path: &Path) -> Result<DeclTree> {
        let mut tree = new_decl_tree();
        self.parse_into(&mut tree, content)
            .with_context(|| format!("failed to scan header: {}", path.display()))?;
        Ok(tree)
    }

    /// Scan `content` and append its declarations to `tree`.
    pub fn parse_into(&self, tree: &mut DeclTree, content: &str) -> Result<()> {
        let text = self.preprocess(content);
        let root = tree.root();
        self.parse_scope(tree, root, &[], &text)
    }

    /// Remove comments, directives and attributes, then normalize whitespace.
    fn preprocess(&self, content: &str) -> String {
        let content = BLOCK_COMMENT.replace_all(content, " ");
        let content = LINE_COMMENT.replace_all(&content, " ");
        let content = DIRECTIVE.replace_all(&content, " ");
        let mut content = ATTRIBUTE.replace_all(&content, " ").to_string();
        for token in &self.ignored_macros {
            if let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(token))) {
                content = re.replace_all(&content, " ").to_string();
            }
        }
        WHITESPACE.replace_all(&content, " ").trim().to_string()
    }

    fn parse_scope(
        &self,
        tree: &mut DeclTree,
        parent: NodeId,
        namespaces: &[String],
        text: &str,
    ) -> Result<()> {
        for stmt in split_statements(text)? {
            let head = stmt.head.trim();
            if head.is_empty() {
                continue;
            }

            if let Some(caps) = NAMESPACE_HEAD.captures(head) {
                let Some(body) = stmt.body else { continue };
                let Some(name) = caps.get(1) else {
                    // Anonymous namespaces have internal linkage.
                    continue;
                };
                let mut node = parent;
                let mut path = namespaces.to_vec();
                for segment in name.as_str().split("::") {
                    node = namespace_child(tree, node, segment);
                    path.push(segment.to_string());
                }
                self.parse_scope(tree, node, &path, body)?;
                continue;
            }

            if head.starts_with("extern \"C") {
                if let Some(body) = stmt.body {
                    self.parse_scope(tree, parent, namespaces, body)?;
                }
                continue;
            }

            if head.starts_with("template") {
                if let (Some(caps), Some(_)) = (TEMPLATE_CLASS.captures(head), stmt.body) {
                    let name = caps[2].to_string();
                    let params = template_params(&caps[1]);
                    let template = TemplateDecl {
                        qualified: qualify(namespaces, &name),
                        name,
                    };
                    trace!("template {}", template.qualified);
                    tree.add_child(
                        parent,
                        Detached::new(Decl::Template(template)).with_children(
                            params
                                .into_iter()
                                .map(|name| Detached::new(Decl::TemplateParam { name })),
                        ),
                    );
                }
                continue;
            }

            if let Some(keyword) = class_keyword(head) {
                if let Some(body) = stmt.body {
                    self.parse_class(tree, parent, namespaces, keyword, head, body)?;
                }
                continue;
            }

            if let Some(typedef) = parse_typedef(head) {
                tree.add_child(parent, Detached::new(Decl::Typedef(typedef)));
            }
            // Free functions and variables are not wrapped.
        }
        Ok(())
    }

    fn parse_class(
        &self,
        tree: &mut DeclTree,
        parent: NodeId,
        scope: &[String],
        keyword: &str,
        head: &str,
        body: &str,
    ) -> Result<()> {
        let rest = head[keyword.len()..].trim();
        let (name_part, bases_part) = match find_single_colon(rest) {
            Some(pos) => (rest[..pos].trim(), Some(rest[pos + 1..].trim())),
            None => (rest, None),
        };
        let name = name_part
            .split_whitespace()
            .filter(|w| *w != "final")
            .last()
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Ok(());
        }
        let qualified = qualify(scope, &name);
        debug!("found class {}", qualified);

        let default_access = if keyword == "struct" {
            Access::Public
        } else {
            Access::Private
        };

        let class_id = tree.add_child(
            parent,
            Detached::new(Decl::Class(ClassDecl::new(name.clone(), &qualified))),
        );

        if let Some(bases) = bases_part {
            for base in split_top_level(bases, ',') {
                let mut words: Vec<&str> = base.split_whitespace().collect();
                words.retain(|w| *w != "virtual");
                let access = match words.first().copied() {
                    Some("public") => Access::Public,
                    Some("protected") => Access::Protected,
                    Some("private") => Access::Private,
                    _ => default_access,
                };
                words.retain(|w| !matches!(*w, "public" | "protected" | "private"));
                if access == Access::Public && !words.is_empty() {
                    tree.add_child(
                        class_id,
                        Detached::new(Decl::Base(BaseDecl {
                            ty: CppType::parse(&words.join(" ")),
                        })),
                    );
                }
            }
        }

        let mut class_path = scope.to_vec();
        class_path.push(name.clone());
        let mut access = default_access;
        let mut info = ClassDecl::new(name.clone(), &qualified);

        for stmt in split_statements(body)? {
            let head = strip_labels(stmt.head, &mut access);
            if head.is_empty() {
                continue;
            }

            if let Some(nested) = class_keyword(head) {
                if let (Some(nested_body), Access::Public) = (stmt.body, access) {
                    self.parse_class(tree, parent, &class_path, nested, head, nested_body)?;
                }
                continue;
            }

            let first = head.split_whitespace().next().unwrap_or_default();
            if matches!(
                first,
                "friend" | "using" | "static_assert" | "template" | "typedef" | "enum" | "union"
            ) {
                continue;
            }

            if head.contains('(') {
                let Some(method) = parse_method(head, &name) else {
                    trace!("skipping member `{}`", head);
                    continue;
                };

                if method.name.starts_with("operator new") {
                    info.has_hidden_new |= method.is_deleted || access != Access::Public;
                    continue;
                }
                if method.name.starts_with("operator delete") {
                    info.has_hidden_delete |= method.is_deleted || access != Access::Public;
                    continue;
                }
                if method.kind == MethodKind::Constructor {
                    info.has_constructor = true;
                }
                if method.kind == MethodKind::Destructor && access != Access::Public {
                    info.has_hidden_delete = true;
                }
                if method.is_pure {
                    info.is_abstract = true;
                }
                if access != Access::Public || method.is_deleted {
                    continue;
                }

                let decl = MethodDecl {
                    name: method.name,
                    kind: method.kind,
                    return_type: method.return_type,
                    is_const: method.is_const,
                };
                tree.add_child(
                    class_id,
                    Detached::new(Decl::Method(decl)).with_children(
                        method
                            .args
                            .into_iter()
                            .map(|a| Detached::new(Decl::Argument(a))),
                    ),
                );
                continue;
            }

            if access != Access::Public {
                continue;
            }
            for field in parse_fields(head) {
                tree.add_child(class_id, Detached::new(Decl::Field(field)));
            }
        }

        if let Decl::Class(class) = tree.get_mut(class_id) {
            class.is_abstract = info.is_abstract;
            class.has_constructor = info.has_constructor;
            class.has_hidden_new = info.has_hidden_new;
            class.has_hidden_delete = info.has_hidden_delete;
        }
        Ok(())
    }
}

/// Existing namespace child named `name`, or a new one.
fn namespace_child(tree: &mut DeclTree, parent: NodeId, name: &str) -> NodeId {
    let existing = tree
        .children(parent)
        .iter()
        .copied()
        .find(|c| matches!(tree.get(*c), Decl::Namespace { name: n } if n == name));
    match existing {
        Some(id) => id,
        None => tree.add_child(
            parent,
            Detached::new(Decl::Namespace {
                name: name.to_string(),
            }),
        ),
    }
}

fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope.join("::"), name)
    }
}

/// `class` or `struct` when `head` introduces a class.
fn class_keyword(head: &str) -> Option<&'static str> {
    if head.contains('(') {
        return None;
    }
    ["class", "struct"]
        .into_iter()
        .find(|kw| head.strip_prefix(kw).is_some_and(|rest| rest.starts_with(' ')))
}

fn parse_typedef(head: &str) -> Option<TypedefDecl> {
    if head.contains('(') {
        return None;
    }
    if let Some(caps) = USING_ALIAS.captures(head) {
        return Some(TypedefDecl {
            name: caps[1].to_string(),
            target: CppType::parse(&caps[2]),
        });
    }
    let rest = head.strip_prefix("typedef ")?;
    let (ty, name) = split_declarator(rest)?;
    Some(TypedefDecl {
        name,
        target: CppType::parse(&ty),
    })
}

fn template_params(params: &str) -> Vec<String> {
    split_top_level(params, ',')
        .into_iter()
        .filter_map(|p| {
            let decl = split_top_level(p, '=').into_iter().next().unwrap_or(p);
            TRAILING_IDENT
                .captures(decl)
                .map(|c| c[1].to_string())
                .filter(|n| n != "typename" && n != "class")
        })
        .collect()
}

/// Strip `public:`-style labels, tracking the current access.
fn strip_labels<'a>(head: &'a str, access: &mut Access) -> &'a str {
    let mut head = head.trim();
    'outer: loop {
        for (label, level) in [
            ("public", Access::Public),
            ("protected", Access::Protected),
            ("private", Access::Private),
        ] {
            if let Some(rest) = head.strip_prefix(label) {
                let rest = rest.trim_start();
                if rest.starts_with(':') && !rest.starts_with("::") {
                    *access = level;
                    head = rest[1..].trim_start();
                    continue 'outer;
                }
            }
        }
        return head;
    }
}

fn parse_method(head: &str, class_name: &str) -> Option<ParsedMethod> {
    let mut text = head.trim();
    let mut is_static = false;
    loop {
        let word = text.split_whitespace().next().unwrap_or_default();
        if word == "static" {
            is_static = true;
        } else if !SPECIFIERS.contains(&word) {
            break;
        }
        text = text[word.len()..].trim_start();
    }

    let (name, prefix, open) = match find_word(text, "operator") {
        Some(op_pos) => {
            let after = op_pos + "operator".len();
            let rest = &text[after..];
            let offset = rest.len() - rest.trim_start().len();
            let token_start = after + offset;
            let open = if text[token_start..].starts_with("()") {
                text[token_start + 2..].find('(')? + token_start + 2
            } else {
                text[token_start..].find('(')? + token_start
            };
            let token = text[token_start..open].trim();
            let is_word = token.chars().next().is_some_and(|c| c.is_alphabetic());
            if is_word && !token.starts_with("new") && !token.starts_with("delete") {
                // Conversion operators have no wrapped form.
                return None;
            }
            let name = if is_word {
                format!("operator {}", token)
            } else {
                format!("operator{}", token)
            };
            (name, text[..op_pos].trim(), open)
        }
        None => {
            let open = text.find('(')?;
            let caps = TRAILING_IDENT.captures(&text[..open])?;
            let ident = caps.get(1)?;
            (
                ident.as_str().to_string(),
                text[..ident.start()].trim(),
                open,
            )
        }
    };

    let close = matching(text, open, b'(', b')')?;
    let params = &text[open + 1..close];
    let suffix = text[close + 1..].trim();
    let qualifiers = suffix.split('=').next().unwrap_or_default();
    let is_const = qualifiers.split_whitespace().any(|w| w == "const");
    let assigned = suffix
        .split_once('=')
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_default();

    let kind = if name == class_name {
        MethodKind::Constructor
    } else if name.starts_with('~') {
        MethodKind::Destructor
    } else if is_static && name.starts_with("operator") {
        MethodKind::StaticOperator
    } else if is_static {
        MethodKind::Static
    } else {
        MethodKind::InstanceMethod
    };

    let return_type = match kind {
        MethodKind::Constructor | MethodKind::Destructor => CppType::void(),
        _ if prefix.is_empty() => return None,
        _ => {
            let trailing = suffix
                .split_once("->")
                .map(|(_, t)| t.split(['=', '{']).next().unwrap_or_default().trim());
            match trailing {
                Some(t) if prefix == "auto" && !t.is_empty() => CppType::parse(t),
                _ => CppType::parse(prefix),
            }
        }
    };

    Some(ParsedMethod {
        name,
        kind,
        return_type,
        args: parse_params(params)?,
        is_const,
        is_pure: assigned == "0",
        is_deleted: assigned == "delete",
    })
}

/// Parse a parameter list. Variadic lists have no wrapped form.
fn parse_params(params: &str) -> Option<Vec<ArgumentDecl>> {
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return Some(Vec::new());
    }
    let mut args = Vec::new();
    for (index, param) in split_top_level(params, ',').into_iter().enumerate() {
        if param.contains("...") {
            return None;
        }
        let mut parts = split_top_level(param, '=').into_iter();
        let decl = parts.next().unwrap_or_default();
        let has_default = parts.next().is_some();
        let (ty, name) = match split_declarator(decl) {
            Some((ty, name)) => (ty, name),
            None => (decl.to_string(), format!("arg{}", index)),
        };
        let ty = match CppType::parse(&ty) {
            // Array parameters decay to pointers.
            CppType::Array(inner, _) => CppType::Pointer(inner),
            other => other,
        };
        args.push(ArgumentDecl {
            name,
            ty,
            has_default,
        });
    }
    Some(args)
}

fn parse_fields(head: &str) -> Vec<FieldDecl> {
    let mut text = head.trim();
    for word in ["mutable ", "inline "] {
        text = text.strip_prefix(word).unwrap_or(text);
    }
    if text.starts_with("static ") || text.starts_with("constexpr ") {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut base: Option<String> = None;
    for (index, part) in split_top_level(text, ',').into_iter().enumerate() {
        let decl = split_top_level(part, '=').into_iter().next().unwrap_or(part);
        let decl = match find_single_colon(decl) {
            Some(pos) => decl[..pos].trim(),
            None => decl,
        };
        let declarator = if index == 0 {
            decl.to_string()
        } else {
            match &base {
                Some(base) => format!("{} {}", base, decl),
                None => continue,
            }
        };
        let Some((ty, name)) = split_declarator(&declarator) else {
            continue;
        };
        if index == 0 {
            base = Some(ty.trim_end_matches(['*', '&']).trim().to_string());
        }
        fields.push(FieldDecl {
            name,
            ty: CppType::parse(&ty),
        });
    }
    fields
}

/// Split `type name[N]` into `("type[N]", "name")`.
fn split_declarator(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let (text, array) = match text.find('[') {
        Some(pos) if text.ends_with(']') => (text[..pos].trim(), &text[pos..]),
        _ => (text, ""),
    };
    let caps = TRAILING_IDENT.captures(text)?;
    let ident = caps.get(1)?;
    let prefix = text[..ident.start()].trim();
    if prefix.is_empty()
        || prefix.ends_with("::")
        || TYPE_WORDS.contains(&ident.as_str())
        || prefix.ends_with(',')
    {
        return None;
    }
    Some((format!("{}{}", prefix, array), ident.as_str().to_string()))
}

/// Byte offset of `word` as a whole word.
fn find_word(text: &str, word: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(pos) = text[start..].find(word) {
        let at = start + pos;
        let before_ok = at == 0 || !is_ident_byte(bytes[at - 1]);
        let end = at + word.len();
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return Some(at);
        }
        start = end;
    }
    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Position of a `:` that is not part of `::`, outside brackets.
fn find_single_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'<' | b'(' => depth += 1,
            b'>' | b')' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                let prev = i > 0 && bytes[i - 1] == b':';
                let next = bytes.get(i + 1) == Some(&b':');
                if !prev && !next {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside of `<>`, `()`, `[]` and `{}`.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                // `==`, `<=` and friends are not separators.
                let next = text[i + c.len_utf8()..].chars().next();
                let prev = text[..i].chars().last();
                if sep == '=' && (next == Some('=') || matches!(prev, Some('<' | '>' | '!' | '='))) {
                    continue;
                }
                out.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !out.is_empty() {
        out.push(last);
    }
    out
}

/// Index of the bracket closing the one at `open`.
fn matching(text: &str, open: usize, open_b: u8, close_b: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text.as_bytes().iter().enumerate().skip(open) {
        if *b == open_b {
            depth += 1;
        } else if *b == close_b {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Split text into statements at `;` and braced bodies.
fn split_statements(text: &str) -> Result<Vec<Statement<'_>>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut paren = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => paren += 1,
            b')' => paren = paren.saturating_sub(1),
            b';' if paren == 0 => {
                out.push(Statement {
                    head: &text[start..i],
                    body: None,
                });
                start = i + 1;
            }
            b'}' if paren == 0 => {
                bail!("unmatched `}}` near `{}`", snippet(&text[start..=i]));
            }
            b'{' if paren == 0 => {
                let Some(close) = matching(text, i, b'{', b'}') else {
                    bail!("unbalanced braces near `{}`", snippet(&text[start..]));
                };
                let head = text[start..i].trim();
                let mut body = &text[i + 1..close];
                i = close + 1;

                let is_scope = NAMESPACE_HEAD.is_match(head) || head.starts_with("extern \"C");
                if is_scope {
                    // Namespaces end at their closing brace.
                } else if head.contains('(') && class_keyword(head).is_none() {
                    // Function body, possibly after a constructor initializer list.
                    loop {
                        let j = skip_ws(bytes, i);
                        match bytes.get(j) {
                            Some(b',') => {
                                let Some(next) = text[j..].find('{').map(|p| p + j) else {
                                    break;
                                };
                                let Some(end) = matching(text, next, b'{', b'}') else {
                                    bail!("unbalanced braces near `{}`", snippet(head));
                                };
                                body = &text[next + 1..end];
                                i = end + 1;
                            }
                            Some(b'{') => {
                                let Some(end) = matching(text, j, b'{', b'}') else {
                                    bail!("unbalanced braces near `{}`", snippet(head));
                                };
                                body = &text[j + 1..end];
                                i = end + 1;
                            }
                            Some(b';') => {
                                i = j + 1;
                                break;
                            }
                            _ => break,
                        }
                    }
                } else {
                    // Type definitions and brace initializers run to the `;`.
                    match text[i..].find(';') {
                        Some(p) => i += p + 1,
                        None => i = bytes.len(),
                    }
                }

                out.push(Statement {
                    head,
                    body: Some(body),
                });
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(Statement {
            head: rest,
            body: None,
        });
    }
    Ok(out)
}

fn snippet(text: &str) -> String {
    text.trim().chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decl::{arguments, classes};

    fn parse(content: &str) -> DeclTree {
        HeaderParser::new()
            .parse_content(content, Path::new("test.h"))
            .unwrap()
    }

    fn class<'a>(tree: &'a DeclTree, qualified: &str) -> (NodeId, &'a ClassDecl) {
        classes(tree)
            .into_iter()
            .find_map(|id| match tree.get(id) {
                Decl::Class(c) if c.spelling() == qualified => Some((id, c)),
                _ => None,
            })
            .unwrap()
    }

    fn methods(tree: &DeclTree, id: NodeId) -> Vec<(NodeId, MethodDecl)> {
        tree.children(id)
            .iter()
            .filter_map(|c| match tree.get(*c) {
                Decl::Method(m) => Some((*c, m.clone())),
                _ => None,
            })
            .collect()
    }

    const TEST_LIB: &str = r#"
#ifndef TEST_LIB_H
#define TEST_LIB_H
#include <string>

namespace TestLib {

/* A class with everything. */
class TestClass {
public:
    TestClass();
    TestClass(const TestClass& other);
    ~TestClass();

    bool b;
    long l;
    int a, *pa;
    std::string name;

    long sum();
    TestClass operator-(TestClass other);
    bool operator==(const TestClass& other) const;
    int& operator[](int index);
    TestClass& operator++();
    TestClass operator++(int);
    void setValue(int value, bool notify = true);
    static TestClass* create();
    operator bool() const;

private:
    int hidden;
    void secret();
};

struct Point {
    double x;
    double y;
};

class Shape {
public:
    virtual double area() const = 0;
    virtual ~Shape() {}
};

class Circle : public Shape, private Point {
public:
    Circle(double r) : radius(r), other{1} { }
    double area() const override { return radius * radius; }
    double radius;
    int other;
};

class NoHeap {
public:
    void* operator new(size_t) = delete;
    void operator delete(void*) = delete;
};

template <typename T, typename U = int>
class Box {
public:
    T value;
};

typedef unsigned int Count;
using Name = std::string;

}  // namespace TestLib
#endif
"#;

    #[test]
    fn test_namespaces_and_classes() {
        let tree = parse(TEST_LIB);
        let names: Vec<String> = classes(&tree)
            .iter()
            .map(|id| tree.get(*id).as_class().unwrap().spelling())
            .collect();
        assert_eq!(
            names,
            vec![
                "TestLib::TestClass",
                "TestLib::Point",
                "TestLib::Shape",
                "TestLib::Circle",
                "TestLib::NoHeap"
            ]
        );
    }

    #[test]
    fn test_public_fields() {
        let tree = parse(TEST_LIB);
        let (id, _) = class(&tree, "TestLib::TestClass");
        let fields: Vec<(String, String)> = tree
            .children(id)
            .iter()
            .filter_map(|c| match tree.get(*c) {
                Decl::Field(f) => Some((f.name.clone(), f.ty.spelling())),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec![
                ("b".to_string(), "bool".to_string()),
                ("l".to_string(), "long".to_string()),
                ("a".to_string(), "int".to_string()),
                ("pa".to_string(), "int*".to_string()),
                ("name".to_string(), "std::string".to_string()),
            ]
        );
    }

    #[test]
    fn test_methods_and_kinds() {
        let tree = parse(TEST_LIB);
        let (id, decl) = class(&tree, "TestLib::TestClass");
        assert!(decl.has_constructor);
        let methods = methods(&tree, id);
        let names: Vec<&str> = methods.iter().map(|(_, m)| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "TestClass",
                "TestClass",
                "~TestClass",
                "sum",
                "operator-",
                "operator==",
                "operator[]",
                "operator++",
                "operator++",
                "setValue",
                "create",
            ]
        );
        assert_eq!(methods[0].1.kind, MethodKind::Constructor);
        assert_eq!(methods[2].1.kind, MethodKind::Destructor);
        assert_eq!(methods[10].1.kind, MethodKind::Static);
        assert!(methods[5].1.is_const);
        assert_eq!(methods[4].1.return_type.spelling(), "TestClass");
        assert_eq!(methods[6].1.return_type.spelling(), "int&");
    }

    #[test]
    fn test_arguments_and_defaults() {
        let tree = parse(TEST_LIB);
        let (id, _) = class(&tree, "TestLib::TestClass");
        let methods = methods(&tree, id);
        let (set_value, _) = methods.iter().find(|(_, m)| m.name == "setValue").unwrap();
        let args = arguments(&tree, *set_value);
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].name, "value");
        assert!(!args[0].has_default);
        assert!(args[1].has_default);

        let (copy, _) = &methods[1];
        let args = arguments(&tree, *copy);
        assert_eq!(args[0].ty.spelling(), "const TestClass&");

        let (post_inc, _) = &methods[8];
        let args = arguments(&tree, *post_inc);
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].name, "arg0");
    }

    #[test]
    fn test_abstract_and_bases() {
        let tree = parse(TEST_LIB);
        let (_, shape) = class(&tree, "TestLib::Shape");
        assert!(shape.is_abstract);

        let (circle, decl) = class(&tree, "TestLib::Circle");
        assert!(!decl.is_abstract);
        let bases: Vec<String> = tree
            .children(circle)
            .iter()
            .filter_map(|c| match tree.get(*c) {
                Decl::Base(b) => Some(b.ty.spelling()),
                _ => None,
            })
            .collect();
        assert_eq!(bases, vec!["Shape"]);

        let fields = tree
            .children(circle)
            .iter()
            .filter(|c| matches!(tree.get(**c), Decl::Field(_)))
            .count();
        assert_eq!(fields, 2);
    }

    #[test]
    fn test_hidden_new_and_delete() {
        let tree = parse(TEST_LIB);
        let (id, decl) = class(&tree, "TestLib::NoHeap");
        assert!(decl.has_hidden_new);
        assert!(decl.has_hidden_delete);
        assert!(methods(&tree, id).is_empty());
    }

    #[test]
    fn test_templates_and_typedefs() {
        let tree = parse(TEST_LIB);
        let template = tree
            .preorder()
            .into_iter()
            .find(|id| matches!(tree.get(*id), Decl::Template(_)))
            .unwrap();
        match tree.get(template) {
            Decl::Template(t) => assert_eq!(t.qualified, "TestLib::Box"),
            _ => unreachable!(),
        }
        assert_eq!(tree.children(template).len(), 2);

        let typedefs: Vec<(String, String)> = tree
            .preorder()
            .into_iter()
            .filter_map(|id| match tree.get(id) {
                Decl::Typedef(t) => Some((t.name.clone(), t.target.spelling())),
                _ => None,
            })
            .collect();
        assert_eq!(
            typedefs,
            vec![
                ("Count".to_string(), "unsigned int".to_string()),
                ("Name".to_string(), "std::string".to_string()),
            ]
        );
    }

    #[test]
    fn test_ignored_macros() {
        let tree = HeaderParser::new()
            .with_ignored_macros(vec!["LIB_API".to_string()])
            .parse_content(
                "class LIB_API Widget { public: LIB_API int size() const; };",
                Path::new("w.h"),
            )
            .unwrap();
        let (id, _) = class(&tree, "Widget");
        assert_eq!(methods(&tree, id)[0].1.name, "size");
    }

    #[test]
    fn test_unbalanced_braces_is_error() {
        let err = HeaderParser::new()
            .parse_content("class Broken { int x;", Path::new("broken.h"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("broken.h"));
    }

    #[test]
    fn test_stray_closing_brace_is_error() {
        let err = HeaderParser::new()
            .parse_content("class A { int x; };\n}}}", Path::new("stray.h"))
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("stray.h"));
        assert!(message.contains("unmatched `}`"));

        let err = HeaderParser::new()
            .parse_content("namespace n { class B {}; } }", Path::new("extra.h"))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("unmatched `}`"));
    }

    #[test]
    fn test_split_statements_labels() {
        let mut access = Access::Private;
        assert_eq!(strip_labels("public: int x", &mut access), "int x");
        assert_eq!(access, Access::Public);
        assert_eq!(strip_labels("std::string s", &mut access), "std::string s");
    }
}
