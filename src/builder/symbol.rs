//! Symbols: the nodes of the emission IR.
//!
//! A symbol renders itself into a [`CodeStringBuilder`]. Containers expose
//! their immediate children and fully-qualified symbols expose the names
//! they refer to, so the import pass can walk a finished file before any
//! text is produced.

use std::fmt;

use super::code_string::CodeStringBuilder;
use crate::core::resolved::KotlinType;

/// Anything that can render itself as source text.
pub trait Symbol: fmt::Debug {
    fn build(&self, out: &mut CodeStringBuilder);

    /// Immediate child symbols.
    fn children(&self) -> Vec<&dyn Symbol> {
        Vec::new()
    }

    /// Fully-qualified names this symbol itself refers to.
    fn fq_names(&self) -> Vec<String> {
        Vec::new()
    }
}

pub type BoxSymbol = Box<dyn Symbol>;

/// Every fully-qualified name under `symbols`, in walk order.
pub fn collect_fq_names(symbols: &[BoxSymbol]) -> Vec<String> {
    fn walk(symbol: &dyn Symbol, names: &mut Vec<String>) {
        names.extend(symbol.fq_names());
        for child in symbol.children() {
            walk(child, names);
        }
    }
    let mut names = Vec::new();
    for symbol in symbols {
        walk(symbol.as_ref(), &mut names);
    }
    names
}

/// Render a single symbol with no remapping.
pub fn render(symbol: &dyn Symbol) -> String {
    let mut out = CodeStringBuilder::new();
    symbol.build(&mut out);
    out.finish()
}

/// Member access operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Dot,
    Arrow,
    /// Kotlin safe call.
    QDot,
    /// C++ scope resolution.
    Colons,
}

impl Access {
    fn token(self) -> &'static str {
        match self {
            Access::Dot => ".",
            Access::Arrow => "->",
            Access::QDot => "?.",
            Access::Colons => "::",
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Raw(String),
    /// Fully-qualified Kotlin name, rendered as the import pass decided.
    Fq(String),
    Type(KotlinType),
    /// Quoted string constant.
    Str(String),
    /// Concatenation without separators.
    Seq(Vec<Expr>),
    Call {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    Access {
        receiver: Box<Expr>,
        op: Access,
        member: Box<Expr>,
    },
    /// `*(x)`
    Deref(Box<Expr>),
    /// `&x`
    AddressOf(Box<Expr>),
    Op {
        lhs: Box<Expr>,
        op: String,
        rhs: Box<Expr>,
    },
    /// `(T)x`
    Cast {
        ty: Box<Expr>,
        expr: Box<Expr>,
    },
    /// `reinterpret_cast<T>(x)`
    Reinterpret {
        ty: Box<Expr>,
        expr: Box<Expr>,
    },
    /// `new T(..)`, or placement new when `location` is set.
    New {
        location: Option<Box<Expr>>,
        value: Box<Expr>,
    },
    Return(Option<Box<Expr>>),
    /// `(a ?: b)`
    Elvis(Box<Expr>, Box<Expr>),
    /// `(a to b)`
    Pair(Box<Expr>, Box<Expr>),
    /// `a!!`
    NotNull(Box<Expr>),
    Paren(Box<Expr>),
}

impl Expr {
    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }

    pub fn fq(name: impl Into<String>) -> Self {
        Expr::Fq(name.into())
    }

    /// A function or extension `name` in `pkg`.
    pub fn member_of(pkg: &str, name: &str) -> Self {
        if pkg.is_empty() {
            Expr::Raw(name.to_string())
        } else {
            Expr::Fq(format!("{}.{}", pkg, name))
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn call(target: impl Into<Expr>, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: Box::new(target.into()),
            args,
        }
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Expr::Return(value.map(Box::new))
    }

    pub fn new_object(value: Expr) -> Self {
        Expr::New {
            location: None,
            value: Box::new(value),
        }
    }

    pub fn placement_new(location: Expr, value: Expr) -> Self {
        Expr::New {
            location: Some(Box::new(location)),
            value: Box::new(value),
        }
    }

    pub fn cast(ty: impl Into<Expr>, expr: Expr) -> Self {
        Expr::Cast {
            ty: Box::new(ty.into()),
            expr: Box::new(expr),
        }
    }

    pub fn reinterpret(ty: impl Into<Expr>, expr: Expr) -> Self {
        Expr::Reinterpret {
            ty: Box::new(ty.into()),
            expr: Box::new(expr),
        }
    }

    fn access(self, op: Access, member: impl Into<Expr>) -> Self {
        Expr::Access {
            receiver: Box::new(self),
            op,
            member: Box::new(member.into()),
        }
    }

    pub fn dot(self, member: impl Into<Expr>) -> Self {
        self.access(Access::Dot, member)
    }

    pub fn arrow(self, member: impl Into<Expr>) -> Self {
        self.access(Access::Arrow, member)
    }

    pub fn qdot(self, member: impl Into<Expr>) -> Self {
        self.access(Access::QDot, member)
    }

    pub fn colons(self, member: impl Into<Expr>) -> Self {
        self.access(Access::Colons, member)
    }

    pub fn deref(self) -> Self {
        Expr::Deref(Box::new(self))
    }

    pub fn address_of(self) -> Self {
        Expr::AddressOf(Box::new(self))
    }

    pub fn op(self, op: impl Into<String>, rhs: Expr) -> Self {
        Expr::Op {
            lhs: Box::new(self),
            op: op.into(),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(self, value: Expr) -> Self {
        self.op("=", value)
    }

    pub fn elvis(self, fallback: Expr) -> Self {
        Expr::Elvis(Box::new(self), Box::new(fallback))
    }

    pub fn to(self, second: Expr) -> Self {
        Expr::Pair(Box::new(self), Box::new(second))
    }

    pub fn not_null(self) -> Self {
        Expr::NotNull(Box::new(self))
    }

    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    fn sub_exprs(&self) -> Vec<&Expr> {
        match self {
            Expr::Raw(_) | Expr::Fq(_) | Expr::Type(_) | Expr::Str(_) => Vec::new(),
            Expr::Seq(parts) => parts.iter().collect(),
            Expr::Call { target, args } => {
                let mut out = vec![&**target];
                out.extend(args.iter());
                out
            }
            Expr::Access {
                receiver, member, ..
            } => vec![&**receiver, &**member],
            Expr::Op { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            Expr::Cast { ty, expr } | Expr::Reinterpret { ty, expr } => vec![&**ty, &**expr],
            Expr::New { location, value } => {
                let mut out: Vec<&Expr> = location.iter().map(|l| &**l).collect();
                out.push(&**value);
                out
            }
            Expr::Return(value) => value.iter().map(|v| &**v).collect(),
            Expr::Elvis(a, b) | Expr::Pair(a, b) => vec![&**a, &**b],
            Expr::Deref(e) | Expr::AddressOf(e) | Expr::NotNull(e) | Expr::Paren(e) => vec![&**e],
        }
    }
}

impl From<&str> for Expr {
    fn from(text: &str) -> Self {
        Expr::Raw(text.to_string())
    }
}

impl From<String> for Expr {
    fn from(text: String) -> Self {
        Expr::Raw(text)
    }
}

fn build_list(items: &[Expr], out: &mut CodeStringBuilder) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.append(", ");
        }
        item.build(out);
    }
}

impl Symbol for Expr {
    fn build(&self, out: &mut CodeStringBuilder) {
        match self {
            Expr::Raw(text) => {
                out.append(text);
            }
            Expr::Fq(name) => {
                let text = out.resolve(name).to_string();
                out.append(&text);
            }
            Expr::Type(ty) => {
                let text = ty.render(out.remap());
                out.append(&text);
            }
            Expr::Str(value) => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                out.append(&format!("\"{}\"", escaped));
            }
            Expr::Seq(parts) => {
                for part in parts {
                    part.build(out);
                }
            }
            Expr::Call { target, args } => {
                target.build(out);
                out.append("(");
                build_list(args, out);
                out.append(")");
            }
            Expr::Access {
                receiver,
                op,
                member,
            } => {
                receiver.build(out);
                out.append(op.token());
                member.build(out);
            }
            Expr::Deref(inner) => {
                out.append("*(");
                inner.build(out);
                out.append(")");
            }
            Expr::AddressOf(inner) => {
                out.append("&");
                inner.build(out);
            }
            Expr::Op { lhs, op, rhs } => {
                lhs.build(out);
                out.append(&format!(" {} ", op));
                rhs.build(out);
            }
            Expr::Cast { ty, expr } => {
                out.append("(");
                ty.build(out);
                out.append(")");
                expr.build(out);
            }
            Expr::Reinterpret { ty, expr } => {
                out.append("reinterpret_cast<");
                ty.build(out);
                out.append(">(");
                expr.build(out);
                out.append(")");
            }
            Expr::New { location, value } => {
                out.append("new ");
                if let Some(location) = location {
                    out.append("(");
                    location.build(out);
                    out.append(") ");
                }
                value.build(out);
            }
            Expr::Return(value) => {
                out.append("return");
                if let Some(value) = value {
                    out.append(" ");
                    value.build(out);
                }
            }
            Expr::Elvis(a, b) => {
                out.append("(");
                a.build(out);
                out.append(" ?: ");
                b.build(out);
                out.append(")");
            }
            Expr::Pair(a, b) => {
                out.append("(");
                a.build(out);
                out.append(" to ");
                b.build(out);
                out.append(")");
            }
            Expr::NotNull(inner) => {
                inner.build(out);
                out.append("!!");
            }
            Expr::Paren(inner) => {
                out.append("(");
                inner.build(out);
                out.append(")");
            }
        }
    }

    fn children(&self) -> Vec<&dyn Symbol> {
        self.sub_exprs()
            .into_iter()
            .map(|e| e as &dyn Symbol)
            .collect()
    }

    fn fq_names(&self) -> Vec<String> {
        match self {
            Expr::Fq(name) => vec![name.clone()],
            Expr::Type(ty) => ty.fq_names(),
            _ => Vec::new(),
        }
    }
}

/// An expression on its own line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub expr: Expr,
    pub semicolon: bool,
}

impl Symbol for Statement {
    fn build(&self, out: &mut CodeStringBuilder) {
        self.expr.build(out);
        if self.semicolon {
            out.append(";");
        }
        out.newline();
    }

    fn children(&self) -> Vec<&dyn Symbol> {
        vec![&self.expr as &dyn Symbol]
    }
}

/// `// text`
#[derive(Debug, Clone, PartialEq)]
pub struct Comment(pub String);

impl Symbol for Comment {
    fn build(&self, out: &mut CodeStringBuilder) {
        out.append("// ");
        out.append(&self.0);
        out.newline();
    }
}

/// An empty line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blank;

impl Symbol for Blank {
    fn build(&self, out: &mut CodeStringBuilder) {
        out.newline();
    }
}

/// How a [`Block`] delimits its body.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockStyle {
    /// `head {` indented body `}`
    Braces,
    /// Unindented body followed by a closing line, as in `#ifndef`/`#endif`.
    Directive(String),
}

/// A header followed by nested statements.
#[derive(Debug)]
pub struct Block {
    pub head: Expr,
    pub body: Vec<BoxSymbol>,
    pub style: BlockStyle,
}

impl Symbol for Block {
    fn build(&self, out: &mut CodeStringBuilder) {
        self.head.build(out);
        match &self.style {
            BlockStyle::Braces => {
                out.append(" {");
                out.newline();
                out.indent();
                for symbol in &self.body {
                    symbol.build(out);
                }
                out.dedent();
                out.append("}");
                out.newline();
            }
            BlockStyle::Directive(close) => {
                out.newline();
                for symbol in &self.body {
                    symbol.build(out);
                }
                out.append(close);
                out.newline();
            }
        }
    }

    fn children(&self) -> Vec<&dyn Symbol> {
        let mut out: Vec<&dyn Symbol> = vec![&self.head];
        out.extend(self.body.iter().map(|s| s.as_ref()));
        out
    }
}
