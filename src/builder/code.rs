//! The language-independent code builder.

use super::code_string::CodeStringBuilder;
use super::scope::Scope;
use super::symbol::{Blank, Block, BlockStyle, BoxSymbol, Comment, Expr, Statement, Symbol};
use crate::core::resolved::KotlinType;
use crate::core::types::CppType;

/// A type as written in generated code.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Cpp(CppType),
    Kotlin(KotlinType),
    /// Spelled verbatim; dotted names are treated as fully qualified by
    /// factories that import.
    Raw(String),
}

impl From<CppType> for TypeSpec {
    fn from(ty: CppType) -> Self {
        TypeSpec::Cpp(ty)
    }
}

impl From<KotlinType> for TypeSpec {
    fn from(ty: KotlinType) -> Self {
        TypeSpec::Kotlin(ty)
    }
}

/// A named local or parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    pub ty: Option<TypeSpec>,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeSpec>) -> Self {
        Var {
            name: name.into(),
            ty: Some(ty.into()),
        }
    }

    pub fn reference(&self) -> Expr {
        Expr::Raw(self.name.clone())
    }
}

/// Signature of a function to emit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionSpec {
    pub name: String,
    /// `None` renders as the language's unit/void type.
    pub ret: Option<TypeSpec>,
    pub args: Vec<Var>,
    pub modifiers: Vec<String>,
    /// Receiver type of an extension function.
    pub receiver: Option<TypeSpec>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionSpec {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn returning(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.ret = Some(ty.into());
        self
    }

    pub fn arg(mut self, name: impl Into<String>, ty: impl Into<TypeSpec>) -> Self {
        self.args.push(Var::new(name, ty));
        self
    }

    pub fn modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }

    pub fn receiver(mut self, ty: impl Into<TypeSpec>) -> Self {
        self.receiver = Some(ty.into());
        self
    }
}

/// The per-language part of code building.
pub trait LangFactory {
    /// Whether statements end with `;`.
    fn semicolons(&self) -> bool;

    fn type_ref(&self, ty: &TypeSpec) -> Expr;

    /// A local variable declaration.
    fn define(&self, var: &Var, initializer: Option<Expr>) -> Expr;

    fn signature(&self, spec: &FunctionSpec) -> Expr;

    /// Output buffer for a finished file. Factories that resolve names
    /// inspect the symbols here, before anything is rendered.
    fn output(&self, _symbols: &[BoxSymbol]) -> CodeStringBuilder {
        CodeStringBuilder::new()
    }
}

/// Position in the current statement list, for undoing partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    depth: usize,
    len: usize,
}

/// Builds a file as a tree of symbols, then renders it.
///
/// Nested constructs (blocks, functions) are built through closures. When a
/// closure fails, everything it added is discarded and the error is
/// returned, so a failing member leaves no partial output behind.
pub struct CodeBuilder<F> {
    factory: F,
    frames: Vec<Vec<BoxSymbol>>,
    scope: Scope,
}

impl<F: LangFactory> CodeBuilder<F> {
    pub fn new(factory: F) -> Self {
        CodeBuilder {
            factory,
            frames: vec![Vec::new()],
            scope: Scope::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn add(&mut self, symbol: impl Symbol + 'static) {
        self.add_boxed(Box::new(symbol));
    }

    pub fn add_boxed(&mut self, symbol: BoxSymbol) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(symbol);
        }
    }

    /// An expression statement, terminated as the language requires.
    pub fn statement(&mut self, expr: Expr) {
        let semicolon = self.factory.semicolons();
        self.add(Statement { expr, semicolon });
    }

    /// A line that never takes a terminator.
    pub fn line(&mut self, expr: Expr) {
        self.add(Statement {
            expr,
            semicolon: false,
        });
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.add(Comment(text.into()));
    }

    pub fn blank(&mut self) {
        self.add(Blank);
    }

    pub fn ret(&mut self, value: Option<Expr>) {
        self.statement(Expr::ret(value));
    }

    pub fn type_ref(&self, ty: &TypeSpec) -> Expr {
        self.factory.type_ref(ty)
    }

    /// Reserve a local name in the current scope.
    pub fn allocate(&mut self, desired: &str) -> String {
        self.scope.allocate(desired)
    }

    /// Declare a local and return it under its allocated name.
    pub fn define(&mut self, desired: &str, ty: impl Into<TypeSpec>, initializer: Option<Expr>) -> Var {
        let var = Var::new(self.scope.allocate(desired), ty);
        let decl = self.factory.define(&var, initializer);
        self.statement(decl);
        var
    }

    /// Run `f` in a fresh scope and statement list, returning what it added.
    pub fn collect<R, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Result<(Vec<BoxSymbol>, R), E> {
        self.scope.push();
        self.frames.push(Vec::new());
        let result = f(self);
        let symbols = self.frames.pop().unwrap_or_default();
        self.scope.pop();
        result.map(|r| (symbols, r))
    }

    /// `head {` body `}`
    pub fn block<R, E>(
        &mut self,
        head: Expr,
        f: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Result<R, E> {
        let (body, value) = self.collect(f)?;
        self.add(Block {
            head,
            body,
            style: BlockStyle::Braces,
        });
        Ok(value)
    }

    /// `head` unindented body `close`.
    pub fn directive_block<R, E>(
        &mut self,
        head: Expr,
        close: &str,
        f: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Result<R, E> {
        let (body, value) = self.collect(f)?;
        self.add(Block {
            head,
            body,
            style: BlockStyle::Directive(close.to_string()),
        });
        Ok(value)
    }

    /// A function definition. Argument names are allocated in the
    /// function's scope and handed to `body`.
    pub fn function<R, E>(
        &mut self,
        spec: FunctionSpec,
        body: impl FnOnce(&mut Self, &[Var]) -> Result<R, E>,
    ) -> Result<R, E> {
        let (symbols, (head, value)) = self.collect(|b| {
            let spec = b.allocate_args(spec);
            let head = b.factory.signature(&spec);
            body(b, &spec.args).map(|value| (head, value))
        })?;
        self.add(Block {
            head,
            body: symbols,
            style: BlockStyle::Braces,
        });
        Ok(value)
    }

    /// A function declaration, without a body.
    pub fn function_decl(&mut self, spec: FunctionSpec) {
        self.scope.push();
        let spec = self.allocate_args(spec);
        self.scope.pop();
        let head = self.factory.signature(&spec);
        self.statement(head);
    }

    fn allocate_args(&mut self, mut spec: FunctionSpec) -> FunctionSpec {
        for arg in &mut spec.args {
            arg.name = self.scope.allocate(&arg.name);
        }
        spec
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            depth: self.frames.len(),
            len: self.frames.last().map_or(0, Vec::len),
        }
    }

    /// Drop everything added to the current list since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        if self.frames.len() != checkpoint.depth {
            return;
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.truncate(checkpoint.len);
        }
    }

    /// Top-level symbols built so far.
    pub fn symbols(&self) -> &[BoxSymbol] {
        self.frames.first().map_or(&[][..], Vec::as_slice)
    }

    /// Render the file.
    pub fn finish(self) -> String {
        let symbols: Vec<BoxSymbol> = self.frames.into_iter().flatten().collect();
        let mut out = self.factory.output(&symbols);
        for symbol in &symbols {
            symbol.build(&mut out);
        }
        out.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::cpp::CppFactory;

    fn int() -> CppType {
        CppType::native("int")
    }

    #[test]
    fn test_function_allocates_args_and_locals() {
        let mut b = CodeBuilder::new(CppFactory);
        let spec = FunctionSpec::new("f").returning(int()).arg("a", int());
        b.function(spec, |b, args| {
            let local = b.define("a", int(), Some(args[0].reference()));
            b.ret(Some(local.reference()));
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(b.finish(), "int f(int a) {\n    int _a = a;\n    return _a;\n}\n");
    }

    #[test]
    fn test_failed_block_leaves_no_output() {
        let mut b = CodeBuilder::new(CppFactory);
        b.comment("kept");
        let result: Result<(), &str> = b.block(Expr::raw("if (x)"), |b| {
            b.statement(Expr::raw("partial"));
            Err("boom")
        });

        assert_eq!(result, Err("boom"));
        assert_eq!(b.finish(), "// kept\n");
    }

    #[test]
    fn test_rollback_to_checkpoint() {
        let mut b = CodeBuilder::new(CppFactory);
        b.comment("a");
        let checkpoint = b.checkpoint();
        b.comment("b");
        b.blank();
        b.rollback(checkpoint);

        assert_eq!(b.symbols().len(), 1);
        assert_eq!(b.finish(), "// a\n");
    }

    #[test]
    fn test_scope_is_restored_after_block() {
        let mut b = CodeBuilder::new(CppFactory);
        b.block(Expr::raw("{"), |b| {
            b.define("x", int(), None);
            Ok::<_, ()>(())
        })
        .unwrap();

        assert_eq!(b.allocate("x"), "x");
    }
}
