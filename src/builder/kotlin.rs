//! Kotlin rendering.

use super::code::{CodeBuilder, FunctionSpec, LangFactory, TypeSpec, Var};
use super::code_string::CodeStringBuilder;
use super::imports::resolve_imports;
use super::symbol::{collect_fq_names, Block, BlockStyle, BoxSymbol, Expr, Symbol};
use crate::core::resolved::KotlinType;

/// Factory for Kotlin files in `package`.
#[derive(Debug, Clone, Default)]
pub struct KotlinFactory {
    package: String,
}

impl KotlinFactory {
    pub fn new(package: impl Into<String>) -> Self {
        KotlinFactory {
            package: package.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }
}

pub type KotlinCodeBuilder = CodeBuilder<KotlinFactory>;

impl LangFactory for KotlinFactory {
    fn semicolons(&self) -> bool {
        false
    }

    fn type_ref(&self, ty: &TypeSpec) -> Expr {
        match ty {
            TypeSpec::Kotlin(kotlin) => Expr::Type(kotlin.clone()),
            TypeSpec::Raw(text) if text.contains('.') => Expr::Fq(text.clone()),
            TypeSpec::Raw(text) => Expr::Raw(text.clone()),
            TypeSpec::Cpp(cpp) => Expr::Raw(cpp.spelling()),
        }
    }

    fn define(&self, var: &Var, initializer: Option<Expr>) -> Expr {
        let mut parts = vec![Expr::raw(format!("val {}", var.name))];
        if let Some(ty) = &var.ty {
            parts.push(Expr::raw(": "));
            parts.push(self.type_ref(ty));
        }
        if let Some(init) = initializer {
            parts.push(Expr::raw(" = "));
            parts.push(init);
        }
        Expr::Seq(parts)
    }

    fn signature(&self, spec: &FunctionSpec) -> Expr {
        let mut parts = Vec::new();
        for modifier in &spec.modifiers {
            parts.push(Expr::raw(format!("{} ", modifier)));
        }
        parts.push(Expr::raw("fun "));
        if let Some(receiver) = &spec.receiver {
            parts.push(self.type_ref(receiver));
            parts.push(Expr::raw("."));
        }
        parts.push(Expr::raw(format!("{}(", spec.name)));
        for (i, arg) in spec.args.iter().enumerate() {
            if i > 0 {
                parts.push(Expr::raw(", "));
            }
            parts.push(Expr::raw(format!("{}: ", arg.name)));
            if let Some(ty) = &arg.ty {
                parts.push(self.type_ref(ty));
            }
        }
        parts.push(Expr::raw(")"));
        if let Some(ret) = &spec.ret {
            parts.push(Expr::raw(": "));
            parts.push(self.type_ref(ret));
        }
        Expr::Seq(parts)
    }

    fn output(&self, symbols: &[BoxSymbol]) -> CodeStringBuilder {
        let imports = resolve_imports(&self.package, collect_fq_names(symbols));
        CodeStringBuilder::new()
            .with_remap(imports.remap)
            .with_imports(imports.lines)
    }
}

/// Placeholder filled with the file's import lines at render time.
#[derive(Debug, Clone, Copy)]
pub struct ImportBlock;

impl Symbol for ImportBlock {
    fn build(&self, out: &mut CodeStringBuilder) {
        let lines = out.imports().to_vec();
        for line in lines {
            out.append(&line);
            out.newline();
        }
    }
}

/// A property with inline accessors.
#[derive(Debug)]
pub struct Property {
    pub decl: Expr,
    pub accessors: Vec<Block>,
}

impl Symbol for Property {
    fn build(&self, out: &mut CodeStringBuilder) {
        self.decl.build(out);
        out.newline();
        out.indent();
        for accessor in &self.accessors {
            accessor.build(out);
        }
        out.dedent();
    }

    fn children(&self) -> Vec<&dyn Symbol> {
        let mut out: Vec<&dyn Symbol> = vec![&self.decl];
        out.extend(self.accessors.iter().map(|a| a as &dyn Symbol));
        out
    }
}

impl CodeBuilder<KotlinFactory> {
    /// `package a.b` followed by a blank line.
    pub fn package_line(&mut self) {
        let package = self.factory().package().to_string();
        if !package.is_empty() {
            self.line(Expr::raw(format!("package {}", package)));
            self.blank();
        }
    }

    pub fn import_block(&mut self) {
        self.add(ImportBlock);
    }

    /// `value class Name public constructor(val p: T) {` body `}`
    pub fn value_class<R, E>(
        &mut self,
        name: &str,
        param: &Var,
        f: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Result<R, E> {
        let mut head = vec![Expr::raw(format!(
            "value class {} public constructor(val {}: ",
            name, param.name
        ))];
        if let Some(ty) = &param.ty {
            head.push(self.type_ref(ty));
        }
        head.push(Expr::raw(")"));
        self.block(Expr::Seq(head), f)
    }

    pub fn companion<R, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E> {
        self.block(Expr::raw("companion object"), f)
    }

    pub fn defer<R, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E> {
        self.block(Expr::raw("defer"), f)
    }

    fn property_decl(&self, keyword: &str, var: &Var) -> Expr {
        let mut decl = vec![Expr::raw(format!("{} {}", keyword, var.name))];
        if let Some(ty) = &var.ty {
            decl.push(Expr::raw(": "));
            decl.push(self.type_ref(ty));
        }
        Expr::Seq(decl)
    }

    fn accessor<E>(
        &mut self,
        head: &str,
        f: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<Block, E> {
        let (body, ()) = self.collect(f)?;
        Ok(Block {
            head: Expr::raw(head),
            body,
            style: BlockStyle::Braces,
        })
    }

    /// `val name: T` with an inline getter.
    pub fn val_property<E>(
        &mut self,
        var: &Var,
        getter: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<(), E> {
        let get = self.accessor("inline get()", getter)?;
        let decl = self.property_decl("val", var);
        self.add(Property {
            decl,
            accessors: vec![get],
        });
        Ok(())
    }

    /// `var name: T` with an inline getter and setter. The setter receives
    /// its parameter.
    pub fn var_property<E>(
        &mut self,
        var: &Var,
        getter: impl FnOnce(&mut Self) -> Result<(), E>,
        setter: impl FnOnce(&mut Self, &Var) -> Result<(), E>,
    ) -> Result<(), E> {
        let get = self.accessor("inline get()", getter)?;
        let (body, param) = self.collect(|b| {
            let param = Var {
                name: b.allocate("value"),
                ty: var.ty.clone(),
            };
            setter(b, &param).map(|()| param)
        })?;
        let set = Block {
            head: Expr::raw(format!("inline set({})", param.name)),
            body,
            style: BlockStyle::Braces,
        };
        let decl = self.property_decl("var", var);
        self.add(Property {
            decl,
            accessors: vec![get, set],
        });
        Ok(())
    }
}

/// Common Kotlin/Native types used by generated bindings.
pub mod types {
    use super::KotlinType;

    pub const C_OPAQUE_POINTER: &str = "kotlinx.cinterop.COpaquePointer";
    pub const MEM_SCOPE: &str = "kotlinx.cinterop.MemScope";
    pub const C_POINTER: &str = "kotlinx.cinterop.CPointer";
    pub const BYTE_VAR: &str = "kotlinx.cinterop.ByteVar";
    pub const PAIR: &str = "kotlin.Pair";
    pub const INT: &str = "kotlin.Int";
    pub const STRING: &str = "kotlin.String";
    pub const INTERPRET_C_POINTER: &str = "kotlinx.cinterop.interpretCPointer";
    pub const TO_K_STRING: &str = "kotlinx.cinterop.toKString";
    pub const FREE: &str = "platform.posix.free";

    pub fn named(fq: &str) -> KotlinType {
        KotlinType::new(fq, false)
    }

    /// `Pair<COpaquePointer, MemScope>`
    pub fn source_pair() -> KotlinType {
        named(PAIR).with_templates(vec![named(C_OPAQUE_POINTER), named(MEM_SCOPE)])
    }

    /// `CPointer<ByteVar>?`
    pub fn c_string() -> KotlinType {
        named(C_POINTER)
            .with_templates(vec![named(BYTE_VAR)])
            .nullable()
    }
}
