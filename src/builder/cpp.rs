//! C and C++ rendering.

use super::code::{CodeBuilder, FunctionSpec, LangFactory, TypeSpec, Var};
use super::symbol::Expr;

/// Factory for C headers and C++ shim bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct CppFactory;

pub type CppCodeBuilder = CodeBuilder<CppFactory>;

impl LangFactory for CppFactory {
    fn semicolons(&self) -> bool {
        true
    }

    fn type_ref(&self, ty: &TypeSpec) -> Expr {
        match ty {
            TypeSpec::Cpp(cpp) => Expr::Raw(cpp.spelling()),
            TypeSpec::Kotlin(kotlin) => Expr::Raw(kotlin.to_string()),
            TypeSpec::Raw(text) => Expr::Raw(text.clone()),
        }
    }

    fn define(&self, var: &Var, initializer: Option<Expr>) -> Expr {
        let mut parts = Vec::new();
        if let Some(ty) = &var.ty {
            parts.push(self.type_ref(ty));
            parts.push(Expr::raw(" "));
        }
        parts.push(var.reference());
        if let Some(init) = initializer {
            parts.push(Expr::raw(" = "));
            parts.push(init);
        }
        Expr::Seq(parts)
    }

    fn signature(&self, spec: &FunctionSpec) -> Expr {
        let mut parts = vec![
            match &spec.ret {
                Some(ret) => self.type_ref(ret),
                None => Expr::raw("void"),
            },
            Expr::raw(format!(" {}(", spec.name)),
        ];
        for (i, arg) in spec.args.iter().enumerate() {
            if i > 0 {
                parts.push(Expr::raw(", "));
            }
            parts.push(self.define(arg, None));
        }
        parts.push(Expr::raw(")"));
        Expr::Seq(parts)
    }
}

impl CodeBuilder<CppFactory> {
    /// `#include "path"`
    pub fn include(&mut self, path: &str) {
        self.line(Expr::raw(format!("#include \"{}\"", path)));
    }

    /// `#include <name>`
    pub fn include_sys(&mut self, name: &str) {
        self.line(Expr::raw(format!("#include <{}>", name)));
    }

    pub fn define_macro(&mut self, name: &str) {
        self.line(Expr::raw(format!("#define {}", name)));
    }

    pub fn ifndef<R, E>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E> {
        self.directive_block(Expr::raw(format!("#ifndef {}", name)), "#endif", f)
    }

    pub fn ifdef<R, E>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<R, E>) -> Result<R, E> {
        self.directive_block(Expr::raw(format!("#ifdef {}", name)), "#endif", f)
    }

    /// Opens an `extern "C"` section. The body is not indented.
    pub fn extern_c_open(&mut self) {
        self.line(Expr::raw("extern \"C\" {"));
    }

    pub fn extern_c_close(&mut self) {
        self.line(Expr::raw("}"));
    }

    /// `T* x_cast = reinterpret_cast<T*>(x);`
    pub fn reinterpret_local(&mut self, source: &Var, ty: TypeSpec) -> Var {
        let cast = Expr::reinterpret(self.type_ref(&ty), source.reference());
        self.define(&format!("{}_cast", source.name), ty, Some(cast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CppType;

    #[test]
    fn test_signature_and_decl() {
        let mut b = CppCodeBuilder::new(CppFactory);
        b.function_decl(
            FunctionSpec::new("TestLib_TestClass_new")
                .returning(CppType::void_ptr())
                .arg("location", CppType::void_ptr())
                .arg("a", CppType::native("int")),
        );
        b.function_decl(FunctionSpec::new("TestLib_TestClass_dispose").arg("thiz", CppType::void_ptr()));

        assert_eq!(
            b.finish(),
            "void* TestLib_TestClass_new(void* location, int a);\n\
             void TestLib_TestClass_dispose(void* thiz);\n"
        );
    }

    #[test]
    fn test_guard_and_extern() {
        let mut b = CppCodeBuilder::new(CppFactory);
        b.ifndef("__TEST_LIB__", |b| {
            b.define_macro("__TEST_LIB__");
            b.include_sys("stdint.h");
            b.ifdef("__cplusplus", |b| {
                b.extern_c_open();
                Ok::<_, ()>(())
            })
        })
        .unwrap();

        assert_eq!(
            b.finish(),
            "#ifndef __TEST_LIB__\n#define __TEST_LIB__\n#include <stdint.h>\n\
             #ifdef __cplusplus\nextern \"C\" {\n#endif\n#endif\n"
        );
    }

    #[test]
    fn test_reinterpret_local() {
        let mut b = CppCodeBuilder::new(CppFactory);
        let class_ptr = CppType::pointer(CppType::named("TestLib::TestClass"));
        b.function(
            FunctionSpec::new("f").arg("thiz", CppType::void_ptr()),
            |b, args| {
                let cast = b.reinterpret_local(&args[0], TypeSpec::Cpp(class_ptr.clone()));
                b.statement(cast.reference().arrow(Expr::call("sum", vec![])));
                Ok::<_, ()>(())
            },
        )
        .unwrap();

        assert_eq!(
            b.finish(),
            "void f(void* thiz) {\n    \
             TestLib::TestClass* thiz_cast = reinterpret_cast<TestLib::TestClass*>(thiz);\n    \
             thiz_cast->sum();\n}\n"
        );
    }
}
