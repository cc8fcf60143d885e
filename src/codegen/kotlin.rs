//! Kotlin/Native bindings: one wrapper file per class.
//!
//! A wrapper is a `value class` over `Pair<COpaquePointer, MemScope>`. The
//! pointer addresses the C++ object; the scope owns its memory, so objects
//! created in a scope are destroyed with it. Methods forward to the C
//! functions, which cinterop exposes in `<package>.internal`.
//!
//! Files are independent, so they are rendered in parallel.

use std::collections::HashSet;
use std::path::PathBuf;

use rayon::prelude::*;
use tracing::debug;

use crate::builder::kotlin::types::{self, named};
use crate::builder::{Expr, FunctionSpec, KotlinCodeBuilder, KotlinFactory, Var};
use crate::core::operators::{KotlinOperatorStyle, INFIX_NAMES};
use crate::core::resolved::{
    KotlinType, MethodType, ResolvedArgument, ResolvedField, ResolvedMethod, ResolvedTree,
    ResolvedType, ReturnStyle,
};
use crate::core::tree::NodeId;

use super::{
    check_field, guarded, marker, ClassView, CodeGenerationPolicy, CodeGenerator, ErrorContext,
    GeneratedFile, GenerationError, ModuleInfo,
};

/// Writes the Kotlin wrappers.
#[derive(Debug, Clone, Copy, Default)]
pub struct KotlinWriter;

/// Kotlin spelling of a C++ method name.
pub fn kotlin_method_name(name: &str) -> String {
    const REPLACEMENTS: &[(&str, &str)] = &[
        ("<", "_lt"),
        (">", "_gt"),
        ("==", "_cmd"),
        ("=", "_eq"),
        ("+", "_plus"),
        ("-", "_minus"),
        ("/", "_div"),
        ("*", "_star"),
        ("%", "_mod"),
        ("!", "_not"),
    ];
    let mut out = name.to_string();
    for (from, to) in REPLACEMENTS {
        out = out.replace(from, to);
    }
    if INFIX_NAMES.contains(&out.as_str()) {
        out.push_str("_method");
    }
    out
}

/// `testLib.TestClass` is written to `testLib_TestClass.kt`.
pub fn file_name(wrapper: &KotlinType) -> String {
    format!("{}.kt", wrapper.fully_qualified().replace('.', "_"))
}

impl KotlinWriter {
    pub fn generate(
        &self,
        info: &ModuleInfo,
        tree: &ResolvedTree,
        policy: &dyn CodeGenerationPolicy,
    ) -> Result<Vec<GeneratedFile>, GenerationError> {
        let ctx = ErrorContext::module(&info.name);
        let internal = info.internal_package();
        let classes = ClassView::all(tree);

        let results: Vec<Result<Option<GeneratedFile>, GenerationError>> = classes
            .par_iter()
            .map(|class| {
                let class_ctx = ctx.class(&class.class.spelling);
                match class_file(&internal, class, policy, &class_ctx) {
                    Ok(file) => Ok(Some(file)),
                    Err(err) => policy.on_error(&class_ctx, err).map(|()| None),
                }
            })
            .collect();

        let mut files = Vec::with_capacity(results.len());
        for result in results {
            files.extend(result?);
        }
        Ok(files)
    }
}

fn class_file(
    internal: &str,
    class: &ClassView<'_>,
    policy: &dyn CodeGenerationPolicy,
    ctx: &ErrorContext,
) -> Result<GeneratedFile, GenerationError> {
    let wrapper = class
        .class
        .ty
        .kotlin
        .clone()
        .ok_or_else(|| GenerationError::unsupported("class type", &class.class.spelling))?
        .non_null();

    let mut b = KotlinCodeBuilder::new(KotlinFactory::new(wrapper.pkg()));
    b.package_line();
    b.import_block();
    b.blank();
    let writer = ClassWriter {
        internal: internal.to_string(),
        wrapper: wrapper.clone(),
    };
    writer.class(&mut b, class, policy, ctx)?;

    Ok(GeneratedFile {
        path: PathBuf::from(file_name(&wrapper)),
        contents: b.finish(),
    })
}

/// How a generated function reaches the object and its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    /// Inside the value class: `ptr` and `memScope`.
    Instance,
    /// A `MemScope` extension in the companion: no object, scope is `this`.
    Scope,
}

impl Receiver {
    fn mem_scope(self) -> Expr {
        match self {
            Receiver::Instance => Expr::raw("memScope"),
            Receiver::Scope => Expr::raw("this"),
        }
    }
}

struct ClassWriter {
    internal: String,
    wrapper: KotlinType,
}

impl CodeGenerator for ClassWriter {
    type Factory = KotlinFactory;

    fn class(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        let size_of = class.size_of()?;
        b.comment(marker("BEGIN", class.class));
        let source = Var::new("source", types::source_pair());
        b.value_class(self.wrapper.simple_name(), &source, |b| {
            for reserved in ["source", "ptr", "memScope"] {
                b.allocate(reserved);
            }
            b.val_property(&Var::new("ptr", named(types::C_OPAQUE_POINTER)), |b| {
                b.ret(Some(Expr::raw("source.first")));
                Ok::<_, GenerationError>(())
            })?;
            b.val_property(&Var::new("memScope", named(types::MEM_SCOPE)), |b| {
                b.ret(Some(Expr::raw("source.second")));
                Ok(())
            })?;
            b.blank();

            self.members(b, class, policy, ctx)?;
            self.inherited(b, class, policy, ctx)?;

            b.companion(|b| {
                b.val_property(&Var::new("size", named(types::INT)), |b| {
                    b.ret(Some(self.c_call(&size_of.c_name, vec![])));
                    Ok::<_, GenerationError>(())
                })?;
                b.blank();
                self.companion_members(b, class, policy, ctx)
            })
        })?;
        b.comment(marker("END", class.class));
        Ok(())
    }

    fn method(&self, b: &mut KotlinCodeBuilder, class: &ClassView<'_>, id: NodeId) -> Result<(), GenerationError> {
        match class.tree.get(id).as_method() {
            Some(method) if method.method_type == MethodType::Method => {
                if overloads_earlier(class, id, method) {
                    debug!("{} has the Kotlin signature of an earlier overload", method.c_name);
                    return Ok(());
                }
                self.function(b, class, id, method, Receiver::Instance)
            }
            _ => Ok(()),
        }
    }

    fn field(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        field: &ResolvedField,
    ) -> Result<(), GenerationError> {
        check_field(class, field)?;
        let element = element(class, &field.name);
        let ty = kotlin_of(&field.ty, "field type", &element)?;
        kotlin_of(&field.getter.return_type, "field type", &element)?;

        let var = Var::new(field.name.clone(), ty);
        let getter = |b: &mut KotlinCodeBuilder| {
            let call = self.c_call(&field.getter.c_name, vec![Expr::raw("ptr")]);
            self.emit_return(
                b,
                field.getter.return_style,
                &field.getter.return_type,
                call,
                Receiver::Instance,
                None,
            )
        };
        if field.is_const {
            b.val_property(&var, getter)?;
        } else {
            b.var_property(&var, getter, |b, value| {
                let passed = match field.setter.args.get(1) {
                    Some(arg) => pass(value, arg),
                    None => value.reference(),
                };
                b.statement(self.c_call(&field.setter.c_name, vec![Expr::raw("ptr"), passed]));
                Ok(())
            })?;
        }
        b.blank();
        Ok(())
    }
}

impl ClassWriter {
    fn c_call(&self, c_name: &str, args: Vec<Expr>) -> Expr {
        Expr::call(Expr::member_of(&self.internal, c_name), args)
    }

    /// Methods inherited from resolved bases, nearest base first. A name the
    /// derived class declares hides every base overload of it.
    fn inherited(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        let mut hidden: HashSet<String> = class.methods().iter().map(|(_, m)| m.name.clone()).collect();
        let mut visited = HashSet::from([class.class.spelling.clone()]);
        self.inherit_from(b, class, policy, ctx, &mut hidden, &mut visited)
    }

    fn inherit_from(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
        hidden: &mut HashSet<String>,
        visited: &mut HashSet<String>,
    ) -> Result<(), GenerationError> {
        for base in class.bases() {
            let base = match base {
                Ok(base) => base,
                Err(err) => {
                    policy.on_error(ctx, err)?;
                    continue;
                }
            };
            if !visited.insert(base.class.spelling.clone()) {
                continue;
            }
            let methods = base.methods_of(MethodType::Method);
            for (id, method) in &methods {
                if hidden.contains(&method.name) {
                    continue;
                }
                guarded(b, policy, &ctx.member(&method.name), |b| {
                    self.function(b, &base, *id, method, Receiver::Instance)
                })?;
            }
            hidden.extend(methods.iter().map(|(_, m)| m.name.clone()));
            self.inherit_from(b, &base, policy, ctx, hidden, visited)?;
        }
        Ok(())
    }

    fn companion_members(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        let destructor = class.destructor();
        for (id, ctor) in class.methods_of(MethodType::Constructor) {
            guarded(b, policy, &ctx.member(&ctor.name), |b| {
                self.constructor(b, class, id, ctor, destructor)
            })?;
        }
        self.holder(b, class)?;
        for (id, method) in class.methods() {
            if matches!(method.method_type, MethodType::Static | MethodType::StaticOp) {
                guarded(b, policy, &ctx.member(&method.name), |b| {
                    self.function(b, class, id, method, Receiver::Scope)
                })?;
            }
        }
        Ok(())
    }

    /// `fun MemScope.X(args): X`, allocating in the scope and disposing
    /// with it.
    fn constructor(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        id: NodeId,
        ctor: &ResolvedMethod,
        destructor: Option<&ResolvedMethod>,
    ) -> Result<(), GenerationError> {
        let element = element(class, &ctor.name);
        let declared: Vec<&ResolvedArgument> = class.arguments(id).into_iter().skip(1).collect();
        let mut spec = FunctionSpec::new(self.wrapper.simple_name())
            .receiver(named(types::MEM_SCOPE))
            .returning(self.wrapper.clone());
        for arg in &declared {
            spec = spec.arg(arg.name.clone(), kotlin_of(&arg.ty, "argument type", &element)?);
        }

        b.function(spec, |b, vars| {
            let memory = allocate(b);
            let mut args = vec![memory.reference()];
            args.extend(vars.iter().zip(&declared).map(|(var, arg)| pass(var, arg)));
            let created = self
                .c_call(&ctor.c_name, args)
                .elvis(Expr::call("error", vec![Expr::string("Creation failed")]));
            let obj = b.define("obj", named(types::C_OPAQUE_POINTER), Some(created));
            if let Some(destructor) = destructor {
                b.defer(|b| {
                    b.statement(self.c_call(&destructor.c_name, vec![obj.reference()]));
                    Ok::<_, GenerationError>(())
                })?;
            }
            b.ret(Some(self.wrap_new(obj.reference())));
            Ok(())
        })?;
        b.blank();
        Ok(())
    }

    /// `MemScope.X_Holder()`: storage for by-value results.
    fn holder(&self, b: &mut KotlinCodeBuilder, class: &ClassView<'_>) -> Result<(), GenerationError> {
        let has_default = class
            .methods_of(MethodType::Constructor)
            .iter()
            .any(|(id, _)| class.arguments(*id).len() == 1);
        let spec = FunctionSpec::new(format!("{}_Holder", self.wrapper.simple_name()))
            .receiver(named(types::MEM_SCOPE))
            .returning(self.wrapper.clone());
        b.function(spec, |b, _| {
            if has_default {
                b.ret(Some(Expr::call(Expr::Type(self.wrapper.clone()), vec![])));
            } else {
                let memory = allocate(b);
                b.ret(Some(self.wrap_new(memory.reference())));
            }
            Ok::<_, GenerationError>(())
        })?;
        b.blank();
        Ok(())
    }

    /// `X((ptr to this))`
    fn wrap_new(&self, ptr: Expr) -> Expr {
        Expr::call(
            Expr::Type(self.wrapper.clone()),
            vec![ptr.to(Expr::raw("this"))],
        )
    }

    /// An `inline fun` forwarding to the C function of `method`.
    fn function(
        &self,
        b: &mut KotlinCodeBuilder,
        class: &ClassView<'_>,
        id: NodeId,
        method: &ResolvedMethod,
        receiver: Receiver,
    ) -> Result<(), GenerationError> {
        let element = element(class, &method.name);
        let skip = usize::from(method.method_type == MethodType::Method);
        let declared: Vec<&ResolvedArgument> = class.arguments(id).into_iter().skip(skip).collect();

        let mut modifiers = vec!["inline"];
        let mut dummy = false;
        let name = match method.operator.map(|op| op.kotlin()) {
            Some(style) if receiver == Receiver::Scope => style.name().to_string(),
            Some(KotlinOperatorStyle::OperatorSugar(name)) => {
                modifiers.push("operator");
                name.to_string()
            }
            Some(KotlinOperatorStyle::Infix(name)) if declared.len() == 1 => {
                modifiers.push("infix");
                name.to_string()
            }
            Some(KotlinOperatorStyle::DummyArgument(name)) => {
                dummy = true;
                name.to_string()
            }
            Some(style) => style.name().to_string(),
            None => kotlin_method_name(&method.name),
        };

        let mut spec = FunctionSpec::new(name);
        for modifier in modifiers {
            spec = spec.modifier(modifier);
        }
        if receiver == Receiver::Scope {
            spec = spec.receiver(named(types::MEM_SCOPE));
        }
        let params: &[&ResolvedArgument] = if dummy { &[] } else { &declared };
        for arg in params {
            spec = spec.arg(arg.name.clone(), kotlin_of(&arg.ty, "argument type", &element)?);
        }
        if method.return_style != ReturnStyle::Void {
            spec = spec.returning(kotlin_of(&method.return_type, "return type", &element)?);
        }

        b.function(spec, |b, vars| {
            let holder = match method.return_style {
                ReturnStyle::ArgCast => Some(self.holder_local(b, &method.return_type, receiver, &element)?),
                _ => None,
            };
            let mut args = Vec::new();
            if receiver == Receiver::Instance {
                args.push(Expr::raw("ptr"));
            }
            if dummy {
                args.push(Expr::raw("0"));
            } else {
                args.extend(vars.iter().zip(params).map(|(var, arg)| pass(var, arg)));
            }
            if let Some(holder) = &holder {
                args.push(holder.reference().dot("ptr"));
            }
            let call = self.c_call(&method.c_name, args);
            self.emit_return(b, method.return_style, &method.return_type, call, receiver, holder)
        })?;
        b.blank();
        Ok(())
    }

    /// `val retValue: X = memScope.X_Holder()`
    fn holder_local(
        &self,
        b: &mut KotlinCodeBuilder,
        ty: &ResolvedType,
        receiver: Receiver,
        element: &str,
    ) -> Result<Var, GenerationError> {
        let wrapper = match (&ty.class_ref, &ty.kotlin) {
            (Some(_), Some(kotlin)) => kotlin.clone().non_null(),
            _ => return Err(GenerationError::unsupported(format!("return type `{}`", ty.cpp), element)),
        };
        let holder = format!(
            "{}.Companion.{}_Holder",
            wrapper.fully_qualified(),
            wrapper.simple_name()
        );
        let init = receiver.mem_scope().dot(Expr::call(Expr::fq(holder), vec![]));
        Ok(b.define("retValue", wrapper, Some(init)))
    }

    fn emit_return(
        &self,
        b: &mut KotlinCodeBuilder,
        style: ReturnStyle,
        ty: &ResolvedType,
        call: Expr,
        receiver: Receiver,
        holder: Option<Var>,
    ) -> Result<(), GenerationError> {
        match style {
            ReturnStyle::Void => b.statement(call),
            ReturnStyle::ArgCast => {
                let holder = holder.ok_or_else(|| {
                    GenerationError::unsupported("by-value return without holder", ty.cpp.spelling())
                })?;
                b.statement(call);
                b.ret(Some(holder.reference()));
            }
            ReturnStyle::String | ReturnStyle::StringPointer => {
                let str = b.define("str", types::c_string(), Some(call));
                let value = b.define(
                    "ret",
                    named(types::STRING).nullable(),
                    Some(str.reference().qdot(Expr::call(Expr::fq(types::TO_K_STRING), vec![]))),
                );
                b.statement(Expr::call(Expr::fq(types::FREE), vec![str.reference()]));
                b.ret(Some(value.reference()));
            }
            _ => match (&ty.class_ref, &ty.kotlin) {
                (Some(_), Some(kotlin)) => {
                    let pointer = if kotlin.nullable {
                        call.elvis(Expr::ret(Some(Expr::raw("null"))))
                    } else {
                        call.not_null()
                    };
                    let wrapped = Expr::call(
                        Expr::Type(kotlin.clone().non_null()),
                        vec![pointer.to(receiver.mem_scope())],
                    );
                    b.ret(Some(wrapped));
                }
                _ => b.ret(Some(call)),
            },
        }
        Ok(())
    }
}

/// `val memory: COpaquePointer = (interpretCPointer(alloc(size, size).rawPtr) ?: error(..))`
fn allocate(b: &mut KotlinCodeBuilder) -> Var {
    let raw = Expr::call(
        Expr::fq(types::INTERPRET_C_POINTER),
        vec![Expr::raw("alloc(size, size).rawPtr")],
    )
    .elvis(Expr::call("error", vec![Expr::string("Allocation failed")]));
    b.define("memory", named(types::C_OPAQUE_POINTER), Some(raw))
}

/// Argument as passed to the C function: wrappers pass their pointer.
fn pass(var: &Var, arg: &ResolvedArgument) -> Expr {
    match &arg.ty.kotlin {
        Some(kotlin) if arg.ty.class_ref.is_some() => {
            if kotlin.nullable {
                var.reference().qdot("ptr")
            } else {
                var.reference().dot("ptr")
            }
        }
        _ => var.reference(),
    }
}

/// Whether an earlier method of `class` has the same name and Kotlin
/// argument types. `const` overloads collapse this way; the first wins.
fn overloads_earlier(class: &ClassView<'_>, id: NodeId, method: &ResolvedMethod) -> bool {
    let kotlin_args = |id: NodeId| -> Vec<Option<KotlinType>> {
        class
            .arguments(id)
            .iter()
            .map(|arg| arg.ty.kotlin.clone())
            .collect()
    };
    let own = kotlin_args(id);
    class
        .methods_of(MethodType::Method)
        .into_iter()
        .take_while(|(other, _)| *other != id)
        .any(|(other, m)| m.name == method.name && kotlin_args(other) == own)
}

fn kotlin_of(ty: &ResolvedType, what: &str, element: &str) -> Result<KotlinType, GenerationError> {
    ty.kotlin
        .clone()
        .ok_or_else(|| GenerationError::unsupported(format!("{} `{}`", what, ty.cpp), element))
}

fn element(class: &ClassView<'_>, member: &str) -> String {
    format!("{}::{}", class.class.spelling, member)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{LogPolicy, ThrowPolicy};
    use crate::resolver::ReferencePolicy;
    use crate::test_support::assertions::assert_lines_in_order;
    use crate::test_support::{
        const_overloads, namespace_tree, operator_class, resolved, resolved_scenario, test_lib,
        ClassFixture,
    };

    fn info() -> ModuleInfo {
        ModuleInfo::new("TestLib", "testLib")
    }

    fn file<'a>(files: &'a [GeneratedFile], name: &str) -> &'a str {
        files
            .iter()
            .find(|f| f.path == PathBuf::from(name))
            .map(|f| f.contents.as_str())
            .unwrap_or_else(|| panic!("no file {}", name))
    }

    #[test]
    fn test_kotlin_method_name() {
        assert_eq!(kotlin_method_name("sum"), "sum");
        assert_eq!(kotlin_method_name("eq"), "eq_method");
        assert_eq!(kotlin_method_name("a<b>"), "a_ltb_gt");
    }

    #[test]
    fn test_test_class_wrapper() {
        let files = KotlinWriter
            .generate(&info(), &resolved_scenario(), &ThrowPolicy)
            .unwrap();
        assert_eq!(files.len(), 1);
        let text = file(&files, "testLib_TestClass.kt");

        assert_lines_in_order(
            text,
            &[
                "package testLib",
                "import kotlin.Pair",
                "import kotlinx.cinterop.COpaquePointer",
                "import testLib.internal.TestLib_TestClass_sum",
                "// BEGIN SHIMSMITH GEN for TestLib::TestClass",
                "value class TestClass public constructor(val source: Pair<COpaquePointer, MemScope>) {",
                "    val ptr: COpaquePointer\n        inline get() {\n            return source.first\n        }",
                "    val memScope: MemScope",
                "    var b: Boolean\n        inline get() {\n            return TestLib_TestClass_b_get(ptr)\n        }",
                "        inline set(value) {\n            TestLib_TestClass_b_set(ptr, value)\n        }",
                "    inline fun sum(): Long {\n        return TestLib_TestClass_sum(ptr)\n    }",
                "    inline operator fun minus(other: TestClass): TestClass {",
                "        val retValue: TestClass = memScope.TestClass_Holder()",
                "        TestLib_TestClass_op_minus(ptr, other.ptr, retValue.ptr)",
                "        return retValue",
                "    companion object {",
                "        val size: Int\n            inline get() {\n                return TestLib_TestClass_size_of()",
                "        fun MemScope.TestClass(): TestClass {",
                "            val memory: COpaquePointer = (interpretCPointer(alloc(size, size).rawPtr) ?: error(\"Allocation failed\"))",
                "            val obj: COpaquePointer = (TestLib_TestClass_new(memory) ?: error(\"Creation failed\"))",
                "            return TestClass((obj to this))",
                "        fun MemScope.TestClass_Holder(): TestClass {\n            return TestClass()\n        }",
                "// END SHIMSMITH GEN for TestLib::TestClass",
            ],
        );
        assert!(text.contains("import testLib.TestClass.Companion.TestClass_Holder"));
        assert!(!text.contains("import testLib.TestClass\n"));
    }

    #[test]
    fn test_string_and_wrapper_returns() {
        let files = KotlinWriter
            .generate(
                &info(),
                &resolved(test_lib(), ReferencePolicy::IncludeMissing),
                &ThrowPolicy,
            )
            .unwrap();

        let other = file(&files, "testLib_OtherClass.kt");
        assert_lines_in_order(
            other,
            &[
                "inline fun name(): String? {",
                "val str: CPointer<ByteVar>? = TestLib_OtherClass_name(ptr)",
                "val ret: String? = str?.toKString()",
                "free(str)",
                "return ret",
            ],
        );
        assert!(other.contains("import platform.posix.free"));

        let test_class = file(&files, "testLib_TestClass.kt");
        assert!(test_class
            .contains("return OtherClass(((TestLib_TestClass_get_other(ptr) ?: return null) to memScope))"));
        assert!(test_class.contains("inline fun setOther(other: OtherClass?) {"));
        assert!(test_class.contains("TestLib_TestClass_set_other(ptr, other?.ptr)"));
    }

    #[test]
    fn test_operator_styles() {
        let files = KotlinWriter
            .generate(
                &ModuleInfo::new("Ops", "ops"),
                &resolved(operator_class(), ReferencePolicy::IgnoreMissing),
                &ThrowPolicy,
            )
            .unwrap();
        let text = file(&files, "ops_Num.kt");

        assert!(text.contains("inline operator fun plus(other: Num): Num {"));
        assert!(text.contains("inline infix fun eq(other: Num): Boolean {"));
        assert!(text.contains("inline operator fun get(index: Int): Int {"));
        assert!(text.contains("inline fun postIncrement(): Num {"));
        assert!(text.contains("ops_Num_op_post_increment(ptr, 0, retValue.ptr)"));
        assert!(text.contains("inline fun inv(): Num {"));
        assert!(text.contains("inline fun eq_method(other: Int): Boolean {"));
        assert!(text.contains("fun MemScope.Num(v: Int): Num {"));
        assert!(text.contains("            defer {\n                ops_Num_dispose(obj)\n            }"));
        assert!(text.contains("inline fun MemScope.zero(): Num? {"));
        assert!(text.contains("return Num(((ops_Num_zero() ?: return null) to this))"));
        // Num has no default constructor, so the holder allocates directly.
        assert!(text.contains("fun MemScope.Num_Holder(): Num {\n            val memory"));
    }

    #[test]
    fn test_inherited_methods() {
        let tree = resolved(
            namespace_tree(
                "n",
                vec![
                    ClassFixture::new("Base", "n::Base")
                        .method("run", "void", &[])
                        .method("stop", "void", &[])
                        .build(),
                    ClassFixture::new("Derived", "n::Derived")
                        .base("Base")
                        .method("stop", "void", &[])
                        .build(),
                ],
            ),
            ReferencePolicy::IgnoreMissing,
        );
        let files = KotlinWriter
            .generate(&ModuleInfo::new("n", "n"), &tree, &ThrowPolicy)
            .unwrap();
        let derived = file(&files, "n_Derived.kt");

        assert!(derived.contains("inline fun run() {\n        n_Base_run(ptr)\n    }"));
        assert!(derived.contains("n_Derived_stop(ptr)"));
        assert!(!derived.contains("n_Base_stop"));
    }

    #[test]
    fn test_unmapped_argument_unsupported() {
        let tree = resolved(
            namespace_tree(
                "n",
                vec![ClassFixture::new("C", "n::C")
                    .method("fill", "void", &[("values", "int[4]")])
                    .method("count", "int", &[])
                    .build()],
            ),
            ReferencePolicy::IgnoreMissing,
        );

        let policy = LogPolicy::new();
        let files = KotlinWriter
            .generate(&ModuleInfo::new("n", "n"), &tree, &policy)
            .unwrap();
        let text = file(&files, "n_C.kt");
        assert!(!text.contains("fill"));
        assert!(text.contains("inline fun count(): Int {"));
        let failures = policy.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].context.member.as_deref(), Some("fill"));

        let err = KotlinWriter
            .generate(&ModuleInfo::new("n", "n"), &tree, &ThrowPolicy)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Unsupported { .. }));
    }

    #[test]
    fn test_const_overloads_emit_one_function() {
        let tree = resolved(const_overloads(), ReferencePolicy::IgnoreMissing);
        let files = KotlinWriter
            .generate(&ModuleInfo::new("n", "n"), &tree, &ThrowPolicy)
            .unwrap();
        let text = file(&files, "n_C.kt");

        assert_eq!(text.matches("inline fun get(): Int {").count(), 1);
        assert_eq!(text.matches("inline fun at(i: Int): Int {").count(), 1);
        assert!(text.contains("return n_C_get(ptr)"));
        assert!(text.contains("return n_C_at(ptr, i)"));
        assert!(!text.contains("_n_C_get"));
        assert!(!text.contains("_n_C_at"));
    }

    #[test]
    fn test_opaque_types_pass_raw_pointers() {
        let tree = resolved(
            namespace_tree(
                "n",
                vec![ClassFixture::new("Holder", "n::Holder")
                    .method("setOther", "void", &[("o", "other::Missing*")])
                    .method("refOther", "other::Missing&", &[])
                    .build()],
            ),
            ReferencePolicy::OpaqueMissing,
        );
        let files = KotlinWriter
            .generate(&ModuleInfo::new("n", "n"), &tree, &ThrowPolicy)
            .unwrap();
        let text = file(&files, "n_Holder.kt");

        assert!(text.contains("inline fun setOther(o: COpaquePointer?) {"));
        assert!(text.contains("n_Holder_set_other(ptr, o)"));
        assert!(text.contains("inline fun refOther(): COpaquePointer? {"));
    }
}
