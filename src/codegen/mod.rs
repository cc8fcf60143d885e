//! Writers for the generated artifacts.
//!
//! Every writer walks the resolved tree the same way: module, then each
//! class, then each method or field of the class. The walk lives in
//! [`CodeGenerator`]; writers only say what one element looks like. Each
//! class and member is emitted under a [`CodeGenerationPolicy`]: on error its
//! partial output is rolled back and the policy decides whether generation
//! stops or moves on to the next sibling.
//!
//! # Outputs
//!
//! - [`header::HeaderWriter`]: `<module>.h`, the C declarations
//! - [`shim::ShimWriter`]: `<module>.cc`, the C++ bodies
//! - [`kotlin::KotlinWriter`]: one `.kt` file per class
//! - [`def::DefWriter`]: `<module>.def`, the cinterop manifest

pub mod compile_flags;
pub mod def;
pub mod errors;
pub mod header;
pub mod kotlin;
pub mod policy;
pub mod shim;

pub use compile_flags::CompileFlags;
pub use errors::GenerationError;
pub use policy::{
    CodeGenerationPolicy, ErrorContext, ErrorPolicy, GenerationFailure, LogPolicy, ThrowPolicy,
};

use std::path::PathBuf;

use crate::builder::{CodeBuilder, FunctionSpec, LangFactory};
use crate::core::namer::snake_case;
use crate::core::resolved::{
    self, CastMethod, MethodType, Resolved, ResolvedArgument, ResolvedClass, ResolvedField,
    ResolvedMethod, ResolvedTree, ResolvedType, ReturnStyle,
};
use crate::core::tree::NodeId;
use crate::core::types::CppType;

/// Name of the argument that receives non-returnable results.
pub const RET_VALUE: &str = "ret_value";

/// Identity of the module being generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module name, the stem of every generated file.
    pub name: String,
    /// Kotlin package for global classes; C functions live in `<package>.internal`.
    pub package: String,
    /// Headers the shim includes.
    pub headers: Vec<PathBuf>,
    /// Directory the shim and header are written to.
    pub output_dir: PathBuf,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        ModuleInfo {
            name: name.into(),
            package: package.into(),
            ..Default::default()
        }
    }

    pub fn with_headers(mut self, headers: Vec<PathBuf>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Stem of the header and shim files.
    pub fn file_stem(&self) -> String {
        snake_case(&self.name)
    }

    pub fn header_file(&self) -> String {
        format!("{}.h", self.file_stem())
    }

    pub fn shim_file(&self) -> String {
        format!("{}.cc", self.file_stem())
    }

    pub fn def_file(&self) -> String {
        format!("{}.def", self.file_stem())
    }

    /// Package holding the cinterop view of the C functions.
    pub fn internal_package(&self) -> String {
        if self.package.is_empty() {
            "internal".to_string()
        } else {
            format!("{}.internal", self.package)
        }
    }
}

/// A rendered file, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// One class of the resolved tree, with its members.
#[derive(Debug, Clone, Copy)]
pub struct ClassView<'a> {
    pub tree: &'a ResolvedTree,
    pub id: NodeId,
    pub class: &'a ResolvedClass,
}

impl<'a> ClassView<'a> {
    pub fn new(tree: &'a ResolvedTree, id: NodeId) -> Option<Self> {
        let class = tree.get(id).as_class()?;
        Some(ClassView { tree, id, class })
    }

    /// Every class of the tree, in order.
    pub fn all(tree: &'a ResolvedTree) -> Vec<ClassView<'a>> {
        resolved::classes(tree)
            .into_iter()
            .filter_map(|id| ClassView::new(tree, id))
            .collect()
    }

    pub fn members(&self) -> &'a [NodeId] {
        self.tree.children(self.id)
    }

    /// Methods with their node ids.
    pub fn methods(&self) -> Vec<(NodeId, &'a ResolvedMethod)> {
        let tree = self.tree;
        self.members()
            .iter()
            .filter_map(|id| tree.get(*id).as_method().map(|m| (*id, m)))
            .collect()
    }

    pub fn methods_of(&self, method_type: MethodType) -> Vec<(NodeId, &'a ResolvedMethod)> {
        self.methods()
            .into_iter()
            .filter(|(_, m)| m.method_type == method_type)
            .collect()
    }

    pub fn arguments(&self, method: NodeId) -> Vec<&'a ResolvedArgument> {
        resolved::arguments(self.tree, method)
    }

    pub fn size_of(&self) -> Result<&'a ResolvedMethod, GenerationError> {
        self.methods_of(MethodType::SizeOf)
            .into_iter()
            .map(|(_, m)| m)
            .next()
            .ok_or_else(|| GenerationError::MissingSizeOf(self.class.spelling.clone()))
    }

    pub fn destructor(&self) -> Option<&'a ResolvedMethod> {
        self.methods_of(MethodType::Destructor)
            .into_iter()
            .map(|(_, m)| m)
            .next()
    }

    /// Resolved base classes. A base outside the module is an error.
    pub fn bases(&self) -> Vec<Result<ClassView<'a>, GenerationError>> {
        resolved::bases(self.tree, self.id)
            .into_iter()
            .map(|base| {
                let unknown = || GenerationError::UnknownBaseClass {
                    class: self.class.spelling.clone(),
                    base: base.ty.cpp.spelling(),
                };
                let spelling = base.ty.class_ref.as_deref().ok_or_else(unknown)?;
                resolved::find_class(self.tree, spelling)
                    .and_then(|id| ClassView::new(self.tree, id))
                    .ok_or_else(unknown)
            })
            .collect()
    }
}

/// Run `f` for one element. On error its output is discarded and `policy`
/// decides whether the error propagates. Returns `None` when the element
/// was skipped.
pub fn guarded<F: LangFactory, R>(
    b: &mut CodeBuilder<F>,
    policy: &dyn CodeGenerationPolicy,
    ctx: &ErrorContext,
    f: impl FnOnce(&mut CodeBuilder<F>) -> Result<R, GenerationError>,
) -> Result<Option<R>, GenerationError> {
    let checkpoint = b.checkpoint();
    match f(b) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            b.rollback(checkpoint);
            policy.on_error(ctx, err)?;
            Ok(None)
        }
    }
}

/// The per-element part of a writer.
pub trait CodeGenerator {
    type Factory: LangFactory;

    fn method(
        &self,
        b: &mut CodeBuilder<Self::Factory>,
        class: &ClassView<'_>,
        method: NodeId,
    ) -> Result<(), GenerationError>;

    fn field(
        &self,
        b: &mut CodeBuilder<Self::Factory>,
        class: &ClassView<'_>,
        field: &ResolvedField,
    ) -> Result<(), GenerationError>;

    /// One class. Defaults to its members in declaration order.
    fn class(
        &self,
        b: &mut CodeBuilder<Self::Factory>,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        self.members(b, class, policy, ctx)
    }

    /// Every method and field of `class`, each guarded by `policy`.
    fn members(
        &self,
        b: &mut CodeBuilder<Self::Factory>,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        for id in class.members() {
            match class.tree.get(*id) {
                Resolved::Method(m) => {
                    guarded(b, policy, &ctx.member(&m.name), |b| {
                        require_name("method", &m.name, class)?;
                        self.method(b, class, *id)
                    })?;
                }
                Resolved::Field(f) => {
                    guarded(b, policy, &ctx.member(&f.name), |b| {
                        require_name("field", &f.name, class)?;
                        self.field(b, class, f)
                    })?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Every class of the tree, each guarded by `policy`.
    fn classes(
        &self,
        b: &mut CodeBuilder<Self::Factory>,
        tree: &ResolvedTree,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        for class in ClassView::all(tree) {
            let class_ctx = ctx.class(&class.class.spelling);
            guarded(b, policy, &class_ctx, |b| {
                self.class(b, &class, policy, &class_ctx)
            })?;
        }
        Ok(())
    }
}

fn require_name(kind: &'static str, name: &str, class: &ClassView<'_>) -> Result<(), GenerationError> {
    if name.is_empty() {
        return Err(GenerationError::MissingName {
            kind,
            class: class.class.spelling.clone(),
        });
    }
    Ok(())
}

/// Array fields have no C shape.
pub fn check_field(class: &ClassView<'_>, field: &ResolvedField) -> Result<(), GenerationError> {
    if field.ty.cpp.unqualified().is_array() {
        return Err(GenerationError::unsupported(
            "array field",
            format!("{}::{}", class.class.spelling, field.name),
        ));
    }
    check_args(class, &field.name, &field.getter.args)?;
    check_args(class, &field.name, &field.setter.args)
}

/// Reject arguments the shim cannot cast back, so the header never declares
/// a function the shim leaves out. A [`CastMethod::Cast`] argument must be
/// carried as a pointer.
pub fn check_args(
    class: &ClassView<'_>,
    member: &str,
    args: &[ResolvedArgument],
) -> Result<(), GenerationError> {
    let uncastable = args.iter().find(|arg| {
        let sig = &arg.signature_type;
        sig.cast == CastMethod::Cast && !sig.cpp.unqualified().is_pointer()
    });
    match uncastable {
        Some(arg) => Err(GenerationError::unsupported(
            format!("argument type `{}`", arg.signature_type.cpp),
            format!("{}::{}", class.class.spelling, member),
        )),
        None => Ok(()),
    }
}

/// `BEGIN`/`END` marker text around each class.
pub fn marker(edge: &str, class: &ResolvedClass) -> String {
    format!("{} SHIMSMITH GEN for {}", edge, class.spelling)
}

/// C return type, `None` for `void`.
pub fn c_return(style: ReturnStyle, ty: &ResolvedType) -> Option<CppType> {
    match style {
        ReturnStyle::Void | ReturnStyle::ArgCast => None,
        _ if ty.c_type.is_void() => None,
        _ => Some(ty.c_type.clone()),
    }
}

/// The trailing argument an [`ReturnStyle::ArgCast`] function writes through.
pub fn ret_value_arg(ret: &ResolvedType) -> ResolvedArgument {
    let pointer = ResolvedType {
        cpp: CppType::pointer(ret.cpp.unqualified().clone()),
        c_type: CppType::void_ptr(),
        kotlin: ret.kotlin.clone(),
        cast: CastMethod::Cast,
        class_ref: ret.class_ref.clone(),
    };
    ResolvedArgument {
        name: RET_VALUE.to_string(),
        ty: ret.clone(),
        signature_type: pointer,
        needs_dereference: true,
        has_default: false,
    }
}

/// Arguments of the C function for `method`, `ret_value` included.
pub fn c_args(class: &ClassView<'_>, id: NodeId, method: &ResolvedMethod) -> Vec<ResolvedArgument> {
    let mut args: Vec<ResolvedArgument> = class.arguments(id).into_iter().cloned().collect();
    if method.return_style == ReturnStyle::ArgCast {
        args.push(ret_value_arg(&method.return_type));
    }
    args
}

/// C signature of a function.
pub fn c_spec(
    name: &str,
    style: ReturnStyle,
    ret: &ResolvedType,
    args: &[ResolvedArgument],
) -> FunctionSpec {
    let mut spec = FunctionSpec::new(name);
    if let Some(ret) = c_return(style, ret) {
        spec = spec.returning(ret);
    }
    for arg in args {
        spec = spec.arg(arg.name.clone(), arg.signature_type.c_type.clone());
    }
    spec
}

/// C signatures of a field's getter and setter. Const fields have no setter.
pub fn field_specs(field: &ResolvedField) -> (FunctionSpec, Option<FunctionSpec>) {
    let getter = c_spec(
        &field.getter.c_name,
        field.getter.return_style,
        &field.getter.return_type,
        &field.getter.args,
    );
    let setter = (!field.is_const).then(|| {
        c_spec(
            &field.setter.c_name,
            ReturnStyle::Void,
            &field.ty,
            &field.setter.args,
        )
    });
    (getter, setter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CppFactory;
    use crate::core::resolved::find_class;
    use crate::resolver::ReferencePolicy;
    use crate::test_support::{namespace_tree, resolved, resolved_scenario, ClassFixture};

    #[test]
    fn test_module_file_names() {
        let info = ModuleInfo::new("TestLib", "com.example");
        assert_eq!(info.header_file(), "test_lib.h");
        assert_eq!(info.shim_file(), "test_lib.cc");
        assert_eq!(info.internal_package(), "com.example.internal");
    }

    #[test]
    fn test_arg_cast_appends_ret_value() {
        let tree = resolved_scenario();
        let class = ClassView::new(&tree, find_class(&tree, "TestLib::TestClass").unwrap()).unwrap();
        let (id, minus) = class
            .methods()
            .into_iter()
            .find(|(_, m)| m.name == "operator-")
            .unwrap();

        let args = c_args(&class, id, minus);
        let names: Vec<&str> = args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["thiz", "other", "ret_value"]);
        assert_eq!(args[2].signature_type.cpp.spelling(), "TestLib::TestClass*");
        assert_eq!(c_return(minus.return_style, &minus.return_type), None);
    }

    #[test]
    fn test_guarded_rolls_back_under_log_policy() {
        let policy = LogPolicy::new();
        let mut b = CodeBuilder::new(CppFactory);
        b.comment("kept");
        let result = guarded(&mut b, &policy, &ErrorContext::module("m"), |b| {
            b.comment("partial");
            Err::<(), _>(GenerationError::MissingSizeOf("A".into()))
        });

        assert_eq!(result, Ok(None));
        assert_eq!(policy.failures().len(), 1);
        assert_eq!(b.finish(), "// kept\n");
    }

    #[test]
    fn test_guarded_propagates_under_throw_policy() {
        let mut b = CodeBuilder::new(CppFactory);
        let result = guarded(&mut b, &ThrowPolicy, &ErrorContext::module("m"), |_| {
            Err::<(), _>(GenerationError::MissingSizeOf("A".into()))
        });
        assert_eq!(result, Err(GenerationError::MissingSizeOf("A".into())));
    }

    #[test]
    fn test_const_field_has_no_setter() {
        let tree = resolved(
            namespace_tree(
                "n",
                vec![ClassFixture::new("C", "n::C").field("k", "const int").build()],
            ),
            ReferencePolicy::IgnoreMissing,
        );
        let class = ClassView::new(&tree, find_class(&tree, "n::C").unwrap()).unwrap();
        let field = resolved::fields(&tree, class.id)[0];

        let (getter, setter) = field_specs(field);
        assert_eq!(getter.name, "n_C_k_get");
        assert!(setter.is_none());
    }
}
