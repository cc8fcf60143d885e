//! The C++ shim: `extern "C"` bodies that forward to the library.
//!
//! Each C argument is first converted back to its C++ form in a `_cast`
//! local, then the call is made and its result carried back according to
//! the method's return style.

use std::path::{Path, PathBuf};

use crate::builder::{CppCodeBuilder, CppFactory, Expr, TypeSpec, Var};
use crate::core::operators::{Arity, OperatorCategory};
use crate::core::resolved::{
    CastMethod, MethodType, ResolvedArgument, ResolvedField, ResolvedMethod, ResolvedTree,
    ResolvedType, ReturnStyle,
};
use crate::core::tree::NodeId;
use crate::core::types::{CppType, STD_STRING};

use super::{
    c_args, c_spec, check_args, check_field, field_specs, marker, ClassView, CodeGenerationPolicy,
    CodeGenerator, ErrorContext, GenerationError, ModuleInfo,
};

/// Writes `<module>.cc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShimWriter;

/// Include path of `header` as seen from `output_dir`.
pub fn relative_include(header: &Path, output_dir: &Path) -> PathBuf {
    pathdiff::diff_paths(header, output_dir).unwrap_or_else(|| header.to_path_buf())
}

impl ShimWriter {
    pub fn generate(
        &self,
        info: &ModuleInfo,
        tree: &ResolvedTree,
        policy: &dyn CodeGenerationPolicy,
    ) -> Result<String, GenerationError> {
        let ctx = ErrorContext::module(&info.name);
        let mut b = CppCodeBuilder::new(CppFactory);
        b.include(&info.header_file());
        for header in &info.headers {
            let path = relative_include(header, &info.output_dir);
            b.include(&path.to_string_lossy().replace('\\', "/"));
        }
        for header in ["vector", "string", "iterator"] {
            b.include_sys(header);
        }
        b.blank();
        b.extern_c_open();
        b.blank();
        self.classes(&mut b, tree, policy, &ctx)?;
        b.extern_c_close();
        Ok(b.finish())
    }
}

impl CodeGenerator for ShimWriter {
    type Factory = CppFactory;

    fn class(
        &self,
        b: &mut CppCodeBuilder,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        b.comment(marker("BEGIN", class.class));
        b.blank();
        self.members(b, class, policy, ctx)?;
        b.comment(marker("END", class.class));
        b.blank();
        b.blank();
        Ok(())
    }

    fn method(&self, b: &mut CppCodeBuilder, class: &ClassView<'_>, id: NodeId) -> Result<(), GenerationError> {
        let Some(method) = class.tree.get(id).as_method() else {
            return Ok(());
        };
        let args = c_args(class, id, method);
        let spec = c_spec(&method.c_name, method.return_style, &method.return_type, &args);
        b.function(spec, |b, vars| {
            let refs = cast_args(b, class, &method.name, vars, &args)?;
            method_body(b, class, method, refs)
        })?;
        b.blank();
        Ok(())
    }

    fn field(
        &self,
        b: &mut CppCodeBuilder,
        class: &ClassView<'_>,
        field: &ResolvedField,
    ) -> Result<(), GenerationError> {
        check_field(class, field)?;
        let (getter, setter) = field_specs(field);

        b.function(getter, |b, vars| {
            let refs = cast_args(b, class, &field.name, vars, &field.getter.args)?;
            let thiz = receiver(class, &field.name, refs.first().cloned())?;
            emit_return(
                b,
                field.getter.return_style,
                &field.getter.return_type,
                thiz.arrow(field.name.as_str()),
                None,
            )
        })?;
        b.blank();

        if let Some(setter) = setter {
            b.function(setter, |b, vars| {
                let refs = cast_args(b, class, &field.name, vars, &field.setter.args)?;
                let mut refs = refs.into_iter();
                let thiz = receiver(class, &field.name, refs.next())?;
                let value = refs.next().ok_or_else(|| {
                    GenerationError::unsupported("setter without value", element(class, &field.name))
                })?;
                b.statement(thiz.arrow(field.name.as_str()).assign(value));
                Ok(())
            })?;
            b.blank();
        }
        Ok(())
    }
}

fn element(class: &ClassView<'_>, member: &str) -> String {
    format!("{}::{}", class.class.spelling, member)
}

fn receiver(class: &ClassView<'_>, member: &str, thiz: Option<Expr>) -> Result<Expr, GenerationError> {
    thiz.ok_or_else(|| GenerationError::unsupported("member without receiver", element(class, member)))
}

/// Convert each C argument to the value the C++ call takes.
fn cast_args(
    b: &mut CppCodeBuilder,
    class: &ClassView<'_>,
    member: &str,
    vars: &[Var],
    args: &[ResolvedArgument],
) -> Result<Vec<Expr>, GenerationError> {
    check_args(class, member, args)?;
    let mut refs = Vec::with_capacity(args.len());
    for (var, arg) in vars.iter().zip(args) {
        let sig = &arg.signature_type;
        let value = match sig.cast {
            CastMethod::Native => var.reference(),
            CastMethod::Cast => {
                let target = sig.cpp.unqualified().clone();
                b.reinterpret_local(var, TypeSpec::Cpp(target)).reference()
            }
            CastMethod::String | CastMethod::PointedString => {
                let local = b.define(
                    &format!("{}_cast", var.name),
                    TypeSpec::Raw(STD_STRING.to_string()),
                    Some(Expr::call(STD_STRING, vec![var.reference()])),
                );
                if sig.cast == CastMethod::PointedString {
                    local.reference().address_of()
                } else {
                    local.reference()
                }
            }
            CastMethod::Raw => {
                let target = sig.cpp.unqualified().clone();
                let cast = Expr::cast(target.spelling(), var.reference());
                b.define(&format!("{}_cast", var.name), target, Some(cast))
                    .reference()
            }
        };
        refs.push(if arg.needs_dereference { value.deref() } else { value });
    }
    Ok(refs)
}

fn method_body(
    b: &mut CppCodeBuilder,
    class: &ClassView<'_>,
    method: &ResolvedMethod,
    mut refs: Vec<Expr>,
) -> Result<(), GenerationError> {
    let spelling = class.class.spelling.as_str();
    let ret_value = match method.return_style {
        ReturnStyle::ArgCast => refs.pop(),
        _ => None,
    };
    let has_receiver = matches!(
        method.method_type,
        MethodType::Constructor | MethodType::Method | MethodType::Destructor
    );
    let (first, args) = if has_receiver && !refs.is_empty() {
        let rest = refs.split_off(1);
        (refs.pop(), rest)
    } else {
        (None, refs)
    };

    let call = match method.method_type {
        MethodType::Constructor => {
            let location = receiver(class, &method.name, first)?;
            b.ret(Some(Expr::placement_new(location, Expr::call(spelling, args))));
            return Ok(());
        }
        MethodType::Destructor => {
            let thiz = receiver(class, &method.name, first)?;
            let name = class.class.name.split('<').next().unwrap_or_default();
            b.statement(thiz.arrow(Expr::call(format!("~{}", name), vec![])));
            return Ok(());
        }
        MethodType::SizeOf => {
            b.ret(Some(Expr::call("sizeof", vec![Expr::raw(spelling)])));
            return Ok(());
        }
        MethodType::Static => Expr::raw(spelling).colons(Expr::call(method.name.as_str(), args)),
        MethodType::StaticOp => static_operator(class, method, args)?,
        MethodType::Method => {
            let thiz = receiver(class, &method.name, first)?;
            instance_call(method, thiz, args)
        }
    };
    emit_return(b, method.return_style, &method.return_type, call, ret_value)
}

fn static_operator(
    class: &ClassView<'_>,
    method: &ResolvedMethod,
    args: Vec<Expr>,
) -> Result<Expr, GenerationError> {
    let unsupported = || GenerationError::unsupported("static operator", element(class, &method.name));
    let op = method.operator.ok_or_else(unsupported)?;
    let mut args = args.into_iter();
    let lhs = args.next().ok_or_else(unsupported)?;
    match (op.arity(), args.next()) {
        (Arity::Binary, Some(rhs)) => Ok(lhs.op(op.token(), rhs)),
        (Arity::Unary, None) => Ok(Expr::Seq(vec![Expr::raw(op.token()), lhs])),
        _ => Err(unsupported()),
    }
}

fn instance_call(method: &ResolvedMethod, thiz: Expr, args: Vec<Expr>) -> Expr {
    if let Some(op) = method.operator {
        let category = op.category();
        if matches!(category, OperatorCategory::DirectCall | OperatorCategory::Assignment) {
            if let [rhs] = args.as_slice() {
                return thiz.deref().op(op.token(), rhs.clone());
            }
        }
    }
    thiz.arrow(Expr::call(method.name.as_str(), args))
}

/// Carry `call`'s result across the boundary.
fn emit_return(
    b: &mut CppCodeBuilder,
    style: ReturnStyle,
    ty: &ResolvedType,
    call: Expr,
    ret_value: Option<Expr>,
) -> Result<(), GenerationError> {
    match style {
        ReturnStyle::Void => b.statement(call),
        ReturnStyle::Return | ReturnStyle::ReturnReference => b.ret(Some(call)),
        ReturnStyle::VoidP => b.ret(Some(Expr::cast("void*", call))),
        ReturnStyle::VoidPReference => b.ret(Some(Expr::cast("void*", call.address_of()))),
        ReturnStyle::ArgCast => {
            let target = ret_value.ok_or_else(|| {
                GenerationError::unsupported("by-value return without ret_value", ty.cpp.spelling())
            })?;
            b.statement(target.assign(call));
        }
        ReturnStyle::CopyConstructor => {
            let class = ty.cpp.unqualified().spelling();
            b.ret(Some(Expr::new_object(Expr::call(class, vec![call]))));
        }
        ReturnStyle::String => copy_string(b, call, false),
        ReturnStyle::StringPointer => copy_string(b, call, true),
    }
    Ok(())
}

/// Copy a string result into a NUL-terminated heap buffer the caller frees.
fn copy_string(b: &mut CppCodeBuilder, call: Expr, through_pointer: bool) {
    let value_ty = if through_pointer {
        CppType::pointer(CppType::named(STD_STRING))
    } else {
        CppType::named(STD_STRING)
    };
    let value = b.define("ret_value", value_ty, Some(call));
    let member = |name: &str, args: Vec<Expr>| {
        let call = Expr::call(name, args);
        if through_pointer {
            value.reference().arrow(call)
        } else {
            value.reference().dot(call)
        }
    };
    let length = member("length", vec![]);

    let buffer = b.define(
        &format!("{}_cast", value.name),
        TypeSpec::Raw("char*".to_string()),
        Some(Expr::new_object(Expr::Seq(vec![
            Expr::raw("char["),
            length.clone().op("+", Expr::raw("1")),
            Expr::raw("]"),
        ]))),
    );
    b.statement(member(
        "copy",
        vec![buffer.reference(), length.clone(), Expr::raw("0")],
    ));
    b.statement(
        Expr::Seq(vec![
            buffer.reference(),
            Expr::raw("["),
            length,
            Expr::raw("]"),
        ])
        .assign(Expr::raw("'\\0'")),
    );
    b.ret(Some(buffer.reference()));
}
