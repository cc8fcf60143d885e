//! ABI fix-ups and conversion into the resolved tree.
//!
//! Once every class of a session has been mapped, each one is adjusted for
//! the C boundary (implicit constructor, void assignment, hidden allocation
//! functions) and converted into [`Resolved`] nodes that carry their C shape:
//! return style, casts, signature types and unique C names.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::core::decl::{ArgumentDecl, ClassDecl, Decl, FieldDecl, MethodDecl, MethodKind};
use crate::core::namer::Namer;
use crate::core::operators::{Operator, OperatorCategory};
use crate::core::resolved::{
    CastMethod, FieldGetter, FieldSetter, KotlinType, MethodType, Resolved, ResolvedArgument,
    ResolvedBase, ResolvedClass, ResolvedField, ResolvedMethod, ResolvedType, ReturnStyle,
};
use crate::core::tree::Detached;
use crate::core::types::CppType;

/// Name of the size query appended to every class.
pub const SIZE_OF: &str = "size_of";

/// Adjust a mapped class for the C boundary.
///
/// `base_has_constructor` is true when a resolved base class declares a
/// constructor, which rules out an implicit default one.
pub fn fix_up(mut class: Detached<Decl>, base_has_constructor: bool) -> Detached<Decl> {
    let Decl::Class(decl) = &class.kind else {
        return class;
    };
    let decl = decl.clone();

    let has_constructor = decl.has_constructor
        || class
            .children
            .iter()
            .any(|c| matches!(&c.kind, Decl::Method(m) if m.kind == MethodKind::Constructor));
    if !decl.is_abstract && !has_constructor && !base_has_constructor {
        class.children.push(Detached::new(Decl::Method(MethodDecl {
            name: decl.name.clone(),
            kind: MethodKind::Constructor,
            return_type: CppType::void(),
            is_const: false,
        })));
    }

    class.children.retain(|member| {
        let Decl::Method(m) = &member.kind else {
            return true;
        };
        match m.kind {
            MethodKind::Constructor => !decl.has_hidden_new,
            MethodKind::Destructor => !decl.has_hidden_delete,
            _ if m.name.starts_with("operator") => {
                let known = operator_of(m, member.children.len()).is_some();
                if !known {
                    debug!("skipping unsupported {} on {}", m.name, decl.spelling());
                }
                known
            }
            _ => true,
        }
    });

    for member in &mut class.children {
        let argc = member.children.len();
        if let Decl::Method(m) = &mut member.kind {
            let is_assignment = operator_of(m, argc)
                .is_some_and(|op| op.category() == OperatorCategory::Assignment);
            if is_assignment {
                m.return_type = CppType::void();
            }
        }
    }
    class
}

fn operator_of(method: &MethodDecl, argc: usize) -> Option<Operator> {
    let argc = match method.kind {
        MethodKind::StaticOperator => argc.checked_sub(1)?,
        _ => argc,
    };
    Operator::from_method(&method.name, argc)
}

static NO_OPAQUE: BTreeSet<String> = BTreeSet::new();

/// Converts mapped classes into resolved nodes.
pub struct AbiConverter<'a> {
    classes: &'a HashSet<String>,
    opaque: &'a BTreeSet<String>,
    package: &'a str,
}

impl<'a> AbiConverter<'a> {
    /// `classes` holds the spellings of every class in the module.
    /// Global-namespace classes are placed in `package` on the Kotlin side.
    pub fn new(classes: &'a HashSet<String>, package: &'a str) -> Self {
        AbiConverter {
            classes,
            opaque: &NO_OPAQUE,
            package,
        }
    }

    /// Spellings kept as written under the opaque policy. Types naming
    /// them become `COpaquePointer` in Kotlin.
    pub fn with_opaque(mut self, opaque: &'a BTreeSet<String>) -> Self {
        self.opaque = opaque;
        self
    }

    /// Convert a fixed-up class. A `size_of` method is appended.
    pub fn convert_class(&self, class: &Detached<Decl>, namer: &mut Namer) -> Option<Detached<Resolved>> {
        let Decl::Class(decl) = &class.kind else {
            return None;
        };
        let spelling = decl.spelling();
        let resolved = ResolvedClass {
            name: decl.name.clone(),
            spelling: spelling.clone(),
            ty: self.resolve_type(&decl.ty),
            c_name: Namer::canonical_name(&spelling),
        };

        let mut children = Vec::new();
        for member in &class.children {
            match &member.kind {
                Decl::Method(m) => {
                    let args: Vec<&ArgumentDecl> = member
                        .children
                        .iter()
                        .filter_map(|a| match &a.kind {
                            Decl::Argument(arg) => Some(arg),
                            _ => None,
                        })
                        .collect();
                    children.push(self.convert_method(decl, m, &args, namer));
                }
                Decl::Field(f) => children.push(self.convert_field(decl, f, namer)),
                Decl::Base(b) => children.push(Detached::new(Resolved::Base(ResolvedBase {
                    ty: self.resolve_type(&b.ty),
                }))),
                _ => {}
            }
        }
        children.push(self.size_of(&spelling, namer));

        Some(Detached::new(Resolved::Class(resolved)).with_children(children))
    }

    fn convert_method(
        &self,
        class: &ClassDecl,
        method: &MethodDecl,
        args: &[&ArgumentDecl],
        namer: &mut Namer,
    ) -> Detached<Resolved> {
        let spelling = class.spelling();
        let method_type = match method.kind {
            MethodKind::Constructor => MethodType::Constructor,
            MethodKind::Destructor => MethodType::Destructor,
            MethodKind::Static => MethodType::Static,
            MethodKind::StaticOperator => MethodType::StaticOp,
            MethodKind::InstanceMethod => MethodType::Method,
        };

        // Static operators name their left operand explicitly; the namer and
        // operator table see the remaining arity.
        let operand_spellings: Vec<String> = args
            .iter()
            .skip(usize::from(method_type == MethodType::StaticOp))
            .map(|a| a.ty.spelling())
            .collect();
        let operator = match method_type {
            MethodType::Method | MethodType::StaticOp => {
                Operator::from_method(&method.name, operand_spellings.len())
            }
            _ => None,
        };
        let c_name = namer.unique_method_name(
            &spelling,
            method_type,
            &method.name,
            &operand_spellings,
            method.is_const,
        );

        let (return_type, return_style) = match method_type {
            MethodType::Constructor => (
                self.resolve_type(&CppType::pointer(class.ty.clone())),
                ReturnStyle::VoidP,
            ),
            MethodType::Destructor => (self.resolve_type(&CppType::void()), ReturnStyle::Void),
            _ => (
                self.resolve_type(&method.return_type),
                self.return_style(&method.return_type),
            ),
        };

        let is_copy_constructor = method_type == MethodType::Constructor
            && args.len() == 1
            && args[0]
                .ty
                .referent()
                .is_some_and(|t| t.unqualified().spelling() == spelling);

        let mut taken = HashSet::new();
        let mut resolved_args = Vec::new();
        match method_type {
            MethodType::Constructor => {
                resolved_args.push(self.location_arg());
                taken.insert("location".to_string());
            }
            MethodType::Method | MethodType::Destructor => {
                resolved_args.push(self.thiz_arg(&class.ty));
                taken.insert("thiz".to_string());
            }
            _ => {}
        }
        taken.insert("ret_value".to_string());
        for (index, arg) in args.iter().enumerate() {
            let name = unique_arg_name(&arg.name, index, &mut taken);
            resolved_args.push(self.convert_argument(&name, &arg.ty, arg.has_default));
        }

        let resolved = ResolvedMethod {
            name: method.name.clone(),
            method_type,
            return_type,
            return_style,
            c_name,
            operator,
            qualified: spelling,
            is_copy_constructor,
        };
        Detached::new(Resolved::Method(resolved)).with_children(
            resolved_args
                .into_iter()
                .map(|a| Detached::new(Resolved::Argument(a))),
        )
    }

    fn convert_field(&self, class: &ClassDecl, field: &FieldDecl, namer: &mut Namer) -> Detached<Resolved> {
        let spelling = class.spelling();
        let ty = &field.ty;
        let return_style = if self.is_by_value_object(ty) {
            ReturnStyle::VoidPReference
        } else {
            self.return_style(ty)
        };

        let getter = FieldGetter {
            c_name: namer.unique_field_getter(&spelling, &field.name),
            return_style,
            return_type: self.resolve_type(ty),
            args: vec![self.thiz_arg(&class.ty)],
        };
        let setter = FieldSetter {
            c_name: namer.unique_field_setter(&spelling, &field.name),
            args: vec![
                self.thiz_arg(&class.ty),
                self.convert_argument("value", ty, false),
            ],
        };

        Detached::new(Resolved::Field(ResolvedField {
            name: field.name.clone(),
            ty: self.resolve_type(ty),
            is_const: ty.is_const(),
            getter,
            setter,
        }))
    }

    fn size_of(&self, spelling: &str, namer: &mut Namer) -> Detached<Resolved> {
        let int = CppType::native("int");
        Detached::new(Resolved::Method(ResolvedMethod {
            name: SIZE_OF.to_string(),
            method_type: MethodType::SizeOf,
            return_type: self.resolve_type(&int),
            return_style: ReturnStyle::Return,
            c_name: namer.unique_method_name(spelling, MethodType::SizeOf, SIZE_OF, &[], false),
            operator: None,
            qualified: spelling.to_string(),
            is_copy_constructor: false,
        }))
    }

    fn thiz_arg(&self, class_ty: &CppType) -> ResolvedArgument {
        let ty = self.resolve_type(&CppType::pointer(class_ty.clone()));
        ResolvedArgument {
            name: "thiz".to_string(),
            signature_type: ty.clone(),
            ty,
            needs_dereference: false,
            has_default: false,
        }
    }

    fn location_arg(&self) -> ResolvedArgument {
        let ty = self.resolve_type(&CppType::void_ptr());
        ResolvedArgument {
            name: "location".to_string(),
            signature_type: ty.clone(),
            ty,
            needs_dereference: false,
            has_default: false,
        }
    }

    /// Convert a declared argument. References are stripped; objects passed
    /// by value cross the boundary as pointers and are dereferenced.
    pub fn convert_argument(&self, name: &str, ty: &CppType, has_default: bool) -> ResolvedArgument {
        let value_ty = ty.dereferenced().clone();
        let needs_dereference = self.is_by_value_object(&value_ty);
        let signature = if needs_dereference {
            CppType::pointer(value_ty.clone())
        } else {
            value_ty.clone()
        };
        ResolvedArgument {
            name: name.to_string(),
            ty: self.resolve_type(&value_ty),
            signature_type: self.resolve_type(&signature),
            needs_dereference,
            has_default,
        }
    }

    /// Objects that cannot be carried in a C value.
    fn is_by_value_object(&self, ty: &CppType) -> bool {
        !ty.is_native() && !ty.is_pointer() && !ty.is_reference() && !ty.is_array() && !ty.is_string()
    }

    /// How a value of `ty` is returned across the boundary.
    pub fn return_style(&self, ty: &CppType) -> ReturnStyle {
        if ty.is_void() {
            return ReturnStyle::Void;
        }
        if ty.dereferenced().is_string() {
            return ReturnStyle::String;
        }
        if let Some(pointee) = ty.pointee() {
            if pointee.is_string() {
                return ReturnStyle::StringPointer;
            }
            return if pointee.is_native() {
                ReturnStyle::Return
            } else {
                ReturnStyle::VoidP
            };
        }
        if ty.is_native() {
            return ReturnStyle::Return;
        }
        if let Some(referent) = ty.referent() {
            return if referent.is_native() {
                ReturnStyle::ReturnReference
            } else {
                ReturnStyle::VoidPReference
            };
        }
        if ty.is_array() {
            return ReturnStyle::VoidP;
        }
        match self.class_target(ty) {
            Some(_) => ReturnStyle::ArgCast,
            None => ReturnStyle::CopyConstructor,
        }
    }

    /// Project a C++ type onto its C and Kotlin forms.
    pub fn resolve_type(&self, cpp: &CppType) -> ResolvedType {
        let (c_type, cast) = c_projection(cpp);
        ResolvedType {
            cpp: cpp.clone(),
            c_type,
            kotlin: self.kotlin_type(cpp),
            cast,
            class_ref: self.class_target(cpp),
        }
    }

    /// The module class a type refers to, through at most one pointer or
    /// reference.
    fn class_target(&self, ty: &CppType) -> Option<String> {
        let spelling = named_target(ty)?;
        self.classes.contains(&spelling).then_some(spelling)
    }

    fn is_opaque(&self, ty: &CppType) -> bool {
        named_target(ty).is_some_and(|spelling| self.opaque.contains(&spelling))
    }

    fn wrapper_type(&self, spelling: &str) -> Option<KotlinType> {
        if spelling.contains('<') {
            return None;
        }
        let fq = if spelling.contains("::") {
            spelling.replace("::", ".")
        } else if self.package.is_empty() {
            spelling.to_string()
        } else {
            format!("{}.{}", self.package, spelling)
        };
        Some(KotlinType::new(&fq, true))
    }

    fn kotlin_type(&self, cpp: &CppType) -> Option<KotlinType> {
        if self.is_opaque(cpp) {
            return Some(opaque_pointer());
        }
        match cpp.unqualified() {
            CppType::Native(name) => kotlin_native(name).map(|k| KotlinType::new(k, false)),
            CppType::TypeReference(_) if cpp.is_string() => {
                Some(KotlinType::new("kotlin.String", false).nullable())
            }
            CppType::TypeReference(_) | CppType::Template { .. } => {
                let class = self.class_target(cpp)?;
                self.wrapper_type(&class)
            }
            CppType::Reference(inner) => {
                if inner.is_string() {
                    Some(KotlinType::new("kotlin.String", false).nullable())
                } else {
                    self.kotlin_type(inner)
                }
            }
            CppType::Pointer(inner) => {
                if inner.is_string() {
                    return Some(KotlinType::new("kotlin.String", false).nullable());
                }
                if let Some(class) = self.class_target(cpp) {
                    return self.wrapper_type(&class).map(KotlinType::nullable);
                }
                match inner.unqualified() {
                    CppType::Native(name) if name == "void" => Some(opaque_pointer()),
                    CppType::Native(name) => {
                        let var = kotlin_var(name)?;
                        Some(
                            KotlinType::new("kotlinx.cinterop.CValuesRef", false)
                                .with_templates(vec![KotlinType::new(var, false)])
                                .nullable(),
                        )
                    }
                    CppType::Pointer(_) => Some(opaque_pointer()),
                    _ => None,
                }
            }
            CppType::Array(..) | CppType::Modified { .. } => None,
        }
    }
}

/// Spelling of the named type under at most one pointer or reference.
fn named_target(ty: &CppType) -> Option<String> {
    let base = match ty.unqualified() {
        CppType::Pointer(inner) | CppType::Reference(inner) => inner.unqualified(),
        other => other,
    };
    match base {
        CppType::TypeReference(_) | CppType::Template { .. } => Some(base.spelling()),
        _ => None,
    }
}

fn opaque_pointer() -> KotlinType {
    KotlinType::new("kotlinx.cinterop.COpaquePointer", false).nullable()
}

/// C signature type and cast for a C++ type.
fn c_projection(cpp: &CppType) -> (CppType, CastMethod) {
    match cpp.unqualified() {
        CppType::Native(_) if cpp.is_long_double() => (CppType::native("double"), CastMethod::Raw),
        CppType::Native(_) => (cpp.clone(), CastMethod::Native),
        CppType::TypeReference(_) if cpp.is_string() => (c_string(), CastMethod::String),
        CppType::Reference(inner) if inner.is_string() => (c_string(), CastMethod::String),
        CppType::Pointer(inner) if inner.is_string() => (c_string(), CastMethod::PointedString),
        CppType::Reference(inner) if inner.is_native() => c_projection(inner.unqualified()),
        CppType::Pointer(inner) if inner.is_long_double() => {
            (CppType::pointer(CppType::native("double")), CastMethod::Cast)
        }
        CppType::Pointer(inner) if inner.is_native() => (cpp.clone(), CastMethod::Native),
        CppType::Array(inner, _) if inner.is_native() => {
            (CppType::pointer((**inner).clone()), CastMethod::Native)
        }
        _ => (CppType::void_ptr(), CastMethod::Cast),
    }
}

fn c_string() -> CppType {
    CppType::pointer(CppType::constant(CppType::native("char")))
}

fn unique_arg_name(name: &str, index: usize, taken: &mut HashSet<String>) -> String {
    let mut candidate = if name.is_empty() {
        format!("arg{}", index)
    } else {
        name.to_string()
    };
    while !taken.insert(candidate.clone()) {
        candidate = format!("_{}", candidate);
    }
    candidate
}

fn kotlin_native(name: &str) -> Option<&'static str> {
    Some(match name {
        "void" => "kotlin.Unit",
        "bool" => "kotlin.Boolean",
        "char" | "signed char" | "int8_t" => "kotlin.Byte",
        "unsigned char" | "uint8_t" => "kotlin.UByte",
        "short" | "int16_t" => "kotlin.Short",
        "unsigned short" | "uint16_t" => "kotlin.UShort",
        "int" | "int32_t" => "kotlin.Int",
        "unsigned int" | "uint32_t" => "kotlin.UInt",
        "long" | "long long" | "int64_t" => "kotlin.Long",
        "unsigned long" | "unsigned long long" | "uint64_t" => "kotlin.ULong",
        "float" => "kotlin.Float",
        "double" | "long double" => "kotlin.Double",
        "size_t" => "platform.posix.size_t",
        _ => return None,
    })
}

fn kotlin_var(name: &str) -> Option<&'static str> {
    Some(match name {
        "bool" => "kotlinx.cinterop.BooleanVar",
        "char" | "signed char" | "int8_t" => "kotlinx.cinterop.ByteVar",
        "unsigned char" | "uint8_t" => "kotlinx.cinterop.UByteVar",
        "short" | "int16_t" => "kotlinx.cinterop.ShortVar",
        "unsigned short" | "uint16_t" => "kotlinx.cinterop.UShortVar",
        "int" | "int32_t" => "kotlinx.cinterop.IntVar",
        "unsigned int" | "uint32_t" => "kotlinx.cinterop.UIntVar",
        "long" | "long long" | "int64_t" => "kotlinx.cinterop.LongVar",
        "unsigned long" | "unsigned long long" | "uint64_t" => "kotlinx.cinterop.ULongVar",
        "float" => "kotlinx.cinterop.FloatVar",
        "double" | "long double" => "kotlinx.cinterop.DoubleVar",
        "size_t" => "platform.posix.size_tVar",
        _ => return None,
    })
}
