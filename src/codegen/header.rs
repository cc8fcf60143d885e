//! The C header: one declaration per generated function.

use crate::builder::{CppCodeBuilder, CppFactory};
use crate::core::namer::split_camelcase;
use crate::core::resolved::{ResolvedField, ResolvedTree};
use crate::core::tree::NodeId;

use super::{
    c_args, c_spec, check_args, check_field, field_specs, marker, ClassView, CodeGenerationPolicy,
    CodeGenerator, ErrorContext, GenerationError, ModuleInfo,
};

/// Writes `<module>.h`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderWriter;

/// `__TEST_LIB__` for `TestLib`.
pub fn guard_name(module: &str) -> String {
    let words: Vec<String> = split_camelcase(module)
        .iter()
        .map(|w| {
            w.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
                .collect()
        })
        .collect();
    format!("__{}__", words.join("_"))
}

impl HeaderWriter {
    pub fn generate(
        &self,
        info: &ModuleInfo,
        tree: &ResolvedTree,
        policy: &dyn CodeGenerationPolicy,
    ) -> Result<String, GenerationError> {
        let ctx = ErrorContext::module(&info.name);
        let guard = guard_name(&info.name);
        let mut b = CppCodeBuilder::new(CppFactory);
        b.ifndef(&guard, |b| {
            b.define_macro(&guard);
            b.blank();
            for header in ["stdlib.h", "stdint.h", "stdbool.h"] {
                b.include_sys(header);
            }
            b.blank();
            b.ifdef("__cplusplus", |b| {
                b.extern_c_open();
                Ok::<_, GenerationError>(())
            })?;
            b.blank();
            self.classes(b, tree, policy, &ctx)?;
            b.ifdef("__cplusplus", |b| {
                b.extern_c_close();
                Ok(())
            })
        })?;
        Ok(b.finish())
    }
}

impl CodeGenerator for HeaderWriter {
    type Factory = CppFactory;

    fn class(
        &self,
        b: &mut CppCodeBuilder,
        class: &ClassView<'_>,
        policy: &dyn CodeGenerationPolicy,
        ctx: &ErrorContext,
    ) -> Result<(), GenerationError> {
        b.comment(marker("BEGIN", class.class));
        self.members(b, class, policy, ctx)?;
        b.comment(marker("END", class.class));
        b.blank();
        Ok(())
    }

    fn method(&self, b: &mut CppCodeBuilder, class: &ClassView<'_>, id: NodeId) -> Result<(), GenerationError> {
        let Some(method) = class.tree.get(id).as_method() else {
            return Ok(());
        };
        let args = c_args(class, id, method);
        check_args(class, &method.name, &args)?;
        b.function_decl(c_spec(
            &method.c_name,
            method.return_style,
            &method.return_type,
            &args,
        ));
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
        b.function_decl(getter);
        if let Some(setter) = setter {
            b.function_decl(setter);
        }
        Ok(())
    }
}
