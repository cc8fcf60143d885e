//! A generation session.
//!
//! The session owns everything one module needs between scanning and
//! writing: the declaration index, the namer that keeps C symbols unique,
//! the registered mapping passes and the resolved tree. It is not meant to
//! be shared between threads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::codegen::def::DefWriter;
use crate::codegen::header::HeaderWriter;
use crate::codegen::kotlin::KotlinWriter;
use crate::codegen::shim::ShimWriter;
use crate::codegen::{
    CodeGenerationPolicy, CompileFlags, ErrorPolicy, GenerationFailure, LogPolicy, ModuleInfo,
    ThrowPolicy,
};
use crate::core::filter::Filter;
use crate::core::namer::Namer;
use crate::core::resolved::{self, ResolvedTree};
use crate::resolver::{resolve_all, ResolveOptions};
use crate::rewrite::{MappingPass, Rewriter, SweepStats};
use crate::sources::{json, DeclarationProvider, HeaderParser, IndexedDeclarations};
use crate::util::fs::write_string;

/// Directory, under the output root, holding the Kotlin sources.
pub const KOTLIN_SOURCE_DIR: &str = "src";

/// What [`Session::write_to`] produced.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    /// Every file written, in write order.
    pub files: Vec<PathBuf>,

    /// Elements skipped under the `log` error policy.
    pub failures: Vec<GenerationFailure>,
}

impl WriteReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolution and emission state for one module.
pub struct Session {
    provider: IndexedDeclarations,
    options: ResolveOptions,
    namer: Namer,
    rewriter: Rewriter,
    resolved: Option<ResolvedTree>,
}

impl Session {
    pub fn new(provider: IndexedDeclarations, options: ResolveOptions) -> Self {
        Session {
            provider,
            options,
            namer: Namer::new(),
            rewriter: Rewriter::new(),
            resolved: None,
        }
    }

    /// Scan `headers` and index their declarations.
    pub fn from_headers(headers: &[PathBuf], options: ResolveOptions) -> Result<Self> {
        if headers.is_empty() {
            bail!("no headers to scan");
        }
        info!("scanning {} headers", headers.len());
        let tree = HeaderParser::new().parse_files(headers)?;
        Ok(Self::new(IndexedDeclarations::new(tree), options))
    }

    /// Load a JSON declaration dump.
    pub fn from_declarations(path: &Path, options: ResolveOptions) -> Result<Self> {
        info!("loading declarations from {}", path.display());
        let tree = json::load(path)?;
        Ok(Self::new(IndexedDeclarations::new(tree), options))
    }

    pub fn provider(&self) -> &IndexedDeclarations {
        &self.provider
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// The tree from the last [`filter_and_resolve`](Self::filter_and_resolve).
    pub fn resolved(&self) -> Option<&ResolvedTree> {
        self.resolved.as_ref()
    }

    /// Register a mapping pass.
    ///
    /// Passes run after every resolution. When a tree is already resolved,
    /// the new pass is also applied to it right away.
    pub fn add_mapping(&mut self, pass: Box<dyn MappingPass>) -> Result<SweepStats> {
        debug!("registering mapping `{}`", pass.name());
        let index = self.rewriter.len();
        self.rewriter.add_pass(pass);

        match self.resolved.as_mut() {
            Some(tree) => Ok(self.rewriter.sweep_from(index, tree)?),
            None => Ok(SweepStats::default()),
        }
    }

    /// Select classes with `filter`, resolve them and everything they reach,
    /// then run the mapping passes.
    ///
    /// Replaces any previously resolved tree. Names allocated by earlier
    /// resolutions stay reserved.
    pub fn filter_and_resolve(&mut self, filter: &Filter) -> Result<&ResolvedTree> {
        let initial = self.provider.find_classes(filter);
        if initial.is_empty() {
            warn!("the class filter matched nothing");
        }
        info!(
            "resolving {} of {} classes ({} references)",
            initial.len(),
            self.provider.class_count(),
            self.options.policy
        );

        let mut tree = resolve_all(&initial, &self.provider, &self.options, &mut self.namer)?;
        let resolved_count = resolved::classes(&tree).len();
        info!("resolved {} classes", resolved_count);

        if !self.rewriter.is_empty() {
            let stats = self.rewriter.sweep(&mut tree)?;
            info!(
                "applied {} edits from {} mappings",
                stats.applied,
                self.rewriter.len()
            );
        }

        Ok(self.resolved.insert(tree))
    }

    /// Write the header, shim, Kotlin wrappers and def file for the
    /// resolved tree into `out_dir`.
    ///
    /// Under [`ErrorPolicy::Throw`] the first failing element aborts the
    /// write before any file is created. Under [`ErrorPolicy::Log`] failing
    /// elements are left out and listed in the report.
    pub fn write_to(
        &self,
        out_dir: &Path,
        info: &ModuleInfo,
        flags: &CompileFlags,
        error_policy: ErrorPolicy,
    ) -> Result<WriteReport> {
        let Some(tree) = self.resolved.as_ref() else {
            bail!("nothing has been resolved yet");
        };
        let info = info.clone().with_output_dir(out_dir);

        let log = LogPolicy::new();
        let policy: &dyn CodeGenerationPolicy = match error_policy {
            ErrorPolicy::Throw => &ThrowPolicy,
            ErrorPolicy::Log => &log,
        };

        let header = HeaderWriter.generate(&info, tree, policy)?;
        let shim = ShimWriter.generate(&info, tree, policy)?;
        let wrappers = KotlinWriter.generate(&info, tree, policy)?;
        let def = DefWriter.generate(&info, flags);

        let mut outputs = vec![
            (out_dir.join(info.header_file()), header),
            (out_dir.join(info.shim_file()), shim),
            (out_dir.join(info.def_file()), def),
        ];
        let kotlin_dir = out_dir.join(KOTLIN_SOURCE_DIR);
        outputs.extend(
            wrappers
                .into_iter()
                .map(|file| (kotlin_dir.join(file.path), file.contents)),
        );

        let mut report = WriteReport::default();
        for (path, contents) in outputs {
            write_string(&path, &contents)
                .with_context(|| format!("failed to write module `{}`", info.name))?;
            debug!("wrote {}", path.display());
            report.files.push(path);
        }

        // Each writer reports the same element separately.
        let mut seen = HashSet::new();
        report.failures = log
            .failures()
            .into_iter()
            .filter(|f| seen.insert(format!("{}: {}", f.context, f.error)))
            .collect();

        info!(
            "wrote {} files for module `{}`",
            report.files.len(),
            info.name
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GenerationError;
    use crate::core::filter::{FilterableType, StringMatcher, StringSelector};
    use crate::core::resolved::{find_class, methods};
    use crate::resolver::ReferencePolicy;
    use crate::rewrite::{DeclarativePass, MappingAction, MappingConfig};
    use crate::test_support::assertions::assert_file_contains;
    use crate::test_support::{scenario, test_lib, TEST_LIB_HEADER};
    use tempfile::TempDir;

    fn session(tree: crate::core::decl::DeclTree, policy: ReferencePolicy) -> Session {
        Session::new(IndexedDeclarations::new(tree), ResolveOptions::new(policy))
    }

    fn drop_method(name: &str) -> Box<dyn MappingPass> {
        Box::new(DeclarativePass::new(MappingConfig {
            name: format!("drop-{}", name),
            filter: Filter::string(StringSelector::MethodName, StringMatcher::Equals, name),
            action: MappingAction::Remove,
        }))
    }

    fn method_names(tree: &ResolvedTree, spelling: &str) -> Vec<String> {
        let class = find_class(tree, spelling).unwrap();
        methods(tree, class).iter().map(|m| m.name.clone()).collect()
    }

    #[test]
    fn test_filter_and_resolve_follows_references() {
        let mut s = session(test_lib(), ReferencePolicy::IncludeMissing);
        let tree = s
            .filter_and_resolve(&Filter::class_named("TestLib::TestClass"))
            .unwrap();

        assert!(find_class(tree, "TestLib::TestClass").is_some());
        assert!(find_class(tree, "TestLib::OtherClass").is_some());
    }

    #[test]
    fn test_filter_and_resolve_ignores_missing() {
        let mut s = session(test_lib(), ReferencePolicy::IgnoreMissing);
        let tree = s
            .filter_and_resolve(&Filter::class_named("TestLib::TestClass"))
            .unwrap();

        assert!(find_class(tree, "TestLib::OtherClass").is_none());
        assert!(!method_names(tree, "TestLib::TestClass").contains(&"getOther".to_string()));
    }

    #[test]
    fn test_throw_missing_fails_resolution() {
        let mut s = session(test_lib(), ReferencePolicy::ThrowMissing);
        let err = s
            .filter_and_resolve(&Filter::class_named("TestLib::TestClass"))
            .unwrap_err();
        assert!(s.resolved().is_none());
        assert!(format!("{:#}", err).contains("OtherClass"));
    }

    #[test]
    fn test_mapping_applies_on_resolve() {
        let mut s = session(scenario(), ReferencePolicy::IgnoreMissing);
        let stats = s.add_mapping(drop_method("sum")).unwrap();
        assert_eq!(stats, SweepStats::default());

        let tree = s.filter_and_resolve(&Filter::Default).unwrap();
        assert!(!method_names(tree, "TestLib::TestClass").contains(&"sum".to_string()));
    }

    #[test]
    fn test_mapping_applies_to_resolved_tree() {
        let mut s = session(scenario(), ReferencePolicy::IgnoreMissing);
        s.filter_and_resolve(&Filter::Default).unwrap();

        let stats = s.add_mapping(drop_method("sum")).unwrap();

        assert_eq!(stats.applied, 1);
        let tree = s.resolved().unwrap();
        assert!(!method_names(tree, "TestLib::TestClass").contains(&"sum".to_string()));
    }

    #[test]
    fn test_write_before_resolve_fails() {
        let tmp = TempDir::new().unwrap();
        let s = session(scenario(), ReferencePolicy::IgnoreMissing);
        let err = s
            .write_to(
                tmp.path(),
                &ModuleInfo::new("TestLib", "com.example"),
                &CompileFlags::default(),
                ErrorPolicy::Throw,
            )
            .unwrap_err();
        assert!(err.to_string().contains("nothing has been resolved"));
    }

    #[test]
    fn test_write_to_from_headers() {
        let tmp = TempDir::new().unwrap();
        let header = tmp.path().join("test_lib.h");
        std::fs::write(&header, TEST_LIB_HEADER).unwrap();
        let out = tmp.path().join("out");

        let mut s = Session::from_headers(
            &[header.clone()],
            ResolveOptions::new(ReferencePolicy::IncludeMissing),
        )
        .unwrap();
        s.filter_and_resolve(&Filter::Default).unwrap();

        let info = ModuleInfo::new("TestLib", "com.example").with_headers(vec![header.clone()]);
        let flags = CompileFlags::new(&[header], &[], &[]).unwrap();
        let report = s.write_to(&out, &info, &flags, ErrorPolicy::Throw).unwrap();

        assert!(report.is_clean());
        assert_file_contains(&out.join("test_lib.h"), "#ifndef __TEST_LIB__");
        assert_file_contains(&out.join("test_lib.cc"), "#include \"../test_lib.h\"");
        assert_file_contains(&out.join("test_lib.def"), "package = com.example.internal");
        assert_file_contains(
            &out.join(KOTLIN_SOURCE_DIR).join("testLib_TestClass.kt"),
            "value class TestClass",
        );
        assert!(report
            .files
            .contains(&out.join(KOTLIN_SOURCE_DIR).join("testLib_OtherClass.kt")));
    }

    #[test]
    fn test_write_to_log_policy_collects_failures() {
        let tmp = TempDir::new().unwrap();
        let tree = crate::test_support::namespace_tree(
            "TestLib",
            vec![crate::test_support::test_class()
                .field("values", "int[4]")
                .build()],
        );
        let mut s = session(tree, ReferencePolicy::IgnoreMissing);
        s.filter_and_resolve(&Filter::is_type(&[FilterableType::Class]))
            .unwrap();
        let info = ModuleInfo::new("TestLib", "com.example");

        let err = s
            .write_to(tmp.path(), &info, &CompileFlags::default(), ErrorPolicy::Throw)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GenerationError>(),
            Some(GenerationError::Unsupported { .. })
        ));
        assert!(!tmp.path().join("test_lib.h").exists());

        let report = s
            .write_to(tmp.path(), &info, &CompileFlags::default(), ErrorPolicy::Log)
            .unwrap();
        assert!(!report.is_clean());
        assert!(report
            .failures
            .iter()
            .any(|f| f.context.member.as_deref() == Some("values")));
        assert_file_contains(&tmp.path().join("test_lib.h"), "TestLib_TestClass_sum");
    }
}
