//! Implementation of `shimsmith generate` and `shimsmith resolve`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::info;

use crate::codegen::def::DefWriter;
use crate::codegen::{CompileFlags, GenerationFailure, ModuleInfo};
use crate::core::filter::Filter;
use crate::resolver::ResolveOptions;
use crate::rewrite::DeclarativePass;
use crate::util::config::Config;
use crate::util::diagnostic::suggestions;
use crate::util::fs::{collect_headers, write_string};

use super::compile::{self, CompileOptions};
use super::fingerprint;
use super::session::Session;

/// Output directory, relative to the project, when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Options for the generate command.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Directory relative paths are resolved against
    pub base_dir: PathBuf,

    /// Build the shim into `lib<module>.a` after writing it
    pub compile: bool,

    /// Regenerate even when the fingerprint matches
    pub force: bool,
}

/// Outcome of [`generate`].
#[derive(Debug, Clone, Default)]
pub struct GenerateResult {
    pub out_dir: PathBuf,

    /// Files written, empty when the output was up to date
    pub files: Vec<PathBuf>,

    /// Elements left out under the `log` error policy
    pub failures: Vec<GenerationFailure>,

    pub archive: Option<PathBuf>,

    /// Nothing changed since the last run
    pub up_to_date: bool,
}

/// The module identity and input files named by a configuration.
#[derive(Debug, Clone)]
pub struct ModuleInputs {
    pub info: ModuleInfo,
    pub headers: Vec<PathBuf>,
    pub declarations: Option<PathBuf>,
}

impl ModuleInputs {
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self> {
        let Some(name) = config.module.name.clone() else {
            bail!(
                "no module name configured\nhint: set `name` under [module], pass `--module`, or {}",
                suggestions::NO_CONFIG
            );
        };
        let package = config
            .module
            .package
            .clone()
            .unwrap_or_else(|| name.to_lowercase());

        let headers = if config.module.headers.is_empty() {
            Vec::new()
        } else {
            collect_headers(base_dir, &config.module.headers)?
        };
        let declarations = config
            .module
            .declarations
            .as_ref()
            .map(|path| base_dir.join(path));

        if headers.is_empty() && declarations.is_none() {
            bail!("module `{}` has no input\n{}", name, suggestions::NO_INPUT);
        }

        Ok(ModuleInputs {
            info: ModuleInfo::new(name, package).with_headers(headers.clone()),
            headers,
            declarations,
        })
    }

    /// Every file whose content affects the output.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = self.headers.clone();
        files.extend(self.declarations.iter().cloned());
        files
    }
}

/// Open a session over the inputs and register the configured mappings.
///
/// A declaration dump takes precedence over scanning the headers; the
/// headers are then only included by the shim.
pub fn open_session(config: &Config, inputs: &ModuleInputs) -> Result<Session> {
    let options =
        ResolveOptions::new(config.reference_policy()).with_package(inputs.info.package.clone());

    let mut session = match &inputs.declarations {
        Some(path) => Session::from_declarations(path, options)?,
        None => Session::from_headers(&inputs.headers, options)?,
    };

    for mapping in &config.mappings {
        session.add_mapping(Box::new(DeclarativePass::new(mapping.clone())))?;
    }
    Ok(session)
}

/// Open a session and resolve the configured class selection.
pub fn resolve_module(config: &Config, base_dir: &Path) -> Result<Session> {
    let inputs = ModuleInputs::from_config(config, base_dir)?;
    let mut session = open_session(config, &inputs)?;
    session.filter_and_resolve(&config.filter.clone().unwrap_or(Filter::Default))?;
    Ok(session)
}

/// Output directory for `config`.
pub fn output_dir(config: &Config, base_dir: &Path) -> PathBuf {
    match &config.module.output {
        Some(out) => base_dir.join(out),
        None => base_dir.join(DEFAULT_OUTPUT_DIR),
    }
}

/// Generate the module described by `config`.
pub fn generate(config: &Config, opts: &GenerateOptions) -> Result<GenerateResult> {
    let inputs = ModuleInputs::from_config(config, &opts.base_dir)?;
    let info = &inputs.info;
    let out_dir = output_dir(config, &opts.base_dir);
    let archive = out_dir.join(compile::archive_name(info));

    let fp = fingerprint::compute(config, &inputs.files())?;
    let archive_ready = !opts.compile || archive.exists();
    if !opts.force && archive_ready && fingerprint::is_fresh(&out_dir, &fp) {
        info!("module `{}` is up to date", info.name);
        return Ok(GenerateResult {
            out_dir,
            up_to_date: true,
            ..Default::default()
        });
    }

    let flags = CompileFlags::new(
        &inputs.headers,
        &config.module.libraries,
        &config.module.defines,
    )?;

    let mut session = open_session(config, &inputs)?;
    session.filter_and_resolve(&config.filter.clone().unwrap_or(Filter::Default))?;
    let report = session.write_to(&out_dir, info, &flags, config.error_policy())?;

    let mut result = GenerateResult {
        out_dir: out_dir.clone(),
        files: report.files,
        failures: report.failures,
        ..Default::default()
    };

    if opts.compile {
        let compile_opts = CompileOptions {
            compiler: config.module.compiler.clone(),
            ..Default::default()
        };
        let built = compile::compile(&out_dir, info, &flags, &compile_opts)?;

        // Point the def file at the archive.
        let flags = flags.with_static_library(built.archive.clone());
        let def = DefWriter.generate(&info.clone().with_output_dir(&out_dir), &flags);
        write_string(&out_dir.join(info.def_file()), &def)?;

        result.files.push(built.archive.clone());
        result.archive = Some(built.archive);
    }

    fingerprint::store(&out_dir, &fp)?;
    Ok(result)
}
