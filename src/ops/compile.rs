//! Build the generated shim into a static archive.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::codegen::{CompileFlags, ModuleInfo};
use crate::util::diagnostic::suggestions;
use crate::util::process::{find_ar, find_cxx_compiler, ProcessBuilder};

/// C++ standard the shim is compiled with.
pub const CXX_STANDARD: &str = "c++17";

/// Options for [`compile`].
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Compiler name or path; `$CXX` and the usual names otherwise
    pub compiler: Option<String>,

    /// Extra arguments passed to the compiler
    pub extra_args: Vec<String>,
}

/// Result of a shim build.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub object: PathBuf,
    pub archive: PathBuf,
    pub compiler: PathBuf,
}

/// Archive name for a module: `lib<stem>.a`.
pub fn archive_name(info: &ModuleInfo) -> String {
    format!("lib{}.a", info.file_stem())
}

/// The compiler invocation for `<stem>.cc` in `out_dir`.
pub fn compile_command(
    compiler: &Path,
    out_dir: &Path,
    info: &ModuleInfo,
    flags: &CompileFlags,
    extra_args: &[String],
) -> ProcessBuilder {
    let object = out_dir.join(format!("{}.o", info.file_stem()));
    ProcessBuilder::new(compiler)
        .arg(format!("-std={}", CXX_STANDARD))
        .args(["-c", "-fPIC"])
        .arg(format!("-I{}", out_dir.display()))
        .args(flags.compiler_opts())
        .args(extra_args)
        .arg("-o")
        .arg(object)
        .arg(out_dir.join(info.shim_file()))
}

/// Compile the shim in `out_dir` and archive it as `lib<stem>.a`.
pub fn compile(
    out_dir: &Path,
    info: &ModuleInfo,
    flags: &CompileFlags,
    opts: &CompileOptions,
) -> Result<CompileResult> {
    let compiler = find_cxx_compiler(opts.compiler.as_deref()).ok_or_else(|| match &opts.compiler {
        Some(name) => anyhow!("C++ compiler `{}` not found in PATH", name),
        None => anyhow!(
            "no C++ compiler found\n\
             hint: set `compiler` in [module] or the CXX environment variable"
        ),
    })?;
    let ar = find_ar().ok_or_else(|| anyhow!("no `ar` archiver found in PATH"))?;

    let object = out_dir.join(format!("{}.o", info.file_stem()));
    let archive = out_dir.join(archive_name(info));

    info!("compiling {} with {}", info.shim_file(), compiler.display());
    compile_command(&compiler, out_dir, info, flags, &opts.extra_args)
        .exec_and_check()
        .with_context(|| {
            format!(
                "failed to compile {}\nhint: {}",
                info.shim_file(),
                suggestions::COMPILE_FAILED
            )
        })?;

    if archive.exists() {
        std::fs::remove_file(&archive)?;
    }
    ProcessBuilder::new(&ar)
        .arg("rcs")
        .arg(&archive)
        .arg(&object)
        .exec_and_check()?;
    info!("archived {}", archive.display());

    Ok(CompileResult {
        object,
        archive,
        compiler,
    })
}
