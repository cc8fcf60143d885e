//! `shimsmith generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use shimsmith::ops::generate::{generate, GenerateOptions};
use shimsmith::util::diagnostic::{emit, Diagnostic};
use shimsmith::util::GlobalContext;

use super::load_module_config;

pub fn execute(args: GenerateArgs, ctx: &GlobalContext) -> Result<()> {
    let mut loaded = load_module_config(ctx, &args.module)?;

    // Command-line only settings
    if let Some(out) = &args.out {
        loaded.config.module.output = Some(ctx.absolute(out));
    }
    if let Some(policy) = args.error_policy {
        loaded.config.policy.error = Some(policy);
    }

    let opts = GenerateOptions {
        base_dir: loaded.base_dir.clone(),
        compile: args.compile,
        force: args.force,
    };
    let name = loaded.config.module.name.clone().unwrap_or_default();

    let result = generate(&loaded.config, &opts)?;

    if result.up_to_date {
        eprintln!("       Fresh `{}` (use --force to regenerate)", name);
        return Ok(());
    }

    for failure in &result.failures {
        let mut warning = Diagnostic::warning(format!("skipped {}", failure.context))
            .with_context(failure.error.to_string());
        if let Some(manifest) = &loaded.manifest {
            warning = warning.with_location(manifest);
        }
        emit(&warning, ctx.color());
    }
    if let Some(archive) = &result.archive {
        eprintln!("    Compiled {}", archive.display());
    }
    eprintln!(
        "   Generated `{}` ({} files) -> {}",
        name,
        result.files.len(),
        result.out_dir.display()
    );

    Ok(())
}
