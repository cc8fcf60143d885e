//! `shimsmith resolve` command
//!
//! Resolves the configured module and prints the tree to stdout.

use anyhow::{Context, Result};

use crate::cli::{OutputFormat, ResolveArgs};
use shimsmith::core::resolved::{to_json, to_text};
use shimsmith::ops::generate::resolve_module;
use shimsmith::util::GlobalContext;

use super::load_module_config;

pub fn execute(args: ResolveArgs, ctx: &GlobalContext) -> Result<()> {
    let loaded = load_module_config(ctx, &args.module)?;
    let session = resolve_module(&loaded.config, &loaded.base_dir)?;
    let tree = session
        .resolved()
        .context("resolution produced no tree")?;

    match args.format {
        OutputFormat::Text => print!("{}", to_text(tree)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&to_json(tree))
                .context("failed to serialize resolved tree")?;
            println!("{}", json);
        }
    }

    Ok(())
}
