//! `shimsmith init` command

use anyhow::Result;

use crate::cli::InitArgs;
use shimsmith::ops::init::{init_project, InitOptions};
use shimsmith::util::GlobalContext;

pub fn execute(args: InitArgs, ctx: &GlobalContext) -> Result<()> {
    let path = match &args.path {
        Some(path) => ctx.absolute(path),
        None => ctx.cwd().to_path_buf(),
    };

    let opts = InitOptions { name: args.name };
    let manifest = init_project(&path, &opts)?;

    eprintln!("     Created {}", manifest.display());

    Ok(())
}
