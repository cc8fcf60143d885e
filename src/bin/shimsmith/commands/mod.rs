//! Command implementations

pub mod completions;
pub mod generate;
pub mod init;
pub mod resolve;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::cli::ModuleArgs;
use shimsmith::util::config::{load_config, Config};
use shimsmith::util::GlobalContext;

/// Configuration for a module command, with command-line overrides applied.
pub struct LoadedConfig {
    pub config: Config,

    /// Directory of the manifest, or the working directory without one
    pub base_dir: PathBuf,

    pub manifest: Option<PathBuf>,
}

/// Load the global and project configuration and apply `args` on top.
pub fn load_module_config(ctx: &GlobalContext, args: &ModuleArgs) -> Result<LoadedConfig> {
    let manifest = match &args.config {
        Some(path) => Some(ctx.absolute(path)),
        None => ctx.find_manifest(),
    };
    match &manifest {
        Some(path) => debug!("using manifest {}", path.display()),
        None => debug!("no Shimsmith.toml found"),
    }

    let mut config = load_config(&ctx.config_path(), manifest.as_deref())?;
    config.merge(overrides(ctx, args));

    let base_dir = manifest
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.cwd().to_path_buf());

    Ok(LoadedConfig {
        config,
        base_dir,
        manifest,
    })
}

/// Command-line values as a config layer. Paths are taken from the
/// working directory.
fn overrides(ctx: &GlobalContext, args: &ModuleArgs) -> Config {
    let mut config = Config::default();
    config.module.name = args.module.clone();
    config.module.package = args.package.clone();
    config.module.headers = args
        .headers
        .iter()
        .map(|h| ctx.absolute(Path::new(h)).to_string_lossy().into_owned())
        .collect();
    config.module.declarations = args.declarations.as_deref().map(|p| ctx.absolute(p));
    config.policy.reference = args.reference_policy;
    config
}
