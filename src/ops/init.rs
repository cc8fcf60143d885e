//! Implementation of `shimsmith init`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::config::{starter_manifest, MANIFEST_NAME};
use crate::util::fs::{ensure_dir, write_string};

/// Options for initializing a project.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Module name; the directory name otherwise
    pub name: Option<String>,
}

/// Write a starter `Shimsmith.toml` and an empty `include/` into `path`.
///
/// Returns the manifest path.
pub fn init_project(path: &Path, opts: &InitOptions) -> Result<PathBuf> {
    ensure_dir(path)?;

    let manifest_path = path.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, path.display());
    }

    let name = match &opts.name {
        Some(name) => name.clone(),
        None => default_name(path)?,
    };

    write_string(&manifest_path, &starter_manifest(&name))?;
    ensure_dir(&path.join("include")).context("failed to create include directory")?;

    Ok(manifest_path)
}

fn default_name(path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    absolute
        .components()
        .next_back()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .filter(|name| !name.is_empty() && name != "." && name != "/")
        .with_context(|| {
            format!(
                "cannot derive a module name from `{}`, pass `--name`",
                path.display()
            )
        })
}
