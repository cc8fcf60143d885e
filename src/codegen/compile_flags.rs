//! Compiler and linker flags for the cinterop manifest.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Flags derived from the configured headers, libraries and defines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileFlags {
    pub include_dirs: Vec<PathBuf>,
    pub defines: Vec<String>,
    pub static_libraries: Vec<PathBuf>,
    pub dynamic_libraries: Vec<PathBuf>,
}

impl CompileFlags {
    /// Classify `libraries` by extension. Only `.a` and `.so` are accepted.
    pub fn new(headers: &[PathBuf], libraries: &[PathBuf], defines: &[String]) -> Result<Self> {
        let mut flags = CompileFlags {
            defines: defines.to_vec(),
            ..Default::default()
        };

        let mut seen = BTreeSet::new();
        for header in headers {
            let dir = header.parent().unwrap_or(Path::new("."));
            let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
            if seen.insert(dir.to_path_buf()) {
                flags.include_dirs.push(dir.to_path_buf());
            }
        }

        for library in libraries {
            match library.extension().and_then(|e| e.to_str()) {
                Some("a") => flags.static_libraries.push(library.clone()),
                Some("so") => flags.dynamic_libraries.push(library.clone()),
                _ => bail!(
                    "unsupported library `{}`: expected a `.a` or `.so` file",
                    library.display()
                ),
            }
        }

        Ok(flags)
    }

    /// Link the shim archive built into `dir` as well.
    pub fn with_static_library(mut self, library: PathBuf) -> Self {
        if !self.static_libraries.contains(&library) {
            self.static_libraries.push(library);
        }
        self
    }

    /// `-I<dir>` for each include dir, then the defines. A define that is
    /// not already a flag gets `-D`.
    pub fn compiler_opts(&self) -> Vec<String> {
        let mut opts: Vec<String> = self
            .include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .collect();
        opts.extend(self.defines.iter().map(|define| {
            if define.starts_with('-') {
                define.clone()
            } else {
                format!("-D{}", define)
            }
        }));
        opts
    }

    /// `-L<dir> -l<name>` for each dynamic library.
    pub fn linker_opts(&self) -> Vec<String> {
        let mut dirs = BTreeSet::new();
        let mut opts = Vec::new();
        for library in &self.dynamic_libraries {
            let dir = library_dir(library);
            if dirs.insert(dir.clone()) {
                opts.push(format!("-L{}", dir.display()));
            }
        }
        for library in &self.dynamic_libraries {
            if let Some(name) = link_name(library) {
                opts.push(format!("-l{}", name));
            }
        }
        opts
    }

    /// File names of the static libraries.
    pub fn static_library_names(&self) -> Vec<String> {
        self.static_libraries
            .iter()
            .filter_map(|lib| lib.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    /// Directories holding the static libraries.
    pub fn library_paths(&self) -> Vec<String> {
        let mut dirs = BTreeSet::new();
        self.static_libraries
            .iter()
            .map(|lib| library_dir(lib))
            .filter(|dir| dirs.insert(dir.clone()))
            .map(|dir| dir.display().to_string())
            .collect()
    }
}

fn library_dir(library: &Path) -> PathBuf {
    match library.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `libfoo.so` links as `foo`.
fn link_name(library: &Path) -> Option<String> {
    let stem = library.file_stem()?.to_str()?;
    Some(stem.strip_prefix("lib").unwrap_or(stem).to_string())
}
