//! Configuration file support.
//!
//! Two files are read, in order:
//! - Global: `~/.shimsmith/config.toml` - user-wide defaults
//! - Project: `Shimsmith.toml` - the module being generated
//!
//! Project values override global ones field by field.
//!
//! ```toml
//! [module]
//! name = "TestLib"
//! package = "com.example.testlib"
//! headers = ["include/*.h"]
//! libraries = ["lib/libtest.so"]
//! defines = ["NDEBUG"]
//!
//! [policy]
//! reference = "include-missing"
//! error = "log"
//!
//! [filter]
//! type = "string"
//! selector = "class-qualified"
//! matcher = "starts-with"
//! value = "TestLib::"
//!
//! [[mapping]]
//! name = "no-internal"
//! action = "remove"
//! filter = { type = "string", selector = "method-name", matcher = "starts-with", value = "internal" }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miette::{NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};

use crate::codegen::ErrorPolicy;
use crate::core::filter::Filter;
use crate::resolver::ReferencePolicy;
use crate::rewrite::MappingConfig;
use crate::util::diagnostic::ConfigParseError;

/// Name of the project configuration file.
pub const MANIFEST_NAME: &str = "Shimsmith.toml";

/// Shimsmith configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The module to generate
    pub module: ModuleConfig,

    /// Reference and error policies
    pub policy: PolicyConfig,

    /// Initial class selection; every non-std class when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    /// Mapping passes applied to the resolved tree, in order
    #[serde(rename = "mapping", skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<MappingConfig>,
}

/// The `[module]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Module name, the stem of every generated file
    pub name: Option<String>,

    /// Kotlin package for classes in the global namespace
    pub package: Option<String>,

    /// Header files, directories or glob patterns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,

    /// Static (`.a`) or dynamic (`.so`) libraries to link
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<PathBuf>,

    /// JSON declaration dump, used instead of scanning headers
    pub declarations: Option<PathBuf>,

    /// C++ compiler for `--compile`
    pub compiler: Option<String>,

    /// Preprocessor defines passed to cinterop and the compiler
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defines: Vec<String>,

    /// Output directory
    pub output: Option<PathBuf>,
}

/// The `[policy]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub reference: Option<ReferencePolicy>,
    pub error: Option<ErrorPolicy>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&contents, path)
    }

    /// Parse configuration text. `path` names the source in errors.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| ConfigParseError {
                message: e.message().to_string(),
                src: NamedSource::new(path.display().to_string(), contents.to_string()),
                span: e.span().map(SourceSpan::from),
            })
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file: {}", path.display()))
    }

    /// Reject filters with invalid regular expressions.
    pub fn validate(&self) -> Result<()> {
        if let Some(filter) = &self.filter {
            filter.validate().context("invalid [filter]")?;
        }
        for mapping in &self.mappings {
            mapping
                .filter
                .validate()
                .with_context(|| format!("invalid filter in mapping `{}`", mapping.name))?;
        }
        Ok(())
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let module = other.module;
        if module.name.is_some() {
            self.module.name = module.name;
        }
        if module.package.is_some() {
            self.module.package = module.package;
        }
        if !module.headers.is_empty() {
            self.module.headers = module.headers;
        }
        if !module.libraries.is_empty() {
            self.module.libraries = module.libraries;
        }
        if module.declarations.is_some() {
            self.module.declarations = module.declarations;
        }
        if module.compiler.is_some() {
            self.module.compiler = module.compiler;
        }
        if !module.defines.is_empty() {
            self.module.defines = module.defines;
        }
        if module.output.is_some() {
            self.module.output = module.output;
        }

        if other.policy.reference.is_some() {
            self.policy.reference = other.policy.reference;
        }
        if other.policy.error.is_some() {
            self.policy.error = other.policy.error;
        }

        if other.filter.is_some() {
            self.filter = other.filter;
        }
        // Global mappings run first.
        self.mappings.extend(other.mappings);
    }

    /// Make relative paths absolute against `base`, the directory of the
    /// file they were read from.
    pub fn rebase(&mut self, base: &Path) {
        let join = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { base.join(p) };
        self.module.headers = self
            .module
            .headers
            .iter()
            .map(|h| join(Path::new(h)).to_string_lossy().into_owned())
            .collect();
        self.module.libraries = self.module.libraries.iter().map(|l| join(l)).collect();
        self.module.declarations = self.module.declarations.as_deref().map(join);
        self.module.output = self.module.output.as_deref().map(join);
    }

    pub fn reference_policy(&self) -> ReferencePolicy {
        self.policy.reference.unwrap_or_default()
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy.error.unwrap_or_default()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (Shimsmith.toml)
/// 2. Global config (~/.shimsmith/config.toml)
/// 3. Defaults
///
/// A broken global config is skipped with a warning; a broken project config
/// is an error. Relative project paths are resolved against the project
/// directory.
pub fn load_config(global_path: &Path, project_path: Option<&Path>) -> Result<Config> {
    let mut config = Config::load_or_default(global_path);

    if let Some(project_path) = project_path {
        let mut project = Config::load(project_path)?;
        if let Some(dir) = project_path.parent() {
            project.rebase(dir);
        }
        config.merge(project);
    }

    Ok(config)
}

/// Get the global shimsmith config directory (~/.shimsmith).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".shimsmith"))
}

/// Get the global config path (~/.shimsmith/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Starter `Shimsmith.toml` written by `shimsmith init`.
pub fn starter_manifest(name: &str) -> String {
    let package = name.to_lowercase().replace(['-', ' '], "_");
    format!(
        r#"[module]
name = "{name}"
package = "{package}"
headers = ["include"]

[policy]
reference = "ignore-missing"
error = "throw"

# [filter]
# type = "string"
# selector = "class-qualified"
# matcher = "starts-with"
# value = "{name}::"

# [[mapping]]
# name = "drop-internal"
# action = "remove"
# filter = {{ type = "string", selector = "method-name", matcher = "starts-with", value = "internal" }}
"#
    )
}
