//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use shimsmith::codegen::ErrorPolicy;
use shimsmith::resolver::ReferencePolicy;

/// Shimsmith - C ABI shims and Kotlin/Native bindings for C++ libraries
#[derive(Parser)]
#[command(name = "shimsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the C shim, def file and Kotlin bindings
    Generate(GenerateArgs),

    /// Print the resolved module without writing anything
    Resolve(ResolveArgs),

    /// Write a starter Shimsmith.toml
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that reads a module.
#[derive(Args, Debug, Clone, Default)]
pub struct ModuleArgs {
    /// Path to Shimsmith.toml (searched upward from the current directory by default)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Header file, directory or glob to scan (repeatable, replaces [module] headers)
    #[arg(long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// JSON declaration dump to use instead of scanning headers
    #[arg(long, value_name = "FILE")]
    pub declarations: Option<PathBuf>,

    /// Module name
    #[arg(long, value_name = "NAME")]
    pub module: Option<String>,

    /// Kotlin package for classes in the global namespace
    #[arg(long, value_name = "PACKAGE")]
    pub package: Option<String>,

    /// How references to classes outside the selection are handled
    /// (ignore-missing, opaque-missing, throw-missing, include-missing)
    #[arg(long, value_name = "POLICY")]
    pub reference_policy: Option<ReferencePolicy>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Output directory
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// What to do when an element cannot be generated (throw, log)
    #[arg(long, value_name = "POLICY")]
    pub error_policy: Option<ErrorPolicy>,

    /// Compile the shim into a static library
    #[arg(long)]
    pub compile: bool,

    /// Regenerate even if nothing changed
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub module: ModuleArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Module name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
