//! Shimsmith CLI - C ABI shims and Kotlin/Native bindings for C++ libraries

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod report;

use cli::{Cli, Commands};
use shimsmith::util::GlobalContext;

fn main() {
    // Parse CLI
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("shimsmith=debug")
    } else {
        EnvFilter::new("shimsmith=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(cli, color) {
        report::error(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_color(color);

    // Execute command
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &ctx),
        Commands::Resolve(args) => commands::resolve::execute(args, &ctx),
        Commands::Init(args) => commands::init::execute(args, &ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
