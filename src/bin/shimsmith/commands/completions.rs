//! `shimsmith completions` command

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::{Cli, CompletionsArgs};

const BIN_NAME: &str = "shimsmith";

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_completions(args.shell, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Write the completion script for `shell` to `out`.
fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_list_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("shimsmith"));
        assert!(script.contains("generate"));
        assert!(script.contains("resolve"));
    }

    #[test]
    fn test_fish_completions_include_flags() {
        let mut buf = Vec::new();
        write_completions(Shell::Fish, &mut buf).unwrap();
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("reference-policy"));
    }
}
