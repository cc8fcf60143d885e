//! Running the C++ toolchain.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Compilers tried, in order, when none is configured.
const CXX_CANDIDATES: &[&str] = &["c++", "g++", "clang++"];

const AR_CANDIDATES: &[&str] = &["ar", "llvm-ar"];

/// A program invocation assembled argument by argument.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessBuilder {
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, |builder, arg| builder.arg(arg))
    }

    /// Run to completion with captured output; fail on a non-zero exit.
    pub fn exec_and_check(&self) -> Result<Output> {
        debug!("running `{}`", self);
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(output)
    }

    /// The command line as one string, for messages.
    pub fn display_command(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// First of `env_var` and `candidates` found in PATH.
fn find_tool(env_var: &str, candidates: &[&str]) -> Option<PathBuf> {
    let from_env = std::env::var(env_var)
        .ok()
        .and_then(|name| which::which(name).ok());
    from_env.or_else(|| candidates.iter().find_map(|name| which::which(name).ok()))
}

/// The C++ compiler: `configured` if given, else `$CXX` or a usual name.
pub fn find_cxx_compiler(configured: Option<&str>) -> Option<PathBuf> {
    match configured {
        Some(name) => which::which(name).ok(),
        None => find_tool("CXX", CXX_CANDIDATES),
    }
}

/// The static archiver: `$AR` or a usual name.
pub fn find_ar() -> Option<PathBuf> {
    find_tool("AR", AR_CANDIDATES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("c++").args(["-c", "-o", "test_lib.o", "test_lib.cc"]);
        assert_eq!(pb.display_command(), "c++ -c -o test_lib.o test_lib.cc");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_and_check_reports_failure() {
        let err = ProcessBuilder::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .exec_and_check()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exit code Some(3)"));
        assert!(message.contains("broken"));
    }

    #[test]
    fn test_missing_configured_compiler() {
        assert_eq!(find_cxx_compiler(Some("definitely-not-a-compiler-xyz")), None);
    }
}
