//! Generation fingerprints.
//!
//! A fingerprint covers the effective configuration, the content of every
//! input file and the tool version. It is stored next to the generated
//! files; a matching fingerprint means regeneration can be skipped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::Config;
use crate::util::fs::write_string;
use crate::util::hash::Fingerprint;

/// File, inside the output directory, holding the last fingerprint.
pub const FINGERPRINT_FILE: &str = ".shimsmith-fingerprint";

/// Fingerprint `config` and the contents of `inputs`.
pub fn compute(config: &Config, inputs: &[PathBuf]) -> Result<String> {
    let mut fp = Fingerprint::new();
    fp.update_str(env!("CARGO_PKG_VERSION"));

    let config_json =
        serde_json::to_string(config).context("failed to serialize configuration")?;
    fp.update_str(&config_json);

    for input in inputs {
        let bytes = std::fs::read(input)
            .with_context(|| format!("failed to read input: {}", input.display()))?;
        fp.update_content(&input.to_string_lossy(), &bytes);
    }

    Ok(fp.finish())
}

/// Whether `out_dir` was generated with `fingerprint`.
pub fn is_fresh(out_dir: &Path, fingerprint: &str) -> bool {
    std::fs::read_to_string(out_dir.join(FINGERPRINT_FILE))
        .map(|stored| stored.trim() == fingerprint)
        .unwrap_or(false)
}

/// Record `fingerprint` for `out_dir`.
pub fn store(out_dir: &Path, fingerprint: &str) -> Result<()> {
    write_string(&out_dir.join(FINGERPRINT_FILE), &format!("{}\n", fingerprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_tracks_inputs_and_config() {
        let tmp = TempDir::new().unwrap();
        let header = tmp.path().join("a.h");
        std::fs::write(&header, "class A {};").unwrap();
        let config = Config::default();

        let first = compute(&config, &[header.clone()]).unwrap();
        assert_eq!(first, compute(&config, &[header.clone()]).unwrap());

        std::fs::write(&header, "class A { int x; };").unwrap();
        let edited = compute(&config, &[header.clone()]).unwrap();
        assert_ne!(first, edited);

        let mut renamed = config.clone();
        renamed.module.name = Some("Other".to_string());
        assert_ne!(edited, compute(&renamed, &[header]).unwrap());
    }

    #[test]
    fn test_store_and_check() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");

        assert!(!is_fresh(&out, "abc"));
        store(&out, "abc").unwrap();
        assert!(is_fresh(&out, "abc"));
        assert!(!is_fresh(&out, "abd"));
    }

    #[test]
    fn test_missing_input_is_error() {
        let err = compute(&Config::default(), &[PathBuf::from("/nonexistent/a.h")]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/a.h"));
    }
}
