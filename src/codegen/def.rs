//! The cinterop definition file.

use super::{CompileFlags, ModuleInfo};

/// Writes `<module>.def`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefWriter;

impl DefWriter {
    pub fn generate(&self, info: &ModuleInfo, flags: &CompileFlags) -> String {
        let entries = [
            ("headers", info.header_file()),
            ("compilerOpts", flags.compiler_opts().join(" ")),
            ("linkerOpts", flags.linker_opts().join(" ")),
            ("staticLibraries", flags.static_library_names().join(" ")),
            ("libraryPaths", flags.library_paths().join(" ")),
            ("package", info.internal_package()),
        ];

        let mut out = String::new();
        for (key, value) in entries {
            if value.is_empty() {
                continue;
            }
            out.push_str(&format!("{} = {}\n", key, value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_full_manifest() {
        let info = ModuleInfo::new("TestLib", "com.example");
        let flags = CompileFlags::new(
            &[PathBuf::from("include/test.h")],
            &[PathBuf::from("/opt/lib/libtest.so")],
            &["NDEBUG".to_string()],
        )
        .unwrap()
        .with_static_library(PathBuf::from("out/libtest_lib.a"));

        assert_eq!(
            DefWriter.generate(&info, &flags),
            "headers = test_lib.h\n\
             compilerOpts = -Iinclude -DNDEBUG\n\
             linkerOpts = -L/opt/lib -ltest\n\
             staticLibraries = libtest_lib.a\n\
             libraryPaths = out\n\
             package = com.example.internal\n"
        );
    }

    #[test]
    fn test_empty_lines_omitted() {
        let info = ModuleInfo::new("m", "m");
        let text = DefWriter.generate(&info, &CompileFlags::default());
        assert_eq!(text, "headers = m.h\npackage = m.internal\n");
    }
}
