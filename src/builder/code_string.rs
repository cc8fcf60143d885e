//! Indentation-aware text output.

use std::collections::HashMap;

/// One level of indentation.
pub const INDENT: &str = "    ";

/// Text buffer that indents each new line to the current block depth.
///
/// Symbols render into it with [`append`](Self::append); a line is indented
/// when its first character is written, so blank lines stay empty.
#[derive(Debug)]
pub struct CodeStringBuilder {
    buf: String,
    depth: usize,
    at_line_start: bool,
    remap: HashMap<String, String>,
    imports: Vec<String>,
}

impl Default for CodeStringBuilder {
    fn default() -> Self {
        CodeStringBuilder {
            buf: String::new(),
            depth: 0,
            at_line_start: true,
            remap: HashMap::new(),
            imports: Vec::new(),
        }
    }
}

impl CodeStringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render fully-qualified names through `remap`.
    pub fn with_remap(mut self, remap: HashMap<String, String>) -> Self {
        self.remap = remap;
        self
    }

    /// Import lines written by the import block placeholder.
    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.buf.push('\n');
                self.at_line_start = true;
            }
            if line.is_empty() {
                continue;
            }
            if self.at_line_start {
                for _ in 0..self.depth {
                    self.buf.push_str(INDENT);
                }
                self.at_line_start = false;
            }
            self.buf.push_str(line);
        }
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.append("\n")
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Text for a fully-qualified name: its remapped form, or the simple
    /// name when the name was not collected.
    pub fn resolve<'a>(&'a self, fq_name: &'a str) -> &'a str {
        match self.remap.get(fq_name) {
            Some(short) => short,
            None => fq_name.rsplit('.').next().unwrap_or(fq_name),
        }
    }

    pub fn remap(&self) -> &HashMap<String, String> {
        &self.remap
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indents_new_lines_only() {
        let mut out = CodeStringBuilder::new();
        out.append("fn {\n");
        out.indent();
        out.append("a;\n\nb;");
        out.append(" c;\n");
        out.dedent();
        out.append("}\n");

        assert_eq!(out.finish(), "fn {\n    a;\n\n    b; c;\n}\n");
    }

    #[test]
    fn test_resolve_falls_back_to_simple_name() {
        let mut remap = HashMap::new();
        remap.insert("a.b.C".to_string(), "b_C".to_string());
        let out = CodeStringBuilder::new().with_remap(remap);

        assert_eq!(out.resolve("a.b.C"), "b_C");
        assert_eq!(out.resolve("x.y.Z"), "Z");
        assert_eq!(out.resolve("Unit"), "Unit");
    }

    #[test]
    fn test_dedent_saturates() {
        let mut out = CodeStringBuilder::new();
        out.dedent();
        assert_eq!(out.depth(), 0);
    }
}
