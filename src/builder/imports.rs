//! Import resolution for Kotlin files.
//!
//! Runs once the whole file has been built. Every dotted name the file
//! refers to is collected, simple names are deduplicated, and each name is
//! given the text it renders as:
//!
//! - names from the file's own package win their simple name, then the rest
//!   in sorted order;
//! - a losing name is aliased as `<last package segment>_<Simple>`, with a
//!   numeric suffix if that is also taken;
//! - own-package names are never imported.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// The outcome of import resolution for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imports {
    /// Fully-qualified name to rendered text.
    pub remap: HashMap<String, String>,
    /// `import` lines, sorted by name.
    pub lines: Vec<String>,
}

fn split(fq_name: &str) -> (&str, &str) {
    match fq_name.rsplit_once('.') {
        Some((pkg, simple)) => (pkg, simple),
        None => ("", fq_name),
    }
}

/// Resolve the names used by a file in package `own_pkg`.
pub fn resolve_imports(own_pkg: &str, names: impl IntoIterator<Item = String>) -> Imports {
    let names: BTreeSet<String> = names.into_iter().filter(|n| n.contains('.')).collect();

    let mut by_simple: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for name in &names {
        by_simple.entry(split(name).1).or_default().push(name);
    }

    let mut remap = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut losers = Vec::new();
    for (simple, mut group) in by_simple {
        // Sorted already; own-package names move to the front.
        group.sort_by_key(|n| split(n).0 != own_pkg);
        let (winner, rest) = group.split_at(1);
        remap.insert(winner[0].to_string(), simple.to_string());
        taken.insert(simple.to_string());
        losers.extend(rest.iter().copied());
    }

    for name in losers {
        let (pkg, simple) = split(name);
        let segment = pkg.rsplit('.').next().unwrap_or(pkg);
        let base = format!("{}_{}", segment, simple);
        let mut alias = base.clone();
        let mut n = 2;
        while taken.contains(&alias) {
            alias = format!("{}{}", base, n);
            n += 1;
        }
        taken.insert(alias.clone());
        remap.insert(name.to_string(), alias);
    }

    let mut lines = Vec::new();
    for name in &names {
        let (pkg, simple) = split(name);
        if pkg == own_pkg {
            continue;
        }
        match remap.get(name) {
            Some(short) if short != simple => lines.push(format!("import {} as {}", name, short)),
            _ => lines.push(format!("import {}", name)),
        }
    }

    Imports { remap, lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_own_package_wins_simple_name() {
        let imports = resolve_imports("x.y", names(&["a.b.C", "x.y.C", "kotlin.Int"]));

        assert_eq!(imports.remap["x.y.C"], "C");
        assert_eq!(imports.remap["a.b.C"], "b_C");
        assert_eq!(
            imports.lines,
            vec!["import a.b.C as b_C", "import kotlin.Int"]
        );
    }

    #[test]
    fn test_sorted_order_then_numeric_suffix() {
        let imports = resolve_imports("pkg", names(&["y.b.C", "a.b.C", "x.b.C"]));

        assert_eq!(imports.remap["a.b.C"], "C");
        assert_eq!(imports.remap["x.b.C"], "b_C");
        assert_eq!(imports.remap["y.b.C"], "b_C2");
    }

    #[test]
    fn test_undotted_and_duplicate_names_ignored() {
        let imports = resolve_imports(
            "pkg",
            names(&["Unit", "kotlin.Int", "kotlin.Int", "pkg.Local"]),
        );

        assert_eq!(imports.lines, vec!["import kotlin.Int"]);
        assert!(!imports.remap.contains_key("Unit"));
        assert_eq!(imports.remap["pkg.Local"], "Local");
    }

    #[test]
    fn test_alias_avoids_existing_simple_name() {
        let imports = resolve_imports("pkg", names(&["a.b.C", "c.b.C", "z.b_C"]));

        assert_eq!(imports.remap["z.b_C"], "b_C");
        assert_eq!(imports.remap["c.b.C"], "b_C2");
    }
}
