//! Build-dependency records.
//!
//! A BuildDependency names a pkg-config package together with the
//! (context, relation) pairs in which the generated build system must use
//! it, e.g. {(core, include), (core, link)}. Two records with the same
//! variable name are duplicates; deduplication keeps the union of their
//! pairs, never both copies.

use std::collections::{BTreeMap, BTreeSet};

/// A named, deduplicable record of a package usage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDependency {
    var_name: String,
    pkg_name: String,
    contexts: BTreeSet<(String, String)>,
}

impl BuildDependency {
    /// Create a dependency with no usage contexts yet.
    pub fn new(var_name: impl Into<String>, pkg_name: impl Into<String>) -> Self {
        BuildDependency {
            var_name: var_name.into(),
            pkg_name: pkg_name.into(),
            contexts: BTreeSet::new(),
        }
    }

    /// Tag this dependency as used in the given (context, relation) pair.
    pub fn in_context(mut self, context: &str, relation: &str) -> Self {
        self.add_context(context, relation);
        self
    }

    /// Add a (context, relation) pair in place.
    pub fn add_context(&mut self, context: &str, relation: &str) {
        self.contexts
            .insert((context.to_string(), relation.to_string()));
    }

    /// True if any pair uses the given context.
    pub fn has_context(&self, context: &str) -> bool {
        self.contexts.iter().any(|(ctx, _)| ctx == context)
    }

    /// True if the exact (context, relation) pair is present.
    pub fn has_relation(&self, context: &str, relation: &str) -> bool {
        self.contexts
            .contains(&(context.to_string(), relation.to_string()))
    }

    /// Remove every pair with the given relation, in any context.
    pub fn remove_relation(&mut self, relation: &str) {
        self.contexts.retain(|(_, rel)| rel != relation);
    }

    /// Absorb another record's pairs. Caller guarantees matching
    /// `var_name`s.
    pub fn merge(&mut self, other: &BuildDependency) {
        self.contexts.extend(other.contexts.iter().cloned());
    }

    /// Variable name used in generated build files.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    /// pkg-config package name.
    pub fn pkg_name(&self) -> &str {
        &self.pkg_name
    }

    /// All (context, relation) pairs.
    pub fn contexts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.contexts
            .iter()
            .map(|(ctx, rel)| (ctx.as_str(), rel.as_str()))
    }
}

/// Deduplicate by variable name, keeping the union of (context, relation)
/// pairs, and return the result sorted by variable name.
pub fn dedupe_sorted(deps: Vec<BuildDependency>) -> Vec<BuildDependency> {
    let mut by_var: BTreeMap<String, BuildDependency> = BTreeMap::new();
    for dep in deps {
        match by_var.get_mut(dep.var_name()) {
            Some(existing) => existing.merge(&dep),
            None => {
                by_var.insert(dep.var_name().to_string(), dep);
            }
        }
    }
    by_var.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts() {
        let dep = BuildDependency::new("OPENCV", "opencv")
            .in_context("core", "include")
            .in_context("core", "link");

        assert!(dep.has_context("core"));
        assert!(dep.has_relation("core", "include"));
        assert!(dep.has_relation("core", "link"));
        assert!(!dep.has_context("transport"));
    }

    #[test]
    fn test_remove_relation() {
        let mut dep = BuildDependency::new("BASE_TYPEKIT", "base-typekit-gnulinux")
            .in_context("core", "include")
            .in_context("core", "link");

        dep.remove_relation("link");
        assert!(dep.has_relation("core", "include"));
        assert!(!dep.has_relation("core", "link"));
    }

    #[test]
    fn test_dedupe_keeps_union() {
        let deps = vec![
            BuildDependency::new("OPENCV", "opencv").in_context("core", "include"),
            BuildDependency::new("OPENCV", "opencv").in_context("core", "link"),
            BuildDependency::new("AUDIO", "audio").in_context("core", "include"),
        ];

        let deduped = dedupe_sorted(deps);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].var_name(), "AUDIO");
        assert_eq!(deduped[1].var_name(), "OPENCV");
        assert!(deduped[1].has_relation("core", "include"));
        assert!(deduped[1].has_relation("core", "link"));
    }

    #[test]
    fn test_dedupe_output_is_sorted() {
        let deps = vec![
            BuildDependency::new("ZLIB", "zlib"),
            BuildDependency::new("AUDIO", "audio"),
            BuildDependency::new("OPENCV", "opencv"),
        ];

        let names: Vec<String> = dedupe_sorted(deps)
            .iter()
            .map(|d| d.var_name().to_string())
            .collect();
        assert_eq!(names, ["AUDIO", "OPENCV", "ZLIB"]);
    }
}
