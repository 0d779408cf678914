use tracing::debug;

use crate::value::{Value, ValueTree};

/// Deep-merge `src` on top of `dst`.
///
/// If both sides hold a tree for the same key, recurse. If only `src` does,
/// `dst` gets a fresh copy of it. Otherwise `src`'s value wins. `src` is never
/// aliased, so later edits to `dst` cannot reach back into a source tree.
pub fn deep_merge(dst: &mut ValueTree, src: &ValueTree) {
    for (key, src_val) in src {
        match (dst.get_mut(key), src_val) {
            (Some(Value::Tree(dst_tree)), Value::Tree(src_tree)) => {
                deep_merge(dst_tree, src_tree);
            }
            (_, Value::Tree(src_tree)) => {
                let mut fresh = ValueTree::new();
                deep_merge(&mut fresh, src_tree);
                dst.insert(key.clone(), Value::Tree(fresh));
            }
            (_, src_val) => {
                dst.insert(key.clone(), src_val.clone());
            }
        }
    }
}

/// Merge trees into a new one, later trees taking precedence.
pub fn merge_all<'a>(layers: impl IntoIterator<Item = &'a ValueTree>) -> ValueTree {
    let mut merged = ValueTree::new();
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}

/// The four value sources of a run, held separately until merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSources {
    /// Parsed from the values file. Lowest precedence.
    pub file: ValueTree,
    /// Derived from the environment snapshot.
    pub env: ValueTree,
    /// Parsed from `--set` assignments.
    pub overrides: ValueTree,
    /// Caller-supplied values. Highest precedence.
    pub preset: ValueTree,
}

impl ValueSources {
    /// Merge file → env → overrides → preset into a single tree.
    pub fn merge(&self) -> ValueTree {
        let merged = merge_all([&self.file, &self.env, &self.overrides, &self.preset]);
        debug!(
            "merged {} file, {} env, {} override and {} preset keys into {} top-level keys",
            self.file.len(),
            self.env.len(),
            self.overrides.len(),
            self.preset.len(),
            merged.len()
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::yaml;

    #[test]
    fn disjoint_keys_merge() {
        let mut dst = yaml("host: localhost");
        deep_merge(&mut dst, &yaml("port: 3000"));
        assert_eq!(dst["host"].as_str(), Some("localhost"));
        assert_eq!(dst["port"].as_integer(), Some(3000));
    }

    #[test]
    fn same_scalar_key_src_wins() {
        let mut dst = yaml("port: 8080");
        deep_merge(&mut dst, &yaml("port: 3000"));
        assert_eq!(dst["port"].as_integer(), Some(3000));
    }

    #[test]
    fn nested_disjoint_keys_combine() {
        let merged = merge_all([&yaml("app: {name: x}"), &yaml("app: {version: '1'}")]);
        assert_eq!(merged, yaml("app: {name: x, version: '1'}"));
    }

    #[test]
    fn src_scalar_replaces_tree() {
        let mut dst = yaml("database: {url: x}");
        deep_merge(&mut dst, &yaml("database: flat_string"));
        assert_eq!(dst["database"].as_str(), Some("flat_string"));
    }

    #[test]
    fn src_tree_replaces_scalar() {
        let mut dst = yaml("database: flat_string");
        deep_merge(&mut dst, &yaml("database: {url: x}"));
        assert_eq!(dst["database"], Value::Tree(yaml("url: x")));
    }

    #[test]
    fn sequences_are_replaced_not_concatenated() {
        let mut dst = yaml("hosts: [a, b]");
        deep_merge(&mut dst, &yaml("hosts: [c]"));
        assert_eq!(dst, yaml("hosts: [c]"));
    }

    #[test]
    fn deeply_nested_three_levels() {
        let mut dst = yaml("a: {b: {c: {val: 1, other: keep}}}");
        deep_merge(&mut dst, &yaml("a: {b: {c: {val: 99}}}"));
        assert_eq!(dst, yaml("a: {b: {c: {val: 99, other: keep}}}"));
    }

    #[test]
    fn merged_tree_does_not_alias_source() {
        let source = yaml("app: {name: original}");
        let mut merged = merge_all([&source]);

        merged
            .get_mut("app")
            .and_then(Value::as_tree_mut)
            .unwrap()
            .insert("name".into(), Value::from("mutated"));

        assert_eq!(source["app"].as_tree().unwrap()["name"].as_str(), Some("original"));
    }

    #[test]
    fn merge_is_order_sensitive() {
        let a = yaml("key: a");
        let b = yaml("key: b");
        assert_eq!(merge_all([&a, &b])["key"].as_str(), Some("b"));
        assert_eq!(merge_all([&b, &a])["key"].as_str(), Some("a"));
    }

    #[test]
    fn empty_layers_yield_empty_tree() {
        assert!(merge_all(std::iter::empty()).is_empty());
    }

    #[test]
    fn precedence_override_beats_env_beats_file() {
        let sources = ValueSources {
            file: yaml("k: file"),
            env: yaml("k: env"),
            overrides: yaml("k: override"),
            preset: ValueTree::new(),
        };
        assert_eq!(sources.merge()["k"].as_str(), Some("override"));

        let sources = ValueSources {
            overrides: ValueTree::new(),
            ..sources
        };
        assert_eq!(sources.merge()["k"].as_str(), Some("env"));
    }

    #[test]
    fn preset_has_highest_precedence() {
        let sources = ValueSources {
            file: yaml("k: file"),
            env: yaml("k: env"),
            overrides: yaml("k: override"),
            preset: yaml("k: preset"),
        };
        assert_eq!(sources.merge()["k"].as_str(), Some("preset"));
    }

    #[test]
    fn sparse_layers_combine() {
        let sources = ValueSources {
            file: yaml("app: {name: test-app, version: 1.0.0}"),
            env: yaml("home: /root"),
            overrides: yaml("app: {version: 2.0.0}\ndebug: true"),
            preset: ValueTree::new(),
        };
        let merged = sources.merge();
        assert_eq!(
            merged,
            yaml("app: {name: test-app, version: 2.0.0}\nhome: /root\ndebug: true")
        );
    }
}
