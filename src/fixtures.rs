#[cfg(test)]
pub mod test {
    use crate::value::{Value, ValueTree};

    /// Parse a YAML snippet into a [`ValueTree`]. Test-only shorthand.
    pub fn yaml(source: &str) -> ValueTree {
        if source.trim().is_empty() {
            return ValueTree::new();
        }
        match serde_yaml::from_str::<Value>(source).unwrap() {
            Value::Tree(tree) => tree,
            Value::Null => ValueTree::new(),
            other => panic!("fixture is not a mapping: {other:?}"),
        }
    }

    /// Build an owned environment snapshot from string pairs.
    pub fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn yaml_fixture_parses_nested_flow_mappings() {
        let tree = yaml("app: {name: x, ports: [1, 2]}");
        let app = tree["app"].as_tree().unwrap();
        assert_eq!(app["name"].as_str(), Some("x"));
        assert_eq!(
            app["ports"],
            Value::Sequence(vec![Value::Integer(1), Value::Integer(2)])
        );
    }

    #[test]
    fn yaml_fixture_empty_is_empty_tree() {
        assert!(yaml("").is_empty());
    }
}
