use crate::value::{Value, ValueTree};

/// Build a [`ValueTree`] from environment variables.
///
/// Every variable is included. `UPPER_SNAKE` names become `lowerCamel` keys
/// (see [`to_camel_case`]) and values stay strings: unlike `--set` values,
/// environment values are never type-inferred.
///
/// Takes an iterator so tests can pass synthetic data instead of the process
/// environment.
pub fn env_to_tree(vars: impl IntoIterator<Item = (String, String)>) -> ValueTree {
    let mut tree = ValueTree::new();
    for (name, value) in vars {
        tree.insert(to_camel_case(&name), Value::String(value));
    }
    tree
}

/// Snapshot the process environment as `(name, value)` pairs.
///
/// Names or values that are not valid Unicode are converted lossily instead of
/// aborting the run.
pub fn process_env() -> Vec<(String, String)> {
    std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

/// Convert `UPPER_CASE_WITH_UNDERSCORES` to `lowerCamelCase`.
///
/// The whole name is lowercased and split on `_`. The first segment is kept
/// as-is; every later non-empty segment has its first character uppercased.
pub fn to_camel_case(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut parts = lower.split('_');
    let mut out = parts.next().unwrap_or_default().to_string();

    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::vars;

    #[test]
    fn camel_case_two_segments() {
        assert_eq!(to_camel_case("DATABASE_HOST"), "databaseHost");
        assert_eq!(to_camel_case("MAX_CONNECTIONS"), "maxConnections");
    }

    #[test]
    fn camel_case_single_letter_segments() {
        assert_eq!(to_camel_case("A_B_C_D"), "aBCD");
    }

    #[test]
    fn camel_case_empty() {
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn camel_case_single_segment_lowercased() {
        assert_eq!(to_camel_case("PATH"), "path");
    }

    #[test]
    fn camel_case_skips_empty_segments() {
        assert_eq!(to_camel_case("APP__VERSION"), "appVersion");
        assert_eq!(to_camel_case("TRAILING_"), "trailing");
    }

    #[test]
    fn camel_case_leading_underscore() {
        assert_eq!(to_camel_case("_PRIVATE_VAR"), "PrivateVar");
    }

    #[test]
    fn values_stay_strings() {
        let tree = env_to_tree(vars(&[("PORT", "8080"), ("DEBUG", "true")]));
        assert_eq!(tree["port"], Value::String("8080".into()));
        assert_eq!(tree["debug"], Value::String("true".into()));
    }

    #[test]
    fn every_variable_included() {
        let tree = env_to_tree(vars(&[
            ("HOME", "/root"),
            ("DATABASE_HOST", "db.internal"),
            ("APP_VERSION", "1.2.3"),
        ]));
        assert_eq!(tree.len(), 3);
        assert_eq!(tree["home"].as_str(), Some("/root"));
        assert_eq!(tree["databaseHost"].as_str(), Some("db.internal"));
        assert_eq!(tree["appVersion"].as_str(), Some("1.2.3"));
    }

    #[test]
    fn value_may_contain_equals() {
        let tree = env_to_tree(vars(&[("OPTS", "a=b=c")]));
        assert_eq!(tree["opts"].as_str(), Some("a=b=c"));
    }

    #[test]
    fn colliding_names_last_wins() {
        let tree = env_to_tree(vars(&[("APP_NAME", "first"), ("app_name", "second")]));
        assert_eq!(tree["appName"].as_str(), Some("second"));
    }

    #[test]
    fn process_env_snapshot_covers_every_variable() {
        assert_eq!(process_env().len(), std::env::vars_os().count());
    }
}
