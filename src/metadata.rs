//! Metadata tree and dot-path filter evaluation.
//!
//! Metadata has no schema; it is an arbitrary JSON-like tree (`serde_json`'s
//! `Value` already models exactly this: strings, numbers, booleans, null,
//! arrays, and nested objects), so we reuse it directly rather than defining
//! a parallel type.

use serde_json::Value;
use std::collections::HashMap;

/// A vector's optional metadata tree.
pub type Metadata = Value;

/// A filter is a flat map of dot-paths to the literal value each must equal.
/// Every key must match (logical AND); an empty filter matches everything.
pub type Filter = HashMap<String, Value>;

/// Evaluate a filter against a candidate's metadata.
///
/// A key matches iff, after descending the dot-joined path segments into
/// the metadata object, the resolved leaf equals the filter's literal value
/// with plain scalar equality. A missing intermediate object, a non-object
/// at an intermediate segment, or an absent final key all fail the key.
/// Arrays are never descended by dot syntax — `"tags.0"` does not index
/// into an array named `tags`.
pub fn matches(metadata: Option<&Value>, filter: &Filter) -> bool {
    if filter.is_empty() {
        return true;
    }
    let Some(metadata) = metadata else {
        return false;
    };
    filter.iter().all(|(path, expected)| {
        resolve_path(metadata, path).is_some_and(|leaf| leaf == expected)
    })
}

/// Descend a dot-joined path (`"details.brand"`) into a JSON object,
/// returning the leaf value if every intermediate segment is itself an
/// object and the full path resolves.
fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        let obj = current.as_object()?;
        current = obj.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(pairs: &[(&str, Value)]) -> Filter {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches(None, &Filter::new()));
        assert!(matches(Some(&json!({"a": 1})), &Filter::new()));
    }

    #[test]
    fn simple_key_match() {
        let meta = json!({"category": "electronics"});
        let f = filter(&[("category", json!("electronics"))]);
        assert!(matches(Some(&meta), &f));

        let f2 = filter(&[("category", json!("books"))]);
        assert!(!matches(Some(&meta), &f2));
    }

    #[test]
    fn dot_path_descent() {
        let meta = json!({"details": {"brand": "Sony"}});
        let f = filter(&[("details.brand", json!("Sony"))]);
        assert!(matches(Some(&meta), &f));

        let f2 = filter(&[("details.brand", json!("Apple"))]);
        assert!(!matches(Some(&meta), &f2));
    }

    #[test]
    fn missing_intermediate_object_fails() {
        let meta = json!({"details": "not an object"});
        let f = filter(&[("details.brand", json!("Sony"))]);
        assert!(!matches(Some(&meta), &f));
    }

    #[test]
    fn missing_final_key_fails() {
        let meta = json!({"details": {}});
        let f = filter(&[("details.brand", json!("Sony"))]);
        assert!(!matches(Some(&meta), &f));
    }

    #[test]
    fn arrays_are_not_descended() {
        let meta = json!({"tags": ["a", "b"]});
        let f = filter(&[("tags.0", json!("a"))]);
        assert!(!matches(Some(&meta), &f));
    }

    #[test]
    fn multiple_keys_are_conjunctive() {
        let meta = json!({"category": "e", "details": {"brand": "Sony"}});
        let f = filter(&[
            ("category", json!("e")),
            ("details.brand", json!("Sony")),
        ]);
        assert!(matches(Some(&meta), &f));

        let f2 = filter(&[
            ("category", json!("e")),
            ("details.brand", json!("Apple")),
        ]);
        assert!(!matches(Some(&meta), &f2));
    }

    #[test]
    fn no_metadata_fails_nonempty_filter() {
        let f = filter(&[("category", json!("e"))]);
        assert!(!matches(None, &f));
    }
}
