//! Record path and text helpers

use serde_json::Value;

/// Read the value at a dotted path (`a.b.0.c`) inside a record.
///
/// An empty path returns the record itself. Numeric segments index arrays.
pub fn value_at_path(record: &Value, path: &str) -> Option<Value> {
    if path.is_empty() {
        return Some(record.clone());
    }
    let pointer: String = path.split('.').map(|segment| format!("/{segment}")).collect();
    record.pointer(&pointer).cloned()
}

/// Join a parent path and a child entry, skipping empty parts.
pub fn join_path(parent: &str, entry: &str) -> String {
    match (parent.is_empty(), entry.is_empty()) {
        (true, _) => entry.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}.{entry}"),
    }
}

/// Everything before the last path segment, or `""` for a single segment.
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('.').map(|(parent, _)| parent).unwrap_or("")
}

/// Lowercase slug: runs of non-alphanumeric characters become one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// `created_at` → `Created At`
pub fn titleize(input: &str) -> String {
    input
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// JavaScript-style nullishness: missing and `null` both count as unset.
pub fn is_unset(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn path_lookup() {
        let record = json!({"a": {"b": [10, {"c": "deep"}]}, "x": null});
        assert_eq!(value_at_path(&record, "a.b.1.c"), Some(json!("deep")));
        assert_eq!(value_at_path(&record, "a.b.0"), Some(json!(10)));
        assert_eq!(value_at_path(&record, "x"), Some(Value::Null));
        assert_eq!(value_at_path(&record, "a.missing"), None);
        assert_eq!(value_at_path(&record, ""), Some(record.clone()));
    }

    #[rstest]
    #[case("", "name", "name")]
    #[case("settings", "", "settings")]
    #[case("plugin.settings", "host", "plugin.settings.host")]
    fn join(#[case] parent: &str, #[case] entry: &str, #[case] expected: &str) {
        assert_eq!(join_path(parent, entry), expected);
    }

    #[test]
    fn parent_of_path() {
        assert_eq!(parent_path("plugin.settings"), "plugin");
        assert_eq!(parent_path("settings"), "");
    }

    #[rstest]
    #[case("Title", "title")]
    #[case("created_at", "created-at")]
    #[case("  Odd -- Name!! ", "odd-name")]
    fn slug(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[rstest]
    #[case("title", "Title")]
    #[case("created_at", "Created At")]
    #[case("data-src", "Data Src")]
    fn title(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(titleize(input), expected);
    }

    #[test]
    fn unset_values() {
        assert!(is_unset(None));
        assert!(is_unset(Some(&Value::Null)));
        assert!(!is_unset(Some(&json!(0))));
        assert!(!is_unset(Some(&json!(""))));
    }
}
