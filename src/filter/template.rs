//! Placeholder substitution for a single resource file.

use std::collections::BTreeSet;

use super::merge::MergedProperties;
use super::resources::ResourceFile;
use super::scanner::{placeholders, scan};
use super::FilterError;

/// What to do about placeholders left unresolved after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPolicy {
    pub fail_on_missing: bool,
    pub allowed_missing: BTreeSet<String>,
}

impl Default for MissingPolicy {
    fn default() -> Self {
        Self {
            fail_on_missing: true,
            allowed_missing: BTreeSet::new(),
        }
    }
}

impl MissingPolicy {
    /// Whether `unresolved` may be written out as-is.
    pub fn accepts(&self, unresolved: &BTreeSet<String>) -> bool {
        !self.fail_on_missing || unresolved.is_subset(&self.allowed_missing)
    }
}

/// Filtered text plus the placeholder names still present in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub text: String,
    pub unresolved: BTreeSet<String>,
}

/// Replaces every live `${name}` whose name is in `properties`.
///
/// Unknown names and escaped markers are left verbatim. Substituted values
/// are not scanned again.
pub fn substitute(text: &str, properties: &MergedProperties) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;

    for placeholder in placeholders(text) {
        if placeholder.escaped {
            continue;
        }
        if let Some(value) = properties.get(placeholder.name) {
            out.push_str(&text[copied..placeholder.span.start]);
            out.push_str(value);
            copied = placeholder.span.end;
        }
    }

    out.push_str(&text[copied..]);
    out
}

/// Substitutes `properties` into `resource` and checks what is left
/// against `policy`.
pub fn filter(
    resource: &ResourceFile,
    properties: &MergedProperties,
    policy: &MissingPolicy,
) -> Result<FilterResult, FilterError> {
    let text = substitute(&resource.contents, properties);
    let unresolved = scan(&text);

    if !policy.accepts(&unresolved) {
        return Err(FilterError::MissingProperties {
            variables: unresolved,
            environment: properties.environment().to_string(),
            resource: resource.path.clone(),
            original: resource.contents.clone(),
            filtered: text,
        });
    }

    Ok(FilterResult { text, unresolved })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(contents: &str) -> ResourceFile {
        ResourceFile::new("app.conf", contents)
    }

    fn props(pairs: &[(&str, &str)]) -> MergedProperties {
        MergedProperties::from_values("dev", pairs.iter().copied())
    }

    fn policy(fail_on_missing: bool, allowed: &[&str]) -> MissingPolicy {
        MissingPolicy {
            fail_on_missing,
            allowed_missing: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolved_placeholder() {
        let result = filter(
            &resource("host=${db.host}"),
            &props(&[("db.host", "x")]),
            &policy(true, &[]),
        )
        .unwrap();
        assert_eq!(result.text, "host=x");
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_missing_placeholder_fails() {
        let result = filter(&resource("host=${db.host}"), &props(&[]), &policy(true, &[]));
        match result {
            Err(FilterError::MissingProperties {
                variables,
                environment,
                resource,
                original,
                filtered,
            }) => {
                assert_eq!(variables, set(&["db.host"]));
                assert_eq!(environment, "dev");
                assert_eq!(resource, "app.conf");
                assert_eq!(original, "host=${db.host}");
                assert_eq!(filtered, "host=${db.host}");
            }
            other => panic!("expected missing properties, got {other:?}"),
        }
    }

    #[test]
    fn test_allow_listed_placeholder_passes() {
        let result = filter(
            &resource("host=${db.host}"),
            &props(&[]),
            &policy(true, &["db.host"]),
        )
        .unwrap();
        assert_eq!(result.text, "host=${db.host}");
        assert_eq!(result.unresolved, set(&["db.host"]));
    }

    #[test]
    fn test_policy_disabled_passes() {
        let result =
            filter(&resource("host=${db.host}"), &props(&[]), &policy(false, &[])).unwrap();
        assert_eq!(result.text, "host=${db.host}");
        assert_eq!(result.unresolved, set(&["db.host"]));
    }

    #[test]
    fn test_partially_allow_listed_still_fails() {
        let result = filter(
            &resource("${a} ${b}"),
            &props(&[]),
            &policy(true, &["a"]),
        );
        assert!(matches!(
            result,
            Err(FilterError::MissingProperties { variables, .. }) if variables == set(&["a", "b"])
        ));
    }

    #[test]
    fn test_escaped_marker_is_left_alone() {
        let result = filter(
            &resource(r"literal \${host} real ${host}"),
            &props(&[("host", "h")]),
            &policy(true, &[]),
        )
        .unwrap();
        assert_eq!(result.text, r"literal \${host} real h");
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_substitution_is_single_pass() {
        let properties = props(&[("a", "${b}"), ("b", "deep")]);
        assert_eq!(substitute("${a}", &properties), "${b}");

        let result = filter(&resource("${a}"), &properties, &policy(false, &[])).unwrap();
        assert_eq!(result.unresolved, set(&["b"]));
    }

    #[test]
    fn test_repeated_and_adjacent_placeholders() {
        let properties = props(&[("host", "localhost"), ("port", "5432")]);
        assert_eq!(
            substitute("url=${host}:${port}/${host}${port}", &properties),
            "url=localhost:5432/localhost5432"
        );
    }
}
