use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FilterError {
    #[error("directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse property file '{path}' at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error(
        "property '{key}' defined twice for environment '{environment}': \
         in '{}' and '{}'",
        first.display(),
        second.display()
    )]
    Conflict {
        key: String,
        environment: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error(
        "found unfiltered properties {variables:?}\n\
         environment[{environment}],\n\
         resource[{resource}],\n\
         originalContent[-----\n{original}\n-----],\n\
         filteredContent[-----\n{filtered}\n-----]"
    )]
    MissingProperties {
        variables: BTreeSet<String>,
        environment: String,
        resource: String,
        original: String,
        filtered: String,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_properties_message() {
        let err = FilterError::MissingProperties {
            variables: ["db.host".to_string(), "db.port".to_string()].into_iter().collect(),
            environment: "dev".to_string(),
            resource: "conf/app.conf".to_string(),
            original: "url=${db.host}:${db.port}/${db.name}".to_string(),
            filtered: "url=${db.host}:${db.port}/billing".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "found unfiltered properties {\"db.host\", \"db.port\"}\n\
             environment[dev],\n\
             resource[conf/app.conf],\n\
             originalContent[-----\nurl=${db.host}:${db.port}/${db.name}\n-----],\n\
             filteredContent[-----\nurl=${db.host}:${db.port}/billing\n-----]"
        );
    }

    #[test]
    fn test_conflict_message_names_both_files() {
        let err = FilterError::Conflict {
            key: "db.host".to_string(),
            environment: "prod".to_string(),
            first: PathBuf::from("filters/prod/a.properties"),
            second: PathBuf::from("filters/prod/b.properties"),
        };

        let message = err.to_string();
        assert!(message.contains("'db.host'"));
        assert!(message.contains("'prod'"));
        assert!(message.contains("filters/prod/a.properties"));
        assert!(message.contains("filters/prod/b.properties"));
    }
}
