use crate::config::schema::{PatcherConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the project directory when present.
pub const CONFIG_FILE: &str = "annotator.toml";

/// Why an `annotator.toml` could not be turned into a [`PatcherConfig`].
///
/// `file` is `None` for configs loaded from a string.
#[derive(Debug)]
pub enum ConfigError {
    Unreadable {
        file: PathBuf,
        source: std::io::Error,
    },
    Malformed {
        file: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Rejected {
        file: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn file(&self) -> Option<&Path> {
        match self {
            ConfigError::Unreadable { file, .. } => Some(file.as_path()),
            ConfigError::Malformed { file, .. } | ConfigError::Rejected { file, .. } => {
                file.as_deref()
            }
        }
    }

    fn in_file(mut self, path: &Path) -> Self {
        if let ConfigError::Malformed { file, .. } | ConfigError::Rejected { file, .. } = &mut self
        {
            file.get_or_insert_with(|| path.to_path_buf());
        }
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            ConfigError::Unreadable { .. } => "cannot read annotator config",
            ConfigError::Malformed { .. } => "annotator config is not valid TOML",
            ConfigError::Rejected { .. } => "annotator config rejected",
        };
        match self.file() {
            Some(file) => write!(f, "{what} {}", file.display())?,
            None => f.write_str(what)?,
        }
        match self {
            ConfigError::Unreadable { source, .. } => write!(f, ": {source}"),
            ConfigError::Malformed { source, .. } => write!(f, ": {source}"),
            ConfigError::Rejected { source, .. } => write!(f, ":\n{source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Unreadable { source, .. } => Some(source),
            ConfigError::Malformed { source, .. } => Some(source),
            ConfigError::Rejected { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a config held in memory.
pub fn load_from_str(input: &str) -> Result<PatcherConfig, ConfigError> {
    let config: PatcherConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Malformed { file: None, source })?;
    if let Err(source) = config.validate() {
        return Err(ConfigError::Rejected { file: None, source });
    }
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatcherConfig, ConfigError> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => load_from_str(&contents).map_err(|err| err.in_file(path)),
        Err(source) => Err(ConfigError::Unreadable {
            file: path.to_path_buf(),
            source,
        }),
    }
}

/// `<project_dir>/annotator.toml` if it exists, otherwise the built-in defaults.
pub fn load_for_project(project_dir: &Path) -> Result<PatcherConfig, ConfigError> {
    let candidate = project_dir.join(CONFIG_FILE);
    if !candidate.is_file() {
        return Ok(PatcherConfig::default());
    }
    load_from_path(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ValidationIssue;

    #[test]
    fn test_empty_input_yields_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, PatcherConfig::default());
        assert_eq!(config.processor.artifact_id, "annotator-scanner");
        assert_eq!(config.processor.version, "1.3.8");
        assert_eq!(config.compiler.plugin_artifact_id, "maven-compiler-plugin");
        assert_eq!(config.compiler.marker, "-XepOpt:NullAway");
        assert_eq!(
            config.annotator.command,
            vec!["java", "-jar", "annotator-core.jar"]
        );
        assert!(config.annotator.redirect_build_output);
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let config = load_from_str(
            r#"
[processor]
version = "1.3.9"

[annotator]
command = ["/opt/annotator/bin/annotator"]
redirect_build_output = false
"#,
        )
        .unwrap();

        assert_eq!(config.processor.version, "1.3.9");
        assert_eq!(config.processor.group_id, "edu.ucr.cs.riple.annotator");
        assert_eq!(config.annotator.command, vec!["/opt/annotator/bin/annotator"]);
        assert!(!config.annotator.redirect_build_output);
        assert_eq!(
            config.annotator.initializer,
            "com.uber.nullaway.annotations.Initializer"
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = load_from_str("[compiler]\nplugin = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { file: None, .. }));
    }

    #[test]
    fn test_validation_collects_all_issues() {
        let err = load_from_str(
            r#"
[processor]
version = ""
artifact_id = "annotator scanner"

[annotator]
command = []
"#,
        )
        .unwrap_err();

        let source = match err {
            ConfigError::Rejected { source, .. } => source,
            other => panic!("expected validation error, got {other}"),
        };
        assert_eq!(source.issues.len(), 3);
        assert!(source.issues.iter().any(|issue| matches!(
            issue,
            ValidationIssue::MissingField { field: "processor.version" }
        )));
        assert!(source.issues.iter().any(|issue| matches!(
            issue,
            ValidationIssue::MissingField { field: "annotator.command" }
        )));
        assert!(source.issues.iter().any(|issue| matches!(
            issue,
            ValidationIssue::InvalidValue { field: "processor.artifact_id", .. }
        )));
    }

    #[test]
    fn test_load_from_path_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[compiler]\nmarker = \"\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_unreadable_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
        assert!(err
            .to_string()
            .starts_with(&format!("cannot read annotator config {}: ", path.display())));
    }

    #[test]
    fn test_load_for_project_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_for_project(dir.path()).unwrap(),
            PatcherConfig::default()
        );
    }

    #[test]
    fn test_load_for_project_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[annotator]\ninitializer = \"com.example.Init\"\n",
        )
        .unwrap();

        let config = load_for_project(dir.path()).unwrap();
        assert_eq!(config.annotator.initializer, "com.example.Init");
    }
}
