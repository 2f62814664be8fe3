use crate::pom::{Coordinates, COMPILER_PLUGIN, NULLAWAY_MARKER};
use serde::Deserialize;
use std::fmt;

const SCANNER_GROUP_ID: &str = "edu.ucr.cs.riple.annotator";
const SCANNER_ARTIFACT_ID: &str = "annotator-scanner";
const SCANNER_VERSION: &str = "1.3.8";
const INITIALIZER: &str = "com.uber.nullaway.annotations.Initializer";
const BUILD_COMMAND: &str = "mvn compile -DskipTests";
const ANNOTATOR_JAR: &str = "annotator-core.jar";

/// Settings for one patch-invoke-restore run. Every field has a default, so
/// an empty file (or no file at all) is a valid configuration.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PatcherConfig {
    pub processor: ProcessorSettings,
    pub compiler: CompilerSettings,
    pub annotator: AnnotatorSettings,
}

/// The scanner processor added to `annotationProcessorPaths`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorSettings {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ProcessorSettings {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(&self.group_id, &self.artifact_id, &self.version)
    }
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            group_id: SCANNER_GROUP_ID.to_string(),
            artifact_id: SCANNER_ARTIFACT_ID.to_string(),
            version: SCANNER_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerSettings {
    /// artifactId of the plugin to patch.
    pub plugin_artifact_id: String,
    /// Compiler arguments containing this substring receive the extra options.
    pub marker: String,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            plugin_artifact_id: COMPILER_PLUGIN.to_string(),
            marker: NULLAWAY_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorSettings {
    /// Program and leading arguments used to start the annotator.
    pub command: Vec<String>,
    /// Fully qualified initializer annotation (`-i`).
    pub initializer: String,
    /// Build run by the annotator from the project's base directory.
    pub build_command: String,
    /// Pass `-rboserr`.
    pub redirect_build_output: bool,
}

impl AnnotatorSettings {
    /// Replace the command with `java -jar <jar>`.
    pub fn use_jar(&mut self, jar: &str) {
        self.command = vec!["java".to_string(), "-jar".to_string(), jar.to_string()];
    }
}

impl Default for AnnotatorSettings {
    fn default() -> Self {
        let mut settings = Self {
            command: Vec::new(),
            initializer: INITIALIZER.to_string(),
            build_command: BUILD_COMMAND.to_string(),
            redirect_build_output: true,
        };
        settings.use_jar(ANNOTATOR_JAR);
        settings
    }
}

impl PatcherConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let required = [
            ("processor.group_id", &self.processor.group_id),
            ("processor.artifact_id", &self.processor.artifact_id),
            ("processor.version", &self.processor.version),
            ("compiler.plugin_artifact_id", &self.compiler.plugin_artifact_id),
            ("compiler.marker", &self.compiler.marker),
            ("annotator.initializer", &self.annotator.initializer),
            ("annotator.build_command", &self.annotator.build_command),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField { field });
            }
        }

        match self.annotator.command.first() {
            None => issues.push(ValidationIssue::MissingField {
                field: "annotator.command",
            }),
            Some(program) if program.trim().is_empty() => {
                issues.push(ValidationIssue::InvalidValue {
                    field: "annotator.command",
                    message: "program name is empty".to_string(),
                });
            }
            Some(_) => {}
        }

        let coordinates = [
            ("processor.group_id", &self.processor.group_id),
            ("processor.artifact_id", &self.processor.artifact_id),
            ("processor.version", &self.processor.version),
        ];
        for (field, value) in coordinates {
            if value.chars().any(|ch| ch.is_whitespace() || ch == ':') {
                issues.push(ValidationIssue::InvalidValue {
                    field,
                    message: format!("'{value}' is not a valid Maven coordinate"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid value for '{field}': {message}")
            }
        }
    }
}
