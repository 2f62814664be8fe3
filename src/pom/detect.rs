use crate::pom::{plugins, ANNOTATION_PROCESSOR_PATHS, ARTIFACT_ID, GROUP_ID, PATH, VERSION};
use crate::xml::ConfigNode;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Annotation processors the detector knows how to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KnownProcessor {
    #[serde(rename = "error-prone")]
    ErrorProne,
    #[serde(rename = "nullaway")]
    NullAway,
}

impl KnownProcessor {
    pub const ALL: [KnownProcessor; 2] = [KnownProcessor::ErrorProne, KnownProcessor::NullAway];

    /// `(groupId, artifactId)` of the processor library.
    pub fn coordinates(self) -> (&'static str, &'static str) {
        match self {
            KnownProcessor::ErrorProne => ("com.google.errorprone", "error_prone_core"),
            KnownProcessor::NullAway => ("com.uber.nullaway", "nullaway"),
        }
    }

    fn matching(group_id: &str, artifact_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|processor| processor.coordinates() == (group_id, artifact_id))
    }
}

impl fmt::Display for KnownProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownProcessor::ErrorProne => write!(f, "Error Prone"),
            KnownProcessor::NullAway => write!(f, "NullAway"),
        }
    }
}

/// Which configuration block a processor path was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DetectionSite {
    Plugin,
    Execution { id: Option<String> },
}

impl fmt::Display for DetectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionSite::Plugin => write!(f, "plugin configuration"),
            DetectionSite::Execution { id: Some(id) } => write!(f, "execution '{id}'"),
            DetectionSite::Execution { id: None } => write!(f, "unnamed execution"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub processor: KnownProcessor,
    pub version: String,
    pub site: DetectionSite,
}

/// Report every known processor registered on `plugin_artifact_id`'s
/// processor path, in file order. Never mutates and never fails.
pub fn detect_processors(project: &ConfigNode, plugin_artifact_id: &str) -> Vec<Detection> {
    let mut found = Vec::new();

    for plugin in plugins(project).filter(|p| p.artifact_id() == Some(plugin_artifact_id)) {
        if let Some(configuration) = plugin.configuration() {
            scan_configuration(configuration, &DetectionSite::Plugin, &mut found);
        }
        for execution in plugin.executions() {
            let site = DetectionSite::Execution {
                id: execution.id().map(str::to_string),
            };
            if let Some(configuration) = execution.configuration() {
                scan_configuration(configuration, &site, &mut found);
            }
        }
    }

    debug!(count = found.len(), "processor detection finished");
    found
}

fn scan_configuration(
    configuration: &ConfigNode,
    site: &DetectionSite,
    found: &mut Vec<Detection>,
) {
    let Some(paths) = configuration.get_child(ANNOTATION_PROCESSOR_PATHS) else {
        return;
    };

    for path in paths.children_named(PATH) {
        let (Some(group_id), Some(artifact_id), Some(version)) = (
            path.child_value(GROUP_ID),
            path.child_value(ARTIFACT_ID),
            path.child_value(VERSION),
        ) else {
            continue;
        };

        if let Some(processor) = KnownProcessor::matching(group_id, artifact_id) {
            found.push(Detection {
                processor,
                version: version.to_string(),
                site: site.clone(),
            });
        }
    }
}
