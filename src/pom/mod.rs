//! Maven POM model on top of [`ConfigNode`]: plugin lookup, processor path
//! injection, compiler-argument rewriting and processor detection.

pub mod detect;
pub mod flags;
pub mod inject;

pub use detect::{detect_processors, Detection, DetectionSite, KnownProcessor};
pub use flags::{option_suffix, rewrite_compiler_args, NULLAWAY_MARKER};
pub use inject::inject_processor_path;

use crate::error::PatchError;
use crate::xml::ConfigNode;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const COMPILER_PLUGIN: &str = "maven-compiler-plugin";

pub const BUILD: &str = "build";
pub const PLUGINS: &str = "plugins";
pub const PLUGIN: &str = "plugin";
pub const EXECUTIONS: &str = "executions";
pub const EXECUTION: &str = "execution";
pub const ID: &str = "id";
pub const CONFIGURATION: &str = "configuration";
pub const ANNOTATION_PROCESSOR_PATHS: &str = "annotationProcessorPaths";
pub const COMPILER_ARGS: &str = "compilerArgs";
pub const PATH: &str = "path";
pub const GROUP_ID: &str = "groupId";
pub const ARTIFACT_ID: &str = "artifactId";
pub const VERSION: &str = "version";

/// A `{groupId, artifactId, version}` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Coordinates {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Read-only view of a `<plugin>` element.
#[derive(Debug, Clone, Copy)]
pub struct Plugin<'a> {
    node: &'a ConfigNode,
}

impl<'a> Plugin<'a> {
    pub fn artifact_id(&self) -> Option<&'a str> {
        self.node.child_value(ARTIFACT_ID)
    }

    pub fn configuration(&self) -> Option<&'a ConfigNode> {
        self.node.get_child(CONFIGURATION)
    }

    pub fn executions(&self) -> impl Iterator<Item = Execution<'a>> {
        self.node
            .get_child(EXECUTIONS)
            .into_iter()
            .flat_map(|executions| executions.children_named(EXECUTION))
            .map(|node| Execution { node })
    }
}

/// Read-only view of an `<execution>` element.
#[derive(Debug, Clone, Copy)]
pub struct Execution<'a> {
    node: &'a ConfigNode,
}

impl<'a> Execution<'a> {
    pub fn id(&self) -> Option<&'a str> {
        self.node.child_value(ID)
    }

    pub fn configuration(&self) -> Option<&'a ConfigNode> {
        self.node.get_child(CONFIGURATION)
    }
}

/// Plugins declared under `<build><plugins>`, in file order.
pub fn plugins(project: &ConfigNode) -> impl Iterator<Item = Plugin<'_>> {
    project
        .get_child(BUILD)
        .and_then(|build| build.get_child(PLUGINS))
        .into_iter()
        .flat_map(|plugins| plugins.children_named(PLUGIN))
        .map(|node| Plugin { node })
}

/// First `<plugin>` whose artifactId is `artifact_id`.
pub fn locate_plugin<'a>(
    project: &'a mut ConfigNode,
    artifact_id: &str,
) -> Result<&'a mut ConfigNode, PatchError> {
    project
        .get_child_mut(BUILD)
        .and_then(|build| build.get_child_mut(PLUGINS))
        .and_then(|plugins| {
            plugins.children_mut().find(|plugin| {
                plugin.name() == PLUGIN && plugin.child_value(ARTIFACT_ID) == Some(artifact_id)
            })
        })
        .ok_or_else(|| PatchError::PluginNotFound {
            artifact_id: artifact_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::PomDocument;

    const POM: &str = r#"<project>
  <build>
    <plugins>
      <plugin>
        <groupId>org.apache.maven.plugins</groupId>
        <artifactId>maven-surefire-plugin</artifactId>
      </plugin>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <version>3.11.0</version>
        <executions>
          <execution>
            <id>default-compile</id>
            <configuration><release>17</release></configuration>
          </execution>
          <execution><id>default-testCompile</id></execution>
        </executions>
      </plugin>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <version>duplicate</version>
      </plugin>
    </plugins>
  </build>
</project>"#;

    #[test]
    fn test_locate_returns_first_match() {
        let mut doc = PomDocument::parse(POM).unwrap();
        let plugin = locate_plugin(doc.root_mut(), COMPILER_PLUGIN).unwrap();
        assert_eq!(plugin.child_value(VERSION), Some("3.11.0"));
    }

    #[test]
    fn test_locate_missing_plugin() {
        let mut doc = PomDocument::parse(POM).unwrap();
        let err = locate_plugin(doc.root_mut(), "maven-jar-plugin").unwrap_err();
        assert!(matches!(
            err,
            PatchError::PluginNotFound { ref artifact_id } if artifact_id == "maven-jar-plugin"
        ));
    }

    #[test]
    fn test_locate_without_build_section() {
        let mut doc = PomDocument::parse("<project><modelVersion>4.0.0</modelVersion></project>").unwrap();
        assert!(locate_plugin(doc.root_mut(), COMPILER_PLUGIN).is_err());
        assert_eq!(plugins(doc.root()).count(), 0);
    }

    #[test]
    fn test_plugin_views() {
        let doc = PomDocument::parse(POM).unwrap();
        let all: Vec<_> = plugins(doc.root()).collect();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].artifact_id(), Some("maven-surefire-plugin"));

        let ids: Vec<_> = all[1].executions().map(|e| e.id()).collect();
        assert_eq!(ids, vec![Some("default-compile"), Some("default-testCompile")]);
        let first = all[1].executions().next().unwrap();
        assert_eq!(first.configuration().and_then(|c| c.child_value("release")), Some("17"));
        assert!(all[1].configuration().is_none());
    }

    #[test]
    fn test_coordinates_display() {
        let coords = Coordinates::new("com.uber.nullaway", "nullaway", "0.10.10");
        assert_eq!(coords.to_string(), "com.uber.nullaway:nullaway:0.10.10");
    }
}
