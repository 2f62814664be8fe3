use crate::pom::{
    Coordinates, ANNOTATION_PROCESSOR_PATHS, ARTIFACT_ID, CONFIGURATION, GROUP_ID, PATH, VERSION,
};
use crate::xml::ConfigNode;
use tracing::debug;

/// Append a `<path>` for `entry` to the plugin's `annotationProcessorPaths`.
///
/// Creates `configuration` and `annotationProcessorPaths` when missing. An
/// existing entry for the same coordinates is not merged; running this twice
/// registers the processor twice.
pub fn inject_processor_path(plugin: &mut ConfigNode, entry: &Coordinates) {
    let configuration = plugin.ensure_child(CONFIGURATION);
    let paths = configuration.ensure_child(ANNOTATION_PROCESSOR_PATHS);

    let mut path = ConfigNode::new(PATH);
    path.add_child(ConfigNode::with_value(GROUP_ID, &entry.group_id));
    path.add_child(ConfigNode::with_value(ARTIFACT_ID, &entry.artifact_id));
    path.add_child(ConfigNode::with_value(VERSION, &entry.version));
    paths.add_child(path);

    debug!(processor = %entry, "added annotation processor path");
}
