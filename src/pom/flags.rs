use crate::pom::COMPILER_ARGS;
use crate::xml::ConfigNode;
use std::path::Path;
use tracing::{debug, info};

/// Substring identifying compiler arguments that configure NullAway.
pub const NULLAWAY_MARKER: &str = "-XepOpt:NullAway";

const SCANNER_CHECK: &str = "-Xep:AnnotatorScanner:ERROR";
const SCANNER_CONFIG_OPT: &str = "-XepOpt:AnnotatorScanner:ConfigPath";
const FIX_SERIALIZATION_CONFIG_OPT: &str = "-XepOpt:NullAway:FixSerializationConfigPath";
const SERIALIZE_FIX_METADATA: &str = "-XepOpt:NullAway:SerializeFixMetadata=true";

/// Options appended to each NullAway argument, including the leading space.
pub fn option_suffix(scanner_config: &Path, serialization_config: &Path) -> String {
    format!(
        " {SCANNER_CHECK} {SCANNER_CONFIG_OPT}={} {FIX_SERIALIZATION_CONFIG_OPT}={} {SERIALIZE_FIX_METADATA}",
        scanner_config.display(),
        serialization_config.display()
    )
}

/// Append `suffix` to every `compilerArgs` entry whose value contains `marker`.
///
/// `compilerArgs` is created when missing. Entries without the marker are left
/// alone, so a project that does not already run NullAway gets no new flags.
/// Returns the number of rewritten entries.
pub fn rewrite_compiler_args(configuration: &mut ConfigNode, marker: &str, suffix: &str) -> usize {
    let compiler_args = configuration.ensure_child(COMPILER_ARGS);

    let mut rewritten = 0;
    for arg in compiler_args.children_mut() {
        let Some(value) = arg.value() else {
            continue;
        };
        if !value.contains(marker) {
            continue;
        }
        let updated = format!("{value}{suffix}");
        debug!(name = arg.name(), "rewriting compiler argument");
        arg.set_value(updated);
        rewritten += 1;
    }

    if rewritten == 0 {
        info!(marker, "no compiler argument references the processor; flags unchanged");
    }
    rewritten
}
