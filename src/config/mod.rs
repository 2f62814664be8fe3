pub mod loader;
pub mod schema;

pub use loader::{load_for_project, load_from_path, load_from_str, ConfigError, CONFIG_FILE};
pub use schema::{
    AnnotatorSettings, CompilerSettings, PatcherConfig, ProcessorSettings, ValidationError,
    ValidationIssue,
};
