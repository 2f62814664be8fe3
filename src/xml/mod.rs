//! Ordered configuration trees backed by a lossless XML document.
//!
//! [`ConfigNode`] is the data model every patching step operates on.
//! [`PomDocument`] parses a file into that model and renders it back,
//! copying the original bytes of every node the patcher did not touch.

pub mod document;
pub mod errors;
pub mod node;

pub use document::PomDocument;
pub use errors::XmlError;
pub use node::ConfigNode;
