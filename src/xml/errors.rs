use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("element <{name}> is never closed")]
    Unclosed { name: String },

    #[error("document has no root element")]
    MissingRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
