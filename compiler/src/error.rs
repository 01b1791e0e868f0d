use thiserror::Error;

#[derive(Debug, Error)]
pub enum StitchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unknown type {token} in {context}")]
    UnresolvedSymbol {
        token:   String,
        context: String,
    },

    #[error("{0} is not an allowed scalar type")]
    UnsupportedScalar(String),

    #[error("Usage error: {0}")]
    Usage(String),
}
