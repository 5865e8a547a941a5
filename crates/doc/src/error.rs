use thiserror::Error;

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocError>;

/// Errors that can occur while encoding or decoding a document
#[derive(Error, Debug)]
pub enum DocError {
    /// The input is not well-formed markup
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The document root does not name the requested type
    #[error("Unexpected root element: expected <{expected}>, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },

    /// A required child element is absent
    #[error("Missing element <{element}> under {path}")]
    MissingElement { element: String, path: String },

    /// A leaf value could not be converted to its field type
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: String, value: String },

    /// A reference marker points at nothing materialized in this pass
    #[error("Unresolved reference {reference:?} at {path}")]
    UnresolvedReference { reference: String, path: String },

    /// A reference marker points at an object of another type
    #[error("Reference {0:?} resolves to an object of a different type")]
    ReferenceTypeMismatch(String),

    /// A `class` attribute names no known runtime type
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// Nesting exceeds the configured maximum
    #[error("Document nesting exceeds max depth {0}")]
    DepthExceeded(usize),

    #[error("Converter error: {0}")]
    ConverterError(String),

    #[error("Writer error: {0}")]
    WriterError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DocError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a missing element error
    pub fn missing(element: impl Into<String>, path: impl ToString) -> Self {
        Self::MissingElement {
            element: element.into(),
            path: path.to_string(),
        }
    }

    /// Create a converter error
    pub fn converter(msg: impl Into<String>) -> Self {
        Self::ConverterError(msg.into())
    }

    /// Create a writer error
    pub fn writer(msg: impl Into<String>) -> Self {
        Self::WriterError(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
