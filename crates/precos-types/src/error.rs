use std::fmt;

/// Result type for precos-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required query parameter was absent
    MissingParam(&'static str),

    /// A parameter carried a value that does not parse
    InvalidParam { name: &'static str, value: String },

    /// The territory type parameter named an unknown variant
    UnknownTerritoryType(String),

    /// A scoped territory type arrived without its code list
    EmptyCodes(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingParam(name) => write!(f, "Missing query parameter: {}", name),
            Error::InvalidParam { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
            Error::UnknownTerritoryType(value) => {
                write!(f, "Unknown territory type: {}", value)
            }
            Error::EmptyCodes(name) => {
                write!(f, "Territory type requires at least one {}", name)
            }
        }
    }
}

impl std::error::Error for Error {}
