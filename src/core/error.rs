use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown index kind, malformed mapping, out-of-range filter parameters
    InvalidSchema,
    /// Settings/id mismatch, bad key material, registry misconfiguration
    Internal,
    /// Unknown or unsearchable index, unsupported operator at query time
    QueryConstraint,
    /// order_by against a non-orderable index, bad direction token
    QueryOrdering,
    UnsupportedOperator,
    /// Record content that cannot be indexed (non-ASCII ordered string, wrong type)
    InvalidRecord,
    InvalidInput,
    Parse,
}

#[derive(Debug, Clone, ThisError)]
#[error("{kind:?}: {context}")]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error {
            kind,
            context: context.into(),
        }
    }

    pub fn invalid_schema(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidSchema, context)
    }

    pub fn internal(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Internal, context)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error {
            kind: ErrorKind::Internal,
            context: format!("Invalid key material: {}", err),
        }
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Error {
            kind: ErrorKind::Internal,
            context: format!("Invalid UUID: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_context() {
        let err = Error::invalid_schema("Unknown index kind \"invalid\"");
        assert_eq!(err.to_string(), "InvalidSchema: Unknown index kind \"invalid\"");
    }

    #[test]
    fn hex_errors_are_internal() {
        let err: Error = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
