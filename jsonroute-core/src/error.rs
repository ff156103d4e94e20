//! Body format errors: whose data is malformed, where, and how to report it.

use thiserror::Error;

use crate::path::PropertyPath;

/// The two kinds of body format failure.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ErrorKind {
    /// The route's own schema document is malformed.
    SchemaDefinition,
    /// The caller's body does not conform to a well-formed schema.
    InputValidation,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::SchemaDefinition => 500,
            ErrorKind::InputValidation => 400,
        }
    }

    /// Fixed error code carried by redirect descriptors and JSON responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::SchemaDefinition => "VERIFICATION_ERROR",
            ErrorKind::InputValidation => "INVALID_FORMAT",
        }
    }
}

/// A schema or input fault located at `path`. Displays as its message.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{message}")]
pub struct FormatError {
    pub kind: ErrorKind,
    pub path: PropertyPath,
    pub message: String,
}

impl FormatError {
    pub fn schema(path: &PropertyPath, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::SchemaDefinition,
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn input(path: &PropertyPath, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InputValidation,
            path: path.clone(),
            message: message.into(),
        }
    }

    pub fn is_schema_error(&self) -> bool {
        self.kind == ErrorKind::SchemaDefinition
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }
}
