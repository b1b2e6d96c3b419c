// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for model editing, resolution and emission

use thiserror::Error;

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing, resolving or emitting a model
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized selector, property, category or path
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unparsable value or wrong field count
    #[error("Format error: {0}")]
    Format(String),

    /// Duplicate or conflicting assignment
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Catalog reference to an undefined name
    #[error("{catalog} '{name}' is not defined for {shape}")]
    Referential {
        catalog: String,
        name: String,
        shape: String,
    },

    /// Mandatory category left unresolved
    #[error("Validation error: {0}")]
    Validation(String),

    /// Properties file could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// External solver exited unsuccessfully
    #[error("Solver '{program}' exited with {}", exit_label(.code))]
    ExternalProcess { program: String, code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "a signal".to_string(),
    }
}

/// Error class, independent of payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Format,
    Consistency,
    Referential,
    Validation,
    Io,
    ExternalProcess,
}

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Create a consistency error
    pub fn consistency(msg: impl Into<String>) -> Self {
        Error::Consistency(msg.into())
    }

    /// Create a referential error
    pub fn referential(
        catalog: impl Into<String>,
        name: impl Into<String>,
        shape: impl Into<String>,
    ) -> Self {
        Error::Referential {
            catalog: catalog.into(),
            name: name.into(),
            shape: shape.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a parse error
    pub fn parse(line: usize, msg: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: msg.into(),
        }
    }

    /// Error class of this error
    ///
    /// Parse failures belong to the IO class: they abort a file load the
    /// same way an unreadable file does.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Format(_) => ErrorKind::Format,
            Error::Consistency(_) => ErrorKind::Consistency,
            Error::Referential { .. } => ErrorKind::Referential,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Parse { .. } | Error::Io(_) => ErrorKind::Io,
            Error::ExternalProcess { .. } => ErrorKind::ExternalProcess,
        }
    }
}
