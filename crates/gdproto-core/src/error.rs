//! Error types for the gdproto-core library.
//!
//! This module provides error handling using the `thiserror` crate. The only
//! error the generator itself produces is [`Error::UnrecognizedKind`]; the
//! remaining variants cover the plugin plumbing around it.

use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all generator operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A field (or map key/value) uses a wire kind outside the supported set.
    ///
    /// Generation of the schema file containing the field is aborted; no
    /// artifact is produced for it.
    #[error("unrecognized field kind '{kind}'")]
    UnrecognizedKind {
        /// Textual form of the offending kind (e.g. `group`, or the raw
        /// descriptor type number when it has no name)
        kind: String,
    },

    /// Failed to decode the code generator request from the compiler
    #[error("failed to decode code generator request: {0}")]
    RequestDecode(#[from] prost::DecodeError),

    /// The descriptor set could not be resolved into a descriptor pool
    #[error("invalid descriptor set: {0}")]
    DescriptorSet(#[from] prost_reflect::DescriptorError),

    /// A schema file requested for generation is missing from the descriptor set
    #[error("schema file '{name}' not found in the descriptor set")]
    FileNotFound {
        /// Name of the missing schema file
        name: String,
    },

    /// The plugin parameter string contains an option the generator does not know
    #[error("invalid plugin parameter '{parameter}'")]
    InvalidParameter {
        /// The offending option, as passed by the compiler
        parameter: String,
    },
}

impl Error {
    /// Creates a new unrecognized-kind error
    pub fn unrecognized_kind(kind: impl Into<String>) -> Self {
        Self::UnrecognizedKind { kind: kind.into() }
    }

    /// Creates a new file-not-found error
    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::FileNotFound { name: name.into() }
    }

    /// Creates a new invalid-parameter error
    pub fn invalid_parameter(parameter: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
        }
    }

    /// Returns true if this error was raised by the kind classifier
    pub fn is_unrecognized_kind(&self) -> bool {
        matches!(self, Self::UnrecognizedKind { .. })
    }
}
