// models/src/errors.rs

pub use thiserror::Error;

use crate::identifiers::Identifier;

/// Errors raised while validating a node record against its structural
/// invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("identifiers must be between 1 and 255 bytes long")]
    InvalidIdentifierLength,
    #[error("duplicate interface name: {0}")]
    DuplicateInterfaceName(Identifier),
    #[error("port mapping references unknown interface: {0}")]
    UnknownInterface(Identifier),
    #[error("duplicate port number: {0}")]
    DuplicatePortNumber(u16),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
