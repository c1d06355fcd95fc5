pub mod errors;
pub mod identifiers;
pub mod nodes;

pub use crate::errors::{ValidationError, ValidationResult};
pub use crate::identifiers::Identifier;
pub use crate::nodes::{CloudNode, HostInterface, NodeStatus, PortMapping};
