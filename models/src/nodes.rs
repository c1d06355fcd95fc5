// models/src/nodes.rs

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{ValidationError, ValidationResult},
    identifiers::Identifier,
};

/// Run state of a cloud node. There are no intermediate states: a node is
/// either backed by a live instance or it is not.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Started,
    Stopped,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Started => write!(f, "started"),
            NodeStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// A host network interface exposed by a node.
///
/// Interfaces marked `special` are reserved system interfaces (loopback,
/// firewire, peer-to-peer) that are not user-assignable.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HostInterface {
    pub name: Identifier,
    pub special: bool,
    #[serde(rename = "type")]
    pub interface_type: String,
}

impl HostInterface {
    pub fn new(name: Identifier, special: bool, interface_type: impl Into<String>) -> Self {
        HostInterface {
            name,
            special,
            interface_type: interface_type.into(),
        }
    }
}

/// A binding of a logical port number to a named interface on a node.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PortMapping {
    pub interface: Identifier,
    pub name: Identifier,
    pub port_number: u16,
    #[serde(rename = "type")]
    pub port_type: String,
}

impl PortMapping {
    pub fn new(
        interface: Identifier,
        name: Identifier,
        port_number: u16,
        port_type: impl Into<String>,
    ) -> Self {
        PortMapping {
            interface,
            name,
            port_number,
            port_type: port_type.into(),
        }
    }
}

/// The record of a cloud node as exposed on the wire.
///
/// `node_id` and `project_id` are immutable once assigned; `name` is the only
/// field mutable through the compute API. `node_directory` points at the
/// node's working storage and is read-only for API callers.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CloudNode {
    pub node_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub status: NodeStatus,
    pub node_directory: PathBuf,
    pub interfaces: Vec<HostInterface>,
    pub ports_mapping: Vec<PortMapping>,
}

impl CloudNode {
    /// Creates a new node record in the `started` state.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the interface topology or the port
    /// mappings violate the node invariants (see `validate`).
    pub fn new(
        project_id: Uuid,
        node_id: Uuid,
        name: impl Into<String>,
        node_directory: PathBuf,
        interfaces: Vec<HostInterface>,
        ports_mapping: Vec<PortMapping>,
    ) -> ValidationResult<Self> {
        let node = CloudNode {
            node_id,
            project_id,
            name: name.into(),
            status: NodeStatus::Started,
            node_directory,
            interfaces,
            ports_mapping,
        };
        node.validate()?;
        Ok(node)
    }

    /// Checks the structural invariants of the record:
    /// interface names are unique, every port mapping references an existing
    /// interface, and port numbers are unique within the node.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut interface_names = HashSet::new();
        for interface in &self.interfaces {
            if !interface_names.insert(interface.name.clone()) {
                return Err(ValidationError::DuplicateInterfaceName(interface.name.clone()));
            }
        }

        let mut port_numbers = HashSet::new();
        for mapping in &self.ports_mapping {
            if !interface_names.contains(&mapping.interface) {
                return Err(ValidationError::UnknownInterface(mapping.interface.clone()));
            }
            if !port_numbers.insert(mapping.port_number) {
                return Err(ValidationError::DuplicatePortNumber(mapping.port_number));
            }
        }

        Ok(())
    }

    /// Replaces the node's display name. Every other field is untouched.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_started(&self) -> bool {
        self.status == NodeStatus::Started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn interface(name: &str) -> HostInterface {
        HostInterface::new(Identifier::from_str(name).unwrap(), false, "ethernet")
    }

    fn mapping(interface: &str, port_number: u16) -> PortMapping {
        PortMapping::new(
            Identifier::from_str(interface).unwrap(),
            Identifier::from_str(&format!("port{}", port_number)).unwrap(),
            port_number,
            "access",
        )
    }

    fn node(interfaces: Vec<HostInterface>, ports_mapping: Vec<PortMapping>) -> ValidationResult<CloudNode> {
        CloudNode::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "cloud1",
            PathBuf::from("/tmp/projects/p/project-files/cloud/n"),
            interfaces,
            ports_mapping,
        )
    }

    #[test]
    fn should_create_valid_node() {
        let created = node(
            vec![interface("en0"), interface("en1")],
            vec![mapping("en0", 0), mapping("en1", 1)],
        );
        assert!(created.is_ok());
        let created = created.unwrap();
        assert_eq!(created.status, NodeStatus::Started);
        assert!(created.is_started());
    }

    #[test]
    fn should_reject_duplicate_interface_names() {
        let created = node(vec![interface("en0"), interface("en0")], vec![]);
        assert_eq!(
            created.unwrap_err(),
            ValidationError::DuplicateInterfaceName(Identifier::from_str("en0").unwrap())
        );
    }

    #[test]
    fn should_reject_mapping_to_unknown_interface() {
        let created = node(vec![interface("en0")], vec![mapping("en9", 0)]);
        assert_eq!(
            created.unwrap_err(),
            ValidationError::UnknownInterface(Identifier::from_str("en9").unwrap())
        );
    }

    #[test]
    fn should_reject_duplicate_port_numbers() {
        let created = node(
            vec![interface("en0"), interface("en1")],
            vec![mapping("en0", 0), mapping("en1", 0)],
        );
        assert_eq!(created.unwrap_err(), ValidationError::DuplicatePortNumber(0));
    }

    #[test]
    fn should_serialize_with_wire_field_names() {
        let created = node(vec![interface("en0")], vec![mapping("en0", 0)]).unwrap();
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["status"], "started");
        assert_eq!(json["interfaces"][0]["type"], "ethernet");
        assert_eq!(json["ports_mapping"][0]["type"], "access");
        assert_eq!(json["ports_mapping"][0]["port_number"], 0);
        assert!(json.get("interface_type").is_none());
    }

    #[test]
    fn should_round_trip_through_json() {
        let created = node(
            vec![interface("en0"), interface("en1")],
            vec![mapping("en0", 0), mapping("en1", 1)],
        )
        .unwrap();
        let json = serde_json::to_string(&created).unwrap();
        let parsed: CloudNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, created);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn set_name_leaves_other_fields_untouched() {
        let mut created = node(vec![interface("en0")], vec![mapping("en0", 0)]).unwrap();
        let before = created.clone();
        created.set_name("renamed");
        assert_eq!(created.name, "renamed");
        assert_eq!(created.node_id, before.node_id);
        assert_eq!(created.project_id, before.project_id);
        assert_eq!(created.status, before.status);
        assert_eq!(created.node_directory, before.node_directory);
        assert_eq!(created.interfaces, before.interfaces);
        assert_eq!(created.ports_mapping, before.ports_mapping);
    }
}
