//! Hub node addresses and node-change payloads

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::xml_decode;

/// A hub-internal node address such as `1A 2B 3C 1`.
///
/// Insteon addresses are three hex bytes followed by a sub-node number; the
/// load-controlling node is sub-node `1`, while extra buttons on keypads
/// report under other sub-node numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Space-separated address components
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|part| !part.is_empty())
    }

    /// Sub-node component (the fourth one), if the address has one
    pub fn sub_node(&self) -> Option<&str> {
        self.components().nth(3)
    }

    /// Whether this is a non-load sub-node of a multi-button device
    pub fn is_secondary(&self) -> bool {
        matches!(self.sub_node(), Some(sub) if sub != "1")
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for NodeAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl AsRef<str> for NodeAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// New name carried in the `eventInfo` of a node-renamed (`_3`/`NN`) event
pub fn extract_new_name(event_info: &str) -> Option<&str> {
    xml_decode::between_tags(event_info, "newName")
}
