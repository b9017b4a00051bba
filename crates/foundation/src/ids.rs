use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable, opaque node identifier as supplied by the catalog.
///
/// Catalog documents emit ids either as JSON strings or as JSON numbers; both
/// deserialize to the same textual form so `7` and `"7"` name the same node.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl From<u64> for NodeId {
    fn from(n: u64) -> Self {
        NodeId(n.to_string())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => NodeId(s),
            RawId::Unsigned(n) => NodeId(n.to_string()),
            RawId::Signed(n) => NodeId(n.to_string()),
            RawId::Float(f) => NodeId(f.to_string()),
        })
    }
}

/// Index of a node inside an [`crate::Arena`].
///
/// Indices are dense and assigned in allocation order; they are never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub fn new(index: u32) -> Self {
        NodeIndex(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}
