use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::topology::node::Node;
use crate::error::ConversionError;

/// The order in which candidate nodes are tried for the next component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeOrder {
    /// Most spare capacity first (least loaded).
    Spread,
    /// Least spare capacity first (consolidate).
    Pack,
}

impl NodeOrder {
    /// Returns the comparator implementing this order.
    pub fn comparator(self) -> fn(&Node, &Node) -> Ordering {
        match self {
            NodeOrder::Spread => spread_compare,
            NodeOrder::Pack => pack_compare,
        }
    }

    /// Stable sort, nodes the comparator considers equal keep their relative order.
    pub fn sort(self, nodes: &mut [&Node]) {
        let compare = self.comparator();
        nodes.sort_by(|a, b| compare(a, b));
    }
}

impl FromStr for NodeOrder {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spread" => Ok(NodeOrder::Spread),
            "pack" => Ok(NodeOrder::Pack),
            _ => Err(ConversionError::UnknownNodeOrder(s.to_string())),
        }
    }
}

/// Returns `Ordering::Less` if `a` has more free cpu than `b`.
///
/// Note: on equal free cpu the node with more free memory comes first.
pub fn spread_compare(a: &Node, b: &Node) -> Ordering {
    b.free_cpu().cmp(&a.free_cpu()).then_with(|| b.free_memory().cmp(&a.free_memory()))
}

/// Exact reverse of [`spread_compare`]: less free cpu first, then less free memory.
pub fn pack_compare(a: &Node, b: &Node) -> Ordering {
    spread_compare(b, a)
}
