//! Payload types carried by the devtools catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path from the root of the component forest to one element, by child index.
pub type ElementPosition = Vec<u32>;

/// An element, optionally narrowed to one of its directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectivePosition {
    pub element: ElementPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<u32>,
}

/// Which parts of the explorer view the panel wants refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    #[serde(default)]
    pub selected_element: Option<ElementPosition>,
    /// Property paths currently expanded in the property tab.
    #[serde(default)]
    pub expanded_paths: Vec<Vec<String>>,
}

/// One node of the component forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub name: String,
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub children: Vec<ComponentNode>,
}

impl ComponentNode {
    /// Follow `position` down from this node's children.
    pub fn find(&self, position: &[u32]) -> Option<&ComponentNode> {
        position.iter().try_fold(self, |node, &index| {
            node.children.get(usize::try_from(index).ok()?)
        })
    }

    /// Nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ComponentNode::count).sum::<usize>()
    }
}

/// Snapshot sent by the agent in answer to a view request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentExplorerView {
    pub forest: Vec<ComponentNode>,
    /// Properties of the selected directive, if any.
    #[serde(default)]
    pub properties: Option<Value>,
}

impl ComponentExplorerView {
    /// Node at `position`, where the first index selects a root.
    pub fn node_at(&self, position: &[u32]) -> Option<&ComponentNode> {
        let (root, rest) = position.split_first()?;
        self.forest.get(usize::try_from(*root).ok()?)?.find(rest)
    }

    pub fn node_count(&self) -> usize {
        self.forest.iter().map(ComponentNode::count).sum()
    }
}

/// Property edit made in the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    pub directive: DirectivePosition,
    pub path: Vec<String>,
    pub value: Value,
}
