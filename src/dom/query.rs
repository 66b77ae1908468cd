//! Element queries: by id, by selector.

use super::node::NodeId;
use super::tree::Dom;
use crate::selector::matcher::matches_list;
use crate::selector::SelectorList;

impl Dom {
    /// Find the first element whose `id` matches.
    ///
    /// Searches the whole arena, not just the tree under the root.
    pub fn query_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, data)| data.id.as_deref() == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// All descendants of `root` matching `selectors`, in document order.
    ///
    /// `root` itself is never returned, but its ancestors take part in
    /// combinator matching.
    pub fn query_selector_all(&self, root: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&node| matches_list(selectors, node, self))
            .collect()
    }
}
