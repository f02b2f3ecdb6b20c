use std::collections::HashMap;

use crate::scene::{NodeId, SceneGraph, SceneId};

/// Name → node lookup for one scene graph instance.
///
/// Built once per loaded graph; configuration changes never rebuild it.
/// On duplicate names the node visited last in pre-order wins.
#[derive(Debug, Clone)]
pub struct NodeIndex {
    scene: SceneId,
    by_name: HashMap<String, NodeId>,
}

impl NodeIndex {
    pub fn build(graph: &SceneGraph) -> Self {
        let mut by_name = HashMap::new();
        for id in graph.pre_order(graph.root()) {
            let Some(name) = graph.node(id).and_then(|node| node.name.as_deref()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            if let Some(previous) = by_name.insert(name.to_string(), id) {
                log::debug!("Node name {name:?} repeated; {previous:?} replaced by {id:?}");
            }
        }
        log::debug!("Indexed {} named nodes of {}", by_name.len(), graph.node_count());
        Self {
            scene: graph.id(),
            by_name,
        }
    }

    /// The graph this index was built from.
    pub fn scene_id(&self) -> SceneId {
        self.scene
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
