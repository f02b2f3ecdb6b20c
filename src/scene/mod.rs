//! Runtime scene graph the configurator binds onto.
//!
//! Nodes live in an arena owned by [`SceneGraph`] and are addressed by
//! [`NodeId`]. The graph is produced by the asset loader and is then written
//! only by the binder (visibility and material fields) and the auto-rotate
//! tick (root transform); the render loop reads it.

pub mod binder;
pub mod bounds;
pub mod index;

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Quat, Vec3};

pub use bounds::Aabb;

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one loaded scene graph instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear RGB.
    pub base_color: [f32; 3],
    pub roughness: f32,
    pub metallic: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0],
            roughness: 1.0,
            metallic: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Bounds in the owning node's local space.
    pub bounds: Aabb,
    /// `None` when the primitive carries nothing color-bearing.
    pub material: Option<Material>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub visible: bool,
    pub transform: Transform,
    mesh: Option<Mesh>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn group(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            visible: true,
            transform: Transform::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: Option<&str>, mesh: Mesh) -> Self {
        Self {
            mesh: Some(mesh),
            ..Self::group(name)
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Capability query: the mesh payload, if this node renders geometry.
    pub fn as_mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug)]
pub struct SceneGraph {
    id: SceneId,
    nodes: Vec<Node>,
}

impl SceneGraph {
    /// Creates a graph holding a single unnamed root group.
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            nodes: vec![Node::group(None)],
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Every node in the arena, the synthetic root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True while the graph holds nothing but its root.
    pub fn has_no_content(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Appends `node` as the last child of `parent`.
    ///
    /// Panics if `parent` does not belong to this graph.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "parent {parent:?} not in graph");
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Pre-order walk starting at `start` (included), children in authoring order.
    pub fn pre_order(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(start).is_none() {
            return out;
        }
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// World-space bounds of every mesh under `start`, hidden ones included.
    ///
    /// Returns `None` when the sub-tree holds no geometry.
    pub fn world_bounds(&self, start: NodeId) -> Option<Aabb> {
        let start_node = self.node(start)?;
        let mut bounds: Option<Aabb> = None;
        let mut stack = vec![(start, start_node.transform.matrix())];
        while let Some((id, world)) = stack.pop() {
            let node = &self.nodes[id.0];
            if let Some(mesh) = node.as_mesh() {
                let mesh_bounds = mesh.bounds.transformed(&world);
                bounds = Some(match bounds {
                    Some(existing) => existing.merged(&mesh_bounds),
                    None => mesh_bounds,
                });
            }
            for child in node.children.iter().rev() {
                let child_world = world * self.nodes[child.0].transform.matrix();
                stack.push((*child, child_world));
            }
        }
        bounds
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn unit_mesh(name: Option<&str>) -> Node {
        Node::mesh(
            name,
            Mesh {
                bounds: Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
                material: Some(Material::default()),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::unit_mesh;
    use super::*;

    #[test]
    fn pre_order_keeps_authoring_order() {
        let mut graph = SceneGraph::new();
        let a = graph.add_child(graph.root(), Node::group(Some("a")));
        let a1 = graph.add_child(a, Node::group(Some("a1")));
        let a2 = graph.add_child(a, Node::group(Some("a2")));
        let b = graph.add_child(graph.root(), Node::group(Some("b")));
        let a1x = graph.add_child(a1, Node::group(Some("a1x")));

        assert_eq!(graph.pre_order(graph.root()), vec![graph.root(), a, a1, a1x, a2, b]);
        assert_eq!(graph.pre_order(a1), vec![a1, a1x]);
    }

    #[test]
    fn world_bounds_compose_parent_transforms() {
        let mut graph = SceneGraph::new();
        let group = graph.add_child(
            graph.root(),
            Node::group(Some("offset")).with_transform(Transform::from_translation(Vec3::X * 4.0)),
        );
        graph.add_child(
            group,
            unit_mesh(Some("m")).with_transform(Transform::from_translation(Vec3::Y)),
        );
        graph.add_child(graph.root(), unit_mesh(None));

        let bounds = graph.world_bounds(graph.root()).unwrap();
        assert_eq!(bounds.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(bounds.max, Vec3::new(4.5, 1.5, 0.5));
    }

    #[test]
    fn empty_graph_has_no_bounds() {
        let graph = SceneGraph::new();
        assert!(graph.has_no_content());
        assert!(graph.world_bounds(graph.root()).is_none());
    }

    #[test]
    fn root_counts_as_a_node_but_not_as_content() {
        let mut graph = SceneGraph::new();
        assert_eq!(graph.node_count(), 1);
        assert!(graph.has_no_content());

        graph.add_child(graph.root(), Node::group(None));
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.has_no_content());
    }

    #[test]
    fn graphs_get_distinct_ids() {
        assert_ne!(SceneGraph::new().id(), SceneGraph::new().id());
    }
}
