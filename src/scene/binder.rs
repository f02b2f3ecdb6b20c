//! Applies a [`Configuration`] onto an indexed scene graph.
//!
//! A bind is a full re-assertion of visual state rather than a diff, so
//! running it twice with the same configuration changes nothing the second
//! time. Every expected group is optional; whatever is missing is skipped.

use crate::config::{Configuration, FletchCount, Rgb};
use crate::scene::index::NodeIndex;
use crate::scene::{NodeId, SceneGraph, SceneId};

pub const VANE_ROUGHNESS: f32 = 0.45;
pub const VANE_METALLIC: f32 = 0.0;
pub const NOCK_ROUGHNESS: f32 = 0.3;
pub const WRAP_ROUGHNESS: f32 = 0.6;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindError {
    #[error("node index was built for scene {index:?}, not {scene:?}")]
    StaleIndex { index: SceneId, scene: SceneId },
}

/// Node names agreed with the asset author.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NodeNames {
    pub three_fletch: String,
    pub four_fletch: String,
    pub nock: String,
    pub wrap: String,
}

impl Default for NodeNames {
    fn default() -> Self {
        Self {
            three_fletch: "Fletch_3".to_string(),
            four_fletch: "Fletch_4".to_string(),
            nock: "Nock".to_string(),
            wrap: "Wrap".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Set only when both variant groups resolved.
    pub visible_variant: Option<FletchCount>,
    pub vane_meshes: usize,
    pub nock_meshes: usize,
    pub wrap_meshes: usize,
    pub missing: Vec<String>,
}

pub fn bind(
    graph: &mut SceneGraph,
    index: &NodeIndex,
    config: &Configuration,
    names: &NodeNames,
) -> Result<BindReport, BindError> {
    if index.scene_id() != graph.id() {
        return Err(BindError::StaleIndex {
            index: index.scene_id(),
            scene: graph.id(),
        });
    }

    let mut report = BindReport::default();
    let mut resolve = |name: &str| {
        let found = index.get(name);
        if found.is_none() {
            log::debug!("Node {name:?} not in asset, skipping");
            report.missing.push(name.to_string());
        }
        found
    };
    let three = resolve(&names.three_fletch);
    // Both names landing on one node is a single variant, not an exclusive pair.
    let four = resolve(&names.four_fletch).filter(|four| Some(*four) != three);
    let nock = resolve(&names.nock);
    let wrap = resolve(&names.wrap);

    if let (Some(three), Some(four)) = (three, four) {
        let show_three = config.fletch_count == FletchCount::Three;
        set_visible(graph, three, show_three);
        set_visible(graph, four, !show_three);
        report.visible_variant = Some(config.fletch_count);
    }

    // Hidden variant too, so toggling shows the right colors immediately.
    for group in [three, four].into_iter().flatten() {
        report.vane_meshes += recolor_alternating(
            graph,
            group,
            config.primary_vane_color,
            config.secondary_vane_color,
        );
    }

    if let Some(nock) = nock {
        report.nock_meshes = recolor_single(graph, nock, config.nock_color, NOCK_ROUGHNESS);
    }
    if let Some(wrap) = wrap {
        report.wrap_meshes = recolor_single(graph, wrap, config.wrap_color, WRAP_ROUGHNESS);
    }

    Ok(report)
}

fn set_visible(graph: &mut SceneGraph, id: NodeId, visible: bool) {
    if let Some(node) = graph.node_mut(id) {
        node.visible = visible;
    }
}

/// Even visit index gets `primary`, odd gets `secondary`. Only meshes with a
/// material advance the counter.
fn recolor_alternating(graph: &mut SceneGraph, group: NodeId, primary: Rgb, secondary: Rgb) -> usize {
    let (primary, secondary) = (primary.to_linear(), secondary.to_linear());
    let mut count = 0;
    for id in graph.pre_order(group) {
        let Some(material) = graph
            .node_mut(id)
            .and_then(|node| node.as_mesh_mut())
            .and_then(|mesh| mesh.material.as_mut())
        else {
            continue;
        };
        material.base_color = if count % 2 == 0 { primary } else { secondary };
        material.roughness = VANE_ROUGHNESS;
        material.metallic = VANE_METALLIC;
        count += 1;
    }
    count
}

fn recolor_single(graph: &mut SceneGraph, group: NodeId, color: Rgb, roughness: f32) -> usize {
    let color = color.to_linear();
    let mut count = 0;
    for id in graph.pre_order(group) {
        let Some(material) = graph
            .node_mut(id)
            .and_then(|node| node.as_mesh_mut())
            .and_then(|mesh| mesh.material.as_mut())
        else {
            continue;
        };
        material.base_color = color;
        material.roughness = roughness;
        count += 1;
    }
    count
}
