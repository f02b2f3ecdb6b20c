pub mod cache;

use crate::relay::{self, Fetcher};
use crate::scene::{Aabb, Material, Mesh, Node, NodeId, SceneGraph, Transform};
use cache::AssetCache;
use glam::{Quat, Vec3};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("relay could not fetch {url}: status {status}: {message}")]
    Fetch {
        url: String,
        status: u16,
        message: String,
    },
    #[error("failed to parse glTF: {0}")]
    Parse(#[from] gltf::Error),
    #[error("asset {0} contains no scene")]
    NoScene(String),
}

/// Where the model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Url(String),
}

impl AssetSource {
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            AssetSource::Url(value.to_string())
        } else {
            AssetSource::File(PathBuf::from(value))
        }
    }

    pub fn display_name(&self) -> String {
        let raw = match self {
            AssetSource::File(path) => path.to_string_lossy().into_owned(),
            AssetSource::Url(url) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
        };
        raw.rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("gltf")
            .to_string()
    }
}

pub struct LoadedAsset {
    pub name: String,
    pub graph: SceneGraph,
}

/// Turns an [`AssetSource`] into a scene graph, going through the relay for
/// remote assets.
pub struct AssetLoader<'a> {
    fetcher: &'a dyn Fetcher,
    cache: Option<AssetCache>,
}

impl<'a> AssetLoader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: AssetCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn load(&self, source: &AssetSource) -> Result<LoadedAsset, AssetError> {
        let name = source.display_name();
        let bytes = match source {
            AssetSource::File(path) => read_asset_bytes(path)?,
            AssetSource::Url(url) => self.fetch(url)?,
        };
        let graph = scene_from_gltf(&bytes, &name)?;
        log::info!("Loaded {name}: {} nodes", graph.node_count());
        Ok(LoadedAsset { name, graph })
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if let Some(bytes) = self.cache.as_ref().and_then(|cache| cache.get(url)) {
            return Ok(bytes);
        }
        let response = relay::handle(Some(url), self.fetcher);
        if !response.is_ok() {
            return Err(AssetError::Fetch {
                url: url.to_string(),
                status: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put(url, &response.body) {
                log::warn!("Could not cache {url} in {}: {err}", cache.dir().display());
            }
        }
        Ok(response.body)
    }
}

fn read_asset_bytes(path: &Path) -> Result<Vec<u8>, AssetError> {
    std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Builds a [`SceneGraph`] from GLB or glTF JSON bytes.
///
/// Only what binding and framing need is kept: names, transforms, POSITION
/// bounds and PBR factors. Vertex data is never decoded.
pub fn scene_from_gltf(bytes: &[u8], name: &str) -> Result<SceneGraph, AssetError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| AssetError::NoScene(name.to_string()))?;

    let mut graph = SceneGraph::new();
    let root = graph.root();
    for node in scene.nodes() {
        add_node(&mut graph, root, &node);
    }
    Ok(graph)
}

fn add_node(graph: &mut SceneGraph, parent: NodeId, node: &gltf::Node) {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform {
        translation: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
    };

    let primitives: Vec<Mesh> = node
        .mesh()
        .map(|mesh| mesh.primitives().map(|p| primitive_mesh(&p)).collect())
        .unwrap_or_default();

    // A single primitive makes the node itself a mesh; several become
    // unnamed mesh children in primitive order.
    let id = match <[Mesh; 1]>::try_from(primitives) {
        Ok([mesh]) => graph.add_child(parent, Node::mesh(node.name(), mesh).with_transform(transform)),
        Err(primitives) => {
            let id = graph.add_child(parent, Node::group(node.name()).with_transform(transform));
            for mesh in primitives {
                graph.add_child(id, Node::mesh(None, mesh));
            }
            id
        }
    };

    for child in node.children() {
        add_node(graph, id, &child);
    }
}

fn primitive_mesh(primitive: &gltf::Primitive) -> Mesh {
    let bounds = primitive
        .get(&gltf::Semantic::Positions)
        .and_then(|accessor| Some((vec3_value(accessor.min()?)?, vec3_value(accessor.max()?)?)))
        .map(|(min, max)| Aabb::new(min, max))
        .unwrap_or_else(|| {
            log::warn!("Primitive without POSITION bounds; treating as a point");
            Aabb::new(Vec3::ZERO, Vec3::ZERO)
        });

    let material = match primitive.mode() {
        gltf::mesh::Mode::Triangles
        | gltf::mesh::Mode::TriangleStrip
        | gltf::mesh::Mode::TriangleFan => {
            let pbr = primitive.material().pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            Some(Material {
                base_color: [r, g, b],
                roughness: pbr.roughness_factor(),
                metallic: pbr.metallic_factor(),
            })
        }
        _ => None,
    };

    Mesh { bounds, material }
}

fn vec3_value(value: gltf::json::Value) -> Option<Vec3> {
    let values = value.as_array()?;
    if values.len() != 3 {
        return None;
    }
    let mut out = [0.0f32; 3];
    for (slot, v) in out.iter_mut().zip(values) {
        *slot = v.as_f64()? as f32;
    }
    Some(Vec3::from_array(out))
}

#[cfg(test)]
pub(crate) mod test_support {
    /// A small arrow in glTF JSON form: both fletch variants, a nock with
    /// two primitives, and an unnamed shaft node.
    pub const ARROW_GLTF: &str = r##"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "Arrow", "children": [1, 4, 7, 8, 9] },
            { "name": "Fletch_3", "children": [2, 3] },
            { "name": "Vane3_a", "mesh": 0 },
            { "name": "Vane3_b", "mesh": 0, "translation": [0.0, 0.0, 0.5] },
            { "name": "Fletch_4", "children": [5, 6] },
            { "name": "Vane4_a", "mesh": 0 },
            { "name": "Vane4_b", "mesh": 0, "rotation": [0.0, 0.7071068, 0.0, 0.7071068] },
            { "name": "Nock", "mesh": 1, "translation": [0.0, 0.0, -4.0] },
            { "name": "Wrap", "mesh": 0, "scale": [1.0, 1.0, 4.0] },
            { "mesh": 0 }
        ],
        "meshes": [
            { "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] },
            { "primitives": [
                { "attributes": { "POSITION": 0 }, "material": 0 },
                { "attributes": { "POSITION": 0 }, "mode": 1 }
            ] }
        ],
        "materials": [
            { "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.5, 0.5, 1.0], "roughnessFactor": 0.8, "metallicFactor": 0.1 } }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [-1.0, -1.0, -1.0], "max": [1.0, 1.0, 1.0] }
        ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [ { "byteLength": 36, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA" } ]
    }"##;
}
