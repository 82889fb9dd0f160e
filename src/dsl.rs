use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::utils::Mat4;

/// Document handed over by the host tool: every node tree plus the scene objects
/// that reference them.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SceneDSL {
    pub version: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub settings: ExportSettings,
    #[serde(default, rename = "nodeTrees")]
    pub node_trees: Vec<NodeTreeDSL>,
    #[serde(default)]
    pub materials: Vec<MaterialDSL>,
    #[serde(default)]
    pub images: Vec<ImageDSL>,
    #[serde(default)]
    pub world: Option<WorldDSL>,
    #[serde(default)]
    pub camera: Option<CameraDSL>,
    #[serde(default)]
    pub objects: Vec<ObjectDSL>,
    #[serde(default)]
    pub render: Option<RenderDSL>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Metadata {
    pub name: String,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// Export switches and directory names.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub use_selection: bool,
    pub export_materials: bool,
    pub export_lights: bool,
    pub enable_background: bool,
    pub enable_camera: bool,
    pub enable_integrator: bool,
    pub enable_area_lights: bool,
    pub copy_images: bool,
    pub overwrite_existing_textures: bool,
    pub mesh_dir_name: String,
    pub tex_dir_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            use_selection: false,
            export_materials: true,
            export_lights: true,
            enable_background: true,
            enable_camera: true,
            enable_integrator: true,
            enable_area_lights: true,
            copy_images: true,
            overwrite_existing_textures: true,
            mesh_dir_name: "meshes".to_string(),
            tex_dir_name: "textures".to_string(),
        }
    }
}

/// A material, world or group graph.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeTreeDSL {
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub inputs: Vec<Socket>,
    #[serde(default)]
    pub outputs: Vec<Socket>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Socket {
    pub id: String,
    #[serde(rename = "type", default)]
    pub socket_type: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub links: Vec<Endpoint>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Endpoint {
    #[serde(rename = "nodeId")]
    pub node_id: String,
    #[serde(rename = "portId")]
    pub port_id: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDSL {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub use_nodes: bool,
    #[serde(default)]
    pub node_tree: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorldDSL {
    pub name: String,
    #[serde(default)]
    pub color: [f64; 3],
    #[serde(default)]
    pub node_tree: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageDSL {
    pub id: String,
    pub name: String,
    #[serde(default = "default_colorspace")]
    pub colorspace: String,
    pub source: ImageSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ImageSource {
    File {
        path: String,
    },
    #[serde(rename_all = "camelCase")]
    Embedded {
        file_name: String,
        data_base64: String,
    },
    Generated,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CameraDSL {
    pub name: String,
    pub matrix_world: Mat4,
    pub resolution: [u32; 2],
    #[serde(default = "default_percentage")]
    pub resolution_percentage: u32,
    pub sensor_width: f64,
    pub lens: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Mesh,
    Light,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDSL {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub matrix_world: Mat4,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub material_slots: Vec<Option<String>>,
    #[serde(default)]
    pub mesh: Option<MeshDSL>,
    #[serde(default)]
    pub light: Option<LightDSL>,
}

/// Mesh data already split per material slot by the host; `parts[i]` belongs to slot `i`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MeshDSL {
    pub name: String,
    #[serde(default)]
    pub parts: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LightDSL {
    pub name: String,
    #[serde(rename = "type")]
    pub light_type: String,
    #[serde(default = "default_white")]
    pub color: [f64; 3],
    #[serde(default)]
    pub energy: f64,
    #[serde(default)]
    pub shadow_soft_size: f64,
    #[serde(default = "default_square")]
    pub shape: String,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub size_y: f64,
    #[serde(default)]
    pub is_portal: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderDSL {
    pub max_bounces: u32,
    pub samples: u32,
}

impl Default for RenderDSL {
    fn default() -> Self {
        Self {
            max_bounces: 10,
            samples: 64,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_colorspace() -> String {
    "sRGB".to_string()
}

fn default_percentage() -> u32 {
    100
}

fn default_white() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

fn default_square() -> String {
    "SQUARE".to_string()
}

impl SceneDSL {
    pub fn node_tree(&self, id: &str) -> Option<&NodeTreeDSL> {
        self.node_trees.iter().find(|t| t.id == id)
    }

    pub fn material(&self, id: &str) -> Option<&MaterialDSL> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn image(&self, id: &str) -> Option<&ImageDSL> {
        self.images.iter().find(|i| i.id == id)
    }
}

pub fn load_scene_from_path(path: impl AsRef<std::path::Path>) -> Result<SceneDSL> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene json at {}", path.display()))?;
    parse_scene(&text).with_context(|| format!("invalid scene json in {}", path.display()))
}

pub fn parse_scene(text: &str) -> Result<SceneDSL> {
    let scene: SceneDSL = serde_json::from_str(text).context("failed to parse scene json")?;
    if scene.version.trim().is_empty() {
        return Err(anyhow!("scene json is missing a version"));
    }
    Ok(scene)
}

pub fn parse_str<'a>(params: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn parse_bool(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}
