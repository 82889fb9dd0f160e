//! Lowering of the host scene into the renderer's element tree.

pub mod camera;
pub mod context;
pub mod ir;
pub mod light;
pub mod material;
pub mod node_compiler;
pub mod objects;
pub mod registry;
pub mod scene;
pub mod technique;
pub mod world;

pub use context::ExportContext;
pub use ir::{AttrValue, IrDocument, IrNode};
pub use registry::{EntityKey, EntityKind, ExportRegistry};
pub use scene::{ExportOutput, export_scene, export_scene_to_file};
