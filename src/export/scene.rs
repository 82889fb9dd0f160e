//! Whole-scene assembly.

use std::path::Path;

use anyhow::{Context, Result};

use crate::{
    assets::{FsImageStore, ImageStore, MeshStore, PreSplitMeshStore},
    diagnostics::Diagnostics,
    dsl::SceneDSL,
};

use super::{
    camera::export_camera,
    context::ExportContext,
    ir::{IrDocument, IrNode},
    objects::export_objects,
    technique::export_technique,
    world::export_world,
};

/// A finished document and everything reported while producing it.
#[derive(Debug)]
pub struct ExportOutput {
    pub document: IrDocument,
    pub diagnostics: Diagnostics,
}

/// Lowers `scene` into a document. Never fails; problems end up in the diagnostics.
pub fn export_scene(scene: &SceneDSL, images: &dyn ImageStore, meshes: &dyn MeshStore) -> ExportOutput {
    let mut ctx = ExportContext::new(scene, images, meshes);
    let settings = ctx.settings;

    let mut root = IrNode::new("scene").with("id", "scene");
    if settings.enable_camera {
        root.add_children(export_camera(&mut ctx, scene.camera.as_ref()));
    }
    root.add_children(export_objects(&mut ctx));
    if settings.enable_background {
        if let Some(world) = &scene.world {
            root.add_children(export_world(&mut ctx, world));
        }
    }

    let mut document = IrDocument::new();
    document.add_child(root);
    if settings.enable_integrator {
        document.add_children(export_technique(scene.render.as_ref()));
    }

    ctx.registry.resolve_ids(&mut document);
    log::debug!(
        "exported '{}' with {} shared entities",
        scene.metadata.name,
        ctx.registry.len()
    );

    ExportOutput {
        document,
        diagnostics: ctx.diag,
    }
}

/// Exports `scene` next to `path` (textures and meshes are resolved relative to
/// its directory) and writes the document there.
pub fn export_scene_to_file(scene: &SceneDSL, path: &Path) -> Result<ExportOutput> {
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let images = FsImageStore::new(root, &scene.settings);
    let meshes = PreSplitMeshStore::new(&scene.settings);

    let output = export_scene(scene, &images, &meshes);
    std::fs::write(path, output.document.dump())
        .with_context(|| format!("failed to write scene to {}", path.display()))?;
    Ok(output)
}
